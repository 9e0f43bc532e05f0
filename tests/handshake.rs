use fragment_exchange::Core::{Codec, RawCodec, Surface};
use fragment_exchange::Exchange::Gate::{rendezvous, ReadyGate};
use fragment_exchange::Exchange::{
    Defragmenter, ExchangeBuilder, Fragmenter, HandoffMode, Removal, Structs::FragmentInfo, Subscriber,
};
use fragment_exchange::FragmentError;
use serial_test::serial;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

fn source(width: usize, height: usize) -> Surface {
    let pixels = (0..width * height * 3).map(|i| (i % 200) as u8 + 1).collect();
    Surface::from_pixels(width, height, 3, pixels).unwrap()
}

fn fragment_at(codec: &dyn Codec, src: &Surface, index: usize, offset: usize, width: usize) -> FragmentInfo {
    FragmentInfo::new(index, offset, codec.encode(&src.slice(offset, width)).unwrap())
}

#[test]
#[serial]
fn gate_times_out_without_signal() {
    let gate = ReadyGate::with_timeout(Duration::from_millis(30));
    let start = Instant::now();
    let mut ran = false;
    let err = gate.consume(50, || ran = true).unwrap_err();

    assert!(matches!(err, FragmentError::HandshakeTimeout { offset: 50, .. }));
    assert!(!ran);
    assert!(start.elapsed() >= Duration::from_millis(25));
    assert!(!gate.is_ready());
}

#[test]
#[serial]
fn gate_consume_lowers_flag() {
    let gate = ReadyGate::new();
    gate.signal_ready();
    assert!(gate.is_ready());
    assert_eq!(gate.consume(0, || 7).unwrap(), 7);
    assert!(!gate.is_ready());
}

#[test]
#[serial]
fn gate_wakes_on_late_signal() {
    let gate = ReadyGate::with_timeout(Duration::from_millis(500));
    crossbeam_utils::thread::scope(|s| {
        s.spawn(|_| {
            thread::sleep(Duration::from_millis(20));
            gate.signal_ready();
        });
        assert_eq!(gate.consume(0, || "applied").unwrap(), "applied");
    })
    .unwrap();
    assert!(!gate.is_ready());
}

#[test]
#[serial]
fn timed_out_fragment_leaves_surface_untouched() {
    let codec = RawCodec::new();
    let src = source(200, 4);
    let gate = ReadyGate::with_timeout(Duration::from_millis(20));
    let mut defragmenter = Defragmenter::new(&codec, 200, 4, 3).unwrap().with_gate(&gate);

    let err = defragmenter
        .notify(&fragment_at(&codec, &src, 1, 50, 50))
        .unwrap_err();
    assert!(matches!(err, FragmentError::HandshakeTimeout { offset: 50, .. }));
    assert!(defragmenter.reconstructed().is_band_blank(50, 50));
    assert_eq!(defragmenter.applied(), 0);

    // The run carries on with the next fragment.
    gate.signal_ready();
    defragmenter.notify(&fragment_at(&codec, &src, 2, 100, 50)).unwrap();
    assert_eq!(defragmenter.applied(), 1);
    assert_eq!(defragmenter.reconstructed().slice(100, 50), src.slice(100, 50));
    assert!(defragmenter.reconstructed().is_band_blank(50, 50));
    assert!(!gate.is_ready());
}

#[test]
#[serial]
fn synchronous_handshake_loses_only_the_first_fragment() {
    let codec = RawCodec::new();
    let src = source(400, 6);
    let run = ExchangeBuilder::new()
        .with_fragment_count(4)
        .with_handshake_timeout(Duration::from_millis(20))
        .run_observer(&src, &codec)
        .unwrap();

    assert_eq!(run.notified.produced, 4);
    assert_eq!(run.notified.delivered, 3);
    assert_eq!(run.notified.timeouts(), vec![0]);
    assert!(run.surface.is_band_blank(0, 100));
    assert_eq!(run.surface.slice(100, 300), src.slice(100, 300));
}

#[test]
#[serial]
fn rendezvous_run_applies_every_fragment() {
    let codec = RawCodec::new();
    let src = source(480, 5);
    let run = ExchangeBuilder::new()
        .with_fragment_count(12)
        .with_handoff_mode(HandoffMode::Rendezvous)
        .run_observer(&src, &codec)
        .unwrap();

    assert_eq!(run.notified.produced, 12);
    assert_eq!(run.notified.delivered, 12);
    assert!(run.notified.timeouts().is_empty());
    assert!(run.receive_failures.is_empty());
    assert_eq!(run.surface, src);
}

#[test]
#[serial]
fn rendezvous_send_waits_for_receive() {
    let (tx, rx) = rendezvous::<u32>();
    let sent = AtomicBool::new(false);

    crossbeam_utils::thread::scope(|s| {
        s.spawn(|_| {
            tx.send(42).unwrap();
            sent.store(true, Ordering::SeqCst);
        });
        thread::sleep(Duration::from_millis(30));
        assert!(!sent.load(Ordering::SeqCst), "send returned before receive");
        assert_eq!(rx.recv(), Some(42));
    })
    .unwrap();
    assert!(sent.load(Ordering::SeqCst));

    drop(tx);
    assert_eq!(rx.recv(), None);
}

#[test]
#[serial]
fn rendezvous_send_fails_once_receiver_is_gone() {
    let (tx, rx) = rendezvous::<u32>();
    drop(rx);
    assert_eq!(tx.send(1), Err(FragmentError::ChannelClosed));
}

struct Recorder {
    name: &'static str,
    log: Rc<RefCell<Vec<(&'static str, usize)>>>,
}

impl Subscriber for Recorder {
    fn notify(&mut self, info: &FragmentInfo) -> fragment_exchange::Result<()> {
        self.log.borrow_mut().push((self.name, info.offset()));
        Ok(())
    }
}

#[test]
fn subscribers_are_called_in_registration_order() {
    let codec = RawCodec::new();
    let src = source(40, 2);
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut first = Recorder { name: "first", log: log.clone() };
    let mut second = Recorder { name: "second", log: log.clone() };

    let mut fragmenter = Fragmenter::new(&codec);
    fragmenter.add_subscriber(&mut first);
    fragmenter.add_subscriber(&mut second);
    let report = fragmenter.fragment(&src, 2).unwrap();

    assert_eq!(report.delivered, 4);
    assert_eq!(
        *log.borrow(),
        vec![("first", 0), ("second", 0), ("first", 20), ("second", 20)]
    );
}

#[test]
fn removing_a_subscriber_stops_its_notifications() {
    let codec = RawCodec::new();
    let src = source(40, 2);
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut first = Recorder { name: "first", log: log.clone() };
    let mut second = Recorder { name: "second", log: log.clone() };

    let mut fragmenter = Fragmenter::new(&codec);
    let first_id = fragmenter.add_subscriber(&mut first);
    let second_id = fragmenter.add_subscriber(&mut second);

    assert!(fragmenter.remove_subscriber(first_id).is_removed());
    // Removing again is a no-op and says so.
    assert!(matches!(fragmenter.remove_subscriber(first_id), Removal::AlreadyRemoved));
    assert_eq!(fragmenter.subscriber_ids(), vec![second_id]);

    // An id from another fragmenter that this one never reached.
    let mut third = Recorder { name: "third", log: log.clone() };
    let mut fourth = Recorder { name: "fourth", log: log.clone() };
    let mut fifth = Recorder { name: "fifth", log: log.clone() };
    let mut other = Fragmenter::new(&codec);
    other.add_subscriber(&mut third);
    other.add_subscriber(&mut fourth);
    let foreign = other.add_subscriber(&mut fifth);
    assert!(matches!(fragmenter.remove_subscriber(foreign), Removal::NeverRegistered));
    assert_eq!(fragmenter.subscriber_ids(), vec![second_id]);

    fragmenter.fragment(&src, 2).unwrap();
    assert_eq!(*log.borrow(), vec![("second", 0), ("second", 20)]);
}
