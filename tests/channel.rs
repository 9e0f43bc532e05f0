use fragment_exchange::Exchange::{FragmentChannel, Structs::FragmentInfo};
use fragment_exchange::FragmentError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

fn info(index: usize) -> FragmentInfo {
    FragmentInfo::new(index, index * 10, vec![index as u8; 4])
}

#[test]
fn zero_capacity_is_rejected() {
    assert!(matches!(
        FragmentChannel::new(0),
        Err(FragmentError::InvalidConfig(_))
    ));
}

#[test]
fn drain_at_reads_without_removing() {
    let channel = FragmentChannel::new(4).unwrap();
    channel.push(info(0)).unwrap();
    channel.push(info(1)).unwrap();

    for _ in 0..3 {
        assert_eq!(channel.drain_at(1).unwrap(), info(1));
    }
    assert_eq!(channel.len(), 2);
    assert_eq!(channel.reads(), 3);
    assert_eq!(channel.pushed(), 2);
}

#[test]
fn index_past_contents_is_out_of_range() {
    let channel = FragmentChannel::new(4).unwrap();
    channel.push(info(0)).unwrap();
    assert_eq!(
        channel.drain_at(3).unwrap_err(),
        FragmentError::IndexOutOfRange { index: 3, len: 1 }
    );
}

#[test]
fn drain_blocks_until_first_push() {
    let channel = FragmentChannel::new(2).unwrap();
    let pushed = AtomicBool::new(false);

    crossbeam_utils::thread::scope(|s| {
        let reader = s.spawn(|_| {
            let got = channel.drain_at(0).unwrap();
            assert!(pushed.load(Ordering::SeqCst), "drain returned before push");
            got
        });
        thread::sleep(Duration::from_millis(50));
        pushed.store(true, Ordering::SeqCst);
        channel.push(info(0)).unwrap();
        assert_eq!(reader.join().unwrap(), info(0));
    })
    .unwrap();
}

#[test]
fn close_wakes_drain_on_empty_channel() {
    let channel = FragmentChannel::new(2).unwrap();
    crossbeam_utils::thread::scope(|s| {
        let reader = s.spawn(|_| channel.drain_at(0));
        thread::sleep(Duration::from_millis(20));
        channel.close();
        assert_eq!(reader.join().unwrap(), Err(FragmentError::ChannelClosed));
    })
    .unwrap();
}

#[test]
fn push_blocks_while_full_until_closed() {
    let channel = FragmentChannel::new(1).unwrap();
    channel.push(info(0)).unwrap();

    crossbeam_utils::thread::scope(|s| {
        let writer = s.spawn(|_| channel.push(info(1)));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(channel.len(), 1);
        channel.close();
        assert_eq!(writer.join().unwrap(), Err(FragmentError::ChannelClosed));
    })
    .unwrap();
    assert_eq!(channel.len(), 1);
}

#[test]
fn consumed_set_records_each_index_once() {
    let channel = FragmentChannel::new(3).unwrap();
    assert!(!channel.is_consumed(2));
    assert!(channel.mark_consumed(2));
    assert!(!channel.mark_consumed(2));
    assert!(channel.is_consumed(2));
    assert_eq!(channel.consumed_count(), 1);
}

#[test]
fn never_holds_more_than_capacity() {
    let n = 32;
    let channel = FragmentChannel::new(n).unwrap();

    crossbeam_utils::thread::scope(|s| {
        s.spawn(|_| {
            for i in 0..n {
                channel.push(info(i)).unwrap();
            }
            channel.close();
        });
        s.spawn(|_| {
            let mut i = 0;
            while i < n {
                match channel.drain_at(i) {
                    Ok(_) => i += 1,
                    Err(FragmentError::IndexOutOfRange { .. }) => thread::yield_now(),
                    Err(e) => panic!("unexpected {e}"),
                }
            }
        });
    })
    .unwrap();

    assert_eq!(channel.len(), n);
    assert!(channel.peak_len() <= n);
    assert!(channel.is_closed());
    assert!(channel.push(info(0)).is_err());
}

#[test]
fn wait_for_growth_returns_on_timeout() {
    let channel = FragmentChannel::new(2).unwrap();
    let start = std::time::Instant::now();
    assert_eq!(channel.wait_for_growth(0, Duration::from_millis(30)), 0);
    assert!(start.elapsed() >= Duration::from_millis(25));
}

#[test]
fn debug_output_does_not_expose_payload() {
    let channel = FragmentChannel::new(2).unwrap();
    channel.push(info(1)).unwrap();
    let dbg = format!("{:?}", channel);
    assert!(dbg.contains("capacity: 2"));
    assert!(dbg.contains("len: 1"));
    assert!(format!("{:?}", info(1)).contains("<opaque>"));
}
