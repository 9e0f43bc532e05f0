//! Single-slot rendezvous: `send` returns only after the receiver has taken the value.
//! One value is in flight at a time; dropping either end wakes the other.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::{FragmentError, Result};

struct Slot<T> {
    item: Option<T>,
    sent: u64,
    taken: u64,
    sender_alive: bool,
    receiver_alive: bool,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    cond: Condvar,
}

pub fn rendezvous<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot {
            item: None,
            sent: 0,
            taken: 0,
            sender_alive: true,
            receiver_alive: true,
        }),
        cond: Condvar::new(),
    });
    (HandoffSender(shared.clone()), HandoffReceiver(shared))
}

pub struct HandoffSender<T>(Arc<Shared<T>>);

impl<T> HandoffSender<T> {
    /// Place `value` in the slot and block until the receiver has taken it.
    ///
    /// Fails with [`FragmentError::ChannelClosed`] if the receiver is gone.
    pub fn send(&self, value: T) -> Result<()> {
        let shared = &*self.0;
        let mut slot = shared.slot.lock();
        shared
            .cond
            .wait_while(&mut slot, |s| s.item.is_some() && s.receiver_alive);
        if !slot.receiver_alive {
            return Err(FragmentError::ChannelClosed);
        }

        slot.item = Some(value);
        slot.sent += 1;
        let ticket = slot.sent;
        shared.cond.notify_all();

        shared
            .cond
            .wait_while(&mut slot, |s| s.taken < ticket && s.receiver_alive);
        if slot.taken < ticket {
            slot.item = None;
            return Err(FragmentError::ChannelClosed);
        }
        Ok(())
    }
}

impl<T> Drop for HandoffSender<T> {
    fn drop(&mut self) {
        self.0.slot.lock().sender_alive = false;
        self.0.cond.notify_all();
    }
}

pub struct HandoffReceiver<T>(Arc<Shared<T>>);

impl<T> HandoffReceiver<T> {
    /// Take the next value, blocking until one is offered.
    /// Returns `None` once the sender is dropped and the slot is empty.
    pub fn recv(&self) -> Option<T> {
        let shared = &*self.0;
        let mut slot = shared.slot.lock();
        shared
            .cond
            .wait_while(&mut slot, |s| s.item.is_none() && s.sender_alive);

        let item = slot.item.take()?;
        slot.taken += 1;
        shared.cond.notify_all();
        Some(item)
    }
}

impl<T> Drop for HandoffReceiver<T> {
    fn drop(&mut self) {
        self.0.slot.lock().receiver_alive = false;
        self.0.cond.notify_all();
    }
}
