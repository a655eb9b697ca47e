// src/actor/mailbox.rs

//! One-deep, overwriting hand-off between the producer and the presenter.
//!
//! Not a queue: the presenter only ever wants the newest frame, so a post
//! replaces whatever is still waiting and counts it as dropped. The same
//! lock guards the requested mode and the shutdown flags.

use crate::error::DivergenceError;
use crate::frame::Frame;
use crate::source::value::ValueMode;
use log::{debug, trace};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A frame plus the mode it was produced in.
#[derive(Debug, Clone)]
pub struct LatestFrame {
    pub frame: Frame,
    pub mode: ValueMode,
}

/// What the presenter finds when it checks the mailbox.
#[derive(Debug)]
pub enum Delivery {
    Frame(LatestFrame),
    Empty,
    /// Empty, and the producer is done.
    Finished,
}

#[derive(Debug)]
struct Slot {
    latest: Option<LatestFrame>,
    mode: ValueMode,
    /// Set by the presenter: stop producing.
    closed: bool,
    /// Set by the producer: no more frames will come.
    finished: bool,
    error: Option<DivergenceError>,
    posted: u64,
    dropped: u64,
}

#[derive(Debug)]
pub struct FrameMailbox {
    slot: Mutex<Slot>,
    changed: Condvar,
}

impl FrameMailbox {
    pub fn new(mode: ValueMode) -> Self {
        FrameMailbox {
            slot: Mutex::new(Slot {
                latest: None,
                mode,
                closed: false,
                finished: false,
                error: None,
                posted: 0,
                dropped: 0,
            }),
            changed: Condvar::new(),
        }
    }

    // A panic on the other side must not take this side down with it.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the waiting frame. Returns false once the mailbox is closed.
    pub fn post(&self, frame: Frame, mode: ValueMode) -> bool {
        let mut slot = self.lock();
        if slot.closed {
            return false;
        }
        if let Some(stale) = slot.latest.replace(LatestFrame { frame, mode }) {
            slot.dropped += 1;
            trace!("FrameMailbox: Dropped unseen frame {:?}", stale.frame.value());
        }
        slot.posted += 1;
        self.changed.notify_all();
        true
    }

    /// Takes the waiting frame, leaving the slot empty.
    pub fn take(&self) -> Option<LatestFrame> {
        self.lock().latest.take()
    }

    /// Like `take`, but also reports a finished producer. Checked under one
    /// lock, so the last frame is always delivered before `Finished`.
    pub fn collect(&self) -> Delivery {
        let mut slot = self.lock();
        match slot.latest.take() {
            Some(latest) => Delivery::Frame(latest),
            None if slot.finished => Delivery::Finished,
            None => Delivery::Empty,
        }
    }

    /// Sleeps up to `timeout`, waking early if the mailbox is closed.
    /// Returns true if it was closed.
    pub fn wait_closed(&self, timeout: Duration) -> bool {
        let slot = self.lock();
        let (slot, _) = self
            .changed
            .wait_timeout_while(slot, timeout, |s| !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        slot.closed
    }

    pub fn close(&self) {
        let mut slot = self.lock();
        if !slot.closed {
            debug!("FrameMailbox: Closed");
        }
        slot.closed = true;
        self.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Marks the producer as done, optionally with the error that stopped it.
    pub fn finish(&self, error: Option<DivergenceError>) {
        let mut slot = self.lock();
        slot.finished = true;
        slot.error = error;
        self.changed.notify_all();
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    pub fn take_error(&self) -> Option<DivergenceError> {
        self.lock().error.take()
    }

    pub fn mode(&self) -> ValueMode {
        self.lock().mode
    }

    pub fn set_mode(&self, mode: ValueMode) {
        self.lock().mode = mode;
    }

    /// Flips between clock and meter and returns the new mode.
    pub fn toggle_mode(&self) -> ValueMode {
        let mut slot = self.lock();
        slot.mode = slot.mode.toggled();
        slot.mode
    }

    pub fn posted(&self) -> u64 {
        self.lock().posted
    }

    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}
