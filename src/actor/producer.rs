// src/actor/producer.rs

//! Producer actor: composes frames on a background thread and posts them to
//! the mailbox, sleeping out each cadence duration in between.
//!
//! The requested mode is sampled once per iteration. When it differs from
//! the mode the current sources were built for, both sources are rebuilt
//! before the next pull, so a toggle never tears an iteration in half.

use super::mailbox::FrameMailbox;
use crate::error::{DivergenceError, Result};
use crate::frame::FrameCompositor;
use crate::source::value::ValueMode;
use crate::source::{CadenceStream, ValueStream};
use log::*;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Builds fresh value and cadence streams for a mode.
pub type SourceFactory =
    Box<dyn FnMut(ValueMode) -> Result<(ValueStream, CadenceStream)> + Send>;

pub struct ProducerActor {
    mailbox: Arc<FrameMailbox>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ProducerActor {
    /// Spawns the producer thread.
    ///
    /// The thread ends when a stream is exhausted, when composing fails, or
    /// when the mailbox is closed. In every case it marks the mailbox
    /// finished, handing over the error if there was one.
    pub fn spawn(
        mailbox: Arc<FrameMailbox>,
        compositor: FrameCompositor,
        factory: SourceFactory,
    ) -> Result<Self> {
        info!("ProducerActor: Spawning background thread");
        let thread_mailbox = Arc::clone(&mailbox);
        let thread_handle = thread::Builder::new()
            .name("producer".to_string())
            .spawn(move || {
                let result = Self::actor_thread_main(&thread_mailbox, compositor, factory);
                if let Err(ref e) = result {
                    error!("ProducerActor thread error: {}", e);
                }
                thread_mailbox.finish(result.err());
                debug!("ProducerActor: Thread exiting");
            })
            .map_err(|source| DivergenceError::ThreadSpawn {
                name: "producer",
                source,
            })?;

        Ok(Self {
            mailbox,
            thread_handle: Some(thread_handle),
        })
    }

    fn actor_thread_main(
        mailbox: &FrameMailbox,
        compositor: FrameCompositor,
        mut factory: SourceFactory,
    ) -> Result<()> {
        let mut mode = mailbox.mode();
        let (mut values, mut cadence) = factory(mode)?;
        info!("ProducerActor: Started in {} mode", mode);

        loop {
            if mailbox.is_closed() {
                info!("ProducerActor: Mailbox closed, shutting down");
                return Ok(());
            }

            let wanted = mailbox.mode();
            if wanted != mode {
                info!("ProducerActor: Switching {} -> {}", mode, wanted);
                (values, cadence) = factory(wanted)?;
                mode = wanted;
            }

            let Some(value) = values.pull().filter(|v| !v.is_empty()) else {
                info!("ProducerActor: Value stream exhausted");
                return Ok(());
            };
            let Some(wait_ms) = cadence.pull() else {
                info!("ProducerActor: Cadence stream exhausted");
                return Ok(());
            };

            let frame = compositor.compose(&value)?;
            if !mailbox.post(frame, mode) {
                return Ok(());
            }
            trace!("ProducerActor: Posted {:?}, next in {} ms", value, wait_ms);

            if mailbox.wait_closed(Duration::from_millis(wait_ms)) {
                info!("ProducerActor: Closed during wait, shutting down");
                return Ok(());
            }
        }
    }
}

impl Drop for ProducerActor {
    fn drop(&mut self) {
        debug!("ProducerActor dropped");
        self.mailbox.close();
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                error!("ProducerActor thread panicked: {:?}", e);
            }
        }
    }
}
