// src/actor/presenter.rs

//! Presenter: the owning-thread half of the threaded session.
//!
//! Shows whatever frame the producer last posted and handles keys between
//! polls. Unlike the synchronous loop it understands `ToggleMode`, which it
//! forwards to the producer through the mailbox.

use super::mailbox::{Delivery, FrameMailbox, LatestFrame};
use crate::display::DisplaySurface;
use crate::display_loop::{snapshot_path, LoopReport, LoopState};
use crate::error::{DivergenceError, Result};
use crate::keys::ControlSignal;
use crate::source::value::ValueMode;
use log::{debug, info, trace, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PresenterSettings {
    pub clock_window: String,
    pub meter_window: String,
    pub save_dir: PathBuf,
    /// Key poll timeout between mailbox checks.
    pub poll: Duration,
}

impl PresenterSettings {
    pub fn window_name(&self, mode: ValueMode) -> &str {
        match mode {
            ValueMode::Clock => &self.clock_window,
            ValueMode::Meter => &self.meter_window,
        }
    }
}

pub struct Presenter<'a, S: DisplaySurface + ?Sized> {
    surface: &'a mut S,
    mailbox: Arc<FrameMailbox>,
    settings: PresenterSettings,
    state: LoopState,
    current: Option<LatestFrame>,
    frames_presented: usize,
    frames_saved: usize,
}

impl<'a, S: DisplaySurface + ?Sized> Presenter<'a, S> {
    pub fn new(surface: &'a mut S, mailbox: Arc<FrameMailbox>, settings: PresenterSettings) -> Self {
        Presenter {
            surface,
            mailbox,
            settings,
            state: LoopState::Running,
            current: None,
            frames_presented: 0,
            frames_saved: 0,
        }
    }

    /// Runs until a quit, a closed surface, or the producer finishing.
    ///
    /// The mailbox is closed on the way out so the producer stops too. An
    /// error the producer stopped with is returned from here.
    pub fn run(&mut self) -> Result<LoopReport> {
        let mode = self.mailbox.mode();
        if let Err(e) = self.surface.open(self.settings.window_name(mode)) {
            self.absorb_closed(e)?;
        }
        info!("Presenter: Running in {} mode", mode);

        while self.state != LoopState::Stopped {
            let stepped = match self.state {
                LoopState::Running => self.step_running(),
                LoopState::Paused => self.step_paused(),
                LoopState::Stopped => Ok(()),
            };
            if let Err(e) = stepped {
                self.stop("error");
                return Err(e);
            }
        }

        if let Some(e) = self.mailbox.take_error() {
            return Err(e);
        }
        info!(
            "Presenter: Finished after {} frames, {} dropped",
            self.frames_presented,
            self.mailbox.dropped()
        );
        Ok(LoopReport {
            frames_presented: self.frames_presented,
            frames_saved: self.frames_saved,
            final_state: self.state,
        })
    }

    fn step_running(&mut self) -> Result<()> {
        match self.mailbox.collect() {
            Delivery::Frame(latest) => {
                if let Err(e) = self.surface.present(&latest.frame) {
                    return self.absorb_closed(e);
                }
                self.frames_presented += 1;
                trace!("Presenter: Presented {:?}", latest.frame.value());
                self.current = Some(latest);
            }
            Delivery::Finished => {
                self.stop("producer finished");
                return Ok(());
            }
            Delivery::Empty => {}
        }

        let key = match self.surface.read_key(Some(self.settings.poll)) {
            Ok(key) => key,
            Err(e) => return self.absorb_closed(e),
        };
        match ControlSignal::from(key) {
            ControlSignal::Quit => self.stop("quit key"),
            ControlSignal::Save => self.save_current(),
            ControlSignal::Pause => {
                debug!("Presenter: Paused");
                self.state = LoopState::Paused;
            }
            ControlSignal::ToggleMode => {
                let mode = self.mailbox.toggle_mode();
                info!("Presenter: Switching to {} mode", mode);
                if let Err(e) = self.surface.open(self.settings.window_name(mode)) {
                    return self.absorb_closed(e);
                }
            }
            ControlSignal::None => {}
        }
        Ok(())
    }

    fn step_paused(&mut self) -> Result<()> {
        match self.surface.read_key(None) {
            Ok(Some(key)) if ControlSignal::from(key) == ControlSignal::Quit => {
                self.stop("quit key while paused");
            }
            Ok(Some(_)) => {
                debug!("Presenter: Resumed");
                self.state = LoopState::Running;
            }
            Ok(None) => {}
            Err(e) => return self.absorb_closed(e),
        }
        Ok(())
    }

    fn save_current(&mut self) {
        let Some(current) = self.current.as_ref() else {
            return;
        };
        let path = snapshot_path(
            &self.settings.save_dir,
            self.settings.window_name(current.mode),
        );
        match self.surface.save(&current.frame, &path) {
            Ok(()) => {
                self.frames_saved += 1;
                info!("Presenter: Saved {}", path.display());
            }
            Err(e) => warn!("Presenter: {e}"),
        }
    }

    fn absorb_closed(&mut self, e: DivergenceError) -> Result<()> {
        if e.is_implicit_quit() {
            self.stop("surface closed");
            Ok(())
        } else {
            Err(e)
        }
    }

    fn stop(&mut self, reason: &str) {
        debug!("Presenter: Stopping ({reason})");
        self.state = LoopState::Stopped;
        self.mailbox.close();
        if let Err(e) = self.surface.close() {
            warn!("Presenter: Closing surface failed: {e}");
        }
    }
}
