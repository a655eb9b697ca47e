// src/display_loop.rs

//! The synchronous frame loop.
//!
//! Each step pulls one value and one wait duration, composes and presents
//! the frame, then waits for a key for at most that duration. Keys are acted
//! on between frames only, so a quit always lands after a complete frame.
//!
//! ```text
//!   Running --Pause--> Paused --any key--> Running
//!      |                  |
//!      +--Quit/exhausted--+--Quit--> Stopped
//! ```

use crate::display::DisplaySurface;
use crate::error::{DivergenceError, Result};
use crate::frame::{Frame, FrameCompositor};
use crate::keys::ControlSignal;
use crate::source::{CadenceStream, Constant, FiniteStream, ValueStream};
use log::{debug, error, info, trace, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Paused,
    Stopped,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopReport {
    pub frames_presented: usize,
    pub frames_saved: usize,
    pub final_state: LoopState,
}

/// Window name plus where snapshots go.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub window_name: String,
    pub save_dir: PathBuf,
}

impl LoopSettings {
    pub fn new(window_name: impl Into<String>, save_dir: impl Into<PathBuf>) -> Self {
        LoopSettings {
            window_name: window_name.into(),
            save_dir: save_dir.into(),
        }
    }

    pub fn save_path(&self) -> PathBuf {
        snapshot_path(&self.save_dir, &self.window_name)
    }
}

pub struct DisplayLoop<S: DisplaySurface> {
    values: ValueStream,
    cadence: CadenceStream,
    compositor: FrameCompositor,
    surface: S,
    settings: LoopSettings,
    state: LoopState,
    opened: bool,
    current: Option<Frame>,
    frames_presented: usize,
    frames_saved: usize,
}

impl<S: DisplaySurface> DisplayLoop<S> {
    pub fn new(
        values: ValueStream,
        cadence: CadenceStream,
        compositor: FrameCompositor,
        surface: S,
        settings: LoopSettings,
    ) -> Self {
        DisplayLoop {
            values,
            cadence,
            compositor,
            surface,
            settings,
            state: LoopState::Running,
            opened: false,
            current: None,
            frames_presented: 0,
            frames_saved: 0,
        }
    }

    /// Shows a fixed list of values, `interval_ms` apart, then stops.
    pub fn manual<I>(
        values: I,
        interval_ms: u64,
        compositor: FrameCompositor,
        surface: S,
        settings: LoopSettings,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let values = FiniteStream::new(values.into_iter().map(Into::into));
        Self::new(
            Box::new(values),
            Box::new(Constant::new(interval_ms)),
            compositor,
            surface,
            settings,
        )
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The most recently presented frame.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn report(&self) -> LoopReport {
        LoopReport {
            frames_presented: self.frames_presented,
            frames_saved: self.frames_saved,
            final_state: self.state,
        }
    }

    /// Advances the loop by one transition.
    ///
    /// `UnknownGlyph` and surface I/O failures are returned as errors and
    /// leave the state untouched; a closed surface stops the loop instead.
    pub fn step(&mut self) -> Result<LoopState> {
        if !self.opened && self.state != LoopState::Stopped {
            self.opened = true;
            if let Err(e) = self.surface.open(&self.settings.window_name) {
                self.absorb_closed(e)?;
                return Ok(self.state);
            }
        }
        match self.state {
            LoopState::Running => self.step_running()?,
            LoopState::Paused => self.step_paused()?,
            LoopState::Stopped => {}
        }
        Ok(self.state)
    }

    /// Steps until `Stopped`. The surface is closed on the way out, also when
    /// an error ends the run.
    pub fn run(&mut self) -> Result<LoopReport> {
        info!("DisplayLoop: Starting '{}'", self.settings.window_name);
        while self.state != LoopState::Stopped {
            if let Err(e) = self.step() {
                error!("DisplayLoop: {e}");
                self.stop("error");
                return Err(e);
            }
        }
        let report = self.report();
        info!(
            "DisplayLoop: Finished after {} frames ({} saved)",
            report.frames_presented, report.frames_saved
        );
        Ok(report)
    }

    fn step_running(&mut self) -> Result<()> {
        let Some(value) = self.values.pull().filter(|v| !v.is_empty()) else {
            self.stop("value stream exhausted");
            return Ok(());
        };
        let Some(wait_ms) = self.cadence.pull() else {
            self.stop("cadence stream exhausted");
            return Ok(());
        };

        let frame = self.compositor.compose(&value)?;
        if let Err(e) = self.surface.present(&frame) {
            return self.absorb_closed(e);
        }
        self.frames_presented += 1;
        trace!("DisplayLoop: Presented {:?}, waiting {} ms", value, wait_ms);
        self.current = Some(frame);

        let key = match self.surface.read_key(Some(Duration::from_millis(wait_ms))) {
            Ok(key) => key,
            Err(e) => return self.absorb_closed(e),
        };
        match ControlSignal::from(key) {
            ControlSignal::Quit => self.stop("quit key"),
            ControlSignal::Save => self.save_current(),
            ControlSignal::Pause => {
                debug!("DisplayLoop: Paused");
                self.state = LoopState::Paused;
            }
            ControlSignal::None | ControlSignal::ToggleMode => {}
        }
        Ok(())
    }

    fn step_paused(&mut self) -> Result<()> {
        match self.surface.read_key(None) {
            Ok(Some(key)) if ControlSignal::from(key) == ControlSignal::Quit => {
                self.stop("quit key while paused");
            }
            Ok(Some(_)) => {
                debug!("DisplayLoop: Resumed");
                self.state = LoopState::Running;
            }
            Ok(None) => {}
            Err(e) => return self.absorb_closed(e),
        }
        Ok(())
    }

    fn save_current(&mut self) {
        let Some(frame) = self.current.as_ref() else {
            return;
        };
        let path = self.settings.save_path();
        match self.surface.save(frame, &path) {
            Ok(()) => {
                self.frames_saved += 1;
                info!("DisplayLoop: Saved {:?} to {}", frame.value(), path.display());
            }
            Err(e) => warn!("DisplayLoop: {e}"),
        }
    }

    /// A closed surface ends the loop; anything else is passed up.
    fn absorb_closed(&mut self, e: DivergenceError) -> Result<()> {
        if e.is_implicit_quit() {
            self.stop("surface closed");
            Ok(())
        } else {
            Err(e)
        }
    }

    fn stop(&mut self, reason: &str) {
        debug!("DisplayLoop: Stopping ({reason})");
        self.state = LoopState::Stopped;
        if let Err(e) = self.surface.close() {
            warn!("DisplayLoop: Closing surface failed: {e}");
        }
    }
}

/// Where both loops save: `<save_dir>/<window_name>.png`.
pub fn snapshot_path(save_dir: &Path, window_name: &str) -> PathBuf {
    save_dir.join(format!("{window_name}.png"))
}
