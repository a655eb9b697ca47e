// src/display/drivers/headless.rs
//! Headless display surface: records frames instead of showing them.
//!
//! Keys are scripted up front and released once a given number of frames has
//! been presented, which makes loop behaviour reproducible without a
//! terminal. Used by the tests and by `--headless`.

use crate::display::DisplaySurface;
use crate::error::{DivergenceError, Result};
use crate::frame::Frame;
use crate::keys::KeyInput;
use log::{debug, info, trace};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
struct ScriptedKey {
    after_presentations: usize,
    key: KeyInput,
}

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    window_name: Option<String>,
    presented: Vec<Frame>,
    saved: Vec<PathBuf>,
    script: Vec<ScriptedKey>,
    close_after: Option<usize>,
    realtime: bool,
    discard_history: bool,
    presentations: usize,
    closed: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        HeadlessSurface::default()
    }

    /// Queues `key`, readable once `presentations` frames have been shown.
    /// Keys come out in the order they were scripted.
    pub fn with_key_after(mut self, presentations: usize, key: KeyInput) -> Self {
        self.script.push(ScriptedKey {
            after_presentations: presentations,
            key,
        });
        self
    }

    /// Simulates the user closing the window after `frames` presentations.
    pub fn close_after(mut self, frames: usize) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// Actually sleeps through key timeouts instead of returning at once.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Keeps only the latest frame. For long unattended runs.
    pub fn discard_history(mut self) -> Self {
        self.discard_history = true;
        self
    }

    pub fn window_name(&self) -> Option<&str> {
        self.window_name.as_deref()
    }

    /// Every presented frame, oldest first.
    pub fn frames(&self) -> &[Frame] {
        &self.presented
    }

    pub fn presentations(&self) -> usize {
        self.presentations
    }

    pub fn values(&self) -> Vec<&str> {
        self.presented.iter().map(Frame::value).collect()
    }

    pub fn saved_paths(&self) -> &[PathBuf] {
        &self.saved
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn next_ready_key(&mut self) -> Option<KeyInput> {
        let ready = self
            .script
            .iter()
            .position(|k| k.after_presentations <= self.presentations)?;
        Some(self.script.remove(ready).key)
    }
}

impl DisplaySurface for HeadlessSurface {
    fn open(&mut self, window_name: &str) -> Result<()> {
        info!("HeadlessSurface: Open '{}'", window_name);
        self.window_name = Some(window_name.to_string());
        self.closed = false;
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        if self.closed || self.close_after.is_some_and(|n| self.presentations >= n) {
            debug!("HeadlessSurface: Present on closed window");
            self.closed = true;
            return Err(DivergenceError::DisplaySurfaceClosed);
        }
        trace!("HeadlessSurface: Present {:?}", frame);
        if self.discard_history {
            self.presented.clear();
        }
        self.presented.push(frame.clone());
        self.presentations += 1;
        Ok(())
    }

    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<KeyInput>> {
        if self.closed {
            return Err(DivergenceError::DisplaySurfaceClosed);
        }
        if let Some(key) = self.next_ready_key() {
            trace!("HeadlessSurface: Key {:?}", key);
            return Ok(Some(key));
        }
        match timeout {
            Some(wait) => {
                if self.realtime && !wait.is_zero() {
                    std::thread::sleep(wait);
                }
                Ok(None)
            }
            // Nothing will ever arrive while blocked; treat it as a closed window.
            None => {
                debug!("HeadlessSurface: Blocking read with an empty script");
                self.closed = true;
                Err(DivergenceError::DisplaySurfaceClosed)
            }
        }
    }

    fn save(&mut self, frame: &Frame, path: &Path) -> Result<()> {
        frame.save_png(path)?;
        self.saved.push(path.to_path_buf());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        info!("HeadlessSurface: Close");
        self.closed = true;
        Ok(())
    }
}
