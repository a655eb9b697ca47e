// src/display/surface.rs
//! DisplaySurface trait - the collaborator the display loops draw on.
//!
//! A surface shows whole frames, reports key presses, and can write the
//! current frame to disk. It never composes anything itself.
//!
//! ## Lifecycle
//! 1. `open(window_name)` - create or claim the window
//! 2. `present` / `read_key` in alternation, driven by a loop
//! 3. `close()` - release the window; later calls fail with
//!    `DisplaySurfaceClosed`

use crate::error::Result;
use crate::frame::Frame;
use crate::keys::KeyInput;
use std::path::Path;
use std::time::Duration;

pub trait DisplaySurface {
    fn open(&mut self, window_name: &str) -> Result<()>;

    /// Shows `frame`, replacing whatever was shown before.
    ///
    /// Fails with `DisplaySurfaceClosed` once the user has closed the window.
    fn present(&mut self, frame: &Frame) -> Result<()>;

    /// Waits up to `timeout` for a key press, or indefinitely for `None`.
    ///
    /// Returns early when a key arrives. `Ok(None)` means the timeout
    /// elapsed with no input.
    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<KeyInput>>;

    /// Writes `frame` to `path` losslessly.
    fn save(&mut self, frame: &Frame, path: &Path) -> Result<()> {
        frame.save_png(path)
    }

    fn close(&mut self) -> Result<()>;
}

impl<S: DisplaySurface + ?Sized> DisplaySurface for Box<S> {
    fn open(&mut self, window_name: &str) -> Result<()> {
        (**self).open(window_name)
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        (**self).present(frame)
    }

    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<KeyInput>> {
        (**self).read_key(timeout)
    }

    fn save(&mut self, frame: &Frame, path: &Path) -> Result<()> {
        (**self).save(frame, path)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<S: DisplaySurface + ?Sized> DisplaySurface for &mut S {
    fn open(&mut self, window_name: &str) -> Result<()> {
        (**self).open(window_name)
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        (**self).present(frame)
    }

    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<KeyInput>> {
        (**self).read_key(timeout)
    }

    fn save(&mut self, frame: &Frame, path: &Path) -> Result<()> {
        (**self).save(frame, path)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
