// src/display/drivers/console.rs

//! Provides a `DisplaySurface` that draws frames on a Unix terminal.
//!
//! Pixels are rendered two per character cell with the upper-half block
//! (`▀`): the foreground colour paints the top pixel and the background the
//! bottom one, using 24-bit SGR colours. Each frame is scaled to fit the
//! terminal with its aspect ratio kept, then centred; a resize is picked up
//! on the next presentation.
//!
//! Input runs in raw mode so single key presses (including Ctrl-C) reach the
//! loop directly. The original terminal attributes are restored on `close`
//! and again on drop.

use crate::display::DisplaySurface;
use crate::error::{DivergenceError, Result};
use crate::frame::{Frame, BACKGROUND};
use crate::keys::KeyInput;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use libc::{winsize, STDIN_FILENO, TIOCGWINSZ};
use log::{debug, error, info, trace, warn};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io::{self, stdin, stdout, Read, Write};
use std::mem;
use std::os::unix::io::RawFd;
use std::time::Duration;
use termios::{tcsetattr, Termios, ECHO, ICANON, ISIG, TCSANOW, VMIN, VTIME};

// --- ANSI Escape Code Constants ---
const CURSOR_HIDE: &str = "\x1b[?25l";
const CURSOR_SHOW: &str = "\x1b[?25h";
const SGR_RESET: &str = "\x1b[0m";
const CLEAR_SCREEN_AND_HOME: &str = "\x1b[2J\x1b[H";
const UPPER_HALF_BLOCK: char = '\u{2580}';

// Used when the terminal reports a zero size (e.g. some CI ptys).
const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;

pub struct ConsoleSurface {
    /// Stores the original terminal attributes to restore them on cleanup.
    original_termios: Option<Termios>,
    last_size: (u16, u16),
    pending: VecDeque<KeyInput>,
    input_buffer: [u8; 64],
    closed: bool,
}

impl ConsoleSurface {
    /// Puts the terminal into raw mode.
    ///
    /// If stdin is not a terminal the surface still works for output; input
    /// is then read as plain bytes.
    pub fn new() -> Result<Self> {
        info!("ConsoleSurface: Creating new console surface.");
        let original_termios = match Termios::from_fd(STDIN_FILENO) {
            Ok(ts) => Some(ts),
            Err(e) => {
                warn!(
                    "ConsoleSurface: Failed to get initial termios: {}. Proceeding without raw mode.",
                    e
                );
                None
            }
        };

        if let Some(ref ots) = original_termios {
            let mut raw_termios = *ots;
            raw_termios.c_lflag &= !(ECHO | ICANON | ISIG);
            raw_termios.c_iflag &= !(libc::IXON | libc::IXOFF | libc::ICRNL | libc::INLCR);
            // Reads return whatever is buffered; poll() provides the wait.
            raw_termios.c_cc[VMIN] = 0;
            raw_termios.c_cc[VTIME] = 0;
            match tcsetattr(STDIN_FILENO, TCSANOW, &raw_termios) {
                Ok(()) => debug!("ConsoleSurface: Terminal set to raw mode."),
                Err(e) => warn!(
                    "ConsoleSurface: Failed to set raw terminal attributes: {}. Keys may need Enter.",
                    e
                ),
            }
        }

        let last_size = get_terminal_size_cells(STDIN_FILENO).unwrap_or_else(|e| {
            warn!("ConsoleSurface: {}. Assuming {}x{}.", e, DEFAULT_COLS, DEFAULT_ROWS);
            (DEFAULT_COLS, DEFAULT_ROWS)
        });
        info!(
            "ConsoleSurface: Initial terminal size: {}x{} cells.",
            last_size.0, last_size.1
        );

        Ok(ConsoleSurface {
            original_termios,
            last_size,
            pending: VecDeque::new(),
            input_buffer: [0u8; 64],
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(DivergenceError::DisplaySurfaceClosed)
        } else {
            Ok(())
        }
    }

    /// Waits for stdin to become readable. Returns false on timeout.
    fn poll_stdin(timeout: Option<Duration>) -> Result<bool> {
        let timeout_ms: libc::c_int = match timeout {
            Some(d) => d.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
            None => -1,
        };
        let mut fds = libc::pollfd {
            fd: STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: `fds` is a valid pollfd for the duration of the call.
        let rc = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                trace!("ConsoleSurface: poll interrupted.");
                return Ok(false);
            }
            return Err(err.into());
        }
        Ok(rc > 0)
    }

    fn cleanup(&mut self) -> Result<()> {
        let mut out = stdout();
        write!(out, "{SGR_RESET}{CURSOR_SHOW}{CLEAR_SCREEN_AND_HOME}")?;
        out.flush()?;
        if let Some(original) = self.original_termios.take() {
            debug!("ConsoleSurface: Restoring original terminal attributes.");
            tcsetattr(STDIN_FILENO, TCSANOW, &original)?;
        }
        Ok(())
    }
}

impl DisplaySurface for ConsoleSurface {
    fn open(&mut self, window_name: &str) -> Result<()> {
        self.ensure_open()?;
        let mut out = stdout();
        // OSC 0 sets the terminal title.
        write!(out, "\x1b]0;{window_name}\x07{CURSOR_HIDE}{CLEAR_SCREEN_AND_HOME}")?;
        out.flush()?;
        info!("ConsoleSurface: Opened '{}'", window_name);
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.ensure_open()?;
        let size = get_terminal_size_cells(STDIN_FILENO).unwrap_or(self.last_size);
        let mut output = String::new();
        if size != self.last_size {
            info!(
                "ConsoleSurface: Terminal resized from {}x{} to {}x{} cells.",
                self.last_size.0, self.last_size.1, size.0, size.1
            );
            self.last_size = size;
            output.push_str(SGR_RESET);
            output.push_str(CLEAR_SCREEN_AND_HOME);
        }

        let (cols, rows) = (u32::from(size.0), u32::from(size.1));
        let (w, h) = fit_within(frame.width(), frame.height(), cols, rows * 2);
        let scaled = imageops::resize(frame.image(), w, h, FilterType::Triangle);
        let origin = ((cols - w) / 2, (rows - h.div_ceil(2)) / 2);
        render_half_blocks(&scaled, origin, &mut output);

        let mut out = stdout();
        out.write_all(output.as_bytes())?;
        out.flush()?;
        trace!("ConsoleSurface: Presented {:?} as {}x{} px", frame.value(), w, h);
        Ok(())
    }

    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<KeyInput>> {
        self.ensure_open()?;
        if let Some(key) = self.pending.pop_front() {
            return Ok(Some(key));
        }
        if !Self::poll_stdin(timeout)? {
            return Ok(None);
        }
        match stdin().read(&mut self.input_buffer) {
            Ok(0) => {
                info!("ConsoleSurface: EOF on stdin. Treating as closed.");
                self.closed = true;
                Err(DivergenceError::DisplaySurfaceClosed)
            }
            Ok(n) => {
                trace!("ConsoleSurface: Read {} bytes from stdin.", n);
                self.pending
                    .extend(KeyInput::decode(&self.input_buffer[..n]));
                Ok(self.pending.pop_front())
            }
            Err(ref e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed && self.original_termios.is_none() {
            return Ok(());
        }
        info!("ConsoleSurface: Closing.");
        self.closed = true;
        self.cleanup()
    }
}

/// Ensures the terminal is restored when the surface is dropped.
impl Drop for ConsoleSurface {
    fn drop(&mut self) {
        if self.original_termios.is_some() {
            if let Err(e) = self.cleanup() {
                error!("ConsoleSurface: Error during cleanup in drop: {}", e);
            }
        }
    }
}

/// Largest size with the aspect ratio of `width x height` that fits inside
/// `max_width x max_height`. Never returns a zero dimension.
fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (1, 1);
    }
    let (width, height) = (u64::from(width), u64::from(height));
    let (max_w, max_h) = (u64::from(max_width.max(1)), u64::from(max_height.max(1)));
    let (w, h) = if width * max_h >= height * max_w {
        (max_w, height * max_w / width)
    } else {
        (width * max_h / height, max_h)
    };
    (w.max(1) as u32, h.max(1) as u32)
}

/// Appends cursor moves and half-block cells drawing `image` with its top
/// left corner at cell `origin` (0-based column, row).
fn render_half_blocks(image: &RgbImage, origin: (u32, u32), out: &mut String) {
    let mut last: Option<(Rgb<u8>, Rgb<u8>)> = None;
    for cell_row in 0..image.height().div_ceil(2) {
        // CUP is 1-based.
        let _ = write!(out, "\x1b[{};{}H", origin.1 + cell_row + 1, origin.0 + 1);
        for x in 0..image.width() {
            let top = *image.get_pixel(x, cell_row * 2);
            let bottom = if cell_row * 2 + 1 < image.height() {
                *image.get_pixel(x, cell_row * 2 + 1)
            } else {
                BACKGROUND
            };
            if last != Some((top, bottom)) {
                let (Rgb([fr, fg, fb]), Rgb([br, bg, bb])) = (top, bottom);
                let _ = write!(out, "\x1b[38;2;{fr};{fg};{fb};48;2;{br};{bg};{bb}m");
                last = Some((top, bottom));
            }
            out.push(UPPER_HALF_BLOCK);
        }
    }
    out.push_str(SGR_RESET);
}

/// Retrieves the terminal size in character cells using an `ioctl` call.
fn get_terminal_size_cells(fd: RawFd) -> io::Result<(u16, u16)> {
    // SAFETY: `ioctl` is an FFI call. `winsz` must be valid.
    unsafe {
        let mut winsz: winsize = mem::zeroed();
        if libc::ioctl(fd, TIOCGWINSZ, &mut winsz) == -1 {
            return Err(io::Error::last_os_error());
        }
        let cols = if winsz.ws_col == 0 {
            DEFAULT_COLS
        } else {
            winsz.ws_col
        };
        let rows = if winsz.ws_row == 0 {
            DEFAULT_ROWS
        } else {
            winsz.ws_row
        };
        Ok((cols, rows))
    }
}
