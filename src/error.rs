// src/error.rs

//! Error taxonomy for the frame engine.
//!
//! Library code returns `DivergenceError` so callers can branch on the kind
//! (a closed surface is a quit, a failed save is only reported). The binary
//! wraps these in `anyhow` at the application boundary.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DivergenceError {
    /// A glyph bitmap is absent or unreadable. Fatal at startup.
    #[error("glyph asset for {ch:?} missing at {}: {reason}", path.display())]
    AssetMissing {
        ch: char,
        path: PathBuf,
        reason: String,
    },

    /// A value-string contains a character outside the atlas.
    #[error("no glyph for character {0:?}")]
    UnknownGlyph(char),

    /// The display surface reported that its window is gone.
    #[error("display surface closed")]
    DisplaySurfaceClosed,

    /// Writing a frame snapshot failed. Non-fatal.
    #[error("failed to save frame to {}: {reason}", path.display())]
    SaveFailed { path: PathBuf, reason: String },

    /// Low-level I/O failure talking to the display surface.
    #[error("display surface I/O error: {0}")]
    Surface(#[from] io::Error),

    /// A worker thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    /// Configuration file could not be read or parsed.
    #[error("invalid configuration at {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl DivergenceError {
    /// True for errors that end the display loop the same way a quit key does.
    pub fn is_implicit_quit(&self) -> bool {
        matches!(self, DivergenceError::DisplaySurfaceClosed)
    }
}

pub type Result<T, E = DivergenceError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_surface_is_an_implicit_quit() {
        assert!(DivergenceError::DisplaySurfaceClosed.is_implicit_quit());
        assert!(!DivergenceError::UnknownGlyph('a').is_implicit_quit());
    }

    #[test]
    fn messages_name_the_offending_input() {
        let err = DivergenceError::AssetMissing {
            ch: '7',
            path: PathBuf::from("img/7.png"),
            reason: "not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'7'"), "{msg}");
        assert!(msg.contains("img/7.png"), "{msg}");
        assert_eq!(
            DivergenceError::UnknownGlyph('a').to_string(),
            "no glyph for character 'a'"
        );
    }
}
