// src/lib.rs

//! Nixie-tube style digit display: a wall clock or a flickering "divergence
//! meter" readout, composed from per-glyph bitmaps and redrawn on an
//! irregular cadence.
//!
//! Data flows leaf to root: [`source`] streams produce value-strings and wait
//! durations, [`frame`] composes a value into a bitmap using the
//! [`glyph`] atlas, and [`display_loop`] (or the threaded [`actor`] pair)
//! presents frames on a [`display`] surface and reacts to [`keys`].

pub mod actor;
pub mod config;
pub mod display;
pub mod display_loop;
pub mod error;
pub mod frame;
pub mod glyph;
pub mod keys;
pub mod session;
pub mod source;

pub use error::{DivergenceError, Result};
