// src/display/mod.rs
//! Display surfaces the frame loops present to.
//!
//! - DisplaySurface: the trait the loops are written against
//! - drivers: a raw-mode terminal and a headless recorder

pub mod drivers;
pub mod surface;

pub use drivers::{ConsoleSurface, HeadlessSurface};
pub use surface::DisplaySurface;
