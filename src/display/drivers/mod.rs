// src/display/drivers/mod.rs

pub mod console;
pub mod headless;

pub use console::ConsoleSurface;
pub use headless::HeadlessSurface;
