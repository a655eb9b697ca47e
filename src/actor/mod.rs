// src/actor/mod.rs

//! Threaded variant of the display loop.
//!
//! A `ProducerActor` thread composes frames and posts them to a one-deep
//! `FrameMailbox`; the `Presenter` on the owning thread shows the newest one
//! and handles keys. Frames the presenter never got to are dropped.

pub mod mailbox;
pub mod presenter;
pub mod producer;

pub use mailbox::{Delivery, FrameMailbox, LatestFrame};
pub use presenter::{Presenter, PresenterSettings};
pub use producer::{ProducerActor, SourceFactory};
