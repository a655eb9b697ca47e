// src/source/mod.rs

//! Lazy pull-based streams feeding the display loop.
//!
//! Values and cadence durations are produced independently so the same
//! readout can run on any rhythm. A stream is not restartable; build a fresh
//! one to start over.

pub mod cadence;
pub mod value;

pub use cadence::{BiasedPulse, CadenceState, FixedPulse, PulseLaw};
pub use value::{ClockSource, MeterSource};

use std::collections::VecDeque;

/// A lazy, possibly infinite sequence. `None` means exhausted for good.
pub trait Stream {
    type Item;

    fn pull(&mut self) -> Option<Self::Item>;
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    type Item = S::Item;

    fn pull(&mut self) -> Option<Self::Item> {
        (**self).pull()
    }
}

/// Boxed value-string stream.
pub type ValueStream = Box<dyn Stream<Item = String> + Send>;

/// Boxed duration stream, in milliseconds.
pub type CadenceStream = Box<dyn Stream<Item = u64> + Send>;

/// A finite stream over a fixed list, used for demos and tests.
#[derive(Debug, Clone)]
pub struct FiniteStream<T> {
    items: VecDeque<T>,
}

impl<T> FiniteStream<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        FiniteStream {
            items: items.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl<T> Stream for FiniteStream<T> {
    type Item = T;

    fn pull(&mut self) -> Option<T> {
        self.items.pop_front()
    }
}

/// Yields the same item forever.
#[derive(Debug, Clone)]
pub struct Constant<T: Clone> {
    item: T,
}

impl<T: Clone> Constant<T> {
    pub fn new(item: T) -> Self {
        Constant { item }
    }
}

impl<T: Clone> Stream for Constant<T> {
    type Item = T;

    fn pull(&mut self) -> Option<T> {
        Some(self.item.clone())
    }
}
