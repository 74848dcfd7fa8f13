//! Inspection and maintenance of preset files outside of a running session.

mod inspect;

pub use inspect::*;
