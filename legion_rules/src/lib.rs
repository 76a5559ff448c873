//! # Legion Rules
//!
//! The game facts split prediction relies on. Creature values and legion
//! limits live here next to the unit records legions are built from.
//! It holds no inference logic.

pub mod creatures;
pub mod mechanics;
pub mod units;

pub use creatures::*;
pub use mechanics::*;
pub use units::*;
