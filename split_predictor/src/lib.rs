//! # Split Predictor
//!
//! Tracks what an opponent's legions probably contain. Every split, merge or
//! revelation is fed to the belief tree of the owning player, which narrows
//! its prediction accordingly.
//!
//! ## Core Components
//!
//! - **belief_tree**: the arena of legion nodes and every update algorithm
//! - **combinatorics**: lazy combinations and permutations used to enumerate splits
//! - **events**: the ordered game events the tree consumes
//! - **registry**: one tree per observed player
//!
//! The crate decides nothing about strategy and validates no game rules
//! beyond legion heights; it only keeps the best prediction consistent with
//! what has been observed.

pub mod belief_tree;
pub mod combinatorics;
pub mod error;
pub mod events;
pub mod registry;

pub use belief_tree::*;
pub use combinatorics::*;
pub use error::*;
pub use events::*;
pub use registry::*;
