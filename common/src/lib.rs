//! IndexSwap Common Types
//!
//! Shared types used across the IndexSwap crates: instruments, conversion
//! pairs, the ratio set and timing constants.

pub mod instrument;
pub mod ratio;
pub mod error;
pub mod time;

pub use instrument::*;
pub use ratio::*;
pub use error::*;
pub use time::*;
