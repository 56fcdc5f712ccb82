//! Common types shared by the compiler and the simulator.

/// Error taxonomy and result alias.
pub mod error;

pub use error::{Error, Result};
