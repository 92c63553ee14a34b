/// Implemented planning algorithms
pub mod algo;

/// Environment
pub mod env;

/// Error types
pub mod error;

/// Testing environments
#[cfg(feature = "gym")]
pub mod gym;

mod util;

pub use error::{Error, Result};
