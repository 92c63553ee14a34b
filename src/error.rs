use std::io;

use crate::algo::dp::TableKind;
#[cfg(feature = "gym")]
use crate::gym::MapError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Greedy action requested from a table that was never solved
    #[error("no {0} table available, only manual execution possible")]
    UninitializedTable(TableKind),

    /// An action label that the environment does not recognize
    #[error("{label:?} is not a valid action. Available actions are {available}")]
    InvalidAction { label: String, available: String },

    #[error("no convergence after {sweeps} sweeps (last delta {delta})")]
    NonConvergence { sweeps: u32, delta: f64 },

    #[error("environment exposes no actions")]
    EmptyActionSpace,

    /// A table handed to a solver does not match the environment
    #[error("table has {found} entries, environment needs {expected}")]
    TableShape { expected: usize, found: usize },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[cfg(feature = "gym")]
    #[error(transparent)]
    Map(#[from] MapError),
}
