//! Error type for the interleaving analysis and sort conversion.

use std::fmt;

use crate::expr::ArgId;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by the heuristic engine or the sort converter.
///
/// Every error is fatal for the analysis that raised it: no partial
/// partition or sort is ever produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The expression contains an operator the BDD backend cannot encode.
    UnsupportedForBddBackend(&'static str),
    /// An interleaving result had the wrong shape for the requested operation.
    ShapeMismatch(String),
    /// An argument reference has no binding in the argument map.
    MissingArgument(ArgId),
    /// A type composition the solver cannot express as a sort.
    UnsupportedSortComposition(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedForBddBackend(kind) => {
                write!(f, "operator `{}` is not supported by the BDD backend", kind)
            }
            Error::ShapeMismatch(msg) => write!(f, "result shape mismatch: {}", msg),
            Error::MissingArgument(arg) => write!(f, "no binding for argument {}", arg),
            Error::UnsupportedSortComposition(msg) => write!(f, "unsupported sort composition: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
