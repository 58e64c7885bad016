//! Error types shared by all fallible operations of the crate.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The error taxonomy of the crate.
///
/// Every public fallible function validates its arguments before doing any
/// work and returns one of these variants; no partial output is ever
/// produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An argument violates a documented precondition: a weight array whose
    /// first dimension does not match the graph or tree it is paired with, a
    /// parent array that is not in topological order, an edge endpoint
    /// outside the vertex range, ...
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An identifier is outside its valid range: a vertex or edge id beyond
    /// the graph bounds, or an unknown algorithm mode name.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// The operation is not defined for this graph or tree variant, e.g.
    /// perimeter lengths on a partition tree.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn out_of_range(msg: impl Into<String>) -> Self {
        Error::OutOfRange(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }
}
