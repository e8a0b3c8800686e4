//! Error types for the allocation layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`Allocator::allocate`](crate::alloc::Allocator::allocate).
///
/// Every variant names the failed OS-level step and carries the offending path
/// plus the underlying I/O error. Allocation either fully succeeds or fails
/// with one of these; there is no partially-constructed storage.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Opening or creating the backing file failed.
    #[error("failed to open {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Resizing the backing file to the requested length failed.
    #[error("failed to resize {path:?}")]
    Resize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The memory mapping itself failed.
    #[error("failed to map {path:?}")]
    Map {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading file contents into the heap fallback buffer failed.
    #[error("failed to read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AllocationError {
    /// The path of the file involved in the failed operation.
    pub fn path(&self) -> &std::path::Path {
        match self {
            AllocationError::Open { path, .. }
            | AllocationError::Resize { path, .. }
            | AllocationError::Map { path, .. }
            | AllocationError::Read { path, .. } => path,
        }
    }
}
