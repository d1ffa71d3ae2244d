//! Model Store
//!
//! Persists a trained fleet model together with the ordered feature names it
//! was fitted on, and reads back older files that hold only the bare model.

mod store;

pub use store::{ModelStore, StoredModel};

use thiserror::Error;

/// Model store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt model file {path}: {reason}")]
    Corrupt { path: String, reason: String },
}
