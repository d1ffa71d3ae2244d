//! Model Store Implementation

use crate::StoreError;
use fleet_trainer::FleetModel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Encoded layout of a bundle file
#[derive(Serialize)]
struct BundleRef<'a> {
    model: &'a FleetModel,
    feature_names: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct Bundle {
    model: FleetModel,
    feature_names: Option<Vec<String>>,
}

/// Decoded contents of a model file
#[derive(Debug, Clone, PartialEq)]
pub enum StoredModel {
    /// Model plus the feature names it expects
    Bundle {
        model: FleetModel,
        feature_names: Option<Vec<String>>,
    },
    /// Bare model written before feature names were stored
    Legacy(FleetModel),
}

impl StoredModel {
    /// Decode file bytes, preferring the bundle layout.
    ///
    /// A bundle must consume every byte; a legacy file is a bare model and
    /// fails the bundle decode because the trailing feature list is absent.
    pub fn decode(bytes: &[u8]) -> Result<Self, postcard::Error> {
        match postcard::take_from_bytes::<Bundle>(bytes) {
            Ok((bundle, rest)) if rest.is_empty() => Ok(StoredModel::Bundle {
                model: bundle.model,
                feature_names: bundle.feature_names,
            }),
            _ => {
                let (model, rest) = postcard::take_from_bytes::<FleetModel>(bytes)?;
                if !rest.is_empty() {
                    return Err(postcard::Error::DeserializeBadEncoding);
                }
                Ok(StoredModel::Legacy(model))
            }
        }
    }

    pub fn into_parts(self) -> (FleetModel, Option<Vec<String>>) {
        match self {
            StoredModel::Bundle {
                model,
                feature_names,
            } => (model, feature_names),
            StoredModel::Legacy(model) => (model, None),
        }
    }
}

/// Reads and writes model files
pub struct ModelStore;

impl ModelStore {
    /// Write a model bundle, creating parent directories as needed
    pub fn save(
        model: &FleetModel,
        feature_names: Option<&[String]>,
        path: impl AsRef<Path>,
    ) -> Result<(), StoreError> {
        let path = path.as_ref();
        let bytes = postcard::to_allocvec(&BundleRef {
            model,
            feature_names,
        })
        .map_err(|e| corrupt(path, e))?;
        write_file(path, &bytes)?;
        info!(
            "Saved {} model ({} features) to {}",
            model.kind_name(),
            feature_names.map_or(0, <[String]>::len),
            path.display()
        );
        Ok(())
    }

    /// Write only the model, without feature names
    pub fn save_legacy(model: &FleetModel, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let bytes = postcard::to_allocvec(model).map_err(|e| corrupt(path, e))?;
        write_file(path, &bytes)
    }

    /// Read a model file of either layout
    pub fn load_stored(path: impl AsRef<Path>) -> Result<StoredModel, StoreError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        let stored = StoredModel::decode(&bytes).map_err(|e| corrupt(path, e))?;
        if let StoredModel::Legacy(_) = stored {
            warn!("{} holds a bare model without feature names", path.display());
        }
        Ok(stored)
    }

    /// Read a model and its feature names (None for legacy files)
    pub fn load(path: impl AsRef<Path>) -> Result<(FleetModel, Option<Vec<String>>), StoreError> {
        Self::load_stored(path).map(StoredModel::into_parts)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn corrupt(path: &Path, err: postcard::Error) -> StoreError {
    StoreError::Corrupt {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
