//! Persisting fitted models so new listings can be scored without retraining.
#![forbid(unsafe_code)]

use bincode::Options;
use camino::{Utf8Path, Utf8PathBuf};
use gemscout_fs::{StagedFile, read_bytes, stage_atomic};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ModelArtefactError;
use crate::model::ExpectationModel;

/// File identifier for persisted expectation models.
pub const MODEL_MAGIC: [u8; 4] = *b"GSEM";

/// Supported version of the persisted model format.
pub const MODEL_FORMAT_VERSION: u16 = 1;

/// Fixed-size prefix written before the model body.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ArtefactHeader {
    pub(crate) magic: [u8; 4],
    pub(crate) version: u16,
}

pub(crate) fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
}

/// Write `model` to `path` through a temporary file and rename.
///
/// An existing artefact is replaced only once the new one is fully written.
///
/// # Errors
/// Returns [`ModelArtefactError::Serialise`] when encoding fails and
/// [`ModelArtefactError::Write`] when the file cannot be written.
pub fn save_model(path: &Utf8Path, model: &ExpectationModel) -> Result<(), ModelArtefactError> {
    stage_model(path, model)?.commit()
}

/// Encode `model` into a temporary file next to `path` without replacing
/// any existing artefact yet.
///
/// # Errors
/// Returns [`ModelArtefactError::Serialise`] when encoding fails and
/// [`ModelArtefactError::Write`] when the temporary file cannot be written.
pub fn stage_model(
    path: &Utf8Path,
    model: &ExpectationModel,
) -> Result<StagedModel, ModelArtefactError> {
    let header = ArtefactHeader {
        magic: MODEL_MAGIC,
        version: MODEL_FORMAT_VERSION,
    };
    let serialise_err = |source| ModelArtefactError::Serialise {
        path: path.to_path_buf(),
        source,
    };
    let mut bytes = bincode_options().serialize(&header).map_err(serialise_err)?;
    let body = bincode_options().serialize(model).map_err(serialise_err)?;
    bytes.extend_from_slice(&body);
    let file = stage_atomic(path, &bytes).map_err(|source| ModelArtefactError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(StagedModel {
        path: path.to_path_buf(),
        len: bytes.len(),
        file,
    })
}

/// A model artefact written to disk but not yet moved into place.
///
/// Dropping it without [`StagedModel::commit`] discards the new artefact.
#[derive(Debug)]
#[must_use = "a staged model is discarded unless committed"]
pub struct StagedModel {
    path: Utf8PathBuf,
    len: usize,
    file: StagedFile,
}

impl StagedModel {
    /// Replace the artefact at the staged path.
    ///
    /// # Errors
    /// Returns [`ModelArtefactError::Write`] when the rename fails.
    pub fn commit(self) -> Result<(), ModelArtefactError> {
        let Self { path, len, file } = self;
        file.commit()
            .map_err(|source| ModelArtefactError::Write {
                path: path.clone(),
                source,
            })?;
        info!("wrote model artefact to {path} ({len} bytes)");
        Ok(())
    }
}

/// Read a model previously written by [`save_model`].
///
/// # Errors
/// Returns [`ModelArtefactError::Read`] when the file cannot be read,
/// [`ModelArtefactError::InvalidMagic`] when it is not a model artefact,
/// [`ModelArtefactError::UnsupportedVersion`] for other format versions
/// and [`ModelArtefactError::Deserialise`] when the body is corrupt.
pub fn load_model(path: &Utf8Path) -> Result<ExpectationModel, ModelArtefactError> {
    let bytes = read_bytes(path).map_err(|source| ModelArtefactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let found = leading_magic(&bytes);
    if found != MODEL_MAGIC {
        return Err(ModelArtefactError::InvalidMagic {
            path: path.to_path_buf(),
            expected: MODEL_MAGIC,
            found,
        });
    }

    let deserialise_err = |source| ModelArtefactError::Deserialise {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = bytes.as_slice();
    let header: ArtefactHeader = bincode_options()
        .deserialize_from(&mut reader)
        .map_err(deserialise_err)?;
    if header.version != MODEL_FORMAT_VERSION {
        return Err(ModelArtefactError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: header.version,
            supported: MODEL_FORMAT_VERSION,
        });
    }
    bincode_options()
        .deserialize_from(&mut reader)
        .map_err(deserialise_err)
}

/// First four bytes of `bytes`, zero-padded when shorter.
fn leading_magic(bytes: &[u8]) -> [u8; 4] {
    let mut found = [0_u8; 4];
    for (slot, byte) in found.iter_mut().zip(bytes) {
        *slot = *byte;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"GS".as_slice(), [b'G', b'S', 0, 0])]
    #[case(b"GSEM\x01rest".as_slice(), MODEL_MAGIC)]
    #[case(b"".as_slice(), [0, 0, 0, 0])]
    fn leading_magic_pads_short_input(#[case] bytes: &[u8], #[case] expected: [u8; 4]) {
        assert_eq!(leading_magic(bytes), expected);
    }
}
