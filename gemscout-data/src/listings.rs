//! Reading scraped listings.

use camino::Utf8Path;
use gemscout_core::RawListing;
use gemscout_fs::read_bytes;
use log::info;

use crate::DataError;

/// Read a JSON array of raw listings.
///
/// Every listing field is optional; validation happens in the normaliser.
///
/// # Errors
/// Returns [`DataError::Read`] when the file cannot be read and
/// [`DataError::Parse`] when it is not a JSON array of listing objects.
pub fn read_listings(path: &Utf8Path) -> Result<Vec<RawListing>, DataError> {
    let bytes = read_bytes(path).map_err(|source| DataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let listings: Vec<RawListing> =
        serde_json::from_slice(&bytes).map_err(|source| DataError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    info!("read {} listings from {path}", listings.len());
    Ok(listings)
}
