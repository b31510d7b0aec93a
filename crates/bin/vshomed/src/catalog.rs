//! Device catalog loading.
//!
//! The catalog is a TOML file with one `[[devices]]` table per device.
//! Loading is all or nothing: any problem aborts startup.

use std::path::Path;

use vshome_domain::catalog::Catalog;
use vshome_domain::device::Device;
use vshome_domain::error::CatalogError;

/// Read, parse and validate the catalog at `path`.
///
/// # Errors
///
/// Returns [`CatalogError::Unreadable`] when the file cannot be read,
/// [`CatalogError::Malformed`] when it is not a valid catalog document
/// (including unknown kinds), and the validation errors of
/// [`Catalog::into_devices`] otherwise.
pub fn load(path: &Path) -> Result<Vec<Device>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|err| CatalogError::Unreadable {
        path: path.display().to_string(),
        source: Box::new(err),
    })?;
    parse(path, &content)
}

fn parse(path: &Path, content: &str) -> Result<Vec<Device>, CatalogError> {
    let catalog: Catalog = toml::from_str(content).map_err(|err| CatalogError::Malformed {
        path: path.display().to_string(),
        source: Box::new(err),
    })?;
    catalog.into_devices()
}
