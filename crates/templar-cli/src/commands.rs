pub mod export;
pub mod extract;
pub mod scan;

use crate::error::Result;
use std::path::Path;
use templar::core::groups::catalog::GroupCatalog;
use tracing::info;

/// Loads the catalog at `path`, or the built-in groups when none is given.
fn load_catalog(path: Option<&Path>) -> Result<GroupCatalog> {
    match path {
        Some(path) => {
            info!("Loading functional groups from {:?}", path);
            Ok(GroupCatalog::load(path)?)
        }
        None => Ok(GroupCatalog::builtin()),
    }
}
