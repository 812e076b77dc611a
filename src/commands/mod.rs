pub mod apply;
pub mod plan;
pub mod validate;

use crate::{schema, ui};
use anyhow::Result;
use converge::Resource;
use std::path::{Path, PathBuf};

/// Load the declaration and run engine validation, printing every issue
/// before bailing. Nothing touches the host past this point unless the
/// declaration is sound.
pub(crate) fn load_validated(config: Option<&Path>) -> Result<(Vec<Resource>, PathBuf)> {
    let (resources, path) = schema::load(config)?;
    if let Err(err) = converge::validate(&resources) {
        ui::error(&format!("invalid declaration: {}", path.display()));
        for issue in &err.issues {
            ui::dim(&issue.to_string());
        }
        anyhow::bail!("{} validation issue(s)", err.issues.len());
    }
    Ok((resources, path))
}
