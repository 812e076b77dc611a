//! `trueup validate` - check the declaration, list every issue

use crate::{schema, ui};
use anyhow::Result;
use std::path::Path;

pub fn run(config: Option<&Path>) -> Result<()> {
    let (resources, path) = schema::load(config)?;
    match converge::validate(&resources) {
        Ok(()) => {
            ui::success(&format!(
                "{} resource(s) valid ({})",
                resources.len(),
                path.display()
            ));
            Ok(())
        }
        Err(err) => {
            ui::error(&format!("invalid declaration: {}", path.display()));
            for issue in &err.issues {
                ui::dim(&issue.to_string());
            }
            anyhow::bail!("{} validation issue(s)", err.issues.len());
        }
    }
}
