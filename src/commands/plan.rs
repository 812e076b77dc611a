//! `trueup plan` - probe and reconcile, show pending actions, mutate nothing

use crate::backend::default_backend;
use crate::resources::{HostPaths, HostProbe, rendered_path};
use crate::{Context, ui};
use anyhow::Result;
use colored::Colorize;
use converge::{ActionKind, PlannedAction, Resource};
use similar::{ChangeTag, TextDiff};
use std::path::Path;

pub fn run(ctx: &Context, config: Option<&Path>) -> Result<()> {
    let (resources, path) = super::load_validated(config)?;
    let backend = default_backend();
    let probe = HostProbe::new(&backend);

    let planned = converge::plan(&resources, &probe)?;

    if !ctx.quiet {
        ui::header(&format!("Plan ({})", path.display()));
    }
    render(ctx, &resources, &planned, true);

    let changes = planned
        .iter()
        .filter(|p| matches!(&p.action, Ok(a) if a.kind.is_change()))
        .count();
    let errors = planned.iter().filter(|p| p.action.is_err()).count();

    println!();
    if errors > 0 {
        ui::warn(&format!(
            "{changes} change(s) pending, {errors} resource(s) could not be probed"
        ));
    } else if changes == 0 {
        ui::success("host already converged, nothing to do");
    } else {
        ui::info(&format!("{changes} change(s) pending, run `trueup apply`"));
    }
    Ok(())
}

/// Render planned actions line by line, in declaration order.
///
/// NoOp lines only show up with `-v`; content diffs for file-backed
/// updates only when `show_diffs` (plan, not apply's preview).
pub(crate) fn render(
    ctx: &Context,
    resources: &[Resource],
    planned: &[PlannedAction],
    show_diffs: bool,
) {
    let paths = HostPaths::default();
    for (resource, planned) in resources.iter().zip(planned) {
        match &planned.action {
            Err(err) => {
                println!(
                    "  {} {} {}",
                    "!".red(),
                    resource.describe(),
                    format!("(probe failed: {err})").red()
                );
            }
            Ok(action) if action.is_noop() => {
                if ctx.verbose > 0 {
                    println!(
                        "  {} {} {}",
                        ui::action_symbol(action.kind),
                        resource.describe(),
                        format!("({})", action.rationale).dimmed()
                    );
                }
            }
            Ok(action) => {
                println!(
                    "  {} {} {}",
                    ui::action_symbol(action.kind),
                    resource.describe(),
                    format!("({})", action.rationale).dimmed()
                );
                if show_diffs && action.kind == ActionKind::Update {
                    show_content_diff(&paths, resource);
                }
            }
        }
    }
}

/// Unified content diff for a file-backed update.
fn show_content_diff(paths: &HostPaths, resource: &Resource) {
    let Some(desired) = resource.rendered_content() else {
        return;
    };
    let Some(path) = rendered_path(paths, resource) else {
        return;
    };
    let Ok(current) = std::fs::read_to_string(&path) else {
        return;
    };

    let current = converge::normalize(&current);
    let desired = converge::normalize(&desired);
    let diff = TextDiff::from_lines(&current, &desired);
    for change in diff.iter_all_changes() {
        let line = change.value().trim_end();
        match change.tag() {
            ChangeTag::Delete => println!("      {}", format!("-{line}").red()),
            ChangeTag::Insert => println!("      {}", format!("+{line}").green()),
            ChangeTag::Equal => {}
        }
    }
}
