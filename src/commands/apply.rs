//! `trueup apply` - converge the host to the declared state

use crate::backend::default_backend;
use crate::cli::ApplyArgs;
use crate::progress::BarProgress;
use crate::resources::{HostExecutor, HostProbe};
use crate::{Context, ui};
use anyhow::Result;
use converge::{NoProgress, RunReport};
use dialoguer::Confirm;
use std::io::Write;
use std::path::Path;

/// Returns false when the report carries failures (exit code 1).
pub fn run(ctx: &Context, config: Option<&Path>, args: &ApplyArgs) -> Result<bool> {
    let (resources, path) = super::load_validated(config)?;
    let backend = default_backend();
    let probe = HostProbe::new(&backend);

    if !is_root() {
        ui::warn("not running as root; most host mutations will fail");
    }

    if args.json {
        // Machine mode: no preview, no decorated output, full report JSON
        if !args.yes && !confirm("Apply changes to this host?")? {
            anyhow::bail!("aborted");
        }
        let mut executor = HostExecutor::new(&backend);
        let report = converge::run(&resources, &probe, &mut executor, &mut NoProgress)?;
        write_json_report(&report, &mut std::io::stdout())?;
        return Ok(!report.has_failures());
    }

    // Preview what would change before touching anything
    ui::header(&format!("Apply ({})", path.display()));
    let planned = converge::plan(&resources, &probe)?;
    super::plan::render(ctx, &resources, &planned, false);

    let changes = planned
        .iter()
        .filter(|p| matches!(&p.action, Ok(a) if a.kind.is_change()))
        .count();
    let probe_errors = planned.iter().filter(|p| p.action.is_err()).count();

    if changes == 0 && probe_errors == 0 {
        println!();
        ui::success("host already converged, nothing to do");
        return Ok(true);
    }

    println!();
    if !args.yes && !confirm(&format!("Apply {changes} change(s)?"))? {
        ui::info("aborted, host untouched");
        return Ok(true);
    }

    let mut executor = HostExecutor::new(&backend);
    let mut progress = BarProgress::new(resources.len());
    let report = converge::run(&resources, &probe, &mut executor, &mut progress)?;
    progress.finish();

    print_report(&report);
    Ok(!report.has_failures())
}

/// Emit the report as the sole content of the machine-readable stream.
fn write_json_report(report: &RunReport, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

fn print_report(report: &RunReport) {
    println!();
    for entry in report.problems() {
        ui::error(&format!(
            "{} {}: {}",
            entry.kind, entry.identity, entry.outcome
        ));
    }

    let summary = report.summary();
    let line = format!(
        "{} created, {} updated, {} unchanged, {} failed, {} blocked ({} resource(s) in {:.1}s)",
        summary.created,
        summary.updated,
        summary.unchanged,
        summary.failed,
        summary.blocked,
        summary.total(),
        report.duration_secs(),
    );
    if report.has_failures() {
        ui::error(&line);
    } else {
        ui::success(&line);
    }
}

fn is_root() -> bool {
    // SAFETY: geteuid has no failure modes and touches no memory
    unsafe { libc::geteuid() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use converge::{ActionKind, Kind, Outcome, ReportEntry};

    #[test]
    fn test_json_mode_writes_a_single_json_document() {
        let report = RunReport::new(
            Utc::now(),
            vec![ReportEntry {
                kind: Kind::Package,
                identity: "loki".into(),
                action: ActionKind::Create,
                rationale: "package is not installed".into(),
                outcome: Outcome::Success,
            }],
        );

        let mut out = Vec::new();
        write_json_report(&report, &mut out).unwrap();

        // The whole stream must parse as one JSON value: any decorated
        // line sneaking in would break machine consumers.
        let text = String::from_utf8(out).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["entries"][0]["identity"], "loki");
        assert_eq!(value["entries"][0]["outcome"], "success");
    }
}
