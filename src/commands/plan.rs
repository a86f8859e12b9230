//! `driftless plan` - compare two records and show only the real changes

use anyhow::{Context as _, Result};
use colored::Colorize;
use equivalence::{AttributeDiff, AttributeValue, ChangeKind, Record, RecordPlan, plan_record};
use std::fs;
use std::path::Path;

use crate::Context;
use crate::cli::PlanArgs;
use crate::config::Config;
use crate::ui;

pub fn run(ctx: &Context, config: &Config, args: PlanArgs) -> Result<()> {
    let options = config.compare_options(args.identity_field.as_deref(), args.match_by_id);
    log::debug!(
        "Comparing with identity field {:?}, {:?} list matching",
        options.identity_field,
        options.list_matching
    );

    let prior = load_record(&args.prior)?;
    let proposed = load_record(&args.proposed)?;

    let plan = plan_record(&prior, &proposed, &options).context("Could not plan record")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    display_plan(ctx, &plan);
    Ok(())
}

/// Load a record file: a JSON object of attribute name to value
pub fn load_record(path: &Path) -> Result<Record> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| {
        format!(
            "Invalid record in {}: expected an object of strings, string arrays, or string maps",
            path.display()
        )
    })
}

fn display_plan(ctx: &Context, plan: &RecordPlan) {
    if !plan.has_changes() {
        if !ctx.quiet {
            println!();
            ui::success("No changes needed");
            if plan.summary.suppressed > 0 {
                ui::dim(&format!(
                    "{} formatting-only difference(s) suppressed",
                    plan.summary.suppressed
                ));
            }
        }
        return;
    }

    ui::header("Planned changes");
    for diff in &plan.diffs {
        display_diff(ctx, diff);
    }

    let summary = &plan.summary;
    println!();
    println!(
        "Summary: {} to add, {} to change, {} to remove, {} suppressed",
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red(),
        summary.suppressed.to_string().dimmed()
    );
}

fn display_diff(ctx: &Context, diff: &AttributeDiff) {
    let symbol = match diff.change {
        ChangeKind::Added => "+".green(),
        ChangeKind::Removed => "-".red(),
        ChangeKind::Modified => "~".yellow(),
    };
    let kind = diff
        .proposed
        .as_ref()
        .or(diff.prior.as_ref())
        .map_or("", AttributeValue::kind);
    println!("  {} {} {}", symbol, diff.path, format!("({kind})").dimmed());

    if ctx.verbose == 0 && diff.change != ChangeKind::Modified {
        return;
    }

    let old = diff.prior.as_ref().map(render).unwrap_or_default();
    let new = diff.proposed.as_ref().map(render).unwrap_or_default();
    ui::line_diff(&old, &new);
}

/// Render a value with sorted keys and normalized numbers, one document per line group
fn render(value: &AttributeValue) -> String {
    let body = match value {
        AttributeValue::Scalar(text) => pretty(text),
        AttributeValue::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("[{i}] {}", pretty(item)))
            .collect::<Vec<_>>()
            .join("\n"),
        AttributeValue::Map(entries) => entries
            .iter()
            .map(|(key, item)| format!("{key}: {}", pretty(item)))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    body + "\n"
}

fn pretty(text: &str) -> String {
    equivalence::canonical::parse(text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value.to_json()).ok())
        .unwrap_or_else(|| text.to_string())
}
