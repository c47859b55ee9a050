use crate::cli::OutputFormat;
use crate::export::{self, DirectorySink, ExportSink};
use crate::ingest;
use crate::model::RawRecord;
use crate::pipeline::{Pipeline, RunFailure, RunReport, Stage};
use crate::search::SearchQuery;
use crate::sprint::recommend;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use super::CommandContext;
use super::utils::{print_item_list, print_plan, print_summary};

pub struct RunArgs {
    pub file: String,
    pub format: OutputFormat,
    pub goals: Vec<String>,
    pub velocity: Option<u32>,
    pub filter: Option<String>,
    pub top: usize,
    pub recommend: bool,
    pub push_dir: Option<String>,
    pub generate_ids: bool,
    pub sequential: bool,
}

/// Read the input and run the pipeline over it.
///
/// A failed run prints the failure and returns an error.
pub(super) fn groom_file(
    ctx: &CommandContext,
    file: &str,
    goals: Vec<String>,
    generate_ids: bool,
    json_failure: bool,
) -> Result<RunReport> {
    let records = read_input(ctx, file, generate_ids)?;

    let mut pipeline = Pipeline::new(&ctx.config)
        .on_progress(|stage: Stage| tracing::debug!(stage = %stage, "Stage started"));
    if !goals.is_empty() {
        pipeline = pipeline.with_goals(goals);
    }

    match pipeline.run(&records) {
        Ok(report) => Ok(report),
        Err(e) => {
            let failure = RunFailure::from_error(&e);
            if json_failure {
                println!("{}", serde_json::to_string_pretty(&failure)?);
            } else {
                eprintln!(
                    "{} {} ({}): {}",
                    "Failed at stage".red().bold(),
                    failure.failed_stage.label(),
                    failure.error_kind,
                    e
                );
            }
            Err(anyhow::Error::new(e).context(format!(
                "Pipeline failed at stage {}",
                failure.failed_stage
            )))
        }
    }
}

fn read_input(ctx: &CommandContext, file: &str, generate_ids: bool) -> Result<Vec<RawRecord>> {
    let path = Path::new(file);
    let mut records =
        ingest::read_records(path).with_context(|| format!("Failed to read {}", file))?;
    if generate_ids || ctx.config.ingest.generate_missing_ids {
        let assigned = ingest::assign_missing_ids(&mut records, &ctx.config.ingest);
        if assigned > 0 {
            tracing::info!(assigned, "Generated ids for records without one");
        }
    }
    Ok(records)
}

pub fn handle_run(ctx: &mut CommandContext, args: RunArgs) -> Result<()> {
    if let Some(velocity) = args.velocity {
        ctx.config.team.velocity = velocity;
    }
    if args.sequential {
        ctx.config.pipeline.parallel = false;
    }
    ctx.config.validate().context("Invalid run options")?;

    let query = args
        .filter
        .as_deref()
        .map(SearchQuery::parse)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let machine = matches!(args.format, OutputFormat::Json | OutputFormat::Csv);
    let mut report = groom_file(
        ctx,
        &args.file,
        args.goals,
        args.generate_ids,
        args.format == OutputFormat::Json,
    )?;

    // narrows what is shown; the summary still covers the whole batch
    if let Some(query) = &query {
        report.items.retain(|item| query.matches(item));
    }

    let plan = args
        .recommend
        .then(|| recommend(&report.items, &ctx.config.team, &ctx.config.sprint));

    let receipt = match &args.push_dir {
        Some(dir) => {
            let sink = DirectorySink::new(dir);
            Some(
                sink.push(&report.items)
                    .with_context(|| format!("Failed to push to {}", dir))?,
            )
        }
        None => None,
    };

    match args.format {
        OutputFormat::Json => {
            let mut value = serde_json::json!({
                "processedItems": report.items,
                "summary": report.summary,
                "epics": report.epics,
            });
            if let Some(plan) = &plan {
                value["sprintPlan"] = serde_json::to_value(plan)?;
            }
            if let Some(receipt) = &receipt {
                value["push"] = serde_json::to_value(receipt)?;
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => {
            print!("{}", export::to_csv(&report.items)?);
        }
        OutputFormat::Digest => {
            print!("{}", export::digest(&report, &ctx.config, args.top));
        }
        OutputFormat::Table => {
            println!(
                "{} {} items in {} epics",
                "Groomed".green(),
                report.items.len(),
                report.epics.len()
            );
            println!();
            print_item_list(&report.items);
            print_summary(&report.summary);
        }
    }

    if !machine {
        if let Some(plan) = &plan {
            print_plan(plan);
        }
    }
    if let Some(receipt) = receipt {
        let line = format!(
            "Pushed {} items: {} created, {} updated, {} unchanged",
            receipt.keys.len(),
            receipt.created,
            receipt.updated,
            receipt.unchanged
        );
        if machine {
            eprintln!("{}", line);
        } else {
            println!();
            println!("{}", line.green());
        }
    }

    Ok(())
}
