use crate::error::GroomError;
use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use super::run::groom_file;
use super::utils::{print_issues, print_item, print_raw};

pub fn handle_source(ctx: &CommandContext, file: &str, id: &str, json: bool) -> Result<()> {
    let report = groom_file(ctx, file, Vec::new(), false, json)?;

    // a decomposed part points back at its raw ticket
    let source_id = report
        .items
        .iter()
        .find(|item| item.id == id)
        .map(|item| item.source_id.clone())
        .unwrap_or_else(|| id.to_string());

    let Some(raw) = report.source(&source_id) else {
        let issues: Vec<_> = report
            .summary
            .issues
            .iter()
            .filter(|issue| issue.item_id == id)
            .cloned()
            .collect();
        if !issues.is_empty() && !json {
            print_issues(&issues);
        }
        return Err(GroomError::NotFound(id.to_string()).into());
    };
    let items = report.items_from(&source_id);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "source": raw,
                "processedItems": items,
            }))?
        );
        return Ok(());
    }

    println!("{}", "Original".bold().underline());
    print_raw(raw);
    println!();
    if items.is_empty() {
        // rewritten away as unclassifiable
        println!("{}", "No groomed item was produced from this ticket.".yellow());
        let issues: Vec<_> = report
            .summary
            .issues
            .iter()
            .filter(|issue| issue.item_id == source_id)
            .cloned()
            .collect();
        print_issues(&issues);
        return Ok(());
    }
    for item in items {
        println!("{}", "Groomed".bold().underline());
        print_item(item);
        println!();
    }

    Ok(())
}
