use crate::model::{Issue, ItemType, Priority, ProcessedItem, RawItem, Risk};
use crate::pipeline::Summary;
use crate::sprint::SprintPlan;
use colored::Colorize;

/// Format priority with color coding
pub fn format_priority(priority: Priority) -> colored::ColoredString {
    match priority {
        Priority::Critical => "critical".red().bold(),
        Priority::High => "high".red(),
        Priority::Medium => "medium".white(),
        Priority::Low => "low".dimmed(),
    }
}

pub fn format_risk(risk: Risk) -> colored::ColoredString {
    match risk {
        Risk::High => "high".red(),
        Risk::Medium => "medium".yellow(),
        Risk::Low => "low".green(),
    }
}

pub fn format_type(item_type: ItemType) -> colored::ColoredString {
    let label = item_type.to_string();
    match item_type {
        ItemType::Bug => label.red(),
        ItemType::Spike => label.magenta(),
        _ => label.blue(),
    }
}

/// Print a single item with details
pub fn print_item(item: &ProcessedItem) {
    println!("{} {}", item.id.cyan().bold(), item.title.bold());
    println!("Type:     {}", format_type(item.item_type));
    println!("Epic:     {}", item.epic);
    println!("Priority: {}", format_priority(item.priority));
    println!("Effort:   {} pts", item.effort);
    println!("ROI:      {}%", item.roi);
    println!("Risk:     {}", format_risk(item.risk));
    if item.is_decomposed() {
        println!("Source:   {}", item.source_id.cyan());
    }
    if !item.flags.is_empty() {
        println!("Flags:    {}", item.flags.join(", ").yellow());
    }
    if !item.dependencies.is_empty() {
        println!("Depends:  {}", item.dependencies.join(", ").cyan());
    }
    println!();
    println!("Acceptance criteria:");
    for criterion in &item.acceptance {
        println!("  - {}", criterion);
    }
}

pub fn print_raw(raw: &RawItem) {
    println!("{} {}", raw.id.cyan().bold(), raw.title.bold());
    if !raw.status.is_empty() {
        println!("Status:   {}", raw.status);
    }
    if !raw.reporter.is_empty() {
        println!("Reporter: {}", raw.reporter);
    }
    for (key, value) in &raw.source_meta {
        println!("{:<9} {}", format!("{}:", key), value.to_string().dimmed());
    }
    if !raw.description.is_empty() {
        println!();
        println!("{}", raw.description);
    }
}

/// Print a list of items (compact format)
pub fn print_item_list(items: &[ProcessedItem]) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    for item in items {
        println!(
            "{} {} [{}] {:>2} pts {:>3}% {}",
            item.id.cyan(),
            format_priority(item.priority),
            format_type(item.item_type),
            item.effort,
            item.roi,
            item.title
        );
        let mut detail = format!("    {}", item.epic.dimmed());
        if !item.flags.is_empty() {
            detail.push_str(&format!("  {}", item.flags.join(", ").yellow()));
        }
        println!("{}", detail);
    }
}

pub fn print_summary(summary: &Summary) {
    println!();
    println!(
        "{} {} items, {} high priority, {} sprint-ready, {} pts total, avg ROI {:.1}%",
        "Summary:".bold(),
        summary.total_items,
        summary.high_priority_count,
        summary.sprint_ready_count,
        summary.total_effort,
        summary.average_roi
    );
    print_issues(&summary.issues);
}

pub fn print_issues(issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    println!();
    println!("{} ({})", "Issues".yellow().bold(), issues.len());
    for issue in issues {
        let kind = if issue.is_warning() {
            issue.kind.to_string().yellow()
        } else {
            issue.kind.to_string().red()
        };
        println!("  {} {}: {}", kind, issue.item_id.cyan(), issue.message);
    }
}

pub fn print_plan(plan: &SprintPlan) {
    println!();
    println!(
        "{} {}/{} pts committed",
        "Next sprint:".green().bold(),
        plan.committed_effort,
        plan.velocity
    );
    for pick in &plan.picks {
        println!(
            "  {} {} ({} pts) - {}",
            pick.id.cyan(),
            pick.title,
            pick.effort,
            pick.reason.dimmed()
        );
    }
    if !plan.deferred.is_empty() {
        println!("{}", "Deferred:".dimmed());
        for deferral in &plan.deferred {
            println!("  {} {}", deferral.id.cyan(), deferral.reason.dimmed());
        }
    }
}
