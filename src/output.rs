//! Terminal rendering for the CLI.

use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;

use crmdesk::dataset::MonthlyRevenue;
use crmdesk::dependency::TaskIndex;
use crmdesk::model::{App, Contact, Deal, DealStage, Task, TaskStatus};
use crmdesk::views::{
    dependency_titles, due_status, ContactDetail, DashboardStats, DueStatus, SearchResults,
    StageSummary,
};

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `$12,345` style amount, rounded to whole dollars.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round().abs() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && rounded > 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn heading(title: &str, count: usize) {
    println!("\n{} {}", title.cyan().bold(), format!("({count})").dimmed());
}

fn stage_label(stage: DealStage) -> String {
    match stage {
        DealStage::Won => stage.as_str().green().to_string(),
        DealStage::Lost => stage.as_str().red().to_string(),
        _ => stage.as_str().to_string(),
    }
}

fn status_label(status: TaskStatus) -> String {
    match status {
        TaskStatus::Done => status.as_str().green().to_string(),
        TaskStatus::InProgress => status.as_str().yellow().to_string(),
        TaskStatus::ToDo => status.as_str().to_string(),
    }
}

fn due_label(status: DueStatus) -> String {
    match status {
        DueStatus::Overdue => status.label().red().bold().to_string(),
        DueStatus::DueSoon(_) => status.label().yellow().to_string(),
        DueStatus::OnTime => String::new(),
    }
}

pub fn print_apps(apps: &[(&App, usize)]) {
    heading("Apps", apps.len());
    for (app, contacts) in apps {
        println!(
            "  {:<14} {:<18} {:<11} {:>3} contacts  created {}",
            app.id.dimmed(),
            app.name.bold(),
            app.plan.as_str(),
            contacts,
            app.created_at.format("%Y-%m-%d")
        );
    }
}

pub fn print_contacts(contacts: &[&Contact]) {
    heading("Contacts", contacts.len());
    for contact in contacts {
        println!(
            "  {:<16} {:<18} {:<26} {:<20} {}",
            contact.id.dimmed(),
            contact.name.bold(),
            contact.email,
            contact.company,
            contact.app_ids.join(", ").dimmed()
        );
    }
}

pub fn print_contact_detail(detail: &ContactDetail<'_>, index: &TaskIndex<'_>, today: NaiveDate) {
    let contact = detail.contact;
    println!("\n{}", contact.name.bold());
    println!("  {} {}", "Email:".dimmed(), contact.email);
    println!("  {} {}", "Company:".dimmed(), contact.company);
    println!("  {} {}", "Since:".dimmed(), contact.created_at.format("%Y-%m-%d"));
    let apps: Vec<&str> = detail.apps.iter().map(|a| a.name.as_str()).collect();
    println!("  {} {}", "Apps:".dimmed(), apps.join(", "));

    print_deals(&detail.deals);
    print_tasks(&detail.tasks, index, today);
}

pub fn print_deals(deals: &[&Deal]) {
    heading("Deals", deals.len());
    for deal in deals {
        let odds = if deal.stage.is_closed() {
            String::new()
        } else {
            format!("{}%", deal.probability)
        };
        println!(
            "  {:<12} {:<30} {:>10} {:<16} {:>4}  close {}",
            deal.id.dimmed(),
            deal.title.bold(),
            format_currency(deal.amount),
            stage_label(deal.stage),
            odds,
            deal.close_date.format("%Y-%m-%d")
        );
    }
}

pub fn print_pipeline(columns: &[(DealStage, Vec<&Deal>)], summary: &[StageSummary]) {
    for ((stage, deals), totals) in columns.iter().zip(summary) {
        println!(
            "\n{} {} {}",
            stage_label(*stage).bold(),
            format!("({})", deals.len()).dimmed(),
            format_currency(totals.total).dimmed()
        );
        for deal in deals {
            println!(
                "  {:>10}  {}  {}",
                format_currency(deal.amount),
                deal.title,
                deal.next_step.dimmed()
            );
        }
    }
}

fn task_line(task: &Task, index: &TaskIndex<'_>, today: NaiveDate) -> String {
    let deps = dependency_titles(task, index);
    let deps = if deps.is_empty() {
        String::new()
    } else {
        format!("after: {}", deps.join(", ")).dimmed().to_string()
    };
    let due = if task.status.is_done() {
        String::new()
    } else {
        due_label(due_status(task.due_date, today))
    };
    format!(
        "{:<14} {:<30} {:<12} due {} {} {}",
        task.id.dimmed(),
        task.title.bold(),
        status_label(task.status),
        task.due_date.format("%Y-%m-%d"),
        due,
        deps
    )
}

pub fn print_tasks(tasks: &[&Task], index: &TaskIndex<'_>, today: NaiveDate) {
    heading("Tasks", tasks.len());
    for task in tasks {
        println!("  {}", task_line(task, index, today));
    }
}

pub fn print_board(columns: &[(TaskStatus, Vec<&Task>)], index: &TaskIndex<'_>, today: NaiveDate) {
    for (status, tasks) in columns {
        heading(status.as_str(), tasks.len());
        for task in tasks {
            println!("  {}", task_line(task, index, today));
        }
    }
}

pub fn print_incomplete(title: &str, incomplete: &[Task]) {
    println!(
        "\n{} '{}' depends on {} task(s) that are not done:",
        "Blocked:".yellow().bold(),
        title,
        incomplete.len()
    );
    for dep in incomplete {
        println!("  - {} ({})", dep.title, status_label(dep.status));
    }
    println!("Re-run with {} to save anyway.", "--force".bold());
}

pub fn print_dashboard(
    scope_name: &str,
    stats: &DashboardStats,
    summary: &[StageSummary],
    revenue: &[MonthlyRevenue],
) {
    println!("\n{} {}", "Dashboard".cyan().bold(), scope_name.dimmed());
    println!("  {:<20} {}", "Total Revenue", format_currency(stats.total_revenue).green().bold());
    println!("  {:<20} {}", "Deals Won", stats.deals_won);
    println!("  {:<20} {}", "Contacts", stats.contacts);
    println!("  {:<20} {}", "Avg. Deal Value", format_currency(stats.average_deal_value));

    println!("\n{}", "Pipeline".cyan().bold());
    for entry in summary {
        println!(
            "  {:<16} {:>3}  {:>10}  {}",
            stage_label(entry.stage),
            entry.count,
            format_currency(entry.total),
            format!("weighted {}", format_currency(entry.weighted)).dimmed()
        );
    }

    println!("\n{}", "Monthly Revenue".cyan().bold());
    for month in revenue {
        let parts: Vec<String> = month
            .by_app
            .iter()
            .map(|(_, name, amount)| format!("{name} {}", format_currency(*amount)))
            .collect();
        println!("  {:<4} {}", month.month, parts.join("  "));
    }
}

pub fn print_search(query: &str, results: &SearchResults<'_>) {
    if results.is_empty() {
        println!("No matches for '{}'", query);
        return;
    }
    if !results.contacts.is_empty() {
        print_contacts(&results.contacts);
    }
    if !results.deals.is_empty() {
        print_deals(&results.deals);
    }
}
