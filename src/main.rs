//! crmdesk - Multi-app CRM from the command line
//!
//! Lists and edits apps, contacts, deals and tasks from the static dataset
//! or a hosted table backend.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod output;

use crmdesk::config::{resolve_data_dir, BACKEND_KEY_ENV, BACKEND_URL_ENV};
use crmdesk::dependency::TaskIndex;
use crmdesk::views::{
    self, app_contact_counts, contact_detail, dashboard_stats, group_deals_by_stage,
    group_tasks_by_status, monthly_revenue, pipeline_summary, scope_contacts, scope_deals,
    scope_tasks, search, selected_app_name,
};
use crmdesk::{
    CrmError, DataSource, DataStore, DealStage, FilePreferences, NewApp, NewContact, NewDeal,
    NewTask, Plan, RemoteStore, RestStore, SaveOutcome, Scope, Settings, TaskFilters, TaskSave,
    TaskStatus,
};

/// Exit status when a task save is held back on open prerequisites.
const GATED_EXIT_CODE: i32 = 3;

#[derive(Parser)]
#[command(name = "crmdesk")]
#[command(version)]
#[command(about = "Multi-app CRM: apps, contacts, deals and tasks", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory for settings.json and preferences.json
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Restrict views to one app id, or "all"
    #[arg(long, global = true, default_value = "all")]
    app: Scope,

    /// Backend URL (overrides settings.json)
    #[arg(long, global = true, env = BACKEND_URL_ENV, hide_env_values = true)]
    backend_url: Option<String>,

    /// Backend key (overrides settings.json)
    #[arg(long, global = true, env = BACKEND_KEY_ENV, hide_env_values = true)]
    backend_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or switch the data source
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Revenue, pipeline and monthly summary for the current scope
    Dashboard,

    /// Manage registered apps
    Apps {
        #[command(subcommand)]
        action: AppsAction,
    },

    /// Manage contacts
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },

    /// Manage deals
    Deals {
        #[command(subcommand)]
        action: DealsAction,
    },

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },

    /// Search contacts and deals
    Search {
        /// Text to look for (at least two characters)
        query: String,
    },
}

#[derive(Subcommand)]
enum SourceAction {
    /// Show the active data source
    Show,
    /// Switch to mock or live data
    Set {
        /// mock or live
        source: DataSource,
    },
}

#[derive(Subcommand)]
enum AppsAction {
    /// List apps with their contact counts
    List,
    /// Register an app
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "free")]
        plan: Plan,
    },
    /// Rename an app or change its plan
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        plan: Option<Plan>,
    },
    /// Delete an app
    Delete { id: String },
}

#[derive(Subcommand)]
enum ContactsAction {
    /// List contacts in scope
    List,
    /// Show a contact with its deals, tasks and apps
    Show { id: String },
    /// Add a contact
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        company: String,
        /// App ids, comma separated
        #[arg(long = "apps", value_delimiter = ',', required = true)]
        app_ids: Vec<String>,
    },
    /// Edit a contact
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        company: Option<String>,
        /// Replace the app ids, comma separated
        #[arg(long = "apps", value_delimiter = ',')]
        app_ids: Option<Vec<String>>,
    },
    /// Delete a contact
    Delete { id: String },
}

#[derive(Subcommand)]
enum DealsAction {
    /// List deals in scope
    List,
    /// Deals grouped by stage, largest first
    Pipeline,
    /// Add a deal
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "lead-in")]
        stage: DealStage,
        #[arg(long)]
        contact: String,
        #[arg(long)]
        app_id: String,
        /// Expected close date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_day)]
        close_date: DateTime<Utc>,
        #[arg(long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=100))]
        probability: u8,
        #[arg(long, default_value = "")]
        next_step: String,
    },
    /// Edit a deal
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        stage: Option<DealStage>,
        #[arg(long)]
        contact: Option<String>,
        #[arg(long)]
        app_id: Option<String>,
        #[arg(long, value_parser = parse_day)]
        close_date: Option<DateTime<Utc>>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        probability: Option<u8>,
        #[arg(long)]
        next_step: Option<String>,
    },
    /// Delete a deal
    Delete { id: String },
}

#[derive(Subcommand)]
enum TasksAction {
    /// List tasks in scope, filtered
    List {
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        contact: Option<String>,
        /// Earliest due date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,
        /// Latest due date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,
        /// Group by status
        #[arg(long)]
        board: bool,
        /// Remember these filters for later listings
        #[arg(long)]
        save_filters: bool,
    },
    /// Add a task
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_day)]
        due: DateTime<Utc>,
        #[arg(long, default_value = "todo")]
        status: TaskStatus,
        #[arg(long)]
        contact: String,
        /// Prerequisite task id (repeatable)
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
        /// Save even if prerequisites are not done
        #[arg(long)]
        force: bool,
    },
    /// Edit a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_day)]
        due: Option<DateTime<Utc>>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        contact: Option<String>,
        /// Replace prerequisites (repeatable)
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
        /// Remove every prerequisite
        #[arg(long, conflicts_with = "depends_on")]
        clear_deps: bool,
        /// Save even if prerequisites are not done
        #[arg(long)]
        force: bool,
    },
    /// Delete a task
    Delete { id: String },
    /// Show or clear the saved filters
    Filters {
        #[command(subcommand)]
        action: FiltersAction,
    },
}

#[derive(Subcommand)]
enum FiltersAction {
    /// Show the saved filters
    Show,
    /// Forget the saved filters
    Clear,
}

fn parse_day(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "crmdesk=debug,info"
    } else {
        "crmdesk=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}

/// Build the store from settings and preferences in the data directory.
async fn open_store(cli: &Cli) -> crmdesk::Result<DataStore> {
    let data_dir = resolve_data_dir(cli.data_dir.clone())?;
    debug!("Using data directory {}", data_dir.display());

    let mut settings = Settings::load(&data_dir)?;
    settings
        .backend
        .apply_overrides(cli.backend_url.clone(), cli.backend_key.clone());
    settings.backend.validate()?;

    let remote: Option<Arc<dyn RemoteStore>> = if settings.backend.is_configured() {
        Some(Arc::new(RestStore::new(&settings.backend)?))
    } else {
        warn!("Backend not configured; live data unavailable");
        None
    };

    let prefs = Arc::new(FilePreferences::open(&data_dir)?);
    let mut store = DataStore::new(remote, prefs);
    let report = store.load().await;
    if report.fell_back && !cli.json {
        eprintln!(
            "{} live data unavailable, showing mock data",
            "Note:".yellow().bold()
        );
    }
    Ok(store)
}

fn saved(store: &DataStore, what: &str, id: &str) {
    println!("{} {} {}", "OK".green().bold(), what, id.bold());
    if store.mode() == DataSource::Mock {
        println!("{}", "   mock data: changes last for this run only".dimmed());
    }
}

fn find<'a, T>(
    items: &'a [T],
    id: &str,
    entity: &str,
    key: impl Fn(&T) -> &str,
) -> crmdesk::Result<&'a T> {
    items
        .iter()
        .find(|item| key(item) == id)
        .ok_or_else(|| CrmError::not_found(entity, id))
}

async fn run(cli: Cli) -> crmdesk::Result<()> {
    let mut store = open_store(&cli).await?;
    let scope = cli.app.clone();
    let json = cli.json;
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Source { action } => match action {
            SourceAction::Show => {
                if json {
                    output::print_json(&serde_json::json!({
                        "source": store.mode(),
                        "backendConfigured": store.has_remote(),
                    }))?;
                } else {
                    println!("Data source: {}", store.mode().as_str().bold());
                    if !store.has_remote() {
                        println!("{}", "   live backend not configured".dimmed());
                    }
                }
            }
            SourceAction::Set { source } => {
                let report = store.set_mode(source).await?;
                if json {
                    output::print_json(&serde_json::json!({
                        "requested": report.requested,
                        "effective": report.effective,
                        "fellBack": report.fell_back,
                    }))?;
                } else if report.fell_back {
                    println!(
                        "{} requested {}, using {} data",
                        "Note:".yellow().bold(),
                        report.requested,
                        report.effective
                    );
                } else {
                    println!("{} data source is now {}", "OK".green().bold(), report.effective);
                }
            }
        },

        Commands::Dashboard => {
            let data = store.collections();
            let contacts = scope_contacts(&scope, &data.contacts);
            let deals = scope_deals(&scope, &data.deals);
            let stats = dashboard_stats(&contacts, &deals);
            let summary = pipeline_summary(deals.iter().copied());
            let revenue = monthly_revenue(&scope);

            if json {
                let months: Vec<_> = revenue
                    .iter()
                    .map(|m| {
                        let apps: serde_json::Map<String, serde_json::Value> = m
                            .by_app
                            .iter()
                            .map(|(_, name, amount)| (name.to_string(), serde_json::json!(amount)))
                            .collect();
                        serde_json::json!({ "month": m.month, "revenue": apps })
                    })
                    .collect();
                output::print_json(&serde_json::json!({
                    "scope": selected_app_name(&scope, &data.apps),
                    "stats": stats,
                    "pipeline": summary,
                    "monthlyRevenue": months,
                }))?;
            } else {
                output::print_dashboard(selected_app_name(&scope, &data.apps), &stats, &summary, &revenue);
            }
        }

        Commands::Apps { action } => match action {
            AppsAction::List => {
                let counts = app_contact_counts(store.apps(), store.contacts());
                if json {
                    output::print_json(store.apps())?;
                } else {
                    output::print_apps(&counts);
                }
            }
            AppsAction::Add { name, plan } => {
                let app = store.add_app(NewApp::new(name, plan)).await?;
                if json {
                    output::print_json(&app)?;
                } else {
                    saved(&store, "added app", &app.id);
                }
            }
            AppsAction::Edit { id, name, plan } => {
                let mut app = find(store.apps(), &id, "App", |a| a.id.as_str())?.clone();
                if let Some(name) = name {
                    app.name = name;
                }
                if let Some(plan) = plan {
                    app.plan = plan;
                }
                let app = store.edit_app(app).await?;
                if json {
                    output::print_json(&app)?;
                } else {
                    saved(&store, "updated app", &app.id);
                }
            }
            AppsAction::Delete { id } => {
                store.delete_app(&id).await?;
                if !json {
                    saved(&store, "deleted app", &id);
                }
            }
        },

        Commands::Contacts { action } => match action {
            ContactsAction::List => {
                let contacts = scope_contacts(&scope, store.contacts());
                if json {
                    output::print_json(&contacts)?;
                } else {
                    output::print_contacts(&contacts);
                }
            }
            ContactsAction::Show { id } => {
                let data = store.collections();
                let detail =
                    contact_detail(&id, data).ok_or_else(|| CrmError::not_found("Contact", &id))?;
                if json {
                    output::print_json(&detail)?;
                } else {
                    let index = TaskIndex::new(&data.tasks);
                    output::print_contact_detail(&detail, &index, today);
                }
            }
            ContactsAction::Add {
                name,
                email,
                company,
                app_ids,
            } => {
                let contact = store
                    .add_contact(NewContact {
                        name,
                        email,
                        company,
                        app_ids,
                    })
                    .await?;
                if json {
                    output::print_json(&contact)?;
                } else {
                    saved(&store, "added contact", &contact.id);
                }
            }
            ContactsAction::Edit {
                id,
                name,
                email,
                company,
                app_ids,
            } => {
                let mut contact = find(store.contacts(), &id, "Contact", |c| c.id.as_str())?.clone();
                if let Some(name) = name {
                    contact.name = name;
                }
                if let Some(email) = email {
                    contact.email = email;
                }
                if let Some(company) = company {
                    contact.company = company;
                }
                if let Some(app_ids) = app_ids {
                    contact.app_ids = app_ids;
                }
                let contact = store.edit_contact(contact).await?;
                if json {
                    output::print_json(&contact)?;
                } else {
                    saved(&store, "updated contact", &contact.id);
                }
            }
            ContactsAction::Delete { id } => {
                store.delete_contact(&id).await?;
                if !json {
                    saved(&store, "deleted contact", &id);
                }
            }
        },

        Commands::Deals { action } => match action {
            DealsAction::List => {
                let deals = scope_deals(&scope, store.deals());
                if json {
                    output::print_json(&deals)?;
                } else {
                    output::print_deals(&deals);
                }
            }
            DealsAction::Pipeline => {
                let deals = scope_deals(&scope, store.deals());
                let columns = group_deals_by_stage(deals.iter().copied());
                if json {
                    let value: Vec<_> = columns
                        .iter()
                        .map(|(stage, deals)| serde_json::json!({ "stage": stage, "deals": deals }))
                        .collect();
                    output::print_json(&value)?;
                } else {
                    let summary = pipeline_summary(deals.iter().copied());
                    output::print_pipeline(&columns, &summary);
                }
            }
            DealsAction::Add {
                title,
                amount,
                stage,
                contact,
                app_id,
                close_date,
                probability,
                next_step,
            } => {
                let deal = store
                    .add_deal(NewDeal {
                        title,
                        amount,
                        stage,
                        contact_id: contact,
                        app_id,
                        close_date,
                        probability,
                        next_step,
                    })
                    .await?;
                if json {
                    output::print_json(&deal)?;
                } else {
                    saved(&store, "added deal", &deal.id);
                }
            }
            DealsAction::Edit {
                id,
                title,
                amount,
                stage,
                contact,
                app_id,
                close_date,
                probability,
                next_step,
            } => {
                let mut deal = find(store.deals(), &id, "Deal", |d| d.id.as_str())?.clone();
                if let Some(title) = title {
                    deal.title = title;
                }
                if let Some(amount) = amount {
                    deal.amount = amount;
                }
                if let Some(stage) = stage {
                    deal.stage = stage;
                }
                if let Some(contact) = contact {
                    deal.contact_id = contact;
                }
                if let Some(app_id) = app_id {
                    deal.app_id = app_id;
                }
                if let Some(close_date) = close_date {
                    deal.close_date = close_date;
                }
                if let Some(probability) = probability {
                    deal.probability = probability;
                }
                if let Some(next_step) = next_step {
                    deal.next_step = next_step;
                }
                let deal = store.edit_deal(deal).await?;
                if json {
                    output::print_json(&deal)?;
                } else {
                    saved(&store, "updated deal", &deal.id);
                }
            }
            DealsAction::Delete { id } => {
                store.delete_deal(&id).await?;
                if !json {
                    saved(&store, "deleted deal", &id);
                }
            }
        },

        Commands::Tasks { action } => match action {
            TasksAction::List {
                status,
                contact,
                from,
                to,
                board,
                save_filters,
            } => {
                let mut filters = TaskFilters::load(store.prefs());
                if let Some(status) = status {
                    filters.status = Some(status);
                }
                if let Some(contact) = contact {
                    filters.contact_id = Some(contact).filter(|c| !c.is_empty());
                }
                if let Some(from) = from {
                    filters.start_date = TaskFilters::parse_date("from", &from)?;
                }
                if let Some(to) = to {
                    filters.end_date = TaskFilters::parse_date("to", &to)?;
                }
                if save_filters {
                    filters.save(store.prefs())?;
                }

                let data = store.collections();
                let scoped = scope_tasks(&scope, &data.contacts, &data.tasks);
                let tasks = filters.apply(scoped);
                let index = TaskIndex::new(&data.tasks);

                if board {
                    let columns = group_tasks_by_status(tasks.iter().copied());
                    if json {
                        let value: Vec<_> = columns
                            .iter()
                            .map(|(status, tasks)| serde_json::json!({ "status": status, "tasks": tasks }))
                            .collect();
                        output::print_json(&value)?;
                    } else {
                        output::print_board(&columns, &index, today);
                    }
                } else if json {
                    output::print_json(&tasks)?;
                } else {
                    output::print_tasks(&tasks, &index, today);
                }
            }
            TasksAction::Add {
                title,
                description,
                due,
                status,
                contact,
                depends_on,
                force,
            } => {
                let draft = NewTask {
                    title,
                    description,
                    due_date: due,
                    status,
                    contact_id: contact,
                    dependency_ids: depends_on,
                };
                save_task(&mut store, TaskSave::Create(draft), force, json).await?;
            }
            TasksAction::Edit {
                id,
                title,
                description,
                due,
                status,
                contact,
                depends_on,
                clear_deps,
                force,
            } => {
                let mut task = find(store.tasks(), &id, "Task", |t| t.id.as_str())?.clone();
                if let Some(title) = title {
                    task.title = title;
                }
                if let Some(description) = description {
                    task.description = description;
                }
                if let Some(due) = due {
                    task.due_date = due;
                }
                if let Some(status) = status {
                    task.status = status;
                }
                if let Some(contact) = contact {
                    task.contact_id = contact;
                }
                if clear_deps {
                    task.dependency_ids.clear();
                } else if !depends_on.is_empty() {
                    task.dependency_ids = depends_on;
                }
                save_task(&mut store, TaskSave::Update(task), force, json).await?;
            }
            TasksAction::Delete { id } => {
                store.delete_task(&id).await?;
                if !json {
                    saved(&store, "deleted task", &id);
                }
            }
            TasksAction::Filters { action } => match action {
                FiltersAction::Show => {
                    let filters = TaskFilters::load(store.prefs());
                    if json {
                        let value: serde_json::Value = serde_json::from_str(&filters.to_json()?)?;
                        output::print_json(&value)?;
                    } else if filters.is_empty() {
                        println!("No saved task filters");
                    } else {
                        let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
                        println!("{}", "Saved task filters".cyan().bold());
                        println!("  status:  {}", show(filters.status.map(|s| s.to_string())));
                        println!("  contact: {}", show(filters.contact_id.clone()));
                        println!("  from:    {}", show(filters.start_date.map(|d| d.to_string())));
                        println!("  to:      {}", show(filters.end_date.map(|d| d.to_string())));
                    }
                }
                FiltersAction::Clear => {
                    TaskFilters::clear(store.prefs())?;
                    if !json {
                        println!("{} cleared saved task filters", "OK".green().bold());
                    }
                }
            },
        },

        Commands::Search { query } => {
            if !views::is_search_active(&query) {
                return Err(CrmError::validation("query", "must be at least two characters"));
            }
            let results = search(&query, store.contacts(), store.deals());
            if json {
                output::print_json(&results)?;
            } else {
                output::print_search(&query, &results);
            }
        }
    }

    Ok(())
}

/// Run a task save through the dependency gate. Without `force`, a held
/// save prints the open prerequisites and exits with [`GATED_EXIT_CODE`].
async fn save_task(
    store: &mut DataStore,
    save: TaskSave,
    force: bool,
    json: bool,
) -> crmdesk::Result<()> {
    let task = match store.save_task(save).await? {
        SaveOutcome::Saved(task) => task,
        SaveOutcome::NeedsConfirmation(pending) if force => store.confirm_task_save(pending).await?,
        SaveOutcome::NeedsConfirmation(pending) => {
            if json {
                output::print_json(&serde_json::json!({
                    "saved": false,
                    "task": pending.save.title(),
                    "incomplete": pending.incomplete,
                }))
                .map_err(CrmError::Other)?;
            } else {
                output::print_incomplete(pending.save.title(), &pending.incomplete);
            }
            std::process::exit(GATED_EXIT_CODE);
        }
    };

    if json {
        output::print_json(&task).map_err(CrmError::Other)?;
    } else {
        saved(store, "saved task", &task.id);
    }
    Ok(())
}
