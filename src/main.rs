use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod completions;
mod db;
mod models;
mod recurrence;
mod report;
mod score;

use completions::CompletionSet;
use models::DueTask;

/// Lookahead window for the report's "Coming Up" section.
const REPORT_LOOKAHEAD_DAYS: i64 = 10;

#[derive(Parser)]
#[command(name = "temptake-compliance")]
#[command(about = "Cleaning rota and inspection readiness tracker for TempTake sites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import recurring cleaning tasks from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List tasks due on the business date, with completion status
    Due {
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 7)]
        window_days: i64,
    },
    /// Record a task as done for the business date
    #[command(group(
        ArgGroup::new("task")
            .args(["task_id", "name"])
            .required(true)
            .multiple(false)
    ))]
    Complete {
        #[arg(long)]
        task_id: Option<Uuid>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        by: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Remove the completion for a task and business date
    #[command(group(
        ArgGroup::new("task")
            .args(["task_id", "name"])
            .required(true)
            .multiple(false)
    ))]
    Uncomplete {
        #[arg(long)]
        task_id: Option<Uuid>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Compute the inspection readiness score for a site
    Score {
        #[arg(long)]
        site: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown readiness report
    Report {
        #[arg(long)]
        site: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

/// The business date for this invocation: the explicit `--date` if given,
/// otherwise today on the local calendar. Captured once and threaded
/// through every evaluation so no computation reads its own "now".
fn business_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

fn print_open_rota(
    tasks: &[models::RecurringTask],
    done: &CompletionSet,
    site: &str,
    date: NaiveDate,
) {
    let open: Vec<&models::RecurringTask> = tasks
        .iter()
        .filter(|task| {
            recurrence::is_due_on(&task.frequency, date) && !done.is_done(task.id, date)
        })
        .collect();

    if open.is_empty() {
        println!("Rota for {site} on {date} is fully complete.");
    } else {
        println!("Still open at {site} for {date}:");
        for task in open {
            println!("  {} ({})", task.name, task.frequency.describe());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let imported = db::import_tasks_csv(&pool, &csv).await?;
            println!("Imported {imported} tasks from {}.", csv.display());
        }
        Commands::Due {
            site,
            date,
            window_days,
        } => {
            let date = business_date(date);
            let tasks = db::fetch_tasks(&pool, site.as_deref()).await?;
            let records = db::fetch_completions(&pool, site.as_deref(), date, date).await?;
            let done = CompletionSet::from_records(&records);

            let mut due_today = Vec::new();
            let mut upcoming = Vec::new();
            for task in tasks {
                if recurrence::is_due_on(&task.frequency, date) {
                    due_today.push((done.is_done(task.id, date), task));
                } else if let Some(next) =
                    recurrence::next_due_within(&task.frequency, date + Duration::days(1), window_days)
                {
                    upcoming.push((next, task));
                }
            }

            println!("Due on {date}:");
            if due_today.is_empty() {
                println!("  (nothing due)");
            }
            for (is_done, task) in &due_today {
                let status = if *is_done { "done" } else { "open" };
                println!(
                    "  [{}] {} at {} ({})",
                    status,
                    task.name,
                    task.site,
                    task.frequency.describe()
                );
            }

            upcoming.sort_by_key(|(next, _)| *next);
            println!("Due within {window_days} days:");
            if upcoming.is_empty() {
                println!("  (nothing upcoming)");
            }
            for (next, task) in &upcoming {
                println!(
                    "  {} — {} at {} ({})",
                    next,
                    task.name,
                    task.site,
                    task.frequency.describe()
                );
            }
        }
        Commands::Complete {
            task_id,
            name,
            site,
            by,
            date,
        } => {
            let date = business_date(date);
            let task = db::resolve_task(&pool, task_id, name.as_deref(), site.as_deref()).await?;
            let tasks = db::fetch_tasks(&pool, Some(&task.site)).await?;
            let records = db::fetch_completions(&pool, Some(&task.site), date, date).await?;
            let mut done = CompletionSet::from_records(&records);

            // The in-memory set only changes once the write is confirmed.
            if db::insert_completion(&pool, task.id, date, &by).await? {
                done.mark(task.id, date);
                println!("Recorded '{}' done on {date} by {by}.", task.name);
            } else {
                println!("'{}' was already recorded done on {date}.", task.name);
            }
            print_open_rota(&tasks, &done, &task.site, date);
        }
        Commands::Uncomplete {
            task_id,
            name,
            site,
            date,
        } => {
            let date = business_date(date);
            let task = db::resolve_task(&pool, task_id, name.as_deref(), site.as_deref()).await?;
            let tasks = db::fetch_tasks(&pool, Some(&task.site)).await?;
            let records = db::fetch_completions(&pool, Some(&task.site), date, date).await?;
            let mut done = CompletionSet::from_records(&records);

            if db::delete_completion(&pool, task.id, date).await? {
                done.unmark(task.id, date);
                println!("Removed completion of '{}' for {date}.", task.name);
            } else {
                println!("No completion of '{}' recorded for {date}.", task.name);
            }
            print_open_rota(&tasks, &done, &task.site, date);
        }
        Commands::Score { site, date, json } => {
            let date = business_date(date);
            let input = db::gather_pillar_input(&pool, &site, date).await?;
            let result = score::score(&input);

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Readiness for {site} on {date}:");
                println!("  Temperature logs: {} / 25", result.pillars.temperature);
                println!(
                    "  Cleaning rota:    {} / 25 ({} of {} done)",
                    result.pillars.cleaning, input.cleaning_done, input.cleaning_due
                );
                println!("  Staff training:   {} / 25", result.pillars.training);
                println!("  Allergen review:  {} / 25", result.pillars.allergen);
                println!("  Total: {} / 100 — {}", result.total, result.label);
            }
        }
        Commands::Report { site, date, out } => {
            let date = business_date(date);
            let input = db::gather_pillar_input(&pool, &site, date).await?;
            let result = score::score(&input);

            let tasks = db::fetch_tasks(&pool, Some(&site)).await?;
            let records = db::fetch_completions(&pool, Some(&site), date, date).await?;
            let done = CompletionSet::from_records(&records);

            let mut rota = Vec::new();
            let mut upcoming = Vec::new();
            for task in tasks {
                if recurrence::is_due_on(&task.frequency, date) {
                    let completed_by = records
                        .iter()
                        .find(|r| r.task_id == task.id && r.run_on == date)
                        .map(|r| r.completed_by.clone());
                    rota.push(DueTask {
                        done: done.is_done(task.id, date),
                        completed_by,
                        task,
                    });
                } else if let Some(next) = recurrence::next_due_within(
                    &task.frequency,
                    date + Duration::days(1),
                    REPORT_LOOKAHEAD_DAYS,
                ) {
                    upcoming.push((task, next));
                }
            }
            upcoming.sort_by_key(|(_, next)| *next);

            let training = db::fetch_expiring_training(&pool, &site, date).await?;
            let allergen = db::latest_allergen_review(&pool, &site).await?;

            let report = report::build_report(
                &site,
                date,
                &result,
                &rota,
                &upcoming,
                &training,
                allergen.as_ref(),
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
