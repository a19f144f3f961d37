use anyhow::Context;
use chrono::{Duration, NaiveDate};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::completions::CompletionSet;
use crate::models::{
    AllergenReview, CompletionRecord, Frequency, PillarInput, RecurringTask, TrainingRecord,
};
use crate::recurrence;
use crate::score;

/// Certificates expiring within this many days count as "due soon".
const TRAINING_SOON_DAYS: i64 = 30;
/// Allergen reviews falling due within this many days count as "due soon".
const ALLERGEN_SOON_DAYS: i64 = 14;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let tasks = vec![
        (
            Uuid::parse_str("6f1c2a44-8a1e-4b62-9a46-1d2f9c0b7a01")?,
            "harbour-kitchen",
            "Sanitise prep surfaces",
            "daily",
            None::<i16>,
            None::<i16>,
        ),
        (
            Uuid::parse_str("b3e0d9c2-51f4-4f6a-b7c8-2e9a0d1f6b02")?,
            "harbour-kitchen",
            "Deep clean fryer",
            "weekly",
            Some(3),
            None,
        ),
        (
            Uuid::parse_str("9a4b7e10-3c2d-4d5e-8f60-7b1c2d3e4f03")?,
            "harbour-kitchen",
            "Descale dishwasher",
            "monthly",
            None,
            Some(1),
        ),
        (
            Uuid::parse_str("c2d3e4f5-0a1b-4c2d-9e8f-3a4b5c6d7e04")?,
            "mill-lane",
            "Wipe walk-in fridge shelves",
            "daily",
            None,
            None,
        ),
        (
            Uuid::parse_str("d4e5f6a7-1b2c-4d3e-8f90-4b5c6d7e8f05")?,
            "mill-lane",
            "Degrease extraction hood",
            "weekly",
            Some(5),
            None,
        ),
    ];

    for (id, site, name, frequency, weekday, month_day) in tasks {
        // Validate before writing so a bad seed row fails here, not at read.
        Frequency::from_parts(frequency, weekday, month_day)?;
        sqlx::query(
            r#"
            INSERT INTO temptake.cleaning_tasks (id, site, name, frequency, weekday, month_day)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (site, name) DO UPDATE
            SET frequency = EXCLUDED.frequency,
                weekday = EXCLUDED.weekday,
                month_day = EXCLUDED.month_day
            "#,
        )
        .bind(id)
        .bind(site)
        .bind(name)
        .bind(frequency)
        .bind(weekday)
        .bind(month_day)
        .execute(pool)
        .await?;
    }

    let runs = vec![
        (
            Uuid::parse_str("0a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c06")?,
            Uuid::parse_str("6f1c2a44-8a1e-4b62-9a46-1d2f9c0b7a01")?,
            NaiveDate::from_ymd_opt(2026, 8, 19).context("invalid date")?,
            "JK",
        ),
        (
            Uuid::parse_str("1b2c3d4e-5f6a-4b7c-8d9e-0f1a2b3c4d07")?,
            Uuid::parse_str("b3e0d9c2-51f4-4f6a-b7c8-2e9a0d1f6b02")?,
            NaiveDate::from_ymd_opt(2026, 8, 19).context("invalid date")?,
            "MT",
        ),
    ];

    for (id, task_id, run_on, completed_by) in runs {
        sqlx::query(
            r#"
            INSERT INTO temptake.cleaning_runs (id, task_id, run_on, completed_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (task_id, run_on) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(task_id)
        .bind(run_on)
        .bind(completed_by)
        .execute(pool)
        .await?;
    }

    let temps = vec![
        (
            Uuid::parse_str("2c3d4e5f-6a7b-4c8d-9e0f-1a2b3c4d5e08")?,
            "harbour-kitchen",
            NaiveDate::from_ymd_opt(2026, 8, 19).context("invalid date")?,
            "Walk-in fridge",
            3.5,
            "JK",
        ),
        (
            Uuid::parse_str("3d4e5f6a-7b8c-4d9e-8f01-2a3b4c5d6e09")?,
            "harbour-kitchen",
            NaiveDate::from_ymd_opt(2026, 8, 19).context("invalid date")?,
            "Freezer",
            -18.0,
            "JK",
        ),
    ];

    for (id, site, logged_on, location, temp_c, recorded_by) in temps {
        sqlx::query(
            r#"
            INSERT INTO temptake.temperature_logs
            (id, site, logged_on, location, temp_c, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(site)
        .bind(logged_on)
        .bind(location)
        .bind(temp_c)
        .bind(recorded_by)
        .execute(pool)
        .await?;
    }

    let training = vec![
        (
            Uuid::parse_str("4e5f6a7b-8c9d-4e0f-9a12-3b4c5d6e7f10")?,
            "harbour-kitchen",
            "Jess Kaur",
            "Level 2 Food Hygiene",
            NaiveDate::from_ymd_opt(2027, 3, 14).context("invalid date")?,
        ),
        (
            Uuid::parse_str("5f6a7b8c-9d0e-4f1a-8b23-4c5d6e7f8a11")?,
            "harbour-kitchen",
            "Marco Totti",
            "Allergen Awareness",
            NaiveDate::from_ymd_opt(2026, 9, 5).context("invalid date")?,
        ),
        (
            Uuid::parse_str("6a7b8c9d-0e1f-4a2b-9c34-5d6e7f8a9b12")?,
            "mill-lane",
            "Priya Shah",
            "Level 2 Food Hygiene",
            NaiveDate::from_ymd_opt(2026, 6, 1).context("invalid date")?,
        ),
    ];

    for (id, site, staff_name, certificate, expires_on) in training {
        sqlx::query(
            r#"
            INSERT INTO temptake.training_records (id, site, staff_name, certificate, expires_on)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (site, staff_name, certificate) DO UPDATE
            SET expires_on = EXCLUDED.expires_on
            "#,
        )
        .bind(id)
        .bind(site)
        .bind(staff_name)
        .bind(certificate)
        .bind(expires_on)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO temptake.allergen_reviews (id, site, reviewed_on, next_due, reviewed_by)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(Uuid::parse_str("7b8c9d0e-1f2a-4b3c-8d45-6e7f8a9b0c13")?)
    .bind("harbour-kitchen")
    .bind(NaiveDate::from_ymd_opt(2026, 7, 20).context("invalid date")?)
    .bind(NaiveDate::from_ymd_opt(2026, 10, 20).context("invalid date")?)
    .bind("JK")
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn import_tasks_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        site: String,
        name: String,
        frequency: String,
        weekday: Option<i16>,
        month_day: Option<i16>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        Frequency::from_parts(&row.frequency, row.weekday, row.month_day)
            .with_context(|| format!("bad task '{}' at {}", row.name, row.site))?;

        sqlx::query(
            r#"
            INSERT INTO temptake.cleaning_tasks (id, site, name, frequency, weekday, month_day)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (site, name) DO UPDATE
            SET frequency = EXCLUDED.frequency,
                weekday = EXCLUDED.weekday,
                month_day = EXCLUDED.month_day
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.site)
        .bind(&row.name)
        .bind(&row.frequency)
        .bind(row.weekday)
        .bind(row.month_day)
        .execute(pool)
        .await?;

        imported += 1;
    }

    Ok(imported)
}

pub async fn fetch_tasks(pool: &PgPool, site: Option<&str>) -> anyhow::Result<Vec<RecurringTask>> {
    let mut query = String::from(
        "SELECT id, site, name, frequency, weekday, month_day \
         FROM temptake.cleaning_tasks",
    );
    if site.is_some() {
        query.push_str(" WHERE site = $1");
    }
    query.push_str(" ORDER BY site, name");

    let mut rows = sqlx::query(&query);
    if let Some(value) = site {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut tasks = Vec::new();

    for row in records {
        let name: String = row.get("name");
        let frequency: String = row.get("frequency");
        let frequency =
            Frequency::from_parts(&frequency, row.get("weekday"), row.get("month_day"))
                .with_context(|| format!("stored task '{name}' is malformed"))?;
        tasks.push(RecurringTask {
            id: row.get("id"),
            site: row.get("site"),
            name,
            frequency,
        });
    }

    Ok(tasks)
}

pub async fn fetch_completions(
    pool: &PgPool,
    site: Option<&str>,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<CompletionRecord>> {
    let mut query = String::from(
        "SELECT r.task_id, r.run_on, r.completed_by \
         FROM temptake.cleaning_runs r \
         JOIN temptake.cleaning_tasks t ON t.id = r.task_id \
         WHERE r.run_on >= $1 AND r.run_on <= $2",
    );
    if site.is_some() {
        query.push_str(" AND t.site = $3");
    }

    let mut rows = sqlx::query(&query).bind(from).bind(to);
    if let Some(value) = site {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records
        .into_iter()
        .map(|row| CompletionRecord {
            task_id: row.get("task_id"),
            run_on: row.get("run_on"),
            completed_by: row.get("completed_by"),
        })
        .collect())
}

pub async fn resolve_task(
    pool: &PgPool,
    task_id: Option<Uuid>,
    name: Option<&str>,
    site: Option<&str>,
) -> anyhow::Result<RecurringTask> {
    let row = if let Some(id) = task_id {
        sqlx::query(
            "SELECT id, site, name, frequency, weekday, month_day \
             FROM temptake.cleaning_tasks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("no task with id {id}"))?
    } else {
        let name = name.context("either --task-id or --name is required")?;
        let site = site.context("--site is required when selecting a task by name")?;
        sqlx::query(
            "SELECT id, site, name, frequency, weekday, month_day \
             FROM temptake.cleaning_tasks WHERE site = $1 AND name = $2",
        )
        .bind(site)
        .bind(name)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("no task named '{name}' at {site}"))?
    };

    let name: String = row.get("name");
    let frequency: String = row.get("frequency");
    let frequency = Frequency::from_parts(&frequency, row.get("weekday"), row.get("month_day"))
        .with_context(|| format!("stored task '{name}' is malformed"))?;

    Ok(RecurringTask {
        id: row.get("id"),
        site: row.get("site"),
        name,
        frequency,
    })
}

/// Records a completion. Returns false when the `(task, date)` pair was
/// already recorded; local state is only updated from this confirmation.
pub async fn insert_completion(
    pool: &PgPool,
    task_id: Uuid,
    run_on: NaiveDate,
    completed_by: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO temptake.cleaning_runs (id, task_id, run_on, completed_by)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (task_id, run_on) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(task_id)
    .bind(run_on)
    .bind(completed_by)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Removes every completion for the pair, returning the task to "not done"
/// even if duplicates slipped in before the uniqueness constraint existed.
pub async fn delete_completion(
    pool: &PgPool,
    task_id: Uuid,
    run_on: NaiveDate,
) -> anyhow::Result<bool> {
    let result =
        sqlx::query("DELETE FROM temptake.cleaning_runs WHERE task_id = $1 AND run_on = $2")
            .bind(task_id)
            .bind(run_on)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn temperature_logged_on(
    pool: &PgPool,
    site: &str,
    date: NaiveDate,
) -> anyhow::Result<bool> {
    let logged: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM temptake.temperature_logs \
         WHERE site = $1 AND logged_on = $2)",
    )
    .bind(site)
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(logged)
}

async fn training_counts(pool: &PgPool, site: &str, date: NaiveDate) -> anyhow::Result<(u32, u32)> {
    let soon_cutoff = date + Duration::days(TRAINING_SOON_DAYS);
    let row = sqlx::query(
        "SELECT \
           COUNT(*) FILTER (WHERE expires_on < $2) AS expired, \
           COUNT(*) FILTER (WHERE expires_on >= $2 AND expires_on < $3) AS due_soon \
         FROM temptake.training_records WHERE site = $1",
    )
    .bind(site)
    .bind(date)
    .bind(soon_cutoff)
    .fetch_one(pool)
    .await?;

    let expired: i64 = row.get("expired");
    let due_soon: i64 = row.get("due_soon");
    Ok((expired as u32, due_soon as u32))
}

async fn allergen_counts(
    pool: &PgPool,
    site: &str,
    date: NaiveDate,
) -> anyhow::Result<(u64, u32, u32)> {
    let soon_cutoff = date + Duration::days(ALLERGEN_SOON_DAYS);
    let row = sqlx::query(
        "SELECT \
           COUNT(*) AS total, \
           COUNT(*) FILTER (WHERE next_due < $2) AS overdue, \
           COUNT(*) FILTER (WHERE next_due >= $2 AND next_due < $3) AS due_soon \
         FROM temptake.allergen_reviews WHERE site = $1",
    )
    .bind(site)
    .bind(date)
    .bind(soon_cutoff)
    .fetch_one(pool)
    .await?;

    let total: i64 = row.get("total");
    let overdue: i64 = row.get("overdue");
    let due_soon: i64 = row.get("due_soon");
    Ok((total as u64, overdue as u32, due_soon as u32))
}

/// Derives the four pillar inputs for one site and business date. Cleaning
/// due-ness comes from the recurrence evaluator over fetched tasks, never
/// from a second copy of the rules in SQL.
pub async fn gather_pillar_input(
    pool: &PgPool,
    site: &str,
    date: NaiveDate,
) -> anyhow::Result<PillarInput> {
    let tasks = fetch_tasks(pool, Some(site)).await?;
    let completions = fetch_completions(pool, Some(site), date, date).await?;
    let done_set = CompletionSet::from_records(&completions);

    let mut cleaning_due = 0u32;
    let mut cleaning_done = 0u32;
    for task in &tasks {
        if recurrence::is_due_on(&task.frequency, date) {
            cleaning_due += 1;
            if done_set.is_done(task.id, date) {
                cleaning_done += 1;
            }
        }
    }

    let temperature_logged_today = temperature_logged_on(pool, site, date).await?;
    let (training_expired, training_due_soon) = training_counts(pool, site, date).await?;
    let (review_count, overdue, due_soon) = allergen_counts(pool, site, date).await?;
    let (allergen_overdue, allergen_due_soon) =
        score::normalized_allergen_counts(review_count, overdue, due_soon);

    Ok(PillarInput {
        temperature_logged_today,
        cleaning_due,
        cleaning_done,
        training_expired,
        training_due_soon,
        allergen_overdue,
        allergen_due_soon,
    })
}

/// Certificates already expired or expiring soon, oldest first, for the
/// report's training section.
pub async fn fetch_expiring_training(
    pool: &PgPool,
    site: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<TrainingRecord>> {
    let soon_cutoff = date + Duration::days(TRAINING_SOON_DAYS);
    let rows = sqlx::query(
        "SELECT staff_name, certificate, expires_on \
         FROM temptake.training_records \
         WHERE site = $1 AND expires_on < $2 \
         ORDER BY expires_on",
    )
    .bind(site)
    .bind(soon_cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| TrainingRecord {
            staff_name: row.get("staff_name"),
            certificate: row.get("certificate"),
            expires_on: row.get("expires_on"),
        })
        .collect())
}

pub async fn latest_allergen_review(
    pool: &PgPool,
    site: &str,
) -> anyhow::Result<Option<AllergenReview>> {
    let row = sqlx::query(
        "SELECT reviewed_on, next_due, reviewed_by \
         FROM temptake.allergen_reviews \
         WHERE site = $1 ORDER BY reviewed_on DESC LIMIT 1",
    )
    .bind(site)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| AllergenReview {
        reviewed_on: row.get("reviewed_on"),
        next_due: row.get("next_due"),
        reviewed_by: row.get("reviewed_by"),
    }))
}
