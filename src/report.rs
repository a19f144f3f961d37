use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AllergenReview, ComplianceScore, DueTask, RecurringTask, TrainingRecord};

pub fn build_report(
    site: &str,
    date: NaiveDate,
    score: &ComplianceScore,
    rota: &[DueTask],
    upcoming: &[(RecurringTask, NaiveDate)],
    training: &[TrainingRecord],
    allergen: Option<&AllergenReview>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Inspection Readiness Report");
    let _ = writeln!(output, "Site {site}, business date {date}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Readiness Score");
    let _ = writeln!(output, "**{} / 100 — {}**", score.total, score.label);
    let _ = writeln!(output);
    let _ = writeln!(output, "| Pillar | Points |");
    let _ = writeln!(output, "|---|---|");
    let _ = writeln!(output, "| Temperature logs | {} / 25 |", score.pillars.temperature);
    let _ = writeln!(output, "| Cleaning rota | {} / 25 |", score.pillars.cleaning);
    let _ = writeln!(output, "| Staff training | {} / 25 |", score.pillars.training);
    let _ = writeln!(output, "| Allergen review | {} / 25 |", score.pillars.allergen);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Today's Rota");

    if rota.is_empty() {
        let _ = writeln!(output, "No cleaning tasks due today.");
    } else {
        for entry in rota {
            let status = if entry.done {
                match &entry.completed_by {
                    Some(initials) => format!("done by {initials}"),
                    None => "done".to_string(),
                }
            } else {
                "open".to_string()
            };
            let _ = writeln!(
                output,
                "- {} ({}) — {}",
                entry.task.name,
                entry.task.frequency.describe(),
                status
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Coming Up");

    if upcoming.is_empty() {
        let _ = writeln!(output, "Nothing else falls due in the lookahead window.");
    } else {
        for (task, due_on) in upcoming {
            let _ = writeln!(
                output,
                "- {} on {} ({})",
                task.name,
                due_on,
                task.frequency.describe()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Training Watchlist");

    if training.is_empty() {
        let _ = writeln!(output, "No certificates expired or expiring soon.");
    } else {
        for record in training {
            let state = if record.expires_on < date {
                "expired"
            } else {
                "expires"
            };
            let _ = writeln!(
                output,
                "- {} — {} {} {}",
                record.staff_name, record.certificate, state, record.expires_on
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Allergen Review");

    match allergen {
        Some(review) => {
            let _ = writeln!(
                output,
                "Last reviewed {} by {}; next due {}.",
                review.reviewed_on, review.reviewed_by, review.next_due
            );
        }
        None => {
            let _ = writeln!(
                output,
                "No allergen review on record for this site — treated as overdue."
            );
        }
    }

    output
}
