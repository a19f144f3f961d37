use anyhow::bail;
use chrono::{NaiveDate, Weekday};
use serde::Serialize;
use uuid::Uuid;

/// Recurrence pattern for a cleaning task. The payload carries the field
/// that is only meaningful for that frequency, so a weekly task without a
/// weekday cannot be represented at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly { weekday: Weekday },
    Monthly { month_day: u32 },
}

impl Frequency {
    /// Builds a `Frequency` from its stored parts: a frequency keyword plus
    /// optional weekday (ISO, Monday=1..Sunday=7) and month-day columns.
    /// Every malformed combination is rejected rather than defaulted.
    pub fn from_parts(
        frequency: &str,
        weekday: Option<i16>,
        month_day: Option<i16>,
    ) -> anyhow::Result<Frequency> {
        match frequency {
            "daily" => {
                if weekday.is_some() || month_day.is_some() {
                    bail!("daily task must not carry a weekday or month_day");
                }
                Ok(Frequency::Daily)
            }
            "weekly" => {
                if month_day.is_some() {
                    bail!("weekly task must not carry a month_day");
                }
                let Some(n) = weekday else {
                    bail!("weekly task requires a weekday (1=Mon..7=Sun)");
                };
                Ok(Frequency::Weekly {
                    weekday: iso_weekday(n)?,
                })
            }
            "monthly" => {
                if weekday.is_some() {
                    bail!("monthly task must not carry a weekday");
                }
                let Some(day) = month_day else {
                    bail!("monthly task requires a month_day (1..31)");
                };
                if !(1..=31).contains(&day) {
                    bail!("month_day {day} out of range 1..31");
                }
                Ok(Frequency::Monthly {
                    month_day: day as u32,
                })
            }
            other => bail!("unknown frequency '{other}' (expected daily, weekly or monthly)"),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Frequency::Daily => "daily".to_string(),
            Frequency::Weekly { weekday } => format!("weekly ({weekday})"),
            Frequency::Monthly { month_day } => format!("monthly (day {month_day})"),
        }
    }
}

fn iso_weekday(n: i16) -> anyhow::Result<Weekday> {
    Ok(match n {
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        7 => Weekday::Sun,
        _ => bail!("weekday {n} out of range 1..7 (1=Mon..7=Sun)"),
    })
}

#[derive(Debug, Clone)]
pub struct RecurringTask {
    pub id: Uuid,
    pub site: String,
    pub name: String,
    pub frequency: Frequency,
}

/// Evidence that a task was carried out on a specific calendar day.
#[derive(Debug, Clone)]
pub struct CompletionRecord {
    pub task_id: Uuid,
    pub run_on: NaiveDate,
    pub completed_by: String,
}

#[derive(Debug, Clone)]
pub struct TrainingRecord {
    pub staff_name: String,
    pub certificate: String,
    pub expires_on: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct AllergenReview {
    pub reviewed_on: NaiveDate,
    pub next_due: NaiveDate,
    pub reviewed_by: String,
}

/// A task together with its completion status for one business date.
#[derive(Debug, Clone)]
pub struct DueTask {
    pub task: RecurringTask,
    pub done: bool,
    pub completed_by: Option<String>,
}

/// Per-day counts feeding the scorer, derived fresh on every invocation.
#[derive(Debug, Clone, Copy)]
pub struct PillarInput {
    pub temperature_logged_today: bool,
    pub cleaning_due: u32,
    pub cleaning_done: u32,
    pub training_expired: u32,
    pub training_due_soon: u32,
    pub allergen_overdue: u32,
    pub allergen_due_soon: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PillarBreakdown {
    pub temperature: u8,
    pub cleaning: u8,
    pub training: u8,
    pub allergen: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    #[serde(rename = "Inspection-ready")]
    InspectionReady,
    #[serde(rename = "Mostly compliant")]
    MostlyCompliant,
    #[serde(rename = "At risk")]
    AtRisk,
    #[serde(rename = "High risk")]
    HighRisk,
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RiskLabel::InspectionReady => "Inspection-ready",
            RiskLabel::MostlyCompliant => "Mostly compliant",
            RiskLabel::AtRisk => "At risk",
            RiskLabel::HighRisk => "High risk",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ComplianceScore {
    pub total: u8,
    pub label: RiskLabel,
    pub pillars: PillarBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_accepts_well_formed_tasks() {
        assert_eq!(
            Frequency::from_parts("daily", None, None).unwrap(),
            Frequency::Daily
        );
        assert_eq!(
            Frequency::from_parts("weekly", Some(3), None).unwrap(),
            Frequency::Weekly {
                weekday: Weekday::Wed
            }
        );
        assert_eq!(
            Frequency::from_parts("monthly", None, Some(31)).unwrap(),
            Frequency::Monthly { month_day: 31 }
        );
    }

    #[test]
    fn from_parts_rejects_malformed_tasks() {
        assert!(Frequency::from_parts("weekly", None, None).is_err());
        assert!(Frequency::from_parts("weekly", Some(8), None).is_err());
        assert!(Frequency::from_parts("weekly", Some(0), None).is_err());
        assert!(Frequency::from_parts("weekly", Some(3), Some(12)).is_err());
        assert!(Frequency::from_parts("monthly", None, None).is_err());
        assert!(Frequency::from_parts("monthly", None, Some(32)).is_err());
        assert!(Frequency::from_parts("monthly", Some(2), Some(12)).is_err());
        assert!(Frequency::from_parts("daily", Some(1), None).is_err());
        assert!(Frequency::from_parts("fortnightly", None, None).is_err());
    }

    #[test]
    fn iso_weekday_follows_monday_first_numbering() {
        assert_eq!(iso_weekday(1).unwrap(), Weekday::Mon);
        assert_eq!(iso_weekday(7).unwrap(), Weekday::Sun);
    }
}
