use crate::models::{ComplianceScore, PillarBreakdown, PillarInput, RiskLabel};

/// Computes the 0-100 inspection readiness score from the four pillar
/// inputs. Each pillar is worth 25 points and is scored on fixed tiers,
/// never proportionally. Pure; recomputed fresh on every display.
pub fn score(input: &PillarInput) -> ComplianceScore {
    let pillars = PillarBreakdown {
        temperature: temperature_pillar(input.temperature_logged_today),
        cleaning: cleaning_pillar(input.cleaning_due, input.cleaning_done),
        training: tiered_pillar(input.training_expired, input.training_due_soon),
        allergen: tiered_pillar(input.allergen_overdue, input.allergen_due_soon),
    };
    let total = pillars.temperature + pillars.cleaning + pillars.training + pillars.allergen;

    ComplianceScore {
        total,
        label: label_for(total),
        pillars,
    }
}

fn temperature_pillar(logged_today: bool) -> u8 {
    if logged_today {
        25
    } else {
        0
    }
}

fn cleaning_pillar(due: u32, done: u32) -> u8 {
    if due == 0 || done >= due {
        25
    } else if done > 0 {
        12
    } else {
        0
    }
}

/// Shared tier rule for the training and allergen pillars: any failed item
/// zeroes the pillar outright, any due-soon item halves it.
fn tiered_pillar(failed: u32, due_soon: u32) -> u8 {
    if failed > 0 {
        0
    } else if due_soon > 0 {
        12
    } else {
        25
    }
}

/// Absence rule for the allergen pillar: a site with no review record at
/// all counts as one overdue review, not as a neutral unknown.
pub fn normalized_allergen_counts(review_count: u64, overdue: u32, due_soon: u32) -> (u32, u32) {
    if review_count == 0 {
        (1, 0)
    } else {
        (overdue, due_soon)
    }
}

/// A total of 75 means an entire pillar was lost, and a day like that is
/// not inspection-ready; the top label starts at 76.
pub fn label_for(total: u8) -> RiskLabel {
    match total {
        0..=24 => RiskLabel::HighRisk,
        25..=49 => RiskLabel::AtRisk,
        50..=75 => RiskLabel::MostlyCompliant,
        _ => RiskLabel::InspectionReady,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perfect_day() -> PillarInput {
        PillarInput {
            temperature_logged_today: true,
            cleaning_due: 4,
            cleaning_done: 4,
            training_expired: 0,
            training_due_soon: 0,
            allergen_overdue: 0,
            allergen_due_soon: 0,
        }
    }

    #[test]
    fn perfect_inputs_hit_the_ceiling() {
        let result = score(&perfect_day());
        assert_eq!(result.total, 100);
        assert_eq!(result.label, RiskLabel::InspectionReady);
    }

    #[test]
    fn worst_inputs_hit_the_floor() {
        let result = score(&PillarInput {
            temperature_logged_today: false,
            cleaning_due: 3,
            cleaning_done: 0,
            training_expired: 2,
            training_due_soon: 0,
            allergen_overdue: 1,
            allergen_due_soon: 0,
        });
        assert_eq!(result.total, 0);
        assert_eq!(result.label, RiskLabel::HighRisk);
    }

    #[test]
    fn one_expired_certificate_vetoes_the_training_pillar() {
        let mut input = perfect_day();
        input.training_expired = 1;
        let result = score(&input);
        assert_eq!(result.pillars.training, 0);
        assert_eq!(result.total, 75);
        assert_eq!(result.label, RiskLabel::MostlyCompliant);

        // A single due-soon cert on top of the same day only halves it.
        let mut input = perfect_day();
        input.training_due_soon = 3;
        assert_eq!(score(&input).pillars.training, 12);
    }

    #[test]
    fn partial_cleaning_earns_the_fixed_tier_not_a_ratio() {
        let mut input = perfect_day();
        input.cleaning_due = 10;
        input.cleaning_done = 3;
        assert_eq!(score(&input).pillars.cleaning, 12);

        input.cleaning_done = 9;
        assert_eq!(score(&input).pillars.cleaning, 12);

        input.cleaning_done = 0;
        assert_eq!(score(&input).pillars.cleaning, 0);
    }

    #[test]
    fn nothing_due_is_vacuously_compliant() {
        let mut input = perfect_day();
        input.cleaning_due = 0;
        input.cleaning_done = 0;
        assert_eq!(score(&input).pillars.cleaning, 25);
    }

    #[test]
    fn missing_allergen_review_counts_as_overdue() {
        let (overdue, due_soon) = normalized_allergen_counts(0, 0, 0);
        assert_eq!((overdue, due_soon), (1, 0));

        let mut input = perfect_day();
        input.allergen_overdue = overdue;
        input.allergen_due_soon = due_soon;
        assert_eq!(score(&input).pillars.allergen, 0);

        // With reviews present the raw counts pass through untouched.
        assert_eq!(normalized_allergen_counts(3, 0, 2), (0, 2));
    }

    #[test]
    fn labels_switch_on_inclusive_thresholds() {
        assert_eq!(label_for(0), RiskLabel::HighRisk);
        assert_eq!(label_for(24), RiskLabel::HighRisk);
        assert_eq!(label_for(25), RiskLabel::AtRisk);
        assert_eq!(label_for(49), RiskLabel::AtRisk);
        assert_eq!(label_for(50), RiskLabel::MostlyCompliant);
        assert_eq!(label_for(74), RiskLabel::MostlyCompliant);
        assert_eq!(label_for(75), RiskLabel::MostlyCompliant);
        assert_eq!(label_for(76), RiskLabel::InspectionReady);
        assert_eq!(label_for(100), RiskLabel::InspectionReady);
    }

    #[test]
    fn missing_temperature_log_costs_exactly_one_pillar() {
        let mut input = perfect_day();
        input.temperature_logged_today = false;
        let result = score(&input);
        assert_eq!(result.pillars.temperature, 0);
        assert_eq!(result.total, 75);
        assert_eq!(result.label, RiskLabel::MostlyCompliant);
    }
}
