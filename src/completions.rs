use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::CompletionRecord;

/// In-memory view of which tasks were done on which days.
///
/// "Done" is set membership: any number of records for the same
/// `(task, date)` pair collapses to one entry, and removing the pair
/// returns it to "not done" no matter how many times it was marked.
#[derive(Debug, Default)]
pub struct CompletionSet {
    entries: HashSet<(Uuid, NaiveDate)>,
}

impl CompletionSet {
    pub fn from_records(records: &[CompletionRecord]) -> Self {
        CompletionSet {
            entries: records.iter().map(|r| (r.task_id, r.run_on)).collect(),
        }
    }

    pub fn is_done(&self, task_id: Uuid, date: NaiveDate) -> bool {
        self.entries.contains(&(task_id, date))
    }

    pub fn mark(&mut self, task_id: Uuid, date: NaiveDate) {
        self.entries.insert((task_id, date));
    }

    pub fn unmark(&mut self, task_id: Uuid, date: NaiveDate) {
        self.entries.remove(&(task_id, date));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn membership_tracks_task_and_date_pairs() {
        let task = Uuid::new_v4();
        let mut set = CompletionSet::default();
        assert!(!set.is_done(task, date(2026, 8, 20)));

        set.mark(task, date(2026, 8, 20));
        assert!(set.is_done(task, date(2026, 8, 20)));
        assert!(!set.is_done(task, date(2026, 8, 21)));
        assert!(!set.is_done(Uuid::new_v4(), date(2026, 8, 20)));
    }

    #[test]
    fn unmark_clears_done_regardless_of_repeat_marks() {
        let task = Uuid::new_v4();
        let mut set = CompletionSet::default();
        set.mark(task, date(2026, 8, 20));
        set.mark(task, date(2026, 8, 20));
        set.mark(task, date(2026, 8, 20));

        set.unmark(task, date(2026, 8, 20));
        assert!(!set.is_done(task, date(2026, 8, 20)));
    }

    #[test]
    fn duplicate_records_collapse_to_one_done_state() {
        let task = Uuid::new_v4();
        let record = CompletionRecord {
            task_id: task,
            run_on: date(2026, 8, 20),
            completed_by: "JK".to_string(),
        };
        let set = CompletionSet::from_records(&[record.clone(), record]);
        assert!(set.is_done(task, date(2026, 8, 20)));
    }
}
