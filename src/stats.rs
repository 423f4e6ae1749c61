use std::collections::HashMap;

use crate::ingest;
use crate::models::{ActivityCount, DashboardStats, ResultCount, Roster, SubmissionRecord};

/// Keeps the last submission per (student, activity). Each key stays at the
/// position where it first appeared.
pub fn dedupe_latest(records: &[SubmissionRecord]) -> Vec<SubmissionRecord> {
    let mut positions: HashMap<(&str, &str), usize> = HashMap::new();
    let mut unique: Vec<SubmissionRecord> = Vec::new();

    for record in records {
        let key = (record.student_id.as_str(), record.activity_id.as_str());
        match positions.get(&key) {
            Some(&index) => unique[index] = record.clone(),
            None => {
                positions.insert(key, unique.len());
                unique.push(record.clone());
            }
        }
    }

    unique
}

pub fn compute_stats(records: &[SubmissionRecord], roster: &Roster) -> DashboardStats {
    if records.is_empty() {
        return DashboardStats::empty(roster);
    }

    let unique = dedupe_latest(records);

    // (student, activity) pairs are unique after dedupe, so a plain count per
    // student is the number of distinct activities completed.
    let mut activities_by_student: HashMap<&str, usize> = HashMap::new();
    let mut activity_stats: Vec<ActivityCount> = Vec::new();
    let mut result_stats: Vec<ResultCount> = Vec::new();

    for record in &unique {
        *activities_by_student
            .entry(record.student_id.as_str())
            .or_insert(0) += 1;

        match activity_stats
            .iter_mut()
            .find(|entry| entry.activity_id == record.activity_id)
        {
            Some(entry) => entry.count += 1,
            None => activity_stats.push(ActivityCount {
                activity_id: record.activity_id.clone(),
                count: 1,
            }),
        }

        if record.result_category.is_empty() {
            continue;
        }
        match result_stats
            .iter_mut()
            .find(|entry| entry.category == record.result_category)
        {
            Some(entry) => entry.count += 1,
            None => result_stats.push(ResultCount {
                category: record.result_category.clone(),
                count: 1,
            }),
        }
    }

    let completed_students = activities_by_student.len();
    let completion_rate = if roster.total_students > 0 {
        percent(completed_students as f64 / roster.total_students as f64)
    } else {
        0
    };

    let average_progress = if completed_students > 0 && roster.total_activities > 0 {
        let ratio_sum: f64 = activities_by_student
            .values()
            .map(|&done| done as f64 / roster.total_activities as f64)
            .sum();
        percent(ratio_sum / completed_students as f64)
    } else {
        0
    };

    DashboardStats {
        total_students: roster.total_students,
        completed_students,
        completion_rate,
        average_progress,
        activity_stats,
        result_stats,
    }
}

/// Parses raw export text and aggregates it in one step.
pub fn aggregate_csv(text: &str, roster: &Roster) -> anyhow::Result<DashboardStats> {
    let parsed = ingest::parse_sheet(text)?;
    if !parsed.rejections.is_empty() {
        tracing::info!(
            accepted = parsed.records.len(),
            rejected = parsed.rejections.len(),
            "filtered sheet rows"
        );
    }
    Ok(compute_stats(&parsed.records, roster))
}

fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).round() as u32
}
