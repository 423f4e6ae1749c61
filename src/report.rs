use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::catalog;
use crate::models::{DashboardStats, ResultCount};
use crate::sheet::{DashboardLoad, LoadState};

/// Result categories, most common first. Ties keep sheet order.
pub fn rank_results(stats: &DashboardStats) -> Vec<ResultCount> {
    let mut ranked = stats.result_stats.clone();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

fn share(count: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        (count as f64 / total as f64 * 100.0).round() as u32
    }
}

pub fn build_report(load: &DashboardLoad, generated_at: DateTime<Utc>) -> String {
    let stats = &load.stats;
    let mut output = String::new();

    let _ = writeln!(output, "# Teacher Dashboard");
    let _ = writeln!(output, "Generated {}", generated_at.format("%Y-%m-%d %H:%M UTC"));

    if load.state == LoadState::Failed {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "> Could not load the results sheet: {}",
            load.error.as_deref().unwrap_or("unknown error")
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Class Progress");
    let _ = writeln!(
        output,
        "- Completion: {}% ({} of {} students submitted)",
        stats.completion_rate, stats.completed_students, stats.total_students
    );
    let _ = writeln!(output, "- Average progress: {}%", stats.average_progress);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Activities");

    if stats.activity_stats.is_empty() {
        let _ = writeln!(output, "No submissions yet.");
    } else {
        for activity in stats.activity_stats.iter() {
            let label = catalog::activity_label(&activity.activity_id);
            let _ = writeln!(
                output,
                "- {}: {} students ({}%)",
                label,
                activity.count,
                share(activity.count, stats.total_students as usize)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## AI Ethics Types");

    let ranked = rank_results(stats);
    let total_results: usize = ranked.iter().map(|result| result.count).sum();
    if ranked.is_empty() {
        let _ = writeln!(output, "No ethics results yet.");
    } else {
        for result in ranked.iter() {
            let label = catalog::result_label(&result.category);
            let _ = writeln!(
                output,
                "- {}: {} ({}%)",
                label,
                result.count,
                share(result.count, total_results)
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityCount, Roster};
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 2, 9, 30, 0).unwrap()
    }

    fn sample_stats() -> DashboardStats {
        DashboardStats {
            total_students: 25,
            completed_students: 5,
            completion_rate: 20,
            average_progress: 47,
            activity_stats: vec![
                ActivityCount {
                    activity_id: "1차시".into(),
                    count: 5,
                },
                ActivityCount {
                    activity_id: "3차시".into(),
                    count: 4,
                },
                ActivityCount {
                    activity_id: "테스트미션".into(),
                    count: 2,
                },
            ],
            result_stats: vec![
                ResultCount {
                    category: "사람지킴이 유형".into(),
                    count: 1,
                },
                ResultCount {
                    category: "균형잡이 유형".into(),
                    count: 3,
                },
            ],
        }
    }

    #[test]
    fn ranks_results_by_count() {
        let ranked = rank_results(&sample_stats());
        assert_eq!(ranked[0].category, "균형잡이 유형");
        assert_eq!(ranked[1].category, "사람지킴이 유형");
    }

    #[test]
    fn renders_labels_and_shares() {
        let load = DashboardLoad {
            state: LoadState::Ready,
            error: None,
            stats: sample_stats(),
        };
        let report = build_report(&load, generated_at());
        assert!(report.contains("Generated 2025-03-02 09:30 UTC"));
        assert!(report.contains("- Completion: 20% (5 of 25 students submitted)"));
        assert!(report.contains("- 🔍 1차시 · AI는 무엇일까?: 5 students (20%)"));
        assert!(report.contains("- ⚡ 3차시 · 전기도 탐구해요: 4 students (16%)"));
        assert!(report.contains("- 🧪 테스트미션: 2 students (8%)"));
        assert!(report.contains("- ⚖️ 균형잡이: 3 (75%)"));
        assert!(!report.contains("Could not load"));
    }

    #[test]
    fn failed_load_shows_banner_and_empty_sections() {
        let roster = Roster::default();
        let load = DashboardLoad {
            state: LoadState::Failed,
            error: Some("connection refused".into()),
            stats: DashboardStats::empty(&roster),
        };
        let report = build_report(&load, generated_at());
        assert!(report.contains("> Could not load the results sheet: connection refused"));
        assert!(report.contains("No submissions yet."));
        assert!(report.contains("No ethics results yet."));
    }
}
