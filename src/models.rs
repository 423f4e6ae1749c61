use serde::Serialize;

/// One validated spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub timestamp: String,
    pub name: String,
    pub student_id: String,
    pub activity_id: String,
    pub score: f64,
    pub result_category: String,
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roster {
    pub total_students: u32,
    pub total_activities: u32,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            total_students: 25,
            total_activities: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCount {
    pub activity_id: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: u32,
    pub completed_students: usize,
    pub completion_rate: u32,
    pub average_progress: u32,
    pub activity_stats: Vec<ActivityCount>,
    pub result_stats: Vec<ResultCount>,
}

impl DashboardStats {
    pub fn empty(roster: &Roster) -> Self {
        Self {
            total_students: roster.total_students,
            completed_students: 0,
            completion_rate: 0,
            average_progress: 0,
            activity_stats: Vec::new(),
            result_stats: Vec::new(),
        }
    }
}
