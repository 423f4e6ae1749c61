use anyhow::Context;
use thiserror::Error;

use crate::models::SubmissionRecord;

const MIN_CELLS: usize = 6;
const MAX_LABEL_CHARS: usize = 40;
const BLOCKED_PIECES: [&str; 8] = ["<", ">", "http", "function", "{", "}", "=", ";"];

/// Why a sheet row was not counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("row has {0} cells, expected at least 6")]
    TooFewCells(usize),
    #[error("student name is empty")]
    MissingName,
    #[error("student number is empty")]
    MissingStudentId,
    #[error("activity is empty")]
    MissingActivity,
    #[error("activity is {0} characters long")]
    ActivityTooLong(usize),
    #[error("result is {0} characters long")]
    ResultTooLong(usize),
    #[error("activity contains {0:?}")]
    SuspiciousActivity(&'static str),
    #[error("result contains {0:?}")]
    SuspiciousResult(&'static str),
}

#[derive(Debug, Default)]
pub struct ParsedSheet {
    pub records: Vec<SubmissionRecord>,
    /// Data row number (1 = first row after the header) and reason.
    pub rejections: Vec<(usize, RowRejection)>,
}

/// Splits sheet text into trimmed cells. Quoted cells may not contain the
/// delimiter; the export is split on every comma.
pub fn split_rows(text: &str) -> anyhow::Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.trim().as_bytes());

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("failed to split sheet line {}", index + 1))?;
        rows.push(record.iter().map(clean_cell).collect());
    }
    Ok(rows)
}

fn clean_cell(cell: &str) -> String {
    let cell = cell.trim();
    let cell = cell.strip_prefix('"').unwrap_or(cell);
    let cell = cell.strip_suffix('"').unwrap_or(cell);
    cell.trim().to_string()
}

pub fn validate_row(cells: &[String]) -> Result<SubmissionRecord, RowRejection> {
    if cells.len() < MIN_CELLS {
        return Err(RowRejection::TooFewCells(cells.len()));
    }

    let name = cells[1].trim();
    let student_id = cells[2].trim();
    let activity_id = cells[3].trim();
    let result_category = cells[5].trim();

    if name.is_empty() {
        return Err(RowRejection::MissingName);
    }
    if student_id.is_empty() {
        return Err(RowRejection::MissingStudentId);
    }
    if activity_id.is_empty() {
        return Err(RowRejection::MissingActivity);
    }

    let activity_len = activity_id.chars().count();
    if activity_len > MAX_LABEL_CHARS {
        return Err(RowRejection::ActivityTooLong(activity_len));
    }
    if let Some(piece) = blocked_piece(activity_id) {
        return Err(RowRejection::SuspiciousActivity(piece));
    }

    if !result_category.is_empty() {
        let result_len = result_category.chars().count();
        if result_len > MAX_LABEL_CHARS {
            return Err(RowRejection::ResultTooLong(result_len));
        }
        if let Some(piece) = blocked_piece(result_category) {
            return Err(RowRejection::SuspiciousResult(piece));
        }
    }

    Ok(SubmissionRecord {
        timestamp: cells[0].clone(),
        name: name.to_string(),
        student_id: student_id.to_string(),
        activity_id: activity_id.to_string(),
        score: parse_score(&cells[4]),
        result_category: result_category.to_string(),
        extra: cells[MIN_CELLS..].to_vec(),
    })
}

fn blocked_piece(value: &str) -> Option<&'static str> {
    BLOCKED_PIECES
        .iter()
        .copied()
        .find(|piece| value.contains(piece))
}

fn parse_score(cell: &str) -> f64 {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
        .unwrap_or(0.0)
}

/// Parses a full export: the first line is the header, the rest are data.
pub fn parse_sheet(text: &str) -> anyhow::Result<ParsedSheet> {
    let rows = split_rows(text)?;
    if rows.len() < 2 {
        return Ok(ParsedSheet::default());
    }

    let mut parsed = ParsedSheet::default();
    for (index, cells) in rows.iter().enumerate().skip(1) {
        match validate_row(cells) {
            Ok(record) => parsed.records.push(record),
            Err(reason) => {
                tracing::debug!(row = index, %reason, "skipping sheet row");
                parsed.rejections.push((index, reason));
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(line: &[&str]) -> Vec<String> {
        line.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn strips_quotes_and_whitespace() {
        let rows = split_rows("\"Timestamp\", \"이름\"\n \"2025-03-02\" ,\" 민준 \"\r\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Timestamp", "이름"]);
        assert_eq!(rows[1], vec!["2025-03-02", "민준"]);
    }

    #[test]
    fn quoted_commas_still_split() {
        let rows = split_rows("a,\"b,c\",d").unwrap();
        assert_eq!(rows[0], vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn accepts_a_complete_row() {
        let record = validate_row(&cells(&[
            "2025-03-02 10:00:00",
            "민준",
            "7",
            "1차시",
            "75",
            "환경지킴이 유형",
            "memo",
        ]))
        .unwrap();
        assert_eq!(record.student_id, "7");
        assert_eq!(record.activity_id, "1차시");
        assert_eq!(record.score, 75.0);
        assert_eq!(record.extra, vec!["memo".to_string()]);
    }

    #[test]
    fn unparseable_score_is_zero() {
        let record = validate_row(&cells(&["t", "민준", "7", "1차시", "abc", ""])).unwrap();
        assert_eq!(record.score, 0.0);
        assert_eq!(record.result_category, "");
    }

    #[test]
    fn rejects_short_and_blank_rows() {
        assert_eq!(
            validate_row(&cells(&["t", "민준", "7", "1차시", "75"])),
            Err(RowRejection::TooFewCells(5))
        );
        assert_eq!(
            validate_row(&cells(&["t", "", "7", "1차시", "75", "x"])),
            Err(RowRejection::MissingName)
        );
        assert_eq!(
            validate_row(&cells(&["t", "민준", " ", "1차시", "75", "x"])),
            Err(RowRejection::MissingStudentId)
        );
        assert_eq!(
            validate_row(&cells(&["t", "민준", "7", "", "75", "x"])),
            Err(RowRejection::MissingActivity)
        );
    }

    #[test]
    fn rejects_injected_content() {
        assert_eq!(
            validate_row(&cells(&["t", "민준", "7", "<script>", "0", ""])),
            Err(RowRejection::SuspiciousActivity("<"))
        );
        assert_eq!(
            validate_row(&cells(&["t", "민준", "7", "1차시", "0", "https://spam"])),
            Err(RowRejection::SuspiciousResult("http"))
        );
        let long = "a".repeat(41);
        assert_eq!(
            validate_row(&cells(&["t", "민준", "7", &long, "0", ""])),
            Err(RowRejection::ActivityTooLong(41))
        );
        assert_eq!(
            validate_row(&cells(&["t", "민준", "7", "1차시", "0", &long])),
            Err(RowRejection::ResultTooLong(41))
        );
    }

    #[test]
    fn header_only_sheet_is_empty() {
        let parsed = parse_sheet("Timestamp,이름,번호,미션,점수,결과\n").unwrap();
        assert!(parsed.records.is_empty());
        assert!(parsed.rejections.is_empty());
    }

    #[test]
    fn collects_rejections_by_row() {
        let text = "h1,h2,h3,h4,h5,h6\n\
                    t,민준,7,1차시,75,균형잡이 유형\n\
                    t,bot,8,<script>,0,x\n";
        let parsed = parse_sheet(text).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(
            parsed.rejections,
            vec![(2, RowRejection::SuspiciousActivity("<"))]
        );
    }
}
