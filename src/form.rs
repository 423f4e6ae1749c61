use reqwest::multipart::Form;
use thiserror::Error;

use crate::ethics::EthicsResult;
use crate::progress::{ActivityResult, MissionChoice, ProgressSnapshot};

/// Form field ids, one per sheet column.
pub mod entry {
    pub const NAME: &str = "entry.458059330";
    pub const NUMBER: &str = "entry.1477867723";
    pub const MISSION: &str = "entry.860711716";
    pub const SCORE: &str = "entry.18658829";
    pub const RESULT: &str = "entry.806133920";
}

const NO_MISSION: &str = "미션 미선택";
const NO_RESULT: &str = "미완료";
const NO_NAME: &str = "이름없음";
const NO_NUMBER: &str = "번호없음";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("student name is required before submitting")]
    MissingName,
    #[error("student number is required before submitting")]
    MissingNumber,
    #[error("activity id is required, e.g. 1차시")]
    MissingActivity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub name: String,
    pub number: String,
    pub mission: String,
    pub score: u32,
    pub result: String,
}

impl FormSubmission {
    pub fn new(
        name: &str,
        number: &str,
        mission: Option<&MissionChoice>,
        progress: &ProgressSnapshot,
        ethics: Option<&EthicsResult>,
    ) -> Result<Self, FormError> {
        let name = name.trim();
        let number = number.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        if number.is_empty() {
            return Err(FormError::MissingNumber);
        }

        Ok(Self {
            name: name.to_string(),
            number: number.to_string(),
            mission: mission
                .map(|mission| mission.id.clone())
                .unwrap_or_else(|| NO_MISSION.to_string()),
            score: progress.progress,
            result: ethics
                .map(|result| format!("{} 유형", result.user_type.label()))
                .unwrap_or_else(|| NO_RESULT.to_string()),
        })
    }

    /// A single lesson result. Unlike the final submission, a missing name
    /// or number is sent as a placeholder so the lesson still counts.
    pub fn for_activity(
        name: &str,
        number: &str,
        activity_id: &str,
        score: u32,
        summary: &str,
    ) -> Result<Self, FormError> {
        let activity_id = activity_id.trim();
        if activity_id.is_empty() {
            return Err(FormError::MissingActivity);
        }
        let or_placeholder = |value: &str, placeholder: &str| {
            let value = value.trim();
            if value.is_empty() {
                placeholder.to_string()
            } else {
                value.to_string()
            }
        };

        Ok(Self {
            name: or_placeholder(name, NO_NAME),
            number: or_placeholder(number, NO_NUMBER),
            mission: activity_id.to_string(),
            score,
            result: summary.trim().to_string(),
        })
    }

    pub fn fields(&self) -> [(&'static str, String); 5] {
        [
            (entry::NAME, self.name.clone()),
            (entry::NUMBER, self.number.clone()),
            (entry::MISSION, self.mission.clone()),
            (entry::SCORE, self.score.to_string()),
            (entry::RESULT, self.result.clone()),
        ]
    }
}

impl From<&FormSubmission> for ActivityResult {
    fn from(submission: &FormSubmission) -> Self {
        Self {
            name: submission.name.clone(),
            number: submission.number.clone(),
            mission_id: submission.mission.clone(),
            score: submission.score,
            summary: submission.result.clone(),
        }
    }
}

/// Posts the submission and forgets it. The response is never inspected and
/// transport failures are only logged.
pub async fn submit(client: &reqwest::Client, action_url: &str, submission: &FormSubmission) {
    let form = submission
        .fields()
        .into_iter()
        .fold(Form::new(), |form, (field, value)| form.text(field, value));

    match client.post(action_url).multipart(form).send().await {
        Ok(_) => tracing::info!(
            name = %submission.name,
            number = %submission.number,
            mission = %submission.mission,
            score = submission.score,
            result = %submission.result,
            "form submission sent"
        ),
        Err(err) => tracing::error!(error = %err, "form submission failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethics::{Choice, EthicsAnswers};
    use chrono::Utc;

    fn snapshot(progress: u32) -> ProgressSnapshot {
        ProgressSnapshot {
            mission: true,
            design: false,
            ethics: false,
            progress,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn maps_completed_work_to_fields() {
        let mission = MissionChoice {
            id: "water".into(),
            title: "물 배달 용사".into(),
            robot_type: "운반형".into(),
        };
        let answers = EthicsAnswers::from_sequence(&[Choice::B; 6]).unwrap();
        let ethics = EthicsResult::complete(answers, String::new(), "민준".into()).unwrap();

        let submission =
            FormSubmission::new(" 민준 ", "7", Some(&mission), &snapshot(100), Some(&ethics))
                .unwrap();
        assert_eq!(
            submission.fields(),
            [
                ("entry.458059330", "민준".to_string()),
                ("entry.1477867723", "7".to_string()),
                ("entry.860711716", "water".to_string()),
                ("entry.18658829", "100".to_string()),
                ("entry.806133920", "균형잡이 유형".to_string()),
            ]
        );
    }

    #[test]
    fn missing_work_uses_placeholders() {
        let submission = FormSubmission::new("민준", "7", None, &snapshot(0), None).unwrap();
        assert_eq!(submission.mission, "미션 미선택");
        assert_eq!(submission.result, "미완료");
        assert_eq!(submission.score, 0);
    }

    #[test]
    fn name_and_number_are_required() {
        assert_eq!(
            FormSubmission::new("", "7", None, &snapshot(0), None),
            Err(FormError::MissingName)
        );
        assert_eq!(
            FormSubmission::new("민준", "  ", None, &snapshot(0), None),
            Err(FormError::MissingNumber)
        );
    }

    #[test]
    fn lesson_results_fill_the_lesson_column() {
        let submission =
            FormSubmission::for_activity("민준", "7", " 3차시 ", 90, "환경지킴이").unwrap();
        assert_eq!(
            submission.fields(),
            [
                ("entry.458059330", "민준".to_string()),
                ("entry.1477867723", "7".to_string()),
                ("entry.860711716", "3차시".to_string()),
                ("entry.18658829", "90".to_string()),
                ("entry.806133920", "환경지킴이".to_string()),
            ]
        );

        let entry = ActivityResult::from(&submission);
        assert_eq!(entry.mission_id, "3차시");
        assert_eq!(entry.summary, "환경지킴이");
    }

    #[test]
    fn lesson_results_use_placeholders_for_profile() {
        let submission = FormSubmission::for_activity(" ", "", "1차시", 0, "").unwrap();
        assert_eq!(submission.name, "이름없음");
        assert_eq!(submission.number, "번호없음");
        assert_eq!(
            FormSubmission::for_activity("민준", "7", "  ", 10, ""),
            Err(FormError::MissingActivity)
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_not_an_error() {
        let submission = FormSubmission::new("민준", "7", None, &snapshot(25), None).unwrap();
        // Port 9 on localhost refuses connections; submit must still return.
        submit(&reqwest::Client::new(), "http://127.0.0.1:9/formResponse", &submission).await;
    }
}
