use serde::{Deserialize, Serialize};

/// a tutor reply as the generator is asked to emit it:
/// `{"answer": "...", "suggested_questions": [...]}`.
/// any number of suggested questions is accepted, including none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorResponse {
    pub answer: String,
    #[serde(rename = "suggested_questions", default)]
    pub suggested_questions: Vec<String>,
}

impl TutorResponse {
    pub fn new(answer: impl Into<String>, suggested_questions: Vec<String>) -> Self {
        Self {
            answer: answer.into(),
            suggested_questions,
        }
    }
}
