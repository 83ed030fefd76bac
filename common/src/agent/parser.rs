use crate::model::TutorResponse;

/// prefix of the substitute answer used when a tutor reply cannot be decoded.
/// the raw generator output is appended so the operator sees what came back.
pub const FALLBACK_PREFIX: &str =
    "Entschuldigung, bei der Verarbeitung der Antwort ist ein Fehler aufgetreten. \
     Die Rohdaten waren:\n\n";

const LEADING_FENCES: [&str; 3] = ["```json", "```sql", "```"];
const TRAILING_FENCE: &str = "```";

/// strip one level of markdown fence wrapping from generator output.
///
/// trims, removes at most one leading fence (`` ```json ``, `` ```sql `` or a
/// bare `` ``` ``) and at most one trailing `` ``` ``, then trims again.
pub fn repair(raw: &str) -> &str {
    let text = raw.trim();

    let text = LEADING_FENCES
        .iter()
        .find_map(|fence| text.strip_prefix(*fence))
        .unwrap_or(text);

    let text = text.strip_suffix(TRAILING_FENCE).unwrap_or(text);

    text.trim()
}

/// strict decode of already repaired text
pub fn decode(cleaned: &str) -> serde_json::Result<TutorResponse> {
    serde_json::from_str(cleaned)
}

/// the answer shown in place of an undecodable reply
pub fn fallback_response(raw: &str) -> TutorResponse {
    TutorResponse::new(format!("{}{}", FALLBACK_PREFIX, raw), Vec::new())
}

/// repair and decode a tutor reply. never fails: undecodable output turns
/// into [`fallback_response`] carrying the unrepaired text.
pub fn parse_tutor_response(raw: &str) -> TutorResponse {
    match decode(repair(raw)) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, raw_len = raw.len(), "tutor reply was not valid json");
            fallback_response(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_json_fence() {
        let input = "```json\n{\"answer\": \"x\"}\n```";
        assert_eq!(repair(input), "{\"answer\": \"x\"}");
    }

    #[test]
    fn test_repair_sql_fence() {
        let input = "  ```sql\nCREATE TABLE a (id INT);\n```  \n";
        assert_eq!(repair(input), "CREATE TABLE a (id INT);");
    }

    #[test]
    fn test_repair_bare_fence() {
        assert_eq!(repair("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_repair_plain_text_only_trims() {
        assert_eq!(repair("  {\"answer\": \"x\"}\n"), "{\"answer\": \"x\"}");
        assert_eq!(repair(""), "");
    }

    #[test]
    fn test_repair_strips_only_one_level() {
        let input = "```json\n```json\n{}\n```\n```";
        assert_eq!(repair(input), "```json\n{}\n```");
    }

    #[test]
    fn test_repair_trailing_fence_only() {
        assert_eq!(repair("{}\n```"), "{}");
    }

    #[test]
    fn test_decode_full_response() {
        let text = r#"{"answer": "Eine Entität ist ein Objekt.", "suggested_questions": ["Was ist ein Attribut?", "Was ist eine Beziehung?"]}"#;
        let response = decode(text).unwrap();

        assert_eq!(response.answer, "Eine Entität ist ein Objekt.");
        assert_eq!(response.suggested_questions.len(), 2);
    }

    #[test]
    fn test_decode_accepts_any_question_count() {
        let none = decode(r#"{"answer": "a", "suggested_questions": []}"#).unwrap();
        assert!(none.suggested_questions.is_empty());

        let missing = decode(r#"{"answer": "a"}"#).unwrap();
        assert!(missing.suggested_questions.is_empty());

        let questions: Vec<String> = (0..15).map(|i| format!("Frage {}", i)).collect();
        let text = serde_json::json!({"answer": "a", "suggested_questions": questions}).to_string();
        assert_eq!(decode(&text).unwrap().suggested_questions.len(), 15);
    }

    #[test]
    fn test_decode_requires_answer() {
        assert!(decode(r#"{"suggested_questions": []}"#).is_err());
    }

    #[test]
    fn test_parse_fenced_response() {
        let raw = "```json\n{\"answer\": \"Hallo\", \"suggested_questions\": [\"Was nun?\"]}\n```";
        let response = parse_tutor_response(raw);

        assert_eq!(response.answer, "Hallo");
        assert_eq!(response.suggested_questions, vec!["Was nun?".to_string()]);
    }

    #[test]
    fn test_parse_garbage_falls_back_with_raw_text() {
        let raw = "  ```json\nSorry, I cannot answer that.\n```";
        let response = parse_tutor_response(raw);

        assert!(response.answer.starts_with(FALLBACK_PREFIX));
        // the unrepaired text, fences and all
        assert!(response.answer.ends_with(raw));
        assert!(response.suggested_questions.is_empty());
    }

    #[test]
    fn test_parse_empty_falls_back() {
        let response = parse_tutor_response("");
        assert_eq!(response.answer, FALLBACK_PREFIX);
        assert!(response.suggested_questions.is_empty());
    }
}
