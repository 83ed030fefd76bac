use crate::agent::parser::parse_tutor_response;
use crate::agent::prompt::build_tutor_prompt;
use crate::error::{ErmError, Result};
use crate::llm::TextGenerator;
use crate::model::{relationships_to_lines, Relationship, TutorResponse};

/// sentinel question asking the tutor to open with a greeting and starter questions
pub const INITIAL_QUESTION: &str = "__INITIAL__";

const JSON_CONTRACT: &str = "\
Antworte immer auf Deutsch. Deine Antwort MUSS IMMER ein valides JSON-Objekt sein, das exakt folgendem Schema entspricht:
{
  \"answer\": \"Deine textuelle Antwort hier. Verzichte auf Markdown-Formatierung.\",
  \"suggested_questions\": [\"Frage 1\", \"Frage 2\", \"Frage 3\"]
}
WICHTIG: Die Antwort darf NUR das reine JSON-Objekt enthalten, ohne Markdown-Wrapper. Sie muss mit `{` beginnen und mit `}` enden.";

/// the artifact a tutor dialog is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TutorTopic {
    Relationships,
    ErmDiagram,
    ErmPlantUml,
    LogicalModel,
    LogicalModelPlantUml,
    SqlDdl,
    Information,
}

/// what distinguishes one tutor from another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorProfile {
    pub title: &'static str,
    /// heading for the context block; `None` when the topic takes no context
    pub context_label: Option<&'static str>,
    pub instruction: String,
}

struct TopicText {
    title: &'static str,
    context_label: Option<&'static str>,
    role: &'static str,
    initial: &'static str,
    answer_scope: &'static str,
}

impl TutorTopic {
    pub const ALL: [TutorTopic; 7] = [
        TutorTopic::Relationships,
        TutorTopic::ErmDiagram,
        TutorTopic::ErmPlantUml,
        TutorTopic::LogicalModel,
        TutorTopic::LogicalModelPlantUml,
        TutorTopic::SqlDdl,
        TutorTopic::Information,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TutorTopic::Relationships => "relationships",
            TutorTopic::ErmDiagram => "erm-diagram",
            TutorTopic::ErmPlantUml => "erm-plantuml",
            TutorTopic::LogicalModel => "logical-model",
            TutorTopic::LogicalModelPlantUml => "logical-model-plantuml",
            TutorTopic::SqlDdl => "sql-ddl",
            TutorTopic::Information => "information",
        }
    }

    fn text(&self) -> TopicText {
        match self {
            TutorTopic::Relationships => TopicText {
                title: "Lernassistent für Beziehungen",
                context_label: Some("Aktueller Inhalt der Beziehungstabelle"),
                role: "Du bist ein freundlicher und geduldiger Tutor für Datenbankmodellierung. Deine Aufgabe ist es, Schülern zu helfen, Entitäten, Beziehungen und Kardinalitäten zu verstehen.",
                initial: "eine kurze Begrüßung und allgemeine erste Fragen",
                answer_scope: "der bereitgestellten Tabellendaten",
            },
            TutorTopic::ErmDiagram => TopicText {
                title: "Lernassistent: ERM-Diagramm",
                context_label: Some("PlantUML des ERM-Diagramms"),
                role: "Du bist ein Tutor für Datenbankmodellierung, spezialisiert auf konzeptionelle ERM-Diagramme. Deine Aufgabe ist es, Schülern die Bedeutung von Entitäten, Beziehungen und Kardinalitäten zu erklären.",
                initial: "eine Begrüßung und erste Fragen zum Thema ERM-Diagramme",
                answer_scope: "des bereitgestellten PlantUML-Codes",
            },
            TutorTopic::ErmPlantUml => TopicText {
                title: "Lernassistent: ERM PlantUML-Code",
                context_label: Some("PlantUML des ERM-Diagramms"),
                role: "Du bist ein Tutor für Datenbankmodellierung, spezialisiert auf die PlantUML-Syntax für ERM-Diagramme. Deine Aufgabe ist es, Schülern zu erklären, wie der Text-Code das gezeigte Diagramm erzeugt.",
                initial: "eine Begrüßung und erste Fragen zur PlantUML-Syntax",
                answer_scope: "des bereitgestellten PlantUML-Codes",
            },
            TutorTopic::LogicalModel => TopicText {
                title: "Lernassistent: Logisches Modell",
                context_label: Some("PlantUML des logischen Modells"),
                role: "Du bist ein Tutor für Datenbankmodellierung, spezialisiert auf logische Tabellenmodelle. Deine Aufgabe ist es, Schülern Tabellen, Primärschlüssel (PK), Fremdschlüssel (FK) und Zwischentabellen für n:m-Beziehungen zu erklären.",
                initial: "eine Begrüßung und erste Fragen zum Thema logische Modelle (z.B. \"Was ist ein Primärschlüssel?\")",
                answer_scope: "des bereitgestellten PlantUML-Codes für das logische Modell",
            },
            TutorTopic::LogicalModelPlantUml => TopicText {
                title: "Lernassistent: Logisches Modell (PlantUML)",
                context_label: Some("PlantUML des logischen Modells"),
                role: "Du bist ein Tutor für Datenbankmodellierung, spezialisiert auf die PlantUML-Syntax für logische Tabellenmodelle, z.B. `entity Tabellenname { ... }`, Primärschlüssel `+ id (PK)` und Fremdschlüssel `+ fk_id (FK)`.",
                initial: "eine Begrüßung und erste Fragen zur PlantUML-Syntax für logische Modelle (z.B. \"Wie deklariere ich einen Primärschlüssel?\")",
                answer_scope: "des bereitgestellten PlantUML-Codes",
            },
            TutorTopic::SqlDdl => TopicText {
                title: "Lernassistent: SQL DDL",
                context_label: Some("Generiertes SQL-DDL-Skript"),
                role: "Du bist ein Tutor für Datenbanken, spezialisiert auf SQL DDL. Deine Aufgabe ist es, Schülern `CREATE TABLE`, `ALTER TABLE`, Primär- und Fremdschlüssel sowie Datentypen zu erklären.",
                initial: "eine Begrüßung und erste Fragen zum Thema SQL DDL (z.B. \"Was bedeutet `CREATE TABLE`?\")",
                answer_scope: "des bereitgestellten SQL-Skripts",
            },
            TutorTopic::Information => TopicText {
                title: "Wissens-Tutor",
                context_label: None,
                role: "Du bist ein geduldiger und didaktisch versierter Lern-Tutor für Datenbanken und Software-Entwicklung. Erkläre komplexe Themen einfach, strukturiert und ausführlich. Leite bis zu 10 `suggested_questions` aus Schlüsselbegriffen und Aufzählungen deiner eigenen Antwort ab.",
                initial: "eine Begrüßung und einen Überblick über mögliche Themen",
                answer_scope: "deines allgemeinen Fachwissens",
            },
        }
    }

    pub fn profile(&self) -> TutorProfile {
        let text = self.text();
        let instruction = format!(
            "{}\n{}\nWenn die Frage \"{}\" ist, gib {} zurück.\nAnsonsten beantworte die Frage des Benutzers im Kontext {}.",
            text.role, JSON_CONTRACT, INITIAL_QUESTION, text.initial, text.answer_scope
        );

        TutorProfile {
            title: text.title,
            context_label: text.context_label,
            instruction,
        }
    }
}

impl std::fmt::Display for TutorTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TutorTopic {
    type Err = ErmError;

    fn from_str(s: &str) -> Result<Self> {
        TutorTopic::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| ErmError::Config(format!("unknown tutor topic '{}'", s)))
    }
}

/// context for the relationships tutor: the table as pipe lines
pub fn relationships_context(relationships: &[Relationship]) -> String {
    relationships_to_lines(relationships)
}

/// ask one tutor question about `context`.
///
/// only a generator failure is an error; an undecodable reply comes back as
/// the fallback response. topics with a context label need non-blank context
/// except for the greeting.
#[tracing::instrument(skip(generator, topic, context, question), fields(topic = %topic, context_len = context.len()))]
pub async fn ask_tutor(
    generator: &dyn TextGenerator,
    topic: TutorTopic,
    context: &str,
    question: &str,
) -> Result<TutorResponse> {
    let profile = topic.profile();
    let question = if question.trim().is_empty() {
        INITIAL_QUESTION
    } else {
        question
    };

    if let Some(label) = profile.context_label {
        if context.trim().is_empty() && question != INITIAL_QUESTION {
            return Err(ErmError::MissingInput {
                stage: "tutor",
                artifact: label,
            });
        }
    }

    let prompt = build_tutor_prompt(profile.context_label, context, question);
    let raw = generator.generate(&profile.instruction, &prompt).await?;

    let response = parse_tutor_response(&raw);
    tracing::info!(
        suggestions = response.suggested_questions.len(),
        "tutor answered"
    );
    Ok(response)
}

/// opening message of a tutor dialog
pub async fn greet(generator: &dyn TextGenerator, topic: TutorTopic) -> Result<TutorResponse> {
    ask_tutor(generator, topic, "", INITIAL_QUESTION).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::parser::FALLBACK_PREFIX;
    use crate::llm::ScriptedGenerator;

    #[test]
    fn test_every_profile_demands_json() {
        for topic in TutorTopic::ALL {
            let profile = topic.profile();
            assert!(profile.instruction.contains("suggested_questions"), "{}", topic);
            assert!(profile.instruction.contains(INITIAL_QUESTION), "{}", topic);
            assert!(!profile.title.is_empty());
        }
    }

    #[test]
    fn test_only_information_topic_is_context_free() {
        for topic in TutorTopic::ALL {
            let context_free = topic.profile().context_label.is_none();
            assert_eq!(context_free, topic == TutorTopic::Information, "{}", topic);
        }
    }

    #[test]
    fn test_topic_round_trips_through_str() {
        for topic in TutorTopic::ALL {
            assert_eq!(topic.as_str().parse::<TutorTopic>().unwrap(), topic);
        }
        assert!("sql".parse::<TutorTopic>().is_err());
    }

    #[test]
    fn test_relationships_context() {
        let rels = vec![Relationship::new("Klasse", "1", "hat", "*", "Schüler", ">")];
        assert_eq!(relationships_context(&rels), "Klasse|1|hat|*|Schüler");
    }

    #[tokio::test]
    async fn test_ask_tutor_decodes_reply() {
        let generator = ScriptedGenerator::always(
            r#"{"answer": "Ein PK identifiziert eine Zeile.", "suggested_questions": ["Was ist ein FK?"]}"#,
        );

        let response = ask_tutor(&generator, TutorTopic::SqlDdl, "CREATE TABLE a (id INT);", "Was ist ein PK?")
            .await
            .unwrap();

        assert_eq!(response.answer, "Ein PK identifiziert eine Zeile.");
        assert_eq!(response.suggested_questions.len(), 1);

        let (system, user) = &generator.prompts()[0];
        assert!(system.contains("SQL DDL"));
        assert!(user.contains("CREATE TABLE a (id INT);"));
        assert!(user.contains("Was ist ein PK?"));
    }

    #[tokio::test]
    async fn test_ask_tutor_falls_back_on_garbage() {
        let generator = ScriptedGenerator::always("leider kein json");
        let response = ask_tutor(&generator, TutorTopic::ErmDiagram, "@startuml\n@enduml", "Was ist das?")
            .await
            .unwrap();

        assert_eq!(response.answer, format!("{}leider kein json", FALLBACK_PREFIX));
        assert!(response.suggested_questions.is_empty());
    }

    #[tokio::test]
    async fn test_ask_tutor_propagates_generator_failure() {
        let generator = ScriptedGenerator::new();
        generator.push_failure("network down");

        let result = ask_tutor(&generator, TutorTopic::Information, "", "Was ist SQL?").await;
        assert!(matches!(result, Err(ErmError::Generation(_))));
    }

    #[tokio::test]
    async fn test_blank_context_is_rejected_for_context_topics() {
        let generator = ScriptedGenerator::always("{}");
        let result = ask_tutor(&generator, TutorTopic::LogicalModel, "  ", "Was ist ein FK?").await;

        assert!(matches!(result, Err(ErmError::MissingInput { .. })));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_greet_sends_sentinel_without_context() {
        let generator = ScriptedGenerator::always(r#"{"answer": "Hallo!", "suggested_questions": []}"#);
        let response = greet(&generator, TutorTopic::ErmPlantUml).await.unwrap();

        assert_eq!(response.answer, "Hallo!");
        let (_, user) = &generator.prompts()[0];
        assert!(user.ends_with(INITIAL_QUESTION));
    }

    #[tokio::test]
    async fn test_information_topic_omits_context() {
        let generator = ScriptedGenerator::always(r#"{"answer": "x"}"#);
        ask_tutor(&generator, TutorTopic::Information, "geheimer kontext", "Was ist ein ER-Modell?")
            .await
            .unwrap();

        let (_, user) = &generator.prompts()[0];
        assert!(!user.contains("geheimer kontext"));
    }
}
