use crate::model::Relationship;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// source produced for an empty relationship list
pub const EMPTY_DIAGRAM: &str = "@startuml\n@enduml";

static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*entity[ \t]+("[^"]+"|[^\s{]+)"#).unwrap()
});

static LINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*[^\s"]+[ \t]+(?:"[^"]*"[ \t]+)?-+[ \t]+(?:"[^"]*"[ \t]+)?[^\s"]+"#).unwrap()
});

/// render relationships as a conceptual plantuml diagram.
///
/// entities are declared once each in first-seen order, followed by one link
/// line per relationship. cardinalities, verbs and directions are copied as-is.
pub fn build_diagram_source(relationships: &[Relationship]) -> String {
    if relationships.is_empty() {
        return EMPTY_DIAGRAM.to_string();
    }

    let mut seen = HashSet::new();
    let mut entities = Vec::new();
    for rel in relationships {
        for entity in [&rel.entity_a, &rel.entity_b] {
            if seen.insert(entity.as_str()) {
                entities.push(entity.as_str());
            }
        }
    }

    let mut source = String::from("@startuml\n\n");
    for entity in entities {
        source.push_str(&format!("entity {} {{}}\n", entity));
    }
    source.push('\n');

    for rel in relationships {
        source.push_str(&format!(
            "{} \"{}\" -- \"{}\" {} : {} {}\n",
            rel.entity_a, rel.cardinality_a, rel.cardinality_b, rel.entity_b, rel.verb, rel.direction
        ));
    }

    source.push_str("\n@enduml");
    source
}

/// what a plantuml source declares, as far as a line scan can tell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagramSummary {
    pub entities: Vec<String>,
    pub links: usize,
    pub well_formed: bool,
}

impl DiagramSummary {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.links == 0
    }
}

pub fn summarize_diagram(source: &str) -> DiagramSummary {
    let trimmed = source.trim();
    let well_formed = trimmed.starts_with("@startuml") && trimmed.ends_with("@enduml");

    let entities = ENTITY_REGEX
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_matches('"').to_string())
        .collect();

    DiagramSummary {
        entities,
        links: LINK_REGEX.find_iter(source).count(),
        well_formed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_relationships_give_empty_diagram() {
        let source = build_diagram_source(&[]);
        assert_eq!(source, EMPTY_DIAGRAM);

        let summary = summarize_diagram(&source);
        assert!(summary.well_formed);
        assert!(summary.is_empty());
    }

    #[test]
    fn test_diagram_layout() {
        let rels = vec![
            Relationship::new("Klasse", "1", "besteht aus", "*", "Schüler", ">"),
            Relationship::new("Klasse", "*", "KL", "1", "Lehrkraft", ">"),
        ];

        let expected = "\
@startuml

entity Klasse {}
entity Schüler {}
entity Lehrkraft {}

Klasse \"1\" -- \"*\" Schüler : besteht aus >
Klasse \"*\" -- \"1\" Lehrkraft : KL >

@enduml";
        assert_eq!(build_diagram_source(&rels), expected);
    }

    #[test]
    fn test_self_relationship_declares_entity_once() {
        let rels = vec![Relationship::new("Mitarbeiter", "1", "leitet", "*", "Mitarbeiter", ">")];
        let summary = summarize_diagram(&build_diagram_source(&rels));

        assert_eq!(summary.entities, vec!["Mitarbeiter".to_string()]);
        assert_eq!(summary.links, 1);
    }

    #[test]
    fn test_summary_counts_generated_source() {
        let rels = vec![
            Relationship::new("A", "1", "hat", "*", "B", ">"),
            Relationship::new("B", "1", "kennt", "1", "C", ">"),
            Relationship::new("C", "1..2", "mag", "*", "A", ">"),
        ];
        let summary = summarize_diagram(&build_diagram_source(&rels));

        assert_eq!(summary.entities, vec!["A", "B", "C"]);
        assert_eq!(summary.links, 3);
        assert!(summary.well_formed);
    }

    #[test]
    fn test_summary_of_logical_model() {
        let source = "\
@startuml
entity Klasse {
  + id (PK)
  --
  name: varchar(255)
}
entity Klasse_Lehrkraft {
  + klas_id (FK) (PK)
  + leh_id (FK) (PK)
}

Klasse \"1\" -- \"*\" Klasse_Lehrkraft : hat >
@enduml";

        let summary = summarize_diagram(source);
        assert_eq!(summary.entities, vec!["Klasse", "Klasse_Lehrkraft"]);
        // the `--` separator inside an entity block is not a link
        assert_eq!(summary.links, 1);
    }

    #[test]
    fn test_summary_flags_unwrapped_source() {
        assert!(!summarize_diagram("entity A {}").well_formed);
    }
}
