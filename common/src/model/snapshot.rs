use crate::error::{ErmError, Result};
use crate::model::relationship::Relationship;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// every artifact of one project, as saved to and loaded from disk.
///
/// all five fields are required when decoding; empty strings are fine.
/// stage order consistency (a schema implies both diagram sources) is the
/// caller's business and is not checked here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectState {
    pub description: String,
    pub relationships: Vec<Relationship>,
    #[serde(rename = "ermPlantUml")]
    pub erm_source: String,
    #[serde(rename = "tableModelPlantUml")]
    pub table_model_source: String,
    #[serde(rename = "sqlDdl")]
    pub ddl_script: String,
}

impl ProjectState {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_relationship_added(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn with_relationship_removed(mut self, index: usize) -> Result<Self> {
        if index >= self.relationships.len() {
            return Err(ErmError::Edit(format!(
                "relationship index {} out of range (project has {})",
                index,
                self.relationships.len()
            )));
        }
        self.relationships.remove(index);
        Ok(self)
    }
}

/// write a pretty-printed snapshot
pub fn save_snapshot<W: Write>(state: &ProjectState, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, state)?;
    Ok(())
}

/// decode a snapshot. shape errors are fatal; nothing is repaired or reordered.
pub fn load_snapshot<R: Read>(reader: R) -> Result<ProjectState> {
    serde_json::from_reader(reader).map_err(|e| ErmError::Snapshot(e.to_string()))
}

#[tracing::instrument(skip(state, path), fields(path = %path.display(), relationships = state.relationships.len()))]
pub fn save_snapshot_file(state: &ProjectState, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    save_snapshot(state, &mut writer)?;
    writer.flush()?;

    tracing::debug!("snapshot saved");
    Ok(())
}

#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_snapshot_file(path: &Path) -> Result<ProjectState> {
    let reader = BufReader::new(File::open(path)?);
    let state = load_snapshot(reader)?;

    tracing::debug!(relationships = state.relationships.len(), "snapshot loaded");
    Ok(state)
}

/// export just the relationship table
pub fn save_relationships<W: Write>(relationships: &[Relationship], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, relationships)?;
    Ok(())
}

pub fn load_relationships<R: Read>(reader: R) -> Result<Vec<Relationship>> {
    serde_json::from_reader(reader).map_err(|e| ErmError::Snapshot(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> ProjectState {
        ProjectState {
            description: "Eine Klasse hat viele Schüler.".to_string(),
            relationships: vec![
                Relationship::new("Klasse", "1", "hat", "*", "Schüler", ">"),
                Relationship::new("Lehrkraft", "1", "leitet", "1", "Klasse", ">"),
            ],
            erm_source: "@startuml\n@enduml".to_string(),
            table_model_source: "@startuml\nentity Klasse {}\n@enduml".to_string(),
            ddl_script: "CREATE TABLE Klasse (id INT);".to_string(),
        }
    }

    fn round_trip(state: &ProjectState) -> ProjectState {
        let mut buffer = Vec::new();
        save_snapshot(state, &mut buffer).unwrap();
        load_snapshot(buffer.as_slice()).unwrap()
    }

    #[test]
    fn test_round_trip_full_state() {
        let state = sample_state();
        assert_eq!(round_trip(&state), state);
    }

    #[test]
    fn test_round_trip_empty_state() {
        let state = ProjectState::default();
        assert_eq!(round_trip(&state), state);
    }

    #[test]
    fn test_round_trip_keeps_duplicate_pairs_in_order() {
        // load must not re-canonicalize
        let state = ProjectState {
            relationships: vec![
                Relationship::new("B", "1", "hat", "1", "A", ">"),
                Relationship::new("A", "1", "hat", "*", "B", ">"),
            ],
            ..ProjectState::default()
        };
        assert_eq!(round_trip(&state).relationships, state.relationships);
    }

    #[test]
    fn test_uses_editor_field_names() {
        let mut buffer = Vec::new();
        save_snapshot(&sample_state(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        for key in ["description", "relationships", "ermPlantUml", "tableModelPlantUml", "sqlDdl", "entity1", "cardinality2"] {
            assert!(text.contains(&format!("\"{}\"", key)), "missing key {}", key);
        }
    }

    #[test]
    fn test_missing_field_is_snapshot_error() {
        let json = r#"{"description":"x","relationships":[],"ermPlantUml":"","tableModelPlantUml":""}"#;
        let err = load_snapshot(json.as_bytes()).unwrap_err();
        assert!(matches!(err, ErmError::Snapshot(_)));
    }

    #[test]
    fn test_wrong_shape_is_snapshot_error() {
        let json = r#"{"description":"x","relationships":"oops","ermPlantUml":"","tableModelPlantUml":"","sqlDdl":""}"#;
        assert!(matches!(load_snapshot(json.as_bytes()), Err(ErmError::Snapshot(_))));

        let json = r#"{"description":42,"relationships":[],"ermPlantUml":"","tableModelPlantUml":"","sqlDdl":""}"#;
        assert!(matches!(load_snapshot(json.as_bytes()), Err(ErmError::Snapshot(_))));
    }

    #[test]
    fn test_relationship_missing_entity_is_snapshot_error() {
        let json = r#"{"description":"","relationships":[{"entity1":"A","cardinality1":"1","verb":"hat","cardinality2":"*"}],"ermPlantUml":"","tableModelPlantUml":"","sqlDdl":""}"#;
        assert!(matches!(load_snapshot(json.as_bytes()), Err(ErmError::Snapshot(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("project.json");
        let state = sample_state();

        save_snapshot_file(&state, &path).unwrap();
        assert_eq!(load_snapshot_file(&path).unwrap(), state);
    }

    #[test]
    fn test_relationship_editing() {
        let state = ProjectState::new("desc")
            .with_relationship_added(Relationship::new("A", "1", "hat", "*", "B", ">"))
            .with_relationship_added(Relationship::new("B", "1", "kennt", "1", "C", ">"));
        assert_eq!(state.relationships.len(), 2);

        let state = state.with_relationship_removed(0).unwrap();
        assert_eq!(state.relationships.len(), 1);
        assert_eq!(state.relationships[0].entity_a, "B");

        assert!(state.with_relationship_removed(5).is_err());
    }

    #[test]
    fn test_relationship_list_round_trip() {
        let rels = sample_state().relationships;
        let mut buffer = Vec::new();
        save_relationships(&rels, &mut buffer).unwrap();
        assert_eq!(load_relationships(buffer.as_slice()).unwrap(), rels);
    }
}
