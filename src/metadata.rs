use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

/// Persona a robot speaks as, spliced into the system prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotRecord {
    #[serde(rename = "robot_name", alias = "name")]
    pub name: String,
    #[serde(default)]
    pub context: String,
}

impl RobotRecord {
    pub fn new(name: &str, context: &str) -> Self {
        Self {
            name: name.to_string(),
            context: context.to_string(),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, robot_id: &str) -> Result<Option<RobotRecord>>;
}

/// In-memory records, optionally seeded from a JSON object keyed by robot id.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    records: RwLock<HashMap<String, RobotRecord>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read robot metadata file: {}", path.display()))?;
        let records: HashMap<String, RobotRecord> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse robot metadata file: {}", path.display()))?;
        tracing::info!(path = %path.display(), robots = records.len(), "loaded robot metadata");
        Ok(Self {
            records: RwLock::new(records),
        })
    }

    pub fn insert(&self, robot_id: &str, record: RobotRecord) {
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(robot_id.to_string(), record);
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, robot_id: &str) -> Result<Option<RobotRecord>> {
        let records = self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(records.get(robot_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn loads_records_from_json() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"{{"robot_1": {{"robot_name": "Rex", "context": "A friendly guide."}}, "robot_2": {{"name": "Ada"}}}}"#
        )?;

        let store = MemoryMetadataStore::from_json_file(file.path())?;
        assert_eq!(store.get("robot_1").await?, Some(RobotRecord::new("Rex", "A friendly guide.")));
        assert_eq!(store.get("robot_2").await?.map(|r| r.name), Some("Ada".to_string()));
        assert_eq!(store.get("robot_9").await?, None);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = MemoryMetadataStore::from_json_file(Path::new("/nonexistent/robots.json"));
        assert!(result.is_err());
    }
}
