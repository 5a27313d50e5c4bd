//! Résumé storage. The persisted contract is a JSON document
//! `{ "resumes": [ { id, name, content, timestamp, isDefault } ] }` holding at
//! most three résumés, at most one of them marked default.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod library;
pub mod parser;

pub const MAX_RESUMES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: String,
    pub name: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Refusing to store {count} resumes (maximum is 3)")]
    TooMany { count: usize },

    #[error("Refusing to store {count} default resumes (at most one allowed)")]
    MultipleDefaults { count: usize },
}

/// The résumé picked for scoring: the one marked default, else the first.
pub fn default_resume(resumes: &[Resume]) -> Option<&Resume> {
    resumes
        .iter()
        .find(|r| r.is_default)
        .or_else(|| resumes.first())
}

/// Checks the stored-list contract: at most 3 résumés, at most one default.
pub fn validate(resumes: &[Resume]) -> Result<(), StoreError> {
    if resumes.len() > MAX_RESUMES {
        return Err(StoreError::TooMany {
            count: resumes.len(),
        });
    }
    let defaults = resumes.iter().filter(|r| r.is_default).count();
    if defaults > 1 {
        return Err(StoreError::MultipleDefaults { count: defaults });
    }
    Ok(())
}

/// Last-write-wins key/value style storage for the résumé list.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn get(&self) -> Result<Vec<Resume>, StoreError>;
    async fn set(&self, resumes: &[Resume]) -> Result<(), StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// File-backed store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageFile {
    #[serde(default)]
    resumes: Vec<Resume>,
}

pub struct JsonFileResumeStore {
    path: PathBuf,
}

impl JsonFileResumeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl ResumeStore for JsonFileResumeStore {
    async fn get(&self) -> Result<Vec<Resume>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let file: StorageFile = serde_json::from_str(&raw)?;
        Ok(file.resumes)
    }

    async fn set(&self, resumes: &[Resume]) -> Result<(), StoreError> {
        validate(resumes)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_string_pretty(&StorageFile {
            resumes: resumes.to_vec(),
        })?;

        // Write a sibling temp file, then rename it over the target.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!("Stored {} resumes in {}", resumes.len(), self.path.display());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryResumeStore {
    resumes: Mutex<Vec<Resume>>,
}

impl InMemoryResumeStore {
    pub fn with_resumes(resumes: Vec<Resume>) -> Self {
        Self {
            resumes: Mutex::new(resumes),
        }
    }
}

#[async_trait]
impl ResumeStore for InMemoryResumeStore {
    async fn get(&self) -> Result<Vec<Resume>, StoreError> {
        Ok(self
            .resumes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    async fn set(&self, resumes: &[Resume]) -> Result<(), StoreError> {
        validate(resumes)?;
        *self
            .resumes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = resumes.to_vec();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_resume(id: &str, is_default: bool) -> Resume {
    Resume {
        id: id.to_string(),
        name: format!("{id}.pdf"),
        content: format!("# Resume {id}"),
        timestamp: 1_700_000_000_000,
        is_default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_serializes_camel_case() {
        let json = serde_json::to_value(sample_resume("a", true)).unwrap();
        assert_eq!(json["isDefault"], true);
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert!(json.get("is_default").is_none());
    }

    #[test]
    fn test_default_resume_prefers_flag_then_first() {
        let resumes = vec![sample_resume("a", false), sample_resume("b", true)];
        assert_eq!(default_resume(&resumes).unwrap().id, "b");

        let resumes = vec![sample_resume("a", false), sample_resume("b", false)];
        assert_eq!(default_resume(&resumes).unwrap().id, "a");

        assert!(default_resume(&[]).is_none());
    }

    #[test]
    fn test_validate_rejects_broken_lists() {
        let four: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| sample_resume(id, false))
            .collect();
        assert!(matches!(validate(&four), Err(StoreError::TooMany { count: 4 })));

        let two_defaults = vec![sample_resume("a", true), sample_resume("b", true)];
        assert!(matches!(
            validate(&two_defaults),
            Err(StoreError::MultipleDefaults { count: 2 })
        ));
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileResumeStore::new(dir.path().join("nested").join("storage.json"));
        assert!(store.get().await.unwrap().is_empty());

        let resumes = vec![sample_resume("a", true), sample_resume("b", false)];
        store.set(&resumes).await.unwrap();
        assert_eq!(store.get().await.unwrap(), resumes);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"resumes\""));
        assert!(raw.contains("\"isDefault\": true"));
    }

    #[tokio::test]
    async fn test_file_store_rejects_invalid_list_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileResumeStore::new(dir.path().join("storage.json"));
        let two_defaults = vec![sample_resume("a", true), sample_resume("b", true)];
        assert!(store.set(&two_defaults).await.is_err());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_file_store_reports_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonFileResumeStore::new(path).get().await.unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[tokio::test]
    async fn test_memory_store_is_last_write_wins() {
        let store = InMemoryResumeStore::default();
        store.set(&[sample_resume("a", true)]).await.unwrap();
        store.set(&[sample_resume("b", false)]).await.unwrap();
        let stored = store.get().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "b");
    }
}
