//! Résumé management: upload, pick default, delete. Every operation is a
//! read-modify-write of the whole list against a `ResumeStore`.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::resume::parser::{ParseError, ResumeParser};
use crate::resume::{default_resume, Resume, ResumeStore, StoreError, MAX_RESUMES};

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Maximum 3 resumes allowed")]
    Full,

    #[error("Only PDF files are allowed")]
    NotPdf,

    #[error("No resume with id {0}")]
    NotFound(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct ResumeLibrary {
    store: Arc<dyn ResumeStore>,
}

impl ResumeLibrary {
    pub fn new(store: Arc<dyn ResumeStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Resume>, LibraryError> {
        Ok(self.store.get().await?)
    }

    /// The résumé used for scoring, if any is stored.
    pub async fn default_resume(&self) -> Result<Option<Resume>, LibraryError> {
        let resumes = self.store.get().await?;
        Ok(default_resume(&resumes).cloned())
    }

    /// Parses `pdf` and stores it. The first résumé stored becomes the default.
    pub async fn add(
        &self,
        file_name: &str,
        pdf: &[u8],
        parser: &dyn ResumeParser,
    ) -> Result<Resume, LibraryError> {
        let mut resumes = self.store.get().await?;
        if resumes.len() >= MAX_RESUMES {
            return Err(LibraryError::Full);
        }
        if !is_pdf(file_name, pdf) {
            return Err(LibraryError::NotPdf);
        }

        let content = parser.parse_pdf(pdf).await?;

        // The list may have changed while parsing.
        resumes = self.store.get().await?;
        if resumes.len() >= MAX_RESUMES {
            return Err(LibraryError::Full);
        }

        let resume = Resume {
            id: Uuid::new_v4().to_string(),
            name: file_name.to_string(),
            content,
            timestamp: Utc::now().timestamp_millis(),
            is_default: resumes.is_empty(),
        };
        resumes.push(resume.clone());
        self.store.set(&resumes).await?;
        info!("Stored resume '{}' ({})", resume.name, resume.id);
        Ok(resume)
    }

    pub async fn set_default(&self, id: &str) -> Result<(), LibraryError> {
        let mut resumes = self.store.get().await?;
        if !resumes.iter().any(|r| r.id == id) {
            return Err(LibraryError::NotFound(id.to_string()));
        }
        for resume in &mut resumes {
            resume.is_default = resume.id == id;
        }
        self.store.set(&resumes).await?;
        info!("Default resume is now {id}");
        Ok(())
    }

    /// Deletes `id`. If it was the default, the first remaining résumé takes over.
    pub async fn delete(&self, id: &str) -> Result<Resume, LibraryError> {
        let mut resumes = self.store.get().await?;
        let index = resumes
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        let removed = resumes.remove(index);

        if removed.is_default {
            if let Some(next) = resumes.first_mut() {
                next.is_default = true;
            }
        }
        self.store.set(&resumes).await?;
        info!("Deleted resume '{}' ({})", removed.name, removed.id);
        Ok(removed)
    }
}

fn is_pdf(file_name: &str, bytes: &[u8]) -> bool {
    let has_extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    has_extension && bytes.starts_with(PDF_MAGIC)
}
