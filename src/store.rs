//! Store collaborator traits for the migration pipeline.
//!
//! The migrator reads from a document source and writes to a curriculum
//! store; the reader only needs the store side. Production implementations
//! are REST clients (`firestore`, `supabase`); tests use in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::curriculum::{LessonRow, PathRow, PathTree, SubjectRow};

/// A document read from the source store: an opaque, source-provided id
/// plus its raw field mapping as plain JSON.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub id: String,
    pub fields: Value,
}

/// Error returned by a REST store, keeping status and body inspectable.
#[derive(Debug, Error)]
#[error("{context}: {status} - {body}")]
pub struct ApiError {
    pub context: String,
    pub status: u16,
    pub body: String,
}

/// Schema-flexible source store addressed by collection name and document id.
#[async_trait]
pub trait DocumentSource {
    /// Enumerate every document in a named collection.
    async fn list_documents(&self, collection: &str) -> Result<Vec<SourceDocument>>;

    /// Read a single document by id. `None` when it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<SourceDocument>>;
}

/// Relational target store: upsert-by-id writes plus a single declarative
/// read that embeds related child rows by foreign key.
#[async_trait]
pub trait CurriculumStore {
    async fn upsert_path(&self, row: &PathRow) -> Result<()>;
    async fn upsert_subject(&self, row: &SubjectRow) -> Result<()>;
    async fn upsert_lesson(&self, row: &LessonRow) -> Result<()>;

    /// Fetch a path with its subjects and their lessons embedded, in one
    /// round trip. Zero or one element, since the filter is on the primary
    /// key; child ordering is whatever the store's relationship resolution
    /// yields.
    async fn fetch_path_tree(&self, path_id: &str) -> Result<Vec<PathTree>>;
}
