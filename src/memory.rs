//! In-memory store fakes for exercising the pipeline in tests.
//!
//! `InMemoryStore` keeps one map per table keyed on `id`, so inserting is
//! upserting, and resolves the nested read by foreign key the way the
//! relational store's embedding does.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::curriculum::{LessonRow, PathRow, PathTree, SubjectRow, SubjectTree};
use crate::store::{CurriculumStore, DocumentSource, SourceDocument};

/// Document source backed by plain JSON fixtures.
#[derive(Default)]
pub struct InMemorySource {
    collections: Mutex<BTreeMap<String, Vec<SourceDocument>>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, collection: &str, id: &str, fields: Value) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(SourceDocument {
                id: id.to_string(),
                fields,
            });
    }
}

#[async_trait]
impl DocumentSource for InMemorySource {
    async fn list_documents(&self, collection: &str) -> Result<Vec<SourceDocument>> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<SourceDocument>> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }
}

/// Relational store fake with switchable failure injection.
#[derive(Default)]
pub struct InMemoryStore {
    pub paths: Mutex<BTreeMap<String, PathRow>>,
    pub subjects: Mutex<BTreeMap<String, SubjectRow>>,
    pub lessons: Mutex<BTreeMap<String, LessonRow>>,
    fail_lessons: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemoryStore {
    /// Make every subsequent lesson upsert fail.
    pub fn fail_lesson_upserts(&self) {
        self.fail_lessons.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent nested read fail.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CurriculumStore for InMemoryStore {
    async fn upsert_path(&self, row: &PathRow) -> Result<()> {
        self.paths
            .lock()
            .unwrap()
            .insert(row.id.clone(), row.clone());
        Ok(())
    }

    async fn upsert_subject(&self, row: &SubjectRow) -> Result<()> {
        self.subjects
            .lock()
            .unwrap()
            .insert(row.id.clone(), row.clone());
        Ok(())
    }

    async fn upsert_lesson(&self, row: &LessonRow) -> Result<()> {
        if self.fail_lessons.load(Ordering::SeqCst) {
            return Err(anyhow!("injected lesson upsert failure"));
        }
        self.lessons
            .lock()
            .unwrap()
            .insert(row.id.clone(), row.clone());
        Ok(())
    }

    async fn fetch_path_tree(&self, path_id: &str) -> Result<Vec<PathTree>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("injected read failure"));
        }

        let lessons = self.lessons.lock().unwrap();
        let subjects = self.subjects.lock().unwrap();

        Ok(self
            .paths
            .lock()
            .unwrap()
            .get(path_id)
            .map(|path| PathTree {
                path: path.clone(),
                subjects: subjects
                    .values()
                    .filter(|s| s.path_id == path_id)
                    .map(|s| SubjectTree {
                        subject: s.clone(),
                        lessons: lessons
                            .values()
                            .filter(|l| l.subject_id == s.id)
                            .cloned()
                            .collect(),
                    })
                    .collect(),
            })
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_source_get_document() {
        let source = InMemorySource::new();
        source.push("educationalPaths", "eng-2024", json!({"title": "Engineering"}));

        let doc = source
            .get_document("educationalPaths", "eng-2024")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.id, "eng-2024");
        assert_eq!(doc.fields, json!({"title": "Engineering"}));

        assert!(source
            .get_document("educationalPaths", "missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_store_insert_is_upsert() {
        let store = InMemoryStore::default();
        let mut row = PathRow {
            id: "p1".to_string(),
            name: "First".to_string(),
            institution_name: None,
            level: None,
            year_label: "N/A".to_string(),
        };

        store.upsert_path(&row).await.unwrap();
        row.name = "Second".to_string();
        store.upsert_path(&row).await.unwrap();

        let paths = store.paths.lock().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths["p1"].name, "Second");
    }
}
