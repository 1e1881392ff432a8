//! Flattening migrator: walks the nested curriculum tree in the document
//! store and upserts it into the three relational tables.
//!
//! Paths are processed one at a time; within a path every subject is
//! written before its lessons so foreign keys resolve at write time.
//! Writes are fail-fast: the first store error aborts the run. Child
//! records without an id contribute no rows and are only counted.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::curriculum::{LessonRow, PathRow, SubjectRow, DEFAULT_YEAR_LABEL};
use crate::store::{CurriculumStore, DocumentSource, SourceDocument};

/// Source collection holding the educational path documents.
pub const PATHS_COLLECTION: &str = "educationalPaths";

/// Row counts for a completed migration run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MigrationSummary {
    pub paths: usize,
    pub subjects: usize,
    pub lessons: usize,
    /// Child records dropped for lacking an id.
    pub skipped: usize,
}

/// Migrate every path document from the source into the relational store.
pub async fn migrate_curriculum(
    source: &dyn DocumentSource,
    store: &dyn CurriculumStore,
) -> Result<MigrationSummary> {
    let run_id = Uuid::new_v4().simple().to_string();
    info!("Starting curriculum migration (run {})", run_id);

    let documents = source
        .list_documents(PATHS_COLLECTION)
        .await
        .context("Failed to enumerate path documents")?;
    info!("Found {} path documents", documents.len());

    let mut summary = MigrationSummary::default();
    for (index, doc) in documents.iter().enumerate() {
        migrate_path(doc, store, &mut summary).await?;
        info!(
            "Migrated path '{}' ({}/{})",
            doc.id,
            index + 1,
            documents.len()
        );
    }

    info!(
        "Migration complete (run {}): {} paths, {} subjects, {} lessons, {} skipped",
        run_id, summary.paths, summary.subjects, summary.lessons, summary.skipped
    );
    Ok(summary)
}

async fn migrate_path(
    doc: &SourceDocument,
    store: &dyn CurriculumStore,
    summary: &mut MigrationSummary,
) -> Result<()> {
    let row = PathRow {
        id: doc.id.clone(),
        name: text(&doc.fields, "displayName")
            .or_else(|| text(&doc.fields, "title"))
            .unwrap_or_default(),
        institution_name: text(&doc.fields, "institution"),
        level: text(&doc.fields, "level"),
        year_label: text(&doc.fields, "year").unwrap_or_else(|| DEFAULT_YEAR_LABEL.to_string()),
    };

    store
        .upsert_path(&row)
        .await
        .with_context(|| format!("Failed to upsert path '{}'", doc.id))?;
    summary.paths += 1;

    for subject in children_of(doc.fields.get("subjects")) {
        migrate_subject(&subject, &doc.id, store, summary).await?;
    }

    Ok(())
}

async fn migrate_subject(
    subject: &Value,
    path_id: &str,
    store: &dyn CurriculumStore,
    summary: &mut MigrationSummary,
) -> Result<()> {
    let Some(id) = record_id(subject) else {
        warn!("Skipping subject without id under path '{}'", path_id);
        summary.skipped += 1;
        return Ok(());
    };

    let row = SubjectRow {
        id: id.clone(),
        path_id: path_id.to_string(),
        name: text(subject, "name"),
        icon: text(subject, "icon"),
        color_primary: color_primary(subject),
        total_lessons: subject.get("totalLessons").and_then(Value::as_i64),
    };

    store
        .upsert_subject(&row)
        .await
        .with_context(|| format!("Failed to upsert subject '{}'", id))?;
    summary.subjects += 1;

    for (index, lesson) in children_of(subject.get("lessons")).iter().enumerate() {
        migrate_lesson(lesson, &id, index, store, summary).await?;
    }

    Ok(())
}

async fn migrate_lesson(
    lesson: &Value,
    subject_id: &str,
    index: usize,
    store: &dyn CurriculumStore,
    summary: &mut MigrationSummary,
) -> Result<()> {
    let Some(id) = record_id(lesson) else {
        warn!("Skipping lesson without id under subject '{}'", subject_id);
        summary.skipped += 1;
        return Ok(());
    };

    let row = LessonRow {
        id: id.clone(),
        subject_id: subject_id.to_string(),
        title: text(lesson, "title"),
        duration: text(lesson, "duration"),
        content: text(lesson, "content"),
        order_index: index as i64,
    };

    store
        .upsert_lesson(&row)
        .await
        .with_context(|| format!("Failed to upsert lesson '{}'", id))?;
    summary.lessons += 1;

    Ok(())
}

// ============================================================================
// Field helpers
// ============================================================================

/// Normalize a polymorphic child collection into an ordered sequence.
///
/// Children arrive either as an ordered list or as a mapping keyed by
/// arbitrary strings; the list form wins, a mapping contributes its
/// values, anything else reads as empty.
fn children_of(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => map.values().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Source-provided id of a child record. Missing or empty ids disqualify
/// the record.
fn record_id(record: &Value) -> Option<String> {
    text(record, "id").filter(|id| !id.is_empty())
}

/// Read a field as text. Numbers are carried over as their decimal form so
/// text columns accept either source representation.
fn text(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First element of the subject's color list, when that list is non-empty.
fn color_primary(subject: &Value) -> Option<String> {
    match subject.get("color")?.as_array()?.first()? {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
