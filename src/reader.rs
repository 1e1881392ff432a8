//! Nested reader: reassembles one migrated path in a single
//! relationship-aware query against the relational store.
//!
//! An empty result means the id was not found and is not an error; store
//! failures surface through the error chain. The summary log line is
//! diagnostic only; returned data is never truncated.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;

use crate::curriculum::PathTree;
use crate::store::CurriculumStore;

/// Longest content excerpt included in the diagnostic log line.
const EXCERPT_CHARS: usize = 80;

/// Fetch a path with its subjects and lessons embedded, logging round-trip
/// latency and a short summary of what came back.
pub async fn read_path(store: &dyn CurriculumStore, path_id: &str) -> Result<Vec<PathTree>> {
    let started = Instant::now();
    let trees = store
        .fetch_path_tree(path_id)
        .await
        .with_context(|| format!("Nested read for path '{}' failed", path_id))?;
    let elapsed = started.elapsed();

    match trees.first() {
        Some(tree) => log_summary(tree, elapsed),
        None => info!("No path found for id '{}' ({:?})", path_id, elapsed),
    }

    Ok(trees)
}

fn log_summary(tree: &PathTree, elapsed: Duration) {
    let lesson_count: usize = tree.subjects.iter().map(|s| s.lessons.len()).sum();
    let first_subject = tree
        .subjects
        .first()
        .and_then(|s| s.subject.name.as_deref())
        .unwrap_or("-");
    let excerpt = tree
        .subjects
        .first()
        .and_then(|s| s.lessons.first())
        .and_then(|l| l.content.as_deref())
        .map(|c| truncate(c, EXCERPT_CHARS))
        .unwrap_or_default();

    info!(
        "Fetched path '{}' in {:?}: institution={}, first subject='{}', {} lessons, excerpt=\"{}\"",
        tree.path.id,
        elapsed,
        tree.path.institution_name.as_deref().unwrap_or("-"),
        first_subject,
        lesson_count,
        excerpt
    );
}

/// Truncate to a character limit, appending an ellipsis when cut.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut)
}
