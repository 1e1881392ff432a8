//! Row types for the migrated curriculum schema.
//!
//! Three tables linked by foreign keys: paths → subjects → lessons. Ids
//! are carried verbatim from the source documents, never regenerated. The
//! tree types mirror the nested shape a relationship-aware read returns.

use serde::{Deserialize, Serialize};

pub const PATHS_TABLE: &str = "paths";
pub const SUBJECTS_TABLE: &str = "subjects";
pub const LESSONS_TABLE: &str = "lessons";

/// Year label stored when the source document carries none.
pub const DEFAULT_YEAR_LABEL: &str = "N/A";

/// A row in the `paths` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRow {
    pub id: String,
    pub name: String,
    pub institution_name: Option<String>,
    pub level: Option<String>,
    pub year_label: String,
}

/// A row in the `subjects` table, owned by a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRow {
    pub id: String,
    pub path_id: String,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color_primary: Option<String>,
    pub total_lessons: Option<i64>,
}

/// A row in the `lessons` table, owned by a subject. `order_index` is the
/// lesson's position in the normalized source sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonRow {
    pub id: String,
    pub subject_id: String,
    pub title: Option<String>,
    pub duration: Option<String>,
    pub content: Option<String>,
    pub order_index: i64,
}

/// A path with its subjects embedded, as returned by the nested read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathTree {
    #[serde(flatten)]
    pub path: PathRow,
    #[serde(default)]
    pub subjects: Vec<SubjectTree>,
}

/// A subject with its lessons embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectTree {
    #[serde(flatten)]
    pub subject: SubjectRow,
    #[serde(default)]
    pub lessons: Vec<LessonRow>,
}
