//! Supabase client for the migrated curriculum tables.
//!
//! Writes go through PostgREST upserts keyed on `id`; the nested read asks
//! PostgREST to embed related child tables in a single round trip, so no
//! join logic lives on this side.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::curriculum::{
    LessonRow, PathRow, PathTree, SubjectRow, LESSONS_TABLE, PATHS_TABLE, SUBJECTS_TABLE,
};
use crate::store::{ApiError, CurriculumStore};

/// Supabase client configuration.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseClient {
    /// Create a new Supabase client from environment variables.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("SUPABASE_URL").map_err(|_| anyhow!("SUPABASE_URL not set"))?;
        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| anyhow!("SUPABASE_SERVICE_ROLE_KEY not set"))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            service_role_key,
        })
    }

    /// Upsert a single row, keyed on the table's `id` column. Re-applying
    /// the same row is a no-op update.
    async fn upsert<T: Serialize>(&self, table: &str, row: &T) -> Result<()> {
        let url = format!("{}/rest/v1/{}?on_conflict=id", self.base_url, table);

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError {
                context: format!("Upsert into {} failed", table),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        debug!("Upserted row into {}", table);
        Ok(())
    }

    /// Helper: GET from the Supabase REST API.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/rest/v1/{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError {
                context: format!("Supabase GET {} failed", path),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl CurriculumStore for SupabaseClient {
    async fn upsert_path(&self, row: &PathRow) -> Result<()> {
        self.upsert(PATHS_TABLE, row).await
    }

    async fn upsert_subject(&self, row: &SubjectRow) -> Result<()> {
        self.upsert(SUBJECTS_TABLE, row).await
    }

    async fn upsert_lesson(&self, row: &LessonRow) -> Result<()> {
        self.upsert(LESSONS_TABLE, row).await
    }

    async fn fetch_path_tree(&self, path_id: &str) -> Result<Vec<PathTree>> {
        self.get_json(&format!(
            "{}?id=eq.{}&select=*,{}(*,{}(*))",
            PATHS_TABLE, path_id, SUBJECTS_TABLE, LESSONS_TABLE
        ))
        .await
    }
}
