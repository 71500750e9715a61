//! Application state for CLI commands.
//!
//! Resolves the data directory and opens the [`GroundingService`] for it.

use std::path::PathBuf;

use anyhow::Context;

use storytailor_infra::config::resolve_data_dir;
use storytailor_types::error::GroundingError;
use storytailor_infra::service::GroundingService;

pub struct AppState {
    pub service: GroundingService,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the grounding service for `data_dir`, or the default data
    /// directory when none is given.
    pub async fn init(data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let data_dir = data_dir.unwrap_or_else(resolve_data_dir);

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let service = GroundingService::open(&data_dir)
            .await
            .with_context(|| format!("failed to open knowledge base in {}", data_dir.display()))?;

        tracing::debug!(data_dir = %data_dir.display(), "application state ready");
        Ok(Self { service, data_dir })
    }

    /// Persist the knowledge base after a mutating command.
    pub async fn save(&self) -> anyhow::Result<PathBuf> {
        self.service
            .save()
            .await
            .context("failed to save knowledge base")
    }

    /// Finish a mutation that started with `before` documents.
    ///
    /// Saves whenever the store changed, including when `result` is an
    /// error after some documents were already stored, then returns
    /// `result`'s error first.
    pub async fn persist<T>(
        &self,
        before: usize,
        result: Result<T, GroundingError>,
    ) -> anyhow::Result<T> {
        let saved = self.service.save_if_changed(before).await;
        if let (Err(op), Err(save)) = (&result, &saved) {
            tracing::warn!("knowledge base not saved after failed update ({op}): {save}");
        }
        let value = result?;
        saved.context("failed to save knowledge base")?;
        Ok(value)
    }

    pub async fn document_count(&self) -> usize {
        self.service.stats().await.total_documents
    }
}
