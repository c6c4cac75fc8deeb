use std::{collections::HashSet, sync::Arc};

use crate::{
    error::{AppError, AppResult},
    models::{CatalogId, CatalogRequest, MediaType, RawAwards, RawRecord},
    services::providers::{AwardsProvider, CatalogProvider},
};

/// Retrieves candidate records and attaches availability and award data
///
/// No retries happen here; a failed trending call is returned as-is. Per-record
/// enrichment failures are logged and leave that record unenriched.
#[derive(Clone)]
pub struct CatalogFetcher {
    catalog: Arc<dyn CatalogProvider>,
    awards: Option<Arc<dyn AwardsProvider>>,
}

impl CatalogFetcher {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        awards: Option<Arc<dyn AwardsProvider>>,
    ) -> Self {
        Self { catalog, awards }
    }

    /// Fetches one trending page and enriches every record with an `id`
    pub async fn fetch(&self, request: &CatalogRequest) -> AppResult<Vec<RawRecord>> {
        let records = self.catalog.fetch_trending(request).await?;
        let total = records.len();

        let mut seen = HashSet::new();
        let records: Vec<RawRecord> = records
            .into_iter()
            .filter(|r| match &r.id {
                Some(id) => {
                    let media_type = record_media_type(r, request.media_type);
                    seen.insert((id.clone(), media_type))
                }
                None => false,
            })
            .collect();
        if records.len() < total {
            tracing::debug!(
                dropped = total - records.len(),
                provider = self.catalog.name(),
                "Skipping records without an id or already seen"
            );
        }

        Ok(self.enrich_batch(records, request.media_type).await)
    }

    /// Fetches and enriches a single title
    pub async fn fetch_one(&self, media_type: MediaType, id: &CatalogId) -> AppResult<RawRecord> {
        let record = self.catalog.fetch_details(media_type, id).await?;
        Ok(enrich(self.catalog.clone(), self.awards.clone(), record, media_type).await)
    }

    /// Enriches records in parallel, preserving input order
    async fn enrich_batch(&self, records: Vec<RawRecord>, context: MediaType) -> Vec<RawRecord> {
        let mut tasks = Vec::with_capacity(records.len());

        for record in records {
            let catalog = self.catalog.clone();
            let awards = self.awards.clone();
            let task = tokio::spawn(async move { enrich(catalog, awards, record, context).await });
            tasks.push(task);
        }

        let mut results = Vec::with_capacity(tasks.len());
        let mut failures = 0usize;

        for task in tasks {
            match task.await {
                Ok(record) => results.push(record),
                Err(e) => {
                    tracing::error!(error = %e, "Enrichment task join error");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            tracing::warn!(
                success_count = results.len(),
                error_count = failures,
                "Partial enrichment failure"
            );
        }

        results
    }
}

fn record_media_type(record: &RawRecord, context: MediaType) -> MediaType {
    record
        .media_type
        .as_deref()
        .and_then(MediaType::parse)
        .unwrap_or(context)
}

/// Attaches watch providers and, when an awards source is configured, awards
async fn enrich(
    catalog: Arc<dyn CatalogProvider>,
    awards: Option<Arc<dyn AwardsProvider>>,
    mut record: RawRecord,
    context: MediaType,
) -> RawRecord {
    let Some(id) = record.id.clone() else {
        return record;
    };
    let media_type = record_media_type(&record, context);

    if record.watch_providers.is_none() {
        match catalog.fetch_watch_providers(media_type, &id).await {
            Ok(offers) => record.watch_providers = offers,
            Err(e) => log_enrichment_failure(&e, "watch_providers", media_type, &id),
        }
    }

    if let Some(awards) = awards {
        if record.awards.is_none() {
            match lookup_awards(catalog.as_ref(), awards.as_ref(), media_type, &id).await {
                Ok(summary) => record.awards = summary.map(RawAwards::Summary),
                Err(e) => log_enrichment_failure(&e, "awards", media_type, &id),
            }
        }
    }

    record
}

async fn lookup_awards(
    catalog: &dyn CatalogProvider,
    awards: &dyn AwardsProvider,
    media_type: MediaType,
    id: &CatalogId,
) -> AppResult<Option<String>> {
    match catalog.fetch_imdb_id(media_type, id).await? {
        Some(imdb_id) => awards.fetch_awards(&imdb_id).await,
        None => Ok(None),
    }
}

fn log_enrichment_failure(error: &AppError, stage: &str, media_type: MediaType, id: &CatalogId) {
    tracing::warn!(
        error = %error,
        stage,
        media_type = %media_type,
        id = %id,
        "Enrichment failed, continuing without it"
    );
}
