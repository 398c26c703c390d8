//! Saved analyses: save, paged listing, single read, delete.
//!
//! Listing pages and single records are read-through cached. Any change to
//! an account's records drops every cached page for that account.

use std::sync::Arc;

use cache_store::keys::{self, ListingKey};
use cache_store::{CacheStore, CacheStoreExt, EntryKind};
use database::{account, analysis, validation};
use database::{AnalysisFilter, AnalysisRecord, AnalysisSummary, Database, KeyValue, NewAnalysis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

/// Fixed listing page size.
pub const PAGE_SIZE: i64 = 9;

/// Highest page whose row offset fits in an `i64`.
pub const MAX_PAGE: i64 = i64::MAX / PAGE_SIZE;

/// A finished analysis the user wants to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnalysis {
    pub endpoint: String,
    pub method: String,
    #[serde(default)]
    pub request_headers: Vec<KeyValue>,
    #[serde(default)]
    pub request_query_params: Vec<KeyValue>,
    #[serde(default)]
    pub request_body: Option<String>,
    pub response_status: i64,
    #[serde(default)]
    pub response_headers: Vec<KeyValue>,
    #[serde(default)]
    pub response_body: Option<String>,
    #[serde(default)]
    pub ai_analysis: Option<String>,
    #[serde(default)]
    pub cost: i64,
}

/// Listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<i64>,
    pub search_query: Option<String>,
    pub method: Option<String>,
    pub status: Option<i64>,
}

/// One page of summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPage {
    pub offset: i64,
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub items: Vec<AnalysisSummary>,
}

/// Saved analysis operations, all scoped to the owning account.
#[derive(Clone)]
pub struct RecordService {
    db: Database,
    cache: Arc<dyn CacheStore>,
}

impl RecordService {
    pub fn new(db: Database, cache: Arc<dyn CacheStore>) -> Self {
        Self { db, cache }
    }

    /// A failed write evicts `key`. Only a failed eviction is returned.
    async fn cache_write<T: Serialize + Sync>(&self, key: &str, kind: EntryKind, value: &T) -> Result<()> {
        if let Err(e) = self.cache.write_as(key, kind, value).await {
            warn!(key, error = %e, "Cache write failed, evicting");
            self.cache.delete_key(key).await?;
        }
        Ok(())
    }

    async fn cache_read<T: serde::de::DeserializeOwned + Send>(&self, key: &str, kind: EntryKind) -> Option<T> {
        match self.cache.read_as(key, kind).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                None
            }
        }
    }

    /// Store a new analysis for `account_id`.
    pub async fn save(&self, account_id: &str, input: SaveAnalysis) -> Result<AnalysisRecord> {
        let method = validation::validate_method(&input.method)?;
        validation::validate_endpoint(&input.endpoint)?;

        if !account::account_exists(self.db.pool(), account_id).await? {
            return Err(PipelineError::NotFound {
                entity: "Account",
                id: account_id.to_string(),
            });
        }

        let new = NewAnalysis {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            endpoint: input.endpoint.trim().to_string(),
            method: method.to_string(),
            request_headers: input.request_headers,
            request_query_params: input.request_query_params,
            request_body: input.request_body,
            response_status: input.response_status,
            response_headers: input.response_headers,
            response_body: input.response_body,
            ai_analysis: input.ai_analysis,
            cost: input.cost,
        };
        let record = analysis::insert_analysis(self.db.pool(), &new).await?;

        self.cache_write(&keys::analysis_detail(&record.id), EntryKind::Record, &record)
            .await?;
        let dropped = self.cache.delete_pattern(&keys::listing_prefix(account_id)).await?;

        info!(account_id, analysis_id = %record.id, dropped_pages = dropped, "Analysis saved");
        Ok(record)
    }

    /// One page of the account's analyses, newest first.
    pub async fn list(&self, account_id: &str, query: &ListQuery) -> Result<AnalysisPage> {
        let page = query.page.unwrap_or(1);
        if page < 1 {
            return Err(PipelineError::Validation("page must be at least 1".to_string()));
        }
        if page > MAX_PAGE {
            return Err(PipelineError::Validation(format!("page must be at most {MAX_PAGE}")));
        }
        let method = query
            .method
            .as_deref()
            .map(validation::validate_method)
            .transpose()?;

        let filter = AnalysisFilter {
            search_query: query.search_query.clone().filter(|q| !q.is_empty()),
            method: method.map(str::to_string),
            status: query.status,
        };

        let total_items = analysis::count_analyses(self.db.pool(), account_id, &filter).await?;
        let key = ListingKey::new(account_id, page, PAGE_SIZE)
            .search_query(filter.search_query.as_deref())
            .method(filter.method.as_deref())
            .status(filter.status)
            .total_items(total_items);
        let cache_key = key.to_string();

        if let Some(cached) = self.cache_read::<AnalysisPage>(&cache_key, EntryKind::Listing).await {
            debug!(account_id, key = %cache_key, "Listing cache hit");
            return Ok(cached);
        }

        if !account::account_exists(self.db.pool(), account_id).await? {
            return Err(PipelineError::NotFound {
                entity: "Account",
                id: account_id.to_string(),
            });
        }

        let offset = key.offset();
        let items = analysis::list_analyses(self.db.pool(), account_id, &filter, PAGE_SIZE, offset).await?;
        let result = AnalysisPage {
            offset,
            page,
            limit: PAGE_SIZE,
            total_items,
            total_pages: (total_items + PAGE_SIZE - 1) / PAGE_SIZE,
            items,
        };

        self.cache_write(&cache_key, EntryKind::Listing, &result).await?;
        Ok(result)
    }

    /// One analysis with every field.
    pub async fn get(&self, account_id: &str, analysis_id: &str) -> Result<AnalysisRecord> {
        let key = keys::analysis_detail(analysis_id);

        if let Some(cached) = self.cache_read::<AnalysisRecord>(&key, EntryKind::Record).await {
            if cached.account_id == account_id {
                debug!(account_id, analysis_id, "Record cache hit");
                return Ok(cached);
            }
        }

        let record = analysis::get_analysis(self.db.pool(), account_id, analysis_id).await?;
        self.cache_write(&key, EntryKind::Record, &record).await?;
        Ok(record)
    }

    /// Delete one analysis and every cache entry that could show it.
    pub async fn delete(&self, account_id: &str, analysis_id: &str) -> Result<()> {
        analysis::delete_analysis(self.db.pool(), account_id, analysis_id).await?;

        self.cache.delete_key(&keys::analysis_detail(analysis_id)).await?;
        self.cache.delete_pattern(&keys::listing_prefix(account_id)).await?;

        info!(account_id, analysis_id, "Analysis deleted");
        Ok(())
    }
}
