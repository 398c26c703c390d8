//! Saved analysis operations.
//!
//! Header and query-parameter lists are stored as JSON text. Every lookup is
//! scoped to the owning account.

use sqlx::{FromRow, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{AnalysisFilter, AnalysisRecord, AnalysisSummary, KeyValue, NewAnalysis};

const RECORD_COLUMNS: &str = "id, account_id, endpoint, method, request_headers, \
     request_query_params, request_body, response_status, response_headers, response_body, \
     ai_analysis, cost, created_at, updated_at";

// Shared by count and list. Each optional filter is bound as (value, value)
// so an unset filter short-circuits on `? IS NULL`.
const FILTER_CLAUSE: &str = r#"
        account_id = ?
        AND (? IS NULL OR lower(endpoint) LIKE ? ESCAPE '\' OR lower(COALESCE(ai_analysis, '')) LIKE ? ESCAPE '\')
        AND (? IS NULL OR method = ?)
        AND (? IS NULL OR response_status = ?)
"#;

#[derive(FromRow)]
struct AnalysisRow {
    id: String,
    account_id: String,
    endpoint: String,
    method: String,
    request_headers: String,
    request_query_params: String,
    request_body: Option<String>,
    response_status: i64,
    response_headers: String,
    response_body: Option<String>,
    ai_analysis: Option<String>,
    cost: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<AnalysisRow> for AnalysisRecord {
    type Error = DatabaseError;

    fn try_from(row: AnalysisRow) -> Result<Self> {
        Ok(AnalysisRecord {
            request_headers: decode_pairs("request_headers", &row.request_headers)?,
            request_query_params: decode_pairs("request_query_params", &row.request_query_params)?,
            response_headers: decode_pairs("response_headers", &row.response_headers)?,
            id: row.id,
            account_id: row.account_id,
            endpoint: row.endpoint,
            method: row.method,
            request_body: row.request_body,
            response_status: row.response_status,
            response_body: row.response_body,
            ai_analysis: row.ai_analysis,
            cost: row.cost,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode_pairs(column: &'static str, raw: &str) -> Result<Vec<KeyValue>> {
    serde_json::from_str(raw).map_err(|source| DatabaseError::Column { column, source })
}

fn encode_pairs(column: &'static str, pairs: &[KeyValue]) -> Result<String> {
    serde_json::to_string(pairs).map_err(|source| DatabaseError::Column { column, source })
}

fn not_found(id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        entity: "Analysis",
        id: id.to_string(),
    }
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

struct BoundFilter {
    search: Option<String>,
    method: Option<String>,
    status: Option<i64>,
}

impl BoundFilter {
    fn new(filter: &AnalysisFilter) -> Self {
        Self {
            search: filter
                .search_query
                .as_deref()
                .filter(|q| !q.is_empty())
                .map(like_pattern),
            method: filter.method.clone(),
            status: filter.status,
        }
    }
}

/// Insert a new analysis and return it as stored.
pub async fn insert_analysis(pool: &SqlitePool, analysis: &NewAnalysis) -> Result<AnalysisRecord> {
    let request_headers = encode_pairs("request_headers", &analysis.request_headers)?;
    let request_query_params = encode_pairs("request_query_params", &analysis.request_query_params)?;
    let response_headers = encode_pairs("response_headers", &analysis.response_headers)?;

    let sql = format!(
        r#"
        INSERT INTO analyses (
            id, account_id, endpoint, method, request_headers, request_query_params,
            request_body, response_status, response_headers, response_body, ai_analysis, cost
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {RECORD_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, AnalysisRow>(&sql)
        .bind(&analysis.id)
        .bind(&analysis.account_id)
        .bind(&analysis.endpoint)
        .bind(&analysis.method)
        .bind(request_headers)
        .bind(request_query_params)
        .bind(&analysis.request_body)
        .bind(analysis.response_status)
        .bind(response_headers)
        .bind(&analysis.response_body)
        .bind(&analysis.ai_analysis)
        .bind(analysis.cost)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DatabaseError::AlreadyExists {
                        entity: "Analysis",
                        id: analysis.id.clone(),
                    };
                }
                if db_err.is_foreign_key_violation() {
                    return DatabaseError::NotFound {
                        entity: "Account",
                        id: analysis.account_id.clone(),
                    };
                }
            }
            DatabaseError::Sqlx(e)
        })?;

    row.try_into()
}

/// Get one analysis owned by `account_id`.
pub async fn get_analysis(pool: &SqlitePool, account_id: &str, id: &str) -> Result<AnalysisRecord> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM analyses WHERE id = ? AND account_id = ?");

    sqlx::query_as::<_, AnalysisRow>(&sql)
        .bind(id)
        .bind(account_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))?
        .try_into()
}

/// Delete one analysis owned by `account_id`.
pub async fn delete_analysis(pool: &SqlitePool, account_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM analyses
        WHERE id = ? AND account_id = ?
        "#,
    )
    .bind(id)
    .bind(account_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }

    Ok(())
}

/// Count the account's analyses matching `filter`.
pub async fn count_analyses(
    pool: &SqlitePool,
    account_id: &str,
    filter: &AnalysisFilter,
) -> Result<i64> {
    let f = BoundFilter::new(filter);
    let sql = format!("SELECT COUNT(*) FROM analyses WHERE {FILTER_CLAUSE}");

    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(account_id)
        .bind(&f.search)
        .bind(&f.search)
        .bind(&f.search)
        .bind(&f.method)
        .bind(&f.method)
        .bind(f.status)
        .bind(f.status)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// List a page of the account's analyses, newest first.
pub async fn list_analyses(
    pool: &SqlitePool,
    account_id: &str,
    filter: &AnalysisFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<AnalysisSummary>> {
    let f = BoundFilter::new(filter);
    let sql = format!(
        r#"
        SELECT id, endpoint, method, response_status, ai_analysis, cost, created_at, updated_at
        FROM analyses
        WHERE {FILTER_CLAUSE}
        ORDER BY created_at DESC, rowid DESC
        LIMIT ? OFFSET ?
        "#
    );

    let items = sqlx::query_as::<_, AnalysisSummary>(&sql)
        .bind(account_id)
        .bind(&f.search)
        .bind(&f.search)
        .bind(&f.search)
        .bind(&f.method)
        .bind(&f.method)
        .bind(f.status)
        .bind(f.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(items)
}
