//! Profile snapshots and profile operations.
//!
//! The snapshot under `user:<id>` is what profile reads serve. Every
//! account mutation rewrites it from the row the mutation returned.

use std::sync::Arc;

use cache_store::{keys, CacheStore, CacheStoreExt, EntryKind};
use chrono::{DateTime, SecondsFormat};
use database::models::DEFAULT_AVATAR;
use database::{account, validation, Account, Database};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Cached, caller-visible view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub avatar: String,
    pub plan: String,
    pub role: String,
    pub credits: i64,
    /// RFC 3339, UTC.
    pub credit_refill_date: String,
    pub enable_ai_analysis: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Account> for ProfileSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            fullname: account.fullname.clone(),
            email: account.email.clone(),
            avatar: account.avatar.clone(),
            plan: account.plan.clone(),
            role: account.role.clone(),
            credits: account.credits,
            credit_refill_date: format_millis(account.credit_refill_date),
            enable_ai_analysis: account.enable_ai_analysis,
            created_at: account.created_at.clone(),
            updated_at: account.updated_at.clone(),
        }
    }
}

/// Epoch milliseconds as an RFC 3339 UTC timestamp.
pub fn format_millis(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

/// Who the bearer of a token is, as far as the UI needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user_id: String,
    pub fullname: String,
}

/// Requested profile changes. Omitted parts keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileEdit {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub avatar: Option<String>,
}

/// Write the snapshot for `account`.
///
/// A failed write evicts the key so the next read rebuilds from the
/// database. Only a failed eviction is returned.
pub(crate) async fn write_snapshot(cache: &dyn CacheStore, account: &Account) -> Result<ProfileSnapshot> {
    let snapshot = ProfileSnapshot::from(account);
    let key = keys::profile(&account.id);
    if let Err(e) = cache.write_as(&key, EntryKind::Profile, &snapshot).await {
        warn!(account_id = %account.id, error = %e, "Failed to write profile snapshot, evicting");
        cache.delete_key(&key).await?;
    }
    Ok(snapshot)
}

/// Read the snapshot for `account_id`. Read failures count as a miss.
pub(crate) async fn read_snapshot(cache: &dyn CacheStore, account_id: &str) -> Option<ProfileSnapshot> {
    match cache
        .read_as::<ProfileSnapshot>(&keys::profile(account_id), EntryKind::Profile)
        .await
    {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(account_id, error = %e, "Failed to read profile snapshot");
            None
        }
    }
}

fn capitalize(part: &str) -> String {
    let mut chars = part.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Merge an edit into the current full name.
///
/// The first word is the first name and the rest is the last name. Each
/// part is replaced when given and capitalized either way.
pub fn merge_fullname(current: &str, firstname: Option<&str>, lastname: Option<&str>) -> String {
    let mut words = current.split_whitespace();
    let current_first = words.next().unwrap_or_default();
    let current_last = words.collect::<Vec<_>>().join(" ");

    let first = capitalize(firstname.filter(|s| !s.trim().is_empty()).unwrap_or(current_first));
    let last = capitalize(
        lastname
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(current_last.as_str()),
    );

    format!("{} {}", first, last).trim().to_string()
}

/// Profile reads and edits.
#[derive(Clone)]
pub struct ProfileService {
    db: Database,
    cache: Arc<dyn CacheStore>,
}

impl ProfileService {
    pub fn new(db: Database, cache: Arc<dyn CacheStore>) -> Self {
        Self { db, cache }
    }

    /// Read-through profile lookup.
    pub async fn get_profile(&self, account_id: &str) -> Result<ProfileSnapshot> {
        if let Some(snapshot) = read_snapshot(self.cache.as_ref(), account_id).await {
            debug!(account_id, "Profile cache hit");
            return Ok(snapshot);
        }

        let account = account::get_account(self.db.pool(), account_id).await?;
        write_snapshot(self.cache.as_ref(), &account).await
    }

    /// Change name parts and avatar.
    pub async fn edit_profile(&self, account_id: &str, edit: &ProfileEdit) -> Result<ProfileSnapshot> {
        let current = account::get_account(self.db.pool(), account_id).await?;

        let fullname = merge_fullname(
            &current.fullname,
            edit.firstname.as_deref(),
            edit.lastname.as_deref(),
        );
        validation::validate_fullname(&fullname)?;

        let avatar = edit
            .avatar
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .or(Some(current.avatar.as_str()).filter(|a| !a.is_empty()))
            .unwrap_or(DEFAULT_AVATAR)
            .to_string();
        validation::validate_avatar(&avatar)?;

        let updated = account::update_profile(self.db.pool(), account_id, &fullname, &avatar).await?;
        info!(account_id, "Profile updated");
        write_snapshot(self.cache.as_ref(), &updated).await
    }

    /// Flip the AI analysis switch.
    pub async fn toggle_ai_analysis(&self, account_id: &str) -> Result<ProfileSnapshot> {
        let updated = account::toggle_ai_analysis(self.db.pool(), account_id).await?;
        info!(
            account_id,
            enabled = updated.enable_ai_analysis,
            "AI analysis toggled"
        );
        write_snapshot(self.cache.as_ref(), &updated).await
    }

    /// Identity of the token bearer, via the profile cache.
    pub async fn auth_state(&self, account_id: &str) -> Result<AuthState> {
        let profile = self.get_profile(account_id).await?;
        Ok(AuthState {
            user_id: profile.id,
            fullname: profile.fullname,
        })
    }

    /// Drop the cached session for an existing account.
    pub async fn logout(&self, account_id: &str) -> Result<()> {
        if !account::account_exists(self.db.pool(), account_id).await? {
            return Err(crate::error::PipelineError::NotFound {
                entity: "Account",
                id: account_id.to_string(),
            });
        }

        self.cache.delete_key(&keys::profile(account_id)).await?;
        info!(account_id, "Logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_fullname() {
        assert_eq!(merge_fullname("ada lovelace", None, None), "Ada Lovelace");
        assert_eq!(merge_fullname("Ada Lovelace", Some("grace"), None), "Grace Lovelace");
        assert_eq!(merge_fullname("Ada Lovelace", None, Some("byron")), "Ada Byron");
        assert_eq!(merge_fullname("Ada King Lovelace", Some(""), None), "Ada King Lovelace");
        assert_eq!(merge_fullname("Ada", None, None), "Ada");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_millis(1_700_000_000_123), "2023-11-14T22:13:20.123Z");
    }
}
