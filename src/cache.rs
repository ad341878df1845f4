//! Query cache keyed by path-like segment lists.
//!
//! Entries are stored as JSON snapshots so one cache holds every response
//! type. Invalidation is by prefix: dropping `["sessions", id]` also drops
//! that session's row pages.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::endpoints::sessions::RowFilter;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self(segments.into_iter().map(|s| s.to_string()).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn current_user() -> Self {
        Self::new(["auth", "me"])
    }

    pub fn projects() -> Self {
        Self::new(["projects"])
    }

    pub fn project(project_id: Uuid) -> Self {
        Self::new(["projects".to_string(), project_id.to_string()])
    }

    pub fn questions(project_id: Uuid) -> Self {
        Self::new(["questions".to_string(), project_id.to_string()])
    }

    pub fn examples(project_id: Uuid) -> Self {
        Self::new(["examples".to_string(), project_id.to_string()])
    }

    pub fn sessions() -> Self {
        Self::new(["sessions"])
    }

    pub fn project_sessions(project_id: Uuid) -> Self {
        Self::new(["sessions".to_string(), "project".to_string(), project_id.to_string()])
    }

    pub fn session(session_id: Uuid) -> Self {
        Self::new(["sessions".to_string(), session_id.to_string()])
    }

    /// Prefix of every row page of a session.
    pub fn session_rows(session_id: Uuid) -> Self {
        Self::new(["sessions".to_string(), session_id.to_string(), "rows".to_string()])
    }

    pub fn rows(session_id: Uuid, page: u32, per_page: u32, filter: RowFilter) -> Self {
        let mut key = Self::session_rows(session_id);
        key.0.push(page.to_string());
        key.0.push(per_page.to_string());
        key.0.push(filter.to_string());
        key
    }

    pub fn raters() -> Self {
        Self::new(["raters"])
    }

    pub fn media(project_id: Uuid) -> Self {
        Self::new(["media".to_string(), project_id.to_string()])
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

struct Entry {
    value: Value,
    fetched_at: Instant,
}

pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    stale_time: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_time,
        }
    }

    /// A fresh snapshot for `key`, if there is one.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;

        if entry.fetched_at.elapsed() >= self.stale_time {
            return None;
        }

        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%key, error = %e, "cached snapshot no longer decodes");
                None
            }
        }
    }

    pub fn put<T: Serialize>(&self, key: QueryKey, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "response not cached");
                return;
            }
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, Entry { value, fetched_at: Instant::now() });
    }

    /// Drop every entry whose key starts with `prefix`. Returns how many were dropped.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));

        let dropped = before - entries.len();
        if dropped > 0 {
            debug!(%prefix, dropped, "invalidated cached queries");
        }
        dropped
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
