use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use roster_types::{ApiUser, UserId, UserRecord, UNKNOWN_COMPANY};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("a user with id {0} already exists")]
    DuplicateId(UserId),
}

/// Fields supplied by an add or edit. `None` leaves the field to its default
/// (add) or its current value (edit).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub id: Option<UserId>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// The authoritative user collection.
///
/// Records are kept in display-agnostic "logical" order: local adds go to the
/// front, bulk loads keep their input order. Ids are unique at all times.
#[derive(Debug, Default)]
pub struct UserStore {
    records: Vec<UserRecord>,
    loaded: bool,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole collection. Each record's order marker is its
    /// position in `users`, so earlier entries count as older. Payloads
    /// without an id, or repeating an earlier id, are skipped.
    pub fn load(&mut self, users: Vec<ApiUser>) {
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(users.len());

        for (position, user) in users.into_iter().enumerate() {
            let Some(record) = UserRecord::from_api(user, Some(position as u64)) else {
                warn!("Skipping user at position {} without an id", position);
                continue;
            };
            if !seen.insert(record.id.clone()) {
                warn!("Skipping duplicate user id {} at position {}", record.id, position);
                continue;
            }
            records.push(record);
        }

        debug!("Loaded {} users", records.len());
        self.records = records;
        self.loaded = true;
    }

    /// Like [`UserStore::load`], for a raw response body. Anything other than
    /// a JSON array loads as empty; array items that are not user-shaped are
    /// skipped.
    pub fn load_value(&mut self, value: Value) {
        let users = match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<ApiUser>(item).ok())
                .collect(),
            _ => Vec::new(),
        };
        self.load(users);
    }

    pub fn add(&mut self, patch: UserPatch) -> Result<UserRecord, StoreError> {
        self.add_at(patch, now_millis())
    }

    /// Inserts a new record at the front with an order marker of `now`, or
    /// one past the newest existing marker if the clock has not moved on.
    pub fn add_at(&mut self, patch: UserPatch, now: u64) -> Result<UserRecord, StoreError> {
        let newest = self.records.iter().filter_map(|r| r.created_at).max();
        let marker = match newest {
            Some(newest) => now.max(newest + 1),
            None => now,
        };

        let id = match patch.id {
            Some(id) => {
                if self.contains(&id) {
                    return Err(StoreError::DuplicateId(id));
                }
                id
            }
            None => self.fresh_id(marker),
        };

        let company = non_blank(patch.company.as_deref())
            .unwrap_or(UNKNOWN_COMPANY)
            .to_string();

        let mut record = UserRecord::new(
            id,
            patch.name.unwrap_or_default(),
            patch.email.unwrap_or_default(),
        );
        record.company = company;
        record.created_at = Some(marker);

        self.records.insert(0, record.clone());
        Ok(record)
    }

    /// Merges `patch` over the record with `id`. Returns `None`, leaving the
    /// store untouched, when no record matches. The id and order marker never
    /// change; `patch.id` is ignored.
    pub fn update(&mut self, id: &UserId, patch: UserPatch) -> Option<UserRecord> {
        let record = self.records.iter_mut().find(|r| &r.id == id)?;

        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(email) = patch.email {
            record.email = email;
        }
        record.company = non_blank(patch.company.as_deref())
            .or_else(|| non_blank(Some(record.company.as_str())))
            .unwrap_or(UNKNOWN_COMPANY)
            .to_string();

        Some(record.clone())
    }

    pub fn remove(&mut self, id: &UserId) -> Option<UserRecord> {
        let idx = self.records.iter().position(|r| &r.id == id)?;
        Some(self.records.remove(idx))
    }

    pub fn get(&self, id: &UserId) -> Option<&UserRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.get(id).is_some()
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a bulk load has populated the store since it was created.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn fresh_id(&self, seed: u64) -> UserId {
        let mut candidate = seed;
        loop {
            let id = UserId::from(candidate);
            if !self.contains(&id) {
                return id;
            }
            candidate += 1;
        }
    }
}
