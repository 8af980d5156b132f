use std::sync::Arc;

use roster_client::{LoadError, UserSource};
use roster_config::Config;
use roster_store::{project, FormErrors, LoadTracker, StoreError, UserForm, UserStore};
use roster_types::{DetailSource, SortKey, UserId, UserRecord};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Outcome of a load whose result may arrive after the view lost interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Applied(T),
    Discarded,
}

#[derive(Debug)]
pub enum AddOutcome {
    Added(UserRecord),
    Invalid(FormErrors),
    Rejected(StoreError),
}

#[derive(Debug)]
pub enum EditOutcome {
    Updated(UserRecord),
    Invalid(FormErrors),
    NotFound,
}

/// Field overrides for the edit form; `None` keeps the prefilled value.
#[derive(Debug, Clone, Default)]
pub struct EditFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
}

/// Everything the daemon keeps for its lifetime: the user store, the source
/// it is filled from, and one load tracker per view.
pub struct Session {
    store: RwLock<UserStore>,
    source: Arc<dyn UserSource>,
    config: Config,
    initial_load: Mutex<()>,
    collection_loads: LoadTracker,
    detail_loads: LoadTracker,
}

impl Session {
    pub fn new(config: Config, source: Arc<dyn UserSource>) -> Self {
        Self {
            store: RwLock::new(UserStore::new()),
            source,
            config,
            initial_load: Mutex::new(()),
            collection_loads: LoadTracker::new(),
            detail_loads: LoadTracker::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api_base_url(&self) -> &str {
        self.source.base_url()
    }

    /// Runs the collection view's first load unless the store already holds
    /// one. Concurrent first requests share a single fetch. A superseded
    /// load is retried once if whatever superseded it left the store empty.
    pub async fn ensure_loaded(&self) -> Result<(), LoadError> {
        if self.store.read().await.is_loaded() {
            return Ok(());
        }

        let _guard = self.initial_load.lock().await;
        for attempt in 0..2 {
            if self.store.read().await.is_loaded() {
                return Ok(());
            }
            match self.load_collection().await? {
                Fetched::Applied(count) => {
                    info!("Initial load: {} users", count);
                    return Ok(());
                }
                Fetched::Discarded => debug!("Initial load superseded (attempt {})", attempt + 1),
            }
        }

        if self.store.read().await.is_loaded() {
            Ok(())
        } else {
            Err(LoadError::Superseded)
        }
    }

    /// Fetches the full list and replaces the store with it, unless a newer
    /// load started or the view was torn down in the meantime.
    pub async fn load_collection(&self) -> Result<Fetched<usize>, LoadError> {
        let ticket = self.collection_loads.begin();
        let body = self.source.fetch_all().await?;

        let mut store = self.store.write().await;
        if !self.collection_loads.is_current(ticket) {
            warn!(
                "Discarding stale user list (generation {}, now {})",
                ticket.generation(),
                self.collection_loads.generation()
            );
            return Ok(Fetched::Discarded);
        }
        store.load_value(body);
        Ok(Fetched::Applied(store.len()))
    }

    /// Looks `id` up in the store, falling back to the remote API. `None`
    /// means neither knows the id.
    pub async fn find_user(
        &self,
        id: &UserId,
    ) -> Result<Fetched<Option<(UserRecord, DetailSource)>>, LoadError> {
        if let Some(user) = self.store.read().await.get(id) {
            return Ok(Fetched::Applied(Some((user.clone(), DetailSource::Store))));
        }

        let ticket = self.detail_loads.join();
        let fetched = match self.source.fetch_one(id).await {
            Ok(user) => UserRecord::from_api(user, None),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        if !self.detail_loads.is_current(ticket) {
            warn!("Discarding stale detail for user {}", id);
            return Ok(Fetched::Discarded);
        }
        Ok(Fetched::Applied(fetched.map(|u| (u, DetailSource::Remote))))
    }

    /// Returns the visible users for `query`/`sort` and the store size.
    pub async fn list_users(&self, query: &str, sort: SortKey) -> (Vec<UserRecord>, usize) {
        let store = self.store.read().await;
        let visible = project(store.records(), query, sort)
            .into_iter()
            .cloned()
            .collect();
        (visible, store.len())
    }

    pub async fn add_user(&self, form: UserForm) -> AddOutcome {
        let valid = match form.validate() {
            Ok(valid) => valid,
            Err(errors) => return AddOutcome::Invalid(errors),
        };

        let mut store = self.store.write().await;
        match store.add(valid.into_patch()) {
            Ok(user) => {
                info!("Added user {}", user.id);
                AddOutcome::Added(user)
            }
            Err(e) => AddOutcome::Rejected(e),
        }
    }

    /// Prefills the edit form from the stored record, applies `fields` over
    /// it, validates, then updates.
    pub async fn edit_user(&self, id: &UserId, fields: EditFields) -> EditOutcome {
        let mut store = self.store.write().await;
        let Some(current) = store.get(id) else {
            return EditOutcome::NotFound;
        };

        let mut form = UserForm::from_record(current);
        if let Some(name) = fields.name {
            form.name = name;
        }
        if let Some(email) = fields.email {
            form.email = email;
        }
        if let Some(company) = fields.company {
            form.company = company;
        }

        let valid = match form.validate() {
            Ok(valid) => valid,
            Err(errors) => return EditOutcome::Invalid(errors),
        };

        match store.update(id, valid.into_patch()) {
            Some(user) => {
                info!("Updated user {}", user.id);
                EditOutcome::Updated(user)
            }
            None => EditOutcome::NotFound,
        }
    }

    pub async fn delete_user(&self, id: &UserId) -> Option<UserRecord> {
        let removed = self.store.write().await.remove(id);
        if removed.is_some() {
            info!("Deleted user {}", id);
        }
        removed
    }

    /// Whether the store has been loaded, and its size.
    pub async fn store_state(&self) -> (bool, usize) {
        let store = self.store.read().await;
        (store.is_loaded(), store.len())
    }

    /// Tears down both views; loads still in flight will be discarded.
    pub fn close_views(&self) {
        self.collection_loads.cancel();
        self.detail_loads.cancel();
    }
}
