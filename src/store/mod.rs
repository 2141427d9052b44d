//! Data source adapter.
//!
//! [`DataStore`] owns the four collections and routes every read and write
//! to either the static dataset (mock) or the remote backend (live). A live
//! load that fails falls back to mock once, and the fallback is remembered
//! as the preferred source.
//!
//! Mock-mode writes only touch memory. Live-mode writes go to the backend
//! first and are merged locally from the returned record; a failed write is
//! logged and leaves the collection untouched.

mod collections;

pub use collections::Collections;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::backend::{decode_row, encode_row, RemoteStore};
use crate::dependency::{GateDecision, PendingSave, TaskGate, TaskSave};
use crate::error::{CrmError, Result};
use crate::model::{
    avatar_url, clamp_probability, App, Contact, Deal, NewApp, NewContact, NewDeal, NewTask, Task,
};
use crate::prefs::{PreferenceStore, DATA_SOURCE_KEY};
use collections::{mock_id, Collected};

/// Where collections are read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Mock,
    Live,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Mock => "mock",
            DataSource::Live => "live",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(DataSource::Mock),
            "live" => Ok(DataSource::Live),
            _ => Err(CrmError::validation("source", format!("unknown data source '{s}' (mock, live)"))),
        }
    }
}

/// What a load asked for and what it ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub requested: DataSource,
    pub effective: DataSource,
    pub fell_back: bool,
}

/// Result of a gated task save.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(Task),
    /// Held back; persist with [`DataStore::confirm_task_save`].
    NeedsConfirmation(PendingSave),
}

/// Owner of the four collections and the current data source.
pub struct DataStore {
    remote: Option<Arc<dyn RemoteStore>>,
    prefs: Arc<dyn PreferenceStore>,
    mode: DataSource,
    data: Collections,
    loading: bool,
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("mode", &self.mode)
            .field("has_remote", &self.remote.is_some())
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}

impl DataStore {
    /// Create a store with the preferred source. Collections stay empty
    /// until [`DataStore::load`].
    pub fn new(remote: Option<Arc<dyn RemoteStore>>, prefs: Arc<dyn PreferenceStore>) -> Self {
        let mode = prefs
            .get(DATA_SOURCE_KEY)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        debug!("Preferred data source: {}", mode);

        Self {
            remote,
            prefs,
            mode,
            data: Collections::default(),
            loading: false,
        }
    }

    pub fn mode(&self) -> DataSource {
        self.mode
    }

    /// True only while [`DataStore::load`] runs. `load` holds `&mut self`,
    /// so callers outside it always see `false`.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn prefs(&self) -> &dyn PreferenceStore {
        self.prefs.as_ref()
    }

    pub fn collections(&self) -> &Collections {
        &self.data
    }

    pub fn apps(&self) -> &[App] {
        &self.data.apps
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.data.contacts
    }

    pub fn deals(&self) -> &[Deal] {
        &self.data.deals
    }

    pub fn tasks(&self) -> &[Task] {
        &self.data.tasks
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace every collection from the current source.
    pub async fn load(&mut self) -> LoadReport {
        self.loading = true;
        let requested = self.mode;

        let report = match (requested, self.remote.clone()) {
            (DataSource::Mock, _) => {
                self.data = Collections::mock();
                LoadReport {
                    requested,
                    effective: DataSource::Mock,
                    fell_back: false,
                }
            }
            (DataSource::Live, None) => {
                warn!("Live data requested but no backend is configured; using mock data");
                self.mode = DataSource::Mock;
                self.data = Collections::mock();
                LoadReport {
                    requested,
                    effective: DataSource::Mock,
                    fell_back: true,
                }
            }
            (DataSource::Live, Some(remote)) => match Collections::fetch(remote.as_ref()).await {
                Ok(data) => {
                    self.data = data;
                    LoadReport {
                        requested,
                        effective: DataSource::Live,
                        fell_back: false,
                    }
                }
                Err(e) => {
                    warn!("Failed to load live data: {}. Falling back to mock data.", e);
                    self.mode = DataSource::Mock;
                    if let Err(pe) = self.prefs.set(DATA_SOURCE_KEY, DataSource::Mock.as_str()) {
                        warn!("Could not remember mock fallback: {}", pe);
                    }
                    self.data = Collections::mock();
                    LoadReport {
                        requested,
                        effective: DataSource::Mock,
                        fell_back: true,
                    }
                }
            },
        };

        self.loading = false;
        info!(
            "Loaded {} apps, {} contacts, {} deals, {} tasks from {} data",
            self.data.apps.len(),
            self.data.contacts.len(),
            self.data.deals.len(),
            self.data.tasks.len(),
            report.effective
        );
        report
    }

    /// Remember `mode` as the preferred source and reload from it.
    pub async fn set_mode(&mut self, mode: DataSource) -> Result<LoadReport> {
        self.prefs.set(DATA_SOURCE_KEY, mode.as_str())?;
        info!("Switching data source to {}", mode);
        self.mode = mode;
        Ok(self.load().await)
    }

    // =========================================================================
    // Generic record operations
    // =========================================================================

    fn live_remote(&self) -> Option<Arc<dyn RemoteStore>> {
        match self.mode {
            DataSource::Live => self.remote.clone(),
            DataSource::Mock => None,
        }
    }

    fn position<T: Collected>(&self, id: &str) -> Option<usize> {
        T::items(&self.data).iter().position(|r| r.id() == id)
    }

    /// Insert at the front. Mock mode builds the record from a fresh id;
    /// live mode sends `draft` and keeps what the backend returns.
    async fn insert_record<T: Collected, D: Serialize>(
        &mut self,
        draft: &D,
        build_mock: impl FnOnce(String) -> T,
    ) -> Result<T> {
        let record = match self.live_remote() {
            None => {
                let id = mock_id(T::items(&self.data), Utc::now().timestamp_millis());
                build_mock(id)
            }
            Some(remote) => {
                let result = async {
                    let row = encode_row(T::TABLE, draft)?;
                    let stored = remote.insert(T::TABLE, row).await?;
                    decode_row::<T>(T::TABLE, stored)
                }
                .await;
                result.inspect_err(|e| error!("Failed to add {}: {}", T::ENTITY, e))?
            }
        };

        debug!("Added {} {}", T::ENTITY, record.id());
        T::items_mut(&mut self.data).insert(0, record.clone());
        Ok(record)
    }

    async fn replace_record<T: Collected>(&mut self, record: T) -> Result<T> {
        let record = match self.live_remote() {
            None => {
                if self.position::<T>(record.id()).is_none() {
                    return Err(CrmError::not_found(T::ENTITY, record.id()));
                }
                record
            }
            Some(remote) => {
                let result = async {
                    let row = encode_row(T::TABLE, &record)?;
                    let stored = remote.update(T::TABLE, record.id(), row).await?;
                    decode_row::<T>(T::TABLE, stored)
                }
                .await;
                result.inspect_err(|e| error!("Failed to update {} {}: {}", T::ENTITY, record.id(), e))?
            }
        };

        if let Some(index) = self.position::<T>(record.id()) {
            T::items_mut(&mut self.data)[index] = record.clone();
        }
        debug!("Updated {} {}", T::ENTITY, record.id());
        Ok(record)
    }

    async fn remove_record<T: Collected>(&mut self, id: &str) -> Result<()> {
        if let Some(remote) = self.live_remote() {
            remote
                .delete(T::TABLE, id)
                .await
                .inspect_err(|e| error!("Failed to delete {} {}: {}", T::ENTITY, id, e))?;
        }
        T::items_mut(&mut self.data).retain(|r| r.id() != id);
        debug!("Deleted {} {}", T::ENTITY, id);
        Ok(())
    }

    // =========================================================================
    // Apps
    // =========================================================================

    pub async fn add_app(&mut self, draft: NewApp) -> Result<App> {
        draft.validate()?;
        let created_at = Utc::now();
        let mock = draft.clone();
        self.insert_record(&draft, move |id| mock.into_app(id, created_at))
            .await
    }

    pub async fn edit_app(&mut self, app: App) -> Result<App> {
        app.validate()?;
        self.replace_record(app).await
    }

    pub async fn delete_app(&mut self, id: &str) -> Result<()> {
        self.remove_record::<App>(id).await
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    /// Add a contact. The avatar reference is generated here in both modes.
    pub async fn add_contact(&mut self, draft: NewContact) -> Result<Contact> {
        draft.validate()?;
        let now = Utc::now();
        let avatar = avatar_url(now.timestamp_millis());

        let payload = serde_json::json!({
            "name": draft.name,
            "email": draft.email,
            "avatarUrl": avatar,
            "company": draft.company,
            "app_ids": draft.app_ids,
        });

        self.insert_record(&payload, move |id| Contact {
            id,
            name: draft.name,
            email: draft.email,
            avatar_url: avatar,
            company: draft.company,
            app_ids: draft.app_ids,
            created_at: now,
        })
        .await
    }

    pub async fn edit_contact(&mut self, contact: Contact) -> Result<Contact> {
        contact.validate()?;
        self.replace_record(contact).await
    }

    pub async fn delete_contact(&mut self, id: &str) -> Result<()> {
        self.remove_record::<Contact>(id).await
    }

    // =========================================================================
    // Deals
    // =========================================================================

    /// Add a deal; the probability is clamped to `0..=100` before it is sent.
    pub async fn add_deal(&mut self, mut draft: NewDeal) -> Result<Deal> {
        draft.validate()?;
        draft.probability = clamp_probability(i64::from(draft.probability));
        let mock = draft.clone();
        self.insert_record(&draft, move |id| mock.into_deal(id)).await
    }

    pub async fn edit_deal(&mut self, mut deal: Deal) -> Result<Deal> {
        deal.validate()?;
        deal.probability = clamp_probability(i64::from(deal.probability));
        self.replace_record(deal).await
    }

    pub async fn delete_deal(&mut self, id: &str) -> Result<()> {
        self.remove_record::<Deal>(id).await
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Add a task without consulting the dependency gate.
    pub async fn add_task(&mut self, draft: NewTask) -> Result<Task> {
        draft.validate()?;
        let mock = draft.clone();
        self.insert_record(&draft, move |id| mock.into_task(id)).await
    }

    /// Replace a task without consulting the dependency gate.
    pub async fn edit_task(&mut self, task: Task) -> Result<Task> {
        task.validate()?;
        self.replace_record(task).await
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<()> {
        self.remove_record::<Task>(id).await
    }

    /// Save a task through the dependency gate. A save that would complete
    /// a task with open prerequisites is returned unsaved.
    pub async fn save_task(&mut self, save: TaskSave) -> Result<SaveOutcome> {
        match &save {
            TaskSave::Create(draft) => draft.validate()?,
            TaskSave::Update(task) => task.validate()?,
        }

        match TaskGate::evaluate(save, &self.data.tasks) {
            GateDecision::Proceed(save) => self.persist_task(save).await.map(SaveOutcome::Saved),
            GateDecision::Confirm(pending) => {
                info!(
                    "Task '{}' has {} incomplete prerequisite(s); confirmation required",
                    pending.save.title(),
                    pending.incomplete.len()
                );
                Ok(SaveOutcome::NeedsConfirmation(pending))
            }
        }
    }

    /// Persist a held-back save, overriding the gate.
    pub async fn confirm_task_save(&mut self, pending: PendingSave) -> Result<Task> {
        warn!(
            "Saving '{}' despite {} incomplete prerequisite(s)",
            pending.save.title(),
            pending.incomplete.len()
        );
        self.persist_task(pending.save).await
    }

    async fn persist_task(&mut self, save: TaskSave) -> Result<Task> {
        match save {
            TaskSave::Create(draft) => self.add_task(draft).await,
            TaskSave::Update(task) => self.edit_task(task).await,
        }
    }
}
