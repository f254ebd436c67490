//! Two-phase lazy loader for the generation history view.
//!
//! Phase 1 ([`GenerationHistory::load_metadata`]) fetches only the light
//! columns of the newest rows and publishes them immediately, each marked
//! `loading`. Phase 2 ([`GenerationHistory::load_images`]) fetches the heavy
//! `images` column a few rows at a time, sequentially, filling entries in
//! place.
//!
//! Entries created on this client but not yet persisted carry a temporary
//! id. They survive refetches and are never sent to the backend for
//! deletion. Deletes are optimistic: the entry leaves local state before
//! the network call is made.
//!
//! State sits behind a [`RwLock`] so deletes can interleave with an
//! in-flight phase 2. A batch that resolves after its entry was deleted is
//! discarded.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use menuforge_core::session::SessionContext;
use menuforge_core::types::{RecordId, Timestamp};
use tokio::sync::RwLock;

use crate::error::BackendError;
use crate::models::generation::{GenerationImages, GenerationSummary};

/// Rows fetched in phase 1.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Rows whose images are fetched per phase-2 request.
pub const IMAGE_BATCH_SIZE: usize = 2;

/// Prefix of ids assigned to entries that exist only on this client.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Data source for [`GenerationHistory`].
///
/// Implemented for [`BackendClient`](crate::BackendClient); tests provide
/// in-memory fakes.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    async fn list_summaries(
        &self,
        organization_id: Option<RecordId>,
        limit: usize,
    ) -> Result<Vec<GenerationSummary>, BackendError>;

    async fn fetch_images(&self, ids: &[RecordId]) -> Result<Vec<GenerationImages>, BackendError>;

    async fn delete(&self, id: RecordId) -> Result<(), BackendError>;

    async fn delete_many(&self, ids: &[RecordId]) -> Result<(), BackendError>;
}

/// Identity of a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryId {
    /// Row confirmed by the backend.
    Persisted(RecordId),
    /// Client-side placeholder, always starting with [`TEMP_ID_PREFIX`].
    Temporary(String),
}

impl EntryId {
    /// Mint a fresh temporary id.
    pub fn temporary() -> Self {
        EntryId::Temporary(format!("{TEMP_ID_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    /// Parse an id as it appears in the UI.
    ///
    /// Strings with the temporary prefix, or that are not UUIDs, are
    /// treated as temporary.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with(TEMP_ID_PREFIX) {
            return EntryId::Temporary(raw.to_string());
        }
        match raw.parse::<RecordId>() {
            Ok(id) => EntryId::Persisted(id),
            Err(_) => EntryId::Temporary(raw.to_string()),
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, EntryId::Temporary(_))
    }

    pub fn persisted(&self) -> Option<RecordId> {
        match self {
            EntryId::Persisted(id) => Some(*id),
            EntryId::Temporary(_) => None,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Persisted(id) => write!(f, "{id}"),
            EntryId::Temporary(raw) => f.write_str(raw),
        }
    }
}

/// One row of the history view.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: EntryId,
    pub prompt: String,
    pub ratio: String,
    pub resolution: String,
    pub created_at: Timestamp,
    pub images: Vec<String>,
    /// `true` until the entry's images have been fetched or confirmed empty.
    pub loading: bool,
}

impl From<GenerationSummary> for HistoryEntry {
    fn from(summary: GenerationSummary) -> Self {
        Self {
            id: EntryId::Persisted(summary.id),
            prompt: summary.prompt,
            ratio: summary.ratio,
            resolution: summary.resolution,
            created_at: summary.created_at,
            images: Vec::new(),
            loading: true,
        }
    }
}

/// Outcome of a phase-2 run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageLoadReport {
    /// Batch requests issued.
    pub batches: usize,
    /// Batch requests that failed; their entries were confirmed empty.
    pub failed_batches: usize,
    /// Batch results dropped because the entry was deleted meanwhile.
    pub discarded: usize,
}

/// Client-side generation history with lazy image loading.
pub struct GenerationHistory<S> {
    store: S,
    organization_id: Option<RecordId>,
    page_size: usize,
    batch_size: usize,
    entries: RwLock<Vec<HistoryEntry>>,
}

impl<S: GenerationStore> GenerationHistory<S> {
    /// History scoped to `organization_id` (all visible rows when `None`).
    pub fn new(store: S, organization_id: Option<RecordId>) -> Self {
        Self {
            store,
            organization_id,
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: IMAGE_BATCH_SIZE,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// History scoped to the organization a session is acting for,
    /// including an admin's login-as target.
    pub fn for_session(store: S, session: &SessionContext) -> Self {
        Self::new(store, session.effective_organization_id())
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Snapshot of the current entries, newest first.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.clone()
    }

    /// Whether any entry is still waiting for its images.
    pub async fn is_loading(&self) -> bool {
        self.entries.read().await.iter().any(|e| e.loading)
    }

    /// Run both phases.
    pub async fn refresh(&self) -> Result<ImageLoadReport, BackendError> {
        self.load_metadata().await?;
        Ok(self.load_images().await)
    }

    /// Phase 1: replace server entries with fresh metadata, all marked
    /// loading, keeping local-only entries in front.
    ///
    /// Returns the number of server rows loaded.
    pub async fn load_metadata(&self) -> Result<usize, BackendError> {
        let summaries = self
            .store
            .list_summaries(self.organization_id, self.page_size)
            .await?;
        let count = summaries.len();

        let mut entries = self.entries.write().await;
        let mut merged: Vec<HistoryEntry> = entries
            .drain(..)
            .filter(|e| e.id.is_temporary())
            .collect();
        merged.extend(summaries.into_iter().map(HistoryEntry::from));
        *entries = merged;

        tracing::debug!(rows = count, "Loaded generation metadata");
        Ok(count)
    }

    /// Phase 2: fetch images for every loading entry in sequential batches.
    ///
    /// Never fails as a whole: a failed batch is logged and its entries are
    /// confirmed empty so the view does not spin forever.
    pub async fn load_images(&self) -> ImageLoadReport {
        let pending: Vec<RecordId> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.loading)
            .filter_map(|e| e.id.persisted())
            .collect();

        let mut report = ImageLoadReport::default();

        for batch in pending.chunks(self.batch_size) {
            report.batches += 1;
            let fetched = self.store.fetch_images(batch).await;
            let mut images: HashMap<RecordId, Vec<String>> = match fetched {
                Ok(rows) => rows.into_iter().map(|r| (r.id, r.images)).collect(),
                Err(e) => {
                    report.failed_batches += 1;
                    tracing::warn!(error = %e, batch = ?batch, "Failed to load generation images");
                    HashMap::new()
                }
            };

            let mut entries = self.entries.write().await;
            for id in batch {
                let target = EntryId::Persisted(*id);
                match entries.iter_mut().find(|e| e.id == target) {
                    Some(entry) => {
                        entry.images = images.remove(id).unwrap_or_default();
                        entry.loading = false;
                    }
                    None => {
                        report.discarded += 1;
                        tracing::debug!(%id, "Dropping images for deleted generation");
                    }
                }
            }
        }

        report
    }

    /// Show a freshly generated result before it is persisted.
    pub async fn add_local(
        &self,
        prompt: impl Into<String>,
        ratio: impl Into<String>,
        resolution: impl Into<String>,
        images: Vec<String>,
    ) -> EntryId {
        let id = EntryId::temporary();
        let entry = HistoryEntry {
            id: id.clone(),
            prompt: prompt.into(),
            ratio: ratio.into(),
            resolution: resolution.into(),
            created_at: chrono::Utc::now(),
            images,
            loading: false,
        };
        self.entries.write().await.insert(0, entry);
        id
    }

    /// Swap a temporary id for the id the backend assigned.
    ///
    /// If a server entry with `persisted` is already present (a refetch
    /// beat the confirmation), the local entry is dropped instead.
    /// Returns `false` when no entry had `temp_id`.
    pub async fn confirm_local(&self, temp_id: &EntryId, persisted: RecordId) -> bool {
        let mut entries = self.entries.write().await;
        let Some(pos) = entries.iter().position(|e| &e.id == temp_id) else {
            return false;
        };
        let confirmed = EntryId::Persisted(persisted);
        if entries.iter().any(|e| e.id == confirmed) {
            entries.remove(pos);
        } else {
            entries[pos].id = confirmed;
        }
        true
    }

    /// Remove one entry, deleting it on the backend if it was persisted.
    ///
    /// The entry is removed locally first and stays removed even when the
    /// backend call fails; the error is returned for the caller to report.
    pub async fn delete(&self, id: &EntryId) -> Result<(), BackendError> {
        self.entries.write().await.retain(|e| &e.id != id);

        match id {
            EntryId::Temporary(_) => Ok(()),
            EntryId::Persisted(record) => {
                self.store.delete(*record).await.inspect_err(|e| {
                    tracing::warn!(error = %e, id = %record, "Failed to delete generation");
                })
            }
        }
    }

    /// Remove several entries with at most one backend call.
    ///
    /// Returns how many persisted ids were sent for deletion.
    pub async fn delete_many(&self, ids: &[EntryId]) -> Result<usize, BackendError> {
        self.entries.write().await.retain(|e| !ids.contains(&e.id));

        let persisted: Vec<RecordId> = ids.iter().filter_map(EntryId::persisted).collect();
        if persisted.is_empty() {
            return Ok(0);
        }
        self.store.delete_many(&persisted).await.inspect_err(|e| {
            tracing::warn!(error = %e, count = persisted.len(), "Failed to bulk delete generations");
        })?;
        Ok(persisted.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    /// In-memory store that records every call.
    #[derive(Default)]
    struct FakeStore {
        rows: Vec<(GenerationSummary, Vec<String>)>,
        fail_image_batch: Option<usize>,
        /// When set, each image fetch signals `.0` and waits on `.1`.
        gate: Option<(tokio::sync::Notify, tokio::sync::Notify)>,
        image_calls: Mutex<Vec<Vec<RecordId>>>,
        listed_for: Mutex<Vec<Option<RecordId>>>,
        deleted: Mutex<Vec<Vec<RecordId>>>,
    }

    impl FakeStore {
        fn with_rows(n: usize) -> Self {
            let rows = (0..n)
                .map(|i| {
                    let summary = GenerationSummary {
                        id: Uuid::new_v4(),
                        prompt: format!("dish {i}"),
                        ratio: "1:1".into(),
                        resolution: "1K".into(),
                        created_at: Utc::now(),
                    };
                    (summary, vec![format!("https://cdn.example.com/{i}.png")])
                })
                .collect();
            Self {
                rows,
                ..Default::default()
            }
        }

        fn id(&self, i: usize) -> RecordId {
            self.rows[i].0.id
        }
    }

    #[async_trait]
    impl GenerationStore for Arc<FakeStore> {
        async fn list_summaries(
            &self,
            organization_id: Option<RecordId>,
            limit: usize,
        ) -> Result<Vec<GenerationSummary>, BackendError> {
            self.listed_for.lock().unwrap().push(organization_id);
            Ok(self.rows.iter().take(limit).map(|(s, _)| s.clone()).collect())
        }

        async fn fetch_images(
            &self,
            ids: &[RecordId],
        ) -> Result<Vec<GenerationImages>, BackendError> {
            let call = {
                let mut calls = self.image_calls.lock().unwrap();
                calls.push(ids.to_vec());
                calls.len()
            };
            if let Some((started, release)) = &self.gate {
                started.notify_one();
                release.notified().await;
            }
            if self.fail_image_batch == Some(call) {
                return Err(BackendError::from_response(503, "Service Unavailable"));
            }
            Ok(self
                .rows
                .iter()
                .filter(|(s, _)| ids.contains(&s.id))
                .map(|(s, images)| GenerationImages {
                    id: s.id,
                    images: images.clone(),
                })
                .collect())
        }

        async fn delete(&self, id: RecordId) -> Result<(), BackendError> {
            self.deleted.lock().unwrap().push(vec![id]);
            Ok(())
        }

        async fn delete_many(&self, ids: &[RecordId]) -> Result<(), BackendError> {
            self.deleted.lock().unwrap().push(ids.to_vec());
            Ok(())
        }
    }

    #[tokio::test]
    async fn phase_one_marks_every_row_loading() {
        let store = Arc::new(FakeStore::with_rows(3));
        let history = GenerationHistory::new(Arc::clone(&store), None);

        assert_eq!(history.load_metadata().await.unwrap(), 3);

        let entries = history.entries().await;
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.loading && e.images.is_empty()));
        assert!(store.image_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn phase_two_fills_images_in_batches_of_two() {
        let store = Arc::new(FakeStore::with_rows(5));
        let history = GenerationHistory::new(Arc::clone(&store), None);

        let report = history.refresh().await.unwrap();
        assert_eq!(report.batches, 3);
        assert_eq!(report.failed_batches, 0);

        let calls = store.image_calls.lock().unwrap().clone();
        assert_eq!(calls.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 1]);
        assert_eq!(calls[0], vec![store.id(0), store.id(1)]);

        let entries = history.entries().await;
        assert!(entries.iter().all(|e| !e.loading && e.images.len() == 1));
        assert!(!history.is_loading().await);
    }

    #[tokio::test]
    async fn failed_batch_confirms_entries_empty() {
        let mut fake = FakeStore::with_rows(4);
        fake.fail_image_batch = Some(1);
        let store = Arc::new(fake);
        let history = GenerationHistory::new(Arc::clone(&store), None);

        let report = history.refresh().await.unwrap();
        assert_eq!(report.failed_batches, 1);

        let entries = history.entries().await;
        assert!(entries.iter().all(|e| !e.loading));
        assert!(entries[0].images.is_empty() && entries[1].images.is_empty());
        assert_eq!(entries[2].images.len(), 1);
    }

    #[tokio::test]
    async fn local_entries_survive_refetch() {
        let store = Arc::new(FakeStore::with_rows(2));
        let history = GenerationHistory::new(Arc::clone(&store), None);
        history.refresh().await.unwrap();

        let temp = history
            .add_local("fresh tacos", "4:5", "2K", vec!["data:image/png;base64,AAAA".into()])
            .await;
        history.refresh().await.unwrap();

        let entries = history.entries().await;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id, temp);
        assert!(!entries[0].loading);
    }

    #[tokio::test]
    async fn confirm_local_drops_duplicate_of_server_row() {
        let store = Arc::new(FakeStore::with_rows(1));
        let history = GenerationHistory::new(Arc::clone(&store), None);
        let temp = history.add_local("pho", "1:1", "1K", vec![]).await;

        history.refresh().await.unwrap();
        assert!(history.confirm_local(&temp, store.id(0)).await);

        let entries = history.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, EntryId::Persisted(store.id(0)));
    }

    #[tokio::test]
    async fn deleting_temporary_id_skips_network() {
        let store = Arc::new(FakeStore::with_rows(1));
        let history = GenerationHistory::new(Arc::clone(&store), None);
        let temp = history.add_local("ramen", "1:1", "1K", vec![]).await;

        history.delete(&temp).await.unwrap();

        assert!(history.entries().await.is_empty());
        assert!(store.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_persisted_id_calls_backend() {
        let store = Arc::new(FakeStore::with_rows(2));
        let history = GenerationHistory::new(Arc::clone(&store), None);
        history.refresh().await.unwrap();

        history.delete(&EntryId::Persisted(store.id(1))).await.unwrap();

        assert_eq!(history.entries().await.len(), 1);
        assert_eq!(*store.deleted.lock().unwrap(), vec![vec![store.id(1)]]);
    }

    #[tokio::test]
    async fn bulk_delete_sends_only_persisted_ids_once() {
        let store = Arc::new(FakeStore::with_rows(3));
        let history = GenerationHistory::new(Arc::clone(&store), None);
        history.refresh().await.unwrap();
        let temp = history.add_local("salad", "1:1", "1K", vec![]).await;

        let sent = history
            .delete_many(&[
                temp,
                EntryId::Persisted(store.id(0)),
                EntryId::Persisted(store.id(2)),
            ])
            .await
            .unwrap();

        assert_eq!(sent, 2);
        assert_eq!(
            *store.deleted.lock().unwrap(),
            vec![vec![store.id(0), store.id(2)]]
        );
        let remaining = history.entries().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, EntryId::Persisted(store.id(1)));
    }

    #[tokio::test]
    async fn bulk_delete_of_only_temporary_ids_skips_network() {
        let store = Arc::new(FakeStore::with_rows(0));
        let history = GenerationHistory::new(Arc::clone(&store), None);
        let a = history.add_local("a", "1:1", "1K", vec![]).await;
        let b = history.add_local("b", "1:1", "1K", vec![]).await;

        assert_eq!(history.delete_many(&[a, b]).await.unwrap(), 0);
        assert!(store.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn images_for_deleted_entry_are_discarded() {
        let mut fake = FakeStore::with_rows(2);
        fake.gate = Some(Default::default());
        let store = Arc::new(fake);
        let history = GenerationHistory::new(Arc::clone(&store), None);
        history.load_metadata().await.unwrap();

        let victim = EntryId::Persisted(store.id(0));
        let (started, release) = store.gate.as_ref().unwrap();
        let (report, deleted) = tokio::join!(history.load_images(), async {
            started.notified().await;
            let result = history.delete(&victim).await;
            release.notify_one();
            result
        });

        deleted.unwrap();
        assert_eq!(report.discarded, 1);
        let entries = history.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, EntryId::Persisted(store.id(1)));
        assert!(!entries[0].loading);
    }

    #[tokio::test]
    async fn login_as_scopes_history_to_target_organization() {
        use menuforge_core::session::UserRole;

        let own = Uuid::new_v4();
        let target = Uuid::new_v4();
        let mut session = SessionContext::new(Uuid::new_v4(), UserRole::Admin, Some(own));
        session.login_as(target, "Bistro Nord").unwrap();

        let store = Arc::new(FakeStore::with_rows(1));
        let history = GenerationHistory::for_session(Arc::clone(&store), &session);
        history.load_metadata().await.unwrap();

        assert_eq!(*store.listed_for.lock().unwrap(), vec![Some(target)]);
    }

    #[test]
    fn entry_id_parse_distinguishes_temporary() {
        let id = Uuid::new_v4();
        assert_eq!(EntryId::parse(&id.to_string()), EntryId::Persisted(id));
        assert!(EntryId::parse("temp-123").is_temporary());
        assert!(EntryId::parse("not-a-uuid").is_temporary());
        assert!(EntryId::temporary().to_string().starts_with(TEMP_ID_PREFIX));
    }
}
