//! In-process document store.
//!
//! Notifications are pushed synchronously inside each write, so by the time
//! a write returns every subscriber already has the change queued. This is
//! the store the CLI demo and the test suite run against.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace, warn};

use super::{
    AppendSubscription, Direction, Document, DocumentStore, DocumentSubscription, Query,
    StoredDocument, Subscription, SubscriptionHandle, compare, is_server_timestamp,
};
use crate::{Clock, StoreError, SystemClock};

#[derive(Debug)]
struct DocumentWatcher {
    collection: String,
    id: String,
    sender: mpsc::UnboundedSender<Option<Document>>,
}

#[derive(Debug)]
struct AppendWatcher {
    collection: String,
    sender: mpsc::UnboundedSender<StoredDocument>,
}

#[derive(Debug)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Document>>,
    document_watchers: HashMap<u64, DocumentWatcher>,
    append_watchers: HashMap<u64, AppendWatcher>,
    next_handle: u64,
    next_append_id: u64,
    available: bool,
}

impl Inner {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.available {
            Ok(())
        } else {
            Err(StoreError::unavailable("memory store is offline"))
        }
    }

    fn notify_document(&mut self, collection: &str, id: &str, state: Option<&Document>) {
        self.document_watchers.retain(|handle, watcher| {
            if watcher.collection != collection || watcher.id != id {
                return true;
            }
            let delivered = watcher.sender.send(state.cloned()).is_ok();
            if !delivered {
                trace!(handle, "Dropping watcher with closed receiver");
            }
            delivered
        });
    }

    fn notify_append(&mut self, collection: &str, stored: &StoredDocument) {
        self.append_watchers.retain(|_, watcher| {
            watcher.collection != collection || watcher.sender.send(stored.clone()).is_ok()
        });
    }

    fn allocate_handle(&mut self) -> SubscriptionHandle {
        self.next_handle += 1;
        SubscriptionHandle(self.next_handle)
    }
}

/// Thread-safe in-memory [`DocumentStore`]. Clones share state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Creates an empty store stamping writes with wall-clock time.
    #[instrument]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store stamping writes with `clock`.
    #[instrument]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        debug!("Creating memory store");
        Self {
            inner: Arc::new(Mutex::new(Inner {
                collections: HashMap::new(),
                document_watchers: HashMap::new(),
                append_watchers: HashMap::new(),
                next_handle: 0,
                next_append_id: 0,
                available: true,
            })),
            clock,
        }
    }

    /// Simulates an outage: while offline every call fails as unavailable.
    #[instrument(skip(self))]
    pub fn set_available(&self, available: bool) {
        warn!(available, "Memory store availability changed");
        self.lock().available = available;
    }

    /// Number of live subscriptions of either kind.
    pub fn subscription_count(&self) -> usize {
        let inner = self.lock();
        inner.document_watchers.len() + inner.append_watchers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces server-timestamp sentinels with the clock's current time.
    fn resolve_timestamps(&self, mut document: Document) -> Document {
        let now = self.clock.now().timestamp_millis();
        for value in document.values_mut() {
            if is_server_timestamp(value) {
                *value = Value::from(now);
            }
        }
        document
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    #[instrument(skip(self, document))]
    async fn create(&self, collection: &str, id: &str, document: Document) -> Result<(), StoreError> {
        let document = self.resolve_timestamps(document);
        let mut inner = self.lock();
        inner.check_available()?;

        let previous = inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document.clone());
        if previous.is_some() {
            warn!(collection, id, "Create overwrote an existing document");
        }

        inner.notify_document(collection, id, Some(&document));
        if previous.is_none() {
            let stored = StoredDocument {
                id: id.to_string(),
                fields: document,
            };
            inner.notify_append(collection, &stored);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.lock();
        inner.check_available()?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        let fields = self.resolve_timestamps(fields);
        let mut inner = self.lock();
        inner.check_available()?;

        let document = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(format!("{}/{}", collection, id)))?;
        document.extend(fields);
        let document = document.clone();

        inner.notify_document(collection, id, Some(&document));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_available()?;

        let removed = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        if removed.is_some() {
            inner.notify_document(collection, id, None);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn query(&self, collection: &str, query: Query) -> Result<Vec<StoredDocument>, StoreError> {
        let inner = self.lock();
        inner.check_available()?;

        let mut results: Vec<StoredDocument> = inner
            .collections
            .get(collection)
            .into_iter()
            .flat_map(|docs| docs.iter())
            .filter(|(_, doc)| query.matches(doc))
            .map(|(id, doc)| StoredDocument {
                id: id.clone(),
                fields: doc.clone(),
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            results.sort_by(|a, b| {
                let ordering = match (a.fields.get(field), b.fields.get(field)) {
                    (Some(x), Some(y)) => compare(x, y).unwrap_or(std::cmp::Ordering::Equal),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                };
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        debug!(count = results.len(), "Query complete");
        Ok(results)
    }

    #[instrument(skip(self, document))]
    async fn append(&self, collection: &str, document: Document) -> Result<String, StoreError> {
        let document = self.resolve_timestamps(document);
        let mut inner = self.lock();
        inner.check_available()?;

        inner.next_append_id += 1;
        let id = format!("{:012}", inner.next_append_id);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), document.clone());

        let stored = StoredDocument {
            id: id.clone(),
            fields: document,
        };
        inner.notify_append(collection, &stored);
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn subscribe(&self, collection: &str, id: &str) -> Result<DocumentSubscription, StoreError> {
        let mut inner = self.lock();
        inner.check_available()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let current = inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned();
        // Receiver is alive, so the initial snapshot cannot fail to queue.
        let _ = sender.send(current);

        let handle = inner.allocate_handle();
        inner.document_watchers.insert(
            handle.0,
            DocumentWatcher {
                collection: collection.to_string(),
                id: id.to_string(),
                sender,
            },
        );
        debug!(handle = handle.0, "Document subscription opened");
        Ok(Subscription::new(handle, receiver))
    }

    #[instrument(skip(self))]
    async fn append_subscribe(
        &self,
        collection: &str,
        order_by: &str,
        history_limit: Option<usize>,
    ) -> Result<AppendSubscription, StoreError> {
        let mut inner = self.lock();
        inner.check_available()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let mut existing: Vec<StoredDocument> = inner
            .collections
            .get(collection)
            .into_iter()
            .flat_map(|docs| docs.iter())
            .map(|(id, doc)| StoredDocument {
                id: id.clone(),
                fields: doc.clone(),
            })
            .collect();
        existing.sort_by(|a, b| match (a.fields.get(order_by), b.fields.get(order_by)) {
            (Some(x), Some(y)) => compare(x, y).unwrap_or(std::cmp::Ordering::Equal),
            _ => std::cmp::Ordering::Equal,
        });
        if let Some(limit) = history_limit {
            existing.truncate(limit);
        }
        for stored in existing {
            let _ = sender.send(stored);
        }

        let handle = inner.allocate_handle();
        inner.append_watchers.insert(
            handle.0,
            AppendWatcher {
                collection: collection.to_string(),
                sender,
            },
        );
        debug!(handle = handle.0, "Append subscription opened");
        Ok(Subscription::new(handle, receiver))
    }

    #[instrument(skip(self))]
    fn cancel(&self, handle: SubscriptionHandle) {
        let mut inner = self.lock();
        let removed = inner.document_watchers.remove(&handle.0).is_some()
            || inner.append_watchers.remove(&handle.0).is_some();
        debug!(handle = handle.0, removed, "Subscription cancelled");
    }
}
