//! Document store abstraction.
//!
//! Sessions only ever talk to the shared room through [`DocumentStore`]. The
//! contract mirrors a hosted document database: last-write-wins per
//! document, top-level field merges on update, and push notification of
//! changes in write order for each watched document or collection.

mod memory;

pub use memory::MemoryStore;

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;

use crate::StoreError;

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// Key of the sentinel object replaced by the store's clock on write.
pub const SERVER_TIMESTAMP_KEY: &str = "$serverTimestamp";

/// Field value asking the store to write its own current time
/// (epoch milliseconds).
pub fn server_timestamp() -> Value {
    json!({ SERVER_TIMESTAMP_KEY: true })
}

/// True if `value` is the [`server_timestamp`] sentinel.
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.len() == 1 && map.get(SERVER_TIMESTAMP_KEY) == Some(&Value::Bool(true)))
}

/// Unwraps a `json!({...})` literal into a [`Document`].
///
/// Non-object values yield an empty document.
pub fn fields(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// A document together with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Document key within its collection.
    pub id: String,
    /// Document contents.
    pub fields: Document,
}

/// Comparison used by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Field equals the value.
    Eq,
    /// Field is strictly less than the value.
    Lt,
    /// Field is strictly greater than the value.
    Gt,
    /// Field equals one element of the value array.
    In,
}

/// Predicate on a single top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field name.
    pub field: String,
    /// Comparison.
    pub op: FilterOp,
    /// Right-hand side.
    pub value: Value,
}

impl Filter {
    /// True when `document` satisfies the predicate. Missing fields never
    /// match.
    pub fn matches(&self, document: &Document) -> bool {
        let Some(actual) = document.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            FilterOp::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            FilterOp::In => self
                .value
                .as_array()
                .is_some_and(|options| options.contains(actual)),
        }
    }
}

/// Orders numbers with numbers and strings with strings; anything else is
/// incomparable.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Collection query: all filters must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Conjunction of predicates.
    pub filters: Vec<Filter>,
    /// Optional sort field and direction.
    pub order_by: Option<(String, Direction)>,
    /// Optional cap on the number of results.
    pub limit: Option<usize>,
}

impl Query {
    /// Matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate.
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Sorts results by `field`.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Returns at most `limit` results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when `document` satisfies every filter.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(document))
    }
}

/// Identifies a live subscription so it can be cancelled.
///
/// Holding a handle keeps nothing alive; it is only a ticket for
/// [`DocumentStore::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// Stream of pushed changes plus the handle that stops them.
#[derive(Debug)]
pub struct Subscription<T> {
    handle: SubscriptionHandle,
    receiver: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Wraps a receiver fed by the store.
    pub fn new(handle: SubscriptionHandle, receiver: mpsc::UnboundedReceiver<T>) -> Self {
        Self { handle, receiver }
    }

    /// Cancellation ticket.
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle
    }

    /// Waits for the next change. `None` once the subscription is cancelled.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Takes an already-delivered change without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

/// Document subscriptions yield `None` when the document is deleted.
pub type DocumentSubscription = Subscription<Option<Document>>;

/// Collection subscriptions yield each appended document.
pub type AppendSubscription = Subscription<StoredDocument>;

/// Shared document store used by the room lifecycle and online sessions.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Writes `document` at `id`, replacing any existing document.
    async fn create(&self, collection: &str, id: &str, document: Document) -> Result<(), StoreError>;

    /// Reads a document.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Merges `fields` into an existing document in one atomic write.
    ///
    /// Fails with a not-found error when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError>;

    /// Removes a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Runs `query` against `collection`.
    async fn query(&self, collection: &str, query: Query) -> Result<Vec<StoredDocument>, StoreError>;

    /// Inserts `document` under a store-assigned key, returning the key.
    async fn append(&self, collection: &str, document: Document) -> Result<String, StoreError>;

    /// Watches one document. The current state is delivered first.
    async fn subscribe(&self, collection: &str, id: &str) -> Result<DocumentSubscription, StoreError>;

    /// Watches a collection for appended documents. Existing documents are
    /// delivered first, sorted ascending by `order_by` and capped at the
    /// first `history_limit` when one is given.
    async fn append_subscribe(
        &self,
        collection: &str,
        order_by: &str,
        history_limit: Option<usize>,
    ) -> Result<AppendSubscription, StoreError>;

    /// Stops a subscription. Unknown handles are ignored.
    fn cancel(&self, handle: SubscriptionHandle);
}
