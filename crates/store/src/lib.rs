pub mod memory;

pub use memory::InMemoryPrototypeStore;

use async_trait::async_trait;
use protomock_models::{MatchCriteria, MockError, Prototype, PrototypeSummary};
use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Catalog contract the mock engine resolves prototypes through. Any backend
/// honoring these semantics (in-memory, document database) is
/// interchangeable.
#[async_trait]
pub trait PrototypeStore: Send + Sync {
    /// Persists a new prototype under a freshly assigned ID and returns it.
    async fn save(&self, document: Prototype) -> Result<String, MockError>;

    /// Persists under a caller-chosen ID; the ID must be a well-formed UUID.
    async fn save_with_id(&self, id: &str, document: Prototype) -> Result<String, MockError>;

    /// Replaces an existing entry addressed by its ID; fails if absent.
    async fn update(&self, entity: Prototype) -> Result<(), MockError>;

    /// Partial merge of dotted field paths (wire names, e.g.
    /// "request.urlPath") into the stored entry's JSON representation.
    async fn update_fields(
        &self,
        id: &str,
        updates: HashMap<String, Value>,
    ) -> Result<Prototype, MockError>;

    async fn delete(&self, id: &str) -> Result<(), MockError>;

    async fn find(&self, id: &str) -> Result<Prototype, MockError>;

    async fn find_all(&self) -> Result<Vec<PrototypeSummary>, MockError>;

    /// Linear scan with equality filters and offset/limit pagination.
    async fn matching(
        &self,
        criteria: MatchCriteria,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PrototypeSummary>, MockError>;

    /// Route lookup. Fails fast with `Canceled` when the caller's token has
    /// already fired before the lookup begins.
    async fn get_by_path(
        &self,
        cancel: &CancellationToken,
        url_path: &str,
        method: &str,
    ) -> Result<Prototype, MockError>;

    /// Upsert by (method, urlPath): absent creates, present replaces keeping
    /// the existing ID and original CreatedAt.
    async fn save_or_update(
        &self,
        cancel: &CancellationToken,
        document: Prototype,
    ) -> Result<String, MockError>;
}
