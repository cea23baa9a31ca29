use async_trait::async_trait;
use chrono::Utc;
use protomock_models::{MatchCriteria, MockError, Prototype, PrototypeSummary};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::PrototypeStore;

const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct Entry {
    prototype: Prototype,
    expires_at: Instant,
}

#[derive(Default)]
struct Indexes {
    by_id: HashMap<String, Entry>,
    by_route: HashMap<String, String>,
}

fn route_key(method: &str, url_path: &str) -> String {
    format!("{}\n{}", method.trim().to_uppercase(), url_path.trim())
}

fn set_dotted_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut current = root;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            current.insert(part.to_string(), value);
            return;
        }
        let next = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !next.is_object() {
            *next = Value::Object(Map::new());
        }
        match next {
            Value::Object(map) => current = map,
            _ => unreachable!("just replaced with an object"),
        }
    }
}

impl Indexes {
    /// Writes both indexes and refreshes the entry's TTL deadline.
    fn put(&mut self, id: &str, prototype: Prototype, ttl: Duration) {
        let key = route_key(&prototype.request.method, &prototype.request.url_path);
        self.by_route.insert(key, id.to_string());
        self.by_id.insert(
            id.to_string(),
            Entry {
                prototype,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Returns the live entry for `id`, purging it from both indexes if its
    /// TTL has elapsed.
    fn get_if_alive(&mut self, id: &str) -> Option<Prototype> {
        let entry = self.by_id.get(id)?;
        if Instant::now() >= entry.expires_at {
            let key = route_key(
                &entry.prototype.request.method,
                &entry.prototype.request.url_path,
            );
            self.by_route.remove(&key);
            self.by_id.remove(id);
            return None;
        }
        Some(entry.prototype.clone())
    }

    fn get_if_alive_by_route(&mut self, method: &str, url_path: &str) -> Option<Prototype> {
        let id = self.by_route.get(&route_key(method, url_path))?.clone();
        self.get_if_alive(&id)
    }

    /// Visits every live entry, purging expired ones along the way.
    fn retain_live(&mut self) -> Vec<&Prototype> {
        let now = Instant::now();
        let by_route = &mut self.by_route;
        self.by_id.retain(|_, entry| {
            if now >= entry.expires_at {
                let key = route_key(
                    &entry.prototype.request.method,
                    &entry.prototype.request.url_path,
                );
                by_route.remove(&key);
                false
            } else {
                true
            }
        });
        self.by_id.values().map(|e| &e.prototype).collect()
    }
}

/// In-memory, TTL-expiring prototype catalog. A primary map keyed by ID and a
/// secondary map keyed by method+path are kept consistent under one exclusive
/// lock; expiry is lazy, purged by whichever read touches a dead entry first.
pub struct InMemoryPrototypeStore {
    indexes: Mutex<Indexes>,
    ttl: Duration,
}

impl InMemoryPrototypeStore {
    pub fn new(ttl: Duration) -> Self {
        let ttl = if ttl.is_zero() { DEFAULT_TTL } else { ttl };
        Self {
            indexes: Mutex::new(Indexes::default()),
            ttl,
        }
    }
}

#[async_trait]
impl PrototypeStore for InMemoryPrototypeStore {
    #[instrument(skip(self, document), fields(name = %document.name))]
    async fn save(&self, mut document: Prototype) -> Result<String, MockError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        document.id = id.clone();
        document.created_at.get_or_insert(now);
        document.updated_at = Some(now);

        let mut indexes = self.indexes.lock().await;
        indexes.put(&id, document, self.ttl);
        Ok(id)
    }

    #[instrument(skip(self, document))]
    async fn save_with_id(&self, id: &str, mut document: Prototype) -> Result<String, MockError> {
        if Uuid::parse_str(id).is_err() {
            return Err(MockError::InvalidId { id: id.to_string() });
        }
        let now = Utc::now();
        document.id = id.to_string();
        document.created_at.get_or_insert(now);
        document.updated_at = Some(now);

        let mut indexes = self.indexes.lock().await;
        indexes.put(id, document, self.ttl);
        Ok(id.to_string())
    }

    #[instrument(skip(self, entity), fields(id = %entity.id))]
    async fn update(&self, mut entity: Prototype) -> Result<(), MockError> {
        if entity.id.is_empty() {
            return Err(MockError::InvalidInput {
                reason: "prototype id is empty".to_string(),
            });
        }

        let mut indexes = self.indexes.lock().await;
        if indexes.get_if_alive(&entity.id).is_none() {
            return Err(MockError::NotFound {
                id: entity.id.clone(),
            });
        }
        entity.updated_at = Some(Utc::now());
        let id = entity.id.clone();
        indexes.put(&id, entity, self.ttl);
        Ok(())
    }

    #[instrument(skip(self, updates))]
    async fn update_fields(
        &self,
        id: &str,
        updates: HashMap<String, Value>,
    ) -> Result<Prototype, MockError> {
        let mut indexes = self.indexes.lock().await;
        let current = indexes
            .get_if_alive(id)
            .ok_or_else(|| MockError::NotFound { id: id.to_string() })?;

        // Merge through the entry's JSON representation so dotted paths
        // address wire field names.
        let mut tree = match serde_json::to_value(&current) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(err) => {
                return Err(MockError::Internal {
                    reason: err.to_string(),
                })
            }
        };
        for (path, value) in updates {
            if path.contains('.') {
                set_dotted_path(&mut tree, &path, value);
            } else {
                tree.insert(path, value);
            }
        }

        let mut merged: Prototype =
            serde_json::from_value(Value::Object(tree)).map_err(|err| MockError::Internal {
                reason: err.to_string(),
            })?;
        merged.id = id.to_string();
        merged.updated_at = Some(Utc::now());
        merged.created_at = merged.created_at.or(current.created_at);

        indexes.put(id, merged.clone(), self.ttl);
        Ok(merged)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), MockError> {
        let mut indexes = self.indexes.lock().await;
        let Some(entry) = indexes.by_id.remove(id) else {
            return Err(MockError::NotFound { id: id.to_string() });
        };
        let key = route_key(
            &entry.prototype.request.method,
            &entry.prototype.request.url_path,
        );
        indexes.by_route.remove(&key);
        info!("deleted prototype {}", id);
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Prototype, MockError> {
        // Exclusive lock even on reads: a dead entry found here is purged.
        let mut indexes = self.indexes.lock().await;
        indexes
            .get_if_alive(id)
            .ok_or_else(|| MockError::NotFound { id: id.to_string() })
    }

    async fn find_all(&self) -> Result<Vec<PrototypeSummary>, MockError> {
        let mut indexes = self.indexes.lock().await;
        Ok(indexes.retain_live().iter().map(|p| p.to_summary()).collect())
    }

    async fn matching(
        &self,
        criteria: MatchCriteria,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PrototypeSummary>, MockError> {
        let mut indexes = self.indexes.lock().await;
        let items: Vec<PrototypeSummary> = indexes
            .retain_live()
            .into_iter()
            .filter(|p| {
                if let Some(url_path) = &criteria.url_path {
                    if p.request.url_path != *url_path {
                        return false;
                    }
                }
                if let Some(method) = &criteria.method {
                    if !p.request.method.eq_ignore_ascii_case(method) {
                        return false;
                    }
                }
                true
            })
            .map(|p| p.to_summary())
            .collect();

        let start = offset.min(items.len());
        let mut end = items.len();
        if limit > 0 && start + limit < end {
            end = start + limit;
        }
        Ok(items[start..end].to_vec())
    }

    async fn get_by_path(
        &self,
        cancel: &CancellationToken,
        url_path: &str,
        method: &str,
    ) -> Result<Prototype, MockError> {
        if cancel.is_cancelled() {
            return Err(MockError::Canceled);
        }

        let mut indexes = self.indexes.lock().await;
        indexes
            .get_if_alive_by_route(method, url_path)
            .ok_or_else(|| MockError::PrototypeNotFound {
                path: url_path.to_string(),
                method: method.to_string(),
            })
    }

    #[instrument(skip(self, cancel, document), fields(name = %document.name))]
    async fn save_or_update(
        &self,
        cancel: &CancellationToken,
        mut document: Prototype,
    ) -> Result<String, MockError> {
        // A degenerate schema (empty root type) is normalized away before
        // persisting.
        if document
            .request
            .body_schema
            .as_ref()
            .is_some_and(|s| s.root_type.is_empty())
        {
            document.request.body_schema = None;
        }

        let existing = match self
            .get_by_path(cancel, &document.request.url_path, &document.request.method)
            .await
        {
            Ok(existing) => Some(existing),
            Err(MockError::Canceled) => return Err(MockError::Canceled),
            Err(_) => None,
        };

        let now = Utc::now();
        match existing {
            None => {
                document.created_at = Some(now);
                document.updated_at = Some(now);
                self.save(document).await
            }
            Some(existing) => {
                document.id = existing.id.clone();
                document.created_at = document.created_at.or(existing.created_at);
                document.updated_at = Some(now);

                let mut indexes = self.indexes.lock().await;
                let id = document.id.clone();
                indexes.put(&id, document, self.ttl);
                Ok(id)
            }
        }
    }
}
