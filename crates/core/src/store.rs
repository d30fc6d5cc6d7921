//! Presentation storage.
//!
//! Records are created on upload and never updated or removed. The in-memory
//! store grows for the life of the process.

use crate::{Error, Presentation, Result};
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Storage for uploaded presentations.
pub trait PresentationStore: Send + Sync {
    /// Store a new presentation under a freshly generated id.
    fn put(&self, filename: String, slides: Vec<String>) -> Arc<Presentation>;

    /// Look up a presentation by id.
    fn get(&self, id: &str) -> Result<Arc<Presentation>>;

    /// The earliest stored presentation, if any.
    fn first(&self) -> Option<Arc<Presentation>>;

    /// Number of stored presentations.
    fn len(&self) -> usize;

    /// Whether nothing has been stored yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store keeping presentations in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<IndexMap<String, Arc<Presentation>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresentationStore for MemoryStore {
    fn put(&self, filename: String, slides: Vec<String>) -> Arc<Presentation> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut id = Uuid::new_v4().to_string();
        while records.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let presentation = Arc::new(Presentation {
            id: id.clone(),
            filename,
            slides,
        });
        records.insert(id, Arc::clone(&presentation));

        log::debug!(
            "Stored presentation {} ({} slides, {} records total)",
            presentation.id,
            presentation.slides.len(),
            records.len()
        );

        presentation
    }

    fn get(&self, id: &str) -> Result<Arc<Presentation>> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PresentationNotFound(id.to_string()))
    }

    fn first(&self) -> Option<Arc<Presentation>> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .first()
            .map(|(_, presentation)| Arc::clone(presentation))
    }

    fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
