//! Core domain types, presentation storage, and the slide enhancement engine.

pub mod directive;
pub mod enhance;
pub mod error;
pub mod model;
pub mod store;
pub mod types;

pub use directive::{mock_enhancement, EnhancementType, UnknownEnhancementType};
pub use enhance::{build_prompt, Enhancement, EnhancementOptions, EnhancementSource, Enhancer};
pub use error::{Error, Result};
pub use model::{ChatModel, ChatRequest, ModelError};
pub use store::{MemoryStore, PresentationStore};
pub use types::{DocumentFormat, Presentation, EMPTY_SLIDE_PLACEHOLDER};
