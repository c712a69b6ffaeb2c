//! # Katha Common Library
//!
//! Shared code for the katha narration engine:
//! - Prayer document model (sections, items, number index)
//! - Playback position arithmetic (pure, no side effects)
//! - Event types (PlaybackEvent enum)
//! - Common error types

pub mod document;
pub mod error;
pub mod events;
pub mod position;

pub use document::{Document, DocumentBuilder, Item, SectionKind};
pub use error::{Error, Result};
pub use events::{PlaybackEvent, PlaybackStatus, WordRange};
pub use position::{Field, PlaybackPosition};
