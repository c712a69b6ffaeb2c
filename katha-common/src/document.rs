//! Prayer document model
//!
//! An immutable, ordered tree of narratable units: three sections
//! (Opening, Main, Closing) each holding an ordered list of items
//! (verses/dohas). Items carry a signed `number` — negative numbers are
//! opening/closing dohas, positive numbers are main verses. Lookups that
//! cross section boundaries go through `find_by_number`, never through a
//! positional index.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Section grouping, in fixed playback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Opening dohas (items numbered -1, -2, ...)
    Opening,
    /// Main verses (items numbered 1..)
    Main,
    /// Closing doha
    Closing,
}

impl SectionKind {
    /// Sections in document playback order
    pub const PLAYBACK_ORDER: [SectionKind; 3] =
        [SectionKind::Opening, SectionKind::Main, SectionKind::Closing];

    /// Section that follows this one in playback order
    pub fn next(self) -> Option<SectionKind> {
        match self {
            SectionKind::Opening => Some(SectionKind::Main),
            SectionKind::Main => Some(SectionKind::Closing),
            SectionKind::Closing => None,
        }
    }

    /// Section that precedes this one in playback order
    pub fn previous(self) -> Option<SectionKind> {
        match self {
            SectionKind::Opening => None,
            SectionKind::Main => Some(SectionKind::Opening),
            SectionKind::Closing => Some(SectionKind::Main),
        }
    }

    fn slot(self) -> usize {
        match self {
            SectionKind::Opening => 0,
            SectionKind::Main => 1,
            SectionKind::Closing => 2,
        }
    }
}

/// One verse or doha
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Signed verse number. Negative = opening/closing doha, positive = main
    /// verse. Unique within a document, not necessarily contiguous.
    pub number: i32,
    /// Source-language verse text
    pub original_text: String,
    /// Secondary-language gloss, narrated after the original
    pub explanation_text: String,
    /// Optional romanized form of the original text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<String>,
}

/// Immutable prayer document: three sections of items plus a precomputed
/// number index for O(1) lookup by verse number.
#[derive(Debug, Clone)]
pub struct Document {
    id: String,
    title: String,
    sections: [Vec<Item>; 3],
    by_number: HashMap<i32, (SectionKind, usize)>,
}

impl Document {
    /// Stable identifier for this prayer (e.g. "hanuman-chalisa")
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Items of one section, in narration order
    pub fn section(&self, kind: SectionKind) -> &[Item] {
        &self.sections[kind.slot()]
    }

    /// Number of items in one section
    pub fn item_count(&self, kind: SectionKind) -> usize {
        self.sections[kind.slot()].len()
    }

    /// Total number of items across all sections
    pub fn len(&self) -> usize {
        self.sections.iter().map(Vec::len).sum()
    }

    /// True when the document holds no items at all
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(Vec::is_empty)
    }

    /// Item at a positional index within one section
    pub fn item(&self, kind: SectionKind, index: usize) -> Result<&Item> {
        self.sections[kind.slot()].get(index).ok_or_else(|| {
            Error::NotFound(format!(
                "item index {index} out of range for {kind:?} section ({} items)",
                self.item_count(kind)
            ))
        })
    }

    /// Resolve a verse number to its (section, index) location
    pub fn find_by_number(&self, number: i32) -> Option<(SectionKind, usize)> {
        self.by_number.get(&number).copied()
    }
}

/// Builder for programmatic document construction
///
/// Validates number uniqueness and non-emptiness on `build()`.
pub struct DocumentBuilder {
    id: String,
    title: String,
    sections: [Vec<Item>; 3],
}

impl DocumentBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            sections: [Vec::new(), Vec::new(), Vec::new()],
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Append an item to a section, preserving insertion order
    pub fn item(mut self, kind: SectionKind, item: Item) -> Self {
        self.sections[kind.slot()].push(item);
        self
    }

    pub fn build(self) -> Result<Document> {
        if self.sections.iter().all(Vec::is_empty) {
            return Err(Error::InvalidDocument(format!(
                "document '{}' has no items",
                self.id
            )));
        }

        let mut by_number = HashMap::new();
        for kind in SectionKind::PLAYBACK_ORDER {
            for (index, item) in self.sections[kind.slot()].iter().enumerate() {
                if by_number.insert(item.number, (kind, index)).is_some() {
                    return Err(Error::InvalidDocument(format!(
                        "duplicate item number {} in document '{}'",
                        item.number, self.id
                    )));
                }
            }
        }

        Ok(Document {
            id: self.id,
            title: self.title,
            sections: self.sections,
            by_number,
        })
    }
}

/// On-disk prayer definition (TOML or JSON)
#[derive(Debug, Deserialize)]
struct DocumentDef {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    opening: Vec<Item>,
    #[serde(default)]
    main: Vec<Item>,
    #[serde(default)]
    closing: Vec<Item>,
}

impl DocumentDef {
    fn into_document(self) -> Result<Document> {
        let mut builder = DocumentBuilder::new(self.id).title(self.title);
        for item in self.opening {
            builder = builder.item(SectionKind::Opening, item);
        }
        for item in self.main {
            builder = builder.item(SectionKind::Main, item);
        }
        for item in self.closing {
            builder = builder.item(SectionKind::Closing, item);
        }
        builder.build()
    }
}

impl Document {
    /// Parse a prayer definition from TOML text
    pub fn from_toml_str(text: &str) -> Result<Document> {
        let def: DocumentDef =
            toml::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;
        def.into_document()
    }

    /// Parse a prayer definition from JSON text
    pub fn from_json_str(text: &str) -> Result<Document> {
        let def: DocumentDef =
            serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;
        def.into_document()
    }

    /// Load a prayer definition from a file, dispatching on extension
    pub fn load(path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let doc = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Document::from_json_str(&text)?,
            _ => Document::from_toml_str(&text)?,
        };
        tracing::debug!("Loaded document '{}': {} items", doc.id(), doc.len());
        Ok(doc)
    }
}
