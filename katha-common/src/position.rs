//! Playback position arithmetic
//!
//! Pure functions over the immutable document: given a position, compute
//! the next/previous one in narration order. Field order within an item is
//! Original then Explanation; section order is Opening, Main, Closing.
//! Skip navigation hops at item granularity and always lands on Original.

use serde::{Deserialize, Serialize};

use crate::document::{Document, SectionKind};

/// Which text field of an item is being narrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Source-language verse text, narrated first
    Original,
    /// Secondary-language gloss, narrated second
    Explanation,
}

/// A narration position: one `(section, item, field)` triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackPosition {
    pub section: SectionKind,
    pub item_index: usize,
    pub field: Field,
}

impl PlaybackPosition {
    pub fn new(section: SectionKind, item_index: usize, field: Field) -> Self {
        Self {
            section,
            item_index,
            field,
        }
    }
}

impl Document {
    /// First narratable position, skipping empty sections
    ///
    /// None only for a document with no items (the builder rejects those,
    /// so callers holding a built document always get a position).
    pub fn first_position(&self) -> Option<PlaybackPosition> {
        SectionKind::PLAYBACK_ORDER
            .into_iter()
            .find(|&kind| self.item_count(kind) > 0)
            .map(|kind| PlaybackPosition::new(kind, 0, Field::Original))
    }

    /// Next position in narration order, or None at end of document
    pub fn next_position(&self, current: PlaybackPosition) -> Option<PlaybackPosition> {
        if current.field == Field::Original {
            return Some(PlaybackPosition::new(
                current.section,
                current.item_index,
                Field::Explanation,
            ));
        }
        if current.item_index + 1 < self.item_count(current.section) {
            return Some(PlaybackPosition::new(
                current.section,
                current.item_index + 1,
                Field::Original,
            ));
        }
        self.first_item_of_following(current.section)
    }

    /// Previous position in narration order, or None at start of document
    pub fn previous_position(&self, current: PlaybackPosition) -> Option<PlaybackPosition> {
        if current.field == Field::Explanation {
            return Some(PlaybackPosition::new(
                current.section,
                current.item_index,
                Field::Original,
            ));
        }
        if current.item_index > 0 {
            return Some(PlaybackPosition::new(
                current.section,
                current.item_index - 1,
                Field::Explanation,
            ));
        }
        self.last_item_of_preceding(current.section)
            .map(|p| PlaybackPosition::new(p.section, p.item_index, Field::Explanation))
    }

    /// Next item's Original field, ignoring the current field (skip semantics)
    pub fn next_item_position(&self, current: PlaybackPosition) -> Option<PlaybackPosition> {
        if current.item_index + 1 < self.item_count(current.section) {
            return Some(PlaybackPosition::new(
                current.section,
                current.item_index + 1,
                Field::Original,
            ));
        }
        self.first_item_of_following(current.section)
    }

    /// Previous item's Original field, ignoring the current field
    pub fn previous_item_position(&self, current: PlaybackPosition) -> Option<PlaybackPosition> {
        if current.item_index > 0 {
            return Some(PlaybackPosition::new(
                current.section,
                current.item_index - 1,
                Field::Original,
            ));
        }
        self.last_item_of_preceding(current.section)
    }

    fn first_item_of_following(&self, section: SectionKind) -> Option<PlaybackPosition> {
        let mut kind = section.next()?;
        loop {
            if self.item_count(kind) > 0 {
                return Some(PlaybackPosition::new(kind, 0, Field::Original));
            }
            kind = kind.next()?;
        }
    }

    fn last_item_of_preceding(&self, section: SectionKind) -> Option<PlaybackPosition> {
        let mut kind = section.previous()?;
        loop {
            let count = self.item_count(kind);
            if count > 0 {
                return Some(PlaybackPosition::new(kind, count - 1, Field::Original));
            }
            kind = kind.previous()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentBuilder, Item};

    fn item(number: i32) -> Item {
        Item {
            number,
            original_text: format!("original {number}"),
            explanation_text: format!("explanation {number}"),
            transliteration: None,
        }
    }

    fn small_doc() -> Document {
        DocumentBuilder::new("test")
            .item(SectionKind::Opening, item(-1))
            .item(SectionKind::Opening, item(-2))
            .item(SectionKind::Main, item(1))
            .item(SectionKind::Main, item(2))
            .item(SectionKind::Main, item(3))
            .item(SectionKind::Closing, item(-3))
            .build()
            .unwrap()
    }

    /// All positions of a document in narration order
    fn all_positions(doc: &Document) -> Vec<PlaybackPosition> {
        let mut positions = vec![doc.first_position().unwrap()];
        while let Some(next) = doc.next_position(*positions.last().unwrap()) {
            positions.push(next);
        }
        positions
    }

    #[test]
    fn walks_every_field_in_order() {
        let doc = small_doc();
        let positions = all_positions(&doc);

        // 6 items, two fields each
        assert_eq!(positions.len(), 12);
        assert_eq!(
            positions[0],
            PlaybackPosition::new(SectionKind::Opening, 0, Field::Original)
        );
        assert_eq!(
            positions[1],
            PlaybackPosition::new(SectionKind::Opening, 0, Field::Explanation)
        );
        assert_eq!(
            positions[4],
            PlaybackPosition::new(SectionKind::Main, 0, Field::Original)
        );
        assert_eq!(
            *positions.last().unwrap(),
            PlaybackPosition::new(SectionKind::Closing, 0, Field::Explanation)
        );
    }

    #[test]
    fn end_of_document_is_none() {
        let doc = small_doc();
        let last = PlaybackPosition::new(SectionKind::Closing, 0, Field::Explanation);
        assert_eq!(doc.next_position(last), None);
    }

    #[test]
    fn start_of_document_is_none() {
        let doc = small_doc();
        let first = PlaybackPosition::new(SectionKind::Opening, 0, Field::Original);
        assert_eq!(doc.previous_position(first), None);
    }

    #[test]
    fn next_and_previous_are_inverses() {
        let doc = small_doc();
        let positions = all_positions(&doc);

        for pair in positions.windows(2) {
            assert_eq!(doc.next_position(pair[0]), Some(pair[1]));
            assert_eq!(doc.previous_position(pair[1]), Some(pair[0]));
        }
    }

    #[test]
    fn item_skip_ignores_field() {
        let doc = small_doc();
        let at_explanation = PlaybackPosition::new(SectionKind::Main, 1, Field::Explanation);

        // Skip lands on the next item's Original, not this item's remainder
        assert_eq!(
            doc.next_item_position(at_explanation),
            Some(PlaybackPosition::new(SectionKind::Main, 2, Field::Original))
        );
        // And previous skip goes back a whole item, also to Original
        assert_eq!(
            doc.previous_item_position(at_explanation),
            Some(PlaybackPosition::new(SectionKind::Main, 0, Field::Original))
        );
    }

    #[test]
    fn item_skip_wraps_section_boundaries() {
        let doc = small_doc();
        let last_opening = PlaybackPosition::new(SectionKind::Opening, 1, Field::Original);
        assert_eq!(
            doc.next_item_position(last_opening),
            Some(PlaybackPosition::new(SectionKind::Main, 0, Field::Original))
        );

        let first_main = PlaybackPosition::new(SectionKind::Main, 0, Field::Original);
        assert_eq!(
            doc.previous_item_position(first_main),
            Some(PlaybackPosition::new(SectionKind::Opening, 1, Field::Original))
        );

        let last_item = PlaybackPosition::new(SectionKind::Closing, 0, Field::Original);
        assert_eq!(doc.next_item_position(last_item), None);
    }

    #[test]
    fn empty_sections_are_skipped() {
        let doc = DocumentBuilder::new("no-opening")
            .item(SectionKind::Main, item(1))
            .item(SectionKind::Closing, item(-1))
            .build()
            .unwrap();

        assert_eq!(
            doc.first_position(),
            Some(PlaybackPosition::new(SectionKind::Main, 0, Field::Original))
        );
        let first_main = PlaybackPosition::new(SectionKind::Main, 0, Field::Original);
        assert_eq!(doc.previous_item_position(first_main), None);
    }
}
