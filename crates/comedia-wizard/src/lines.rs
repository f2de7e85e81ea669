//! Stable-index line slots for the premise, rupture and punchline sections.
//!
//! Each rendered input holds the [`LineKey`] it was created with. Removing a
//! line tombstones its slot instead of compacting, so every other key keeps
//! pointing at the same entry for the lifetime of the wizard session.

use crate::error::LineError;
use crate::step::Step;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three free-text sections built from line entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Setup of the joke
    Premise,
    /// Point where expectation breaks
    Rupture,
    /// Closing line
    Punchline,
}

impl Section {
    /// All sections in wizard order
    pub const ALL: [Section; 3] = [Section::Premise, Section::Rupture, Section::Punchline];

    /// Step whose validation covers this section
    #[must_use]
    pub const fn step(self) -> Step {
        match self {
            Section::Premise => Step::Premise,
            Section::Rupture => Step::Rupture,
            Section::Punchline => Step::Punchline,
        }
    }

    /// Record field holding the joined block
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Section::Premise => "premisa",
            Section::Rupture => "ruptura",
            Section::Punchline => "remate",
        }
    }

    /// Parse a section from its English or record-field name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "premise" | "premisa" => Some(Section::Premise),
            "rupture" | "ruptura" => Some(Section::Rupture),
            "punchline" | "remate" => Some(Section::Punchline),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Premise => "premise",
            Section::Rupture => "rupture",
            Section::Punchline => "punchline",
        };
        f.write_str(name)
    }
}

/// Stable key of a line entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineKey(usize);

impl LineKey {
    /// Raw slot index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Key for a raw slot index
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arena of optional line texts addressed by [`LineKey`]
///
/// `None` marks a removed entry. Slots are append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSlots {
    slots: Vec<Option<String>>,
}

impl LineSlots {
    /// Empty arena
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena holding a single empty line, the state of a fresh section
    #[must_use]
    pub fn with_empty_line() -> Self {
        let mut slots = Self::new();
        slots.add("");
        slots
    }

    /// Rebuild lines from a stored multi-line block
    ///
    /// One slot per `\n`-separated segment; an empty block yields one empty
    /// line so the section still renders an input.
    #[must_use]
    pub fn from_block(block: &str) -> Self {
        if block.is_empty() {
            return Self::with_empty_line();
        }
        let mut slots = Self::new();
        for segment in block.split('\n') {
            slots.add(segment.strip_suffix('\r').unwrap_or(segment));
        }
        slots
    }

    /// Append a new entry at the next key
    pub fn add(&mut self, initial: impl Into<String>) -> LineKey {
        let key = LineKey(self.slots.len());
        self.slots.push(Some(initial.into()));
        key
    }

    /// Tombstone the entry at `key`
    ///
    /// Returns the removed text. Removing twice is an error, as is a key that
    /// was never handed out.
    pub fn remove(&mut self, key: LineKey) -> Result<String, LineError> {
        let slot = self
            .slots
            .get_mut(key.0)
            .ok_or(LineError::UnknownKey(key))?;
        slot.take().ok_or(LineError::Removed(key))
    }

    /// Replace the text of a live entry
    pub fn edit(&mut self, key: LineKey, text: impl Into<String>) -> Result<(), LineError> {
        match self.slots.get_mut(key.0) {
            None => Err(LineError::UnknownKey(key)),
            Some(None) => Err(LineError::Removed(key)),
            Some(Some(current)) => {
                *current = text.into();
                Ok(())
            }
        }
    }

    /// Text at `key`, `None` if removed or unknown
    #[must_use]
    pub fn get(&self, key: LineKey) -> Option<&str> {
        self.slots.get(key.0).and_then(Option::as_deref)
    }

    /// Live entries in key order
    pub fn live(&self) -> impl Iterator<Item = (LineKey, &str)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_deref().map(|text| (LineKey(i), text)))
    }

    /// Whether any live entry has non-blank text
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.live().any(|(_, text)| !text.trim().is_empty())
    }

    /// Live, non-blank entries joined into one `\n`-separated block
    #[must_use]
    pub fn joined(&self) -> String {
        self.live()
            .map(|(_, text)| text)
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of live entries
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_keeps_sibling_keys() {
        let mut lines = LineSlots::new();
        let a = lines.add("a");
        let b = lines.add("b");
        let c = lines.add("c");

        lines.remove(b).unwrap();
        lines.edit(c, "c2").unwrap();

        assert_eq!(lines.get(a), Some("a"));
        assert_eq!(lines.get(b), None);
        assert_eq!(lines.get(c), Some("c2"));
        assert_eq!(lines.live_count(), 2);
        assert_eq!(lines.add("d").index(), 3);
    }

    #[test]
    fn keys_are_not_reused_after_removal() {
        let mut lines = LineSlots::new();
        let a = lines.add("a");
        lines.remove(a).unwrap();
        let b = lines.add("b");
        assert_ne!(a, b);
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn editing_removed_line_is_rejected() {
        let mut lines = LineSlots::new();
        let a = lines.add("a");
        lines.remove(a).unwrap();
        assert_eq!(lines.edit(a, "x"), Err(LineError::Removed(a)));
        assert_eq!(lines.remove(a), Err(LineError::Removed(a)));
        assert_eq!(
            lines.edit(LineKey::from_index(9), "x"),
            Err(LineError::UnknownKey(LineKey::from_index(9)))
        );
    }

    #[test]
    fn joined_skips_removed_and_blank() {
        let mut lines = LineSlots::new();
        lines.add("a");
        let gap = lines.add("");
        lines.add("   ");
        lines.add("b");
        lines.remove(gap).unwrap();
        assert_eq!(lines.joined(), "a\nb");
    }

    #[test]
    fn from_block_splits_lines() {
        let lines = LineSlots::from_block("x\ny\nz");
        let texts: Vec<_> = lines.live().map(|(_, t)| t).collect();
        assert_eq!(texts, ["x", "y", "z"]);
    }

    #[test]
    fn from_empty_block_yields_one_empty_line() {
        let lines = LineSlots::from_block("");
        assert_eq!(lines.live_count(), 1);
        assert!(!lines.has_content());
    }

    #[test]
    fn has_content_ignores_whitespace() {
        let mut lines = LineSlots::new();
        let key = lines.add("   ");
        assert!(!lines.has_content());
        lines.edit(key, " x ").unwrap();
        assert!(lines.has_content());
    }

    #[test]
    fn section_parse_accepts_both_names() {
        assert_eq!(Section::parse("Premise"), Some(Section::Premise));
        assert_eq!(Section::parse("remate"), Some(Section::Punchline));
        assert_eq!(Section::parse("coda"), None);
    }
}
