//! Rotation content - the named item list used by the alternate configuration path

use serde::{Deserialize, Serialize};

use crate::{sanitize_interval, ContentId};

/// One rotating text with a stable identity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    #[serde(default)]
    pub text: String,
}

impl ContentItem {
    pub fn new(text: impl Into<String>) -> Self {
        ContentItem {
            id: ContentId::generate(),
            text: text.into(),
        }
    }
}

/// Named list of rotating texts; insertion order is display order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationContent {
    pub name: String,
    pub id: u32,
    pub items: Vec<ContentItem>,
    pub rotation_interval_secs: f64,
}

impl RotationContent {
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        RotationContent {
            name: name.into(),
            id,
            items: Vec::new(),
            rotation_interval_secs: 5.0,
        }
    }

    /// Append a text, returning its new identity
    pub fn add_item(&mut self, text: impl Into<String>) -> ContentId {
        let item = ContentItem::new(text);
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Remove by identity
    pub fn remove_item(&mut self, id: ContentId) -> Option<ContentItem> {
        let pos = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Remove by display position
    pub fn remove_at(&mut self, index: usize) -> Option<ContentItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Replace the text of an item, keeping its identity and position
    pub fn update_item(&mut self, id: ContentId, text: impl Into<String>) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Non-finite or non-positive intervals become the minimum
    pub fn set_interval(&mut self, secs: f64) {
        self.rotation_interval_secs = sanitize_interval(secs);
    }

    /// Make the stored interval safe to persist
    pub fn sanitize(&mut self) {
        self.rotation_interval_secs = sanitize_interval(self.rotation_interval_secs);
    }

    pub fn get(&self, id: ContentId) -> Option<&ContentItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Texts in display order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for RotationContent {
    fn default() -> Self {
        RotationContent::new("Default configuration", 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_stable_across_edits() {
        let mut content = RotationContent::default();
        let a = content.add_item("first");
        let b = content.add_item("second");
        let c = content.add_item("third");

        assert!(content.update_item(b, "second, edited"));
        content.remove_item(a);

        let ids: Vec<_> = content.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![b, c]);
        assert_eq!(content.get(b).map(|i| i.text.as_str()), Some("second, edited"));
    }

    #[test]
    fn test_remove_at_out_of_range() {
        let mut content = RotationContent::default();
        content.add_item("x");
        assert!(content.remove_at(3).is_none());
        assert_eq!(content.remove_at(0).map(|i| i.text), Some("x".to_owned()));
        assert!(content.is_empty());
    }

    #[test]
    fn test_interval_cannot_become_non_finite() {
        let mut content = RotationContent::default();
        content.set_interval(f64::NAN);
        assert_eq!(content.rotation_interval_secs, 1.0);
        content.set_interval(-2.0);
        assert_eq!(content.rotation_interval_secs, 1.0);
        content.set_interval(2.5);
        assert_eq!(content.rotation_interval_secs, 2.5);
    }
}
