//! Configuration editor
//!
//! Owns the editable copies of both blobs and persists after every mutation.
//! Every edit is sanitized before it is saved, so a stored blob always loads
//! back instead of decoding as corrupt.

use vela_core::{ContentId, DisplayConfig, RotationContent};
use vela_store::{ConfigStore, StoreResult};

pub struct DisplayEditor {
    store: ConfigStore,
    display: DisplayConfig,
    content: RotationContent,
}

impl DisplayEditor {
    /// Load both blobs; first run yields defaults
    pub fn open(store: ConfigStore) -> Self {
        let display = store.load_display();
        let content = store.load_rotation();
        DisplayEditor {
            store,
            display,
            content,
        }
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn content(&self) -> &RotationContent {
        &self.content
    }

    /// Discard in-memory state and reload from the store
    pub fn reload(&mut self) {
        self.display = self.store.load_display();
        self.content = self.store.load_rotation();
    }

    /// Apply `edit` to the display config and persist it
    pub fn edit_display<R>(&mut self, edit: impl FnOnce(&mut DisplayConfig) -> R) -> StoreResult<R> {
        let result = edit(&mut self.display);
        self.display.sanitize();
        self.store.save_display(&self.display)?;
        Ok(result)
    }

    fn edit_content<R>(&mut self, edit: impl FnOnce(&mut RotationContent) -> R) -> StoreResult<R> {
        let result = edit(&mut self.content);
        self.content.sanitize();
        self.store.save_rotation(&self.content)?;
        Ok(result)
    }

    pub fn set_primary_text(&mut self, text: impl Into<String>) -> StoreResult<()> {
        let text = text.into();
        self.edit_display(|cfg| cfg.primary_text = text)
    }

    pub fn push_rotation_text(&mut self, text: impl Into<String>) -> StoreResult<()> {
        let text = text.into();
        self.edit_display(|cfg| cfg.rotation_texts.push(text))
    }

    /// Remove a rotation text; `false` when out of range (nothing is written)
    pub fn remove_rotation_text(&mut self, index: usize) -> StoreResult<bool> {
        if index >= self.display.rotation_texts.len() {
            return Ok(false);
        }
        self.edit_display(|cfg| {
            cfg.rotation_texts.remove(index);
            true
        })
    }

    pub fn set_rotation_interval(&mut self, secs: f64) -> StoreResult<()> {
        self.edit_display(|cfg| cfg.rotation_interval_secs = secs)
    }

    pub fn add_content(&mut self, text: impl Into<String>) -> StoreResult<ContentId> {
        let text = text.into();
        self.edit_content(|content| content.add_item(text))
    }

    pub fn update_content(&mut self, id: ContentId, text: impl Into<String>) -> StoreResult<bool> {
        let text = text.into();
        self.edit_content(|content| content.update_item(id, text))
    }

    pub fn remove_content_at(&mut self, index: usize) -> StoreResult<bool> {
        if index >= self.content.len() {
            return Ok(false);
        }
        self.edit_content(|content| content.remove_at(index).is_some())
    }

    pub fn update_content_interval(&mut self, secs: f64) -> StoreResult<()> {
        self.edit_content(|content| content.set_interval(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_store::{LoadOrigin, StoreConfig};

    fn open() -> (tempfile::TempDir, ConfigStore, DisplayEditor) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(StoreConfig::ephemeral(dir.path())).unwrap();
        let editor = DisplayEditor::open(store.clone());
        (dir, store, editor)
    }

    #[test]
    fn test_first_open_has_defaults() {
        let (_dir, _store, editor) = open();
        assert_eq!(editor.display(), &DisplayConfig::default());
        assert!(editor.content().is_empty());
    }

    #[test]
    fn test_every_edit_is_persisted() {
        let (_dir, store, mut editor) = open();
        editor.set_primary_text("hello").unwrap();
        editor.push_rotation_text("world").unwrap();
        editor.set_rotation_interval(3.0).unwrap();

        let stored = store.load_display();
        assert_eq!(stored.primary_text, "hello");
        assert_eq!(stored.rotation_texts.last().map(String::as_str), Some("world"));
        assert_eq!(stored.rotation_interval_secs, 3.0);
    }

    #[test]
    fn test_out_of_range_removal_writes_nothing() {
        let (_dir, store, mut editor) = open();
        let rx = store.subscribe();
        assert!(!editor.remove_rotation_text(99).unwrap());
        assert!(!editor.remove_content_at(0).unwrap());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_content_edits_round_trip() {
        let (_dir, store, mut editor) = open();
        let first = editor.add_content("one").unwrap();
        editor.add_content("two").unwrap();
        assert!(editor.update_content(first, "uno").unwrap());
        assert!(editor.remove_content_at(1).unwrap());
        editor.update_content_interval(8.0).unwrap();

        let stored = store.load_rotation();
        assert_eq!(stored.texts().collect::<Vec<_>>(), vec!["uno"]);
        assert_eq!(stored.items[0].id, first);
        assert_eq!(stored.rotation_interval_secs, 8.0);
    }

    #[test]
    fn test_non_finite_edits_do_not_wipe_the_config() {
        let (_dir, store, mut editor) = open();
        editor.set_primary_text("my text").unwrap();
        editor.set_rotation_interval(f64::NAN).unwrap();
        editor.edit_display(|cfg| cfg.font_size = f64::INFINITY).unwrap();
        editor.update_content_interval(f64::NAN).unwrap();

        let loaded = store.load_display_detailed();
        assert_eq!(loaded.origin, LoadOrigin::Stored);
        assert_eq!(loaded.value.primary_text, "my text");
        assert_eq!(loaded.value.rotation_interval_secs, 1.0);
        assert!(loaded.value.font_size.is_finite());
        assert_eq!(store.load_rotation().rotation_interval_secs, 1.0);
        assert_eq!(editor.display(), &loaded.value);
    }

    #[test]
    fn test_reload_picks_up_external_writes() {
        let (_dir, store, mut editor) = open();
        store.save_display(&DisplayConfig::with_text("external")).unwrap();
        editor.reload();
        assert_eq!(editor.display().primary_text, "external");
    }
}
