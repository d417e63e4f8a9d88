//! Renderer host adapter
//!
//! The renderer host asks three questions: a placeholder before anything is
//! loaded, a single snapshot for previews, and a full timeline. Answering the
//! last one advances the renderer's rotation cursor so the next timeline
//! continues the cycle. The display blob itself is never written here.

use vela_core::{DisplayConfig, Timestamp};
use vela_store::{ConfigStore, LoadOrigin, RotationCursor};
use vela_timeline::{project_content, project_with, Projection, TimelineConfig, TimelineEntry};

pub struct TimelineProvider {
    store: ConfigStore,
    config: TimelineConfig,
}

impl TimelineProvider {
    pub fn new(store: ConfigStore, config: TimelineConfig) -> Self {
        TimelineProvider { store, config }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Default configuration, one entry, no I/O
    pub fn placeholder(&self, now: Timestamp) -> Projection {
        let cfg = DisplayConfig::default();
        Projection::fixed(now, &cfg.primary_text, 0)
    }

    /// What the stored configuration shows right now
    pub fn snapshot(&self, now: Timestamp) -> TimelineEntry {
        let (cfg, _) = self.positioned_display();
        TimelineEntry {
            activate_at: now,
            text: cfg.current_text().to_owned(),
            index: cfg.wrapped_index() as u64,
        }
    }

    /// Project the stored configuration and persist where it leaves off
    pub fn timeline(&self, now: Timestamp) -> Projection {
        let (cfg, base_index) = self.positioned_display();
        let projection = project_with(&cfg, now, &self.config);

        if projection.next_index != cfg.rotation_index {
            let cursor = RotationCursor {
                next_index: projection.next_index,
                base_index,
            };
            if let Err(err) = self.store.save_cursor(&cursor) {
                tracing::warn!(error = %err, "failed to persist rotation cursor");
            }
        }

        tracing::debug!(
            entries = projection.entries.len(),
            next_index = projection.next_index,
            "timeline projected"
        );
        projection
    }

    /// Local copy of the display config with the index moved to the cursor,
    /// plus the stored `rotation_index` it was positioned from
    fn positioned_display(&self) -> (DisplayConfig, u64) {
        let mut cfg = self.store.load_display();
        let base_index = cfg.rotation_index;
        let cursor = self.store.load_cursor();
        if cursor.origin == LoadOrigin::Stored && cursor.value.base_index == base_index {
            cfg.rotation_index = cursor.value.next_index;
        }
        (cfg, base_index)
    }

    /// Project the stored rotation content, falling back to the primary text
    pub fn content_timeline(&self, start_index: u64, now: Timestamp) -> Projection {
        let fallback = self.store.load_display().primary_text;
        let content = self.store.load_rotation();
        project_content(&content, &fallback, start_index, now, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vela_store::StoreConfig;
    use vela_timeline::Refresh;

    fn provider() -> (tempfile::TempDir, ConfigStore, TimelineProvider) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(StoreConfig::ephemeral(dir.path())).unwrap();
        let provider = TimelineProvider::new(store.clone(), TimelineConfig::default());
        (dir, store, provider)
    }

    #[test]
    fn test_placeholder_uses_defaults() {
        let (_dir, _store, provider) = provider();
        let p = provider.placeholder(Timestamp::EPOCH);
        assert_eq!(p.entries.len(), 1);
        assert_eq!(p.entries[0].text, DisplayConfig::default().primary_text);
        assert_eq!(p.refresh, Refresh::Never);
    }

    #[test]
    fn test_timeline_advances_persisted_index() {
        let (_dir, store, provider) = provider();
        let cfg = DisplayConfig {
            primary_text: "A".into(),
            rotation_texts: vec!["B".into(), "C".into()],
            rotation_interval_secs: 7.0,
            rotation_index: 1,
            ..DisplayConfig::default()
        };
        store.save_display(&cfg).unwrap();

        let t = Timestamp::from_secs(100);
        let first = provider.timeline(t);
        // 43 entries starting at slot 1
        assert_eq!(first.next_index, 2);
        assert_eq!(store.load_cursor().value.next_index, 2);
        assert_eq!(store.load_display(), cfg);

        let second = provider.timeline(t + Duration::from_secs(300));
        let last = first.entries.last().unwrap();
        assert_eq!(second.entries[0].index, (last.index + 1) % 3);
    }

    #[test]
    fn test_static_timeline_does_not_write() {
        let (_dir, store, provider) = provider();
        store.save_display(&DisplayConfig::with_text("static")).unwrap();
        let rx = store.subscribe();

        let p = provider.timeline(Timestamp::EPOCH);
        assert_eq!(p.entries[0].text, "static");
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_snapshot_follows_index() {
        let (_dir, store, provider) = provider();
        let cfg = DisplayConfig {
            primary_text: "A".into(),
            rotation_texts: vec!["B".into()],
            rotation_index: 3,
            ..DisplayConfig::default()
        };
        store.save_display(&cfg).unwrap();
        assert_eq!(provider.snapshot(Timestamp::EPOCH).text, "B");
    }

    #[test]
    fn test_content_timeline_falls_back_to_primary() {
        let (_dir, store, provider) = provider();
        store.save_display(&DisplayConfig::with_text("primary")).unwrap();
        let p = provider.content_timeline(0, Timestamp::EPOCH);
        assert_eq!(p.entries[0].text, "primary");
    }

    fn rotating(primary: &str) -> DisplayConfig {
        DisplayConfig {
            primary_text: primary.into(),
            rotation_texts: vec!["B".into(), "C".into()],
            rotation_interval_secs: 7.0,
            ..DisplayConfig::default()
        }
    }

    #[test]
    fn test_interleaved_edits_are_never_overwritten() {
        let (_dir, store, provider) = provider();
        let mut editor = crate::DisplayEditor::open(store.clone());
        let mut t = Timestamp::from_secs(100);

        editor.edit_display(|cfg| *cfg = rotating("v0")).unwrap();
        let mut expected_start = 0;
        for i in 1..20 {
            let p = provider.timeline(t);
            assert_eq!(p.entries[0].index, expected_start);
            assert_eq!(store.load_display().primary_text, format!("v{}", i - 1));
            expected_start = p.next_index;

            editor.set_primary_text(format!("v{i}")).unwrap();
            t = t + Duration::from_secs(300);
        }
        assert_eq!(provider.timeline(t).entries[0].index, expected_start);
        assert_eq!(store.load_display().primary_text, "v19");
    }

    #[test]
    fn test_concurrent_renderer_does_not_regress_edits() {
        let (_dir, store, provider) = provider();
        store.save_display(&rotating("0")).unwrap();
        let stop = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));

        let renderer = {
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut t = Timestamp::from_secs(100);
                while !stop.load(std::sync::atomic::Ordering::Acquire) {
                    provider.timeline(t);
                    t = t + Duration::from_secs(7);
                }
            })
        };

        let mut editor = crate::DisplayEditor::open(store.clone());
        for i in 1..200u32 {
            editor.set_primary_text(i.to_string()).unwrap();
            let seen: u32 = store.load_display().primary_text.parse().unwrap();
            assert!(seen >= i, "saved {i}, then read {seen}");
        }
        stop.store(true, std::sync::atomic::Ordering::Release);
        renderer.join().unwrap();
        assert_eq!(store.load_display().primary_text, "199");
    }

    #[test]
    fn test_editor_index_change_resets_cursor() {
        let (_dir, store, provider) = provider();
        store.save_display(&rotating("A")).unwrap();
        let t = Timestamp::from_secs(100);
        // 43 entries from slot 0
        assert_eq!(provider.timeline(t).next_index, 1);
        assert_eq!(provider.snapshot(t).text, "B");

        let mut editor = crate::DisplayEditor::open(store.clone());
        editor.edit_display(|cfg| cfg.rotation_index = 2).unwrap();
        assert_eq!(provider.timeline(t).entries[0].text, "C");
    }
}
