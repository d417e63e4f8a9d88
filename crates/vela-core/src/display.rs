//! Display configuration
//!
//! The editable description of what a renderer host shows: one primary text,
//! an ordered list of rotation texts and the styling shared by all of them.
//! Rotation slot 0 is always the primary text.

use serde::{Deserialize, Deserializer, Serialize};

/// Stored rotation intervals are at least this many seconds
pub const MIN_ROTATION_INTERVAL_SECS: f64 = 1.0;

const DEFAULT_FONT_SIZE: f64 = 24.0;

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Interval safe to persist: non-finite or non-positive becomes the minimum
pub fn sanitize_interval(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        MIN_ROTATION_INTERVAL_SECS
    }
}

/// RGBA color, each channel in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const CLEAR: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Color { red, green, blue, alpha: 1.0 }
    }

    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Color { red, green, blue, alpha }
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Color { alpha, ..self }
    }

    /// Channels clamped into `[0, 1]`, NaN as 0
    pub fn sanitized(self) -> Self {
        let channel = |v: f64| finite_or(v, 0.0).clamp(0.0, 1.0);
        Color {
            red: channel(self.red),
            green: channel(self.green),
            blue: channel(self.blue),
            alpha: channel(self.alpha),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Horizontal text alignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Leading,
    #[default]
    Center,
    Trailing,
}

impl<'de> Deserialize<'de> for Alignment {
    /// Unknown alignments decode as `Center` rather than failing the blob
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "leading" => Alignment::Leading,
            "trailing" => Alignment::Trailing,
            _ => Alignment::Center,
        })
    }
}

/// Editable display configuration, owned by the editor process
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub primary_text: String,
    pub rotation_texts: Vec<String>,
    pub font_size: f64,
    pub text_color: Color,
    pub background_color: Color,
    pub alignment: Alignment,
    pub has_shadow: bool,
    pub shadow_radius: f64,
    pub border_width: f64,
    pub border_color: Color,
    /// Seconds between rotations, expected > 0
    pub rotation_interval_secs: f64,
    /// Persisted rotation cursor, interpreted modulo `sequence_len()`
    pub rotation_index: u64,
}

impl DisplayConfig {
    /// A static single-text configuration with default styling
    pub fn with_text(text: impl Into<String>) -> Self {
        DisplayConfig {
            primary_text: text.into(),
            rotation_texts: Vec::new(),
            ..DisplayConfig::default()
        }
    }

    /// Number of rotation slots: the primary text plus every rotation text
    pub fn sequence_len(&self) -> usize {
        self.rotation_texts.len() + 1
    }

    /// Whether the configuration rotates at all
    pub fn rotates(&self) -> bool {
        !self.rotation_texts.is_empty()
    }

    /// Persisted index wrapped into `[0, sequence_len())`
    pub fn wrapped_index(&self) -> usize {
        (self.rotation_index % self.sequence_len() as u64) as usize
    }

    /// Text at a (wrapping) rotation slot
    pub fn text_at(&self, index: u64) -> &str {
        let slot = (index % self.sequence_len() as u64) as usize;
        if slot == 0 {
            &self.primary_text
        } else {
            &self.rotation_texts[slot - 1]
        }
    }

    /// Replace values JSON cannot carry (NaN, infinities) and out-of-range
    /// sizes, so a saved config always loads back
    pub fn sanitize(&mut self) {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            self.font_size = DEFAULT_FONT_SIZE;
        }
        self.shadow_radius = finite_or(self.shadow_radius, 0.0).max(0.0);
        self.border_width = finite_or(self.border_width, 0.0).max(0.0);
        self.text_color = self.text_color.sanitized();
        self.background_color = self.background_color.sanitized();
        self.border_color = self.border_color.sanitized();
        self.rotation_interval_secs = sanitize_interval(self.rotation_interval_secs);
    }

    /// Text at the persisted rotation index
    pub fn current_text(&self) -> &str {
        self.text_at(self.rotation_index)
    }
}

impl Default for DisplayConfig {
    /// First-run configuration
    fn default() -> Self {
        let accent = Color::rgb(0.31, 0.54, 0.38);
        DisplayConfig {
            primary_text: "Welcome to AI Widget Text".to_owned(),
            rotation_texts: vec![
                "Create beautiful text widgets with ease".to_owned(),
                "Customize styles and colors freely".to_owned(),
                "Generate rotating content with AI".to_owned(),
            ],
            font_size: DEFAULT_FONT_SIZE,
            text_color: accent,
            background_color: Color::rgb(0.95, 0.98, 0.96),
            alignment: Alignment::Center,
            has_shadow: false,
            shadow_radius: 0.0,
            border_width: 2.0,
            border_color: accent.with_alpha(0.5),
            rotation_interval_secs: 10.0,
            rotation_index: 0,
        }
    }
}
