use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;

/// Overlay appearance, matching the settings object the extension popup
/// stores. Unknown keys in stored settings are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlaySettings {
    pub font_size: FontSize,
    pub position: OverlayPosition,
    pub background_color: BackgroundStyle,
    pub text_color: String,
    pub show_original: bool,
    pub show_translated: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            font_size: FontSize::Medium,
            position: OverlayPosition::Bottom,
            background_color: BackgroundStyle::SemiTransparent,
            text_color: "white".to_string(),
            show_original: true,
            show_translated: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
    Xlarge,
}

impl FontSize {
    pub fn px(&self) -> &'static str {
        match self {
            FontSize::Small => "16px",
            FontSize::Medium => "20px",
            FontSize::Large => "24px",
            FontSize::Xlarge => "28px",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverlayPosition {
    Top,
    #[default]
    Bottom,
}

impl OverlayPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayPosition::Top => "top",
            OverlayPosition::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BackgroundStyle {
    #[serde(rename = "transparent")]
    Transparent,
    #[default]
    #[serde(rename = "semi-transparent")]
    SemiTransparent,
    #[serde(rename = "solid")]
    Solid,
}

impl BackgroundStyle {
    pub fn css(&self) -> &'static str {
        match self {
            BackgroundStyle::Transparent => "rgba(0, 0, 0, 0.1)",
            BackgroundStyle::SemiTransparent => "rgba(0, 0, 0, 0.7)",
            BackgroundStyle::Solid => "rgba(0, 0, 0, 0.9)",
        }
    }
}

/// Subtitle overlay state machine. Every transition is reported through the
/// injected diagnostics sink; nothing here touches a global object. Cues
/// that arrive while the overlay is hidden are counted, not reported.
pub struct SubtitleService {
    diagnostics: Arc<dyn Diagnostics>,
    settings: OverlaySettings,
    visible: bool,
    suppressed_cues: u64,
}

impl SubtitleService {
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            diagnostics,
            settings: OverlaySettings::default(),
            visible: false,
            suppressed_cues: 0,
        }
    }

    pub fn set_visibility(&mut self, visible: bool) {
        self.visible = visible;
        self.diagnostics.note(if visible {
            "subtitle overlay shown"
        } else {
            "subtitle overlay hidden"
        });
    }

    /// Displays a cue. The original line and its translation are shown
    /// according to the `show_original` / `show_translated` toggles.
    pub fn update_subtitle(&mut self, text: &str, translation: Option<&str>) {
        if !self.visible {
            self.suppressed_cues += 1;
            return;
        }
        let mut parts: Vec<&str> = Vec::new();
        if self.settings.show_original {
            parts.push(text);
        }
        if self.settings.show_translated {
            if let Some(translated) = translation.filter(|t| !t.is_empty()) {
                parts.push(translated);
            }
        }
        if parts.is_empty() {
            self.suppressed_cues += 1;
            return;
        }
        self.diagnostics
            .note(&format!("subtitle: {}", parts.join(" | ")));
    }

    pub fn apply_settings(&mut self, settings: OverlaySettings) {
        self.diagnostics.note(&format!(
            "overlay settings applied: {} {} {}",
            settings.font_size.px(),
            settings.background_color.css(),
            settings.position.as_str()
        ));
        self.settings = settings;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    pub fn suppressed_cues(&self) -> u64 {
        self.suppressed_cues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemoryDiagnostics;
    use serde_json::json;

    fn service() -> (Arc<MemoryDiagnostics>, SubtitleService) {
        let sink = Arc::new(MemoryDiagnostics::new());
        let service = SubtitleService::new(sink.clone());
        (sink, service)
    }

    #[test]
    fn defaults_match_the_stored_shape() {
        let settings = OverlaySettings::default();
        assert_eq!(settings.font_size, FontSize::Medium);
        assert_eq!(settings.position, OverlayPosition::Bottom);
        assert_eq!(settings.background_color, BackgroundStyle::SemiTransparent);
        assert_eq!(settings.text_color, "white");
        assert!(settings.show_original);
        assert!(settings.show_translated);
    }

    #[test]
    fn stored_settings_json_parses() {
        let stored = json!({
            "fontSize": "large",
            "position": "top",
            "backgroundColor": "semi-transparent",
            "textColor": "yellow",
            "showOriginal": false,
            "showTranslated": true
        });
        let settings: OverlaySettings = serde_json::from_value(stored).unwrap();
        assert_eq!(settings.font_size, FontSize::Large);
        assert_eq!(settings.position, OverlayPosition::Top);
        assert!(!settings.show_original);
        assert_eq!(settings.text_color, "yellow");
    }

    #[test]
    fn partial_settings_fall_back_to_defaults() {
        let settings: OverlaySettings =
            serde_json::from_value(json!({ "fontSize": "xlarge" })).unwrap();
        assert_eq!(settings.font_size, FontSize::Xlarge);
        assert_eq!(settings.font_size.px(), "28px");
        assert_eq!(settings.position, OverlayPosition::Bottom);
    }

    #[test]
    fn visibility_transitions_are_reported() {
        let (sink, mut service) = service();
        service.set_visibility(true);
        service.set_visibility(false);
        assert_eq!(
            sink.lines(),
            vec!["subtitle overlay shown", "subtitle overlay hidden"]
        );
        assert!(!service.is_visible());
    }

    #[test]
    fn cues_while_hidden_are_counted_not_reported() {
        let (sink, mut service) = service();
        service.update_subtitle("안녕하세요", Some("Hello"));
        service.update_subtitle("다시", None);
        assert_eq!(service.suppressed_cues(), 2);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn visible_cue_shows_original_and_translation() {
        let (sink, mut service) = service();
        service.set_visibility(true);
        service.update_subtitle("안녕하세요", Some("Hello"));
        assert_eq!(sink.lines()[1], "subtitle: 안녕하세요 | Hello");
    }

    #[test]
    fn translated_only_mode_drops_the_original_line() {
        let (sink, mut service) = service();
        service.apply_settings(OverlaySettings {
            show_original: false,
            ..Default::default()
        });
        service.set_visibility(true);
        service.update_subtitle("안녕하세요", Some("Hello"));
        assert_eq!(sink.lines().last().map(String::as_str), Some("subtitle: Hello"));
    }

    #[test]
    fn cue_with_nothing_to_show_counts_as_suppressed() {
        let (sink, mut service) = service();
        service.apply_settings(OverlaySettings {
            show_original: false,
            show_translated: false,
            ..Default::default()
        });
        service.set_visibility(true);
        let before = sink.lines().len();
        service.update_subtitle("안녕하세요", Some("Hello"));
        assert_eq!(service.suppressed_cues(), 1);
        assert_eq!(sink.lines().len(), before);
    }

    #[test]
    fn applied_settings_are_described() {
        let (sink, mut service) = service();
        service.apply_settings(OverlaySettings {
            font_size: FontSize::Small,
            background_color: BackgroundStyle::Solid,
            position: OverlayPosition::Top,
            ..Default::default()
        });
        assert_eq!(
            sink.lines()[0],
            "overlay settings applied: 16px rgba(0, 0, 0, 0.9) top"
        );
        assert_eq!(service.settings().font_size, FontSize::Small);
    }
}
