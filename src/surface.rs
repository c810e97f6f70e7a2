//! What the dashboard needs from a view, independent of how it draws.
//!
//! Views render from a shared `FrameContext`, write into the single
//! `Tooltip`, and report user intent back as `SurfaceEvent`s. Cross-view
//! highlighting is applied through `Surface::set_opacity`.

use eframe::egui;

use crate::config::DashboardConfig;
use crate::coordinator::Coordinator;
use crate::hierarchy::UNKNOWN_CONTINENT;
use crate::scale::Scales;

pub struct FrameContext<'a> {
    pub coordinator: &'a Coordinator,
    pub scales: &'a Scales,
    pub config: &'a DashboardConfig,
    pub now_ms: f64,
}

/// Identity of something a surface draws, as seen by opacity rules.
#[derive(Clone, Copy, Debug)]
pub struct EntityRef<'a> {
    pub country: Option<&'a str>,
    pub continent: Option<&'a str>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceEvent {
    /// The continent under the pointer, or none.
    HoverContinent(Option<String>),
    SelectContinent(String),
    ResetFocus,
}

pub trait Surface {
    fn title(&self) -> &'static str;

    fn show(&mut self, ui: &mut egui::Ui, frame: &FrameContext<'_>, tooltip: &mut Tooltip) -> Vec<SurfaceEvent>;

    fn set_opacity(&mut self, _opacity: &dyn Fn(&EntityRef<'_>) -> f32) {}
}

/// Continent emphasis driven from the hierarchy view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FocusPolicy {
    pub hovered: Option<String>,
    pub selected: Option<String>,
}

impl FocusPolicy {
    /// Applies an event; returns whether opacities need recomputing.
    pub fn apply(&mut self, event: &SurfaceEvent) -> bool {
        let before = self.clone();
        match event {
            SurfaceEvent::HoverContinent(c) => self.hovered = c.clone(),
            SurfaceEvent::SelectContinent(c) => self.selected = Some(c.clone()),
            SurfaceEvent::ResetFocus => {
                self.hovered = None;
                self.selected = None;
            }
        }
        *self != before
    }

    /// A missing continent belongs to the hierarchy's "Unknown" node.
    pub fn opacity(&self, continent: Option<&str>, config: &DashboardConfig) -> f32 {
        let continent = continent.unwrap_or(UNKNOWN_CONTINENT);
        if let Some(h) = &self.hovered {
            return if continent == h { 1.0 } else { config.hover_fade_opacity };
        }
        if let Some(s) = &self.selected {
            return if continent == s { 1.0 } else { config.select_fade_opacity };
        }
        1.0
    }
}

/// The one tooltip shared by every view; cleared at the start of each frame.
#[derive(Default, Debug)]
pub struct Tooltip {
    anchor: Option<egui::Pos2>,
    lines: Vec<String>,
}

impl Tooltip {
    pub fn clear(&mut self) {
        self.anchor = None;
        self.lines.clear();
    }

    pub fn set(&mut self, pos: egui::Pos2, lines: Vec<String>) {
        self.anchor = Some(pos);
        self.lines = lines;
    }

    pub fn paint(&self, ctx: &egui::Context) {
        let Some(pos) = self.anchor else { return };
        if self.lines.is_empty() {
            return;
        }
        let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Tooltip, egui::Id::new("dashboard_tooltip")));
        let font = egui::FontId::proportional(12.0);
        let galley = painter.layout_no_wrap(self.lines.join("\n"), font, egui::Color32::WHITE);
        let text_pos = pos + egui::Vec2::new(15.0, -15.0);
        let rect = egui::Rect::from_min_size(text_pos - egui::Vec2::new(0.0, galley.size().y), galley.size()).expand(4.0);
        painter.rect_filled(rect, 3.0, egui::Color32::from_rgba_unmultiplied(0, 0, 0, 200));
        painter.galley(text_pos - egui::Vec2::new(0.0, galley.size().y), galley, egui::Color32::WHITE);
    }
}

/// Groups digits in threes: 1234567 -> "1,234,567".
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 { format!("-{}", out) } else { out }
}

pub fn or_na(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hover_fades_other_continents() {
        let config = DashboardConfig::default();
        let mut focus = FocusPolicy::default();
        assert!(focus.apply(&SurfaceEvent::HoverContinent(Some("Asia".into()))));
        assert_eq!(focus.opacity(Some("Asia"), &config), 1.0);
        assert_eq!(focus.opacity(Some("Europe"), &config), 0.12);
        assert_eq!(focus.opacity(None, &config), 0.12);

        assert!(focus.apply(&SurfaceEvent::HoverContinent(None)));
        assert_eq!(focus.opacity(Some("Europe"), &config), 1.0);
        assert!(!focus.apply(&SurfaceEvent::HoverContinent(None)));
    }

    #[test]
    fn selection_fades_harder_and_resets() {
        let config = DashboardConfig::default();
        let mut focus = FocusPolicy::default();
        focus.apply(&SurfaceEvent::SelectContinent("Africa".into()));
        assert_eq!(focus.opacity(Some("Asia"), &config), config.select_fade_opacity);
        assert!(config.select_fade_opacity < config.hover_fade_opacity);

        focus.apply(&SurfaceEvent::HoverContinent(Some("Asia".into())));
        assert_eq!(focus.opacity(Some("Asia"), &config), 1.0);
        focus.apply(&SurfaceEvent::HoverContinent(None));
        assert_eq!(focus.opacity(Some("Africa"), &config), 1.0);
        assert_eq!(focus.opacity(Some("Asia"), &config), config.select_fade_opacity);

        focus.apply(&SurfaceEvent::ResetFocus);
        assert_eq!(focus.opacity(Some("Asia"), &config), 1.0);
    }

    #[test]
    fn unknown_node_matches_countries_without_a_continent() {
        let config = DashboardConfig::default();
        let mut focus = FocusPolicy::default();
        focus.apply(&SurfaceEvent::HoverContinent(Some(UNKNOWN_CONTINENT.into())));
        assert_eq!(focus.opacity(None, &config), 1.0);
        assert_eq!(focus.opacity(Some("Asia"), &config), config.hover_fade_opacity);

        focus.apply(&SurfaceEvent::HoverContinent(None));
        focus.apply(&SurfaceEvent::SelectContinent(UNKNOWN_CONTINENT.into()));
        assert_eq!(focus.opacity(None, &config), 1.0);
        assert_eq!(focus.opacity(Some("Asia"), &config), config.select_fade_opacity);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1234567.0), "1,234,567");
        assert_eq!(format_thousands(-45000.0), "-45,000");
    }

    #[test]
    fn missing_values_read_na() {
        assert_eq!(or_na(None, |v| format!("{:.1}", v)), "N/A");
        assert_eq!(or_na(Some(41.26), |v| format!("{:.1}", v)), "41.3");
    }
}
