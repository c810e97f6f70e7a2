//! Dashboard configuration.
//!
//! Every tunable lives in `DashboardConfig`: resource locations, timeline
//! durations, chart margins, and the colour palette. There is no config
//! file; native builds may override the two resource locations through
//! the environment.

use eframe::egui::Color32;

pub const DEFAULT_RECORDS_URL: &str = "https://raw.githubusercontent.com/plotly/datasets/master/gapminderDataFiveYear.csv";
pub const DEFAULT_GEO_URL: &str = "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json";

pub const RECORDS_ENV: &str = "GAPVIZ_RECORDS";
pub const GEO_ENV: &str = "GAPVIZ_GEO";

/// Per-year step durations offered by the speed selector, in milliseconds.
pub const SPEED_PRESETS_MS: [u32; 4] = [250, 500, 1000, 2000];

pub const CONTINENT_PALETTE: [Color32; 10] = [
    Color32::from_rgb(78, 121, 167),
    Color32::from_rgb(242, 142, 44),
    Color32::from_rgb(225, 87, 89),
    Color32::from_rgb(118, 183, 178),
    Color32::from_rgb(89, 161, 79),
    Color32::from_rgb(237, 201, 73),
    Color32::from_rgb(175, 122, 161),
    Color32::from_rgb(255, 157, 167),
    Color32::from_rgb(156, 117, 95),
    Color32::from_rgb(186, 176, 171),
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub records_url: String,
    pub geo_url: String,
    pub step_duration_ms: u32,
    /// Slack added between play-loop steps so a transition completes before the next one starts.
    pub inter_frame_gap_ms: u32,
    pub step_transition_ms: u32,
    pub scrub_transition_ms: u32,
    pub map_fade_ms: u32,
    pub margins: Margins,
    pub radius_range: (f32, f32),
    pub hover_fade_opacity: f32,
    pub select_fade_opacity: f32,
    pub life_low_color: Color32,
    pub life_high_color: Color32,
    pub neutral_fill: Color32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            records_url: DEFAULT_RECORDS_URL.to_string(),
            geo_url: DEFAULT_GEO_URL.to_string(),
            step_duration_ms: 1000,
            inter_frame_gap_ms: 100,
            step_transition_ms: 300,
            scrub_transition_ms: 0,
            map_fade_ms: 750,
            margins: Margins { top: 20.0, right: 30.0, bottom: 50.0, left: 60.0 },
            radius_range: (3.0, 42.0),
            hover_fade_opacity: 0.12,
            select_fade_opacity: 0.04,
            life_low_color: Color32::from_rgb(215, 48, 39),
            life_high_color: Color32::from_rgb(26, 152, 80),
            neutral_fill: Color32::from_rgb(204, 204, 204),
        }
    }
}

impl DashboardConfig {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(RECORDS_ENV) {
            if !url.trim().is_empty() {
                config.records_url = url;
            }
        }
        if let Ok(url) = std::env::var(GEO_ENV) {
            if !url.trim().is_empty() {
                config.geo_url = url;
            }
        }
        config
    }
}
