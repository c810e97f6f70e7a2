//! Dashboard state and per-tab rendering.
//!
//! Owns the coordinator, the shared scales, and the three views. Each tab
//! renders one view; focus events coming back from a view are folded into
//! the `FocusPolicy` and pushed to the scatter plot as opacities.

use std::sync::Arc;

use eframe::egui;
use egui_dock::tab_viewer::OnCloseResponse;
use egui_dock::TabViewer;

use crate::config::DashboardConfig;
use crate::coordinator::{Coordinator, Timing};
use crate::loader::Dataset;
use crate::map::MapSurface;
use crate::scale::Scales;
use crate::scatter::ScatterSurface;
use crate::settings::Scrubber;
use crate::sunburst::SunburstSurface;
use crate::surface::{EntityRef, FocusPolicy, FrameContext, Surface, SurfaceEvent, Tooltip};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Scatter,
    Map,
    Hierarchy,
}

pub struct Dashboard {
    pub(crate) config: DashboardConfig,
    pub(crate) coordinator: Coordinator,
    pub(crate) scales: Scales,
    scatter: ScatterSurface,
    map: MapSurface,
    sunburst: SunburstSurface,
    pub(crate) scrubber: Scrubber,
    focus: FocusPolicy,
    pub(crate) tooltip: Tooltip,
    pub(crate) now_ms: f64,
}

impl Dashboard {
    pub fn new(dataset: Dataset, config: DashboardConfig) -> Self {
        let Dataset { index, features } = dataset;
        let scales = Scales::new(&index.extents, &index.continents, 1.0, 1.0, &config);
        let scatter = ScatterSurface::new(&index);
        let sunburst = SunburstSurface::new(&index);
        let index = Arc::new(index);
        let mut coordinator =
            Coordinator::new(index.clone(), scales.sentinel(), config.step_duration_ms, Timing::from(&config));
        let map = MapSurface::new(
            features,
            &index,
            &scales,
            config.neutral_fill,
            config.map_fade_ms as f64,
            coordinator.subscribe(),
        );
        let scrubber = Scrubber::new(coordinator.subscribe());
        Self {
            config,
            coordinator,
            scales,
            scatter,
            map,
            sunburst,
            scrubber,
            focus: FocusPolicy::default(),
            tooltip: Tooltip::default(),
            now_ms: 0.0,
        }
    }

    /// Advances the clock and the coordinator. Called once per frame before any drawing.
    pub fn tick(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
        self.tooltip.clear();
        self.coordinator.tick(now_ms);
    }

    pub fn needs_repaint(&self) -> bool {
        self.coordinator.is_animating() || self.coordinator.cursor().is_playing || self.map.is_fading(self.now_ms)
    }

    pub fn handle_events(&mut self, events: Vec<SurfaceEvent>) {
        let mut changed = false;
        for event in &events {
            changed |= self.focus.apply(event);
        }
        if changed {
            log::debug!("focus now {:?}", self.focus);
            let focus = &self.focus;
            let config = &self.config;
            self.scatter.set_opacity(&|e: &EntityRef<'_>| focus.opacity(e.continent, config));
        }
    }

    pub fn focus(&self) -> &FocusPolicy {
        &self.focus
    }

    fn surface(&self, tab: Tab) -> &dyn Surface {
        match tab {
            Tab::Scatter => &self.scatter,
            Tab::Map => &self.map,
            Tab::Hierarchy => &self.sunburst,
        }
    }

    fn render_tab(&mut self, ui: &mut egui::Ui, tab: Tab) {
        let mut tooltip = std::mem::take(&mut self.tooltip);
        let events = {
            let frame = FrameContext {
                coordinator: &self.coordinator,
                scales: &self.scales,
                config: &self.config,
                now_ms: self.now_ms,
            };
            match tab {
                Tab::Scatter => self.scatter.show(ui, &frame, &mut tooltip),
                Tab::Map => self.map.show(ui, &frame, &mut tooltip),
                Tab::Hierarchy => self.sunburst.show(ui, &frame, &mut tooltip),
            }
        };
        self.tooltip = tooltip;
        self.handle_events(events);
    }
}

impl TabViewer for Dashboard {
    type Tab = Tab;

    fn title(&mut self, tab: &mut Self::Tab) -> egui::WidgetText {
        self.surface(*tab).title().into()
    }

    fn ui(&mut self, ui: &mut egui::Ui, tab: &mut Self::Tab) {
        self.render_tab(ui, *tab);
    }

    fn scroll_bars(&self, _tab: &Self::Tab) -> [bool; 2] {
        [false, false]
    }

    fn closeable(&mut self, _tab: &mut Self::Tab) -> bool {
        false
    }

    fn on_close(&mut self, _tab: &mut Self::Tab) -> OnCloseResponse {
        OnCloseResponse::Ignore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::GeoFeature;
    use crate::data::Record;
    use crate::hierarchy::UNKNOWN_CONTINENT;
    use crate::index::DerivedIndex;
    use geo::{LineString, MultiPolygon, Polygon};

    fn rec(country: &str, continent: Option<&str>, year: i32) -> Record {
        Record {
            country: country.into(),
            continent: continent.map(str::to_string),
            year,
            life_exp: Some(50.0),
            pop: Some(1e6),
            gdp_percap: Some(1000.0),
        }
    }

    fn dataset() -> Dataset {
        dataset_with(vec![
            rec("Kenya", Some("Africa"), 1952),
            rec("Japan", Some("Asia"), 1952),
            rec("Japan", Some("Asia"), 1957),
        ])
    }

    fn dataset_with(records: Vec<Record>) -> Dataset {
        let features = vec![GeoFeature {
            id: "392".into(),
            name: "Japan".into(),
            shape: MultiPolygon(vec![Polygon::new(
                LineString::from(vec![(130.0, 31.0), (142.0, 31.0), (142.0, 45.0)]),
                vec![],
            )]),
        }];
        Dataset { index: DerivedIndex::build(&records).unwrap(), features }
    }

    #[test]
    fn hierarchy_events_fade_the_scatter_plot() {
        let mut d = Dashboard::new(dataset(), DashboardConfig::default());
        d.handle_events(vec![SurfaceEvent::SelectContinent("Asia".into())]);
        assert_eq!(d.scatter.opacity_of("Japan"), 1.0);
        assert_eq!(d.scatter.opacity_of("Kenya"), d.config.select_fade_opacity);

        d.handle_events(vec![SurfaceEvent::HoverContinent(Some("Africa".into()))]);
        assert_eq!(d.scatter.opacity_of("Kenya"), 1.0);
        assert_eq!(d.scatter.opacity_of("Japan"), d.config.hover_fade_opacity);

        d.handle_events(vec![SurfaceEvent::HoverContinent(None), SurfaceEvent::ResetFocus]);
        assert_eq!(d.focus(), &FocusPolicy::default());
        assert_eq!(d.scatter.opacity_of("Kenya"), 1.0);
    }

    #[test]
    fn hovering_unknown_keeps_countries_without_a_continent() {
        let data = dataset_with(vec![rec("Japan", Some("Asia"), 1952), rec("Atlantis", None, 1952)]);
        let mut d = Dashboard::new(data, DashboardConfig::default());
        d.handle_events(vec![SurfaceEvent::HoverContinent(Some(UNKNOWN_CONTINENT.into()))]);
        assert_eq!(d.scatter.opacity_of("Atlantis"), 1.0);
        assert_eq!(d.scatter.opacity_of("Japan"), d.config.hover_fade_opacity);
    }

    #[test]
    fn map_and_scrubber_follow_commits() {
        let mut d = Dashboard::new(dataset(), DashboardConfig::default());
        assert!(!d.needs_repaint());
        assert!(d.coordinator.go_to_year(1957, 0.0));
        d.tick(500.0);
        assert_eq!(d.coordinator.current_year(), 1952);
        d.tick(1000.0);
        assert_eq!(d.coordinator.current_year(), 1957);
        d.scrubber.sync();
        assert_eq!(d.scrubber.handle_index(), 1);
        d.map.sync(d.coordinator.index(), &d.scales, d.config.neutral_fill, 1000.0);
        assert_eq!(d.map.year(), 1957);
        assert!(d.needs_repaint());
    }

    #[test]
    fn every_tab_has_a_title() {
        let d = Dashboard::new(dataset(), DashboardConfig::default());
        assert_eq!(d.surface(Tab::Scatter).title(), "Wealth & Health");
        assert_eq!(d.surface(Tab::Map).title(), "World Map");
        assert_eq!(d.surface(Tab::Hierarchy).title(), "Continents");
    }
}
