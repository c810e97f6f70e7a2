//! Choropleth of life expectancy at the committed year.
//!
//! The map follows the cursor through the year broadcast and fades fills
//! over a fixed duration of its own, independent of the scatter animation.

use eframe::egui;
use geo::{BoundingRect, Contains, Point, Rect, TriangulateEarcut};
use std::sync::mpsc;

use crate::boundary::GeoFeature;
use crate::broadcast::YearCommitted;
use crate::index::{DerivedIndex, NameMatch};
use crate::math::Equirectangular;
use crate::scale::{lerp_color, Scales};
use crate::surface::{FrameContext, Surface, SurfaceEvent, Tooltip};

/// Triangulated fill of one polygon, holes included.
struct FillMesh {
    vertices: Vec<(f64, f64)>,
    indices: Vec<u32>,
}

impl FillMesh {
    fn new(polygon: &geo::Polygon<f64>) -> Self {
        let raw = polygon.earcut_triangles_raw();
        Self {
            vertices: raw.vertices.chunks_exact(2).map(|c| (c[0], c[1])).collect(),
            indices: raw.triangle_indices.iter().map(|&i| i as u32).collect(),
        }
    }
}

pub struct MapFeature {
    pub feature: GeoFeature,
    /// Normalized record key, when the feature matched a country.
    pub key: Option<String>,
    fills: Vec<FillMesh>,
    bbox: Option<Rect<f64>>,
}

impl MapFeature {
    pub fn new(feature: GeoFeature, index: &DerivedIndex) -> Self {
        let key = index.match_name(&feature.name).key().map(str::to_string);
        let fills = feature.shape.0.iter().map(FillMesh::new).collect();
        let bbox = feature.shape.bounding_rect();
        Self { feature, key, fills, bbox }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let Some(bbox) = self.bbox else { return false };
        if lon < bbox.min().x || lon > bbox.max().x || lat < bbox.min().y || lat > bbox.max().y {
            return false;
        }
        self.feature.shape.contains(&Point::new(lon, lat))
    }
}

/// Fill colours for every feature, fading from the previous year's.
#[derive(Clone, Debug)]
pub struct MapColors {
    from: Vec<egui::Color32>,
    to: Vec<egui::Color32>,
    start_ms: f64,
    duration_ms: f64,
}

impl MapColors {
    pub fn new(colors: Vec<egui::Color32>, duration_ms: f64) -> Self {
        Self { from: colors.clone(), to: colors, start_ms: f64::NEG_INFINITY, duration_ms }
    }

    pub fn retarget(&mut self, colors: Vec<egui::Color32>, now_ms: f64) {
        self.from = self.fills_at(now_ms);
        self.to = colors;
        self.start_ms = now_ms;
    }

    fn progress(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0) as f32
    }

    pub fn fill_at(&self, i: usize, now_ms: f64) -> egui::Color32 {
        lerp_color(self.from[i], self.to[i], self.progress(now_ms))
    }

    pub fn fills_at(&self, now_ms: f64) -> Vec<egui::Color32> {
        (0..self.to.len()).map(|i| self.fill_at(i, now_ms)).collect()
    }

    pub fn is_fading(&self, now_ms: f64) -> bool {
        self.progress(now_ms) < 1.0
    }
}

pub struct MapSurface {
    features: Vec<MapFeature>,
    /// Paint order: features with holes first so enclosed features stay visible.
    order: Vec<usize>,
    colors: MapColors,
    year: i32,
    commits: mpsc::Receiver<YearCommitted>,
    hovered: Option<usize>,
}

fn year_fills(features: &[MapFeature], index: &DerivedIndex, scales: &Scales, year: i32, neutral: egui::Color32) -> Vec<egui::Color32> {
    features
        .iter()
        .map(|f| {
            f.key
                .as_deref()
                .and_then(|k| index.record(k, year))
                .and_then(|r| r.life_exp)
                .map(|life| scales.health_color.color(life))
                .unwrap_or(neutral)
        })
        .collect()
}

impl MapSurface {
    pub fn new(
        features: Vec<GeoFeature>,
        index: &DerivedIndex,
        scales: &Scales,
        neutral: egui::Color32,
        fade_ms: f64,
        commits: mpsc::Receiver<YearCommitted>,
    ) -> Self {
        let features: Vec<MapFeature> = features.into_iter().map(|f| MapFeature::new(f, index)).collect();
        let matched = features.iter().filter(|f| f.key.is_some()).count();
        log::info!("map: {} of {} features matched to records", matched, features.len());
        for f in features.iter().filter(|f| f.key.is_none()) {
            log::debug!("map: no records for {:?}", f.feature.name);
        }
        let mut order: Vec<usize> = (0..features.len()).collect();
        order.sort_by_key(|&i| !features[i].feature.has_holes());
        let year = index.years[0];
        let colors = MapColors::new(year_fills(&features, index, scales, year, neutral), fade_ms);
        Self { features, order, colors, year, commits, hovered: None }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn features(&self) -> &[MapFeature] {
        &self.features
    }

    /// Drains committed years and starts a fade toward the newest one.
    pub fn sync(&mut self, index: &DerivedIndex, scales: &Scales, neutral: egui::Color32, now_ms: f64) {
        let Some(latest) = self.commits.try_iter().last() else { return };
        self.year = latest.year;
        let fills = year_fills(&self.features, index, scales, latest.year, neutral);
        self.colors.retarget(fills, now_ms);
    }

    pub fn fill(&self, i: usize, now_ms: f64) -> egui::Color32 {
        self.colors.fill_at(i, now_ms)
    }

    pub fn is_fading(&self, now_ms: f64) -> bool {
        self.colors.is_fading(now_ms)
    }

    pub fn feature_at(&self, lon: f64, lat: f64) -> Option<usize> {
        self.order.iter().rev().copied().find(|&i| self.features[i].contains(lon, lat))
    }

    fn draw_legend(painter: &egui::Painter, rect: egui::Rect, scales: &Scales, text_color: egui::Color32) {
        let steps = 24;
        let bar = egui::Rect::from_min_size(rect.left_bottom() + egui::vec2(16.0, -36.0), egui::vec2(160.0, 10.0));
        let w = bar.width() / steps as f32;
        let (lo, hi) = scales.health_color.domain;
        for s in 0..steps {
            let t = (s as f64 + 0.5) / steps as f64;
            let cell = egui::Rect::from_min_size(bar.min + egui::vec2(w * s as f32, 0.0), egui::vec2(w + 0.5, bar.height()));
            painter.rect_filled(cell, 0.0, scales.health_color.color(lo + t * (hi - lo)));
        }
        let font = egui::FontId::proportional(11.0);
        painter.text(bar.left_bottom() + egui::vec2(0.0, 2.0), egui::Align2::LEFT_TOP, format!("{:.0}", lo), font.clone(), text_color);
        painter.text(bar.right_bottom() + egui::vec2(0.0, 2.0), egui::Align2::RIGHT_TOP, format!("{:.0}", hi), font.clone(), text_color);
        painter.text(bar.center_top() - egui::vec2(0.0, 2.0), egui::Align2::CENTER_BOTTOM, "Life expectancy", font, text_color);
    }
}

impl Surface for MapSurface {
    fn title(&self) -> &'static str {
        "World Map"
    }

    fn show(&mut self, ui: &mut egui::Ui, frame: &FrameContext<'_>, tooltip: &mut Tooltip) -> Vec<SurfaceEvent> {
        let index = frame.coordinator.index();
        self.sync(index, frame.scales, frame.config.neutral_fill, frame.now_ms);

        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
        let rect = response.rect;
        let projection = Equirectangular::fit(rect.width() as f64, rect.height() as f64);
        let to_screen = |(lon, lat): (f64, f64)| {
            let (x, y) = projection.project(lon, lat);
            rect.min + egui::vec2(x as f32, y as f32)
        };

        self.hovered = response.hover_pos().and_then(|p| {
            let (lon, lat) = projection.invert((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64);
            self.feature_at(lon, lat)
        });

        let border = egui::Stroke::new(0.5, ui.visuals().window_fill());
        for &i in &self.order {
            let f = &self.features[i];
            let fill = self.fill(i, frame.now_ms);
            for (polygon, fill_mesh) in f.feature.shape.0.iter().zip(&f.fills) {
                let mut mesh = egui::Mesh::default();
                for &p in &fill_mesh.vertices {
                    mesh.colored_vertex(to_screen(p), fill);
                }
                for t in fill_mesh.indices.chunks_exact(3) {
                    mesh.add_triangle(t[0], t[1], t[2]);
                }
                painter.add(egui::Shape::mesh(mesh));
                for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                    let points = ring.coords().map(|c| to_screen((c.x, c.y))).collect();
                    painter.add(egui::Shape::closed_line(points, border));
                }
            }
        }

        if let Some(i) = self.hovered {
            let f = &self.features[i];
            let outline = egui::Stroke::new(1.5, ui.visuals().strong_text_color());
            for polygon in &f.feature.shape.0 {
                let points = polygon.exterior().coords().map(|c| to_screen((c.x, c.y))).collect();
                painter.add(egui::Shape::closed_line(points, outline));
            }
            if let Some(pos) = response.hover_pos() {
                let life = f.key.as_deref().and_then(|k| index.record(k, self.year)).and_then(|r| r.life_exp);
                let detail = match life {
                    Some(v) => format!("Life expectancy: {:.1}", v),
                    None => "No data".to_string(),
                };
                tooltip.set(pos, vec![f.feature.name.clone(), format!("Year: {}", self.year), detail]);
            }
        }

        Self::draw_legend(&painter, rect, frame.scales, ui.visuals().text_color());
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::Record;
    use geo::{Area, LineString, MultiPolygon, Polygon};

    fn feature(name: &str, polygon: Polygon<f64>) -> GeoFeature {
        GeoFeature { id: name.into(), name: name.into(), shape: MultiPolygon(vec![polygon]) }
    }

    fn square(name: &str, x: f64) -> GeoFeature {
        let ring = vec![(x, 0.0), (x + 10.0, 0.0), (x + 10.0, 10.0), (x, 10.0)];
        feature(name, Polygon::new(LineString::from(ring), vec![]))
    }

    fn filled_area(f: &MapFeature) -> f64 {
        f.fills
            .iter()
            .flat_map(|m| {
                m.indices.chunks_exact(3).map(move |t| {
                    let [a, b, c] = [t[0], t[1], t[2]].map(|i| m.vertices[i as usize]);
                    ((b.0 - a.0) * (c.1 - a.1) - (c.0 - a.0) * (b.1 - a.1)).abs() / 2.0
                })
            })
            .sum()
    }

    fn index() -> DerivedIndex {
        let rec = |year, life| Record {
            country: "Chad".into(),
            continent: Some("Africa".into()),
            year,
            life_exp: life,
            pop: Some(1.0),
            gdp_percap: Some(1.0),
        };
        DerivedIndex::build(&[rec(1952, Some(40.0)), rec(1957, Some(60.0)), rec(1962, None)]).unwrap()
    }

    #[test]
    fn fades_toward_the_committed_year() {
        let index = index();
        let config = DashboardConfig::default();
        let scales = Scales::new(&index.extents, &index.continents, 100.0, 100.0, &config);
        let (tx, rx) = mpsc::channel();
        let mut map = MapSurface::new(vec![square("Chad", 0.0), square("Atlantis", 20.0)], &index, &scales, config.neutral_fill, 750.0, rx);

        assert_eq!(map.features()[0].key.as_deref(), Some("chad"));
        assert_eq!(map.features()[1].key, None);
        assert_eq!(map.fill(0, 0.0), config.life_low_color);
        assert_eq!(map.fill(1, 0.0), config.neutral_fill);

        tx.send(YearCommitted { year: 1957, index: 1 }).unwrap();
        map.sync(&index, &scales, config.neutral_fill, 1000.0);
        assert_eq!(map.year(), 1957);
        assert!(map.is_fading(1000.0));
        assert_eq!(map.fill(0, 1000.0), config.life_low_color);
        assert_eq!(map.fill(0, 1750.0), config.life_high_color);
        assert!(!map.is_fading(1750.0));

        tx.send(YearCommitted { year: 1962, index: 2 }).unwrap();
        map.sync(&index, &scales, config.neutral_fill, 2000.0);
        assert_eq!(map.fill(0, 3000.0), config.neutral_fill);
    }

    #[test]
    fn hit_test_finds_feature() {
        let index = index();
        let config = DashboardConfig::default();
        let scales = Scales::new(&index.extents, &index.continents, 100.0, 100.0, &config);
        let (_tx, rx) = mpsc::channel();
        let map = MapSurface::new(vec![square("Chad", 0.0), square("Atlantis", 20.0)], &index, &scales, config.neutral_fill, 750.0, rx);
        assert_eq!(map.feature_at(5.0, 5.0), Some(0));
        assert_eq!(map.feature_at(25.0, 5.0), Some(1));
        assert_eq!(map.feature_at(15.0, 5.0), None);
    }

    #[test]
    fn pinched_ring_fills_only_its_own_area() {
        let ring: Vec<(f64, f64)> = vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 2.0), (3.0, 4.0), (1.0, 4.0), (2.0, 2.0), (0.0, 4.0)];
        let shape = Polygon::new(LineString::from(ring), vec![]);
        assert!((shape.unsigned_area() - 14.0).abs() < 1e-9);
        let f = MapFeature::new(feature("Pinch", shape), &index());
        assert!((filled_area(&f) - 14.0).abs() < 1e-9);
        assert!(f.contains(2.0, 3.5));
        assert!(!f.contains(0.5, 3.9));
    }

    #[test]
    fn holes_are_neither_filled_nor_hit() {
        let outer = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let hole = LineString::from(vec![(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        let f = MapFeature::new(feature("Ring", Polygon::new(outer, vec![hole])), &index());
        assert!((filled_area(&f) - 12.0).abs() < 1e-9);
        assert!(f.contains(0.5, 0.5));
        assert!(!f.contains(2.0, 2.0));
        assert!(!f.contains(5.0, 2.0));
    }

    #[test]
    fn fade_restarts_from_the_current_blend() {
        let mut colors = MapColors::new(vec![egui::Color32::BLACK], 100.0);
        colors.retarget(vec![egui::Color32::WHITE], 0.0);
        colors.retarget(vec![egui::Color32::BLACK], 50.0);
        assert_eq!(colors.fill_at(0, 50.0).r(), 128);
        assert_eq!(colors.fill_at(0, 150.0), egui::Color32::BLACK);
    }
}
