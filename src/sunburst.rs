//! Continent/country sunburst. Drives continent focus for the other views.

use eframe::egui;
use std::f64::consts::TAU;

use crate::hierarchy::{HierarchyNode, NodePath, SunburstArc, SunburstLayout};
use crate::index::DerivedIndex;
use crate::scale::{lerp_color, CategoryPalette};
use crate::surface::{FrameContext, Surface, SurfaceEvent, Tooltip};

const COUNTRY_TINT: f32 = 0.35;
const SEGMENTS_PER_TURN: f64 = 180.0;

pub struct SunburstSurface {
    layout: SunburstLayout,
    hovered: Option<NodePath>,
}

/// Fill for an arc: continents take their palette colour, countries a lighter tint of it.
pub fn arc_color(arc: &SunburstArc, palette: &CategoryPalette, root: egui::Color32) -> egui::Color32 {
    match &arc.path {
        NodePath::Root => root,
        NodePath::Continent(c) => palette.color(Some(c)),
        NodePath::Country { continent, .. } => lerp_color(palette.color(Some(continent)), egui::Color32::WHITE, COUNTRY_TINT),
    }
}

/// What a pointer interaction on `arc` means for the other views.
pub fn hover_event(arc: Option<&SunburstArc>) -> SurfaceEvent {
    SurfaceEvent::HoverContinent(match arc.map(|a| &a.path) {
        Some(NodePath::Continent(c)) => Some(c.clone()),
        _ => None,
    })
}

pub fn click_event(arc: &SunburstArc) -> Option<SurfaceEvent> {
    match &arc.path {
        NodePath::Root => Some(SurfaceEvent::ResetFocus),
        NodePath::Continent(c) => Some(SurfaceEvent::SelectContinent(c.clone())),
        NodePath::Country { .. } => None,
    }
}

fn polar(center: egui::Pos2, r: f32, angle: f64) -> egui::Pos2 {
    let (s, c) = angle.sin_cos();
    center + egui::vec2(r * s as f32, -r * c as f32)
}

fn annular_sector(center: egui::Pos2, inner: f32, outer: f32, start: f64, end: f64, color: egui::Color32) -> egui::Mesh {
    let mut mesh = egui::Mesh::default();
    let n = (((end - start) / TAU) * SEGMENTS_PER_TURN).ceil().max(1.0) as u32;
    for k in 0..=n {
        let a = start + (end - start) * k as f64 / n as f64;
        mesh.colored_vertex(polar(center, inner, a), color);
        mesh.colored_vertex(polar(center, outer, a), color);
    }
    for k in 0..n {
        let i = 2 * k;
        mesh.add_triangle(i, i + 1, i + 3);
        mesh.add_triangle(i, i + 3, i + 2);
    }
    mesh
}

impl SunburstSurface {
    pub fn new(index: &DerivedIndex) -> Self {
        let root = HierarchyNode::build(index);
        log::info!("hierarchy: {} continents, {} countries", root.children.len(), root.value);
        Self { layout: SunburstLayout::new(&root), hovered: None }
    }

    pub fn layout(&self) -> &SunburstLayout {
        &self.layout
    }
}

impl Surface for SunburstSurface {
    fn title(&self) -> &'static str {
        "Continents"
    }

    fn show(&mut self, ui: &mut egui::Ui, frame: &FrameContext<'_>, tooltip: &mut Tooltip) -> Vec<SurfaceEvent> {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click());
        let rect = response.rect;
        let center = rect.center();
        let radius = (rect.width().min(rect.height()) * 0.5 - 12.0).max(0.0);
        if radius <= 0.0 || self.layout.rings == 0 {
            return Vec::new();
        }
        let ring_width = radius / self.layout.rings as f32;
        let root_fill = ui.visuals().extreme_bg_color;
        let palette = &frame.scales.category;

        let hit = response.hover_pos().and_then(|p| {
            let d = p - center;
            self.layout.hit(d.x as f64, d.y as f64, radius as f64)
        });
        self.hovered = hit.map(|a| a.path.clone());

        let edge = egui::Stroke::new(1.0, ui.visuals().window_fill());
        for arc in &self.layout.arcs {
            let inner = ring_width * arc.depth as f32;
            let outer = inner + ring_width;
            let mut fill = arc_color(arc, palette, root_fill);
            if self.hovered.as_ref() == Some(&arc.path) {
                fill = lerp_color(fill, egui::Color32::WHITE, 0.25);
            }
            if arc.depth == 0 {
                painter.circle(center, outer, fill, edge);
                painter.text(center, egui::Align2::CENTER_CENTER, &arc.name, egui::FontId::proportional(13.0), ui.visuals().text_color());
                continue;
            }
            painter.add(egui::Shape::mesh(annular_sector(center, inner, outer, arc.start, arc.end, fill)));
            painter.line_segment([polar(center, inner, arc.start), polar(center, outer, arc.start)], edge);
            if arc.depth == 1 && (arc.end - arc.start) > 0.25 {
                let label_at = polar(center, inner + ring_width * 0.5, (arc.start + arc.end) * 0.5);
                painter.text(label_at, egui::Align2::CENTER_CENTER, &arc.name, egui::FontId::proportional(11.0), egui::Color32::BLACK);
            }
        }

        let mut events = vec![hover_event(hit)];
        if let (Some(arc), Some(pos)) = (hit, response.hover_pos()) {
            let detail = match arc.path {
                NodePath::Country { ref continent, .. } => continent.clone(),
                _ => format!("{} countries", arc.value),
            };
            tooltip.set(pos, vec![arc.name.clone(), detail]);
            if response.clicked() {
                events.extend(click_event(arc));
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;

    fn index() -> DerivedIndex {
        let rec = |country: &str, continent: &str| Record {
            country: country.into(),
            continent: Some(continent.into()),
            year: 1952,
            life_exp: Some(40.0),
            pop: Some(1.0),
            gdp_percap: Some(1.0),
        };
        DerivedIndex::build(&[rec("Kenya", "Africa"), rec("Chad", "Africa"), rec("Japan", "Asia")]).unwrap()
    }

    #[test]
    fn continent_arcs_drive_focus() {
        let surface = SunburstSurface::new(&index());
        let layout = surface.layout();
        // Africa covers the first two thirds, clockwise from twelve o'clock.
        let africa = layout.hit(50.0, 0.0, 90.0).unwrap();
        assert_eq!(africa.path, NodePath::Continent("Africa".into()));
        assert_eq!(hover_event(Some(africa)), SurfaceEvent::HoverContinent(Some("Africa".into())));
        assert_eq!(click_event(africa), Some(SurfaceEvent::SelectContinent("Africa".into())));

        let root = layout.hit(0.0, 0.0, 90.0).unwrap();
        assert_eq!(click_event(root), Some(SurfaceEvent::ResetFocus));
        assert_eq!(hover_event(Some(root)), SurfaceEvent::HoverContinent(None));
        assert_eq!(hover_event(None), SurfaceEvent::HoverContinent(None));
    }

    #[test]
    fn countries_are_a_lighter_tint_of_their_continent() {
        let index = index();
        let palette = CategoryPalette::new(&index.continents);
        let surface = SunburstSurface::new(&index);
        let country = surface.layout().arcs.iter().find(|a| a.name == "Japan").unwrap();
        assert_eq!(click_event(country), None);
        let continent_color = palette.color(Some("Asia"));
        let tint = arc_color(country, &palette, egui::Color32::BLACK);
        assert_eq!(tint, lerp_color(continent_color, egui::Color32::WHITE, COUNTRY_TINT));
        assert_ne!(tint, continent_color);
    }

    #[test]
    fn sector_mesh_is_closed_strip() {
        let mesh = annular_sector(egui::pos2(0.0, 0.0), 10.0, 20.0, 0.0, TAU / 4.0, egui::Color32::RED);
        let n = 45;
        assert_eq!(mesh.vertices.len(), 2 * (n + 1));
        assert_eq!(mesh.indices.len(), 6 * n);
    }
}
