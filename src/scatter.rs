//! Animated bubble chart: wealth on a log x axis, health on y, population as area.

use eframe::egui;
use std::collections::HashMap;

use crate::index::DerivedIndex;
use crate::scale::{with_opacity, LinearScale, Scales};
use crate::surface::{format_thousands, or_na, EntityRef, FrameContext, Surface, SurfaceEvent, Tooltip};

const BUBBLE_ALPHA: f32 = 0.8;

pub struct ScatterSurface {
    /// Country and its continent, for opacity rules.
    entities: Vec<(String, Option<String>)>,
    opacity: HashMap<String, f32>,
}

struct Bubble<'a> {
    country: &'a str,
    continent: Option<&'a str>,
    center: egui::Pos2,
    radius: f32,
}

fn format_dollars(v: f64) -> String {
    if v >= 1000.0 {
        format!("${}k", format_thousands(v / 1000.0))
    } else {
        format!("${}", format_thousands(v))
    }
}

fn linear_ticks(scale: &LinearScale, step: f64) -> Vec<f64> {
    let first = (scale.domain.0 / step).ceil() as i64;
    let last = (scale.domain.1 / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

impl ScatterSurface {
    pub fn new(index: &DerivedIndex) -> Self {
        let entities = index
            .countries
            .iter()
            .map(|c| (c.clone(), index.continent_of(c).map(str::to_string)))
            .collect();
        Self { entities, opacity: HashMap::new() }
    }

    pub fn opacity_of(&self, country: &str) -> f32 {
        self.opacity.get(country).copied().unwrap_or(1.0)
    }

    fn draw_axes(painter: &egui::Painter, plot: egui::Rect, scales: &Scales, axis_color: egui::Color32) {
        let grid = egui::Stroke::new(0.5, axis_color.gamma_multiply(0.3));
        let font = egui::FontId::proportional(11.0);
        for tick in scales.wealth.ticks() {
            let Some(x) = scales.wealth.map(tick) else { continue };
            let x = plot.left() + x;
            painter.line_segment([egui::pos2(x, plot.top()), egui::pos2(x, plot.bottom())], grid);
            painter.text(egui::pos2(x, plot.bottom() + 4.0), egui::Align2::CENTER_TOP, format_dollars(tick), font.clone(), axis_color);
        }
        for tick in linear_ticks(&scales.health, 10.0) {
            let y = plot.top() + scales.health.map(tick);
            painter.line_segment([egui::pos2(plot.left(), y), egui::pos2(plot.right(), y)], grid);
            painter.text(egui::pos2(plot.left() - 6.0, y), egui::Align2::RIGHT_CENTER, format!("{}", tick), font.clone(), axis_color);
        }
        painter.rect_stroke(plot, 0.0, egui::Stroke::new(1.0, axis_color.gamma_multiply(0.6)), egui::StrokeKind::Inside);
        painter.text(
            egui::pos2(plot.center().x, plot.bottom() + 22.0),
            egui::Align2::CENTER_TOP,
            "GDP per capita (log scale)",
            font.clone(),
            axis_color,
        );
        painter.text(
            egui::pos2(plot.left() + 6.0, plot.top() + 4.0),
            egui::Align2::LEFT_TOP,
            "Life expectancy (years)",
            font,
            axis_color,
        );
    }

    fn draw_legend(painter: &egui::Painter, plot: egui::Rect, scales: &Scales, text_color: egui::Color32) {
        let font = egui::FontId::proportional(11.0);
        let mut y = plot.top() + 10.0;
        for (continent, color) in scales.category.entries() {
            let x = plot.right() - 110.0;
            painter.circle_filled(egui::pos2(x, y), 5.0, color);
            painter.text(egui::pos2(x + 10.0, y), egui::Align2::LEFT_CENTER, continent, font.clone(), text_color);
            y += 16.0;
        }
    }
}

impl Surface for ScatterSurface {
    fn title(&self) -> &'static str {
        "Wealth & Health"
    }

    fn show(&mut self, ui: &mut egui::Ui, frame: &FrameContext<'_>, tooltip: &mut Tooltip) -> Vec<SurfaceEvent> {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
        let m = frame.config.margins;
        let plot = egui::Rect::from_min_max(
            response.rect.min + egui::vec2(m.left, m.top),
            response.rect.max - egui::vec2(m.right, m.bottom),
        );
        if plot.width() <= 0.0 || plot.height() <= 0.0 {
            return Vec::new();
        }
        let scales = frame.scales.resized(plot.width(), plot.height());
        let text_color = ui.visuals().text_color();

        let year = frame.coordinator.current_year();
        painter.text(
            plot.center(),
            egui::Align2::CENTER_CENTER,
            year.to_string(),
            egui::FontId::proportional((plot.height() * 0.35).clamp(24.0, 220.0)),
            text_color.gamma_multiply(0.08),
        );
        Self::draw_axes(&painter, plot, &scales, text_color);

        let mut bubbles: Vec<Bubble<'_>> = frame
            .coordinator
            .display()
            .filter(|(_, s)| s.visible)
            .filter_map(|(country, s)| {
                let x = scales.wealth.map(s.gdp_percap)?;
                let y = scales.health.map(s.life_exp);
                Some(Bubble {
                    country,
                    continent: s.continent.as_deref(),
                    center: plot.min + egui::vec2(x, y),
                    radius: scales.size.map(s.pop),
                })
            })
            .collect();
        bubbles.sort_by(|a, b| b.radius.total_cmp(&a.radius));

        let hovered = response.hover_pos().and_then(|p| {
            bubbles
                .iter()
                .rev()
                .find(|b| b.center.distance(p) <= b.radius.max(3.0) && self.opacity_of(b.country) > 0.5)
                .map(|b| b.country)
        });

        let clip = painter.with_clip_rect(plot);
        for b in &bubbles {
            let opacity = self.opacity_of(b.country);
            let color = scales.category.color(b.continent);
            clip.circle_filled(b.center, b.radius, with_opacity(color, BUBBLE_ALPHA * opacity));
            let outline = if hovered == Some(b.country) {
                egui::Stroke::new(2.0, text_color)
            } else {
                egui::Stroke::new(0.5, with_opacity(egui::Color32::from_gray(40), opacity))
            };
            clip.circle_stroke(b.center, b.radius, outline);
        }
        Self::draw_legend(&painter, plot, &scales, text_color);

        if let (Some(country), Some(pos)) = (hovered, response.hover_pos()) {
            let index = frame.coordinator.index();
            let record = index.record(country, year);
            tooltip.set(
                pos,
                vec![
                    country.to_string(),
                    format!("Continent: {}", index.continent_of(country).unwrap_or("N/A")),
                    format!("Year: {}", year),
                    format!("Life expectancy: {}", or_na(record.and_then(|r| r.life_exp), |v| format!("{:.1}", v))),
                    format!("GDP per capita: {}", or_na(record.and_then(|r| r.gdp_percap), |v| format!("${}", format_thousands(v)))),
                    format!("Population: {}", or_na(record.and_then(|r| r.pop), format_thousands)),
                ],
            );
        }
        Vec::new()
    }

    fn set_opacity(&mut self, opacity: &dyn Fn(&EntityRef<'_>) -> f32) {
        self.opacity = self
            .entities
            .iter()
            .map(|(country, continent)| {
                let entity = EntityRef { country: Some(country), continent: continent.as_deref() };
                (country.clone(), opacity(&entity))
            })
            .collect();
    }
}
