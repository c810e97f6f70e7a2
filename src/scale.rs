//! Value-to-visual-channel mappings.
//!
//! Domains are fixed once from the global extents; nothing here is
//! recomputed per frame.

use eframe::egui::Color32;

use crate::config::{DashboardConfig, CONTINENT_PALETTE};
use crate::index::Extents;
use crate::interpolate::Sentinel;

pub const LIFE_PADDING: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f32, f32),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    /// Position of `v` within the domain, 0..1 inside it.
    pub fn normalize(&self, v: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span.abs() < f64::EPSILON { 0.5 } else { (v - self.domain.0) / span }
    }

    pub fn map(&self, v: f64) -> f32 {
        let t = self.normalize(v) as f32;
        self.range.0 + t * (self.range.1 - self.range.0)
    }

    pub fn invert(&self, px: f32) -> f64 {
        let span = self.range.1 - self.range.0;
        let t = if span.abs() < f32::EPSILON { 0.5 } else { ((px - self.range.0) / span) as f64 };
        self.domain.0 + t * (self.domain.1 - self.domain.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogScale {
    pub domain: (f64, f64),
    pub range: (f32, f32),
}

impl LogScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    /// `None` for values the logarithm is undefined on; those are drawn off-scale.
    pub fn map(&self, v: f64) -> Option<f32> {
        if v <= 0.0 || !v.is_finite() {
            return None;
        }
        let (lo, hi) = (self.domain.0.ln(), self.domain.1.ln());
        let t = if (hi - lo).abs() < f64::EPSILON { 0.5 } else { (v.ln() - lo) / (hi - lo) };
        Some(self.range.0 + t as f32 * (self.range.1 - self.range.0))
    }

    /// Powers of ten inside the domain, for gridlines.
    pub fn ticks(&self) -> Vec<f64> {
        let lo = self.domain.0.log10().ceil() as i32;
        let hi = self.domain.1.log10().floor() as i32;
        (lo..=hi).map(|e| 10f64.powi(e)).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SqrtScale {
    pub domain: (f64, f64),
    pub range: (f32, f32),
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    /// Radius for a value; area grows linearly with the value. Never negative.
    pub fn map(&self, v: f64) -> f32 {
        let (lo, hi) = (self.domain.0.max(0.0).sqrt(), self.domain.1.max(0.0).sqrt());
        let t = if (hi - lo).abs() < f64::EPSILON { 0.5 } else { (v.max(0.0).sqrt() - lo) / (hi - lo) };
        (self.range.0 + t as f32 * (self.range.1 - self.range.0)).max(0.0)
    }
}

/// Fixed colour per continent, assigned over the sorted continent list.
#[derive(Clone, Debug)]
pub struct CategoryPalette {
    continents: Vec<String>,
}

impl CategoryPalette {
    pub fn new(continents: &[String]) -> Self {
        let mut continents = continents.to_vec();
        continents.sort();
        continents.dedup();
        Self { continents }
    }

    pub fn color(&self, continent: Option<&str>) -> Color32 {
        continent
            .and_then(|c| self.continents.iter().position(|k| k == c))
            .map(|i| CONTINENT_PALETTE[i % CONTINENT_PALETTE.len()])
            .unwrap_or(Color32::GRAY)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, Color32)> {
        self.continents.iter().map(|c| (c.as_str(), self.color(Some(c))))
    }
}

pub fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgba_unmultiplied(mix(a.r(), b.r()), mix(a.g(), b.g()), mix(a.b(), b.b()), mix(a.a(), b.a()))
}

pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let a = (color.a() as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), a)
}

/// Continuous life-expectancy colour for the map.
#[derive(Clone, Copy, Debug)]
pub struct SequentialColor {
    pub domain: (f64, f64),
    pub low: Color32,
    pub high: Color32,
}

impl SequentialColor {
    pub fn color(&self, v: f64) -> Color32 {
        let span = self.domain.1 - self.domain.0;
        let t = if span.abs() < f64::EPSILON { 0.5 } else { (v - self.domain.0) / span };
        lerp_color(self.low, self.high, t as f32)
    }
}

/// Every channel the dashboard encodes, built once at load time.
#[derive(Clone, Debug)]
pub struct Scales {
    pub wealth: LogScale,
    pub health: LinearScale,
    pub size: SqrtScale,
    pub category: CategoryPalette,
    pub health_color: SequentialColor,
}

impl Scales {
    /// Scales for a plot area of `width` x `height`, origin top-left.
    pub fn new(extents: &Extents, continents: &[String], width: f32, height: f32, config: &DashboardConfig) -> Self {
        let (gdp_lo, gdp_hi) = extents.gdp.map(|e| (e.min.max(1.0), e.max)).unwrap_or((1.0, 10.0));
        let gdp_hi = gdp_hi.max(gdp_lo);
        let (life_lo, life_hi) = extents.life.map(|e| (e.min, e.max)).unwrap_or((0.0, 100.0));
        let (pop_lo, pop_hi) = extents.pop.map(|e| (e.min, e.max)).unwrap_or((0.0, 1.0));
        Self {
            wealth: LogScale::new((gdp_lo, gdp_hi), (0.0, width)),
            health: LinearScale::new((life_lo - LIFE_PADDING, life_hi + LIFE_PADDING), (height, 0.0)),
            size: SqrtScale::new((pop_lo, pop_hi), config.radius_range),
            category: CategoryPalette::new(continents),
            health_color: SequentialColor {
                domain: (life_lo, life_hi),
                low: config.life_low_color,
                high: config.life_high_color,
            },
        }
    }

    /// Values a missing indicator falls back to: the floor of each domain.
    pub fn sentinel(&self) -> Sentinel {
        Sentinel {
            gdp_percap: self.wealth.domain.0,
            life_exp: self.health.domain.0,
            pop: self.size.domain.0.max(0.0),
        }
    }

    /// Same domains, new pixel extent.
    pub fn resized(&self, width: f32, height: f32) -> Self {
        let mut s = self.clone();
        s.wealth.range = (0.0, width);
        s.health.range = (height, 0.0);
        s
    }
}
