//! The shared year cursor and the pure arithmetic behind the controls.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemporalCursor {
    pub current_index: usize,
    pub is_playing: bool,
    pub step_duration_ms: u32,
}

impl TemporalCursor {
    pub fn new(step_duration_ms: u32) -> Self {
        Self { current_index: 0, is_playing: false, step_duration_ms: step_duration_ms.max(1) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
}

/// Adjacent index, wrapping at both ends.
pub fn wrap_step(index: usize, direction: Direction, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    match direction {
        Direction::Forward => (index + 1) % len,
        Direction::Back => (index + len - 1) % len,
    }
}

/// Index of the year closest to `year`; ties go to the earlier year.
pub fn nearest_index(years: &[i32], year: i32) -> usize {
    match years.binary_search(&year) {
        Ok(i) => i,
        Err(0) => 0,
        Err(i) if i >= years.len() => years.len().saturating_sub(1),
        Err(i) => {
            if (year - years[i - 1]) <= (years[i] - year) { i - 1 } else { i }
        }
    }
}

/// Maps a pointer offset along a track of `width` pixels to a year index.
///
/// The offset is scaled linearly over [first year, last year], rounded to
/// the nearest whole year, clamped, and snapped to the closest known year.
pub fn pixel_to_index(years: &[i32], x: f32, width: f32) -> usize {
    let (Some(&first), Some(&last)) = (years.first(), years.last()) else { return 0 };
    let t = if width > 0.0 { (x / width) as f64 } else { 0.0 };
    let year = (first as f64 + t * (last - first) as f64).round() as i64;
    let year = year.clamp(first as i64, last as i64) as i32;
    nearest_index(years, year)
}

/// Pixel offset of a year index along a track of `width` pixels.
pub fn index_to_pixel(years: &[i32], index: usize, width: f32) -> f32 {
    let (Some(&first), Some(&last)) = (years.first(), years.last()) else { return 0.0 };
    let Some(&year) = years.get(index) else { return 0.0 };
    if last == first {
        return 0.0;
    }
    (year - first) as f32 * width / (last - first) as f32
}
