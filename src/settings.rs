//! Bottom control bar: step/play buttons, speed presets, and the year scrubber.

use std::sync::mpsc;

use crate::broadcast::YearCommitted;
use crate::config::SPEED_PRESETS_MS;
use crate::cursor::{index_to_pixel, pixel_to_index, Direction};
use crate::viewer::Dashboard;
use eframe::egui;

const TRACK_HEIGHT: f32 = 28.0;
const TRACK_PADDING: f32 = 12.0;

/// Year slider that follows committed years and turns pointer input into scrub requests.
pub struct Scrubber {
    commits: mpsc::Receiver<YearCommitted>,
    handle_index: usize,
    /// Index last requested by the pointer during the current press.
    pointer_index: Option<usize>,
}

impl Scrubber {
    pub fn new(commits: mpsc::Receiver<YearCommitted>) -> Self {
        Self { commits, handle_index: 0, pointer_index: None }
    }

    pub fn sync(&mut self) {
        if let Some(latest) = self.commits.try_iter().last() {
            self.handle_index = latest.index;
        }
    }

    pub fn handle_index(&self) -> usize {
        self.pointer_index.unwrap_or(self.handle_index)
    }

    /// Records a pointer position on the track. Returns true when it lands on a
    /// different year than the last one requested in this press.
    pub fn pointer_moved(&mut self, years: &[i32], x: f32, width: f32) -> bool {
        let idx = pixel_to_index(years, x, width);
        if self.pointer_index == Some(idx) {
            return false;
        }
        self.pointer_index = Some(idx);
        true
    }

    pub fn release(&mut self) {
        self.pointer_index = None;
    }

    fn paint(&self, painter: &egui::Painter, track: egui::Rect, years: &[i32], visuals: &egui::Visuals) {
        let mid = track.center().y;
        let line = egui::Stroke::new(2.0, visuals.widgets.inactive.bg_fill);
        painter.line_segment([egui::pos2(track.left(), mid), egui::pos2(track.right(), mid)], line);
        let font = egui::FontId::proportional(10.0);
        let label_every = (years.len() / 12).max(1);
        for (i, year) in years.iter().enumerate() {
            let x = track.left() + index_to_pixel(years, i, track.width());
            painter.line_segment([egui::pos2(x, mid - 4.0), egui::pos2(x, mid + 4.0)], egui::Stroke::new(1.0, visuals.weak_text_color()));
            if i % label_every == 0 || i + 1 == years.len() {
                painter.text(egui::pos2(x, mid + 6.0), egui::Align2::CENTER_TOP, year.to_string(), font.clone(), visuals.weak_text_color());
            }
        }
        let hx = track.left() + index_to_pixel(years, self.handle_index(), track.width());
        painter.circle(egui::pos2(hx, mid), 7.0, visuals.selection.bg_fill, egui::Stroke::new(1.5, visuals.strong_text_color()));
    }
}

impl Dashboard {
    pub(crate) fn show_controls(&mut self, ui: &mut egui::Ui) {
        let now = self.now_ms;
        self.scrubber.sync();
        ui.horizontal(|ui| {
            if ui.button("⏪").on_hover_text("Previous year").clicked() {
                self.coordinator.step(Direction::Back, now);
            }
            let playing = self.coordinator.cursor().is_playing;
            let label = if playing { "⏸" } else { "▶" };
            if ui.button(label).on_hover_text(if playing { "Pause" } else { "Play" }).clicked() {
                self.coordinator.toggle_play(now);
            }
            if ui.button("⏩").on_hover_text("Next year").clicked() {
                self.coordinator.step(Direction::Forward, now);
            }

            ui.label("Speed:");
            let current = self.coordinator.cursor().step_duration_ms;
            let mut chosen = current;
            egui::ComboBox::from_id_salt("step_speed")
                .selected_text(format!("{} ms", current))
                .show_ui(ui, |ui| {
                    for ms in SPEED_PRESETS_MS {
                        ui.selectable_value(&mut chosen, ms, format!("{} ms", ms));
                    }
                });
            if chosen != current {
                log::info!("step duration set to {} ms", chosen);
                self.coordinator.set_speed(chosen, now);
            }

            ui.separator();
            ui.label(egui::RichText::new(self.coordinator.current_year().to_string()).strong().size(18.0));
        });

        let years = self.coordinator.years().to_vec();
        let (rect, response) = ui.allocate_exact_size(egui::vec2(ui.available_width(), TRACK_HEIGHT), egui::Sense::click_and_drag());
        let track = rect.shrink2(egui::vec2(TRACK_PADDING, 0.0));
        if response.is_pointer_button_down_on() || response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let x = pos.x - track.left();
                if self.scrubber.pointer_moved(&years, x, track.width()) {
                    self.coordinator.scrub_to_pixel(x, track.width(), now);
                }
            }
        } else {
            self.scrubber.release();
        }
        self.scrubber.paint(ui.painter(), track, &years, ui.visuals());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEARS: [i32; 12] = [1952, 1957, 1962, 1967, 1972, 1977, 1982, 1987, 1992, 1997, 2002, 2007];

    #[test]
    fn repeated_pointer_positions_request_once() {
        let (_tx, rx) = mpsc::channel();
        let mut s = Scrubber::new(rx);
        assert!(s.pointer_moved(&YEARS, 100.0, 550.0));
        assert_eq!(s.handle_index(), 2);
        assert!(!s.pointer_moved(&YEARS, 101.0, 550.0));
        assert!(s.pointer_moved(&YEARS, 550.0, 550.0));
        assert_eq!(s.handle_index(), 11);
        s.release();
        assert_eq!(s.handle_index(), 0);
        assert!(s.pointer_moved(&YEARS, 550.0, 550.0));
    }

    #[test]
    fn handle_follows_commits() {
        let (tx, rx) = mpsc::channel();
        let mut s = Scrubber::new(rx);
        tx.send(YearCommitted { year: 1957, index: 1 }).unwrap();
        tx.send(YearCommitted { year: 1962, index: 2 }).unwrap();
        s.sync();
        assert_eq!(s.handle_index(), 2);
    }
}
