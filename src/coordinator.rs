//! Single owner of the cursor, the play loop, and the interpolation engine.
//!
//! Every cursor change goes through a `Coordinator` method, which keeps at
//! most one transition in flight. Time is passed in as milliseconds so the
//! same code runs off the egui frame clock and off a test clock.

use std::sync::{mpsc, Arc};

use crate::broadcast::{YearBroadcast, YearCommitted};
use crate::config::DashboardConfig;
use crate::cursor::{pixel_to_index, wrap_step, Direction, TemporalCursor};
use crate::index::DerivedIndex;
use crate::interpolate::{DisplayState, Endpoint, InterpolationEngine, Sentinel};

#[derive(Clone, Copy, Debug)]
pub struct Timing {
    pub inter_frame_gap_ms: f64,
    pub step_transition_ms: f64,
    pub scrub_transition_ms: f64,
}

impl From<&DashboardConfig> for Timing {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            inter_frame_gap_ms: config.inter_frame_gap_ms as f64,
            step_transition_ms: config.step_transition_ms as f64,
            scrub_transition_ms: config.scrub_transition_ms as f64,
        }
    }
}

/// First slot of the `due + k * period` grid strictly after `now_ms`, so late
/// frames never shift the schedule and missed slots are skipped, not replayed.
fn next_due(due: f64, period: f64, now_ms: f64) -> f64 {
    let missed = ((now_ms - due) / period).floor().max(0.0);
    due + (missed + 1.0) * period
}

pub struct Coordinator {
    index: Arc<DerivedIndex>,
    countries: Vec<String>,
    sentinel: Sentinel,
    cursor: TemporalCursor,
    engine: InterpolationEngine,
    next_step_at: Option<f64>,
    timing: Timing,
    broadcast: YearBroadcast,
}

impl Coordinator {
    /// Seeds one display state per known country from the first year.
    pub fn new(index: Arc<DerivedIndex>, sentinel: Sentinel, step_duration_ms: u32, timing: Timing) -> Self {
        let countries = index.countries.clone();
        let first_year = index.years[0];
        let display = countries
            .iter()
            .map(|c| DisplayState::seeded(index.record(c, first_year), &sentinel))
            .collect();
        Self {
            index,
            countries,
            sentinel,
            cursor: TemporalCursor::new(step_duration_ms),
            engine: InterpolationEngine::new(display),
            next_step_at: None,
            timing,
            broadcast: YearBroadcast::default(),
        }
    }

    pub fn index(&self) -> &DerivedIndex {
        &self.index
    }

    pub fn years(&self) -> &[i32] {
        &self.index.years
    }

    pub fn cursor(&self) -> TemporalCursor {
        self.cursor
    }

    pub fn current_year(&self) -> i32 {
        self.index.years[self.cursor.current_index]
    }

    pub fn is_animating(&self) -> bool {
        self.engine.is_animating()
    }

    pub fn display(&self) -> impl Iterator<Item = (&str, &DisplayState)> {
        self.countries.iter().map(String::as_str).zip(self.engine.display())
    }

    pub fn display_of(&self, country: &str) -> Option<&DisplayState> {
        let i = self.countries.iter().position(|c| c == country)?;
        self.engine.display().get(i)
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<YearCommitted> {
        self.broadcast.subscribe()
    }

    fn play_period_ms(&self) -> f64 {
        self.cursor.step_duration_ms as f64 + self.timing.inter_frame_gap_ms
    }

    /// Index the cursor is heading to: the in-flight target, else the committed index.
    pub fn target_index(&self) -> usize {
        self.engine.target_index().unwrap_or(self.cursor.current_index)
    }

    /// Starts a transition to `target`, dropping any transition in flight.
    pub fn request_transition(&mut self, target: usize, duration_ms: f64, now_ms: f64) {
        let Some(&year) = self.index.years.get(target) else { return };
        let targets: Vec<Endpoint> = self
            .countries
            .iter()
            .zip(self.engine.display())
            .map(|(c, state)| Endpoint::resolve(self.index.record(c, year), state.continent.as_deref(), &self.sentinel))
            .collect();
        let from = self.cursor.current_index;
        if let Some(dropped) = self.engine.start(from, target, targets, now_ms, duration_ms) {
            log::debug!("transition to index {} preempted by index {}", dropped, target);
        }
    }

    /// Advances animation and the play loop; call once per frame.
    pub fn tick(&mut self, now_ms: f64) {
        if let Some(committed) = self.engine.tick(now_ms) {
            self.cursor.current_index = committed;
            let event = YearCommitted { year: self.index.years[committed], index: committed };
            log::debug!("committed year {}", event.year);
            self.broadcast.publish(event);
        }
        if !self.cursor.is_playing {
            return;
        }
        if let Some(due) = self.next_step_at {
            if now_ms >= due {
                let next = wrap_step(self.target_index(), Direction::Forward, self.index.years.len());
                self.request_transition(next, self.cursor.step_duration_ms as f64, now_ms);
                self.next_step_at = Some(next_due(due, self.play_period_ms(), now_ms));
            }
        }
    }

    /// Begins playback with an immediate step, then one step per period.
    pub fn play(&mut self, now_ms: f64) {
        if self.cursor.is_playing {
            return;
        }
        self.cursor.is_playing = true;
        let next = wrap_step(self.target_index(), Direction::Forward, self.index.years.len());
        self.request_transition(next, self.cursor.step_duration_ms as f64, now_ms);
        self.next_step_at = Some(now_ms + self.play_period_ms());
    }

    /// Stops scheduling steps; a transition already in flight still completes.
    pub fn pause(&mut self) {
        if !self.cursor.is_playing {
            return;
        }
        self.cursor.is_playing = false;
        self.next_step_at = None;
    }

    pub fn toggle_play(&mut self, now_ms: f64) {
        if self.cursor.is_playing {
            self.pause();
        } else {
            self.play(now_ms);
        }
    }

    pub fn step(&mut self, direction: Direction, now_ms: f64) {
        self.pause();
        let target = wrap_step(self.target_index(), direction, self.index.years.len());
        self.request_transition(target, self.timing.step_transition_ms, now_ms);
    }

    pub fn scrub_to_pixel(&mut self, x: f32, track_width: f32, now_ms: f64) {
        self.pause();
        let target = pixel_to_index(&self.index.years, x, track_width);
        if self.engine.target_index() == Some(target) {
            return;
        }
        self.request_transition(target, self.timing.scrub_transition_ms, now_ms);
    }

    pub fn set_speed(&mut self, step_duration_ms: u32, now_ms: f64) {
        self.cursor.step_duration_ms = step_duration_ms.max(1);
        if self.cursor.is_playing {
            self.next_step_at = Some(now_ms + self.play_period_ms());
        }
    }

    /// Programmatic entry point. Unknown years are ignored and return `false`.
    pub fn go_to_year(&mut self, year: i32, now_ms: f64) -> bool {
        let Some(target) = self.index.year_position(year) else { return false };
        self.pause();
        self.request_transition(target, self.cursor.step_duration_ms as f64, now_ms);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;

    fn rec(country: &str, year: i32, gdp: Option<f64>) -> Record {
        Record {
            country: country.into(),
            continent: Some("Asia".into()),
            year,
            life_exp: Some(50.0 + (year - 2000) as f64),
            pop: Some(1e6),
            gdp_percap: gdp,
        }
    }

    fn coordinator() -> Coordinator {
        let records = vec![
            rec("A", 2000, Some(100.0)),
            rec("A", 2005, Some(200.0)),
            rec("A", 2010, Some(300.0)),
            rec("B", 2005, Some(50.0)),
        ];
        let index = Arc::new(DerivedIndex::build(&records).unwrap());
        let sentinel = Sentinel { gdp_percap: 1.0, life_exp: 48.0, pop: 0.0 };
        let timing = Timing { inter_frame_gap_ms: 100.0, step_transition_ms: 300.0, scrub_transition_ms: 0.0 };
        Coordinator::new(index, sentinel, 500, timing)
    }

    #[test]
    fn seeds_from_first_year() {
        let c = coordinator();
        assert_eq!(c.current_year(), 2000);
        assert!(c.display_of("A").unwrap().visible);
        assert!(!c.display_of("B").unwrap().visible);
    }

    #[test]
    fn pause_lets_the_transition_finish() {
        let mut c = coordinator();
        let rx = c.subscribe();
        c.play(0.0);
        c.tick(200.0);
        c.pause();
        c.tick(500.0);
        assert_eq!(c.current_year(), 2005);
        c.tick(5000.0);
        assert_eq!(c.current_year(), 2005);
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn speed_change_restarts_the_schedule() {
        let mut c = coordinator();
        c.play(0.0);
        c.tick(500.0);
        c.set_speed(1000, 550.0);
        c.tick(600.0);
        assert!(!c.is_animating(), "old schedule no longer applies");
        c.tick(1650.0);
        assert!(c.is_animating());
        assert_eq!(c.target_index(), 2);
    }

    #[test]
    fn schedule_stays_on_the_period_grid() {
        assert_eq!(next_due(600.0, 600.0, 616.0), 1200.0);
        assert_eq!(next_due(600.0, 600.0, 600.0), 1200.0);
        assert_eq!(next_due(600.0, 600.0, 2500.0), 3000.0);
    }

    #[test]
    fn play_continues_from_the_pending_step() {
        let mut c = coordinator();
        c.step(Direction::Forward, 0.0);
        c.step(Direction::Forward, 10.0);
        assert_eq!(c.target_index(), 2);
        c.play(20.0);
        assert_eq!(c.target_index(), 0, "wraps forward past 2010");
        c.tick(520.0);
        assert_eq!(c.current_year(), 2000);
    }

    #[test]
    fn unknown_year_is_ignored() {
        let mut c = coordinator();
        c.play(0.0);
        assert!(!c.go_to_year(2003, 10.0));
        assert!(c.cursor().is_playing);
        assert!(c.go_to_year(2010, 10.0));
        assert!(!c.cursor().is_playing);
    }

    #[test]
    fn repeated_steps_accumulate_from_the_pending_target() {
        let mut c = coordinator();
        c.step(Direction::Forward, 0.0);
        c.step(Direction::Forward, 10.0);
        c.tick(400.0);
        assert_eq!(c.current_year(), 2010);
    }
}
