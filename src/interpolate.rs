//! Per-country display values and the year-to-year interpolation engine.
//!
//! `DisplayState` is what the scatter view draws. It drifts through blended
//! values while a transition runs and settles on the target year's exact
//! record values when the transition completes.

use crate::data::Record;
use crate::math::lerp;

/// Stand-in values for a missing indicator: the bottom of each domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sentinel {
    pub gdp_percap: f64,
    pub life_exp: f64,
    pub pop: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayState {
    pub gdp_percap: f64,
    pub life_exp: f64,
    pub pop: f64,
    pub continent: Option<String>,
    pub visible: bool,
    /// Current values derive from at least one complete record.
    has_data: bool,
}

impl DisplayState {
    pub fn seeded(record: Option<&Record>, sentinel: &Sentinel) -> Self {
        let end = Endpoint::resolve(record, None, sentinel);
        Self {
            gdp_percap: end.gdp_percap,
            life_exp: end.life_exp,
            pop: end.pop,
            continent: end.continent,
            visible: end.complete,
            has_data: end.complete,
        }
    }
}

/// Transition target for one country.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoint {
    pub gdp_percap: f64,
    pub life_exp: f64,
    pub pop: f64,
    pub continent: Option<String>,
    pub complete: bool,
}

impl Endpoint {
    pub fn resolve(record: Option<&Record>, fallback_continent: Option<&str>, sentinel: &Sentinel) -> Self {
        match record {
            Some(r) => Self {
                gdp_percap: r.gdp_percap.unwrap_or(sentinel.gdp_percap),
                life_exp: r.life_exp.unwrap_or(sentinel.life_exp),
                pop: r.pop.unwrap_or(sentinel.pop),
                continent: r.continent.clone().or_else(|| fallback_continent.map(str::to_string)),
                complete: r.is_complete(),
            },
            None => Self {
                gdp_percap: sentinel.gdp_percap,
                life_exp: sentinel.life_exp,
                pop: sentinel.pop,
                continent: fallback_continent.map(str::to_string),
                complete: false,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct Transition {
    pub from_index: usize,
    pub to_index: usize,
    pub start_ms: f64,
    pub duration_ms: f64,
    starts: Vec<DisplayState>,
    targets: Vec<Endpoint>,
}

impl Transition {
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug)]
pub enum EngineState {
    Idle,
    Animating(Transition),
}

/// Drives `DisplayState` toward a target year, one transition at a time.
pub struct InterpolationEngine {
    display: Vec<DisplayState>,
    state: EngineState,
}

impl InterpolationEngine {
    pub fn new(display: Vec<DisplayState>) -> Self {
        Self { display, state: EngineState::Idle }
    }

    pub fn display(&self) -> &[DisplayState] {
        &self.display
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, EngineState::Animating(_))
    }

    pub fn target_index(&self) -> Option<usize> {
        match &self.state {
            EngineState::Animating(t) => Some(t.to_index),
            EngineState::Idle => None,
        }
    }

    /// Starts a transition from the values currently on screen.
    ///
    /// Any transition in flight is dropped without committing. Returns the
    /// dropped transition's target, if there was one.
    pub fn start(
        &mut self,
        from_index: usize,
        to_index: usize,
        targets: Vec<Endpoint>,
        now_ms: f64,
        duration_ms: f64,
    ) -> Option<usize> {
        debug_assert_eq!(targets.len(), self.display.len());
        let preempted = self.target_index();
        self.state = EngineState::Animating(Transition {
            from_index,
            to_index,
            start_ms: now_ms,
            duration_ms: duration_ms.max(0.0),
            starts: self.display.clone(),
            targets,
        });
        preempted
    }

    /// Advances to `now_ms`; returns the target index when the transition completes.
    pub fn tick(&mut self, now_ms: f64) -> Option<usize> {
        let EngineState::Animating(transition) = &self.state else { return None };
        let t = transition.progress(now_ms);
        let done = t >= 1.0;
        for ((state, start), target) in self.display.iter_mut().zip(&transition.starts).zip(&transition.targets) {
            let visible = start.has_data || target.complete;
            if done {
                state.gdp_percap = target.gdp_percap;
                state.life_exp = target.life_exp;
                state.pop = target.pop;
                state.continent = target.continent.clone().or_else(|| start.continent.clone());
                state.visible = visible;
                state.has_data = target.complete;
            } else {
                state.gdp_percap = lerp(start.gdp_percap, target.gdp_percap, t);
                state.life_exp = lerp(start.life_exp, target.life_exp, t);
                state.pop = lerp(start.pop, target.pop, t);
                state.continent = if t < 0.5 || target.continent.is_none() {
                    start.continent.clone()
                } else {
                    target.continent.clone()
                };
                state.visible = visible;
                state.has_data = visible;
            }
        }
        if done {
            let to = transition.to_index;
            self.state = EngineState::Idle;
            Some(to)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: Sentinel = Sentinel { gdp_percap: 100.0, life_exp: 20.0, pop: 0.0 };

    fn rec(gdp: Option<f64>, life: Option<f64>, pop: Option<f64>, continent: &str) -> Record {
        Record {
            country: "X".into(),
            continent: Some(continent.into()),
            year: 2000,
            life_exp: life,
            pop,
            gdp_percap: gdp,
        }
    }

    fn endpoint(r: &Record) -> Endpoint {
        Endpoint::resolve(Some(r), None, &SENTINEL)
    }

    #[test]
    fn interpolates_linearly_and_settles_exactly() {
        let a = rec(Some(1000.0), Some(40.0), Some(1e6), "Asia");
        let b = rec(Some(3000.0), Some(60.0), Some(3e6), "Asia");
        let mut engine = InterpolationEngine::new(vec![DisplayState::seeded(Some(&a), &SENTINEL)]);
        engine.start(0, 1, vec![endpoint(&b)], 0.0, 1000.0);

        assert_eq!(engine.tick(250.0), None);
        let s = &engine.display()[0];
        assert_eq!((s.gdp_percap, s.life_exp, s.pop), (1500.0, 45.0, 1.5e6));

        assert_eq!(engine.tick(1000.0), Some(1));
        let s = &engine.display()[0];
        assert_eq!((s.gdp_percap, s.life_exp, s.pop), (3000.0, 60.0, 3e6));
        assert!(!engine.is_animating());
        assert_eq!(engine.tick(2000.0), None);
    }

    #[test]
    fn continent_switches_at_midpoint() {
        let a = rec(Some(1.0), Some(1.0), Some(1.0), "Asia");
        let b = rec(Some(1.0), Some(1.0), Some(1.0), "Europe");
        let mut engine = InterpolationEngine::new(vec![DisplayState::seeded(Some(&a), &SENTINEL)]);
        engine.start(0, 1, vec![endpoint(&b)], 0.0, 100.0);
        engine.tick(49.0);
        assert_eq!(engine.display()[0].continent.as_deref(), Some("Asia"));
        engine.tick(50.0);
        assert_eq!(engine.display()[0].continent.as_deref(), Some("Europe"));
    }

    #[test]
    fn zero_duration_completes_on_first_tick() {
        let a = rec(Some(1.0), Some(1.0), Some(1.0), "Asia");
        let mut engine = InterpolationEngine::new(vec![DisplayState::seeded(Some(&a), &SENTINEL)]);
        engine.start(0, 0, vec![endpoint(&a)], 10.0, 0.0);
        assert_eq!(engine.tick(10.0), Some(0));
    }

    #[test]
    fn missing_target_animates_toward_sentinel() {
        let a = rec(Some(1100.0), Some(60.0), Some(1e6), "Asia");
        let mut engine = InterpolationEngine::new(vec![DisplayState::seeded(Some(&a), &SENTINEL)]);
        let missing = Endpoint::resolve(None, Some("Asia"), &SENTINEL);
        engine.start(0, 1, vec![missing.clone()], 0.0, 100.0);
        engine.tick(50.0);
        let s = &engine.display()[0];
        assert!(s.visible);
        assert_eq!(s.gdp_percap, 600.0);
        assert_eq!(s.life_exp, 40.0);

        engine.tick(100.0);
        let s = &engine.display()[0];
        assert!(s.visible, "one endpoint was complete");
        assert_eq!(s.gdp_percap, SENTINEL.gdp_percap);

        engine.start(1, 2, vec![missing], 100.0, 100.0);
        engine.tick(200.0);
        assert!(!engine.display()[0].visible, "both endpoints missing");
    }

    #[test]
    fn restart_drops_the_previous_target() {
        let a = rec(Some(1000.0), Some(40.0), Some(1.0), "Asia");
        let b = rec(Some(2000.0), Some(50.0), Some(1.0), "Asia");
        let c = rec(Some(5000.0), Some(80.0), Some(1.0), "Asia");
        let mut engine = InterpolationEngine::new(vec![DisplayState::seeded(Some(&a), &SENTINEL)]);
        assert_eq!(engine.start(0, 1, vec![endpoint(&b)], 0.0, 100.0), None);
        engine.tick(50.0);
        assert_eq!(engine.start(0, 2, vec![endpoint(&c)], 50.0, 100.0), Some(1));
        let s = &engine.display()[0];
        assert_eq!(s.gdp_percap, 1500.0);
        assert_eq!(engine.tick(150.0), Some(2));
        assert_eq!(engine.display()[0].gdp_percap, 5000.0);
    }

    #[test]
    fn incomplete_record_keeps_present_values() {
        let r = rec(Some(0.0), None, Some(5.0), "Asia");
        let s = DisplayState::seeded(Some(&r), &SENTINEL);
        assert_eq!(s.gdp_percap, 0.0);
        assert_eq!(s.life_exp, SENTINEL.life_exp);
        assert_eq!(s.pop, 5.0);
        assert!(!s.visible);
    }
}
