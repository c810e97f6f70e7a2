//! Application shell and eframe integration.
//!
//! Starts the data load, shows a loading or failure screen until it
//! resolves, then drives the dashboard: clock tick, control bar, the
//! egui dock with one tab per view, and the shared tooltip.

use crate::config::DashboardConfig;
#[cfg(not(target_arch = "wasm32"))]
use crate::error::LoadResult;
use crate::loader::{spawn_load, Dataset};
#[cfg(target_arch = "wasm32")]
use crate::loader::LOAD_RESULT;
use crate::viewer::{Dashboard, Tab};
use eframe::egui;
use egui_dock::{DockArea, DockState, NodeIndex};
#[cfg(not(target_arch = "wasm32"))]
use std::sync::mpsc;

pub(crate) enum LoadState {
    Loading,
    Ready(Box<Dashboard>),
    Failed(String),
}

pub struct App {
    dock_state: DockState<Tab>,
    state: LoadState,
    config: DashboardConfig,
    #[cfg(not(target_arch = "wasm32"))]
    load_rx: Option<mpsc::Receiver<LoadResult<Dataset>>>,
    #[cfg(target_arch = "wasm32")]
    year_events: Option<std::sync::mpsc::Receiver<crate::broadcast::YearCommitted>>,
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    static PENDING_YEARS: std::cell::RefCell<Vec<i32>> = std::cell::RefCell::new(Vec::new());
}

/// Moves the dashboard to `year` from the host page. Years absent from the data are ignored.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn set_year(year: i32) {
    PENDING_YEARS.with(|cell| cell.borrow_mut().push(year));
}

#[cfg(target_arch = "wasm32")]
fn dispatch_year_change(year: i32) {
    let Some(window) = web_sys::window() else { return };
    let init = web_sys::CustomEventInit::new();
    init.set_detail(&wasm_bindgen::JsValue::from(year));
    match web_sys::CustomEvent::new_with_event_init_dict("yearchange", &init) {
        Ok(event) => {
            let _ = window.dispatch_event(&event);
        }
        Err(e) => log::warn!("could not create yearchange event: {:?}", e),
    }
}

fn default_layout() -> DockState<Tab> {
    let mut dock_state = DockState::new(vec![Tab::Scatter]);
    let tree = dock_state.main_surface_mut();
    let [_, right] = tree.split_right(NodeIndex::root(), 0.58, vec![Tab::Map]);
    tree.split_below(right, 0.55, vec![Tab::Hierarchy]);
    dock_state
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let config = DashboardConfig::from_env();
        #[cfg(target_arch = "wasm32")]
        let config = DashboardConfig::default();

        #[allow(unused_mut)]
        let mut app = Self {
            dock_state: default_layout(),
            state: LoadState::Loading,
            config,
            #[cfg(not(target_arch = "wasm32"))]
            load_rx: None,
            #[cfg(target_arch = "wasm32")]
            year_events: None,
        };
        app.start_load(&cc.egui_ctx);
        app
    }

    fn start_load(&mut self, _ctx: &egui::Context) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.load_rx = Some(spawn_load(self.config.records_url.clone(), self.config.geo_url.clone()));
        }
        #[cfg(target_arch = "wasm32")]
        spawn_load(self.config.records_url.clone(), self.config.geo_url.clone(), _ctx.clone());
    }

    fn finish_load(&mut self, result: crate::error::LoadResult<Dataset>) {
        match result {
            Ok(dataset) => {
                #[allow(unused_mut)]
                let mut dashboard = Dashboard::new(dataset, self.config.clone());
                #[cfg(target_arch = "wasm32")]
                {
                    self.year_events = Some(dashboard.coordinator.subscribe());
                }
                self.state = LoadState::Ready(Box::new(dashboard));
            }
            Err(e) => {
                log::error!("failed to load dashboard data: {}", e);
                #[cfg(target_arch = "wasm32")]
                if let Some(window) = web_sys::window() {
                    let _ = window.alert_with_message(&format!("Failed to load data: {}", e));
                }
                self.state = LoadState::Failed(e.to_string());
            }
        }
    }

    fn poll_load(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let polled = match self.load_rx.as_ref().map(|rx| rx.try_recv()) {
                Some(Ok(result)) => Some(Ok(result)),
                Some(Err(mpsc::TryRecvError::Disconnected)) => Some(Err("loader exited without a result".to_string())),
                Some(Err(mpsc::TryRecvError::Empty)) | None => None,
            };
            match polled {
                Some(Ok(result)) => {
                    self.load_rx = None;
                    self.finish_load(result);
                }
                Some(Err(message)) => {
                    self.load_rx = None;
                    log::error!("{}", message);
                    self.state = LoadState::Failed(message);
                }
                None => {}
            }
        }
        #[cfg(target_arch = "wasm32")]
        if let Some(result) = LOAD_RESULT.with(|cell| cell.borrow_mut().take()) {
            self.finish_load(result);
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_load();
        let now_ms = ctx.input(|i| i.time) * 1000.0;

        match &mut self.state {
            LoadState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Loading data…");
                        });
                    });
                });
                ctx.request_repaint_after(std::time::Duration::from_millis(100));
            }
            LoadState::Failed(message) => {
                egui::CentralPanel::default().show(ctx, |_ui| {});
                egui::Window::new("Failed to load data")
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                    .show(ctx, |ui| {
                        ui.label(message.as_str());
                        ui.add_space(8.0);
                        ui.label(egui::RichText::new("Reload the page or restart the application to try again.").weak());
                    });
            }
            LoadState::Ready(dashboard) => {
                #[cfg(target_arch = "wasm32")]
                {
                    let years = PENDING_YEARS.with(|cell| std::mem::take(&mut *cell.borrow_mut()));
                    for year in years {
                        if !dashboard.coordinator.go_to_year(year, now_ms) {
                            log::warn!("set_year({}): no data for that year", year);
                        }
                    }
                }

                dashboard.tick(now_ms);

                #[cfg(target_arch = "wasm32")]
                if let Some(rx) = &self.year_events {
                    for event in rx.try_iter() {
                        dispatch_year_change(event.year);
                    }
                }

                egui::TopBottomPanel::bottom("controls")
                    .resizable(false)
                    .show(ctx, |ui| {
                        ui.add_space(4.0);
                        dashboard.show_controls(ui);
                        ui.add_space(4.0);
                    });

                let mut dock_style = egui_dock::Style::from_egui(ctx.style().as_ref());
                dock_style.main_surface_border_stroke = egui::Stroke::NONE;
                DockArea::new(&mut self.dock_state)
                    .style(dock_style)
                    .show(ctx, dashboard.as_mut());

                dashboard.tooltip.paint(ctx);
                if dashboard.needs_repaint() {
                    ctx.request_repaint();
                }
            }
        }
    }
}
