#[cfg(not(target_arch = "wasm32"))]
use eframe::egui;
use gapviz::app::App;

#[cfg(target_arch = "wasm32")]
use eframe::wasm_bindgen::JsCast;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("gapviz {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Gapminder Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Gapminder Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {
    eframe::WebLogger::init(log::LevelFilter::Info).ok();
    log::info!("gapviz {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));

    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("no document to mount into");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("page has no <canvas id=\"canvas\">");
            return;
        };

        let web_options = eframe::WebOptions::default();
        if let Err(e) = eframe::WebRunner::new()
            .start(canvas, web_options, Box::new(|cc| Ok(Box::new(App::new(cc)))))
            .await
        {
            log::error!("failed to start eframe: {:?}", e);
        }
    });
}
