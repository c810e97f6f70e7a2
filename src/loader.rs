//! Fetches the record table and the boundary topology, then builds everything
//! the dashboard needs from them. Both sources must load before any view renders.

use crate::data::parse_records;
use crate::error::{LoadError, LoadResult};
use crate::boundary::{parse_boundaries, GeoFeature};
use crate::index::DerivedIndex;

pub struct Dataset {
    pub index: DerivedIndex,
    pub features: Vec<GeoFeature>,
}

impl Dataset {
    pub fn from_texts(records_json: &str, geo_json: &str) -> LoadResult<Self> {
        let records = parse_records(records_json)?;
        let index = DerivedIndex::build(&records)?;
        let features = parse_boundaries(geo_json)?;
        log::info!(
            "loaded {} records: {} countries over {} years ({}..{}), {} boundary features",
            records.len(),
            index.countries.len(),
            index.years.len(),
            index.years[0],
            index.years[index.years.len() - 1],
            features.len()
        );
        Ok(Self { index, features })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[cfg(not(target_arch = "wasm32"))]
pub fn dirs_cache() -> std::path::PathBuf {
    std::env::var_os("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".cache"))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
}

#[cfg(not(target_arch = "wasm32"))]
fn fetch_text(location: &str) -> LoadResult<String> {
    if is_remote(location) {
        let response = ureq::get(location).call().map_err(|e| LoadError::http(location, e))?;
        response.into_string().map_err(|e| LoadError::http(location, e))
    } else {
        std::fs::read_to_string(location).map_err(|source| LoadError::Io { path: location.to_string(), source })
    }
}

/// Remote boundary files are kept under the user cache; local paths are read directly.
#[cfg(not(target_arch = "wasm32"))]
fn fetch_or_cache(location: &str) -> LoadResult<String> {
    if !is_remote(location) {
        return fetch_text(location);
    }
    let cache_dir = dirs_cache().join("gapviz").join("geodata");
    let _ = std::fs::create_dir_all(&cache_dir);
    let filename = location.rsplit('/').next().unwrap_or("boundaries.json");
    let path = cache_dir.join(filename);
    if path.exists() {
        log::debug!("boundaries from cache {}", path.display());
        if let Ok(text) = std::fs::read_to_string(&path) {
            return Ok(text);
        }
    }
    let text = fetch_text(location)?;
    if let Err(e) = std::fs::write(&path, &text) {
        log::warn!("could not cache {}: {}", path.display(), e);
    }
    Ok(text)
}

/// Loads both sources on background threads; the receiver yields exactly once.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_load(records_url: String, geo_url: String) -> std::sync::mpsc::Receiver<LoadResult<Dataset>> {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        log::info!("loading records from {} and boundaries from {}", records_url, geo_url);
        let geo = std::thread::spawn(move || fetch_or_cache(&geo_url));
        let records = fetch_text(&records_url);
        let geo = geo
            .join()
            .unwrap_or_else(|_| Err(LoadError::Topology("boundary loader panicked".to_string())));
        let result = records.and_then(|r| geo.and_then(|g| Dataset::from_texts(&r, &g)));
        let _ = tx.send(result);
    });
    rx
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    pub(crate) static LOAD_RESULT: std::cell::RefCell<Option<LoadResult<Dataset>>> = std::cell::RefCell::new(None);
}

#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str) -> LoadResult<String> {
    use wasm_bindgen::JsCast as _;
    use web_sys::{Request, RequestInit, Response};

    let opts = RequestInit::new();
    opts.set_method("GET");
    let request = Request::new_with_str_and_init(url, &opts).map_err(|e| LoadError::http(url, format!("{:?}", e)))?;
    let window = web_sys::window().ok_or_else(|| LoadError::http(url, "no window"))?;
    let resp_value = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| LoadError::http(url, format!("fetch failed: {:?}", e)))?;
    let resp: Response = resp_value.dyn_into().map_err(|_| LoadError::http(url, "response is not a Response"))?;
    if !resp.ok() {
        return Err(LoadError::http(url, format!("HTTP {}", resp.status())));
    }
    let text = wasm_bindgen_futures::JsFuture::from(resp.text().map_err(|e| LoadError::http(url, format!("{:?}", e)))?)
        .await
        .map_err(|e| LoadError::http(url, format!("{:?}", e)))?;
    text.as_string().ok_or_else(|| LoadError::http(url, "body is not text"))
}

/// Starts both fetches together and parks the result in `LOAD_RESULT`.
#[cfg(target_arch = "wasm32")]
pub fn spawn_load(records_url: String, geo_url: String, ctx: eframe::egui::Context) {
    wasm_bindgen_futures::spawn_local(async move {
        log::info!("loading records from {} and boundaries from {}", records_url, geo_url);
        let records = fetch_text(&records_url);
        let geo = fetch_text(&geo_url);
        let (records, geo) = futures::future::join(records, geo).await;
        let result = records.and_then(|r| geo.and_then(|g| Dataset::from_texts(&r, &g)));
        LOAD_RESULT.with(|cell| *cell.borrow_mut() = Some(result));
        ctx.request_repaint();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDS: &str = r#"[
        {"country": "Chad", "continent": "Africa", "year": 1952, "lifeExp": 38.1, "pop": 2682462, "gdpPercap": 1178.7},
        {"country": "Chad", "continent": "Africa", "year": 1957, "lifeExp": 39.9, "pop": 2894855, "gdpPercap": 1308.5}
    ]"#;

    const GEO: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"name": "Chad"},
         "geometry": {"type": "Polygon", "coordinates": [[[14, 8], [24, 8], [24, 23], [14, 23], [14, 8]]]}}
    ]}"#;

    #[test]
    fn builds_dataset_from_both_sources() {
        let data = Dataset::from_texts(RECORDS, GEO).unwrap();
        assert_eq!(data.index.years, vec![1952, 1957]);
        assert_eq!(data.features.len(), 1);
        assert_eq!(data.features[0].name, "Chad");
    }

    #[test]
    fn either_source_failing_fails_the_load() {
        assert!(matches!(Dataset::from_texts("{", GEO), Err(LoadError::Json { .. })));
        assert!(Dataset::from_texts(RECORDS, r#"{"type": "Nope"}"#).is_err());
        assert!(matches!(Dataset::from_texts("[]", GEO), Err(LoadError::NoYears)));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn missing_local_file_is_an_io_error() {
        let err = fetch_text("/nonexistent/gapviz/records.json").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/gapviz/records.json"));
    }
}
