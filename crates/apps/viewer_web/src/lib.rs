use console_error_panic_hook::set_once;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlElement, Window};

use catalog::poi::{Category, Poi};
use catalog::session::BrowserSessionStore;
use foundation::ids::PoiId;
use foundation::time::SystemClock;
use layers::symbology::MarkerStyle;
use layers::sync::{MapListSyncController, MarkerView, list_header};
use layers::viewport::{MapSurface, MapViewportController, ViewportConfig};
use locations::fetch::{FetchError, LocationFetcher};
use locations::store::{LoadError, LoadStart, LocationStore};
use motion::phase::PhaseAnimator;
use motion::preview::preview_animator;
use runtime::progress::{ProgressTracker, ScrollSample};
use runtime::sampler::FrameSampler;
use serde::Deserialize;

mod dom;
mod fetch;
mod leaflet;

use dom::RowHandle;
use fetch::GlooFetcher;
use leaflet::{BACKGROUND_TILES, FEATURED_TILES, LeafletSurface, MarkerHandle, TileSource};

pub const DEFAULT_API_BASE: &str = "https://tma-ofm-react-template.vercel.app";

/// Element ids and endpoint the page hands to `mount`. Parts whose element is
/// missing from the page are skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MountConfig {
    pub api_base: String,
    pub background_map_id: String,
    pub featured_map_id: String,
    pub preview_section_id: String,
    pub list_id: String,
    pub list_header_id: String,
    pub status_id: String,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            background_map_id: "background-map".to_string(),
            featured_map_id: "featured-map".to_string(),
            preview_section_id: "preview-section".to_string(),
            list_id: "location-list".to_string(),
            list_header_id: "location-count".to_string(),
            status_id: "location-status".to_string(),
        }
    }
}

struct MapSlot {
    controller: MapViewportController,
    surface: LeafletSurface,
}

impl MapSlot {
    fn mount(
        element_id: &str,
        config: ViewportConfig,
        tiles: TileSource,
    ) -> Result<Self, JsValue> {
        let controller = MapViewportController::new(config);
        let mut surface = LeafletSurface::mount(element_id, tiles, controller.interaction())?;
        for command in controller.initial_commands() {
            surface.apply(&command);
        }
        Ok(Self {
            controller,
            surface,
        })
    }
}

#[derive(Default)]
struct Maps {
    background: Option<MapSlot>,
    featured: Option<MapSlot>,
}

struct Preview {
    animator: PhaseAnimator,
    root: Element,
}

#[derive(Default)]
struct Scroll {
    page_sampler: FrameSampler,
    section_sampler: FrameSampler,
    page: ProgressTracker,
    section: ProgressTracker,
    section_el: Option<HtmlElement>,
}

#[derive(Default)]
struct Views {
    markers: Vec<(PoiId, Category, MarkerHandle)>,
    rows: Vec<(PoiId, RowHandle)>,
}

impl Views {
    fn clear(&mut self) {
        for (_, _, marker) in self.markers.drain(..) {
            marker.remove();
        }
        for (_, row) in self.rows.drain(..) {
            row.element.remove();
        }
    }

    fn restyle(&self, active: Option<&PoiId>) {
        for (id, category, marker) in &self.markers {
            let style = MarkerStyle::new(*category, active == Some(id));
            if let Err(e) = marker.restyle(&style) {
                warn(&format!("failed to restyle marker {id}: {e:?}"));
            }
        }
        for (id, row) in &self.rows {
            if let Err(e) = dom::set_row_active(&row.element, active == Some(id)) {
                warn(&format!("failed to restyle row {id}: {e:?}"));
            }
        }
    }
}

/// Handles that event closures clone out before touching any other state.
#[derive(Clone)]
struct Shared {
    config: Rc<MountConfig>,
    store: Rc<RefCell<LocationStore>>,
    sync: MapListSyncController,
}

thread_local! {
    static SHARED: RefCell<Option<Shared>> = const { RefCell::new(None) };
    static MAPS: RefCell<Maps> = RefCell::new(Maps::default());
    static PREVIEW: RefCell<Option<Preview>> = const { RefCell::new(None) };
    static SCROLL: RefCell<Scroll> = RefCell::new(Scroll::default());
    static VIEWS: RefCell<Views> = RefCell::new(Views::default());
    static FRAME: RefCell<Option<Closure<dyn FnMut(f64)>>> = const { RefCell::new(None) };
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn warn(msg: &str) {
    web_sys::console::warn_1(&JsValue::from_str(msg));
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn shared() -> Option<Shared> {
    SHARED.with(|s| s.borrow().clone())
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("window unavailable"))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Wires the page. `config` is a plain object matching `MountConfig`;
/// `undefined` uses the defaults.
#[wasm_bindgen]
pub fn mount(config: JsValue) -> Result<(), JsValue> {
    let config = parse_config(&config)?;
    let window = window()?;
    let document = dom::document()?;

    let store = LocationStore::new(SystemClock);
    let store = match BrowserSessionStore::new() {
        Ok(session) => store.with_session(session),
        Err(e) => {
            warn(&format!("session cache disabled: {e}"));
            store
        }
    };

    mount_maps(&document, &config)?;
    mount_preview(&document, &config)?;
    install_scroll_listeners(&window)?;

    let shared = Shared {
        config: Rc::new(config),
        store: Rc::new(RefCell::new(store)),
        sync: MapListSyncController::new(),
    };
    // Lives for the page; never unsubscribed.
    let _ = shared
        .sync
        .subscribe(|active| {
            // Skipped while views are being rebuilt; rebuilt views read the
            // active id themselves.
            VIEWS.with(|v| {
                if let Ok(views) = v.try_borrow() {
                    views.restyle(active.as_ref());
                }
            })
        });
    SHARED.with(|s| *s.borrow_mut() = Some(shared));

    on_scroll();
    start_load(false);
    log("freemap viewer mounted");
    Ok(())
}

fn parse_config(config: &JsValue) -> Result<MountConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(MountConfig::default());
    }
    let json = js_sys::JSON::stringify(config)?
        .as_string()
        .unwrap_or_default();
    serde_json::from_str(&json).map_err(js_err)
}

fn mount_maps(document: &Document, config: &MountConfig) -> Result<(), JsValue> {
    let mut maps = Maps::default();
    if document.get_element_by_id(&config.background_map_id).is_some() {
        maps.background = Some(MapSlot::mount(
            &config.background_map_id,
            ViewportConfig::background(),
            BACKGROUND_TILES,
        )?);
    }
    if document.get_element_by_id(&config.featured_map_id).is_some() {
        maps.featured = Some(MapSlot::mount(
            &config.featured_map_id,
            ViewportConfig::featured(),
            FEATURED_TILES,
        )?);
    }
    MAPS.with(|m| *m.borrow_mut() = maps);

    // The background map follows whole-page progress.
    SCROLL.with(|s| {
        let _ = s.borrow().page.subscribe(|progress| {
            MAPS.with(|m| {
                if let Some(slot) = m.borrow_mut().background.as_mut() {
                    let command = slot.controller.apply_progress(*progress);
                    slot.surface.apply(&command);
                }
            });
        });
    });
    Ok(())
}

fn mount_preview(document: &Document, config: &MountConfig) -> Result<(), JsValue> {
    let Some(root) = document.get_element_by_id(&config.preview_section_id) else {
        return Ok(());
    };
    let animator = preview_animator().map_err(js_err)?;
    let section_el = root.clone().dyn_into::<HtmlElement>().ok();
    PREVIEW.with(|p| *p.borrow_mut() = Some(Preview { animator, root }));

    SCROLL.with(|s| {
        let mut s = s.borrow_mut();
        s.section_el = section_el;
        let _ = s.section.subscribe(|progress| {
            PREVIEW.with(|p| {
                if let Some(preview) = p.borrow().as_ref() {
                    let frame = preview.animator.sample(*progress);
                    if let Err(e) = dom::apply_frame(&preview.root, &frame) {
                        warn(&format!("failed to style preview: {e:?}"));
                    }
                }
            });
        });
    });
    Ok(())
}

fn install_scroll_listeners(window: &Window) -> Result<(), JsValue> {
    let frame = Closure::<dyn FnMut(f64)>::new(|_ts: f64| on_frame());
    FRAME.with(|f| *f.borrow_mut() = Some(frame));

    for event in ["scroll", "resize"] {
        let listener = Closure::<dyn FnMut()>::new(on_scroll);
        window.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())?;
        listener.forget();
    }
    Ok(())
}

fn page_sample(window: &Window) -> Option<ScrollSample> {
    let root = window.document()?.document_element()?;
    let scroll_y = window.scroll_y().ok()?;
    let viewport_h = window.inner_height().ok()?.as_f64()?;
    Some(ScrollSample::new(
        scroll_y,
        root.scroll_height() as f64,
        viewport_h,
    ))
}

fn section_sample(window: &Window, section: &HtmlElement) -> Option<ScrollSample> {
    let scroll_y = window.scroll_y().ok()?;
    let viewport_h = window.inner_height().ok()?.as_f64()?;
    let top = section.get_bounding_client_rect().top() + scroll_y;
    Some(ScrollSample::within_section(
        scroll_y,
        top,
        section.offset_height() as f64,
        viewport_h,
    ))
}

fn on_scroll() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let need_frame = SCROLL.with(|s| {
        let mut s = s.borrow_mut();
        let mut need = false;
        if let Some(sample) = page_sample(&window) {
            need |= s.page_sampler.push(sample);
        }
        let section = s
            .section_el
            .as_ref()
            .and_then(|el| section_sample(&window, el));
        if let Some(sample) = section {
            need |= s.section_sampler.push(sample);
        }
        need
    });
    if need_frame {
        let requested = FRAME.with(|f| match f.borrow().as_ref() {
            Some(cb) => window.request_animation_frame(cb.as_ref().unchecked_ref()),
            None => Err(JsValue::from_str("frame callback not installed")),
        });
        // The samplers stay armed until a flush, so publish now instead.
        if let Err(e) = requested {
            warn(&format!("requestAnimationFrame failed: {e:?}"));
            on_frame();
        }
    }
}

fn on_frame() {
    // Trackers notify map and preview subscribers, which never touch SCROLL.
    SCROLL.with(|s| {
        let mut guard = s.borrow_mut();
        let s = &mut *guard;
        s.page_sampler.flush(&s.page);
        s.section_sampler.flush(&s.section);
    });
}

fn start_load(force_refresh: bool) {
    let Some(shared) = shared() else {
        warn("load requested before mount");
        return;
    };
    let start = shared.store.borrow_mut().begin_load(force_refresh);
    match start {
        LoadStart::Cached(records) => render_records(&shared, &records),
        LoadStart::Fetch(ticket) => {
            render_loading(&shared);
            spawn_local(async move {
                let fetcher = GlooFetcher::new(&shared.config.api_base);
                let result = fetcher.fetch().await;
                let outcome = shared.store.borrow_mut().complete(ticket, result);
                match outcome {
                    Ok(records) => render_records(&shared, &records),
                    Err(LoadError::Superseded) => {}
                    Err(LoadError::Fetch(e)) => render_failed(&shared, &e),
                }
            });
        }
    }
}

fn set_text_if_present(id: &str, text: &str) {
    if dom::element(id).is_ok() {
        if let Err(e) = dom::set_text(id, text) {
            warn(&format!("failed to update #{id}: {e:?}"));
        }
    }
}

fn render_loading(shared: &Shared) {
    VIEWS.with(|v| v.borrow_mut().clear());
    set_text_if_present(&shared.config.status_id, "Loading locations...");
    set_text_if_present(&shared.config.list_header_id, "");
}

fn render_failed(shared: &Shared, error: &FetchError) {
    warn(&format!("location load failed: {error}"));
    VIEWS.with(|v| v.borrow_mut().clear());
    set_text_if_present(
        &shared.config.status_id,
        "Could not load locations. Try again.",
    );
}

fn render_records(shared: &Shared, records: &[Poi]) {
    shared.sync.reconcile(records);
    let markers = shared.sync.markers(records);
    let rows = shared.sync.rows(records);

    VIEWS.with(|v| {
        let mut views = v.borrow_mut();
        views.clear();

        MAPS.with(|m| {
            if let Some(slot) = m.borrow().featured.as_ref() {
                for view in &markers {
                    match add_marker(slot, view) {
                        Ok(handle) => views.markers.push(handle),
                        Err(e) => warn(&format!("failed to add marker {}: {e:?}", view.id)),
                    }
                }
            }
        });

        if let (Ok(document), Ok(list)) = (dom::document(), dom::element(&shared.config.list_id)) {
            for row in &rows {
                let id = row.id.clone();
                let built = dom::build_row(&document, row, move |kind| dispatch(&id, kind))
                    .and_then(|handle| list.append_child(&handle.element).map(|_| handle));
                match built {
                    Ok(handle) => views.rows.push((row.id.clone(), handle)),
                    Err(e) => warn(&format!("failed to add row {}: {e:?}", row.id)),
                }
            }
        }
    });

    set_text_if_present(&shared.config.status_id, "");
    set_text_if_present(&shared.config.list_header_id, &list_header(records.len()));
}

fn add_marker(
    slot: &MapSlot,
    view: &MarkerView,
) -> Result<(PoiId, Category, MarkerHandle), JsValue> {
    let id = view.id.clone();
    let handle = MarkerHandle::add(slot.surface.map(), view, move |kind| dispatch(&id, kind))?;
    Ok((view.id.clone(), view.category, handle))
}

/// Routes a marker or row event into the sync controller.
fn dispatch(id: &PoiId, kind: &str) {
    let Some(shared) = shared() else {
        return;
    };
    let store = shared.store.borrow();
    let records = store.records();
    match kind {
        "enter" => {
            shared.sync.hover_enter(records, id);
        }
        "leave" => {
            shared.sync.hover_leave(id);
        }
        "focus" => {
            shared.sync.focus(records, id);
        }
        "blur" => {
            shared.sync.blur(id);
        }
        "click" => select(&shared, records, id),
        _ => {}
    }
}

fn select(shared: &Shared, records: &[Poi], id: &PoiId) {
    let effects = MAPS.with(|m| {
        let mut maps = m.borrow_mut();
        match maps.featured.as_mut() {
            Some(slot) => {
                let effects = shared.sync.click(records, id, &mut slot.controller);
                if let Some(pan) = effects.as_ref().and_then(|e| e.pan) {
                    slot.surface.apply(&pan);
                }
                effects
            }
            None => {
                let mut detached = MapViewportController::new(ViewportConfig::featured());
                shared.sync.click(records, id, &mut detached)
            }
        }
    });
    if let Some(effects) = effects {
        if let Err(e) = dom::scroll_into_view(&effects.scroll_into_view) {
            warn(&format!("failed to scroll to {}: {e:?}", effects.scroll_into_view));
        }
    }
}

#[wasm_bindgen]
pub fn refresh_locations() {
    start_load(true);
}

/// Clears the cached list and refetches.
#[wasm_bindgen]
pub fn invalidate_locations() {
    if let Some(shared) = shared() {
        shared.store.borrow_mut().invalidate();
    }
    start_load(false);
}

/// Toggles user gestures on the background map. Returns the new state.
#[wasm_bindgen]
pub fn toggle_map_interaction() -> bool {
    MAPS.with(|m| {
        let mut maps = m.borrow_mut();
        let Some(slot) = maps.background.as_mut() else {
            return false;
        };
        let command = slot.controller.toggle_interactive();
        slot.surface.apply(&command);
        slot.controller.is_interactive()
    })
}

#[wasm_bindgen]
pub fn select_location(id: &str) {
    dispatch(&PoiId::new(id), "click");
}

#[wasm_bindgen]
pub fn hover_location(id: &str) {
    dispatch(&PoiId::new(id), "enter");
}

#[wasm_bindgen]
pub fn leave_location(id: &str) {
    dispatch(&PoiId::new(id), "leave");
}

#[wasm_bindgen]
pub fn active_location() -> Option<String> {
    shared()?.sync.active_id().map(|id| id.to_string())
}

#[wasm_bindgen]
pub fn page_progress() -> f64 {
    SCROLL.with(|s| s.borrow().page.progress())
}

#[wasm_bindgen]
pub fn preview_progress() -> f64 {
    SCROLL.with(|s| s.borrow().section.progress())
}

/// Store counters as a JSON object string.
#[wasm_bindgen]
pub fn location_metrics() -> String {
    let Some(shared) = shared() else {
        return "{}".to_string();
    };
    let snapshot = shared.store.borrow().metrics().snapshot();
    let mut out = serde_json::Map::new();
    for (name, value) in snapshot.counters {
        out.insert(name.to_string(), serde_json::json!(value));
    }
    for (name, value) in snapshot.gauges {
        out.insert(name.to_string(), serde_json::json!(value));
    }
    serde_json::Value::Object(out).to_string()
}
