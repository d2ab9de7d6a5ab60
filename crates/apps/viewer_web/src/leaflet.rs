//! Minimal bindings to the global Leaflet `L` namespace.

use js_sys::{Array, Function, Object, Reflect};
use layers::symbology::MarkerStyle;
use layers::sync::MarkerView;
use layers::viewport::{Interaction, MapSurface, ViewCommand};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::dom::escape_html;

/// Basemap tiles for one map.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TileSource {
    pub url: &'static str,
    /// `None` hides Leaflet's attribution control.
    pub attribution: Option<&'static str>,
    pub max_zoom: u8,
}

/// Dark backdrop behind the page, without attribution.
pub const BACKGROUND_TILES: TileSource = TileSource {
    url: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
    attribution: None,
    max_zoom: 19,
};

pub const FEATURED_TILES: TileSource = TileSource {
    url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
    attribution: Some(
        "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors",
    ),
    max_zoom: 19,
};

#[wasm_bindgen]
extern "C" {
    pub type LeafletMap;
    pub type Handler;
    pub type Layer;

    #[wasm_bindgen(js_namespace = L, js_name = map)]
    fn new_map(element_id: &str, options: &JsValue) -> LeafletMap;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &LeafletMap, center: &Array, zoom: f64, options: &JsValue);

    #[wasm_bindgen(method, js_name = panTo)]
    fn pan_to(this: &LeafletMap, center: &Array, options: &JsValue);

    #[wasm_bindgen(method, getter)]
    fn dragging(this: &LeafletMap) -> Handler;

    #[wasm_bindgen(method, getter, js_name = scrollWheelZoom)]
    fn scroll_wheel_zoom(this: &LeafletMap) -> Handler;

    #[wasm_bindgen(method, getter, js_name = touchZoom)]
    fn touch_zoom(this: &LeafletMap) -> Handler;

    #[wasm_bindgen(method)]
    fn enable(this: &Handler);

    #[wasm_bindgen(method)]
    fn disable(this: &Handler);

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn new_marker(position: &Array, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    fn div_icon(options: &JsValue) -> JsValue;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &LeafletMap);

    #[wasm_bindgen(method)]
    pub fn remove(this: &Layer);

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, html: &str);

    #[wasm_bindgen(method, js_name = setIcon)]
    fn set_icon(this: &Layer, icon: &JsValue);

    #[wasm_bindgen(method)]
    fn on(this: &Layer, event: &str, handler: &Function);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions {
    zoom_control: bool,
    attribution_control: bool,
    dragging: bool,
    scroll_wheel_zoom: bool,
    touch_zoom: bool,
    double_click_zoom: bool,
}

#[derive(Serialize)]
struct TileOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    attribution: Option<&'a str>,
    #[serde(rename = "maxZoom")]
    max_zoom: u8,
}

#[derive(Serialize)]
struct SetViewOptions {
    animate: bool,
}

#[derive(Serialize)]
struct PanOptions {
    animate: bool,
    duration: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IconOptions {
    html: String,
    class_name: &'static str,
    icon_size: [u32; 2],
    icon_anchor: [u32; 2],
    popup_anchor: [i32; 2],
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

fn map_options(tiles: TileSource, interaction: Interaction) -> MapOptions {
    MapOptions {
        zoom_control: false,
        attribution_control: tiles.attribution.is_some(),
        dragging: interaction.dragging,
        scroll_wheel_zoom: interaction.scroll_wheel_zoom,
        touch_zoom: interaction.touch_zoom,
        double_click_zoom: false,
    }
}

fn lat_lng(lat: f64, lng: f64) -> Array {
    Array::of2(&JsValue::from_f64(lat), &JsValue::from_f64(lng))
}

/// A Leaflet map with one tile layer.
pub struct LeafletSurface {
    map: LeafletMap,
}

impl LeafletSurface {
    pub fn mount(
        element_id: &str,
        tiles: TileSource,
        interaction: Interaction,
    ) -> Result<Self, JsValue> {
        let options = to_js(&map_options(tiles, interaction))?;
        let map = new_map(element_id, &options);
        let layer = tile_layer(
            tiles.url,
            &to_js(&TileOptions {
                attribution: tiles.attribution,
                max_zoom: tiles.max_zoom,
            })?,
        );
        layer.add_to(&map);
        Ok(Self { map })
    }

    pub fn map(&self) -> &LeafletMap {
        &self.map
    }

    fn set_handler(handler: Handler, enabled: bool) {
        if enabled {
            handler.enable();
        } else {
            handler.disable();
        }
    }
}

impl MapSurface for LeafletSurface {
    fn apply(&mut self, command: &ViewCommand) {
        match *command {
            ViewCommand::SetView {
                center,
                zoom,
                animate,
            } => {
                let options = to_js(&SetViewOptions { animate }).unwrap_or(JsValue::UNDEFINED);
                self.map
                    .set_view(&lat_lng(center.lat, center.lng), zoom, &options);
            }
            ViewCommand::PanTo { center, duration_s } => {
                let options = to_js(&PanOptions {
                    animate: true,
                    duration: duration_s,
                })
                .unwrap_or(JsValue::UNDEFINED);
                self.map.pan_to(&lat_lng(center.lat, center.lng), &options);
            }
            ViewCommand::SetInteraction(interaction) => {
                Self::set_handler(self.map.dragging(), interaction.dragging);
                Self::set_handler(self.map.scroll_wheel_zoom(), interaction.scroll_wheel_zoom);
                Self::set_handler(self.map.touch_zoom(), interaction.touch_zoom);
            }
        }
    }
}

fn icon_for(style: &MarkerStyle) -> Result<JsValue, JsValue> {
    let bounce = if style.bounce { " freemap-marker--bounce" } else { "" };
    let html = format!(
        "<div class=\"freemap-marker{bounce}\" style=\"width:{size}px;height:{size}px;background:{color}\">\
         <i data-lucide=\"{icon}\"></i></div>",
        size = style.size_px,
        color = style.category.color_hex,
        icon = style.category.icon,
    );
    Ok(div_icon(&to_js(&IconOptions {
        html,
        class_name: "freemap-marker-icon",
        icon_size: [style.size_px, style.size_px],
        icon_anchor: style.icon_anchor,
        popup_anchor: style.popup_anchor,
    })?))
}

fn popup_html(view: &MarkerView) -> String {
    let popup = &view.popup;
    format!(
        "<div class=\"freemap-popup\"><img src=\"{img}\" alt=\"{title}\"/>\
         <h3>{title}</h3><p>{description}</p><a href=\"{href}\">View details</a></div>",
        img = escape_html(&popup.thumbnail_url),
        title = escape_html(&popup.title),
        description = escape_html(&popup.description),
        href = escape_html(&popup.details_href),
    )
}

/// A marker on the map plus the event closures it owns.
pub struct MarkerHandle {
    layer: Layer,
    _listeners: Vec<Closure<dyn FnMut()>>,
}

impl MarkerHandle {
    /// Adds `view` to `map`; `on_event` receives `"enter"`, `"leave"` or `"click"`.
    pub fn add(
        map: &LeafletMap,
        view: &MarkerView,
        on_event: impl Fn(&'static str) + Clone + 'static,
    ) -> Result<Self, JsValue> {
        let options = Object::new();
        Reflect::set(&options, &"icon".into(), &icon_for(&view.style)?)?;
        Reflect::set(&options, &"title".into(), &view.title.as_str().into())?;
        Reflect::set(&options, &"alt".into(), &view.title.as_str().into())?;

        let layer = new_marker(&lat_lng(view.position.lat, view.position.lng), &options);
        layer.bind_popup(&popup_html(view));

        let mut listeners = Vec::new();
        for (event, kind) in [("mouseover", "enter"), ("mouseout", "leave"), ("click", "click")] {
            let on_event = on_event.clone();
            let closure = Closure::<dyn FnMut()>::new(move || on_event(kind));
            layer.on(event, closure.as_ref().unchecked_ref());
            listeners.push(closure);
        }
        layer.add_to(map);

        Ok(Self {
            layer,
            _listeners: listeners,
        })
    }

    pub fn restyle(&self, style: &MarkerStyle) -> Result<(), JsValue> {
        self.layer.set_icon(&icon_for(style)?);
        Ok(())
    }

    pub fn remove(self) {
        self.layer.remove();
    }
}
