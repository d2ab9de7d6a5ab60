use layers::sync::RowView;
use motion::phase::{Phase, PhaseVisualState, VisualFrame};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition};

pub fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document unavailable"))
}

pub fn element(id: &str) -> Result<Element, JsValue> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn style_visual(el: &Element, state: PhaseVisualState) -> Result<(), JsValue> {
    let Some(el) = el.dyn_ref::<HtmlElement>() else {
        return Ok(());
    };
    let style = el.style();
    style.set_property("opacity", &format!("{:.4}", state.opacity))?;
    style.set_property(
        "transform",
        &format!(
            "translateY({:.2}px) scale({:.4})",
            state.translate_y_px, state.scale
        ),
    )?;
    style.set_property(
        "pointer-events",
        if state.opacity > 0.0 { "auto" } else { "none" },
    )
}

/// Writes `frame` onto `[data-phase]` and `[data-element]` nodes under `root`.
pub fn apply_frame(root: &Element, frame: &VisualFrame) -> Result<(), JsValue> {
    for phase in Phase::ALL {
        let selector = format!("[data-phase=\"{}\"]", phase.name());
        if let Some(el) = root.query_selector(&selector)? {
            style_visual(&el, frame.phase(phase))?;
        }
    }
    for (name, state) in &frame.elements {
        let selector = format!("[data-element=\"{name}\"]");
        if let Some(el) = root.query_selector(&selector)? {
            style_visual(&el, *state)?;
        }
    }
    Ok(())
}

pub fn set_text(id: &str, text: &str) -> Result<(), JsValue> {
    element(id)?.set_text_content(Some(text));
    Ok(())
}

/// List row node and the listeners it owns.
pub struct RowHandle {
    pub element: Element,
    _listeners: Vec<Closure<dyn FnMut()>>,
}

pub fn set_row_active(el: &Element, active: bool) -> Result<(), JsValue> {
    el.class_list().toggle_with_force("is-active", active)?;
    el.set_attribute("aria-pressed", if active { "true" } else { "false" })
}

fn child(doc: &Document, tag: &str, class: &str) -> Result<Element, JsValue> {
    let el = doc.create_element(tag)?;
    el.set_class_name(class);
    Ok(el)
}

/// Builds one list row; `on_event` receives `"enter"`, `"leave"`, `"focus"`,
/// `"blur"` or `"click"`.
pub fn build_row(
    doc: &Document,
    row: &RowView,
    on_event: impl Fn(&'static str) + Clone + 'static,
) -> Result<RowHandle, JsValue> {
    let el = child(doc, "button", "freemap-row")?;
    el.set_id(&row.dom_id);
    el.set_attribute("type", "button")?;
    el.set_attribute("aria-label", &row.aria_label)?;

    let img = child(doc, "img", "freemap-row__thumb")?;
    img.set_attribute("src", &row.thumbnail_url)?;
    img.set_attribute("alt", &row.name)?;
    img.set_attribute("loading", "lazy")?;
    el.append_child(&img)?;

    let body = child(doc, "div", "freemap-row__body")?;
    let title = child(doc, "h3", "freemap-row__title")?;
    title.set_text_content(Some(&row.name));
    let badge = child(doc, "span", "freemap-row__category")?;
    badge.set_text_content(Some(&row.category_label));
    badge.set_attribute("style", &format!("color:{}", row.color_hex))?;
    let description = child(doc, "p", "freemap-row__description")?;
    description.set_text_content(Some(&row.description));
    body.append_child(&title)?;
    body.append_child(&badge)?;
    body.append_child(&description)?;
    el.append_child(&body)?;

    set_row_active(&el, row.active)?;

    let mut listeners = Vec::new();
    for (event, kind) in [
        ("mouseenter", "enter"),
        ("mouseleave", "leave"),
        ("focus", "focus"),
        ("blur", "blur"),
        ("click", "click"),
    ] {
        let on_event = on_event.clone();
        let closure = Closure::<dyn FnMut()>::new(move || on_event(kind));
        el.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        listeners.push(closure);
    }

    Ok(RowHandle {
        element: el,
        _listeners: listeners,
    })
}

pub fn scroll_into_view(id: &str) -> Result<(), JsValue> {
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::Nearest);
    element(id)?.scroll_into_view_with_scroll_into_view_options(&options);
    Ok(())
}
