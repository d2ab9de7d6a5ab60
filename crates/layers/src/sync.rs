use catalog::poi::{Category, Poi};
use foundation::geo::LatLng;
use foundation::ids::PoiId;
use runtime::signal::{ReadSignal, Signal, Subscription};
use tracing::debug;

use crate::symbology::{MarkerStyle, category_style};
use crate::viewport::{MapViewportController, ViewCommand};

/// DOM id of the list row for `id`.
pub fn row_dom_id(id: &PoiId) -> String {
    format!("location-{id}")
}

/// Count header above the list.
pub fn list_header(count: usize) -> String {
    format!("{count} Locations")
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupView {
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub details_href: String,
}

impl PopupView {
    pub fn for_poi(poi: &Poi) -> Self {
        Self {
            title: poi.name.clone(),
            description: poi.description.clone(),
            thumbnail_url: poi.thumbnail_url.clone(),
            details_href: poi.details_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerView {
    pub id: PoiId,
    pub position: LatLng,
    pub title: String,
    pub category: Category,
    pub active: bool,
    pub style: MarkerStyle,
    pub popup: PopupView,
}

impl MarkerView {
    pub fn new(poi: &Poi, active: bool) -> Self {
        Self {
            id: poi.id.clone(),
            position: poi.position(),
            title: poi.name.clone(),
            category: poi.category,
            active,
            style: MarkerStyle::new(poi.category, active),
            popup: PopupView::for_poi(poi),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: PoiId,
    pub dom_id: String,
    pub name: String,
    pub description: String,
    pub thumbnail_url: String,
    pub category_label: String,
    pub color_hex: &'static str,
    pub aria_label: String,
    pub active: bool,
}

impl RowView {
    pub fn new(poi: &Poi, active: bool) -> Self {
        Self {
            id: poi.id.clone(),
            dom_id: row_dom_id(&poi.id),
            name: poi.name.clone(),
            description: poi.description.clone(),
            thumbnail_url: poi.thumbnail_url.clone(),
            category_label: poi.category.label(),
            color_hex: category_style(poi.category).color_hex,
            aria_label: format!("View {} on map", poi.name),
            active,
        }
    }
}

/// Side effects a click asks the host to perform.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEffects {
    /// `None` when the POI has no usable position.
    pub pan: Option<ViewCommand>,
    /// DOM id of the row to scroll into view.
    pub scroll_into_view: String,
}

/// Shared highlight state between the map markers and the list rows.
///
/// Holds at most one active id. The record list is always passed in by the
/// caller; ids outside it are ignored, so nothing reacts while no records are
/// loaded.
#[derive(Debug, Clone)]
pub struct MapListSyncController {
    active: Signal<Option<PoiId>>,
}

impl Default for MapListSyncController {
    fn default() -> Self {
        Self::new()
    }
}

impl MapListSyncController {
    pub fn new() -> Self {
        Self {
            active: Signal::new(None),
        }
    }

    pub fn active_id(&self) -> Option<PoiId> {
        self.active.get()
    }

    pub fn is_active(&self, id: &PoiId) -> bool {
        self.active.get().as_ref() == Some(id)
    }

    pub fn state(&self) -> ReadSignal<Option<PoiId>> {
        self.active.reader()
    }

    pub fn subscribe(&self, callback: impl Fn(&Option<PoiId>) + 'static) -> Subscription {
        self.active.subscribe(callback)
    }

    fn activate(&self, records: &[Poi], id: &PoiId) -> bool {
        if !records.iter().any(|p| &p.id == id) {
            debug!(%id, "ignoring event for unknown location");
            return false;
        }
        self.active.set(Some(id.clone()))
    }

    fn release(&self, id: &PoiId) -> bool {
        if !self.is_active(id) {
            return false;
        }
        self.active.set(None)
    }

    /// Returns `true` if the active id changed.
    pub fn hover_enter(&self, records: &[Poi], id: &PoiId) -> bool {
        self.activate(records, id)
    }

    /// Clears the active id only if it is `id`; a late leave from a previously
    /// hovered item does nothing.
    pub fn hover_leave(&self, id: &PoiId) -> bool {
        self.release(id)
    }

    pub fn focus(&self, records: &[Poi], id: &PoiId) -> bool {
        self.activate(records, id)
    }

    pub fn blur(&self, id: &PoiId) -> bool {
        self.release(id)
    }

    /// Activates `id` and returns the pan and scroll the host should run.
    pub fn click(
        &self,
        records: &[Poi],
        id: &PoiId,
        viewport: &mut MapViewportController,
    ) -> Option<ClickEffects> {
        let poi = records.iter().find(|p| &p.id == id)?;
        self.active.set(Some(id.clone()));
        debug!(%id, "location selected");
        Some(ClickEffects {
            pan: viewport.focus(poi),
            scroll_into_view: row_dom_id(id),
        })
    }

    /// Drops the active id if it no longer names a loaded record.
    pub fn reconcile(&self, records: &[Poi]) -> bool {
        match self.active.get() {
            Some(id) if !records.iter().any(|p| p.id == id) => self.active.set(None),
            _ => false,
        }
    }

    pub fn markers(&self, records: &[Poi]) -> Vec<MarkerView> {
        let active = self.active.get();
        records
            .iter()
            .map(|p| MarkerView::new(p, active.as_ref() == Some(&p.id)))
            .collect()
    }

    pub fn rows(&self, records: &[Poi]) -> Vec<RowView> {
        let active = self.active.get();
        records
            .iter()
            .map(|p| RowView::new(p, active.as_ref() == Some(&p.id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::ViewportConfig;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn poi(id: u64, name: &str, category: Category) -> Poi {
        Poi {
            id: PoiId::from(id),
            name: name.into(),
            latitude: 48.86 + id as f64 * 0.01,
            longitude: 2.34,
            category,
            description: format!("{name} description"),
            thumbnail_url: format!("https://img.example/{id}.jpg"),
        }
    }

    fn records() -> Vec<Poi> {
        vec![
            poi(1, "Louvre", Category::Landmark),
            poi(2, "Café de Flore", Category::Cafe),
            poi(3, "Le Comptoir", Category::RestaurantBar),
        ]
    }

    #[test]
    fn late_leave_from_previous_item_keeps_newer_active() {
        let sync = MapListSyncController::new();
        let recs = records();
        let (a, b) = (PoiId::from(1u64), PoiId::from(2u64));

        assert!(sync.hover_enter(&recs, &a));
        assert!(sync.hover_enter(&recs, &b));
        assert!(!sync.hover_leave(&a));
        assert_eq!(sync.active_id(), Some(b.clone()));

        assert!(sync.hover_leave(&b));
        assert_eq!(sync.active_id(), None);
    }

    #[test]
    fn focus_and_blur_follow_the_same_rules() {
        let sync = MapListSyncController::new();
        let recs = records();
        sync.focus(&recs, &PoiId::from(3u64));
        assert!(!sync.blur(&PoiId::from(1u64)));
        assert!(sync.blur(&PoiId::from(3u64)));
        assert_eq!(sync.active_id(), None);
    }

    #[test]
    fn click_activates_pans_and_scrolls() {
        let sync = MapListSyncController::new();
        let recs = records();
        let mut map = MapViewportController::new(ViewportConfig::featured());

        let effects = sync.click(&recs, &PoiId::from(2u64), &mut map).unwrap();
        assert_eq!(
            effects,
            ClickEffects {
                pan: Some(ViewCommand::PanTo {
                    center: recs[1].position(),
                    duration_s: 0.5,
                }),
                scroll_into_view: "location-2".to_string(),
            }
        );

        let active_markers: Vec<_> = sync
            .markers(&recs)
            .into_iter()
            .filter(|m| m.active)
            .map(|m| m.id)
            .collect();
        let active_rows: Vec<_> = sync
            .rows(&recs)
            .into_iter()
            .filter(|r| r.active)
            .map(|r| r.id)
            .collect();
        assert_eq!(active_markers, vec![PoiId::from(2u64)]);
        assert_eq!(active_rows, vec![PoiId::from(2u64)]);
    }

    #[test]
    fn events_are_ignored_without_records() {
        let sync = MapListSyncController::new();
        let mut map = MapViewportController::new(ViewportConfig::featured());
        let id = PoiId::from(1u64);

        assert!(!sync.hover_enter(&[], &id));
        assert!(sync.click(&[], &id, &mut map).is_none());
        assert_eq!(sync.active_id(), None);
        assert!(sync.markers(&[]).is_empty());
        assert!(sync.rows(&[]).is_empty());
        assert_eq!(list_header(0), "0 Locations");
    }

    #[test]
    fn reconcile_drops_vanished_active_id() {
        let sync = MapListSyncController::new();
        let recs = records();
        sync.hover_enter(&recs, &PoiId::from(3u64));

        assert!(!sync.reconcile(&recs));
        assert!(sync.reconcile(&recs[..2]));
        assert_eq!(sync.active_id(), None);
    }

    #[test]
    fn views_mirror_records_in_order() {
        let sync = MapListSyncController::new();
        let recs = records();
        sync.hover_enter(&recs, &PoiId::from(1u64));

        let rows = sync.rows(&recs);
        assert_eq!(rows.len(), recs.len());
        assert_eq!(rows[2].dom_id, "location-3");
        assert_eq!(rows[2].category_label, "restaurant bar");
        assert_eq!(rows[2].aria_label, "View Le Comptoir on map");
        assert_eq!(rows[2].color_hex, "#10b981");

        let markers = sync.markers(&recs);
        assert_eq!(markers.len(), recs.len());
        assert_eq!(markers[0].style.size_px, 40);
        assert!(markers[0].style.bounce);
        assert_eq!(markers[1].style.size_px, 32);
        assert_eq!(markers[1].popup.details_href, "/locations/2");
        assert_eq!(list_header(rows.len()), "3 Locations");
    }

    #[test]
    fn subscribers_see_each_change_once() {
        let sync = MapListSyncController::new();
        let recs = records();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let sub = sync.subscribe(move |id| sink.borrow_mut().push(id.clone()));

        sync.hover_enter(&recs, &PoiId::from(1u64));
        sync.focus(&recs, &PoiId::from(1u64));
        sync.hover_leave(&PoiId::from(1u64));
        assert!(sub.unsubscribe());
        sync.hover_enter(&recs, &PoiId::from(2u64));

        assert_eq!(*seen.borrow(), vec![Some(PoiId::from(1u64)), None]);
    }
}
