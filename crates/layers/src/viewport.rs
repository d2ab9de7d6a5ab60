use catalog::poi::Poi;
use foundation::geo::{GeoOffset, LatLng};
use foundation::math::clamp;
use tracing::debug;

/// Pan duration for focus-driven moves, in seconds.
pub const FOCUS_PAN_DURATION_S: f64 = 0.5;

/// Starting view plus the displacement applied over the full progress range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportConfig {
    pub initial_center: LatLng,
    pub initial_zoom: f64,
    /// Center displacement at progress 1.
    pub offset: GeoOffset,
    /// Zoom change at progress 1.
    pub zoom_delta: f64,
    pub pan_duration_s: f64,
    /// Whether user gestures are enabled when the map mounts.
    pub interactive: bool,
}

impl ViewportConfig {
    /// San Francisco backdrop that drifts south-east and zooms in while scrolling.
    pub const fn background() -> Self {
        Self {
            initial_center: LatLng::new(37.7749, -122.4194),
            initial_zoom: 12.0,
            offset: GeoOffset::new(-0.15, 0.2),
            zoom_delta: 0.8,
            pan_duration_s: FOCUS_PAN_DURATION_S,
            interactive: false,
        }
    }

    /// Paris map next to the location list. Scrolling never moves it; users
    /// can drag and zoom it freely.
    pub const fn featured() -> Self {
        Self {
            initial_center: LatLng::new(48.8566, 2.3522),
            initial_zoom: 13.0,
            offset: GeoOffset::new(0.0, 0.0),
            zoom_delta: 0.0,
            pan_duration_s: FOCUS_PAN_DURATION_S,
            interactive: true,
        }
    }

    pub fn center_at(&self, progress: f64) -> LatLng {
        self.initial_center + self.offset * clamp(progress, 0.0, 1.0)
    }

    pub fn zoom_at(&self, progress: f64) -> f64 {
        self.initial_zoom + clamp(progress, 0.0, 1.0) * self.zoom_delta
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::background()
    }
}

/// Which user gestures the map accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub dragging: bool,
    pub scroll_wheel_zoom: bool,
    pub touch_zoom: bool,
}

impl Interaction {
    pub const LOCKED: Interaction = Interaction::uniform(false);
    pub const FREE: Interaction = Interaction::uniform(true);

    pub const fn uniform(enabled: bool) -> Self {
        Self {
            dragging: enabled,
            scroll_wheel_zoom: enabled,
            touch_zoom: enabled,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ViewCommand {
    SetView {
        center: LatLng,
        zoom: f64,
        animate: bool,
    },
    PanTo {
        center: LatLng,
        duration_s: f64,
    },
    SetInteraction(Interaction),
}

/// Something that can execute view commands, e.g. a tile map widget.
pub trait MapSurface {
    fn apply(&mut self, command: &ViewCommand);
}

/// Turns progress and focus events into map commands.
///
/// User gestures never feed back into the controller; with interaction
/// unlocked the user may move the map, and the next command moves it again.
#[derive(Debug, Clone, PartialEq)]
pub struct MapViewportController {
    config: ViewportConfig,
    center: LatLng,
    zoom: f64,
    interaction: Interaction,
}

impl MapViewportController {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            center: config.initial_center,
            zoom: config.initial_zoom,
            interaction: Interaction::uniform(config.interactive),
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Last commanded center.
    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn is_interactive(&self) -> bool {
        self.interaction != Interaction::LOCKED
    }

    /// Commands establishing the initial view and gesture lock.
    pub fn initial_commands(&self) -> [ViewCommand; 2] {
        [
            ViewCommand::SetView {
                center: self.config.initial_center,
                zoom: self.config.initial_zoom,
                animate: false,
            },
            ViewCommand::SetInteraction(self.interaction),
        ]
    }

    /// Non-animated view for `progress`. Out-of-range progress is clamped.
    pub fn apply_progress(&mut self, progress: f64) -> ViewCommand {
        self.center = self.config.center_at(progress);
        self.zoom = self.config.zoom_at(progress);
        ViewCommand::SetView {
            center: self.center,
            zoom: self.zoom,
            animate: false,
        }
    }

    /// Animated pan to `poi`, keeping the current zoom.
    ///
    /// Returns `None` for a POI without finite coordinates.
    pub fn focus(&mut self, poi: &Poi) -> Option<ViewCommand> {
        let target = poi.position();
        if !target.is_finite() {
            debug!(id = %poi.id, "ignoring focus on POI without a position");
            return None;
        }
        self.center = target;
        Some(ViewCommand::PanTo {
            center: target,
            duration_s: self.config.pan_duration_s,
        })
    }

    pub fn set_interactive(&mut self, enabled: bool) -> ViewCommand {
        self.interaction = Interaction::uniform(enabled);
        ViewCommand::SetInteraction(self.interaction)
    }

    pub fn toggle_interactive(&mut self) -> ViewCommand {
        self.set_interactive(!self.is_interactive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::poi::Category;
    use foundation::ids::PoiId;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recording(Vec<ViewCommand>);

    impl MapSurface for Recording {
        fn apply(&mut self, command: &ViewCommand) {
            self.0.push(*command);
        }
    }

    fn poi(lat: f64, lng: f64) -> Poi {
        Poi {
            id: PoiId::from(9u64),
            name: "Louvre".into(),
            latitude: lat,
            longitude: lng,
            category: Category::Landmark,
            description: String::new(),
            thumbnail_url: String::new(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn progress_endpoints_match_config() {
        let mut map = MapViewportController::new(ViewportConfig::background());
        assert_eq!(
            map.apply_progress(0.0),
            ViewCommand::SetView {
                center: LatLng::new(37.7749, -122.4194),
                zoom: 12.0,
                animate: false,
            }
        );
        let ViewCommand::SetView { center, zoom, animate } = map.apply_progress(1.0) else {
            panic!("expected SetView");
        };
        assert!(close(center.lat, 37.6249));
        assert!(close(center.lng, -122.2194));
        assert!(close(zoom, 12.8));
        assert!(!animate);
    }

    #[test]
    fn progress_is_clamped_and_idempotent() {
        let mut map = MapViewportController::new(ViewportConfig::background());
        let at_one = map.apply_progress(1.0);
        assert_eq!(map.apply_progress(7.5), at_one);
        assert_eq!(map.apply_progress(1.0), at_one);
        assert_eq!(
            map.apply_progress(-3.0),
            MapViewportController::new(ViewportConfig::background()).apply_progress(0.0)
        );
    }

    #[test]
    fn focus_pans_without_changing_zoom() {
        let mut map = MapViewportController::new(ViewportConfig::featured());
        let cmd = map.focus(&poi(48.8606, 2.3376)).unwrap();
        assert_eq!(
            cmd,
            ViewCommand::PanTo {
                center: LatLng::new(48.8606, 2.3376),
                duration_s: 0.5,
            }
        );
        assert_eq!(map.zoom(), 13.0);
        assert_eq!(map.center(), LatLng::new(48.8606, 2.3376));
    }

    #[test]
    fn focus_on_degenerate_position_is_ignored() {
        let mut map = MapViewportController::new(ViewportConfig::featured());
        assert_eq!(map.focus(&poi(f64::NAN, 2.0)), None);
        assert_eq!(map.center(), ViewportConfig::featured().initial_center);
    }

    #[test]
    fn featured_map_starts_interactive() {
        let map = MapViewportController::new(ViewportConfig::featured());
        assert!(map.is_interactive());
        assert_eq!(
            map.initial_commands()[1],
            ViewCommand::SetInteraction(Interaction::FREE)
        );
    }

    #[test]
    fn starts_locked_and_toggles() {
        let mut map = MapViewportController::new(ViewportConfig::background());
        let mut surface = Recording::default();
        for cmd in map.initial_commands() {
            surface.apply(&cmd);
        }
        assert_eq!(surface.0[1], ViewCommand::SetInteraction(Interaction::LOCKED));
        assert!(!map.is_interactive());

        surface.apply(&map.toggle_interactive());
        assert!(map.is_interactive());
        assert_eq!(surface.0[2], ViewCommand::SetInteraction(Interaction::FREE));

        surface.apply(&map.toggle_interactive());
        assert_eq!(map.interaction(), Interaction::LOCKED);
    }

    #[test]
    fn interaction_does_not_block_programmatic_moves() {
        let mut map = MapViewportController::new(ViewportConfig::background());
        map.set_interactive(true);
        let ViewCommand::SetView { zoom, .. } = map.apply_progress(0.5) else {
            panic!("expected SetView");
        };
        assert!(close(zoom, 12.4));
    }
}
