//! Breakpoint tables for the live-preview section.
//!
//! The section is three viewport heights tall; its content is pinned while
//! section progress runs from 0 to 1 through the map, place-detail and
//! saved-locations screens.

use crate::phase::{ElementCurves, Phase, PhaseAnimator, TransitionBand};
use crate::track::{Track, TrackError};

pub const MARKERS: [&str; 3] = ["map.marker.0", "map.marker.1", "map.marker.2"];
pub const BOTTOM_SHEET: &str = "detail.bottom_sheet";
pub const SAVED_ITEMS: [&str; 3] = ["saved.item.0", "saved.item.1", "saved.item.2"];

pub const MAP_TO_DETAIL: (f64, f64) = (0.25, 0.35);
pub const DETAIL_TO_SAVED: (f64, f64) = (0.58, 0.68);

/// Stagger between consecutive marker pop-ins.
const MARKER_STAGGER: f64 = 0.05;
/// Stagger between consecutive saved-list rows sliding up.
const ITEM_STAGGER: f64 = 0.04;

pub fn preview_animator() -> Result<PhaseAnimator, TrackError> {
    let mut a = PhaseAnimator::new();

    a.set_phase(
        Phase::Map,
        ElementCurves::new()
            .with_opacity(Track::from_pairs(&[0.0, 0.25, 0.33], &[1.0, 1.0, 0.0])?)
            .with_translate_y(Track::from_pairs(&[0.25, 0.33], &[0.0, -50.0])?),
    );
    a.set_phase(
        Phase::Detail,
        ElementCurves::new()
            .with_opacity(Track::from_pairs(
                &[0.28, 0.35, 0.58, 0.66],
                &[0.0, 1.0, 1.0, 0.0],
            )?)
            .with_translate_y(Track::from_pairs(
                &[0.28, 0.35, 0.58, 0.66],
                &[50.0, 0.0, 0.0, -50.0],
            )?),
    );
    a.set_phase(
        Phase::Saved,
        ElementCurves::new()
            .with_opacity(Track::from_pairs(&[0.60, 0.68, 1.0], &[0.0, 1.0, 1.0])?)
            .with_translate_y(Track::from_pairs(&[0.60, 0.68], &[50.0, 0.0])?),
    );

    a.add_band(TransitionBand::new(
        Phase::Map,
        Phase::Detail,
        MAP_TO_DETAIL.0,
        MAP_TO_DETAIL.1,
    ));
    a.add_band(TransitionBand::new(
        Phase::Detail,
        Phase::Saved,
        DETAIL_TO_SAVED.0,
        DETAIL_TO_SAVED.1,
    ));

    for (i, name) in MARKERS.iter().enumerate() {
        let start = i as f64 * MARKER_STAGGER;
        a.set_element(
            *name,
            ElementCurves::new()
                .with_scale(Track::from_pairs(
                    &[start, start + 0.1, start + 0.2],
                    &[0.5, 1.2, 1.0],
                )?)
                .within(Phase::Map),
        );
    }

    a.set_element(
        BOTTOM_SHEET,
        ElementCurves::new()
            .with_translate_y(Track::from_pairs(&[0.33, 0.45], &[100.0, 0.0])?)
            .within(Phase::Detail),
    );

    // Rows share one fade; only the slide is staggered.
    let row_fade = Track::from_pairs(&[0.68, 0.75], &[0.0, 1.0])?;
    for (i, name) in SAVED_ITEMS.iter().enumerate() {
        let start = 0.68 + i as f64 * ITEM_STAGGER;
        a.set_element(
            *name,
            ElementCurves::new()
                .with_opacity(row_fade.clone())
                .with_translate_y(Track::from_pairs(&[start, start + 0.07], &[30.0, 0.0])?)
                .within(Phase::Saved),
        );
    }

    Ok(a)
}
