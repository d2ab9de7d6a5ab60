use std::collections::BTreeMap;

use foundation::math::clamp;

use crate::track::Track;

/// Screens shown inside the simulated device, in scroll order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Map,
    Detail,
    Saved,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Map, Phase::Detail, Phase::Saved];

    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Map => Some(Phase::Detail),
            Phase::Detail => Some(Phase::Saved),
            Phase::Saved => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Map => "map",
            Phase::Detail => "detail",
            Phase::Saved => "saved",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PhaseVisualState {
    pub opacity: f64,
    pub translate_y_px: f64,
    pub scale: f64,
}

impl PhaseVisualState {
    pub const IDENTITY: Self = Self {
        opacity: 1.0,
        translate_y_px: 0.0,
        scale: 1.0,
    };

    pub const HIDDEN: Self = Self {
        opacity: 0.0,
        translate_y_px: 0.0,
        scale: 1.0,
    };
}

impl Default for PhaseVisualState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Breakpoint curves for one tracked element.
///
/// Properties without a curve keep their identity value. An element placed
/// `within` a phase has its opacity multiplied by that phase's opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementCurves {
    pub opacity: Track,
    pub translate_y_px: Track,
    pub scale: Track,
    pub within: Option<Phase>,
}

impl Default for ElementCurves {
    fn default() -> Self {
        Self {
            opacity: Track::constant(1.0),
            translate_y_px: Track::constant(0.0),
            scale: Track::constant(1.0),
            within: None,
        }
    }
}

impl ElementCurves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_opacity(mut self, track: Track) -> Self {
        self.opacity = track;
        self
    }

    pub fn with_translate_y(mut self, track: Track) -> Self {
        self.translate_y_px = track;
        self
    }

    pub fn with_scale(mut self, track: Track) -> Self {
        self.scale = track;
        self
    }

    pub fn within(mut self, phase: Phase) -> Self {
        self.within = Some(phase);
        self
    }

    pub fn sample(&self, progress: f64) -> PhaseVisualState {
        PhaseVisualState {
            opacity: clamp(self.opacity.sample(progress), 0.0, 1.0),
            translate_y_px: self.translate_y_px.sample(progress),
            scale: self.scale.sample(progress),
        }
    }
}

/// Progress range where `from` fades out while `to` fades in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransitionBand {
    pub from: Phase,
    pub to: Phase,
    pub start: f64,
    pub end: f64,
}

impl TransitionBand {
    pub fn new(from: Phase, to: Phase, start: f64, end: f64) -> Self {
        Self {
            from,
            to,
            start,
            end,
        }
    }

    pub fn contains(&self, progress: f64) -> bool {
        self.start <= progress && progress <= self.end
    }
}

/// Visual state of every phase and tracked element at one progress value.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualFrame {
    pub progress: f64,
    pub phases: BTreeMap<Phase, PhaseVisualState>,
    pub elements: BTreeMap<String, PhaseVisualState>,
}

impl VisualFrame {
    pub fn phase(&self, phase: Phase) -> PhaseVisualState {
        self.phases
            .get(&phase)
            .copied()
            .unwrap_or(PhaseVisualState::HIDDEN)
    }

    pub fn element(&self, name: &str) -> Option<PhaseVisualState> {
        self.elements.get(name).copied()
    }
}

/// Maps progress to visual state through declarative curves.
///
/// Phase curves drive whole screens; element curves are layered on top.
/// Sampling is a pure function of progress, so it can be re-run for any
/// value in any order.
#[derive(Debug, Clone, Default)]
pub struct PhaseAnimator {
    phases: BTreeMap<Phase, ElementCurves>,
    elements: BTreeMap<String, ElementCurves>,
    bands: Vec<TransitionBand>,
}

impl PhaseAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_phase(&mut self, phase: Phase, curves: ElementCurves) {
        self.phases.insert(phase, curves);
    }

    /// Registers (or replaces) a tracked element.
    pub fn set_element(&mut self, name: impl Into<String>, curves: ElementCurves) {
        self.elements.insert(name.into(), curves);
    }

    pub fn add_band(&mut self, band: TransitionBand) {
        self.bands.push(band);
        self.bands
            .sort_by(|a, b| a.start.total_cmp(&b.start).then(a.from.cmp(&b.from)));
    }

    pub fn bands(&self) -> &[TransitionBand] {
        &self.bands
    }

    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(|k| k.as_str())
    }

    pub fn band_at(&self, progress: f64) -> Option<&TransitionBand> {
        self.bands.iter().find(|b| b.contains(progress))
    }

    /// Unconfigured phases are hidden.
    pub fn phase_state(&self, phase: Phase, progress: f64) -> PhaseVisualState {
        let progress = clamp(progress, 0.0, 1.0);
        self.phases
            .get(&phase)
            .map(|c| c.sample(progress))
            .unwrap_or(PhaseVisualState::HIDDEN)
    }

    pub fn element_state(&self, name: &str, progress: f64) -> Option<PhaseVisualState> {
        let progress = clamp(progress, 0.0, 1.0);
        let curves = self.elements.get(name)?;
        let mut state = curves.sample(progress);
        if let Some(phase) = curves.within {
            state.opacity *= self.phase_state(phase, progress).opacity;
        }
        Some(state)
    }

    /// Phases at full opacity. Outside transition bands this holds exactly one.
    pub fn fully_visible(&self, progress: f64) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|p| self.phase_state(*p, progress).opacity >= 1.0)
            .collect()
    }

    /// Phase with the highest opacity; ties resolve to the later phase.
    pub fn dominant_phase(&self, progress: f64) -> Phase {
        let mut best = Phase::Map;
        let mut best_opacity = f64::NEG_INFINITY;
        for phase in Phase::ALL {
            let opacity = self.phase_state(phase, progress).opacity;
            if opacity >= best_opacity {
                best = phase;
                best_opacity = opacity;
            }
        }
        best
    }

    pub fn sample(&self, progress: f64) -> VisualFrame {
        let progress = clamp(progress, 0.0, 1.0);
        let phases = Phase::ALL
            .into_iter()
            .map(|p| (p, self.phase_state(p, progress)))
            .collect();
        let elements = self
            .elements
            .keys()
            .filter_map(|name| {
                self.element_state(name, progress)
                    .map(|s| (name.clone(), s))
            })
            .collect();
        VisualFrame {
            progress,
            phases,
            elements,
        }
    }
}
