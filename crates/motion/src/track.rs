use foundation::math::lerp;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControlPoint {
    pub progress: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    Empty,
    LengthMismatch { inputs: usize, outputs: usize },
    NonFinite { index: usize },
    Unordered { index: usize },
}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackError::Empty => write!(f, "track needs at least one control point"),
            TrackError::LengthMismatch { inputs, outputs } => {
                write!(
                    f,
                    "track input/output length mismatch: inputs={inputs} outputs={outputs}"
                )
            }
            TrackError::NonFinite { index } => {
                write!(f, "control point {index} is not finite")
            }
            TrackError::Unordered { index } => {
                write!(f, "control point {index} goes backwards in progress")
            }
        }
    }
}

impl std::error::Error for TrackError {}

/// Piecewise-linear curve over progress.
///
/// Control points are ordered by progress. Two points at the same progress
/// form a cliff: the curve jumps there and takes the later point's value from
/// that progress onward. Outside the first/last point the curve holds the end
/// values.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    points: Vec<ControlPoint>,
}

impl Track {
    pub fn new(points: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, TrackError> {
        let points: Vec<ControlPoint> = points
            .into_iter()
            .map(|(progress, value)| ControlPoint { progress, value })
            .collect();

        if points.is_empty() {
            return Err(TrackError::Empty);
        }
        for (index, p) in points.iter().enumerate() {
            if !p.progress.is_finite() || !p.value.is_finite() {
                return Err(TrackError::NonFinite { index });
            }
            if index > 0 && p.progress < points[index - 1].progress {
                return Err(TrackError::Unordered { index });
            }
        }
        Ok(Self { points })
    }

    /// Builds a track from parallel input (progress) and output (value) lists.
    pub fn from_pairs(inputs: &[f64], outputs: &[f64]) -> Result<Self, TrackError> {
        if inputs.len() != outputs.len() {
            return Err(TrackError::LengthMismatch {
                inputs: inputs.len(),
                outputs: outputs.len(),
            });
        }
        Self::new(inputs.iter().copied().zip(outputs.iter().copied()))
    }

    pub fn constant(value: f64) -> Self {
        Self {
            points: vec![ControlPoint {
                progress: 0.0,
                value,
            }],
        }
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Progress values where the curve is allowed to jump.
    pub fn cliffs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points
            .windows(2)
            .filter(|w| w[0].progress == w[1].progress && w[0].value != w[1].value)
            .map(|w| w[0].progress)
    }

    pub fn sample(&self, progress: f64) -> f64 {
        // Index of the first point strictly after `progress`.
        let next = self.points.partition_point(|c| c.progress <= progress);
        if next == 0 {
            return self.points[0].value;
        }
        if next == self.points.len() {
            return self.points[next - 1].value;
        }
        let a = self.points[next - 1];
        let b = self.points[next];
        let t = (progress - a.progress) / (b.progress - a.progress);
        lerp(a.value, b.value, t)
    }
}

#[cfg(test)]
mod tests {
    use super::{Track, TrackError};

    #[test]
    fn interpolates_between_bracketing_points() {
        let t = Track::from_pairs(&[0.28, 0.35, 0.58, 0.66], &[50.0, 0.0, 0.0, -50.0]).unwrap();
        assert_eq!(t.sample(0.28), 50.0);
        assert!((t.sample(0.315) - 25.0).abs() < 1e-9);
        assert_eq!(t.sample(0.5), 0.0);
        assert!((t.sample(0.62) - -25.0).abs() < 1e-9);
    }

    #[test]
    fn clamps_outside_the_range() {
        let t = Track::from_pairs(&[0.6, 0.68], &[50.0, 0.0]).unwrap();
        assert_eq!(t.sample(0.0), 50.0);
        assert_eq!(t.sample(-3.0), 50.0);
        assert_eq!(t.sample(1.0), 0.0);
        assert_eq!(t.sample(9.0), 0.0);
    }

    #[test]
    fn cliff_takes_later_value_at_the_edge() {
        let t = Track::new([(0.0, 0.0), (0.5, 0.0), (0.5, 1.0), (1.0, 1.0)]).unwrap();
        assert_eq!(t.sample(0.4999), 0.0);
        assert_eq!(t.sample(0.5), 1.0);
        assert_eq!(t.cliffs().collect::<Vec<_>>(), vec![0.5]);
    }

    #[test]
    fn single_point_is_constant() {
        let t = Track::constant(0.7);
        assert_eq!(t.sample(0.0), 0.7);
        assert_eq!(t.sample(1.0), 0.7);
        assert_eq!(t.cliffs().count(), 0);
    }

    #[test]
    fn rejects_invalid_tables() {
        assert_eq!(Track::new(Vec::<(f64, f64)>::new()), Err(TrackError::Empty));
        assert_eq!(
            Track::new([(0.5, 1.0), (0.2, 0.0)]),
            Err(TrackError::Unordered { index: 1 })
        );
        assert_eq!(
            Track::new([(0.0, f64::NAN)]),
            Err(TrackError::NonFinite { index: 0 })
        );
        assert_eq!(
            Track::from_pairs(&[0.0, 1.0], &[1.0]),
            Err(TrackError::LengthMismatch {
                inputs: 2,
                outputs: 1
            })
        );
    }

    #[test]
    fn nan_progress_holds_first_value() {
        let t = Track::from_pairs(&[0.0, 1.0], &[3.0, 4.0]).unwrap();
        assert_eq!(t.sample(f64::NAN), 3.0);
    }
}
