//! Continuous time interpolants
use nalgebra::{UnitQuaternion, Vector3};

use crate::{
    cfg::{Extrapolation, Interpolation},
    prelude::{AvailabilityInterval, Duration, Epoch},
};

/// Location of an [Epoch] within the knots
#[derive(Debug, Copy, Clone, PartialEq)]
struct Segment {
    /// Index of the first knot of the segment
    idx: usize,
    /// Normalized position within the segment, in [0, 1]
    s: f64,
    /// Segment width (in seconds)
    h: f64,
}

/// Strictly increasing knots, in seconds elapsed since `t0`.
#[derive(Debug, Clone, PartialEq)]
struct Knots {
    t0: Epoch,
    offsets: Vec<f64>,
    extrapolation: Extrapolation,
    /// Trailing pad (in seconds): the last value is held within the pad,
    /// whatever the extrapolation policy.
    pad: f64,
}

impl Knots {
    fn new(epochs: &[Epoch], extrapolation: Extrapolation) -> Option<Self> {
        let t0 = *epochs.first()?;
        Some(Self {
            t0,
            offsets: epochs.iter().map(|t| (*t - t0).to_seconds()).collect(),
            extrapolation,
            pad: 0.0,
        })
    }

    fn interval(&self) -> AvailabilityInterval {
        let last = self.offsets.last().copied().unwrap_or_default();
        AvailabilityInterval::new(self.t0, self.t0 + Duration::from_seconds(last))
    }

    fn locate(&self, t: Epoch) -> Option<Segment> {
        let n = self.offsets.len();
        let (first, last) = (self.offsets[0], self.offsets[n - 1]);

        let mut x = (t - self.t0).to_seconds();

        if x > last && x <= last + self.pad {
            x = last;
        } else if x < first || x > last {
            match self.extrapolation {
                Extrapolation::Reject => return None,
                Extrapolation::Hold => x = x.clamp(first, last),
            }
        }

        if n == 1 {
            return Some(Segment {
                idx: 0,
                s: 0.0,
                h: 0.0,
            });
        }

        // largest idx such that offsets[idx] <= x
        let idx = self
            .offsets
            .partition_point(|k| *k <= x)
            .saturating_sub(1)
            .min(n - 2);

        let h = self.offsets[idx + 1] - self.offsets[idx];
        let s = ((x - self.offsets[idx]) / h).clamp(0.0, 1.0);

        Some(Segment { idx, s, h })
    }
}

/// [PositionInterpolant]: continuous time position, in the frame
/// the samples were expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionInterpolant {
    knots: Knots,
    method: Interpolation,
    values: Vec<Vector3<f64>>,
    /// Hermite tangents (per second), empty in linear mode
    tangents: Vec<Vector3<f64>>,
}

impl PositionInterpolant {
    /// Builds a [PositionInterpolant] from strictly increasing [Epoch]s
    /// and their values. None if no sample is provided.
    pub fn new(
        epochs: &[Epoch],
        values: Vec<Vector3<f64>>,
        method: Interpolation,
        extrapolation: Extrapolation,
    ) -> Option<Self> {
        if epochs.len() != values.len() {
            return None;
        }

        let knots = Knots::new(epochs, extrapolation)?;

        let tangents = match method {
            Interpolation::Linear => Vec::new(),
            Interpolation::Hermite => Self::finite_difference_tangents(&knots.offsets, &values),
        };

        Some(Self {
            knots,
            method,
            values,
            tangents,
        })
    }

    fn finite_difference_tangents(offsets: &[f64], values: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        let n = values.len();
        if n < 2 {
            return vec![Vector3::zeros(); n];
        }

        let secant = |i: usize| (values[i + 1] - values[i]) / (offsets[i + 1] - offsets[i]);

        (0..n)
            .map(|i| {
                if i == 0 {
                    secant(0)
                } else if i == n - 1 {
                    secant(n - 2)
                } else {
                    (secant(i - 1) + secant(i)) / 2.0
                }
            })
            .collect()
    }

    /// Holds the last value for `pad` past the last sample,
    /// even when extrapolation is rejected.
    pub fn with_trailing_pad(mut self, pad: Duration) -> Self {
        self.knots.pad = pad.to_seconds().max(0.0);
        self
    }

    /// Interpolation method in use
    pub fn method(&self) -> Interpolation {
        self.method
    }

    /// Span of the samples
    pub fn interval(&self) -> AvailabilityInterval {
        self.knots.interval()
    }

    /// Evaluates position at `t`. None when `t` is out of span
    /// and extrapolation is rejected.
    pub fn at(&self, t: Epoch) -> Option<Vector3<f64>> {
        let Segment { idx, s, h } = self.knots.locate(t)?;

        if self.values.len() == 1 {
            return Some(self.values[0]);
        }

        let (p0, p1) = (self.values[idx], self.values[idx + 1]);

        match self.method {
            Interpolation::Linear => Some(p0.lerp(&p1, s)),
            Interpolation::Hermite => {
                let (m0, m1) = (self.tangents[idx], self.tangents[idx + 1]);
                let (s2, s3) = (s * s, s * s * s);
                let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
                let h10 = s3 - 2.0 * s2 + s;
                let h01 = -2.0 * s3 + 3.0 * s2;
                let h11 = s3 - s2;
                Some(p0 * h00 + m0 * (h10 * h) + p1 * h01 + m1 * (h11 * h))
            },
        }
    }
}

/// [OrientationInterpolant]: continuous time attitude, spherical
/// linear interpolation between consecutive (sign aligned) quaternions.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationInterpolant {
    knots: Knots,
    values: Vec<UnitQuaternion<f64>>,
}

impl OrientationInterpolant {
    /// Builds an [OrientationInterpolant] from strictly increasing [Epoch]s
    /// and their attitudes. None if no sample is provided.
    pub fn new(
        epochs: &[Epoch],
        values: Vec<UnitQuaternion<f64>>,
        extrapolation: Extrapolation,
    ) -> Option<Self> {
        if epochs.len() != values.len() {
            return None;
        }

        let knots = Knots::new(epochs, extrapolation)?;

        Some(Self {
            knots,
            values: Self::sign_aligned(values),
        })
    }

    /// q and -q describe the same rotation: flip signs so consecutive
    /// quaternions lie in the same hemisphere.
    fn sign_aligned(values: Vec<UnitQuaternion<f64>>) -> Vec<UnitQuaternion<f64>> {
        let mut aligned: Vec<UnitQuaternion<f64>> = Vec::with_capacity(values.len());
        for q in values {
            let q = match aligned.last() {
                Some(prev) if prev.coords.dot(&q.coords) < 0.0 => {
                    UnitQuaternion::new_unchecked(-q.into_inner())
                },
                _ => q,
            };
            aligned.push(q);
        }
        aligned
    }

    /// Holds the last attitude for `pad` past the last sample,
    /// even when extrapolation is rejected.
    pub fn with_trailing_pad(mut self, pad: Duration) -> Self {
        self.knots.pad = pad.to_seconds().max(0.0);
        self
    }

    /// Span of the samples
    pub fn interval(&self) -> AvailabilityInterval {
        self.knots.interval()
    }

    /// Evaluates attitude at `t`. None when `t` is out of span
    /// and extrapolation is rejected.
    pub fn at(&self, t: Epoch) -> Option<UnitQuaternion<f64>> {
        let Segment { idx, s, .. } = self.knots.locate(t)?;

        if self.values.len() == 1 {
            return Some(self.values[0]);
        }

        let (q0, q1) = (&self.values[idx], &self.values[idx + 1]);

        Some(
            q0.try_slerp(q1, s, 1.0E-9)
                .unwrap_or_else(|| q0.nlerp(q1, s)),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hifitime::Unit;
    use rstest::*;
    use std::f64::consts::FRAC_PI_2;

    fn epochs(seconds: &[f64]) -> Vec<Epoch> {
        let t0 = Epoch::from_unix_milliseconds(0.0);
        seconds.iter().map(|s| t0 + *s * Unit::Second).collect()
    }

    #[rstest]
    #[case(Interpolation::Linear)]
    #[case(Interpolation::Hermite)]
    fn position_passes_through_samples(#[case] method: Interpolation) {
        let t = epochs(&[0.0, 10.0, 30.0, 60.0]);
        let values = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(10.0, 1.0, 0.0),
            Vector3::new(25.0, 4.0, 1.0),
            Vector3::new(40.0, 9.0, 2.0),
        ];
        let interp =
            PositionInterpolant::new(&t, values.clone(), method, Extrapolation::Hold).unwrap();

        for (t, p) in t.iter().zip(values.iter()) {
            let value = interp.at(*t).unwrap();
            assert!((value - p).norm() < 1.0E-9, "{} != {}", value, p);
        }
    }

    #[test]
    fn hermite_is_exact_for_linear_motion() {
        let t = epochs(&[0.0, 5.0, 20.0, 21.0]);
        let values = [0.0, 5.0, 20.0, 21.0]
            .iter()
            .map(|x| Vector3::new(*x, 2.0 * x, -x))
            .collect::<Vec<_>>();

        let interp =
            PositionInterpolant::new(&t, values, Interpolation::Hermite, Extrapolation::Hold)
                .unwrap();

        let value = interp.at(epochs(&[12.5])[0]).unwrap();
        assert!((value - Vector3::new(12.5, 25.0, -12.5)).norm() < 1.0E-9);
    }

    #[rstest]
    #[case(Extrapolation::Hold, Some(Vector3::new(1.0, 1.0, 1.0)))]
    #[case(Extrapolation::Reject, None)]
    fn extrapolation(#[case] policy: Extrapolation, #[case] expected: Option<Vector3<f64>>) {
        let t = epochs(&[0.0, 10.0]);
        let values = vec![Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0)];
        let interp = PositionInterpolant::new(&t, values, Interpolation::Linear, policy).unwrap();
        assert_eq!(interp.at(epochs(&[20.0])[0]), expected);
        assert!(interp.at(epochs(&[5.0])[0]).is_some());
    }

    #[rstest]
    #[case(Extrapolation::Hold)]
    #[case(Extrapolation::Reject)]
    fn trailing_pad_holds_last_value(#[case] policy: Extrapolation) {
        let t = epochs(&[0.0, 10.0]);
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);

        let position = PositionInterpolant::new(
            &t,
            vec![Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0)],
            Interpolation::Hermite,
            policy,
        )
        .unwrap()
        .with_trailing_pad(5.0 * Unit::Second);

        let orientation =
            OrientationInterpolant::new(&t, vec![UnitQuaternion::identity(), yaw], policy)
                .unwrap()
                .with_trailing_pad(5.0 * Unit::Second);

        for dt in [12.0, 15.0] {
            let t = epochs(&[dt])[0];
            assert_eq!(position.at(t), Some(Vector3::new(1.0, 1.0, 1.0)));
            assert!(orientation.at(t).unwrap().angle_to(&yaw) < 1.0E-12);
        }

        // past the pad: extrapolation policy applies
        let past = epochs(&[16.0])[0];
        assert_eq!(position.at(past).is_some(), policy == Extrapolation::Hold);
        assert_eq!(orientation.at(past).is_some(), policy == Extrapolation::Hold);

        // leading edge is never padded
        let before = epochs(&[-1.0])[0];
        assert_eq!(position.at(before).is_some(), policy == Extrapolation::Hold);
    }

    #[test]
    fn no_samples() {
        assert!(PositionInterpolant::new(
            &[],
            Vec::new(),
            Interpolation::Linear,
            Extrapolation::Hold
        )
        .is_none());
        assert!(OrientationInterpolant::new(&[], Vec::new(), Extrapolation::Hold).is_none());
    }

    #[test]
    fn slerp_halfway() {
        let t = epochs(&[0.0, 60.0]);
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let interp = OrientationInterpolant::new(
            &t,
            vec![UnitQuaternion::identity(), yaw],
            Extrapolation::Hold,
        )
        .unwrap();

        let q = interp.at(epochs(&[30.0])[0]).unwrap();
        assert!((q.angle() - FRAC_PI_2 / 2.0).abs() < 1.0E-9);
    }

    #[test]
    fn no_sign_flip_discontinuity() {
        let t = epochs(&[0.0, 10.0]);
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.2);
        // same rotation, opposite hemisphere
        let flipped = UnitQuaternion::new_unchecked(-yaw.into_inner());

        let interp = OrientationInterpolant::new(
            &t,
            vec![UnitQuaternion::identity(), flipped],
            Extrapolation::Hold,
        )
        .unwrap();

        let q = interp.at(epochs(&[5.0])[0]).unwrap();
        assert!((q.angle() - 0.1).abs() < 1.0E-9, "angle={}", q.angle());
    }
}
