use crate::Curve;

/// Per-segment chord-length estimates of a [`Curve`], used to move along it
/// at constant speed.
///
/// The table is derived from one curve at one resolution. Replacing the curve
/// means building a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentLengthTable {
    lengths: Vec<f32>,
    total: f32,
    samples_per_segment: usize,
}

impl SegmentLengthTable {
    /// Sums the distances between `samples_per_segment + 1` evenly spaced
    /// points of each segment. A resolution of zero is treated as one.
    #[must_use]
    pub fn build(curve: &Curve, samples_per_segment: usize) -> Self {
        let samples = samples_per_segment.max(1);
        let lengths: Vec<f32> = (0..curve.segment_count())
            .map(|segment| {
                let mut length = 0.0;
                let mut prev = curve.position(segment, 0.0);
                for i in 1..=samples {
                    let point = curve.position(segment, i as f32 / samples as f32);
                    length += prev.distance(point);
                    prev = point;
                }
                length
            })
            .collect();
        let total = lengths.iter().sum();
        Self {
            lengths,
            total,
            samples_per_segment: samples,
        }
    }

    /// A table over precomputed segment lengths, such as keyframe durations.
    /// It reports zero samples per segment.
    #[must_use]
    pub fn from_lengths(lengths: Vec<f32>) -> Self {
        let lengths: Vec<f32> = lengths
            .into_iter()
            .map(|l| if l.is_finite() { l.max(0.0) } else { 0.0 })
            .collect();
        let total = lengths.iter().sum();
        Self {
            lengths,
            total,
            samples_per_segment: 0,
        }
    }

    /// Builds with the curve kind's default resolution.
    #[must_use]
    pub fn for_curve(curve: &Curve) -> Self {
        Self::build(curve, curve.kind().default_samples())
    }

    #[must_use]
    pub fn total(&self) -> f32 {
        self.total
    }

    #[must_use]
    pub fn lengths(&self) -> &[f32] {
        &self.lengths
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.lengths.len()
    }

    #[must_use]
    pub fn samples_per_segment(&self) -> usize {
        self.samples_per_segment
    }

    /// Maps a travelled distance to `(segment, local_t)`.
    ///
    /// Distances at or below zero map to the start of the first segment and
    /// distances at or past the total map to the end of the last one.
    /// Zero-length segments report `local_t = 0`.
    #[must_use]
    pub fn lookup(&self, distance: f32) -> (usize, f32) {
        let Some(last) = self.lengths.len().checked_sub(1) else {
            return (0, 0.0);
        };
        if distance.is_nan() || distance <= 0.0 {
            return (0, 0.0);
        }
        if distance >= self.total {
            return (last, 1.0);
        }

        let mut traveled = 0.0;
        let mut segment = 0;
        while segment < last && traveled + self.lengths[segment] < distance {
            traveled += self.lengths[segment];
            segment += 1;
        }
        let length = self.lengths[segment];
        let local_t = if length > 0.0 {
            ((distance - traveled) / length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (segment, local_t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ControlPoint;
    use glam::{Quat, Vec3};

    fn straight_line(spacing: &[f32]) -> Curve {
        let mut x = 0.0;
        let mut points = vec![ControlPoint::new(Vec3::ZERO, Quat::IDENTITY)];
        for s in spacing {
            x += s;
            points.push(ControlPoint::new(Vec3::new(x, 0.0, 0.0), Quat::IDENTITY));
        }
        Curve::CatmullRom { points }
    }

    #[test]
    fn lookup_endpoints() {
        let table = SegmentLengthTable::for_curve(&straight_line(&[1.0, 2.0, 3.0]));
        assert_eq!(table.segment_count(), 3);
        assert_eq!(table.lookup(0.0), (0, 0.0));
        assert_eq!(table.lookup(-5.0), (0, 0.0));
        assert_eq!(table.lookup(table.total()), (2, 1.0));
        assert_eq!(table.lookup(table.total() * 10.0), (2, 1.0));
    }

    #[test]
    fn collinear_lengths_are_exact() {
        let table = SegmentLengthTable::build(&straight_line(&[2.0, 2.0, 2.0]), 10);
        for length in table.lengths() {
            assert!((length - 2.0).abs() < 1e-4);
        }
        assert!((table.total() - 6.0).abs() < 1e-4);
    }

    #[test]
    fn lookup_inside_segment() {
        let table = SegmentLengthTable::build(&straight_line(&[2.0, 2.0, 2.0]), 10);
        let (segment, t) = table.lookup(3.0);
        assert_eq!(segment, 1);
        assert!((t - 0.5).abs() < 1e-3);
    }

    #[test]
    fn zero_length_segment_is_skipped() {
        let curve = Curve::GreatCircle {
            points: vec![
                Vec3::new(5.0, 0.0, 0.0),
                Vec3::new(0.0, 5.0, 0.0),
                Vec3::new(0.0, 5.0, 0.0),
                Vec3::new(0.0, 0.0, 5.0),
            ],
            center: Vec3::ZERO,
        };
        let table = SegmentLengthTable::for_curve(&curve);
        assert_eq!(table.lengths()[1], 0.0);
        let (segment, t) = table.lookup(table.lengths()[0] + 0.5);
        assert_eq!(segment, 2);
        assert!(t > 0.0 && t < 1.0);
    }

    #[test]
    fn build_is_deterministic() {
        let curve = straight_line(&[1.0, 3.0, 2.0, 5.0]);
        assert_eq!(
            SegmentLengthTable::build(&curve, 16),
            SegmentLengthTable::build(&curve, 16)
        );
    }
}
