// ==============================================================================
// geometry.rs - P-value Bucket Geometry
// ==============================================================================
// Description: Bucket widths and axis positions derived from p-value ticks
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Bucket i (i >= 1) covers (tick[i-1], tick[i]]. Bucket 0 holds rows without
// a usable p-value and sits immediately left of tick 0.
//
// Positions are the cumulative sum of widths seeded at -width[0], so
// position[0] == 0. Renderers anchor each bar at its position and draw it
// with a negative width, so bars grow leftwards.
// ==============================================================================

use serde::Serialize;

use crate::config::{TickSet, WidthRule};

/// Width of the "no p-value" bucket
const MISSING_BUCKET_WIDTH: f64 = 1.0;

/// Width given to a log10 bucket whose lower tick is 0
const ZERO_TICK_WIDTH: f64 = 2.0;

/// One log10 unit of bucket width spans two decades (1e-2 .. 1)
fn log10_unit_width() -> f64 {
    1f64.log10() - 0.01f64.log10()
}

/// Immutable bucket layout shared by aggregation and rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketGeometry {
    ticks: Vec<f64>,
    labels: Vec<String>,
    width_rule: WidthRule,
    widths: Vec<f64>,
    positions: Vec<f64>,
}

impl BucketGeometry {
    pub fn build(ticks: &TickSet, width_rule: WidthRule) -> Self {
        let values = ticks.values();

        let mut widths = Vec::with_capacity(values.len());
        widths.push(MISSING_BUCKET_WIDTH);
        for i in 1..values.len() {
            let width = match width_rule {
                WidthRule::Uniform => 1.0,
                WidthRule::Log10 if values[i - 1] == 0.0 => ZERO_TICK_WIDTH,
                WidthRule::Log10 => (values[i].log10() - values[i - 1].log10()) / log10_unit_width(),
            };
            widths.push(width);
        }

        let mut cumulative = -widths[0];
        let positions = widths
            .iter()
            .map(|width| {
                cumulative += width;
                cumulative
            })
            .collect();

        Self {
            ticks: values.to_vec(),
            labels: ticks.labels().to_vec(),
            width_rule,
            widths,
            positions,
        }
    }

    /// Number of buckets, including the "no p-value" bucket
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn width_rule(&self) -> WidthRule {
        self.width_rule
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Bucket holding p-value `p`: the first bucket j >= 1 with p <= tick[j].
    /// A value on a boundary belongs to the bucket ending there. `None` when
    /// p exceeds the last tick.
    pub fn bucket_for(&self, p: f64) -> Option<usize> {
        let upper = self.ticks.get(1..)?;
        let offset = upper.partition_point(|tick| *tick < p);
        (offset < upper.len()).then_some(offset + 1)
    }

    /// Centre of each bar on the axis
    pub fn midpoints(&self) -> Vec<f64> {
        self.positions
            .iter()
            .zip(&self.widths)
            .map(|(position, width)| position - width / 2.0)
            .collect()
    }

    /// Left and right limits of the whole axis
    pub fn axis_range(&self) -> (f64, f64) {
        let left = self.positions[0] - self.widths[0];
        let right = self.positions.last().copied().unwrap_or(0.0);
        (left, right)
    }

    /// Human readable range of bucket `index`, e.g. `1e-8—1e-5`
    pub fn range_label(&self, index: usize) -> String {
        match index {
            0 => "no p-value".to_string(),
            i => format!("{}—{}", self.labels[i - 1], self.labels[i]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_geometry(rule: WidthRule) -> BucketGeometry {
        BucketGeometry::build(&TickSet::default(), rule)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-12, "{} != {}", actual, expected);
    }

    #[test]
    fn test_uniform_widths() {
        let geometry = default_geometry(WidthRule::Uniform);
        assert_eq!(geometry.widths(), &[1.0; 7]);
        assert_eq!(geometry.positions(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_log10_widths() {
        let geometry = default_geometry(WidthRule::Log10);
        let widths = geometry.widths();

        assert_eq!(widths[0], 1.0);
        // lower tick is 0
        assert_eq!(widths[1], 2.0);
        // 1e-8 .. 1e-5 is three decades
        assert_close(widths[2], 1.5);
        assert_close(widths[3], 1.0);
        assert_close(widths[4], (0.03f64.log10() - 1e-3f64.log10()) / 2.0);
        assert_close(widths[6], (1f64.log10() - 0.3f64.log10()) / 2.0);
    }

    #[test]
    fn test_log10_width_of_two_ticks() {
        let ticks = TickSet::from_values(&[1e-5, 1e-3]).unwrap();
        let geometry = BucketGeometry::build(&ticks, WidthRule::Log10);
        assert_close(geometry.widths()[1], 1.0);
    }

    #[test]
    fn test_positions_are_cumulative_from_zero() {
        let geometry = default_geometry(WidthRule::Log10);
        let positions = geometry.positions();

        assert_eq!(positions[0], 0.0);
        assert_eq!(positions[1], 2.0);
        assert_close(positions[2], 3.5);
        for i in 1..positions.len() {
            assert_close(positions[i] - positions[i - 1], geometry.widths()[i]);
        }
    }

    #[test]
    fn test_midpoints_and_axis_range() {
        let geometry = default_geometry(WidthRule::Uniform);
        assert_eq!(geometry.midpoints()[0], -0.5);
        assert_eq!(geometry.midpoints()[3], 2.5);
        assert_eq!(geometry.axis_range(), (-1.0, 6.0));
    }

    #[test]
    fn test_bucket_boundaries() {
        let geometry = default_geometry(WidthRule::Log10);

        assert_eq!(geometry.bucket_for(0.0), Some(1));
        assert_eq!(geometry.bucket_for(1e-8), Some(1));
        assert_eq!(geometry.bucket_for(2e-8), Some(2));
        assert_eq!(geometry.bucket_for(0.03), Some(4));
        assert_eq!(geometry.bucket_for(0.04), Some(5));
        assert_eq!(geometry.bucket_for(1.0), Some(6));
    }

    #[test]
    fn test_values_above_last_tick_are_unassigned() {
        let ticks = TickSet::from_values(&[0.0, 0.01, 0.5]).unwrap();
        let geometry = BucketGeometry::build(&ticks, WidthRule::Uniform);

        assert_eq!(geometry.bucket_for(0.5), Some(2));
        assert_eq!(geometry.bucket_for(0.6), None);
    }

    #[test]
    fn test_single_tick_assigns_nothing() {
        let ticks = TickSet::from_values(&[0.0]).unwrap();
        let geometry = BucketGeometry::build(&ticks, WidthRule::Log10);
        assert_eq!(geometry.len(), 1);
        assert_eq!(geometry.bucket_for(0.0), None);
    }

    #[test]
    fn test_range_labels() {
        let geometry = default_geometry(WidthRule::Log10);
        assert_eq!(geometry.range_label(0), "no p-value");
        assert_eq!(geometry.range_label(2), "1e-8—1e-5");
        assert_eq!(geometry.range_label(6), ".3—1");
    }

    proptest! {
        #[test]
        fn prop_bucket_is_first_tick_at_or_above(p in 0.0f64..=1.0) {
            let geometry = default_geometry(WidthRule::Log10);
            let ticks = geometry.ticks();
            let bucket = geometry.bucket_for(p).unwrap();

            prop_assert!(bucket >= 1);
            prop_assert!(p <= ticks[bucket]);
            if bucket > 1 {
                prop_assert!(p > ticks[bucket - 1]);
            }
        }
    }
}
