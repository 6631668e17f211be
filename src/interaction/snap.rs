//! Quantizes pointer deltas to the grid of the active view.

use crate::layout::TimeScale;
use crate::model::ViewMode;

/// Pixel size of one snap step: a day in Week, Month and Max views, a column otherwise.
pub fn snap_unit(scale: &TimeScale) -> f64 {
    match scale.view_mode {
        ViewMode::Week => scale.column_width / 7.0,
        ViewMode::Month | ViewMode::Max => scale.column_width / 30.0,
        _ => scale.column_width,
    }
}

/// Rounds `dx` to the nearest snap step, halves rounding up.
pub fn snap_delta(dx: f64, scale: &TimeScale) -> f64 {
    snap_to(dx, snap_unit(scale))
}

pub fn snap_to(dx: f64, unit: f64) -> f64 {
    if unit <= 0.0 || !dx.is_finite() {
        return 0.0;
    }
    unit * (dx / unit + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn rounds_to_nearest_column() {
        assert_eq!(snap_to(18.0, 38.0), 0.0);
        assert_eq!(snap_to(19.0, 38.0), 38.0);
        assert_eq!(snap_to(57.0, 38.0), 76.0);
        assert_eq!(snap_to(-18.0, 38.0), 0.0);
        assert_eq!(snap_to(-20.0, 38.0), -38.0);
    }

    #[test]
    fn week_snaps_to_days() {
        assert_relative_eq!(snap_to(25.0, 140.0 / 7.0), 20.0);
        assert_relative_eq!(snap_to(31.0, 140.0 / 7.0), 40.0);
    }

    #[test]
    fn degenerate_inputs_snap_to_zero() {
        assert_eq!(snap_to(12.0, 0.0), 0.0);
        assert_eq!(snap_to(f64::NAN, 38.0), 0.0);
    }

    proptest! {
        #[test]
        fn snapping_is_idempotent(dx in -5_000.0f64..5_000.0, unit in prop::sample::select(vec![38.0, 20.0, 4.0, 140.0 / 7.0, 120.0 / 30.0])) {
            let once = snap_to(dx, unit);
            let twice = snap_to(once, unit);
            prop_assert!((once - twice).abs() < 1e-9);
            prop_assert!((once - dx).abs() <= unit / 2.0 + 1e-9);
        }
    }
}
