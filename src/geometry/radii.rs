//! Concentric band layout for segmented radial bars.
//!
//! Bands and the gaps between them both grow linearly outward. Widths come
//! from the arithmetic-series sum, so the layout is closed form.

use glam::Vec2;

/// Largest share of the radial span the gaps may take before they are compressed
pub const MAX_GAP_SHARE: f32 = 0.5;

const SNAP_EPSILON: f32 = 1e-4;

/// One band of a segmented bar (pixels from the ring center)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialBand {
    pub inner: f32,
    pub outer: f32,
}

impl RadialBand {
    pub fn width(&self) -> f32 {
        self.outer - self.inner
    }
}

/// Per-gap increment when gap widths run from `range.x` toward `range.y` over `count` gaps
pub fn line_width_increment(range: Vec2, count: usize) -> f32 {
    (range.y - range.x) / count as f32
}

/// Total length of `count` gaps starting at `range.x` and growing by
/// [`line_width_increment`] each step
pub fn gap_total(range: Vec2, count: usize) -> f32 {
    let n = count as f32;
    n * range.x + n * (n - 1.0) * line_width_increment(range, count) / 2.0
}

/// Upper end of the gap range such that `segment_count` gaps starting at
/// `gap_range_start` add up to `length` (inverse of [`gap_total`]).
///
/// With fewer than two segments the increment is meaningless and the start is returned.
pub fn pick_gap_upper_bound(gap_range_start: f32, segment_count: usize, length: f32) -> f32 {
    if segment_count < 2 {
        return gap_range_start;
    }
    let n = segment_count as f32;
    gap_range_start + 2.0 * (length - n * gap_range_start) / (n - 1.0)
}

/// Lay out `bar_count` bands between `radius_range.x` and `radius_range.y`.
///
/// Band widths increase linearly from the innermost band; gap `i` (between band
/// `i` and `i + 1`) is `gap_width_range.x + i * increment`. Bands plus gaps
/// cover the radius range exactly. Gaps that would take more than
/// [`MAX_GAP_SHARE`] of the span are scaled down proportionally.
pub fn generate_radial_bar_radii(
    bar_count: usize,
    gap_width_range: Vec2,
    radius_range: Vec2,
) -> Vec<RadialBand> {
    match bar_count {
        0 => return Vec::new(),
        1 => {
            return vec![RadialBand {
                inner: radius_range.x,
                outer: radius_range.y,
            }]
        }
        _ => {}
    }

    let n = bar_count as f32;
    let span = radius_range.y - radius_range.x;

    let gap_increment = line_width_increment(gap_width_range, bar_count);
    let gap_at = |i: usize| gap_width_range.x + gap_increment * i as f32;
    let raw_gaps: f32 = (0..bar_count - 1).map(gap_at).sum();

    let gap_scale = if raw_gaps <= 0.0 {
        0.0
    } else if raw_gaps > span * MAX_GAP_SHARE {
        span * MAX_GAP_SHARE / raw_gaps
    } else {
        1.0
    };

    // Length left for the bands themselves
    let band_total = span - raw_gaps * gap_scale;
    let base_width = 0.05 * band_total / n;
    let width_increment = 2.0 * (band_total - n * base_width) / (n * (n - 1.0));

    let mut bands = Vec::with_capacity(bar_count);
    let mut last_outer = radius_range.x;
    for i in 0..bar_count {
        let inner = last_outer;
        let outer = inner + base_width + width_increment * i as f32;
        bands.push(RadialBand { inner, outer });
        last_outer = outer + gap_at(i) * gap_scale;
    }

    // Float drift only; the series sums to the span
    if let Some(last) = bands.last_mut() {
        if (last.outer - radius_range.y).abs() <= SNAP_EPSILON * span.abs().max(1.0) {
            last.outer = radius_range.y;
        }
    }

    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn covered_length(bands: &[RadialBand]) -> f32 {
        let widths: f32 = bands.iter().map(RadialBand::width).sum();
        let gaps: f32 = bands.windows(2).map(|w| w[1].inner - w[0].outer).sum();
        widths + gaps
    }

    fn laid_out_gaps(bands: &[RadialBand]) -> Vec<f32> {
        bands.windows(2).map(|w| w[1].inner - w[0].outer).collect()
    }

    // Closed form of gap_i = x + i * (y - x) / n for i in 0..n-1
    fn expected_gap_sum(range: Vec2, count: usize) -> f32 {
        let gaps = (count - 1) as f32;
        let increment = line_width_increment(range, count);
        gaps * range.x + increment * gaps * (gaps - 1.0) / 2.0
    }

    fn assert_linear_widths(bands: &[RadialBand], tolerance: f32) {
        let step = bands[1].width() - bands[0].width();
        for (i, pair) in bands.windows(2).enumerate() {
            let diff = pair[1].width() - pair[0].width();
            assert!(
                (diff - step).abs() < tolerance,
                "width step {} is {} (expected {})",
                i,
                diff,
                step
            );
        }
    }

    #[test]
    fn test_pick_gap_upper_bound_round_trips() {
        let upper = pick_gap_upper_bound(2.0, 26, 100.0);
        let total = gap_total(Vec2::new(2.0, upper), 26);
        assert!((total - 100.0).abs() < 1e-3, "total = {}", total);
        assert!((upper - 5.84).abs() < 1e-4);
    }

    #[test]
    fn test_pick_gap_upper_bound_single_segment() {
        assert_eq!(pick_gap_upper_bound(2.0, 1, 100.0), 2.0);
        assert_eq!(pick_gap_upper_bound(2.0, 0, 100.0), 2.0);
    }

    #[test]
    fn test_bands_cover_span() {
        let bands = generate_radial_bar_radii(28, Vec2::new(2.0, 6.0), Vec2::new(50.0, 250.0));
        assert_eq!(bands.len(), 28);
        assert_eq!(bands[0].inner, 50.0);
        assert_eq!(bands[27].outer, 250.0);
        assert!((covered_length(&bands) - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_last_band_keeps_width_step() {
        let gap_range = Vec2::new(2.0, pick_gap_upper_bound(2.0, 28, 80.0));
        let bands = generate_radial_bar_radii(28, gap_range, Vec2::new(60.0, 280.0));

        assert_linear_widths(&bands, 1e-3);
        let gaps: f32 = laid_out_gaps(&bands).iter().sum();
        assert!((gaps - expected_gap_sum(gap_range, 28)).abs() < 5e-3, "gaps = {}", gaps);
        assert_eq!(bands[27].outer, 280.0);
    }

    #[test]
    fn test_gaps_follow_series() {
        let gap_range = Vec2::new(1.0, 3.0);
        let bands = generate_radial_bar_radii(10, gap_range, Vec2::new(0.0, 300.0));
        let increment = line_width_increment(gap_range, 10);
        for (i, gap) in laid_out_gaps(&bands).into_iter().enumerate() {
            let expected = gap_range.x + increment * i as f32;
            assert!((gap - expected).abs() < 1e-4, "gap {} = {}", i, gap);
        }
    }

    #[test]
    fn test_widths_and_gaps_increase() {
        let bands = generate_radial_bar_radii(10, Vec2::new(1.0, 3.0), Vec2::new(0.0, 300.0));
        for pair in bands.windows(2) {
            assert!(pair[1].width() > pair[0].width());
        }
        let gaps: Vec<f32> = bands.windows(2).map(|w| w[1].inner - w[0].outer).collect();
        for pair in gaps.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_oversized_gaps_are_compressed() {
        // Nine gaps of >= 20px can't fit in 100px
        let bands = generate_radial_bar_radii(10, Vec2::new(20.0, 30.0), Vec2::new(0.0, 100.0));
        let gaps: f32 = laid_out_gaps(&bands).iter().sum();
        assert!((gaps - 100.0 * MAX_GAP_SHARE).abs() < 1e-3);
        assert!((covered_length(&bands) - 100.0).abs() < 1e-3);
        assert_linear_widths(&bands, 1e-3);
    }

    #[test]
    fn test_degenerate_counts() {
        assert!(generate_radial_bar_radii(0, Vec2::new(2.0, 4.0), Vec2::new(0.0, 10.0)).is_empty());
        let single = generate_radial_bar_radii(1, Vec2::new(2.0, 4.0), Vec2::new(3.0, 10.0));
        assert_eq!(single, vec![RadialBand { inner: 3.0, outer: 10.0 }]);
    }

    proptest! {
        #[test]
        fn bands_strictly_widen_and_fill_range(
            count in 2usize..64,
            gap_start in 0.0f32..4.0,
            gap_spread in 0.0f32..4.0,
            inner in 0.0f32..200.0,
            span in 50.0f32..800.0,
        ) {
            let bands = generate_radial_bar_radii(
                count,
                Vec2::new(gap_start, gap_start + gap_spread),
                Vec2::new(inner, inner + span),
            );
            prop_assert_eq!(bands.len(), count);
            let tolerance = 1e-4 * span + 1e-3;
            let step = bands[1].width() - bands[0].width();
            prop_assert!(step > 0.0);
            for pair in bands.windows(2) {
                let diff = pair[1].width() - pair[0].width();
                prop_assert!((diff - step).abs() < tolerance, "step {} vs {}", diff, step);
            }

            let gap_range = Vec2::new(gap_start, gap_start + gap_spread);
            let raw = expected_gap_sum(gap_range, count);
            let expected_gaps = raw.min(span * MAX_GAP_SHARE);
            let gaps: f32 = laid_out_gaps(&bands).iter().sum();
            prop_assert!((gaps - expected_gaps).abs() < tolerance, "gaps {} vs {}", gaps, expected_gaps);
            prop_assert!((bands[count - 1].outer - (inner + span)).abs() < tolerance);
        }
    }
}
