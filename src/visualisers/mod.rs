//! Concrete audio visualisers, one layer each.

mod frequency_background;
mod frequency_radial_bars;
mod time_domain_canvas;
mod time_domain_radial;

// Re-export public types
pub use frequency_background::FrequencyDomainBackgroundVisualiser;
pub use frequency_radial_bars::FrequencyDomainRadialBarsVisualiser;
pub use time_domain_canvas::TimeDomainRadialCanvas;
pub use time_domain_radial::TimeDomainRadialVisualiser;

/// Number of `vec4`s needed to hold `count` packed floats
pub(crate) fn vec4_count(count: usize) -> usize {
    count.div_ceil(4).max(1)
}

/// Pack `values` four to a `vec4`, padding the tail with `pad`
pub(crate) fn pack_vec4(values: &[f32], pad: f32) -> Vec<f32> {
    let mut packed = values.to_vec();
    packed.resize(vec4_count(values.len()) * 4, pad);
    packed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_vec4_pads_tail() {
        assert_eq!(pack_vec4(&[1.0, 2.0, 3.0, 4.0, 5.0], -100.0).len(), 8);
        assert_eq!(pack_vec4(&[1.0, 2.0, 3.0, 4.0, 5.0], -100.0)[5], -100.0);
        assert_eq!(pack_vec4(&[1.0; 8], 0.0).len(), 8);
        assert_eq!(pack_vec4(&[], 0.0).len(), 4);
    }

    #[test]
    fn test_vec4_count() {
        assert_eq!(vec4_count(94), 24);
        assert_eq!(vec4_count(92), 23);
        assert_eq!(vec4_count(0), 1);
    }
}
