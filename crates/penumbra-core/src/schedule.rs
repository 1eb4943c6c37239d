//! Iteration schedules derived from the canvas size

/// Number of jump flood iterations needed to cover a `width x height`
/// canvas: `ceil(log2(max(width, height)))`.
pub fn jfa_pass_count(width: u32, height: u32) -> u32 {
    let longest = width.max(height);
    if longest <= 1 {
        return 0;
    }
    u32::BITS - (longest - 1).leading_zeros()
}

/// Step offsets for each jump flood iteration, largest first, ending at 1
pub fn jfa_offsets(pass_count: u32) -> impl Iterator<Item = u32> {
    (0..pass_count).map(move |i| 1u32 << (pass_count - i - 1))
}

/// Index of the coarsest cascade level.
///
/// `ceil(ln(diagonal) / ln(base_ray_count)) + 1`; levels run from this
/// value down to 0 inclusive.
pub fn cascade_count(width: u32, height: u32, base_ray_count: u32) -> u32 {
    let diagonal = ((width as f64).powi(2) + (height as f64).powi(2)).sqrt();
    let base = (base_ray_count.max(2)) as f64;
    let levels = (diagonal.max(1.0).ln() / base.ln()).ceil();
    levels as u32 + 1
}

/// Cascade levels in evaluation order, coarsest first
pub fn cascade_levels(cascade_count: u32) -> impl Iterator<Item = u32> {
    (0..=cascade_count).rev()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jfa_schedule_for_default_canvas() {
        assert_eq!(jfa_pass_count(800, 800), 10);
        let offsets: Vec<u32> = jfa_offsets(10).collect();
        assert_eq!(offsets, vec![512, 256, 128, 64, 32, 16, 8, 4, 2, 1]);
    }

    #[test]
    fn jfa_pass_count_uses_longest_side() {
        assert_eq!(jfa_pass_count(512, 512), 9);
        assert_eq!(jfa_pass_count(513, 16), 10);
        assert_eq!(jfa_pass_count(16, 1000), 10);
        assert_eq!(jfa_pass_count(2, 1), 1);
        assert_eq!(jfa_pass_count(1, 1), 0);
        assert_eq!(jfa_offsets(0).count(), 0);
    }

    #[test]
    fn cascade_schedule_for_default_canvas() {
        let count = cascade_count(800, 800, 16);
        assert_eq!(count, 4);
        let levels: Vec<u32> = cascade_levels(count).collect();
        assert_eq!(levels, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn cascade_count_grows_with_diagonal() {
        assert_eq!(cascade_count(16, 16, 16), 3);
        assert_eq!(cascade_count(64, 64, 16), 3);
        assert_eq!(cascade_count(4096, 4096, 16), 5);
        assert!(cascade_count(800, 800, 4) > cascade_count(800, 800, 16));
    }
}
