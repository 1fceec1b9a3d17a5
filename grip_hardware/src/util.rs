/// Convert an ADC count into a fraction of full scale, clamped to `[0, 1]`.
/// A zero `full_scale` yields 0 rather than dividing by zero.
#[inline]
pub fn counts_to_fraction(raw: u32, full_scale: u32) -> f32 {
    if full_scale == 0 {
        return 0.0;
    }
    (raw.min(full_scale) as f32) / (full_scale as f32)
}

/// Parse the integer a sysfs attribute file holds (trailing newline allowed).
pub fn parse_sysfs_u32(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok()
}
