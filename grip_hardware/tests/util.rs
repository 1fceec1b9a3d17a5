use grip_hardware::util::{counts_to_fraction, parse_sysfs_u32};

#[test]
fn counts_scale_to_unit_range() {
    assert_eq!(counts_to_fraction(0, 4095), 0.0);
    assert_eq!(counts_to_fraction(4095, 4095), 1.0);
    assert!((counts_to_fraction(2048, 4095) - 0.500_122).abs() < 1e-5);
}

#[test]
fn counts_clamp_and_zero_full_scale() {
    assert_eq!(counts_to_fraction(5000, 4095), 1.0);
    assert_eq!(counts_to_fraction(10, 0), 0.0);
}

#[test]
fn sysfs_values_parse_with_newline() {
    assert_eq!(parse_sysfs_u32("1234\n"), Some(1234));
    assert_eq!(parse_sysfs_u32(" 7 "), Some(7));
    assert_eq!(parse_sysfs_u32("abc"), None);
}
