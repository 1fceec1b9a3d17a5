use grip_core::{DutyRange, GripLevel, ThresholdTable};
use rstest::rstest;

#[rstest]
#[case(0.0, 0)]
#[case(0.49, 0)]
#[case(0.5, 1)]
#[case(0.99, 1)]
#[case(1.0, 2)]
#[case(2.5, 5)]
#[case(3.99, 7)]
#[case(4.0, 8)]
#[case(14.985, 8)]
#[case(-1.0, 0)]
fn default_table_levels(#[case] force: f32, #[case] level: u8) {
    assert_eq!(ThresholdTable::default().classify(force).get(), level);
}

#[test]
fn nan_force_is_level_zero() {
    assert_eq!(ThresholdTable::default().classify(f32::NAN), GripLevel::ZERO);
}

#[rstest]
#[case(vec![1.0, 2.0, 3.0])]
#[case(vec![0.2, 0.4, 0.6, 0.8, 1.0])]
#[case(vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0])]
fn each_threshold_reaches_its_level(#[case] points: Vec<f32>) {
    let t = ThresholdTable::new(points.clone()).unwrap();
    for (i, p) in points.iter().enumerate() {
        assert_eq!(usize::from(t.classify(*p).get()), i + 1);
    }
}

#[rstest]
#[case(3)]
#[case(5)]
#[case(8)]
fn level_max_sets_full_travel(#[case] levels: u8) {
    let t = ThresholdTable::uniform(0.5, levels).unwrap();
    let r = DutyRange::default();
    let top = t.classify(1_000.0);
    assert_eq!(top, t.level_max());
    assert_eq!(r.to_duty_cycle(top, t.level_max()), r.max());
    assert_eq!(r.to_duty_cycle(GripLevel::ZERO, t.level_max()), r.min());
}
