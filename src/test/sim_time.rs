use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
}

#[test]
fn fractional_millis_round_to_nanos() {
    assert_eq!(SimTime::from_millis_f64(0.5), SimTime(500_000));
    assert_eq!(SimTime::from_millis_f64(12.0000004), SimTime(12_000_000));
    assert_eq!(SimTime::from_millis_f64(-3.0), SimTime::ZERO);
    assert_eq!(SimTime::from_millis_f64(f64::NAN), SimTime::ZERO);
    assert_eq!(SimTime::from_millis_f64(f64::INFINITY), SimTime::MAX);
    assert_eq!(SimTime(2_500_000).as_millis_f64(), 2.5);
}
