//! Validates distance metrics and ensemble summary statistics

use geoquilt::math::distance::{chebyshev, finite_sq_diff};
use geoquilt::math::stats::{mean, std_dev};

#[test]
fn test_chebyshev_takes_largest_axis_difference() {
    assert_eq!(chebyshev(&[0, 0], &[0, 0]), 0);
    assert_eq!(chebyshev(&[1, 5], &[4, 6]), 3);
    assert_eq!(chebyshev(&[7, 2, 9], &[7, 2, 3]), 6);
}

#[test]
fn test_chebyshev_is_symmetric() {
    assert_eq!(chebyshev(&[2, 8], &[5, 1]), chebyshev(&[5, 1], &[2, 8]));
}

#[test]
fn test_finite_sq_diff_squares_known_pairs() {
    assert!((finite_sq_diff(3.0, 1.0) - 4.0).abs() < 1e-12);
    assert!((finite_sq_diff(-2.0, 2.0) - 16.0).abs() < 1e-12);
}

#[test]
fn test_finite_sq_diff_ignores_unknown_operands() {
    assert!((finite_sq_diff(f64::NAN, 1.0)).abs() < 1e-12);
    assert!((finite_sq_diff(1.0, f64::NAN)).abs() < 1e-12);
    assert!((finite_sq_diff(f64::INFINITY, 1.0)).abs() < 1e-12);
}

#[test]
fn test_mean_of_sample() {
    assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);
    assert!(mean(&[]).abs() < 1e-12);
}

#[test]
fn test_std_dev_of_sample() {
    assert!(std_dev(&[5.0]).abs() < 1e-12);
    assert!((std_dev(&[1.0, 3.0]) - 2.0_f64.sqrt()).abs() < 1e-12);
}
