//! End-to-end simulation behavior: conditioning, masking, determinism,
//! and trend bias

use geoquilt::{HardData, PathKind, QuiltingError, SimulationOptions, SoftPair, simulate};
use ndarray::{Array2, Array3, ArrayD, IxDyn};

/// Categorical training pattern over the values 1, 2, 3
fn categorical_ti(rows: usize, cols: usize) -> ArrayD<f64> {
    Array2::from_shape_fn((rows, cols), |(i, j)| ((i * 2 + j) % 3 + 1) as f64).into_dyn()
}

/// Training image whose value equals the row index
fn row_gradient(rows: usize, cols: usize) -> ArrayD<f64> {
    Array2::from_shape_fn((rows, cols), |(i, _)| i as f64).into_dyn()
}

#[test]
fn test_constant_training_image_reproduces_the_constant() {
    let ti: ArrayD<f64> = Array2::from_elem((5, 5), 7.0).into_dyn();
    let options = SimulationOptions::default();
    let Ok(output) = simulate(&ti, &[3, 3], &[8, 8], &options) else {
        unreachable!("constant simulation must succeed");
    };

    assert_eq!(output.realizations.len(), 1);
    let Some(realization) = output.realizations.first() else {
        unreachable!("one realization was requested");
    };
    assert_eq!(realization.shape(), &[8, 8]);
    assert!(realization.iter().all(|&v| (v - 7.0).abs() < 1e-12));
}

#[test]
fn test_output_values_stay_in_the_categorical_value_set() {
    let ti = categorical_ti(6, 6);
    let options = SimulationOptions {
        nreal: 2,
        ..SimulationOptions::default()
    };
    let Ok(output) = simulate(&ti, &[3, 3], &[9, 9], &options) else {
        unreachable!("categorical simulation must succeed");
    };

    for realization in &output.realizations {
        assert!(realization
            .iter()
            .all(|&v| (v - 1.0).abs() < 1e-12 || (v - 2.0).abs() < 1e-12 || (v - 3.0).abs() < 1e-12));
    }
}

#[test]
fn test_hard_data_is_honored_in_every_realization() {
    let ti = categorical_ti(6, 6);
    let Ok(hard) = HardData::from_pairs([(vec![0, 0], 2.0), (vec![4, 4], 1.0)]) else {
        unreachable!("distinct coordinates cannot conflict");
    };
    let options = SimulationOptions {
        hard,
        nreal: 3,
        ..SimulationOptions::default()
    };
    let Ok(output) = simulate(&ti, &[3, 3], &[8, 8], &options) else {
        unreachable!("conditioned simulation must succeed");
    };

    assert_eq!(output.realizations.len(), 3);
    for realization in &output.realizations {
        assert_eq!(realization.get([0usize, 0].as_slice()).copied(), Some(2.0));
        assert_eq!(realization.get([4usize, 4].as_slice()).copied(), Some(1.0));
    }
}

#[test]
fn test_inactive_coordinates_hold_the_unknown_marker() {
    let ti = categorical_ti(6, 6);
    let Ok(hard) = HardData::from_pairs([(vec![2, 2], f64::NAN), (vec![5, 1], f64::NAN)]) else {
        unreachable!("distinct coordinates cannot conflict");
    };
    let options = SimulationOptions {
        hard,
        ..SimulationOptions::default()
    };
    let Ok(output) = simulate(&ti, &[3, 3], &[6, 6], &options) else {
        unreachable!("masked simulation must succeed");
    };

    let Some(realization) = output.realizations.first() else {
        unreachable!("one realization was requested");
    };
    let mut unknown = 0;
    for (index, &value) in realization.iter().enumerate() {
        let masked = index == 2 * 6 + 2 || index == 5 * 6 + 1;
        if masked {
            assert!(value.is_nan());
            unknown += 1;
        } else {
            assert!(value.is_finite());
        }
    }
    assert_eq!(unknown, 2);
}

#[test]
fn test_same_seed_reproduces_identical_realizations() {
    let ti = categorical_ti(6, 6);
    let options = SimulationOptions {
        nreal: 2,
        path_kind: PathKind::Random,
        seed: 1234,
        ..SimulationOptions::default()
    };

    let Ok(first) = simulate(&ti, &[3, 3], &[8, 8], &options) else {
        unreachable!("simulation must succeed");
    };
    let Ok(second) = simulate(&ti, &[3, 3], &[8, 8], &options) else {
        unreachable!("simulation must succeed");
    };

    assert_eq!(first.realizations, second.realizations);
}

#[test]
fn test_soft_trend_biases_the_realization() {
    let ti = row_gradient(12, 12);
    let soft = SoftPair::new(row_gradient(12, 12), row_gradient(12, 12));
    let grid_aux_before = soft.grid_aux.clone();
    let ti_aux_before = soft.ti_aux.clone();

    let options = SimulationOptions {
        soft: vec![soft],
        tol: 0.01,
        seed: 7,
        ..SimulationOptions::default()
    };
    let Ok(output) = simulate(&ti, &[4, 4], &[12, 12], &options) else {
        unreachable!("trend-conditioned simulation must succeed");
    };

    let Some(realization) = output.realizations.first() else {
        unreachable!("one realization was requested");
    };
    let mut low_side = 0.0;
    let mut high_side = 0.0;
    for (index, &value) in realization.iter().enumerate() {
        if index / 12 < 6 {
            low_side += value;
        } else {
            high_side += value;
        }
    }
    assert!(low_side <= high_side);

    // Soft fields are read-only inputs.
    let Some(pair) = options.soft.first() else {
        unreachable!("one soft pair was supplied");
    };
    assert_eq!(grid_aux_before, pair.grid_aux);
    assert_eq!(ti_aux_before, pair.ti_aux);
}

#[test]
fn test_debug_output_reports_per_tile_cut_statistics() {
    let ti = categorical_ti(6, 6);
    let options = SimulationOptions {
        nreal: 2,
        debug: true,
        ..SimulationOptions::default()
    };
    let Ok(output) = simulate(&ti, &[3, 3], &[8, 8], &options) else {
        unreachable!("simulation must succeed");
    };

    let Some(stats) = output.cut_stats else {
        unreachable!("debug mode must report cut statistics");
    };
    assert_eq!(stats.len(), 2);
    let tile_counts: Vec<usize> = stats.iter().map(Vec::len).collect();
    assert!(tile_counts.iter().all(|&count| count == tile_counts.first().copied().unwrap_or(0)));
    assert!(tile_counts.first().copied().unwrap_or(0) > 0);
}

#[test]
fn test_overlap_metadata_reports_resolved_band_widths() {
    let ti = categorical_ti(6, 6);
    let options = SimulationOptions {
        overlap: Some(vec![0.25, 0.25]),
        ..SimulationOptions::default()
    };
    let Ok(output) = simulate(&ti, &[4, 4], &[8, 8], &options) else {
        unreachable!("simulation must succeed");
    };

    assert_eq!(output.overlap, vec![1, 1]);
}

#[test]
fn test_every_path_kind_produces_valid_output() {
    let ti = categorical_ti(6, 6);
    for kind in [
        PathKind::Raster,
        PathKind::Random,
        PathKind::Dilation,
        PathKind::DataFirst,
    ] {
        let options = SimulationOptions {
            path_kind: kind,
            ..SimulationOptions::default()
        };
        let Ok(output) = simulate(&ti, &[3, 3], &[8, 8], &options) else {
            unreachable!("simulation must succeed for every path kind");
        };
        let Some(realization) = output.realizations.first() else {
            unreachable!("one realization was requested");
        };
        assert!(realization.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_three_dimensional_simulation() {
    let ti: ArrayD<f64> = Array3::from_elem((4, 4, 4), 3.0).into_dyn();
    let options = SimulationOptions::default();
    let Ok(output) = simulate(&ti, &[2, 2, 2], &[5, 5, 5], &options) else {
        unreachable!("three-dimensional simulation must succeed");
    };

    let Some(realization) = output.realizations.first() else {
        unreachable!("one realization was requested");
    };
    assert_eq!(realization.shape(), &[5, 5, 5]);
    assert!(realization.iter().all(|&v| (v - 3.0).abs() < 1e-12));
}

#[test]
fn test_tile_larger_than_grid_is_a_configuration_error() {
    let ti = categorical_ti(8, 8);
    let options = SimulationOptions::default();
    let result = simulate(&ti, &[6, 6], &[4, 8], &options);
    assert!(matches!(result, Err(QuiltingError::TileExceedsGrid { .. })));
}

#[test]
fn test_training_image_smaller_than_tile_is_a_configuration_error() {
    let ti = categorical_ti(3, 3);
    let options = SimulationOptions::default();
    let result = simulate(&ti, &[4, 4], &[8, 8], &options);
    assert!(matches!(
        result,
        Err(QuiltingError::TrainingImageTooSmall { .. })
    ));
}

#[test]
fn test_rank_mismatch_is_a_configuration_error() {
    let ti = categorical_ti(6, 6);
    let options = SimulationOptions::default();
    let result = simulate(&ti, &[3, 3, 3], &[8, 8, 8], &options);
    assert!(matches!(result, Err(QuiltingError::RankMismatch { .. })));
}

#[test]
fn test_zero_realizations_is_rejected() {
    let ti = categorical_ti(6, 6);
    let options = SimulationOptions {
        nreal: 0,
        ..SimulationOptions::default()
    };
    let result = simulate(&ti, &[3, 3], &[8, 8], &options);
    assert!(matches!(
        result,
        Err(QuiltingError::InvalidParameter { .. })
    ));
}

#[test]
fn test_mismatched_soft_field_shapes_are_rejected() {
    let ti = categorical_ti(6, 6);
    let options = SimulationOptions {
        soft: vec![SoftPair::new(
            ArrayD::zeros(IxDyn(&[4, 4])),
            ArrayD::zeros(IxDyn(&[6, 6])),
        )],
        ..SimulationOptions::default()
    };
    let result = simulate(&ti, &[3, 3], &[8, 8], &options);
    assert!(matches!(result, Err(QuiltingError::ShapeMismatch { .. })));
}

#[test]
fn test_hard_data_outside_the_grid_is_rejected() {
    let ti = categorical_ti(6, 6);
    let Ok(hard) = HardData::from_pairs([(vec![20, 0], 1.0)]) else {
        unreachable!("single entry cannot conflict");
    };
    let options = SimulationOptions {
        hard,
        ..SimulationOptions::default()
    };
    let result = simulate(&ti, &[3, 3], &[8, 8], &options);
    assert!(matches!(result, Err(QuiltingError::OutOfBounds { .. })));
}
