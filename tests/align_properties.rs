// tests/align_properties.rs
//! Integration tests for multi-rate stream alignment

use eeg_core::align::{align_with_order, asof_indices, Attachment, Primary};
use eeg_core::stream::{AuxStream, SensorKind};
use eeg_core::InputError;
use ndarray::Array2;
use proptest::prelude::*;

fn primary(rows: usize, labels: &[&str]) -> Primary {
    Primary {
        timestamps: (0..rows)
            .map(|i| 1_600_000_000.0 + i as f64 / 256.0)
            .collect(),
        labels: labels.iter().map(|s| s.to_string()).collect(),
        data: Array2::from_shape_fn((rows, labels.len()), |(r, c)| (r * 100 + c) as f64),
    }
}

fn aux(kind: SensorKind, label: &str, values: &[f64]) -> AuxStream {
    AuxStream {
        kind,
        device: "Muse-TEST".to_string(),
        channels: vec![label.to_string()],
        samples: Array2::from_shape_fn((values.len(), 1), |(r, _)| values[r] as f32),
    }
}

#[test]
fn primary_only_output_matches_primary() {
    for rows in [1usize, 7, 256] {
        let table = align_with_order(&primary(rows, &["A", "B"]), &["A", "B"], &[])
            .expect("primary-only alignment");
        assert_eq!(table.n_rows(), rows);
        assert_eq!(table.column_names(), vec!["timestamp", "A", "B"]);
    }
}

#[test]
fn spec_scenario_two_records_ratio_five() {
    let secondary = aux(SensorKind::Accelerometer, "X", &[1.5, 2.5]);
    let table = align_with_order(
        &primary(10, &["A", "B"]),
        &["A", "B"],
        &[Attachment::with_ratio(&secondary, 5)],
    )
    .expect("alignment");

    assert_eq!(table.n_rows(), 10);
    assert_eq!(table.column_names(), vec!["timestamp", "A", "B", "X"]);

    let x = table.aux_column("X").expect("merged column");
    for row in 0..5 {
        assert_eq!(x[row], Some(1.5), "row {}", row);
    }
    for row in 5..10 {
        assert_eq!(x[row], Some(2.5), "row {}", row);
    }
}

#[test]
fn empty_primary_is_an_input_error() {
    let empty = Primary {
        timestamps: vec![],
        labels: vec!["A".to_string()],
        data: Array2::zeros((0, 1)),
    };
    assert_eq!(
        align_with_order(&empty, &["A"], &[]),
        Err(InputError::EmptyPrimary)
    );
}

#[test]
fn different_ratios_hold_independently() {
    let motion = aux(SensorKind::Accelerometer, "X_acc", &[1.0, 2.0, 3.0, 4.0]);
    let optical = aux(SensorKind::Ppg, "PPG1", &[10.0, 20.0, 30.0, 40.0, 50.0]);
    let table = align_with_order(
        &primary(20, &["A"]),
        &["A"],
        &[
            Attachment::with_ratio(&motion, 5),
            Attachment::with_ratio(&optical, 4),
        ],
    )
    .expect("alignment");

    let x = table.aux_column("X_acc").expect("motion column");
    let p = table.aux_column("PPG1").expect("optical column");
    for row in 0..20 {
        assert_eq!(x[row], Some((row / 5 + 1) as f64), "motion row {}", row);
        assert_eq!(p[row], Some(((row / 4 + 1) * 10) as f64), "optical row {}", row);
    }
}

#[test]
fn leading_gap_stays_absent() {
    // The join itself must honor a first scaled index above zero.
    let map = asof_indices(8, &[2, 6]);
    assert_eq!(&map[..2], &[None, None]);
    assert_eq!(&map[2..6], &[Some(0); 4]);
    assert_eq!(&map[6..], &[Some(1); 2]);
}

#[test]
fn secondary_longer_than_primary_is_truncated_by_the_join() {
    let secondary = aux(SensorKind::Gyroscope, "X_gyr", &[1.0, 2.0, 3.0, 4.0, 5.0]);
    let table = align_with_order(
        &primary(6, &["A"]),
        &["A"],
        &[Attachment::with_ratio(&secondary, 5)],
    )
    .expect("alignment");

    let x = table.aux_column("X_gyr").expect("column");
    // Only records 0 and 1 map inside the table; later ones never appear.
    assert_eq!(x[4], Some(1.0));
    assert_eq!(x[5], Some(2.0));
    assert_eq!(table.n_rows(), 6);
}

proptest! {
    /// Hold-last-value: for every secondary record j, rows j*r up to the
    /// next scaled row (or the end) carry exactly record j's value.
    #[test]
    fn hold_pattern_is_exact(
        rows in 1usize..400,
        ratio in 1usize..12,
        values in proptest::collection::vec(-1000.0f64..1000.0, 0..80),
    ) {
        let secondary = aux(SensorKind::Accelerometer, "X", &values);
        let table = align_with_order(
            &primary(rows, &["A"]),
            &["A"],
            &[Attachment::with_ratio(&secondary, ratio)],
        ).unwrap();

        let x = table.aux_column("X").unwrap();
        prop_assert_eq!(x.len(), rows);

        for (row, cell) in x.iter().enumerate() {
            let expected = if values.is_empty() {
                None
            } else {
                let j = (row / ratio).min(values.len() - 1);
                Some(values[j] as f32 as f64)
            };
            prop_assert_eq!(*cell, expected, "row {}", row);
        }
    }

    /// With no secondaries the table is the primary plus timestamps, for
    /// any primary size.
    #[test]
    fn primary_only_is_lossless(rows in 1usize..300) {
        let p = primary(rows, &["A", "B"]);
        let table = align_with_order(&p, &["A", "B"], &[]).unwrap();
        prop_assert_eq!(table.n_rows(), rows);
        let a = table.primary_column("A").unwrap();
        for row in 0..rows {
            prop_assert_eq!(a[row], p.data[(row, 0)]);
        }
    }
}
