use std::path::PathBuf;

use isocorr::{
    CalibrationLayout, CorrectionError, Histogram, IsolationCorrection, JsonSource, MemorySource,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn temp_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("isocorr-{tag}-{}.json", std::process::id()))
}

fn scenario_source() -> MemorySource {
    MemorySource::new()
        .with_vector("eta_centers", vec![1.0, 2.0])
        .with_vector("rho_centers_eb", vec![5.0])
        .with_vector("rho_centers_ee", vec![5.0])
        .with_vector("extra_multiplicity", vec![0.0, 2.0])
        .with_histogram(
            "hist_1p000_5p00",
            Histogram::uniform("hist_1p000_5p00", 0.0, 8.0, vec![4.0, 3.0, 2.0, 1.0]).unwrap(),
        )
        .with_histogram(
            "hist_2p000_5p00",
            Histogram::uniform("hist_2p000_5p00", 0.0, 8.0, vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
        )
}

#[test]
fn test_scenario_from_json_file() {
    let path = temp_path("scenario");
    scenario_source().write_json(&path).unwrap();

    let correction = IsolationCorrection::open(&path).unwrap();
    let mut rng = StdRng::seed_from_u64(2026);

    for _ in 0..1000 {
        assert_eq!(correction.extra(0.5, 5.0, &mut rng), 0.0);

        let draw = correction.extra_detailed(2.5, 5.0, &mut rng);
        assert_eq!(draw.eta_bin, 1);
        assert_eq!(draw.rho_bin, Some(0));
        assert_eq!(draw.drawn, 2);
        assert_eq!(draw.threshold, Some(2.0));
        assert!(draw.sum >= 0.0 && draw.sum < 16.0);
    }

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_loading_twice_gives_same_calibration() {
    let path = temp_path("idempotent");
    scenario_source().write_json(&path).unwrap();

    let first = IsolationCorrection::open(&path).unwrap();
    let source = JsonSource::open(&path).unwrap();
    let second = IsolationCorrection::from_source(source, &CalibrationLayout::default()).unwrap();
    assert!(first.same_calibration(&second));
    assert_eq!(first.table().populated_cells(), 2);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_mean_extra_tracks_accepted_spectrum() {
    let correction =
        IsolationCorrection::from_source(scenario_source(), &CalibrationLayout::default()).unwrap();
    let mut sampler = correction.seeded_sampler(99);

    let n = 40_000;
    let total: f64 = (0..n).map(|_| sampler.get_extra(3.0, 1.0)).sum();
    let mean = total / n as f64;

    // Endcap cell: contents 1,2,3,4 over [0,2),[2,4),[4,6),[6,8).
    // Per deposit, the expected contribution above 2.0 is (2*3 + 3*5 + 4*7) / 10.
    let expected = 2.0 * (2.0 * 3.0 + 3.0 * 5.0 + 4.0 * 7.0) / 10.0;
    assert!((mean - expected).abs() < 0.1, "mean extra {mean} vs {expected}");
}

#[test]
fn test_missing_vector_aborts_construction() {
    let source = MemorySource::new()
        .with_vector("eta_centers", vec![1.0])
        .with_vector("rho_centers_eb", vec![5.0])
        .with_vector("rho_centers_ee", vec![5.0])
        .with_histogram(
            "hist_1p000_5p00",
            Histogram::uniform("hist_1p000_5p00", 0.0, 1.0, vec![1.0]).unwrap(),
        );

    let err = IsolationCorrection::from_source(source, &CalibrationLayout::default()).unwrap_err();
    match err {
        CorrectionError::Missing { name } => assert_eq!(name, "extra_multiplicity"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_multiplicity_length_must_match_eta_bins() {
    let source = scenario_source().with_vector("extra_multiplicity", vec![1.0]);
    assert!(matches!(
        IsolationCorrection::from_source(source, &CalibrationLayout::default()),
        Err(CorrectionError::LengthMismatch { .. })
    ));
}
