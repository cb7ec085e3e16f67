use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use isocorr::{CorrectionConfig, Histogram, MemorySource};

fn work_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("isocorr-cli-{tag}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Two-bin calibration: nothing injected below eta 1, two deposits above
fn write_calibration(dir: &Path) -> PathBuf {
    let path = dir.join("calibration.json");
    MemorySource::new()
        .with_vector("eta_centers", vec![1.0, 2.0])
        .with_vector("rho_centers_eb", vec![5.0])
        .with_vector("rho_centers_ee", vec![5.0])
        .with_vector("extra_multiplicity", vec![0.0, 2.0])
        .with_histogram(
            "hist_1p000_5p00",
            Histogram::uniform("hist_1p000_5p00", 0.0, 8.0, vec![1.0; 4]).unwrap(),
        )
        .with_histogram(
            "hist_2p000_5p00",
            Histogram::uniform("hist_2p000_5p00", 0.0, 8.0, vec![1.0; 4]).unwrap(),
        )
        .write_json(&path)
        .unwrap();
    path
}

fn isocorr(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_isocorr"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("failed to run isocorr {args:?}: {e}"))
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn read_extras(path: &Path) -> Vec<(f64, f64)> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    assert_eq!(
        reader.headers().unwrap(),
        &csv::StringRecord::from(vec!["eta", "rho", "extra"])
    );
    reader
        .records()
        .map(|record| {
            let record = record.unwrap();
            (record[0].parse().unwrap(), record[2].parse().unwrap())
        })
        .collect()
}

#[test]
fn test_apply_writes_one_row_per_candidate() {
    let dir = work_dir("apply");
    let calibration = write_calibration(&dir);
    let input = dir.join("candidates.csv");
    let mut rows = String::from("eta,rho\n");
    for idx in 0..50 {
        rows.push_str(&format!("0.{},{}\n", idx % 10, 3 + idx));
        rows.push_str(&format!("2.{},{}\n", idx % 10, 3 + idx));
    }
    fs::write(&input, rows).unwrap();

    let first = dir.join("corrected-1.csv");
    let second = dir.join("corrected-2.csv");
    for output in [&first, &second] {
        let out = isocorr(&[
            "apply",
            arg(&calibration),
            "--input",
            arg(&input),
            "--output",
            arg(output),
            "--seed",
            "11",
        ]);
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    }

    let extras = read_extras(&first);
    assert_eq!(extras.len(), 100);
    for &(eta, extra) in &extras {
        if eta < 1.0 {
            assert_eq!(extra, 0.0, "eta {eta} is in the zero-multiplicity bin");
        } else {
            assert!((0.0..=16.0).contains(&extra), "extra {extra} out of range");
        }
    }
    assert!(extras.iter().any(|&(eta, extra)| eta > 1.0 && extra > 0.0));

    // Same seed, same corrections
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_sample_prints_clamped_bins() {
    let dir = work_dir("sample");
    let calibration = write_calibration(&dir);

    let out = isocorr(&[
        "sample",
        arg(&calibration),
        "--eta",
        "3.0",
        "--rho",
        "50",
        "--trials",
        "500",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["eta_bin"], 1);
    assert_eq!(summary["rho_bin"], 0);
    assert_eq!(summary["trials"], 500);
    assert_eq!(summary["expected_multiplicity"], 2.0);
    assert_eq!(summary["mean_drawn"], 2.0);
}

#[test]
fn test_sample_accepts_negative_eta() {
    let dir = work_dir("negative");
    let calibration = write_calibration(&dir);

    let out = isocorr(&["sample", arg(&calibration), "--eta", "-2.4", "--rho", "5"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["eta_bin"], 0);
    assert_eq!(summary["mean_extra"], 0.0);
}

#[test]
fn test_config_supplies_calibration_path() {
    let dir = work_dir("config");
    let calibration = write_calibration(&dir);
    let config = CorrectionConfig {
        calibration: Some(calibration),
        trials: 200,
        ..CorrectionConfig::default()
    };
    let config_path = dir.join("isocorr.toml");
    fs::write(&config_path, toml::to_string(&config).unwrap()).unwrap();

    let out = isocorr(&["--config", arg(&config_path), "sample", "--eta", "0.5", "--rho", "5"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["eta_bin"], 0);
    assert_eq!(summary["trials"], 200);

    let out = isocorr(&["--config", arg(&config_path), "inspect"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("eta bins: 2"));
}

#[test]
fn test_missing_calibration_fails() {
    let out = isocorr(&["sample", "--eta", "0.5", "--rho", "5"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no calibration file"), "{stderr}");
}
