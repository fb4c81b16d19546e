use exg_xai::serialize::parse_rows;
use exg_xai::{save, save_results, write_rows, AccuracyResult, Row, XaiError};

fn tmp(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("exg_xai_{name}_{}.txt", std::process::id()))
}

#[test]
fn ragged_example() {
    let rows = [Row::from(1.0_f64), Row::from(vec![2.0, 3.5]), Row::from(4.25_f64)];
    let mut out = Vec::new();
    write_rows(&rows, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "1.000000\n2.000000,3.500000\n4.250000\n");
}

#[test]
fn results_one_per_line() {
    let zero = AccuracyResult { name: "zero_segments".into(), accuracies: vec![0.5, 0.75, 1.0] };
    let channel = AccuracyResult { name: "zero_channels".into(), accuracies: vec![0.25, 0.125] };
    let path = tmp("results");
    save_results([&zero, &channel], &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "0.500000,0.750000,1.000000\n0.250000,0.125000\n");
    let rows = parse_rows(&text).unwrap();
    assert_eq!(rows, vec![Row::Values(vec![0.5, 0.75, 1.0]), Row::Values(vec![0.25, 0.125])]);
    std::fs::remove_file(&path).ok();
}

#[test]
fn values_parse_back_within_tolerance() {
    let values = vec![0.123_456_789, -3.0, 1e-7, 42.5];
    let mut out = Vec::new();
    write_rows(&[Row::from(values.clone())], &mut out).unwrap();
    let back = parse_rows(std::str::from_utf8(&out).unwrap()).unwrap();
    let Row::Values(parsed) = &back[0] else { panic!("expected a sequence") };
    for (a, b) in values.iter().zip(parsed) {
        assert!((a - b).abs() <= 5e-7, "{a} vs {b}");
    }
}

#[test]
fn missing_directory_is_an_io_error() {
    let path = std::env::temp_dir().join("exg_xai_missing_dir").join("x.txt");
    assert!(matches!(save(&[Row::from(0.5_f32)], &path), Err(XaiError::Io { .. })));
}
