//! Conformance tests that run YAML fixtures against paramgate
//!
//! Run with: cargo test -p paramgate-test --test conformance --features paramgate-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use paramgate_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and run all fixtures in a directory
fn run_fixtures_in_dir(dir: &Path) {
    assert!(dir.exists(), "Fixtures directory does not exist: {}", dir.display());

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.extension().is_some_and(|e| e == "yaml" || e == "yml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures in {}", dir.display());

    for path in paths {
        println!("Running fixture: {}", path.display());
        let yaml = fs::read_to_string(&path).expect("read yaml");

        // Parse potentially multiple fixtures (separated by ---)
        let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {}", path.display(), e);
        });

        for fixture in fixtures {
            println!("  Running: {}", fixture.name);
            fixture.run_and_assert();
        }
    }
}

#[test]
fn test_grammar() {
    run_fixtures_in_dir(&fixtures_dir().join("01_grammar"));
}

#[test]
fn test_matchers() {
    run_fixtures_in_dir(&fixtures_dir().join("02_matchers"));
}

#[test]
fn test_specificity() {
    run_fixtures_in_dir(&fixtures_dir().join("03_specificity"));
}

#[test]
fn test_normalization() {
    run_fixtures_in_dir(&fixtures_dir().join("04_normalization"));
}

#[test]
fn test_plugins() {
    run_fixtures_in_dir(&fixtures_dir().join("05_plugins"));
}

#[test]
fn test_errors() {
    run_fixtures_in_dir(&fixtures_dir().join("06_errors"));
}
