use std::time::Duration;

use crate::driver::output::{about, format_lap, other_flags, usage, version};

#[test]
fn test_format_lap() {
    assert_eq!(format_lap(Duration::from_millis(7), "Parsing done"), "[00:007] Parsing done");
    assert_eq!(format_lap(Duration::from_millis(61_250), "Total"), "[61:250] Total");
}

#[test]
fn test_info_texts() {
    assert!(version().starts_with("sharpc compiler version "));
    assert!(about().starts_with(&version()));
    assert!(usage().contains("Options can be of the form -option or /option"));
    assert!(other_flags().contains("--expect-error X"));
}
