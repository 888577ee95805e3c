//! # Frequency Map Module
//!
//! Loads the user-supplied frequency→key mapping and pre-quantizes it
//! into the bucket→key lookup table used for live matching. Map files
//! are JSON objects whose keys are decimal frequencies and whose
//! values are key identifiers:
//!
//! ```json
//! { "440.0": "a", "493.88": "space" }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::quantize::quantize;

/// Reads a frequency map file into `(frequency, key)` entries.
///
/// Entries keep the file's declaration order, which decides the
/// winner when two frequencies later collapse into one bucket.
///
/// Fails when the file is unreadable, is not a JSON object, has a key
/// that does not parse as a decimal frequency, or has a value that is
/// not a string.
pub fn load_raw_map<P: AsRef<Path>>(path: P) -> Result<Vec<(f64, String)>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read frequency map '{}'", path.display()))?;
    let json: Value = serde_json::from_str(&text)
        .with_context(|| format!("frequency map '{}' is not valid JSON", path.display()))?;

    let Value::Object(object) = json else {
        bail!("frequency map '{}' must be a JSON object", path.display());
    };

    let mut entries = Vec::with_capacity(object.len());
    for (raw_key, value) in object {
        let freq: f64 = raw_key
            .trim()
            .parse()
            .with_context(|| format!("map key '{raw_key}' is not a decimal frequency"))?;
        let Value::String(key) = value else {
            bail!("map value for '{raw_key}' must be a string key identifier");
        };
        entries.push((freq, key));
    }

    Ok(entries)
}

/// Quantizes every map entry, producing the bucket→key table.
///
/// Later entries overwrite earlier ones when their frequencies share
/// a bucket; that is the accepted collision policy, not an error.
/// Entries without a bucket (non-positive frequencies) are dropped,
/// as they can never match a detected pitch.
pub fn quantize_map(entries: &[(f64, String)], granularity: u32) -> HashMap<i64, String> {
    let mut bucket_map = HashMap::with_capacity(entries.len());
    for (freq, key) in entries {
        if let Some(bucket) = quantize(*freq, granularity) {
            bucket_map.insert(bucket, key.clone());
        }
    }
    bucket_map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_map(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn single_entry_maps_to_a_single_bucket() {
        let path = write_map("presser_map_single.json", r#"{ "440.0": "a" }"#);
        let entries = load_raw_map(&path).unwrap();
        let map = quantize_map(&entries, 56);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&6048).map(String::as_str), Some("a"));
    }

    #[test]
    fn later_declaration_wins_on_bucket_collision() {
        // 440 and 441 share a bucket at granularity 56; the entry
        // declared later in the file takes it.
        let path = write_map(
            "presser_map_collision.json",
            r#"{ "440.0": "a", "441.0": "b" }"#,
        );
        let map = quantize_map(&load_raw_map(&path).unwrap(), 56);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&6048).map(String::as_str), Some("b"));
    }

    #[test]
    fn declaration_order_beats_numeric_order() {
        let path = write_map(
            "presser_map_order.json",
            r#"{ "441.0": "first", "440.0": "second" }"#,
        );
        let map = quantize_map(&load_raw_map(&path).unwrap(), 56);

        assert_eq!(map.get(&6048).map(String::as_str), Some("second"));
    }

    #[test]
    fn distinct_notes_keep_distinct_buckets() {
        let path = write_map(
            "presser_map_notes.json",
            r#"{ "440.0": "a", "493.88": "b", "523.25": "c" }"#,
        );
        let map = quantize_map(&load_raw_map(&path).unwrap(), 56);

        assert_eq!(map.len(), 3);
    }

    #[test]
    fn non_positive_frequencies_are_dropped_at_quantization() {
        let entries = vec![(-1.0, "a".to_string()), (0.0, "b".to_string())];
        assert!(quantize_map(&entries, 56).is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_raw_map("/nonexistent/presser_map.json").is_err());
    }

    #[test]
    fn non_object_json_is_an_error() {
        let path = write_map("presser_map_array.json", r#"[440.0, "a"]"#);
        assert!(load_raw_map(&path).is_err());
    }

    #[test]
    fn unparseable_key_is_an_error() {
        let path = write_map("presser_map_badkey.json", r#"{ "A4": "a" }"#);
        assert!(load_raw_map(&path).is_err());
    }

    #[test]
    fn non_string_value_is_an_error() {
        let path = write_map("presser_map_badvalue.json", r#"{ "440.0": 7 }"#);
        assert!(load_raw_map(&path).is_err());
    }
}
