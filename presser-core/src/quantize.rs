//! # Frequency Quantization Module
//!
//! Maps raw frequencies to discrete note buckets on a logarithmic
//! scale. A fixed bucket width in log-frequency corresponds to a fixed
//! pitch-ratio tolerance, so a bucket behaves like a semitone-sized
//! window regardless of absolute pitch.

/// Quantizes a frequency to its note bucket.
///
/// The bucket is `raw - raw % granularity` where `raw` is
/// `ln(freq) * 1000` truncated to an integer. Granularity is the
/// bucket width in thousandths of natural-log units; two frequencies
/// share a bucket exactly when they count as "the same note" for
/// matching. The same granularity must be used for map construction
/// and live quantization, otherwise buckets never line up.
///
/// # Arguments
/// * `freq` - Input frequency in Hz
/// * `granularity` - Bucket width, must be non-zero
///
/// # Returns
/// * `Some(bucket)` - The bucket for a positive frequency
/// * `None` - Non-positive input (silence / no pitch detected)
pub fn quantize(freq: f64, granularity: u32) -> Option<i64> {
    if freq <= 0.0 {
        return None;
    }

    // Truncation toward zero, in both the cast and `%`. A flooring
    // modulo would shift bucket boundaries for frequencies below 1 Hz,
    // where the scaled log is negative.
    let raw = (freq.ln() * 1000.0) as i64;
    Some(raw - raw % i64::from(granularity))
}

#[cfg(test)]
mod tests {
    use super::quantize;

    #[test]
    fn non_positive_frequencies_have_no_bucket() {
        for g in [1, 14, 56, 200] {
            assert_eq!(quantize(0.0, g), None);
            assert_eq!(quantize(-440.0, g), None);
            assert_eq!(quantize(f64::NEG_INFINITY, g), None);
        }
    }

    #[test]
    fn nearby_frequencies_share_a_bucket() {
        // A 1 Hz wobble around A4 stays well inside one bucket at the
        // default granularity.
        assert_eq!(quantize(440.0, 56), Some(6048));
        assert_eq!(quantize(441.0, 56), Some(6048));
        assert_eq!(quantize(439.0, 56), Some(6048));
    }

    #[test]
    fn bucket_sharing_bounds_the_frequency_ratio() {
        // Two frequencies whose ratio exceeds exp(g / 1000) can never
        // land in the same bucket.
        let g = 56;
        let max_ratio = (f64::from(g) / 1000.0).exp();
        let mut f1 = 20.0;
        while f1 < 2000.0 {
            let f2 = f1 * max_ratio * 1.01;
            assert_ne!(quantize(f1, g), quantize(f2, g), "{f1} vs {f2}");
            f1 *= 1.13;
        }
    }

    #[test]
    fn aligned_buckets_requantize_to_themselves() {
        // Bucket values are multiples of the granularity; a frequency
        // inside such a bucket maps straight back to it.
        let g = 56;
        for bucket in [0, 56 * 10, 56 * 108, 56 * 150] {
            let freq = ((bucket as f64 + 0.5) / 1000.0).exp();
            assert_eq!(quantize(freq, g), Some(bucket));
        }
    }

    #[test]
    fn sub_hertz_frequencies_use_truncating_modulo() {
        // ln(0.5) * 1000 truncates to -693, and -693 % 56 is -21, so
        // the bucket is -672. A flooring modulo would yield -728 and
        // silently shift every sub-1 Hz bucket boundary.
        assert_eq!(quantize(0.5, 56), Some(-672));
    }

    #[test]
    fn granularity_one_keeps_raw_log_values() {
        assert_eq!(quantize(440.0, 1), Some(6086));
    }
}
