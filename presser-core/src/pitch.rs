//! # Pitch Estimation Module
//!
//! Produces one fundamental-frequency estimate per sample block using
//! the YIN algorithm, refined against the block's magnitude spectrum
//! for sub-bin accuracy. Blocks with no usable pitch (silence, noise,
//! out-of-range periods) estimate as `0.0`, the conventional unvoiced
//! value that downstream matching treats as "no pitch detected".

use crate::fft;

/// Minimum RMS level for a block to count as voiced.
const AMPLITUDE_THRESHOLD: f32 = 0.01;

/// Upper bound on the normalized difference at the chosen period;
/// anything above it reads as noise rather than a tone.
const CLARITY_THRESHOLD: f32 = 0.1;

/// Fundamental-frequency estimator over fixed-size sample blocks.
///
/// One estimator is created per run, bound to the source's sample
/// rate.
pub struct PitchEstimator {
    sample_rate: u32,
}

impl PitchEstimator {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Estimates the fundamental frequency of one block, in Hz.
    ///
    /// Returns `0.0` for unvoiced blocks.
    pub fn estimate(&self, block: &[f32]) -> f32 {
        let Some(rough) = yin_pitch(block, self.sample_rate, AMPLITUDE_THRESHOLD) else {
            return 0.0;
        };

        let magnitudes = fft::spectrum_to_magnitudes(&fft::perform_fft(block));
        refine_from_spectrum(&magnitudes, rough, self.sample_rate).unwrap_or(rough)
    }
}

/// A robust implementation of the YIN pitch detection algorithm.
///
/// Steps: RMS gate for silence, squared difference function,
/// cumulative mean normalization, first-dip period search with a
/// clarity check to reject noise, then parabolic interpolation for
/// sub-sample accuracy.
fn yin_pitch(signal: &[f32], sample_rate: u32, amplitude_threshold: f32) -> Option<f32> {
    let frame_size = signal.len();
    if frame_size < 4 {
        return None;
    }
    let mut yin_buffer = vec![0.0; frame_size / 2];

    // Noise gate: skip blocks that are effectively silence.
    let rms = (signal.iter().map(|&s| s * s).sum::<f32>() / frame_size as f32).sqrt();
    if rms < amplitude_threshold {
        return None;
    }

    // Squared difference function.
    for tau in 1..(frame_size / 2) {
        let mut diff = 0.0;
        for i in 0..(frame_size / 2) {
            let delta = signal[i] - signal[i + tau];
            diff += delta * delta;
        }
        yin_buffer[tau] = diff;
    }

    // Cumulative mean normalized difference.
    let mut running_sum = 0.0;
    yin_buffer[0] = 1.0;
    for tau in 1..(frame_size / 2) {
        running_sum += yin_buffer[tau];
        if running_sum != 0.0 {
            yin_buffer[tau] *= tau as f32 / running_sum;
        } else {
            yin_buffer[tau] = 1.0;
        }
    }

    // Find the first significant dip to avoid octave errors.
    let min_val = yin_buffer
        .iter()
        .skip(1)
        .cloned()
        .fold(f32::INFINITY, f32::min);

    let mut period = 0;
    let threshold = min_val + 0.05;

    for tau in 2..(frame_size / 2) {
        if yin_buffer[tau] < threshold && yin_buffer[tau] < yin_buffer[tau - 1] {
            period = tau;
            break;
        }
    }

    // A clear tone has a very low value at the chosen period; anything
    // else is noise.
    if period == 0 || yin_buffer[period] > CLARITY_THRESHOLD {
        return None;
    }

    // Parabolic interpolation around the dip. Bounds check first.
    if period + 1 >= frame_size / 2 {
        return None;
    }

    let y1 = yin_buffer[period - 1];
    let y2 = yin_buffer[period];
    let y3 = yin_buffer[period + 1];

    let period_float = if (y1 - 2.0 * y2 + y3) != 0.0 {
        let peak_shift = (y1 - y3) / (2.0 * (y1 - 2.0 * y2 + y3));
        period as f32 + peak_shift
    } else {
        period as f32
    };

    let frequency = sample_rate as f32 / period_float;

    // Only audible, finite estimates are usable.
    if frequency.is_finite() && frequency > 20.0 {
        Some(frequency)
    } else {
        None
    }
}

/// Refines a rough frequency estimate using the block's magnitude
/// spectrum.
///
/// Searches a few bins around the rough estimate for the spectral
/// peak and interpolates it parabolically on log magnitudes. Falls
/// back to the rough estimate whenever the neighborhood is unusable.
fn refine_from_spectrum(
    spectrum_magnitudes: &[f32],
    rough_freq: f32,
    sample_rate: u32,
) -> Option<f32> {
    if rough_freq <= 0.0 || spectrum_magnitudes.is_empty() {
        return None;
    }
    let buffer_size = spectrum_magnitudes.len() * 2;
    let target_bin = (rough_freq * buffer_size as f32) / sample_rate as f32;
    let search_radius = 2.0;
    let start_bin = (target_bin - search_radius).max(0.0) as usize;
    let end_bin = (target_bin + search_radius).min((spectrum_magnitudes.len() - 1) as f32) as usize;
    if start_bin >= end_bin {
        return Some(rough_freq);
    }

    let peak_bin = match spectrum_magnitudes[start_bin..=end_bin]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
    {
        Some((offset, _)) => start_bin + offset,
        None => return Some(rough_freq),
    };

    if peak_bin == 0 || peak_bin >= spectrum_magnitudes.len() - 1 {
        return Some(rough_freq);
    }

    let y1 = spectrum_magnitudes[peak_bin - 1].ln();
    let y2 = spectrum_magnitudes[peak_bin].ln();
    let y3 = spectrum_magnitudes[peak_bin + 1].ln();

    if !y1.is_finite() || !y2.is_finite() || !y3.is_finite() {
        return Some(rough_freq);
    }

    let denominator = 2.0 * y2 - y1 - y3;
    if denominator.abs() < 1e-6 {
        return Some(rough_freq);
    }

    let peak_shift = (y3 - y1) / (2.0 * denominator);
    let interpolated_bin = peak_bin as f32 + peak_shift;
    let final_freq = (interpolated_bin * sample_rate as f32) / buffer_size as f32;

    if final_freq.is_finite() && final_freq > 0.0 {
        Some(final_freq)
    } else {
        Some(rough_freq)
    }
}
