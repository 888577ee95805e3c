//! # Fast Fourier Transform (FFT) Module
//!
//! Frequency-domain support for the pitch estimator: DC offset
//! removal, Hann windowing and magnitude spectra over single sample
//! blocks.

use rustfft::{num_complex::Complex, FftPlanner};

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a Hann window to the buffer to reduce spectral leakage.
fn apply_hann_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos());
        *sample *= multiplier;
    }
}

/// Performs a forward FFT on one sample block and returns the complex
/// spectrum.
///
/// The block is DC-corrected and Hann-windowed before the transform.
pub fn perform_fft(signal: &[f32]) -> Vec<Complex<f32>> {
    let mut processed_signal = signal.to_vec();
    remove_dc_offset(&mut processed_signal);
    apply_hann_window(&mut processed_signal);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(processed_signal.len());

    let mut buffer: Vec<Complex<f32>> = processed_signal
        .into_iter()
        .map(|sample| Complex { re: sample, im: 0.0 })
        .collect();

    fft.process(&mut buffer);
    buffer
}

/// Collapses a complex spectrum into bin magnitudes.
///
/// Only the first half of the spectrum, up to the Nyquist frequency,
/// carries information for a real input signal.
pub fn spectrum_to_magnitudes(spectrum: &[Complex<f32>]) -> Vec<f32> {
    spectrum
        .iter()
        .take(spectrum.len() / 2)
        .map(|c| c.norm())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_spectrum_peaks_at_the_expected_bin() {
        let sample_rate = 44_100.0f32;
        let block: Vec<f32> = (0..512)
            .map(|n| (2.0 * std::f32::consts::PI * 1722.0 * n as f32 / sample_rate).sin())
            .collect();

        let magnitudes = spectrum_to_magnitudes(&perform_fft(&block));
        let peak_bin = magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();

        // 1722 Hz over a 512-sample block at 44.1 kHz lands in bin 20.
        assert_eq!(peak_bin, 20);
    }
}
