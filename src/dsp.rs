//! Pure signal routines for PPG analysis
//!
//! Everything here is signal-in, result-out with no shared state, so the
//! spectral path can be property-tested in isolation and reused for offline
//! reprocessing independent of the live per-frame loop.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Spectral peak found within a frequency band.
#[derive(Debug, Clone, Copy)]
pub struct SpectralPeak {
    /// Peak frequency in Hz.
    pub frequency_hz: f64,
    /// Peak magnitude relative to the mean in-band magnitude, clamped to
    /// [0, 1]. A relative-energy heuristic, not a calibrated probability.
    pub confidence: f64,
}

/// Hann window coefficients.
pub fn hann_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            let phase = (2.0 * std::f64::consts::PI * i as f64) / (size - 1) as f64;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Smallest power of two >= `n`.
pub fn next_power_of_two(n: usize) -> usize {
    n.next_power_of_two()
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Remove slow baseline drift by subtracting a centered moving average.
///
/// `span` is the full averaging width in samples; values below 1 are clamped.
pub fn moving_average_detrend(signal: &[f64], span: usize) -> Vec<f64> {
    let span = span.max(1);
    let half = span / 2;
    let n = signal.len();

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            signal[i] - mean(&signal[lo..hi])
        })
        .collect()
}

/// Centered moving-average smoothing with the given one-sided radius.
pub fn moving_average_smooth(signal: &[f64], radius: usize) -> Vec<f64> {
    let n = signal.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius + 1).min(n);
            mean(&signal[lo..hi])
        })
        .collect()
}

/// Magnitude spectrum of the positive-frequency half of a real signal.
///
/// The signal is zero-padded to the next power of two and Hann-windowed
/// before the forward FFT. Returns (magnitudes, fft_size); magnitudes has
/// `fft_size / 2 + 1` entries, bin `i` at frequency `i * fs / fft_size`.
pub fn magnitude_spectrum(signal: &[f64]) -> (Vec<f64>, usize) {
    if signal.len() < 2 {
        return (Vec::new(), 0);
    }

    let window = hann_window(signal.len());
    let fft_size = next_power_of_two(signal.len());

    let mut buffer: Vec<Complex<f64>> = signal
        .iter()
        .zip(window.iter())
        .map(|(s, w)| Complex::new(s * w, 0.0))
        .collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    let magnitudes: Vec<f64> = buffer
        .iter()
        .take(fft_size / 2 + 1)
        .map(|c| c.norm())
        .collect();

    (magnitudes, fft_size)
}

/// Search a magnitude spectrum for the dominant peak inside [min_hz, max_hz].
///
/// Bin 0 (DC) is always excluded. Returns None when no bin falls inside the
/// band. Confidence is the peak magnitude over the mean in-band magnitude,
/// clamped to [0, 1], rewarding a sharp dominant peak over a flat spectrum.
pub fn band_peak(
    magnitudes: &[f64],
    fft_size: usize,
    sample_rate_hz: f64,
    min_hz: f64,
    max_hz: f64,
) -> Option<SpectralPeak> {
    if magnitudes.is_empty() || fft_size == 0 || sample_rate_hz <= 0.0 {
        return None;
    }

    let bin_hz = sample_rate_hz / fft_size as f64;
    let min_bin = ((min_hz / bin_hz).ceil() as usize).max(1);
    let max_bin = ((max_hz / bin_hz).floor() as usize).min(magnitudes.len() - 1);
    if min_bin > max_bin {
        return None;
    }

    let band = &magnitudes[min_bin..=max_bin];
    let mut peak_offset = 0;
    let mut peak_magnitude = band[0];
    for (i, &m) in band.iter().enumerate() {
        if m > peak_magnitude {
            peak_magnitude = m;
            peak_offset = i;
        }
    }

    let band_mean = mean(band);
    let confidence = if band_mean > 0.0 {
        (peak_magnitude / band_mean).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Some(SpectralPeak {
        frequency_hz: (min_bin + peak_offset) as f64 * bin_hz,
        confidence,
    })
}

/// Adaptive peak detection over a smoothed pulsatile waveform.
///
/// A sample qualifies when it exceeds `mean + k_std * stddev` and is a strict
/// local maximum versus both neighbors.
pub fn detect_peaks(signal: &[f64], k_std: f64) -> Vec<usize> {
    if signal.len() < 3 {
        return Vec::new();
    }

    let threshold = mean(signal) + k_std * std_dev(signal);
    let mut peaks = Vec::new();
    for i in 1..signal.len() - 1 {
        if signal[i] > threshold && signal[i] > signal[i - 1] && signal[i] > signal[i + 1] {
            peaks.push(i);
        }
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(freq_hz: f64, sample_rate_hz: f64, seconds: f64) -> Vec<f64> {
        let n = (sample_rate_hz * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq_hz * i as f64 / sample_rate_hz).sin())
            .collect()
    }

    #[test]
    fn test_hann_window_endpoints() {
        let w = hann_window(64);
        assert_relative_eq!(w[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(w[63], 0.0, epsilon = 1e-12);
        assert_relative_eq!(w[31], 1.0, epsilon = 0.01);
    }

    #[test]
    fn test_detrend_removes_constant_offset() {
        let signal = vec![5.0; 50];
        let detrended = moving_average_detrend(&signal, 10);
        for v in detrended {
            assert_relative_eq!(v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_detrend_removes_linear_drift() {
        let signal: Vec<f64> = (0..100)
            .map(|i| i as f64 * 0.01 + (i as f64 * 0.7).sin())
            .collect();
        let detrended = moving_average_detrend(&signal, 15);
        // Interior mean should be near zero once the ramp is subtracted.
        let interior = &detrended[10..90];
        assert!(mean(interior).abs() < 0.05);
    }

    #[test]
    fn test_band_peak_finds_sine_frequency() {
        let fs = 32.0;
        let signal = sine(1.2, fs, 16.0);
        let (magnitudes, fft_size) = magnitude_spectrum(&signal);
        let peak = band_peak(&magnitudes, fft_size, fs, 0.7, 3.0).unwrap();

        assert!(
            (peak.frequency_hz - 1.2).abs() < 0.05,
            "expected ~1.2 Hz, got {}",
            peak.frequency_hz
        );
        assert!(peak.confidence > 0.5);
    }

    #[test]
    fn test_band_peak_empty_band_is_none() {
        let fs = 32.0;
        let signal = sine(1.2, fs, 8.0);
        let (magnitudes, fft_size) = magnitude_spectrum(&signal);
        // Band narrower than one bin at the very bottom of the spectrum.
        assert!(band_peak(&magnitudes, fft_size, fs, 0.0001, 0.0002).is_none());
    }

    #[test]
    fn test_band_peak_rejects_bad_sample_rate() {
        let (magnitudes, fft_size) = magnitude_spectrum(&sine(1.0, 30.0, 4.0));
        assert!(band_peak(&magnitudes, fft_size, 0.0, 0.7, 3.0).is_none());
        assert!(band_peak(&magnitudes, fft_size, -5.0, 0.7, 3.0).is_none());
    }

    #[test]
    fn test_detect_peaks_on_regular_pulses() {
        let fs = 30.0;
        let signal = sine(1.0, fs, 5.0);
        let peaks = detect_peaks(&signal, 0.3);

        // 1 Hz over 5 s: roughly one peak per second.
        assert!((4..=6).contains(&peaks.len()), "peaks: {}", peaks.len());

        // Strictly increasing and roughly evenly spaced.
        for pair in peaks.windows(2) {
            let gap = pair[1] - pair[0];
            assert!((28..=32).contains(&gap), "gap: {gap}");
        }
    }

    #[test]
    fn test_detect_peaks_short_input() {
        assert!(detect_peaks(&[1.0, 2.0], 0.3).is_empty());
        assert!(detect_peaks(&[], 0.3).is_empty());
    }

    #[test]
    fn test_magnitude_spectrum_size() {
        let signal = vec![0.5; 100];
        let (magnitudes, fft_size) = magnitude_spectrum(&signal);
        assert_eq!(fft_size, 128);
        assert_eq!(magnitudes.len(), 65);
    }
}
