//! PPG signal processor
//!
//! Accumulates one color-intensity sample per frame into a time-bounded ring
//! buffer and periodically re-estimates heart rate, respiration rate and HRV.
//! The spectral estimates share one pipeline: sample-rate estimation from
//! timestamp deltas, mean removal, moving-average detrending, Hann window,
//! forward FFT, and an in-band magnitude peak search. HRV works in the time
//! domain instead, detecting pulse peaks and measuring inter-beat intervals.
//!
//! Recomputation is rate-limited (heart rate >= 1 s, respiration >= 2 s,
//! HRV >= 5 s); between recomputes the cached results are re-served.

use crate::config::PpgConfig;
use crate::dsp;
use crate::types::{ColorSample, HeartRateResult, HrvResult, RespirationResult};
use std::collections::VecDeque;

/// One-sided radius for the pulsatile-waveform smoothing used by HRV.
const HRV_SMOOTH_RADIUS: usize = 3;

/// Stateful PPG processor, one per analysis session.
#[derive(Debug)]
pub struct PpgProcessor {
    config: PpgConfig,
    samples: VecDeque<ColorSample>,
    last_hr_at_ms: Option<f64>,
    last_resp_at_ms: Option<f64>,
    last_hrv_at_ms: Option<f64>,
    heart_rate: HeartRateResult,
    respiration: RespirationResult,
    hrv: HrvResult,
}

impl PpgProcessor {
    pub fn new(config: PpgConfig) -> Self {
        Self {
            config,
            samples: VecDeque::new(),
            last_hr_at_ms: None,
            last_resp_at_ms: None,
            last_hrv_at_ms: None,
            heart_rate: HeartRateResult::default(),
            respiration: RespirationResult::default(),
            hrv: HrvResult::default(),
        }
    }

    /// Append one color sample and evict entries older than the window.
    pub fn push_sample(&mut self, timestamp_ms: f64, intensity: f64) {
        self.samples.push_back(ColorSample {
            timestamp_ms,
            intensity,
        });
        let cutoff = timestamp_ms - self.config.sample_window_ms;
        while let Some(front) = self.samples.front() {
            if front.timestamp_ms < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Recompute whichever estimates are due at `now_ms`.
    pub fn update(&mut self, now_ms: f64) {
        let samples: Vec<ColorSample> = self.samples.iter().copied().collect();

        if due(self.last_hr_at_ms, now_ms, self.config.hr_interval_ms) {
            self.heart_rate =
                compute_heart_rate(&samples, self.config.hr_band_bpm, self.config.min_samples);
            self.last_hr_at_ms = Some(now_ms);
            tracing::debug!(
                bpm = ?self.heart_rate.bpm,
                confidence = self.heart_rate.confidence,
                "heart rate recomputed"
            );
        }

        if due(self.last_resp_at_ms, now_ms, self.config.resp_interval_ms) {
            self.respiration =
                compute_respiration(&samples, self.config.resp_band_bpm, self.config.min_samples);
            self.last_resp_at_ms = Some(now_ms);
        }

        if due(self.last_hrv_at_ms, now_ms, self.config.hrv_interval_ms) {
            self.hrv = compute_hrv(
                &samples,
                self.config.hrv_min_samples,
                self.config.peak_k_std,
            );
            self.last_hrv_at_ms = Some(now_ms);
        }
    }

    pub fn heart_rate(&self) -> HeartRateResult {
        self.heart_rate.clone()
    }

    pub fn respiration(&self) -> RespirationResult {
        self.respiration.clone()
    }

    pub fn hrv(&self) -> HrvResult {
        self.hrv.clone()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

fn due(last_ms: Option<f64>, now_ms: f64, interval_ms: f64) -> bool {
    match last_ms {
        None => true,
        Some(last) => now_ms - last >= interval_ms,
    }
}

/// Estimate the sampling rate in Hz from the mean inter-sample delta.
pub fn estimate_sample_rate(samples: &[ColorSample]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let span_ms = samples[samples.len() - 1].timestamp_ms - samples[0].timestamp_ms;
    let mean_dt_ms = span_ms / (samples.len() - 1) as f64;
    let rate = 1000.0 / mean_dt_ms;
    if rate.is_finite() && rate > 0.0 {
        Some(rate)
    } else {
        None
    }
}

/// Heart-rate estimation over the buffered samples.
///
/// Requires `min_samples` buffered; a degenerate sampling rate or an empty
/// search band yields a null result with zero confidence.
pub fn compute_heart_rate(
    samples: &[ColorSample],
    band_bpm: (f64, f64),
    min_samples: usize,
) -> HeartRateResult {
    match spectral_rate(samples, band_bpm, min_samples, 0.5) {
        Some(peak) => HeartRateResult {
            bpm: Some(peak.frequency_hz * 60.0),
            confidence: peak.confidence,
        },
        None => HeartRateResult::default(),
    }
}

/// Respiration estimation: the heart-rate pipeline restricted to a lower
/// band with a wider (~1 s) detrend span.
pub fn compute_respiration(
    samples: &[ColorSample],
    band_bpm: (f64, f64),
    min_samples: usize,
) -> RespirationResult {
    match spectral_rate(samples, band_bpm, min_samples, 1.0) {
        Some(peak) => RespirationResult {
            breaths_per_min: Some(peak.frequency_hz * 60.0),
            confidence: peak.confidence,
        },
        None => RespirationResult::default(),
    }
}

/// Shared spectral pipeline. `detrend_span_sec` scales the moving-average
/// span relative to the estimated sampling rate.
fn spectral_rate(
    samples: &[ColorSample],
    band_bpm: (f64, f64),
    min_samples: usize,
    detrend_span_sec: f64,
) -> Option<dsp::SpectralPeak> {
    if samples.len() < min_samples {
        return None;
    }
    let sample_rate = estimate_sample_rate(samples)?;

    let intensities: Vec<f64> = samples.iter().map(|s| s.intensity).collect();
    let dc = dsp::mean(&intensities);
    let centered: Vec<f64> = intensities.iter().map(|v| v - dc).collect();

    let span = ((sample_rate * detrend_span_sec).round() as usize).max(1);
    let detrended = dsp::moving_average_detrend(&centered, span);

    let (magnitudes, fft_size) = dsp::magnitude_spectrum(&detrended);
    dsp::band_peak(
        &magnitudes,
        fft_size,
        sample_rate,
        band_bpm.0 / 60.0,
        band_bpm.1 / 60.0,
    )
}

/// HRV estimation via adaptive peak detection on the smoothed waveform.
///
/// Fewer than 3 detected peaks yields null metrics with the raw peak count
/// still reported.
pub fn compute_hrv(samples: &[ColorSample], min_samples: usize, k_std: f64) -> HrvResult {
    if samples.len() < min_samples {
        return HrvResult::default();
    }
    let Some(sample_rate) = estimate_sample_rate(samples) else {
        return HrvResult::default();
    };

    let intensities: Vec<f64> = samples.iter().map(|s| s.intensity).collect();
    let span = ((sample_rate * 0.5).round() as usize).max(1);
    let detrended = dsp::moving_average_detrend(&intensities, span);
    let pulse = dsp::moving_average_smooth(&detrended, HRV_SMOOTH_RADIUS);

    let peaks = dsp::detect_peaks(&pulse, k_std);
    if peaks.len() < 3 {
        return HrvResult {
            peak_count: peaks.len(),
            ..HrvResult::default()
        };
    }

    let intervals_ms: Vec<f64> = peaks
        .windows(2)
        .map(|pair| samples[pair[1]].timestamp_ms - samples[pair[0]].timestamp_ms)
        .collect();

    let successive_diffs: Vec<f64> = intervals_ms
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect();
    let rmssd = if successive_diffs.is_empty() {
        0.0
    } else {
        (successive_diffs.iter().map(|d| d * d).sum::<f64>() / successive_diffs.len() as f64)
            .sqrt()
    };

    HrvResult {
        rmssd_ms: Some(rmssd),
        sdnn_ms: Some(dsp::std_dev(&intervals_ms)),
        mean_ibi_ms: Some(dsp::mean(&intervals_ms)),
        peak_count: peaks.len(),
    }
}
