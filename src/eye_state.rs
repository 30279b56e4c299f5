//! Eye state tracker
//!
//! A two-state machine (open / closed) over per-frame eye openness with an
//! adaptive closure threshold derived from an exponential-moving-average
//! openness baseline. Completed closures always feed PERCLOS; only closures
//! inside the configured duration band count as blinks. Yawn probability is
//! a stateless ramp over the current mouth openness.
//!
//! All histories are pruned to the sliding window on every update, keeping
//! memory and per-update cost bounded by the window length.

use crate::config::EyeStateConfig;
use crate::types::EyeStateSnapshot;
use std::collections::VecDeque;

/// A completed closed-eye span in session time.
#[derive(Debug, Clone, Copy)]
struct ClosedSpan {
    start_ms: f64,
    end_ms: f64,
}

/// Stateful blink / PERCLOS / yawn tracker, one per analysis session.
#[derive(Debug)]
pub struct EyeStateTracker {
    config: EyeStateConfig,
    /// EMA openness baseline, seeded from the first observation.
    baseline: Option<f64>,
    /// Whether the eyes are currently classified closed.
    closed: bool,
    /// Start of the ongoing closure, when closed.
    closed_since_ms: Option<f64>,
    /// Timestamps of completed blinks inside the window.
    blink_times_ms: VecDeque<f64>,
    /// Completed closed spans inside the window.
    closed_spans: VecDeque<ClosedSpan>,
}

impl EyeStateTracker {
    pub fn new(config: EyeStateConfig) -> Self {
        Self {
            config,
            baseline: None,
            closed: false,
            closed_since_ms: None,
            blink_times_ms: VecDeque::new(),
            closed_spans: VecDeque::new(),
        }
    }

    /// Advance the tracker by one frame.
    pub fn update(
        &mut self,
        eye_openness: f64,
        mouth_openness: f64,
        now_ms: f64,
    ) -> EyeStateSnapshot {
        let baseline = match self.baseline {
            None => eye_openness,
            Some(prev) => {
                prev * self.config.baseline_decay + eye_openness * (1.0 - self.config.baseline_decay)
            }
        };
        self.baseline = Some(baseline);

        let threshold = (baseline * self.config.threshold_scale)
            .clamp(self.config.threshold_floor, self.config.threshold_ceil);

        let mut blink_detected = false;
        if !self.closed && eye_openness < threshold {
            self.closed = true;
            self.closed_since_ms = Some(now_ms);
        } else if self.closed && eye_openness >= threshold {
            self.closed = false;
            if let Some(start_ms) = self.closed_since_ms.take() {
                let duration_ms = now_ms - start_ms;
                self.closed_spans.push_back(ClosedSpan {
                    start_ms,
                    end_ms: now_ms,
                });
                if duration_ms >= self.config.blink_min_ms
                    && duration_ms <= self.config.blink_max_ms
                {
                    self.blink_times_ms.push_back(now_ms);
                    blink_detected = true;
                    tracing::debug!(duration_ms, "blink detected");
                }
            }
        }

        self.prune(now_ms);

        EyeStateSnapshot {
            eyes_closed: self.closed,
            blink_detected,
            blink_rate_per_min: self.blink_rate(now_ms),
            perclos: self.perclos(now_ms),
            yawn_probability: self.yawn_probability(mouth_openness),
            closure_threshold: threshold,
        }
    }

    /// Fraction of the sliding window spent closed, including the ongoing
    /// closure, each span clipped to the window.
    fn perclos(&self, now_ms: f64) -> f64 {
        let window_start = now_ms - self.config.window_ms;

        let mut closed_ms = 0.0;
        for span in &self.closed_spans {
            let start = span.start_ms.max(window_start);
            let end = span.end_ms.min(now_ms);
            if end > start {
                closed_ms += end - start;
            }
        }
        if let Some(start_ms) = self.closed_since_ms {
            let start = start_ms.max(window_start);
            if now_ms > start {
                closed_ms += now_ms - start;
            }
        }

        (closed_ms / self.config.window_ms).clamp(0.0, 1.0)
    }

    /// Blinks in the window scaled to a per-minute rate.
    fn blink_rate(&self, now_ms: f64) -> f64 {
        let window_start = now_ms - self.config.window_ms;
        let count = self
            .blink_times_ms
            .iter()
            .filter(|&&t| t >= window_start)
            .count();
        count as f64 * 60_000.0 / self.config.window_ms
    }

    /// Linear ramp from 0 at `yawn_onset` to 1 at `yawn_full`; stateless.
    fn yawn_probability(&self, mouth_openness: f64) -> f64 {
        let span = self.config.yawn_full - self.config.yawn_onset;
        ((mouth_openness - self.config.yawn_onset) / span).clamp(0.0, 1.0)
    }

    fn prune(&mut self, now_ms: f64) {
        let window_start = now_ms - self.config.window_ms;
        while let Some(&t) = self.blink_times_ms.front() {
            if t < window_start {
                self.blink_times_ms.pop_front();
            } else {
                break;
            }
        }
        while let Some(span) = self.closed_spans.front() {
            if span.end_ms < window_start {
                self.closed_spans.pop_front();
            } else {
                break;
            }
        }
    }
}
