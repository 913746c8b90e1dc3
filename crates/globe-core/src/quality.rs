//! Frame timing and adaptive frame skipping.

use crate::constants::{FPS_HISTORY_LEN, LOW_FPS_THRESHOLD, MIN_FPS_SAMPLES};
use instant::Instant;
use std::collections::VecDeque;

/// Measures the time between successive frame callbacks.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call; 0 on the first call after creation or `reset`.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = self
            .last
            .filter(|prev| now > *prev)
            .map(|prev| (now - prev).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt
    }

    /// Forget the previous timestamp so a pause is not measured as one long frame.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameDecision {
    Render,
    Skip,
}

/// Rolling-FPS frame skipper for constrained devices.
///
/// Once at least `MIN_FPS_SAMPLES` samples are buffered and their mean drops
/// below 25 FPS, every other frame is skipped. The mean is re-evaluated each
/// frame with no cooldown, so the skipper can toggle on consecutive frames.
#[derive(Debug)]
pub struct FrameGovernor {
    history: VecDeque<f32>,
    skip_counter: u32,
    enabled: bool,
}

impl FrameGovernor {
    pub fn new(enabled: bool) -> Self {
        Self {
            history: VecDeque::with_capacity(FPS_HISTORY_LEN),
            skip_counter: 0,
            enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            log::info!("[quality] adaptive frame skipping {}", if enabled { "on" } else { "off" });
            self.enabled = enabled;
            self.skip_counter = 0;
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn sample_count(&self) -> usize {
        self.history.len()
    }

    pub fn average_fps(&self) -> Option<f32> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.history.iter().sum::<f32>() / self.history.len() as f32)
    }

    /// Record the frame that took `dt` seconds and decide whether to draw it.
    pub fn observe(&mut self, dt: f32) -> FrameDecision {
        if !self.enabled {
            return FrameDecision::Render;
        }
        let fps = 1.0 / dt;
        if fps.is_finite() {
            if self.history.len() == FPS_HISTORY_LEN {
                self.history.pop_front();
            }
            self.history.push_back(fps);
        }
        if self.history.len() < MIN_FPS_SAMPLES {
            return FrameDecision::Render;
        }
        let avg = self.average_fps().unwrap_or(f32::INFINITY);
        if avg < LOW_FPS_THRESHOLD {
            if self.skip_counter == 0 {
                log::debug!("[quality] rolling fps {:.1} below threshold, throttling", avg);
            }
            self.skip_counter += 1;
            if self.skip_counter % 2 == 0 {
                return FrameDecision::Skip;
            }
        } else {
            if self.skip_counter > 0 {
                log::debug!("[quality] rolling fps {:.1} recovered", avg);
            }
            self.skip_counter = 0;
        }
        FrameDecision::Render
    }
}
