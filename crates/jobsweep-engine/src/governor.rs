//! Per-platform pacing and anti-detection escalation.
//!
//! Every outbound platform action is preceded by a randomized delay drawn
//! from a configured window. Detection signals (challenge pages, explicit
//! blocks) escalate the window: each consecutive signal at least doubles
//! the lower bound, capped at a ceiling. Enough consecutive signals and
//! the governor advises a cooldown pause plus a browser identity rotation.
//! Sustained successes decay the escalation back down.

use jobsweep_core::config::DelayConfig;
use jobsweep_platform::RotationHint;
use rand::Rng;
use std::time::{Duration, Instant};

/// Escalation doublings stop here to keep the shift in range.
const MAX_ESCALATION_SHIFT: u32 = 16;

/// Governor tuning parameters.
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    /// Lower bound of the baseline delay window
    pub min_delay: Duration,
    /// Upper bound of the baseline delay window
    pub max_delay: Duration,
    /// Ceiling the escalated lower bound never exceeds
    pub escalation_ceiling: Duration,
    /// Pause advised when the signal threshold is crossed
    pub cooldown: Duration,
    /// Consecutive detection signals before a cooldown is advised
    pub signals_before_cooldown: u32,
    /// Consecutive successes that decay one escalation step
    pub decay_after_successes: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(6),
            escalation_ceiling: Duration::from_secs(120),
            cooldown: Duration::from_secs(300),
            signals_before_cooldown: 3,
            decay_after_successes: 5,
        }
    }
}

impl GovernorConfig {
    /// Build a governor config whose baseline window comes from the
    /// user's delay settings.
    #[must_use]
    pub fn from_delays(delays: &DelayConfig) -> Self {
        Self {
            min_delay: delays.min_delay(),
            max_delay: delays.max_delay().max(delays.min_delay()),
            ..Self::default()
        }
    }
}

/// Mutable pacing state for one platform.
#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    /// When the last action was released, if any
    pub last_action_at: Option<Instant>,
    /// Current consecutive detection signal count
    pub consecutive_signals: u32,
    success_streak: u32,
}

/// What the caller should do after reporting a detection signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernorAdvice {
    /// Keep going; the delay window has been widened
    Continue,
    /// Pause for `pause` and rotate the browser identity before resuming
    Cooldown {
        /// How long to pause before the next action
        pause: Duration,
        /// Rotation hint to forward to the platform adapter
        rotate: RotationHint,
    },
}

/// Per-platform action pacer.
///
/// One governor per platform task; state is never shared across
/// platforms, so a block on one site never slows the others.
#[derive(Debug)]
pub struct AntiDetectionGovernor {
    config: GovernorConfig,
    state: RateLimitState,
}

impl AntiDetectionGovernor {
    /// Create a governor with the given tuning.
    #[must_use]
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            state: RateLimitState::default(),
        }
    }

    /// Current lower bound of the delay window.
    ///
    /// Doubles per consecutive detection signal, capped at the
    /// escalation ceiling.
    #[must_use]
    pub fn delay_floor(&self) -> Duration {
        if self.state.consecutive_signals == 0 {
            return self.config.min_delay;
        }
        // A zero-configured floor would never escalate; give the
        // doubling something to work with.
        let base = self.config.min_delay.max(Duration::from_millis(500));
        let factor = 1u32 << self.state.consecutive_signals.min(MAX_ESCALATION_SHIFT);
        (base * factor).min(self.config.escalation_ceiling)
    }

    /// Draw the delay to wait before the next outbound action.
    ///
    /// Uniform over the current window; the window keeps its configured
    /// width while the floor escalates.
    pub fn next_delay(&mut self) -> Duration {
        let lo = self.delay_floor();
        let width = self.config.max_delay.saturating_sub(self.config.min_delay);
        let hi = lo + width;
        self.state.last_action_at = Some(Instant::now());
        if hi <= lo {
            return lo;
        }
        let nanos = rand::thread_rng().gen_range(lo.as_nanos()..=hi.as_nanos());
        Duration::from_nanos(nanos as u64)
    }

    /// Report a detection signal (challenge page, block response).
    ///
    /// Widens the delay window and, once the configured threshold of
    /// consecutive signals is crossed, advises a cooldown and identity
    /// rotation.
    pub fn record_detection(&mut self) -> GovernorAdvice {
        self.state.consecutive_signals = self.state.consecutive_signals.saturating_add(1);
        self.state.success_streak = 0;
        if self.state.consecutive_signals >= self.config.signals_before_cooldown {
            GovernorAdvice::Cooldown {
                pause: self.config.cooldown,
                rotate: RotationHint {
                    consecutive_signals: self.state.consecutive_signals,
                },
            }
        } else {
            GovernorAdvice::Continue
        }
    }

    /// Report a successful action; sustained successes decay the
    /// escalation one signal at a time.
    pub fn record_success(&mut self) {
        self.state.success_streak = self.state.success_streak.saturating_add(1);
        if self.state.success_streak >= self.config.decay_after_successes.max(1)
            && self.state.consecutive_signals > 0
        {
            self.state.consecutive_signals -= 1;
            self.state.success_streak = 0;
        }
    }

    /// Current pacing state, for logging and tests.
    #[must_use]
    pub fn state(&self) -> &RateLimitState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GovernorConfig {
        GovernorConfig {
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            escalation_ceiling: Duration::from_millis(2_000),
            cooldown: Duration::from_millis(50),
            signals_before_cooldown: 3,
            decay_after_successes: 2,
        }
    }

    #[test]
    fn test_baseline_delay_stays_in_window() {
        let mut governor = AntiDetectionGovernor::new(test_config());
        for _ in 0..50 {
            let d = governor.next_delay();
            assert!(d >= Duration::from_millis(100), "delay {d:?} below floor");
            assert!(d <= Duration::from_millis(300), "delay {d:?} above ceiling");
        }
    }

    #[test]
    fn test_detection_at_least_doubles_floor() {
        let mut governor = AntiDetectionGovernor::new(test_config());
        let baseline = governor.delay_floor();

        assert_eq!(governor.record_detection(), GovernorAdvice::Continue);
        let escalated = governor.delay_floor();
        assert!(escalated >= baseline * 2, "{escalated:?} < 2 x {baseline:?}");

        assert_eq!(governor.record_detection(), GovernorAdvice::Continue);
        assert!(governor.delay_floor() >= escalated * 2);
    }

    #[test]
    fn test_floor_caps_at_escalation_ceiling() {
        let mut governor = AntiDetectionGovernor::new(test_config());
        for _ in 0..20 {
            let _ = governor.record_detection();
        }
        assert_eq!(governor.delay_floor(), Duration::from_millis(2_000));
    }

    #[test]
    fn test_threshold_advises_cooldown_with_rotation() {
        let mut governor = AntiDetectionGovernor::new(test_config());
        let _ = governor.record_detection();
        let _ = governor.record_detection();
        match governor.record_detection() {
            GovernorAdvice::Cooldown { pause, rotate } => {
                assert_eq!(pause, Duration::from_millis(50));
                assert_eq!(rotate.consecutive_signals, 3);
            }
            GovernorAdvice::Continue => panic!("third signal must advise cooldown"),
        }
    }

    #[test]
    fn test_successes_decay_escalation() {
        let mut governor = AntiDetectionGovernor::new(test_config());
        let _ = governor.record_detection();
        let _ = governor.record_detection();
        assert_eq!(governor.state().consecutive_signals, 2);

        governor.record_success();
        governor.record_success();
        assert_eq!(governor.state().consecutive_signals, 1);

        governor.record_success();
        governor.record_success();
        assert_eq!(governor.state().consecutive_signals, 0);
        assert_eq!(governor.delay_floor(), Duration::from_millis(100));
    }

    #[test]
    fn test_detection_resets_success_streak() {
        let mut governor = AntiDetectionGovernor::new(test_config());
        let _ = governor.record_detection();
        governor.record_success();
        let _ = governor.record_detection();
        governor.record_success();
        // streak was broken, no decay yet
        assert_eq!(governor.state().consecutive_signals, 2);
    }
}
