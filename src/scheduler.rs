//! Auto-refresh scheduling.
//!
//! A [`RefreshScheduler`] is a two-state machine (idle or running) driven
//! by the UI loop's clock. It never performs a fetch itself: [`tick`]
//! reports when one is due and the caller dispatches it. Turning the
//! scheduler off stops future cycles only; a fetch already dispatched
//! still completes and is applied.
//!
//! [`tick`]: RefreshScheduler::tick

use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Interval bounds for one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Smallest interval accepted, in seconds.
    pub min_secs: u64,
    /// Largest interval accepted, in seconds.
    pub max_secs: u64,
    /// Interval used when nothing valid is stored.
    pub default_secs: u64,
}

/// Longest interval either view accepts: one day.
pub const MAX_REFRESH_SECS: u64 = 24 * 60 * 60;

/// Host table: refresh at most every 5s, every 10s by default.
pub const HOSTS_REFRESH: RefreshPolicy = RefreshPolicy {
    min_secs: 5,
    max_secs: MAX_REFRESH_SECS,
    default_secs: 10,
};

/// History view: refresh at most every 10s, every 60s by default.
pub const HISTORY_REFRESH: RefreshPolicy = RefreshPolicy {
    min_secs: 10,
    max_secs: MAX_REFRESH_SECS,
    default_secs: 60,
};

impl RefreshPolicy {
    /// Bring `secs` into `min_secs..=max_secs`.
    pub fn clamp(&self, secs: u64) -> u64 {
        secs.clamp(self.min_secs, self.max_secs)
    }

    /// Interpret what the user typed. Non-numeric input falls to the
    /// minimum; a number too large for `u64` is capped at the maximum.
    pub fn parse_input(&self, input: &str) -> u64 {
        let input = input.trim();
        match input.parse::<u64>() {
            Ok(secs) => self.clamp(secs),
            Err(_) if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) => {
                self.max_secs
            }
            Err(_) => self.min_secs,
        }
    }

    /// Whether a stored value is acceptable as-is.
    pub fn is_valid(&self, secs: u64) -> bool {
        (self.min_secs..=self.max_secs).contains(&secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running { next_due: Instant },
}

/// Repeating refresh timer for one view.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    name: &'static str,
    policy: RefreshPolicy,
    interval_secs: u64,
    state: State,
}

impl RefreshScheduler {
    /// Create an idle scheduler. `interval_secs` is clamped to the policy.
    pub fn new(name: &'static str, policy: RefreshPolicy, interval_secs: u64) -> Self {
        Self {
            name,
            policy,
            interval_secs: policy.clamp(interval_secs),
            state: State::Idle,
        }
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Start refreshing. If idle, the first cycle is due at `now`.
    pub fn enable(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }
        info!(
            "{} auto-refresh started ({}s interval)",
            self.name, self.interval_secs
        );
        self.state = State::Running { next_due: now };
    }

    /// Stop scheduling cycles. In-flight fetches are not affected.
    pub fn disable(&mut self) {
        if self.is_running() {
            info!("{} auto-refresh stopped", self.name);
        }
        self.state = State::Idle;
    }

    /// Change the interval, clamped to the policy bounds.
    ///
    /// A running scheduler restarts (the next cycle is due at `now`); an
    /// idle one just keeps the value for the next [`enable`](Self::enable).
    /// Returns the effective interval.
    pub fn set_interval(&mut self, secs: u64, now: Instant) -> u64 {
        self.interval_secs = self.policy.clamp(secs);
        info!("{} refresh interval set to {}s", self.name, self.interval_secs);
        if self.is_running() {
            self.disable();
            self.enable(now);
        }
        self.interval_secs
    }

    /// Returns `true` when a cycle is due, and schedules the next one.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state {
            State::Running { next_due } if now >= next_due => {
                match now.checked_add(self.interval()) {
                    Some(next_due) => self.state = State::Running { next_due },
                    None => {
                        warn!(
                            "{} next refresh is past the clock's range, stopping",
                            self.name
                        );
                        self.state = State::Idle;
                    }
                }
                true
            }
            _ => false,
        }
    }

    /// Time until the next cycle, if running.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        match self.state {
            State::Running { next_due } => Some(next_due.saturating_duration_since(now)),
            State::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_raises_to_minimum() {
        assert_eq!(HOSTS_REFRESH.clamp(2), 5);
        assert_eq!(HOSTS_REFRESH.clamp(30), 30);
        assert_eq!(HISTORY_REFRESH.clamp(5), 10);
    }

    #[test]
    fn test_clamp_lowers_to_maximum() {
        assert_eq!(HOSTS_REFRESH.clamp(u64::MAX), MAX_REFRESH_SECS);
        assert_eq!(HISTORY_REFRESH.clamp(MAX_REFRESH_SECS + 1), MAX_REFRESH_SECS);
        assert!(HOSTS_REFRESH.is_valid(MAX_REFRESH_SECS));
        assert!(!HOSTS_REFRESH.is_valid(MAX_REFRESH_SECS + 1));
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(HOSTS_REFRESH.parse_input("2"), 5);
        assert_eq!(HOSTS_REFRESH.parse_input(" 15 "), 15);
        assert_eq!(HOSTS_REFRESH.parse_input("fast"), 5);
        assert_eq!(HISTORY_REFRESH.parse_input(""), 10);
        assert_eq!(HOSTS_REFRESH.parse_input("9999999999999999999"), MAX_REFRESH_SECS);
        assert_eq!(HOSTS_REFRESH.parse_input("99999999999999999999999"), MAX_REFRESH_SECS);
        assert_eq!(HOSTS_REFRESH.parse_input("-3"), 5);
    }

    #[test]
    fn test_huge_interval_ticks_without_overflow() {
        let start = Instant::now();
        let mut s = RefreshScheduler::new("hosts", HOSTS_REFRESH, 10);
        let secs = HOSTS_REFRESH.parse_input("9999999999999999999");
        assert_eq!(s.set_interval(secs, start), MAX_REFRESH_SECS);

        s.enable(start);
        assert!(s.tick(start));
        assert!(s.is_running());
        assert_eq!(
            s.time_until_next(start),
            Some(Duration::from_secs(MAX_REFRESH_SECS))
        );

        let s = RefreshScheduler::new("history", HISTORY_REFRESH, u64::MAX);
        assert_eq!(s.interval_secs(), MAX_REFRESH_SECS);
    }

    #[test]
    fn test_enable_fires_immediately_then_waits() {
        let start = Instant::now();
        let mut s = RefreshScheduler::new("hosts", HOSTS_REFRESH, 10);
        assert!(!s.tick(start));

        s.enable(start);
        assert!(s.is_running());
        assert!(s.tick(start));
        assert!(!s.tick(start + Duration::from_secs(9)));
        assert!(s.tick(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_enable_twice_does_not_reset() {
        let start = Instant::now();
        let mut s = RefreshScheduler::new("hosts", HOSTS_REFRESH, 10);
        s.enable(start);
        assert!(s.tick(start));
        s.enable(start + Duration::from_secs(1));
        assert!(!s.tick(start + Duration::from_secs(1)));
    }

    #[test]
    fn test_disable_stops_cycles() {
        let start = Instant::now();
        let mut s = RefreshScheduler::new("history", HISTORY_REFRESH, 60);
        s.enable(start);
        s.disable();
        assert!(!s.is_running());
        assert!(!s.tick(start + Duration::from_secs(3600)));
        assert!(s.time_until_next(start).is_none());
    }

    #[test]
    fn test_set_interval_while_running_restarts() {
        let start = Instant::now();
        let mut s = RefreshScheduler::new("hosts", HOSTS_REFRESH, 10);
        s.enable(start);
        assert!(s.tick(start));

        let later = start + Duration::from_secs(3);
        assert_eq!(s.set_interval(2, later), 5);
        assert!(s.tick(later));
        assert!(!s.tick(later + Duration::from_secs(4)));
        assert!(s.tick(later + Duration::from_secs(5)));
    }

    #[test]
    fn test_set_interval_while_idle_is_stored() {
        let start = Instant::now();
        let mut s = RefreshScheduler::new("history", HISTORY_REFRESH, 60);
        assert_eq!(s.set_interval(30, start), 30);
        assert!(!s.is_running());
        assert!(!s.tick(start));

        s.enable(start);
        assert!(s.tick(start));
        assert_eq!(s.time_until_next(start), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_new_clamps_stored_interval() {
        let s = RefreshScheduler::new("history", HISTORY_REFRESH, 1);
        assert_eq!(s.interval_secs(), 10);
    }
}
