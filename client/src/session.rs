use chrono::{DateTime, Duration, Utc};
use tracing::info;

const ONE_MINUTE_WARNING_SECS: i64 = 60;
const TEN_SECOND_WARNING_SECS: i64 = 10;

/// Countdown anchor: server-supplied creation timestamp plus room timeout.
/// Remaining time is a pure function of `now`, so tests feed fixed instants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionClock {
    created_at: DateTime<Utc>,
    timeout_minutes: i64,
}

impl SessionClock {
    pub fn new(created_at: DateTime<Utc>, timeout_minutes: i64) -> Self {
        Self {
            created_at,
            timeout_minutes,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.created_at + Duration::minutes(self.timeout_minutes)
    }

    /// Time left until expiry, clamped at zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.end_time() - now).max(Duration::zero())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time()
    }

    /// `MM:SS` display string, clamped to `00:00` at or after expiry.
    pub fn format_remaining(&self, now: DateTime<Utc>) -> String {
        let secs = self.remaining(now).num_seconds();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

/// Events published on each observation of the clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Tick { remaining: String },
    OneMinuteWarning,
    TenSecondWarning,
    Expired,
}

/// Stateful wrapper around `SessionClock` holding the one-shot latches for
/// the warnings and the expiry transition.
pub struct Countdown {
    clock: SessionClock,
    warned_one_minute: bool,
    warned_ten_seconds: bool,
    expired: bool,
}

impl Countdown {
    pub fn new(clock: SessionClock) -> Self {
        Self {
            clock,
            warned_one_minute: false,
            warned_ten_seconds: false,
            expired: false,
        }
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Swap in a new clock. A changed creation timestamp re-arms all latches.
    pub fn rearm(&mut self, clock: SessionClock) {
        if clock.created_at() != self.clock.created_at() {
            self.warned_one_minute = false;
            self.warned_ten_seconds = false;
            self.expired = false;
        }
        self.clock = clock;
    }

    /// One tick of the countdown. Returns the events to surface for this
    /// instant; the `Expired` transition fires exactly once, even when the
    /// end time was already in the past on the first observation.
    pub fn observe(&mut self, now: DateTime<Utc>) -> Vec<SessionEvent> {
        if self.expired {
            return Vec::new();
        }

        if self.clock.is_expired(now) {
            self.expired = true;
            info!("Session expired at {}", self.clock.end_time());
            return vec![SessionEvent::Expired];
        }

        let remaining_secs = self.clock.remaining(now).num_seconds();
        let mut events = Vec::new();

        if remaining_secs <= ONE_MINUTE_WARNING_SECS && !self.warned_one_minute {
            self.warned_one_minute = true;
            events.push(SessionEvent::OneMinuteWarning);
        }
        if remaining_secs <= TEN_SECOND_WARNING_SECS && !self.warned_ten_seconds {
            self.warned_ten_seconds = true;
            events.push(SessionEvent::TenSecondWarning);
        }

        events.push(SessionEvent::Tick {
            remaining: self.clock.format_remaining(now),
        });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn remaining_counts_down_and_clamps_at_zero() {
        let clock = SessionClock::new(at(0), 2);

        assert_eq!(clock.remaining(at(0)).num_seconds(), 120);
        assert_eq!(clock.remaining(at(90)).num_seconds(), 30);
        assert_eq!(clock.remaining(at(120)).num_seconds(), 0);
        assert_eq!(clock.remaining(at(500)).num_seconds(), 0);
    }

    #[test]
    fn format_is_mm_ss_clamped_to_zero() {
        let clock = SessionClock::new(at(0), 2);

        assert_eq!(clock.format_remaining(at(0)), "02:00");
        assert_eq!(clock.format_remaining(at(55)), "01:05");
        assert_eq!(clock.format_remaining(at(119)), "00:01");
        assert_eq!(clock.format_remaining(at(300)), "00:00");
    }

    #[test]
    fn already_expired_clock_fires_on_first_observation() {
        // Mounted one minute after the room timed out.
        let clock = SessionClock::new(at(0), 2);
        let mut countdown = Countdown::new(clock);

        assert_eq!(countdown.observe(at(180)), vec![SessionEvent::Expired]);
        assert!(countdown.is_expired());

        // And never again.
        assert!(countdown.observe(at(181)).is_empty());
        assert!(countdown.observe(at(240)).is_empty());
    }

    #[test]
    fn warnings_fire_exactly_once_each() {
        let clock = SessionClock::new(at(0), 2);
        let mut countdown = Countdown::new(clock);

        let events = countdown.observe(at(30));
        assert_eq!(
            events,
            vec![SessionEvent::Tick {
                remaining: "01:30".to_string()
            }]
        );

        let events = countdown.observe(at(61));
        assert!(events.contains(&SessionEvent::OneMinuteWarning));

        // Many ticks inside the warning window: no repeats.
        for s in 62..110 {
            let events = countdown.observe(at(s));
            assert!(!events.contains(&SessionEvent::OneMinuteWarning));
            assert!(!events.contains(&SessionEvent::TenSecondWarning));
        }

        let events = countdown.observe(at(111));
        assert!(events.contains(&SessionEvent::TenSecondWarning));
        let events = countdown.observe(at(112));
        assert!(!events.contains(&SessionEvent::TenSecondWarning));

        assert_eq!(countdown.observe(at(120)), vec![SessionEvent::Expired]);
    }

    #[test]
    fn late_mount_inside_warning_window_fires_both_warnings() {
        let clock = SessionClock::new(at(0), 2);
        let mut countdown = Countdown::new(clock);

        let events = countdown.observe(at(115));
        assert!(events.contains(&SessionEvent::OneMinuteWarning));
        assert!(events.contains(&SessionEvent::TenSecondWarning));
    }

    #[test]
    fn rearm_with_new_created_at_resets_latches() {
        let mut countdown = Countdown::new(SessionClock::new(at(0), 1));
        assert_eq!(countdown.observe(at(60)), vec![SessionEvent::Expired]);

        countdown.rearm(SessionClock::new(at(100), 1));
        assert!(!countdown.is_expired());
        let events = countdown.observe(at(110));
        assert!(events.contains(&SessionEvent::OneMinuteWarning));
    }

    #[test]
    fn rearm_with_same_created_at_keeps_latches() {
        let clock = SessionClock::new(at(0), 2);
        let mut countdown = Countdown::new(clock);
        countdown.observe(at(61));

        countdown.rearm(clock);
        let events = countdown.observe(at(62));
        assert!(!events.contains(&SessionEvent::OneMinuteWarning));
    }
}
