//! Per-poll session state: interval backoff, call limits, change detection
//!
//! The session is a pure state machine so the scheduling policy can be
//! tested without timers or a network. The poll task feeds it settled
//! request outcomes and acts on the returned [`Cycle`].

use std::time::Duration;

use bytes::Bytes;

use super::config::PollConfig;

/// What the loop should do after a settled cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cycle {
    /// Arm the timer for the next request after this delay.
    Schedule(Duration),
    /// Terminal for this run; wait for an external restart.
    Stop,
}

/// Mutable state of one polling loop.
///
/// Invariants: `interval` stays within `[min_timeout, max_timeout]`;
/// every stop path goes through [`reset`](Self::reset), which restores the
/// interval, counters, and effective bounds to their configured values.
#[derive(Debug)]
pub(crate) struct PollSession {
    min_timeout: Duration,
    max_timeout: Duration,
    multiplier: u32,
    configured_max_calls: u32,
    configured_auto_stop: u32,

    interval: Duration,
    max_calls: u32,
    auto_stop: u32,
    calls: u32,
    no_change: u32,
    previous: Option<Bytes>,
}

impl PollSession {
    pub(crate) fn new(config: &PollConfig) -> Self {
        Self {
            min_timeout: config.min_timeout,
            max_timeout: config.max_timeout,
            multiplier: config.multiplier,
            configured_max_calls: config.max_calls,
            configured_auto_stop: config.auto_stop,
            interval: config.min_timeout,
            max_calls: config.max_calls,
            auto_stop: config.auto_stop,
            calls: 0,
            no_change: 0,
            previous: None,
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Apply a successful response's payload fingerprint.
    ///
    /// The first response is always a baseline: it can never count as
    /// unchanged, so it never grows the interval or the no-change streak.
    pub(crate) fn on_response(&mut self, fingerprint: Bytes) -> Cycle {
        self.calls += 1;
        if self.max_calls > 0 && self.calls >= self.max_calls {
            self.reset(Some(&format!(
                "Max of {} calls reached. Polling stopped.",
                self.max_calls
            )));
            return Cycle::Stop;
        }

        if self.previous.as_ref() == Some(&fingerprint) {
            if self.multiplier > 1 {
                self.interval = self
                    .interval
                    .saturating_mul(self.multiplier)
                    .min(self.max_timeout);
            }
            if self.auto_stop > 0 {
                self.no_change += 1;
                if self.no_change >= self.auto_stop {
                    self.reset(Some(&format!(
                        "Max of {} calls with the same response reached. Polling auto stopped.",
                        self.auto_stop
                    )));
                    return Cycle::Stop;
                }
            }
        } else {
            self.no_change = 0;
        }

        self.previous = Some(fingerprint);
        Cycle::Schedule(self.interval)
    }

    /// Apply a genuine (non-cancellation) failure: reset everything, then
    /// retry at the base interval. Failures never back off and never end
    /// the loop.
    pub(crate) fn on_failure(&mut self) -> Cycle {
        self.reset(None);
        Cycle::Schedule(self.min_timeout)
    }

    /// The universal stop: used for terminal stops, before restarts, and
    /// after failures. Logs `message` when given.
    pub(crate) fn reset(&mut self, message: Option<&str>) {
        if let Some(message) = message {
            tracing::info!("{message}");
        }
        self.previous = None;
        self.interval = self.min_timeout;
        self.max_calls = self.configured_max_calls;
        self.auto_stop = self.configured_auto_stop;
        self.calls = 0;
        self.no_change = 0;
    }
}
