//! Delay policies and the per-invocation delay schedule.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long the engine pauses after a failing attempt.
///
/// The delay is slept after **every** failing attempt, including the one that
/// exhausts the attempt budget. Successful attempts never sleep.
///
/// # Serialization
///
/// `Delay` is an internally tagged enum with durations in whole
/// milliseconds. Delays with a sub-millisecond part fail to serialize rather
/// than being truncated:
///
/// ```toml
/// kind = "exponential"
/// initial_delay_ms = 100
/// coefficient = 2.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Delay {
    /// Retry immediately.
    #[default]
    None,

    /// Sleep the same duration after each failure.
    Fixed {
        /// Pause after each failing attempt
        #[serde(rename = "delay_ms", with = "duration_ms")]
        delay: Duration,
    },

    /// Sleep `initial_delay` after the first failure, then multiply by
    /// `coefficient` (rounded to whole nanoseconds) after every further one.
    Exponential {
        /// Pause after the first failing attempt
        #[serde(rename = "initial_delay_ms", with = "duration_ms")]
        initial_delay: Duration,
        /// Growth factor; values below 1.0 shrink the delay
        coefficient: f64,
    },
}

impl Delay {
    /// Fixed delay between attempts.
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed { delay }
    }

    /// Exponential backoff starting at `initial_delay`.
    ///
    /// The coefficient is not validated or clamped.
    pub fn exponential(initial_delay: Duration, coefficient: f64) -> Self {
        Self::Exponential {
            initial_delay,
            coefficient,
        }
    }

    /// Start a fresh schedule for one retry invocation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use retrier::Delay;
    /// use std::time::Duration;
    ///
    /// let delays: Vec<_> = Delay::exponential(Duration::from_millis(100), 2.0)
    ///     .schedule()
    ///     .take(3)
    ///     .collect();
    ///
    /// assert_eq!(
    ///     delays,
    ///     vec![
    ///         Duration::from_millis(100),
    ///         Duration::from_millis(200),
    ///         Duration::from_millis(400),
    ///     ]
    /// );
    /// ```
    pub fn schedule(&self) -> DelaySchedule {
        let current = match *self {
            Self::None => Duration::ZERO,
            Self::Fixed { delay } => delay,
            Self::Exponential { initial_delay, .. } => initial_delay,
        };
        DelaySchedule {
            policy: *self,
            current,
        }
    }
}

/// The delays of one retry invocation, in the order they are slept.
///
/// Yields nothing for [`Delay::None`] and never ends otherwise.
#[derive(Debug, Clone)]
pub struct DelaySchedule {
    policy: Delay,
    current: Duration,
}

impl DelaySchedule {
    /// The delay the next failing attempt would sleep, without advancing.
    pub fn peek(&self) -> Option<Duration> {
        match self.policy {
            Delay::None => None,
            _ => Some(self.current),
        }
    }
}

impl Iterator for DelaySchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.peek()?;
        if let Delay::Exponential { coefficient, .. } = self.policy {
            self.current = scale(self.current, coefficient);
        }
        Some(delay)
    }
}

/// `round(delay × coefficient)` at nanosecond granularity.
///
/// Out-of-range products saturate; NaN and negative products become zero.
fn scale(delay: Duration, coefficient: f64) -> Duration {
    let nanos = (delay.as_nanos() as f64 * coefficient).round();
    Duration::from_nanos(nanos as u64)
}

/// Serde adapter storing a `Duration` as whole milliseconds.
///
/// Durations that are not an exact number of milliseconds, or that do not
/// fit in a `u64` of milliseconds, are rejected.
mod duration_ms {
    use serde::ser::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if duration.subsec_nanos() % 1_000_000 != 0 {
            return Err(S::Error::custom(format!(
                "delay {duration:?} is not a whole number of milliseconds"
            )));
        }
        let millis = u64::try_from(duration.as_millis())
            .map_err(|_| S::Error::custom(format!("delay {duration:?} is too large")))?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
