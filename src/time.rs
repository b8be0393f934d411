//! Time algebra for the simulation kernel.
//!
//! `SimTime` is a logical timestamp (and, when returned from a time-advance
//! function, a duration). It wraps an `f64` but is totally ordered and never
//! NaN. The distinguished [`SimTime::INFINITY`] value means "no scheduled
//! event": a passive model returns it from `ta`, and a coordinator with no
//! pending work reports it as its next event time.
//!
//! Nothing here reads a wall clock. Time advances only when the coordinator
//! picks the next event.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// A point on (or a distance along) the simulated time line.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimTime(f64);

impl SimTime {
    /// The origin of simulated time.
    pub const ZERO: SimTime = SimTime(0.0);

    /// The "never" sentinel: no event is scheduled.
    pub const INFINITY: SimTime = SimTime(f64::INFINITY);

    /// Creates a time value.
    ///
    /// NaN has no place on a totally ordered time line; it is mapped to
    /// `INFINITY` in release builds and trips an assertion in debug builds.
    /// Use [`SimTime::try_new`] when the input is untrusted.
    #[inline]
    pub fn new(value: f64) -> Self {
        debug_assert!(!value.is_nan(), "SimTime cannot be NaN");
        Self::try_new(value).unwrap_or(Self::INFINITY)
    }

    /// Creates a time value, rejecting NaN and negative infinity.
    pub fn try_new(value: f64) -> Option<Self> {
        if value.is_nan() || value == f64::NEG_INFINITY {
            None
        } else if value == 0.0 {
            // fold -0.0 into 0.0 so equality agrees with ordering
            Some(Self::ZERO)
        } else {
            Some(SimTime(value))
        }
    }

    /// Returns the raw value.
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Returns true for the "never" sentinel.
    #[inline]
    pub fn is_infinite(self) -> bool {
        self.0 == f64::INFINITY
    }

    /// Returns true for any scheduled (non-sentinel) time.
    #[inline]
    pub fn is_finite(self) -> bool {
        !self.is_infinite()
    }

    /// Returns true if this value is below zero.
    ///
    /// A time advance must never be negative.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add for SimTime {
    type Output = SimTime;

    /// Saturates at `INFINITY`: anything plus "never" is "never".
    fn add(self, rhs: SimTime) -> SimTime {
        if self.is_infinite() || rhs.is_infinite() {
            SimTime::INFINITY
        } else {
            SimTime::new(self.0 + rhs.0)
        }
    }
}

impl Sub for SimTime {
    type Output = SimTime;

    /// Elapsed time between two instants.
    ///
    /// Saturates at `INFINITY` whenever either side is infinite, since a
    /// time never holds a negative infinity. Callers measuring elapsed time
    /// pass a finite `rhs` no later than `self`.
    fn sub(self, rhs: SimTime) -> SimTime {
        if self.is_infinite() || rhs.is_infinite() {
            SimTime::INFINITY
        } else {
            SimTime::new(self.0 - rhs.0)
        }
    }
}

impl From<f64> for SimTime {
    fn from(value: f64) -> Self {
        SimTime::new(value)
    }
}

impl From<u32> for SimTime {
    fn from(value: u32) -> Self {
        SimTime(f64::from(value))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Serialize for SimTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // JSON has no infinity literal
        if self.is_infinite() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimeRepr {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for SimTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match TimeRepr::deserialize(deserializer)? {
            TimeRepr::Number(v) => v,
            TimeRepr::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "inf" | "infinity" | "+inf" | ".inf" => f64::INFINITY,
                other => other.parse::<f64>().map_err(serde::de::Error::custom)?,
            },
        };
        SimTime::try_new(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid simulation time: {}", value)))
    }
}
