use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ops::Add;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::util::local_time;


const NANOS_PER_SEC: u64 = 1_000_000_000;


/// A point in time, in nanoseconds since the UNIX epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(u64);

impl Time {
    /// The earliest representable point in time.
    pub const THE_BEGINNING: Time = Time(0);
    /// The latest representable point in time.
    pub const THE_END: Time = Time(u64::MAX);

    /// Create a `Time` from nanoseconds since the UNIX epoch.
    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Retrieve the number of nanoseconds since the UNIX epoch.
    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Retrieve the current wall clock time.
    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(nanos)
    }

    /// Offset the time by `nanos`, returning `None` on wraparound.
    #[inline]
    pub fn checked_add(self, nanos: i64) -> Option<Self> {
        self.0.checked_add_signed(nanos).map(Self)
    }
}

impl From<u64> for Time {
    #[inline]
    fn from(nanos: u64) -> Self {
        Self(nanos)
    }
}

impl From<Time> for u64 {
    #[inline]
    fn from(time: Time) -> Self {
        time.0
    }
}

impl Add<i64> for Time {
    type Output = Time;

    fn add(self, nanos: i64) -> Self::Output {
        self.checked_add(nanos)
            .unwrap_or_else(|| panic!("time {} + {nanos} wraps around", self.0))
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match local_time(self.0 / NANOS_PER_SEC) {
            Some(tm) => write!(
                f,
                "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
                i64::from(tm.tm_year) + 1900,
                tm.tm_mon + 1,
                tm.tm_mday,
                tm.tm_hour,
                tm.tm_min,
                tm.tm_sec
            ),
            None => write!(f, "{}ns", self.0),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;
    use test_tag::tag;


    /// Check that the special points in time are ordered sensibly.
    #[tag(miri)]
    #[test]
    fn ordering() {
        assert!(Time::THE_BEGINNING < Time::from_nanos(1));
        assert!(Time::from_nanos(1) < Time::THE_END);
        assert_eq!(Time::default(), Time::THE_BEGINNING);
        assert_eq!(u64::from(Time::from(42)), 42);
    }

    /// Check that the current time lies after the epoch.
    #[test]
    fn now() {
        let now = Time::now();
        assert!(now > Time::THE_BEGINNING);
        assert!(now < Time::THE_END);
    }

    /// Check signed offset arithmetic on points in time.
    #[tag(miri)]
    #[test]
    fn arithmetic() {
        let time = Time::from_nanos(100);
        assert_eq!(time + 50, Time::from_nanos(150));
        assert_eq!(time + -50, Time::from_nanos(50));
        assert_eq!(Time::THE_END.checked_add(1), None);
        assert_eq!(Time::THE_BEGINNING.checked_add(-1), None);
    }

    /// Make sure that wrapping around panics.
    #[test]
    #[should_panic = "wraps around"]
    fn overflow_panics() {
        let _time = Time::THE_END + 1;
    }

    /// Check that points in time are formatted as calendar time.
    #[test]
    fn display() {
        let time = Time::from_nanos(1_000_000_000 * NANOS_PER_SEC);
        let s = time.to_string();
        assert!(s.starts_with("2001/09/"), "{s}");
        assert_eq!(s.len(), "YYYY/MM/DD HH:MM:SS".len(), "{s}");
    }
}
