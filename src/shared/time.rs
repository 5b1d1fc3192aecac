use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Seconds since service-day noon-minus-12h (the GTFS convention).
///
/// Deliberately not clamped to `0..86_400`: trips that run past midnight are
/// represented with values greater than 86 400, exactly as GTFS stores them
/// (`spec.md` §3, and the overnight scenario in §8 S5).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time(u32);

/// The smallest representable [`Time`] — used as the identity element for
/// "nothing found yet" when searching for a maximum (e.g. the reverse
/// dominance comparisons in [`crate::router`]).
pub const MIN: Time = Time(u32::MIN);

/// The largest representable [`Time`] — used as "unreached" in forward
/// dominance comparisons, matching the role `time::MAX` plays throughout
/// `raptor::Allocator` in the crate this core evolved from.
pub const MAX: Time = Time(u32::MAX);

impl From<u32> for Time {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0.saturating_sub(rhs.0))
    }
}

impl Add<Time> for Time {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign<Time> for Time {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

impl Add<Duration> for Time {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0
    }
}

impl Sub<Duration> for Time {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign<Duration> for Time {
    fn sub_assign(&mut self, rhs: Duration) {
        self.0 = self.0.saturating_sub(rhs.0)
    }
}

impl Time {
    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    /// Shifts this time by one day (86 400 s) — used to apply the overnight
    /// wrap rule of `spec.md` §4.2.
    pub const fn plus_one_day(&self) -> Self {
        Self(self.0 + 86_400)
    }

    pub fn to_hms_string(&self) -> String {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        format!("{:02}:{:02}:{:02}", h, m, s)
    }

    pub fn from_hms(time: &str) -> Option<Self> {
        const HOUR_TO_SEC: u32 = 60 * 60;
        const MINUTE_TO_SEC: u32 = 60;
        let mut split = time.split(':');
        let hours: u32 = split.next()?.parse().ok()?;
        let hours = hours * HOUR_TO_SEC;
        let minutes: u32 = split.next()?.parse().ok()?;
        let minutes = minutes * MINUTE_TO_SEC;
        let seconds: u32 = split.next()?.parse().ok()?;
        let seconds = hours + minutes + seconds;
        Some(Self(seconds))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(u32);

impl From<u32> for Duration {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes * 60)
    }

    pub const fn from_hours(hours: u32) -> Self {
        Self(hours * 60 * 60)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unparse_1() {
        let time = "00:00:00";
        let stime = Time::from_hms(time).unwrap();
        assert_eq!(time, stime.to_hms_string())
    }

    #[test]
    fn parse_unparse_2() {
        let time = "00:00:30";
        let stime = Time::from_hms(time).unwrap();
        assert_eq!(time, stime.to_hms_string())
    }

    #[test]
    fn parse_unparse_3() {
        let time = "00:30:00";
        let stime = Time::from_hms(time).unwrap();
        assert_eq!(time, stime.to_hms_string())
    }

    #[test]
    fn parse_unparse_overnight() {
        // Trips that cross midnight are stored with hours >= 24, per GTFS.
        let time = "25:10:00";
        let stime = Time::from_hms(time).unwrap();
        assert_eq!(stime.as_seconds(), 25 * 3600 + 10 * 60);
    }

    #[test]
    fn valid_time_test_3() {
        let time = "00:01:30";
        assert_eq!(Time::from_hms(time).unwrap().as_seconds(), 90);
    }

    #[test]
    fn valid_time_test_4() {
        let time = "01:01:30";
        assert_eq!(Time::from_hms(time).unwrap().as_seconds(), 3690);
    }

    #[test]
    fn invalid_time_test_1() {
        let time = "00:00:0a";
        assert!(Time::from_hms(time).is_none())
    }

    #[test]
    fn invalid_time_test_2() {
        let time = "00:00";
        assert!(Time::from_hms(time).is_none())
    }

    #[test]
    fn min_max_bound_every_time() {
        let t = Time::from_seconds(12_345);
        assert!(MIN < t);
        assert!(t < MAX);
    }

    #[test]
    fn plus_one_day_adds_86400_seconds() {
        let t = Time::from_seconds(100);
        assert_eq!(t.plus_one_day().as_seconds(), 86_500);
    }
}
