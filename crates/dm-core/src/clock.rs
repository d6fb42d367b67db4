/// The world's single mutable clock, counted in whole hours.
///
/// Day and weekday are derived: a day is 24 hours, a week is 7 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorldClock {
    hour: i64,
}

impl WorldClock {
    /// Create a clock at the given absolute hour.
    pub fn new(hour: i64) -> Self {
        Self { hour }
    }

    /// Move the clock by `delta` hours (may be negative). Returns the new hour.
    pub fn advance(&mut self, delta: i64) -> i64 {
        self.hour = self.hour.saturating_add(delta);
        self.hour
    }

    /// Absolute hours since the epoch of the world.
    pub fn hour(&self) -> i64 {
        self.hour
    }

    /// Hour within the current day, `0..24`.
    pub fn hour_of_day(&self) -> i64 {
        self.hour.rem_euclid(24)
    }

    /// Whole days elapsed.
    pub fn day(&self) -> i64 {
        self.hour.div_euclid(24)
    }

    /// Day of the week, `0..7`.
    pub fn weekday(&self) -> i64 {
        self.day().rem_euclid(7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_initial_state() {
        let clock = WorldClock::default();
        assert_eq!(clock.hour(), 0);
        assert_eq!(clock.hour_of_day(), 0);
        assert_eq!(clock.day(), 0);
        assert_eq!(clock.weekday(), 0);
    }

    #[test]
    fn clock_hour_of_day_wraps() {
        let mut clock = WorldClock::new(20);
        assert_eq!(clock.advance(5), 25);
        assert_eq!(clock.hour_of_day(), 1);
        assert_eq!(clock.day(), 1);
    }

    #[test]
    fn clock_weekday_wraps_after_a_week() {
        let clock = WorldClock::new(24 * 9 + 3);
        assert_eq!(clock.day(), 9);
        assert_eq!(clock.weekday(), 2);
    }

    #[test]
    fn clock_negative_hours_stay_in_range() {
        let clock = WorldClock::new(-1);
        assert_eq!(clock.hour_of_day(), 23);
        assert_eq!(clock.day(), -1);
        assert_eq!(clock.weekday(), 6);
    }
}
