//! Game time: whole days and hours, seasons, and the tick clock.
//!
//! Time only moves when a caller asks it to. `TimeClock::advance` returns a
//! [`Tick`] describing the step so the engine can fan it out to settlements
//! in a fixed order.

use serde::{Deserialize, Serialize};

pub const HOURS_PER_DAY: u32 = 24;

/// A point in game time. Days start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameTime {
    pub day: u32,
    pub hour: u32,
}

impl Default for GameTime {
    fn default() -> Self {
        Self::START
    }
}

impl GameTime {
    pub const START: Self = Self { day: 1, hour: 0 };

    /// Normalises an out-of-range hour into following days.
    pub fn new(day: u32, hour: u32) -> Self {
        Self {
            day: day + hour / HOURS_PER_DAY,
            hour: hour % HOURS_PER_DAY,
        }
    }

    pub fn total_hours(&self) -> i64 {
        self.day as i64 * HOURS_PER_DAY as i64 + self.hour as i64
    }

    /// Adds hours, carrying into days.
    pub fn plus_hours(&self, hours: u32) -> Self {
        let hour = self.hour + hours;
        Self {
            day: self.day + hour / HOURS_PER_DAY,
            hour: hour % HOURS_PER_DAY,
        }
    }

    /// Signed hours from `earlier` to `self`.
    pub fn hours_since(&self, earlier: GameTime) -> i64 {
        self.total_hours() - earlier.total_hours()
    }

    /// Fraction of the day elapsed, in [0, 1).
    pub fn day_fraction(&self) -> f64 {
        self.hour as f64 / HOURS_PER_DAY as f64
    }

    pub fn season(&self, days_per_year: u32) -> Season {
        Season::for_day(self.day, days_per_year)
    }
}

impl std::fmt::Display for GameTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "day {} {:02}:00", self.day, self.hour)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring = 0,
    Summer = 1,
    Autumn = 2,
    Winter = 3,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    /// Years split into four equal seasons, day 1 is the first day of spring.
    pub fn for_day(day: u32, days_per_year: u32) -> Season {
        let days_per_year = days_per_year.max(4);
        let day_of_year = day.saturating_sub(1) % days_per_year;
        Self::ALL[(day_of_year * 4 / days_per_year) as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One time advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub previous: GameTime,
    pub now: GameTime,
}

impl Tick {
    /// Number of midnights crossed by this tick.
    pub fn days_elapsed(&self) -> u32 {
        self.now.day.saturating_sub(self.previous.day)
    }

    pub fn hours(&self) -> i64 {
        self.now.hours_since(self.previous)
    }

    /// Each day that started during this tick, in order.
    pub fn new_days(&self) -> impl Iterator<Item = GameTime> {
        (self.previous.day + 1..=self.now.day).map(|day| GameTime { day, hour: 0 })
    }
}

/// Process-wide clock. Advanced only by explicit calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeClock {
    now: GameTime,
}

impl TimeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: GameTime) -> Self {
        Self { now }
    }

    pub fn now(&self) -> GameTime {
        self.now
    }

    /// Moves time forward. Zero or negative hours are ignored.
    pub fn advance(&mut self, hours: i64) -> Option<Tick> {
        if hours <= 0 {
            return None;
        }
        let hours = u32::try_from(hours).unwrap_or(u32::MAX - HOURS_PER_DAY);
        let previous = self.now;
        self.now = previous.plus_hours(hours);
        Some(Tick {
            previous,
            now: self.now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_hours_carries() {
        let t = GameTime::new(1, 20).plus_hours(10);
        assert_eq!(t, GameTime { day: 2, hour: 6 });
        assert_eq!(GameTime::new(3, 0).plus_hours(48), GameTime { day: 5, hour: 0 });
    }

    #[test]
    fn test_hours_since() {
        let a = GameTime::new(1, 22);
        let b = GameTime::new(2, 3);
        assert_eq!(b.hours_since(a), 5);
        assert_eq!(a.hours_since(b), -5);
    }

    #[test]
    fn test_new_normalises_hour() {
        assert_eq!(GameTime::new(1, 30), GameTime { day: 2, hour: 6 });
    }

    #[test]
    fn test_seasons_split_year() {
        assert_eq!(Season::for_day(1, 120), Season::Spring);
        assert_eq!(Season::for_day(30, 120), Season::Spring);
        assert_eq!(Season::for_day(31, 120), Season::Summer);
        assert_eq!(Season::for_day(91, 120), Season::Winter);
        assert_eq!(Season::for_day(121, 120), Season::Spring);
    }

    #[test]
    fn test_clock_advance() {
        let mut clock = TimeClock::new();
        assert!(clock.advance(0).is_none());
        assert!(clock.advance(-3).is_none());

        let tick = clock.advance(30).unwrap();
        assert_eq!(tick.previous, GameTime::START);
        assert_eq!(tick.now, GameTime { day: 2, hour: 6 });
        assert_eq!(tick.days_elapsed(), 1);
        assert_eq!(tick.hours(), 30);
        assert_eq!(tick.new_days().count(), 1);
    }

    #[test]
    fn test_multi_day_skip() {
        let mut clock = TimeClock::new();
        let tick = clock.advance(24 * 3 + 5).unwrap();
        assert_eq!(tick.days_elapsed(), 3);
        let days: Vec<u32> = tick.new_days().map(|t| t.day).collect();
        assert_eq!(days, vec![2, 3, 4]);
    }
}
