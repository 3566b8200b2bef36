//! In-game calendar: day counter and time-of-day period.

use serde::{Deserialize, Serialize};

use crate::world::TimeOfDay;

/// Clock tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Real seconds per in-game day.
    pub day_duration: f32,
    /// Normalized time the first day starts at.
    pub start_time: f32,
    /// Length of the story in days.
    pub total_days: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            day_duration: 600.0,
            start_time: 0.25,
            total_days: 70,
        }
    }
}

/// Emitted when the clock crosses a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockEvent {
    DayChanged(u32),
    PeriodChanged(TimeOfDay),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    pub config: ClockConfig,
    /// Normalized time of day in [0, 1)
    pub time: f32,
    pub day: u32,
    pub period: TimeOfDay,
    pub time_scale: f32,
}

impl GameClock {
    pub fn new(config: ClockConfig) -> Self {
        let time = config.start_time.rem_euclid(1.0);
        Self {
            config,
            time,
            day: 1,
            period: TimeOfDay::from_normalized(time),
            time_scale: 1.0,
        }
    }

    /// Advance by `delta_seconds` of real time.
    pub fn update(&mut self, delta_seconds: f32) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        if self.config.day_duration <= 0.0 {
            return events;
        }

        self.time += delta_seconds / self.config.day_duration * self.time_scale;
        while self.time >= 1.0 {
            self.time -= 1.0;
            self.day += 1;
            events.push(ClockEvent::DayChanged(self.day));
        }

        let period = TimeOfDay::from_normalized(self.time);
        if period != self.period {
            self.period = period;
            events.push(ClockEvent::PeriodChanged(period));
        }
        events
    }

    /// Sleep until morning. Sleeping from evening or afternoon rolls the day.
    pub fn sleep(&mut self) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        let was_night = self.time > 0.83 || self.time < 0.25;
        self.time = TimeOfDay::Morning.start();
        if !was_night {
            self.day += 1;
            events.push(ClockEvent::DayChanged(self.day));
        }
        if self.period != TimeOfDay::Morning {
            self.period = TimeOfDay::Morning;
            events.push(ClockEvent::PeriodChanged(TimeOfDay::Morning));
        }
        events
    }

    pub fn current_week(&self) -> u32 {
        self.day.div_ceil(7)
    }

    pub fn remaining_days(&self) -> u32 {
        self.config.total_days.saturating_sub(self.day)
    }

    /// "HH:MM"
    pub fn time_string(&self) -> String {
        let total_minutes = (self.time * 24.0 * 60.0) as u32;
        format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_morning_day_one() {
        let clock = GameClock::default();
        assert_eq!(clock.day, 1);
        assert_eq!(clock.period, TimeOfDay::Morning);
        assert_eq!(clock.time_string(), "06:00");
    }

    #[test]
    fn test_day_rollover() {
        let mut clock = GameClock::default();
        // 0.75 of a day brings us to midnight
        let events = clock.update(450.0);
        assert!(events.contains(&ClockEvent::DayChanged(2)));
        assert_eq!(clock.day, 2);
        assert_eq!(clock.period, TimeOfDay::Night);
    }

    #[test]
    fn test_sleep_from_evening_rolls_day() {
        let mut clock = GameClock::default();
        clock.update(300.0); // 0.25 + 0.5 = 0.75, evening
        assert_eq!(clock.period, TimeOfDay::Evening);
        let events = clock.sleep();
        assert_eq!(clock.day, 2);
        assert!(events.contains(&ClockEvent::DayChanged(2)));
        assert_eq!(clock.period, TimeOfDay::Morning);
    }

    #[test]
    fn test_weeks_and_remaining() {
        let mut clock = GameClock::default();
        clock.day = 8;
        assert_eq!(clock.current_week(), 2);
        assert_eq!(clock.remaining_days(), 62);
    }
}
