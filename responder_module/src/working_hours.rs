use chrono::{DateTime, Local, Timelike};

/// Local-time working-hours window.
///
/// The window covers `[start_hour:00, end_hour:00]` at minute precision:
/// minute 0 of the end hour still counts as inside, the first minute after
/// it is outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl WorkingHours {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// True when `now` falls outside the window. No timezone conversion;
    /// `now` is whatever the host clock reports.
    pub fn is_outside(&self, now: DateTime<Local>) -> bool {
        let hour = now.hour();
        let minute = now.minute();
        hour < self.start_hour || hour > self.end_hour || (hour == self.end_hour && minute > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 12, hour, minute, 0).unwrap()
    }

    #[test]
    fn boundaries_of_nine_to_eighteen_window() {
        let hours = WorkingHours::new(9, 18);
        assert!(hours.is_outside(at(8, 59)));
        assert!(!hours.is_outside(at(9, 0)));
        assert!(!hours.is_outside(at(17, 59)));
        assert!(!hours.is_outside(at(18, 0)));
        assert!(hours.is_outside(at(18, 1)));
    }

    #[test]
    fn late_evening_and_early_morning_are_outside() {
        let hours = WorkingHours::new(9, 18);
        assert!(hours.is_outside(at(20, 0)));
        assert!(hours.is_outside(at(0, 30)));
        assert!(hours.is_outside(at(23, 59)));
    }

    #[test]
    fn midday_is_inside() {
        let hours = WorkingHours::new(9, 18);
        assert!(!hours.is_outside(at(12, 0)));
    }
}
