//! Per-role expiration policy.
//!
//! Out-of-range lifetimes are clamped to the nearest bound of their unit,
//! never rejected, so any value the user enters yields a usable setting.
//! Changing a role's setting affects the next arming of its timer only.

use std::{fmt, time::Duration};

use crate::Role;

/// Unit of a configured lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationUnit {
    /// Allowed range 30..=300.
    Seconds,
    /// Allowed range 5..=1440.
    Minutes,
    /// Allowed range 1..=24.
    Hours,
}

impl DurationUnit {
    /// All units, smallest first.
    pub const ALL: [DurationUnit; 3] = [Self::Seconds, Self::Minutes, Self::Hours];

    /// Inclusive `(min, max)` accepted for this unit.
    pub const fn bounds(self) -> (u64, u64) {
        match self {
            Self::Seconds => (30, 300),
            Self::Minutes => (5, 1440),
            Self::Hours => (1, 24),
        }
    }

    /// Length of one unit in seconds.
    pub const fn seconds(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3600,
        }
    }

    /// Lowercase plural name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
        }
    }

    /// Parse a unit name or abbreviation (`s`, `sec`, `min`, `h`, ...).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(Self::Seconds),
            "m" | "min" | "mins" | "minute" | "minutes" => Some(Self::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(Self::Hours),
            _ => None,
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A clamped lifetime (`value` of `unit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpirationSetting {
    value: u64,
    unit: DurationUnit,
}

impl ExpirationSetting {
    /// Build a setting, clamping `value` into the unit's bounds.
    ///
    /// Negative input clamps to the minimum like any other low value.
    pub fn new(value: i64, unit: DurationUnit) -> Self {
        let (min, max) = unit.bounds();
        let value = value.clamp(min as i64, max as i64) as u64;
        Self { value, unit }
    }

    /// Clamped value.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Unit of [`Self::value`].
    pub fn unit(&self) -> DurationUnit {
        self.unit
    }

    /// Lifetime as a duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.value * self.unit.seconds())
    }
}

impl Default for ExpirationSetting {
    /// 15 minutes.
    fn default() -> Self {
        Self { value: 15, unit: DurationUnit::Minutes }
    }
}

impl fmt::Display for ExpirationSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Lifetime setting for each role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpirationPolicy {
    settings: [ExpirationSetting; 2],
}

impl ExpirationPolicy {
    /// Policy with explicit settings for A and B.
    pub fn new(a: ExpirationSetting, b: ExpirationSetting) -> Self {
        Self { settings: [a, b] }
    }

    /// Setting for `role`.
    pub fn get(&self, role: Role) -> ExpirationSetting {
        self.settings[role.index()]
    }

    /// Replace the setting for `role`.
    pub fn set(&mut self, role: Role, setting: ExpirationSetting) {
        self.settings[role.index()] = setting;
    }

    /// Lifetime the next arming for `role` will use.
    pub fn lifetime(&self, role: Role) -> Duration {
        self.get(role).duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_minimum_clamps_up() {
        let setting = ExpirationSetting::new(10, DurationUnit::Seconds);
        assert_eq!(setting.value(), 30);
        assert_eq!(setting.duration(), Duration::from_secs(30));
    }

    #[test]
    fn above_maximum_clamps_down() {
        assert_eq!(ExpirationSetting::new(301, DurationUnit::Seconds).value(), 300);
        assert_eq!(ExpirationSetting::new(5000, DurationUnit::Minutes).value(), 1440);
        assert_eq!(ExpirationSetting::new(25, DurationUnit::Hours).value(), 24);
    }

    #[test]
    fn negative_and_zero_clamp_to_minimum() {
        assert_eq!(ExpirationSetting::new(-7, DurationUnit::Hours).value(), 1);
        assert_eq!(ExpirationSetting::new(0, DurationUnit::Minutes).value(), 5);
    }

    #[test]
    fn in_range_values_are_kept() {
        let setting = ExpirationSetting::new(2, DurationUnit::Hours);
        assert_eq!(setting.value(), 2);
        assert_eq!(setting.duration(), Duration::from_secs(7200));
    }

    #[test]
    fn default_is_fifteen_minutes_per_role() {
        let policy = ExpirationPolicy::default();
        for role in Role::ALL {
            assert_eq!(policy.lifetime(role), Duration::from_secs(15 * 60));
        }
    }

    #[test]
    fn setting_one_role_leaves_the_other() {
        let mut policy = ExpirationPolicy::default();
        policy.set(Role::B, ExpirationSetting::new(45, DurationUnit::Seconds));

        assert_eq!(policy.lifetime(Role::B), Duration::from_secs(45));
        assert_eq!(policy.get(Role::A), ExpirationSetting::default());
    }

    #[test]
    fn unit_parsing_accepts_abbreviations() {
        assert_eq!(DurationUnit::parse("s"), Some(DurationUnit::Seconds));
        assert_eq!(DurationUnit::parse("MIN"), Some(DurationUnit::Minutes));
        assert_eq!(DurationUnit::parse(" hours "), Some(DurationUnit::Hours));
        assert_eq!(DurationUnit::parse("days"), None);
    }

    #[test]
    fn display_reads_naturally() {
        assert_eq!(ExpirationSetting::default().to_string(), "15 minutes");
    }
}
