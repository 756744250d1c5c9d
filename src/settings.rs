use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::ConfigurationError, observer::Observers, operation::Operation, util};

/// Range and enable flag for a single operation. Keeps `1 <= min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationConfig {
    pub enabled: bool,
    pub min: u64,
    pub max: u64,
}

impl OperationConfig {
    pub fn new(enabled: bool, min: u64, max: u64) -> Self {
        let min = min.max(1);
        Self {
            enabled,
            min,
            max: max.max(min),
        }
    }
}

/// Session length in whole minutes, one of 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TimerMinutes(u8);

impl TimerMinutes {
    pub const CHOICES: [u8; 5] = [1, 2, 3, 4, 5];

    pub fn new(minutes: u8) -> Result<Self, ConfigurationError> {
        if Self::CHOICES.contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(ConfigurationError::TimerOutOfRange(minutes))
        }
    }

    pub fn minutes(&self) -> u8 {
        self.0
    }

    pub fn seconds(&self) -> u32 {
        u32::from(self.0) * 60
    }
}

impl Default for TimerMinutes {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for TimerMinutes {
    type Error = ConfigurationError;

    fn try_from(minutes: u8) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<TimerMinutes> for u8 {
    fn from(timer: TimerMinutes) -> Self {
        timer.0
    }
}

/// Which side of an operation's range is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Min,
    Max,
}

/// Game settings: one [`OperationConfig`] per operation plus the timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredSettings")]
pub struct Settings {
    operations: BTreeMap<Operation, OperationConfig>,
    timer_minutes: TimerMinutes,
}

/// Settings as written on disk, before the range invariants are restored
#[derive(Deserialize)]
struct StoredSettings {
    #[serde(default)]
    operations: BTreeMap<Operation, OperationConfig>,
    #[serde(default)]
    timer_minutes: TimerMinutes,
}

impl From<StoredSettings> for Settings {
    fn from(stored: StoredSettings) -> Self {
        Settings {
            operations: stored.operations,
            timer_minutes: stored.timer_minutes,
        }
        .normalized()
    }
}

impl Default for Settings {
    fn default() -> Self {
        let operations = BTreeMap::from([
            (Operation::Addition, OperationConfig::new(true, 2, 100)),
            (Operation::Subtraction, OperationConfig::new(true, 2, 100)),
            (Operation::Multiplication, OperationConfig::new(true, 2, 12)),
            (Operation::Division, OperationConfig::new(true, 2, 12)),
        ]);
        Self {
            operations,
            timer_minutes: TimerMinutes::default(),
        }
    }
}

impl Settings {
    /// Settings with every operation disabled, ranges left at their defaults
    pub fn all_disabled() -> Self {
        let mut settings = Self::default();
        for config in settings.operations.values_mut() {
            config.enabled = false;
        }
        settings
    }

    pub fn with_operation(mut self, operation: Operation, config: OperationConfig) -> Self {
        self.operations.insert(
            operation,
            OperationConfig::new(config.enabled, config.min, config.max),
        );
        self
    }

    pub fn with_timer(mut self, timer: TimerMinutes) -> Self {
        self.timer_minutes = timer;
        self
    }

    pub fn operation(&self, operation: Operation) -> OperationConfig {
        self.operations
            .get(&operation)
            .copied()
            .unwrap_or_else(|| OperationConfig::new(false, 1, 1))
    }

    /// Enabled operations in canonical order
    pub fn enabled_operations(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.operation(*op).enabled)
            .collect()
    }

    pub fn has_enabled_operation(&self) -> bool {
        !self.enabled_operations().is_empty()
    }

    pub fn timer(&self) -> TimerMinutes {
        self.timer_minutes
    }

    /// Restore the range invariants and fill in any operation missing from a
    /// hand-edited settings file.
    pub fn normalized(self) -> Self {
        let defaults = Settings::default();
        let operations = Operation::ALL
            .into_iter()
            .map(|op| {
                let config = self
                    .operations
                    .get(&op)
                    .copied()
                    .unwrap_or_else(|| defaults.operation(op));
                (op, OperationConfig::new(config.enabled, config.min, config.max))
            })
            .collect();
        Self {
            operations,
            timer_minutes: self.timer_minutes,
        }
    }

    fn operation_mut(&mut self, operation: Operation) -> &mut OperationConfig {
        self.operations
            .entry(operation)
            .or_insert_with(|| OperationConfig::new(false, 1, 1))
    }
}

/// Change notifications emitted by [`ConfigCollector`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEvent {
    OperationToggled { operation: Operation, enabled: bool },
    RangeChanged { operation: Operation, min: u64, max: u64 },
    TimerChanged(TimerMinutes),
}

/// Holds the settings being edited on the configuration screen
#[derive(Debug, Default)]
pub struct ConfigCollector {
    settings: Settings,
    observers: Observers<SettingsEvent>,
}

impl ConfigCollector {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: settings.normalized(),
            observers: Observers::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&SettingsEvent) + 'static,
    {
        self.observers.subscribe(callback);
    }

    pub fn toggle_enabled(&mut self, operation: Operation) {
        let config = self.settings.operation_mut(operation);
        config.enabled = !config.enabled;
        let enabled = config.enabled;

        debug!(%operation, enabled, "toggled operation");
        self.observers
            .notify(&SettingsEvent::OperationToggled { operation, enabled });
    }

    /// Set one side of a range from raw text, dragging the other side along
    /// when the bounds would cross.
    pub fn set_range(&mut self, operation: Operation, field: RangeField, raw: &str) {
        let value = util::coerce_range_value(raw);
        let config = self.settings.operation_mut(operation);

        match field {
            RangeField::Min => {
                config.min = value;
                if value > config.max {
                    config.max = value;
                }
            }
            RangeField::Max => {
                config.max = value;
                if value < config.min {
                    config.min = value;
                }
            }
        }

        let (min, max) = (config.min, config.max);
        debug!(%operation, min, max, "range changed");
        self.observers
            .notify(&SettingsEvent::RangeChanged { operation, min, max });
    }

    pub fn set_timer(&mut self, minutes: u8) -> Result<(), ConfigurationError> {
        let timer = TimerMinutes::new(minutes)?;
        self.settings.timer_minutes = timer;
        self.observers.notify(&SettingsEvent::TimerChanged(timer));
        Ok(())
    }

    /// Move the timer one choice up or down, stopping at either end
    pub fn step_timer(&mut self, delta: i8) {
        let current = i16::from(self.settings.timer_minutes.minutes());
        let next = (current + i16::from(delta)).clamp(1, 5) as u8;
        if next != self.settings.timer_minutes.minutes() {
            // next is clamped into the valid choices
            let _ = self.set_timer(next);
        }
    }

    /// Snapshot the settings for a new session
    pub fn validate_and_start(&self) -> Result<Settings, ConfigurationError> {
        if !self.settings.has_enabled_operation() {
            return Err(ConfigurationError::NoOperationEnabled);
        }
        Ok(self.settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.enabled_operations(), Operation::ALL.to_vec());
        assert_eq!(
            settings.operation(Operation::Addition),
            OperationConfig::new(true, 2, 100)
        );
        assert_eq!(
            settings.operation(Operation::Division),
            OperationConfig::new(true, 2, 12)
        );
        assert_eq!(settings.timer().minutes(), 1);
    }

    #[test]
    fn test_operation_config_keeps_invariant() {
        assert_eq!(OperationConfig::new(true, 0, 0), OperationConfig::new(true, 1, 1));
        let config = OperationConfig::new(true, 20, 5);
        assert_eq!((config.min, config.max), (20, 20));
    }

    #[test]
    fn test_timer_choices() {
        for minutes in TimerMinutes::CHOICES {
            assert_eq!(TimerMinutes::new(minutes).unwrap().seconds(), u32::from(minutes) * 60);
        }
        assert_matches!(
            TimerMinutes::new(0),
            Err(ConfigurationError::TimerOutOfRange(0))
        );
        assert_matches!(
            TimerMinutes::new(6),
            Err(ConfigurationError::TimerOutOfRange(6))
        );
    }

    #[test]
    fn test_toggle_only_changes_enabled() {
        let mut collector = ConfigCollector::default();
        let before = collector.settings().operation(Operation::Subtraction);

        collector.toggle_enabled(Operation::Subtraction);

        let after = collector.settings().operation(Operation::Subtraction);
        assert!(!after.enabled);
        assert_eq!((before.min, before.max), (after.min, after.max));

        collector.toggle_enabled(Operation::Subtraction);
        assert!(collector.settings().operation(Operation::Subtraction).enabled);
    }

    #[test]
    fn test_raising_min_above_max_raises_max() {
        let mut collector = ConfigCollector::default();

        collector.set_range(Operation::Multiplication, RangeField::Min, "50");

        let config = collector.settings().operation(Operation::Multiplication);
        assert_eq!((config.min, config.max), (50, 50));
    }

    #[test]
    fn test_lowering_max_below_min_lowers_min() {
        let mut collector = ConfigCollector::default();
        collector.set_range(Operation::Addition, RangeField::Min, "30");

        collector.set_range(Operation::Addition, RangeField::Max, "10");

        let config = collector.settings().operation(Operation::Addition);
        assert_eq!((config.min, config.max), (10, 10));
    }

    #[test]
    fn test_set_range_within_bounds_leaves_other_side() {
        let mut collector = ConfigCollector::default();

        collector.set_range(Operation::Division, RangeField::Max, "9");

        let config = collector.settings().operation(Operation::Division);
        assert_eq!((config.min, config.max), (2, 9));
    }

    #[test]
    fn test_set_range_coerces_bad_input_to_one() {
        let mut collector = ConfigCollector::default();

        collector.set_range(Operation::Addition, RangeField::Min, "abc");
        assert_eq!(collector.settings().operation(Operation::Addition).min, 1);

        collector.set_range(Operation::Addition, RangeField::Max, "-4");
        let config = collector.settings().operation(Operation::Addition);
        assert_eq!((config.min, config.max), (1, 1));
    }

    #[test]
    fn test_invariant_holds_after_every_mutation() {
        let mut collector = ConfigCollector::default();
        let edits = [
            (RangeField::Min, "500"),
            (RangeField::Max, "3"),
            (RangeField::Min, ""),
            (RangeField::Max, "0"),
            (RangeField::Max, "77"),
            (RangeField::Min, "78"),
        ];

        for (field, raw) in edits {
            collector.set_range(Operation::Subtraction, field, raw);
            let config = collector.settings().operation(Operation::Subtraction);
            assert!(config.min >= 1);
            assert!(config.min <= config.max, "{raw:?} broke {config:?}");
        }
    }

    #[test]
    fn test_set_timer() {
        let mut collector = ConfigCollector::default();
        collector.set_timer(4).unwrap();
        assert_eq!(collector.settings().timer().minutes(), 4);

        assert_matches!(
            collector.set_timer(10),
            Err(ConfigurationError::TimerOutOfRange(10))
        );
        assert_eq!(collector.settings().timer().minutes(), 4);
    }

    #[test]
    fn test_step_timer_clamps() {
        let mut collector = ConfigCollector::default();
        collector.step_timer(-1);
        assert_eq!(collector.settings().timer().minutes(), 1);

        for _ in 0..10 {
            collector.step_timer(1);
        }
        assert_eq!(collector.settings().timer().minutes(), 5);
    }

    #[test]
    fn test_validate_and_start_requires_an_operation() {
        let mut collector = ConfigCollector::new(Settings::all_disabled());
        assert_matches!(
            collector.validate_and_start(),
            Err(ConfigurationError::NoOperationEnabled)
        );

        collector.toggle_enabled(Operation::Division);
        let settings = collector.validate_and_start().unwrap();
        assert_eq!(settings.enabled_operations(), vec![Operation::Division]);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_edits() {
        let mut collector = ConfigCollector::default();
        let snapshot = collector.validate_and_start().unwrap();

        collector.toggle_enabled(Operation::Addition);

        assert!(snapshot.operation(Operation::Addition).enabled);
    }

    #[test]
    fn test_observers_receive_each_mutation() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut collector = ConfigCollector::default();
        let sink = Rc::clone(&events);
        collector.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        collector.toggle_enabled(Operation::Addition);
        collector.set_range(Operation::Multiplication, RangeField::Min, "50");
        collector.set_timer(3).unwrap();
        let _ = collector.set_timer(9);

        assert_eq!(
            *events.borrow(),
            vec![
                SettingsEvent::OperationToggled {
                    operation: Operation::Addition,
                    enabled: false
                },
                SettingsEvent::RangeChanged {
                    operation: Operation::Multiplication,
                    min: 50,
                    max: 50
                },
                SettingsEvent::TimerChanged(TimerMinutes::new(3).unwrap()),
            ]
        );
    }

    #[test]
    fn test_deserialize_restores_ranges_and_missing_operations() {
        let json = r#"{"operations":{"addition":{"enabled":true,"min":9,"max":3}},"timer_minutes":2}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        let addition = settings.operation(Operation::Addition);
        assert_eq!((addition.min, addition.max), (9, 9));
        assert_eq!(
            settings.operation(Operation::Division),
            Settings::default().operation(Operation::Division)
        );
        assert_eq!(settings.timer().minutes(), 2);
    }

    #[test]
    fn test_deserialized_crossed_range_is_safe_to_play() {
        let json = r#"{"operations":{"division":{"enabled":true,"min":9,"max":3}}}"#;
        let mut settings: Settings = serde_json::from_str(json).unwrap();
        for op in [Operation::Addition, Operation::Subtraction, Operation::Multiplication] {
            let config = settings.operation(op);
            settings = settings.with_operation(op, OperationConfig { enabled: false, ..config });
        }

        let division = settings.operation(Operation::Division);
        assert_eq!((division.min, division.max), (9, 9));
        let mut draws = crate::problem::RandomDraws::seeded(1);
        let problem = crate::problem::generate(&settings, &mut draws);
        assert_eq!(problem.question_text(), "81 / 9");
    }

    #[test]
    fn test_timer_out_of_range_in_json_is_rejected() {
        let json = r#"{"timer_minutes":7}"#;
        assert!(serde_json::from_str::<Settings>(json).is_err());
    }
}
