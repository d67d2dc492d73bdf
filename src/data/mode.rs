//! Operating mode and measurement unit.

/// Top-level operating mode of the monitor.
///
/// Exactly one value is in effect process-wide at any instant; transitions
/// happen only through the command-key rules in
/// [`SharedState`](crate::state::SharedState) and the monitor task's breach
/// path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Displaying live readings, no monitoring.
    #[default]
    Idle,
    /// Collecting threshold values from the keypad.
    Input,
    /// Watching readings against the configured thresholds.
    Monitor,
    /// A threshold breach is being signalled until acknowledged.
    Alert,
}

impl Mode {
    /// Check whether the display task owns the display surface in this mode.
    ///
    /// During [`Mode::Alert`] the alert path owns it instead.
    pub fn display_owns_surface(&self) -> bool {
        matches!(self, Self::Idle | Self::Monitor)
    }

    /// Check whether the monitor task is actively sampling.
    pub fn is_monitoring(&self) -> bool {
        matches!(self, Self::Monitor)
    }

    /// Check whether an input session is in progress.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input)
    }

    /// Check whether the alert signalling loop is active.
    pub fn is_alert(&self) -> bool {
        matches!(self, Self::Alert)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Input => write!(f, "Input"),
            Self::Monitor => write!(f, "Monitor"),
            Self::Alert => write!(f, "Alert"),
        }
    }
}

/// The unit temperatures are displayed and compared in.
///
/// Toggled only by an explicit command key, never by the monitor or display
/// tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeasurementUnit {
    /// Degrees Celsius.
    #[default]
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
}

impl MeasurementUnit {
    /// The other unit.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    /// Single-letter label used on the display ("C" or "F").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

impl std::fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Celsius => write!(f, "Celsius"),
            Self::Fahrenheit => write!(f, "Fahrenheit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_mode_is_idle() {
        assert_eq!(Mode::default(), Mode::Idle);
    }

    #[test]
    fn test_display_ownership() {
        assert!(Mode::Idle.display_owns_surface());
        assert!(Mode::Monitor.display_owns_surface());
        assert!(!Mode::Input.display_owns_surface());
        assert!(!Mode::Alert.display_owns_surface());
    }

    #[test]
    fn test_unit_toggle_is_involutive() {
        let unit = MeasurementUnit::Celsius;
        assert_eq!(unit.toggled(), MeasurementUnit::Fahrenheit);
        assert_eq!(unit.toggled().toggled(), unit);
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(MeasurementUnit::Celsius.label(), "C");
        assert_eq!(MeasurementUnit::Fahrenheit.label(), "F");
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(format!("{}", Mode::Alert), "Alert");
        assert_eq!(format!("{}", Mode::Monitor), "Monitor");
    }
}
