//! Session lifecycle phases

use core::fmt;

/// Lifecycle phase of a programming session
///
/// Variants are ordered along the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Phase {
    /// Device ID not read yet
    #[default]
    Unidentified,
    /// Device ID matched
    Identified,
    /// Offline configuration mode entered, SRAM cleared
    ConfigEnabled,
    /// Configuration flash erase in progress or done
    Erasing,
    /// Pages are being or have been programmed
    Programming,
    /// Pages are being or have been read back
    Verifying,
    /// Configuration mode left, device refreshed
    Disabled,
}

impl Phase {
    /// Whether the device is in configuration mode
    pub const fn is_config_mode(&self) -> bool {
        matches!(
            self,
            Self::ConfigEnabled | Self::Erasing | Self::Programming | Self::Verifying
        )
    }

    /// Whether a configuration-mode operation running in `target` may start
    ///
    /// The session never moves back: after programming, the flash can only
    /// be erased again after a new `enable`.
    pub fn can_enter(&self, target: Phase) -> bool {
        target.is_config_mode() && self.is_config_mode() && *self <= target
    }

    /// Whether `identify` may be issued
    pub const fn can_identify(&self) -> bool {
        matches!(self, Self::Unidentified | Self::Identified | Self::Disabled)
    }

    /// Whether `enable` may be issued
    pub const fn can_enable(&self) -> bool {
        matches!(self, Self::Identified | Self::Disabled)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Unidentified => write!(f, "unidentified"),
            Phase::Identified => write!(f, "identified"),
            Phase::ConfigEnabled => write!(f, "in configuration mode"),
            Phase::Erasing => write!(f, "erasing"),
            Phase::Programming => write!(f, "programming"),
            Phase::Verifying => write!(f, "verifying"),
            Phase::Disabled => write!(f, "disabled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_phases_move_forward() {
        assert!(Phase::ConfigEnabled.can_enter(Phase::Erasing));
        assert!(Phase::Erasing.can_enter(Phase::Erasing));
        assert!(Phase::Erasing.can_enter(Phase::Programming));
        assert!(Phase::Programming.can_enter(Phase::Verifying));
        assert!(Phase::Verifying.can_enter(Phase::Verifying));

        assert!(!Phase::Programming.can_enter(Phase::Erasing));
        assert!(!Phase::Verifying.can_enter(Phase::Programming));
        assert!(!Phase::Identified.can_enter(Phase::Erasing));
        assert!(!Phase::Disabled.can_enter(Phase::Verifying));
    }
}
