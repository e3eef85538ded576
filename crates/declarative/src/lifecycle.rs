//! Lifecycle classification
//!
//! A one-shot decision table from the `absent`, `disable` and `disableboot`
//! flags to one of four mutually exclusive states. Each state maps to the
//! ensure/enable values of the package, service and file declarations.

use crate::resolver::ResolvedConfig;
use crate::types::{Ensure, TriState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Desired lifecycle of the managed service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Package present, service running and enabled at boot
    Installed,
    /// Package and config removed, service stopped and disabled
    Absent,
    /// Package and config present, service stopped and disabled
    Disabled,
    /// Package and config present, run state untouched, not enabled at boot
    DisabledAtBoot,
}

impl LifecycleState {
    /// Classify the lifecycle flags
    ///
    /// `absent` wins over `disable`, which wins over `disableboot`. Unset
    /// flags count as false.
    pub fn derive(absent: TriState, disable: TriState, disableboot: TriState) -> Self {
        if absent.is_true() {
            Self::Absent
        } else if disable.is_true() {
            Self::Disabled
        } else if disableboot.is_true() {
            Self::DisabledAtBoot
        } else {
            Self::Installed
        }
    }

    /// Classify a resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::derive(config.absent, config.disable, config.disableboot)
    }

    /// Package ensure; non-absent states install the configured version
    pub fn package_ensure(self, version: &str) -> Ensure {
        match self {
            Self::Absent => Ensure::Absent,
            _ => Ensure::from_version(version),
        }
    }

    /// Service ensure; `None` leaves the run state unmanaged
    pub fn service_ensure(self) -> Option<Ensure> {
        match self {
            Self::Installed => Some(Ensure::Running),
            Self::Absent | Self::Disabled => Some(Ensure::Stopped),
            Self::DisabledAtBoot => None,
        }
    }

    /// Whether the service starts at boot
    pub fn service_enable(self) -> bool {
        matches!(self, Self::Installed)
    }

    pub fn file_ensure(self) -> Ensure {
        match self {
            Self::Absent => Ensure::Absent,
            _ => Ensure::Present,
        }
    }

    pub fn dir_ensure(self) -> Ensure {
        match self {
            Self::Absent => Ensure::Absent,
            _ => Ensure::Directory,
        }
    }

    /// Monitoring follows the running service
    pub fn monitor_enabled(self) -> bool {
        matches!(self, Self::Installed)
    }

    /// Firewall rules survive a boot-only disable
    pub fn firewall_enabled(self) -> bool {
        matches!(self, Self::Installed | Self::DisabledAtBoot)
    }

    pub fn integration_ensure(self) -> Ensure {
        match self {
            Self::Absent => Ensure::Absent,
            _ => Ensure::Present,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::Absent => "absent",
            Self::Disabled => "disabled",
            Self::DisabledAtBoot => "disabled_at_boot",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
