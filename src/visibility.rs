//! Page visibility monitor
//!
//! Collapses the host's visibility notifications into real transitions. A host
//! without visibility reporting is treated as permanently visible.

use crate::types::Visibility;

/// Tracks page visibility and filters duplicate notifications
#[derive(Debug, Clone)]
pub struct VisibilityMonitor {
    current: Visibility,
    supported: bool,
}

impl Default for VisibilityMonitor {
    fn default() -> Self {
        Self::new(Some(Visibility::Visible))
    }
}

impl VisibilityMonitor {
    /// Create a monitor from the host's initial report.
    ///
    /// `None` means the host cannot report visibility at all; the monitor then
    /// stays `Visible` and ignores every later notification.
    pub fn new(initial: Option<Visibility>) -> Self {
        match initial {
            Some(visibility) => Self {
                current: visibility,
                supported: true,
            },
            None => Self {
                current: Visibility::Visible,
                supported: false,
            },
        }
    }

    pub fn current(&self) -> Visibility {
        self.current
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Apply a host notification.
    ///
    /// Returns the new state only when it differs from the previous one.
    pub fn set_visible(&mut self, visible: bool) -> Option<Visibility> {
        if !self.supported {
            return None;
        }

        let next = Visibility::from_visible(visible);
        if next == self.current {
            return None;
        }

        self.current = next;
        Some(next)
    }
}
