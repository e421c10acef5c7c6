//! Event types for HORAY

use crate::scene::OrganId;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum HorayEvent {
    /// An organ was seen by the culler for the first time (or again after expiring).
    OrganEntered {
        organ: OrganId,
    },
    /// An organ was not seen for longer than the expiration window.
    OrganExpired {
        organ: OrganId,
        last_seen: Duration,
    },
    /// Post-processing workers missed their deadline; their partitions kept the input data.
    PostProcessTimeout {
        effect: &'static str,
        unfinished: usize,
        waited: Duration,
    },
}

impl HorayEvent {
    pub fn organ(&self) -> Option<OrganId> {
        match self {
            Self::OrganEntered { organ } | Self::OrganExpired { organ, .. } => Some(*organ),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::PostProcessTimeout { .. })
    }

    pub fn is_culling_event(&self) -> bool {
        matches!(self, Self::OrganEntered { .. } | Self::OrganExpired { .. })
    }
}

/// Per-stage timing of one rendered frame, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTimingEvent {
    pub frame_index: u64,
    /// Scanning-plane layout
    pub plane_time_us: u64,
    pub cull_time_us: u64,
    pub shade_time_us: u64,
    pub decode_time_us: u64,
    pub post_time_us: u64,
    pub total_time_us: u64,
    /// Organs handed to the shader
    pub candidates: usize,
    /// Points that echoed
    pub echoes: usize,
}

impl FrameTimingEvent {
    /// Time spent producing the scan frame (layout, culling and shading).
    pub fn scan_time_us(&self) -> u64 {
        self.plane_time_us + self.cull_time_us + self.shade_time_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classification() {
        let entered = HorayEvent::OrganEntered { organ: OrganId(2) };
        assert_eq!(entered.organ(), Some(OrganId(2)));
        assert!(entered.is_culling_event());
        assert!(!entered.is_error());

        let timeout = HorayEvent::PostProcessTimeout {
            effect: "gaussian_blur",
            unfinished: 1,
            waited: Duration::from_millis(500),
        };
        assert!(timeout.is_error());
        assert_eq!(timeout.organ(), None);
    }
}
