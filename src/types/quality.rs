//! Signal strength scale and quality buckets
//!
//! The engine treats RSSI as an opaque ordered quantity. These helpers only
//! map it onto display-friendly scales.

use serde::Serialize;
use std::fmt::{Display, Formatter};

// ===== Normalization Range (dBm) =====
pub const MIN_RSSI: i32 = -100;
pub const MAX_RSSI: i32 = -30;

/// Linear map of `[MIN_RSSI, MAX_RSSI]` onto `[0, 1]`, clamped
pub fn normalize_strength(strength: i32) -> f32 {
    let normalized = (strength as f32 - MIN_RSSI as f32) / (MAX_RSSI - MIN_RSSI) as f32;
    normalized.clamp(0.0, 1.0)
}

/// Integer percentage (0-100) of the normalization range
pub fn strength_to_percentage(strength: i32) -> u8 {
    let percentage = ((strength as i64 - MIN_RSSI as i64) * 100) / (MAX_RSSI - MIN_RSSI) as i64;
    percentage.clamp(0, 100) as u8
}

/// Coarse quality bucket for a signal reading
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    Excellent,
    Good,
    Fair,
    Weak,
    Poor,
}

impl SignalQuality {
    pub const ALL: [SignalQuality; 5] = [
        SignalQuality::Excellent,
        SignalQuality::Good,
        SignalQuality::Fair,
        SignalQuality::Weak,
        SignalQuality::Poor,
    ];

    pub fn from_strength(strength: i32) -> Self {
        match strength {
            -30..=0 => SignalQuality::Excellent,
            -50..=-31 => SignalQuality::Good,
            -70..=-51 => SignalQuality::Fair,
            -80..=-71 => SignalQuality::Weak,
            _ => SignalQuality::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignalQuality::Excellent => "excellent",
            SignalQuality::Good => "good",
            SignalQuality::Fair => "fair",
            SignalQuality::Weak => "weak",
            SignalQuality::Poor => "poor",
        }
    }
}

impl Display for SignalQuality {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
