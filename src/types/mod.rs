pub mod quality;

pub use quality::*;

use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static SAMPLE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a process-unique sample id
pub fn next_sample_id() -> String {
    let seq = SAMPLE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("sample_{}_{}", Utc::now().timestamp_millis(), seq)
}

/// Where a sample came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    /// Recorded by the capture pipeline
    #[default]
    Measured,
    /// Synthesized by inverse-distance weighting
    Interpolated,
    /// Replaces a cell's samples after neighborhood blending
    Smoothed,
}

/// Optional network identifiers attached to a sample
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SampleLabels {
    pub ssid: Option<String>,
    pub bssid: Option<String>,
    /// Carrier frequency in GHz (2.4 / 5.0 / 6.0)
    pub frequency: Option<f64>,
}

impl SampleLabels {
    pub fn new(ssid: Option<String>, bssid: Option<String>) -> Self {
        Self {
            ssid,
            bssid,
            frequency: None,
        }
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = Some(frequency);
        self
    }
}

/// One signal observation at a world-space position
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample {
    pub id: String,
    pub position: Vec3,
    /// RSSI in dBm
    pub strength: i32,
    pub labels: SampleLabels,
    pub timestamp: DateTime<Utc>,
    pub kind: SampleKind,
}

impl Sample {
    /// Measured sample stamped with the current time
    pub fn new(position: Vec3, strength: i32) -> Self {
        Self {
            id: next_sample_id(),
            position,
            strength,
            labels: SampleLabels::default(),
            timestamp: Utc::now(),
            kind: SampleKind::Measured,
        }
    }

    pub fn with_labels(mut self, labels: SampleLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Synthetic sample that inherits labels and timestamp from `source`
    pub fn derived(kind: SampleKind, position: Vec3, strength: i32, source: &Sample) -> Self {
        Self {
            id: next_sample_id(),
            position,
            strength,
            labels: source.labels.clone(),
            timestamp: source.timestamp,
            kind,
        }
    }

    pub fn is_measured(&self) -> bool {
        self.kind == SampleKind::Measured
    }

    /// Signal quality from 0.0 (worst) to 1.0 (best)
    pub fn normalized_strength(&self) -> f32 {
        normalize_strength(self.strength)
    }

    pub fn quality(&self) -> SignalQuality {
        SignalQuality::from_strength(self.strength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_ids_are_unique() {
        let a = Sample::new(Vec3::ZERO, -50);
        let b = Sample::new(Vec3::ZERO, -50);
        assert_ne!(a.id, b.id);
        assert!(a.is_measured());
    }

    #[test]
    fn test_derived_keeps_labels_and_timestamp() {
        let source = Sample::new(Vec3::new(1.0, 0.0, 0.0), -60).with_labels(
            SampleLabels::new(Some("office".into()), Some("aa:bb:cc:dd:ee:ff".into()))
                .with_frequency(5.0),
        );
        let derived = Sample::derived(SampleKind::Smoothed, Vec3::ZERO, -55, &source);

        assert_eq!(derived.kind, SampleKind::Smoothed);
        assert_eq!(derived.labels, source.labels);
        assert_eq!(derived.timestamp, source.timestamp);
        assert_eq!(derived.strength, -55);
        assert_ne!(derived.id, source.id);
    }

    #[test]
    fn test_sample_normalized_strength() {
        let sample = Sample::new(Vec3::ZERO, -65);
        assert!((sample.normalized_strength() - 0.5).abs() < 1e-6);
        assert_eq!(sample.quality(), SignalQuality::Fair);
    }
}
