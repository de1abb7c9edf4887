//! Sample persistence
//!
//! Samples serialize to an ordered JSON array of records:
//!
//! ```json
//! [{ "id": "...", "position": [x, y, z], "signalStrength": -62,
//!    "ssid": "office", "bssid": "aa:bb:...", "timestamp": "2025-01-01T12:00:00Z",
//!    "frequency": 5.0 }]
//! ```
//!
//! Optional fields are omitted when absent. Paths ending in `.gz` are
//! gzip-compressed.

use crate::error::{HResult, HeatmapError};
use crate::types::{Sample, SampleKind, SampleLabels};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// On-the-wire sample record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub id: String,
    pub position: [f32; 3],
    pub signal_strength: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
}

impl From<&Sample> for SampleRecord {
    fn from(sample: &Sample) -> Self {
        SampleRecord {
            id: sample.id.clone(),
            position: sample.position.to_array(),
            signal_strength: sample.strength,
            ssid: sample.labels.ssid.clone(),
            bssid: sample.labels.bssid.clone(),
            timestamp: sample.timestamp,
            frequency: sample.labels.frequency,
        }
    }
}

impl TryFrom<SampleRecord> for Sample {
    type Error = HeatmapError;

    fn try_from(record: SampleRecord) -> HResult<Self> {
        if record.position.iter().any(|v| !v.is_finite()) {
            return Err(HeatmapError::DataFormat(format!(
                "sample {} has a non-finite position",
                record.id
            )));
        }
        if let Some(freq) = record.frequency {
            if !freq.is_finite() {
                return Err(HeatmapError::DataFormat(format!(
                    "sample {} has a non-finite frequency",
                    record.id
                )));
            }
        }

        Ok(Sample {
            id: record.id,
            position: Vec3::from_array(record.position),
            strength: record.signal_strength,
            labels: SampleLabels {
                ssid: record.ssid,
                bssid: record.bssid,
                frequency: record.frequency,
            },
            timestamp: record.timestamp,
            kind: SampleKind::Measured,
        })
    }
}

/// Encode samples as a pretty-printed JSON array, order preserved
pub fn encode_samples(samples: &[Sample]) -> HResult<String> {
    let records: Vec<SampleRecord> = samples.iter().map(SampleRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Decode a JSON array of records
///
/// All-or-nothing: any malformed record fails the whole batch. An empty
/// array decodes to an empty Vec.
pub fn decode_samples(json: &str) -> HResult<Vec<Sample>> {
    let records: Vec<SampleRecord> = serde_json::from_str(json)?;
    records_to_samples(records)
}

pub fn decode_samples_from_reader<R: Read>(reader: R) -> HResult<Vec<Sample>> {
    let records: Vec<SampleRecord> = serde_json::from_reader(reader)?;
    records_to_samples(records)
}

fn records_to_samples(records: Vec<SampleRecord>) -> HResult<Vec<Sample>> {
    records.into_iter().map(Sample::try_from).collect()
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map(|e| e == "gz").unwrap_or(false)
}

/// Load samples from `.json` or `.json.gz`
pub fn load_samples(path: &Path) -> HResult<Vec<Sample>> {
    let file = File::open(path)?;
    if is_gzip(path) {
        decode_samples_from_reader(BufReader::new(GzDecoder::new(file)))
    } else {
        decode_samples_from_reader(BufReader::new(file))
    }
}

/// Save samples to `.json` or `.json.gz`
pub fn save_samples(path: &Path, samples: &[Sample]) -> HResult<()> {
    let records: Vec<SampleRecord> = samples.iter().map(SampleRecord::from).collect();
    let file = File::create(path)?;

    if is_gzip(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, &records)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.flush()?;
    }
    Ok(())
}
