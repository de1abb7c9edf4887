use crate::cell::HeatmapCell;
use crate::config::HeatmapConfiguration;
use crate::dead_zone::DeadZone;
use crate::error::{HResult, HeatmapError};
use crate::pipeline::HeatmapPipeline;
use crate::snapshot::HeatmapSnapshot;
use crate::stats::{HeatmapStatistics, RecordingWindow};
use crate::storage;
use crate::store::SampleStore;
use crate::types::{Sample, SampleLabels};
use chrono::Utc;
use glam::Vec3;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Recording session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Not recording; the sample log is frozen
    Idle,
    /// Accepting samples
    Recording,
}

/// Owns the sample log, the cell map and the derived outputs
///
/// Samples are accepted only while recording. Stopping runs the
/// post-processing pipeline exactly once over the frozen log.
pub struct HeatmapRecorder {
    config: HeatmapConfiguration,
    state: SessionState,
    store: SampleStore,
    dead_zones: Vec<DeadZone>,
    statistics: Option<HeatmapStatistics>,
    window: RecordingWindow,
    status: String,
}

impl HeatmapRecorder {
    pub fn new(config: HeatmapConfiguration) -> Self {
        HeatmapRecorder {
            store: SampleStore::new(config.grid()),
            config,
            state: SessionState::Idle,
            dead_zones: Vec::new(),
            statistics: None,
            window: RecordingWindow::default(),
            status: "Ready to map".to_string(),
        }
    }

    pub fn config(&self) -> &HeatmapConfiguration {
        &self.config
    }

    /// Takes effect on the next start, import or reprocess
    pub fn set_config(&mut self, config: HeatmapConfiguration) {
        self.config = config;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Idle → Recording, discarding the previous session
    ///
    /// Returns false (and changes nothing) if already recording.
    pub fn start_recording(&mut self) -> bool {
        if self.is_recording() {
            return false;
        }

        self.reset_outputs();
        self.store.reset(self.config.grid());
        self.state = SessionState::Recording;
        self.window = RecordingWindow {
            started_at: Some(Utc::now()),
            stopped_at: None,
        };
        self.status = "Recording...".to_string();

        log::info!(
            "recording started (cell size {} m, interval {} s)",
            self.config.cell_size(),
            self.config.sampling_interval()
        );
        true
    }

    /// Append a sample; silently ignored unless recording
    pub fn record(&mut self, sample: Sample) -> bool {
        if !self.is_recording() {
            log::trace!("sample {} dropped: not recording", sample.id);
            return false;
        }
        self.store.append(sample);
        true
    }

    /// Capture-side entry point: position, strength and optional labels
    pub fn record_at(&mut self, position: Vec3, strength: i32, labels: Option<SampleLabels>) -> bool {
        let sample = Sample::new(position, strength).with_labels(labels.unwrap_or_default());
        self.record(sample)
    }

    /// Recording → Idle and run the pipeline once
    ///
    /// Returns false if no session was active.
    pub fn stop_recording(&mut self) -> bool {
        if !self.is_recording() {
            return false;
        }
        self.state = SessionState::Idle;
        self.window.stopped_at = Some(Utc::now());
        self.process();

        let count = self.store.sample_count();
        self.status = format!(
            "Recorded {} measurement{}",
            count,
            if count == 1 { "" } else { "s" }
        );
        log::info!(
            "recording stopped: {} samples, {} cells, {} dead zones",
            count,
            self.store.cells().len(),
            self.dead_zones.len()
        );
        true
    }

    /// Drop all samples, cells, zones and statistics
    pub fn clear(&mut self) {
        self.state = SessionState::Idle;
        self.store.reset(self.config.grid());
        self.reset_outputs();
        self.status = "Ready to map".to_string();
        log::info!("heatmap cleared");
    }

    /// Rerun the pipeline over the frozen log with the current configuration
    ///
    /// No-op while recording.
    pub fn reprocess(&mut self) -> bool {
        if self.is_recording() {
            return false;
        }
        self.store.rebuild_cells(self.config.grid());
        self.process();
        true
    }

    /// Replace the log with decoded samples and process them
    ///
    /// On a decode error nothing changes.
    pub fn import_json(&mut self, json: &str) -> HResult<usize> {
        let samples = storage::decode_samples(json).map_err(|e| {
            log::warn!("import rejected: {}", e);
            e
        })?;
        Ok(self.import_samples(samples))
    }

    /// Replace the log with `samples` and process them
    ///
    /// An active session is ended without processing the discarded data.
    pub fn import_samples(&mut self, samples: Vec<Sample>) -> usize {
        if self.is_recording() {
            log::info!("import ends the active recording session");
        }
        self.state = SessionState::Idle;
        self.reset_outputs();

        let count = samples.len();
        self.store = SampleStore::from_samples(self.config.grid(), samples);
        self.process();

        self.status = format!("Imported {} measurement{}", count, if count == 1 { "" } else { "s" });
        log::info!("imported {} samples", count);
        count
    }

    pub fn export_json(&self) -> HResult<String> {
        storage::encode_samples(self.store.samples())
    }

    // ----- read-only views -----

    /// Raw sample log in arrival order
    pub fn samples(&self) -> &[Sample] {
        self.store.samples()
    }

    pub fn cells(&self) -> &[HeatmapCell] {
        self.store.cells()
    }

    pub fn dead_zones(&self) -> &[DeadZone] {
        &self.dead_zones
    }

    /// None until the first pipeline run after start/clear
    pub fn statistics(&self) -> Option<&HeatmapStatistics> {
        self.statistics.as_ref()
    }

    pub fn snapshot(&self) -> HeatmapSnapshot {
        HeatmapSnapshot::capture(self)
    }

    // ----- internals -----

    /// Imported logs have no window; statistics fall back to sample timestamps
    fn process(&mut self) {
        let pipeline = HeatmapPipeline::new(self.config.clone());
        let recorded = self.store.take_cells();
        let output = pipeline.run(recorded, self.store.samples(), self.window);

        self.store.replace_cells(output.cells);
        self.dead_zones = output.dead_zones;
        self.statistics = Some(output.statistics);
    }

    fn reset_outputs(&mut self) {
        self.dead_zones.clear();
        self.statistics = None;
        self.window = RecordingWindow::default();
    }
}

impl Default for HeatmapRecorder {
    fn default() -> Self {
        Self::new(HeatmapConfiguration::default())
    }
}

/// Thread-safe handle: one logical owner behind a mutex
///
/// `stop_recording` flips the state and runs the pipeline under a single
/// lock, so a concurrent `record` lands either before the flip or is
/// rejected after it.
#[derive(Clone)]
pub struct SharedRecorder {
    inner: Arc<Mutex<HeatmapRecorder>>,
}

impl SharedRecorder {
    pub fn new(config: HeatmapConfiguration) -> Self {
        SharedRecorder {
            inner: Arc::new(Mutex::new(HeatmapRecorder::new(config))),
        }
    }

    fn lock(&self) -> HResult<MutexGuard<'_, HeatmapRecorder>> {
        self.inner
            .lock()
            .map_err(|_| HeatmapError::Internal("Failed to acquire recorder lock".to_string()))
    }

    pub fn start_recording(&self) -> HResult<bool> {
        Ok(self.lock()?.start_recording())
    }

    pub fn record(&self, sample: Sample) -> HResult<bool> {
        Ok(self.lock()?.record(sample))
    }

    pub fn stop_recording(&self) -> HResult<bool> {
        Ok(self.lock()?.stop_recording())
    }

    pub fn clear(&self) -> HResult<()> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn state(&self) -> HResult<SessionState> {
        Ok(self.lock()?.state())
    }

    pub fn set_config(&self, config: HeatmapConfiguration) -> HResult<()> {
        self.lock()?.set_config(config);
        Ok(())
    }

    pub fn import_json(&self, json: &str) -> HResult<usize> {
        self.lock()?.import_json(json)
    }

    pub fn export_json(&self) -> HResult<String> {
        self.lock()?.export_json()
    }

    pub fn snapshot(&self) -> HResult<HeatmapSnapshot> {
        Ok(self.lock()?.snapshot())
    }

    /// Run `f` against the recorder while holding the lock
    pub fn with<R>(&self, f: impl FnOnce(&mut HeatmapRecorder) -> R) -> HResult<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }
}

impl Default for SharedRecorder {
    fn default() -> Self {
        Self::new(HeatmapConfiguration::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridCoordinate;
    use approx::assert_relative_eq;
    use std::thread;

    fn quiet_config() -> HeatmapConfiguration {
        HeatmapConfiguration::new()
            .with_cell_size(0.3)
            .with_interpolation(false)
            .with_smoothing_factor(0.0)
    }

    #[test]
    fn test_session_state_transitions() {
        let mut recorder = HeatmapRecorder::default();
        assert_eq!(recorder.state(), SessionState::Idle);
        assert_eq!(recorder.status(), "Ready to map");

        assert!(recorder.start_recording());
        assert!(recorder.is_recording());
        // Idempotent
        assert!(!recorder.start_recording());

        assert!(recorder.stop_recording());
        assert_eq!(recorder.state(), SessionState::Idle);
        // Nothing to stop
        assert!(!recorder.stop_recording());
    }

    #[test]
    fn test_record_ignored_when_idle() {
        let mut recorder = HeatmapRecorder::new(quiet_config());
        assert!(!recorder.record_at(Vec3::ZERO, -50, None));
        assert!(recorder.samples().is_empty());
        assert!(recorder.cells().is_empty());

        recorder.start_recording();
        recorder.record_at(Vec3::ZERO, -50, None);
        recorder.stop_recording();

        // Frozen after stop
        assert!(!recorder.record_at(Vec3::ONE, -60, None));
        assert_eq!(recorder.samples().len(), 1);
    }

    #[test]
    fn test_cells_visible_while_recording() {
        let mut recorder = HeatmapRecorder::new(quiet_config());
        recorder.start_recording();
        recorder.record_at(Vec3::ZERO, -40, None);
        assert_eq!(recorder.cells().len(), 1);
        recorder.record_at(Vec3::new(1.0, 0.0, 0.0), -40, None);
        assert_eq!(recorder.cells().len(), 2);
        assert!(recorder.statistics().is_none());
    }

    #[test]
    fn test_empty_session_is_neutral() {
        let mut recorder = HeatmapRecorder::default();
        recorder.start_recording();
        recorder.stop_recording();

        assert!(recorder.cells().is_empty());
        assert!(recorder.dead_zones().is_empty());
        let stats = recorder.statistics().unwrap();
        assert!(stats.is_empty());
        assert_eq!(recorder.status(), "Recorded 0 measurements");
    }

    #[test]
    fn test_colocated_average_scenario() {
        let mut recorder = HeatmapRecorder::new(quiet_config());
        recorder.start_recording();
        recorder.record_at(Vec3::new(0.0, 0.0, 0.0), -40, None);
        recorder.record_at(Vec3::new(0.05, 0.0, 0.0), -60, None);
        recorder.record_at(Vec3::new(0.0, 0.05, 0.0), -90, None);
        recorder.stop_recording();

        assert_eq!(recorder.cells().len(), 1);
        assert_eq!(recorder.cells()[0].coordinate(), GridCoordinate::new(0, 0, 0));
        assert_eq!(recorder.cells()[0].average_strength(), -63);
    }

    #[test]
    fn test_dead_zone_scenario() {
        let config = quiet_config()
            .with_dead_zone_threshold(-75)
            .with_cluster_distance(0.6)
            .with_min_cluster_size(3);
        let mut recorder = HeatmapRecorder::new(config);
        recorder.start_recording();
        for x in [0.0, 0.3, 0.6] {
            recorder.record_at(Vec3::new(x, 0.0, 0.0), -80, None);
        }
        recorder.stop_recording();

        assert_eq!(recorder.dead_zones().len(), 1);
        let zone = &recorder.dead_zones()[0];
        assert_eq!(zone.member_count(), 3);
        assert_relative_eq!(zone.center.x, 0.3, epsilon = 1e-5);
        assert_relative_eq!(zone.radius, 0.520, epsilon = 1e-3);

        let stats = recorder.statistics().unwrap();
        assert_eq!(stats.dead_zone_count, 1);
        assert_eq!(stats.total_samples, 3);
    }

    #[test]
    fn test_pair_of_weak_cells_yields_no_zone() {
        let mut recorder = HeatmapRecorder::new(quiet_config());
        recorder.start_recording();
        recorder.record_at(Vec3::new(0.0, 0.0, 0.0), -85, None);
        recorder.record_at(Vec3::new(0.3, 0.0, 0.0), -85, None);
        recorder.stop_recording();

        assert!(recorder.dead_zones().is_empty());
        assert_eq!(recorder.cells().len(), 2);
    }

    #[test]
    fn test_start_discards_previous_session() {
        let mut recorder = HeatmapRecorder::new(quiet_config());
        recorder.start_recording();
        recorder.record_at(Vec3::ZERO, -50, None);
        recorder.stop_recording();
        assert!(recorder.statistics().is_some());

        recorder.start_recording();
        assert!(recorder.samples().is_empty());
        assert!(recorder.cells().is_empty());
        assert!(recorder.statistics().is_none());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut recorder = HeatmapRecorder::new(quiet_config());
        recorder.start_recording();
        recorder.record_at(Vec3::ZERO, -90, None);
        recorder.clear();

        assert_eq!(recorder.state(), SessionState::Idle);
        assert!(recorder.samples().is_empty());
        assert!(recorder.cells().is_empty());
        assert!(recorder.dead_zones().is_empty());
        assert!(recorder.statistics().is_none());
        assert_eq!(recorder.status(), "Ready to map");
    }

    #[test]
    fn test_export_import_reproduces_outputs() {
        let config = HeatmapConfiguration::new()
            .with_dead_zone_threshold(-75)
            .with_min_cluster_size(3);
        let mut original = HeatmapRecorder::new(config.clone());
        original.start_recording();
        for (i, strength) in [-40, -55, -80, -85, -90, -82, -60].iter().enumerate() {
            let labels = SampleLabels::new(Some("office".into()), Some(format!("ap-{}", i % 2)));
            original.record_at(Vec3::new(i as f32 * 0.3, 0.0, 0.0), *strength, Some(labels));
        }
        original.stop_recording();

        let json = original.export_json().unwrap();
        let mut restored = HeatmapRecorder::new(config);
        assert_eq!(restored.import_json(&json).unwrap(), 7);

        let key = |s: &Sample| (s.position, s.strength, s.labels.clone());
        assert_eq!(
            restored.samples().iter().map(key).collect::<Vec<_>>(),
            original.samples().iter().map(key).collect::<Vec<_>>()
        );

        let cells = |r: &HeatmapRecorder| {
            r.cells()
                .iter()
                .map(|c| (c.coordinate(), c.average_strength()))
                .collect::<Vec<_>>()
        };
        assert_eq!(cells(&restored), cells(&original));
        assert_eq!(restored.dead_zones().len(), original.dead_zones().len());
        for (a, b) in restored.dead_zones().iter().zip(original.dead_zones()) {
            assert_eq!(a.cells, b.cells);
            assert_eq!(a.average_strength, b.average_strength);
        }

        let (a, b) = (restored.statistics().unwrap(), original.statistics().unwrap());
        assert_eq!(a.total_samples, b.total_samples);
        assert_eq!(a.average_strength, b.average_strength);
        assert_eq!(a.min_strength, b.min_strength);
        assert_eq!(a.max_strength, b.max_strength);
        assert_relative_eq!(a.coverage_area, b.coverage_area);
    }

    #[test]
    fn test_failed_import_leaves_state_untouched() {
        let mut recorder = HeatmapRecorder::new(quiet_config());
        recorder.start_recording();
        recorder.record_at(Vec3::ZERO, -50, None);
        recorder.stop_recording();

        let result = recorder.import_json("[{\"id\": 1}]");
        assert!(matches!(result, Err(HeatmapError::DataFormat(_))));
        assert_eq!(recorder.samples().len(), 1);
        assert_eq!(recorder.cells().len(), 1);
        assert!(recorder.statistics().is_some());
    }

    #[test]
    fn test_import_empty_dataset() {
        let mut recorder = HeatmapRecorder::default();
        assert_eq!(recorder.import_json("[]").unwrap(), 0);
        assert!(recorder.cells().is_empty());
        assert!(recorder.statistics().unwrap().is_empty());
    }

    #[test]
    fn test_import_extreme_strengths() {
        let json = r#"[
            {"id": "hi", "position": [0.0, 0.0, 0.0], "signalStrength": 2147483647, "timestamp": "2025-11-19T12:00:00Z"},
            {"id": "lo", "position": [0.3, 0.0, 0.0], "signalStrength": -2147483648, "timestamp": "2025-11-19T12:00:01Z"}
        ]"#;
        let mut recorder = HeatmapRecorder::default();
        assert_eq!(recorder.import_json(json).unwrap(), 2);

        assert!(!recorder.cells().is_empty());
        for cell in recorder.cells() {
            let normalized = cell.average_normalized_strength();
            assert!((0.0..=1.0).contains(&normalized), "{} out of range", normalized);
        }
        let stats = recorder.statistics().unwrap();
        assert_eq!(stats.max_strength, i32::MAX);
        assert_eq!(stats.min_strength, i32::MIN);

        let snapshot = recorder.snapshot();
        assert!(snapshot.cells.iter().all(|c| c.percentage <= 100));
    }

    #[test]
    fn test_import_far_positions() {
        let json = r#"[
            {"id": "a", "position": [1e12, 0.0, 0.0], "signalStrength": -60, "timestamp": "2025-11-19T12:00:00Z"},
            {"id": "b", "position": [1e12, 0.1, 0.0], "signalStrength": -70, "timestamp": "2025-11-19T12:00:01Z"}
        ]"#;
        let mut recorder = HeatmapRecorder::default();
        assert_eq!(recorder.import_json(json).unwrap(), 2);

        assert_eq!(recorder.cells().len(), 1);
        assert_eq!(recorder.cells()[0].coordinate().x, i32::MAX);
        assert_eq!(recorder.cells()[0].average_strength(), -65);
        assert_eq!(recorder.statistics().unwrap().total_samples, 2);
    }

    #[test]
    fn test_import_ends_active_session() {
        let mut recorder = HeatmapRecorder::new(quiet_config());
        recorder.start_recording();
        recorder.record_at(Vec3::ZERO, -50, None);

        let json = storage::encode_samples(&[Sample::new(Vec3::ONE, -70)]).unwrap();
        recorder.import_json(&json).unwrap();

        assert_eq!(recorder.state(), SessionState::Idle);
        assert_eq!(recorder.samples().len(), 1);
        assert_eq!(recorder.samples()[0].strength, -70);
    }

    #[test]
    fn test_reprocess_applies_new_config() {
        let mut recorder = HeatmapRecorder::new(quiet_config());
        recorder.start_recording();
        for x in [0.0, 0.3, 0.6] {
            recorder.record_at(Vec3::new(x, 0.0, 0.0), -80, None);
        }
        recorder.stop_recording();
        assert_eq!(recorder.dead_zones().len(), 1);

        recorder.set_config(quiet_config().with_dead_zone_threshold(-85));
        assert!(recorder.reprocess());
        assert!(recorder.dead_zones().is_empty());
        assert_eq!(recorder.statistics().unwrap().total_samples, 3);
    }

    #[test]
    fn test_reprocess_rejected_while_recording() {
        let mut recorder = HeatmapRecorder::default();
        recorder.start_recording();
        assert!(!recorder.reprocess());
    }

    #[test]
    fn test_disabled_interpolation_keeps_recorded_cells() {
        let mut recorder = HeatmapRecorder::new(quiet_config());
        recorder.start_recording();
        recorder.record_at(Vec3::ZERO, -40, None);
        recorder.record_at(Vec3::new(0.9, 0.0, 0.0), -60, None);
        recorder.stop_recording();

        let coords: Vec<_> = recorder.cells().iter().map(|c| c.coordinate()).collect();
        assert_eq!(coords, vec![GridCoordinate::new(0, 0, 0), GridCoordinate::new(3, 0, 0)]);
    }

    #[test]
    fn test_shared_recorder_rejects_after_stop() {
        let shared = SharedRecorder::new(quiet_config());
        shared.start_recording().unwrap();

        let producer = {
            let shared = shared.clone();
            thread::spawn(move || {
                let mut accepted = 0;
                for i in 0..200 {
                    if shared.record(Sample::new(Vec3::new(i as f32 * 0.01, 0.0, 0.0), -60)).unwrap() {
                        accepted += 1;
                    }
                }
                accepted
            })
        };

        let accepted = producer.join().unwrap();
        shared.stop_recording().unwrap();
        assert!(!shared.record(Sample::new(Vec3::ZERO, -60)).unwrap());

        let snapshot = shared.snapshot().unwrap();
        assert_eq!(snapshot.sample_count, accepted);
        assert_eq!(shared.state().unwrap(), SessionState::Idle);
    }

    #[test]
    fn test_shared_with_closure() {
        let shared = SharedRecorder::default();
        shared.start_recording().unwrap();
        let recorded = shared
            .with(|r| r.record_at(Vec3::ZERO, -55, None))
            .unwrap();
        assert!(recorded);
        assert_eq!(shared.with(|r| r.samples().len()).unwrap(), 1);
    }
}
