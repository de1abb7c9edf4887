//! Capture feed
//!
//! Producers (position/signal sources, UI commands) push `CaptureEvent`s
//! onto a bounded crossbeam channel. A single worker thread applies them to
//! the shared recorder in arrival order, so samples and start/stop commands
//! are serialized onto one owner.

use crate::error::{HResult, HeatmapError};
use crate::session::SharedRecorder;
use crate::types::Sample;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone)]
pub enum CaptureEvent {
    Sample(Sample),
    Start,
    Stop,
    Clear,
}

/// Worker totals returned when the feed shuts down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedReport {
    /// Samples the recorder appended
    pub accepted: u64,
    /// Samples that arrived while the recorder was idle
    pub rejected: u64,
}

/// Cloneable producer handle
///
/// The worker exits once every clone has been dropped.
#[derive(Clone)]
pub struct CaptureFeed {
    tx: Sender<CaptureEvent>,
}

impl CaptureFeed {
    /// Blocking send; waits while the channel is full
    pub fn send(&self, event: CaptureEvent) -> HResult<()> {
        self.tx
            .send(event)
            .map_err(|_| HeatmapError::Internal("Capture feed worker has stopped".to_string()))
    }

    /// Non-blocking sample push
    ///
    /// Returns false when the channel is full and the sample was dropped.
    pub fn try_sample(&self, sample: Sample) -> HResult<bool> {
        match self.tx.try_send(CaptureEvent::Sample(sample)) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Disconnected(_)) => Err(HeatmapError::Internal(
                "Capture feed worker has stopped".to_string(),
            )),
        }
    }

    pub fn sample(&self, sample: Sample) -> HResult<()> {
        self.send(CaptureEvent::Sample(sample))
    }

    pub fn start(&self) -> HResult<()> {
        self.send(CaptureEvent::Start)
    }

    pub fn stop(&self) -> HResult<()> {
        self.send(CaptureEvent::Stop)
    }

    pub fn clear(&self) -> HResult<()> {
        self.send(CaptureEvent::Clear)
    }
}

/// Spawn the worker that drains the feed into `recorder`
pub fn spawn_feed(recorder: SharedRecorder, capacity: usize) -> (CaptureFeed, JoinHandle<FeedReport>) {
    let (tx, rx) = channel::bounded(capacity.max(1));
    let handle = thread::spawn(move || run_feed(recorder, rx));
    (CaptureFeed { tx }, handle)
}

fn run_feed(recorder: SharedRecorder, rx: Receiver<CaptureEvent>) -> FeedReport {
    let mut report = FeedReport::default();

    for event in rx.iter() {
        let result = match event {
            CaptureEvent::Sample(sample) => recorder.record(sample).map(|appended| {
                if appended {
                    report.accepted += 1;
                } else {
                    report.rejected += 1;
                }
            }),
            CaptureEvent::Start => recorder.start_recording().map(|_| ()),
            CaptureEvent::Stop => recorder.stop_recording().map(|_| ()),
            CaptureEvent::Clear => recorder.clear(),
        };

        if let Err(e) = result {
            log::warn!("capture feed stopping: {}", e);
            break;
        }
    }

    log::debug!(
        "capture feed drained: {} accepted, {} rejected",
        report.accepted,
        report.rejected
    );
    report
}
