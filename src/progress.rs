use crate::types::ProgressEvent;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Sentinel percent meaning "a non-fatal error occurred, processing
/// continues". It never moves the high-water mark.
pub const PERCENT_ERROR: i32 = -1;

pub const PERCENT_FETCHING_SCRIPT: i32 = 5;
pub const PERCENT_PREPARING_FILES: i32 = 10;
pub const PERCENT_COLLECTING_TASKS: i32 = 20;
pub const PERCENT_DOWNLOADS_STARTED: i32 = 30;
pub const PERCENT_DOWNLOADS_DONE: i32 = 70;
pub const PERCENT_FINALIZING: i32 = 90;
pub const PERCENT_COMPLETE: i32 = 100;

/// Sending half of the progress channel. Enforces the stream contract:
/// non-negative percents are clamped to be non-decreasing, `-1` passes
/// through unchanged.
#[derive(Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    high_water: Arc<AtomicI32>,
}

impl ProgressSender {
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                high_water: Arc::new(AtomicI32::new(0)),
            },
            rx,
        )
    }

    /// Emit a progress event. The receiver may have been dropped (the
    /// caller stopped listening); that is not an error for the pipeline.
    pub fn report(&self, percent: i32, message: impl Into<String>) {
        let percent = if percent < 0 {
            PERCENT_ERROR
        } else {
            self.high_water
                .fetch_max(percent.min(PERCENT_COMPLETE), Ordering::SeqCst)
                .max(percent.min(PERCENT_COMPLETE))
        };
        let _ = self.tx.send(ProgressEvent {
            percent,
            message: message.into(),
        });
    }

    /// Annotate the stream with a non-fatal error.
    pub fn error(&self, message: impl Into<String>) {
        self.report(PERCENT_ERROR, message);
    }

    /// Map download completion onto the 30-70 band.
    pub fn download_percent(completed: usize, total: usize) -> i32 {
        if total == 0 {
            return PERCENT_DOWNLOADS_DONE;
        }
        let span = (PERCENT_DOWNLOADS_DONE - PERCENT_DOWNLOADS_STARTED) as usize;
        PERCENT_DOWNLOADS_STARTED + (completed * span / total) as i32
    }
}
