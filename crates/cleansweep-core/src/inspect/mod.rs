/// Lock inspection — who is holding the selection open?
///
/// Builds a bounded sample of the selected paths (see [`sample`]) and asks
/// the lock-detection collaborator about them on a background thread.
///
/// # Cancellation
///
/// Latest-wins: starting a new inspection cancels any outstanding one,
/// because stale lock data is actively misleading. A superseded inspection
/// produces no output and no error — its channel simply closes.
pub mod sample;

use crate::cancel::CancelToken;
use crate::engine::{LockDetector, ResourceLockInfo};
use crate::model::SelectedItem;
use crossbeam_channel::{bounded, Receiver};
use parking_lot::Mutex;
use sample::{build_sample, LockSample};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// Messages sent from the inspection thread to the consumer.
#[derive(Debug)]
pub enum InspectionMessage {
    /// Inspection finished; locks may be empty.
    Completed {
        sample: LockSample,
        locks: Vec<ResourceLockInfo>,
        /// Coverage summary, e.g. "sampled 96 of 1000 items, ~84% of size".
        status: String,
    },
    /// The detector itself failed. Local tier: shown as a status, never
    /// propagated further.
    Failed { message: String },
}

/// Handle to one inspection request.
///
/// Dropping the handle does not cancel the request; starting a newer
/// inspection (or calling [`InspectionHandle::cancel`]) does.
pub struct InspectionHandle {
    /// Receives at most one message; disconnects silently when superseded.
    pub receiver: Receiver<InspectionMessage>,
    token: CancelToken,
}

impl InspectionHandle {
    /// Cancel this inspection explicitly.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Runs sampled lock inspections with latest-wins supersession.
pub struct LockInspector {
    detector: Arc<dyn LockDetector>,
    current: Mutex<Option<CancelToken>>,
}

impl LockInspector {
    pub fn new(detector: Arc<dyn LockDetector>) -> Self {
        Self {
            detector,
            current: Mutex::new(None),
        }
    }

    /// Start inspecting `selection` on a background thread.
    ///
    /// Any outstanding inspection is cancelled first and will emit nothing.
    pub fn begin(&self, selection: Vec<SelectedItem>) -> InspectionHandle {
        let token = CancelToken::new();
        {
            let mut current = self.current.lock();
            if let Some(prev) = current.replace(token.clone()) {
                prev.cancel();
            }
        }

        let (tx, rx) = bounded::<InspectionMessage>(1);
        let detector = Arc::clone(&self.detector);
        let thread_token = token.clone();

        thread::Builder::new()
            .name("cleansweep-inspect".into())
            .spawn(move || {
                let sample = build_sample(&selection);
                debug!(
                    "inspecting {} sampled paths ({} selected)",
                    sample.sampled_items, sample.total_items
                );
                if thread_token.is_cancelled() {
                    return;
                }

                match detector.inspect(&sample.paths, &thread_token) {
                    _ if thread_token.is_cancelled() => {
                        // Superseded mid-flight: discard whatever came back.
                        debug!("inspection superseded — discarding result");
                    }
                    Ok(locks) => {
                        let status = sample.status_line();
                        info!("{status}; {} lock holder(s) found", locks.len());
                        let _ = tx.send(InspectionMessage::Completed {
                            sample,
                            locks,
                            status,
                        });
                    }
                    Err(e) => {
                        let _ = tx.send(InspectionMessage::Failed {
                            message: format!("lock inspection failed: {e}"),
                        });
                    }
                }
            })
            .expect("failed to spawn inspection thread");

        InspectionHandle { receiver: rx, token }
    }
}
