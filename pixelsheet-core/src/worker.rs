//! Run a conversion off the calling thread.
//!
//! Interactive front ends hand a [`ConversionJob`] to [`spawn_conversion`]
//! and poll the returned handle. The job sends exactly one
//! [`ConversionEvent`] when it finishes. A running job cannot be cancelled.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::convert::{convert, ConvertOptions};

/// Everything one background conversion needs. Owned by the worker thread.
#[derive(Clone, Debug)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub options: ConvertOptions,
}

/// The single message a job sends back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversionEvent {
    Completed { output: PathBuf },
    Failed { message: String },
}

/// Handle to a spawned job.
pub struct ConversionHandle {
    rx: Receiver<ConversionEvent>,
    thread: Option<JoinHandle<()>>,
    delivered: bool,
}

/// Start `job` on a new thread.
pub fn spawn_conversion(job: ConversionJob) -> ConversionHandle {
    let (tx, rx) = mpsc::channel::<ConversionEvent>();

    let thread = thread::spawn(move || {
        debug!(input = %job.input.display(), "background conversion started");
        let event = match convert(&job.input, &job.output, &job.options) {
            Ok(output) => ConversionEvent::Completed { output },
            Err(e) => {
                warn!("background conversion failed: {e}");
                ConversionEvent::Failed {
                    message: error_chain(&e),
                }
            }
        };
        // Receiver may be gone if the caller stopped caring.
        let _ = tx.send(event);
    });

    ConversionHandle {
        rx,
        thread: Some(thread),
        delivered: false,
    }
}

impl ConversionHandle {
    /// The event, if the job has finished and it was not returned before.
    /// Never blocks.
    pub fn try_event(&mut self) -> Option<ConversionEvent> {
        if self.delivered {
            return None;
        }
        let event = match self.rx.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => panicked(),
        };
        self.delivered = true;
        self.join();
        Some(event)
    }

    /// Block until the job finishes. `None` if [`try_event`](Self::try_event)
    /// already returned the event.
    pub fn wait(mut self) -> Option<ConversionEvent> {
        if self.delivered {
            return None;
        }
        let event = self.rx.recv().unwrap_or_else(|_| panicked());
        self.join();
        Some(event)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |h| h.is_finished())
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

fn panicked() -> ConversionEvent {
    ConversionEvent::Failed {
        message: "conversion thread terminated unexpectedly".to_string(),
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
