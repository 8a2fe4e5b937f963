//! Background conversion thread

use std::path::PathBuf;
use std::thread;

use recolor::{Converter, ProgressEvent};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tracing::{error, info};

use crate::dialog::Dialog;

/// What the worker reports back to the window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    Progress(ProgressEvent),
    /// Last message of a job
    Done(Dialog),
}

/// One conversion running off the UI thread
pub struct ConversionJob {
    rx: UnboundedReceiver<WorkerMessage>,
    finished: bool,
}

impl ConversionJob {
    /// Start converting `input` into `output`
    ///
    /// `notify` runs after every message so the window can repaint.
    pub fn spawn(
        converter: Converter,
        input: PathBuf,
        output: PathBuf,
        notify: impl Fn() + Send + 'static,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let worker_tx = tx.clone();
        let spawned = thread::Builder::new()
            .name("conversion".to_string())
            .spawn(move || {
                let mut sink = |event: ProgressEvent| {
                    let _ = worker_tx.send(WorkerMessage::Progress(event));
                    notify();
                };
                let dialog = match converter.convert(&input, &output, &mut sink) {
                    Ok(report) => {
                        info!(output = %output.display(), pages = report.pages, "conversion finished");
                        Dialog::converted(&report, &output)
                    }
                    Err(e) => {
                        error!(input = %input.display(), error = %e, "conversion failed");
                        Dialog::conversion_failed(&e)
                    }
                };
                let _ = worker_tx.send(WorkerMessage::Done(dialog));
                notify();
            });

        if let Err(e) = spawned {
            error!(error = %e, "could not start conversion thread");
            let _ = tx.send(WorkerMessage::Done(Dialog::worker_failed(&e)));
        }

        Self {
            rx,
            finished: false,
        }
    }

    /// Messages received since the last call, without blocking
    pub fn poll(&mut self) -> Vec<WorkerMessage> {
        let mut messages = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    if matches!(message, WorkerMessage::Done(_)) {
                        self.finished = true;
                    }
                    messages.push(message);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finished = true;
                    break;
                }
            }
        }
        messages
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Status line for a progress event
pub fn progress_label(event: ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::Started { pages } => Some(format!("Converting PDF colors... ({pages} pages)")),
        ProgressEvent::PageDone { page, pages } => Some(format!("Page {page} of {pages}")),
        ProgressEvent::Saving => Some("Saving...".to_string()),
        ProgressEvent::Finished => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_schemes::SchemeRegistry;
    use pretty_assertions::assert_eq;
    use recolor::ConvertOptions;
    use std::time::{Duration, Instant};

    fn wait_for_done(job: &mut ConversionJob) -> Vec<WorkerMessage> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut seen = Vec::new();
        while !job.is_finished() && Instant::now() < deadline {
            seen.extend(job.poll());
            thread::sleep(Duration::from_millis(10));
        }
        seen
    }

    #[test]
    fn test_missing_input_ends_with_error_dialog() {
        let scheme = SchemeRegistry::builtin().get("Sepia").unwrap().clone();
        let dir = std::env::temp_dir();
        let input = dir.join(format!("gui-missing-{}.pdf", std::process::id()));
        let output = dir.join(format!("gui-missing-{}_converted.pdf", std::process::id()));

        let mut job = ConversionJob::spawn(
            Converter::new(ConvertOptions::new(scheme)),
            input,
            output.clone(),
            || {},
        );
        let messages = wait_for_done(&mut job);

        assert!(job.is_finished());
        let Some(WorkerMessage::Done(dialog)) = messages.last() else {
            panic!("no final message: {messages:?}");
        };
        assert_eq!(dialog.title, "File Not Found");
        assert!(!output.exists());
    }

    #[test]
    fn test_progress_labels() {
        assert_eq!(
            progress_label(ProgressEvent::Started { pages: 4 }).as_deref(),
            Some("Converting PDF colors... (4 pages)")
        );
        assert_eq!(
            progress_label(ProgressEvent::PageDone { page: 2, pages: 4 }).as_deref(),
            Some("Page 2 of 4")
        );
        assert_eq!(progress_label(ProgressEvent::Finished), None);
    }
}
