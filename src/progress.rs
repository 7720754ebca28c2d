//! Progress reporting and cooperative cancellation for long-running passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::error::{Error, Result};

/// Which pass an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Region detection over rendered pages
    Analyze,
    /// HTML generation (including OCR)
    Generate,
}

/// Events emitted while analysing or generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A pass has started over `total` pages.
    Started {
        /// Pass
        stage: Stage,
        /// Number of pages that will be processed
        total: u32,
    },

    /// A page is being processed.
    PageStarted {
        /// Pass
        stage: Stage,
        /// 1-indexed page number
        page: u32,
    },

    /// A page has been processed.
    PageFinished {
        /// Pass
        stage: Stage,
        /// 1-indexed page number
        page: u32,
    },

    /// The pass completed.
    Finished {
        /// Pass
        stage: Stage,
    },
}

/// Shared flag checked between units of work. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Optional progress channel. A dropped receiver is not an error.
#[derive(Debug, Clone, Default)]
pub(crate) struct Reporter {
    sender: Option<Sender<Progress>>,
}

impl Reporter {
    pub(crate) fn new(sender: Option<Sender<Progress>>) -> Self {
        Self { sender }
    }

    pub(crate) fn send(&self, event: Progress) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());

        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_reporter_ignores_dropped_receiver() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let reporter = Reporter::new(Some(tx));
        reporter.send(Progress::Finished { stage: Stage::Analyze });
        assert_eq!(rx.try_recv().unwrap(), Progress::Finished { stage: Stage::Analyze });

        drop(rx);
        reporter.send(Progress::Finished { stage: Stage::Analyze });
        Reporter::default().send(Progress::Finished { stage: Stage::Generate });
    }
}
