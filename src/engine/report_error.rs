// Copyright © 2024 Pathway

#![allow(clippy::module_name_repetitions)]

use crossbeam_channel as channel;
use log::{error, warn};

use super::error::Error;

/// Error-reporting channel for failures that are recovered locally, such as
/// a group filter whose task failed while its siblings succeeded.
pub trait ReportError: Send + Sync {
    fn report(&self, error: Error);
}

impl ReportError for Box<dyn ReportError> {
    fn report(&self, error: Error) {
        self.as_ref().report(error);
    }
}

impl<R: ReportError + ?Sized> ReportError for &R {
    fn report(&self, error: Error) {
        (**self).report(error);
    }
}

/// Emits every reported error as a `log` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ReportError for LogReporter {
    fn report(&self, error: Error) {
        error!("{error}");
    }
}

/// Forwards reported errors to a channel, for callers that act on failures
/// programmatically.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: channel::Sender<Error>,
}

impl ChannelReporter {
    pub fn new(sender: channel::Sender<Error>) -> Self {
        Self { sender }
    }

    pub fn unbounded() -> (Self, channel::Receiver<Error>) {
        let (sender, receiver) = channel::unbounded();
        (Self::new(sender), receiver)
    }
}

impl ReportError for ChannelReporter {
    fn report(&self, error: Error) {
        if let Err(channel::SendError(error)) = self.sender.send(error) {
            warn!("error receiver is gone, dropping report: {error}");
        }
    }
}
