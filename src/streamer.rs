// Third Party
use futures::StreamExt;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

// Local
use crate::{
    config::Config,
    error::{ErrorKind, Recovery, Result, StreamerError},
    event::EventNotification,
    filter::{should_notify, DedupSet, SkipReasons},
    formatter::MessageFormatter,
    slack::Notifier,
    watcher::{EventSource, NamespaceScope, NotificationStream},
};

enum SessionState {
    Connecting,
    Streaming(NotificationStream),
    Recovering(StreamerError),
}

/// Relays events from an [`EventSource`] to a [`Notifier`], one at a time and in order.
pub struct EventStreamer<S, N> {
    source: S,
    notifier: N,
    formatter: MessageFormatter,
    scope: NamespaceScope,
    skip_reasons: SkipReasons,
    session_timeout: Duration,
    backoff: Duration,
    dedup: DedupSet,
}

impl<S: EventSource, N: Notifier> EventStreamer<S, N> {
    pub fn new(config: &Config, source: S, notifier: N) -> Self {
        Self {
            source,
            notifier,
            formatter: config.formatter(),
            scope: config.scope.clone(),
            skip_reasons: config.skip_reasons.clone(),
            session_timeout: config.session_timeout,
            backoff: config.backoff,
            dedup: DedupSet::new(),
        }
    }

    pub fn dedup(&self) -> &DedupSet {
        &self.dedup
    }

    /// Run watch sessions back to back until the process is terminated.
    pub async fn run(&mut self) {
        loop {
            let ended_by = self.run_session().await;
            debug!("Session ended by {:?}, reconnecting", ended_by);
        }
    }

    /// State machine for a single watch session: connect, drain the stream, then recover.
    /// Returns the kind of failure that ended the session.
    pub async fn run_session(&mut self) -> ErrorKind {
        let mut state = SessionState::Connecting;
        loop {
            state = match state {
                SessionState::Connecting => {
                    debug!("State: Connecting");
                    // Events live for an hour on the server, less than a session, so no id
                    // from the previous session can need suppressing
                    self.dedup.clear();
                    info!("Processing events in {}...", self.scope);
                    match self
                        .source
                        .open_session(&self.scope, self.session_timeout)
                        .await
                    {
                        Ok(stream) => SessionState::Streaming(stream),
                        Err(error) => SessionState::Recovering(error),
                    }
                }
                SessionState::Streaming(mut stream) => match stream.next().await {
                    Some(Ok(notification)) => {
                        if let Err(error) = self.process(&notification).await {
                            self.recover(&error).await;
                        }
                        SessionState::Streaming(stream)
                    }
                    Some(Err(error)) => match error.kind().recovery() {
                        Recovery::ContinueSession { .. } => {
                            self.recover(&error).await;
                            SessionState::Streaming(stream)
                        }
                        _ => SessionState::Recovering(error),
                    },
                    None => SessionState::Recovering(StreamerError::SessionTimeout {
                        seconds: self.session_timeout.as_secs(),
                    }),
                },
                SessionState::Recovering(error) => {
                    debug!("State: Recovering");
                    self.recover(&error).await;
                    return error.kind();
                }
            };
        }
    }

    /// Filter, format and deliver one notification.
    async fn process(&mut self, notification: &EventNotification) -> Result<()> {
        debug!("Processing event {}: {:?}", notification.uid, notification);
        if !should_notify(notification, &self.skip_reasons, &self.dedup) {
            return Ok(());
        }
        let message = self.formatter.format(notification);
        self.notifier.deliver(&message).await?;
        // Only now, so that a failed delivery can be retried if the event shows up again
        self.dedup.insert(&notification.uid);
        Ok(())
    }

    async fn recover(&self, error: &StreamerError) {
        let recovery = error.kind().recovery();
        match error.kind() {
            ErrorKind::SessionTimeout => info!("{}", error),
            _ => error!("{}", error),
        }
        if recovery.reports() {
            let message = self.formatter.format_error(&error.to_string());
            if let Err(report_error) = self.notifier.deliver(&message).await {
                error!("Failed to report error to the web hook: {}", report_error);
            }
        }
        warn!(
            "Wait {} sec and check again due to {}.",
            self.backoff.as_secs(),
            match recovery {
                Recovery::ContinueSession { .. } => "a failed event",
                _ => "the end of the session",
            }
        );
        time::sleep(self.backoff).await;
    }
}
