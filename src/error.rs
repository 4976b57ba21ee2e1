// Third Party
use kube::error::ErrorResponse;
use thiserror::Error;

/// Every failure the streamer can run into. The session loop never inspects
/// the variant directly, it branches on [`StreamerError::kind`].
#[derive(Error, Debug)]
pub enum StreamerError {
    #[error(
        "Env variable {name} is not defined or set to empty string. \
         Set it to non-empty string and try again"
    )]
    MissingSetting { name: String },

    #[error("Malformed event notification: missing {field}")]
    MalformedNotification { field: &'static str },

    #[error("Malformed event notification: {0}")]
    UndecodableNotification(serde_json::Error),

    #[error("Watch session ended after {seconds} seconds")]
    SessionTimeout { seconds: u64 },

    #[error("Watch resource version expired: {}", .0.message)]
    WatchExpired(ErrorResponse),

    #[error("Watch returned an error status {}: {}", .0.code, .0.message)]
    WatchStatus(ErrorResponse),

    #[error("Kubernetes API error: {0}")]
    Transport(#[from] kube::Error),

    #[error("Failed to post message to the web hook: {0}")]
    Delivery(#[from] reqwest::Error),

    #[error("Web hook rejected the message with status {status}: {body}")]
    DeliveryRejected { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, StreamerError>;

/// The closed set of failure classes the recovery controller knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    MalformedNotification,
    SessionTimeout,
    Transport,
    Delivery,
}

/// What the session loop does after a failure of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Back off, then keep draining the current session.
    ContinueSession { report: bool },
    /// Back off, then open a new session with an empty dedup set.
    Reconnect { report: bool },
    /// The process cannot run at all.
    Abort,
}

impl Recovery {
    pub fn reports(&self) -> bool {
        match self {
            Recovery::ContinueSession { report } | Recovery::Reconnect { report } => *report,
            Recovery::Abort => false,
        }
    }
}

impl ErrorKind {
    pub fn recovery(self) -> Recovery {
        match self {
            ErrorKind::Configuration => Recovery::Abort,
            ErrorKind::MalformedNotification | ErrorKind::Delivery => {
                Recovery::ContinueSession { report: true }
            }
            ErrorKind::SessionTimeout => Recovery::Reconnect { report: false },
            ErrorKind::Transport => Recovery::Reconnect { report: true },
        }
    }
}

impl StreamerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamerError::MissingSetting { .. } => ErrorKind::Configuration,
            StreamerError::MalformedNotification { .. }
            | StreamerError::UndecodableNotification(_) => ErrorKind::MalformedNotification,
            StreamerError::SessionTimeout { .. } | StreamerError::WatchExpired(_) => {
                ErrorKind::SessionTimeout
            }
            StreamerError::WatchStatus(_) | StreamerError::Transport(_) => ErrorKind::Transport,
            StreamerError::Delivery(_) | StreamerError::DeliveryRejected { .. } => {
                ErrorKind::Delivery
            }
        }
    }

    /// Map a watch `Error` status to the failure it represents.
    /// 410 Gone means our resource version fell out of the server's window.
    pub fn from_watch_status(response: ErrorResponse) -> Self {
        if response.code == 410 {
            StreamerError::WatchExpired(response)
        } else {
            StreamerError::WatchStatus(response)
        }
    }

    /// Map an error from the watch request or its stream.
    /// A line that does not decode only spoils that one event, the stream carries on after it.
    pub fn from_watch_error(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => Self::from_watch_status(response),
            kube::Error::SerdeError(error) => StreamerError::UndecodableNotification(error),
            error => StreamerError::Transport(error),
        }
    }
}
