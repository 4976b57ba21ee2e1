// Third Party
use tokio::time::Duration;
use tracing::warn;

// Local
use crate::{
    error::{Result, StreamerError},
    filter::SkipReasons,
    formatter::MessageFormatter,
    watcher::NamespaceScope,
};

pub const NAMESPACE: &str = "K8S_EVENTS_STREAMER_NAMESPACE";
pub const REASONS_TO_SKIP: &str = "K8S_EVENTS_STREAMER_LIST_OF_REASONS_TO_SKIP";
pub const SKIP_DELETE_EVENTS: &str = "K8S_EVENTS_STREAMER_SKIP_DELETE_EVENTS";
pub const USERS_TO_NOTIFY: &str = "K8S_EVENTS_STREAMER_USERS_TO_NOTIFY";
pub const WEB_HOOK_URL: &str = "K8S_EVENTS_STREAMER_INCOMING_WEB_HOOK_URL";
pub const DEBUG: &str = "K8S_EVENTS_STREAMER_DEBUG";
pub const SLACK_CHANNEL: &str = "K8S_EVENTS_STREAMER_SLACK_CHANNEL";
pub const SLACK_USERNAME: &str = "K8S_EVENTS_STREAMER_SLACK_USERNAME";
pub const CLUSTER_NAME: &str = "K8S_EVENTS_STREAMER_CLUSTER_NAME";
pub const SESSION_TIMEOUT_SECONDS: &str = "K8S_EVENTS_STREAMER_SESSION_TIMEOUT_SECONDS";
pub const BACKOFF_SECONDS: &str = "K8S_EVENTS_STREAMER_BACKOFF_SECONDS";

const DEFAULT_NAMESPACE: &str = "default";
/// Kubernetes keeps events for an hour by default (`--event-ttl`), so two hours is always longer
/// than an event can live.
const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);
const DEFAULT_BACKOFF: Duration = Duration::from_secs(30);

/// Everything read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub scope: NamespaceScope,
    pub skip_reasons: SkipReasons,
    pub skip_delete_events: bool,
    pub users_to_notify: String,
    pub web_hook_url: String,
    pub debug: bool,
    pub channel: Option<String>,
    pub username: Option<String>,
    pub cluster_name: Option<String>,
    pub session_timeout: Duration,
    pub backoff: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let web_hook_url = lookup(WEB_HOOK_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| StreamerError::MissingSetting {
                name: WEB_HOOK_URL.to_string(),
            })?;

        // Unset keeps the historical default, an explicit empty value means every namespace
        let scope = match lookup(NAMESPACE) {
            None => NamespaceScope::Namespace(DEFAULT_NAMESPACE.to_string()),
            Some(namespace) if namespace.trim().is_empty() => NamespaceScope::All,
            Some(namespace) => NamespaceScope::Namespace(namespace.trim().to_string()),
        };

        let skip_delete_events = parse_bool(lookup(SKIP_DELETE_EVENTS));
        let skip_reasons = SkipReasons::parse(
            &lookup(REASONS_TO_SKIP).unwrap_or_default(),
            skip_delete_events,
        );

        let session_timeout = parse_seconds(
            SESSION_TIMEOUT_SECONDS,
            lookup(SESSION_TIMEOUT_SECONDS),
            DEFAULT_SESSION_TIMEOUT,
            false,
        );
        let backoff = parse_seconds(
            BACKOFF_SECONDS,
            lookup(BACKOFF_SECONDS),
            DEFAULT_BACKOFF,
            true,
        );

        Ok(Config {
            scope,
            skip_reasons,
            skip_delete_events,
            users_to_notify: lookup(USERS_TO_NOTIFY)
                .unwrap_or_default()
                .trim()
                .to_string(),
            web_hook_url,
            debug: parse_bool(lookup(DEBUG)),
            channel: non_empty(lookup(SLACK_CHANNEL)),
            username: non_empty(lookup(SLACK_USERNAME)),
            cluster_name: non_empty(lookup(CLUSTER_NAME)),
            session_timeout,
            backoff,
        })
    }

    pub fn formatter(&self) -> MessageFormatter {
        MessageFormatter {
            mention: self.users_to_notify.clone(),
            cluster_name: self.cluster_name.clone(),
            channel: self.channel.clone(),
            username: self.username.clone(),
        }
    }

    /// The web hook URL embeds its secret in the path, so only the host is ever logged.
    pub fn redacted_web_hook_url(&self) -> String {
        match reqwest::Url::parse(&self.web_hook_url) {
            Ok(url) => format!(
                "{}://{}/...",
                url.scheme(),
                url.host_str().unwrap_or_default()
            ),
            Err(_) => "<invalid url>".to_string(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Anything but an explicit false spelling turns a flag on, e.g. `enabled` or `y`.
fn parse_bool(value: Option<String>) -> bool {
    match value {
        Some(value) => !matches!(
            value.trim().to_lowercase().as_str(),
            "" | "0" | "false" | "no" | "off"
        ),
        None => false,
    }
}

/// Invalid durations fall back to the default, only a missing web hook stops the process.
fn parse_seconds(
    name: &str,
    value: Option<String>,
    default: Duration,
    allow_zero: bool,
) -> Duration {
    let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
        return default;
    };
    match value.trim().parse::<u64>() {
        Ok(0) if !allow_zero => {
            warn!(
                "{} must be greater than zero, using {} seconds",
                name,
                default.as_secs()
            );
            default
        }
        Ok(seconds) => Duration::from_secs(seconds),
        Err(error) => {
            warn!(
                "{} has invalid value {:?} ({}), using {} seconds",
                name,
                value,
                error,
                default.as_secs()
            );
            default
        }
    }
}
