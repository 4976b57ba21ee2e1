// Third Party
use kube::Client;
use tracing::{error, info};

// Local
use k8s_events_to_slack::{
    slack::SlackWebhook,
    utils::{init_tracing, setup_exit_hooks},
    watcher::KubeEventSource,
    Config, EventStreamer,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Only the debug toggle is needed before tracing is up
    let config = Config::from_env();
    let debug = config.as_ref().map(|config| config.debug).unwrap_or(false);
    init_tracing(
        "k8s_events_to_slack",
        if debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        },
    );
    setup_exit_hooks()?;

    info!("Reading configuration...");
    let config = config.map_err(|e| {
        error!("{}", e);
        e
    })?;
    // In cluster this picks up the service account, locally the kubeconfig
    let client = Client::try_default().await?;
    info!("Configuration is OK");
    info!("Running with the following parameters");
    info!("K8S_EVENTS_STREAMER_NAMESPACE: {}", config.scope);
    if config.skip_delete_events {
        info!("Added SUCCESSFULDELETE to the list of reasons to skip event");
    }
    info!(
        "K8S_EVENTS_STREAMER_LIST_OF_REASONS_TO_SKIP: {:?}",
        config.skip_reasons.to_sorted_vec()
    );
    info!(
        "K8S_EVENTS_STREAMER_USERS_TO_NOTIFY: {}",
        config.users_to_notify
    );
    info!(
        "K8S_EVENTS_STREAMER_INCOMING_WEB_HOOK_URL: {}",
        config.redacted_web_hook_url()
    );

    let mut streamer = EventStreamer::new(
        &config,
        KubeEventSource::new(&client),
        SlackWebhook::new(&config.web_hook_url),
    );
    streamer.run().await;

    Ok(())
}
