//! `send` and `pair` subcommands.

use std::path::Path;

use anyhow::Context;
use taguato_core::recipients::split_recipients;
use taguato_dispatch::{
    retryable_recipients, BulkDispatcher, ConnectionWatcher, DispatchOutcome, DispatchSummary,
    WatchState,
};
use taguato_gateway::{GatewayApi, PairingPrompt};
use tokio_util::sync::CancellationToken;

use crate::config::PanelConfig;

/// Send `message` to every recipient listed in `recipients_path`.
///
/// Ctrl-C cancels the run: the send in flight completes and every
/// remaining recipient is reported as cancelled.
pub async fn send(
    api: GatewayApi,
    config: &PanelConfig,
    instance: &str,
    recipients_path: &Path,
    message: &str,
    json: bool,
) -> anyhow::Result<DispatchSummary> {
    let raw = tokio::fs::read_to_string(recipients_path)
        .await
        .with_context(|| format!("reading recipients from {}", recipients_path.display()))?;
    let recipients = split_recipients(&raw);

    let dispatcher = BulkDispatcher::with_config(api, config.dispatch_config());
    let cancel = CancellationToken::new();
    let ctrl_c = spawn_ctrl_c_cancel(cancel.clone());

    let total = recipients.len();
    let progress = move |processed: usize, outcomes: &[DispatchOutcome]| {
        if let Some(last) = outcomes.last() {
            eprintln!("[{processed}/{total}] {} {:?}", last.recipient, last.state);
        }
    };

    let outcomes = dispatcher
        .dispatch(instance, &recipients, message, &cancel, &progress)
        .await?;
    ctrl_c.abort();

    let summary = DispatchSummary::from_outcomes(&outcomes);
    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in outcomes.iter().filter(|o| o.state.is_retryable()) {
            println!(
                "failed {}: {}",
                outcome.recipient,
                outcome.detail.as_deref().unwrap_or_default()
            );
        }
        println!(
            "sent {} / failed {} / skipped {} / cancelled {} (of {})",
            summary.sent, summary.failed, summary.skipped, summary.cancelled, summary.total
        );
        let retry = retryable_recipients(&outcomes);
        if !retry.is_empty() {
            println!("retry with:\n{}", retry.join("\n"));
        }
    }

    Ok(summary)
}

/// Request a pairing prompt for `instance` and wait until it pairs.
pub async fn pair(api: GatewayApi, config: &PanelConfig, instance: &str) -> anyhow::Result<bool> {
    let response = api
        .connect_instance(instance)
        .await
        .with_context(|| format!("requesting pairing prompt for {instance}"))?;

    match response.prompt() {
        PairingPrompt::AlreadyConnected => {
            println!("{instance} is already connected");
            return Ok(true);
        }
        PairingPrompt::QrCode(data_uri) => {
            println!("Scan this QR code with WhatsApp (expires in ~40 s):\n{data_uri}");
        }
        PairingPrompt::PairingCode(code) => {
            println!("Pairing code: {code}");
        }
        PairingPrompt::Unrecognized(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    let watcher = ConnectionWatcher::with_config(api, config.watch_config());
    let mut handle = watcher.start_watch(instance, || {
        tracing::debug!("Terminal callback fired");
    });

    let end = tokio::select! {
        end = handle.finished() => end,
        _ = tokio::signal::ctrl_c() => {
            watcher.stop_watch();
            WatchState::Stopped
        }
    };

    match end {
        WatchState::Paired => println!("{instance} connected"),
        WatchState::Expired => println!("{instance} did not pair in time; request a new code"),
        _ => println!("pairing watch stopped"),
    }
    Ok(end == WatchState::Paired)
}

fn spawn_ctrl_c_cancel(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling remaining sends");
            cancel.cancel();
        }
    })
}
