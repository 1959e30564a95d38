//! Runs the overlay controller against a host over HTTP, with a shell that
//! talks JSON lines.
//!
//! stdin carries one message per line: host push events (`{"action": ...}`)
//! or player input (`{"user": ...}`). View updates are written to stdout, one
//! JSON object per line. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use taxi_core::contract::{PaymentMethod, PushEvent};
use taxi_overlay::adapters::http::HttpHostChannel;
use taxi_overlay::adapters::push::{push_channel, PushSender};
use taxi_overlay::controller::OverlayController;
use taxi_overlay::logging::init_logging;
use taxi_overlay::settings::OverlaySettings;
use taxi_overlay::shell::{JsonLinesView, UserAction};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "overlay_bridge",
    about = "Drive the taxi overlay from JSON lines on stdin"
)]
struct Cli {
    /// Settings file (JSON). Flags below override its values.
    #[arg(long, env = "TAXI_SETTINGS")]
    settings: Option<PathBuf>,
    /// Host resource name; endpoints resolve to https://<resource>/<endpoint>
    #[arg(long, env = "TAXI_RESOURCE")]
    resource: Option<String>,
    /// Base URL replacing the resource-derived one
    #[arg(long, env = "TAXI_BASE_URL")]
    base_url: Option<String>,
    /// Per-request timeout in milliseconds
    #[arg(long, env = "TAXI_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
    /// Payment preselected when the overlay opens
    #[arg(long, value_enum)]
    default_payment: Option<PaymentArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaymentArg {
    Bank,
    Cash,
}

impl From<PaymentArg> for PaymentMethod {
    fn from(value: PaymentArg) -> Self {
        match value {
            PaymentArg::Bank => PaymentMethod::Bank,
            PaymentArg::Cash => PaymentMethod::Cash,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BridgeInput {
    Push(PushEvent),
    User(UserAction),
}

impl Cli {
    fn settings(&self) -> Result<OverlaySettings> {
        let mut settings = match &self.settings {
            Some(path) => OverlaySettings::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => OverlaySettings::default(),
        };
        if let Some(resource) = &self.resource {
            settings.resource_name = resource.clone();
        }
        if let Some(base_url) = &self.base_url {
            settings.base_url = Some(base_url.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.request_timeout_ms = timeout_ms;
        }
        if let Some(payment) = self.default_payment {
            settings.default_payment = Some(payment.into());
        }
        Ok(settings.normalized())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    let settings = cli.settings()?;
    info!(
        component = "overlay_bridge",
        event = "starting",
        base_url = %settings.base_url(),
        timeout_ms = settings.request_timeout_ms
    );

    let channel = HttpHostChannel::new(&settings).context("building host client")?;
    let (push_sender, inbox) = push_channel();
    let (action_sender, actions) = mpsc::unbounded_channel();
    let reader = tokio::spawn(read_stdin(push_sender, action_sender));

    let controller = OverlayController::new(channel, JsonLinesView::new(std::io::stdout()), settings);
    controller.run(actions, inbox).await;
    reader.await.context("stdin reader panicked")??;
    info!(component = "overlay_bridge", event = "stopped");
    Ok(())
}

async fn read_stdin(
    pushes: PushSender,
    actions: mpsc::UnboundedSender<UserAction>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let delivered = match serde_json::from_str::<BridgeInput>(line) {
            Ok(BridgeInput::Push(event)) => pushes.deliver(event).is_ok(),
            Ok(BridgeInput::User(action)) => actions.send(action).is_ok(),
            Err(error) => {
                warn!(component = "overlay_bridge", event = "input_rejected", %error, line);
                continue;
            }
        };
        if !delivered {
            break;
        }
    }
    Ok(())
}
