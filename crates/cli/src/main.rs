//! Bridge demo entry point.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Parse configuration** — optional JSON [`bridge::BridgeConfig`] file plus
//!    command-line flags.
//! 2. **Wire observability** — configure `tracing-subscriber` with an env
//!    filter and an optional JSON layer. `--debug` raises the `bridge` and
//!    `social` targets to `debug`, which is the bridge's debug mode.
//! 3. **Construct the channel** — a loopback [`window::ChannelWindow`] and a
//!    simulated [`host::Dashboard`] running on tokio.
//! 4. **Drive calls** — issue social-namespace calls, a transient call and a
//!    persistent watch, then pump inbound events until nothing is pending.

mod host;
mod window;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use bridge::{BridgeConfig, CallOptions, Payload, Transport};
use clap::Parser;
use serde_json::json;
use social::{Callbacks, SocialNamespace};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::host::{Dashboard, PERSISTENT_UPDATES};
use crate::window::ChannelWindow;

#[derive(Debug, Parser)]
#[command(name = "bridge-demo", about = "Drive the embedded-app bridge against a loopback dashboard")]
struct Cli {
    /// JSON bridge configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trace every send/receive/filter decision.
    #[arg(long)]
    debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json: bool,

    /// Origin the simulated dashboard posts from.
    #[arg(long, default_value = "https://dashboard.enplug.com")]
    host_origin: String,

    /// Have the host echo every call back into the app window, as happens when
    /// app and host share one window during development.
    #[arg(long)]
    echo: bool,

    /// Asset whose feeds are requested.
    #[arg(long, default_value = "asset-42")]
    asset_id: String,

    /// Give up on outstanding calls after this many seconds of silence.
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

type Outcomes = Rc<RefCell<Vec<String>>>;

fn record(outcomes: &Outcomes, label: &'static str) -> Callbacks {
    let ok = outcomes.clone();
    let err = outcomes.clone();
    Callbacks::none()
        .on_success(move |data| ok.borrow_mut().push(format!("{label}: ok {data}")))
        .on_error(move |data| err.borrow_mut().push(format!("{label}: error {data}")))
}

fn init_tracing(debug: bool, json: bool) {
    let default = if debug {
        "info,bridge=debug,social=debug,cli=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BridgeConfig> {
    let Some(path) = path else {
        return Ok(BridgeConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: BridgeConfig =
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.json);

    let config = load_config(cli.config.as_deref())?;
    let (to_host, from_app) = mpsc::unbounded_channel();
    let (to_app, mut inbound) = mpsc::unbounded_channel();

    let dashboard = Dashboard::new(&cli.host_origin, &config.namespace, cli.echo, to_app);
    tokio::spawn(dashboard.run(from_app));

    let window = ChannelWindow::new(to_host);
    let transport = Transport::new(window.clone(), config).context("building transport")?;
    info!(transport = %transport.id(), "bridge ready");

    let outcomes: Outcomes = Rc::default();
    let social = SocialNamespace::new(&transport);

    social.get_feeds(&cli.asset_id, record(&outcomes, "getFeeds"))?;
    social.authenticate("code-123", "https://app.example/cb", record(&outcomes, "authenticate"))?;
    social.authenticate("denied", "https://app.example/cb", record(&outcomes, "authenticate"))?;
    social.save_feed(json!({"Type": "twitter", "Handle": "@enplug"}), record(&outcomes, "saveFeed"))?;
    social.open_preapproval_dialog(json!({"Id": "feed-1"}), record(&outcomes, "preapproval"))?;

    let app = transport.factory(&transport.config().method_scope);
    app.call(CallOptions::new("log").params("demo started").transient(true))?;

    let updates = Rc::new(RefCell::new(0u64));
    let watcher = transport.clone();
    let seen = updates.clone();
    let sink = outcomes.clone();
    let watch_id = Rc::new(RefCell::new(None));
    let own_id = watch_id.clone();
    let id = app.call(
        CallOptions::new("watchFeeds")
            .persistent(true)
            .on_success(move |data: Payload| {
                *seen.borrow_mut() += 1;
                sink.borrow_mut().push(format!("watchFeeds: update {data}"));
                if *seen.borrow() == PERSISTENT_UPDATES {
                    if let Some(id) = *own_id.borrow() {
                        watcher.cancel(id);
                    }
                }
            }),
    )?;
    *watch_id.borrow_mut() = Some(id);

    let timeout = Duration::from_secs(cli.timeout_secs);
    while transport.pending_count() > 0 {
        match tokio::time::timeout(timeout, inbound.recv()).await {
            Ok(Some(event)) => window.dispatch(&event),
            Ok(None) => break,
            Err(_) => {
                for call in transport.pending_calls() {
                    warn!(call_id = %call.call_id, method = %call.name, sent_at = %call.sent_at, "call never answered");
                }
                break;
            }
        }
    }

    for line in outcomes.borrow().iter() {
        println!("{line}");
    }
    info!(updates = *updates.borrow(), pending = transport.pending_count(), "demo finished");
    Ok(())
}
