use crate::event::{Event, TriggerKind};
use crate::image_reference::ImageReference;
use crate::pipeline::RunOutcome;
use crate::tool::ProcessToolRunner;
use anyhow::{Context, Result};
use std::env;
use tracing::{error, info};
use tracing_subscriber;

mod config;
mod credentials;
mod deploy;
mod event;
mod image_reference;
mod pipeline;
mod publisher;
mod secret_string;
mod tool;

#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    info!("Starting lambda-autodeploy {}", env!("CARGO_PKG_VERSION"));

    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            1
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32> {
    let config_path = env::var("AUTODEPLOY_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = config::load_config(&config_path)?;
    let image = ImageReference::new(
        &config.image.registry,
        &config.image.repository,
        &config.image.tag,
    )
    .context("Invalid image reference in config")?;

    let event = read_event()?;
    info!(
        "Received event: kind {:?}, branch {}, {} changed path(s)",
        event.trigger_kind,
        event.branch,
        event.changed_paths.len()
    );

    let runner = ProcessToolRunner;
    match pipeline::run(&config, &image, &event, &runner).await {
        Ok(RunOutcome::Completed(report)) => {
            info!("Published image {}", report.image);
            let rendered = serde_json::to_string_pretty(&report)
                .context("Failed to render run report as JSON")?;
            info!("Run report:\n{}", rendered);
            Ok(0)
        }
        Ok(RunOutcome::Skipped) => {
            info!("Run finished as a no-op, no deployment was triggered");
            Ok(0)
        }
        Err(err) => Ok(err.exit_code()),
    }
}

/// Assembles the event from the environment the hosting platform provides.
/// Branch and changed paths may be absent for manual triggers.
fn read_event() -> Result<Event> {
    let kind_raw =
        env::var("TRIGGER_KIND").context("Missing environment variable TRIGGER_KIND")?;
    let trigger_kind = TriggerKind::parse(&kind_raw)?;
    let branch = env::var("TRIGGER_BRANCH").unwrap_or_default();
    let changed_paths = env::var("CHANGED_PATHS").unwrap_or_default();

    Ok(Event::new(
        trigger_kind,
        &branch,
        Event::parse_changed_paths(&changed_paths),
    ))
}
