//! package_bridge - Mirror package detections into a Home Assistant input_boolean.
//!
//! This bridge:
//! 1. Loads connection settings from the environment (fatal if any is missing)
//! 2. Pulls one prediction per frame from the inference workflow, or from a
//!    JSON-lines stream produced by an external pipeline
//! 3. Keeps detections with enough confidence that lie right of the exclusion zone
//! 4. Turns the input_boolean ON when any remain and OFF otherwise, every frame

use anyhow::{anyhow, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ha_package_vision::{
    BridgeConfig, FrameRate, HomeAssistantNotifier, JsonLinesSource, PackageBridge,
    PredictionSource, RunOutcome, WorkflowSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Package detection bridge for Home Assistant")]
struct Args {
    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Read prediction documents (one JSON object per line) from PATH instead
    /// of calling the inference workflow. Use '-' for stdin.
    #[arg(long, env = "DETECTIONS_PATH", value_name = "PATH")]
    detections: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(RunOutcome::Interrupted) => {
            log::info!("Pipeline terminated by user.");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::SourceExhausted) => {
            log::info!("Prediction source exhausted, exiting.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("An error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<RunOutcome> {
    let cfg = BridgeConfig::load()?;
    log::debug!("{:?}", cfg);

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = shutdown.clone();
    ctrlc::set_handler(move || {
        // A second Ctrl-C exits even if the loop is blocked on a read.
        if handler_flag.swap(true, Ordering::SeqCst) {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow!("failed to install Ctrl-C handler: {}", e))?;

    log::info!("Package bridge starting");
    let (mut source, mut rate): (Box<dyn PredictionSource>, FrameRate) =
        match args.detections.as_deref() {
            Some(path) => {
                let source = JsonLinesSource::open(path, &cfg.output_field)?;
                log::info!("  Detections: {}", path);
                (Box::new(source), FrameRate::unthrottled())
            }
            None => {
                let source = WorkflowSource::new(cfg.workflow())?;
                log::info!("  Workflow: {}", source.endpoint());
                log::info!("  Video feed: {}", cfg.video_feed);
                log::info!("  Max fps: {}", cfg.max_fps);
                (Box::new(source), FrameRate::from_max_fps(cfg.max_fps))
            }
        };

    log::info!("  Home Assistant: {}", cfg.home_assistant_url);
    log::info!("  Entity: {}", cfg.entity_id);
    log::info!(
        "  Filter: confidence >= {}, x_min > {}",
        cfg.filter.min_confidence,
        cfg.filter.min_x
    );

    let notifier = HomeAssistantNotifier::new(cfg.home_assistant());
    let mut bridge = PackageBridge::new(cfg.filter, notifier);
    bridge.run(&mut source, &mut rate, &shutdown)
}
