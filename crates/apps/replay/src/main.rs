mod scenario;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use interactive_markers::{ClientConfig, InteractiveMarkerClient};
use marker_protocol::message::to_json;
use marker_protocol::{FrameSubscriptions, InteractiveMarkerFeedback};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::scenario::{Scenario, Step};

#[derive(Parser)]
#[command(name = "marker-replay")]
#[command(about = "Replay an interaction scenario and print outbound feedback as JSON lines", long_about = None)]
struct Cli {
    /// Scenario file (JSON)
    scenario: PathBuf,

    /// Client configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

type Client = InteractiveMarkerClient<mpsc::UnboundedSender<InteractiveMarkerFeedback>, FrameSubscriptions>;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    let scenario = Scenario::load(&cli.scenario)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut client = Client::new(config, tx, FrameSubscriptions::new());
    client.update(&scenario.camera());

    let mut camera = scenario.camera;
    let mut now = Instant::now();
    let mut sent = 0usize;

    for (index, step) in scenario.steps.iter().enumerate() {
        tracing::debug!("Step {}: {:?}", index, step);
        match step {
            Step::Update(update) => client.process_update(update),
            Step::Init(init) => client.process_init(init),
            Step::Transform(tf) => client.on_transform(&tf.frame_id, tf.transform.into()),
            Step::Pointer(pointer) => {
                client.handle_device_event_at(&pointer.to_device_event(scenario.viewport), now);
            }
            Step::Frame(frame) => {
                if let Some(setup) = frame.camera {
                    camera = setup;
                }
                client.update(&camera.to_camera(scenario.viewport));
            }
            Step::AdvanceMs(ms) => {
                now += Duration::from_millis(*ms);
                client.poll(now);
            }
            Step::MenuSelect(select) => {
                if let Err(e) = client.select_menu_entry(&select.marker, select.id) {
                    tracing::warn!("Step {}: menu selection failed: {}", index, e);
                }
            }
        }

        while let Ok(feedback) = rx.try_recv() {
            println!("{}", to_json(&feedback)?);
            sent += 1;
        }
    }

    tracing::info!(
        "Replayed {} steps, {} feedback messages, {} markers remaining",
        scenario.steps.len(),
        sent,
        client.len()
    );
    Ok(())
}
