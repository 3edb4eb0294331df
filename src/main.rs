use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use log::{info, warn};

use vitrine::format::ModelReference;
use vitrine::io::http::fetcher::HttpFetcher;
use vitrine::settings::CliArgs;
use vitrine::viewer::{
    FitSettings, ModelSelector, RetryPolicy, SceneCache, ViewState, Viewport,
};

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<(), anyhow::Error> {
    let selector = ModelSelector::with_settings(
        Arc::new(HttpFetcher::new()),
        Arc::new(SceneCache::new()),
        RetryPolicy {
            max_attempts: args.max_attempts,
            base_delay: Duration::from_millis(args.retry_delay_ms),
        },
        FitSettings {
            fov_y_radians: args.fov_degrees.to_radians(),
            viewport: if args.compact_viewport {
                Viewport::Compact
            } else {
                Viewport::Desktop
            },
        },
    );

    let mut states = selector.subscribe();
    let reference = match args.format {
        Some(format) => ModelReference::with_format(&args.url, format),
        None => ModelReference::new(&args.url),
    };
    selector.present(reference);

    loop {
        states
            .changed()
            .await
            .expect("selector outlives the state stream");
        let state = states.borrow_and_update().clone();
        match state {
            ViewState::Idle => (),
            ViewState::Loading => info!("loading..."),
            ViewState::Retrying { attempt, max } => warn!("retrying ({attempt}/{max})"),
            ViewState::Ready { scene, camera } => {
                let stats = scene.stats();
                println!(
                    "ready: {} node(s), {} vertices, {} triangles, {} material(s)",
                    stats.nodes, stats.vertices, stats.triangles, stats.materials
                );
                println!(
                    "camera: position ({:.3}, {:.3}, {:.3}) looking at ({:.3}, {:.3}, {:.3})",
                    camera.position.x,
                    camera.position.y,
                    camera.position.z,
                    camera.look_at.x,
                    camera.look_at.y,
                    camera.look_at.z
                );
                return Ok(());
            }
            ViewState::Failed { kind, message } => {
                bail!("{message} ({kind:?})");
            }
        }
    }
}
