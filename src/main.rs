//! Demo host: starts in one scene and switches to another after a delay.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use stagehand::{AppConfig, SceneId};

#[derive(Parser, Debug)]
#[command(name = "stagehand", about = "Switch scenes after a delay")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene to switch to
    #[arg(short, long, default_value = "scene2")]
    target: String,

    /// Seconds to wait before switching
    #[arg(short, long, default_value_t = 3.0)]
    delay: f32,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Frames per second (0 = unthrottled)
    #[arg(long)]
    tick_rate: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(frames) = cli.frames {
        config = config.max_frames(frames);
    }
    if let Some(rate) = cli.tick_rate {
        config = config.tick_rate(rate);
    }

    let target = SceneId::new(cli.target);
    let delay = cli.delay;
    let wanted = target.clone();

    let summary = stagehand::run_with_config(config, move |ctx| {
        ctx.on_enter(|scene| log::info!("entered '{}'", scene))
            .on_exit(|scene| log::info!("leaving '{}'", scene));

        let mut requested = false;
        let mut waited = 0.0;

        move |frame| {
            if requested {
                if frame.is_settled() {
                    frame.quit();
                }
            } else {
                waited += frame.dt;
                if waited < delay {
                    return;
                }
                log::info!("{:.1}s elapsed, switching to '{}'", waited, target);
                frame.switch_to(target.clone());
                requested = true;
            }
        }
    });

    for e in &summary.errors {
        log::error!("{}", e);
    }
    anyhow::ensure!(
        summary.final_scene.as_ref() == Some(&wanted),
        "ended in {:?} after {} frames, wanted '{}'",
        summary.final_scene.as_ref().map(SceneId::as_str),
        summary.frames,
        wanted
    );

    log::info!(
        "reached '{}' after {} frames ({} transitions)",
        wanted,
        summary.frames,
        summary.transitions
    );
    Ok(())
}
