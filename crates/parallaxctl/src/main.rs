//! Parallax Control - CLI for the active viewpoint agent.
//!
//! Runs estimation episodes against a directory of pre-rendered frames and
//! the configured model endpoints, or judges a single view in isolation.

mod cli;
mod logging;
mod output;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use parallax_common::{
    parse_sign_tuple, prompts, Agent, Axis, FrameStore, HttpChatModel, ImageHandle,
    ParallaxConfig, PerceptionModel,
};
use std::path::PathBuf;

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let config = ParallaxConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            central,
            target,
            frames_dir,
            scene,
            max_steps,
            jitter,
            tau,
            seed,
            expect,
            json,
        } => {
            let overrides = RunOverrides {
                frames_dir,
                scene,
                max_steps,
                jitter,
                tau,
                seed,
            };
            run_episode(config, &central, &target, overrides, expect.as_deref(), json)
        }
        Commands::Judge {
            image,
            central,
            target,
            axes,
        } => judge_view(&config, image, &central, &target, &axes),
        Commands::Config { json } => show_config(&config, json),
    }
}

/// Command-line overrides applied on top of the loaded config.
struct RunOverrides {
    frames_dir: Option<PathBuf>,
    scene: Option<String>,
    max_steps: Option<usize>,
    jitter: Option<usize>,
    tau: Option<f64>,
    seed: Option<u64>,
}

fn run_episode(
    mut config: ParallaxConfig,
    central: &str,
    target: &str,
    overrides: RunOverrides,
    expect: Option<&str>,
    json: bool,
) -> Result<()> {
    if let Some(dir) = overrides.frames_dir {
        config.scene.frames_dir = dir;
    }
    if let Some(scene) = overrides.scene {
        config.scene.object_id = scene;
    }
    if let Some(max_steps) = overrides.max_steps {
        config.agent.max_steps = max_steps;
    }
    if let Some(jitter) = overrides.jitter {
        config.agent.jitter_count = jitter;
    }
    if let Some(tau) = overrides.tau {
        config.agent.tau = tau;
    }
    if let Some(seed) = overrides.seed {
        config.agent.seed = Some(seed);
    }

    let planner = HttpChatModel::new(config.planner.clone())?;
    let perception = HttpChatModel::new(config.perception.clone())?;
    let mut camera = FrameStore::new(
        config.scene.frames_dir.clone(),
        config.scene.object_id.clone(),
    );

    let mut agent = Agent::new(&planner, &perception, config.agent.clone());
    if !json {
        agent = agent.with_observer(Box::new(output::ConsoleObserver));
    }

    let outcome = agent
        .run(central, target, &mut camera)
        .context("estimation run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        output::display_outcome(&outcome, expect);
    }
    Ok(())
}

fn judge_view(
    config: &ParallaxConfig,
    image: PathBuf,
    central: &str,
    target: &str,
    axes: &str,
) -> Result<()> {
    let focus = parse_axes(axes)?;
    let perception = HttpChatModel::new(config.perception.clone())?;
    let handle = ImageHandle::new(image);

    let system_prompt = prompts::perception_system(&focus, central, target);
    let user_prompt = prompts::perception_user(central, target);
    let raw = perception.judge(&system_prompt, &user_prompt, &handle)?;

    output::display_reading(&parse_sign_tuple(&raw), &raw);
    Ok(())
}

fn show_config(config: &ParallaxConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}

fn parse_axes(s: &str) -> Result<Vec<Axis>> {
    let mut axes = Vec::new();
    for c in s.chars().filter(|c| !c.is_whitespace() && *c != ',') {
        let axis = match c.to_ascii_uppercase() {
            'X' => Axis::X,
            'Y' => Axis::Y,
            'Z' => Axis::Z,
            other => bail!("unknown axis '{other}' (expected X, Y, or Z)"),
        };
        if !axes.contains(&axis) {
            axes.push(axis);
        }
    }
    if axes.is_empty() {
        bail!("no axes given");
    }
    Ok(axes)
}
