//! planarsim CLI - load and drive 2D rigid-body scenes
//!
//! `info` summarizes a scene file; `run` steps it with PID-actuated joints and
//! prints one JSON object of joint readings per reported step.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use planarsim_ir::{BodyKind, SceneDescriptor};
use planarsim_physics::{SimConfig, Simulation, World};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "planarsim")]
#[command(about = "Load and drive 2D rigid-body scenes", long_about = None)]
struct Cli {
    /// Log debug output (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display bodies and joints of a scene file
    Info {
        /// Path to the scene file
        scene: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Step a scene and print joint readings as JSON lines
    Run {
        /// Path to the scene file
        scene: PathBuf,
        /// Driver configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of steps to take
        #[arg(short = 'n', long, default_value_t = 130)]
        steps: u64,
        /// Joint target as NAME=ANGLE (radians), may be repeated
        #[arg(short, long = "target", value_parser = parse_target)]
        targets: Vec<(String, f64)>,
        /// Print readings every K steps
        #[arg(long, default_value_t = 1)]
        every: u64,
    },
}

fn parse_target(arg: &str) -> Result<(String, f64), String> {
    let (name, angle) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=ANGLE, got {arg:?}"))?;
    let angle = angle
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad angle {angle:?}: {e}"))?;
    Ok((name.trim().to_string(), angle))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { scene, json } => {
            show_info(&scene, json)?;
        }
        Commands::Run {
            scene,
            config,
            steps,
            targets,
            every,
        } => {
            run_scene(&scene, config.as_deref(), steps, &targets, every)?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct BodySummary<'a> {
    name: &'a str,
    kind: &'static str,
    fixtures: usize,
}

#[derive(Serialize)]
struct JointSummary<'a> {
    name: &'a str,
    kind: &'static str,
    body_a: &'a str,
    body_b: &'a str,
    actuatable: bool,
}

#[derive(Serialize)]
struct SceneSummary<'a> {
    gravity: [f64; 2],
    bodies: Vec<BodySummary<'a>>,
    joints: Vec<JointSummary<'a>>,
}

fn body_kind_name(kind: BodyKind) -> &'static str {
    match kind {
        BodyKind::Static => "static",
        BodyKind::Kinematic => "kinematic",
        BodyKind::Dynamic => "dynamic",
    }
}

fn summarize(world: &World) -> Result<SceneSummary<'_>> {
    let gravity = world.params().gravity;

    let mut bodies = Vec::with_capacity(world.body_count());
    for name in world.body_names() {
        bodies.push(BodySummary {
            name,
            kind: body_kind_name(world.body_kind(name)?),
            fixtures: world.fixture_filters(name)?.len(),
        });
    }

    let mut joints = Vec::with_capacity(world.joint_count());
    for name in world.joint_names() {
        let kind = world.joint_kind(name)?;
        let (body_a, body_b) = world.joint_bodies(name)?;
        joints.push(JointSummary {
            name,
            kind: kind.as_str(),
            body_a,
            body_b,
            actuatable: kind.is_actuatable(),
        });
    }

    Ok(SceneSummary {
        gravity: [gravity.x, gravity.y],
        bodies,
        joints,
    })
}

fn show_info(path: &Path, json: bool) -> Result<()> {
    let scene = SceneDescriptor::from_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let world = World::from_scene(&scene)
        .with_context(|| format!("failed to build {}", path.display()))?;
    let summary = summarize(&world)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("planarsim scene: {}", path.display());
    println!("  Gravity: ({}, {})", summary.gravity[0], summary.gravity[1]);
    println!("  Bodies: {}", summary.bodies.len());
    println!("  Joints: {}", summary.joints.len());

    if !summary.bodies.is_empty() {
        println!("\nBodies:");
        for body in &summary.bodies {
            println!(
                "  {} ({}, {} fixture(s))",
                body.name, body.kind, body.fixtures
            );
        }
    }

    if !summary.joints.is_empty() {
        println!("\nJoints:");
        for joint in &summary.joints {
            let marker = if joint.actuatable { " [actuatable]" } else { "" };
            println!(
                "  {}: {} {} -> {}{}",
                joint.name, joint.kind, joint.body_a, joint.body_b, marker
            );
        }
    }

    Ok(())
}

fn run_scene(
    path: &Path,
    config: Option<&Path>,
    steps: u64,
    targets: &[(String, f64)],
    every: u64,
) -> Result<()> {
    if every == 0 {
        bail!("--every must be at least 1");
    }

    let config = match config {
        Some(config_path) => SimConfig::from_path(config_path)
            .with_context(|| format!("failed to load config {}", config_path.display()))?,
        None => SimConfig::default(),
    };
    let mut sim = Simulation::load(path, &config)
        .with_context(|| format!("failed to load {}", path.display()))?;

    for (joint, angle) in targets {
        sim.set_target(joint, *angle)
            .with_context(|| format!("cannot set target of {joint}"))?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for i in 1..=steps {
        sim.step()?;
        if i % every == 0 || i == steps {
            serde_json::to_writer(&mut out, &sim.readings()?)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
