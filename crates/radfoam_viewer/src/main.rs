//! Radiance-foam viewer front end.
//!
//! Loads a trained scene, builds the point tree over its vertices and
//! prepares the per-frame ray-march uniforms, seeding every frame's march
//! at the vertex nearest the camera. Window presentation and the GPU pass
//! live outside this binary; the window flags are accepted and reported so
//! command lines stay interchangeable.

mod camera;
mod config;
mod renderer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use point_bvh::{AabbTree, BuildExecutor, SerialDispatch, TreeBuilder};
use radfoam_scene::RadFoamScene;
use tracing_subscriber::EnvFilter;
use web_time::Instant;

use camera::{CameraInput, FlyCamera};
use config::ViewerConfig;
use renderer::Renderer;

/// Radiance-foam viewer.
#[derive(Parser, Debug)]
#[command(name = "radfoam_viewer")]
#[command(about = "Loads a radiance-foam scene and seeds its ray march from the camera")]
struct Args {
  /// Path to radfoam's output PLY file.
  scene: PathBuf,

  /// Check the tree's structural invariants after building.
  #[arg(long)]
  validation: bool,

  /// Initial window width.
  #[arg(long, default_value_t = 1280)]
  width: u32,

  /// Initial window height.
  #[arg(long, default_value_t = 960)]
  height: u32,

  /// Full screen window.
  #[arg(long = "full-screen", alias = "fullScreen")]
  full_screen: bool,

  /// Resizable window.
  #[arg(long)]
  resizable: bool,

  /// Camera start position as `x,y,z` (overrides the config file).
  #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
  camera: Option<Vec3>,

  /// Path to a viewer configuration TOML file.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Frames to run, flying forward one step per frame after the first.
  #[arg(long, default_value_t = 1)]
  frames: u32,

  /// Build the tree on the calling thread instead of the rayon pool.
  #[arg(long, conflicts_with = "background")]
  serial: bool,

  /// Build on the rayon pool in the background, polling once per frame.
  #[arg(long)]
  background: bool,
}

fn parse_vec3(text: &str) -> Result<Vec3, String> {
  let parts: Vec<f32> = text
    .split(',')
    .map(|p| p.trim().parse::<f32>())
    .collect::<Result<_, _>>()
    .map_err(|err| format!("expected x,y,z: {err}"))?;
  match parts.as_slice() {
    [x, y, z] if parts.iter().all(|c| c.is_finite()) => Ok(Vec3::new(*x, *y, *z)),
    [_, _, _] => Err("coordinates must be finite".to_string()),
    _ => Err(format!("expected 3 coordinates, got {}", parts.len())),
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  let mut config = match &args.config {
    Some(path) => ViewerConfig::load(path)?,
    None => ViewerConfig::default(),
  };
  if let Some(position) = args.camera {
    config.camera.position = position.to_array();
  }

  tracing::info!(
    width = args.width,
    height = args.height,
    full_screen = args.full_screen,
    resizable = args.resizable,
    "window settings (presentation is external)"
  );

  let scene = RadFoamScene::load(&args.scene)
    .with_context(|| format!("PLY read error: {}", args.scene.display()))?;
  tracing::info!(
    vertices = scene.vertex_count(),
    adjacency = scene.adjacency().len(),
    buffer_mb = scene.buffer_bytes() as f64 / (1024.0 * 1024.0),
    "scene ready"
  );

  let tree = Arc::new(build_tree(&args, &config, &scene)?);

  if args.validation {
    tree.verify().context("Tree validation failed")?;
    tracing::info!("tree invariants hold");
  }

  let mut camera = FlyCamera::from_config(&config.camera);
  let mut renderer = Renderer::new(Arc::clone(&tree), config.march.clone(), args.width, args.height);

  tracing::info!(
    frames = args.frames,
    points = renderer.tree().point_count(),
    "seeding ray march"
  );
  for frame in 0..args.frames {
    if frame > 0 {
      camera.apply(CameraInput::forward());
    }
    let uniforms = renderer.update_uniforms(&camera);
    tracing::info!(
      frame,
      camera = ?camera.position,
      start_point = uniforms.start_point,
      "frame uniforms ready"
    );
    tracing::trace!(words = ?uniforms.to_words(), "uniform block");
  }

  Ok(())
}

fn build_tree(args: &Args, config: &ViewerConfig, scene: &RadFoamScene) -> Result<AabbTree> {
  let build_config = config.build.to_build_config();
  let points = scene.points().clone();

  if args.background {
    let start = Instant::now();
    let executor = BuildExecutor::new(build_config);
    let id = executor.spawn(points);

    // Stand-in for the frame loop: poll once per frame until the tree lands
    let mut frames_waited = 0u32;
    let tree = loop {
      if let Some(result) = executor.poll(id) {
        break result.context("Background tree build failed")?;
      }
      frames_waited += 1;
      std::thread::sleep(Duration::from_millis(16));
    };

    tracing::info!(
      levels = tree.levels(),
      frames_waited,
      elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
      "tree built in background"
    );
    return Ok(tree);
  }

  let (tree, stats) = if args.serial {
    TreeBuilder::with_dispatch(build_config, SerialDispatch).build_timed(points)
  } else {
    TreeBuilder::new(build_config).build_timed(points)
  }
  .context("Tree build failed")?;

  for phase in &stats.phases {
    tracing::debug!(
      depth = phase.depth,
      width = phase.width,
      elapsed_us = phase.elapsed_us,
      "build phase"
    );
  }
  tracing::info!(
    points = stats.point_count,
    levels = stats.levels,
    nodes_kb = tree.node_memory_bytes() / 1024,
    total_us = stats.total_us,
    serial = args.serial,
    "tree built"
  );
  Ok(tree)
}
