mod demo;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use framecore_assets::{AssetLoader, AssetStore};
use framecore_audio::NullAudioBackend;
use framecore_common::{BlendMode, EngineConfig, SleepConfig, Transform};
use framecore_render::{Camera, DebugTextBackend};
use framecore_runtime::FrameDriver;
use framecore_scene::{CollisionShape, RigidBodyState};
use glam::Vec3;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "framecore-cli", about = "Headless driver for the framecore simulation core")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Engine configuration file (.yaml, .yml, or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the effective configuration
    Info,
    /// Step the demo scene with a fixed frame delta
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "600")]
        frames: u32,
        /// Frame delta in seconds
        #[arg(long, default_value = "0.016666668")]
        dt: f64,
        /// Number of dynamic bodies
        #[arg(short, long, default_value = "25")]
        bodies: usize,
        /// Run twice and compare final state hashes
        #[arg(long)]
        verify: bool,
    },
    /// Run the demo scene on wall-clock time
    Run {
        /// How long to run before requesting shutdown
        #[arg(short, long, default_value = "2.0")]
        seconds: f64,
        /// Target frames per second
        #[arg(long, default_value = "60")]
        fps: u32,
        /// Number of dynamic bodies
        #[arg(short, long, default_value = "25")]
        bodies: usize,
        /// Mesh file loaded in the background onto the first body
        #[arg(long)]
        mesh: Option<PathBuf>,
        /// Print the last submitted draw list
        #[arg(long)]
        dump: bool,
    },
    /// Drop one body in free fall and compare with the analytic height
    DropTest {
        #[arg(long, default_value = "10.0")]
        height: f32,
        #[arg(long, default_value = "2.0")]
        seconds: f32,
        #[arg(long, default_value = "9.8")]
        gravity: f32,
    },
    /// Load asset files and report what was found
    Assets {
        paths: Vec<PathBuf>,
        /// Write a JSON manifest of loaded assets
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("framecore-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", framecore_common::crate_info());
            println!("scene: {}", framecore_scene::crate_info());
            println!("physics: {}", framecore_physics::crate_info());
            println!("render: {}", framecore_render::crate_info());
            println!("audio: {}", framecore_audio::crate_info());
            println!("assets: {}", framecore_assets::crate_info());
            println!("runtime: {}", framecore_runtime::crate_info());
            println!("--- config ---");
            print!("{}", serde_yaml::to_string(&config)?);
        }
        Commands::Simulate {
            frames,
            dt,
            bodies,
            verify,
        } => {
            println!("Simulate: frames={frames}, dt={dt}, bodies={bodies}");
            let first = simulate(&config, frames, dt, bodies)?;
            println!("State hash: {first:#018x}");
            if verify {
                let second = simulate(&config, frames, dt, bodies)?;
                println!("Replay hash: {second:#018x}");
                println!("Match: {}", if first == second { "OK" } else { "MISMATCH" });
            }
        }
        Commands::Run {
            seconds,
            fps,
            bodies,
            mesh,
            dump,
        } => run(config, seconds, fps, bodies, mesh, dump)?,
        Commands::DropTest {
            height,
            seconds,
            gravity,
        } => drop_test(config, height, seconds, gravity)?,
        Commands::Assets { paths, manifest } => {
            let store = AssetStore::new();
            let mut meshes = Vec::new();
            for path in &paths {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
                if ext.eq_ignore_ascii_case("wav") {
                    match store.load_clip(path) {
                        Ok(clip) => println!("{}: clip {:016x}, {:.3}s", path.display(), clip.handle.0, clip.duration),
                        Err(e) => println!("{}: error: {e}", path.display()),
                    }
                } else {
                    match store.load_mesh(path) {
                        Ok(mesh) => {
                            println!(
                                "{}: mesh {:016x} '{}', {} vertices, {} indices",
                                path.display(),
                                mesh.handle.0,
                                mesh.name,
                                mesh.vertex_count,
                                mesh.index_count
                            );
                            meshes.push(mesh);
                        }
                        Err(e) => println!("{}: error: {e}", path.display()),
                    }
                }
            }
            if let Some(out) = manifest {
                store
                    .save_manifest(&out)
                    .with_context(|| format!("writing manifest {}", out.display()))?;
                println!("Manifest written to {}", out.display());
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn demo_camera() -> Camera {
    Camera::look_at(Vec3::new(0.0, 8.0, 20.0), Vec3::ZERO)
}

fn simulate(config: &EngineConfig, frames: u32, dt: f64, bodies: usize) -> anyhow::Result<u64> {
    let assets = AssetStore::new();
    let mut driver = FrameDriver::new(config.clone(), DebugTextBackend::new(), NullAudioBackend::new())?;
    demo::populate(driver.scene_mut(), &assets, bodies)?;
    *driver.camera_mut() = demo_camera();
    driver.start();
    for _ in 0..frames {
        driver.tick(dt)?;
    }
    let report = *driver.last_report();
    let hash = demo::state_hash(driver.scene());
    driver.shutdown();

    let stats = driver.stats();
    println!(
        "Frames: {}, sub-steps: {}, dropped: {:.4}s, sleeping: {}, draws: {}",
        stats.frames, stats.sub_steps, stats.dropped_time, report.physics.sleeping, report.submit.submitted
    );
    Ok(hash)
}

fn run(
    config: EngineConfig,
    seconds: f64,
    fps: u32,
    bodies: usize,
    mesh: Option<PathBuf>,
    dump: bool,
) -> anyhow::Result<()> {
    let assets = Arc::new(AssetStore::new());
    let mut driver = FrameDriver::new(config, DebugTextBackend::new(), NullAudioBackend::new())?;
    let scene = demo::populate(driver.scene_mut(), &assets, bodies)?;
    *driver.camera_mut() = demo_camera();
    if let Some(&first) = scene.balls.first() {
        driver.set_listener(Some(first));
    }

    let loader = match (mesh, scene.balls.first(), driver.take_handoff_sender()) {
        (Some(path), Some(&target), Some(sender)) => {
            let material = assets.register_material("loaded", [1.0, 0.8, 0.2, 1.0], BlendMode::Opaque);
            Some(assets.spawn_mesh_load(path, target, material, sender))
        }
        _ => None,
    };

    let shutdown = driver.shutdown_handle();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs_f64(seconds.max(0.0)));
        shutdown.request();
    });

    let interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
    let stats = driver.run(Some(interval))?;

    if let Some(loader) = loader {
        match loader.join() {
            Ok(Ok(handle)) => println!("Background mesh {:016x} delivered", handle.0),
            Ok(Err(e)) => println!("Background load failed: {e}"),
            Err(_) => println!("Background loader panicked"),
        }
    }
    if dump {
        println!("{}", driver.render_backend().last_frame());
    }
    println!("{}", serde_json::to_string_pretty(&stats)?);
    for name in driver.timers().names() {
        println!("{name}: avg {:?}", driver.timers().average(name));
    }
    Ok(())
}

fn drop_test(config: EngineConfig, height: f32, seconds: f32, gravity: f32) -> anyhow::Result<()> {
    let frames = (seconds * 60.0).round() as u32;
    let config = EngineConfig {
        fixed_step: 1.0 / 60.0,
        max_sub_steps_per_frame: frames.max(1),
        gravity: Vec3::new(0.0, -gravity, 0.0),
        sleep: SleepConfig {
            steps: 0,
            ..config.sleep
        },
        ..config
    };
    let mut driver = FrameDriver::new(config, DebugTextBackend::new(), NullAudioBackend::new())?;
    let ball = driver
        .scene_mut()
        .spawn(Transform::from_position(Vec3::new(0.0, height, 0.0)))?;
    driver
        .scene_mut()
        .attach(ball, RigidBodyState::dynamic(CollisionShape::Sphere { radius: 0.5 }, 1.0))?;
    driver.start();
    for _ in 0..frames {
        driver.tick(1.0 / 60.0)?;
    }
    let simulated = driver
        .scene()
        .get::<Transform>(ball)
        .map(|t| t.position.y)
        .context("body vanished during the drop")?;
    let analytic = height - 0.5 * gravity * seconds * seconds;
    driver.shutdown();
    println!("Drop test: height={height}, seconds={seconds}, gravity={gravity}");
    println!("Simulated: {simulated:.4}");
    println!("Analytic:  {analytic:.4}");
    println!("Error:     {:.6}", (simulated - analytic).abs());
    Ok(())
}
