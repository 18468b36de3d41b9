use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for framecore")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests, then the determinism check
    Ci,
    /// cargo fmt --check
    Fmt,
    /// clippy with warnings denied
    Clippy,
    /// All workspace tests
    Test,
    /// Integrator benchmarks (release)
    Bench,
    /// Simulate the demo scene twice and require identical state hashes
    Determinism {
        #[arg(long, default_value = "600")]
        frames: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci => {
            cargo(&["fmt", "--all", "--", "--check"], "fmt")?;
            cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"], "clippy")?;
            cargo(&["test", "--workspace"], "tests")?;
            determinism(600)?;
        }
        Commands::Fmt => cargo(&["fmt", "--all", "--", "--check"], "fmt")?,
        Commands::Clippy => cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"], "clippy")?,
        Commands::Test => cargo(&["test", "--workspace"], "tests")?,
        Commands::Bench => cargo(
            &["bench", "-p", "framecore-physics", "--bench", "bench_integrator"],
            "bench",
        )?,
        Commands::Determinism { frames } => determinism(frames)?,
    }

    Ok(())
}

fn cargo(args: &[&str], what: &str) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("{what} failed");
    }
    Ok(())
}

fn determinism(frames: u32) -> Result<()> {
    let frames = frames.to_string();
    let args = [
        "run", "--release", "-q", "-p", "framecore-cli", "--", "simulate", "--verify", "--frames", &frames,
    ];
    println!("==> cargo {}", args.join(" "));
    let output = Command::new("cargo").args(args).output()?;
    if !output.status.success() {
        bail!("simulate failed: {}", String::from_utf8_lossy(&output.stderr));
    }
    let stdout = String::from_utf8(output.stdout).context("simulate printed non-UTF-8")?;
    print!("{stdout}");
    if !stdout.lines().any(|l| l.trim() == "Match: OK") {
        bail!("simulation is not deterministic");
    }
    Ok(())
}
