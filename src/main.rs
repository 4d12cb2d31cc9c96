use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[cfg(feature = "jsbsim")]
use ptfgen::{dataset, ffi};
use ptfgen::{config, report, PerformanceDataset};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "ptfgen")]
#[command(version)]
#[command(about = "Aircraft performance table generator driven by an external trim solver")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output path for the rendered report
    #[arg(short, long, global = true)]
    out: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full sweep and render the report
    Run,
    /// Render a report from an existing checkpoint without running the sweep
    Render,
    /// Validate a configuration file
    Validate,
    /// Print version information
    Version,
}

fn load_config(path: &str) -> Result<config::Root> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {path}"))?;
    let cfg: config::Root =
        toml::from_str(&text).with_context(|| format!("failed to parse config: {path}"))?;
    cfg.validate()?;
    Ok(cfg)
}

fn run_sweep(cfg: &config::Root, out_path: &str) -> Result<()> {
    let checkpoint = Path::new(&cfg.checkpoint.path);
    let data = if checkpoint.exists() {
        let data = PerformanceDataset::load(checkpoint)?;
        eprintln!(
            "[ptfgen] resuming from {} ({} of {} levels complete)",
            checkpoint.display(),
            data.flight_levels.iter().filter(|&&fl| data.level_complete(fl)).count(),
            data.flight_levels.len()
        );
        data
    } else {
        PerformanceDataset::new(cfg.flight_levels())
    };

    let start = Instant::now();
    let data = drive_oracle(cfg, data)?;
    eprintln!(
        "[ptfgen] sweep complete: {}/{} levels in {:.1}s",
        data.flight_levels.iter().filter(|&&fl| data.level_complete(fl)).count(),
        data.flight_levels.len(),
        start.elapsed().as_secs_f64()
    );

    write_report(&data, cfg, out_path)
}

#[cfg(feature = "jsbsim")]
fn drive_oracle(cfg: &config::Root, data: PerformanceDataset) -> Result<PerformanceDataset> {
    let mut fdm = ffi::FdmOracle::create(&cfg.aircraft.root_dir, &cfg.aircraft.model)
        .map_err(|e| anyhow::anyhow!("starting flight-dynamics backend: {e}"))?;
    dataset::build(&mut fdm, cfg, data)
}

#[cfg(not(feature = "jsbsim"))]
fn drive_oracle(_cfg: &config::Root, _data: PerformanceDataset) -> Result<PerformanceDataset> {
    anyhow::bail!("this binary was built without the jsbsim feature; rebuild with --features jsbsim")
}

fn run_render(cfg: &config::Root, out_path: &str) -> Result<()> {
    let data = PerformanceDataset::load(Path::new(&cfg.checkpoint.path))?;
    write_report(&data, cfg, out_path)
}

fn write_report(data: &PerformanceDataset, cfg: &config::Root, out_path: &str) -> Result<()> {
    let text = report::render(data, &cfg.dataset.name);
    fs::write(out_path, &text).with_context(|| format!("writing report {out_path}"))?;
    eprintln!("[ptfgen] report: {out_path}");
    Ok(())
}

fn validate_config(path: &str) -> Result<()> {
    let cfg = load_config(path)?;
    eprintln!("[ptfgen] config valid: {path}");
    eprintln!("  dataset: {}", cfg.dataset.name);
    eprintln!(
        "  sweep: FL{}..FL{} step {}",
        cfg.sweep.fl_min, cfg.sweep.fl_max, cfg.sweep.fl_step
    );
    eprintln!(
        "  solver: tol={} max_iter={} climb gamma [0, {}], descent gamma [{}, 0]",
        cfg.solver.tol, cfg.solver.max_iter, cfg.solver.climb_gamma_max, cfg.solver.descent_gamma_min
    );
    eprintln!("  checkpoint: {}", cfg.checkpoint.path);
    eprintln!(
        "  aircraft: {} weights {}/{}/{} lbs",
        cfg.aircraft.model,
        cfg.aircraft.weight_low_lbs,
        cfg.aircraft.weight_nom_lbs,
        cfg.aircraft.weight_high_lbs
    );
    Ok(())
}

fn print_version() {
    eprintln!("ptfgen - aircraft performance table generator");
    eprintln!();
    eprintln!("  Version:      {VERSION}");
    eprintln!("  Platform:     {}", std::env::consts::OS);
    eprintln!("  Architecture: {}", std::env::consts::ARCH);
    eprintln!(
        "  Backend:      {}",
        if cfg!(feature = "jsbsim") { "jsbsim (linked)" } else { "none (render/validate only)" }
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::Validate => {
            let cfg_path = args.config.context("--config required for validate")?;
            validate_config(&cfg_path)
        }
        Commands::Render => {
            let cfg_path = args.config.context("--config required")?;
            let out_path = args.out.unwrap_or_else(|| "report.ptf".to_string());
            let cfg = load_config(&cfg_path)?;
            run_render(&cfg, &out_path)
        }
        Commands::Run => {
            let cfg_path = args.config.context("--config required")?;
            let out_path = args.out.unwrap_or_else(|| "report.ptf".to_string());
            let cfg = load_config(&cfg_path)?;
            eprintln!("[ptfgen] v{VERSION} - {}", cfg.dataset.name);
            run_sweep(&cfg, &out_path)
        }
    }
}
