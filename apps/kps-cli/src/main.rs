mod error;

use clap::{Parser, Subcommand};
use error::{CliError, CliResult};
use kps_config::{ModelKind, Settings};
use kps_model::{KiteModel, KiteSystem};
use kps_sim::{KiteOutput, SimOptions, SimRecord, run_sim};
use kps_solver::{SteadyConfig, SteadySolution, find_steady_state};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kps-cli")]
#[command(about = "Kite power system model - steady state and transient simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a settings file
    Validate {
        /// Path to the settings YAML or JSON file
        settings_path: PathBuf,
    },
    /// Find the steady state of the configured kite
    Steady {
        /// Path to the settings YAML or JSON file
        settings_path: PathBuf,
    },
    /// Run a transient simulation starting from the steady state
    Simulate {
        /// Path to the settings YAML or JSON file
        settings_path: PathBuf,
        /// Time step in seconds
        #[arg(long, default_value_t = 0.05)]
        dt: f64,
        /// End time in seconds
        #[arg(long)]
        t_end: f64,
        /// Reel-out speed applied at t = 0 (m/s)
        #[arg(long)]
        v_reel_out: Option<f64>,
        /// Relative steering input applied at t = 0, -1..1
        #[arg(long)]
        steering: Option<f64>,
        /// Print every N-th step
        #[arg(long, default_value_t = 1)]
        record_every: usize,
        /// Write the full record as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { settings_path } => cmd_validate(&settings_path),
        Commands::Steady { settings_path } => cmd_steady(&settings_path),
        Commands::Simulate {
            settings_path,
            dt,
            t_end,
            v_reel_out,
            steering,
            record_every,
            output,
        } => cmd_simulate(
            &settings_path,
            SimOptions {
                dt,
                t_end,
                record_every,
                min_dt: SimOptions::default().min_dt.min(dt),
                ..SimOptions::default()
            },
            v_reel_out,
            steering,
            output.as_deref(),
        ),
    }
}

fn model_name(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::OnePoint => "one-point",
        ModelKind::FourPoint => "four-point",
        ModelKind::ThreeLine => "three-line",
    }
}

fn cmd_validate(settings_path: &Path) -> CliResult<()> {
    println!("Validating settings: {}", settings_path.display());
    let settings = kps_config::load(settings_path)?;
    println!(
        "✓ Settings are valid ({} model, {} segments)",
        model_name(settings.system.model),
        settings.system.segments
    );
    Ok(())
}

fn solve_steady(settings: &Settings) -> CliResult<(KiteSystem, SteadySolution)> {
    let mut model = KiteSystem::from_settings(settings)?;
    let solution = find_steady_state(&mut model, &SteadyConfig::from(&settings.solver))?;
    Ok((model, solution))
}

fn cmd_steady(settings_path: &Path) -> CliResult<()> {
    let settings = kps_config::load(settings_path)?;
    println!(
        "Solving steady state of the {} model",
        model_name(settings.system.model)
    );

    let (model, solution) = solve_steady(&settings)?;
    println!(
        "✓ Converged in {} iterations (residual {:.3e})",
        solution.iterations, solution.residual_norm
    );

    let forces = model.winch_forces();
    let lengths = model.tether_lengths();
    for (line, (force, length)) in forces.iter().zip(lengths).enumerate() {
        println!("  line {line}: tension {force:10.2} N, length {length:8.3} m");
    }
    let (lift, drag) = model.lift_drag();
    println!("  lift {lift:10.2} N");
    println!("  drag {drag:10.2} N");
    if drag > 0.0 {
        println!("  L/D  {:10.3}", lift / drag);
    }
    if let Some(kite) = model.positions().get(model.layout().apex()) {
        println!(
            "  kite at x = {:.2} m, y = {:.2} m, z = {:.2} m",
            kite.x, kite.y, kite.z
        );
    }
    Ok(())
}

fn cmd_simulate(
    settings_path: &Path,
    opts: SimOptions,
    v_reel_out: Option<f64>,
    steering: Option<f64>,
    output: Option<&Path>,
) -> CliResult<()> {
    if let Some(u) = steering.filter(|u| !(-1.0..=1.0).contains(u)) {
        return Err(CliError::InvalidInput(format!("steering {u} outside -1..1")));
    }

    let settings = kps_config::load(settings_path)?;
    let (mut model, steady) = solve_steady(&settings)?;
    if let Some(v) = v_reel_out {
        model.set_v_reel_out(v, 0.0);
    }
    if let Some(u) = steering {
        model.set_steering(u);
    }

    println!(
        "Simulating the {} model: dt = {:.3} s, t_end = {:.3} s",
        model_name(settings.system.model),
        opts.dt,
        opts.t_end
    );
    let record = run_sim(&mut model, &steady.y0, &steady.yd0, &opts)?;
    info!(records = record.t.len(), "simulation recorded");

    print_table(&record);
    if let Some(path) = output {
        write_csv(path, &record)?;
        println!("✓ Record written to {}", path.display());
    }
    Ok(())
}

fn print_table(record: &SimRecord<KiteOutput>) {
    let lines = record
        .outputs
        .first()
        .map_or(0, |out| out.winch_forces.len());
    let mut header = format!("{:>8}", "t [s]");
    for line in 0..lines {
        header.push_str(&format!(" {:>12}", format!("F{line} [N]")));
    }
    header.push_str(&format!(" {:>10} {:>10} {:>10}", "L [m]", "lift [N]", "drag [N]"));
    println!("{header}");

    for (t, out) in record.t.iter().zip(&record.outputs) {
        let mut row = format!("{t:8.3}");
        for force in &out.winch_forces {
            row.push_str(&format!(" {force:12.2}"));
        }
        let length = out.tether_lengths.last().copied().unwrap_or(0.0);
        row.push_str(&format!(" {length:10.3} {:10.2} {:10.2}", out.lift, out.drag));
        println!("{row}");
    }
}

fn write_csv(path: &Path, record: &SimRecord<KiteOutput>) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let lines = record
        .outputs
        .first()
        .map_or(0, |out| out.winch_forces.len());

    write!(out, "t")?;
    for line in 0..lines {
        write!(out, ",force_{line},length_{line}")?;
    }
    writeln!(out, ",lift,drag")?;

    for (t, o) in record.t.iter().zip(&record.outputs) {
        write!(out, "{t}")?;
        for (force, length) in o.winch_forces.iter().zip(&o.tether_lengths) {
            write!(out, ",{force},{length}")?;
        }
        writeln!(out, ",{},{}", o.lift, o.drag)?;
    }
    out.flush()
}
