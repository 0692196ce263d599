use anyhow::{Context, Result};
use clap::Parser;
use plaza_app::{
    ScriptedDriver, SessionFile, bootstrap_engine, create_command_bus, load_session_file,
    make_command_submit, run_session,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "plaza-app",
    version,
    about = "Run a scripted headless presence session"
)]
struct Cli {
    /// JSON session file with optional `config` and `layout` sections.
    #[arg(long, env = "PLAZA_LAYOUT")]
    layout: Option<PathBuf>,

    /// Number of ticks to simulate.
    #[arg(long, env = "PLAZA_TICKS", default_value_t = 600)]
    ticks: u64,

    /// Seed for the simulated remote avatars.
    #[arg(long, env = "PLAZA_SEED", default_value_t = 0x5EED_CAFE)]
    seed: u64,

    /// Capacity of the session command bus.
    #[arg(long, default_value_t = 256)]
    queue_capacity: usize,

    /// Print the final session report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let file = match &cli.layout {
        Some(path) => load_session_file(path)?,
        None => SessionFile::default(),
    };
    let (mut engine, remotes) = bootstrap_engine(file)?;
    let (sender, receiver) = create_command_bus(cli.queue_capacity);
    let submit = make_command_submit(sender);
    let mut driver = ScriptedDriver::new(cli.seed, remotes);

    let report = run_session(&mut engine, &receiver, &submit, &mut driver, cli.ticks);
    info!(
        ticks = report.ticks,
        commands = report.commands_applied,
        peak_nearby = report.peak_nearby,
        location = %report.snapshot.location.label,
        visited = ?report.locations_visited,
        "session finished",
    );

    if cli.json {
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialise session report")?;
        println!("{json}");
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
