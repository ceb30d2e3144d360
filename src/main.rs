use date_matchmaker::config::{LoggingSettings, Settings};
use date_matchmaker::models::{MatchReport, ParticipantRow};
use date_matchmaker::services::{ExportError, MicroLpSolver, MilpSolver, ReportWriter, SolveOptions};
use date_matchmaker::{MatchError, Matchmaker};
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum AppError {
    #[error("Failed to read participants from {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse participants: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Matching(#[from] MatchError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

fn init_logging(logging: &LoggingSettings) {
    // LOG_LEVEL / LOG_FORMAT win over the config file
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match log_format.as_str() {
        "json" => subscriber.json().init(),
        "pretty" => subscriber.pretty().init(),
        _ => subscriber.init(),
    }
}

fn run(settings: &Settings) -> Result<bool, AppError> {
    let path = &settings.input.participants_path;
    info!("Reading participants from {}", path.display());
    let file = File::open(path).map_err(|source| AppError::Input {
        path: path.display().to_string(),
        source,
    })?;
    let mut rows: Vec<ParticipantRow> = serde_json::from_reader(BufReader::new(file))?;
    info!("Loaded {} responses.", rows.len());

    if let Some(limit) = settings.input.limit {
        info!("Limiting to {} entries for testing", limit);
        rows.truncate(limit);
    }

    let matchmaker = Matchmaker::from_rows(&rows, settings.matching.params())?;

    let writer = ReportWriter::new(&settings.output.dir);
    if settings.output.write_lp {
        writer.write_lp(matchmaker.model(), "date_matching.lp")?;
    }

    let solver = MicroLpSolver::new();
    let options = SolveOptions {
        time_limit: settings.solver.time_limit(),
    };
    let outcome = matchmaker.solve(&solver, &options)?;

    if !outcome.is_optimal() {
        warn!(
            "Solver finished with status {}: {}",
            outcome.status,
            outcome.message.as_deref().unwrap_or("no diagnostic")
        );
    }

    let report = MatchReport::build(solver.name(), matchmaker.persons(), matchmaker.model(), &outcome);
    writer.write_text(&report)?;
    if settings.output.write_json {
        writer.write_json(&report)?;
    }

    for (pair, count) in &report.gender_pairs {
        info!("{}: {}", pair, count);
    }

    Ok(outcome.solution.is_some())
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings.logging);

    info!("Starting date matchmaker...");

    match run(&settings) {
        Ok(true) => {
            info!("Matching process complete!");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            error!("Matching finished without an assignment");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Error during matching process: {}", e);
            ExitCode::FAILURE
        }
    }
}
