use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::MatchModel;
use crate::models::MatchReport;

/// Errors that can occur while writing run artefacts
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Writes reports and model dumps into an output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn prepare(&self, file_name: &str) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir)?;
        Ok(self.dir.join(file_name))
    }

    /// Dump the assembled model in LP format
    pub fn write_lp(&self, model: &MatchModel, file_name: &str) -> Result<PathBuf, ExportError> {
        let path = self.prepare(file_name)?;
        let mut out = BufWriter::new(File::create(&path)?);
        model.write_lp(&mut out)?;
        out.flush()?;
        tracing::info!("Wrote model dump to {}", path.display());
        Ok(path)
    }

    pub fn write_text(&self, report: &MatchReport) -> Result<PathBuf, ExportError> {
        let file_name = format!("matches_{}.txt", timestamp(report));
        let path = self.prepare(&file_name)?;
        fs::write(&path, render_text(report))?;
        tracing::info!("Saving results to {}", path.display());
        Ok(path)
    }

    pub fn write_json(&self, report: &MatchReport) -> Result<PathBuf, ExportError> {
        let file_name = format!("matches_{}.json", timestamp(report));
        let path = self.prepare(&file_name)?;
        let out = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(out, report)?;
        tracing::info!("Saving results to {}", path.display());
        Ok(path)
    }
}

fn timestamp(report: &MatchReport) -> String {
    report.generated_at.format("%Y%m%d_%H%M%S").to_string()
}

/// Human-readable summary: pairs by day, who stayed unmatched, gender pairings
pub fn render_text(report: &MatchReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== MATCHES ===");
    let _ = writeln!(out, "Status: {}", report.status);
    if let Some(mean) = report.mean_score_per_participant {
        let _ = writeln!(out, "Mean score per person: {:.4}", mean);
    }
    let _ = writeln!(
        out,
        "Matched: {}/{}",
        report.matched_participants, report.participant_count
    );
    if let Some(message) = &report.message {
        let _ = writeln!(out, "Solver message: {}", message);
    }

    let _ = writeln!(out, "\n=== BY DAY ===");
    for (day, pairs) in &report.by_day {
        let _ = writeln!(out, "\n{} [{} pairs]:", day, pairs.len());
        for pair in pairs {
            let _ = writeln!(
                out,
                "{} - {} (Compatibility: {:.2}%)",
                pair.first.id,
                pair.second.id,
                pair.compatibility * 100.0
            );
        }
    }

    if !report.unmatched.is_empty() {
        let _ = writeln!(out, "\n=== UNMATCHED ===");
        for participant in &report.unmatched {
            let _ = writeln!(out, "{} ({})", participant.id, participant.name);
        }
    }

    let _ = writeln!(out, "\n=== GENDER PAIRINGS ===");
    for (pair, count) in &report.gender_pairs {
        let _ = writeln!(out, "{}: {}", pair, count);
    }

    out
}
