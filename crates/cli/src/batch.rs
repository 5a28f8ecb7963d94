use crate::settings::RunConfig;
use anyhow::{Context, Result};
use contractgen_splice::{
    annotated_functions, apply_patch, is_annotated, strip_code_fence, PatchReport,
};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Annotated,
    /// Descriptor matched no function; the source is left as it was
    NothingAnnotated,
    MissingSource,
    AlreadyAnnotated,
    MissingDescriptor,
    Failed,
}

/// Outcome of one configured file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub file_id: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub files: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.count(FileStatus::Failed)
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}

/// Artifact names derived from a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub copy: PathBuf,
    pub descriptor: PathBuf,
    pub annotated: PathBuf,
    pub harnesses: PathBuf,
}

impl Artifacts {
    pub fn new(target_dir: &Path, file_id: &str) -> Self {
        Self {
            copy: target_dir.join(format!("{file_id}.rs")),
            descriptor: target_dir.join(format!("{file_id}_contracts.rs")),
            annotated: target_dir.join(format!("{file_id}_annotated.rs")),
            harnesses: target_dir.join(format!("{file_id}_harnesses.rs")),
        }
    }
}

/// `library/core/src/cell.rs` under `source_dir` becomes `library-core-src-cell`
pub fn file_id(source: &Path, source_dir: &Path) -> String {
    let relative = source.strip_prefix(source_dir).unwrap_or(source);
    let relative = relative.with_extension("");
    relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("-")
}

pub fn run(config: &RunConfig) -> Result<BatchSummary> {
    fs::create_dir_all(&config.target_dir).with_context(|| {
        format!("Failed to create target dir {}", config.target_dir.display())
    })?;

    let mut summary = BatchSummary::default();
    for source in &config.files_to_annotate {
        let file_id = file_id(source, &config.source_dir);
        let outcome = match annotate_file(config, source, &file_id) {
            Ok((status, report)) => FileOutcome {
                source: source.clone(),
                file_id,
                status,
                report,
                error: None,
            },
            Err(err) => {
                log::error!("{}: {err:#}", source.display());
                FileOutcome {
                    source: source.clone(),
                    file_id,
                    status: FileStatus::Failed,
                    report: None,
                    error: Some(format!("{err:#}")),
                }
            }
        };
        summary.files.push(outcome);
    }

    log::info!(
        "batch finished: {} annotated, {} skipped, {} failed",
        summary.count(FileStatus::Annotated),
        summary.files.len() - summary.count(FileStatus::Annotated) - summary.failed(),
        summary.failed()
    );
    Ok(summary)
}

fn annotate_file(
    config: &RunConfig,
    source: &Path,
    file_id: &str,
) -> Result<(FileStatus, Option<PatchReport>)> {
    if !source.is_file() {
        log::warn!("{}: source file not found, skipping", source.display());
        return Ok((FileStatus::MissingSource, None));
    }

    let text = fs::read_to_string(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    if is_annotated(&text, &config.splice)? {
        log::warn!("{}: already annotated, skipping", source.display());
        return Ok((FileStatus::AlreadyAnnotated, None));
    }

    let artifacts = Artifacts::new(&config.target_dir, file_id);
    fs::write(&artifacts.copy, &text)
        .with_context(|| format!("Failed to copy source to {}", artifacts.copy.display()))?;

    if !artifacts.descriptor.is_file() {
        log::warn!(
            "{}: no generated contracts at {}, skipping",
            source.display(),
            artifacts.descriptor.display()
        );
        return Ok((FileStatus::MissingDescriptor, None));
    }

    let descriptor = fs::read_to_string(&artifacts.descriptor)
        .with_context(|| format!("Failed to read {}", artifacts.descriptor.display()))?;
    let stripped = strip_code_fence(&descriptor);
    if stripped.len() != descriptor.len() {
        fs::write(&artifacts.descriptor, stripped).with_context(|| {
            format!("Failed to rewrite {}", artifacts.descriptor.display())
        })?;
    }
    log::debug!(
        "{file_id}: descriptor lists {} functions",
        annotated_functions(stripped).len()
    );

    let report = apply_patch(
        &artifacts.copy,
        &artifacts.descriptor,
        &artifacts.annotated,
        &config.splice,
    )?;

    // harnesses prove contracts, so they only go with an annotated file
    if report.inserted_lines == 0 {
        log::warn!(
            "{}: no contract was placed, skipping harnesses and update",
            source.display()
        );
        return Ok((FileStatus::NothingAnnotated, Some(report)));
    }

    if artifacts.harnesses.is_file() {
        append_harnesses(&artifacts.harnesses, &artifacts.annotated)?;
    }

    if config.update_source {
        fs::copy(&artifacts.annotated, source)
            .with_context(|| format!("Failed to update {}", source.display()))?;
        log::info!("{}: source updated", source.display());
    }

    Ok((FileStatus::Annotated, Some(report)))
}

fn append_harnesses(harnesses: &Path, annotated: &Path) -> Result<()> {
    let text = fs::read_to_string(harnesses)
        .with_context(|| format!("Failed to read {}", harnesses.display()))?;
    let mut file = OpenOptions::new()
        .append(true)
        .open(annotated)
        .with_context(|| format!("Failed to open {}", annotated.display()))?;
    file.write_all(text.as_bytes())
        .with_context(|| format!("Failed to append harnesses to {}", annotated.display()))?;
    log::debug!("appended {} to {}", harnesses.display(), annotated.display());
    Ok(())
}
