//! Export pipeline: one source photo in, one ZIP of posters out.
//!
//! ```text
//! Idle → Validating → Rendering(i/N) → Archiving → Done
//!            │               │              │
//!            └───────────────┴──────────────┴──→ Failed
//! ```
//!
//! 1. **Validate**: at least one target and one format.
//! 2. **Gate**: targets that would need upscaling are skipped and reported;
//!    if none survive the run stops.
//! 3. **Render**: each achievable target is rendered once and encoded once
//!    per format, PNG before JPEG, with 300 DPI stamped in. Targets render in
//!    parallel on the rayon pool; results are collected in selection order.
//! 4. **Archive**: the artifacts are packaged into `{name}_posters.zip`.
//!
//! Progress goes out as [`ExportEvent`]s over an optional channel: 0–90% while
//! rendering, 90–100% while archiving. Any fatal error aborts the whole run
//! and no archive is returned.

use crate::archive::{Archive, ArchiveError, Archiver};
use crate::imaging::quality::partition;
use crate::imaging::{
    BackendError, EncodeSettings, PlacementPlan, RasterBackend, SourceImage, encode_artifact,
    plan_target, render_target,
};
use crate::naming;
use crate::preview::{CARD_MAX_DIM, Preview, preview};
use crate::types::{OutputArtifact, OutputFormat, Size, SkipRecord, TargetSpec};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Share of the progress bar given to rendering; archiving gets the rest.
const RENDER_SHARE: f64 = 90.0;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{0}")]
    Validation(&'static str),
    #[error(
        "The source image is too small for every selected ratio ({} skipped). Use a larger image or switch to fit or mat.",
        .skipped.len()
    )]
    NothingAchievable { skipped: Vec<SkipRecord> },
    #[error(transparent)]
    Encoding(#[from] BackendError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("Export cancelled")]
    Cancelled,
}

/// Where a run is. Read it with [`Exporter::state`], or from another thread
/// during a run through [`Exporter::state_handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Validating,
    Rendering { done: usize, total: usize },
    Archiving,
    Done,
    Failed,
}

/// Progress events sent while an export runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    /// A target was dropped by the quality gate.
    Skipped(SkipRecord),
    /// Overall progress in percent with a status line.
    Progress { percent: u8, message: String },
    /// One file finished encoding.
    ArtifactReady { filename: String, bytes: usize },
}

/// Cooperative cancellation flag. Checked between artifacts, never mid-render.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Shared view of an exporter's [`ExportState`], readable while `run` holds
/// the exporter mutably.
#[derive(Debug, Clone)]
pub struct StateHandle(Arc<Mutex<ExportState>>);

impl StateHandle {
    fn new(state: ExportState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub fn get(&self) -> ExportState {
        *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set(&self, state: ExportState) {
        *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }
}

/// What to export. Owned snapshot: later edits to the caller's targets do
/// not affect a run in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    /// In selection order.
    pub targets: Vec<TargetSpec>,
    pub formats: Vec<OutputFormat>,
    /// Raw export name; sanitized before use.
    pub export_name: String,
}

/// One target that passed the gate, with everything needed to render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedTarget {
    pub target: TargetSpec,
    pub placement: PlacementPlan,
    /// Thumbnail geometry at [`CARD_MAX_DIM`].
    pub preview: Preview,
    /// One filename per format, in format order.
    pub filenames: Vec<String>,
}

/// The validated, gated plan for a run. Also what `plan` prints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPlan {
    pub source_size: Size,
    pub export_name: String,
    pub archive_filename: String,
    pub formats: Vec<OutputFormat>,
    pub targets: Vec<PlannedTarget>,
    pub skipped: Vec<SkipRecord>,
}

impl ExportPlan {
    pub fn artifact_count(&self) -> usize {
        self.targets.len() * self.formats.len()
    }
}

/// A finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub archive: Archive,
    /// Filenames in archive order.
    pub files: Vec<String>,
    pub skipped: Vec<SkipRecord>,
}

/// Validate a request and run the quality gate without rendering anything.
pub fn plan_export(source: &SourceImage, request: &ExportRequest) -> Result<ExportPlan, ExportError> {
    if request.formats.is_empty() {
        return Err(ExportError::Validation("Select at least one output format"));
    }
    if request.targets.is_empty() {
        return Err(ExportError::Validation("Select at least one poster ratio"));
    }

    let mut formats = request.formats.clone();
    formats.sort();
    formats.dedup();

    let mut targets: Vec<TargetSpec> = Vec::with_capacity(request.targets.len());
    for target in &request.targets {
        let duplicate = targets
            .iter()
            .any(|t| t.filename_tag == target.filename_tag && t.mode == target.mode);
        if duplicate {
            log::debug!("ignoring duplicate target {}", target.id);
        } else {
            targets.push(target.clone());
        }
    }

    let export_name = naming::sanitize(&request.export_name);
    let (achievable, skipped) = partition(source.size(), &targets);
    if achievable.is_empty() {
        return Err(ExportError::NothingAchievable { skipped });
    }

    let targets = achievable
        .into_iter()
        .map(|target| PlannedTarget {
            placement: plan_target(source, &target),
            preview: preview(source.size(), &target, CARD_MAX_DIM),
            filenames: formats
                .iter()
                .map(|&f| naming::artifact_filename(&export_name, &target, f))
                .collect(),
            target,
        })
        .collect();

    Ok(ExportPlan {
        source_size: source.size(),
        archive_filename: naming::archive_filename(&export_name),
        export_name,
        formats,
        targets,
        skipped,
    })
}

/// Drives export runs against a raster backend and an archiver.
///
/// `run` takes `&mut self`, so one exporter never has two runs in flight.
pub struct Exporter<B, A> {
    backend: B,
    archiver: A,
    settings: EncodeSettings,
    cancel: CancelToken,
    state: StateHandle,
}

impl<B: RasterBackend, A: Archiver> Exporter<B, A> {
    pub fn new(backend: B, archiver: A, settings: EncodeSettings) -> Self {
        Self {
            backend,
            archiver,
            settings,
            cancel: CancelToken::new(),
            state: StateHandle::new(ExportState::Idle),
        }
    }

    pub fn state(&self) -> ExportState {
        self.state.get()
    }

    /// A handle that reads the state from another thread, including the
    /// `Rendering { done, total }` counter while a run is in flight.
    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    /// A handle that cancels the current run from another thread.
    ///
    /// The flag is cleared when a run ends, so a cancel issued between runs
    /// applies to the next one only.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run a full export.
    ///
    /// Validation errors leave the exporter `Idle`. Every other error leaves it
    /// `Failed` and produces no archive.
    pub fn run(
        &mut self,
        source: &SourceImage,
        request: &ExportRequest,
        events: Option<Sender<ExportEvent>>,
    ) -> Result<ExportOutcome, ExportError> {
        self.state.set(ExportState::Validating);
        let plan = match plan_export(source, request) {
            Ok(plan) => plan,
            Err(e @ ExportError::Validation(_)) => {
                self.state.set(ExportState::Idle);
                return Err(e);
            }
            Err(e) => {
                self.state.set(ExportState::Failed);
                return Err(e);
            }
        };

        let result = self.execute(source, &plan, events.as_ref());
        self.cancel.reset();
        self.state.set(match &result {
            Ok(_) => ExportState::Done,
            Err(_) => ExportState::Failed,
        });
        if let Err(e) = &result {
            log::warn!("export failed: {e}");
        }
        result
    }

    fn execute(
        &mut self,
        source: &SourceImage,
        plan: &ExportPlan,
        events: Option<&Sender<ExportEvent>>,
    ) -> Result<ExportOutcome, ExportError> {
        let emit = |event: ExportEvent| {
            if let Some(tx) = events {
                let _ = tx.send(event);
            }
        };

        for record in &plan.skipped {
            emit(ExportEvent::Skipped(record.clone()));
        }

        let total = plan.artifact_count();
        log::info!(
            "exporting {total} files from {} source as {}",
            plan.source_size,
            plan.archive_filename
        );
        emit(ExportEvent::Progress {
            percent: 0,
            message: start_message(total),
        });
        self.state.set(ExportState::Rendering { done: 0, total });

        let progress = RenderProgress {
            done: Mutex::new(0),
            total,
            events,
            state: &self.state,
        };
        let backend = &self.backend;
        let settings = &self.settings;
        let cancel = &self.cancel;

        let per_target: Vec<Vec<OutputArtifact>> = plan
            .targets
            .par_iter()
            .map(|planned| {
                render_planned(backend, source, planned, &plan.formats, settings, cancel, &progress)
            })
            .collect::<Result<_, _>>()?;
        let artifacts: Vec<OutputArtifact> = per_target.into_iter().flatten().collect();

        if self.cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        self.state.set(ExportState::Archiving);
        emit(ExportEvent::Progress {
            percent: RENDER_SHARE as u8,
            message: "Creating ZIP archive…".into(),
        });
        let bytes = self.archiver.package(&artifacts, &mut |fraction| {
            emit(ExportEvent::Progress {
                percent: archive_percent(fraction),
                message: "Compressing ZIP…".into(),
            });
        })?;
        emit(ExportEvent::Progress {
            percent: 100,
            message: "Done!".into(),
        });

        Ok(ExportOutcome {
            archive: Archive {
                filename: plan.archive_filename.clone(),
                bytes,
            },
            files: artifacts.into_iter().map(|a| a.filename).collect(),
            skipped: plan.skipped.clone(),
        })
    }
}

/// Shared completion counter for parallel renders.
struct RenderProgress<'a> {
    done: Mutex<usize>,
    total: usize,
    events: Option<&'a Sender<ExportEvent>>,
    state: &'a StateHandle,
}

impl RenderProgress<'_> {
    /// Announce an artifact about to be encoded, at the current completed share.
    fn starting(&self, message: String) {
        let Some(tx) = self.events else { return };
        // Lock held across send so percentages arrive in order
        let Ok(done) = self.done.lock() else { return };
        let _ = tx.send(ExportEvent::Progress {
            percent: render_percent(*done, self.total),
            message,
        });
    }

    fn finished(&self, artifact: &OutputArtifact) {
        if let Ok(mut done) = self.done.lock() {
            *done += 1;
            self.state.set(ExportState::Rendering {
                done: *done,
                total: self.total,
            });
        }
        if let Some(tx) = self.events {
            let _ = tx.send(ExportEvent::ArtifactReady {
                filename: artifact.filename.clone(),
                bytes: artifact.bytes.len(),
            });
        }
    }
}

/// Render one target and encode it in every format.
fn render_planned(
    backend: &impl RasterBackend,
    source: &SourceImage,
    planned: &PlannedTarget,
    formats: &[OutputFormat],
    settings: &EncodeSettings,
    cancel: &CancelToken,
    progress: &RenderProgress<'_>,
) -> Result<Vec<OutputArtifact>, ExportError> {
    if cancel.is_cancelled() {
        return Err(ExportError::Cancelled);
    }
    let target = &planned.target;
    let canvas = render_target(backend, source, target)?;

    let mut artifacts = Vec::with_capacity(formats.len());
    for (&format, filename) in formats.iter().zip(&planned.filenames) {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        progress.starting(artifact_message(target, format));
        let artifact = encode_artifact(backend, &canvas, format, filename.clone(), settings)?;
        progress.finished(&artifact);
        artifacts.push(artifact);
    }
    Ok(artifacts)
}

/// `"Starting export (3 files)…"`
pub fn start_message(count: usize) -> String {
    let noun = if count == 1 { "file" } else { "files" };
    format!("Starting export ({count} {noun})…")
}

/// `"Processing 4:5 Portrait PNG (7200×9000)…"`
pub fn artifact_message(target: &TargetSpec, format: OutputFormat) -> String {
    format!(
        "Processing {} {} ({})…",
        target.label,
        format.label(),
        target.size
    )
}

/// Completed share of rendering, scaled into 0–90.
pub fn render_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let fraction = done.min(total) as f64 / total as f64;
    (fraction * RENDER_SHARE).round() as u8
}

/// Archive progress fraction, scaled into 90–100.
pub fn archive_percent(fraction: f64) -> u8 {
    let fraction = fraction.clamp(0.0, 1.0);
    (RENDER_SHARE + (fraction * (100.0 - RENDER_SHARE)).round()) as u8
}

/// Write a finished archive into `dir`.
///
/// The bytes go to a `.part` file that is renamed into place, so an
/// interrupted write never leaves a half-written ZIP under the final name.
/// The `.part` file is removed when the write or the rename fails.
pub fn save_archive(dir: &Path, archive: &Archive) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&archive.filename);
    let partial = dir.join(format!("{}.part", archive.filename));
    let written = std::fs::write(&partial, &archive.bytes)
        .and_then(|()| std::fs::rename(&partial, &path));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }
    Ok(path)
}
