use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::calibration::ScaleCalibrator;
use crate::config::PipelineConfig;
use crate::detection::{BrightRegionDetector, RectangleOutlineDetector, ReferenceDetector, TargetDetector};
use crate::error::{LowConfidenceWarning, PipelineError, PipelineState};
use crate::estimation::DimensionEstimator;
use crate::loader::{Image, ImageLoader};
use crate::models::{
    CalibrationResult, Detection, DetectionResult, EstimationResult, LocationType, ReferenceSpec,
    ReferenceTable, ReferenceType,
};
use crate::overlay;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

/// Settings shared by every run of a pipeline
#[derive(Clone, Debug)]
pub struct PipelineContext {
    /// Budget for each blocking stage
    pub timeout: Option<Duration>,
    /// Run both detectors at the same time
    pub concurrent_detection: bool,
    pub debug: Option<DebugConfig>,
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct Analysis {
    pub estimate: EstimationResult,
    pub warning: Option<LowConfidenceWarning>,
    pub reference: Detection,
    pub target: Detection,
    pub calibration: CalibrationResult,
    /// States visited, in order, ending with [`PipelineState::Done`]
    pub states: Vec<PipelineState>,
}

/// Records the linear state sequence of one run
struct Run {
    states: Vec<PipelineState>,
}

impl Run {
    fn start() -> Self {
        Self { states: Vec::new() }
    }

    fn enter(&mut self, state: PipelineState) {
        tracing::debug!(%state, "pipeline state");
        self.states.push(state);
    }
}

/// Estimates window dimensions from a single photo.
///
/// The pipeline holds only immutable settings and shared detectors, so one instance can
/// serve any number of concurrent [`analyze`](Self::analyze) calls.
pub struct EstimationPipeline {
    loader: ImageLoader,
    reference_detector: Arc<dyn ReferenceDetector>,
    target_detector: Arc<dyn TargetDetector>,
    calibrator: ScaleCalibrator,
    estimator: DimensionEstimator,
    references: ReferenceTable,
    context: PipelineContext,
}

impl EstimationPipeline {
    /// Pipeline with the geometric detectors and the standard reference sizes
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            loader: ImageLoader::new(),
            reference_detector: Arc::new(BrightRegionDetector::new(config.reference.clone())),
            target_detector: Arc::new(RectangleOutlineDetector::new(config.target.clone())),
            calibrator: ScaleCalibrator::new(config.calibration.clone()),
            estimator: DimensionEstimator::new(config.estimation.clone()),
            references: ReferenceTable::standard(),
            context: PipelineContext {
                timeout: config.timeout(),
                concurrent_detection: config.concurrent_detection,
                debug: None,
            },
        }
    }

    pub fn with_reference_detector(mut self, detector: Arc<dyn ReferenceDetector>) -> Self {
        self.reference_detector = detector;
        self
    }

    pub fn with_target_detector(mut self, detector: Arc<dyn TargetDetector>) -> Self {
        self.target_detector = detector;
        self
    }

    /// Replace the reference sizes, e.g. with the ones kept in the request store
    pub fn with_references(mut self, references: ReferenceTable) -> Self {
        self.references = references;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.context.timeout = timeout;
        self
    }

    pub fn with_concurrent_detection(mut self, concurrent: bool) -> Self {
        self.context.concurrent_detection = concurrent;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        // Check if directory exists and is empty
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            // Create directory if it doesn't exist
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    /// Load the photo at `image_path` and estimate the window size.
    ///
    /// `location_type` and `reference_type` use their stored string codes
    /// (`"frame"`, `"A4"`, ...).
    pub async fn analyze<P: AsRef<Path>>(
        &self,
        image_path: P,
        location_type: &str,
        reference_type: &str,
    ) -> Result<Analysis, PipelineError> {
        let path = image_path.as_ref().to_path_buf();
        let location: LocationType = location_type
            .parse()
            .map_err(|e: anyhow::Error| PipelineError::InvalidInput(e.to_string()))?;
        let reference_type: ReferenceType = reference_type
            .parse()
            .map_err(|e: anyhow::Error| PipelineError::InvalidInput(e.to_string()))?;
        let spec = self.reference_spec(reference_type)?;

        let mut run = Run::start();
        run.enter(PipelineState::Loading);
        let loader = self.loader;
        let load_path = path.clone();
        let loaded = self
            .run_stage(PipelineState::Loading, move || loader.load(&load_path))
            .await
            .and_then(|result| result);

        let result = match loaded {
            Ok(image) => self.run_loaded(Arc::new(image), location, spec, run).await,
            Err(e) => Err(e),
        };
        log_outcome(&path, &result);
        result
    }

    /// Same as [`analyze`](Self::analyze) for a photo that is already in memory
    pub async fn analyze_image(
        &self,
        image: Image,
        location: LocationType,
        reference_type: ReferenceType,
    ) -> Result<Analysis, PipelineError> {
        let spec = self.reference_spec(reference_type)?;
        let source = image.source().to_path_buf();
        let mut run = Run::start();
        run.enter(PipelineState::Loading);
        let result = self.run_loaded(Arc::new(image), location, spec, run).await;
        log_outcome(&source, &result);
        result
    }

    fn reference_spec(&self, reference_type: ReferenceType) -> Result<ReferenceSpec, PipelineError> {
        self.references.get(reference_type).copied().ok_or_else(|| {
            PipelineError::InvalidInput(format!("no reference size known for {}", reference_type))
        })
    }

    async fn run_loaded(
        &self,
        image: Arc<Image>,
        location: LocationType,
        spec: ReferenceSpec,
        mut run: Run,
    ) -> Result<Analysis, PipelineError> {
        let ref_work = {
            let detector = self.reference_detector.clone();
            let image = image.clone();
            move || detector.detect(&image, &spec)
        };
        let target_work = {
            let detector = self.target_detector.clone();
            let image = image.clone();
            move || detector.detect(&image, location)
        };

        run.enter(PipelineState::DetectingReference);
        run.enter(PipelineState::DetectingTarget);
        let (reference, target) = if self.context.concurrent_detection {
            let (reference, target) = tokio::join!(
                self.run_stage(PipelineState::DetectingReference, ref_work),
                self.run_stage(PipelineState::DetectingTarget, target_work),
            );
            (found(PipelineState::DetectingReference, reference?)?, target?)
        } else {
            let reference = self.run_stage(PipelineState::DetectingReference, ref_work).await?;
            let reference = found(PipelineState::DetectingReference, reference)?;
            let target = self.run_stage(PipelineState::DetectingTarget, target_work).await?;
            (reference, target)
        };
        let target = found(PipelineState::DetectingTarget, target)?;

        tracing::debug!(
            reference = ?reference.bbox,
            reference_confidence = reference.confidence,
            target = ?target.bbox,
            target_confidence = target.confidence,
            "detections"
        );

        run.enter(PipelineState::Calibrating);
        let calibration = self.calibrator.calibrate(&reference.bbox, &spec)?;

        run.enter(PipelineState::Estimating);
        let estimate = self.estimator.estimate(
            &target.bbox,
            &calibration,
            reference.confidence,
            target.confidence,
        );

        self.save_debug_overlay(image, &reference, &target).await;

        run.enter(PipelineState::Done);
        Ok(Analysis {
            estimate: estimate.result,
            warning: estimate.warning,
            reference,
            target,
            calibration,
            states: run.states,
        })
    }

    /// Run blocking work off the async executor, bounded by the stage budget.
    ///
    /// A blocking task cannot be cancelled: on timeout it is detached, keeps running
    /// until the work returns, and its result is dropped.
    async fn run_stage<T, F>(&self, stage: PipelineState, work: F) -> Result<T, PipelineError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(work);
        let joined = match self.context.timeout {
            Some(budget) => tokio::time::timeout(budget, handle)
                .await
                .map_err(|_| PipelineError::Timeout { stage, budget })?,
            None => handle.await,
        };
        joined.map_err(|e| PipelineError::Aborted {
            stage,
            reason: e.to_string(),
        })
    }

    /// Encode and write the overlay on the blocking pool; failures only log
    async fn save_debug_overlay(&self, image: Arc<Image>, reference: &Detection, target: &Detection) {
        let Some(debug_config) = &self.context.debug else {
            return;
        };
        if !debug_config.enabled {
            return;
        }

        let stem = image
            .source()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let output_path = debug_config.output_dir.join(format!("{}-overlay.png", stem));
        let (reference_box, target_box) = (reference.bbox, target.bbox);
        let write_path = output_path.clone();
        let saved = self
            .run_stage(PipelineState::Estimating, move || {
                overlay::render_overlay(&image, &reference_box, &target_box).save(&write_path)
            })
            .await;

        match saved {
            Ok(Ok(())) => tracing::debug!(path = ?output_path, "saved debug overlay"),
            Ok(Err(e)) => tracing::warn!(path = ?output_path, error = %e, "failed to save debug overlay"),
            Err(e) => tracing::warn!(path = ?output_path, error = %e, "failed to save debug overlay"),
        }
    }
}

impl Default for EstimationPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

fn found(stage: PipelineState, result: DetectionResult) -> Result<Detection, PipelineError> {
    match result {
        DetectionResult::Found(detection) => Ok(detection),
        DetectionResult::NotFound => Err(PipelineError::DetectionFailed { stage }),
    }
}

fn log_outcome(source: &Path, result: &Result<Analysis, PipelineError>) {
    match result {
        Ok(analysis) => {
            let e = &analysis.estimate;
            tracing::info!(
                image = ?source,
                width = e.width,
                height = e.height,
                unit = %e.unit,
                confidence = e.confidence,
                "window measured"
            );
            if let Some(warning) = &analysis.warning {
                tracing::warn!(image = ?source, %warning, "estimate needs review");
            }
        }
        Err(e) => tracing::warn!(image = ?source, error = %e, kind = ?e.kind(), "analysis failed"),
    }
}
