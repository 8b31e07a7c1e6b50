use std::collections::{BTreeMap, BTreeSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use ud_accessibility::{Win32AccessibilitySource, Win32WindowResolver};
use ud_core::{Candidate, FusionConfig, Tier, fuse_candidates};
use ud_ocr::PaddleOcrSource;
use ud_pixel::PixelAnalyzer;
use ud_platform::{
    AccessibilitySource, OcrSource, PixelSource, Screenshot, TierError, WindowId, WindowResolver,
};
use ud_settings::Settings;

use crate::error::{DetectError, TierFailure};
use crate::request::DetectionRequest;
use crate::result::DetectionResult;
use crate::worker::AccessibilityWorker;

/// Default time allowed for the tiers of one run.
pub const DEFAULT_TIER_TIMEOUT: Duration = Duration::from_secs(15);

type TierOutcome = (Tier, Result<Vec<Candidate>, TierError>);

/// Runs detection tiers and fuses their output.
pub struct Detector {
    resolver: Arc<dyn WindowResolver>,
    accessibility: Option<AccessibilityWorker>,
    ocr: Option<Arc<dyn OcrSource>>,
    pixel: Option<Arc<dyn PixelSource>>,
    fusion: FusionConfig,
    timeout: Duration,
}

/// Builder for [`Detector`].
pub struct DetectorBuilder {
    resolver: Arc<dyn WindowResolver>,
    accessibility: Option<AccessibilityWorker>,
    ocr: Option<Arc<dyn OcrSource>>,
    pixel: Option<Arc<dyn PixelSource>>,
    fusion: FusionConfig,
    timeout: Duration,
}

impl DetectorBuilder {
    pub fn new(resolver: impl WindowResolver + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
            accessibility: None,
            ocr: None,
            pixel: None,
            fusion: FusionConfig::default(),
            timeout: DEFAULT_TIER_TIMEOUT,
        }
    }

    /// Run `source` on its own worker thread.
    pub fn accessibility(
        mut self,
        source: impl AccessibilitySource + 'static,
    ) -> Result<Self, DetectError> {
        self.accessibility = Some(AccessibilityWorker::spawn(source)?);
        Ok(self)
    }

    /// Share an already running worker.
    pub fn accessibility_worker(mut self, worker: AccessibilityWorker) -> Self {
        self.accessibility = Some(worker);
        self
    }

    pub fn ocr(mut self, source: impl OcrSource + 'static) -> Self {
        self.ocr = Some(Arc::new(source));
        self
    }

    pub fn pixel(mut self, source: impl PixelSource + 'static) -> Self {
        self.pixel = Some(Arc::new(source));
        self
    }

    pub fn fusion(mut self, config: FusionConfig) -> Self {
        self.fusion = config;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Detector {
        Detector {
            resolver: self.resolver,
            accessibility: self.accessibility,
            ocr: self.ocr,
            pixel: self.pixel,
            fusion: self.fusion,
            timeout: self.timeout,
        }
    }
}

impl Detector {
    pub fn builder(resolver: impl WindowResolver + 'static) -> DetectorBuilder {
        DetectorBuilder::new(resolver)
    }

    /// Detector backed by the native window system, PaddleOCR and the pixel analyzer.
    pub fn from_settings(settings: &Settings) -> Result<Self, DetectError> {
        let detector = Self::builder(Win32WindowResolver::new())
            .accessibility_worker(AccessibilityWorker::spawn_with(Win32AccessibilitySource::new)?)
            .ocr(PaddleOcrSource::new(settings.ocr_config()))
            .pixel(PixelAnalyzer::new(settings.pixel))
            .fusion(settings.fusion)
            .timeout(settings.tier_timeout())
            .build();
        Ok(detector)
    }

    /// Run one detection.
    ///
    /// Fails before any tier runs when the window cannot be resolved or a required screenshot is
    /// missing. Tiers that fail, are not configured or exceed the timeout are excluded with a
    /// warning; the run fails only when every selected tier was excluded.
    pub async fn detect(
        &self,
        request: DetectionRequest,
        cancel: CancellationToken,
    ) -> Result<DetectionResult, DetectError> {
        let started = Instant::now();

        let tiers = request.selected_tiers();
        if tiers.is_empty() {
            return Err(DetectError::NoTiersSelected);
        }
        if cancel.is_cancelled() {
            return Err(DetectError::Cancelled);
        }

        let window = self.resolver.resolve(&request.window)?;
        debug!(window = %window.title, id = window.id.raw(), "target window resolved");

        let screenshot = if request.needs_screenshot() {
            match request.screenshot {
                Some(ref shot) if !shot.is_empty() => Some(shot.clone()),
                Some(_) => return Err(DetectError::InvalidScreenshot("screenshot is empty".into())),
                None => {
                    return Err(DetectError::InvalidScreenshot(
                        "OCR and pixel tiers need a screenshot".into(),
                    ));
                }
            }
        } else {
            None
        };

        let mut failures: Vec<TierFailure> = Vec::new();
        let mut pending: BTreeSet<Tier> = BTreeSet::new();
        let mut tasks: JoinSet<TierOutcome> = JoinSet::new();

        for &tier in &tiers {
            match self.spawn_tier(tier, &mut tasks, window.id, request.max_depth, screenshot.as_ref()) {
                Ok(()) => {
                    pending.insert(tier);
                }
                Err(e) => failures.push(TierFailure::new(tier, e)),
            }
        }

        let mut outcomes: BTreeMap<Tier, Vec<Candidate>> = BTreeMap::new();
        let timed_out = tokio::select! {
            _ = cancel.cancelled() => {
                warn!("detection cancelled while tiers were running");
                return Err(DetectError::Cancelled);
            }
            gathered = tokio::time::timeout(
                self.timeout,
                gather(&mut tasks, &mut pending, &mut outcomes, &mut failures),
            ) => gathered.is_err(),
        };

        // Whatever is still pending either timed out or was lost.
        let reason = if timed_out {
            format!("timed out after {} ms", self.timeout.as_millis())
        } else {
            "task ended without a result".to_string()
        };
        for tier in std::mem::take(&mut pending) {
            failures.push(TierFailure::new(tier, TierError::Failed(reason.clone())));
        }
        tasks.abort_all();
        failures.sort_by_key(|f| f.tier);

        if outcomes.is_empty() {
            error!(failures = failures.len(), "every selected tier failed");
            return Err(DetectError::AllTiersFailed { failures });
        }

        for failure in &failures {
            warn!(tier = %failure.tier, error = %failure.error, "tier excluded");
        }
        let warnings: Vec<String> = failures.iter().map(ToString::to_string).collect();

        let mut tier_counts: BTreeMap<Tier, usize> = tiers.iter().map(|&t| (t, 0)).collect();
        let mut candidates = Vec::new();
        for (tier, tier_candidates) in outcomes {
            tier_counts.insert(tier, tier_candidates.len());
            candidates.extend(tier_candidates);
        }

        let raw = candidates.len();
        let report = fuse_candidates(candidates, &self.fusion);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            window = %window.title,
            raw,
            merges = report.merges,
            elements = report.elements.len(),
            excluded = warnings.len(),
            elapsed_ms,
            "detection complete"
        );

        Ok(DetectionResult {
            window,
            elements: report.elements,
            tier_counts,
            warnings,
            elapsed_ms,
            annotated_image: None,
        })
    }

    /// Run one detection on a private runtime, for synchronous callers.
    pub fn detect_blocking(&self, request: DetectionRequest) -> Result<DetectionResult, DetectError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.detect(request, CancellationToken::new()))
    }

    fn spawn_tier(
        &self,
        tier: Tier,
        tasks: &mut JoinSet<TierOutcome>,
        window: WindowId,
        max_depth: u32,
        screenshot: Option<&Screenshot>,
    ) -> Result<(), TierError> {
        match tier {
            Tier::Accessibility => {
                let worker = self
                    .accessibility
                    .clone()
                    .ok_or_else(|| TierError::Unavailable("no accessibility source configured".into()))?;
                tasks.spawn(async move {
                    let result = worker.collect(window, max_depth).await;
                    (tier, result.map(into_candidates))
                });
            }
            Tier::Ocr => {
                let source = self
                    .ocr
                    .clone()
                    .ok_or_else(|| TierError::Unavailable("no OCR source configured".into()))?;
                let shot = screenshot
                    .cloned()
                    .ok_or_else(|| TierError::Unavailable("no screenshot".into()))?;
                tasks.spawn_blocking(move || {
                    let result = guarded(tier, || source.recognize(&shot));
                    (tier, result.map(into_candidates))
                });
            }
            Tier::PixelAnalysis => {
                let source = self
                    .pixel
                    .clone()
                    .ok_or_else(|| TierError::Unavailable("no pixel analyzer configured".into()))?;
                let shot = screenshot
                    .cloned()
                    .ok_or_else(|| TierError::Unavailable("no screenshot".into()))?;
                tasks.spawn_blocking(move || {
                    let result = guarded(tier, || source.analyze(&shot));
                    (tier, result.map(into_candidates))
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("accessibility", &self.accessibility.is_some())
            .field("ocr", &self.ocr.is_some())
            .field("pixel", &self.pixel.is_some())
            .field("fusion", &self.fusion)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Wait for every spawned tier.
async fn gather(
    tasks: &mut JoinSet<TierOutcome>,
    pending: &mut BTreeSet<Tier>,
    outcomes: &mut BTreeMap<Tier, Vec<Candidate>>,
    failures: &mut Vec<TierFailure>,
) {
    while let Some(joined) = tasks.join_next().await {
        let (tier, result) = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "tier task aborted");
                continue;
            }
        };
        pending.remove(&tier);

        match result {
            Ok(candidates) => {
                debug!(%tier, count = candidates.len(), "tier finished");
                outcomes.insert(tier, candidates);
            }
            Err(e) => {
                debug!(%tier, error = %e, "tier failed");
                failures.push(TierFailure::new(tier, e));
            }
        }
    }
}

fn guarded<T>(tier: Tier, f: impl FnOnce() -> Result<T, TierError>) -> Result<T, TierError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!(%tier, "tier panicked");
        Err(TierError::Failed(format!("{tier} tier panicked")))
    })
}

fn into_candidates<T: Into<Candidate>>(items: Vec<T>) -> Vec<Candidate> {
    items.into_iter().map(Into::into).collect()
}
