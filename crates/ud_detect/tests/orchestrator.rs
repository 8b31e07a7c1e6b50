use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use image::{GrayImage, ImageFormat, Luma};
use ud_accessibility::select_window;
use ud_core::{
    AccessibilityElement, BoundingRect, Candidate, ControlType, FusionConfig, Sources, TextRegion,
    Tier, VisualElement, fuse_candidates,
};
use ud_detect::{CancellationToken, DetectError, DetectionRequest, Detector};
use ud_pixel::PixelAnalyzer;
use ud_platform::{
    AccessibilitySource, OcrSource, PixelSource, PlatformError, Screenshot, TierError, WindowId,
    WindowInfo, WindowQuery, WindowResolver,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FixedResolver(WindowInfo);

impl WindowResolver for FixedResolver {
    fn resolve(&self, query: &WindowQuery) -> Result<WindowInfo, PlatformError> {
        select_window(vec![self.0.clone()], query)
    }
}

struct FakeAccessibility {
    result: Result<Vec<AccessibilityElement>, TierError>,
    calls: Arc<AtomicUsize>,
}

impl AccessibilitySource for FakeAccessibility {
    fn collect(
        &mut self,
        _window: WindowId,
        _max_depth: u32,
    ) -> Result<Vec<AccessibilityElement>, TierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

struct FakeOcr {
    result: Result<Vec<TextRegion>, TierError>,
    calls: Arc<AtomicUsize>,
}

impl OcrSource for FakeOcr {
    fn recognize(&self, _screenshot: &Screenshot) -> Result<Vec<TextRegion>, TierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

struct FakePixel {
    result: Result<Vec<VisualElement>, TierError>,
    delay: Duration,
}

impl PixelSource for FakePixel {
    fn analyze(&self, _screenshot: &Screenshot) -> Result<Vec<VisualElement>, TierError> {
        std::thread::sleep(self.delay);
        self.result.clone()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn window() -> WindowInfo {
    WindowInfo {
        id: WindowId::from_raw(0x1234),
        title: "Settings - Demo App".to_string(),
        class_name: "DemoFrame".to_string(),
        rect: BoundingRect::new(0, 0, 1200, 600),
        is_visible: true,
        is_minimized: false,
    }
}

fn query() -> WindowQuery {
    WindowQuery::Title("demo app".to_string())
}

fn screenshot() -> Screenshot {
    Screenshot::new(vec![0u8; 16], 1200, 600)
}

/// Ten native buttons in one row.
fn accessibility_elements() -> Vec<AccessibilityElement> {
    (0..10)
        .map(|i| AccessibilityElement {
            control_type: ControlType::Button,
            name: format!("Item{i}"),
            stable_id: Some(format!("{}", 1000 + i)),
            is_enabled: true,
            is_interactable: true,
            bounds: BoundingRect::new(10 + i * 100, 10, 80, 30),
        })
        .collect()
}

/// Three labels of buttons 0..3 (inset by OCR padding) plus three unrelated labels.
fn ocr_regions() -> Vec<TextRegion> {
    let mut regions: Vec<TextRegion> = (0..3)
        .map(|i| TextRegion {
            text: format!("Item{i}"),
            bounds: BoundingRect::new(20 + i * 100, 17, 60, 16),
            confidence: 0.85,
        })
        .collect();
    for (i, text) in ["Alpha", "Beta", "Gamma"].into_iter().enumerate() {
        regions.push(TextRegion {
            text: text.to_string(),
            bounds: BoundingRect::new(10 + i as i32 * 200, 200, 60, 16),
            confidence: 0.9,
        });
    }
    regions
}

/// One outline matching button 5 plus two free-standing icons.
fn visual_elements() -> Vec<VisualElement> {
    vec![
        VisualElement {
            element_type: ControlType::Button,
            bounds: BoundingRect::new(510, 10, 80, 30),
            confidence: 0.6,
        },
        VisualElement {
            element_type: ControlType::Icon,
            bounds: BoundingRect::new(10, 400, 24, 24),
            confidence: 0.7,
        },
        VisualElement {
            element_type: ControlType::Icon,
            bounds: BoundingRect::new(300, 400, 24, 24),
            confidence: 0.55,
        },
    ]
}

struct Setup {
    accessibility: Result<Vec<AccessibilityElement>, TierError>,
    ocr: Result<Vec<TextRegion>, TierError>,
    pixel: Result<Vec<VisualElement>, TierError>,
    pixel_delay: Duration,
    timeout: Duration,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            accessibility: Ok(accessibility_elements()),
            ocr: Ok(ocr_regions()),
            pixel: Ok(visual_elements()),
            pixel_delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
        }
    }
}

struct Harness {
    detector: Detector,
    accessibility_calls: Arc<AtomicUsize>,
    ocr_calls: Arc<AtomicUsize>,
}

fn harness(setup: Setup) -> Harness {
    let accessibility_calls = Arc::new(AtomicUsize::new(0));
    let ocr_calls = Arc::new(AtomicUsize::new(0));

    let detector = Detector::builder(FixedResolver(window()))
        .accessibility(FakeAccessibility {
            result: setup.accessibility,
            calls: Arc::clone(&accessibility_calls),
        })
        .unwrap()
        .ocr(FakeOcr {
            result: setup.ocr,
            calls: Arc::clone(&ocr_calls),
        })
        .pixel(FakePixel {
            result: setup.pixel,
            delay: setup.pixel_delay,
        })
        .timeout(setup.timeout)
        .build();

    Harness {
        detector,
        accessibility_calls,
        ocr_calls,
    }
}

fn request() -> DetectionRequest {
    DetectionRequest::new(query(), Some(screenshot()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_tiers_with_four_overlaps_fuse_to_fifteen_elements() {
    let h = harness(Setup::default());
    let result = h
        .detector
        .detect(request(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.tier_counts[&Tier::Accessibility], 10);
    assert_eq!(result.tier_counts[&Tier::Ocr], 6);
    assert_eq!(result.tier_counts[&Tier::PixelAnalysis], 3);
    assert_eq!(result.raw_count(), 19);
    assert_eq!(result.elements.len(), 10 + 6 + 3 - 4);
    assert!(result.warnings.is_empty());

    let ids: Vec<u32> = result.elements.iter().map(|e| e.id).collect();
    assert_eq!(ids, (1..=15).collect::<Vec<_>>());

    let corroborated: Vec<_> = result
        .elements
        .iter()
        .filter(|e| e.sources.count() > 1)
        .collect();
    assert_eq!(corroborated.len(), 4);
    for element in &corroborated {
        assert!(element.sources.contains(Sources::ACCESSIBILITY));
        assert_eq!(element.confidence, 1.0);
        assert_eq!(element.element_type, ControlType::Button);
        assert!(element.stable_id.is_some());
    }

    // OCR-only and pixel-only elements keep their own confidence.
    let beta = result.elements.iter().find(|e| e.name == "Beta").unwrap();
    assert_eq!(beta.sources, Sources::OCR);
    assert!((beta.confidence - 0.9).abs() < 1e-6);
}

#[test]
fn fused_confidence_is_never_below_its_members() {
    let candidates: Vec<Candidate> = accessibility_elements()
        .into_iter()
        .map(Candidate::from)
        .chain(ocr_regions().into_iter().map(Candidate::from))
        .chain(visual_elements().into_iter().map(Candidate::from))
        .collect();
    let inputs: Vec<f32> = candidates
        .iter()
        .cloned()
        .map(|c| c.into_element().confidence)
        .collect();

    let report = fuse_candidates(candidates, &FusionConfig::default());

    assert_eq!(report.elements.len(), 15);
    assert_eq!(report.members.len(), report.elements.len());
    let mut seen: Vec<usize> = report.members.iter().flatten().copied().collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..inputs.len()).collect::<Vec<_>>());

    for (element, members) in report.elements.iter().zip(&report.members) {
        let best = members
            .iter()
            .map(|&m| inputs[m])
            .fold(f32::MIN, f32::max);
        assert!(
            element.confidence >= best,
            "element {} has {} below member max {}",
            element.id,
            element.confidence,
            best
        );
    }
}

#[tokio::test]
async fn failing_tier_becomes_a_warning() {
    let h = harness(Setup {
        ocr: Err(TierError::Unavailable("no OCR language model installed".into())),
        ..Setup::default()
    });

    let result = h
        .detector
        .detect(request(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.tier_counts[&Tier::Ocr], 0);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].starts_with("ocr tier unavailable"));
    // Ten buttons, one merged outline, two icons.
    assert_eq!(result.elements.len(), 12);
}

#[tokio::test]
async fn every_tier_failing_is_an_error() {
    let h = harness(Setup {
        accessibility: Err(TierError::Failed("tree walk failed".into())),
        ocr: Err(TierError::Unavailable("no models".into())),
        pixel: Err(TierError::Failed("bad image".into())),
        ..Setup::default()
    });

    let err = h
        .detector
        .detect(request(), CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        DetectError::AllTiersFailed { failures } => {
            let tiers: Vec<Tier> = failures.iter().map(|f| f.tier).collect();
            assert_eq!(tiers, Tier::ALL.to_vec());
            assert_eq!(failures[1].error, TierError::Unavailable("no models".into()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_tiers_are_success_not_failure() {
    let h = harness(Setup {
        accessibility: Ok(Vec::new()),
        ocr: Ok(Vec::new()),
        pixel: Ok(Vec::new()),
        ..Setup::default()
    });

    let result = h
        .detector
        .detect(request(), CancellationToken::new())
        .await
        .unwrap();
    assert!(result.elements.is_empty());
    assert!(result.warnings.is_empty());
}

#[tokio::test]
async fn unknown_window_runs_no_tier() {
    let h = harness(Setup::default());
    let request = DetectionRequest::new(WindowQuery::Title("Calculator".into()), Some(screenshot()));

    let err = h
        .detector
        .detect(request, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DetectError::WindowNotFound(_)));
    assert_eq!(h.accessibility_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.ocr_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn screenshot_tiers_require_a_screenshot() {
    let h = harness(Setup::default());

    let missing = h
        .detector
        .detect(DetectionRequest::new(query(), None), CancellationToken::new())
        .await;
    assert!(matches!(missing, Err(DetectError::InvalidScreenshot(_))));

    let empty = DetectionRequest::new(query(), Some(Screenshot::new(Vec::<u8>::new(), 0, 0)));
    let empty = h.detector.detect(empty, CancellationToken::new()).await;
    assert!(matches!(empty, Err(DetectError::InvalidScreenshot(_))));

    // Accessibility alone does not look at pixels.
    let native_only = DetectionRequest::new(query(), None).with_tiers([Tier::Accessibility]);
    let result = h
        .detector
        .detect(native_only, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.elements.len(), 10);
    assert_eq!(h.ocr_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn no_tiers_selected_is_an_error() {
    let h = harness(Setup::default());
    let request = request().with_tiers(Vec::<Tier>::new());

    let err = h
        .detector
        .detect(request, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DetectError::NoTiersSelected));
}

#[tokio::test]
async fn unconfigured_tier_is_excluded() {
    let detector = Detector::builder(FixedResolver(window()))
        .ocr(FakeOcr {
            result: Ok(ocr_regions()),
            calls: Arc::default(),
        })
        .build();

    let result = detector
        .detect(request(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.elements.len(), 6);
    assert_eq!(result.warnings.len(), 2);
    assert!(result.warnings[0].contains("no accessibility source configured"));
    assert!(result.warnings[1].contains("no pixel analyzer configured"));
}

#[tokio::test]
async fn slow_tier_times_out_and_is_excluded() {
    let h = harness(Setup {
        pixel_delay: Duration::from_millis(500),
        timeout: Duration::from_millis(50),
        ..Setup::default()
    });

    let result = h
        .detector
        .detect(request(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.tier_counts[&Tier::PixelAnalysis], 0);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("timed out"));
    assert_eq!(result.elements.len(), 10 + 6 - 3);
}

#[tokio::test]
async fn cancellation_aborts_the_run() {
    let h = harness(Setup {
        pixel_delay: Duration::from_millis(300),
        ..Setup::default()
    });

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let err = h.detector.detect(request(), cancelled).await.unwrap_err();
    assert!(matches!(err, DetectError::Cancelled));

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let err = h.detector.detect(request(), token).await.unwrap_err();
    assert!(matches!(err, DetectError::Cancelled));
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let h = harness(Setup::default());

    let first = h
        .detector
        .detect(request(), CancellationToken::new())
        .await
        .unwrap();
    let second = h
        .detector
        .detect(request(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.elements, second.elements);
    assert_eq!(
        serde_json::to_string(&first.elements).unwrap(),
        serde_json::to_string(&second.elements).unwrap()
    );
}

#[test]
fn blocking_entry_point() {
    let h = harness(Setup::default());
    let result = h.detector.detect_blocking(request()).unwrap();
    assert_eq!(result.elements.len(), 15);
    assert_eq!(h.accessibility_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn real_pixel_tier_reports_screen_coordinates() {
    let mut img = GrayImage::from_pixel(200, 100, Luma([255]));
    for j in 10..30 {
        for i in 150..170 {
            img.put_pixel(i, j, Luma([0]));
        }
    }
    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let detector = Detector::builder(FixedResolver(window()))
        .pixel(PixelAnalyzer::default())
        .build();
    let shot = Screenshot::new(png, 200, 100).with_origin(300, 200);
    let request = DetectionRequest::new(query(), Some(shot)).with_tiers([Tier::PixelAnalysis]);

    let result = detector
        .detect(request, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.elements.len(), 1);
    let icon = &result.elements[0];
    assert_eq!(icon.element_type, ControlType::Icon);
    assert_eq!(icon.sources, Sources::PIXEL_ANALYSIS);
    assert!(icon.bounds.iou(&BoundingRect::new(450, 210, 20, 20)) > 0.5);
}
