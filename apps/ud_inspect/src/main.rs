use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use ud_accessibility::Win32WindowResolver;
use ud_core::Tier;
use ud_detect::{CancellationToken, DetectionRequest, Detector};
use ud_platform::{Screenshot, WindowInfo, WindowQuery, WindowResolver};
use ud_settings::Settings;

const USAGE: &str = "usage: ud_inspect <window-title> [screenshot-image]";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pure JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(title) = args.next() else {
        bail!(USAGE);
    };
    let screenshot_path = args.next().map(PathBuf::from);

    let settings = Settings::load();
    info!(path = %Settings::settings_path().display(), "settings loaded");

    let window = Win32WindowResolver::new()
        .resolve(&WindowQuery::Title(title))
        .context("failed to resolve target window")?;
    info!(title = %window.title, id = window.id.raw(), "target window");

    let mut request =
        DetectionRequest::from_settings(WindowQuery::Handle(window.id), None, &settings);
    match screenshot_path {
        Some(path) => request.screenshot = Some(load_screenshot(&path, &window)?),
        None => {
            info!("no screenshot given, running the accessibility tier only");
            request.tiers.retain(|t| *t == Tier::Accessibility);
        }
    }

    let detector = Detector::from_settings(&settings)?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let result = detector.detect(request, cancel).await?;
    println!("{}", result.to_json()?);
    Ok(())
}

/// Read a capture of `window`, placed at the window's screen position.
fn load_screenshot(path: &Path, window: &WindowInfo) -> Result<Screenshot> {
    let data = std::fs::read(path)
        .with_context(|| format!("failed to read screenshot {}", path.display()))?;
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("unsupported screenshot {}", path.display()))?;

    Ok(Screenshot::new(data, width, height).with_origin(window.rect.x, window.rect.y))
}
