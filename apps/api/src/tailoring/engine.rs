//! Tailoring engine: the pluggable, trait-based seam that turns a validated request
//! into ranked bullet points.
//!
//! Default: `MockEngine` (fixed latency, constant three-bullet result).
//! Alternative: `RemoteEngine` (see `remote.rs`), selected when an engine URL is configured.
//!
//! `AppState` holds an `Arc<dyn TailoringEngine>`, chosen at startup via config.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::tailoring::{BulletPoint, TailoringRequest, TailoringResult, ValidRequest};

/// Latency of the mock engine when not configured otherwise.
pub const DEFAULT_MOCK_LATENCY: Duration = Duration::from_millis(3000);

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap engines without touching handlers or callers.
///
/// A call either fully succeeds or fails; there is no partial delivery.
#[async_trait]
pub trait TailoringEngine: Send + Sync {
    async fn tailor(&self, request: &ValidRequest) -> Result<TailoringResult, AppError>;

    /// Label for logs.
    fn backend(&self) -> &'static str;
}

/// Validates `request`, then runs it through `engine`.
///
/// Invalid input fails before the engine is touched. An engine answer without
/// bullet points is treated as an engine failure.
pub async fn tailor(
    engine: &dyn TailoringEngine,
    request: TailoringRequest,
) -> Result<(ValidRequest, TailoringResult), AppError> {
    let request = request.validate()?;

    let result = engine.tailor(&request).await?;
    if result.is_empty() {
        warn!("Engine '{}' returned no bullet points", engine.backend());
        return Err(AppError::Engine(
            "engine returned no bullet points".to_string(),
        ));
    }

    info!(
        "Engine '{}' produced {} bullet points",
        engine.backend(),
        result.bullet_points().len()
    );
    Ok((request, result))
}

// ────────────────────────────────────────────────────────────────────────────
// MockEngine
// ────────────────────────────────────────────────────────────────────────────

/// Stand-in engine: waits `latency`, then returns the same three bullets for any input.
pub struct MockEngine {
    latency: Duration,
}

impl MockEngine {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_LATENCY)
    }
}

#[async_trait]
impl TailoringEngine for MockEngine {
    async fn tailor(&self, _request: &ValidRequest) -> Result<TailoringResult, AppError> {
        tokio::time::sleep(self.latency).await;
        TailoringResult::new(sample_bullets())
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}

fn sample_bullets() -> Vec<BulletPoint> {
    vec![
        BulletPoint::new(
            1,
            "Led cross-functional teams of 8+ developers using Agile methodologies to deliver \
             cloud-native applications, resulting in 40% faster deployment cycles and improved \
             system reliability",
            &[
                "cross-functional teams",
                "Agile methodologies",
                "cloud-native",
                "deployment cycles",
            ],
        ),
        BulletPoint::new(
            2,
            "Implemented data-driven decision making processes using Python and SQL, analyzing \
             customer behavior patterns to increase user engagement by 35% and reduce churn rate \
             by 20%",
            &[
                "data-driven",
                "Python",
                "SQL",
                "customer behavior",
                "user engagement",
            ],
        ),
        BulletPoint::new(
            3,
            "Architected scalable microservices infrastructure on AWS, managing containerized \
             applications with Docker and Kubernetes, supporting 10M+ daily active users with \
             99.9% uptime",
            &["microservices", "AWS", "Docker", "Kubernetes", "scalable"],
        ),
    ]
}
