// Deterministic fake agents for pipeline tests

use super::{
    AdviceInput, AgentError, AgentSet, Advisor, GenerationInput, OutfitGenerator, TrendAnalyst,
    TrendInput, VisionAnalyst, VisionInput,
};
use crate::orchestration::request_log::{RequestLog, RequestLogEntry, RequestLogError};
use crate::orchestration::types::VisualAnalysis;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const FAKE_IMAGE_URL: &str = "data:image/png;base64,ZmFrZQ==";

/// How a fake responds when called
#[derive(Debug, Clone)]
pub(crate) enum Behavior<T> {
    Succeed(T),
    Fail(&'static str),
    /// The model answered without usable content
    NoContent(&'static str),
    /// Sleeps far longer than any stage timeout
    Hang,
    Panic,
}

impl<T: Clone> Behavior<T> {
    async fn act(&self) -> Result<T, AgentError> {
        match self {
            Behavior::Succeed(value) => Ok(value.clone()),
            Behavior::Fail(message) => Err(AgentError::MalformedOutput(message.to_string())),
            Behavior::NoContent(message) => Err(AgentError::NoContent(message.to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(AgentError::MalformedOutput("woke up".to_string()))
            }
            Behavior::Panic => panic!("fake agent blew up"),
        }
    }
}

pub(crate) fn sample_visual() -> VisualAnalysis {
    VisualAnalysis {
        gender_style: "feminine".into(),
        cut: "fitted midi dress".into(),
        color: "dusty rose".into(),
        fabric: "chiffon".into(),
        occasion: "semi-formal".into(),
    }
}

pub(crate) struct FakeVision {
    behavior: Behavior<VisualAnalysis>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl VisionAnalyst for FakeVision {
    async fn analyze(&self, _input: VisionInput<'_>) -> Result<VisualAnalysis, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behavior.act().await
    }
}

pub(crate) struct FakeTrends {
    behavior: Behavior<String>,
    pub calls: AtomicUsize,
    /// Gender style hint seen on each call
    pub seen_gender: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl TrendAnalyst for FakeTrends {
    async fn summarize(&self, input: TrendInput<'_>) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen_gender.lock() {
            seen.push(input.gender_style.map(str::to_string));
        }
        self.behavior.act().await
    }
}

pub(crate) struct FakeAdvisor {
    behavior: Behavior<String>,
    pub calls: AtomicUsize,
    /// Whether each call received a visual analysis, and the trend text it got
    pub seen: Mutex<Vec<(bool, String)>>,
}

#[async_trait]
impl Advisor for FakeAdvisor {
    async fn advise(&self, input: AdviceInput<'_>) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((input.visual.is_some(), input.trends.to_string()));
        }
        self.behavior.act().await
    }
}

pub(crate) struct FakeGenerator {
    behavior: Behavior<String>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl OutfitGenerator for FakeGenerator {
    async fn generate(&self, input: GenerationInput<'_>) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(input.prompt.to_string());
        }
        self.behavior.act().await
    }
}

/// One fake per stage, kept so tests can inspect call counts afterwards
pub(crate) struct Fakes {
    pub vision: Arc<FakeVision>,
    pub trends: Arc<FakeTrends>,
    pub advisor: Arc<FakeAdvisor>,
    pub generator: Arc<FakeGenerator>,
}

impl Fakes {
    /// Every agent succeeds
    pub fn succeeding() -> Self {
        Self::new(
            Behavior::Succeed(sample_visual()),
            Behavior::Succeed("**Monochrome layering** keeps it modern.".to_string()),
            Behavior::Succeed("Pair the dress with a cropped blazer. Finish with block heels.".to_string()),
            Behavior::Succeed(FAKE_IMAGE_URL.to_string()),
        )
    }

    /// Every agent returns an error
    pub fn failing() -> Self {
        Self::new(
            Behavior::Fail("vision unavailable"),
            Behavior::Fail("trends unavailable"),
            Behavior::Fail("advice unavailable"),
            Behavior::Fail("image generation returned no content"),
        )
    }

    pub fn new(
        vision: Behavior<VisualAnalysis>,
        trends: Behavior<String>,
        advice: Behavior<String>,
        generation: Behavior<String>,
    ) -> Self {
        Self {
            vision: Arc::new(FakeVision {
                behavior: vision,
                calls: AtomicUsize::new(0),
            }),
            trends: Arc::new(FakeTrends {
                behavior: trends,
                calls: AtomicUsize::new(0),
                seen_gender: Mutex::new(Vec::new()),
            }),
            advisor: Arc::new(FakeAdvisor {
                behavior: advice,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }),
            generator: Arc::new(FakeGenerator {
                behavior: generation,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn with_vision(mut self, behavior: Behavior<VisualAnalysis>) -> Self {
        self.vision = Arc::new(FakeVision {
            behavior,
            calls: AtomicUsize::new(0),
        });
        self
    }

    pub fn with_trends(mut self, behavior: Behavior<String>) -> Self {
        self.trends = Arc::new(FakeTrends {
            behavior,
            calls: AtomicUsize::new(0),
            seen_gender: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn with_advice(mut self, behavior: Behavior<String>) -> Self {
        self.advisor = Arc::new(FakeAdvisor {
            behavior,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn with_generation(mut self, behavior: Behavior<String>) -> Self {
        self.generator = Arc::new(FakeGenerator {
            behavior,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn agents(&self) -> AgentSet {
        AgentSet::new(
            self.vision.clone(),
            self.trends.clone(),
            self.advisor.clone(),
            self.generator.clone(),
        )
    }

    pub fn calls(&self) -> [usize; 4] {
        [
            self.vision.calls.load(Ordering::SeqCst),
            self.trends.calls.load(Ordering::SeqCst),
            self.advisor.calls.load(Ordering::SeqCst),
            self.generator.calls.load(Ordering::SeqCst),
        ]
    }

    pub fn total_calls(&self) -> usize {
        self.calls().iter().sum()
    }
}

/// Captures request log entries in memory
#[derive(Default)]
pub(crate) struct RecordingRequestLog {
    pub entries: Mutex<Vec<RequestLogEntry>>,
}

#[async_trait]
impl RequestLog for RecordingRequestLog {
    async fn record(&self, entry: &RequestLogEntry) -> Result<(), RequestLogError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
        Ok(())
    }
}

/// Always fails to write
#[derive(Default)]
pub(crate) struct BrokenRequestLog {
    pub calls: AtomicUsize,
}

#[async_trait]
impl RequestLog for BrokenRequestLog {
    async fn record(&self, _entry: &RequestLogEntry) -> Result<(), RequestLogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RequestLogError::Io {
            path: PathBuf::from("/dev/full"),
            message: "disk full".to_string(),
        })
    }
}

/// Local stand-in for the Gemini API answering every request with `body`.
/// Returns the base URL to point a `GeminiClient` at.
pub(crate) async fn mock_gemini(body: serde_json::Value) -> String {
    let app = axum::Router::new().fallback(move || {
        let body = body.clone();
        async move { axum::Json(body) }
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
