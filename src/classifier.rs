use crate::error::AppError;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Spam verdict for normalized message text.
///
/// Implementations are total: internal failures are logged and mapped to a
/// verdict, never surfaced to the caller.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn is_spam(&self, text: &str) -> bool;
}

static SPAM_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bcongratulations\b",
        r"\b(won|win|winner|winning)\b",
        r"\bfree\b",
        r"\blottery\b",
        r"\bprize\b",
        r"\bcash\b",
        r"\bmoney\b",
        r"\bclick here\b",
        r"\burgent\b",
        r"\b(bank|account) details\b",
        r"\bclaim (your|now)\b",
        r"\byou have been selected\b",
        r"!!!",
    ]
    .iter()
    .map(|rule| Regex::new(&format!("(?i){rule}")).unwrap())
    .collect()
});

/// Counts how many spam phrase rules match; spam at or above the threshold.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    threshold: usize,
}

impl KeywordClassifier {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    pub fn hits(&self, text: &str) -> usize {
        SPAM_RULES.iter().filter(|rule| rule.is_match(text)).count()
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(2)
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn is_spam(&self, text: &str) -> bool {
        self.hits(text) >= self.threshold
    }
}

/// Response of the prediction service. Older deployments answer with
/// `prediction`, newer ones with a ready-made `header` line.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    header: Option<String>,
    prediction: Option<String>,
}

impl PredictResponse {
    fn verdict(&self) -> Option<bool> {
        if let Some(header) = &self.header {
            let (name, value) = header.split_once(':')?;
            if !name.trim().eq_ignore_ascii_case("X-Spam-ML-Score") {
                return None;
            }
            return Some(value.trim().eq_ignore_ascii_case("yes"));
        }
        self.prediction
            .as_deref()
            .map(|p| p.trim().eq_ignore_ascii_case("spam"))
    }
}

/// Delegates to a remote prediction service (`POST <url>` with the raw text).
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn predict(&self, text: &str) -> Result<bool, AppError> {
        let response: PredictResponse = self
            .client
            .post(&self.url)
            .body(text.to_owned())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .verdict()
            .ok_or_else(|| AppError::Classifier(format!("unrecognised response: {response:?}")))
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn is_spam(&self, text: &str) -> bool {
        match self.predict(text).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!("Classifier at {} failed, treating as ham: {}", self.url, e);
                false
            }
        }
    }
}
