//! HTTP client for the Open Trivia DB (`opentdb.com`).
//!
//! Upstream serves at most 50 questions per request, so one fetch may
//! issue several requests. Each request independently picks one of the
//! requested difficulties and one of the requested categories, which is
//! how a round mixes several of each.

use rand::seq::IndexedRandom;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{Question, QuestionRequest, QuestionSource, SupplyConfig, SupplyError};

/// Fallback category label when upstream omits one.
const DEFAULT_CATEGORY: &str = "General";

/// Open Trivia DB response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    response_code: i64,
    #[serde(default)]
    results: Vec<ApiQuestion>,
}

/// One upstream question. Text fields are HTML-entity encoded.
#[derive(Debug, Deserialize)]
struct ApiQuestion {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    question: String,
    #[serde(default)]
    correct_answer: String,
    #[serde(default)]
    incorrect_answers: Vec<String>,
}

impl ApiQuestion {
    fn normalize(self) -> Question {
        let category = self
            .category
            .map(|c| decode(&c))
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        Question::new(
            decode(&self.question),
            category,
            decode(&self.correct_answer),
            self.incorrect_answers.iter().map(|a| decode(a)),
        )
    }
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Picks one code from `codes`, or `None` ("any") when the set is empty.
fn pick(codes: &[String]) -> Option<String> {
    codes.choose(&mut rand::rng()).cloned()
}

/// Open Trivia DB client.
pub struct OpenTdbSource {
    client: reqwest::Client,
    config: SupplyConfig,
}

impl OpenTdbSource {
    /// Builds a client with the configured per-request timeout.
    pub fn new(config: SupplyConfig) -> Result<Self, SupplyError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hivequiz/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// The settings this client was built with.
    pub fn config(&self) -> &SupplyConfig {
        &self.config
    }

    fn batch_url(&self, amount: u32, difficulty: Option<&str>, category: Option<&str>) -> String {
        let mut url = format!("{}?amount={amount}&type=multiple", self.config.base_url);
        if let Some(difficulty) = difficulty.filter(|d| *d != "any") {
            url.push_str(&format!("&difficulty={difficulty}"));
        }
        if let Some(category) = category.filter(|c| *c != "any") {
            url.push_str(&format!("&category={category}"));
        }
        url
    }

    async fn fetch_batch(
        &self,
        amount: u32,
        difficulty: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Question>, SupplyError> {
        let url = self.batch_url(amount, difficulty, category);
        debug!(%url, "fetching question batch");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SupplyError::RateLimited);
        }
        if !status.is_success() {
            return Err(SupplyError::Status(status.as_u16()));
        }

        let body: ApiResponse = resp.json().await?;
        if body.response_code != 0 {
            return Err(SupplyError::Upstream(body.response_code));
        }
        Ok(body.results.into_iter().map(ApiQuestion::normalize).collect())
    }
}

impl QuestionSource for OpenTdbSource {
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, SupplyError> {
        let wanted = request.amount as usize;
        let mut questions = Vec::with_capacity(wanted);
        let mut batches = 0;

        while questions.len() < wanted && batches < self.config.max_batches {
            let remaining = (wanted - questions.len()) as u32;
            let size = remaining.min(self.config.max_batch);
            let difficulty = pick(&request.difficulties);
            let category = pick(&request.categories);

            let batch = match self
                .fetch_batch(size, difficulty.as_deref(), category.as_deref())
                .await
            {
                Ok(batch) => batch,
                // Earlier batches are good questions; keep them.
                Err(error) if !questions.is_empty() => {
                    warn!(%error, kept = questions.len(), "question batch failed, returning partial result");
                    break;
                }
                Err(error) => return Err(error),
            };
            if batch.is_empty() {
                break;
            }
            questions.extend(batch);
            batches += 1;
        }

        if questions.is_empty() {
            return Err(SupplyError::Empty);
        }
        questions.truncate(wanted);
        info!(count = questions.len(), batches, "fetched questions from upstream");
        Ok(questions)
    }
}
