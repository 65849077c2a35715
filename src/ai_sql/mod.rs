//! Natural-language questions answered against the ride-sharing store
//!
//! A question is classified by [`IntentClassifier`], then either turned into
//! SQL and executed against the SQLite store, or answered in prose from the
//! cached schema and PII catalog.
//!
//! # Usage
//!
//! ```rust,ignore
//! use navigator::ai_sql::{Assistant, AiSqlConfig, Session};
//! use navigator::database_sqlite::SqliteStore;
//!
//! let assistant = Assistant::connect(AiSqlConfig::default(), SqliteStore::new("uber_data.db")).await?;
//! let mut session = Session::new();
//! let outcome = assistant.ask(&mut session, "top 5 cities by completed trips").await;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod intent;
pub mod prompt;
pub mod schema;
pub mod session;
pub mod ui;

pub use client::{Completion, CompletionProvider, SamplingParams, TokenUsage};
pub use config::{AiSqlConfig, TokenPricing};
pub use error::{AiError, AiResult};
pub use intent::{Intent, IntentClassifier};
pub use prompt::PromptGenerator;
pub use schema::{PiiRecord, SchemaCache, SchemaInfo};
pub use session::{ConversationTurn, Role, Session, TurnMetrics};

use crate::database::QueryResult;
use crate::database_sqlite::SqliteStore;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What one turn produced, for rendering
#[derive(Debug)]
pub enum TurnOutcome {
    /// SQL was generated and run; `result` may still hold an execution error
    Query {
        sql: String,
        result: QueryResult,
        metrics: TurnMetrics,
    },
    SchemaAnswer {
        answer: String,
        metrics: TurnMetrics,
    },
    GenerationFailed {
        intent: Intent,
        error: AiError,
    },
}

impl TurnOutcome {
    pub fn intent(&self) -> Intent {
        match self {
            TurnOutcome::Query { .. } => Intent::DataQuery,
            TurnOutcome::SchemaAnswer { .. } => Intent::SchemaInfo,
            TurnOutcome::GenerationFailed { intent, .. } => *intent,
        }
    }

    pub fn metrics(&self) -> Option<&TurnMetrics> {
        match self {
            TurnOutcome::Query { metrics, .. } | TurnOutcome::SchemaAnswer { metrics, .. } => {
                Some(metrics)
            }
            TurnOutcome::GenerationFailed { .. } => None,
        }
    }

    /// Transcript text for the assistant side of the turn
    pub fn reply(&self) -> String {
        match self {
            TurnOutcome::Query { sql, result, .. } => match result {
                QueryResult::Rows(rows) => {
                    format!("Here's your data! I found {} results.", rows.len())
                }
                QueryResult::Error(error) => format!(
                    "I generated this SQL query but it failed:\n```sql\n{}\n```\nError: {}",
                    sql, error
                ),
            },
            TurnOutcome::SchemaAnswer { answer, .. } => answer.clone(),
            TurnOutcome::GenerationFailed { error, .. } => {
                format!("Sorry, I couldn't generate a response: {}", error.user_message())
            }
        }
    }
}

/// Turn orchestrator holding the store, schema snapshot and completion client
pub struct Assistant {
    config: AiSqlConfig,
    store: SqliteStore,
    cache: SchemaCache,
    provider: Box<dyn CompletionProvider>,
    classifier: IntentClassifier,
}

impl Assistant {
    /// Build the HTTP client from `config` and load the schema snapshot
    pub async fn connect(config: AiSqlConfig, store: SqliteStore) -> AiResult<Self> {
        let provider = client::create_completion_client(&config)?;
        let cache = SchemaCache::load(&store).await?;
        Ok(Self::with_provider(config, store, cache, provider))
    }

    pub fn with_provider(
        config: AiSqlConfig,
        store: SqliteStore,
        cache: SchemaCache,
        provider: Box<dyn CompletionProvider>,
    ) -> Self {
        Self {
            config,
            store,
            cache,
            provider,
            classifier: IntentClassifier::new(),
        }
    }

    pub fn config(&self) -> &AiSqlConfig {
        &self.config
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn schema_cache(&self) -> &SchemaCache {
        &self.cache
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn classify(&self, question: &str) -> Intent {
        self.classifier.classify(question)
    }

    /// Reload the schema and PII snapshots from the store
    pub async fn refresh_schema(&mut self) -> AiResult<()> {
        self.cache.refresh(&self.store).await?;
        info!("Schema snapshot refreshed");
        Ok(())
    }

    /// Run one turn to completion and record it in `session`.
    ///
    /// Never fails: generation and execution errors come back as outcomes and
    /// are still appended to the transcript.
    pub async fn ask(&self, session: &mut Session, question: &str) -> TurnOutcome {
        let started = Instant::now();
        let score = self.classifier.score(question);
        let intent = score.intent();
        info!(
            %intent,
            data_query_hits = score.data_query,
            schema_hits = score.schema,
            "Classified question"
        );

        let outcome = match intent {
            Intent::DataQuery => self.answer_with_sql(question).await,
            Intent::SchemaInfo => self.answer_schema(question).await,
        };

        if let TurnOutcome::GenerationFailed { error, .. } = &outcome {
            warn!(%intent, error = %error, "Generation failed");
        }

        session.record_turn(question, outcome.reply(), outcome.metrics().copied());
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            exchanges = session.exchanges(),
            "Turn recorded"
        );
        outcome
    }

    async fn answer_with_sql(&self, question: &str) -> TurnOutcome {
        let prompt = PromptGenerator::sql_prompt(question, self.cache.schema());
        debug!("SQL prompt length: {} chars", prompt.len());

        let completion = match self.provider.complete(&prompt, self.config.sql_sampling()).await {
            Ok(completion) => completion,
            Err(error) => {
                return TurnOutcome::GenerationFailed {
                    intent: Intent::DataQuery,
                    error,
                };
            }
        };

        let sql = client::clean_sql_response(&completion.text);
        debug!(sql = %sql, "Generated SQL");

        let result = self.store.execute(&sql).await;
        match &result {
            QueryResult::Rows(rows) => info!(rows = rows.len(), "Query executed"),
            QueryResult::Error(error) => debug!(error = %error, "Generated SQL failed"),
        }

        TurnOutcome::Query {
            sql,
            result,
            metrics: metrics_of(&completion),
        }
    }

    async fn answer_schema(&self, question: &str) -> TurnOutcome {
        let prompt =
            PromptGenerator::schema_prompt(question, self.cache.schema(), self.cache.pii());
        debug!("Schema prompt length: {} chars", prompt.len());

        match self.provider.complete(&prompt, self.config.answer_sampling()).await {
            Ok(completion) => TurnOutcome::SchemaAnswer {
                metrics: metrics_of(&completion),
                answer: completion.text,
            },
            Err(error) => TurnOutcome::GenerationFailed {
                intent: Intent::SchemaInfo,
                error,
            },
        }
    }
}

fn metrics_of(completion: &Completion) -> TurnMetrics {
    TurnMetrics {
        latency_secs: completion.latency.as_secs_f64(),
        tokens: completion.usage.total_tokens,
        cost_usd: completion.cost_usd,
    }
}
