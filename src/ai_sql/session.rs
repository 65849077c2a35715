//! Conversation transcript for one process lifetime.
//!
//! The transcript only grows. Each completed turn adds exactly one user entry
//! followed by one assistant entry, whatever route the turn took.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Metrics of the completion call behind an assistant reply
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TurnMetrics {
    pub latency_secs: f64,
    pub tokens: u64,
    pub cost_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TurnMetrics>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    turns: Vec<ConversationTurn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one exchange
    pub fn record_turn(
        &mut self,
        question: impl Into<String>,
        reply: impl Into<String>,
        metrics: Option<TurnMetrics>,
    ) {
        self.turns.push(ConversationTurn {
            role: Role::User,
            content: question.into(),
            metrics: None,
        });
        self.turns.push(ConversationTurn {
            role: Role::Assistant,
            content: reply.into(),
            metrics,
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of user/assistant pairs
    pub fn exchanges(&self) -> usize {
        self.turns.len() / 2
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn total_cost(&self) -> f64 {
        self.turns
            .iter()
            .filter_map(|t| t.metrics)
            .map(|m| m.cost_usd)
            .sum()
    }

    pub fn total_tokens(&self) -> u64 {
        self.turns
            .iter()
            .filter_map(|t| t.metrics)
            .map(|m| m.tokens)
            .sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.turns)
    }
}
