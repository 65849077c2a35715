//! Keyword-count intent classification.
//!
//! A question is routed either to SQL generation or to a schema/PII answer.
//! Each keyword is matched as a substring of the lower-cased question and
//! counts at most once. Data-query matches must strictly outnumber schema
//! matches to win; equal nonzero counts go to the schema route, and a
//! question matching nothing defaults to a data query.

use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

/// The classified purpose of a user question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    DataQuery,
    SchemaInfo,
}

pub const DATA_QUERY_KEYWORDS: &[&str] = &[
    "top",
    "show",
    "get",
    "find",
    "list",
    "count",
    "sum",
    "average",
    "how many",
    "total",
    "select",
    "where",
    "last week",
    "yesterday",
];

pub const SCHEMA_KEYWORDS: &[&str] = &[
    "table",
    "column",
    "schema",
    "pii",
    "personal",
    "privacy",
    "join",
    "relationship",
    "structure",
    "database",
];

/// Keyword hit counts for one question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntentScore {
    pub data_query: usize,
    pub schema: usize,
}

impl IntentScore {
    pub fn intent(&self) -> Intent {
        if self.data_query > self.schema {
            Intent::DataQuery
        } else if self.schema > 0 {
            Intent::SchemaInfo
        } else {
            Intent::DataQuery
        }
    }
}

/// Classifier over two fixed keyword sets
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    data_query_keywords: Vec<String>,
    schema_keywords: Vec<String>,
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self::with_keywords(DATA_QUERY_KEYWORDS, SCHEMA_KEYWORDS)
    }

    pub fn with_keywords(data_query: &[&str], schema: &[&str]) -> Self {
        Self {
            data_query_keywords: data_query.iter().map(|k| k.to_lowercase()).collect(),
            schema_keywords: schema.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn score(&self, question: &str) -> IntentScore {
        let question = question.to_lowercase();
        let hits = |keywords: &[String]| {
            keywords
                .iter()
                .filter(|keyword| question.contains(keyword.as_str()))
                .count()
        };

        IntentScore {
            data_query: hits(&self.data_query_keywords),
            schema: hits(&self.schema_keywords),
        }
    }

    /// Always resolves to a label
    pub fn classify(&self, question: &str) -> Intent {
        self.score(question).intent()
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("What tables contain PII data?")]
    #[case("Describe the schema")]
    #[case("Which columns are personal information?")]
    #[case("Explain the relationship between riders and trips")]
    #[case("How do I safely join riders and trips tables?")]
    fn test_schema_only_questions(#[case] question: &str) {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.score(question).data_query, 0, "{question}");
        assert_eq!(classifier.classify(question), Intent::SchemaInfo, "{question}");
    }

    #[rstest]
    #[case("What were the top 5 cities by completed trips?")]
    #[case("Show total revenue by city for last week")]
    #[case("How many trips were cancelled yesterday?")]
    #[case("List the average rating per vehicle type")]
    fn test_data_query_questions(#[case] question: &str) {
        let classifier = IntentClassifier::new();
        let score = classifier.score(question);
        assert!(score.data_query > score.schema, "{question}: {score:?}");
        assert_eq!(classifier.classify(question), Intent::DataQuery);
    }

    #[rstest]
    #[case("Hello there")]
    #[case("")]
    #[case("Which riders prefer Denver?")]
    fn test_no_matches_default_to_data_query(#[case] question: &str) {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.score(question), IntentScore::default());
        assert_eq!(classifier.classify(question), Intent::DataQuery);
    }

    #[test]
    fn test_tie_goes_to_schema() {
        let classifier = IntentClassifier::new();
        // "show" vs "table"
        let score = classifier.score("Show me a table");
        assert_eq!(score, IntentScore { data_query: 1, schema: 1 });
        assert_eq!(classifier.classify("Show me a table"), Intent::SchemaInfo);
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let classifier = IntentClassifier::new();
        // "Showing" contains "show", "TABLES" contains "table"
        let score = classifier.score("SHOWING TABLES");
        assert_eq!(score, IntentScore { data_query: 1, schema: 1 });
    }

    #[test]
    fn test_each_keyword_counts_once() {
        let classifier = IntentClassifier::new();
        let score = classifier.score("top top top table");
        assert_eq!(score.data_query, 1);
        assert_eq!(classifier.classify("top top top table"), Intent::SchemaInfo);
    }

    #[test]
    fn test_intent_labels() {
        assert_eq!(Intent::DataQuery.to_string(), "data_query");
        assert_eq!(Intent::SchemaInfo.as_ref(), "schema_info");
        assert_eq!(Intent::from_str("schema_info").unwrap(), Intent::SchemaInfo);
    }
}
