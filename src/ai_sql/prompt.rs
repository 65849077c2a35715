//! Prompt templates for SQL generation and schema answers

use crate::ai_sql::intent::Intent;
use crate::ai_sql::schema::{PiiRecord, SchemaInfo, pii_listing};

/// Prompt generator for the two question routes
pub struct PromptGenerator;

impl PromptGenerator {
    /// Render the prompt for `intent`. The PII catalog is only embedded for schema questions.
    pub fn build(intent: Intent, question: &str, schema: &SchemaInfo, pii: &[PiiRecord]) -> String {
        match intent {
            Intent::DataQuery => Self::sql_prompt(question, schema),
            Intent::SchemaInfo => Self::schema_prompt(question, schema, pii),
        }
    }

    /// Prompt asking for a single SQLite query and nothing else
    pub fn sql_prompt(question: &str, schema: &SchemaInfo) -> String {
        format!(
            r#"You are an expert SQL developer for a ride-sharing data warehouse.

DATABASE SCHEMA:
{}

IMPORTANT RULES:
- Use SQLite syntax
- Only use tables and columns that exist in the schema above
- For date filtering, use datetime() and date() functions
- For "last week", use: date('now', '-7 days')
- Always use proper JOINs when combining tables
- Return ONLY the SQL query, no explanations

USER QUESTION: {}

Generate the SQL query:"#,
            schema.listing(),
            question
        )
    }

    /// Prompt asking for a prose answer about the schema and PII handling
    pub fn schema_prompt(question: &str, schema: &SchemaInfo, pii: &[PiiRecord]) -> String {
        format!(
            r#"You are an expert on a ride-sharing data warehouse schema and data governance.

DATABASE SCHEMA:
{}

PII METADATA:
{}

USER QUESTION: {}

Provide a clear, concise answer about the schema, tables, columns, or PII handling.
Be specific and reference actual table/column names."#,
            schema.listing(),
            pii_listing(pii),
            question
        )
    }
}
