//! Terminal rendering for assistant turns

use crate::ai_sql::TurnOutcome;
use crate::ai_sql::session::{Role, Session, TurnMetrics};
use crate::database::QueryResult;
use crate::format::format_query_results_psql;
use nu_ansi_term::{Color, Style};

const DEFAULT_WIDTH: usize = 100;

/// Current terminal width, or a fixed fallback when not attached to a tty
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .filter(|w| *w >= 20)
        .unwrap_or(DEFAULT_WIDTH)
}

/// `Latency 1.23s | Tokens 456 | Cost $0.000123`
pub fn metrics_line(metrics: &TurnMetrics) -> String {
    format!(
        "Latency {:.2}s | Tokens {} | Cost ${:.6}",
        metrics.latency_secs, metrics.tokens, metrics.cost_usd
    )
}

fn wrap(text: &str, width: usize) -> String {
    textwrap::fill(text, width.max(20))
}

pub fn render_sql(sql: &str) -> String {
    let mut out = String::new();
    out.push_str(&Style::new().dimmed().paint("-- generated SQL").to_string());
    out.push('\n');
    for line in sql.lines() {
        out.push_str(&Color::Cyan.paint(line).to_string());
        out.push('\n');
    }
    out
}

/// Everything shown to the user for one turn
pub fn render_outcome(outcome: &TurnOutcome, width: usize) -> String {
    let mut out = String::new();
    match outcome {
        TurnOutcome::Query {
            sql,
            result,
            metrics,
        } => {
            out.push_str(&render_sql(sql));
            out.push('\n');
            match result {
                QueryResult::Rows(rows) => {
                    out.push_str(&format_query_results_psql(rows));
                    out.push_str(
                        &Color::Green
                            .paint(format!("Retrieved {} rows", rows.len()))
                            .to_string(),
                    );
                }
                QueryResult::Error(error) => {
                    out.push_str(
                        &Color::Red
                            .bold()
                            .paint(format!("Query Error: {}", error))
                            .to_string(),
                    );
                }
            }
            out.push('\n');
            out.push_str(&Style::new().dimmed().paint(metrics_line(metrics)).to_string());
            out.push('\n');
        }
        TurnOutcome::SchemaAnswer { answer, metrics } => {
            out.push_str(&wrap(answer, width));
            out.push_str("\n\n");
            out.push_str(&Style::new().dimmed().paint(metrics_line(metrics)).to_string());
            out.push('\n');
        }
        TurnOutcome::GenerationFailed { .. } => {
            out.push_str(&Color::Red.paint(wrap(&outcome.reply(), width)).to_string());
            out.push('\n');
        }
    }
    out
}

/// Plain-text transcript for `\history`
pub fn render_transcript(session: &Session, width: usize) -> String {
    if session.is_empty() {
        return "No questions asked yet.\n".to_string();
    }

    let mut out = String::new();
    for turn in session.turns() {
        let label = match turn.role {
            Role::User => Color::Yellow.bold().paint("you"),
            Role::Assistant => Color::Cyan.bold().paint("assistant"),
        };
        out.push_str(&format!("{}:\n", label));
        out.push_str(&textwrap::indent(&wrap(&turn.content, width.saturating_sub(2)), "  "));
        if !out.ends_with('\n') {
            out.push('\n');
        }
        if let Some(metrics) = &turn.metrics {
            out.push_str(&format!("  {}\n", Style::new().dimmed().paint(metrics_line(metrics))));
        }
    }
    out
}

/// Display error message
pub fn display_error(message: &str) {
    eprintln!("{}", Color::Red.bold().paint(format!("Error: {}", message)));
}

/// Display success message
pub fn display_success(message: &str) {
    println!("{}", Color::Green.paint(message));
}
