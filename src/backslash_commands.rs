use crate::ai_sql::{Assistant, Session, ui};
use crate::config::Config;
use crate::format::{format_pii, format_schema};
use std::error::Error as StdError;
use std::io::Write;

/// Sample questions shown by `\examples` and the banner
pub const EXAMPLE_QUESTIONS: [&str; 5] = [
    "What were the top 10 cities by completed rides last week?",
    "How many trips were cancelled yesterday?",
    "Show average fare by vehicle type",
    "What tables contain PII data?",
    "How do I safely join riders and trips tables?",
];

pub fn is_backslash_command(line: &str) -> bool {
    line.trim_start().starts_with('\\')
}

/// Registry of all backslash commands
pub struct BackslashCommandRegistry;

impl BackslashCommandRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Run one command, writing its output to `out`. Returns `true` to exit.
    pub async fn execute(
        &self,
        command: &str,
        assistant: &mut Assistant,
        session: &Session,
        config: &Config,
        out: &mut dyn Write,
    ) -> Result<bool, Box<dyn StdError>> {
        let mut parts = command.trim().splitn(2, ' ');
        let cmd = parts.next().unwrap_or("");
        let args = parts.next().unwrap_or("").trim();

        match cmd {
            "\\q" => Ok(true),
            "\\h" | "\\?" => {
                print_help_commands(out)?;
                Ok(false)
            }
            "\\history" => {
                if args.eq_ignore_ascii_case("json") {
                    writeln!(out, "{}", session.to_json()?)?;
                } else {
                    write!(out, "{}", ui::render_transcript(session, ui::terminal_width()))?;
                }
                Ok(false)
            }
            "\\schema" => {
                let schema = assistant.schema_cache().schema();
                if args.is_empty() {
                    write!(out, "{}", format_schema(schema))?;
                } else {
                    match schema.table(args) {
                        Some(table) => {
                            let single = crate::ai_sql::SchemaInfo {
                                tables: vec![table.clone()],
                            };
                            write!(out, "{}", format_schema(&single))?;
                        }
                        None => writeln!(out, "Did not find any table named \"{}\".", args)?,
                    }
                }
                Ok(false)
            }
            "\\pii" => {
                let pii = assistant.schema_cache().pii();
                if pii.is_empty() {
                    writeln!(out, "No PII columns are catalogued.")?;
                } else {
                    write!(out, "{}", format_pii(pii))?;
                }
                Ok(false)
            }
            "\\refresh" => {
                match assistant.refresh_schema().await {
                    Ok(()) => {
                        let cache = assistant.schema_cache();
                        writeln!(
                            out,
                            "Schema reloaded: {} tables, {} PII columns.",
                            cache.schema().tables.len(),
                            cache.pii().len()
                        )?;
                    }
                    Err(e) => writeln!(out, "Error refreshing schema: {}", e.user_message())?,
                }
                Ok(false)
            }
            "\\examples" => {
                writeln!(out, "Try asking:")?;
                for example in EXAMPLE_QUESTIONS {
                    writeln!(out, "  {}", example)?;
                }
                Ok(false)
            }
            "\\config" => {
                let described = config.describe();
                let width = described.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
                for (key, value) in described {
                    writeln!(out, "{:<width$}  {}", key, value, width = width)?;
                }
                writeln!(out, "{:<width$}  {}", "completion client", assistant.provider_name(), width = width)?;
                Ok(false)
            }
            "\\cost" => {
                writeln!(
                    out,
                    "{} questions, {} tokens, ${:.6} estimated cost",
                    session.exchanges(),
                    session.total_tokens(),
                    session.total_cost()
                )?;
                Ok(false)
            }
            _ => {
                writeln!(out, "Unknown command: {}. Type \\h for help.", cmd)?;
                Ok(false)
            }
        }
    }
}

impl Default for BackslashCommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn print_help_commands(out: &mut dyn Write) -> std::io::Result<()> {
    let commands = [
        ("\\q", "Quit"),
        ("\\h", "Show this help"),
        ("\\history [json]", "Show the conversation so far"),
        ("\\schema [table]", "Show tables and columns"),
        ("\\pii", "Show the PII catalog"),
        ("\\refresh", "Reload schema and PII metadata from the database"),
        ("\\examples", "Show example questions"),
        ("\\config", "Show the effective configuration"),
        ("\\cost", "Show token usage and cost for this session"),
    ];
    writeln!(out, "Type a question in plain English, or one of:")?;
    for (cmd, desc) in commands {
        writeln!(out, "  {:<18} {}", cmd, desc)?;
    }
    Ok(())
}
