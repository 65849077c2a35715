use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Navigator - ask questions about ride-sharing data in plain English
#[derive(Parser, Debug, Clone)]
#[command(name = "navigator")]
#[command(version, long_about = None)]
#[command(about = "Ask questions in plain English; get SQL, results and schema/PII guidance")]
pub struct Args {
    /// SQLite database file (defaults to database_path from the config file)
    #[arg(value_name = "DATABASE", env = "NAVIGATOR_DATABASE")]
    pub database: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Ask a question (or run a backslash command) and exit; may be repeated
    #[arg(short, long, action = clap::ArgAction::Append)]
    pub command: Vec<String>,

    /// Generate a synthetic ride-sharing database at DATABASE and exit
    #[arg(long)]
    pub generate_data: bool,

    /// RNG seed for --generate-data, for reproducible data
    #[arg(long, requires = "generate_data")]
    pub seed: Option<u64>,

    /// Log at debug level to stderr
    #[arg(long)]
    pub debug: bool,

    /// Generate shell completions
    #[arg(long, value_enum)]
    pub completions: Option<Shell>,
}

/// Supported shells for completion generation
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl From<Shell> for clap_complete::Shell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_repeated_commands_and_seed() {
        let args = Args::try_parse_from([
            "navigator",
            "rides.db",
            "-c",
            "How many trips?",
            "--command",
            "\\pii",
        ])
        .unwrap();
        assert_eq!(args.database, Some(PathBuf::from("rides.db")));
        assert_eq!(args.command, vec!["How many trips?", "\\pii"]);

        let args = Args::try_parse_from(["navigator", "--generate-data", "--seed", "7"]).unwrap();
        assert!(args.generate_data);
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn test_seed_requires_generate_data() {
        assert!(Args::try_parse_from(["navigator", "--seed", "7"]).is_err());
    }
}
