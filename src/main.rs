use clap::{CommandFactory, Parser};
use navigator::ai_sql::{Assistant, Intent, Session, ui};
use navigator::backslash_commands::{BackslashCommandRegistry, EXAMPLE_QUESTIONS, is_backslash_command};
use navigator::cli::Args;
use navigator::config::{Config, LogLevel};
use navigator::database_sqlite::SqliteStore;
use navigator::logging;
use navigator::prompt::NavigatorPrompt;
use navigator::seed::{self, SeedOptions};
use nu_ansi_term::{Color, Style};
use reedline::{DefaultHinter, Emacs, FileBackedHistory, Reedline, Signal, default_emacs_keybindings};
use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

fn print_banner(store: &SqliteStore) {
    println!("{}", Color::Cyan.bold().paint("Navigator"));
    println!(
        "Ask about rides, drivers, riders and cities in {}. For example:",
        store.path().display()
    );
    for example in EXAMPLE_QUESTIONS.iter().take(3) {
        println!("  {}", Style::new().italic().paint(*example));
    }
}

fn print_generation_hint(question: &str, assistant: &Assistant) {
    let label = match assistant.classify(question) {
        Intent::DataQuery => "Generating SQL query...",
        Intent::SchemaInfo => "Analyzing schema...",
    };
    println!("{}", Style::new().dimmed().paint(label));
}

async fn answer(question: &str, assistant: &Assistant, session: &mut Session) {
    print_generation_hint(question, assistant);
    let outcome = assistant.ask(session, question).await;
    print!("{}", ui::render_outcome(&outcome, ui::terminal_width()));
}

async fn generate_data(path: PathBuf, seed: Option<u64>) -> Result<(), Box<dyn StdError>> {
    let mut options = SeedOptions::new(path);
    options.seed = seed;

    println!("Generating synthetic ride-sharing data...");
    let summary = seed::generate(&options).await?;
    ui::display_success(&format!(
        "Created {} with {} cities, {} drivers, {} riders, {} trips and {} PII records.",
        options.path.display(),
        summary.cities,
        summary.drivers,
        summary.riders,
        summary.trips,
        summary.pii_records
    ));
    Ok(())
}

pub async fn async_main() -> Result<(), Box<dyn StdError>> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        clap_complete::generate(
            clap_complete::Shell::from(shell),
            &mut cmd,
            "navigator",
            &mut io::stdout(),
        );
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if args.debug {
        config.logging.level = LogLevel::Debug;
        config.logging.console_output = true;
    }

    let _log_guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };
    debug!(?args, "Navigator started");

    let database_path = args
        .database
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.database_path));

    if args.generate_data {
        return generate_data(database_path, args.seed).await;
    }

    let store = SqliteStore::new(&database_path);
    let mut assistant = match Assistant::connect(config.ai.clone(), store).await {
        Ok(assistant) => assistant,
        Err(e) => {
            ui::display_error(&e.user_message());
            return Err(e.into());
        }
    };
    info!(
        database = %database_path.display(),
        provider = assistant.provider_name(),
        "Assistant ready"
    );

    let registry = BackslashCommandRegistry::new();
    let mut session = Session::new();

    if !args.command.is_empty() {
        for command in &args.command {
            if is_backslash_command(command) {
                if registry
                    .execute(command, &mut assistant, &session, &config, &mut io::stdout())
                    .await?
                {
                    break;
                }
            } else {
                answer(command, &assistant, &mut session).await;
            }
        }
        return Ok(());
    }

    if config.show_banner {
        print_banner(assistant.store());
    }
    println!("Type \\h for help");

    let edit_mode = Box::new(Emacs::new(default_emacs_keybindings()));
    let hinter =
        Box::new(DefaultHinter::default().with_style(Style::new().italic().fg(Color::LightGray)));

    let mut line_editor = Reedline::create()
        .with_edit_mode(edit_mode)
        .with_hinter(hinter);
    match Config::history_file_path() {
        Some(path) => match FileBackedHistory::with_file(config.history_max_entries, path) {
            Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
            Err(e) => eprintln!("Warning: Could not create history file: {}", e),
        },
        None => eprintln!("Warning: Could not determine history file location"),
    }

    let prompt = NavigatorPrompt::new(&assistant.store().name());

    loop {
        match line_editor.read_line(&prompt)? {
            Signal::Success(input) => {
                let input_trimmed = input.trim();

                if input_trimmed.is_empty() {
                    continue;
                }

                if is_backslash_command(input_trimmed) {
                    match registry
                        .execute(input_trimmed, &mut assistant, &session, &config, &mut io::stdout())
                        .await
                    {
                        Ok(should_exit) => {
                            if should_exit {
                                break;
                            }
                        }
                        Err(e) => {
                            eprintln!("Error executing command: {}", e);
                        }
                    }
                } else {
                    answer(input_trimmed, &assistant, &mut session).await;
                }
            }
            Signal::CtrlC => {
                println!("^C");
                continue;
            }
            Signal::CtrlD => {
                println!("\nGoodbye!");
                break;
            }
        }
    }

    info!(
        exchanges = session.exchanges(),
        tokens = session.total_tokens(),
        "Session ended"
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn StdError>> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async_main());
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));
    result
}
