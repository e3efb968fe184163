//! VoiceLog CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voicelog::cli::{
    app::{
        load_merged_config, open_journal, resolve_data_dir, run_add, run_days, run_delete,
        run_gc, run_list, run_show, run_trash,
    },
    args::CaptureArgs,
    config_cmd::handle_config_command,
    record::run_record,
    CaptureSettings, Cli, CommandError, Commands, Presenter, EXIT_ERROR,
};
use voicelog::domain::config::AppConfig;
use voicelog::infrastructure::XdgConfigStore;

/// Env var holding the log filter, e.g. `voicelog=debug`
const LOG_ENV: &str = "VOICELOG_LOG";

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    let mut presenter = Presenter::new();

    match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        #[cfg(unix)]
        Commands::Capture { action } => {
            if let Err(e) =
                voicelog::cli::capture_cmd::handle_capture_command(action, &presenter).await
            {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        #[cfg(unix)]
        Commands::Daemon { capture } => {
            let config = load_merged_config(cli_config(cli.data_dir, &capture)).await;
            let settings = match CaptureSettings::from_config(&config) {
                Ok(settings) => settings,
                Err(e) => return fail(&presenter, e),
            };
            let journal = open_journal(&resolve_data_dir(&config));
            voicelog::cli::daemon_app::run_daemon(journal, settings).await
        }
        command => match run(command, cli.data_dir, &mut presenter).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&presenter, e),
        },
    }
}

async fn run(
    command: Commands,
    data_dir: Option<std::path::PathBuf>,
    presenter: &mut Presenter,
) -> Result<(), CommandError> {
    let capture = match &command {
        Commands::Record { capture, .. } => capture.clone(),
        _ => CaptureArgs::default(),
    };
    let config = load_merged_config(cli_config(data_dir, &capture)).await;
    let journal = open_journal(&resolve_data_dir(&config));

    match command {
        Commands::Add { text, day, images } => run_add(&journal, presenter, text, day, images).await,
        Commands::List { day } => run_list(&journal, presenter, day).await,
        Commands::Days { month } => run_days(&journal, presenter, month).await,
        Commands::Show { id } => run_show(&journal, presenter, &id).await,
        Commands::Delete { ids } => run_delete(&journal, presenter, &ids).await,
        Commands::Trash { action } => run_trash(&journal, presenter, action).await,
        Commands::Gc => run_gc(&journal, presenter).await,
        Commands::Record { day, .. } => {
            let settings = CaptureSettings::from_config(&config)?;
            run_record(&journal, presenter, &settings, day).await
        }
        _ => Err(CommandError::Usage(
            "The capture host is only available on Unix systems".to_string(),
        )),
    }
}

/// Command-line layer of the config merge
fn cli_config(data_dir: Option<std::path::PathBuf>, capture: &CaptureArgs) -> AppConfig {
    AppConfig {
        data_dir: data_dir.map(|dir| dir.to_string_lossy().into_owned()),
        language: capture.language.clone(),
        max_duration: capture.max_duration.clone(),
        ..AppConfig::empty()
    }
}

fn fail(presenter: &Presenter, error: CommandError) -> ExitCode {
    presenter.error(&error.to_string());
    ExitCode::from(error.exit_code())
}

/// Log to stderr so stdout stays clean for command output
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
