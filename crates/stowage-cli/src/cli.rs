//! Command-line parsing, bootstrap, and dispatch for the Stowage CLI.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use stowage_config::{
    Argon2Hasher, CONFIG_FILE_ENV, ConfigBackend, CredentialHasher, FileConfigBackend,
    SessionDeps, default_config_path,
};
use stowage_i18n::{DEFAULT_LOCALE, I18nConfig, LocaleCode};
use stowage_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::client::{
    CliDependencies, CliError, CliResult, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, parse_url,
};
use crate::commands::settings::{handle_settings_edit, handle_settings_show};
use crate::console::{ConsoleNotifier, RefetchReloader};
use crate::remote::{HttpConfigBackend, HttpHasher};

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let trace_id = Uuid::new_v4().to_string();

    let result = match bootstrap(&cli) {
        Ok(()) => dispatch(cli, &trace_id).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn bootstrap(cli: &Cli) -> CliResult<()> {
    init_logging(&LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        build_sha: option_env!("STOWAGE_BUILD_SHA").unwrap_or("dev"),
    })
    .map_err(CliError::failure)?;

    let locale = resolve_locale(cli.locale.as_deref())?;
    I18nConfig::bundled(locale)
        .and_then(stowage_i18n::init)
        .map_err(|err| CliError::failure(anyhow::Error::new(err)))?;
    debug!(build_sha = build_sha(), locale = locale.code(), "cli bootstrapped");
    Ok(())
}

/// Pick the display locale: explicit flag, then the environment, then the default.
pub(crate) fn resolve_locale(requested: Option<&str>) -> CliResult<LocaleCode> {
    match requested.map(str::trim).filter(|tag| !tag.is_empty()) {
        Some(tag) => LocaleCode::from_lang_tag(tag).ok_or_else(|| {
            let known: Vec<&str> = LocaleCode::all().iter().map(|l| l.code()).collect();
            CliError::validation(format!(
                "unsupported locale '{tag}' (available: {})",
                known.join(", ")
            ))
        }),
        None => Ok(LocaleCode::detect().unwrap_or(DEFAULT_LOCALE)),
    }
}

async fn dispatch(cli: Cli, trace_id: &str) -> CliResult<()> {
    let ctx = build_context(&cli, trace_id)?;
    match cli.command {
        Command::Settings(settings) => match settings {
            SettingsCommand::Show => handle_settings_show(&ctx).await,
            SettingsCommand::Edit(args) => handle_settings_edit(&ctx, args).await,
        },
    }
}

/// Where the configuration lives for this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Remote(Url),
    Local(PathBuf),
}

impl Target {
    fn from_cli(cli: &Cli) -> CliResult<Self> {
        if let Some(path) = &cli.config_file {
            return Ok(Self::Local(path.clone()));
        }
        if cli.local {
            return default_config_path().map(Self::Local).ok_or_else(|| {
                CliError::validation(
                    "could not determine the user config directory; pass --config-file",
                )
            });
        }
        Ok(Self::Remote(cli.api_url.clone()))
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) deps: SessionDeps,
    pub(crate) output: OutputFormat,
    pub(crate) recovery_path: Option<PathBuf>,
}

impl AppContext {
    /// Wire session collaborators for `target`.
    pub(crate) fn for_target(
        target: Target,
        timeout_secs: u64,
        trace_id: &str,
        output: OutputFormat,
    ) -> CliResult<Self> {
        let backend: Arc<dyn ConfigBackend>;
        let hasher: Arc<dyn CredentialHasher>;
        let recovery_path = match target {
            Target::Local(path) => {
                debug!(path = %path.display(), "editing local configuration file");
                backend = Arc::new(FileConfigBackend::new(&path));
                hasher = Arc::new(Argon2Hasher);
                Some(path)
            }
            Target::Remote(base_url) => {
                debug!(%base_url, "editing remote configuration");
                let http = CliDependencies::new(timeout_secs, trace_id)?;
                backend = Arc::new(HttpConfigBackend::new(
                    http.client.clone(),
                    base_url.clone(),
                ));
                hasher = Arc::new(HttpHasher::new(http.client, base_url));
                default_config_path()
            }
        };

        let reloader = Arc::new(RefetchReloader::new(Arc::clone(&backend)));
        Ok(Self {
            deps: SessionDeps::new(backend, hasher, Arc::new(ConsoleNotifier), reloader),
            output,
            recovery_path,
        })
    }
}

fn build_context(cli: &Cli, trace_id: &str) -> CliResult<AppContext> {
    AppContext::for_target(Target::from_cli(cli)?, cli.timeout, trace_id, cli.output)
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse()
}

#[derive(Parser)]
#[command(name = "stowage", about = "Settings editor for a Stowage instance")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "STOWAGE_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    api_url: Url,
    #[arg(
        long,
        global = true,
        env = "STOWAGE_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    timeout: u64,
    #[arg(
        long,
        global = true,
        env = CONFIG_FILE_ENV,
        help = "Edit this configuration file directly instead of a running server"
    )]
    config_file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Edit the configuration file in the default location"
    )]
    local: bool,
    #[arg(long, global = true, env = "STOWAGE_LOCALE")]
    locale: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[arg(long, global = true, env = "STOWAGE_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
    #[arg(long, global = true, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the current settings.
    Show,
    /// Edit and submit the settings.
    Edit(EditArgs),
}

#[derive(Debug, Default, Args)]
pub(crate) struct EditArgs {
    /// Set the instance id (only while it is still unset).
    #[arg(long)]
    pub(crate) instance: Option<String>,
    #[arg(long, conflicts_with = "enable_auth")]
    pub(crate) disable_auth: bool,
    #[arg(long)]
    pub(crate) enable_auth: bool,
    /// Add a user; its password is prompted for.
    #[arg(long = "add-user", value_name = "NAME")]
    pub(crate) add_users: Vec<String>,
    #[arg(long = "remove-user", value_name = "NAME")]
    pub(crate) remove_users: Vec<String>,
    /// Replace a user's password; the new one is prompted for.
    #[arg(long = "set-password", value_name = "NAME")]
    pub(crate) set_passwords: Vec<String>,
    /// Password used for every added or changed user instead of prompting.
    #[arg(long, env = "STOWAGE_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
    /// Print the pending draft without submitting it.
    #[arg(long)]
    pub(crate) dry_run: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}
