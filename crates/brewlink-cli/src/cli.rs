//! Command-line client for a brewing controller and local client preferences.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use brewlink_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use brewlink_ui::bootstrap::DEV_ROOT_URL;
use brewlink_ui::locale::env_languages;
use brewlink_ui::{
    ClientSettings, FileStorage, ImportError, ImportedBeer, LocalPreferenceStore, LocaleOptions,
    detect_locale,
};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::client::{CliError, CliResult, connect, parse_root_url};
use crate::output::{
    render_import, render_locale, render_preferences, render_schedules, render_settings,
};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PREFS_DIR: &str = ".brewlink";

/// Parses CLI arguments, installs logging, executes the requested command
/// and returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: DEFAULT_LOG_LEVEL,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        build_version: env!("CARGO_PKG_VERSION"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let mut stdout = io::stdout().lock();
    match execute(cli, &mut stdout).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli, out: &mut dyn Write) -> CliResult<()> {
    match cli.command {
        Command::Settings => {
            let store = connect(&cli.url, cli.timeout)?;
            store.get_system_settings().await?;
            render_settings(out, &store.snapshot(), cli.output)
        }
        Command::Schedules(args) => {
            let store = connect(&cli.url, cli.timeout)?;
            store.get_mash_schedules().await?;
            store.with_schedules(|schedules| {
                render_schedules(out, schedules, args.grouped, cli.output)
            })
        }
        Command::Prefs(prefs) => handle_prefs(&cli.prefs_dir, prefs, cli.output, out),
        Command::Locale(args) => {
            let options = LocaleOptions {
                country_code_only: args.country_code_only,
            };
            let locale = detect_locale(&env_languages(), options);
            render_locale(out, locale.as_deref(), cli.output)
        }
        Command::Import(args) => {
            let raw = fs::read_to_string(&args.file)
                .with_context(|| format!("failed to read {}", args.file.display()))
                .map_err(CliError::failure)?;
            let beer = ImportedBeer::from_json(&raw).map_err(|err: ImportError| {
                CliError::validation(format!("{}: {err}", args.file.display()))
            })?;
            render_import(out, &beer, cli.output)
        }
    }
}

fn handle_prefs(
    dir: &Path,
    command: PrefsCommand,
    format: OutputFormat,
    out: &mut dyn Write,
) -> CliResult<()> {
    let mut store = LocalPreferenceStore::new(FileStorage::new(dir));
    match command {
        PrefsCommand::Show => {}
        PrefsCommand::Reset => {
            store.reset();
            store
                .save()
                .context("failed to save preferences")
                .map_err(CliError::failure)?;
        }
        PrefsCommand::Set(args) => {
            let mut settings = store.settings().clone();
            apply_pref(&mut settings, &args.field, &args.value)?;
            store.update(|current| *current = settings);
            store
                .save()
                .context("failed to save preferences")
                .map_err(CliError::failure)?;
        }
    }
    render_preferences(out, store.settings(), format)
}

/// Apply one `field = value` edit, accepting camelCase or kebab-case names.
fn apply_pref(settings: &mut ClientSettings, field: &str, value: &str) -> CliResult<()> {
    let key: String = field
        .chars()
        .filter(|ch| *ch != '-' && *ch != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    match key.as_str() {
        "beepenabled" => settings.beep_enabled = parse_bool(field, value)?,
        "beepvolume" => settings.beep_volume = parse_volume(field, value)?,
        "speechenabled" => settings.speech_enabled = parse_bool(field, value)?,
        "speechvolume" => settings.speech_volume = parse_volume(field, value)?,
        "speechrate" => {
            let rate = parse_number(field, value)?;
            if !(0.1..=10.0).contains(&rate) {
                return Err(CliError::validation(format!(
                    "{field} must be between 0.1 and 10"
                )));
            }
            settings.speech_rate = rate;
        }
        "voiceuri" => {
            let value = value.trim();
            settings.voice_uri = match value {
                "" | "default" | "none" => None,
                uri => Some(uri.to_string()),
            };
        }
        "darkmode" => {
            settings.dark_mode = match value.trim().to_ascii_lowercase().as_str() {
                "system" | "auto" | "none" => None,
                _ => Some(parse_bool(field, value)?),
            };
        }
        _ => return Err(CliError::validation(format!("unknown preference '{field}'"))),
    }
    Ok(())
}

fn parse_bool(field: &str, value: &str) -> CliResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(CliError::validation(format!(
            "{field} expects true or false, got '{value}'"
        ))),
    }
}

fn parse_number(field: &str, value: &str) -> CliResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| CliError::validation(format!("{field} expects a number, got '{value}'")))
}

fn parse_volume(field: &str, value: &str) -> CliResult<f64> {
    let volume = parse_number(field, value)?;
    if (0.0..=1.0).contains(&volume) {
        Ok(volume)
    } else {
        Err(CliError::validation(format!(
            "{field} must be between 0 and 1"
        )))
    }
}

#[derive(Parser)]
#[command(name = "brewlink", about = "Inspect a brewing controller and local client preferences")]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "BREWLINK_URL",
        value_parser = parse_root_url,
        default_value = DEV_ROOT_URL,
        help = "Controller root URL; requests go to <url>api"
    )]
    url: String,
    #[arg(
        long,
        global = true,
        env = "BREWLINK_PREFS_DIR",
        default_value = DEFAULT_PREFS_DIR,
        help = "Directory holding local preferences"
    )]
    prefs_dir: PathBuf,
    #[arg(
        long,
        global = true,
        env = "BREWLINK_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        help = "HTTP timeout in seconds"
    )]
    timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[arg(
        long,
        global = true,
        value_parser = parse_log_format,
        help = "Log format written to stderr (pretty, text or json)"
    )]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch controller settings and refresh schedules.
    Settings,
    /// Fetch mash and boil schedules.
    Schedules(SchedulesArgs),
    /// Show or edit local preferences.
    #[command(subcommand)]
    Prefs(PrefsCommand),
    /// Print the locale reported by the environment.
    Locale(LocaleArgs),
    /// Parse a recipe document and print its grouped notifications.
    Import(ImportArgs),
}

#[derive(Args)]
struct SchedulesArgs {
    #[arg(long, help = "Group notifications by time from start")]
    grouped: bool,
}

#[derive(Subcommand)]
enum PrefsCommand {
    /// Print the stored preferences.
    Show,
    /// Restore and save the defaults.
    Reset,
    /// Change one preference and save.
    Set(PrefSetArgs),
}

#[derive(Args)]
struct PrefSetArgs {
    #[arg(help = "Preference name, e.g. beep-volume or speechRate")]
    field: String,
    #[arg(help = "New value")]
    value: String,
}

#[derive(Args)]
struct LocaleArgs {
    #[arg(long, help = "Print only the primary language subtag")]
    country_code_only: bool,
}

#[derive(Args)]
struct ImportArgs {
    #[arg(help = "Path to a recipe JSON document")]
    file: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    LogFormat::parse(value).ok_or_else(|| format!("unknown log format '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewlink_test_support::controller::FakeController;
    use brewlink_test_support::fixtures::{FAHRENHEIT, mash_schedules, rejection, system_settings};
    use serde_json::{Value, json};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("brewlink").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    async fn run_captured(cli: Cli) -> (CliResult<()>, String) {
        let mut buffer = Vec::new();
        let result = execute(cli, &mut buffer).await;
        (result, String::from_utf8(buffer).expect("utf-8 output"))
    }

    fn prefs_args<'a>(dir: &'a Path, rest: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec!["--prefs-dir", dir.to_str().expect("utf-8 temp path")];
        args.extend_from_slice(rest);
        args
    }

    #[test]
    fn defaults_point_at_development_controller() {
        let cli = parse(&["settings"]);
        assert_eq!(cli.url, DEV_ROOT_URL);
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cli.prefs_dir, PathBuf::from(DEFAULT_PREFS_DIR));
        assert_eq!(cli.output, OutputFormat::Text);
        assert!(cli.log_format.is_none());
    }

    #[test]
    fn log_format_flag_uses_telemetry_names() {
        assert_eq!(
            parse(&["--log-format", "json", "locale"]).log_format,
            Some(LogFormat::Json)
        );
        assert_eq!(
            parse(&["locale", "--log-format", "Text"]).log_format,
            Some(LogFormat::Pretty)
        );
        assert!(Cli::try_parse_from(["brewlink", "--log-format", "yaml", "locale"]).is_err());
    }

    #[test]
    fn url_flag_is_normalised_and_validated() {
        let cli = parse(&["--url", "http://10.0.0.4", "schedules", "--grouped"]);
        assert_eq!(cli.url, "http://10.0.0.4/");
        assert!(Cli::try_parse_from(["brewlink", "--url", "nope", "settings"]).is_err());
    }

    #[test]
    fn apply_pref_accepts_kebab_and_camel_case() -> CliResult<()> {
        let mut settings = ClientSettings::default();
        apply_pref(&mut settings, "beep-volume", "0.25")?;
        apply_pref(&mut settings, "speechEnabled", "on")?;
        apply_pref(&mut settings, "voice_uri", "urn:voice:de")?;
        apply_pref(&mut settings, "dark-mode", "system")?;
        assert!((settings.beep_volume - 0.25).abs() < f64::EPSILON);
        assert!(settings.speech_enabled);
        assert_eq!(settings.voice_uri.as_deref(), Some("urn:voice:de"));
        assert_eq!(settings.dark_mode, None);
        Ok(())
    }

    #[test]
    fn apply_pref_rejects_bad_input_as_validation() {
        let mut settings = ClientSettings::default();
        for (field, value) in [
            ("beep-volume", "1.5"),
            ("speech-rate", "0"),
            ("beep-enabled", "maybe"),
            ("volume", "1"),
        ] {
            let err = apply_pref(&mut settings, field, value).expect_err("rejected");
            assert_eq!(err.exit_code(), 2);
        }
        assert_eq!(settings, ClientSettings::default());
    }

    #[tokio::test]
    async fn prefs_set_persists_and_reset_restores() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (result, _) =
            run_captured(parse(&prefs_args(dir.path(), &["prefs", "set", "speech-rate", "1.5"]))).await;
        assert!(result.is_ok());

        let (result, text) =
            run_captured(parse(&prefs_args(dir.path(), &["--output", "json", "prefs", "show"]))).await;
        assert!(result.is_ok());
        let shown: Value = serde_json::from_str(&text).expect("json output");
        assert_eq!(shown["speechRate"], json!(1.5));

        let (result, text) = run_captured(parse(&prefs_args(dir.path(), &["prefs", "reset"]))).await;
        assert!(result.is_ok());
        assert!(text.contains("rate 0.7"));
    }

    #[tokio::test]
    async fn settings_command_reports_fahrenheit() {
        let controller = FakeController::start().await;
        controller
            .reply("GetSystemSettings", system_settings(FAHRENHEIT))
            .await;
        controller.reply("GetMashSchedules", mash_schedules()).await;

        let root = controller.root_url();
        let (result, text) = run_captured(parse(&["--url", root.as_str(), "settings"])).await;
        assert!(result.is_ok());
        assert!(text.contains("scale: Fahrenheit (°F)"));
        assert!(text.contains("schedules: 2/10"));
    }

    #[tokio::test]
    async fn schedules_command_groups_notifications() {
        let controller = FakeController::start().await;
        controller.reply("GetMashSchedules", mash_schedules()).await;

        let root = controller.root_url();
        let (result, text) =
            run_captured(parse(&["--url", root.as_str(), "schedules", "--grouped"])).await;
        assert!(result.is_ok());
        assert!(text.contains("Single infusion [mash] 2 steps, 2 notifications"));
        assert!(text.contains("  at 55 min: Aroma hops"));
    }

    #[tokio::test]
    async fn controller_rejection_is_an_operational_failure() {
        let controller = FakeController::start().await;
        controller
            .reply_raw("GetMashSchedules", 200, rejection("busy").to_string())
            .await;

        let root = controller.root_url();
        let (result, _) = run_captured(parse(&["--url", root.as_str(), "schedules"])).await;
        let err = result.expect_err("rejection fails");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.display_message(),
            "controller rejected GetMashSchedules: busy"
        );
    }

    #[tokio::test]
    async fn import_prints_grouped_recipe() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("recipe.json");
        fs::write(
            &path,
            json!({
                "name": "Stout",
                "mashNotifications": [
                    {"name": "Dough in", "timeFromStart": 0, "buzzer": true},
                    {"name": "Roast", "timeFromStart": 0, "buzzer": false}
                ]
            })
            .to_string(),
        )
        .expect("write recipe");

        let file = path.to_str().expect("utf-8 temp path");
        let (result, text) = run_captured(parse(&["import", file])).await;
        assert!(result.is_ok());
        assert!(text.contains("recipe: Stout"));
        assert!(text.contains("  at 0 min: Dough in, Roast"));
        assert!(text.contains("boil: 0 steps"));
    }

    #[tokio::test]
    async fn import_rejects_non_recipe_documents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").expect("write recipe");

        let file = path.to_str().expect("utf-8 temp path");
        let (result, _) = run_captured(parse(&["import", file])).await;
        assert_eq!(result.expect_err("invalid recipe").exit_code(), 2);
    }
}
