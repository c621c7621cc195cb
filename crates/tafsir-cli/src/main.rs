// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use runtime::{DisabledSearch, ServiceRuntime};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tafsir_app::{PrefKey, ReaderState, SearchProvider, VerseProvider};
use tafsir_db::Store;
use tafsir_tui::LaunchOptions;
use tracing_subscriber::EnvFilter;

const LOG_FILTER_ENV: &str = "TAFSIR_LOG";

fn main() {
    if let Err(error) = run() {
        tracing::error!(error = %format!("{error:#}"), "startup failed");
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `tafsir --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = config.db_path()?;
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let log_path = match &options.log_file {
        Some(path) => path.clone(),
        None => default_log_path()?,
    };
    init_logging(&log_path)?;
    tracing::info!(
        config = %options.config_path.display(),
        db = %db_path.display(),
        "starting"
    );

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or {}",
            db_path.display(),
            tafsir_db::DB_PATH_ENV
        )
    })?;
    store.bootstrap()?;
    let mut preferences = store.load_preferences()?;
    if store.get_raw(PrefKey::Language)?.is_none()
        && let Some(language) = config.language()
    {
        preferences.language = language;
    }

    let corpus = tafsir_corpus::Client::new(
        config.corpus_base_url(),
        config.arabic_edition(),
        config.translation_editions(),
        config.corpus_timeout()?,
    )
    .with_context(|| {
        format!(
            "invalid [corpus] config in {}; fix base_url/editions/timeout values",
            options.config_path.display()
        )
    })?;

    let search: Arc<dyn SearchProvider> = if config.llm_enabled() {
        let client = tafsir_llm::Client::new(
            config.llm_base_url(),
            config.llm_model(),
            config.llm_timeout()?,
        )
        .with_context(|| {
            format!(
                "invalid [llm] config in {}; fix base_url/model/timeout values",
                options.config_path.display()
            )
        })?
        .with_api_key(config.llm_api_key());
        if options.check_only {
            client.ping()?;
        }
        tracing::info!(
            base_url = client.base_url(),
            model = client.model(),
            authenticated = client.has_api_key(),
            "language model configured"
        );
        Arc::new(tafsir_llm::LlmSearch::new(client))
    } else {
        tracing::info!("language model disabled");
        Arc::new(DisabledSearch)
    };

    if options.check_only {
        println!("config ok: {}", options.config_path.display());
        println!("database ok: {}", db_path.display());
        println!("stored preferences: {}", store.list_preferences()?.len());
        println!("verse service: {}", corpus.base_url());
        if config.llm_enabled() {
            println!("language model ok: {} ({})", config.llm_base_url(), config.llm_model());
        } else {
            println!("language model: disabled");
        }
        return Ok(());
    }

    tracing::info!(base_url = corpus.base_url(), "verse service configured");
    let corpus: Arc<dyn VerseProvider> = Arc::new(corpus);
    let mut state = ReaderState::new(preferences);
    let mut runtime = ServiceRuntime::new(&store, corpus, search);
    let launch = LaunchOptions {
        start_surah: config.start_surah(),
    };
    let result = tafsir_tui::run_app(&mut state, &mut runtime, launch);
    tracing::info!("exiting");
    result
}

fn default_log_path() -> Result<PathBuf> {
    let cache_root = dirs::cache_dir()
        .ok_or_else(|| anyhow!("cannot resolve cache directory; pass --log-file <path>"))?;
    Ok(cache_root.join(tafsir_db::APP_NAME).join("tafsir.log"))
}

/// Sends `tracing` output to `path`. The terminal belongs to the TUI.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}; pass --log-file <path>", path.display()))?;

    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    log_file: Option<PathBuf>,
    print_config_path: bool,
    print_db_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        log_file: None,
        print_config_path: false,
        print_db_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--log-file" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-file requires a file path"))?;
                options.log_file = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("tafsir: read, search, and study the Qur'an in the terminal");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config + DB + service clients, then exit");
    println!("  --log-file <path>        Write logs here (filter with {LOG_FILTER_ENV})");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, init_logging, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/tafsir-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                log_file: None,
                print_config_path: false,
                print_db_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_and_log_paths() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--log-file",
                "/tmp/tafsir.log",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.log_file, Some(PathBuf::from("/tmp/tafsir.log")));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--log-file"], default_options_path())
            .expect_err("missing log value should fail");
        assert!(error.to_string().contains("--log-file requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--demo"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--print-config-path",
                "--print-path",
                "--print-example-config",
                "--check",
            ],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_db_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn init_logging_creates_log_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("tafsir.log");
        init_logging(&path)?;
        tracing::info!("log line for test");
        let contents = std::fs::read_to_string(&path)?;
        assert!(contents.contains("log line for test"));
        Ok(())
    }
}
