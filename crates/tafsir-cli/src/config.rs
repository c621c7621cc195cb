// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tafsir_app::{Language, SurahId};

const CONFIG_VERSION: i64 = 1;
pub const CONFIG_PATH_ENV: &str = "TAFSIR_CONFIG_PATH";
const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_LLM_MODEL: &str = "qwen3";
const DEFAULT_LLM_TIMEOUT: &str = "30s";
const DEFAULT_CORPUS_TIMEOUT: &str = "10s";
const DEFAULT_API_KEY_ENV: &str = "TAFSIR_LLM_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub corpus: Corpus,
    #[serde(default)]
    pub llm: Llm,
    #[serde(default)]
    pub ui: Ui,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            corpus: Corpus::default(),
            llm: Llm::default(),
            ui: Ui::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Corpus {
    pub base_url: Option<String>,
    pub arabic_edition: Option<String>,
    pub translation_editions: Option<Vec<String>>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Llm {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout: Option<String>,
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ui {
    pub start_surah: Option<u16>,
    pub language: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(tafsir_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` and keep values under [storage], [corpus], [llm], and [ui]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run `tafsir --print-example-config` for the current layout",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            tafsir_db::validate_db_path(db_path)?;
        }

        for (field, raw) in [
            ("corpus.timeout", &self.corpus.timeout),
            ("llm.timeout", &self.llm.timeout),
        ] {
            if let Some(raw) = raw {
                let parsed = parse_duration(raw)
                    .with_context(|| format!("{field} in {}", path.display()))?;
                if parsed <= Duration::ZERO {
                    bail!(
                        "{field} in {} must be positive, got {raw}",
                        path.display()
                    );
                }
            }
        }

        if let Some(editions) = &self.corpus.translation_editions
            && editions.len() != 2
        {
            bail!(
                "corpus.translation_editions in {} must list exactly two editions, got {}",
                path.display(),
                editions.len()
            );
        }

        if let Some(start) = self.ui.start_surah
            && SurahId::new(start).is_none()
        {
            bail!(
                "ui.start_surah in {} must be between 1 and 114, got {start}",
                path.display()
            );
        }

        if let Some(language) = &self.ui.language
            && Language::parse(language).is_none()
        {
            bail!(
                "ui.language in {} must be \"en\" or \"ar\", got {language:?}",
                path.display()
            );
        }

        if let Some(name) = &self.llm.api_key_env
            && name.trim().is_empty()
        {
            bail!(
                "llm.api_key_env in {} must name an environment variable",
                path.display()
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => tafsir_db::default_db_path(),
        }
    }

    pub fn corpus_base_url(&self) -> &str {
        self.corpus
            .base_url
            .as_deref()
            .unwrap_or(tafsir_corpus::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn arabic_edition(&self) -> &str {
        self.corpus
            .arabic_edition
            .as_deref()
            .unwrap_or(tafsir_corpus::DEFAULT_ARABIC_EDITION)
    }

    pub fn translation_editions(&self) -> [&str; 2] {
        match self.corpus.translation_editions.as_deref() {
            Some([primary, secondary]) => [primary.as_str(), secondary.as_str()],
            _ => tafsir_corpus::DEFAULT_TRANSLATION_EDITIONS,
        }
    }

    pub fn corpus_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.corpus
                .timeout
                .as_deref()
                .unwrap_or(DEFAULT_CORPUS_TIMEOUT),
        )
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm.enabled.unwrap_or(true)
    }

    pub fn llm_base_url(&self) -> &str {
        self.llm
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_LLM_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn llm_model(&self) -> &str {
        self.llm.model.as_deref().unwrap_or(DEFAULT_LLM_MODEL)
    }

    pub fn llm_timeout(&self) -> Result<Duration> {
        parse_duration(self.llm.timeout.as_deref().unwrap_or(DEFAULT_LLM_TIMEOUT))
    }

    pub fn llm_api_key_env(&self) -> &str {
        self.llm
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV)
    }

    /// The key from the configured environment variable, if set and non-blank.
    pub fn llm_api_key(&self) -> Option<String> {
        env::var(self.llm_api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn start_surah(&self) -> Option<SurahId> {
        self.ui.start_surah.and_then(SurahId::new)
    }

    pub fn language(&self) -> Option<Language> {
        self.ui.language.as_deref().and_then(Language::parse)
    }

    pub fn example_config(path: &Path) -> String {
        let [primary, secondary] = tafsir_corpus::DEFAULT_TRANSLATION_EDITIONS;
        format!(
            "# tafsir config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/tafsir/tafsir.db)\n# db_path = \"/absolute/path/to/tafsir.db\"\n\n[corpus]\nbase_url = \"{}\"\narabic_edition = \"{}\"\ntranslation_editions = [\"{primary}\", \"{secondary}\"]\ntimeout = \"{DEFAULT_CORPUS_TIMEOUT}\"\n\n[llm]\nenabled = true\nbase_url = \"{DEFAULT_LLM_BASE_URL}\"\nmodel = \"{DEFAULT_LLM_MODEL}\"\ntimeout = \"{DEFAULT_LLM_TIMEOUT}\"\n# Read the bearer token for hosted endpoints from this variable.\napi_key_env = \"{DEFAULT_API_KEY_ENV}\"\n\n[ui]\n# Optional. Surah to open on launch.\n# start_surah = 1\n# Used until a language is picked in Settings.\nlanguage = \"en\"\n",
            path.display(),
            tafsir_corpus::DEFAULT_BASE_URL,
            tafsir_corpus::DEFAULT_ARABIC_EDITION,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value.parse().with_context(|| invalid_duration(raw))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value.parse().with_context(|| invalid_duration(raw))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value.parse().with_context(|| invalid_duration(raw))?;
        let Some(secs) = mins.checked_mul(60) else {
            bail!("{}; value is too large", invalid_duration(raw));
        };
        return Ok(Duration::from_secs(secs));
    }

    bail!(invalid_duration(raw))
}

fn invalid_duration(raw: &str) -> String {
    format!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
