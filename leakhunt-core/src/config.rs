//! Configuration types for leakhunt runs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Decision oracle selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// Deterministic rule table, no credentials required
    #[default]
    Rules,
    /// Chat-completion model deciding from the transcript
    Llm,
}

/// Orchestration loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    #[serde(default = "default_termination_phrase")]
    pub termination_phrase: String,
    /// Whole-run deadline; `None` disables it
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: Option<u64>,
    /// Replacement for the embedded prompts.toml
    #[serde(default)]
    pub prompts_path: Option<PathBuf>,
}

fn default_max_turns() -> u32 {
    10
}

fn default_termination_phrase() -> String {
    "TERMINATE".to_string()
}

fn default_run_timeout() -> Option<u64> {
    Some(1800)
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            termination_phrase: default_termination_phrase(),
            run_timeout_secs: default_run_timeout(),
            prompts_path: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

/// GitHub code search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Credential markers OR-ed into brand queries
    #[serde(default = "default_query_terms")]
    pub query_terms: Vec<String>,
}

fn default_search_url() -> String {
    "https://api.github.com/search/code".to_string()
}

fn default_per_page() -> u32 {
    10
}

fn default_http_timeout() -> u64 {
    30
}

fn default_query_terms() -> Vec<String> {
    ["api_key=", "apikey=", "access_token=", "secret=", "password="]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            search_url: default_search_url(),
            per_page: default_per_page(),
            timeout_secs: default_http_timeout(),
            query_terms: default_query_terms(),
        }
    }
}

/// Secret scanner binaries and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_git")]
    pub git: String,
    #[serde(default = "default_trufflehog")]
    pub trufflehog: String,
    #[serde(default = "default_gitleaks")]
    pub gitleaks: String,
    #[serde(default = "default_archive_depth")]
    pub archive_max_depth: u32,
    #[serde(default = "default_scan_timeout")]
    pub timeout_secs: u64,
    /// Parent directory for clone workspaces (system temp dir when unset)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
}

fn default_git() -> String {
    "git".to_string()
}

fn default_trufflehog() -> String {
    "trufflehog".to_string()
}

fn default_gitleaks() -> String {
    "gitleaks".to_string()
}

fn default_archive_depth() -> u32 {
    5
}

fn default_scan_timeout() -> u64 {
    900
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            git: default_git(),
            trufflehog: default_trufflehog(),
            gitleaks: default_gitleaks(),
            archive_max_depth: default_archive_depth(),
            timeout_secs: default_scan_timeout(),
            workspace_root: None,
        }
    }
}

impl ScannerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Network reconnaissance binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_nmap")]
    pub nmap: String,
    #[serde(default = "default_whois")]
    pub whois: String,
    /// Flags placed before the target host
    #[serde(default = "default_nmap_args")]
    pub nmap_args: String,
    #[serde(default = "default_recon_timeout")]
    pub timeout_secs: u64,
}

fn default_nmap() -> String {
    "nmap".to_string()
}

fn default_whois() -> String {
    "whois".to_string()
}

fn default_nmap_args() -> String {
    "-sT -Pn".to_string()
}

fn default_recon_timeout() -> u64 {
    300
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            nmap: default_nmap(),
            whois: default_whois(),
            nmap_args: default_nmap_args(),
            timeout_secs: default_recon_timeout(),
        }
    }
}

impl ReconConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Oracle configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub kind: OracleKind,
}

/// Azure OpenAI chat-completions provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub deployment: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_api_version() -> String {
    "2024-06-01".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_max_retries() -> usize {
    3
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            deployment: None,
            api_version: default_api_version(),
            api_key: None,
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            timeout_secs: default_http_timeout(),
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeakhuntConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub scanners: ScannerConfig,
    #[serde(default)]
    pub recon: ReconConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl LeakhuntConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from default locations with cascade:
    /// 1. ./leakhunt.toml (local override)
    /// 2. ~/.leakhunt/config.toml (global defaults)
    /// 3. Built-in defaults
    ///
    /// A file that exists but cannot be read or parsed is logged and skipped.
    pub fn load_default() -> Self {
        let mut candidates = vec![PathBuf::from("leakhunt.toml")];
        candidates.extend(Self::global_config_path());
        Self::load_first(candidates)
    }

    /// First readable config among `paths`, else the built-in defaults
    pub fn load_first(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        for path in paths {
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::debug!(path = %path.display(), "loaded config");
                    return config;
                }
                Err(crate::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "ignoring unreadable config");
                }
            }
        }

        Self::default()
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".leakhunt").join("config.toml"))
    }

    /// Expand `${VAR}` references in credential fields, then fill empty
    /// credentials from the conventional environment variables.
    pub fn expand_env_vars(&mut self) {
        for field in [
            &mut self.github.token,
            &mut self.provider.api_key,
            &mut self.provider.endpoint,
            &mut self.provider.deployment,
        ] {
            expand_placeholder(field);
        }

        fill_from_env(&mut self.github.token, "GITHUB_TOKEN");
        fill_from_env(&mut self.provider.api_key, "AZURE_OPENAI_API_KEY");
        fill_from_env(&mut self.provider.endpoint, "AZURE_OPENAI_ENDPOINT");
        fill_from_env(&mut self.provider.deployment, "AZURE_OPENAI_DEPLOYMENT");
    }
}

fn expand_placeholder(field: &mut Option<String>) {
    let Some(value) = field.as_deref() else {
        return;
    };
    if let Some(var_name) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        *field = std::env::var(var_name).ok();
    }
}

fn fill_from_env(field: &mut Option<String>, var_name: &str) {
    let empty = field.as_deref().map(str::is_empty).unwrap_or(true);
    if empty {
        if let Ok(value) = std::env::var(var_name) {
            if !value.is_empty() {
                *field = Some(value);
            }
        }
    }
}
