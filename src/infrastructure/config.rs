use serde::Deserialize;

const DEFAULT_PERSONA: &str = "You are Lucy, a monitoring assistant specialized in analyzing device telemetry, \
alarms and network problems for the operations team.";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub completion: CompletionSettings,
    pub monitoring: MonitoringSettings,
    #[serde(default)]
    pub assistant: AssistantSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// Azure-style chat completion deployment and generation parameters
#[derive(Debug, Deserialize, Clone)]
pub struct CompletionSettings {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_completion_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default)]
    pub frequency_penalty: f32,
    #[serde(default)]
    pub presence_penalty: f32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum MonitoringSettings {
    Thingsboard(ThingsBoardSettings),
    Zabbix(ZabbixSettings),
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThingsBoardSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_monitoring_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZabbixSettings {
    pub url: String,
    pub api_token: String,
    #[serde(default = "default_monitoring_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantSettings {
    #[serde(default = "default_persona")]
    pub persona: String,
    #[serde(default = "default_max_sentences")]
    pub max_sentences: u32,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    /// Static infrastructure categories; when set the classifier runs
    /// without fetching a catalog first
    #[serde(default)]
    pub categories: Vec<String>,
    /// Static dashboard table (country sites of the network deployment)
    #[serde(default)]
    pub dashboards: Vec<DashboardEntry>,
    /// Idle time after which a session's dashboard selection is forgotten
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            max_sentences: default_max_sentences(),
            max_context_chars: default_max_context_chars(),
            categories: Vec::new(),
            dashboards: Vec::new(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DashboardEntry {
    pub name: String,
    pub id: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_api_version() -> String {
    "2024-06-01".to_string()
}

fn default_completion_timeout_ms() -> u64 {
    30_000
}

fn default_monitoring_timeout_ms() -> u64 {
    15_000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    800
}

fn default_top_p() -> f32 {
    0.95
}

fn default_persona() -> String {
    DEFAULT_PERSONA.to_string()
}

fn default_max_sentences() -> u32 {
    5
}

fn default_max_context_chars() -> usize {
    4000
}

fn default_session_ttl_secs() -> u64 {
    8 * 60 * 60
}

/// Load `config/assistant.*` overlaid with `ASSISTANT__SECTION__KEY` variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/assistant").required(false))
        .add_source(
            config::Environment::with_prefix("ASSISTANT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

impl AppConfig {
    /// Fail fast on missing credentials or endpoints
    pub fn validate(&self) -> anyhow::Result<()> {
        require("completion.endpoint", &self.completion.endpoint)?;
        require("completion.api_key", &self.completion.api_key)?;
        require("completion.deployment", &self.completion.deployment)?;

        match &self.monitoring {
            MonitoringSettings::Thingsboard(tb) => {
                require("monitoring.url", &tb.url)?;
                require("monitoring.username", &tb.username)?;
                require("monitoring.password", &tb.password)?;
            }
            MonitoringSettings::Zabbix(zabbix) => {
                require("monitoring.url", &zabbix.url)?;
                require("monitoring.api_token", &zabbix.api_token)?;
            }
        }

        if self.assistant.max_context_chars == 0 {
            anyhow::bail!("assistant.max_context_chars must be greater than zero");
        }
        if self.assistant.session_ttl_secs == 0 {
            anyhow::bail!("assistant.session_ttl_secs must be greater than zero");
        }
        Ok(())
    }
}

fn require(key: &str, value: &str) -> anyhow::Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("missing required configuration value `{}`", key);
    }
    Ok(())
}
