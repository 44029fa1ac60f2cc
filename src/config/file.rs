//! TOML configuration file loading
//!
//! Supports `~/.config/switchboard/config.toml` as a persistent config source.
//! Every field is optional. Missing fields fall back to the environment or defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SwitchboardConfigFile {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Realtime AI connection
    #[serde(default)]
    pub realtime: RealtimeFileConfig,

    /// Per-call AI session tunables
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Persona script
    #[serde(default)]
    pub persona: PersonaFileConfig,

    /// Schedule document
    #[serde(default)]
    pub schedule: ScheduleFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// HTTP port
    pub port: Option<u16>,

    /// Public host used in stream URLs instead of the request's Host header
    pub public_host: Option<String>,
}

/// Realtime AI connection
#[derive(Debug, Default, Deserialize)]
pub struct RealtimeFileConfig {
    pub url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Delay before sending the session setup, in ms
    pub settle_delay_ms: Option<u64>,
    /// Give up dialing the AI after this many seconds
    pub connect_timeout_secs: Option<u64>,
}

/// Per-call AI session tunables
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    pub voice: Option<String>,
    pub audio_format: Option<String>,
    pub temperature: Option<f32>,
    pub greeting: Option<String>,
    /// Realtime event types logged at info level
    pub log_event_types: Option<Vec<String>>,

    #[serde(default)]
    pub vad: VadFileConfig,
}

/// Server-side voice activity detection
#[derive(Debug, Default, Deserialize)]
pub struct VadFileConfig {
    pub threshold: Option<f32>,
    pub prefix_padding_ms: Option<u32>,
    pub silence_duration_ms: Option<u32>,
}

/// Persona script
#[derive(Debug, Default, Deserialize)]
pub struct PersonaFileConfig {
    /// Path to the template file
    pub template: Option<String>,

    /// IANA timezone for the date placeholder (e.g. "America/Sao_Paulo")
    pub timezone: Option<String>,

    /// Locale for month names in the date placeholder (e.g. "pt_BR")
    pub date_locale: Option<String>,

    /// strftime pattern for the date placeholder
    pub date_format: Option<String>,
}

/// Schedule document
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleFileConfig {
    pub url: Option<String>,
    /// Accept invalid TLS certificates from the schedule host
    pub insecure_tls: Option<bool>,
    pub timeout_secs: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `SwitchboardConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> SwitchboardConfigFile {
    let Some(path) = config_file_path() else {
        return SwitchboardConfigFile::default();
    };

    if !path.exists() {
        return SwitchboardConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SwitchboardConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SwitchboardConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/switchboard/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("switchboard").join("config.toml"))
}
