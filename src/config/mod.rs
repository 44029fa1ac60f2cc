//! Configuration management for the switchboard relay
//!
//! Sources, highest precedence first: process environment (including a
//! `.env` file loaded at startup), the TOML file, built-in defaults.

pub mod file;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use secrecy::SecretString;

use crate::bridge::session::DEFAULT_SETTLE_DELAY;
use crate::persona::{DEFAULT_DATE_FORMAT, DEFAULT_DATE_LOCALE, DateStyle};
use crate::realtime::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_LOGGED_EVENT_TYPES, SessionSettings};
use crate::{Error, Result};
use file::SwitchboardConfigFile;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5050;

/// Default realtime endpoint
pub const DEFAULT_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Default realtime model
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-10-01";

/// Default timezone for the persona date
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

/// Switchboard configuration
#[derive(Debug)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Realtime AI connection
    pub realtime: RealtimeConfig,

    /// Per-call AI session tunables
    pub session: SessionSettings,

    /// Persona script and schedule source
    pub persona: PersonaConfig,

    /// Realtime event types logged at info level
    pub log_event_types: Vec<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on (from `PORT` env)
    pub port: u16,

    /// Host used in stream URLs; the request's Host header when unset
    pub public_host: Option<String>,
}

/// Realtime AI connection
#[derive(Debug)]
pub struct RealtimeConfig {
    /// WebSocket endpoint without the model parameter
    pub url: String,

    /// Model identifier
    pub model: String,

    /// API credential (from `OPENAI_API_KEY` env)
    pub api_key: SecretString,

    /// Delay between connecting and sending the session setup
    pub settle_delay: Duration,

    /// Limit on dialing the AI, handshake included
    pub connect_timeout: Duration,
}

/// Persona script and schedule source
#[derive(Debug, Clone)]
pub struct PersonaConfig {
    /// Template file; the built-in template when unset
    pub template_path: Option<PathBuf>,

    /// Timezone for the date placeholder
    pub timezone: Tz,

    /// Locale and pattern for the date placeholder
    pub date_style: DateStyle,

    /// Schedule document URL
    pub schedule_url: Option<String>,

    /// Accept invalid TLS certificates from the schedule host
    pub schedule_insecure_tls: bool,

    /// Schedule request timeout
    pub schedule_timeout: Duration,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if `OPENAI_API_KEY` is missing or a value is invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(|key| std::env::var(key).ok(), file::load_config_file())
    }

    /// Build configuration from an environment lookup and a parsed config file
    ///
    /// # Errors
    ///
    /// Returns error if no API key is available or a value is invalid
    pub fn from_sources<F>(env: F, fc: SwitchboardConfigFile) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_key = env("OPENAI_API_KEY")
            .or(fc.realtime.api_key)
            .ok_or_else(|| {
                Error::Config("missing OpenAI API key, set OPENAI_API_KEY".to_string())
            })?;

        // Server config (env > toml > default)
        let server = ServerConfig {
            port: parse_env(&env, "PORT")
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            public_host: env("SWITCHBOARD_PUBLIC_HOST").or(fc.server.public_host),
        };

        let realtime = RealtimeConfig {
            url: env("SWITCHBOARD_REALTIME_URL")
                .or(fc.realtime.url)
                .unwrap_or_else(|| DEFAULT_REALTIME_URL.to_string()),
            model: env("SWITCHBOARD_REALTIME_MODEL")
                .or(fc.realtime.model)
                .unwrap_or_else(|| DEFAULT_REALTIME_MODEL.to_string()),
            api_key: SecretString::from(api_key),
            settle_delay: fc
                .realtime
                .settle_delay_ms
                .map_or(DEFAULT_SETTLE_DELAY, Duration::from_millis),
            connect_timeout: parse_env(&env, "SWITCHBOARD_REALTIME_CONNECT_TIMEOUT_SECS")
                .or(fc.realtime.connect_timeout_secs)
                .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs),
        };
        if realtime.connect_timeout.is_zero() {
            return Err(Error::Config(
                "realtime connect timeout must be at least one second".to_string(),
            ));
        }

        // Session tunables (env > toml > default)
        let defaults = SessionSettings::default();
        let session = SessionSettings {
            voice: env("SWITCHBOARD_VOICE")
                .or(fc.session.voice)
                .unwrap_or(defaults.voice),
            audio_format: fc.session.audio_format.unwrap_or(defaults.audio_format),
            temperature: fc.session.temperature.unwrap_or(defaults.temperature),
            vad_threshold: fc.session.vad.threshold.unwrap_or(defaults.vad_threshold),
            vad_prefix_padding_ms: fc
                .session
                .vad
                .prefix_padding_ms
                .unwrap_or(defaults.vad_prefix_padding_ms),
            vad_silence_duration_ms: fc
                .session
                .vad
                .silence_duration_ms
                .unwrap_or(defaults.vad_silence_duration_ms),
            greeting: fc.session.greeting.unwrap_or(defaults.greeting),
        };
        if !(0.0..=1.0).contains(&session.vad_threshold) {
            return Err(Error::Config(format!(
                "VAD threshold must be between 0.0 and 1.0, got {}",
                session.vad_threshold
            )));
        }

        let timezone_name = env("SWITCHBOARD_TIMEZONE")
            .or(fc.persona.timezone)
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = Tz::from_str(&timezone_name)
            .map_err(|e| Error::Config(format!("invalid timezone {timezone_name}: {e}")))?;

        let date_style = DateStyle::new(
            &env("SWITCHBOARD_DATE_FORMAT")
                .or(fc.persona.date_format)
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            &env("SWITCHBOARD_DATE_LOCALE")
                .or(fc.persona.date_locale)
                .unwrap_or_else(|| DEFAULT_DATE_LOCALE.to_string()),
        )?;

        let persona = PersonaConfig {
            template_path: env("SWITCHBOARD_PERSONA_FILE")
                .or(fc.persona.template)
                .map(PathBuf::from),
            timezone,
            date_style,
            schedule_url: env("SWITCHBOARD_SCHEDULE_URL").or(fc.schedule.url),
            schedule_insecure_tls: parse_bool_env(&env, "SWITCHBOARD_SCHEDULE_INSECURE_TLS")
                .or(fc.schedule.insecure_tls)
                .unwrap_or(true),
            schedule_timeout: fc
                .schedule
                .timeout_secs
                .map_or(crate::schedule::DEFAULT_TIMEOUT, Duration::from_secs),
        };

        let log_event_types = fc.session.log_event_types.unwrap_or_else(|| {
            DEFAULT_LOGGED_EVENT_TYPES
                .iter()
                .map(ToString::to_string)
                .collect()
        });

        Ok(Self {
            server,
            realtime,
            session,
            persona,
            log_event_types,
        })
    }
}

fn parse_env<T, F>(env: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

fn parse_bool_env<F>(env: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = env(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring unparseable boolean environment value");
            None
        }
    }
}
