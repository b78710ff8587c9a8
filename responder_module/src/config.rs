use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::working_hours::WorkingHours;

pub const DEFAULT_REPLY_TEXT: &str = "\u{26a0}\u{fe0f} Saat ini Anda menghubungi di luar jam operasional (09:00 - 18:00) \u{26a0}\u{fe0f}\n\nMohon maaf jika terdapat keterlambatan dalam merespons pesan Anda.\n\nTerima kasih atas pengertiannya.";

const DEFAULT_CONFIG_PATH: &str = "responder.toml";
const DEFAULT_STORAGE_PATH: &str = "sent_numbers.json";
const DEFAULT_START_HOUR: u32 = 9;
const DEFAULT_END_HOUR: u32 = 18;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid working hours window: {0}")]
    InvalidWindow(String),
}

#[derive(Debug, Clone)]
pub struct ResponderConfig {
    pub host: String,
    pub port: u16,
    pub working_hours: WorkingHours,
    pub exempt_senders: HashSet<String>,
    pub reply_text: String,
    pub storage_path: PathBuf,
    pub gateway: GatewayConfig,
}

/// Connection settings for the WhatsApp HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub session: String,
    pub api_key: Option<String>,
}

impl ResponderConfig {
    /// Load configuration from the optional TOML file, then apply
    /// environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config_path = env::var("RESPONDER_CONFIG_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let file = load_config_file(&PathBuf::from(config_path))?;

        let host = env::var("RESPONDER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("RESPONDER_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(9200);

        let start_hour = env::var("RESPONDER_WORKING_HOURS_START")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .or(file.working_hours.start)
            .unwrap_or(DEFAULT_START_HOUR);
        let end_hour = env::var("RESPONDER_WORKING_HOURS_END")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .or(file.working_hours.end)
            .unwrap_or(DEFAULT_END_HOUR);
        if start_hour > 23 || end_hour > 23 {
            return Err(ConfigError::InvalidWindow(format!(
                "hours must be 0-23, got {}-{}",
                start_hour, end_hour
            )));
        }
        if start_hour > end_hour {
            return Err(ConfigError::InvalidWindow(format!(
                "start hour {} is after end hour {}",
                start_hour, end_hour
            )));
        }

        let exempt_senders = env::var("RESPONDER_EXEMPT_SENDERS")
            .ok()
            .map(|value| parse_sender_list(&value))
            .unwrap_or_else(|| {
                file.exempt_senders
                    .iter()
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .collect()
            });

        let reply_text = env::var("RESPONDER_REPLY_TEXT")
            .ok()
            .filter(|value| !value.is_empty())
            .or(file.reply_text)
            .unwrap_or_else(|| DEFAULT_REPLY_TEXT.to_string());

        let storage_path = env::var("RESPONDER_STORAGE_PATH")
            .ok()
            .filter(|value| !value.is_empty())
            .or(file.storage_path)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH));

        let gateway = GatewayConfig {
            base_url: env::var("WAHA_BASE_URL")
                .ok()
                .filter(|value| !value.is_empty())
                .or(file.gateway.base_url)
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            session: env::var("WAHA_SESSION")
                .ok()
                .filter(|value| !value.is_empty())
                .or(file.gateway.session)
                .unwrap_or_else(|| "default".to_string()),
            api_key: env::var("WAHA_API_KEY")
                .ok()
                .filter(|value| !value.is_empty())
                .or(file.gateway.api_key),
        };

        Ok(Self {
            host,
            port,
            working_hours: WorkingHours::new(start_hour, end_hour),
            exempt_senders,
            reply_text,
            storage_path,
            gateway,
        })
    }
}

fn load_config_file(path: &PathBuf) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let raw = fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

fn parse_sender_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    working_hours: WorkingHoursSection,
    #[serde(default)]
    exempt_senders: Vec<String>,
    #[serde(default)]
    reply_text: Option<String>,
    #[serde(default)]
    storage_path: Option<String>,
    #[serde(default)]
    gateway: GatewaySection,
}

#[derive(Debug, Default, Deserialize)]
struct WorkingHoursSection {
    #[serde(default)]
    start: Option<u32>,
    #[serde(default)]
    end: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct GatewaySection {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
}
