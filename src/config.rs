use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub acquire: AcquireConfig,
    pub separate: SeparateConfig,
    pub transcribe: TranscribeConfig,
    pub translate: TranslateConfig,
    pub tts: TtsConfig,
    pub daemon: DaemonConfig,
}

/// Shared external tool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolsConfig {
    /// ffmpeg binary (name on PATH or absolute path)
    pub ffmpeg: String,
}

/// Video acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AcquireConfig {
    /// Downloader binary driven by the acquisition strategies
    pub downloader: String,
    /// Netscape-format cookie file for the primary download strategy
    pub cookie_file: Option<PathBuf>,
    /// Browser user agent for the guest download strategy
    pub user_agent: String,
    /// Bound on a single acquisition attempt, seconds
    pub timeout_secs: u64,
}

/// Source separation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeparateConfig {
    /// Two-stem separation command. Placeholders: {input}, {outdir}
    pub command: Vec<String>,
    /// Bound on the separation run, seconds
    pub timeout_secs: u64,
}

/// Transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscribeConfig {
    /// Transcription command writing a JSON array of
    /// `{"start", "end", "text"}` objects to {output}.
    /// Placeholders: {input}, {output}
    pub command: Vec<String>,
    /// Bound on the transcription run, seconds
    pub timeout_secs: u64,
}

/// Translation service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslateConfig {
    /// LibreTranslate-compatible endpoint
    pub endpoint: String,
    /// Bound on a single translation request, seconds
    pub timeout_secs: u64,
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TtsConfig {
    /// Per-segment TTS command. Placeholders: {text}, {voice}, {output}
    pub command: Vec<String>,
    /// Bound on a single synthesis call, seconds
    pub timeout_secs: u64,
}

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DaemonConfig {
    /// Unix socket path override (defaults to the runtime dir)
    pub socket: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            downloader: "yt-dlp".to_string(),
            cookie_file: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
                .to_string(),
            timeout_secs: defaults::ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl Default for SeparateConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "demucs".to_string(),
                "--two-stems".to_string(),
                "vocals".to_string(),
                "-o".to_string(),
                "{outdir}".to_string(),
                "--mp3".to_string(),
                "{input}".to_string(),
            ],
            timeout_secs: defaults::SEPARATE_TIMEOUT_SECS,
        }
    }
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "whisper-timestamped".to_string(),
                "{input}".to_string(),
                "--output-json".to_string(),
                "{output}".to_string(),
            ],
            timeout_secs: defaults::TRANSCRIBE_TIMEOUT_SECS,
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/translate".to_string(),
            timeout_secs: defaults::NETWORK_TIMEOUT_SECS,
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "edge-tts".to_string(),
                "--text".to_string(),
                "{text}".to_string(),
                "--voice".to_string(),
                "{voice}".to_string(),
                "--write-media".to_string(),
                "{output}".to_string(),
            ],
            timeout_secs: defaults::SYNTH_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - POLYDUB_FFMPEG → tools.ffmpeg
    /// - POLYDUB_DOWNLOADER → acquire.downloader
    /// - POLYDUB_COOKIE_FILE → acquire.cookie_file
    /// - POLYDUB_TRANSLATE_ENDPOINT → translate.endpoint
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(ffmpeg) = std::env::var("POLYDUB_FFMPEG")
            && !ffmpeg.is_empty()
        {
            self.tools.ffmpeg = ffmpeg;
        }

        if let Ok(downloader) = std::env::var("POLYDUB_DOWNLOADER")
            && !downloader.is_empty()
        {
            self.acquire.downloader = downloader;
        }

        if let Ok(cookie_file) = std::env::var("POLYDUB_COOKIE_FILE")
            && !cookie_file.is_empty()
        {
            self.acquire.cookie_file = Some(PathBuf::from(cookie_file));
        }

        if let Ok(endpoint) = std::env::var("POLYDUB_TRANSLATE_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.translate.endpoint = endpoint;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/polydub/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("polydub")
            .join("config.toml")
    }
}
