use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<String>,
    pub index_file: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: Option<String>,
    pub staging_dir: Option<String>,
    pub max_file_size: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_videos: Option<usize>, // 0 = unbounded
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub index_file: PathBuf,
    pub staging_dir: PathBuf,
    pub max_file_size: u64,
    pub max_videos: usize,
    pub log_level: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        // Try to load config file
        let config_path = base_dir.join("config.toml");
        let config_file = if config_path.exists() {
            Some(Self::read_file(&config_path)?)
        } else {
            None
        };

        Ok(Self::from_sources(config_file, |key| std::env::var(key).ok()))
    }

    pub fn read_file(path: &Path) -> anyhow::Result<ConfigFile> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<ConfigFile>(&content)?)
    }

    /// Env vars override the config file, which overrides the defaults.
    pub fn from_sources<F>(config_file: Option<ConfigFile>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = config_file.unwrap_or_default();
        let defaults = Self::default();

        let string = |key: &str, from_file: &Option<String>, default: String| {
            env(key)
                .filter(|v| !v.is_empty())
                .or_else(|| from_file.clone())
                .unwrap_or(default)
        };

        let host = string("HOST", &file.server.host, defaults.host);

        let port = env("PORT")
            .and_then(|p| p.parse().ok())
            .or(file.server.port)
            .unwrap_or(defaults.port);

        let upload_dir = PathBuf::from(string(
            "UPLOAD_DIR",
            &file.storage.upload_dir,
            defaults.upload_dir.display().to_string(),
        ));

        let static_dir = PathBuf::from(string(
            "STATIC_DIR",
            &file.server.static_dir,
            defaults.static_dir.display().to_string(),
        ));

        let index_file = PathBuf::from(string(
            "INDEX_FILE",
            &file.server.index_file,
            defaults.index_file.display().to_string(),
        ));

        let staging_dir = PathBuf::from(string(
            "STAGING_DIR",
            &file.storage.staging_dir,
            defaults.staging_dir.display().to_string(),
        ));

        let max_file_size = env("MAX_FILE_SIZE")
            .and_then(|v| v.parse().ok())
            .or(file.storage.max_file_size)
            .unwrap_or(defaults.max_file_size);

        let max_videos = env("MAX_VIDEOS")
            .and_then(|v| v.parse().ok())
            .or(file.limits.max_videos)
            .unwrap_or(defaults.max_videos);

        let log_level = string("LOG_LEVEL", &file.logging.level, defaults.log_level);

        Self {
            host,
            port,
            upload_dir,
            static_dir,
            index_file,
            staging_dir,
            max_file_size,
            max_videos,
            log_level,
        }
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.upload_dir.join("videos")
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.upload_dir.join("thumbnails")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            upload_dir: PathBuf::from("uploads"),
            static_dir: PathBuf::from("web/static"),
            index_file: PathBuf::from("web/templates/index.html"),
            staging_dir: std::env::temp_dir(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_videos: 0,
            log_level: "info".to_string(),
        }
    }
}
