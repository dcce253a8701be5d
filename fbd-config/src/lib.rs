use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use fbd_core::convert::{ConvertOptions, DEFAULT_LAYER};
use fbd_core::registry::{DEFAULT_TOLERANCE, LookupStrategy};
use fbd_io::DEFAULT_SCALE;
use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "DXF2FBD_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `DXF2FBD_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置。等级写法与 `tracing_subscriber::EnvFilter` 一致，另接受 `warning`。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "warn".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 转换参数，命令行参数可逐项覆盖。
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    #[serde(default = "ConversionConfig::default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "ConversionConfig::default_scale")]
    pub scale: f64,
    #[serde(default = "ConversionConfig::default_layer")]
    pub layer: String,
    #[serde(default)]
    pub strategy: LookupStrategy,
}

impl ConversionConfig {
    fn default_tolerance() -> f64 {
        DEFAULT_TOLERANCE
    }

    fn default_scale() -> f64 {
        DEFAULT_SCALE
    }

    fn default_layer() -> String {
        DEFAULT_LAYER.to_string()
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            tolerance: self.tolerance,
            layer: self.layer.clone(),
            strategy: self.strategy,
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            tolerance: Self::default_tolerance(),
            scale: Self::default_scale(),
            layer: Self::default_layer(),
            strategy: LookupStrategy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
