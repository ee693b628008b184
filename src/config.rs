use crate::error::{AppError, AppResult, ConfigError};
use crate::models::cargo::{Footprint, PALLET_LENGTH, PALLET_WIDTH};
use serde::Deserialize;
use std::path::Path;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 托盘宽度（x 方向）
    pub pallet_width: u8,
    /// 托盘长度（y 方向）
    pub pallet_length: u8,
    /// 每次装一个托盘时最多从缓冲区取多少个箱子
    pub max_batch: usize,
    /// 缓冲区最多容纳多少个箱子
    pub buffer_capacity: usize,
    /// 拆车阶段到装车阶段的空壳通道容量
    pub shell_channel_capacity: usize,
    /// 输出通道容量
    pub output_channel_capacity: usize,
    /// 输入清单文件
    pub manifest_path: String,
    /// 输出文件（每行一辆卡车的 JSON）
    pub output_path: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pallet_width: PALLET_WIDTH,
            pallet_length: PALLET_LENGTH,
            max_batch: 16,
            buffer_capacity: 256,
            shell_channel_capacity: 8,
            output_channel_capacity: 8,
            manifest_path: "manifests/sample.toml".to_string(),
            output_path: "repacked.jsonl".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取配置，没有设置的项使用默认值
    pub fn from_env() -> AppResult<Self> {
        Self::default().merge_env()
    }

    /// 先读 TOML 配置文件，再用环境变量覆盖
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(path.display().to_string(), e))?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;
        config.merge_env()
    }

    fn merge_env(self) -> AppResult<Self> {
        let config = Self {
            pallet_width: env_parse("REPACK_PALLET_WIDTH", self.pallet_width)?,
            pallet_length: env_parse("REPACK_PALLET_LENGTH", self.pallet_length)?,
            max_batch: env_parse("REPACK_MAX_BATCH", self.max_batch)?,
            buffer_capacity: env_parse("REPACK_BUFFER_CAPACITY", self.buffer_capacity)?,
            shell_channel_capacity: env_parse(
                "REPACK_SHELL_CHANNEL_CAPACITY",
                self.shell_channel_capacity,
            )?,
            output_channel_capacity: env_parse(
                "REPACK_OUTPUT_CHANNEL_CAPACITY",
                self.output_channel_capacity,
            )?,
            manifest_path: std::env::var("REPACK_MANIFEST").unwrap_or(self.manifest_path),
            output_path: std::env::var("REPACK_OUTPUT").unwrap_or(self.output_path),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 检查配置项之间的约束
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pallet_width == 0 || self.pallet_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pallet_width/pallet_length",
                reason: "托盘尺寸必须大于 0".to_string(),
            });
        }
        if self.max_batch == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_batch",
                reason: "必须大于 0".to_string(),
            });
        }
        // 容量小于批次时，普通卡车等凑满一批会和拆车阶段互相等待
        if self.buffer_capacity < self.max_batch {
            return Err(ConfigError::InvalidValue {
                field: "buffer_capacity",
                reason: format!(
                    "容量 {} 小于 max_batch {}",
                    self.buffer_capacity, self.max_batch
                ),
            });
        }
        if self.shell_channel_capacity == 0 || self.output_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "shell_channel_capacity/output_channel_capacity",
                reason: "通道容量必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.pallet_width, self.pallet_length)
    }
}

fn env_parse<T: std::str::FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        Err(_) => Ok(default),
    }
}
