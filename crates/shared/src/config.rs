//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{FlowgenError, Result};
use crate::observability::ObservabilityConfig;

/// 环境变量前缀（FLOWGEN_GENERATOR__SEED -> generator.seed）
pub const ENV_PREFIX: &str = "FLOWGEN";

/// 数据生成配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// 生成参数文件（generator_params.json），为空时使用内置默认参数
    pub params_path: Option<PathBuf>,
    /// 数据集根目录，分区文件写在该目录之下
    pub data_dir: PathBuf,
    /// 随机种子，设置后所有子命令的输出可复现
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            params_path: None,
            data_dir: PathBuf::from("data"),
            seed: None,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub generator: GeneratorConfig,
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "flowgen".to_string(),
            environment: "development".to_string(),
            generator: GeneratorConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. 内置默认值
    /// 2. config/default.toml（默认配置）
    /// 3. config/{environment}.toml（环境特定配置）
    /// 4. 环境变量（FLOWGEN_ 前缀，`__` 分隔层级）
    ///
    /// 配置目录由 CONFIG_DIR 指定，环境名由 FLOWGEN_ENV 指定。
    pub fn load(service_name: &str) -> Result<Self> {
        let env = std::env::var("FLOWGEN_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), &env, service_name)
    }

    /// 从指定目录加载配置
    pub fn load_from(config_dir: &Path, env: &str, service_name: &str) -> Result<Self> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .set_default("observability.service_name", service_name)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置项之间的约束
    fn validate(&self) -> Result<()> {
        if self.generator.data_dir.as_os_str().is_empty() {
            return Err(FlowgenError::InvalidConfig {
                field: "generator.data_dir".to_string(),
                message: "数据目录不能为空".to_string(),
            });
        }
        Ok(())
    }
}
