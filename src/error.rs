use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 清单文件错误
    #[error("清单错误: {0}")]
    Manifest(#[from] ManifestError),
    /// 流水线运行错误
    #[error("流水线错误: {0}")]
    Pipeline(#[from] PipelineError),
    /// 文件读写错误
    #[error("文件错误 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 输出序列化失败
    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项取值非法
    #[error("配置项 {field} 非法: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 清单错误
#[derive(Debug, Error)]
pub enum ManifestError {
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 末车后面还有卡车
    #[error("末车之后还有 {remaining} 辆卡车")]
    TerminalNotLast { remaining: usize },
    /// 同一 ID 出现多次
    #[error("卡车 ID {id} 重复")]
    DuplicateTruckId { id: u32 },
}

/// 流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 某个阶段的任务崩溃
    #[error("{stage} 阶段任务异常退出: {source}")]
    StageFailed {
        stage: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },
    /// 下游已关闭，无法继续发送
    #[error("{stage} 阶段的下游通道已关闭")]
    DownstreamClosed { stage: &'static str },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读写错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
