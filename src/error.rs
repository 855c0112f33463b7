use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 配置错误（致命，启动前中止）
    Config(ConfigError),
    /// 浏览器会话错误（致命，中止整个运行）
    Session(SessionError),
    /// 导航错误（重试一次后记录为单页失败）
    Navigation(NavigationError),
    /// 对象存储错误
    Storage(StorageError),
    /// 本地文件操作错误
    File(FileError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Session(e) => write!(f, "浏览器会话错误: {}", e),
            AppError::Navigation(e) => write!(f, "导航错误: {}", e),
            AppError::Storage(e) => write!(f, "存储错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Session(e) => Some(e),
            AppError::Navigation(e) => Some(e),
            AppError::Storage(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 配置相关错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件不存在
    FileNotFound {
        path: String,
    },
    /// YAML 解析失败
    YamlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 页面条目缺少必填字段
    MissingField {
        page_index: usize,
        field: &'static str,
    },
    /// 输出格式不在允许集合内
    InvalidFormat {
        value: String,
    },
    /// 页面列表为空
    EmptyPages,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound { path } => write!(f, "配置文件不存在: {}", path),
            ConfigError::YamlParseFailed { path, source } => {
                write!(f, "YAML解析失败 ({}): {}", path, source)
            }
            ConfigError::MissingField { page_index, field } => {
                write!(f, "第 {} 个页面条目缺少字段: {}", page_index + 1, field)
            }
            ConfigError::InvalidFormat { value } => {
                write!(f, "无效的输出格式 '{}'，允许: markdown / png / pdf", value)
            }
            ConfigError::EmptyPages => write!(f, "配置中没有任何页面条目"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::YamlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 浏览器会话相关错误
#[derive(Debug)]
pub enum SessionError {
    /// 浏览器配置构建失败
    ConfigurationFailed {
        message: String,
    },
    /// 启动浏览器失败
    LaunchFailed {
        profile_dir: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::ConfigurationFailed { message } => {
                write!(f, "浏览器配置失败: {}", message)
            }
            SessionError::LaunchFailed { profile_dir, source } => {
                write!(f, "启动浏览器失败 (配置目录: {}): {}", profile_dir, source)
            }
            SessionError::PageCreationFailed { source } => {
                write!(f, "创建页面失败: {}", source)
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::LaunchFailed { source, .. }
            | SessionError::PageCreationFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 导航相关错误
#[derive(Debug)]
pub enum NavigationError {
    /// 导航超时
    Timeout {
        url: String,
        timeout_secs: u64,
    },
    /// 导航失败
    GotoFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 页面内容区域未在超时内渲染完成
    ContentNotReady {
        url: String,
        selector: String,
    },
    /// 页面要求登录
    LoginRequired {
        url: String,
    },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::Timeout { url, timeout_secs } => {
                write!(f, "导航到 {} 超时 ({}秒)", url, timeout_secs)
            }
            NavigationError::GotoFailed { url, source } => {
                write!(f, "导航到 {} 失败: {}", url, source)
            }
            NavigationError::ContentNotReady { url, selector } => {
                write!(f, "页面 {} 的内容区域未渲染完成 (选择器: {})", url, selector)
            }
            NavigationError::LoginRequired { url } => {
                write!(f, "页面 {} 需要登录", url)
            }
        }
    }
}

impl std::error::Error for NavigationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavigationError::GotoFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 对象存储相关错误
#[derive(Debug)]
pub enum StorageError {
    /// 上传对象失败
    UploadFailed {
        bucket: String,
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 列举对象失败
    ListFailed {
        bucket: String,
        prefix: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::UploadFailed { bucket, key, source } => {
                write!(f, "上传失败 (s3://{}/{}): {}", bucket, key, source)
            }
            StorageError::ListFailed { bucket, prefix, source } => {
                write!(f, "列举对象失败 (s3://{}/{}): {}", bucket, prefix, source)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::UploadFailed { source, .. }
            | StorageError::ListFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 本地文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 删除文件失败
    DeleteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::DeleteFailed { path, source } => {
                write!(f, "删除文件失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::WriteFailed { source, .. }
            | FileError::ReadFailed { source, .. }
            | FileError::DeleteFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(ConfigError::YamlParseFailed {
            path: String::new(), // YAML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器启动错误
    pub fn session_launch_failed(
        profile_dir: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Session(SessionError::LaunchFailed {
            profile_dir: profile_dir.into(),
            source: Box::new(source),
        })
    }

    /// 创建导航超时错误
    pub fn navigation_timeout(url: impl Into<String>, timeout_secs: u64) -> Self {
        AppError::Navigation(NavigationError::Timeout {
            url: url.into(),
            timeout_secs,
        })
    }

    /// 创建导航失败错误
    pub fn goto_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Navigation(NavigationError::GotoFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建上传失败错误
    pub fn upload_failed(
        bucket: impl Into<String>,
        key: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Storage(StorageError::UploadFailed {
            bucket: bucket.into(),
            key: key.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
