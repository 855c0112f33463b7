use crate::error::{AppError, ConfigError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 输出格式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown 文本
    Markdown,
    /// 整页截图
    Png,
    /// 打印导出 PDF
    Pdf,
}

impl OutputFormat {
    /// 获取文件扩展名
    pub fn ext(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// 获取上传时使用的 Content-Type
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "text/markdown",
            OutputFormat::Png => "image/png",
            OutputFormat::Pdf => "application/pdf",
        }
    }

    /// 从配置字符串解析格式
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "markdown" => Ok(OutputFormat::Markdown),
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(AppError::Config(ConfigError::InvalidFormat {
                value: other.to_string(),
            })),
        }
    }

    /// 全局缺省格式集合：三种格式全部导出
    pub fn default_set() -> Vec<OutputFormat> {
        vec![OutputFormat::Markdown, OutputFormat::Png, OutputFormat::Pdf]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Pdf => write!(f, "pdf"),
        }
    }
}
