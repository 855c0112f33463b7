//! 配置加载
//!
//! 解析 `pages_config.yaml`，生成全局配置和有序的页面任务列表。
//! 页面级别的 `output_formats` / `s3_bucket` / `s3_prefix` 会完整覆盖全局值。

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::{format::OutputFormat, PageJob};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// 全局运行配置
///
/// 每次运行加载一次，运行期间不可变
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    /// 缺省输出格式集合
    pub output_formats: Vec<OutputFormat>,
    /// 缺省存储桶
    pub s3_bucket: String,
    /// 缺省存储键前缀
    pub s3_prefix: String,
    /// 存储区域
    pub s3_region: String,
    /// 缓存新鲜窗口（小时）
    pub refresh_hours: i64,
    /// 是否无视缓存强制导出
    pub force_refresh: bool,
    /// 持久化浏览器配置目录（跨运行保留登录态）
    pub profile_dir: String,
    /// 本地暂存目录（产物上传后清理）
    pub scratch_dir: String,
    /// 单次导航超时（秒）
    pub navigation_timeout_secs: u64,
    /// 检测到登录页时等待人工登录的时长（秒）
    pub login_wait_secs: u64,
    /// 相邻页面之间的停顿（秒）
    pub pause_between_pages_secs: u64,
    /// 输出日志文件
    pub output_log_file: String,
}

// ========== YAML 原始结构 ==========

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    config: RawGlobal,
    #[serde(default)]
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawGlobal {
    output_formats: Option<Vec<String>>,
    #[serde(default = "default_bucket")]
    s3_bucket: String,
    #[serde(default = "default_prefix")]
    s3_prefix: String,
    #[serde(default = "default_region")]
    s3_region: String,
    #[serde(default = "default_refresh_hours")]
    refresh_hours: i64,
    #[serde(default)]
    force_refresh: bool,
    #[serde(default = "default_profile_dir")]
    profile_dir: String,
    #[serde(default = "default_scratch_dir")]
    scratch_dir: String,
    #[serde(default = "default_navigation_timeout_secs")]
    navigation_timeout_secs: u64,
    #[serde(default = "default_login_wait_secs")]
    login_wait_secs: u64,
    #[serde(default = "default_pause_secs")]
    pause_between_pages_secs: u64,
    #[serde(default = "default_output_log_file")]
    output_log_file: String,
}

// `config:` 块整体缺省时也要应用字段级缺省值，derive(Default) 会绕过 serde 的 default 函数
impl Default for RawGlobal {
    fn default() -> Self {
        Self {
            output_formats: None,
            s3_bucket: default_bucket(),
            s3_prefix: default_prefix(),
            s3_region: default_region(),
            refresh_hours: default_refresh_hours(),
            force_refresh: false,
            profile_dir: default_profile_dir(),
            scratch_dir: default_scratch_dir(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            login_wait_secs: default_login_wait_secs(),
            pause_between_pages_secs: default_pause_secs(),
            output_log_file: default_output_log_file(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    url: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    subpages: bool,
    output_formats: Option<Vec<String>>,
    s3_bucket: Option<String>,
    s3_prefix: Option<String>,
}

fn default_bucket() -> String {
    "snowplow-qa-notion-pages".to_string()
}
fn default_prefix() -> String {
    "notion-pages".to_string()
}
fn default_region() -> String {
    "eu-central-1".to_string()
}
fn default_refresh_hours() -> i64 {
    24
}
fn default_profile_dir() -> String {
    "/tmp/chrome-notion-profile".to_string()
}
fn default_scratch_dir() -> String {
    "/tmp/notion-export-scratch".to_string()
}
fn default_navigation_timeout_secs() -> u64 {
    10
}
fn default_login_wait_secs() -> u64 {
    30
}
fn default_pause_secs() -> u64 {
    2
}
fn default_output_log_file() -> String {
    "export_run.log".to_string()
}

// ========== 加载入口 ==========

/// 配置文件路径（可通过 PAGES_CONFIG 环境变量覆盖）
pub fn config_path() -> String {
    std::env::var("PAGES_CONFIG").unwrap_or_else(|_| "pages_config.yaml".to_string())
}

/// 从配置文件加载全局配置和页面任务列表
pub fn load(path: &str) -> AppResult<(GlobalConfig, Vec<PageJob>)> {
    if !Path::new(path).exists() {
        return Err(AppError::Config(ConfigError::FileNotFound {
            path: path.to_string(),
        }));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(ConfigError::YamlParseFailed {
            path: path.to_string(),
            source: Box::new(e),
        })
    })?;

    parse(&content, path)
}

/// 解析配置内容（与文件读取分离，便于测试）
pub fn parse(content: &str, path: &str) -> AppResult<(GlobalConfig, Vec<PageJob>)> {
    let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| {
        AppError::Config(ConfigError::YamlParseFailed {
            path: path.to_string(),
            source: Box::new(e),
        })
    })?;

    if raw.pages.is_empty() {
        return Err(AppError::Config(ConfigError::EmptyPages));
    }

    let global_formats = match &raw.config.output_formats {
        Some(values) => parse_formats(values)?,
        None => OutputFormat::default_set(),
    };

    let global = GlobalConfig {
        output_formats: global_formats.clone(),
        s3_bucket: raw.config.s3_bucket.clone(),
        s3_prefix: raw.config.s3_prefix.clone(),
        s3_region: raw.config.s3_region.clone(),
        refresh_hours: raw.config.refresh_hours,
        force_refresh: raw.config.force_refresh,
        profile_dir: raw.config.profile_dir.clone(),
        scratch_dir: raw.config.scratch_dir.clone(),
        navigation_timeout_secs: raw.config.navigation_timeout_secs,
        login_wait_secs: raw.config.login_wait_secs,
        pause_between_pages_secs: raw.config.pause_between_pages_secs,
        output_log_file: raw.config.output_log_file.clone(),
    };

    let name_pattern = Regex::new(r"^[\w.\-]+$").map_err(|e| AppError::Other(e.to_string()))?;

    let mut jobs = Vec::with_capacity(raw.pages.len());
    for (index, page) in raw.pages.iter().enumerate() {
        if page.url.trim().is_empty() {
            return Err(AppError::Config(ConfigError::MissingField {
                page_index: index,
                field: "url",
            }));
        }
        if page.name.trim().is_empty() {
            return Err(AppError::Config(ConfigError::MissingField {
                page_index: index,
                field: "name",
            }));
        }
        // name 直接进入文件名和存储键，必须是键安全的
        if !name_pattern.is_match(&page.name) {
            return Err(AppError::Config(ConfigError::MissingField {
                page_index: index,
                field: "name (仅允许字母数字、下划线、点、连字符)",
            }));
        }

        // 页面级格式完整覆盖全局格式，不做合并
        let formats = match &page.output_formats {
            Some(values) => parse_formats(values)?,
            None => global.output_formats.clone(),
        };

        jobs.push(PageJob {
            url: page.url.clone(),
            name: page.name.clone(),
            parent: None,
            subpages: page.subpages,
            formats,
            bucket: page.s3_bucket.clone().unwrap_or_else(|| global.s3_bucket.clone()),
            prefix: page.s3_prefix.clone().unwrap_or_else(|| global.s3_prefix.clone()),
        });
    }

    Ok((global, jobs))
}

fn parse_formats(values: &[String]) -> AppResult<Vec<OutputFormat>> {
    if values.is_empty() {
        return Err(AppError::Config(ConfigError::InvalidFormat {
            value: "(空列表)".to_string(),
        }));
    }
    values.iter().map(|v| OutputFormat::parse(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
config:
  s3_bucket: qa-bucket
  s3_prefix: notion
pages:
  - url: https://www.notion.so/ws/git-0123456789abcdef0123456789abcdef
    name: git
"#;

    #[test]
    fn test_defaults_when_formats_omitted() {
        let (global, jobs) = parse(BASIC, "pages_config.yaml").unwrap();
        // 全局和页面级都未指定时，缺省为三种格式全集
        assert_eq!(global.output_formats, OutputFormat::default_set());
        assert_eq!(jobs[0].formats, OutputFormat::default_set());
        assert_eq!(global.refresh_hours, 24);
        assert!(!global.force_refresh);
    }

    #[test]
    fn test_page_override_replaces_global_formats() {
        let content = r#"
config:
  output_formats: [markdown, png]
pages:
  - url: https://www.notion.so/ws/a-0123456789abcdef0123456789abcdef
    name: a
  - url: https://www.notion.so/ws/b-0123456789abcdef0123456789abcdef
    name: b
    output_formats: [pdf]
"#;
        let (_, jobs) = parse(content, "pages_config.yaml").unwrap();
        assert_eq!(jobs[0].formats, vec![OutputFormat::Markdown, OutputFormat::Png]);
        // 页面级覆盖是完整替换，不是合并
        assert_eq!(jobs[1].formats, vec![OutputFormat::Pdf]);
    }

    #[test]
    fn test_page_level_bucket_and_prefix_override() {
        let content = r#"
config:
  s3_bucket: global-bucket
  s3_prefix: global-prefix
pages:
  - url: https://www.notion.so/ws/a-0123456789abcdef0123456789abcdef
    name: a
    s3_bucket: page-bucket
    s3_prefix: page-prefix
"#;
        let (_, jobs) = parse(content, "pages_config.yaml").unwrap();
        assert_eq!(jobs[0].bucket, "page-bucket");
        assert_eq!(jobs[0].prefix, "page-prefix");
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let content = r#"
pages:
  - name: git
"#;
        assert!(parse(content, "pages_config.yaml").is_err());
    }

    #[test]
    fn test_missing_name_is_config_error() {
        let content = r#"
pages:
  - url: https://www.notion.so/ws/x-0123456789abcdef0123456789abcdef
"#;
        assert!(parse(content, "pages_config.yaml").is_err());
    }

    #[test]
    fn test_unsafe_name_is_rejected() {
        let content = r#"
pages:
  - url: https://www.notion.so/ws/x-0123456789abcdef0123456789abcdef
    name: "has/slash"
"#;
        assert!(parse(content, "pages_config.yaml").is_err());
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        let content = r#"
pages:
  - url: https://www.notion.so/ws/x-0123456789abcdef0123456789abcdef
    name: x
    output_formats: [html]
"#;
        assert!(parse(content, "pages_config.yaml").is_err());
    }

    #[test]
    fn test_empty_pages_is_config_error() {
        assert!(parse("config: {}\npages: []\n", "pages_config.yaml").is_err());
    }

    #[test]
    fn test_subpages_defaults_to_false() {
        let (_, jobs) = parse(BASIC, "pages_config.yaml").unwrap();
        assert!(!jobs[0].subpages);
    }
}
