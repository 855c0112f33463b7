use crate::models::format::OutputFormat;
use chrono::NaiveDateTime;
use std::path::PathBuf;

/// 页面导出任务
///
/// 由配置文件生成（每个配置条目一个），子页面发现会合成同构的子任务
#[derive(Debug, Clone)]
pub struct PageJob {
    /// 页面 URL
    pub url: String,
    /// 页面名称（用于文件名和存储键，必须是键安全的）
    pub name: String,
    /// 父任务名称（仅对发现的子页面存在）
    pub parent: Option<String>,
    /// 是否展开子页面
    pub subpages: bool,
    /// 本任务需要导出的格式集合
    pub formats: Vec<OutputFormat>,
    /// 存储桶
    pub bucket: String,
    /// 存储键前缀
    pub prefix: String,
}

impl PageJob {
    /// 本任务所有对象所在的存储键前缀（以 `/` 结尾）
    ///
    /// 顶层任务: `{prefix}/{name}/`
    /// 子任务:   `{prefix}/{parent}/{name}/`
    pub fn key_prefix(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}/{}/{}/", self.prefix, parent, self.name),
            None => format!("{}/{}/", self.prefix, self.name),
        }
    }
}

/// 导出产物
///
/// 瞬态数据：只存在于导出和上传之间，上传成功后本地文件即被删除
#[derive(Debug, Clone)]
pub struct Artifact {
    /// 产物格式
    pub format: OutputFormat,
    /// 本地暂存文件路径
    pub local_path: PathBuf,
    /// 导出时间戳
    pub produced_at: NaiveDateTime,
}

/// 缓存判定结果
///
/// 派生值，不落盘
#[derive(Debug, Clone)]
pub struct CacheDecision {
    /// 是否需要导出
    pub should_export: bool,
    /// 判定原因（用于日志和最终汇总）
    pub reason: String,
}

impl CacheDecision {
    pub fn export(reason: impl Into<String>) -> Self {
        Self {
            should_export: true,
            reason: reason.into(),
        }
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            should_export: false,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> PageJob {
        PageJob {
            url: "https://www.notion.so/ws/git-0123456789abcdef0123456789abcdef".to_string(),
            name: "git".to_string(),
            parent: None,
            subpages: false,
            formats: vec![OutputFormat::Markdown],
            bucket: "qa-notion-pages".to_string(),
            prefix: "notion-pages".to_string(),
        }
    }

    #[test]
    fn test_key_prefix_top_level() {
        assert_eq!(sample_job().key_prefix(), "notion-pages/git/");
    }

    #[test]
    fn test_key_prefix_child() {
        let mut job = sample_job();
        job.name = "roadmap".to_string();
        job.parent = Some("git".to_string());
        assert_eq!(job.key_prefix(), "notion-pages/git/roadmap/");
    }
}
