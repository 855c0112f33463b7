//! 子页面发现服务 - 业务能力层
//!
//! 在已渲染的父页面里枚举：
//! (a) 同一工作区下嵌套的子页面链接
//! (b) 数据库/表格视图里的行（每行一个链接页面）
//!
//! 每个发现的子页面合成一个新的 PageJob，继承父任务的格式、桶和前缀。
//! 所有子任务的 subpages 都置为 false，展开永远只做一层。

use crate::infrastructure::PageDriver;
use crate::models::PageJob;
use anyhow::Result;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

/// 从页面里收集子页面链接的脚本
///
/// Notion 页面 URL 末尾带 32 位十六进制页面 ID，以此过滤站内导航链接；
/// 数据库视图的行链接挂在 collection item 节点下
const DISCOVER_JS: &str = r#"
(() => {
    const seen = new Set();
    const out = [];
    const root = document.querySelector('.notion-page-content') || document.body;
    const anchors = [
        ...root.querySelectorAll('a[href]'),
        ...document.querySelectorAll('.notion-collection-item a[href]'),
    ];
    for (const a of anchors) {
        const href = a.href;
        if (!href.startsWith(location.origin)) continue;
        if (!/[0-9a-f]{32}([?#]|$)/.test(href)) continue;
        if (href === location.href) continue;
        if (seen.has(href)) continue;
        seen.add(href);
        out.push({ title: (a.innerText || '').trim(), url: href });
    }
    return out;
})()
"#;

/// 发现的子页面记录
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveredPage {
    #[serde(default)]
    pub title: String,
    pub url: String,
}

/// 子页面发现服务
pub struct SubpageDiscoverer;

impl SubpageDiscoverer {
    pub fn new() -> Self {
        Self
    }

    /// 在已渲染的父页面上枚举子页面，返回合成的子任务列表
    pub async fn discover(&self, driver: &PageDriver, parent: &PageJob) -> Result<Vec<PageJob>> {
        info!("[{}] 🔍 正在枚举子页面...", parent.name);

        let value = driver.eval(DISCOVER_JS).await?;
        let records: Vec<DiscoveredPage> = serde_json::from_value(value)?;
        debug!("[{}] 发现 {} 个候选链接", parent.name, records.len());

        let children = build_child_jobs(parent, &records);
        info!("[{}] ✓ 合成 {} 个子任务", parent.name, children.len());
        Ok(children)
    }
}

impl Default for SubpageDiscoverer {
    fn default() -> Self {
        Self::new()
    }
}

/// 由发现记录合成子任务（纯逻辑，便于测试）
///
/// 名称从标题派生并做键安全清洗，冲突时追加数字后缀；
/// 子任务一律 subpages = false，保证展开不超过一层
pub fn build_child_jobs(parent: &PageJob, records: &[DiscoveredPage]) -> Vec<PageJob> {
    let mut used_names: Vec<String> = Vec::new();
    let mut children = Vec::new();

    for record in records {
        if record.url == parent.url {
            continue;
        }

        let base = sanitize_name(&record.title);
        let name = dedup_name(&base, &used_names);
        used_names.push(name.clone());

        children.push(PageJob {
            url: record.url.clone(),
            name,
            parent: Some(parent.name.clone()),
            subpages: false,
            formats: parent.formats.clone(),
            bucket: parent.bucket.clone(),
            prefix: parent.prefix.clone(),
        });
    }

    children
}

/// 把标题清洗成键安全的名称
pub fn sanitize_name(title: &str) -> String {
    let pattern = Regex::new(r"[^\w.\-]+").expect("固定模式必然合法");
    let cleaned = pattern
        .replace_all(title.trim(), "_")
        .trim_matches('_')
        .to_string();

    let truncated: String = cleaned.chars().take(60).collect();
    if truncated.is_empty() {
        "untitled".to_string()
    } else {
        truncated
    }
}

/// 名称冲突时追加数字后缀：name, name_2, name_3, ...
fn dedup_name(base: &str, used: &[String]) -> String {
    if !used.iter().any(|n| n == base) {
        return base.to_string();
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{}_{}", base, counter);
        if !used.iter().any(|n| n == &candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputFormat;

    fn parent_job() -> PageJob {
        PageJob {
            url: "https://www.notion.so/ws/git-0123456789abcdef0123456789abcdef".to_string(),
            name: "git".to_string(),
            parent: None,
            subpages: true,
            formats: vec![OutputFormat::Markdown, OutputFormat::Pdf],
            bucket: "qa-notion-pages".to_string(),
            prefix: "notion-pages".to_string(),
        }
    }

    fn record(title: &str, url: &str) -> DiscoveredPage {
        DiscoveredPage {
            title: title.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_children_inherit_parent_settings() {
        let records = vec![record(
            "Roadmap",
            "https://www.notion.so/ws/Roadmap-aaaabbbbccccddddaaaabbbbccccdddd",
        )];
        let children = build_child_jobs(&parent_job(), &records);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].formats, parent_job().formats);
        assert_eq!(children[0].bucket, "qa-notion-pages");
        assert_eq!(children[0].prefix, "notion-pages");
        assert_eq!(children[0].parent.as_deref(), Some("git"));
    }

    #[test]
    fn test_expansion_is_capped_at_one_level() {
        let records = vec![record(
            "Roadmap",
            "https://www.notion.so/ws/Roadmap-aaaabbbbccccddddaaaabbbbccccdddd",
        )];
        let children = build_child_jobs(&parent_job(), &records);
        // 子任务不再触发发现
        assert!(!children[0].subpages);
    }

    #[test]
    fn test_name_collisions_get_numeric_suffix() {
        let records = vec![
            record("Notes", "https://www.notion.so/ws/a-aaaabbbbccccddddaaaabbbbccccdddd"),
            record("Notes", "https://www.notion.so/ws/b-bbbbccccddddeeeebbbbccccddddeeee"),
            record("Notes", "https://www.notion.so/ws/c-ccccddddeeeeffffccccddddeeeeffff"),
        ];
        let children = build_child_jobs(&parent_job(), &records);
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Notes", "Notes_2", "Notes_3"]);
    }

    #[test]
    fn test_parent_url_is_excluded() {
        let parent = parent_job();
        let records = vec![record("self", &parent.url)];
        assert!(build_child_jobs(&parent, &records).is_empty());
    }

    #[test]
    fn test_sanitize_name_makes_titles_key_safe() {
        assert_eq!(sanitize_name("Team / Roadmap 2026"), "Team_Roadmap_2026");
        assert_eq!(sanitize_name("  spaced  "), "spaced");
        assert_eq!(sanitize_name(""), "untitled");
        assert_eq!(sanitize_name("???"), "untitled");
    }
}
