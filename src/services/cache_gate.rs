//! 缓存闸门 - 业务能力层
//!
//! 按任务和格式判定是否需要重新导出：存储里已有新鲜副本就跳过。
//! 判定核心是纯函数，网络访问（列举对象）在外层完成。

use crate::config::GlobalConfig;
use crate::models::{CacheDecision, OutputFormat, PageJob};
use crate::services::storage::{self, S3Storage};
use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use tracing::debug;

/// 缓存闸门
pub struct CacheGate {
    refresh_hours: i64,
    force_refresh: bool,
}

impl CacheGate {
    pub fn new(global: &GlobalConfig) -> Self {
        Self {
            refresh_hours: global.refresh_hours,
            force_refresh: global.force_refresh,
        }
    }

    /// 判定一个任务/格式组合是否需要导出
    pub async fn decide(
        &self,
        storage: &S3Storage,
        job: &PageJob,
        format: OutputFormat,
    ) -> Result<CacheDecision> {
        // 强制刷新时不访问存储，直接导出
        if self.force_refresh {
            return Ok(CacheDecision::export("强制刷新"));
        }

        let keys = storage.list_keys(&job.bucket, &job.key_prefix()).await?;
        let now = chrono::Local::now().naive_local();
        let decision = evaluate(&keys, job, format, now, self.refresh_hours, false);
        debug!(
            "[{}:{}] 缓存判定: export={} ({})",
            job.name, format, decision.should_export, decision.reason
        );
        Ok(decision)
    }
}

/// 纯判定逻辑
///
/// 在已列举的对象键里找最新的匹配键，按键里嵌入的时间戳计算年龄：
/// - force_refresh → 导出
/// - 无匹配对象 → 导出
/// - 年龄 < refresh_hours → 跳过（缓存新鲜）
/// - 否则 → 导出
pub fn evaluate(
    keys: &[String],
    job: &PageJob,
    format: OutputFormat,
    now: NaiveDateTime,
    refresh_hours: i64,
    force_refresh: bool,
) -> CacheDecision {
    if force_refresh {
        return CacheDecision::export("强制刷新");
    }

    let file_prefix = format!("{}{}_", job.key_prefix(), job.name);
    let suffix = format!(".{}", format.ext());

    let newest = keys
        .iter()
        .filter(|k| k.starts_with(&file_prefix) && k.ends_with(&suffix))
        .filter_map(|k| storage::parse_stamp(k))
        .max();

    match newest {
        None => CacheDecision::export("无历史对象"),
        Some(produced_at) => {
            let age = now - produced_at;
            if age < Duration::hours(refresh_hours) {
                CacheDecision::skip(format!("缓存新鲜 ({} 小时前导出)", age.num_hours()))
            } else {
                CacheDecision::export(format!("已过期 ({} 小时前导出)", age.num_hours()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

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

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 29)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_no_prior_object_means_export() {
        let decision = evaluate(&[], &sample_job(), OutputFormat::Markdown, at(12, 0), 24, false);
        assert!(decision.should_export);
    }

    #[test]
    fn test_fresh_object_means_skip() {
        // 两小时前导出，窗口 24 小时 → 跳过
        let keys = vec!["notion-pages/git/git_20260829_100000.md".to_string()];
        let decision = evaluate(&keys, &sample_job(), OutputFormat::Markdown, at(12, 0), 24, false);
        assert!(!decision.should_export);
    }

    #[test]
    fn test_stale_object_means_export() {
        // 前一天导出，窗口 24 小时 → 已过期
        let keys = vec!["notion-pages/git/git_20260828_100000.md".to_string()];
        let decision = evaluate(&keys, &sample_job(), OutputFormat::Markdown, at(12, 0), 24, false);
        assert!(decision.should_export);
    }

    #[test]
    fn test_age_exactly_at_window_means_export() {
        // 年龄恰好等于窗口时不算新鲜
        let keys = vec!["notion-pages/git/git_20260828_120000.md".to_string()];
        let decision = evaluate(&keys, &sample_job(), OutputFormat::Markdown, at(12, 0), 24, false);
        assert!(decision.should_export);
    }

    #[test]
    fn test_force_refresh_always_exports() {
        let keys = vec!["notion-pages/git/git_20260829_115900.md".to_string()];
        let decision = evaluate(&keys, &sample_job(), OutputFormat::Markdown, at(12, 0), 24, true);
        assert!(decision.should_export);
    }

    #[test]
    fn test_only_matching_format_counts() {
        // 只有 png 的新鲜对象，对 markdown 的判定仍是导出
        let keys = vec!["notion-pages/git/git_20260829_113000.png".to_string()];
        let decision = evaluate(&keys, &sample_job(), OutputFormat::Markdown, at(12, 0), 24, false);
        assert!(decision.should_export);
    }

    #[test]
    fn test_newest_key_wins() {
        // 存在过期和新鲜两个对象时按最新的判定
        let keys = vec![
            "notion-pages/git/git_20260820_100000.md".to_string(),
            "notion-pages/git/git_20260829_110000.md".to_string(),
        ];
        let decision = evaluate(&keys, &sample_job(), OutputFormat::Markdown, at(12, 0), 24, false);
        assert!(!decision.should_export);
    }

    #[test]
    fn test_other_pages_keys_are_ignored() {
        // 其他页面的新鲜对象不影响本页面
        let keys = vec!["notion-pages/other/other_20260829_113000.md".to_string()];
        let decision = evaluate(&keys, &sample_job(), OutputFormat::Markdown, at(12, 0), 24, false);
        assert!(decision.should_export);
    }
}
