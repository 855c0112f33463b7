//! 单个任务处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **流程调度**：把一个任务交给 `ExportFlow` 逐格式处理
//! 2. **子页面展开**：父页面实际渲染过且配置了 subpages 时枚举子任务
//! 3. **统计输出**：记录上传/跳过/失败数量和逐条明细

use crate::infrastructure::PageDriver;
use crate::models::{OutputFormat, PageJob};
use crate::services::SubpageDiscoverer;
use crate::workflow::{ExportCtx, ExportFlow, ExportOutcome};
use anyhow::Result;
use tracing::{error, info};

/// 一条汇总明细（任务/格式组合）
#[derive(Debug, Clone)]
pub struct SummaryLine {
    pub job_name: String,
    pub format: OutputFormat,
    pub outcome: ExportOutcome,
    pub detail: String,
}

/// 单个任务的处理报告
#[derive(Debug, Default)]
pub struct JobReport {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub lines: Vec<SummaryLine>,
    /// 发现的子任务（紧跟在父任务之后处理）
    pub children: Vec<PageJob>,
}

/// 处理单个任务
///
/// # 参数
/// - `driver`: 页面驱动（持有 page）
/// - `flow`: 导出流程（整个运行复用一个）
/// - `discoverer`: 子页面发现服务
/// - `job`: 任务数据
/// - `job_index`: 任务序号（用于日志）
pub async fn process_job(
    driver: &PageDriver,
    flow: &ExportFlow,
    discoverer: &SubpageDiscoverer,
    job: &PageJob,
    job_index: usize,
) -> Result<JobReport> {
    log_job_start(job_index, job);

    let ctx = ExportCtx::new(job_index, job.name.clone(), job.url.clone());
    let result = flow.run(driver, job, &ctx).await?;

    let mut report = JobReport::default();
    for format_outcome in &result.outcomes {
        match format_outcome.outcome {
            ExportOutcome::Uploaded => report.uploaded += 1,
            ExportOutcome::SkippedFresh => report.skipped += 1,
            ExportOutcome::Failed => report.failed += 1,
        }
        report.lines.push(SummaryLine {
            job_name: job.name.clone(),
            format: format_outcome.format,
            outcome: format_outcome.outcome,
            detail: format_outcome.detail.clone(),
        });
    }

    // 子页面枚举依赖已渲染的父页面，缓存全新鲜时不会导航也就不展开
    if job.subpages {
        if result.navigated {
            match discoverer.discover(driver, job).await {
                Ok(children) => report.children = children,
                Err(e) => {
                    error!("[任务 {}] ❌ 子页面枚举失败: {}", job_index, e);
                }
            }
        } else {
            info!(
                "[任务 {}] 页面未导航（缓存全部新鲜），跳过子页面枚举",
                job_index
            );
        }
    }

    log_job_complete(job_index, &report);
    Ok(report)
}

// ========== 日志辅助函数 ==========

fn log_job_start(job_index: usize, job: &PageJob) {
    info!("\n{}", "=".repeat(60));
    info!("📄 开始处理任务 {}: {}", job_index, job.name);
    info!("🎯 目标页面: {}", job.url);
    info!(
        "📤 输出格式: {}",
        job.formats
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("📦 存储桶: {}", job.bucket);
    info!("📁 展开子页面: {}", job.subpages);
    info!("{}", "=".repeat(60));
}

fn log_job_complete(job_index: usize, report: &JobReport) {
    info!("{}", "─".repeat(60));
    info!(
        "✓ 任务 {} 完成: 上传 {} / 跳过 {} / 失败 {}",
        job_index, report.uploaded, report.skipped, report.failed
    );
    if !report.children.is_empty() {
        info!("📁 子任务 {} 个将紧随处理", report.children.len());
    }
    info!("{}", "─".repeat(60));
}
