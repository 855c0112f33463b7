//! 运行编排器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责运行生命周期和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、启动持久化浏览器、初始化存储客户端
//! 2. **顺序处理**：一个浏览器实例串行处理所有任务，任务之间不并发
//! 3. **子任务插队**：父任务展开出的子任务紧跟在父任务之后处理
//! 4. **资源管理**：持有 BrowserSession 和 PageDriver，所有退出路径上关闭浏览器
//! 5. **全局统计**：汇总所有任务/格式组合的处理结果并逐条打印
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个任务的细节，向下委托 job_processor
//! - **资源所有者**：唯一持有 BrowserSession 的模块
//! - **无并发**：共享的浏览器和暂存目录始终只被一个逻辑工作者触碰

use crate::browser::BrowserSession;
use crate::config::GlobalConfig;
use crate::infrastructure::PageDriver;
use crate::models::PageJob;
use crate::orchestrator::job_processor::{self, SummaryLine};
use crate::services::{S3Storage, SubpageDiscoverer};
use crate::workflow::{ExportFlow, ExportOutcome};
use anyhow::Result;
use std::collections::VecDeque;
use std::fs;
use std::time::Duration;
use tracing::{error, info};

/// 应用主结构
pub struct App {
    global: GlobalConfig,
    jobs: Vec<PageJob>,
    session: BrowserSession,
    driver: PageDriver,
    flow: ExportFlow,
    discoverer: SubpageDiscoverer,
}

impl App {
    /// 初始化应用
    pub async fn initialize(global: GlobalConfig, jobs: Vec<PageJob>) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&global.output_log_file)?;

        log_startup(&global, jobs.len());

        // 启动带持久化配置目录的浏览器（整个运行只开一次）
        let session = BrowserSession::launch(&global.profile_dir).await?;
        let page = session.new_page().await?;
        let driver = PageDriver::new(
            page,
            Duration::from_secs(global.navigation_timeout_secs),
        );

        // 初始化存储客户端
        let storage = S3Storage::new(&global.s3_region).await;
        info!("✅ S3 存储客户端已初始化 (区域: {})", global.s3_region);

        let flow = ExportFlow::new(&global, storage);

        Ok(Self {
            global,
            jobs,
            session,
            driver,
            flow,
            discoverer: SubpageDiscoverer::new(),
        })
    }

    /// 运行应用主逻辑
    ///
    /// 串行处理所有任务，单个任务的失败不会中断运行
    pub async fn run(self) -> Result<RunStats> {
        let mut stats = RunStats::default();
        let mut queue: VecDeque<PageJob> = self.jobs.iter().cloned().collect();
        let mut job_index = 0;

        while let Some(job) = queue.pop_front() {
            job_index += 1;

            // 相邻页面之间稍作停顿
            if job_index > 1 {
                info!("⏳ 稍作停顿后处理下一个页面...");
                tokio::time::sleep(Duration::from_secs(self.global.pause_between_pages_secs))
                    .await;
            }

            match job_processor::process_job(
                &self.driver,
                &self.flow,
                &self.discoverer,
                &job,
                job_index,
            )
            .await
            {
                Ok(report) => {
                    stats.uploaded += report.uploaded;
                    stats.skipped += report.skipped;
                    stats.failed += report.failed;
                    stats.lines.extend(report.lines);

                    // 子任务紧跟在父任务之后处理（保持发现顺序）
                    for (offset, child) in report.children.into_iter().enumerate() {
                        queue.insert(offset, child);
                    }
                }
                Err(e) => {
                    error!("[任务 {}] ❌ 处理过程中发生错误: {}", job_index, e);
                    stats.failed += job.formats.len();
                    for &format in &job.formats {
                        stats.lines.push(SummaryLine {
                            job_name: job.name.clone(),
                            format,
                            outcome: ExportOutcome::Failed,
                            detail: e.to_string(),
                        });
                    }
                }
            }

            stats.total_jobs = job_index;
        }

        // 所有退出路径上关闭浏览器
        self.session.close().await?;

        print_final_stats(&stats, &self.global);
        Ok(stats)
    }
}

/// 全局处理统计
#[derive(Debug, Default)]
pub struct RunStats {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_jobs: usize,
    /// 逐条明细（任务/格式组合），最终汇总据此打印
    pub lines: Vec<SummaryLine>,
}

// ========== 日志辅助函数 ==========

fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\nNotion 页面导出日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

fn log_startup(global: &GlobalConfig, total_jobs: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - Notion 页面批量导出");
    info!("📋 共 {} 个配置页面", total_jobs);
    info!("🕐 缓存新鲜窗口: {} 小时", global.refresh_hours);
    if global.force_refresh {
        info!("💪 强制刷新已开启，忽略现有缓存");
    }
    info!("{}", "=".repeat(60));
}

fn print_final_stats(stats: &RunStats, global: &GlobalConfig) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 任务总数: {}", stats.total_jobs);
    info!("✅ 上传: {}", stats.uploaded);
    info!("⏭ 跳过 (缓存新鲜): {}", stats.skipped);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));

    // 逐条枚举每个任务/格式组合的结局
    for line in &stats.lines {
        let icon = match line.outcome {
            ExportOutcome::Uploaded => "✅",
            ExportOutcome::SkippedFresh => "⏭",
            ExportOutcome::Failed => "❌",
        };
        info!(
            "  {} {} [{}] {} - {}",
            icon, line.job_name, line.format, line.outcome, line.detail
        );
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", global.output_log_file);
}
