//! 导出流程 - 流程层
//!
//! 核心职责：定义"一个任务"的完整处理流程
//!
//! 流程顺序（按格式）：
//! 1. 缓存闸门判定 → 新鲜则跳过
//! 2. 导航（超时重试一次，检测到登录页时每次运行最多暂停一次等人工登录）
//! 3. 导出 → 上传 → 清理本地文件
//!
//! 每个任务/格式组合返回一个扁平的结果值，最终汇总由这些值拼出，
//! 单个页面的失败永远不会中断整个运行。

use crate::config::GlobalConfig;
use crate::error::{AppError, NavigationError};
use crate::infrastructure::PageDriver;
use crate::models::{OutputFormat, PageJob};
use crate::services::{storage, CacheGate, PageExporter, S3Storage, Uploader};
use crate::workflow::export_ctx::ExportCtx;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

/// 导航失败后的固定重试间隔
const RETRY_BACKOFF: Duration = Duration::from_secs(3);

/// 单个任务/格式的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// 导出并上传成功
    Uploaded,
    /// 缓存新鲜，跳过导出
    SkippedFresh,
    /// 处理失败
    Failed,
}

impl std::fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportOutcome::Uploaded => write!(f, "已上传"),
            ExportOutcome::SkippedFresh => write!(f, "缓存跳过"),
            ExportOutcome::Failed => write!(f, "失败"),
        }
    }
}

/// 一个格式的处理记录
#[derive(Debug, Clone)]
pub struct FormatOutcome {
    pub format: OutputFormat,
    pub outcome: ExportOutcome,
    /// 附加信息：存储键、跳过原因或错误描述
    pub detail: String,
}

/// 一个任务的处理结果
#[derive(Debug)]
pub struct JobResult {
    pub outcomes: Vec<FormatOutcome>,
    /// 是否实际导航到了页面（子页面发现依赖已渲染的父页面）
    pub navigated: bool,
}

/// 导出流程
///
/// - 编排单个任务的完整处理流程
/// - 决定何时查缓存、何时导出、何时上传
/// - 不持有 page 资源，只依赖业务能力（services）
pub struct ExportFlow {
    gate: CacheGate,
    exporter: PageExporter,
    uploader: Uploader,
    storage: S3Storage,
    /// 登录暂停每次运行只做一次
    login_paused: AtomicBool,
    login_wait: Duration,
}

impl ExportFlow {
    /// 创建新的导出流程
    pub fn new(global: &GlobalConfig, storage: S3Storage) -> Self {
        Self {
            gate: CacheGate::new(global),
            exporter: PageExporter::new(
                &global.scratch_dir,
                Duration::from_secs(global.navigation_timeout_secs),
            ),
            uploader: Uploader::new(storage.clone()),
            storage,
            login_paused: AtomicBool::new(false),
            login_wait: Duration::from_secs(global.login_wait_secs),
        }
    }

    /// 处理一个任务的所有格式
    pub async fn run(
        &self,
        driver: &PageDriver,
        job: &PageJob,
        ctx: &ExportCtx,
    ) -> Result<JobResult> {
        let mut outcomes = Vec::new();
        let mut pending: Vec<OutputFormat> = Vec::new();

        // ========== 第一步：缓存闸门 ==========
        for &format in &job.formats {
            match self.gate.decide(&self.storage, job, format).await {
                Ok(decision) if !decision.should_export => {
                    info!(
                        "[任务 {}] ⏭ {} 跳过: {}",
                        ctx.job_index, format, decision.reason
                    );
                    outcomes.push(FormatOutcome {
                        format,
                        outcome: ExportOutcome::SkippedFresh,
                        detail: decision.reason,
                    });
                }
                Ok(_) => pending.push(format),
                Err(e) => {
                    // 缓存查询失败时宁可多导出一次，不让任务卡死
                    warn!(
                        "[任务 {}] ⚠️ {} 缓存查询失败，按需要导出处理: {}",
                        ctx.job_index, format, e
                    );
                    pending.push(format);
                }
            }
        }

        if pending.is_empty() {
            info!("[任务 {}] ✓ 所有格式均有新鲜副本，无需导出", ctx.job_index);
            return Ok(JobResult {
                outcomes,
                navigated: false,
            });
        }

        // ========== 第二步：导航 ==========
        if let Err(e) = self.navigate(driver, job, ctx).await {
            error!("[任务 {}] ❌ 导航彻底失败: {}", ctx.job_index, e);
            for format in pending {
                outcomes.push(FormatOutcome {
                    format,
                    outcome: ExportOutcome::Failed,
                    detail: format!("导航失败: {}", e),
                });
            }
            return Ok(JobResult {
                outcomes,
                navigated: false,
            });
        }

        self.exporter.wait_for_content(driver).await?;

        // ========== 第三步：逐格式导出并上传 ==========
        let produced_at = chrono::Local::now().naive_local();
        let key_stamp = storage::stamp(produced_at);
        let mut uploaded_keys = Vec::new();

        for format in pending {
            match self.export_and_upload(driver, job, format, produced_at).await {
                Ok(key) => {
                    uploaded_keys.push(key.clone());
                    outcomes.push(FormatOutcome {
                        format,
                        outcome: ExportOutcome::Uploaded,
                        detail: key,
                    });
                }
                Err(e) => {
                    error!(
                        "[任务 {}] ❌ {} 处理失败: {}",
                        ctx.job_index, format, e
                    );
                    outcomes.push(FormatOutcome {
                        format,
                        outcome: ExportOutcome::Failed,
                        detail: e.to_string(),
                    });
                }
            }
        }

        // 元数据失败只告警，不影响任务结果
        if !uploaded_keys.is_empty() {
            if let Err(e) = self
                .uploader
                .upload_run_metadata(job, &key_stamp, &uploaded_keys)
                .await
            {
                warn!("[任务 {}] ⚠️ 元数据上传失败: {}", ctx.job_index, e);
            }
        }

        Ok(JobResult {
            outcomes,
            navigated: true,
        })
    }

    /// 导出单个格式并上传
    async fn export_and_upload(
        &self,
        driver: &PageDriver,
        job: &PageJob,
        format: OutputFormat,
        produced_at: chrono::NaiveDateTime,
    ) -> Result<String> {
        let artifact = self.exporter.export(driver, job, format, produced_at).await?;
        self.uploader.upload_artifact(job, &artifact).await
    }

    /// 导航到任务页面
    ///
    /// 失败后固定间隔重试一次；检测到登录页时，每次运行最多暂停一次
    /// 让人在可见窗口里完成登录，暂停后仍被挡则按导航失败处理
    async fn navigate(&self, driver: &PageDriver, job: &PageJob, ctx: &ExportCtx) -> Result<()> {
        if let Err(e) = driver.goto(&job.url).await {
            warn!(
                "[任务 {}] ⚠️ 导航失败: {}，{} 秒后重试",
                ctx.job_index,
                e,
                RETRY_BACKOFF.as_secs()
            );
            tokio::time::sleep(RETRY_BACKOFF).await;
            driver.goto(&job.url).await?;
        }

        driver.settle().await;

        let current_url = driver.current_url().await?;
        let title = driver.title().await?;

        if is_login_page(&current_url, &title) {
            if !self.login_paused.swap(true, Ordering::SeqCst) {
                warn!(
                    "🔐 检测到登录页，请在浏览器窗口中手动完成登录 (等待 {} 秒)...",
                    self.login_wait.as_secs()
                );
                tokio::time::sleep(self.login_wait).await;

                // 登录完成后重新导航
                driver.goto(&job.url).await?;
                driver.settle().await;

                let retry_url = driver.current_url().await?;
                let retry_title = driver.title().await?;
                if is_login_page(&retry_url, &retry_title) {
                    return Err(AppError::Navigation(NavigationError::LoginRequired {
                        url: retry_url,
                    })
                    .into());
                }
            } else {
                return Err(AppError::Navigation(NavigationError::LoginRequired {
                    url: current_url,
                })
                .into());
            }
        }

        Ok(())
    }
}

/// 判断当前是否落在了登录页上
fn is_login_page(url: &str, title: &str) -> bool {
    let url = url.to_lowercase();
    let title = title.to_lowercase();
    url.contains("login") || url.contains("signin") || title.contains("sign in") || title.contains("log in")
}
