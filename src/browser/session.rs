//! 浏览器会话 - 持久化配置目录
//!
//! 整个运行只打开一个浏览器实例，配置目录跨运行保留，
//! 因此 Notion 的登录 Cookie 在两次运行之间不会丢失。
//! 首次使用时需要人在可见的浏览器窗口里手动完成登录。

use crate::error::{AppError, SessionError};
use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::Path;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

/// 浏览器会话
///
/// 职责：
/// - 持有整个运行唯一的 Browser 实例
/// - 绑定持久化配置目录（登录态跨运行保留）
/// - 保证所有退出路径上都能关闭浏览器
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// 启动带持久化配置目录的浏览器
    ///
    /// 浏览器以有头模式运行，首次使用时人工在窗口里完成 Notion 登录
    pub async fn launch(profile_dir: &str) -> Result<Self> {
        info!("🚀 启动浏览器 (持久化配置目录: {})", profile_dir);

        std::fs::create_dir_all(profile_dir).map_err(|e| {
            AppError::session_launch_failed(profile_dir, e)
        })?;

        let config = BrowserConfig::builder()
            .with_head()
            .user_data_dir(Path::new(profile_dir))
            .window_size(1920, 1080)
            .args(vec![
                "--no-sandbox",
                "--disable-blink-features=AutomationControlled",
                "--no-first-run",
                "--no-default-browser-check",
                "--disable-dev-shm-usage",
            ])
            .build()
            .map_err(|message| {
                error!("浏览器配置失败: {}", message);
                AppError::Session(SessionError::ConfigurationFailed { message })
            })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动浏览器失败: {}", e);
            AppError::session_launch_failed(profile_dir, e)
        })?;
        debug!("浏览器启动成功");

        // 在后台处理浏览器事件
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // 添加短暂延迟以等待浏览器状态同步
        sleep(Duration::from_millis(300)).await;

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// 为一个任务打开新的逻辑页面
    ///
    /// 所有任务共用同一登录态，不需要重新认证
    pub async fn new_page(&self) -> Result<Page> {
        let page = self.browser.new_page("about:blank").await.map_err(|e| {
            error!("创建页面失败: {}", e);
            AppError::Session(SessionError::PageCreationFailed {
                source: Box::new(e),
            })
        })?;
        debug!("新页面创建成功");
        Ok(page)
    }

    /// 关闭浏览器并停止事件处理
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            error!("关闭浏览器失败: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        info!("🔒 浏览器已关闭");
        Ok(())
    }
}
