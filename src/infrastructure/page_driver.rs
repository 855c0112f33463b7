//! 页面驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"驱动浏览器"的能力

use crate::error::{AppError, NavigationError};
use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// 页面驱动
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露导航、等待、截图、PDF、JS 求值能力
/// - 不认识 PageJob / Artifact
/// - 不处理业务流程
pub struct PageDriver {
    page: Page,
    navigation_timeout: Duration,
}

impl PageDriver {
    /// 创建新的页面驱动
    pub fn new(page: Page, navigation_timeout: Duration) -> Self {
        Self {
            page,
            navigation_timeout,
        }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 导航到指定 URL，受单次导航超时约束
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        let nav = self.page.goto(url.to_string());
        match tokio::time::timeout(self.navigation_timeout, nav).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(AppError::goto_failed(url, e).into()),
            Err(_) => {
                Err(AppError::navigation_timeout(url, self.navigation_timeout.as_secs()).into())
            }
        }
    }

    /// 等待选择器出现（指数退避轮询）
    ///
    /// 轮询从 100ms 起步，每次翻倍，封顶 1 秒，整体受超时约束
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let start = std::time::Instant::now();
        let mut poll_interval = Duration::from_millis(100);
        let max_interval = Duration::from_secs(1);

        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }

            if start.elapsed() >= timeout {
                let url = self.current_url().await.unwrap_or_default();
                return Err(AppError::Navigation(NavigationError::ContentNotReady {
                    url,
                    selector: selector.to_string(),
                })
                .into());
            }

            tokio::time::sleep(poll_interval).await;
            poll_interval = (poll_interval * 2).min(max_interval);
        }
    }

    /// 等待页面稳定下来
    ///
    /// 导航完成事件可能先于渲染到达，超时不视为错误
    pub async fn settle(&self) {
        let _ = tokio::time::timeout(
            Duration::from_secs(5),
            self.page.wait_for_navigation(),
        )
        .await;
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    /// 当前 URL（重定向之后）
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    /// 当前页面标题
    pub async fn title(&self) -> Result<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    /// 整页渲染后的 HTML
    pub async fn content_html(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    /// 指定选择器的渲染后 HTML，不存在时返回 None
    pub async fn html_of(&self, selector: &str) -> Result<Option<String>> {
        let js = format!(
            "document.querySelector({})?.outerHTML ?? null",
            serde_json::to_string(selector)?
        );
        match self.eval(js).await? {
            JsonValue::String(html) => Ok(Some(html)),
            _ => Ok(None),
        }
    }

    /// 整页截图（不止可视区域）
    pub async fn screenshot_full_page(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        let bytes = self.page.screenshot(params).await?;
        Ok(bytes)
    }

    /// 打印导出 PDF（A4，含背景）
    pub async fn print_pdf(&self) -> Result<Vec<u8>> {
        let params = PrintToPdfParams {
            print_background: Some(true),
            paper_width: Some(8.27),
            paper_height: Some(11.69),
            ..Default::default()
        };
        let bytes = self.page.pdf(params).await?;
        Ok(bytes)
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }
}
