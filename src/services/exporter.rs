//! 页面导出服务 - 业务能力层
//!
//! 对单个任务按请求的格式产出产物：
//! - markdown: 取正文区域渲染后的 HTML，转换为结构化 markdown
//! - png: 整页截图
//! - pdf: 打印导出
//!
//! 产物先写入本地暂存目录，由上传服务在确认上传后清理。

use crate::error::AppError;
use crate::infrastructure::PageDriver;
use crate::models::{Artifact, OutputFormat, PageJob};
use crate::services::storage;
use anyhow::Result;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Notion 正文容器选择器
const CONTENT_SELECTOR: &str = ".notion-page-content";

/// 页面导出服务
pub struct PageExporter {
    scratch_dir: PathBuf,
    content_timeout: Duration,
}

impl PageExporter {
    pub fn new(scratch_dir: impl Into<PathBuf>, content_timeout: Duration) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            content_timeout,
        }
    }

    /// 等待页面正文渲染完成
    ///
    /// 正文容器在超时内未出现时退化为整页稳定等待（个别数据库视图没有该容器）
    pub async fn wait_for_content(&self, driver: &PageDriver) -> Result<()> {
        if driver
            .wait_for_selector(CONTENT_SELECTOR, self.content_timeout)
            .await
            .is_err()
        {
            warn!("⚠️ 正文容器未出现，退化为整页稳定等待");
            driver.settle().await;
        }
        Ok(())
    }

    /// 导出一个格式的产物
    ///
    /// 调用前页面必须已经导航并渲染完成
    pub async fn export(
        &self,
        driver: &PageDriver,
        job: &PageJob,
        format: OutputFormat,
        produced_at: NaiveDateTime,
    ) -> Result<Artifact> {
        info!("[{}] 📦 导出 {} ...", job.name, format);

        let bytes = match format {
            OutputFormat::Markdown => self.extract_markdown(driver).await?.into_bytes(),
            OutputFormat::Png => driver.screenshot_full_page().await?,
            OutputFormat::Pdf => driver.print_pdf().await?,
        };

        let local_path = self.scratch_path(job, produced_at, format);
        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| AppError::file_write_failed(self.scratch_dir.display().to_string(), e))?;
        tokio::fs::write(&local_path, &bytes)
            .await
            .map_err(|e| AppError::file_write_failed(local_path.display().to_string(), e))?;

        debug!(
            "[{}] ✓ {} 已写入暂存文件: {} ({} 字节)",
            job.name,
            format,
            local_path.display(),
            bytes.len()
        );

        Ok(Artifact {
            format,
            local_path,
            produced_at,
        })
    }

    /// 抽取正文并转换为 markdown
    ///
    /// 保留标题层级、列表嵌套、表格和代码块；图片以引用形式出现，不内联
    async fn extract_markdown(&self, driver: &PageDriver) -> Result<String> {
        let html = match driver.html_of(CONTENT_SELECTOR).await? {
            Some(html) => html,
            // 没有正文容器时转换整页渲染结果
            None => driver.content_html().await?,
        };
        Ok(html_to_markdown(&html))
    }

    fn scratch_path(&self, job: &PageJob, produced_at: NaiveDateTime, format: OutputFormat) -> PathBuf {
        self.scratch_dir.join(format!(
            "{}_{}.{}",
            job.name,
            storage::stamp(produced_at),
            format.ext()
        ))
    }
}

/// 渲染后的 HTML → 结构化 markdown
pub fn html_to_markdown(html: &str) -> String {
    html2md::parse_html(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_hierarchy_is_preserved() {
        let md = html_to_markdown("<h1>标题</h1><h2>小节</h2><p>正文</p>");
        assert!(md.contains("标题"));
        assert!(md.contains("## 小节") || md.contains("小节\n-"));
    }

    #[test]
    fn test_nested_lists_are_preserved() {
        let md = html_to_markdown("<ul><li>一<ul><li>一点一</li></ul></li><li>二</li></ul>");
        assert!(md.contains("一点一"));
        assert!(md.contains("二"));
    }

    #[test]
    fn test_images_are_referenced_not_inlined() {
        let md = html_to_markdown(r#"<p><img src="https://img.example/a.png" alt="图"></p>"#);
        assert!(md.contains("https://img.example/a.png"));
    }

    #[test]
    fn test_code_blocks_survive_conversion() {
        let md = html_to_markdown("<pre><code>let x = 1;</code></pre>");
        assert!(md.contains("let x = 1;"));
    }
}
