//! 对象存储服务 - 业务能力层
//!
//! 存储键布局、时间戳解析、S3 读写和上传清理都在这里。
//!
//! 键布局（确定性，可从键反解出导出时间）：
//! - 顶层任务: `{prefix}/{name}/{name}_{YYYYMMDD}_{HHMMSS}.{ext}`
//! - 子任务:   `{prefix}/{parent}/{child}/{child}_{YYYYMMDD}_{HHMMSS}.{ext}`

use crate::error::{AppError, StorageError};
use crate::models::{Artifact, OutputFormat, PageJob};
use anyhow::Result;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::json;
use std::path::Path;
use tracing::{debug, info, warn};

/// 存储键中的时间戳格式
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 生成键时间戳（精确到秒）
pub fn stamp(at: NaiveDateTime) -> String {
    at.format(STAMP_FORMAT).to_string()
}

/// 从存储键反解导出时间戳
///
/// 识别文件名尾部的 `_{YYYYMMDD}_{HHMMSS}.{ext}` 模式，解析失败返回 None
pub fn parse_stamp(key: &str) -> Option<NaiveDateTime> {
    let pattern = Regex::new(r"_(\d{8}_\d{6})\.[A-Za-z0-9]+$").ok()?;
    let captured = pattern.captures(key)?.get(1)?.as_str();
    NaiveDateTime::parse_from_str(captured, STAMP_FORMAT).ok()
}

/// 任务产物的存储键
pub fn object_key(job: &PageJob, key_stamp: &str, format: OutputFormat) -> String {
    format!(
        "{}{}_{}.{}",
        job.key_prefix(),
        job.name,
        key_stamp,
        format.ext()
    )
}

/// 按扩展名推断 Content-Type
pub fn content_type_for_ext(ext: &str) -> &'static str {
    match ext {
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "txt" => "text/plain",
        "png" => "image/png",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// S3 存储客户端封装
///
/// 只暴露本系统需要的两种能力：按前缀列举对象键、写入对象。
/// 不依赖删除和版本管理。
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// 初始化 S3 客户端（凭证走标准 AWS 凭证链）
    pub async fn new(region: &str) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: Client::new(&sdk_config),
        }
    }

    /// 列举指定前缀下的所有对象键
    pub async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix);
            if let Some(t) = &token {
                request = request.continuation_token(t);
            }

            let output = request.send().await.map_err(|e| {
                AppError::Storage(StorageError::ListFailed {
                    bucket: bucket.to_string(),
                    prefix: prefix.to_string(),
                    source: Box::new(e),
                })
            })?;

            for object in output.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            if output.is_truncated().unwrap_or(false) {
                token = output.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        debug!("列举到 {} 个对象 (s3://{}/{})", keys.len(), bucket, prefix);
        Ok(keys)
    }

    /// 上传本地文件
    pub async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
        source_url: &str,
        page_name: &str,
    ) -> Result<()> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            AppError::Storage(StorageError::UploadFailed {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(e),
            })
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .metadata("source_url", source_url)
            .metadata("page_name", page_name)
            .metadata("downloaded_at", chrono::Local::now().to_rfc3339())
            .send()
            .await
            .map_err(|e| AppError::upload_failed(bucket, key, e))?;

        Ok(())
    }

    /// 上传内存中的字节
    pub async fn put_bytes(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::upload_failed(bucket, key, e))?;
        Ok(())
    }
}

/// 上传服务
///
/// 职责：
/// - 把单个产物写入确定性的存储键
/// - 上传确认后删除本地暂存文件
/// - 上传失败时保留本地文件以便人工恢复
pub struct Uploader {
    storage: S3Storage,
}

impl Uploader {
    pub fn new(storage: S3Storage) -> Self {
        Self { storage }
    }

    /// 上传一个产物并清理本地文件，返回写入的存储键
    pub async fn upload_artifact(&self, job: &PageJob, artifact: &Artifact) -> Result<String> {
        let key = object_key(job, &stamp(artifact.produced_at), artifact.format);
        info!(
            "📤 上传 {} → s3://{}/{}",
            artifact.local_path.display(),
            job.bucket,
            key
        );

        self.storage
            .put_file(
                &job.bucket,
                &key,
                &artifact.local_path,
                artifact.format.content_type(),
                &job.url,
                &job.name,
            )
            .await?;

        // 只有确认上传成功才删除本地文件，失败路径上保留
        if let Err(e) = tokio::fs::remove_file(&artifact.local_path).await {
            warn!(
                "⚠️ 清理本地文件失败 ({}): {}",
                artifact.local_path.display(),
                e
            );
        }

        info!("✓ 上传完成: {}", key);
        Ok(key)
    }

    /// 上传本次任务的元数据文档（metadata.json），失败只告警不中断
    pub async fn upload_run_metadata(
        &self,
        job: &PageJob,
        key_stamp: &str,
        uploaded_keys: &[String],
    ) -> Result<()> {
        let metadata = json!({
            "page_name": job.name,
            "source_url": job.url,
            "download_timestamp": key_stamp,
            "output_formats": job.formats,
            "uploaded_files": uploaded_keys,
            "s3_bucket": job.bucket,
            "s3_prefix": job.key_prefix(),
        });

        let key = format!("{}metadata.json", job.key_prefix());
        let body = serde_json::to_vec_pretty(&metadata)?;
        self.storage
            .put_bytes(&job.bucket, &key, body, content_type_for_ext("json"))
            .await?;

        debug!("✓ 元数据已上传: {}", key);
        Ok(())
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

    #[test]
    fn test_object_key_layout_top_level() {
        let key = object_key(&sample_job(), "20260829_101530", OutputFormat::Markdown);
        assert_eq!(key, "notion-pages/git/git_20260829_101530.md");
    }

    #[test]
    fn test_object_key_layout_child() {
        let mut job = sample_job();
        job.name = "roadmap".to_string();
        job.parent = Some("git".to_string());
        let key = object_key(&job, "20260829_101530", OutputFormat::Pdf);
        assert_eq!(key, "notion-pages/git/roadmap/roadmap_20260829_101530.pdf");
    }

    #[test]
    fn test_object_key_is_deterministic() {
        let a = object_key(&sample_job(), "20260829_101530", OutputFormat::Png);
        let b = object_key(&sample_job(), "20260829_101530", OutputFormat::Png);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stamp_round_trips_to_the_second() {
        let produced_at = NaiveDate::from_ymd_opt(2026, 8, 29)
            .unwrap()
            .and_hms_opt(10, 15, 30)
            .unwrap();
        let key = object_key(&sample_job(), &stamp(produced_at), OutputFormat::Markdown);
        // 键里嵌入的时间戳重新解析后必须精确到秒地等于导出时间
        assert_eq!(parse_stamp(&key).unwrap(), produced_at);
    }

    #[test]
    fn test_parse_stamp_ignores_unrelated_keys() {
        assert!(parse_stamp("notion-pages/git/metadata.json").is_none());
        assert!(parse_stamp("notion-pages/git/git_notastamp.md").is_none());
        assert!(parse_stamp("notion-pages/git/git_20260829.md").is_none());
    }

    #[test]
    fn test_content_type_for_ext() {
        assert_eq!(content_type_for_ext("md"), "text/markdown");
        assert_eq!(content_type_for_ext("csv"), "text/csv");
        assert_eq!(content_type_for_ext("bin"), "application/octet-stream");
    }
}
