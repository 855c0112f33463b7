//! # Notion Page Export
//!
//! 一个配置驱动的 Notion 页面批量导出工具：驱动浏览器把页面导出为
//! markdown / 整页截图 / PDF，上传到 S3，并按新鲜窗口跳过近期已导出的页面。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 唯一的 page owner，提供导航/等待/截图/PDF/eval 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个任务
//! - `PageExporter` - 按格式产出产物的能力
//! - `SubpageDiscoverer` - 枚举子页面/数据库行的能力
//! - `CacheGate` - 按存储里对象年龄判定是否导出的能力
//! - `S3Storage` / `Uploader` - 对象存储读写和本地清理能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个任务"的完整处理流程
//! - `ExportCtx` - 上下文封装（任务序号 + 名称 + URL）
//! - `ExportFlow` - 流程编排（缓存闸门 → 导航 → 导出 → 上传）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 运行编排器，管理浏览器会话和顺序调度
//! - `orchestrator/job_processor` - 单个任务处理器，含子页面展开

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod workflow;

// 重新导出常用类型
pub use browser::BrowserSession;
pub use config::GlobalConfig;
pub use error::{AppError, AppResult};
pub use infrastructure::PageDriver;
pub use models::{Artifact, CacheDecision, OutputFormat, PageJob};
pub use orchestrator::{App, RunStats};
pub use workflow::{ExportCtx, ExportFlow, ExportOutcome};
