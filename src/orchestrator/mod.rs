//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责运行生命周期和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 运行编排器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 打开唯一的浏览器会话并串行复用
//! - 子任务插队（紧跟父任务处理）
//! - 输出全局统计信息
//!
//! ### `job_processor` - 单个任务处理器
//! - 把一个任务委托给 ExportFlow 逐格式处理
//! - 父页面渲染后枚举子页面
//! - 输出单个任务的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! app (处理 Vec<PageJob>)
//!     ↓
//! job_processor (处理单个 PageJob)
//!     ↓
//! workflow::ExportFlow (处理单个 任务/格式 组合)
//!     ↓
//! services (能力层：cache_gate / exporter / discovery / storage)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管运行，job_processor 管单个任务
//! 2. **资源隔离**：只有编排层持有 BrowserSession 和 PageDriver
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod app;
pub mod job_processor;

// 重新导出主要类型
pub use app::{App, RunStats};
pub use job_processor::{process_job, JobReport, SummaryLine};
