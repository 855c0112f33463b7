//! 导出上下文
//!
//! 封装"我正在处理第几个任务、它叫什么、指向哪里"这一信息

use std::fmt::Display;

/// 导出上下文
///
/// 只携带日志和汇总需要的标识信息，不持有任何资源
#[derive(Debug, Clone)]
pub struct ExportCtx {
    /// 任务序号（从1开始，仅用于日志显示）
    pub job_index: usize,
    /// 任务名称
    pub name: String,
    /// 页面 URL
    pub url: String,
}

impl ExportCtx {
    /// 创建新的导出上下文
    pub fn new(job_index: usize, name: String, url: String) -> Self {
        Self {
            job_index,
            name,
            url,
        }
    }
}

impl Display for ExportCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[任务#{} {} ({})]", self.job_index, self.name, self.url)
    }
}
