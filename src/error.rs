// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("无效的 YouTube/Youku 链接: {0}")]
    InvalidUrl(String),
    #[error("403 错误持续存在，已达最大重试次数: {detail}")]
    PersistentForbidden { detail: String },
    #[error("下载引擎执行失败: {detail}")]
    FetchFailed { detail: String },
    #[error("引擎报告成功，但临时目录中没有产出文件")]
    EmptyOutput,
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("用户中断")]
    UserInterrupt,
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;
