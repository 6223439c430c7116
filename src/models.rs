// src/models.rs

use crate::cli::DownloadMode;

/// 一次用户提交对应的下载请求，构造后不可变，请求结束即丢弃
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub mode: DownloadMode,
    pub use_cookies: bool,
    pub clear_cache_first: bool,
}

/// 下载成功后的产出: 文件内容与文件名，由请求方独占持有
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
}
