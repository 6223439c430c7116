// src/fetcher/engine.rs

use crate::fetcher::options::FetchOptions;
use async_trait::async_trait;
use indicatif::ProgressBar;
use std::path::Path;
use thiserror::Error;

/// 单次抓取的失败分类，在引擎边界处判定。
/// 403 的识别基于错误文本中的 "403"/"Forbidden" 子串，是尽力而为的
/// 启发式而非可靠契约，因此原始诊断信息始终随变体一起保留。
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("HTTP 403 Forbidden: {detail}")]
    Forbidden { detail: String },
    #[error("{detail}")]
    Other { detail: String },
}

impl FetchError {
    /// 从引擎的原始错误文本分类
    pub fn classify(detail: String) -> Self {
        if detail.contains("403") || detail.contains("Forbidden") {
            Self::Forbidden { detail }
        } else {
            Self::Other { detail }
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::Forbidden { detail } | Self::Other { detail } => detail,
        }
    }
}

/// 外部下载引擎的窄接口。实现者负责定位、下载和转码媒体，
/// 本 crate 只负责构造配置、解释失败并管理临时目录。
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// 执行一次下载，把产出写入 `scratch_dir`。
    /// 已知字节进度时，实现者应把百分比 (0-100) 写入 `pbar`。
    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        scratch_dir: &Path,
        pbar: &ProgressBar,
    ) -> Result<(), FetchError>;

    /// 引擎版本信息，用于排查时确认引擎是否过旧。拿不到不算错误。
    async fn probe_version(&self) -> Option<String> {
        None
    }

    /// 清理引擎遗留的缓存，返回实际清理掉的目录。默认无事可做。
    fn clear_cache(&self) -> Vec<std::path::PathBuf> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_forbidden_signatures() {
        assert!(matches!(
            FetchError::classify("ERROR: HTTP Error 403: Forbidden".to_string()),
            FetchError::Forbidden { .. }
        ));
        assert!(matches!(
            FetchError::classify("server said Forbidden".to_string()),
            FetchError::Forbidden { .. }
        ));
        assert!(matches!(
            FetchError::classify("ERROR: Video unavailable".to_string()),
            FetchError::Other { .. }
        ));
    }

    #[test]
    fn test_raw_detail_is_preserved() {
        let err = FetchError::classify("HTTP Error 403: Forbidden (cached)".to_string());
        assert_eq!(err.detail(), "HTTP Error 403: Forbidden (cached)");
    }
}
