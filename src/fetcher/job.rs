// src/fetcher/job.rs

use super::{controller::RetryController, engine::FetchEngine, options::FetchOptions};
use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::{DownloadRequest, FetchedFile},
    request::{self, Source},
    symbols, ui,
};
use log::{debug, info};
use std::{
    fs,
    path::Path,
    sync::{Arc, atomic::AtomicBool},
};
use tempfile::TempDir;

/// 围绕单个下载请求的完整编排: 校验、归一化、临时目录、
/// 重试循环、产出定位。每个请求独享自己的临时目录与配置。
pub struct MediaDownloader<'a> {
    engine: &'a dyn FetchEngine,
    config: Arc<AppConfig>,
    cancellation_token: Arc<AtomicBool>,
}

impl<'a> MediaDownloader<'a> {
    pub fn new(
        engine: &'a dyn FetchEngine,
        config: Arc<AppConfig>,
        cancellation_token: Arc<AtomicBool>,
    ) -> Self {
        Self {
            engine,
            config,
            cancellation_token,
        }
    }

    pub async fn run(&self, req: &DownloadRequest) -> AppResult<FetchedFile> {
        if !request::validate_url(&req.url) {
            return Err(AppError::InvalidUrl(req.url.clone()));
        }
        let source = request::classify_source(&req.url);
        info!("开始处理请求: url={}, mode={:?}, source={:?}", req.url, req.mode, source);
        println!(
            "\n{} 来源: {} | 模式: {}",
            *symbols::INFO,
            source.display_name(),
            req.mode.display_name()
        );

        let url = self.normalized_url(req, source);

        if req.clear_cache_first {
            let cleared = self.engine.clear_cache();
            if cleared.is_empty() {
                println!("{} 未找到可清理的引擎缓存。", *symbols::INFO);
            } else {
                println!("{} 已清理 {} 个引擎缓存目录。", *symbols::OK, cleared.len());
            }
        }

        // 临时目录为本次请求独占，任何退出路径上都会随 Drop 一并删除
        let scratch = TempDir::new()?;
        debug!("本次请求的临时目录: {:?}", scratch.path());

        let options = FetchOptions::build(req.mode, req.use_cookies, &self.config);
        let pbar = ui::new_percent_progress_bar("下载");
        let controller = RetryController::new(
            self.engine,
            self.config.max_attempts,
            self.config.backoff_step_secs,
            self.cancellation_token.clone(),
        );
        let fetch_result = controller.run(&url, &options, scratch.path(), &pbar).await;
        pbar.finish_and_clear();
        fetch_result?;

        resolve_output(scratch.path())
    }

    /// Youku 链接先改写为标准形式，其余平台原样使用
    fn normalized_url(&self, req: &DownloadRequest, source: Source) -> String {
        if source != Source::Youku {
            return req.url.clone();
        }
        let normalized = request::normalize_youku_url(&req.url);
        if normalized != req.url {
            info!("Youku 链接已标准化: {} -> {}", req.url, normalized);
            println!("{} Youku 链接已转换为标准形式: {}", *symbols::INFO, normalized);
        }
        normalized
    }
}

/// 在临时目录中定位本次尝试的产出文件并读入内存。
/// 目录里至多只会有一个最终产出，取首个条目即可；
/// 引擎报告成功却没有产出时，判定为 EmptyOutput。
fn resolve_output(scratch_dir: &Path) -> AppResult<FetchedFile> {
    let mut entries = fs::read_dir(scratch_dir)?;
    let Some(entry) = entries.next().transpose()? else {
        return Err(AppError::EmptyOutput);
    };
    let file_name = entry.file_name().to_string_lossy().to_string();
    let bytes = fs::read(entry.path())?;
    info!("产出文件: '{}' ({} 字节)", file_name, bytes.len());
    Ok(FetchedFile { bytes, file_name })
}
