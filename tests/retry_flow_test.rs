// tests/retry_flow_test.rs
//
// 用进程内的模拟引擎驱动重试控制器与下载任务，
// 不依赖本机安装 yt-dlp。

use async_trait::async_trait;
use indicatif::ProgressBar;
use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};
use yy_dl::{
    cli::DownloadMode,
    config::AppConfig,
    error::AppError,
    fetcher::{FetchEngine, FetchError, FetchOptions, MediaDownloader, RetryController},
    models::DownloadRequest,
};

/// 模拟引擎的预设行为
enum Script {
    AlwaysForbidden,
    ForbiddenOnceThenOk,
    FailOther,
    /// 成功并把文件写入临时目录
    WriteFile { name: &'static str, bytes: &'static [u8] },
    /// 成功但不产出任何文件
    SucceedEmpty,
}

struct MockEngine {
    script: Script,
    calls: AtomicU32,
    seen_scratch: std::sync::Mutex<Option<std::path::PathBuf>>,
}

impl MockEngine {
    fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicU32::new(0),
            seen_scratch: std::sync::Mutex::new(None),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FetchEngine for MockEngine {
    async fn fetch(
        &self,
        _url: &str,
        _options: &FetchOptions,
        scratch_dir: &Path,
        _pbar: &ProgressBar,
    ) -> Result<(), FetchError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        *self.seen_scratch.lock().unwrap() = Some(scratch_dir.to_path_buf());
        match &self.script {
            Script::AlwaysForbidden => Err(FetchError::classify(
                "ERROR: HTTP Error 403: Forbidden".to_string(),
            )),
            Script::ForbiddenOnceThenOk => {
                if call == 0 {
                    Err(FetchError::classify(
                        "ERROR: HTTP Error 403: Forbidden".to_string(),
                    ))
                } else {
                    Ok(())
                }
            }
            Script::FailOther => Err(FetchError::classify(
                "ERROR: Video unavailable".to_string(),
            )),
            Script::WriteFile { name, bytes } => {
                std::fs::write(scratch_dir.join(name), bytes).unwrap();
                Ok(())
            }
            Script::SucceedEmpty => Ok(()),
        }
    }
}

fn controller<'a>(engine: &'a MockEngine, token: Arc<AtomicBool>) -> RetryController<'a> {
    RetryController::new(engine, 3, 2, token)
}

fn options() -> FetchOptions {
    FetchOptions::build(DownloadMode::Video, false, &AppConfig::default())
}

// --- 重试控制器 ---

#[tokio::test(start_paused = true)]
async fn test_persistent_403_stops_after_three_attempts() {
    let engine = MockEngine::new(Script::AlwaysForbidden);
    let token = Arc::new(AtomicBool::new(false));
    let scratch = tempfile::tempdir().unwrap();
    let pbar = ProgressBar::hidden();

    let start = tokio::time::Instant::now();
    let result = controller(&engine, token)
        .run("https://youtu.be/abc", &options(), scratch.path(), &pbar)
        .await;

    assert_eq!(engine.calls(), 3);
    assert!(matches!(result, Err(AppError::PersistentForbidden { .. })));
    // 第 1、2 次失败后分别等待 2 秒和 4 秒
    assert_eq!(start.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_single_403_recovers_after_one_backoff() {
    let engine = MockEngine::new(Script::ForbiddenOnceThenOk);
    let token = Arc::new(AtomicBool::new(false));
    let scratch = tempfile::tempdir().unwrap();
    let pbar = ProgressBar::hidden();

    let start = tokio::time::Instant::now();
    let result = controller(&engine, token)
        .run("https://youtu.be/abc", &options(), scratch.path(), &pbar)
        .await;

    assert!(result.is_ok());
    assert_eq!(engine.calls(), 2);
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_non_403_failure_is_terminal_without_retry() {
    let engine = MockEngine::new(Script::FailOther);
    let token = Arc::new(AtomicBool::new(false));
    let scratch = tempfile::tempdir().unwrap();
    let pbar = ProgressBar::hidden();

    let start = tokio::time::Instant::now();
    let result = controller(&engine, token)
        .run("https://youtu.be/abc", &options(), scratch.path(), &pbar)
        .await;

    assert_eq!(engine.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    match result {
        Err(AppError::FetchFailed { detail }) => {
            // 原始诊断信息原样保留
            assert!(detail.contains("Video unavailable"));
        }
        other => panic!("预期 FetchFailed，实际: {:?}", other),
    }
}

#[tokio::test]
async fn test_cancellation_token_aborts_before_first_attempt() {
    let engine = MockEngine::new(Script::AlwaysForbidden);
    let token = Arc::new(AtomicBool::new(true));
    let scratch = tempfile::tempdir().unwrap();
    let pbar = ProgressBar::hidden();

    let result = controller(&engine, token)
        .run("https://youtu.be/abc", &options(), scratch.path(), &pbar)
        .await;

    assert!(matches!(result, Err(AppError::UserInterrupt)));
    assert_eq!(engine.calls(), 0);
}

// --- 完整下载任务 ---

fn video_request(url: &str) -> DownloadRequest {
    DownloadRequest {
        url: url.to_string(),
        mode: DownloadMode::Video,
        use_cookies: false,
        clear_cache_first: false,
    }
}

#[tokio::test]
async fn test_job_returns_fetched_bytes_and_name() {
    let engine = MockEngine::new(Script::WriteFile {
        name: "clip.mp4",
        bytes: b"fake-mp4-bytes",
    });
    let token = Arc::new(AtomicBool::new(false));
    let downloader = MediaDownloader::new(&engine, Arc::new(AppConfig::default()), token);

    let fetched = downloader
        .run(&video_request("https://youtu.be/abc"))
        .await
        .unwrap();

    assert_eq!(fetched.file_name, "clip.mp4");
    assert_eq!(fetched.bytes, b"fake-mp4-bytes");

    // 临时目录在字节读入后随请求一并删除
    let scratch = engine.seen_scratch.lock().unwrap().clone().unwrap();
    assert!(!scratch.exists());
}

#[tokio::test]
async fn test_job_reports_empty_output_as_error() {
    let engine = MockEngine::new(Script::SucceedEmpty);
    let token = Arc::new(AtomicBool::new(false));
    let downloader = MediaDownloader::new(&engine, Arc::new(AppConfig::default()), token);

    let result = downloader.run(&video_request("https://youtu.be/abc")).await;

    assert!(matches!(result, Err(AppError::EmptyOutput)));
}

#[tokio::test]
async fn test_job_rejects_invalid_url_without_calling_engine() {
    let engine = MockEngine::new(Script::AlwaysForbidden);
    let token = Arc::new(AtomicBool::new(false));
    let downloader = MediaDownloader::new(&engine, Arc::new(AppConfig::default()), token);

    let result = downloader
        .run(&video_request("https://example.com/watch?v=abc"))
        .await;

    assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_job_normalizes_youku_vid_link_before_fetch() {
    struct UrlCapture {
        seen: std::sync::Mutex<Option<String>>,
    }

    #[async_trait]
    impl FetchEngine for UrlCapture {
        async fn fetch(
            &self,
            url: &str,
            _options: &FetchOptions,
            scratch_dir: &Path,
            _pbar: &ProgressBar,
        ) -> Result<(), FetchError> {
            *self.seen.lock().unwrap() = Some(url.to_string());
            std::fs::write(scratch_dir.join("clip.mp4"), b"x").unwrap();
            Ok(())
        }
    }

    let engine = UrlCapture {
        seen: std::sync::Mutex::new(None),
    };
    let token = Arc::new(AtomicBool::new(false));
    let downloader = MediaDownloader::new(&engine, Arc::new(AppConfig::default()), token);

    downloader
        .run(&video_request("https://m.youku.com/play?vid=XNDI1&from=share"))
        .await
        .unwrap();

    assert_eq!(
        engine.seen.lock().unwrap().as_deref(),
        Some("https://v.youku.com/v_show/id_XNDI1.html")
    );
}
