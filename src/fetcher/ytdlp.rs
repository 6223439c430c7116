// src/fetcher/ytdlp.rs

use super::{
    engine::{FetchEngine, FetchError},
    options::{FetchOptions, PostProcess},
};
use crate::{config::AppConfig, constants};
use async_trait::async_trait;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::LazyLock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

// 引擎输出的进度行形如:
// [download]  12.5% of ~ 310.04MiB at  374.36KiB/s ETA 11:59
static PROGRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[download\]\s+(\d+\.?\d*)%").unwrap());

/// 以 yt-dlp 子进程实现的下载引擎
pub struct YtDlpEngine {
    binary: PathBuf,
}

impl YtDlpEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            binary: resolve_binary(config.ytdlp_path.as_deref()),
        }
    }

    fn build_args(&self, url: &str, options: &FetchOptions, scratch_dir: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--newline".into(),
            "--no-playlist".into(),
            "-f".into(),
            options.format.clone(),
            "--extractor-retries".into(),
            options.extractor_retries.to_string(),
            "--fragment-retries".into(),
            options.fragment_retries.to_string(),
            "--retry-sleep".into(),
            format!("http:exp=1:{}", options.http_retry_sleep_cap_secs),
            "--retry-sleep".into(),
            format!("fragment:exp=1:{}", options.fragment_retry_sleep_cap_secs),
            "--sleep-interval".into(),
            options.sleep_interval_secs.to_string(),
            "--max-sleep-interval".into(),
            options.max_sleep_interval_secs.to_string(),
            "--user-agent".into(),
            options.user_agent.clone(),
            "--geo-bypass-country".into(),
            options.geo_bypass_country.clone(),
        ];

        for (key, value) in &options.headers {
            args.push("--add-headers".into());
            args.push(format!("{}:{}", key, value));
        }

        if options.no_check_certificate {
            args.push("--no-check-certificates".into());
        }

        if let Some(browser) = &options.cookies_from_browser {
            args.push("--cookies-from-browser".into());
            args.push(browser.clone());
        }

        match &options.post_process {
            PostProcess::ExtractMp3 { bitrate_kbps } => {
                args.push("-x".into());
                args.push("--audio-format".into());
                args.push("mp3".into());
                args.push("--audio-quality".into());
                args.push(format!("{}K", bitrate_kbps));
            }
            PostProcess::RemuxMp4 => {
                args.push("--remux-video".into());
                args.push("mp4".into());
            }
        }

        // 输出路径按次指向本次尝试的临时目录
        args.push("-P".into());
        args.push(scratch_dir.to_string_lossy().into_owned());
        args.push("-o".into());
        args.push("downloaded_file.%(ext)s".into());

        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl FetchEngine for YtDlpEngine {
    async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
        scratch_dir: &Path,
        pbar: &ProgressBar,
    ) -> Result<(), FetchError> {
        let args = self.build_args(url, options, scratch_dir);
        debug!("启动引擎: {:?} {:?}", self.binary, args);

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FetchError::Other {
                detail: format!("无法启动 {:?}: {}", self.binary, e),
            })?;

        // stdout 与 stderr 必须并发排空: 若先读完 stdout 再读 stderr，
        // 子进程可能因 stderr 管道写满而阻塞，两端互相等待形成死锁
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut tail: Vec<String> = Vec::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            debug!("[yt-dlp] {}", line);
                            tail.push(line);
                            if tail.len() > 20 {
                                tail.remove(0);
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!("读取引擎 stderr 失败，诊断信息可能不完整: {}", e);
                            break;
                        }
                    }
                }
            }
            tail
        });

        // 逐行读取 stdout 更新进度
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(percent) = parse_progress_percent(&line) {
                            pbar.set_position(percent.min(100.0) as u64);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("读取引擎 stdout 失败: {}", e);
                        break;
                    }
                }
            }
        }

        let stderr_tail = stderr_task.await.unwrap_or_default();

        let status = child.wait().await.map_err(|e| FetchError::Other {
            detail: format!("等待引擎进程失败: {}", e),
        })?;

        if status.success() {
            pbar.set_position(100);
            return Ok(());
        }
        // stderr 为空时退化为退出状态，诊断信息永远不为空
        let detail = if stderr_tail.is_empty() {
            format!("引擎异常退出，无 stderr 输出 ({})", status)
        } else {
            stderr_tail.join("\n")
        };
        Err(FetchError::classify(detail))
    }

    /// 引擎版本，便于排查 403 时确认 yt-dlp 是否过旧
    async fn probe_version(&self) -> Option<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!version.is_empty()).then_some(version)
    }

    /// 清理引擎在各环境下可能留下的缓存目录，过期缓存有时会触发 403。
    /// 目录不存在不算错误。
    fn clear_cache(&self) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(cache_dir) = dirs::cache_dir() {
            candidates.push(cache_dir.join("yt-dlp"));
        }
        for dir in constants::ENGINE_CACHE_DIRS {
            candidates.push(PathBuf::from(dir));
        }

        let mut cleared = Vec::new();
        for dir in candidates {
            if !dir.exists() {
                continue;
            }
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {
                    info!("已清理引擎缓存目录: {:?}", dir);
                    cleared.push(dir);
                }
                Err(e) => warn!("清理缓存目录 {:?} 失败: {}", dir, e),
            }
        }
        cleared
    }
}

/// 从进度行中提取百分比，非进度行返回 None
fn parse_progress_percent(line: &str) -> Option<f64> {
    PROGRESS_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 解析 yt-dlp 可执行文件位置: 配置文件覆盖 > 常见安装路径 > PATH
fn resolve_binary(configured: Option<&str>) -> PathBuf {
    if let Some(path) = configured {
        return PathBuf::from(path);
    }
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp",
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
    ];
    for path in common_paths {
        if Path::new(path).exists() {
            return PathBuf::from(path);
        }
    }
    PathBuf::from("yt-dlp")
}
