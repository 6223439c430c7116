// src/fetcher/controller.rs

use super::{
    engine::{FetchEngine, FetchError},
    options::FetchOptions,
};
use crate::{
    error::{AppError, AppResult},
    symbols,
};
use indicatif::ProgressBar;
use log::{info, warn};
use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// 重试循环的状态。每个请求从 `Idle` 开始，
/// `Succeeded` 与永久失败 (以 Err 返回) 是终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Attempting(u32),
    Retrying(u32),
    Succeeded,
}

/// 围绕单次外部抓取调用的有界重试控制器。
/// 只有 403 签名的失败才重试，重试间隔 (n+1)*2 秒；
/// 其余失败立即终止。总尝试次数不超过 `max_attempts`。
pub struct RetryController<'a> {
    engine: &'a dyn FetchEngine,
    max_attempts: u32,
    backoff_step: Duration,
    cancellation_token: Arc<AtomicBool>,
}

impl<'a> RetryController<'a> {
    pub fn new(
        engine: &'a dyn FetchEngine,
        max_attempts: u32,
        backoff_step_secs: u64,
        cancellation_token: Arc<AtomicBool>,
    ) -> Self {
        Self {
            engine,
            max_attempts,
            backoff_step: Duration::from_secs(backoff_step_secs),
            cancellation_token,
        }
    }

    /// 第 n 次 (0 起) 失败后的等待时长: (n+1)*2 秒，随次数递增
    fn backoff(&self, n: u32) -> Duration {
        self.backoff_step * (n + 1)
    }

    pub async fn run(
        &self,
        url: &str,
        options: &FetchOptions,
        scratch_dir: &Path,
        pbar: &ProgressBar,
    ) -> AppResult<()> {
        let mut state = State::Idle;
        loop {
            state = match state {
                State::Idle => State::Attempting(0),
                State::Attempting(n) => {
                    if self.cancellation_token.load(Ordering::Relaxed) {
                        return Err(AppError::UserInterrupt);
                    }
                    info!("下载尝试 {}/{}: {}", n + 1, self.max_attempts, url);
                    pbar.println(format!(
                        "{} 下载尝试 {}/{}",
                        *symbols::INFO,
                        n + 1,
                        self.max_attempts
                    ));
                    match self.engine.fetch(url, options, scratch_dir, pbar).await {
                        Ok(()) => State::Succeeded,
                        Err(FetchError::Forbidden { detail }) => {
                            warn!("尝试 {} 遇到 403: {}", n + 1, detail);
                            if n + 1 < self.max_attempts {
                                State::Retrying(n)
                            } else {
                                return Err(AppError::PersistentForbidden { detail });
                            }
                        }
                        Err(FetchError::Other { detail }) => {
                            // 非 403 失败不重试
                            warn!("尝试 {} 失败 (不重试): {}", n + 1, detail);
                            return Err(AppError::FetchFailed { detail });
                        }
                    }
                }
                State::Retrying(n) => {
                    let wait = self.backoff(n);
                    pbar.println(format!(
                        "{} 等待 {} 秒后重试...",
                        *symbols::WARN,
                        wait.as_secs()
                    ));
                    tokio::time::sleep(wait).await;
                    State::Attempting(n + 1)
                }
                State::Succeeded => return Ok(()),
            };
        }
    }
}
