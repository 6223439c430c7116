// src/fetcher/options.rs

use crate::{cli::DownloadMode, config::AppConfig, constants};

/// 下载后的转封装/转码指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcess {
    /// 抽取音频并转为固定码率的 MP3
    ExtractMp3 { bitrate_kbps: u32 },
    /// 转封装为 MP4 容器
    RemuxMp4,
}

/// 传给下载引擎的一次性配置。由 `build` 纯函数构造，之后不再修改；
/// 输出路径模板由调用方按次设置，不属于本配置。
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub mode: DownloadMode,
    pub format: String,
    pub post_process: PostProcess,
    pub extractor_retries: u32,
    pub fragment_retries: u32,
    pub http_retry_sleep_cap_secs: u64,
    pub fragment_retry_sleep_cap_secs: u64,
    pub sleep_interval_secs: u64,
    pub max_sleep_interval_secs: u64,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub geo_bypass_country: String,
    pub no_check_certificate: bool,
    pub cookies_from_browser: Option<String>,
}

impl FetchOptions {
    /// 根据下载模式和标志位构造配置。
    /// 无论哪种模式，都带上防 403 的基础配置: 有界重试、封顶退避、
    /// 浏览器请求头、地区限制绕过，并跳过证书校验 (为便利性接受的风险)。
    pub fn build(mode: DownloadMode, use_cookies: bool, config: &AppConfig) -> Self {
        let (format, post_process) = match mode {
            DownloadMode::AudioOnly => (
                "bestaudio/best".to_string(),
                PostProcess::ExtractMp3 {
                    bitrate_kbps: constants::AUDIO_BITRATE_KBPS,
                },
            ),
            DownloadMode::Video => ("best[ext=mp4]/best".to_string(), PostProcess::RemuxMp4),
        };

        Self {
            mode,
            format,
            post_process,
            extractor_retries: constants::EXTRACTOR_RETRIES,
            fragment_retries: constants::FRAGMENT_RETRIES,
            http_retry_sleep_cap_secs: constants::HTTP_RETRY_SLEEP_CAP_SECS,
            fragment_retry_sleep_cap_secs: constants::FRAGMENT_RETRY_SLEEP_CAP_SECS,
            sleep_interval_secs: constants::SLEEP_INTERVAL_SECS,
            max_sleep_interval_secs: constants::MAX_SLEEP_INTERVAL_SECS,
            user_agent: config.user_agent.clone(),
            headers: constants::BROWSER_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            geo_bypass_country: config.geo_bypass_country.clone(),
            no_check_certificate: true,
            cookies_from_browser: use_cookies.then(|| config.cookies_browser.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            ytdlp_path: None,
            cookies_browser: "firefox".to_string(),
            geo_bypass_country: "US".to_string(),
            user_agent: crate::constants::USER_AGENT.to_string(),
            max_attempts: 3,
            backoff_step_secs: 2,
        }
    }

    #[test]
    fn test_audio_mode_selects_mp3_pipeline() {
        let opts = FetchOptions::build(DownloadMode::AudioOnly, false, &test_config());
        assert_eq!(opts.format, "bestaudio/best");
        assert_eq!(opts.post_process, PostProcess::ExtractMp3 { bitrate_kbps: 192 });
        assert!(opts.cookies_from_browser.is_none());
    }

    #[test]
    fn test_video_mode_prefers_mp4() {
        let opts = FetchOptions::build(DownloadMode::Video, false, &test_config());
        assert_eq!(opts.format, "best[ext=mp4]/best");
        assert_eq!(opts.post_process, PostProcess::RemuxMp4);
    }

    #[test]
    fn test_anti_forbidden_baseline_present_in_both_modes() {
        for mode in [DownloadMode::AudioOnly, DownloadMode::Video] {
            let opts = FetchOptions::build(mode, false, &test_config());
            assert_eq!(opts.extractor_retries, 5);
            assert_eq!(opts.fragment_retries, 5);
            assert!(opts.http_retry_sleep_cap_secs >= opts.fragment_retry_sleep_cap_secs);
            assert!(opts.user_agent.starts_with("Mozilla/5.0"));
            assert!(opts.headers.iter().any(|(k, _)| k == "Accept-Language"));
            assert!(opts.no_check_certificate);
        }
    }

    #[test]
    fn test_cookie_flag_selects_browser_profile() {
        let opts = FetchOptions::build(DownloadMode::Video, true, &test_config());
        assert_eq!(opts.cookies_from_browser.as_deref(), Some("firefox"));
    }
}
