// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const DEFAULT_SAVE_DIR: &str = "downloads";

/// 识别为 YouTube 的 URL 前缀
pub const YOUTUBE_PREFIXES: [&str; 2] = ["https://www.youtube.com/", "https://youtu.be/"];
/// 识别为 Youku 的 URL 前缀（另外，任意位置包含 "youku.com" 也算）
pub const YOUKU_PREFIXES: [&str; 2] = ["https://v.youku.com/", "https://m.youku.com/"];
pub const YOUKU_DOMAIN: &str = "youku.com";

/// 403 重试策略: 最多尝试次数，第 n 次失败后等待 (n+1)*2 秒
pub const MAX_ATTEMPTS: u32 = 3;
pub const BACKOFF_STEP_SECS: u64 = 2;

/// 传给引擎的提取器/分片级重试参数
pub const EXTRACTOR_RETRIES: u32 = 5;
pub const FRAGMENT_RETRIES: u32 = 5;
pub const HTTP_RETRY_SLEEP_CAP_SECS: u64 = 16;
pub const FRAGMENT_RETRY_SLEEP_CAP_SECS: u64 = 8;
pub const SLEEP_INTERVAL_SECS: u64 = 2;
pub const MAX_SLEEP_INTERVAL_SECS: u64 = 5;

pub const AUDIO_BITRATE_KBPS: u32 = 192;

pub const DEFAULT_COOKIES_BROWSER: &str = "firefox";
pub const DEFAULT_GEO_BYPASS_COUNTRY: &str = "US";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 模拟浏览器的基础请求头，随 User-Agent 一并传给引擎
pub const BROWSER_HEADERS: [(&str, &str); 6] = [
    ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Accept-Encoding", "gzip, deflate"),
    ("DNT", "1"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// 引擎在各环境下可能使用的缓存目录（相对项以当前目录为基准）
pub const ENGINE_CACHE_DIRS: [&str; 2] = [".cache/yt-dlp", "/tmp/yt-dlp-cache"];

pub const HELP_FORBIDDEN_GUIDE: &str = r#"
持续出现 HTTP 403 Forbidden 时，可按以下顺序排查:
1. 确认 yt-dlp 为最新版本:
   yt-dlp -U  (或通过包管理器更新)
2. 启用浏览器 Cookie (--use-cookies):
   使用 Firefox 登录对应平台后重试，对部分受限视频有效。
3. 下载前清理引擎缓存 (--clear-cache):
   过期缓存有时会触发 403。
4. 等待一段时间后重试:
   平台的临时限流通常会在数小时内自行解除。
5. Youku 视频请注意地区限制:
   部分视频仅限中国大陆 IP 访问。"#;
