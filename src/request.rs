// src/request.rs

use crate::constants;
use regex::Regex;
use std::sync::LazyLock;

static YOUKU_VID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"vid=([^&]+)").unwrap());

/// URL 对应的视频平台
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    YouTube,
    Youku,
    Unknown,
}

impl Source {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Youku => "Youku",
            Self::Unknown => "未知平台",
        }
    }
}

/// 校验是否为可识别的 YouTube/Youku 链接。
/// 刻意保持宽松: 只做前缀/子串检查，更细的失败交给下载阶段暴露。
pub fn validate_url(url: &str) -> bool {
    classify_source(url) != Source::Unknown
}

/// 判定链接所属平台。YouTube 前缀优先于 Youku 检查，首个命中即返回。
pub fn classify_source(url: &str) -> Source {
    if constants::YOUTUBE_PREFIXES.iter().any(|p| url.starts_with(p)) {
        return Source::YouTube;
    }
    if constants::YOUKU_PREFIXES.iter().any(|p| url.starts_with(p))
        || url.contains(constants::YOUKU_DOMAIN)
    {
        return Source::Youku;
    }
    Source::Unknown
}

/// 将带 `vid=` 查询参数的 Youku 链接改写为标准形式
/// `https://v.youku.com/v_show/id_{vid}.html`，其余形式原样返回。
pub fn normalize_youku_url(url: &str) -> String {
    if url.contains(constants::YOUKU_DOMAIN)
        && let Some(caps) = YOUKU_VID_RE.captures(url)
    {
        return format!("https://v.youku.com/v_show/id_{}.html", &caps[1]);
    }
    url.to_string()
}
