// src/cli.rs

use crate::constants;
use clap::{Parser, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// 下载模式: 仅音频 (MP3) 或完整视频 (MP4)
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum DownloadMode {
    #[value(name = "audio")]
    AudioOnly,
    #[value(name = "video")]
    Video,
}

impl DownloadMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AudioOnly => "仅音频 (MP3)",
            Self::Video => "视频 (MP4)",
        }
    }
}

// command 属性
#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("run_mode")
        .required(true)
        .args(&["interactive", "url", "batch_file", "guide_403"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 启动交互式会话，逐一输入链接
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub interactive: bool,
    /// 指定要下载的单个视频链接 (YouTube 或 Youku)
    #[arg(long, help_heading = "Mode")]
    pub url: Option<String>,
    /// 从文本文件批量下载多个链接 (每行一个)
    #[arg(short, long, value_name = "FILE", help_heading = "Mode")]
    pub batch_file: Option<PathBuf>,
    /// 显示 403 错误排查指南并退出
    #[arg(long = "guide-403", action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub guide_403: bool,

    // --- 下载选项 (Options) ---
    /// 选择下载模式: 'audio' (MP3) 或 'video' (MP4)
    #[arg(short, long, value_enum, default_value = "video", help_heading = "Options")]
    pub mode: DownloadMode,
    /// 使用本机 Firefox 的 Cookie 下载 (对部分受限视频有效)
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub use_cookies: bool,
    /// 下载前清理引擎缓存 (缓解 403 错误)
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub clear_cache: bool,
    /// 设置文件保存目录
    #[arg(short, long, value_name = "DIR", default_value_os_t = PathBuf::from(constants::DEFAULT_SAVE_DIR), help_heading = "Options")]
    pub output: PathBuf,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}
