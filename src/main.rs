// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use log::warn;
use std::{
    env,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use yy_dl::{
    cli::{Cli, LogLevel},
    constants, run_from_cli,
};

fn init_logger(level: LogLevel) {
    if level == LogLevel::Off {
        return;
    }

    let filter = match level {
        LogLevel::Off => log::LevelFilter::Off,
        LogLevel::Error => log::LevelFilter::Error,
        LogLevel::Warn => log::LevelFilter::Warn,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Trace => log::LevelFilter::Trace,
    };

    // 使用 clap::crate_name!() 宏获取程序名，避免硬编码
    let app_name = clap::crate_name!();

    // 优先使用标准配置目录
    let log_file_path = match dirs::home_dir() {
        Some(home) => home
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::LOG_FILE_NAME),
        // 如果无法获取主目录，则回退到临时目录
        None => {
            eprintln!("警告: 无法获取用户主目录，日志将写入临时目录。");
            env::temp_dir()
                .join(app_name)
                .join(constants::LOG_FILE_NAME)
        }
    };

    // 确保日志目录存在
    if let Some(dir) = log_file_path.parent()
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("警告: 无法创建日志目录 {:?}: {}", dir, e);
    }

    // 尝试创建主日志文件
    let file_appender = match fern::log_file(&log_file_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "警告: 无法打开主日志文件 {:?} : {}。将尝试使用备用日志文件。",
                log_file_path, e
            );

            // 备用日志文件名包含程序名以保证唯一性
            let fallback_path = std::env::temp_dir().join(format!(
                "{}-{}",
                app_name,
                constants::LOG_FALLBACK_FILE_NAME
            ));

            match fern::log_file(&fallback_path) {
                Ok(fb_file) => {
                    warn!("日志将写入备用文件: {:?}", fallback_path);
                    fb_file
                }
                Err(e_fb) => {
                    eprintln!(
                        "错误: 无法创建主日志和备用日志文件 {:?}: {}。日志将不会被记录到文件。",
                        fallback_path, e_fb
                    );
                    return;
                }
            }
        }
    };

    // 配置并应用日志格式
    let result = fern::Dispatch::new()
        .level(filter)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{:<5}] [{}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                message
            ))
        })
        .chain(file_appender)
        .apply();

    if let Err(e) = result {
        eprintln!("警告: 日志系统初始化失败: {}", e);
    }
}

#[tokio::main]
async fn main() {
    // 为 Windows 终端启用 ANSI 颜色支持。
    // 仅在 Windows 平台上编译并执行此代码块
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let cancellation_token = Arc::new(AtomicBool::new(false));
    let token_for_signal = cancellation_token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("无法监听 Ctrl-C 信号: {}", e);
            return;
        }
        token_for_signal.store(true, Ordering::Relaxed);
        println!("\n{} 用户强制中断程序。", "[!]".yellow());
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::process::exit(130);
    });

    let bin_name = env::var("CARGO_BIN_NAME").unwrap_or_else(|_| "yy-dl".to_string());

    let after_help = format!(
        "示例:\n  # 启动交互模式 (推荐)\n  {bin} -i\n\n  # 下载单个视频 (MP4)\n  {bin} --url \"https://www.youtube.com/watch?v=...\"\n\n  # 只保留音频 (MP3)\n  {bin} --url \"https://v.youku.com/...\" -m audio\n\n  # 批量下载\n  {bin} -b my_links.txt --use-cookies\n\n  # 查看 403 错误排查指南\n  {bin} --guide-403",
        bin = bin_name
    );

    let cmd = Cli::command().after_help(after_help);

    let args = Arc::new(Cli::from_arg_matches(&cmd.get_matches()).unwrap());
    init_logger(args.log_level);

    if let Err(e) = run_from_cli(args, cancellation_token).await {
        eprintln!("\n{} {}", "[X]".red(), format!("程序执行出错: {}", e).red());
        std::process::exit(1);
    }
}
