// src/lib.rs

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod request;
pub mod symbols;
pub mod ui;
pub mod utils;

use crate::{
    cli::Cli,
    config::AppConfig,
    error::{AppError, AppResult},
    fetcher::{FetchEngine, MediaDownloader, YtDlpEngine},
    models::{DownloadRequest, FetchedFile},
    request::Source,
};
use colored::*;
use log::{debug, error, info, warn};
use std::{
    fs,
    path::Path,
    sync::{Arc, atomic::AtomicBool},
};

/// 核心的执行上下文，包含所有任务共享的状态
#[derive(Clone)]
pub struct DownloadJobContext {
    pub config: Arc<AppConfig>,
    pub args: Arc<Cli>,
    pub cancellation_token: Arc<AtomicBool>,
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>, cancellation_token: Arc<AtomicBool>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    if args.guide_403 {
        ui::box_message(
            "403 错误排查指南",
            constants::HELP_FORBIDDEN_GUIDE
                .lines()
                .collect::<Vec<_>>()
                .as_slice(),
            |s| s.cyan(),
        );
        return Ok(());
    }

    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);

    let engine = YtDlpEngine::new(&config);
    match engine.probe_version().await {
        Some(version) => {
            info!("检测到 yt-dlp，版本: {}", version);
            println!("\n{} yt-dlp 版本: {}", *symbols::INFO, version);
        }
        None => {
            warn!("未检测到可用的 yt-dlp");
            println!(
                "\n{}",
                format!(
                    "{} 未检测到可用的 yt-dlp，下载将会失败。请先安装或在配置文件中指定路径。",
                    *symbols::WARN
                )
                .yellow()
            );
        }
    }

    let context = DownloadJobContext {
        config,
        args: args.clone(),
        cancellation_token,
    };

    if args.interactive {
        handle_interactive_mode(&engine, &context).await?;
    } else if let Some(batch_file) = &args.batch_file {
        process_batch_tasks(batch_file, &engine, &context).await?;
    } else if let Some(url) = &args.url {
        process_single_task(url, &engine, &context).await?;
    };

    Ok(())
}

async fn handle_interactive_mode(
    engine: &dyn FetchEngine,
    context: &DownloadJobContext,
) -> AppResult<()> {
    ui::print_header("交互模式");
    println!(
        "在此模式下，你可以逐一输入 YouTube/Youku 链接进行下载。按 {} 可随时退出。",
        *symbols::CTRL_C
    );

    loop {
        if context
            .cancellation_token
            .load(std::sync::atomic::Ordering::Relaxed)
        {
            return Err(AppError::UserInterrupt);
        }
        match ui::prompt("请输入视频链接 (直接回车退出)", None) {
            Ok(input) if !input.is_empty() => {
                if let Err(e) = process_single_task(&input, engine, context).await {
                    log::error!("交互模式任务 '{}' 失败: {}", input, e);
                    if matches!(e, AppError::UserInterrupt) {
                        return Err(e);
                    }
                    eprintln!(
                        "\n{} 处理任务时发生错误: {}",
                        *symbols::ERROR,
                        e.to_string().red()
                    );
                }
            }
            Ok(_) => break, // 用户输入空行
            Err(_) => return Err(AppError::UserInterrupt),
        }
    }

    println!("\n{} 退出交互模式。", *symbols::INFO);
    Ok(())
}

async fn process_batch_tasks(
    batch_file: &Path,
    engine: &dyn FetchEngine,
    context: &DownloadJobContext,
) -> AppResult<()> {
    let content = fs::read_to_string(batch_file).map_err(|e| {
        error!("读取批量文件 '{}' 失败: {}", batch_file.display(), e);
        AppError::from(e)
    })?;

    let tasks: Vec<String> = content
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if tasks.is_empty() {
        warn!("批量文件 '{}' 为空或不含有效行。", batch_file.display());
        println!(
            "{} 批量文件 '{}' 为空。",
            *symbols::WARN,
            batch_file.display()
        );
        return Ok(());
    }

    let mut success = 0;
    let mut failed = 0;
    ui::print_header(&format!(
        "开始批量处理任务 (按 {} 可随时退出)",
        *symbols::CTRL_C
    ));
    // 任何时刻只有一个请求在跑，逐个串行处理
    for (i, task) in tasks.iter().enumerate() {
        if context
            .cancellation_token
            .load(std::sync::atomic::Ordering::Relaxed)
        {
            return Err(AppError::UserInterrupt);
        }
        ui::print_sub_header(&format!(
            "批量任务 {}/{} - {}",
            i + 1,
            tasks.len(),
            utils::truncate_text(task, 60)
        ));
        match process_single_task(task, engine, context).await {
            Ok(_) => success += 1,
            Err(AppError::UserInterrupt) => return Err(AppError::UserInterrupt),
            Err(e) => {
                failed += 1;
                error!("批量任务 '{}' 失败: {}", task, e);
                eprintln!("\n{} 处理任务时发生错误: {}", *symbols::ERROR, e);
            }
        }
    }

    ui::print_header("批量任务报告");
    println!(
        "{} | {} | 总计: {}",
        format!("成功任务: {}", success).green(),
        format!("失败任务: {}", failed).red(),
        tasks.len()
    );
    if failed > 0 {
        Err(AppError::Other(anyhow::anyhow!(
            "{} 个批量任务执行失败。",
            failed
        )))
    } else {
        Ok(())
    }
}

/// 处理单个下载请求: 执行核心流程，成功则落盘，失败则给出排查提示。
/// 所有失败都在这里被分类并转为用户可读的文本，不会作为 panic 上抛。
async fn process_single_task(
    url: &str,
    engine: &dyn FetchEngine,
    context: &DownloadJobContext,
) -> AppResult<()> {
    let req = DownloadRequest {
        url: url.trim().to_string(),
        mode: context.args.mode,
        use_cookies: context.args.use_cookies,
        clear_cache_first: context.args.clear_cache,
    };
    let source = request::classify_source(&req.url);

    let downloader = MediaDownloader::new(
        engine,
        context.config.clone(),
        context.cancellation_token.clone(),
    );
    match downloader.run(&req).await {
        Ok(fetched) => save_fetched_file(&fetched, &context.args.output),
        Err(e) => {
            print_failure_hints(source, &e);
            Err(e)
        }
    }
}

/// 把下载产出的字节写入用户的输出目录
fn save_fetched_file(fetched: &FetchedFile, output_dir: &Path) -> AppResult<()> {
    fs::create_dir_all(output_dir)?;
    let absolute_dir = dunce::canonicalize(output_dir)?;
    let file_name = utils::sanitize_filename(&fetched.file_name);
    let target = absolute_dir.join(&file_name);
    fs::write(&target, &fetched.bytes)?;

    info!("文件已保存: \"{}\" ({} 字节)", target.display(), fetched.bytes.len());
    println!("\n{} 下载完成: \"{}\"", *symbols::OK, target.display());
    println!(
        "{} 文件名: {} | 大小: {}",
        *symbols::INFO,
        file_name,
        utils::format_size_mb(fetched.bytes.len())
    );
    Ok(())
}

/// 按错误类型与来源平台给出补救提示
fn print_failure_hints(source: Source, error: &AppError) {
    if let AppError::PersistentForbidden { .. } = error {
        ui::box_message(
            "403 错误排查",
            constants::HELP_FORBIDDEN_GUIDE
                .lines()
                .collect::<Vec<_>>()
                .as_slice(),
            |s| s.yellow(),
        );
    }
    if source == Source::Youku && !matches!(error, AppError::InvalidUrl(_)) {
        println!(
            "{} Youku 提示: 部分视频存在地区限制，可能需要中国大陆 IP；同时请确认 yt-dlp 为最新版本。",
            *symbols::WARN
        );
    }
}
