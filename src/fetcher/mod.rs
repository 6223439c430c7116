// src/fetcher/mod.rs

mod controller;
mod engine;
mod job;
mod options;
mod ytdlp;

pub use controller::RetryController;
pub use engine::{FetchEngine, FetchError};
pub use job::MediaDownloader;
pub use options::{FetchOptions, PostProcess};
pub use ytdlp::YtDlpEngine;
