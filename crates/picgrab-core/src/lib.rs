pub mod config;
pub mod logging;

pub mod checksum;
pub mod control;
pub mod dedup;
pub mod downloader;
pub mod extract;
pub mod http;
pub mod retry;
pub mod scheduler;
pub mod storage;
pub mod update;
pub mod url_model;
pub mod variants;
