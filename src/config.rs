use std::str::FromStr;
use std::time::Duration;

use log::warn;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
/// 任务默认过期时间：30 分钟
pub const DEFAULT_TASK_TTL_SECS: u64 = 30 * 60;
/// 后台清理间隔：5 分钟
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 5 * 60;
/// 服务端允许的最大分辨率，512³ 个 u32 约 512 MiB
pub const DEFAULT_MAX_RESOLUTION: usize = 512;
/// 默认分块大小（体素个数）
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

/// 服务配置，可通过环境变量覆盖
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub task_ttl: Duration,
    pub cleanup_interval: Duration,
    /// None 表示使用 rayon 默认线程数
    pub worker_threads: Option<usize>,
    pub max_resolution: usize,
    pub default_chunk_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            task_ttl: Duration::from_secs(DEFAULT_TASK_TTL_SECS),
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
            worker_threads: None,
            max_resolution: DEFAULT_MAX_RESOLUTION,
            default_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ServerConfig {
    /// 从进程环境变量读取配置
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置；无法解析的值回退到默认值
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("MANDELBULB_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "MANDELBULB_PORT", defaults.port),
            task_ttl: Duration::from_secs(parse_or(
                &lookup,
                "MANDELBULB_TASK_TTL_SECS",
                DEFAULT_TASK_TTL_SECS,
            )),
            cleanup_interval: Duration::from_secs(
                parse_or(
                    &lookup,
                    "MANDELBULB_CLEANUP_INTERVAL_SECS",
                    DEFAULT_CLEANUP_INTERVAL_SECS,
                )
                .max(1),
            ),
            worker_threads: lookup("MANDELBULB_WORKER_THREADS")
                .and_then(|raw| parse_value::<usize>("MANDELBULB_WORKER_THREADS", &raw))
                .filter(|&n| n > 0),
            max_resolution: parse_or(&lookup, "MANDELBULB_MAX_RESOLUTION", defaults.max_resolution)
                .max(1),
            default_chunk_size: parse_or(
                &lookup,
                "MANDELBULB_CHUNK_SIZE",
                defaults.default_chunk_size,
            )
            .max(1),
        }
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|raw| parse_value(key, &raw))
        .unwrap_or(default)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("环境变量 {}={:?} 无法解析，使用默认值", key, raw);
            None
        }
    }
}
