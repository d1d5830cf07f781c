use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// 性能数据记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// 开始时间 (Unix 时间戳，毫秒)
    pub start_time: u64,
    /// 结束时间 (Unix 时间戳，毫秒)
    pub end_time: u64,
    /// 阶段，例如 "validate", "compute", "split", "chunk"
    pub stage: String,
    /// 消息，例如体素数量或 chunk 编号
    pub msg: String,
}

impl PerformanceRecord {
    /// 从一个已经结束的阶段生成记录，`started` 是该阶段开始时刻
    pub fn since(stage: &str, started: Instant, msg: impl Into<String>) -> Self {
        let end_time = get_unix_timestamp_ms();
        let elapsed = started.elapsed().as_millis() as u64;
        Self {
            start_time: end_time.saturating_sub(elapsed),
            end_time,
            stage: stage.to_string(),
            msg: msg.into(),
        }
    }
}

/// 性能数据存储
/// 按 task_id 存储性能记录
pub struct PerformanceStore {
    /// task_id -> (创建时间, 性能记录列表)
    records: RwLock<HashMap<String, (Instant, Vec<PerformanceRecord>)>>,
    /// TTL（Time-To-Live）过期时间
    default_ttl: Duration,
}

impl PerformanceStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(crate::config::DEFAULT_TASK_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            default_ttl: ttl,
        }
    }

    /// 添加性能记录
    pub fn add_record(&self, task_id: &str, record: PerformanceRecord) {
        self.records
            .write()
            .entry(task_id.to_string())
            .or_insert_with(|| (Instant::now(), Vec::new()))
            .1
            .push(record);
    }

    /// 获取指定任务的所有性能记录
    pub fn get_records(&self, task_id: &str) -> Option<Vec<PerformanceRecord>> {
        self.records
            .read()
            .get(task_id)
            .map(|(_, records)| records.clone())
    }

    /// 清理过期的任务记录
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut records = self.records.write();
        let before_count = records.len();
        records.retain(|_, (created_at, _)| now.duration_since(*created_at) < self.default_ttl);
        before_count - records.len()
    }
}

impl Default for PerformanceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 获取 Unix 时间戳（毫秒）
pub fn get_unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_per_task() {
        let store = PerformanceStore::new();
        store.add_record("a", PerformanceRecord::since("compute", Instant::now(), "64 体素"));
        store.add_record("a", PerformanceRecord::since("split", Instant::now(), "1 chunk"));
        store.add_record("b", PerformanceRecord::since("compute", Instant::now(), ""));

        let records = store.get_records("a").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].stage, "compute");
        assert!(records[0].start_time <= records[0].end_time);
        assert!(store.get_records("missing").is_none());
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let store = PerformanceStore::with_ttl(Duration::ZERO);
        store.add_record("a", PerformanceRecord::since("compute", Instant::now(), ""));
        assert_eq!(store.cleanup_expired(), 1);
        assert!(store.get_records("a").is_none());
    }
}
