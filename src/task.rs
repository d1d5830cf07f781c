use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::params::GridParams;
use crate::sampler::SampleControl;
use crate::scalar_field::ScalarField;

#[derive(Debug, Clone, Serialize)]
pub struct ChunkDescriptor {
    pub index: usize,
    /// 开始位置（包含），单位：体素索引（行主序）
    pub start: usize,
    /// 结束位置（不包含），单位：体素索引（行主序）
    pub end: usize,
}

/// 按 chunk_size 将 [0, data_length) 切分为连续区间
pub fn split_chunks(data_length: usize, chunk_size: usize) -> Vec<ChunkDescriptor> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;
    while start < data_length {
        let end = (start + chunk_size).min(data_length);
        chunks.push(ChunkDescriptor { index, start, end });
        start = end;
        index += 1;
    }
    chunks
}

/// 任务状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed { min_value: u32, max_value: u32 },
    Failed { error: String },
    Cancelled,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }
}

/// 任务数据，存储一次标量场计算的参数、状态与分块结果
/// 使用 HashMap 独立存储每个 chunk，允许单独释放
pub struct TaskData {
    pub params: GridParams,
    /// 分块描述列表
    pub chunks: Vec<ChunkDescriptor>,
    /// 每个 chunk 的数据，key 是 chunk_index
    /// 当 chunk 被请求后，对应的数据会被移除以释放内存
    /// None 表示 chunk 正在计算中，Some(Vec) 表示已就绪
    pub chunk_data: RwLock<HashMap<usize, Option<Vec<u32>>>>,
    pub status: RwLock<TaskStatus>,
    /// 采样器的取消标记与进度
    pub control: Arc<SampleControl>,
    /// 任务创建时间，用于 TTL 过期检查
    pub created_at: Instant,
}

impl TaskData {
    /// 创建新的 TaskData（计算尚未开始，chunk 全部未就绪）
    pub fn new(params: GridParams, chunks: Vec<ChunkDescriptor>) -> Self {
        let chunk_data: HashMap<usize, Option<Vec<u32>>> = chunks
            .iter()
            .map(|descriptor| (descriptor.index, None))
            .collect();

        Self {
            params,
            chunks,
            chunk_data: RwLock::new(chunk_data),
            status: RwLock::new(TaskStatus::Pending),
            control: Arc::new(SampleControl::new()),
            created_at: Instant::now(),
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status.read().clone()
    }

    pub fn set_status(&self, status: TaskStatus) {
        *self.status.write() = status;
    }

    /// 计算完成后按分块描述切分标量场并存储
    ///
    /// 数据从尾部逐块移出，切分过程中不会同时持有完整场和全部 chunk 两份数据。
    /// 状态锁在整个过程中保持，若此前已请求取消则丢弃结果并返回 false
    pub fn store_field(&self, field: ScalarField) -> bool {
        let mut status = self.status.write();
        if self.control.is_cancelled() {
            *status = TaskStatus::Cancelled;
            return false;
        }

        let min_value = field.min_value().unwrap_or(0);
        let max_value = field.max_value().unwrap_or(0);
        let mut data = field.into_vec();

        let mut chunk_data = self.chunk_data.write();
        for descriptor in self.chunks.iter().rev() {
            let tail = data.split_off(descriptor.start);
            data.shrink_to_fit();
            chunk_data.insert(descriptor.index, Some(tail));
        }
        drop(chunk_data);

        *status = TaskStatus::Completed {
            min_value,
            max_value,
        };
        true
    }

    /// 请求取消计算；任务已结束时返回其最终状态
    pub fn request_cancel(&self) -> Result<(), TaskStatus> {
        let status = self.status.write();
        if status.is_finished() {
            return Err((*status).clone());
        }
        self.control.cancel();
        Ok(())
    }

    /// 获取并移除指定 chunk 的数据（用于请求后释放内存）
    /// 返回 None 如果：
    /// - chunk 不存在
    /// - chunk 正在计算中（还未就绪）
    /// - chunk 已被请求
    pub fn take_chunk(&self, chunk_index: usize) -> Option<Vec<u32>> {
        let mut chunk_data = self.chunk_data.write();
        match chunk_data.get(&chunk_index) {
            Some(Some(_)) => chunk_data.remove(&chunk_index).flatten(),
            _ => None,
        }
    }

    /// 检查指定 chunk 是否已就绪
    pub fn is_chunk_ready(&self, chunk_index: usize) -> bool {
        self.chunk_data
            .read()
            .get(&chunk_index)
            .map(|opt| opt.is_some())
            .unwrap_or(false)
    }

    /// 获取剩余（尚未被请求）的 chunk 数量
    pub fn remaining_chunk_count(&self) -> usize {
        self.chunk_data.read().len()
    }

    /// 已完成的外层切片占比，范围 [0, 1]
    pub fn progress(&self) -> f64 {
        let total = self.params.resolution.max(1);
        self.control.completed_slabs() as f64 / total as f64
    }
}

pub struct TaskStore {
    tasks: RwLock<HashMap<String, Arc<TaskData>>>,
    /// TTL（Time-To-Live）过期时间
    default_ttl: Duration,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(crate::config::DEFAULT_TASK_TTL_SECS))
    }

    /// 创建带自定义 TTL 的 TaskStore
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            default_ttl: ttl,
        }
    }

    pub fn insert(&self, data: TaskData) -> (String, Arc<TaskData>) {
        let task_id = Uuid::new_v4().to_string();
        let task = Arc::new(data);
        self.tasks.write().insert(task_id.clone(), task.clone());
        (task_id, task)
    }

    pub fn get(&self, task_id: &str) -> Option<Arc<TaskData>> {
        self.tasks.read().get(task_id).cloned()
    }

    /// 清理过期的任务，过期但仍在运行的任务会被要求取消
    /// 返回清理的任务数量
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut tasks = self.tasks.write();
        let before_count = tasks.len();

        tasks.retain(|task_id, task| {
            let alive = now.duration_since(task.created_at) < self.default_ttl;
            if !alive && task.request_cancel().is_ok() {
                info!("[清理任务] 任务 {} 已过期，请求取消计算", task_id);
            }
            alive
        });

        before_count - tasks.len()
    }

    /// 获取当前任务数量
    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }

    /// 获取默认 TTL
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
