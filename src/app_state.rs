use std::sync::Arc;

use crate::config::ServerConfig;
use crate::performance::PerformanceStore;
use crate::task::TaskStore;

/// 全局应用状态，负责在各个 handler 之间共享任务存储与配置
pub struct AppState {
    pub config: ServerConfig,
    pub task_store: Arc<TaskStore>,
    pub performance_store: Arc<PerformanceStore>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let task_store = Arc::new(TaskStore::with_ttl(config.task_ttl));
        let performance_store = Arc::new(PerformanceStore::with_ttl(config.task_ttl));
        Self {
            config,
            task_store,
            performance_store,
        }
    }
}
