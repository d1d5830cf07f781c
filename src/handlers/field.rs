use std::time::Instant;

use actix_web::{HttpResponse, Responder, delete, post, web};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::FieldError;
use crate::params::GridParams;
use crate::performance::PerformanceRecord;
use crate::sampler::compute_field_with;
use crate::scalar_field::FieldGeometry;
use crate::task::{ChunkDescriptor, TaskData, TaskStatus, split_chunks};

#[derive(Deserialize)]
pub struct FieldRequest {
    /// 未提供的参数使用默认值
    #[serde(flatten)]
    pub params: GridParams,
    /// 分块大小（体素个数），缺省时使用服务配置
    pub chunk_size: Option<usize>,
}

#[derive(Serialize, Clone)]
pub struct FieldResponse {
    pub task_id: String,
    pub params: GridParams,
    pub shape: [usize; 3],
    pub geometry: FieldGeometry,
    pub data_length: usize,
    pub chunk_size: usize,
    pub chunks: Vec<ChunkDescriptor>,
}

#[derive(Deserialize)]
pub struct TaskQuery {
    pub task_id: String,
}

/// 将核心错误映射为 HTTP 响应
pub fn field_error_response(err: &FieldError) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        FieldError::InvalidParameter { .. } => HttpResponse::BadRequest().json(body),
        FieldError::Allocation { .. } | FieldError::TooManyVoxels { .. } => {
            HttpResponse::PayloadTooLarge().json(body)
        }
        FieldError::Cancelled => HttpResponse::Conflict().json(body),
    }
}

#[post("/field")]
pub async fn create_field(
    data: web::Data<AppState>,
    payload: web::Json<FieldRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    match run_compute(data.get_ref(), request.params, request.chunk_size) {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(err) => err,
    }
}

/// 创建标量场计算任务并在后台执行
///
/// ## 功能概述
/// 1. 校验参数，并检查分辨率是否超过服务上限
/// 2. 根据 chunk_size 计算分块信息
/// 3. 创建任务存储（task_id）
/// 4. 在阻塞线程池上运行采样器，完成后把结果切分成 chunk
///
/// 立即返回，不等待计算完成；前端通过 status/chunk 接口轮询
pub fn run_compute(
    app_state: &AppState,
    params: GridParams,
    chunk_size: Option<usize>,
) -> Result<FieldResponse, HttpResponse> {
    // ==================== 步骤 1: 参数验证 ====================
    let validate_start = Instant::now();
    params.validate().map_err(|e| field_error_response(&e))?;

    if params.resolution > app_state.config.max_resolution {
        return Err(HttpResponse::PayloadTooLarge().json(serde_json::json!({
            "error": "分辨率超过服务上限",
            "resolution": params.resolution,
            "max_resolution": app_state.config.max_resolution,
        })));
    }
    let data_length = params.voxel_count().map_err(|e| field_error_response(&e))?;

    // ==================== 步骤 2: 计算分块信息 ====================
    let chunk_size = chunk_size
        .unwrap_or(app_state.config.default_chunk_size)
        .max(1);
    let chunks = split_chunks(data_length, chunk_size);

    // ==================== 步骤 3: 创建任务存储 ====================
    let (task_id, task) = app_state
        .task_store
        .insert(TaskData::new(params.clone(), chunks.clone()));
    let performance_store = app_state.performance_store.clone();
    performance_store.add_record(
        &task_id,
        PerformanceRecord::since("validate", validate_start, format!("{} 体素", data_length)),
    );

    // ==================== 步骤 4: 启动后台计算 ====================
    let task_id_clone = task_id.clone();
    let params_clone = params.clone();
    actix_web::rt::spawn(async move {
        task.set_status(TaskStatus::Running);
        let compute_start = Instant::now();
        let control = task.control.clone();

        let result = web::block(move || compute_field_with(&params_clone, &control)).await;

        let field = match result {
            Ok(Ok(field)) => field,
            Ok(Err(FieldError::Cancelled)) => {
                info!("[后台计算] 任务 {} 已取消", task_id_clone);
                task.set_status(TaskStatus::Cancelled);
                return;
            }
            Ok(Err(e)) => {
                warn!("[后台计算] 任务 {} 计算失败: {}", task_id_clone, e);
                task.set_status(TaskStatus::Failed {
                    error: e.to_string(),
                });
                return;
            }
            Err(e) => {
                warn!("[后台计算] 任务 {} 计算线程异常: {}", task_id_clone, e);
                task.set_status(TaskStatus::Failed {
                    error: e.to_string(),
                });
                return;
            }
        };
        performance_store.add_record(
            &task_id_clone,
            PerformanceRecord::since("compute", compute_start, format!("{} 体素", field.len())),
        );

        let split_start = Instant::now();
        if !task.store_field(field) {
            info!("[后台计算] 任务 {} 在计算结束后被取消，结果已丢弃", task_id_clone);
            return;
        }
        performance_store.add_record(
            &task_id_clone,
            PerformanceRecord::since("split", split_start, format!("{} 个 chunk", task.chunks.len())),
        );

        info!(
            "[后台计算] 任务 {} 完成，共 {} 个 chunk，耗时 {}ms",
            task_id_clone,
            task.chunks.len(),
            compute_start.elapsed().as_millis()
        );
    });

    // ==================== 步骤 5: 构造并返回响应 ====================
    let shape = params.shape();
    let geometry = FieldGeometry::new(shape, params.bounds());
    Ok(FieldResponse {
        task_id,
        params,
        shape,
        geometry,
        data_length,
        chunk_size,
        chunks,
    })
}

/// 请求取消正在运行的计算任务
#[delete("/field")]
pub async fn cancel_field(
    data: web::Data<AppState>,
    query: web::Query<TaskQuery>,
) -> impl Responder {
    let Some(task) = data.task_store.get(&query.task_id) else {
        return HttpResponse::NotFound().json(serde_json::json!({
            "error": "无效的 task_id",
            "task_id": query.task_id,
        }));
    };

    if let Err(status) = task.request_cancel() {
        return HttpResponse::Conflict().json(serde_json::json!({
            "error": "任务已结束，无法取消",
            "task_id": query.task_id,
            "state": status,
        }));
    }

    HttpResponse::Accepted().json(serde_json::json!({
        "task_id": query.task_id,
        "status": "cancelling",
    }))
}
