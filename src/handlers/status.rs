use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;

use crate::app_state::AppState;
use crate::handlers::field::TaskQuery;
use crate::task::TaskStatus;

#[derive(Serialize)]
pub struct StatusResponse {
    pub task_id: String,
    #[serde(flatten)]
    pub status: TaskStatus,
    /// 已完成的外层切片占比
    pub progress: f64,
    pub shape: [usize; 3],
    pub remaining_chunks: usize,
}

/// 查询计算任务的状态与进度
#[get("/field/status")]
pub async fn get_field_status(
    data: web::Data<AppState>,
    query: web::Query<TaskQuery>,
) -> impl Responder {
    let Some(task) = data.task_store.get(&query.task_id) else {
        return HttpResponse::NotFound().json(serde_json::json!({
            "error": "无效的 task_id",
            "task_id": query.task_id,
        }));
    };

    HttpResponse::Ok().json(StatusResponse {
        task_id: query.task_id.clone(),
        status: task.status(),
        progress: task.progress(),
        shape: task.params.shape(),
        remaining_chunks: task.remaining_chunk_count(),
    })
}
