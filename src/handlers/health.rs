use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;
use crate::params::GridParams;

/// 根路径健康检查/服务说明
#[get("/")]
pub async fn hello(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Mandelbulb 逃逸时间标量场服务",
        "endpoints": [
            "POST /field",
            "GET /field/status?task_id=<id>",
            "GET /field/chunk?task_id=<id>&chunk_index=<n>&encoding=raw|gzip",
            "DELETE /field?task_id=<id>",
            "GET /performance?task_id=<id>",
        ],
        "defaults": GridParams::default(),
        "max_resolution": data.config.max_resolution,
        "default_chunk_size": data.config.default_chunk_size,
        "active_tasks": data.task_store.task_count(),
    }))
}
