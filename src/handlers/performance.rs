use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;
use crate::handlers::field::TaskQuery;

/// 获取指定任务的性能数据
#[get("/performance")]
pub async fn get_performance(
    data: web::Data<AppState>,
    query: web::Query<TaskQuery>,
) -> impl Responder {
    let records = data.performance_store.get_records(&query.task_id);
    log::debug!(
        "[性能数据查询] task_id: {}, 记录数: {}",
        query.task_id,
        records.as_ref().map(|r| r.len()).unwrap_or(0)
    );

    // 即使没有记录，也返回空数组，而不是 404 错误
    HttpResponse::Ok().json(serde_json::json!({
        "task_id": query.task_id,
        "records": records.unwrap_or_default(),
    }))
}
