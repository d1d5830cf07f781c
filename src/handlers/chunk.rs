use std::time::Instant;

use actix_web::{HttpResponse, Responder, get, http::header::ContentType, web};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::codec::{ChunkEncoding, encode_chunk};
use crate::performance::PerformanceRecord;
use crate::task::TaskStatus;

#[derive(Deserialize)]
pub struct ChunkQuery {
    pub task_id: String,
    pub chunk_index: usize,
    #[serde(default)]
    pub encoding: ChunkEncoding,
}

#[get("/field/chunk")]
pub async fn get_field_chunk(
    data: web::Data<AppState>,
    query: web::Query<ChunkQuery>,
) -> impl Responder {
    let Some(task) = data.task_store.get(&query.task_id) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "无效的 task_id",
            "task_id": query.task_id,
        }));
    };

    let Some(descriptor) = task.chunks.get(query.chunk_index) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "无效的 chunk_index",
            "chunk_index": query.chunk_index,
        }));
    };

    // 检查 chunk 是否已就绪（后台计算是否完成）
    if !task.is_chunk_ready(query.chunk_index) {
        let status = task.status();
        return match status {
            TaskStatus::Pending | TaskStatus::Running => {
                HttpResponse::Accepted().json(serde_json::json!({
                    "error": "chunk 正在计算中，请稍后重试",
                    "task_id": query.task_id,
                    "chunk_index": query.chunk_index,
                    "status": "processing",
                    "progress": task.progress(),
                }))
            }
            TaskStatus::Failed { .. } | TaskStatus::Cancelled => {
                HttpResponse::Conflict().json(serde_json::json!({
                    "error": "任务未成功完成，没有可用数据",
                    "task_id": query.task_id,
                    "state": status,
                }))
            }
            TaskStatus::Completed { .. } => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "chunk 已被请求或不存在",
                "task_id": query.task_id,
                "chunk_index": query.chunk_index,
            })),
        };
    }

    // 获取并移除 chunk 数据（请求后立即释放内存）
    let Some(chunk_values) = task.take_chunk(query.chunk_index) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "chunk 已被请求或不存在",
            "task_id": query.task_id,
            "chunk_index": query.chunk_index,
        }));
    };

    // 将 chunk 数据序列化为二进制格式
    let encode_start = Instant::now();
    let bytes = match encode_chunk(&chunk_values, query.encoding) {
        Ok(bytes) => bytes,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "写入 chunk 数据失败",
                "details": e.to_string(),
            }));
        }
    };
    data.performance_store.add_record(
        &query.task_id,
        PerformanceRecord::since(
            "chunk",
            encode_start,
            format!("chunk {} ({} 字节)", descriptor.index, bytes.len()),
        ),
    );

    let mut response = HttpResponse::Ok();
    response
        .content_type(ContentType::octet_stream())
        .append_header(("X-Chunk-Index", descriptor.index.to_string()))
        .append_header(("X-Chunk-Start", descriptor.start.to_string()))
        .append_header(("X-Chunk-End", descriptor.end.to_string()))
        .append_header((
            "X-Chunk-Length",
            (descriptor.end - descriptor.start).to_string(),
        ))
        .append_header(("X-Chunk-Task", query.task_id.clone()));
    if query.encoding == ChunkEncoding::Gzip {
        response.append_header(("Content-Encoding", "gzip"));
    }
    response.body(bytes)
}
