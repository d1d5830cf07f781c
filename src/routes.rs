use actix_web::web;

use crate::handlers;

/// 统一注册 HTTP 路由，方便集中管理
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::hello)
        .service(handlers::create_field)
        .service(handlers::cancel_field)
        .service(handlers::get_field_status)
        .service(handlers::get_field_chunk)
        .service(handlers::get_performance);
}
