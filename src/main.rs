use actix_web::{App, HttpServer, web};
use log::{info, warn};

use mandelbulb_backend::app_state::AppState;
use mandelbulb_backend::config::ServerConfig;
use mandelbulb_backend::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();

    // 采样器使用 rayon 全局线程池
    if let Some(threads) = config.worker_threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!("无法设置计算线程数 {}: {}", threads, e);
        }
    }

    let app_state = web::Data::new(AppState::new(config.clone()));

    // 启动后台清理任务：定期清理过期的任务与性能记录
    let task_store = app_state.task_store.clone();
    let performance_store = app_state.performance_store.clone();
    let cleanup_interval = config.cleanup_interval;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let cleaned_count = task_store.cleanup_expired();
            performance_store.cleanup_expired();
            if cleaned_count > 0 {
                info!(
                    "[清理任务] 清理了 {} 个过期任务，当前剩余: {} 个任务",
                    cleaned_count,
                    task_store.task_count()
                );
            }
        }
    });

    info!("服务器启动在 http://{}:{}", config.host, config.port);
    info!("计算线程数: {}", rayon::current_num_threads());
    info!("任务 TTL: {} 分钟", app_state.task_store.default_ttl().as_secs() / 60);
    info!("最大分辨率: {}", config.max_resolution);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(config.bind_addr())?
    .run()
    .await
}
