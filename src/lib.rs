//! Mandelbulb 逃逸时间标量场
//!
//! 核心部分是单点迭代 ([`iterate`]) 与网格采样 ([`compute_field`])，
//! 其余模块把计算包装成带分块下载的 HTTP 任务服务。

pub mod app_state;
pub mod codec;
pub mod config;
pub mod error;
pub mod handlers;
pub mod iterator;
pub mod params;
pub mod performance;
pub mod routes;
pub mod sampler;
pub mod scalar_field;
pub mod task;

pub use error::FieldError;
pub use iterator::{EscapeKernel, iterate};
pub use params::{AxisBounds, GridParams};
pub use sampler::{SampleControl, compute_field, compute_field_with};
pub use scalar_field::{FieldGeometry, ScalarField};
