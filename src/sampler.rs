//! 标量场采样
//!
//! 按外层轴 (i) 切片并行计算，每个切片写入输出张量中互不重叠的 ny * nz 区间。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::error::FieldError;
use crate::iterator::EscapeKernel;
use crate::params::GridParams;
use crate::scalar_field::ScalarField;

/// 采样过程的外部控制：取消标记与进度计数
///
/// 进度只是参考信息，不属于计算结果的一部分
#[derive(Debug, Default)]
pub struct SampleControl {
    cancelled: AtomicBool,
    completed_slabs: AtomicUsize,
}

impl SampleControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消；正在运行的采样会在下一个切片边界停止
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// 已完成的外层切片数量
    pub fn completed_slabs(&self) -> usize {
        self.completed_slabs.load(Ordering::Relaxed)
    }
}

/// 计算整个标量场
pub fn compute_field(params: &GridParams) -> Result<ScalarField, FieldError> {
    compute_field_with(params, &SampleControl::new())
}

/// 计算整个标量场，并在切片之间检查取消标记
///
/// 被取消时返回 [`FieldError::Cancelled`]，不会返回部分结果
pub fn compute_field_with(
    params: &GridParams,
    control: &SampleControl,
) -> Result<ScalarField, FieldError> {
    params.validate()?;
    let voxels = params.voxel_count()?;
    let n = params.resolution;

    info!(
        "初始化 {}x{}x{} 标量场 (power={}, max_iterations={}, bailout={})",
        n, n, n, params.power, params.max_iterations, params.bailout_radius
    );

    let mut data: Vec<u32> = Vec::new();
    data.try_reserve_exact(voxels)
        .map_err(|_| FieldError::Allocation { voxels })?;
    data.resize(voxels, 0);

    // 每个轴的坐标只计算一次，在另外两个轴上复用
    let xs = params.x_bounds.linspace(n);
    let ys = params.y_bounds.linspace(n);
    let zs = params.z_bounds.linspace(n);
    let kernel = EscapeKernel::from(params);

    let start = Instant::now();
    data.par_chunks_mut(n * n)
        .zip(xs.par_iter())
        .for_each(|(slab, &cx)| {
            if control.is_cancelled() {
                return;
            }
            for (j, &cy) in ys.iter().enumerate() {
                let row = &mut slab[j * n..(j + 1) * n];
                for (cell, &cz) in row.iter_mut().zip(zs.iter()) {
                    *cell = kernel.escape_time([cx, cy, cz]);
                }
            }
            let done = control.completed_slabs.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("X 切片进度 {}/{}", done, n);
        });

    if control.is_cancelled() {
        info!("标量场计算已取消，完成 {}/{} 个切片", control.completed_slabs(), n);
        return Err(FieldError::Cancelled);
    }

    let field = ScalarField::new(params.shape(), data, params.bounds())
        .map_err(|e| FieldError::invalid("resolution", e))?;

    info!(
        "标量场计算完成: shape {:?}, 最小逃逸值 {:?}, 最大逃逸值 {:?}, 耗时 {:.2}ms",
        field.shape(),
        field.min_value(),
        field.max_value(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(field)
}
