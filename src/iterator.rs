//! Mandelbulb 单点迭代
//!
//! 在球坐标下对点执行 z -> z^n + c，返回逃逸所需的迭代次数。

use crate::params::GridParams;

/// 计算单点的逃逸时间
///
/// - `cx, cy, cz`: 固定点 c，每一步迭代后都会加回
/// - `bailout_radius_sq`: 逃逸半径的平方，避免在判断时开方
///
/// 返回值位于 [0, max_iterations]；到达 max_iterations 表示在给定步数内未逃逸
#[inline]
pub fn iterate(
    cx: f64,
    cy: f64,
    cz: f64,
    power: f64,
    max_iterations: u32,
    bailout_radius_sq: f64,
) -> u32 {
    let (mut zx, mut zy, mut zz) = (cx, cy, cz);

    for i in 0..max_iterations {
        let r_sq = zx * zx + zy * zy + zz * zz;
        if r_sq > bailout_radius_sq {
            return i;
        }

        let r = r_sq.sqrt();
        // zx = zy = 0 时 atan2(0, 0) 直接取标准库的结果
        let theta = (zx * zx + zy * zy).sqrt().atan2(zz);
        let phi = zy.atan2(zx);

        let r_pow = r.powf(power);
        let new_theta = theta * power;
        let new_phi = phi * power;

        let sin_theta = new_theta.sin();
        zx = r_pow * sin_theta * new_phi.cos() + cx;
        zy = r_pow * sin_theta * new_phi.sin() + cy;
        zz = r_pow * new_theta.cos() + cz;
    }

    max_iterations
}

/// 预先固定幂次、迭代上限与逃逸半径的迭代核
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscapeKernel {
    pub power: f64,
    pub max_iterations: u32,
    pub bailout_radius_sq: f64,
}

impl EscapeKernel {
    pub fn new(power: f64, max_iterations: u32, bailout_radius: f64) -> Self {
        Self {
            power,
            max_iterations,
            bailout_radius_sq: bailout_radius * bailout_radius,
        }
    }

    #[inline]
    pub fn escape_time(&self, point: [f64; 3]) -> u32 {
        iterate(
            point[0],
            point[1],
            point[2],
            self.power,
            self.max_iterations,
            self.bailout_radius_sq,
        )
    }
}

impl From<&GridParams> for EscapeKernel {
    fn from(params: &GridParams) -> Self {
        Self {
            power: params.power,
            max_iterations: params.max_iterations,
            bailout_radius_sq: params.bailout_radius_sq(),
        }
    }
}
