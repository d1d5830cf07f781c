use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// 默认网格分辨率（每个轴上的采样点数）
pub const DEFAULT_RESOLUTION: usize = 16;
/// 默认幂次
pub const DEFAULT_POWER: f64 = 8.0;
/// 默认最大迭代次数
pub const DEFAULT_MAX_ITERATIONS: u32 = 15;
/// 默认逃逸半径
pub const DEFAULT_BAILOUT_RADIUS: f64 = 2.0;
/// 三个轴共用的默认空间范围
pub const DEFAULT_BOUNDS: AxisBounds = AxisBounds::new(-1.5, 1.5);

/// 单个坐标轴的空间范围 [min, max]
///
/// JSON 中以二元数组表示，例如 `[-1.5, 1.5]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

impl AxisBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// 检查范围是否有限且 min < max
    pub fn validate(&self, name: &'static str) -> Result<(), FieldError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(FieldError::invalid(
                name,
                format!("范围必须是有限值，得到 [{}, {}]", self.min, self.max),
            ));
        }
        if self.min >= self.max {
            return Err(FieldError::invalid(
                name,
                format!("要求 min < max，得到 [{}, {}]", self.min, self.max),
            ));
        }
        Ok(())
    }

    /// 在 [min, max] 上生成 n 个等距采样点（包含两个端点）
    ///
    /// n == 1 时只返回 min；n > 1 时最后一个点精确等于 max
    pub fn linspace(&self, n: usize) -> Vec<f64> {
        match n {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => {
                let step = self.spacing(n);
                let mut coords: Vec<f64> = (0..n).map(|i| self.min + i as f64 * step).collect();
                coords[n - 1] = self.max;
                coords
            }
        }
    }

    /// 相邻采样点的间距；单点网格返回 1.0 以避免除零
    pub fn spacing(&self, n: usize) -> f64 {
        if n > 1 {
            (self.max - self.min) / (n - 1) as f64
        } else {
            1.0
        }
    }
}

impl Default for AxisBounds {
    fn default() -> Self {
        DEFAULT_BOUNDS
    }
}

impl From<[f64; 2]> for AxisBounds {
    fn from(pair: [f64; 2]) -> Self {
        AxisBounds::new(pair[0], pair[1])
    }
}

impl From<AxisBounds> for [f64; 2] {
    fn from(bounds: AxisBounds) -> Self {
        [bounds.min, bounds.max]
    }
}

/// 一次标量场计算所需的全部参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// 每个轴上的采样点数，三个轴相同
    pub resolution: usize,
    pub power: f64,
    pub max_iterations: u32,
    pub bailout_radius: f64,
    pub x_bounds: AxisBounds,
    pub y_bounds: AxisBounds,
    pub z_bounds: AxisBounds,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            power: DEFAULT_POWER,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            bailout_radius: DEFAULT_BAILOUT_RADIUS,
            x_bounds: DEFAULT_BOUNDS,
            y_bounds: DEFAULT_BOUNDS,
            z_bounds: DEFAULT_BOUNDS,
        }
    }
}

impl GridParams {
    /// 使用默认范围和迭代参数，只指定分辨率
    pub fn with_resolution(resolution: usize) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if self.resolution == 0 {
            return Err(FieldError::invalid("resolution", "分辨率必须 >= 1"));
        }
        if !self.power.is_finite() || self.power <= 0.0 {
            return Err(FieldError::invalid(
                "power",
                format!("幂次必须为正数，得到 {}", self.power),
            ));
        }
        if self.max_iterations == 0 {
            return Err(FieldError::invalid("max_iterations", "最大迭代次数必须 >= 1"));
        }
        if !self.bailout_radius.is_finite() || self.bailout_radius <= 0.0 {
            return Err(FieldError::invalid(
                "bailout_radius",
                format!("逃逸半径必须为正数，得到 {}", self.bailout_radius),
            ));
        }
        self.x_bounds.validate("x_bounds")?;
        self.y_bounds.validate("y_bounds")?;
        self.z_bounds.validate("z_bounds")?;
        Ok(())
    }

    /// 体素总数 resolution³
    pub fn voxel_count(&self) -> Result<usize, FieldError> {
        self.resolution
            .checked_mul(self.resolution)
            .and_then(|n| n.checked_mul(self.resolution))
            .ok_or(FieldError::TooManyVoxels {
                resolution: self.resolution,
            })
    }

    pub fn bailout_radius_sq(&self) -> f64 {
        self.bailout_radius * self.bailout_radius
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.resolution; 3]
    }

    pub fn bounds(&self) -> [AxisBounds; 3] {
        [self.x_bounds, self.y_bounds, self.z_bounds]
    }
}
