use serde::Serialize;

use crate::params::AxisBounds;

/// 体素网格到世界坐标的映射：原点 + 各轴间距
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldGeometry {
    /// (xmin, ymin, zmin)
    pub origin: [f64; 3],
    /// 分辨率为 1 时间距取 1.0
    pub spacing: [f64; 3],
}

impl FieldGeometry {
    pub fn new(shape: [usize; 3], bounds: [AxisBounds; 3]) -> Self {
        Self {
            origin: [bounds[0].min, bounds[1].min, bounds[2].min],
            spacing: [
                bounds[0].spacing(shape[0]),
                bounds[1].spacing(shape[1]),
                bounds[2].spacing(shape[2]),
            ],
        }
    }
}

/// 逃逸时间标量场
/// 表示三维规则网格上每个采样点的逃逸迭代次数
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    /// 网格维度 [nx, ny, nz]
    shape: [usize; 3],
    /// 按行主序存储 (k 变化最快，j 其次，i 最慢)
    /// 索引计算: index = (i * ny + j) * nz + k
    data: Vec<u32>,
    /// 生成该场时使用的空间范围
    bounds: [AxisBounds; 3],
}

impl ScalarField {
    /// 创建新的标量场，数据长度必须与 shape 一致
    pub fn new(shape: [usize; 3], data: Vec<u32>, bounds: [AxisBounds; 3]) -> Result<Self, String> {
        let Some(total_elements) = shape[0]
            .checked_mul(shape[1])
            .and_then(|n| n.checked_mul(shape[2]))
        else {
            return Err(format!("shape {:?} 的元素数量超出 usize 范围", shape));
        };

        if data.len() != total_elements {
            return Err(format!(
                "数据量不匹配: shape {:?} 需要 {} 个元素，但提供了 {} 个",
                shape,
                total_elements,
                data.len()
            ));
        }

        Ok(ScalarField {
            shape,
            data,
            bounds,
        })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn bounds(&self) -> [AxisBounds; 3] {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 获取整个数据切片（行主序）
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.data
    }

    fn index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        let [nx, ny, nz] = self.shape;
        (i < nx && j < ny && k < nz).then(|| (i * ny + j) * nz + k)
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<u32> {
        self.index(i, j, k).map(|idx| self.data[idx])
    }

    pub fn min_value(&self) -> Option<u32> {
        self.data.iter().copied().min()
    }

    pub fn max_value(&self) -> Option<u32> {
        self.data.iter().copied().max()
    }

    pub fn geometry(&self) -> FieldGeometry {
        FieldGeometry::new(self.shape, self.bounds)
    }

    /// 体素 (i, j, k) 对应的采样坐标，与采样时使用的坐标向量一致
    pub fn coordinate(&self, i: usize, j: usize, k: usize) -> Option<[f64; 3]> {
        self.index(i, j, k)?;
        Some([
            axis_coordinate(&self.bounds[0], self.shape[0], i),
            axis_coordinate(&self.bounds[1], self.shape[1], j),
            axis_coordinate(&self.bounds[2], self.shape[2], k),
        ])
    }

    /// 转换为 x 变化最快的列主序数据，供按该顺序读取点数据的可视化端使用
    pub fn to_x_fastest(&self) -> Vec<u32> {
        let [nx, ny, nz] = self.shape;
        let mut out = Vec::with_capacity(self.data.len());
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    out.push(self.data[(i * ny + j) * nz + k]);
                }
            }
        }
        out
    }
}

fn axis_coordinate(bounds: &AxisBounds, n: usize, index: usize) -> f64 {
    if n > 1 && index == n - 1 {
        bounds.max
    } else {
        bounds.min + index as f64 * bounds.spacing(n)
    }
}
