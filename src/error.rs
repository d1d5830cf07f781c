use thiserror::Error;

/// 标量场计算过程中可能出现的错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// 参数校验失败，在分配内存之前就会返回
    #[error("无效参数 {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// 内存分配失败
    #[error("无法为 {voxels} 个体素分配内存")]
    Allocation { voxels: usize },

    /// resolution³ 超出 usize 范围
    #[error("分辨率 {resolution} 的体素数量 (resolution³) 超出可寻址范围")]
    TooManyVoxels { resolution: usize },

    /// 调用方在计算过程中请求了取消
    #[error("计算已取消")]
    Cancelled,
}

impl FieldError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        FieldError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
