// ==========================================
// 快件生命周期引擎 - API 层错误类型
// ==========================================
// 职责: 将引擎/仓储错误转换为对外的业务错误
// 红线: 错误信息必须包含显式原因,缺失字段列表原样携带
// ==========================================

use crate::domain::types::{PolicyField, ShipmentStatus};
use crate::engine::error::LifecycleError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 业务规则错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("终态不可变更: shipment_id={shipment_id}, status={status}")]
    ImmutableTerminalState {
        shipment_id: String,
        status: ShipmentStatus,
    },

    #[error("无效的状态流转: from={from} to={to}")]
    InvalidStateTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    #[error("任务校验失败: 缺少必填字段 {missing:?}")]
    ValidationFailed { missing: Vec<PolicyField> },

    // ===== 并发控制错误 =====
    #[error("并发修改冲突,请重读后重试: {0}")]
    ConcurrentModification(String),

    // ===== 数据访问错误 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 LifecycleError 转换
// ==========================================
impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound(id) => ApiError::NotFound(id),
            LifecycleError::ImmutableTerminalState { shipment_id, status } => {
                ApiError::ImmutableTerminalState { shipment_id, status }
            }
            LifecycleError::InvalidTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            LifecycleError::ValidationFailed { missing } => {
                ApiError::ValidationFailed { missing }
            }
            LifecycleError::ConcurrentModification { shipment_id, .. } => {
                ApiError::ConcurrentModification(shipment_id)
            }
            LifecycleError::InconsistentGraph(msg) | LifecycleError::ConfigError(msg) => {
                ApiError::InternalError(msg)
            }
            LifecycleError::Repository(e) => e.into(),
            LifecycleError::Other(e) => ApiError::Other(e),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} with id={}", entity, id))
            }
            RepositoryError::StatusCasConflict { shipment_id, .. } => {
                ApiError::ConcurrentModification(shipment_id)
            }
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::InvalidInput(msg),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
