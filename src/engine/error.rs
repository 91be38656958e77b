// ==========================================
// 快件生命周期引擎 - 引擎层错误类型
// ==========================================
// 职责: 定义生命周期流转的错误分类,全部可检视、不吞错
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::{PolicyField, ShipmentStatus};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
///
/// 错误分类与重试约定:
/// - `ConcurrentModification` 提示调用方重读后重试(重试策略由调用方决定)
/// - 其余错误均为确定性失败,内部不做任何重试
#[derive(Error, Debug)]
pub enum LifecycleError {
    // ===== 流转校验错误 =====
    #[error("运单未找到或已删除: shipment_id={0}")]
    NotFound(String),

    #[error("终态不可变更: shipment_id={shipment_id}, status={status}")]
    ImmutableTerminalState {
        shipment_id: String,
        status: ShipmentStatus,
    },

    #[error("非法状态流转: from={from} to={to}")]
    InvalidTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    #[error("任务校验失败: 缺少必填字段 {missing:?}")]
    ValidationFailed { missing: Vec<PolicyField> },

    // ===== 并发控制错误 =====
    #[error("并发修改冲突: shipment_id={shipment_id}, expected_status={expected}")]
    ConcurrentModification {
        shipment_id: String,
        expected: ShipmentStatus,
    },

    // ===== 配置/状态图错误 =====
    #[error("状态图一致性校验失败: {0}")]
    InconsistentGraph(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ===== 下层错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LifecycleError {
    /// 校验失败时携带的缺失字段列表(其余错误返回空)
    pub fn missing_fields(&self) -> &[PolicyField] {
        match self {
            LifecycleError::ValidationFailed { missing } => missing,
            _ => &[],
        }
    }
}

/// Result 类型别名
pub type LifecycleResult<T> = Result<T, LifecycleError>;
