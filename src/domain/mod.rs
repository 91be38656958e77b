// ==========================================
// 快件生命周期引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod shipment;
pub mod task;
pub mod types;

// 重导出核心类型
pub use shipment::{
    Address, Dimensions, NewShipment, NewSlaInput, Shipment, SlaRecord, StatusHistoryEntry,
    StatusMetadata, TransitionPayload,
};
pub use task::Task;
pub use types::{
    DimensionUnit, PolicyField, PriorityLevel, ServiceType, ShipmentStatus, TaskKind, TaskStatus,
    WeightUnit,
};
