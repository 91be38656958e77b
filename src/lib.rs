// ==========================================
// 国际快件运单生命周期引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 运单状态流转与时效监控核心
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    DimensionUnit, PolicyField, PriorityLevel, ServiceType, ShipmentStatus, TaskKind, TaskStatus,
    WeightUnit,
};

// 领域实体
pub use domain::{
    Address, Dimensions, NewShipment, NewSlaInput, Shipment, SlaRecord, StatusHistoryEntry,
    StatusMetadata, Task, TransitionPayload,
};

// 引擎
pub use engine::{
    LifecycleError, LifecycleResult, ShipmentLifecycleCoordinator, SlaClock, SlaSnapshot,
    StatusGraph, TaskPolicyConfig, TaskPolicyEngine, WeightCalculator,
};

// 配置
pub use config::{ConfigManager, PolicyConfigReader};

// API
pub use api::{MonitorApi, ShipmentApi, TaskApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "国际快件运单生命周期引擎";

// 数据库版本
pub const DB_VERSION: &str = "v1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
