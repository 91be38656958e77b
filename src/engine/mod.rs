// ==========================================
// 快件生命周期引擎 - 引擎层
// ==========================================
// 职责: 实现生命周期业务规则
// 红线: 纯函数引擎(状态图/计费重量/SLA/策略)无状态无 I/O;
//       只有 Coordinator 触达仓储
// ==========================================

pub mod coordinator;
pub mod error;
pub mod sla;
pub mod status_graph;
pub mod task_policy;
pub mod weight;

// 重导出核心引擎
pub use coordinator::ShipmentLifecycleCoordinator;
pub use error::{LifecycleError, LifecycleResult};
pub use sla::{SlaClock, SlaSnapshot};
pub use status_graph::StatusGraph;
pub use task_policy::{PolicyContext, TaskPolicyConfig, TaskPolicyEngine};
pub use weight::{WeightCalculator, CM_PER_INCH, KG_PER_POUND, VOLUMETRIC_DIVISOR};
