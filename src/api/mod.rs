// ==========================================
// 快件生命周期引擎 - API 层
// ==========================================
// 职责: 进程内业务接口,无自带线协议
// 前提: 鉴权在上游完成,审计落盘由外围应用层负责
// ==========================================

pub mod error;
pub mod monitor_api;
pub mod shipment_api;
pub mod task_api;

// 重导出核心接口
pub use error::{ApiError, ApiResult};
pub use monitor_api::{MonitorApi, SlaBoard, SlaBoardRow};
pub use shipment_api::ShipmentApi;
pub use task_api::{NewTask, TaskApi};
