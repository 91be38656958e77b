// ==========================================
// 快件生命周期引擎 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// 红线: 开关不落全局单例,引擎经 trait 显式读取
// ==========================================

pub mod config_manager;
pub mod policy_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use policy_config_trait::PolicyConfigReader;
