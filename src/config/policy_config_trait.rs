// ==========================================
// 快件生命周期引擎 - 策略配置读取接口
// ==========================================
// 职责: 引擎层读取配置的抽象,便于用 Mock 做单元测试
// 红线: 引擎不直接读库,经由本 trait
// ==========================================

use crate::engine::task_policy::TaskPolicyConfig;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// Trait: PolicyConfigReader
// ==========================================
#[async_trait]
pub trait PolicyConfigReader: Send + Sync {
    /// 任务完成是否强制客户参考号(config_kv: require_customer_reference)
    async fn get_require_customer_reference(&self) -> Result<bool, Box<dyn Error>>;

    /// 默认 SLA 预警提前量,分钟(config_kv: default_warning_threshold_minutes)
    async fn get_default_warning_threshold_minutes(&self) -> Result<i64, Box<dyn Error>>;

    /// 展示层 SLA 轮询建议间隔,秒(config_kv: sla_refresh_interval_secs)
    ///
    /// 说明: 仅供展示层参考的调用方策略,核心不跑定时器
    async fn get_sla_refresh_interval_secs(&self) -> Result<i64, Box<dyn Error>>;

    /// 组装 TaskPolicyEngine 的显式配置结构体
    async fn get_task_policy_config(&self) -> Result<TaskPolicyConfig, Box<dyn Error>> {
        Ok(TaskPolicyConfig {
            require_customer_reference: self.get_require_customer_reference().await?,
        })
    }
}
