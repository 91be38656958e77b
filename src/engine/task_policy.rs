// ==========================================
// 快件生命周期引擎 - 任务完成策略引擎
// ==========================================
// 职责: (服务类型, 流转上下文) -> 必填字段集 的决策表,
//       并对载荷做缺失字段校验
// 红线: 纯函数、无副作用;validate 返回的缺失集与实际缺失
//       严格相等(不多报、不少报),可独立做性质测试
// 红线: 配置以显式结构体在构造时传入,不读全局单例
// ==========================================
// 决策表:
//   任一任务完成              -> customerReference (可开关)
//   NFO 且上下文 ≥ PICKUP     -> hawb, mawb
//   OBC 且 DELIVERED -> DOCUMENT/INVOICED
//                             -> customsCostsConfirmed=true,
//                                excessBaggageConfirmed=true
// ==========================================

use crate::domain::shipment::TransitionPayload;
use crate::domain::types::{PolicyField, ServiceType, ShipmentStatus};
use crate::engine::error::{LifecycleError, LifecycleResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// TaskPolicyConfig - 策略开关配置
// ==========================================
// 来源: config_kv(见 config::ConfigManager),构造时显式传入
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskPolicyConfig {
    /// 任务完成是否强制填写客户参考号
    pub require_customer_reference: bool,
}

impl Default for TaskPolicyConfig {
    fn default() -> Self {
        Self {
            require_customer_reference: false,
        }
    }
}

// ==========================================
// PolicyContext - 策略判定上下文
// ==========================================
// from/to 描述本次流转;completes_task 标记伴随任务完成。
// 任务创建场景用 task_at 构造(上下文停留在某一状态)。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyContext {
    pub from: ShipmentStatus,
    pub to: ShipmentStatus,
    pub completes_task: bool,
}

impl PolicyContext {
    /// 流转上下文
    pub fn transition(from: ShipmentStatus, to: ShipmentStatus, completes_task: bool) -> Self {
        Self {
            from,
            to,
            completes_task,
        }
    }

    /// 停留在某状态的任务完成上下文(任务派生字段集用)
    pub fn task_at(status: ShipmentStatus) -> Self {
        Self {
            from: status,
            to: status,
            completes_task: true,
        }
    }

    /// 是否命中 OBC 单证/开票确认规则的驱动流转
    /// DELIVERED -> DOCUMENT/INVOICED 本身即视为驱动它的任务完成
    fn is_delivery_closeout(&self) -> bool {
        self.from == ShipmentStatus::Delivered
            && matches!(
                self.to,
                ShipmentStatus::Document | ShipmentStatus::Invoiced
            )
    }
}

// ==========================================
// TaskPolicyEngine - 策略引擎
// ==========================================
pub struct TaskPolicyEngine {
    config: TaskPolicyConfig,
}

impl TaskPolicyEngine {
    /// 创建策略引擎实例
    ///
    /// # 参数
    /// - config: 显式策略配置(不读全局状态)
    pub fn new(config: TaskPolicyConfig) -> Self {
        Self { config }
    }

    /// 查询当前配置
    pub fn config(&self) -> &TaskPolicyConfig {
        &self.config
    }

    /// 派生必填字段集
    ///
    /// # 规则
    /// 1. 任务完成(completes_task 或送达后单证/开票流转)且开关打开
    ///    → customerReference
    /// 2. NFO 且任务完成上下文处于取件及之后 → hawb, mawb
    /// 3. OBC 且流转为 DELIVERED -> DOCUMENT/INVOICED
    ///    → customsCostsConfirmed, excessBaggageConfirmed
    pub fn required_fields(
        &self,
        service_type: ServiceType,
        ctx: &PolicyContext,
    ) -> BTreeSet<PolicyField> {
        let mut fields = BTreeSet::new();

        let completing = ctx.completes_task || ctx.is_delivery_closeout();

        if completing && self.config.require_customer_reference {
            fields.insert(PolicyField::CustomerReference);
        }

        // NFO: 取件及之后的任务完成必须有分单/主单
        if service_type == ServiceType::Nfo && completing && ctx.to.at_or_after_pickup() {
            fields.insert(PolicyField::Hawb);
            fields.insert(PolicyField::Mawb);
        }

        // OBC: 送达后的单证/开票确认
        if service_type == ServiceType::Obc && ctx.is_delivery_closeout() {
            fields.insert(PolicyField::CustomsCostsConfirmed);
            fields.insert(PolicyField::ExcessBaggageConfirmed);
        }

        fields
    }

    /// 校验载荷,返回恰好缺失的字段集
    ///
    /// # 说明
    /// - 字符串字段: 非空才算提供
    /// - 确认标志: 必须为 Some(true),false 或缺省均算缺失
    ///
    /// # 返回
    /// - Err(ValidationFailed{missing}): missing 恰为缺失集,
    ///   与 required_fields 相对,不多报不少报
    pub fn validate(
        &self,
        service_type: ServiceType,
        ctx: &PolicyContext,
        payload: &TransitionPayload,
    ) -> LifecycleResult<()> {
        let required = self.required_fields(service_type, ctx);
        let missing: Vec<PolicyField> = required
            .into_iter()
            .filter(|field| !Self::is_satisfied(*field, payload))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::ValidationFailed { missing })
        }
    }

    /// 单字段满足性判定
    fn is_satisfied(field: PolicyField, payload: &TransitionPayload) -> bool {
        match field {
            PolicyField::CustomerReference => payload
                .customer_reference
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false),
            PolicyField::Hawb => payload
                .hawb
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false),
            PolicyField::Mawb => payload
                .mawb
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false),
            PolicyField::CustomsCostsConfirmed => {
                payload.customs_costs_confirmed == Some(true)
            }
            PolicyField::ExcessBaggageConfirmed => {
                payload.excess_baggage_confirmed == Some(true)
            }
        }
    }
}
