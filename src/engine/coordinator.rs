// ==========================================
// 快件生命周期引擎 - 生命周期协调器
// ==========================================
// 职责: 编排一次状态流转请求的完整校验与原子提交
// 红线: 状态与历史同事务提交;CAS 不匹配报并发冲突,不内部重试
// 红线: 同一运单的流转串行化由 CAS 保证,不同运单互不相干
// ==========================================
// 流程: 加载 -> 终态检查 -> 状态图校验 -> 任务策略校验
//       -> 计费重量重算 -> CAS 原子提交 -> 返回最新运单
// ==========================================

use crate::config::PolicyConfigReader;
use crate::domain::shipment::{Shipment, TransitionPayload};
use crate::domain::types::ShipmentStatus;
use crate::engine::error::{LifecycleError, LifecycleResult};
use crate::engine::status_graph::StatusGraph;
use crate::engine::task_policy::{PolicyContext, TaskPolicyEngine};
use crate::engine::weight::WeightCalculator;
use crate::repository::{ShipmentRepository, StatusHistoryDraft, TransitionCommit};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ShipmentLifecycleCoordinator - 生命周期协调器
// ==========================================
pub struct ShipmentLifecycleCoordinator<C>
where
    C: PolicyConfigReader,
{
    config: Arc<C>,
    shipment_repo: Arc<ShipmentRepository>,
    graph: StatusGraph,
}

impl<C> ShipmentLifecycleCoordinator<C>
where
    C: PolicyConfigReader,
{
    /// 创建协调器实例
    ///
    /// # 说明
    /// - 状态图在此构建并做一致性自检,边表被改错时快速失败
    pub fn new(
        config: Arc<C>,
        shipment_repo: Arc<ShipmentRepository>,
    ) -> LifecycleResult<Self> {
        Ok(Self {
            config,
            shipment_repo,
            graph: StatusGraph::new()?,
        })
    }

    /// 查询某状态允许的后继状态(展示层透传)
    pub fn list_allowed_next_statuses(&self, status: ShipmentStatus) -> Vec<ShipmentStatus> {
        self.graph.allowed_next(status).to_vec()
    }

    /// 请求一次状态流转
    ///
    /// # 参数
    /// - shipment_id: 运单 ID
    /// - target: 目标状态
    /// - payload: 流转载荷(策略字段/尺寸补录/历史信息)
    ///
    /// # 返回
    /// - Ok(Shipment): 提交后的最新运单
    /// - Err: NotFound / ImmutableTerminalState / InvalidTransition
    ///        / ValidationFailed / ConcurrentModification
    #[instrument(skip(self, payload), fields(shipment_id = %shipment_id, target = %target))]
    pub async fn request_transition(
        &self,
        shipment_id: &str,
        target: ShipmentStatus,
        payload: TransitionPayload,
    ) -> LifecycleResult<Shipment> {
        // === 步骤 1: 加载运单,缺失或软删除一律 NotFound ===
        let shipment = self
            .shipment_repo
            .find_by_id(shipment_id)?
            .filter(|s| !s.is_deleted())
            .ok_or_else(|| LifecycleError::NotFound(shipment_id.to_string()))?;
        let current = shipment.current_status;

        // === 步骤 2: 终态不可变更 ===
        if current.is_terminal() {
            warn!(current = %current, "拒绝终态运单的流转请求");
            return Err(LifecycleError::ImmutableTerminalState {
                shipment_id: shipment_id.to_string(),
                status: current,
            });
        }

        // === 步骤 3: 状态图校验 ===
        self.graph.validate(current, target)?;
        debug!(from = %current, to = %target, "状态图校验通过");

        // === 步骤 4: 任务策略校验 ===
        // 非任务完成且非送达后结项的上下文必填集为空,校验直接通过
        let policy_config = self
            .config
            .get_task_policy_config()
            .await
            .map_err(|e| LifecycleError::ConfigError(e.to_string()))?;
        let policy = TaskPolicyEngine::new(policy_config);
        let ctx = PolicyContext::transition(current, target, payload.completes_task);
        policy.validate(shipment.service_type, &ctx, &payload)?;

        // === 步骤 5: 尺寸补录触发计费重量重算 ===
        let chargeable_weight_kg = payload
            .dimensions
            .as_ref()
            .map(WeightCalculator::chargeable_weight_kg);
        if let Some(weight) = chargeable_weight_kg {
            debug!(chargeable_weight_kg = weight, "尺寸更新,重算计费重量");
        }

        // === 步骤 6: CAS 原子提交(状态 + 历史,同一事务) ===
        let now = Utc::now();
        let commit = TransitionCommit {
            expected_status: current,
            new_status: target,
            updated_at: now,
            dimensions: payload.dimensions.clone(),
            chargeable_weight_kg,
            picked_up_at: (target == ShipmentStatus::Pickup).then_some(now),
            delivered_at: (target == ShipmentStatus::Delivered).then_some(now),
            completed_at: target.is_terminal().then_some(now),
            history: StatusHistoryDraft {
                history_id: Uuid::new_v4().to_string(),
                status: target,
                recorded_at: now,
                location: payload.location.clone(),
                notes: payload.notes.clone(),
                metadata: payload.metadata.clone(),
                recorded_by: payload.recorded_by.clone(),
            },
        };

        let seq = match self.shipment_repo.commit_transition(shipment_id, &commit) {
            Ok(seq) => seq,
            Err(crate::repository::RepositoryError::StatusCasConflict { .. }) => {
                warn!(from = %current, to = %target, "状态 CAS 冲突,提示调用方重读重试");
                return Err(LifecycleError::ConcurrentModification {
                    shipment_id: shipment_id.to_string(),
                    expected: current,
                });
            }
            Err(e) => return Err(e.into()),
        };

        info!(from = %current, to = %target, seq, "状态流转已提交");

        // === 步骤 7: 返回提交后的最新运单 ===
        self.shipment_repo
            .find_by_id(shipment_id)?
            .ok_or_else(|| LifecycleError::NotFound(shipment_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task_policy::TaskPolicyConfig;
    use async_trait::async_trait;
    use std::error::Error;

    // ==========================================
    // Mock ConfigReader
    // ==========================================
    struct MockConfigReader {
        require_customer_reference: bool,
    }

    #[async_trait]
    impl PolicyConfigReader for MockConfigReader {
        async fn get_require_customer_reference(&self) -> Result<bool, Box<dyn Error>> {
            Ok(self.require_customer_reference)
        }

        async fn get_default_warning_threshold_minutes(&self) -> Result<i64, Box<dyn Error>> {
            Ok(60)
        }

        async fn get_sla_refresh_interval_secs(&self) -> Result<i64, Box<dyn Error>> {
            Ok(60)
        }
    }

    #[tokio::test]
    async fn test_mock_config_builds_policy_config() {
        let reader = MockConfigReader {
            require_customer_reference: true,
        };
        let cfg: TaskPolicyConfig = reader.get_task_policy_config().await.unwrap();
        assert!(cfg.require_customer_reference);
    }
}
