// ==========================================
// 快件生命周期引擎 - 任务 API
// ==========================================
// 职责: 运单任务的创建与完成
// 红线: 任务完成前必须通过策略引擎校验,缺失字段原样返回
// 说明: required_fields 在创建时按策略快照,due_at 取运单 SLA 时限
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::PolicyConfigReader;
use crate::domain::shipment::TransitionPayload;
use crate::domain::task::Task;
use crate::domain::types::{PriorityLevel, TaskKind, TaskStatus};
use crate::engine::task_policy::{PolicyContext, TaskPolicyEngine};
use crate::repository::{ShipmentRepository, TaskRepository};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// NewTask - 创建任务入参
// ==========================================
#[derive(Debug, Clone)]
pub struct NewTask {
    pub shipment_id: String,
    pub kind: TaskKind,
    pub title: String,
    pub priority: PriorityLevel,
}

// ==========================================
// TaskApi - 任务业务接口
// ==========================================
pub struct TaskApi<C>
where
    C: PolicyConfigReader,
{
    config: Arc<C>,
    task_repo: Arc<TaskRepository>,
    shipment_repo: Arc<ShipmentRepository>,
}

impl<C> TaskApi<C>
where
    C: PolicyConfigReader,
{
    /// 创建任务 API 实例
    pub fn new(
        config: Arc<C>,
        task_repo: Arc<TaskRepository>,
        shipment_repo: Arc<ShipmentRepository>,
    ) -> Self {
        Self {
            config,
            task_repo,
            shipment_repo,
        }
    }

    /// 创建任务
    ///
    /// # 派生规则
    /// - required_fields: 按 (服务类型, 运单当前状态) 从策略引擎快照
    /// - due_at: 取运单 SLA 时限
    #[instrument(skip(self, input), fields(shipment_id = %input.shipment_id))]
    pub async fn create_task(&self, input: NewTask) -> ApiResult<Task> {
        let shipment = self
            .shipment_repo
            .find_by_id(&input.shipment_id)?
            .filter(|s| !s.is_deleted())
            .ok_or_else(|| ApiError::NotFound(input.shipment_id.clone()))?;

        let policy_config = self
            .config
            .get_task_policy_config()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let policy = TaskPolicyEngine::new(policy_config);
        let ctx = PolicyContext::task_at(shipment.current_status);
        let required_fields = policy.required_fields(shipment.service_type, &ctx);

        let now = Utc::now();
        let task = Task {
            task_id: Uuid::new_v4().to_string(),
            shipment_id: shipment.shipment_id.clone(),
            kind: input.kind,
            title: input.title,
            status: TaskStatus::Pending,
            priority: input.priority,
            required_fields,
            due_at: shipment.sla.deadline,
            created_at: now,
            updated_at: now,
            completed_at: None,
            completed_by: None,
        };

        self.task_repo.insert(&task)?;
        info!(task_id = %task.task_id, "任务已创建");
        Ok(task)
    }

    /// 完成任务
    ///
    /// # 校验
    /// - 终态任务不可再完成
    /// - 载荷必须覆盖任务当下的策略必填字段,缺失集原样返回
    #[instrument(skip(self, payload))]
    pub async fn complete_task(
        &self,
        task_id: &str,
        payload: TransitionPayload,
    ) -> ApiResult<Task> {
        let task = self
            .task_repo
            .find_by_id(task_id)?
            .ok_or_else(|| ApiError::NotFound(task_id.to_string()))?;
        if !task.is_open() {
            return Err(ApiError::InvalidInput(format!(
                "任务已处于终态: status={}",
                task.status
            )));
        }

        let shipment = self
            .shipment_repo
            .find_by_id(&task.shipment_id)?
            .filter(|s| !s.is_deleted())
            .ok_or_else(|| ApiError::NotFound(task.shipment_id.clone()))?;

        // 以运单当前状态为完成上下文做策略校验
        let policy_config = self
            .config
            .get_task_policy_config()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let policy = TaskPolicyEngine::new(policy_config);
        let ctx = PolicyContext::task_at(shipment.current_status);
        policy
            .validate(shipment.service_type, &ctx, &payload)
            .map_err(ApiError::from)?;

        let now = Utc::now();
        let updated = self.task_repo.update_status(
            task_id,
            TaskStatus::Completed,
            now,
            Some(payload.recorded_by.as_str()),
        )?;
        if !updated {
            // 终态保护在 UPDATE 条件里,走到这里说明并发下已被他人完成/取消
            return Err(ApiError::ConcurrentModification(task_id.to_string()));
        }

        info!(task_id = %task_id, "任务已完成");
        self.task_repo
            .find_by_id(task_id)?
            .ok_or_else(|| ApiError::NotFound(task_id.to_string()))
    }

    /// 取消任务
    pub fn cancel_task(&self, task_id: &str) -> ApiResult<()> {
        let updated =
            self.task_repo
                .update_status(task_id, TaskStatus::Cancelled, Utc::now(), None)?;
        if !updated {
            return Err(ApiError::NotFound(task_id.to_string()));
        }
        Ok(())
    }

    /// 查询运单的全部任务
    pub fn list_tasks(&self, shipment_id: &str) -> ApiResult<Vec<Task>> {
        Ok(self.task_repo.list_for_shipment(shipment_id)?)
    }
}
