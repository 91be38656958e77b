// ==========================================
// 快件生命周期引擎 - 运单 API
// ==========================================
// 职责: 对外的进程内运单接口(创建/流转/历史/软删除)
// 前提: 调用方已完成鉴权,审计落盘由外围应用层负责
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::PolicyConfigReader;
use crate::domain::shipment::{
    NewShipment, Shipment, SlaRecord, StatusHistoryEntry, TransitionPayload,
};
use crate::domain::types::ShipmentStatus;
use crate::engine::coordinator::ShipmentLifecycleCoordinator;
use crate::engine::weight::WeightCalculator;
use crate::repository::{ShipmentRepository, StatusHistoryDraft, StatusHistoryRepository};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// ShipmentApi - 运单业务接口
// ==========================================
pub struct ShipmentApi<C>
where
    C: PolicyConfigReader,
{
    config: Arc<C>,
    shipment_repo: Arc<ShipmentRepository>,
    history_repo: Arc<StatusHistoryRepository>,
    coordinator: Arc<ShipmentLifecycleCoordinator<C>>,
}

impl<C> ShipmentApi<C>
where
    C: PolicyConfigReader,
{
    /// 创建运单 API 实例
    pub fn new(
        config: Arc<C>,
        shipment_repo: Arc<ShipmentRepository>,
        history_repo: Arc<StatusHistoryRepository>,
        coordinator: Arc<ShipmentLifecycleCoordinator<C>>,
    ) -> Self {
        Self {
            config,
            shipment_repo,
            history_repo,
            coordinator,
        }
    }

    /// 创建运单(初始状态 QUOTED,首条历史同事务落库)
    ///
    /// # 说明
    /// - 预警提前量省略时回退到配置 default_warning_threshold_minutes
    #[instrument(skip(self, input), fields(shipment_no = %input.shipment_no))]
    pub async fn create_shipment(&self, input: NewShipment) -> ApiResult<Shipment> {
        if input.shipment_no.trim().is_empty() {
            return Err(ApiError::InvalidInput("运单号不能为空".to_string()));
        }

        let warning_threshold_minutes = match input.sla.warning_threshold_minutes {
            Some(minutes) => minutes,
            None => self
                .config
                .get_default_warning_threshold_minutes()
                .await
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        };

        let now = Utc::now();
        let shipment_id = Uuid::new_v4().to_string();

        // 创建即计费: 尺寸齐备时落计费重量
        let chargeable_weight_kg = input
            .dimensions
            .as_ref()
            .map(WeightCalculator::chargeable_weight_kg);

        let shipment = Shipment {
            shipment_id: shipment_id.clone(),
            shipment_no: input.shipment_no,
            service_type: input.service_type,
            current_status: ShipmentStatus::Quoted,
            priority: input.priority,
            dimensions: input.dimensions,
            chargeable_weight_kg,
            origin: input.origin,
            destination: input.destination,
            sla: SlaRecord {
                deadline: input.sla.deadline,
                warning_threshold_minutes,
            },
            courier_id: input.courier_id,
            employee_id: input.employee_id,
            partner_id: input.partner_id,
            created_at: now,
            picked_up_at: None,
            delivered_at: None,
            completed_at: None,
            updated_at: now,
            deleted_at: None,
        };

        let history = StatusHistoryDraft {
            history_id: Uuid::new_v4().to_string(),
            status: ShipmentStatus::Quoted,
            recorded_at: now,
            location: None,
            notes: Some("运单创建".to_string()),
            metadata: None,
            recorded_by: input.created_by,
        };

        self.shipment_repo
            .insert_with_initial_history(&shipment, &history)?;

        info!(shipment_id = %shipment_id, "运单已创建");
        Ok(shipment)
    }

    /// 请求状态流转(所有校验与原子提交由 Coordinator 编排)
    pub async fn request_transition(
        &self,
        shipment_id: &str,
        target: ShipmentStatus,
        payload: TransitionPayload,
    ) -> ApiResult<Shipment> {
        let shipment = self
            .coordinator
            .request_transition(shipment_id, target, payload)
            .await?;
        Ok(shipment)
    }

    /// 查询某状态允许的后继状态(展示层透传)
    pub fn list_allowed_next_statuses(&self, status: ShipmentStatus) -> Vec<ShipmentStatus> {
        self.coordinator.list_allowed_next_statuses(status)
    }

    /// 按 ID 查询运单(软删除运单仍可读,由调用方检查墓碑)
    pub fn get_shipment(&self, shipment_id: &str) -> ApiResult<Shipment> {
        self.shipment_repo
            .find_by_id(shipment_id)?
            .ok_or_else(|| ApiError::NotFound(shipment_id.to_string()))
    }

    /// 按业务运单号查询
    pub fn get_shipment_by_no(&self, shipment_no: &str) -> ApiResult<Shipment> {
        self.shipment_repo
            .find_by_shipment_no(shipment_no)?
            .ok_or_else(|| ApiError::NotFound(shipment_no.to_string()))
    }

    /// 查询运单状态历史(按提交序号升序,软删除后仍可读)
    pub fn get_status_history(&self, shipment_id: &str) -> ApiResult<Vec<StatusHistoryEntry>> {
        Ok(self.history_repo.list_for_shipment(shipment_id)?)
    }

    /// 软删除运单(打墓碑;之后的流转请求一律 NotFound)
    #[instrument(skip(self))]
    pub fn delete_shipment(&self, shipment_id: &str) -> ApiResult<()> {
        let deleted = self.shipment_repo.soft_delete(shipment_id, Utc::now())?;
        if !deleted {
            return Err(ApiError::NotFound(shipment_id.to_string()));
        }
        info!(shipment_id = %shipment_id, "运单已软删除");
        Ok(())
    }
}
