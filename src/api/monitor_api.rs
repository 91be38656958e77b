// ==========================================
// 快件生命周期引擎 - SLA 监控 API
// ==========================================
// 职责: 面向展示层的 SLA 看板(批量快照)与单点计算透传
// 说明: 拉取式模型,展示层按建议间隔轮询,核心不跑定时器
// ==========================================

use crate::api::error::ApiResult;
use crate::config::PolicyConfigReader;
use crate::domain::shipment::Shipment;
use crate::domain::types::ShipmentStatus;
use crate::engine::sla::{SlaClock, SlaSnapshot};
use crate::repository::ShipmentRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

// ==========================================
// SlaBoardRow - 看板行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaBoardRow {
    pub shipment_id: String,
    pub shipment_no: String,
    pub current_status: ShipmentStatus,
    pub snapshot: SlaSnapshot,
}

// ==========================================
// SlaBoard - 看板汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaBoard {
    pub computed_at: DateTime<Utc>,
    pub rows: Vec<SlaBoardRow>,
    pub overdue_count: usize,
    pub due_soon_count: usize,
    /// 展示层轮询建议间隔(秒),来自配置,非核心保证
    pub refresh_interval_secs: i64,
}

// ==========================================
// MonitorApi - SLA 监控接口
// ==========================================
pub struct MonitorApi<C>
where
    C: PolicyConfigReader,
{
    config: Arc<C>,
    shipment_repo: Arc<ShipmentRepository>,
}

impl<C> MonitorApi<C>
where
    C: PolicyConfigReader,
{
    /// 创建监控 API 实例
    pub fn new(config: Arc<C>, shipment_repo: Arc<ShipmentRepository>) -> Self {
        Self {
            config,
            shipment_repo,
        }
    }

    /// 单运单 SLA 快照(纯计算透传)
    ///
    /// # 说明
    /// - 完结判定(终态/软删除)由此处代调用方求出后传给 SlaClock
    pub fn compute_sla(&self, shipment: &Shipment, now: DateTime<Utc>) -> SlaSnapshot {
        SlaClock::compute(
            shipment.sla.deadline,
            shipment.sla.warning_threshold_minutes,
            now,
            !shipment.is_sla_active(),
        )
    }

    /// 生成 SLA 看板: 对监控范围内(未删除且非终态)的运单批量计算
    ///
    /// # 参数
    /// - now: 调用方时钟(轮询方每次带新值)
    #[instrument(skip(self))]
    pub async fn list_sla_board(&self, now: DateTime<Utc>) -> ApiResult<SlaBoard> {
        let shipments = self.shipment_repo.list_sla_active()?;

        let mut rows = Vec::with_capacity(shipments.len());
        let mut overdue_count = 0;
        let mut due_soon_count = 0;

        for shipment in &shipments {
            let snapshot = self.compute_sla(shipment, now);
            if snapshot.is_overdue() {
                overdue_count += 1;
            }
            if snapshot.is_due_soon() {
                due_soon_count += 1;
            }
            rows.push(SlaBoardRow {
                shipment_id: shipment.shipment_id.clone(),
                shipment_no: shipment.shipment_no.clone(),
                current_status: shipment.current_status,
                snapshot,
            });
        }

        let refresh_interval_secs = self
            .config
            .get_sla_refresh_interval_secs()
            .await
            .unwrap_or(60);

        debug!(
            total = rows.len(),
            overdue = overdue_count,
            due_soon = due_soon_count,
            "SLA 看板已计算"
        );

        Ok(SlaBoard {
            computed_at: now,
            rows,
            overdue_count,
            due_soon_count,
            refresh_interval_secs,
        })
    }
}
