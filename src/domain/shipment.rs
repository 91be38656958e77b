// ==========================================
// 快件生命周期引擎 - 运单领域模型
// ==========================================
// 红线: current_status 只允许 Coordinator 写入
// 红线: 状态历史为仅追加审计轨迹,写入后不可变更
// ==========================================

use crate::domain::types::{
    DimensionUnit, PriorityLevel, ServiceType, ShipmentStatus, WeightUnit,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Dimensions - 包裹尺寸
// ==========================================
// 用途: 计费重量计算输入(WeightCalculator)
// 前置条件: 各数值均为有限非负数(由上游校验保证)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,             // 长
    pub width: f64,              // 宽
    pub height: f64,             // 高
    pub dim_unit: DimensionUnit, // 尺寸单位(CM/IN)
    pub weight: f64,             // 实际重量
    pub weight_unit: WeightUnit, // 重量单位(KG/LB)
}

// ==========================================
// SlaRecord - 运单时限约定
// ==========================================
// deadline 为空表示未约定 SLA(SLAClock 返回 NoDeadline 哨兵)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaRecord {
    pub deadline: Option<DateTime<Utc>>,    // 约定送达/完结时限
    pub warning_threshold_minutes: i64,     // 预警提前量(分钟)
}

// ==========================================
// Address - 起讫地址
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,                 // 城市
    pub country: String,              // 国家(ISO 两位码)
    pub detail: Option<String>,       // 详细地址
    pub contact_name: Option<String>, // 联系人
}

// ==========================================
// Shipment - 运单主数据
// ==========================================
// 红线: 软删除后(deleted_at 非空)不再接受任何状态流转,历史保持可读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    // ===== 主键与业务号 =====
    pub shipment_id: String, // 运单唯一标识(UUID)
    pub shipment_no: String, // 业务运单号(唯一)

    // ===== 服务与状态 =====
    pub service_type: ServiceType,      // OBC/NFO
    pub current_status: ShipmentStatus, // 当前状态(只经 Coordinator 变更)
    pub priority: PriorityLevel,        // 优先级

    // ===== 尺寸与计费重量 =====
    pub dimensions: Option<Dimensions>,     // 包裹尺寸(可后补)
    pub chargeable_weight_kg: Option<f64>,  // 计费重量(派生: max(实重, 体积重))

    // ===== 起讫地址 =====
    pub origin: Address,      // 起运地
    pub destination: Address, // 目的地

    // ===== SLA =====
    pub sla: SlaRecord, // 时限约定

    // ===== 指派引用(不透明 ID,不在本模块展开) =====
    pub courier_id: Option<String>,  // 快递员/携带人
    pub employee_id: Option<String>, // 操作员
    pub partner_id: Option<String>,  // 合作代理

    // ===== 时间信息 =====
    pub created_at: DateTime<Utc>,             // 创建时间
    pub picked_up_at: Option<DateTime<Utc>>,   // 取件时间
    pub delivered_at: Option<DateTime<Utc>>,   // 送达时间
    pub completed_at: Option<DateTime<Utc>>,   // 完结时间
    pub updated_at: DateTime<Utc>,             // 最后更新时间

    // ===== 软删除墓碑 =====
    pub deleted_at: Option<DateTime<Utc>>, // 非空即不再接受流转
}

impl Shipment {
    /// 是否已软删除
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// 是否仍在 SLA 监控范围内(未删除且未到达终态)
    pub fn is_sla_active(&self) -> bool {
        !self.is_deleted() && !self.current_status.is_terminal()
    }
}

// ==========================================
// StatusMetadata - 状态历史附加信息
// ==========================================
// 用途: 随状态流转记录的运输侧元数据(全部可选)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMetadata {
    pub flight_number: Option<String>,              // 航班号
    pub estimated_arrival: Option<DateTime<Utc>>,   // 预计到达
    pub delay_reason: Option<String>,               // 延误原因
    pub pod_received: Option<bool>,                 // 签收凭证已收
    pub signature: Option<String>,                  // 签收人
}

impl StatusMetadata {
    /// 是否完全为空(为空则不落 JSON 列)
    pub fn is_empty(&self) -> bool {
        self.flight_number.is_none()
            && self.estimated_arrival.is_none()
            && self.delay_reason.is_none()
            && self.pod_received.is_none()
            && self.signature.is_none()
    }
}

// ==========================================
// StatusHistoryEntry - 状态历史条目
// ==========================================
// 红线: 与状态变更同事务写入,每次流转恰好一条
// 红线: seq 反映提交顺序(非请求到达顺序),写入后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub history_id: String,            // 条目 ID(UUID)
    pub shipment_id: String,           // 关联运单
    pub status: ShipmentStatus,        // 流转后状态
    pub seq: i64,                      // 运单内提交序号(单调递增)
    pub recorded_at: DateTime<Utc>,    // 记录时间
    pub location: Option<String>,      // 当前位置
    pub notes: Option<String>,         // 备注
    pub metadata: Option<StatusMetadata>, // 运输元数据
    pub recorded_by: String,           // 操作人/系统标识
}

// ==========================================
// TransitionPayload - 状态流转请求载荷
// ==========================================
// 用途: Coordinator::request_transition 的输入
// 说明: 策略必填字段(customerReference/hawb/mawb/确认标志)与
//       运输元数据并存;completes_task 标记本次流转伴随任务完成
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPayload {
    // ===== 策略校验字段 =====
    pub customer_reference: Option<String>,     // 客户参考号
    pub hawb: Option<String>,                   // 分单号(NFO)
    pub mawb: Option<String>,                   // 主单号(NFO)
    pub customs_costs_confirmed: Option<bool>,  // 关务费用确认(OBC)
    pub excess_baggage_confirmed: Option<bool>, // 逾重行李费确认(OBC)

    // ===== 任务完成标记 =====
    pub completes_task: bool, // 本次流转是否伴随任务完成

    // ===== 尺寸补录(触发计费重量重算) =====
    pub dimensions: Option<Dimensions>,

    // ===== 历史条目信息 =====
    pub location: Option<String>,         // 当前位置
    pub notes: Option<String>,            // 备注
    pub metadata: Option<StatusMetadata>, // 运输元数据
    pub recorded_by: String,              // 操作人/系统标识
}

// ==========================================
// NewSlaInput - 创建运单的时限入参
// ==========================================
// warning_threshold_minutes 省略时落为配置 default_warning_threshold_minutes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSlaInput {
    pub deadline: Option<DateTime<Utc>>,          // 约定送达/完结时限
    pub warning_threshold_minutes: Option<i64>,   // 预警提前量(分钟),可省略
}

// ==========================================
// NewShipment - 创建运单入参
// ==========================================
// 用途: ShipmentApi::create_shipment 的输入,入库时落为 Quoted 状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShipment {
    pub shipment_no: String,
    pub service_type: ServiceType,
    pub priority: PriorityLevel,
    pub dimensions: Option<Dimensions>,
    pub origin: Address,
    pub destination: Address,
    pub sla: NewSlaInput,
    pub courier_id: Option<String>,
    pub employee_id: Option<String>,
    pub partner_id: Option<String>,
    pub created_by: String,
}
