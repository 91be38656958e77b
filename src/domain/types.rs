// ==========================================
// 快件生命周期引擎 - 领域类型定义
// ==========================================
// 依据: 运单生命周期状态机定义
// 红线: 状态流转只能经过 Coordinator,不得散落赋值
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 运单状态 (Shipment Status)
// ==========================================
// 状态机节点全集,边集定义见 engine::status_graph
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Quoted,    // 已报价
    Booked,    // 已订舱
    Pickup,    // 已取件
    InTransit, // 运输中
    Customs,   // 海关查验(可回到运输中)
    Delivered, // 已送达
    Document,  // 单证整理
    Invoiced,  // 已开票(终态)
    Cancelled, // 已取消(终态)
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ShipmentStatus {
    /// 全部状态(用于状态图自检遍历)
    pub const ALL: [ShipmentStatus; 9] = [
        ShipmentStatus::Quoted,
        ShipmentStatus::Booked,
        ShipmentStatus::Pickup,
        ShipmentStatus::InTransit,
        ShipmentStatus::Customs,
        ShipmentStatus::Delivered,
        ShipmentStatus::Document,
        ShipmentStatus::Invoiced,
        ShipmentStatus::Cancelled,
    ];

    /// 是否终态(终态无出边,流转不可逆)
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Invoiced | ShipmentStatus::Cancelled)
    }

    /// 业务阶段序号(用于 "取件及之后" 一类的策略判定)
    ///
    /// # 说明
    /// - Cancelled 不在正向业务链路上,返回 None
    pub fn phase_rank(&self) -> Option<u8> {
        match self {
            ShipmentStatus::Quoted => Some(0),
            ShipmentStatus::Booked => Some(1),
            ShipmentStatus::Pickup => Some(2),
            ShipmentStatus::InTransit => Some(3),
            ShipmentStatus::Customs => Some(4),
            ShipmentStatus::Delivered => Some(5),
            ShipmentStatus::Document => Some(6),
            ShipmentStatus::Invoiced => Some(7),
            ShipmentStatus::Cancelled => None,
        }
    }

    /// 是否处于取件及之后的阶段(NFO 分单/主单策略的触发条件)
    pub fn at_or_after_pickup(&self) -> bool {
        matches!(self.phase_rank(), Some(rank) if rank >= 2)
    }

    /// 从字符串解析状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QUOTED" => Some(ShipmentStatus::Quoted),
            "BOOKED" => Some(ShipmentStatus::Booked),
            "PICKUP" => Some(ShipmentStatus::Pickup),
            "IN_TRANSIT" => Some(ShipmentStatus::InTransit),
            "CUSTOMS" => Some(ShipmentStatus::Customs),
            "DELIVERED" => Some(ShipmentStatus::Delivered),
            "DOCUMENT" => Some(ShipmentStatus::Document),
            "INVOICED" => Some(ShipmentStatus::Invoiced),
            "CANCELLED" => Some(ShipmentStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Quoted => "QUOTED",
            ShipmentStatus::Booked => "BOOKED",
            ShipmentStatus::Pickup => "PICKUP",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::Customs => "CUSTOMS",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Document => "DOCUMENT",
            ShipmentStatus::Invoiced => "INVOICED",
            ShipmentStatus::Cancelled => "CANCELLED",
        }
    }
}

// ==========================================
// 服务类型 (Service Type)
// ==========================================
// OBC: On-Board Courier 手提随身快件
// NFO: Next-Flight-Out 航空急件(需主单/分单)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    Obc, // 手提快件
    Nfo, // 航空急件
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ServiceType {
    /// 从字符串解析服务类型
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OBC" => Some(ServiceType::Obc),
            "NFO" => Some(ServiceType::Nfo),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ServiceType::Obc => "OBC",
            ServiceType::Nfo => "NFO",
        }
    }
}

// ==========================================
// 优先级 (Priority Level)
// ==========================================
// 顺序: Normal < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityLevel {
    Normal,   // 常规
    High,     // 加急
    Critical, // 红线加急
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PriorityLevel {
    /// 从字符串解析优先级
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "HIGH" => PriorityLevel::High,
            "CRITICAL" => PriorityLevel::Critical,
            _ => PriorityLevel::Normal, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PriorityLevel::Normal => "NORMAL",
            PriorityLevel::High => "HIGH",
            PriorityLevel::Critical => "CRITICAL",
        }
    }
}

// ==========================================
// 任务状态 (Task Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,    // 待处理
    InProgress, // 处理中
    Completed,  // 已完成(终态)
    Cancelled,  // 已取消(终态)
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl TaskStatus {
    /// 是否终态(完成/取消后不再变更)
    pub fn is_final(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// 从字符串解析任务状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(TaskStatus::Pending),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "COMPLETED" => Some(TaskStatus::Completed),
            "CANCELLED" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }
}

// ==========================================
// 任务类型 (Task Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    Manual,    // 人工任务
    Automatic, // 系统任务
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl TaskKind {
    /// 从字符串解析任务类型
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MANUAL" => Some(TaskKind::Manual),
            "AUTOMATIC" => Some(TaskKind::Automatic),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TaskKind::Manual => "MANUAL",
            TaskKind::Automatic => "AUTOMATIC",
        }
    }
}

// ==========================================
// 策略必填字段 (Policy Field)
// ==========================================
// 用途: TaskPolicyEngine 决策表的字段名全集
// 序列化格式: camelCase (与上游载荷字段名一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyField {
    CustomerReference,      // 客户参考号(可开关)
    Hawb,                   // 分单号 House AWB
    Mawb,                   // 主单号 Master AWB
    CustomsCostsConfirmed,  // 关务费用已确认
    ExcessBaggageConfirmed, // 逾重行李费已确认
}

impl fmt::Display for PolicyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.payload_key())
    }
}

impl PolicyField {
    /// 载荷中的字段名(camelCase,与校验错误返回一致)
    pub fn payload_key(&self) -> &'static str {
        match self {
            PolicyField::CustomerReference => "customerReference",
            PolicyField::Hawb => "hawb",
            PolicyField::Mawb => "mawb",
            PolicyField::CustomsCostsConfirmed => "customsCostsConfirmed",
            PolicyField::ExcessBaggageConfirmed => "excessBaggageConfirmed",
        }
    }

    /// 从载荷字段名解析
    pub fn from_payload_key(s: &str) -> Option<Self> {
        match s {
            "customerReference" => Some(PolicyField::CustomerReference),
            "hawb" => Some(PolicyField::Hawb),
            "mawb" => Some(PolicyField::Mawb),
            "customsCostsConfirmed" => Some(PolicyField::CustomsCostsConfirmed),
            "excessBaggageConfirmed" => Some(PolicyField::ExcessBaggageConfirmed),
            _ => None,
        }
    }
}

// ==========================================
// 尺寸单位 (Dimension Unit)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DimensionUnit {
    Cm, // 厘米
    In, // 英寸
}

impl DimensionUnit {
    /// 从字符串解析尺寸单位
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "IN" | "INCH" => DimensionUnit::In,
            _ => DimensionUnit::Cm, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DimensionUnit::Cm => "CM",
            DimensionUnit::In => "IN",
        }
    }
}

// ==========================================
// 重量单位 (Weight Unit)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeightUnit {
    Kg, // 千克
    Lb, // 磅
}

impl WeightUnit {
    /// 从字符串解析重量单位
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "LB" | "LBS" => WeightUnit::Lb,
            _ => WeightUnit::Kg, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "KG",
            WeightUnit::Lb => "LB",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(ShipmentStatus::Invoiced.is_terminal());
        assert!(ShipmentStatus::Cancelled.is_terminal());
        assert!(!ShipmentStatus::Delivered.is_terminal());
        assert!(!ShipmentStatus::Quoted.is_terminal());
    }

    #[test]
    fn test_phase_rank_ordering() {
        // 正向链路单调递增
        assert!(ShipmentStatus::Quoted.phase_rank() < ShipmentStatus::Pickup.phase_rank());
        assert!(ShipmentStatus::Pickup.phase_rank() < ShipmentStatus::Delivered.phase_rank());
        // Cancelled 不参与阶段比较
        assert_eq!(ShipmentStatus::Cancelled.phase_rank(), None);
    }

    #[test]
    fn test_at_or_after_pickup() {
        assert!(!ShipmentStatus::Quoted.at_or_after_pickup());
        assert!(!ShipmentStatus::Booked.at_or_after_pickup());
        assert!(ShipmentStatus::Pickup.at_or_after_pickup());
        assert!(ShipmentStatus::Customs.at_or_after_pickup());
        assert!(ShipmentStatus::Invoiced.at_or_after_pickup());
        assert!(!ShipmentStatus::Cancelled.at_or_after_pickup());
    }

    #[test]
    fn test_status_db_str_round_trip() {
        for status in ShipmentStatus::ALL {
            assert_eq!(ShipmentStatus::from_db_str(status.to_db_str()), Some(status));
        }
        assert_eq!(ShipmentStatus::from_db_str("UNKNOWN"), None);
    }

    #[test]
    fn test_service_type_parse() {
        assert_eq!(ServiceType::from_db_str("obc"), Some(ServiceType::Obc));
        assert_eq!(ServiceType::from_db_str("NFO"), Some(ServiceType::Nfo));
        assert_eq!(ServiceType::from_db_str("XXX"), None);
    }
}
