// ==========================================
// 快件生命周期引擎 - 计费重量计算
// ==========================================
// 职责: 包裹尺寸 -> 计费重量(千克)的纯函数
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================
// 规则: chargeable = max(实际重量kg, 体积重kg)
//       体积重 = (长cm × 宽cm × 高cm) / 6000
// 前置条件: 输入均为有限非负数(上游校验保证,本模块不抛错)
// ==========================================

use crate::domain::shipment::Dimensions;
use crate::domain::types::{DimensionUnit, WeightUnit};

/// 英寸 -> 厘米换算系数
pub const CM_PER_INCH: f64 = 2.54;

/// 磅 -> 千克换算系数
pub const KG_PER_POUND: f64 = 0.453592;

/// 航空货运标准体积重除数(cm³/kg)
pub const VOLUMETRIC_DIVISOR: f64 = 6000.0;

// ==========================================
// WeightCalculator - 纯函数工具类
// ==========================================
pub struct WeightCalculator;

impl WeightCalculator {
    /// 尺寸归一化到厘米
    pub fn normalize_length_cm(value: f64, unit: DimensionUnit) -> f64 {
        match unit {
            DimensionUnit::Cm => value,
            DimensionUnit::In => value * CM_PER_INCH,
        }
    }

    /// 重量归一化到千克
    pub fn normalize_weight_kg(value: f64, unit: WeightUnit) -> f64 {
        match unit {
            WeightUnit::Kg => value,
            WeightUnit::Lb => value * KG_PER_POUND,
        }
    }

    /// 计算体积重(千克)
    ///
    /// # 规则
    /// - volumetric = (L_cm × W_cm × H_cm) / 6000
    /// - 三边同乘 k 时体积重乘 k³,仅改实重不影响体积重
    pub fn volumetric_weight_kg(dims: &Dimensions) -> f64 {
        let l = Self::normalize_length_cm(dims.length, dims.dim_unit);
        let w = Self::normalize_length_cm(dims.width, dims.dim_unit);
        let h = Self::normalize_length_cm(dims.height, dims.dim_unit);
        (l * w * h) / VOLUMETRIC_DIVISOR
    }

    /// 计算实际重量(千克)
    pub fn actual_weight_kg(dims: &Dimensions) -> f64 {
        Self::normalize_weight_kg(dims.weight, dims.weight_unit)
    }

    /// 计算计费重量(千克)
    ///
    /// # 规则
    /// - chargeable = max(实际重量kg, 体积重kg)
    pub fn chargeable_weight_kg(dims: &Dimensions) -> f64 {
        let actual = Self::actual_weight_kg(dims);
        let volumetric = Self::volumetric_weight_kg(dims);
        actual.max(volumetric)
    }
}
