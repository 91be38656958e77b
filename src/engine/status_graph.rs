// ==========================================
// 快件生命周期引擎 - 状态流转图
// ==========================================
// 职责: 运单合法状态与流转边的静态表,校验提议的流转
// 红线: 终态(INVOICED/CANCELLED)无出边,流转不可逆
// 红线: 构建时做一致性自检,表被改错时快速失败
// ==========================================
// 边表:
//   QUOTED     -> BOOKED, CANCELLED
//   BOOKED     -> PICKUP, CANCELLED
//   PICKUP     -> IN_TRANSIT, CANCELLED
//   IN_TRANSIT -> DELIVERED, CUSTOMS, CANCELLED
//   CUSTOMS    -> IN_TRANSIT, DELIVERED, CANCELLED  (查验滞留,可折返)
//   DELIVERED  -> DOCUMENT, INVOICED
//   DOCUMENT   -> INVOICED
//   INVOICED   -> (终态)
//   CANCELLED  -> (终态)
// ==========================================

use crate::domain::types::ShipmentStatus;
use crate::engine::error::{LifecycleError, LifecycleResult};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// ==========================================
// StatusGraph - 状态流转邻接表
// ==========================================
#[derive(Debug, Clone)]
pub struct StatusGraph {
    edges: BTreeMap<&'static str, Vec<ShipmentStatus>>,
}

impl StatusGraph {
    /// 构建状态图并执行一致性自检
    ///
    /// # 自检项
    /// - 每个状态都在邻接表中有条目(无孤儿状态)
    /// - 每个非终态至少有一条出边
    /// - 终态没有出边
    /// - 所有状态自 QUOTED 可达
    ///
    /// # 返回
    /// - Err(InconsistentGraph): 边表被改动出不一致时快速失败
    pub fn new() -> LifecycleResult<Self> {
        let mut edges: BTreeMap<&'static str, Vec<ShipmentStatus>> = BTreeMap::new();

        edges.insert(
            ShipmentStatus::Quoted.to_db_str(),
            vec![ShipmentStatus::Booked, ShipmentStatus::Cancelled],
        );
        edges.insert(
            ShipmentStatus::Booked.to_db_str(),
            vec![ShipmentStatus::Pickup, ShipmentStatus::Cancelled],
        );
        edges.insert(
            ShipmentStatus::Pickup.to_db_str(),
            vec![ShipmentStatus::InTransit, ShipmentStatus::Cancelled],
        );
        edges.insert(
            ShipmentStatus::InTransit.to_db_str(),
            vec![
                ShipmentStatus::Delivered,
                ShipmentStatus::Customs,
                ShipmentStatus::Cancelled,
            ],
        );
        edges.insert(
            ShipmentStatus::Customs.to_db_str(),
            vec![
                ShipmentStatus::InTransit,
                ShipmentStatus::Delivered,
                ShipmentStatus::Cancelled,
            ],
        );
        edges.insert(
            ShipmentStatus::Delivered.to_db_str(),
            vec![ShipmentStatus::Document, ShipmentStatus::Invoiced],
        );
        edges.insert(
            ShipmentStatus::Document.to_db_str(),
            vec![ShipmentStatus::Invoiced],
        );
        edges.insert(ShipmentStatus::Invoiced.to_db_str(), vec![]);
        edges.insert(ShipmentStatus::Cancelled.to_db_str(), vec![]);

        let graph = Self { edges };
        graph.verify_consistency()?;
        Ok(graph)
    }

    /// 查询某状态允许的后继状态
    pub fn allowed_next(&self, status: ShipmentStatus) -> &[ShipmentStatus] {
        self.edges
            .get(status.to_db_str())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 校验提议的流转是否在边表内
    pub fn validate(
        &self,
        from: ShipmentStatus,
        to: ShipmentStatus,
    ) -> LifecycleResult<()> {
        if self.allowed_next(from).contains(&to) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition { from, to })
        }
    }

    /// 状态图一致性自检
    fn verify_consistency(&self) -> LifecycleResult<()> {
        // 1. 无孤儿状态: 每个枚举值都有邻接表条目
        for status in ShipmentStatus::ALL {
            if !self.edges.contains_key(status.to_db_str()) {
                return Err(LifecycleError::InconsistentGraph(format!(
                    "状态 {} 缺少邻接表条目",
                    status
                )));
            }
        }

        // 2. 非终态必须有出边,终态不得有出边
        for status in ShipmentStatus::ALL {
            let out = self.allowed_next(status);
            if status.is_terminal() && !out.is_empty() {
                return Err(LifecycleError::InconsistentGraph(format!(
                    "终态 {} 存在出边",
                    status
                )));
            }
            if !status.is_terminal() && out.is_empty() {
                return Err(LifecycleError::InconsistentGraph(format!(
                    "非终态 {} 没有出边",
                    status
                )));
            }
        }

        // 3. 自 QUOTED 全量可达(BFS)
        let mut visited: BTreeSet<&'static str> = BTreeSet::new();
        let mut queue = VecDeque::from([ShipmentStatus::Quoted]);
        visited.insert(ShipmentStatus::Quoted.to_db_str());
        while let Some(current) = queue.pop_front() {
            for next in self.allowed_next(current) {
                if visited.insert(next.to_db_str()) {
                    queue.push_back(*next);
                }
            }
        }
        for status in ShipmentStatus::ALL {
            if !visited.contains(status.to_db_str()) {
                return Err(LifecycleError::InconsistentGraph(format!(
                    "状态 {} 自 QUOTED 不可达",
                    status
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_builds_and_passes_self_check() {
        assert!(StatusGraph::new().is_ok());
    }

    #[test]
    fn test_allowed_next_matches_edge_table() {
        let graph = StatusGraph::new().unwrap();
        assert_eq!(
            graph.allowed_next(ShipmentStatus::Quoted),
            &[ShipmentStatus::Booked, ShipmentStatus::Cancelled]
        );
        assert_eq!(
            graph.allowed_next(ShipmentStatus::Customs),
            &[
                ShipmentStatus::InTransit,
                ShipmentStatus::Delivered,
                ShipmentStatus::Cancelled
            ]
        );
        assert!(graph.allowed_next(ShipmentStatus::Invoiced).is_empty());
        assert!(graph.allowed_next(ShipmentStatus::Cancelled).is_empty());
    }

    #[test]
    fn test_validate_legal_transitions() {
        let graph = StatusGraph::new().unwrap();
        assert!(graph
            .validate(ShipmentStatus::Quoted, ShipmentStatus::Booked)
            .is_ok());
        assert!(graph
            .validate(ShipmentStatus::InTransit, ShipmentStatus::Customs)
            .is_ok());
        // 查验滞留后折返运输
        assert!(graph
            .validate(ShipmentStatus::Customs, ShipmentStatus::InTransit)
            .is_ok());
        assert!(graph
            .validate(ShipmentStatus::Delivered, ShipmentStatus::Invoiced)
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_every_absent_pair() {
        // 不在边表内的 (from, to) 组合一律 InvalidTransition
        let graph = StatusGraph::new().unwrap();
        for from in ShipmentStatus::ALL {
            for to in ShipmentStatus::ALL {
                let legal = graph.allowed_next(from).contains(&to);
                let result = graph.validate(from, to);
                if legal {
                    assert!(result.is_ok(), "{from} -> {to} 应当合法");
                } else {
                    assert!(
                        matches!(
                            result,
                            Err(LifecycleError::InvalidTransition { from: f, to: t })
                                if f == from && t == to
                        ),
                        "{from} -> {to} 应当被拒绝"
                    );
                }
            }
        }
    }

    #[test]
    fn test_invoiced_to_booked_always_rejected() {
        let graph = StatusGraph::new().unwrap();
        assert!(matches!(
            graph.validate(ShipmentStatus::Invoiced, ShipmentStatus::Booked),
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_self_check_rejects_broken_edge_tables() {
        let good = StatusGraph::new().unwrap();

        // 缺条目: 删除 DOCUMENT
        let mut broken = good.clone();
        broken.edges.remove(ShipmentStatus::Document.to_db_str());
        assert!(matches!(
            broken.verify_consistency(),
            Err(LifecycleError::InconsistentGraph(_))
        ));

        // 终态长出边
        let mut broken = good.clone();
        broken
            .edges
            .insert(ShipmentStatus::Invoiced.to_db_str(), vec![ShipmentStatus::Booked]);
        assert!(matches!(
            broken.verify_consistency(),
            Err(LifecycleError::InconsistentGraph(_))
        ));

        // 非终态出边清空 → 既是死路也破坏可达性
        let mut broken = good.clone();
        broken
            .edges
            .insert(ShipmentStatus::Delivered.to_db_str(), vec![]);
        assert!(matches!(
            broken.verify_consistency(),
            Err(LifecycleError::InconsistentGraph(_))
        ));
    }

    #[test]
    fn test_terminal_states_have_no_outgoing_edges() {
        // 终态性质: 任何以终态为起点的流转都不可达
        let graph = StatusGraph::new().unwrap();
        for from in [ShipmentStatus::Invoiced, ShipmentStatus::Cancelled] {
            for to in ShipmentStatus::ALL {
                assert!(graph.validate(from, to).is_err());
            }
        }
    }
}
