// ==========================================
// 仓储层集成测试
// ==========================================
// 职责: 验证实体与 SQLite 行之间的映射、历史查询与任务存取
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod repository_integration_test {
    use chrono::{Duration, Utc};
    use courier_lifecycle::domain::types::{
        PolicyField, PriorityLevel, ServiceType, ShipmentStatus, TaskKind, TaskStatus,
    };
    use courier_lifecycle::domain::{StatusMetadata, Task};
    use courier_lifecycle::repository::{StatusHistoryDraft, TransitionCommit};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    use crate::test_helpers::{payload_by, sample_new_shipment, setup_test_env};

    // ==========================================
    // 运单映射往返
    // ==========================================

    #[tokio::test]
    async fn test_shipment_row_mapping() {
        let env = setup_test_env();
        let input = sample_new_shipment("REPO-001", ServiceType::Nfo);
        let deadline = input.sla.deadline;
        let created = env.shipment_api.create_shipment(input).await.unwrap();

        let loaded = env
            .shipment_repo
            .find_by_id(&created.shipment_id)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.shipment_no, "REPO-001");
        assert_eq!(loaded.service_type, ServiceType::Nfo);
        assert_eq!(loaded.current_status, ShipmentStatus::Quoted);
        assert_eq!(loaded.priority, PriorityLevel::Normal);
        assert_eq!(loaded.origin.city, "上海");
        assert_eq!(loaded.destination.country, "DE");
        assert_eq!(loaded.sla.deadline, deadline);
        assert_eq!(loaded.sla.warning_threshold_minutes, 60);
        assert_eq!(loaded.employee_id.as_deref(), Some("OPS001"));
        assert_eq!(loaded.chargeable_weight_kg, Some(12.0));
        let dims = loaded.dimensions.unwrap();
        assert_eq!(dims.length, 60.0);
        assert_eq!(dims.weight, 5.0);
        assert!(loaded.deleted_at.is_none());

        // 业务运单号查询走同一映射
        let by_no = env
            .shipment_repo
            .find_by_shipment_no("REPO-001")
            .unwrap()
            .unwrap();
        assert_eq!(by_no.shipment_id, created.shipment_id);
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let env = setup_test_env();
        assert!(env.shipment_repo.find_by_id("no-such-id").unwrap().is_none());
        assert!(env
            .shipment_repo
            .find_by_shipment_no("NO-SUCH-NO")
            .unwrap()
            .is_none());
    }

    // ==========================================
    // 历史: 追加顺序与元数据
    // ==========================================

    #[tokio::test]
    async fn test_history_metadata_round_trip() {
        let env = setup_test_env();
        let shipment = env
            .shipment_api
            .create_shipment(sample_new_shipment("REPO-002", ServiceType::Obc)).await
            .unwrap();
        let id = shipment.shipment_id.clone();

        let now = Utc::now();
        let commit = TransitionCommit {
            expected_status: ShipmentStatus::Quoted,
            new_status: ShipmentStatus::Booked,
            updated_at: now,
            dimensions: None,
            chargeable_weight_kg: None,
            picked_up_at: None,
            delivered_at: None,
            completed_at: None,
            history: StatusHistoryDraft {
                history_id: Uuid::new_v4().to_string(),
                status: ShipmentStatus::Booked,
                recorded_at: now,
                location: Some("PVG".to_string()),
                notes: Some("已订 LH729".to_string()),
                metadata: Some(StatusMetadata {
                    flight_number: Some("LH729".to_string()),
                    estimated_arrival: Some(now + Duration::hours(12)),
                    delay_reason: None,
                    pod_received: None,
                    signature: None,
                }),
                recorded_by: "ops".to_string(),
            },
        };
        let seq = env.shipment_repo.commit_transition(&id, &commit).unwrap();
        assert_eq!(seq, 2);

        let latest = env
            .history_repo
            .latest_for_shipment(&id)
            .unwrap()
            .unwrap();
        assert_eq!(latest.seq, 2);
        assert_eq!(latest.status, ShipmentStatus::Booked);
        assert_eq!(latest.location.as_deref(), Some("PVG"));
        let meta = latest.metadata.unwrap();
        assert_eq!(meta.flight_number.as_deref(), Some("LH729"));
        assert!(meta.estimated_arrival.is_some());

        assert_eq!(env.history_repo.count_for_shipment(&id).unwrap(), 2);
        let all = env.history_repo.list_for_shipment(&id).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].seq < all[1].seq);
    }

    #[tokio::test]
    async fn test_history_empty_for_unknown_shipment() {
        let env = setup_test_env();
        assert!(env.history_repo.list_for_shipment("ghost").unwrap().is_empty());
        assert!(env.history_repo.latest_for_shipment("ghost").unwrap().is_none());
        assert_eq!(env.history_repo.count_for_shipment("ghost").unwrap(), 0);
    }

    // ==========================================
    // SLA 活跃清单
    // ==========================================

    #[tokio::test]
    async fn test_list_sla_active_filters_closed_and_deleted() {
        let env = setup_test_env();

        let open = env
            .shipment_api
            .create_shipment(sample_new_shipment("REPO-OPEN", ServiceType::Obc)).await
            .unwrap();
        let cancelled = env
            .shipment_api
            .create_shipment(sample_new_shipment("REPO-CANC", ServiceType::Obc)).await
            .unwrap();
        let deleted = env
            .shipment_api
            .create_shipment(sample_new_shipment("REPO-DEL", ServiceType::Obc)).await
            .unwrap();

        env.shipment_api
            .request_transition(
                &cancelled.shipment_id,
                ShipmentStatus::Cancelled,
                payload_by("ops"),
            )
            .await
            .unwrap();
        env.shipment_api.delete_shipment(&deleted.shipment_id).unwrap();

        let active = env.shipment_repo.list_sla_active().unwrap();
        let ids: Vec<&str> = active.iter().map(|s| s.shipment_id.as_str()).collect();
        assert!(ids.contains(&open.shipment_id.as_str()));
        assert!(!ids.contains(&cancelled.shipment_id.as_str()));
        assert!(!ids.contains(&deleted.shipment_id.as_str()));
    }

    // ==========================================
    // 任务存取
    // ==========================================

    #[tokio::test]
    async fn test_task_round_trip_and_terminal_protection() {
        let env = setup_test_env();
        let shipment = env
            .shipment_api
            .create_shipment(sample_new_shipment("REPO-TASK", ServiceType::Nfo)).await
            .unwrap();

        let now = Utc::now();
        let mut required = BTreeSet::new();
        required.insert(PolicyField::Hawb);
        required.insert(PolicyField::Mawb);
        let task = Task {
            task_id: Uuid::new_v4().to_string(),
            shipment_id: shipment.shipment_id.clone(),
            kind: TaskKind::Manual,
            title: "补录单号".to_string(),
            status: TaskStatus::Pending,
            priority: PriorityLevel::High,
            required_fields: required.clone(),
            due_at: Some(now + Duration::hours(4)),
            created_at: now,
            updated_at: now,
            completed_at: None,
            completed_by: None,
        };
        env.task_repo.insert(&task).unwrap();

        let loaded = env.task_repo.find_by_id(&task.task_id).unwrap().unwrap();
        assert_eq!(loaded.title, "补录单号");
        assert_eq!(loaded.status, TaskStatus::Pending);
        assert_eq!(loaded.priority, PriorityLevel::High);
        assert_eq!(loaded.required_fields, required);
        assert!(loaded.due_at.is_some());

        // 完成
        let updated = env
            .task_repo
            .update_status(&task.task_id, TaskStatus::Completed, Utc::now(), Some("ops"))
            .unwrap();
        assert!(updated);
        let loaded = env.task_repo.find_by_id(&task.task_id).unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Completed);
        assert_eq!(loaded.completed_by.as_deref(), Some("ops"));
        assert!(loaded.completed_at.is_some());

        // 终态任务拒绝再变更
        let updated = env
            .task_repo
            .update_status(&task.task_id, TaskStatus::Cancelled, Utc::now(), None)
            .unwrap();
        assert!(!updated);

        let listed = env.task_repo.list_for_shipment(&shipment.shipment_id).unwrap();
        assert_eq!(listed.len(), 1);
    }
}
