//! Property-based tests for the core invariants:
//! - tenant isolation holds for arbitrary tenant pairs
//! - the score formula and priority bands hold for all ratings
//! - the parser terminates on arbitrary bytes with all fields in range
//! - repeated identical triggers never yield more than one open event

use chrono::Utc;
use proptest::prelude::*;
use std::sync::Arc;

use riskmap::ai::parser;
use riskmap::core::{
    Criticality, Priority, RecordId, RiskId, RiskStatus, RiskType, SourceKind, SourceRecord,
    TenantId,
};
use riskmap::events::{EventTriggerEngine, NullSink, Trigger};
use riskmap::repo::{InMemoryRepo, Repo, RiskFilter};
use riskmap::scoring;
use riskmap::Risk;

/// Tenant ids drawn from a small alphabet so collisions are easy to
/// generate on purpose.
fn tenant_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}"
}

fn rating() -> impl Strategy<Value = u8> {
    1u8..=5
}

fn risk_for(tenant: &str, sequence: u32, l: u8, i: u8, e: u8) -> Risk {
    let score = scoring::score(l, i, e);
    Risk {
        id: RiskId::from_sequence(sequence),
        tenant: TenantId::from(tenant),
        title: "generated".to_string(),
        description: "generated".to_string(),
        likelihood: l,
        impact: i,
        exposure: e,
        score,
        priority: scoring::priority_for_score(score),
        status: RiskStatus::Open,
        risk_type: RiskType::Current,
        ai_explanation: "generated".to_string(),
        suggested_mitigations: vec!["m".to_string()],
        entity: "vendor_management".to_string(),
        data: "temp_vendor".to_string(),
        row: "v1".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

proptest! {
    /// Risks created under one tenant are never visible under another.
    #[test]
    fn prop_tenant_isolation_for_risks(
        t1 in tenant_id(),
        t2 in tenant_id(),
        count in 1usize..5,
        (l, i, e) in (rating(), rating(), rating()),
    ) {
        prop_assume!(t1 != t2);
        let repo = InMemoryRepo::new();
        for n in 0..count {
            repo.insert_risk(
                &TenantId::from(t1.as_str()),
                risk_for(&t1, 1000 + n as u32, l, i, e),
            ).unwrap();
        }

        let own = repo.count_risks(&TenantId::from(t1.as_str()), &RiskFilter::default()).unwrap();
        let foreign = repo.count_risks(&TenantId::from(t2.as_str()), &RiskFilter::default()).unwrap();
        prop_assert_eq!(own, count);
        prop_assert_eq!(foreign, 0);
    }

    /// Score and priority derivation are consistent for every rating
    /// combination and survive persistence.
    #[test]
    fn prop_score_invariant((l, i, e) in (rating(), rating(), rating())) {
        let score = scoring::score(l, i, e);
        let raw = l as f64 * i as f64 * e as f64 * 1.33;
        prop_assert_eq!(score as u32, (raw.round() as u32).min(100));

        let priority = scoring::priority_for_score(score);
        let expected = if score >= 80 {
            Priority::Critical
        } else if score >= 60 {
            Priority::High
        } else if score >= 40 {
            Priority::Medium
        } else {
            Priority::Low
        };
        prop_assert_eq!(priority, expected);

        let repo = InMemoryRepo::new();
        let stored = repo
            .insert_risk(&TenantId::from("t1"), risk_for("t1", 1000, l, i, e))
            .unwrap();
        prop_assert_eq!(stored.score, score);
    }

    /// The parser terminates on arbitrary bytes and every produced risk
    /// stays within the documented ranges.
    #[test]
    fn prop_parser_is_total_and_in_range(bytes in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let risks = parser::parse_bytes(&bytes);
        for risk in &risks {
            prop_assert!((1..=5).contains(&risk.likelihood));
            prop_assert!((1..=5).contains(&risk.impact));
            prop_assert!((1..=5).contains(&risk.exposure));
            prop_assert!(!risk.title.is_empty());
            prop_assert!(risk.title.chars().count() <= 255);
            prop_assert!(!risk.description.is_empty());
            prop_assert!((1..=5).contains(&risk.mitigations.len()));
        }
    }

    /// Structured-but-hostile output parses without panicking too.
    #[test]
    fn prop_parser_handles_many_headers(count in 0usize..40) {
        let mut output = String::from("preamble\n");
        for n in 0..count {
            output.push_str(&format!("RISK {}:\nTITLE: risk {}\n", n + 1, n + 1));
        }
        let risks = parser::parse(&output);
        prop_assert_eq!(risks.len(), count);
    }

    /// Any number of identical triggers on an unchanged record leaves
    /// at most one open event of the family.
    #[test]
    fn prop_trigger_dedup(repeats in 1usize..8) {
        let repo = Arc::new(InMemoryRepo::new());
        let engine = EventTriggerEngine::new(repo.clone(), Arc::new(NullSink));
        let record = SourceRecord {
            id: RecordId::from("r1"),
            tenant: TenantId::from("t1"),
            kind: SourceKind::Risk,
            title: "repeated".to_string(),
            description: "repeated".to_string(),
            criticality: Criticality::High,
            status: "Approved".to_string(),
            due_date: None,
            mitigation_status: None,
            framework: None,
            owner: None,
            reviewer: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        repo.seed_source(record.clone());

        let today = Utc::now().date_naive();
        let mut created = 0;
        for _ in 0..repeats {
            if engine
                .trigger_now(&record, Trigger::MitigationOverdue, today)
                .unwrap()
                .is_some()
            {
                created += 1;
            }
        }
        prop_assert_eq!(created, 1);

        let open = repo
            .list_events_by_kinds(&TenantId::from("t1"), &[SourceKind::Risk])
            .unwrap()
            .into_iter()
            .filter(|e| e.status.is_open() && e.title.contains("Mitigation Overdue"))
            .count();
        prop_assert_eq!(open, 1);
    }
}
