//! Role-gated event listing: with one event per source kind in the
//! repository, a family role sees exactly its own kind.

use chrono::Utc;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use riskmap::ai::UnavailableCompleter;
use riskmap::api::{CoreApi, RequestContext};
use riskmap::core::{
    Criticality, RecordId, RoleBinding, SourceKind, SourceRecord, TenantId, UserId,
};
use riskmap::events::{NullSink, Trigger};
use riskmap::RiskmapConfig;
use riskmap::repo::InMemoryRepo;

fn record(kind: SourceKind) -> SourceRecord {
    SourceRecord {
        id: RecordId::new(format!("{}-1", kind)),
        tenant: TenantId::from("t1"),
        kind,
        title: format!("{} item", kind),
        description: "seeded".to_string(),
        criticality: Criticality::Medium,
        status: "Open".to_string(),
        due_date: None,
        mitigation_status: None,
        framework: None,
        owner: None,
        reviewer: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn binding(user: &str, role: &str, view_all: bool) -> RoleBinding {
    RoleBinding {
        user: UserId::from(user),
        role: role.to_string(),
        view_all_event: view_all,
        view_module_event: false,
        accessible_modules: Vec::new(),
        active: true,
    }
}

/// One event per kind, via the created-variant trigger.
fn api_with_one_event_per_kind() -> CoreApi {
    let repo = Arc::new(InMemoryRepo::new());
    let api = CoreApi::new(
        repo.clone(),
        Arc::new(UnavailableCompleter),
        Arc::new(NullSink),
        RiskmapConfig::default(),
    );
    let today = Utc::now().date_naive();
    for kind in SourceKind::ALL {
        let rec = record(kind);
        repo.seed_source(rec.clone());
        api.engine()
            .trigger_now(&rec, Trigger::created_for(kind), today)
            .unwrap()
            .unwrap();
    }
    api
}

#[test]
fn test_compliance_officer_sees_only_compliance_events() {
    let api = api_with_one_event_per_kind();
    api.repo().insert_role_binding(
        &TenantId::from("t1"),
        binding("u1", "Compliance Officer", false),
    );

    let ctx = RequestContext::for_tenant(TenantId::from("t1")).with_user(UserId::from("u1"));
    let response = api.list_events(&ctx).unwrap();

    assert_eq!(response.total_count, 1);
    assert_eq!(response.events[0].linked_record_type, "compliance");
    assert_eq!(response.events[0].module, "Compliance Management");
}

#[test]
fn test_grc_administrator_sees_all_events() {
    let api = api_with_one_event_per_kind();
    api.repo().insert_role_binding(
        &TenantId::from("t1"),
        binding("admin", "GRC Administrator", false),
    );

    let ctx = RequestContext::for_tenant(TenantId::from("t1")).with_user(UserId::from("admin"));
    let response = api.list_events(&ctx).unwrap();
    assert_eq!(response.total_count, SourceKind::ALL.len());
}

#[test]
fn test_view_all_event_flag_grants_full_visibility() {
    let api = api_with_one_event_per_kind();
    api.repo().insert_role_binding(
        &TenantId::from("t1"),
        binding("u2", "Risk Analyst", true),
    );

    let ctx = RequestContext::for_tenant(TenantId::from("t1")).with_user(UserId::from("u2"));
    let response = api.list_events(&ctx).unwrap();
    assert_eq!(response.total_count, SourceKind::ALL.len());
}

#[test]
fn test_user_without_binding_sees_nothing() {
    let api = api_with_one_event_per_kind();
    let ctx = RequestContext::for_tenant(TenantId::from("t1")).with_user(UserId::from("stranger"));
    let response = api.list_events(&ctx).unwrap();
    assert_eq!(response.total_count, 0);
}

#[test]
fn test_anonymous_context_sees_nothing() {
    let api = api_with_one_event_per_kind();
    let ctx = RequestContext::for_tenant(TenantId::from("t1"));
    let response = api.list_events(&ctx).unwrap();
    assert_eq!(response.total_count, 0);
}

#[test]
fn test_unknown_role_uses_accessible_modules() {
    let api = api_with_one_event_per_kind();
    let mut b = binding("u3", "Vendor Manager", false);
    b.accessible_modules = vec!["Incident Management".to_string()];
    api.repo().insert_role_binding(&TenantId::from("t1"), b);

    let ctx = RequestContext::for_tenant(TenantId::from("t1")).with_user(UserId::from("u3"));
    let response = api.list_events(&ctx).unwrap();
    assert_eq!(response.total_count, 1);
    assert_eq!(response.events[0].linked_record_type, "incident");
}
