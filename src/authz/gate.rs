//! Per-user visibility decisions over events.
//!
//! The gate fails closed: a missing or inactive binding, an unknown role
//! outside its accessible modules, or any repository error all result in
//! the event being hidden.

use std::sync::Arc;

use crate::core::{Event, RoleBinding, TenantScope, UserId};
use crate::repo::Repo;

use super::roles::Role;

/// Decide visibility of one event for one role binding.
///
/// Policy, in order:
/// 1. no active binding -> not visible
/// 2. global-view role or `view_all_event` -> visible
/// 3. known role -> visible iff the role's family owns the event's
///    linked-record kind
/// 4. unknown role -> visible iff the event's derived module is in the
///    binding's accessible-modules set
pub fn event_visible(binding: Option<&RoleBinding>, event: &Event) -> bool {
    let binding = match binding {
        Some(b) if b.active => b,
        _ => return false,
    };

    if binding.view_all_event {
        return true;
    }

    let role = Role::parse(&binding.role);
    if role.has_global_event_view() {
        return true;
    }

    if role.is_known() {
        return role.matches_family(event.linked_record_type);
    }

    module_visible(binding, event)
}

fn module_visible(binding: &RoleBinding, event: &Event) -> bool {
    let module = event.linked_record_type.module();
    binding
        .accessible_modules
        .iter()
        .any(|m| m.eq_ignore_ascii_case(module))
}

/// Repository-backed visibility gate.
pub struct RoleGate {
    repo: Arc<dyn Repo>,
}

impl RoleGate {
    pub fn new(repo: Arc<dyn Repo>) -> Self {
        Self { repo }
    }

    /// Whether `user` may see `event`. Fails closed on lookup errors.
    pub fn is_visible(&self, scope: &TenantScope, user: &UserId, event: &Event) -> bool {
        match self.repo.active_role_binding(scope.tenant(), user) {
            Ok(binding) => event_visible(binding.as_ref(), event),
            Err(err) => {
                log::warn!(
                    "role lookup failed for user {} in tenant {}: {}",
                    user,
                    scope.tenant(),
                    err
                );
                false
            }
        }
    }

    /// Filter a candidate list down to what `user` may see.
    ///
    /// The binding is loaded once for the whole list.
    pub fn filter_events(
        &self,
        scope: &TenantScope,
        user: &UserId,
        events: Vec<Event>,
    ) -> Vec<Event> {
        let binding = match self.repo.active_role_binding(scope.tenant(), user) {
            Ok(binding) => binding,
            Err(err) => {
                log::warn!(
                    "role lookup failed for user {} in tenant {}: {}",
                    user,
                    scope.tenant(),
                    err
                );
                return Vec::new();
            }
        };
        events
            .into_iter()
            .filter(|event| event_visible(binding.as_ref(), event))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        EventDraft, EventId, EventStatus, Priority, RecordId, RecurrenceType, SourceKind, TenantId,
    };
    use chrono::{NaiveDate, Utc};

    fn event_of_kind(kind: SourceKind) -> Event {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        EventDraft {
            tenant: TenantId::from("t1"),
            title: format!("Detected: {} item", kind),
            description: "test".to_string(),
            linked_record_type: kind,
            linked_record_id: RecordId::from("rec-1"),
            linked_record_name: "item".to_string(),
            category: kind.module().to_string(),
            priority: Priority::Medium,
            status: EventStatus::PendingReview,
            start_date: start,
            end_date: start,
            recurrence: RecurrenceType::NonRecurring,
            framework: None,
            owner: None,
            reviewer: None,
            creator: None,
        }
        .into_event(1, EventId::from_sequence(1), Utc::now())
    }

    fn binding(role: &str) -> RoleBinding {
        RoleBinding {
            user: UserId::from("u1"),
            role: role.to_string(),
            view_all_event: false,
            view_module_event: false,
            accessible_modules: Vec::new(),
            active: true,
        }
    }

    #[test]
    fn test_no_binding_is_not_visible() {
        let event = event_of_kind(SourceKind::Risk);
        assert!(!event_visible(None, &event));
    }

    #[test]
    fn test_inactive_binding_is_not_visible() {
        let event = event_of_kind(SourceKind::Risk);
        let mut b = binding("Risk Manager");
        b.active = false;
        assert!(!event_visible(Some(&b), &event));
    }

    #[test]
    fn test_view_all_event_flag_overrides_family() {
        let event = event_of_kind(SourceKind::Policy);
        let mut b = binding("Risk Manager");
        b.view_all_event = true;
        assert!(event_visible(Some(&b), &event));
    }

    #[test]
    fn test_global_roles_see_every_kind() {
        for role in [
            "GRC Administrator",
            "Audit Manager",
            "Internal Auditor",
            "External Auditor",
            "Audit Reviewer",
        ] {
            for kind in SourceKind::ALL {
                let event = event_of_kind(kind);
                assert!(
                    event_visible(Some(&binding(role)), &event),
                    "{} should see {} events",
                    role,
                    kind
                );
            }
        }
    }

    #[test]
    fn test_family_roles_see_only_their_kind() {
        let cases = [
            ("Compliance Manager", SourceKind::Compliance),
            ("Compliance Officer", SourceKind::Compliance),
            ("Compliance Approver", SourceKind::Compliance),
            ("Policy Manager", SourceKind::Policy),
            ("Policy Approver", SourceKind::Policy),
            ("Risk Manager", SourceKind::Risk),
            ("Risk Analyst", SourceKind::Risk),
            ("Risk Reviewer", SourceKind::Risk),
            ("Incident Response Manager", SourceKind::Incident),
            ("Incident Analyst", SourceKind::Incident),
        ];
        for (role, own_kind) in cases {
            for kind in SourceKind::ALL {
                let event = event_of_kind(kind);
                let visible = event_visible(Some(&binding(role)), &event);
                assert_eq!(
                    visible,
                    kind == own_kind,
                    "{} visibility over {} events",
                    role,
                    kind
                );
            }
        }
    }

    #[test]
    fn test_unknown_role_falls_back_to_modules() {
        let event = event_of_kind(SourceKind::Risk);

        let mut b = binding("Vendor Manager");
        assert!(!event_visible(Some(&b), &event));

        b.accessible_modules = vec!["Risk Management".to_string()];
        assert!(event_visible(Some(&b), &event));

        b.accessible_modules = vec!["Policy Management".to_string()];
        assert!(!event_visible(Some(&b), &event));
    }
}
