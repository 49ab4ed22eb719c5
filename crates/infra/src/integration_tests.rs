//! Integration tests for the HR services over the in-memory store.
//!
//! Verifies:
//! - Profile and credential stay paired through the account lifecycle
//! - Multi-document writes are compensated on injected store failures
//! - List and detail visibility follow the role policy
//! - Deletion cascades through paperwork, reviews and the credential

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    use hrspace_auth::{CredentialHasher, FilterField, JwtCodec, ListFilters, Role};
    use hrspace_core::{
        AuthFailure, DomainError, DomainResult, Email, Entity, PageRequest, RecordState,
    };
    use hrspace_directory::{
        Department, Employee, EmployeeUpdate, EmploymentType, NewEmployee, ensure_paired,
        login_completed,
    };
    use hrspace_workflow::{
        ExtendTime, NewPaperwork, NewReview, NewTemplate, PaperworkStatus, PaperworkUpdate,
        ReviewDecision, ReviewUpdate, Score,
    };

    use crate::config::HrConfig;
    use crate::context::HrContext;
    use crate::lifecycle::{LifecycleService, RegisterCompany};
    use crate::notify::{Notice, RecordingNotifier};
    use crate::queries::QueryService;
    use crate::session::SessionService;
    use crate::store::{Collection, HrStore};
    use crate::templates::TemplateService;
    use crate::workflow::WorkflowService;

    /// Reversible stand-in for argon2; keeps the tests fast.
    struct PlainHasher;

    impl CredentialHasher for PlainHasher {
        fn hash(&self, plaintext: &str) -> DomainResult<String> {
            Ok(format!("plain${plaintext}"))
        }

        fn verify(&self, plaintext: &str, hash: &str) -> bool {
            hash.strip_prefix("plain$") == Some(plaintext)
        }
    }

    struct Harness {
        store: Arc<HrStore>,
        notifier: Arc<RecordingNotifier>,
        lifecycle: LifecycleService,
        workflow: WorkflowService,
        queries: QueryService,
        sessions: SessionService,
        templates: TemplateService,
    }

    fn harness() -> Harness {
        harness_with(RecordingNotifier::new())
    }

    fn harness_with(notifier: RecordingNotifier) -> Harness {
        let store = Arc::new(HrStore::new());
        let notifier = Arc::new(notifier);
        let ctx = HrContext::new(
            store.clone(),
            Arc::new(PlainHasher),
            Arc::new(JwtCodec::new(b"test-access-secret", b"test-confirmation-secret")),
            notifier.clone(),
            HrConfig::with_secrets("test-access-secret", "test-confirmation-secret"),
        );
        Harness {
            store,
            notifier,
            lifecycle: LifecycleService::new(ctx.clone()),
            workflow: WorkflowService::new(ctx.clone()),
            queries: QueryService::new(ctx.clone()),
            sessions: SessionService::new(ctx.clone()),
            templates: TemplateService::new(ctx),
        }
    }

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn last_notice(h: &Harness) -> Notice {
        h.notifier.sent().last().cloned().expect("a notice was sent")
    }

    fn confirmation_code(notice: &Notice) -> String {
        match notice {
            Notice::VerifyOnly {
                confirmation_code, ..
            }
            | Notice::PasswordAndVerify {
                confirmation_code, ..
            } => confirmation_code.clone(),
            other => panic!("notice {} carries no confirmation code", other.kind()),
        }
    }

    fn mailed_password(notice: &Notice) -> String {
        match notice {
            Notice::PasswordOnly { password, .. } | Notice::PasswordAndVerify { password, .. } => {
                password.clone()
            }
            other => panic!("notice {} carries no password", other.kind()),
        }
    }

    /// Register a company and verify its founder.
    fn found(h: &Harness, company: &str, name: &str, address: &str) -> Employee {
        let registration = h
            .lifecycle
            .register_company(RegisterCompany {
                company_name: company.to_string(),
                name: name.to_string(),
                email: email(address),
                password: "founder-pw".to_string(),
            })
            .unwrap();
        let code = confirmation_code(&last_notice(h));
        h.lifecycle.verify_account(&code).unwrap();
        h.store
            .employee_in(registration.employee.company_id, registration.employee.id)
            .unwrap()
    }

    fn acme(h: &Harness) -> Employee {
        found(h, "Acme", "Alice", "alice@acme.com")
    }

    /// Create an employee and verify their account.
    fn onboard(h: &Harness, admin: &Employee, draft: NewEmployee) -> Employee {
        let created = h.lifecycle.create_employee(&admin.actor(), draft).unwrap();
        let code = confirmation_code(&last_notice(h));
        h.lifecycle.verify_account(&code).unwrap();
        h.store.employee_in(admin.company_id, created.id).unwrap()
    }

    fn bob_draft(line_manager: &Employee) -> NewEmployee {
        NewEmployee::new("Bob", email("bob@acme.com"), Role::Employee)
            .with_line_manager(line_manager.id)
            .with_password("bob-pw")
    }

    fn probation(review_generated: bool) -> NewPaperwork {
        NewPaperwork {
            title: "Probation".to_string(),
            start_date: date(2025, 1, 1),
            last_date: date(2025, 3, 31),
            kind: EmploymentType::Probation,
            status: PaperworkStatus::Pending,
            template_id: None,
            content: None,
            review_generated,
        }
    }

    fn profile_of(employee: &Employee) -> EmployeeUpdate {
        EmployeeUpdate {
            name: Some(employee.name.clone()),
            email: Some(employee.email.clone()),
            ..EmployeeUpdate::default()
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Account lifecycle
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn acme_bob_end_to_end() {
        let h = harness();
        let alice = acme(&h);
        assert!(alice.user_generated);
        assert_eq!(alice.line_manager_id, Some(alice.id));
        assert_eq!(h.store.company(alice.company_id).unwrap().employee_ids(), &[alice.id]);

        let bob = h.lifecycle.create_employee(&alice.actor(), bob_draft(&alice)).unwrap();
        assert_ne!(bob.id, alice.id);
        assert!(!bob.user_generated);
        assert_eq!(h.notifier.kinds(), vec!["verify_only", "password_and_verify"]);
        assert_eq!(
            h.store.company(alice.company_id).unwrap().employee_ids(),
            &[bob.id, alice.id]
        );

        // Hiring leaves only a pending credential, not a login.
        let pending = h.store.active_user(bob.id).unwrap().unwrap();
        ensure_paired(&bob, &pending).unwrap();
        assert!(!login_completed(&bob, &pending));
        assert_eq!(bob.password_hash, pending.password_hash);
        let hire_code = confirmation_code(&last_notice(&h));

        let user = h
            .lifecycle
            .activate_user(&alice.actor(), bob.id, Some("bob-pw".to_string()))
            .unwrap();
        let bob = h.store.employee_in(alice.company_id, bob.id).unwrap();
        assert!(bob.user_generated);
        assert!(login_completed(&bob, &user));
        assert_eq!(user.id, bob.id);
        assert_eq!(user.generated_by, Some(alice.id));
        assert_eq!(bob.password_hash, user.password_hash);
        match last_notice(&h) {
            Notice::PasswordAndVerify {
                password, sender, ..
            } => {
                assert_eq!(password, "bob-pw");
                assert_eq!(sender, "Alice");
            }
            other => panic!("unexpected notice {}", other.kind()),
        }

        let err = h.sessions.login("bob@acme.com", "bob-pw").unwrap_err();
        assert_eq!(err, DomainError::Unauthenticated(AuthFailure::Invalid));

        let err = h.lifecycle.verify_account(&hire_code).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let code = confirmation_code(&last_notice(&h));
        let verified = h.lifecycle.verify_account(&code).unwrap();
        assert!(verified.user.activated);

        let signed = h.sessions.login("bob@acme.com", "bob-pw").unwrap();
        let header = format!("Bearer {}", signed.access_token);
        let actor = h.sessions.authenticate(Some(header.as_str()), Utc::now()).unwrap();
        assert_eq!(actor.id, bob.id);
        assert_eq!(actor.role, Role::Employee);

        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(true))
            .unwrap();
        let review_id = paperwork.review_id.expect("review generated with the paperwork");
        let review = h.store.review(review_id).unwrap();
        assert_eq!(review.title, "Review for Bob's Probation");
        assert_eq!(review.reviewer_id, Some(alice.id));
        assert_eq!(review.reviewee_id, bob.id);
        assert_eq!(review.review_date, date(2025, 3, 31));
        assert_eq!(review.decision, ReviewDecision::Pending);

        let bob = h.store.employee_in(alice.company_id, bob.id).unwrap();
        assert_eq!(bob.paperwork_ids, vec![paperwork.id]);
        assert_eq!(bob.review_ids, vec![review_id]);
    }

    #[test]
    fn verification_code_is_single_use() {
        let h = harness();
        let alice = acme(&h);
        h.lifecycle.create_employee(&alice.actor(), bob_draft(&alice)).unwrap();
        let code = confirmation_code(&last_notice(&h));

        h.lifecycle.verify_account(&code).unwrap();
        match h.lifecycle.verify_account(&code).unwrap_err() {
            DomainError::NotFound(_) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn registration_rejects_taken_names_and_emails() {
        let h = harness();
        let alice = acme(&h);
        let bob = h.lifecycle.create_employee(&alice.actor(), bob_draft(&alice)).unwrap();
        h.lifecycle.revoke_login(&alice.actor(), bob.id).unwrap();

        let register = |company: &str, address: &str| {
            h.lifecycle.register_company(RegisterCompany {
                company_name: company.to_string(),
                name: "Someone".to_string(),
                email: email(address),
                password: "pw".to_string(),
            })
        };

        match register("ACME", "new@acme.com").unwrap_err() {
            DomainError::Conflict(_) => {}
            other => panic!("expected Conflict, got {other:?}"),
        }
        match register("Globex", "alice@acme.com").unwrap_err() {
            DomainError::Conflict(_) => {}
            other => panic!("expected Conflict, got {other:?}"),
        }
        match register("Globex", "bob@acme.com").unwrap_err() {
            DomainError::Conflict(msg) => assert!(msg.contains("HR")),
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert_eq!(h.store.companies.list().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_email_in_company_is_rejected() {
        let h = harness();
        let alice = acme(&h);
        h.lifecycle.create_employee(&alice.actor(), bob_draft(&alice)).unwrap();

        let err = h
            .lifecycle
            .create_employee(&alice.actor(), bob_draft(&alice))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn batch_import_defaults_line_manager_and_is_all_or_nothing() {
        let h = harness();
        let alice = acme(&h);

        let rows = vec![
            json!({"name": "Dan", "email": "dan@acme.com", "role": "Employee"}),
            json!({"name": "Eve", "email": "eve@acme.com", "role": "Manager", "title": "Lead"}),
        ];
        let created = h.lifecycle.import_employees(&alice.actor(), &rows).unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|e| e.line_manager_id == Some(alice.id)));
        assert_eq!(created[1].role, Role::Manager);
        assert_eq!(h.notifier.kinds().len(), 3);
        assert_eq!(h.store.company(alice.company_id).unwrap().employee_ids().len(), 3);

        let rows = vec![
            json!({"name": "Fay", "email": "fay@acme.com", "role": "Employee"}),
            json!({"name": "Dan again", "email": "dan@acme.com", "role": "Employee"}),
        ];
        let err = h.lifecycle.import_employees(&alice.actor(), &rows).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(h.store.employee_by_email(&email("fay@acme.com"), None).unwrap().is_none());
    }

    #[test]
    fn activation_conflicts_only_with_a_completed_login() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));

        let err = h.lifecycle.activate_user(&alice.actor(), bob.id, None).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let cara = h
            .lifecycle
            .create_employee(
                &alice.actor(),
                NewEmployee::new("Cara", email("cara@acme.com"), Role::Employee)
                    .with_line_manager(alice.id),
            )
            .unwrap();
        h.lifecycle.activate_user(&alice.actor(), cara.id, None).unwrap();
        let err = h.lifecycle.activate_user(&alice.actor(), cara.id, None).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(h.store.users.list().unwrap().iter().filter(|u| u.id == cara.id).count(), 1);
    }

    #[test]
    fn founder_cannot_change_own_role() {
        let h = harness();
        let alice = acme(&h);

        let mut update = profile_of(&alice);
        update.role = Some(Role::Manager);
        match h.lifecycle.update_employee(&alice.actor(), alice.id, update).unwrap_err() {
            DomainError::Conflict(_) => {}
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert_eq!(h.store.employee_in(alice.company_id, alice.id).unwrap().role, Role::Admin);
    }

    #[test]
    fn role_change_is_mirrored_on_the_credential() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));

        let mut update = profile_of(&bob);
        update.role = Some(Role::Manager);
        update.name = Some("Robert".to_string());
        let bob = h.lifecycle.update_employee(&alice.actor(), bob.id, update).unwrap();

        let user = h.store.active_user(bob.id).unwrap().unwrap();
        assert_eq!(user.role, Role::Manager);
        assert_eq!(user.name, "Robert");
        ensure_paired(&bob, &user).unwrap();
    }

    #[test]
    fn only_a_genuine_password_change_is_mailed() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let sent = h.notifier.sent().len();

        let mut update = profile_of(&bob);
        update.password = Some("bob-pw".to_string());
        h.lifecycle.update_employee(&alice.actor(), bob.id, update).unwrap();
        assert_eq!(h.notifier.sent().len(), sent);

        let mut update = profile_of(&bob);
        update.password = Some("new-pw".to_string());
        h.lifecycle.update_employee(&alice.actor(), bob.id, update).unwrap();
        assert_eq!(h.notifier.kinds().last(), Some(&"password_only"));

        assert!(h.sessions.login("bob@acme.com", "bob-pw").is_err());
        h.sessions.login("bob@acme.com", "new-pw").unwrap();
    }

    #[test]
    fn revoke_and_reactivate_login() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));

        match h.lifecycle.revoke_login(&alice.actor(), alice.id).unwrap_err() {
            DomainError::PermissionDenied(_) => {}
            other => panic!("expected PermissionDenied, got {other:?}"),
        }

        h.lifecycle.revoke_login(&alice.actor(), bob.id).unwrap();
        assert!(h.sessions.login("bob@acme.com", "bob-pw").is_err());
        let profile = h.store.employee_in(alice.company_id, bob.id).unwrap();
        assert!(!profile.user_generated);
        assert!(h.store.active_user(bob.id).unwrap().is_none());

        let user = h
            .lifecycle
            .activate_user(&alice.actor(), bob.id, Some("again-pw".to_string()))
            .unwrap();
        assert!(!user.activated);
        assert_eq!(h.notifier.kinds().last(), Some(&"password_and_verify"));

        let err = h
            .lifecycle
            .activate_user(&alice.actor(), bob.id, None)
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn self_service_reset_picks_notice_by_account_state() {
        let h = harness();
        let alice = acme(&h);
        onboard(&h, &alice, bob_draft(&alice));

        h.lifecycle.reset_password_via_email("bob@acme.com").unwrap();
        let notice = last_notice(&h);
        assert_eq!(notice.kind(), "password_only");
        h.sessions.login("bob@acme.com", &mailed_password(&notice)).unwrap();

        let carl = NewEmployee::new("Carl", email("carl@acme.com"), Role::Employee)
            .with_line_manager(alice.id);
        h.lifecycle.create_employee(&alice.actor(), carl).unwrap();
        h.lifecycle.reset_password_via_email("carl@acme.com").unwrap();
        match last_notice(&h) {
            Notice::PasswordAndVerify { sender, .. } => assert_eq!(sender, "HRSpace"),
            other => panic!("unexpected notice {}", other.kind()),
        }

        let err = h.lifecycle.reset_password_via_email("nobody@acme.com").unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn admin_reset_requires_a_credential() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));

        h.lifecycle
            .reset_password(&alice.actor(), bob.id, Some("reset-pw".to_string()))
            .unwrap();
        h.sessions.login("bob@acme.com", "reset-pw").unwrap();
        let profile = h.store.employee_in(alice.company_id, bob.id).unwrap();
        assert_eq!(profile.password_hash.as_deref(), Some("plain$reset-pw"));

        h.lifecycle.revoke_login(&alice.actor(), bob.id).unwrap();
        let err = h.lifecycle.reset_password(&alice.actor(), bob.id, None).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn notice_failure_does_not_roll_back() {
        let h = harness_with(RecordingNotifier::failing());
        let alice = acme(&h);

        let bob = h.lifecycle.create_employee(&alice.actor(), bob_draft(&alice)).unwrap();
        assert!(h.store.employee_in(alice.company_id, bob.id).is_ok());
        assert!(h.store.active_user(bob.id).unwrap().is_some());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Compensation
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn failed_credential_write_undoes_employee_creation() {
        let h = harness();
        let alice = acme(&h);

        h.store.users.fail_next_write();
        let err = h
            .lifecycle
            .create_employee(&alice.actor(), bob_draft(&alice))
            .unwrap_err();
        assert!(matches!(err, DomainError::Dependency(_)));

        assert_eq!(h.store.employees.list().unwrap().len(), 1);
        assert_eq!(h.store.company(alice.company_id).unwrap().employee_ids(), &[alice.id]);
        assert_eq!(h.notifier.kinds(), vec!["verify_only"]);

        h.lifecycle.create_employee(&alice.actor(), bob_draft(&alice)).unwrap();
    }

    #[test]
    fn failed_verification_can_be_retried() {
        let h = harness();
        let alice = acme(&h);
        let bob = h.lifecycle.create_employee(&alice.actor(), bob_draft(&alice)).unwrap();
        let code = confirmation_code(&last_notice(&h));

        h.store.employees.fail_next_write();
        let err = h.lifecycle.verify_account(&code).unwrap_err();
        assert!(matches!(err, DomainError::Dependency(_)));
        assert!(!h.store.active_user(bob.id).unwrap().unwrap().activated);

        h.lifecycle.verify_account(&code).unwrap();
        assert!(h.store.active_user(bob.id).unwrap().unwrap().activated);
    }

    #[test]
    fn failed_cascade_leaves_everything_in_place() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(true))
            .unwrap();

        h.store.reviews.fail_next_write();
        let err = h.lifecycle.delete_employee(&alice.actor(), bob.id).unwrap_err();
        assert!(matches!(err, DomainError::Dependency(_)));

        assert!(h.store.company(alice.company_id).unwrap().has_member(bob.id));
        assert!(h.store.employee_in(alice.company_id, bob.id).is_ok());
        assert!(h.store.paperwork(paperwork.id).is_ok());
        h.sessions.login("bob@acme.com", "bob-pw").unwrap();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cascade
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn deleting_an_employee_retires_everything_they_own() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(true))
            .unwrap();
        let review_id = paperwork.review_id.unwrap();

        h.lifecycle.delete_employee(&alice.actor(), bob.id).unwrap();

        assert_eq!(h.store.company(alice.company_id).unwrap().employee_ids(), &[alice.id]);

        let profile = h.store.employees.get(&bob.id).unwrap().unwrap();
        assert_eq!(profile.state, RecordState::Deleted);
        assert!(!profile.user_generated);

        let user = h.store.users.get(&bob.id).unwrap().unwrap();
        assert_eq!(user.state, RecordState::Deleted);
        assert!(!user.activated);
        assert!(user.password_hash.is_none());

        assert!(!h.store.paperworks.get(&paperwork.id).unwrap().unwrap().is_active());
        assert!(!h.store.reviews.get(&review_id).unwrap().unwrap().is_active());

        assert!(h.sessions.login("bob@acme.com", "bob-pw").is_err());
        match h.store.employee_in(alice.company_id, bob.id).unwrap_err() {
            DomainError::NotFound(_) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn employee_without_login_can_be_deleted() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        h.lifecycle.revoke_login(&alice.actor(), bob.id).unwrap();

        h.lifecycle.delete_employee(&alice.actor(), bob.id).unwrap();
        assert!(h.store.employee_in(alice.company_id, bob.id).is_err());
    }

    #[test]
    fn deleting_paperwork_drops_back_references() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(true))
            .unwrap();
        let review_id = paperwork.review_id.unwrap();

        h.workflow
            .delete_paperwork(&alice.actor(), bob.id, paperwork.id)
            .unwrap();

        let bob = h.store.employee_in(alice.company_id, bob.id).unwrap();
        assert!(bob.paperwork_ids.is_empty());
        assert!(bob.review_ids.is_empty());
        assert!(h.store.review(review_id).is_err());
        assert!(h.store.paperwork(paperwork.id).is_err());
    }

    #[test]
    fn paperwork_without_a_review_is_deleted_alone() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(false))
            .unwrap();
        assert_eq!(paperwork.review_id, None);

        h.workflow
            .delete_paperwork(&alice.actor(), bob.id, paperwork.id)
            .unwrap();
        assert!(h.store.paperwork(paperwork.id).is_err());
        assert!(h.store.employee_in(alice.company_id, bob.id).unwrap().paperwork_ids.is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Visibility
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn list_visibility_follows_role() {
        let h = harness();
        let alice = acme(&h);
        let mia = onboard(
            &h,
            &alice,
            NewEmployee::new("Mia", email("mia@acme.com"), Role::Manager)
                .with_line_manager(alice.id)
                .with_department(Department::Engineering),
        );
        let bob = onboard(&h, &alice, bob_draft(&mia));
        let carl = onboard(
            &h,
            &alice,
            NewEmployee::new("Carl", email("carl@acme.com"), Role::Employee)
                .with_line_manager(alice.id),
        );
        let all = ListFilters::new();

        let page = h
            .queries
            .list_employees(&mia.actor(), &all, PageRequest::default())
            .unwrap();
        let ids: HashSet<_> = page.items.iter().map(|e| e.id).collect();
        assert_eq!(ids, HashSet::from([mia.id, bob.id]));

        let page = h
            .queries
            .list_employees(&bob.actor(), &all, PageRequest::default())
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].id, bob.id);

        let sales = ListFilters::new().with(FilterField::Department, "Sales");
        let err = h
            .queries
            .list_employees(&mia.actor(), &sales, PageRequest::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let page = h
            .queries
            .list_employees(&alice.actor(), &all, PageRequest::new(Some(1), Some(3)))
            .unwrap();
        assert_eq!(page.total_count, 4);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 3);

        let by_name = ListFilters::new().with(FilterField::Name, "BO");
        let page = h
            .queries
            .list_employees(&alice.actor(), &by_name, PageRequest::default())
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, bob.id);

        assert!(h.queries.employee_detail(&mia.actor(), bob.id).is_ok());
        let err = h.queries.employee_detail(&mia.actor(), carl.id).unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
        let err = h.queries.employee_detail(&bob.actor(), carl.id).unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let err = h
            .queries
            .list_users(&mia.actor(), &all, PageRequest::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[test]
    fn other_companies_read_as_missing() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let gina = found(&h, "Globex", "Gina", "gina@globex.com");

        match h.queries.employee_detail(&gina.actor(), bob.id).unwrap_err() {
            DomainError::NotFound(_) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        let page = h
            .queries
            .list_employees(&gina.actor(), &ListFilters::new(), PageRequest::default())
            .unwrap();
        assert_eq!(page.total_count, 1);
    }

    #[test]
    fn paperwork_is_visible_to_owner_and_line_manager() {
        let h = harness();
        let alice = acme(&h);
        let mia = onboard(
            &h,
            &alice,
            NewEmployee::new("Mia", email("mia@acme.com"), Role::Manager).with_line_manager(alice.id),
        );
        let bob = onboard(&h, &alice, bob_draft(&mia));
        let carl = onboard(
            &h,
            &alice,
            NewEmployee::new("Carl", email("carl@acme.com"), Role::Employee)
                .with_line_manager(alice.id),
        );
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(false))
            .unwrap();

        let all = ListFilters::new();
        for viewer in [&bob, &mia, &alice] {
            let page = h
                .workflow
                .list_paperwork(&viewer.actor(), bob.id, &all, PageRequest::default())
                .unwrap();
            assert_eq!(page.items.len(), 1, "{} should see Bob's paperwork", viewer.name);
            assert!(h.workflow.get_paperwork(&viewer.actor(), bob.id, paperwork.id).is_ok());
        }

        let err = h
            .workflow
            .list_paperwork(&carl.actor(), bob.id, &all, PageRequest::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Paperwork and reviews
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn paperwork_window_is_unique_and_status_moves_forward() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(false))
            .unwrap();

        let err = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(false))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let update = |status| PaperworkUpdate {
            title: "Probation".to_string(),
            start_date: date(2025, 1, 1),
            last_date: date(2025, 3, 31),
            kind: EmploymentType::Probation,
            status,
            template_id: None,
            content: Some("signed copy".to_string()),
        };
        let updated = h
            .workflow
            .update_paperwork(&alice.actor(), bob.id, paperwork.id, update(PaperworkStatus::Generated))
            .unwrap();
        assert_eq!(updated.status, PaperworkStatus::Generated);

        match h
            .workflow
            .update_paperwork(&alice.actor(), bob.id, paperwork.id, update(PaperworkStatus::Pending))
            .unwrap_err()
        {
            DomainError::State(_) => {}
            other => panic!("expected State, got {other:?}"),
        }
        assert_eq!(h.store.paperwork(paperwork.id).unwrap().status, PaperworkStatus::Generated);
    }

    #[test]
    fn paperwork_period_cannot_strand_its_review() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(true))
            .unwrap();
        let review_id = paperwork.review_id.unwrap();

        let shortened = |last_date| PaperworkUpdate {
            title: "Probation".to_string(),
            start_date: date(2025, 1, 1),
            last_date,
            kind: EmploymentType::Probation,
            status: PaperworkStatus::Pending,
            template_id: None,
            content: None,
        };

        let err = h
            .workflow
            .update_paperwork(&alice.actor(), bob.id, paperwork.id, shortened(date(2025, 1, 31)))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(h.store.paperwork(paperwork.id).unwrap().period.last(), date(2025, 3, 31));

        h.workflow.delete_review(&alice.actor(), bob.id, review_id).unwrap();
        let updated = h
            .workflow
            .update_paperwork(&alice.actor(), bob.id, paperwork.id, shortened(date(2025, 1, 31)))
            .unwrap();
        assert_eq!(updated.period.last(), date(2025, 1, 31));
    }

    #[test]
    fn review_dates_are_bounded_and_assignments_unique() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(false))
            .unwrap();

        let input = |review_date, reviewee_id| NewReview {
            title: "Quarter review".to_string(),
            reviewer_id: Some(alice.id),
            reviewee_id,
            review_date,
            paperwork_id: paperwork.id,
            attitude: None,
            work_quality: None,
            decision: ReviewDecision::Pending,
            extend_time: None,
            improvement: None,
        };

        let err = h
            .workflow
            .create_review(&alice.actor(), bob.id, input(date(2025, 4, 1), bob.id))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = h
            .workflow
            .create_review(&alice.actor(), bob.id, input(date(2025, 2, 1), alice.id))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let review = h
            .workflow
            .create_review(&alice.actor(), bob.id, input(date(2025, 3, 31), bob.id))
            .unwrap();
        assert_eq!(h.store.paperwork(paperwork.id).unwrap().review_id, Some(review.id));
        assert_eq!(
            h.store.employee_in(alice.company_id, bob.id).unwrap().review_ids,
            vec![review.id]
        );

        let err = h
            .workflow
            .create_review(&alice.actor(), bob.id, input(date(2025, 1, 1), bob.id))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn failed_back_reference_undoes_review_creation() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(false))
            .unwrap();

        h.store.paperworks.fail_next_write();
        let err = h
            .workflow
            .create_review(
                &alice.actor(),
                bob.id,
                NewReview {
                    title: "Quarter review".to_string(),
                    reviewer_id: Some(alice.id),
                    reviewee_id: bob.id,
                    review_date: date(2025, 2, 1),
                    paperwork_id: paperwork.id,
                    attitude: None,
                    work_quality: None,
                    decision: ReviewDecision::Pending,
                    extend_time: None,
                    improvement: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Dependency(_)));

        assert!(h.store.reviews.list().unwrap().is_empty());
        assert!(h.store.employee_in(alice.company_id, bob.id).unwrap().review_ids.is_empty());
        assert_eq!(h.store.paperwork(paperwork.id).unwrap().review_id, None);
    }

    #[test]
    fn manager_cannot_touch_a_passed_review() {
        let h = harness();
        let alice = acme(&h);
        let mia = onboard(
            &h,
            &alice,
            NewEmployee::new("Mia", email("mia@acme.com"), Role::Manager).with_line_manager(alice.id),
        );
        let bob = onboard(&h, &alice, bob_draft(&mia));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(true))
            .unwrap();
        let review_id = paperwork.review_id.unwrap();

        let pass = ReviewUpdate {
            attitude: Some(Score::try_from(8).unwrap()),
            decision: ReviewDecision::Pass,
            extend_time: Some(ExtendTime::OneMonth),
            ..ReviewUpdate::default()
        };
        let review = h
            .workflow
            .update_review(&mia.actor(), bob.id, review_id, pass.clone())
            .unwrap();
        assert_eq!(review.decision, ReviewDecision::Pass);
        assert_eq!(review.extend_time, None);

        match h
            .workflow
            .update_review(&mia.actor(), bob.id, review_id, pass.clone())
            .unwrap_err()
        {
            DomainError::State(_) => {}
            other => panic!("expected State, got {other:?}"),
        }

        let err = h
            .workflow
            .update_review(&bob.actor(), bob.id, review_id, pass.clone())
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let extend = ReviewUpdate {
            decision: ReviewDecision::Extend,
            extend_time: Some(ExtendTime::TwoMonths),
            ..ReviewUpdate::default()
        };
        let review = h
            .workflow
            .update_review(&alice.actor(), bob.id, review_id, extend)
            .unwrap();
        assert_eq!(review.extend_time, Some(ExtendTime::TwoMonths));
    }

    #[test]
    fn review_lists_are_scoped_per_role() {
        let h = harness();
        let alice = acme(&h);
        let mia = onboard(
            &h,
            &alice,
            NewEmployee::new("Mia", email("mia@acme.com"), Role::Manager).with_line_manager(alice.id),
        );
        let bob = onboard(&h, &alice, bob_draft(&mia));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(true))
            .unwrap();
        let review_id = paperwork.review_id.unwrap();
        let all = ListFilters::new();

        for viewer in [&alice, &mia, &bob] {
            let page = h
                .workflow
                .list_reviews(&viewer.actor(), bob.id, &all, PageRequest::default())
                .unwrap();
            assert_eq!(page.items.len(), 1, "{} should see the review", viewer.name);
        }
        assert!(h.workflow.get_review(&mia.actor(), bob.id, review_id).is_ok());

        let pending = ListFilters::new().with(FilterField::Decision, "Pass");
        let page = h
            .workflow
            .list_reviews(&alice.actor(), bob.id, &pending, PageRequest::default())
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn deleting_a_review_clears_the_paperwork_link() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(true))
            .unwrap();
        let review_id = paperwork.review_id.unwrap();

        h.workflow.delete_review(&alice.actor(), bob.id, review_id).unwrap();

        assert_eq!(h.store.paperwork(paperwork.id).unwrap().review_id, None);
        assert!(h.store.employee_in(alice.company_id, bob.id).unwrap().review_ids.is_empty());
        assert!(h.store.review(review_id).is_err());

        let err = h.workflow.delete_review(&alice.actor(), bob.id, review_id).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn share_review_reminds_the_current_line_manager() {
        let h = harness();
        let alice = acme(&h);
        let mia = onboard(
            &h,
            &alice,
            NewEmployee::new("Mia", email("mia@acme.com"), Role::Manager).with_line_manager(alice.id),
        );
        let bob = onboard(&h, &alice, bob_draft(&mia));
        let paperwork = h
            .workflow
            .create_paperwork(&alice.actor(), bob.id, probation(true))
            .unwrap();
        let review_id = paperwork.review_id.unwrap();

        for outsider in [&alice, &bob] {
            let err = h
                .workflow
                .share_review(&outsider.actor(), bob.id, review_id, "/reviews/42")
                .unwrap_err();
            assert!(matches!(err, DomainError::PermissionDenied(_)), "{}", outsider.name);
        }
        assert!(h.notifier.sent().iter().all(|n| n.kind() != "review_reminder"));

        h.workflow
            .share_review(&mia.actor(), bob.id, review_id, "/reviews/42")
            .unwrap();
        match last_notice(&h) {
            Notice::ReviewReminder {
                reviewer_name,
                reviewee_name,
                email: to,
                link,
            } => {
                assert_eq!(reviewer_name, "Mia");
                assert_eq!(reviewee_name, "Bob");
                assert_eq!(to.as_str(), "mia@acme.com");
                assert_eq!(link, "http://localhost:3000/reviews/42");
            }
            other => panic!("unexpected notice {}", other.kind()),
        }

        let mut update = profile_of(&bob);
        update.line_manager_id = Some(alice.id);
        h.lifecycle.update_employee(&alice.actor(), bob.id, update).unwrap();

        let err = h
            .workflow
            .share_review(&alice.actor(), bob.id, review_id, "/reviews/42")
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = h
            .workflow
            .share_review(&mia.actor(), bob.id, review_id, "/reviews/42")
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Templates
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn templates_are_company_scoped_and_admin_written() {
        let h = harness();
        let alice = acme(&h);
        let bob = onboard(&h, &alice, bob_draft(&alice));
        let gina = found(&h, "Globex", "Gina", "gina@globex.com");

        let input = |creator: &Employee| NewTemplate {
            name: "Offer letter".to_string(),
            content: "Dear {name}".to_string(),
            category: EmploymentType::FullTime,
            creator_id: creator.id,
            company_id: creator.company_id,
        };

        let template = h.templates.create(&alice.actor(), input(&alice)).unwrap();

        let err = h.templates.create(&bob.actor(), input(&bob)).unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let filters = ListFilters::new().with(FilterField::Name, "offer");
        let page = h
            .templates
            .list(&bob.actor(), &filters, PageRequest::default())
            .unwrap();
        assert_eq!(page.items.len(), 1);

        match h.templates.get(&gina.actor(), template.id).unwrap_err() {
            DomainError::NotFound(_) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }

        let mut draft = probation(false);
        draft.template_id = Some(template.id);
        let gina_hire = onboard(
            &h,
            &gina,
            NewEmployee::new("Hal", email("hal@globex.com"), Role::Employee).with_line_manager(gina.id),
        );
        let err = h
            .workflow
            .create_paperwork(&gina.actor(), gina_hire.id, draft.clone())
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(h.workflow.create_paperwork(&alice.actor(), bob.id, draft).is_ok());

        h.templates.delete(&alice.actor(), template.id).unwrap();
        let page = h
            .templates
            .list(&alice.actor(), &ListFilters::new(), PageRequest::default())
            .unwrap();
        assert!(page.items.is_empty());
    }
}
