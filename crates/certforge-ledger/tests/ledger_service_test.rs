//! Integration tests for the ledger service over in-memory SurrealDB.

use certforge_core::error::CertforgeError;
use certforge_core::models::ledger::{CertificateDraft, SessionDraft};
use certforge_db::repository::SurrealCertificateSessionRepository;
use certforge_ledger::{LedgerService, Verification};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> LedgerService<SurrealCertificateSessionRepository<Db>> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    certforge_db::run_migrations(&db).await.unwrap();
    LedgerService::new(SurrealCertificateSessionRepository::new(db))
}

fn item(number: &str, name: &str, notified: bool) -> CertificateDraft {
    CertificateDraft {
        certificate_number: number.into(),
        recipient_name: name.into(),
        recipient_email: Some(format!("{}@example.com", name.to_lowercase())),
        course_name: Some("Python Programming".into()),
        notified,
        notify_status: notified.then(|| "sent".to_string()),
    }
}

fn draft(items: Vec<CertificateDraft>) -> SessionDraft {
    SessionDraft {
        session_name: Some("January cohort".into()),
        issuer_name: Some("Anna University".into()),
        certificates: items,
        ..SessionDraft::default()
    }
}

#[tokio::test]
async fn saving_three_items_persists_three_stamped_records() {
    let ledger = setup().await;
    let owner = Uuid::new_v4();

    let session = ledger
        .create_session(
            owner,
            "priya",
            draft(vec![
                item("CERT-0001", "Asha", false),
                item("CERT-0002", "Ravi", true),
                item("CERT-0003", "Meena", false),
            ]),
        )
        .await
        .unwrap();

    let stored = ledger.list_for_owner(owner).await.unwrap();
    assert_eq!(stored.len(), 1);
    let records = &stored[0].certificates;
    assert_eq!(records.len(), 3);
    assert_eq!(stored[0].id, session.id);
    for record in records {
        assert!(record.issued_at.timestamp() > 0);
        assert_eq!(record.notified, record.notified_at.is_some());
    }
    assert!(records[1].notified_at.is_some());
}

#[tokio::test]
async fn lookup_is_case_and_whitespace_insensitive() {
    let ledger = setup().await;
    ledger
        .create_session(Uuid::new_v4(), "priya", draft(vec![item("CERT-0001", "Asha", false)]))
        .await
        .unwrap();

    let a = ledger.find_record_by_certificate_number("cert-0001").await.unwrap();
    let b = ledger.find_record_by_certificate_number(" CERT-0001 ").await.unwrap();
    assert!(a.is_some());
    assert_eq!(a, b);
}

#[tokio::test]
async fn numbers_saved_in_lower_case_are_still_found() {
    let ledger = setup().await;
    ledger
        .create_session(Uuid::new_v4(), "priya", draft(vec![item(" cert-0042", "Ravi", false)]))
        .await
        .unwrap();

    let found = ledger
        .find_record_by_certificate_number("CERT-0042")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.certificate_number, "CERT-0042");
}

#[tokio::test]
async fn blank_and_unknown_numbers_find_nothing() {
    let ledger = setup().await;
    assert!(ledger.find_record_by_certificate_number("   ").await.unwrap().is_none());
    assert_eq!(ledger.verify("CERT-404").await.unwrap(), Verification::NotFound);
}

#[tokio::test]
async fn verify_projects_the_record() {
    let ledger = setup().await;
    ledger
        .create_session(Uuid::new_v4(), "priya", draft(vec![item("CERT-7", "Asha", false)]))
        .await
        .unwrap();

    match ledger.verify("cert-7").await.unwrap() {
        Verification::Valid(record) => {
            assert_eq!(record.recipient_name, "Asha");
            assert_eq!(record.issuer_name.as_deref(), Some("Anna University"));
            assert_eq!(record.course_name.as_deref(), Some("Python Programming"));
        }
        Verification::NotFound => panic!("expected a match"),
    }
}

#[tokio::test]
async fn non_owner_cannot_delete_and_session_survives() {
    let ledger = setup().await;
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let session = ledger
        .create_session(owner, "priya", draft(vec![item("CERT-1", "Asha", false)]))
        .await
        .unwrap();

    for _ in 0..2 {
        let err = ledger.delete_session(session.id, intruder).await.unwrap_err();
        assert!(matches!(err, CertforgeError::AuthorizationDenied { .. }));
    }

    let remaining = ledger.list_for_owner(owner).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, session.id);

    ledger.delete_session(session.id, owner).await.unwrap();
    assert!(ledger.list_for_owner(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_unknown_session_is_forbidden() {
    let ledger = setup().await;
    let err = ledger
        .delete_session(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, CertforgeError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn clear_all_only_touches_the_owner() {
    let ledger = setup().await;
    let priya = Uuid::new_v4();
    let john = Uuid::new_v4();
    ledger
        .create_session(priya, "priya", draft(vec![item("P-1", "Asha", false)]))
        .await
        .unwrap();
    ledger
        .create_session(john, "john", draft(vec![item("J-1", "Ravi", false)]))
        .await
        .unwrap();

    ledger.delete_all_for_owner(priya).await.unwrap();

    assert!(ledger.list_for_owner(priya).await.unwrap().is_empty());
    assert_eq!(ledger.list_for_owner(john).await.unwrap().len(), 1);
    assert!(ledger.find_record_by_certificate_number("J-1").await.unwrap().is_some());
    assert!(ledger.find_record_by_certificate_number("P-1").await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_sessions_are_each_complete() {
    let ledger = std::sync::Arc::new(setup().await);
    let owner = Uuid::new_v4();

    let mut handles = Vec::new();
    for batch in 0..8 {
        let ledger = std::sync::Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            let items = (0..5)
                .map(|i| item(&format!("B{batch}-{i}"), "Asha", false))
                .collect();
            ledger.create_session(owner, "priya", draft(items)).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let sessions = ledger.list_for_owner(owner).await.unwrap();
    assert_eq!(sessions.len(), 8);
    assert!(sessions.iter().all(|s| s.certificates.len() == 5));
    assert!(
        ledger
            .find_record_by_certificate_number("b7-4")
            .await
            .unwrap()
            .is_some()
    );
}
