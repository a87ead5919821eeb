//! Database tests against a real `PostgreSQL` using `#[sqlx::test]`.
//!
//! Each test gets a fresh database with the crate's migrations applied. The
//! `migrations` path is relative to the crate root (`crates/server/`).

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;

use rebuild_together_core::{
    DonationStatus, DonorId, Email, PaymentMethod, ProjectId, ProjectStatus,
};
use rebuild_together_server::config::{
    ReceiptConfig, ServerConfig, ShopifyConfig, SupabaseConfig,
};
use rebuild_together_server::db::{
    ContentRepository, DonationStore, PgStore, ProjectRepository, content::ContentFields,
};
use rebuild_together_server::middleware::RequireAdmin;
use rebuild_together_server::models::{
    ContentItem, ContentKind, NewDonation, NewProject, NewTaxReceipt, Project,
};
use rebuild_together_server::routes::{admin::diagnostics, projects};
use rebuild_together_server::state::AppState;
use rebuild_together_server::supabase::AuthUser;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_project(pool: &PgPool) -> Project {
    ProjectRepository::new(pool)
        .create(&NewProject {
            title: "Roof Repair Fund".to_string(),
            description: String::new(),
            location: "Springfield".to_string(),
            goal_amount: Decimal::new(10_000, 0),
            image_url: None,
            status: ProjectStatus::Active,
            days_left: None,
            shopify_product_handle: Some("roof-repair".to_string()),
            shopify_product_id: Some("7001".to_string()),
        })
        .await
        .unwrap()
}

async fn insert_donor(store: &PgStore, email: &str) -> DonorId {
    let id = DonorId::generate();
    store
        .create_profile(id, &Email::parse(email).unwrap(), Some("Jane Donor"))
        .await
        .unwrap();
    id
}

fn donation(donor_id: DonorId, project_id: ProjectId, order_id: &str, cents: i64) -> NewDonation {
    NewDonation {
        donor_id,
        project_id,
        amount: Decimal::new(cents, 2),
        status: DonationStatus::Completed,
        payment_method: PaymentMethod::Shopify,
        transaction_id: order_id.to_string(),
        shopify_order_id: order_id.to_string(),
        shopify_order_name: format!("#{order_id}"),
        shopify_product_handle: Some("roof-repair".to_string()),
    }
}

async fn reload(pool: &PgPool, id: ProjectId) -> Project {
    ProjectRepository::new(pool).get_by_id(id).await.unwrap().unwrap()
}

async fn count(pool: &PgPool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await.unwrap()
}

fn state(pool: PgPool) -> AppState {
    let config = ServerConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        supabase: SupabaseConfig {
            url: "http://supabase.test".to_string(),
            service_role_key: SecretString::from("service-role-key"),
        },
        shopify: ShopifyConfig {
            store: "rebuild-together.myshopify.com".to_string(),
            api_version: "2025-01".to_string(),
            storefront_token: "public-token".to_string(),
            webhook_secret: None,
        },
        receipts: ReceiptConfig::default(),
        cors_allowed_origin: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    };
    AppState::new(config, pool).unwrap()
}

// ---------------------------------------------------------------------------
// Donations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_deliveries_record_one_donation(pool: PgPool) {
    let store = Arc::new(PgStore::new(pool.clone()));
    let project = insert_project(&pool).await;
    let donor = insert_donor(&store, "jane@example.org").await;
    let line = donation(donor, project.id, "5550001", 2500);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let line = line.clone();
            tokio::spawn(async move { store.record_donation(&line).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_some() {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM donations").await, 1);
    let project = reload(&pool, project.id).await;
    assert_eq!(project.raised_amount, Decimal::new(2500, 2));
    assert_eq!(project.donor_count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn repeat_donor_counts_once_per_project(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let project = insert_project(&pool).await;
    let jane = insert_donor(&store, "jane@example.org").await;
    let sam = insert_donor(&store, "sam@example.org").await;

    for line in [
        donation(jane, project.id, "5550001", 2500),
        donation(jane, project.id, "5550002", 1000),
        donation(sam, project.id, "5550003", 500),
    ] {
        assert!(store.record_donation(&line).await.unwrap().is_some());
    }
    // Redelivery of an existing order leaves the counters alone.
    assert!(
        store
            .record_donation(&donation(jane, project.id, "5550001", 2500))
            .await
            .unwrap()
            .is_none()
    );

    let project = reload(&pool, project.id).await;
    assert_eq!(project.raised_amount, Decimal::new(4000, 2));
    assert_eq!(project.donor_count, 2);

    let found = store
        .find_donation("5550002", project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.amount, Decimal::new(1000, 2));
}

// ---------------------------------------------------------------------------
// Tax receipts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn tax_receipt_upsert_replaces_existing_row(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let donor = insert_donor(&store, "jane@example.org").await;

    let mut receipt = NewTaxReceipt {
        donor_id: donor,
        year: 2024,
        total_amount: Decimal::new(2500, 2),
        receipt_number: "AN-2024-ONE".to_string(),
        pdf_url: Some("https://files.example.org/first.pdf".to_string()),
    };
    let first = store.upsert_tax_receipt(&receipt).await.unwrap();

    receipt.total_amount = Decimal::new(4000, 2);
    receipt.pdf_url = Some("https://files.example.org/second.pdf".to_string());
    let second = store.upsert_tax_receipt(&receipt).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM tax_receipts").await, 1);
    assert_eq!(second.total_amount, Decimal::new(4000, 2));
    assert_eq!(
        second.pdf_url.as_deref(),
        Some("https://files.example.org/second.pdf")
    );
}

// ---------------------------------------------------------------------------
// Project content
// ---------------------------------------------------------------------------

fn impact_order(item: &ContentItem) -> i32 {
    match item {
        ContentItem::Impact(impact) => impact.display_order,
        other => panic!("expected impact item, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn content_create_appends_per_handle(pool: PgPool) {
    let repo = ContentRepository::new(&pool);
    let fields = |text: &str| -> ContentFields { vec![("text", Some(text.to_string()))] };

    let first = repo
        .create(ContentKind::Impact, "roof-repair", &fields("12 roofs replaced"))
        .await
        .unwrap();
    let second = repo
        .create(ContentKind::Impact, "roof-repair", &fields("30 volunteers"))
        .await
        .unwrap();
    let other = repo
        .create(ContentKind::Impact, "ramp-builds", &fields("4 ramps"))
        .await
        .unwrap();

    assert_eq!(impact_order(&first), 0);
    assert_eq!(impact_order(&second), 1);
    assert_eq!(impact_order(&other), 0);

    let listed = repo
        .list(ContentKind::Impact, Some("roof-repair"))
        .await
        .unwrap();
    let orders: Vec<i32> = listed.iter().map(impact_order).collect();
    assert_eq!(orders, vec![0, 1]);
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn project_page_reads_content_and_totals(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let project = insert_project(&pool).await;
    let donor = insert_donor(&store, "jane@example.org").await;
    store
        .record_donation(&donation(donor, project.id, "5550001", 2500))
        .await
        .unwrap();
    ContentRepository::new(&pool)
        .create(
            ContentKind::Impact,
            "roof-repair",
            &vec![("text", Some("12 roofs replaced".to_string()))],
        )
        .await
        .unwrap();

    let Json(page) = projects::show(State(state(pool)), Path("roof-repair".to_string()))
        .await
        .unwrap();

    assert_eq!(page.project.id, project.id);
    assert_eq!(page.impact.len(), 1);
    assert!(page.gallery.is_empty());
    assert_eq!(page.donations.count, 1);
    assert_eq!(page.donations.total, Decimal::new(2500, 2));
}

#[sqlx::test(migrations = "./migrations")]
async fn diagnostics_overview_lists_recent_rows(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let project = insert_project(&pool).await;
    let donor = insert_donor(&store, "jane@example.org").await;
    store
        .record_donation(&donation(donor, project.id, "5550001", 2500))
        .await
        .unwrap();

    let admin = RequireAdmin(AuthUser {
        id: donor,
        email: Some("jane@example.org".to_string()),
    });
    let Json(report) = diagnostics::overview(admin, State(state(pool)))
        .await
        .unwrap();

    assert_eq!(report.donations.len(), 1);
    assert_eq!(report.projects.len(), 1);
    assert!(report.issues.is_empty(), "{:?}", report.issues);
}
