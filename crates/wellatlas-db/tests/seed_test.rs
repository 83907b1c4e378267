//! The demo seeder is a no-op once the store holds any site.

use wellatlas_db::test_fixtures::TestDatabase;
use wellatlas_db::SeedOutcome;

async fn site_count(t: &TestDatabase) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM site")
        .fetch_one(t.db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_rerunning_seeder_is_a_no_op() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };

    // Seeds when this happens to be the first test against an empty store.
    match t.db.seed_demo_if_empty().await.unwrap() {
        SeedOutcome::Seeded {
            customers,
            sites,
            jobs,
        } => {
            assert_eq!(customers, 10);
            assert_eq!(sites, 100);
            assert_eq!(jobs, 100);
        }
        SeedOutcome::Skipped => {}
    }

    let before = site_count(&t).await;
    assert!(before > 0);

    assert_eq!(t.db.seed_demo_if_empty().await.unwrap(), SeedOutcome::Skipped);
    assert_eq!(site_count(&t).await, before);
}
