//! Integration tests for the site search: conjunction of criteria, the
//! any-field semantics of `q`, soft-delete handling and result ordering.

use wellatlas_db::test_fixtures::TestDatabase;
use wellatlas_db::{
    JobCategory, JobNoteRepository, JobRepository, NewSite, SiteFilter, SiteOrder,
    SiteRepository,
};

fn names(sites: &[wellatlas_db::SiteView]) -> Vec<String> {
    sites.iter().map(|s| s.name.clone()).collect()
}

#[tokio::test]
async fn test_empty_filter_returns_active_sites() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let fixture = t.create_site(&t.unique("Empty Filter Co"), "Hilltop").await;

    let all = t
        .db
        .sites
        .search(&SiteFilter::default(), SiteOrder::CustomerName)
        .await
        .unwrap();

    assert!(all.iter().any(|s| s.id == fixture.site_id));
    assert!(all.iter().all(|s| s.state.is_active()));
}

#[tokio::test]
async fn test_criteria_are_conjunctive() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let acme = t.unique("Acme Wells");
    let other = t.unique("Other Wells");

    let drilling_site = t.create_site(&acme, "North Pad").await;
    t.create_job(drilling_site.site_id, "100", JobCategory::Drilling, None)
        .await;

    let ag_site = t.create_site(&acme, "South Pad").await;
    t.create_job(ag_site.site_id, "101", JobCategory::Ag, None).await;

    let other_drilling = t.create_site(&other, "East Pad").await;
    t.create_job(other_drilling.site_id, "102", JobCategory::Drilling, None)
        .await;

    let by_customer = t
        .db
        .sites
        .search(
            &SiteFilter::default().with_customer(&acme),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();
    assert_eq!(names(&by_customer), vec!["North Pad", "South Pad"]);

    let by_both = t
        .db
        .sites
        .search(
            &SiteFilter::default()
                .with_customer(&acme)
                .with_job("Drilling"),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();
    assert_eq!(by_both.len(), 1);
    assert_eq!(by_both[0].id, drilling_site.site_id);
    assert_eq!(by_both[0].customer_name, acme);

    let all_three = t
        .db
        .sites
        .search(
            &SiteFilter::new(Some("East"), Some("Drilling"), Some(&acme)),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();
    assert!(all_three.is_empty());
}

#[tokio::test]
async fn test_customer_match_is_exact_and_case_sensitive() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let name = t.unique("Madison Waterworks");
    t.create_site(&name, "Reservoir").await;

    let upper = t
        .db
        .sites
        .search(
            &SiteFilter::default().with_customer(&name.to_uppercase()),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();
    assert!(upper.is_empty());

    let prefix = t
        .db
        .sites
        .search(
            &SiteFilter::default().with_customer("Madison"),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();
    assert!(prefix.iter().all(|s| s.customer_name == "Madison"));
}

#[tokio::test]
async fn test_site_with_many_matching_jobs_appears_once() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let customer = t.unique("Grant Pumping");
    let fixture = t.create_site(&customer, "Orchard").await;
    for n in ["1", "2", "3"] {
        t.create_job(fixture.site_id, n, JobCategory::Ag, Some("pump swap"))
            .await;
    }

    let results = t
        .db
        .sites
        .search(
            &SiteFilter::new(Some("pump swap"), Some("Ag"), Some(&customer)),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, fixture.site_id);
}

#[tokio::test]
async fn test_q_matches_any_field_case_insensitively() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let tag = t.tag().to_string();
    let customer = "Field Match Co";
    let customer_id = t.customer(&customer).await;

    let described = t
        .db
        .sites
        .create(NewSite {
            customer_id,
            name: "Plain".to_string(),
            description: Some(format!("Old {} casing", tag.to_uppercase())),
            location: None,
        })
        .await
        .unwrap();

    let job_site = t.create_site(customer, "Job Numbered").await;
    t.create_job(job_site.site_id, &format!("J-{}", tag), JobCategory::Domestic, None)
        .await;

    let results = t
        .db
        .sites
        .search(&SiteFilter::default().with_q(&tag), SiteOrder::CustomerName)
        .await
        .unwrap();

    let ids: Vec<_> = results.iter().map(|s| s.id).collect();
    assert!(ids.contains(&described));
    assert!(ids.contains(&job_site.site_id));
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn test_q_finds_site_through_job_note_only() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let fixture = t.create_site("Note Search Customer", "Unremarkable").await;
    let job_id = t
        .create_job(fixture.site_id, "7", JobCategory::Electrical, None)
        .await;

    let marker = format!("breaker-{}", t.tag());
    t.db.job_notes
        .append(job_id, &format!("Replaced {} in panel", marker))
        .await
        .unwrap();

    let results = t
        .db
        .sites
        .search(&SiteFilter::default().with_q(&marker), SiteOrder::CustomerName)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, fixture.site_id);
}

#[tokio::test]
async fn test_q_treats_like_wildcards_literally() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let customer = t.unique("Wildcard Co");
    t.create_site(&customer, "100% Solar").await;
    t.create_site(&customer, "1000 Solar").await;

    let results = t
        .db
        .sites
        .search(
            &SiteFilter::default()
                .with_q("100%")
                .with_customer(&customer),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();

    assert_eq!(names(&results), vec!["100% Solar"]);
}

#[tokio::test]
async fn test_deleted_sites_never_match() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let customer = t.unique("Deleted Co");
    t.create_site(&customer, "Kept").await;
    let gone = t.create_site(&customer, "Gone").await;
    t.db.sites.soft_delete(gone.site_id).await.unwrap();

    let by_customer = t
        .db
        .sites
        .search(
            &SiteFilter::default().with_customer(&customer),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();
    assert_eq!(names(&by_customer), vec!["Kept"]);

    let by_q = t
        .db
        .sites
        .search(
            &SiteFilter::default().with_q("Gone").with_customer(&customer),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();
    assert!(by_q.is_empty());
}

#[tokio::test]
async fn test_q_still_reaches_deleted_jobs_but_category_does_not() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let customer = t.unique("Deleted Job Co");
    let fixture = t.create_site(&customer, "Kept").await;
    let marker = format!("casing-{}", t.tag());
    let job_id = t
        .create_job(fixture.site_id, "9", JobCategory::Drilling, None)
        .await;
    t.db.job_notes
        .append(job_id, &format!("Set {} at 120 ft", marker))
        .await
        .unwrap();

    let filter = SiteFilter::default().with_q(&marker);
    let before = t
        .db
        .sites
        .search(&filter, SiteOrder::CustomerName)
        .await
        .unwrap();
    assert_eq!(before.len(), 1);

    t.db.jobs.soft_delete(job_id).await.unwrap();

    let after = t
        .db
        .sites
        .search(&filter, SiteOrder::CustomerName)
        .await
        .unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, fixture.site_id);

    // The only Drilling job is deleted, so the job criterion excludes the site.
    let by_job = t
        .db
        .sites
        .search(
            &SiteFilter::default()
                .with_customer(&customer)
                .with_job("Drilling"),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();
    assert!(by_job.is_empty());
}

#[tokio::test]
async fn test_nul_in_criteria_matches_nothing() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    t.create_site(&t.unique("Nul Co"), "Anywhere").await;

    for filter in [
        SiteFilter::default().with_q("a\0b"),
        SiteFilter::default().with_customer("a\0b"),
        SiteFilter::default().with_job("Dri\0lling"),
    ] {
        let results = t
            .db
            .sites
            .search(&filter, SiteOrder::CustomerName)
            .await
            .unwrap();
        assert!(results.is_empty(), "{:?}", filter);
    }
}

#[tokio::test]
async fn test_unknown_job_category_matches_nothing() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let customer = t.unique("Category Co");
    let fixture = t.create_site(&customer, "Pasture").await;
    t.create_job(fixture.site_id, "1", JobCategory::Ag, None).await;

    let results = t
        .db
        .sites
        .search(
            &SiteFilter::default()
                .with_customer(&customer)
                .with_job("Plumbing"),
            SiteOrder::CustomerName,
        )
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_order_is_customer_then_site_name() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let zeta = t.unique("Zeta Pump");
    let alpha = t.unique("Alpha Pump");
    t.create_site(&zeta, "Able").await;
    t.create_site(&alpha, "Charlie").await;
    t.create_site(&alpha, "Bravo").await;

    let filter = SiteFilter::default().with_q(t.tag());
    let first = t
        .db
        .sites
        .search(&filter, SiteOrder::CustomerName)
        .await
        .unwrap();
    let second = t
        .db
        .sites
        .search(&filter, SiteOrder::CustomerName)
        .await
        .unwrap();

    assert_eq!(names(&first), vec!["Bravo", "Charlie", "Able"]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_newest_first_order() {
    let Some(t) = TestDatabase::connect().await else {
        return;
    };
    let customer = t.unique("Newest Co");
    t.create_site(&customer, "Older").await;
    t.create_site(&customer, "Newer").await;

    let results = t
        .db
        .sites
        .search(
            &SiteFilter::default().with_customer(&customer),
            SiteOrder::NewestFirst,
        )
        .await
        .unwrap();

    assert_eq!(names(&results), vec!["Newer", "Older"]);
}
