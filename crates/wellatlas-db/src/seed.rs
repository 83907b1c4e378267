//! Idempotent demo-data seeder.
//!
//! Populates an empty store with 10 customers, 10 sites each and one job per
//! site. Runs inside one transaction under a transaction-level advisory lock,
//! so concurrent starts seed at most once and a store that already holds any
//! site is left untouched.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use sqlx::{Pool, Postgres};
use tracing::info;

use wellatlas_core::{
    Error, GeoPoint, JobCategory, NewCustomer, NewJob, NewSite, Result, WellMeasurements,
};

use crate::customers::find_or_create_on;
use crate::jobs::create_job_on;
use crate::sites::create_site_on;

/// Advisory lock key serializing seeders across processes.
const SEED_LOCK_KEY: i64 = 0x5745_4c4c_5345_4544;

/// First job number handed out by the seeder.
pub const FIRST_DEMO_JOB_NUMBER: u32 = 25001;

/// Sites created per demo customer.
pub const SITES_PER_CUSTOMER: usize = 10;

pub const DEMO_CUSTOMER_NAMES: [&str; 10] = [
    "Washington Drilling Co.",
    "Lincoln Pump & Well",
    "Jefferson Water Systems",
    "Roosevelt Groundwater Services",
    "Kennedy HydroTech",
    "Adams Well & Pump",
    "Madison Waterworks",
    "Jackson Ag & Irrigation",
    "Grant Pumping Solutions",
    "Truman Drilling & Pump Service",
];

/// Northern California points demo sites are scattered across.
const DEMO_REGION: [(f64, f64); 5] = [
    (40.385, -122.280),
    (40.178, -122.240),
    (39.927, -122.180),
    (39.728, -121.837),
    (39.747, -122.194),
];

const DEMO_SITE_NAMES: [&str; 100] = [
    "Mother Lode", "Pay Dirt", "Sluice Box", "Stamp Mill", "Placer Claim",
    "Drift Mine", "Hydraulic Pit", "Gold Pan", "Tailings", "Bedrock",
    "Pick and Shovel", "Ore Cart", "Quartz Vein", "Mine Shaft", "Black Sand",
    "Rocker Box", "Prospect Hole", "Hard Rock", "Assay Office", "Grubstake",
    "Lode Claim", "Panning Dish", "Cradle Rock", "Dust Gold", "Nugget Patch",
    "Timbering", "Creek Claim", "Pay Streak", "Ventilation Shaft", "Bucket Line",
    "Dredge Cut", "Amalgam Press", "Prospector's Camp", "Claim Jumper", "Mining Camp",
    "Gold Dust", "Mine Portal", "Crosscut Drift", "Incline Shaft", "Strike Zone",
    "Wash Plant", "Headframe", "Drill Core", "Stope Chamber", "Milling House",
    "Hoist House", "Smelter Works", "Ore Bin", "Tunnel Bore", "Grizzly Screen",
    "Hydraulic Monitor", "Pay Streak North", "Bedrock Bench", "Tailrace", "Assayer Cabin",
    "Prospect Ridge", "Quartz Ledge", "Stope Ladder", "Ore Chute", "Mill Tailings",
    "Gulch Claim", "Placer Bench", "Hardrock Portal", "Sluice Run", "Settling Pond",
    "Stamp Battery", "Headframe East", "Headframe West", "Sump Shaft", "Timber Set",
    "Carbide Lamp", "Blacksmith Shop", "Gold Pocket", "Creek Box", "Bunkhouse",
    "Prospect Drift", "Muck Pile", "Vent Raise", "Winze Shaft", "Crosscut East",
    "Crosscut West", "Assay Lab", "Tramway", "Sorting Shed", "Crusher House",
    "Jig Plant", "Ball Mill", "Pan Station", "Gold Room", "Assay Scales",
    "Raise Station", "Spiral Chute", "Belt House", "Gate Valve", "Water Box",
    "Pipe Manifold", "Control Shed", "Yard Pit", "Mix Plant", "Well Yard",
];

/// What a seeder run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeedOutcome {
    /// The store already held sites; nothing was written.
    Skipped,
    Seeded {
        customers: usize,
        sites: usize,
        jobs: usize,
    },
}

/// One planned demo site and its first job.
#[derive(Debug, Clone, PartialEq)]
struct DemoSite {
    customer: &'static str,
    name: &'static str,
    location: GeoPoint,
    job_number: String,
    category: JobCategory,
}

/// Draw site names without replacement and a random point and category per site.
///
/// Kept synchronous so the RNG never lives across an await point.
fn plan_demo_sites<R: Rng>(rng: &mut R) -> Vec<DemoSite> {
    let mut names = DEMO_SITE_NAMES.to_vec();
    names.shuffle(rng);
    let mut names = names.into_iter();

    let mut job_number = FIRST_DEMO_JOB_NUMBER;
    let mut plan = Vec::with_capacity(DEMO_CUSTOMER_NAMES.len() * SITES_PER_CUSTOMER);
    for customer in DEMO_CUSTOMER_NAMES {
        for name in names.by_ref().take(SITES_PER_CUSTOMER) {
            let (lat, lon) = DEMO_REGION[rng.gen_range(0..DEMO_REGION.len())];
            let category = JobCategory::ALL[rng.gen_range(0..JobCategory::ALL.len())];
            plan.push(DemoSite {
                customer,
                name,
                location: GeoPoint {
                    latitude: lat,
                    longitude: lon,
                },
                job_number: job_number.to_string(),
                category,
            });
            job_number += 1;
        }
    }
    plan
}

fn demo_customer(name: &str) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        address: Some("123 Demo Rd, North State, CA".to_string()),
        phone: Some("(530) 555-0123".to_string()),
        email: Some("demo@example.com".to_string()),
        notes: Some("Preferred customer.".to_string()),
    }
}

/// Seed demo data unless any site (active or deleted) already exists.
pub async fn seed_demo_if_empty(pool: &Pool<Postgres>) -> Result<SeedOutcome> {
    let plan = plan_demo_sites(&mut rand::thread_rng());

    let mut tx = pool.begin().await.map_err(Error::Database)?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SEED_LOCK_KEY)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

    let has_sites: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM site)")
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;
    if has_sites {
        tx.rollback().await.map_err(Error::Database)?;
        info!(
            subsystem = "db",
            component = "seeder",
            op = "seed",
            "Store already has sites, demo seeding skipped"
        );
        return Ok(SeedOutcome::Skipped);
    }

    let mut customers = 0;
    let mut current: Option<(&str, uuid::Uuid)> = None;
    let mut sites = 0;
    let mut jobs = 0;

    for demo in plan {
        let customer_id = match current {
            Some((name, id)) if name == demo.customer => id,
            _ => {
                let identity = find_or_create_on(&mut tx, demo_customer(demo.customer)).await?;
                customers += 1;
                current = Some((demo.customer, identity.id));
                identity.id
            }
        };

        let site_id = create_site_on(
            &mut tx,
            NewSite {
                customer_id,
                name: demo.name.to_string(),
                description: Some(format!("Primary site for {}.", demo.name)),
                location: Some(demo.location),
            },
        )
        .await?;
        sites += 1;

        create_job_on(
            &mut tx,
            NewJob {
                site_id,
                description: Some(format!("Job #{} at {}.", demo.job_number, demo.name)),
                job_number: demo.job_number,
                job_category: demo.category,
                measurements: WellMeasurements::default(),
            },
        )
        .await?;
        jobs += 1;
    }

    tx.commit().await.map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "seeder",
        op = "seed",
        customers,
        sites,
        jobs,
        "Demo data seeded"
    );
    Ok(SeedOutcome::Seeded {
        customers,
        sites,
        jobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn plan() -> Vec<DemoSite> {
        plan_demo_sites(&mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_plan_covers_every_customer_evenly() {
        let plan = plan();
        assert_eq!(plan.len(), 100);
        for customer in DEMO_CUSTOMER_NAMES {
            let count = plan.iter().filter(|s| s.customer == customer).count();
            assert_eq!(count, SITES_PER_CUSTOMER, "{}", customer);
        }
    }

    #[test]
    fn test_site_names_drawn_without_replacement() {
        let names: HashSet<&str> = plan().iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 100);
    }

    #[test]
    fn test_job_numbers_are_sequential_from_first() {
        let numbers: Vec<u32> = plan()
            .iter()
            .map(|s| s.job_number.parse().unwrap())
            .collect();
        let expected: Vec<u32> = (FIRST_DEMO_JOB_NUMBER..FIRST_DEMO_JOB_NUMBER + 100).collect();
        assert_eq!(numbers, expected);
    }

    #[test]
    fn test_locations_come_from_region() {
        for site in plan() {
            let point = (site.location.latitude, site.location.longitude);
            assert!(DEMO_REGION.contains(&point));
        }
    }

    #[test]
    fn test_seed_outcome_serializes_with_tag() {
        let value = serde_json::to_value(SeedOutcome::Seeded {
            customers: 10,
            sites: 100,
            jobs: 100,
        })
        .unwrap();
        assert_eq!(value["outcome"], "seeded");
        assert_eq!(value["sites"], 100);
    }
}
