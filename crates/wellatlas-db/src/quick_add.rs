//! Atomic quick-add: customer (found or created), site and first job.

use sqlx::{Pool, Postgres};
use tracing::info;

use wellatlas_core::{
    require_name, Error, NewCustomer, NewJob, NewSite, QuickAdd, QuickAddOutcome,
    Result, WellMeasurements, DEFAULT_QUICK_ADD_JOB_NUMBER, DEFAULT_QUICK_ADD_SITE_NAME,
};

use crate::customers::find_or_create_on;
use crate::jobs::create_job_on;
use crate::sites::create_site_on;

/// Write the three rows in one transaction.
///
/// A blank customer name is rejected before the transaction opens. An
/// existing customer name is reused, never an error. Any failure after that
/// rolls the whole transaction back, so either all rows commit or none do.
pub async fn quick_add(pool: &Pool<Postgres>, req: QuickAdd) -> Result<QuickAddOutcome> {
    let customer_name = require_name("customer_name", &req.customer_name)?;
    // The row writers validate these; only blanks are defaulted here.
    let site_name = or_default(req.site_name, DEFAULT_QUICK_ADD_SITE_NAME);
    let job_number = or_default(req.job_number, DEFAULT_QUICK_ADD_JOB_NUMBER);

    // Dropping the transaction on any early return rolls it back.
    let mut tx = pool.begin().await.map_err(Error::Database)?;

    let customer = find_or_create_on(&mut tx, NewCustomer::named(customer_name)).await?;

    let site_id = create_site_on(
        &mut tx,
        NewSite {
            customer_id: customer.id,
            name: site_name,
            description: None,
            location: req.location,
        },
    )
    .await?;

    let job_id = create_job_on(
        &mut tx,
        NewJob {
            site_id,
            job_number,
            job_category: req.job_category.unwrap_or_default(),
            description: None,
            measurements: WellMeasurements::default(),
        },
    )
    .await?;

    tx.commit().await.map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "quick_add",
        op = "quick_add",
        customer_id = %customer.id,
        customer_created = customer.created,
        site_id = %site_id,
        job_id = %job_id,
        "Quick-add committed"
    );

    Ok(QuickAddOutcome {
        customer,
        site_id,
        job_id,
    })
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
