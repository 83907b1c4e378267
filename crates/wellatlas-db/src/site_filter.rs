//! Site search predicate builder.
//!
//! Translates a [`SiteFilter`] into one parameterized WHERE clause over
//! `site s JOIN customer c`. User input only ever reaches the database as a
//! bound parameter; the clause text is assembled from fixed templates.

use std::collections::BTreeSet;

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use uuid::Uuid;

use wellatlas_core::{RecordState, SiteFilter, SiteOrder};

use crate::escape_like;

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// Text parameter.
    String(String),
    /// Single UUID parameter.
    Uuid(Uuid),
}

/// Bind parameters onto a query in the order they appear in the SQL.
pub fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [QueryParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            QueryParam::String(s) => query.bind(s),
            QueryParam::Uuid(id) => query.bind(*id),
        };
    }
    query
}

/// Accumulates independent predicates and folds them into one conjunction.
///
/// Each predicate template names its own parameters `{0}`, `{1}`, ... which
/// are renumbered to positional `$n` placeholders as predicates are added.
#[derive(Debug, Clone)]
pub struct PredicateSet {
    clauses: Vec<String>,
    params: Vec<QueryParam>,
    param_offset: usize,
}

impl PredicateSet {
    /// Create an empty set.
    ///
    /// * `param_offset` - number of parameters already bound ahead of this clause
    pub fn new(param_offset: usize) -> Self {
        Self {
            clauses: Vec::new(),
            params: Vec::new(),
            param_offset,
        }
    }

    /// Add a predicate whose `{i}` markers refer to `params[i]`.
    pub fn add(&mut self, predicate: &str, params: Vec<QueryParam>) -> &mut Self {
        let base = self.param_offset + self.params.len();
        let mut clause = predicate.to_string();
        // Highest index first so `{1}` never rewrites part of `{10}`.
        for i in (0..params.len()).rev() {
            clause = clause.replace(&format!("{{{}}}", i), &format!("${}", base + i + 1));
        }
        self.clauses.push(clause);
        self.params.extend(params);
        self
    }

    /// Number of predicates added so far.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Fold into `(where_clause, params)`. An empty set yields `TRUE`.
    pub fn build(self) -> (String, Vec<QueryParam>) {
        let sql = if self.clauses.is_empty() {
            "TRUE".to_string()
        } else {
            self.clauses.join(" AND ")
        };
        (sql, self.params)
    }
}

/// Relations a built predicate reaches beyond `site s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SiteJoin {
    /// `customer c` (inner join, one row per site).
    Customer,
    /// `job j` via semi-join, never multiplying site rows.
    Job,
    /// `job_note jn` via semi-join under `job j`.
    JobNote,
}

/// Result of building a site filter query.
#[derive(Debug, Clone)]
pub struct SiteFilterResult {
    /// The WHERE clause fragment (without "WHERE" keyword).
    pub where_clause: String,
    /// Query parameters in the order they appear in the SQL.
    pub params: Vec<QueryParam>,
    /// Relations the clause needs beyond the site row.
    pub joins: BTreeSet<SiteJoin>,
    /// Number of caller-supplied criteria that produced a clause.
    pub active_predicates: usize,
}

/// Generates the WHERE clause for a site search.
///
/// # Example
///
/// ```rust,ignore
/// use wellatlas_core::SiteFilter;
/// use wellatlas_db::site_filter::SiteFilterQueryBuilder;
///
/// let filter = SiteFilter::new(None, Some("Ag"), Some("Kennedy HydroTech"));
/// let result = SiteFilterQueryBuilder::new(filter, 0).build();
/// // result.where_clause:
/// //   "s.state = 'active' AND c.name = $1 AND EXISTS (SELECT 1 FROM job j ...$2)"
/// // result.params: [String("Kennedy HydroTech"), String("Ag")]
/// ```
pub struct SiteFilterQueryBuilder {
    filter: SiteFilter,
    param_offset: usize,
}

impl SiteFilterQueryBuilder {
    /// Create a new builder for the given filter.
    ///
    /// * `filter` - the normalized site filter
    /// * `param_offset` - number of parameters already in the query
    pub fn new(filter: SiteFilter, param_offset: usize) -> Self {
        Self {
            filter,
            param_offset,
        }
    }

    pub fn build(&self) -> SiteFilterResult {
        let mut predicates = PredicateSet::new(self.param_offset);
        let mut joins = BTreeSet::new();

        // Soft-deleted sites never match, whatever else was asked for.
        predicates.add(&active_clause("s"), vec![]);

        if let Some(customer) = &self.filter.customer {
            joins.insert(SiteJoin::Customer);
            predicates.add("c.name = {0}", vec![QueryParam::String(customer.clone())]);
        }

        if let Some(category) = &self.filter.job {
            joins.insert(SiteJoin::Job);
            predicates.add(
                &format!(
                    "EXISTS (SELECT 1 FROM job j WHERE j.site_id = s.id AND {} AND j.job_category = {{0}})",
                    active_clause("j")
                ),
                vec![QueryParam::String(category.clone())],
            );
        }

        if let Some(term) = &self.filter.q {
            joins.extend([SiteJoin::Customer, SiteJoin::Job, SiteJoin::JobNote]);
            let pattern = format!("%{}%", escape_like(term));
            // Every job under the site counts here, soft-deleted ones included.
            predicates.add(
                r"(c.name ILIKE {0} ESCAPE '\' OR s.name ILIKE {0} ESCAPE '\' OR s.description ILIKE {0} ESCAPE '\' OR EXISTS (SELECT 1 FROM job j WHERE j.site_id = s.id AND (j.job_number ILIKE {0} ESCAPE '\' OR j.description ILIKE {0} ESCAPE '\' OR EXISTS (SELECT 1 FROM job_note jn WHERE jn.job_id = j.id AND jn.body ILIKE {0} ESCAPE '\'))))",
                vec![QueryParam::String(pattern)],
            );
        }

        let active_predicates = predicates.len() - 1;
        let (where_clause, params) = predicates.build();

        SiteFilterResult {
            where_clause,
            params,
            joins,
            active_predicates,
        }
    }
}

/// `ORDER BY` body for a site listing, with an id tie-break for stability.
pub fn order_clause(order: SiteOrder) -> &'static str {
    match order {
        SiteOrder::CustomerName => "c.name ASC, s.name ASC, s.id ASC",
        SiteOrder::NewestFirst => "s.created_at DESC, s.id DESC",
    }
}

/// Predicate restricting a soft-deletable table alias to active rows.
pub(crate) fn active_clause(alias: &str) -> String {
    format!("{}.state = '{}'", alias, RecordState::Active.as_str())
}
