// Revenue Reporting Query Contract
//
// One operation: revenue per utility over an optional inclusive date range,
// sorted descending. Pure read; the caller owns connection scope.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// REPORT KINDS
// ============================================================================

/// Supported report keys. Only one exists; anything else is `UnknownReport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Revenue,
}

impl ReportKind {
    pub fn parse(key: &str) -> Result<Self, ReportError> {
        match key {
            "revenue" => Ok(ReportKind::Revenue),
            other => Err(ReportError::UnknownReport(other.to_string())),
        }
    }
}

// ============================================================================
// ERROR TAXONOMY
// ============================================================================

/// Failures of the reporting contract. All of them are terminal for the
/// request; the boundary surfaces them as `{success:false, error}` and never
/// as a partial result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// Connection could not be established
    DataStoreUnavailable(String),
    /// Statement preparation or execution failure
    QueryError(String),
    /// Unsupported report key
    UnknownReport(String),
    /// Malformed date parameter at the boundary
    InvalidDate(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // These strings are the wire contract; the payload carries detail
        // for server-side logs only.
        match self {
            ReportError::DataStoreUnavailable(_) => write!(f, "DB connection failed"),
            ReportError::QueryError(_) => write!(f, "Query prepare failed"),
            ReportError::UnknownReport(_) => write!(f, "Unknown report"),
            ReportError::InvalidDate(value) => write!(f, "Invalid date: {}", value),
        }
    }
}

impl std::error::Error for ReportError {}

// ============================================================================
// DATE RANGE (both-or-neither policy)
// ============================================================================

/// Inclusive payment-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range from two optional bounds.
    ///
    /// A single bound yields `None` and the query runs unfiltered. That
    /// matches the deployed endpoint, which only filtered when both `start`
    /// and `end` were present; callers relying on one-sided ranges would
    /// silently get totals over all time, so the policy is kept explicit
    /// here rather than changed.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<DateRange> {
        match (start, end) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        }
    }
}

/// Parse an optional ISO-8601 date parameter.
///
/// Empty string means absent (the front-end sends `start=&end=` when the
/// inputs are blank). A non-empty value that is not a valid `YYYY-MM-DD`
/// date is rejected instead of being handed to the SQL layer untyped.
pub fn parse_date_param(raw: &str) -> Result<Option<NaiveDate>, ReportError> {
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ReportError::InvalidDate(raw.to_string()))
}

// ============================================================================
// REVENUE AGGREGATOR
// ============================================================================

/// One row of the revenue report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRow {
    pub utility: String,
    pub revenue: f64,
}

/// Sum payments grouped by utility, optionally bounded to an inclusive
/// payment-date range. Rows come back sorted by revenue descending and are
/// duplicate-free per utility; utilities with no matching payments are
/// absent entirely.
pub fn revenue_report(
    conn: &Connection,
    range: Option<DateRange>,
) -> Result<Vec<RevenueRow>, ReportError> {
    let mut sql = String::from(
        "SELECT u.name AS utility, SUM(p.amount) AS revenue
         FROM payments p
         JOIN bill_items bi ON bi.bill_id = p.bill_id
         JOIN utilities u ON u.id = bi.utility_id",
    );
    if range.is_some() {
        sql.push_str(" WHERE p.payment_date BETWEEN ?1 AND ?2");
    }
    sql.push_str(" GROUP BY u.id ORDER BY revenue DESC");

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ReportError::QueryError(e.to_string()))?;

    let map_row = |row: &rusqlite::Row<'_>| {
        Ok(RevenueRow {
            utility: row.get(0)?,
            revenue: row.get(1)?,
        })
    };

    let rows = match range {
        Some(r) => stmt.query_map(params![r.start.to_string(), r.end.to_string()], map_row),
        None => stmt.query_map([], map_row),
    }
    .map_err(|e| ReportError::QueryError(e.to_string()))?
    .collect::<Result<Vec<_>, _>>()
    .map_err(|e| ReportError::QueryError(e.to_string()))?;

    Ok(rows)
}

/// Dispatch a report by kind. A plain match, not a registry: the system
/// only ever answers "revenue by utility for an optional date range".
pub fn run_report(
    conn: &Connection,
    kind: ReportKind,
    range: Option<DateRange>,
) -> Result<Vec<RevenueRow>, ReportError> {
    match kind {
        ReportKind::Revenue => revenue_report(conn, range),
    }
}

// ============================================================================
// RESPONSE ENVELOPE
// ============================================================================

/// JSON envelope for the reporting endpoint:
/// `{success:true, rows:[...]}` or `{success:false, error:"..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<RevenueRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportResponse {
    pub fn ok(rows: Vec<RevenueRow>) -> Self {
        Self {
            success: true,
            rows: Some(rows),
            error: None,
        }
    }

    pub fn err(error: &ReportError) -> Self {
        Self {
            success: false,
            rows: None,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        insert_bill, insert_bill_item, insert_payment, insert_utility, setup_database,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// One bill per utility; payments attach to the bill.
    fn seed_utility(conn: &Connection, name: &str, payments: &[(f64, NaiveDate)]) {
        let utility = insert_utility(conn, name).unwrap();
        let bill = insert_bill(conn, "Test Customer", date(2024, 1, 1)).unwrap();
        insert_bill_item(conn, bill, utility, &format!("{} usage", name), 0.0).unwrap();

        for (amount, paid_on) in payments {
            insert_payment(conn, bill, *amount, *paid_on).unwrap();
        }
    }

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_revenue_matches_reference_sums() {
        let conn = test_db();
        seed_utility(
            &conn,
            "Water",
            &[
                (42.50, date(2024, 1, 20)),
                (10.00, date(2024, 2, 2)),
                (7.25, date(2024, 3, 14)),
            ],
        );
        seed_utility(
            &conn,
            "Electricity",
            &[(60.00, date(2024, 1, 22)), (60.00, date(2024, 2, 19))],
        );

        let rows = revenue_report(&conn, None).unwrap();

        assert_eq!(rows.len(), 2);
        // Reference sums computed by hand
        assert_eq!(rows[0], RevenueRow { utility: "Electricity".to_string(), revenue: 120.00 });
        assert_eq!(rows[1], RevenueRow { utility: "Water".to_string(), revenue: 59.75 });
    }

    #[test]
    fn test_rows_sorted_by_revenue_descending() {
        let conn = test_db();
        seed_utility(&conn, "Gas", &[(5.0, date(2024, 1, 1))]);
        seed_utility(&conn, "Water", &[(50.0, date(2024, 1, 1))]);
        seed_utility(&conn, "Electricity", &[(20.0, date(2024, 1, 1))]);

        let rows = revenue_report(&conn, None).unwrap();
        let revenues: Vec<f64> = rows.iter().map(|r| r.revenue).collect();

        assert_eq!(revenues, vec![50.0, 20.0, 5.0]);
    }

    #[test]
    fn test_zero_payment_utility_excluded() {
        let conn = test_db();
        seed_utility(&conn, "Water", &[(10.0, date(2024, 1, 1))]);
        // Utility with a bill and line item but no payments
        seed_utility(&conn, "Sewage", &[]);

        let rows = revenue_report(&conn, None).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].utility, "Water");
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let conn = test_db();
        seed_utility(
            &conn,
            "Water",
            &[
                (1.0, date(2024, 1, 31)),
                (2.0, date(2024, 2, 1)),
                (4.0, date(2024, 2, 29)),
                (8.0, date(2024, 3, 1)),
            ],
        );

        let range = DateRange::from_bounds(Some(date(2024, 2, 1)), Some(date(2024, 2, 29)));
        let rows = revenue_report(&conn, range).unwrap();

        // Both boundary days are in, both neighbors are out
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].revenue, 6.0);
    }

    #[test]
    fn test_range_with_no_matches_is_empty() {
        let conn = test_db();
        seed_utility(&conn, "Water", &[(10.0, date(2024, 1, 1))]);

        let range = DateRange::from_bounds(Some(date(2025, 1, 1)), Some(date(2025, 12, 31)));
        let rows = revenue_report(&conn, range).unwrap();

        assert!(rows.is_empty());
    }

    #[test]
    fn test_single_bound_same_as_unfiltered() {
        let conn = test_db();
        seed_utility(
            &conn,
            "Water",
            &[(10.0, date(2024, 1, 1)), (20.0, date(2024, 6, 1))],
        );

        // Only start given: both-or-neither policy drops the filter entirely
        let range = DateRange::from_bounds(Some(date(2024, 5, 1)), None);
        assert_eq!(range, None);

        let filtered = revenue_report(&conn, range).unwrap();
        let unfiltered = revenue_report(&conn, None).unwrap();

        assert_eq!(filtered, unfiltered);
        assert_eq!(filtered[0].revenue, 30.0);
    }

    #[test]
    fn test_from_bounds_both_or_neither() {
        let start = Some(date(2024, 1, 1));
        let end = Some(date(2024, 12, 31));

        assert!(DateRange::from_bounds(start, end).is_some());
        assert_eq!(DateRange::from_bounds(start, None), None);
        assert_eq!(DateRange::from_bounds(None, end), None);
        assert_eq!(DateRange::from_bounds(None, None), None);
    }

    #[test]
    fn test_parse_date_param() {
        assert_eq!(parse_date_param("").unwrap(), None);
        assert_eq!(parse_date_param("2024-02-29").unwrap(), Some(date(2024, 2, 29)));

        let err = parse_date_param("02/29/2024").unwrap_err();
        assert_eq!(err, ReportError::InvalidDate("02/29/2024".to_string()));
        assert_eq!(err.to_string(), "Invalid date: 02/29/2024");
    }

    #[test]
    fn test_unknown_report_key() {
        assert_eq!(ReportKind::parse("revenue").unwrap(), ReportKind::Revenue);

        let err = ReportKind::parse("expenses").unwrap_err();
        assert!(matches!(err, ReportError::UnknownReport(_)));
        assert_eq!(err.to_string(), "Unknown report");
    }

    #[test]
    fn test_run_report_dispatch() {
        let conn = test_db();
        seed_utility(&conn, "Water", &[(10.0, date(2024, 1, 1))]);

        let rows = run_report(&conn, ReportKind::Revenue, None).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_query_error_on_missing_schema() {
        // Fresh connection without setup_database: the join targets nothing
        let conn = Connection::open_in_memory().unwrap();

        let err = revenue_report(&conn, None).unwrap_err();
        assert!(matches!(err, ReportError::QueryError(_)));
        assert_eq!(err.to_string(), "Query prepare failed");
    }

    #[test]
    fn test_success_envelope_json() {
        let conn = test_db();
        seed_utility(&conn, "A", &[(60.0, date(2024, 1, 1)), (40.0, date(2024, 1, 2))]);
        seed_utility(&conn, "B", &[(50.0, date(2024, 1, 1))]);

        let rows = revenue_report(&conn, None).unwrap();
        let json = serde_json::to_string(&ReportResponse::ok(rows)).unwrap();

        assert_eq!(
            json,
            r#"{"success":true,"rows":[{"utility":"A","revenue":100.0},{"utility":"B","revenue":50.0}]}"#
        );
    }

    #[test]
    fn test_failure_envelope_json() {
        let err = ReportError::DataStoreUnavailable("unable to open database file".to_string());
        let json = serde_json::to_string(&ReportResponse::err(&err)).unwrap();

        assert_eq!(json, r#"{"success":false,"error":"DB connection failed"}"#);
    }
}
