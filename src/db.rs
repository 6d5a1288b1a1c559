use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::reports::ReportError;

// ============================================================================
// ENTITIES (externally-owned billing schema, read-only for reporting)
// ============================================================================

/// A category of billed service (water, electricity, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utility {
    pub id: i64,
    pub name: String,
}

/// A billing record grouping one or more line items for a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    pub customer: String,
    pub issued_date: NaiveDate,
}

/// A line item on a bill, attributable to a specific utility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillItem {
    pub id: i64,
    pub bill_id: i64,
    pub utility_id: i64,
    pub description: String,
    pub amount: f64,
}

/// A recorded payment against a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub bill_id: i64,
    pub amount: f64,
    pub payment_date: NaiveDate,
}

// ============================================================================
// SCHEMA SETUP
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS utilities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS bills (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer TEXT NOT NULL,
            issued_date TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS bill_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bill_id INTEGER NOT NULL REFERENCES bills(id),
            utility_id INTEGER NOT NULL REFERENCES utilities(id),
            description TEXT NOT NULL,
            amount REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bill_id INTEGER NOT NULL REFERENCES bills(id),
            amount REAL NOT NULL,
            payment_date TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes (everything the revenue join touches)
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bill_items_bill ON bill_items(bill_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bill_items_utility ON bill_items(utility_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payments_bill ON payments(bill_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payments_date ON payments(payment_date)",
        [],
    )?;

    Ok(())
}

/// Open the database for reporting.
///
/// The reporting path never writes, so the connection is opened read-only and
/// scoped to a single invocation; it is released when dropped, on success or
/// failure. A missing or unopenable file maps to `DataStoreUnavailable`.
pub fn open_read_only(path: &Path) -> Result<Connection, ReportError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| ReportError::DataStoreUnavailable(e.to_string()))?;

    // Bounded wait if a writer holds the database
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|e| ReportError::DataStoreUnavailable(e.to_string()))?;

    Ok(conn)
}

// ============================================================================
// INSERT HELPERS (used by the seed command and tests)
// ============================================================================

pub fn insert_utility(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO utilities (name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_bill(conn: &Connection, customer: &str, issued_date: NaiveDate) -> Result<i64> {
    conn.execute(
        "INSERT INTO bills (customer, issued_date) VALUES (?1, ?2)",
        params![customer, issued_date.to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_bill_item(
    conn: &Connection,
    bill_id: i64,
    utility_id: i64,
    description: &str,
    amount: f64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO bill_items (bill_id, utility_id, description, amount)
         VALUES (?1, ?2, ?3, ?4)",
        params![bill_id, utility_id, description, amount],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_payment(
    conn: &Connection,
    bill_id: i64,
    amount: f64,
    payment_date: NaiveDate,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO payments (bill_id, amount, payment_date) VALUES (?1, ?2, ?3)",
        params![bill_id, amount, payment_date.to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn payment_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM payments", [], |row| row.get(0))?;

    Ok(count)
}

pub fn list_utilities(conn: &Connection) -> Result<Vec<Utility>> {
    let mut stmt = conn.prepare("SELECT id, name FROM utilities ORDER BY name")?;

    let utilities = stmt
        .query_map([], |row| {
            Ok(Utility {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(utilities)
}

// ============================================================================
// DEMO SEEDER
// ============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Populate a fresh database with a small demo dataset.
///
/// Each bill carries line items for a single utility, so every payment is
/// attributable to exactly one utility through the bill_items join.
pub fn seed_demo_data(conn: &Connection) -> Result<usize> {
    let water = insert_utility(conn, "Water")?;
    let electricity = insert_utility(conn, "Electricity")?;
    let gas = insert_utility(conn, "Gas")?;
    // Sewage has no payments on purpose: it must never show up in revenue
    insert_utility(conn, "Sewage")?;

    let mut payments = 0;

    let b1 = insert_bill(conn, "A. Perera", date(2024, 1, 5))?;
    insert_bill_item(conn, b1, water, "Water usage Jan", 42.50)?;
    insert_payment(conn, b1, 42.50, date(2024, 1, 20))?;
    payments += 1;

    let b2 = insert_bill(conn, "A. Perera", date(2024, 1, 5))?;
    insert_bill_item(conn, b2, electricity, "Electricity usage Jan", 120.00)?;
    insert_payment(conn, b2, 60.00, date(2024, 1, 22))?;
    insert_payment(conn, b2, 60.00, date(2024, 2, 19))?;
    payments += 2;

    let b3 = insert_bill(conn, "S. Fernando", date(2024, 2, 3))?;
    insert_bill_item(conn, b3, gas, "Gas cylinder refill", 35.75)?;
    insert_payment(conn, b3, 35.75, date(2024, 2, 10))?;
    payments += 1;

    let b4 = insert_bill(conn, "S. Fernando", date(2024, 2, 3))?;
    insert_bill_item(conn, b4, electricity, "Electricity usage Feb", 98.25)?;
    insert_payment(conn, b4, 98.25, date(2024, 3, 1))?;
    payments += 1;

    Ok(payments)
}
