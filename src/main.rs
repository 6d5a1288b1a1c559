use anyhow::{bail, Result};
use rusqlite::Connection;
use std::env;
use std::path::Path;

use ggcu_reports::{
    open_read_only, parse_date_param, payment_count, revenue_report, seed_demo_data,
    setup_database, DateRange,
};

const DEFAULT_DB_PATH: &str = "ggcu.db";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("seed") => run_seed(args.get(2).map(String::as_str).unwrap_or(DEFAULT_DB_PATH)),
        Some("report") => run_report_cmd(&args[2..]),
        _ => {
            eprintln!("GGCU Revenue Reports v{}", ggcu_reports::VERSION);
            eprintln!();
            eprintln!("Usage:");
            eprintln!("  ggcu-reports seed [db-path]");
            eprintln!("  ggcu-reports report [db-path] [start end]   (dates as YYYY-MM-DD)");
            std::process::exit(2);
        }
    }
}

fn run_seed(db_path: &str) -> Result<()> {
    println!("🗄️  Seeding demo billing data → {}", db_path);

    let conn = Connection::open(db_path)?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");

    let payments = seed_demo_data(&conn)?;
    println!("✓ Inserted {} payments", payments);

    let count = payment_count(&conn)?;
    println!("✓ Database contains {} payments", count);

    Ok(())
}

fn run_report_cmd(args: &[String]) -> Result<()> {
    let db_path = args.first().map(String::as_str).unwrap_or(DEFAULT_DB_PATH);

    if !Path::new(db_path).exists() {
        eprintln!("❌ Database not found at {}", db_path);
        eprintln!("   Run: ggcu-reports seed {}", db_path);
        std::process::exit(1);
    }

    // Both-or-neither: a lone bound means an unfiltered report
    let range = match args.get(1) {
        Some(start) => {
            let Some(end) = args.get(2) else {
                bail!("report takes either no dates or both start and end");
            };
            DateRange::from_bounds(parse_date_param(start)?, parse_date_param(end)?)
        }
        None => None,
    };

    let conn = open_read_only(Path::new(db_path))?;
    let rows = revenue_report(&conn, range)?;

    if rows.is_empty() {
        println!("No results for selected period.");
        return Ok(());
    }

    println!("{:<24} {:>12}", "Utility", "Revenue");
    println!("{}", "─".repeat(37));
    for row in &rows {
        println!("{:<24} {:>12.2}", row.utility, row.revenue);
    }

    Ok(())
}
