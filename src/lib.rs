// GGCU Revenue Reports - Core Library
// Exposes all modules for use in the CLI, API server, and tests

pub mod db;
pub mod reports;
pub mod settings;

// Re-export commonly used types
pub use db::{
    insert_bill, insert_bill_item, insert_payment, insert_utility, list_utilities, open_read_only,
    payment_count, seed_demo_data, setup_database, Bill, BillItem, Payment, Utility,
};
pub use reports::{
    parse_date_param, revenue_report, run_report, DateRange, ReportError, ReportKind,
    ReportResponse, RevenueRow,
};
pub use settings::{ClientSettings, Theme};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
