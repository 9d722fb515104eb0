pub mod excel;
pub mod letters;

pub use excel::{build_row, write_report, ReportRow};
pub use letters::generate_letters;
