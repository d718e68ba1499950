//! Report output port trait.

use crate::domain::batch::BatchReport;
use crate::domain::error::ScanError;
use crate::domain::fundamentals::FundamentalsResult;

/// Port for writing computed result records.
///
/// `output_path` of `None` means the adapter's default sink.
pub trait ReportPort {
    fn write_scan(&self, report: &BatchReport, output_path: Option<&str>) -> Result<(), ScanError>;

    fn write_fundamentals(
        &self,
        rows: &[FundamentalsResult],
        output_path: Option<&str>,
    ) -> Result<(), ScanError>;
}
