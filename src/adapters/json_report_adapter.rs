//! JSON report adapter implementing ReportPort.
//!
//! Writes result records with serde_json, either to a file (parent
//! directories are created) or to stdout when no path is given.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::domain::batch::BatchReport;
use crate::domain::error::ScanError;
use crate::domain::fundamentals::FundamentalsResult;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, ScanError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.map_err(|e| ScanError::Report {
            reason: e.to_string(),
        })
    }

    fn emit<T: Serialize + ?Sized>(
        &self,
        value: &T,
        output_path: Option<&str>,
    ) -> Result<(), ScanError> {
        let mut json = self.render(value)?;
        json.push('\n');

        match output_path {
            Some(output_path) => {
                let path = Path::new(output_path);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, json)?;
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(json.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_scan(&self, report: &BatchReport, output_path: Option<&str>) -> Result<(), ScanError> {
        self.emit(report, output_path)
    }

    fn write_fundamentals(
        &self,
        rows: &[FundamentalsResult],
        output_path: Option<&str>,
    ) -> Result<(), ScanError> {
        self.emit(rows, output_path)
    }
}
