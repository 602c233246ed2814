//! Report generation port trait.

use crate::domain::engine::CycleReport;
use crate::domain::error::SignalError;
use std::io::Write;

/// Port for presenting the result of one evaluation cycle.
pub trait ReportPort {
    fn render(&self, report: &CycleReport) -> String;

    /// Default implementation: writes the rendered text to `out`.
    fn write(&self, report: &CycleReport, out: &mut dyn Write) -> Result<(), SignalError> {
        out.write_all(self.render(report).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
