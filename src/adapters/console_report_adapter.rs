//! Plain-text report adapter implementing ReportPort.

use std::fmt::Write as _;

use crate::domain::decision::Decision;
use crate::domain::engine::CycleReport;
use crate::domain::portfolio::{ParkingInstruction, PortfolioRecommendation};
use crate::domain::strategy::Action;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct ConsoleReportAdapter;

impl ConsoleReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn render_decision(out: &mut String, d: &Decision) {
    let s = &d.snapshot;
    let _ = writeln!(out, "\n== {} ({}) ==", d.name, d.code);
    let _ = writeln!(out, "  Close:    {:.2} on {}", s.latest_close, s.date);
    let _ = writeln!(out, "  Metric:   {}", s.deviation);
    if let Some(slope) = s.slope {
        let _ = writeln!(out, "  Slope:    {:+.4}", slope);
    }
    let _ = writeln!(
        out,
        "  Long MA:  {:.2} ({})",
        s.long_ma,
        if s.trend_up { "rising" } else { "flat/falling" }
    );
    let _ = writeln!(out, "  Holding:  {}", if d.holding { "yes" } else { "no" });
    match (d.action, d.regime) {
        (Action::EnterLong, Some(regime)) => {
            let _ = writeln!(out, "  Action:   {} [{}]", d.action, regime);
        }
        _ => {
            let _ = writeln!(out, "  Action:   {}", d.action);
        }
    }
    let _ = writeln!(out, "  Reason:   {}", d.reason);
}

fn render_plan(out: &mut String, report: &CycleReport) {
    let rec: &PortfolioRecommendation = &report.recommendation;
    let _ = writeln!(out, "\n== Portfolio Plan ==");

    if rec.sells.is_empty() {
        let _ = writeln!(out, "  Sell:  none");
    } else {
        let _ = writeln!(out, "  Sell:  {}", rec.sells.join(", "));
    }

    if rec.buys.is_empty() {
        let _ = writeln!(out, "  Buy:   none");
    } else {
        let buys: Vec<String> = rec
            .buys
            .iter()
            .map(|b| format!("{} {:.1}%", b.code, b.weight * 100.0))
            .collect();
        let _ = writeln!(out, "  Buy:   {}", buys.join(", "));
    }

    match &rec.parking {
        ParkingInstruction::AllocateToParkingAsset { code } => {
            let _ = writeln!(out, "  Cash:  park idle cash in {} (trend rising)", code);
        }
        ParkingInstruction::HoldCash => match &report.parking {
            Some(p) => {
                let _ = writeln!(out, "  Cash:  hold cash ({} trend not rising)", p.code);
            }
            None => {
                let _ = writeln!(out, "  Cash:  hold cash");
            }
        },
    }
}

impl ReportPort for ConsoleReportAdapter {
    fn render(&self, report: &CycleReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "dualsignal report for {}", report.as_of);

        for decision in &report.decisions {
            render_decision(&mut out, decision);
        }

        if !report.unavailable.is_empty() {
            let _ = writeln!(out, "\n== Data Unavailable ==");
            for u in &report.unavailable {
                let _ = writeln!(out, "  {} ({}): {}", u.name, u.code, u.reason);
            }
        }

        render_plan(&mut out, report);
        out
    }
}
