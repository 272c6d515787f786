//! Compose the output of a check
//!
//! A check is usually made of a few independent sections (PSUs, fans,
//! temperatures...). Each section adds its status and a fragment of the summary
//! to the `Report`, which renders them into the single line that monitoring
//! systems read:
//!
//! ```plain
//! CRITICAL: 1 PSU missing - temperatures OK (sensor 1: 31°C) - 4 fan OK | 'temp_1'=31;40;50;;
//! ```
//!
//! followed by any detail lines. Sections are combined with `Status::escalate`
//! and perfdata is rendered by `perfdata::render`, the rest is long output
//! that `nagiosplugin::Resource` has no room for.

use itertools::Itertools;

use crate::perfdata;
use crate::{PerfData, Status};

#[derive(Debug, Default)]
pub struct Report {
    status: Status,
    summary: Vec<String>,
    details: Vec<String>,
    perfdata: Vec<PerfData>,
}

impl Report {
    pub fn new() -> Report {
        Report::default()
    }

    /// A report for a check that couldn't even get started
    pub fn unknown<S: Into<String>>(msg: S) -> Report {
        let mut report = Report::new();
        report.add(Status::Unknown, msg);
        report
    }

    /// Record the outcome of one section
    pub fn add<S: Into<String>>(&mut self, status: Status, msg: S) {
        self.status = self.status.escalate(status);
        self.summary.push(msg.into());
    }

    /// Escalate without adding anything to the summary
    pub fn escalate(&mut self, status: Status) {
        self.status = self.status.escalate(status);
    }

    /// A line of long output, printed after the status line
    pub fn detail<S: Into<String>>(&mut self, line: S) {
        self.details.push(line.into());
    }

    pub fn perf(&mut self, perf: PerfData) {
        self.perfdata.push(perf);
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn render(&self, with_perfdata: bool) -> String {
        let mut out = format!("{}: {}", self.status, self.summary.iter().join(" - "));
        if with_perfdata && !self.perfdata.is_empty() {
            out.push_str(" | ");
            out.push_str(&perfdata::render(&self.perfdata));
        }
        for line in &self.details {
            out.push('\n');
            out.push_str(line);
        }
        out
    }

    pub fn print_and_exit(self, with_perfdata: bool) -> ! {
        println!("{}", self.render(with_perfdata));
        self.status.exit()
    }
}

#[cfg(test)]
mod test {
    use super::Report;
    use crate::{PerfData, Status};

    #[test]
    fn sections_are_joined() {
        let mut report = Report::new();
        report.add(Status::Ok, "2 PSU OK");
        report.add(Status::Warning, "temperatures WARNING (sensor 1: 45°C)");
        report.add(Status::Ok, "4 fan OK");
        assert_eq!(report.status(), Status::Warning);
        assert_eq!(
            report.render(false),
            "WARNING: 2 PSU OK - temperatures WARNING (sensor 1: 45°C) - 4 fan OK"
        );
    }

    #[test]
    fn perfdata_only_when_asked() {
        let mut report = Report::new();
        report.add(Status::Ok, "global HTTP requests: 3");
        report.perf(PerfData::new("http_req", 3.0));
        assert_eq!(report.render(false), "OK: global HTTP requests: 3");
        assert_eq!(
            report.render(true),
            "OK: global HTTP requests: 3 | 'http_req'=3;;;;"
        );
    }

    #[test]
    fn details_follow_the_status_line() {
        let mut report = Report::new();
        report.add(Status::Ok, "F5 VirtualServers list");
        report.detail("  /Common/a");
        report.detail("  /Common/b");
        assert_eq!(
            report.render(true),
            "OK: F5 VirtualServers list\n  /Common/a\n  /Common/b"
        );
    }

    #[test]
    fn unknown_is_not_hidden_by_ok_sections() {
        let mut report = Report::unknown("Unable to retrieve PSU information");
        report.add(Status::Ok, "4 fan OK");
        assert_eq!(report.status(), Status::Unknown);
    }
}
