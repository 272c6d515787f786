//! Per index health from the `_cat/indices` table

use log::warn;

use netprobe_plugins::http::Fetch;
use netprobe_plugins::{PerfData, Report, Status};

pub(crate) const CAT_PATH: &str = "/_cat/indices?h=health,status,index";

#[derive(Debug, PartialEq)]
pub(crate) struct IndexRow {
    pub health: String,
    pub name: String,
}

/// Parse the `health status index` table, leaving out closed indices
///
/// Closed indices have no health, so their rows only have two columns.
pub(crate) fn parse_table(body: &str) -> Vec<IndexRow> {
    let mut rows = Vec::new();
    for line in body.lines() {
        let fields = line.split_whitespace().collect::<Vec<_>>();
        match fields[..] {
            [] => {}
            [health, "open", name] => rows.push(IndexRow {
                health: health.to_owned(),
                name: name.to_owned(),
            }),
            [_, "close", _] | ["close", _] => {}
            _ => warn!("ignoring unexpected _cat/indices line: {}", line),
        }
    }
    rows
}

#[derive(Debug, Default, PartialEq)]
struct Counts {
    green: usize,
    yellow: usize,
    red: usize,
}

pub(crate) fn report(rows: &[IndexRow], warning: f64, critical: f64) -> Report {
    if rows.is_empty() {
        return Report::unknown("No open index found");
    }
    let mut counts = Counts::default();
    let mut report = Report::new();
    for row in rows {
        match row.health.as_str() {
            "green" => counts.green += 1,
            "yellow" => {
                counts.yellow += 1;
                report.detail(format!("index {} is yellow", row.name));
            }
            "red" => {
                counts.red += 1;
                report.detail(format!("index {} is red", row.name));
            }
            other => {
                report.escalate(Status::Unknown);
                report.detail(format!("index {} has unknown health '{}'", row.name, other));
            }
        }
    }
    report.add(
        Status::Ok,
        format!(
            "{} indices: {} green, {} yellow, {} red",
            rows.len(),
            counts.green,
            counts.yellow,
            counts.red
        ),
    );
    if counts.yellow as f64 > warning {
        report.escalate(Status::Warning);
    }
    if counts.red as f64 > critical {
        report.escalate(Status::Critical);
    }
    report.perf(PerfData::new("green", counts.green as f64));
    report.perf(PerfData::new("yellow", counts.yellow as f64).limits(warning, None));
    report.perf(PerfData::new("red", counts.red as f64).limits(None, critical));
    report
}

pub(crate) fn check<F: Fetch + ?Sized>(fetch: &F, warning: f64, critical: f64) -> Report {
    match fetch.get_text(CAT_PATH) {
        Ok(body) => report(&parse_table(&body), warning, critical),
        Err(e) => Report::unknown(format!(
            "Unable to request URL {} ({})",
            fetch.url_for(CAT_PATH),
            e.short_display()
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TABLE: &str = "\
green  open  logs-2024.01.01
yellow open  logs-2024.01.02
red    open  metrics
       close archive-2019
green  close archive-2020
";

    fn rows() -> Vec<IndexRow> {
        parse_table(TABLE)
    }

    #[test]
    fn closed_indices_are_skipped() {
        let names = rows().into_iter().map(|r| r.name).collect::<Vec<_>>();
        assert_eq!(names, vec!["logs-2024.01.01", "logs-2024.01.02", "metrics"]);
    }

    #[test]
    fn red_index_is_critical() {
        let report = report(&rows(), 0.0, 0.0);
        assert_eq!(report.status(), Status::Critical);
        assert_eq!(
            report.render(true),
            "CRITICAL: 3 indices: 1 green, 1 yellow, 1 red \
             | 'green'=1;;;; 'yellow'=1;0;;; 'red'=1;;0;;\n\
             index logs-2024.01.02 is yellow\n\
             index metrics is red"
        );
    }

    #[test]
    fn counts_below_thresholds() {
        assert_eq!(report(&rows(), 0.0, 1.0).status(), Status::Warning);
        assert_eq!(report(&rows(), 1.0, 1.0).status(), Status::Ok);
    }

    #[test]
    fn empty_table() {
        assert_eq!(report(&parse_table("\n"), 0.0, 0.0).status(), Status::Unknown);
    }
}
