//! Local traffic objects: VirtualServers and Nodes

use std::collections::BTreeSet;

use log::debug;
use regex::Regex;

use netprobe_plugins::snmp::{walk_table, Oid, Row, SnmpClient, SnmpValue};
use netprobe_plugins::threshold::{self, Threshold};
use netprobe_plugins::{PerfData, Report, Status, Unit};

use crate::CheckError;

/// ltmVsStatusName, ltmVsStatusAvailState
const VS_STATUS_NAME: &str = ".1.3.6.1.4.1.3375.2.2.10.13.2.1.1";
const VS_STATUS_AVAIL: &str = ".1.3.6.1.4.1.3375.2.2.10.13.2.1.2";
/// ltmVirtualServStat table
const VS_STAT_NAME: &str = ".1.3.6.1.4.1.3375.2.2.10.2.3.1.1";
const VS_STAT_CUR_CONNS: &str = ".1.3.6.1.4.1.3375.2.2.10.2.3.1.12";
const VS_STAT_MAX_CONNS: &str = ".1.3.6.1.4.1.3375.2.2.10.2.3.1.10";
const VS_STAT_TOT_CONNS: &str = ".1.3.6.1.4.1.3375.2.2.10.2.3.1.11";
const VS_STAT_BYTES_IN: &str = ".1.3.6.1.4.1.3375.2.2.10.2.3.1.7";
const VS_STAT_BYTES_OUT: &str = ".1.3.6.1.4.1.3375.2.2.10.2.3.1.9";

const NODE_NAME: &str = ".1.3.6.1.4.1.3375.2.2.5.6.2.1.9";
const NODE_AVAIL: &str = ".1.3.6.1.4.1.3375.2.2.5.6.2.1.5";
const NODE_CUR_CONNS: &str = ".1.3.6.1.4.1.3375.2.2.4.2.3.1.9";
const NODE_MAX_CONNS: &str = ".1.3.6.1.4.1.3375.2.2.4.2.3.1.7";
const NODE_TOT_CONNS: &str = ".1.3.6.1.4.1.3375.2.2.4.2.3.1.8";
const NODE_BYTES_IN: &str = ".1.3.6.1.4.1.3375.2.2.4.2.3.1.4";
const NODE_BYTES_OUT: &str = ".1.3.6.1.4.1.3375.2.2.4.2.3.1.6";

/// active, max and total connections
pub(crate) const DEFAULT_WARN: [f64; 3] = [200_000.0, 200_000.0, 200_000.0];
pub(crate) const DEFAULT_CRIT: [f64; 3] = [250_000.0, 250_000.0, 250_000.0];

/// The AvailabilityStatus textual convention of the F5 MIB
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Availability {
    None,
    Green,
    Yellow,
    Red,
    Blue,
    Gray,
}

impl Availability {
    pub fn from_code(code: i64) -> Option<Availability> {
        match code {
            0 => Some(Availability::None),
            1 => Some(Availability::Green),
            2 => Some(Availability::Yellow),
            3 => Some(Availability::Red),
            4 => Some(Availability::Blue),
            5 => Some(Availability::Gray),
            _ => None,
        }
    }

    fn color(self) -> &'static str {
        match self {
            Availability::None => "none",
            Availability::Green => "green",
            Availability::Yellow => "yellow",
            Availability::Red => "red",
            Availability::Blue => "blue",
            Availability::Gray => "gray",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Availability::None => "error",
            Availability::Green => "available in some capacity",
            Availability::Yellow => "not currently available",
            Availability::Red => "not available",
            Availability::Blue => "availability is unknown",
            Availability::Gray => "unlicensed",
        }
    }

    pub fn status(self) -> Status {
        match self {
            Availability::Green => Status::Ok,
            Availability::Yellow | Availability::Gray => Status::Warning,
            Availability::None | Availability::Red => Status::Critical,
            Availability::Blue => Status::Unknown,
        }
    }
}

/// What we learned about one VirtualServer or Node
#[derive(Debug, PartialEq)]
struct TrafficObject {
    name: String,
    /// The name as found in the statistics table, when it's a separate walk
    stat_name: Option<String>,
    avail: Option<i64>,
    active: Option<f64>,
    max: Option<f64>,
    total: Option<f64>,
    bytes_in: Option<f64>,
    bytes_out: Option<f64>,
}

fn parse_oids(oids: &[&str]) -> Result<Vec<Oid>, CheckError> {
    oids.iter()
        .map(|oid| oid.parse::<Oid>().map_err(CheckError::from))
        .collect()
}

fn text(cell: &Option<SnmpValue>) -> Option<String> {
    cell.as_ref().map(SnmpValue::text)
}

fn integer(cell: &Option<SnmpValue>) -> Option<i64> {
    cell.as_ref().and_then(SnmpValue::as_i64)
}

fn count(cell: &Option<SnmpValue>) -> Option<f64> {
    cell.as_ref().and_then(SnmpValue::as_f64)
}

fn virtual_servers(rows: &[Row]) -> Vec<TrafficObject> {
    rows.iter()
        .map(|row| TrafficObject {
            name: text(&row[0]).unwrap_or_default(),
            avail: integer(&row[1]),
            // a missing stats row is reported through its counters
            stat_name: text(&row[2]),
            active: count(&row[3]),
            max: count(&row[4]),
            total: count(&row[5]),
            bytes_in: count(&row[6]),
            bytes_out: count(&row[7]),
        })
        .collect()
}

fn nodes(rows: &[Row]) -> Vec<TrafficObject> {
    rows.iter()
        .map(|row| TrafficObject {
            name: text(&row[0]).unwrap_or_default(),
            avail: integer(&row[1]),
            stat_name: None,
            active: count(&row[2]),
            max: count(&row[3]),
            total: count(&row[4]),
            bytes_in: count(&row[5]),
            bytes_out: count(&row[6]),
        })
        .collect()
}

fn fmt_count(value: Option<f64>) -> String {
    value.map_or_else(|| "?".to_owned(), |v| v.to_string())
}

/// Add one object to the report
///
/// Every object gets a detail line, only the problems make it into the
/// summary.
fn report_object(
    report: &mut Report,
    kind: &str,
    object: &TrafficObject,
    thresholds: &[Threshold],
) {
    if let Some(ref stat_name) = object.stat_name {
        if *stat_name != object.name {
            report.add(
                Status::Unknown,
                format!(
                    "{} OID names mismatch: {} != {}",
                    kind, object.name, stat_name
                ),
            );
        }
    }

    let avail_text = match object.avail.and_then(Availability::from_code) {
        Some(avail) => {
            let text = format!("status {} ({})", avail.color(), avail.description());
            if avail.status() != Status::Ok {
                report.add(avail.status(), format!("{} {} {}", kind, object.name, text));
            }
            text
        }
        None => {
            report.add(
                Status::Unknown,
                format!("Failed to retrieve {} {} status information", kind, object.name),
            );
            "status unknown".to_owned()
        }
    };

    let counters = [
        ("active", "cnx_actv", object.active),
        ("max", "cnx_max", object.max),
        ("total", "cnx_total", object.total),
    ];
    for (&(what, label, value), threshold) in counters.iter().zip(thresholds) {
        let value = match value {
            Some(value) => value,
            None => {
                report.add(
                    Status::Unknown,
                    format!("Failed to retrieve {} connections of {}", what, object.name),
                );
                continue;
            }
        };
        let status = threshold.classify(value);
        if status != Status::Ok {
            let limit = if status == Status::Critical {
                threshold.crit
            } else {
                threshold.warn
            };
            report.add(
                status,
                format!(
                    "{} {} has {} {} connections (> {})",
                    kind, object.name, value, what, limit
                ),
            );
        }
        report.perf(PerfData::new(format!("{}_{}", object.name, label), value).thresholds(threshold));
    }
    if let Some(bytes_in) = object.bytes_in {
        report.perf(PerfData::new(format!("{}_bytes_in", object.name), bytes_in).unit(Unit::Counter));
    }
    if let Some(bytes_out) = object.bytes_out {
        report.perf(PerfData::new(format!("{}_bytes_out", object.name), bytes_out).unit(Unit::Counter));
    }

    report.detail(format!(
        "{} {} {} - {} active connections - {} max connections - {} total connections \
         - bytes in: {}, bytes out: {}",
        kind,
        object.name,
        avail_text,
        fmt_count(object.active),
        fmt_count(object.max),
        fmt_count(object.total),
        fmt_count(object.bytes_in),
        fmt_count(object.bytes_out),
    ));
}

fn check_objects(
    kind: &str,
    objects: Vec<TrafficObject>,
    filter: Option<&str>,
    thresholds: &[Threshold],
) -> Result<Report, CheckError> {
    let filter = filter.map(Regex::new).transpose()?;
    if objects.is_empty() {
        return Ok(Report::unknown(format!("Failed to retrieve {} data", kind)));
    }
    let found = objects.len();
    let objects = match filter {
        Some(ref re) => {
            objects
                .into_iter()
                .filter(|object| re.is_match(&object.name))
                .collect::<Vec<_>>()
        }
        None => objects,
    };
    debug!("{} of {} {}s selected", objects.len(), found, kind);
    if objects.is_empty() {
        return Ok(Report::unknown(format!(
            "No {} matching '{}' among {} found",
            kind,
            filter.as_ref().map_or("", Regex::as_str),
            found
        )));
    }

    let mut report = Report::new();
    report.add(Status::Ok, format!("{} {}(s) checked", objects.len(), kind));
    for object in &objects {
        report_object(&mut report, kind, object, thresholds);
    }
    Ok(report)
}

pub(crate) fn vs_stats<S: SnmpClient + ?Sized>(
    snmp: &mut S,
    filter: Option<&str>,
    warning: Option<&str>,
    critical: Option<&str>,
) -> Result<Report, CheckError> {
    let thresholds = threshold::pairs(warning, critical, &DEFAULT_WARN, &DEFAULT_CRIT)?;
    let columns = parse_oids(&[
        VS_STATUS_NAME,
        VS_STATUS_AVAIL,
        VS_STAT_NAME,
        VS_STAT_CUR_CONNS,
        VS_STAT_MAX_CONNS,
        VS_STAT_TOT_CONNS,
        VS_STAT_BYTES_IN,
        VS_STAT_BYTES_OUT,
    ])?;
    let rows = walk_table(snmp, &columns)?;
    check_objects("VirtualServer", virtual_servers(&rows), filter, &thresholds)
}

pub(crate) fn node_stats<S: SnmpClient + ?Sized>(
    snmp: &mut S,
    filter: Option<&str>,
    warning: Option<&str>,
    critical: Option<&str>,
) -> Result<Report, CheckError> {
    let thresholds = threshold::pairs(warning, critical, &DEFAULT_WARN, &DEFAULT_CRIT)?;
    let columns = parse_oids(&[
        NODE_NAME,
        NODE_AVAIL,
        NODE_CUR_CONNS,
        NODE_MAX_CONNS,
        NODE_TOT_CONNS,
        NODE_BYTES_IN,
        NODE_BYTES_OUT,
    ])?;
    let rows = walk_table(snmp, &columns)?;
    check_objects("Node", nodes(&rows), filter, &thresholds)
}

/// List every VirtualServer name known to either table
pub(crate) fn enum_virtual_servers<S: SnmpClient + ?Sized>(
    snmp: &mut S,
) -> Result<Report, CheckError> {
    let mut names = BTreeSet::new();
    for column in parse_oids(&[VS_STATUS_NAME, VS_STAT_NAME])? {
        names.extend(snmp.walk(&column)?.into_iter().map(|vb| vb.value.text()));
    }
    if names.is_empty() {
        return Ok(Report::unknown("Unable to retrieve VirtualServer information"));
    }
    let mut report = Report::new();
    report.add(
        Status::Ok,
        format!("F5 VirtualServers list ({} found)", names.len()),
    );
    for name in names {
        report.detail(format!("  {}", name));
    }
    Ok(report)
}
