//! Chassis health: power supplies, temperature sensors and fans

use itertools::Itertools;
use log::warn;

use netprobe_plugins::snmp::{Oid, SnmpClient, SnmpError, Varbind};
use netprobe_plugins::threshold::{self, Threshold};
use netprobe_plugins::{PerfData, Report, Status};

use crate::CheckError;

/// sysChassisPowerSupplyStatus
const PSU_STATUS: &str = ".1.3.6.1.4.1.3375.2.1.3.2.2.2.1.2";
/// sysChassisTempTemperature
const TEMPERATURE: &str = ".1.3.6.1.4.1.3375.2.1.3.2.3.2.1.2";
/// sysChassisFanStatus
const FAN_STATUS: &str = ".1.3.6.1.4.1.3375.2.1.3.2.1.2.1.2";

/// failed PSUs, degrees celsius, failed fans
pub(crate) const DEFAULT_WARN: [f64; 3] = [0.0, 40.0, 0.0];
pub(crate) const DEFAULT_CRIT: [f64; 3] = [1.0, 50.0, 1.0];

/// What to do about a unit that the chassis reports as not present
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MissingPolicy {
    Critical,
    Warning,
    Ignore,
}

impl MissingPolicy {
    fn status(self) -> Option<Status> {
        match self {
            MissingPolicy::Critical => Some(Status::Critical),
            MissingPolicy::Warning => Some(Status::Warning),
            MissingPolicy::Ignore => None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) struct HealthFlags {
    pub psu: MissingPolicy,
    pub fan: MissingPolicy,
}

impl HealthFlags {
    /// Parse the `--arg1` flags, e.g. `ignoremissingpsu,warnmissingfan`
    pub fn parse(raw: Option<&str>) -> HealthFlags {
        let mut flags = HealthFlags {
            psu: MissingPolicy::Critical,
            fan: MissingPolicy::Critical,
        };
        let raw = raw.unwrap_or("").to_lowercase();
        for flag in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match flag {
                "ignoremissingpsu" => flags.psu = MissingPolicy::Ignore,
                "warnmissingpsu" => flags.psu = MissingPolicy::Warning,
                "ignoremissingfan" => flags.fan = MissingPolicy::Ignore,
                "warnmissingfan" => flags.fan = MissingPolicy::Warning,
                other => warn!("ignoring unknown health flag '{}'", other),
            }
        }
        flags
    }
}

/// PSUs and fans report bad(0), good(1) or notPresent(2)
#[derive(Debug, Default, PartialEq)]
struct UnitCount {
    good: usize,
    bad: usize,
    missing: usize,
}

fn count_units(walked: &[Varbind]) -> UnitCount {
    let mut count = UnitCount::default();
    for varbind in walked {
        match varbind.value.as_i64() {
            Some(0) => count.bad += 1,
            Some(1) => count.good += 1,
            _ => count.missing += 1,
        }
    }
    count
}

fn units_section(
    report: &mut Report,
    unit: &str,
    walked: Result<Vec<Varbind>, SnmpError>,
    threshold: &Threshold,
    missing_policy: MissingPolicy,
) {
    let walked = match walked {
        Ok(ref walked) if walked.is_empty() => {
            report.add(
                Status::Unknown,
                format!("Unable to retrieve {} information", unit),
            );
            return;
        }
        Ok(walked) => walked,
        Err(e) => {
            warn!("{} walk failed: {}", unit, e);
            report.add(
                Status::Unknown,
                format!(
                    "Unable to retrieve {} information ({})",
                    unit,
                    e.short_display()
                ),
            );
            return;
        }
    };

    let count = count_units(&walked);
    if count.missing > 0 {
        if let Some(status) = missing_policy.status() {
            report.add(status, format!("{} {} missing", count.missing, unit));
        }
    }
    let status = threshold.classify(count.bad as f64);
    if count.bad > 0 {
        report.add(status, format!("{} {} failed", count.bad, unit));
    } else {
        report.add(status, format!("{} {} OK", count.good, unit));
    }
    report.perf(
        PerfData::new(format!("{}_failed", unit.to_lowercase()), count.bad as f64)
            .thresholds(threshold),
    );
}

fn temperature_section(
    report: &mut Report,
    walked: Result<Vec<Varbind>, SnmpError>,
    threshold: &Threshold,
) {
    let temperatures = match walked {
        Ok(walked) => walked
            .iter()
            .filter_map(|varbind| varbind.value.as_f64())
            .collect::<Vec<_>>(),
        Err(e) => {
            warn!("temperature walk failed: {}", e);
            Vec::new()
        }
    };
    if temperatures.is_empty() {
        report.add(
            Status::Unknown,
            "Failed to retrieve chassis temperature sensors",
        );
        return;
    }

    let mut status = Status::Ok;
    for (i, temp) in temperatures.iter().enumerate() {
        status = status.escalate(threshold.classify(*temp));
        report.perf(PerfData::new(format!("temp_{}", i + 1), *temp).thresholds(threshold));
    }
    let sensors = temperatures
        .iter()
        .enumerate()
        .map(|(i, temp)| format!("sensor {}: {}°C", i + 1, temp))
        .join(", ");
    report.add(status, format!("temperatures {} ({})", status, sensors));
}

pub(crate) fn check<S: SnmpClient + ?Sized>(
    snmp: &mut S,
    warning: Option<&str>,
    critical: Option<&str>,
    flags: &HealthFlags,
) -> Result<Report, CheckError> {
    let thresholds = threshold::pairs(warning, critical, &DEFAULT_WARN, &DEFAULT_CRIT)?;
    let mut report = Report::new();

    let psu = snmp.walk(&PSU_STATUS.parse::<Oid>()?);
    units_section(&mut report, "PSU", psu, &thresholds[0], flags.psu);

    let temps = snmp.walk(&TEMPERATURE.parse::<Oid>()?);
    temperature_section(&mut report, temps, &thresholds[1]);

    let fans = snmp.walk(&FAN_STATUS.parse::<Oid>()?);
    units_section(&mut report, "fan", fans, &thresholds[2], flags.fan);

    Ok(report)
}
