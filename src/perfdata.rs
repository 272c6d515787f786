//! Performance data, the part of the output after the `|`
//!
//! Nagios and friends graph these values, the format is
//! `'label'=value[UOM];[warn];[crit];[min];[max]`. Rendering is left to the
//! `nagiosplugin` crate so the fields are always laid out the same way.

use std::fmt;

use nagiosplugin::{CheckResult, Resource};
pub use nagiosplugin::Unit;

use crate::Threshold;

#[derive(Debug, Clone)]
pub struct PerfData(nagiosplugin::PerfData<f64>);

impl PerfData {
    pub fn new<S: Into<String>>(label: S, value: f64) -> PerfData {
        // quotes inside a label are escaped by doubling them
        let label = label.into().replace('\'', "''");
        PerfData(nagiosplugin::PerfData::new(label, value))
    }

    pub fn unit(self, unit: Unit) -> PerfData {
        PerfData(self.0.with_unit(unit))
    }

    pub fn thresholds(self, threshold: &Threshold) -> PerfData {
        self.limits(threshold.warn, threshold.crit)
    }

    /// Set warning and critical, either may be left empty
    pub fn limits<W, C>(self, warn: W, crit: C) -> PerfData
    where
        W: Into<Option<f64>>,
        C: Into<Option<f64>>,
    {
        PerfData(self.0.with_thresholds(warn.into(), crit.into()))
    }

    pub fn range(self, min: f64, max: f64) -> PerfData {
        PerfData(self.0.with_minimum(min).with_maximum(max))
    }
}

/// Space separated perfdata, as it goes after the `|` of a status line
pub fn render(perfdata: &[PerfData]) -> String {
    let resource = perfdata.iter().fold(Resource::new(""), |resource, perf| {
        resource.with_result(CheckResult::new().with_perf_data(perf.0.clone()))
    });
    // an unnamed resource renders as " is OK|<perfdata>"
    let (_, output) = resource.nagios_result();
    match output.split_once('|') {
        Some((_, perf)) => perf.to_owned(),
        None => String::new(),
    }
}

impl fmt::Display for PerfData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&render(std::slice::from_ref(self)))
    }
}
