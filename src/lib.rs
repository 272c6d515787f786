//! Nagios-compatible network checks
//!
//! Each binary in this crate polls a single remote device, compares what it
//! read against warning/critical thresholds and exits with the usual plugin
//! convention:
//!
//! | exit | status   |
//! |------|----------|
//! | 0    | OK       |
//! | 1    | WARNING  |
//! | 2    | CRITICAL |
//! | 3    | UNKNOWN  |
//!
//! The library holds the pieces that every check shares: the `Status` type,
//! threshold classification, perfdata formatting, the `Report` that composes
//! the final status line, and thin wrappers around the SNMP, SSH and HTTP
//! clients.
//!
//! - `check-f5-bigip`: F5 BIG-IP load balancers over SNMP v2c
//! - `check-comware`: H3C/HP ComWare switches over SSH
//! - `check-elasticsearch`: Elasticsearch clusters over HTTP(S)

use std::cmp::Ordering;
use std::fmt;
use std::process;
use std::str::FromStr;

use nagiosplugin::ServiceState;

pub mod http;
pub mod logging;
pub mod perfdata;
pub mod report;
pub mod snmp;
pub mod ssh;
pub mod threshold;

pub use crate::perfdata::{PerfData, Unit};
pub use crate::report::Report;
pub use crate::threshold::Threshold;

/// All possible exit statuses for a check
///
/// Ordered by severity the way `nagiosplugin::ServiceState` is,
/// `Ok < Unknown < Warning < Critical`, so `max` and `escalate` agree.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// Exit with a return code that indicates the state of the system
    pub fn exit(self) -> ! {
        process::exit(self.code())
    }

    /// The plugin exit code for this status
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    /// Combine the results of two sections of a check
    ///
    /// A real alarm always wins over a section we couldn't read:
    /// `Critical > Warning > Unknown > Ok`.
    pub fn escalate(self, other: Status) -> Status {
        self.max(other)
    }

    /// The strings that `from_str` understands, for `possible_values`
    pub fn str_values() -> [&'static str; 4] {
        ["ok", "warning", "critical", "unknown"]
    }
}

impl From<Status> for ServiceState {
    fn from(status: Status) -> ServiceState {
        match status {
            Status::Ok => ServiceState::Ok,
            Status::Warning => ServiceState::Warning,
            Status::Critical => ServiceState::Critical,
            Status::Unknown => ServiceState::Unknown,
        }
    }
}

impl From<ServiceState> for Status {
    fn from(state: ServiceState) -> Status {
        match state {
            ServiceState::Ok => Status::Ok,
            ServiceState::Warning => Status::Warning,
            ServiceState::Critical => Status::Critical,
            ServiceState::Unknown => Status::Unknown,
        }
    }
}

impl Ord for Status {
    fn cmp(&self, other: &Status) -> Ordering {
        ServiceState::from(*self).cmp(&ServiceState::from(*other))
    }
}

impl PartialOrd for Status {
    fn partial_cmp(&self, other: &Status) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for Status {
    fn default() -> Status {
        Status::Ok
    }
}

#[derive(Debug, PartialEq)]
pub struct InvalidStatus(String);

impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Unexpected status '{}', expected one of: {}",
            self.0,
            Status::str_values().join(", ")
        )
    }
}

impl std::error::Error for InvalidStatus {}

impl FromStr for Status {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Status, InvalidStatus> {
        match s.to_lowercase().as_ref() {
            "ok" => Ok(Status::Ok),
            "warn" | "warning" => Ok(Status::Warning),
            "crit" | "critical" => Ok(Status::Critical),
            "unknown" => Ok(Status::Unknown),
            _ => Err(InvalidStatus(s.to_owned())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod test {
    use nagiosplugin::ServiceState;

    use super::Status;

    #[test]
    fn exit_codes_follow_plugin_convention() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::Warning.code(), 1);
        assert_eq!(Status::Critical.code(), 2);
        assert_eq!(Status::Unknown.code(), 3);
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("warn".parse::<Status>().unwrap(), Status::Warning);
        assert_eq!("CRITICAL".parse::<Status>().unwrap(), Status::Critical);
        assert_eq!("unknown".parse::<Status>().unwrap(), Status::Unknown);
        assert!("bad".parse::<Status>().is_err());
        assert_eq!(Status::Warning.to_string(), "WARNING");
    }

    #[test]
    fn max_agrees_with_escalate() {
        let all = [Status::Ok, Status::Warning, Status::Critical, Status::Unknown];
        for &a in &all {
            for &b in &all {
                assert_eq!(a.max(b), a.escalate(b));
            }
        }
        assert_eq!(all.iter().max(), Some(&Status::Critical));
        assert!(Status::Unknown < Status::Warning);
        assert_eq!(ServiceState::from(Status::Unknown).exit_code(), Status::Unknown.code());
    }

    #[test]
    fn alarms_win_over_unknown() {
        assert_eq!(Status::Unknown.escalate(Status::Critical), Status::Critical);
        assert_eq!(Status::Warning.escalate(Status::Unknown), Status::Warning);
        assert_eq!(Status::Ok.escalate(Status::Unknown), Status::Unknown);
        assert_eq!(Status::Critical.escalate(Status::Warning), Status::Critical);
        assert_eq!(Status::Ok.escalate(Status::Ok), Status::Ok);
    }
}
