//! Check an F5 BIG-IP load balancer over SNMP
//!
//! Each `--mode` polls one part of the F5-BIGIP-SYSTEM-MIB or
//! F5-BIGIP-LOCAL-MIB and prints a single status line.

mod args;
mod health;
mod stats;
mod system;

use std::fmt;
use std::time::Duration;

use derive_more::From;
use log::{debug, info};
use structopt::StructOpt;

use netprobe_plugins::logging;
use netprobe_plugins::snmp::{InvalidOid, SnmpClient, SnmpError, V2cSession};
use netprobe_plugins::threshold::ThresholdError;
use netprobe_plugins::{Report, Status};

use args::{Args, Check, Mode};

/// Everything that stops a mode from producing a report
#[derive(Debug, From)]
pub(crate) enum CheckError {
    Snmp(SnmpError),
    Oid(InvalidOid),
    Threshold(ThresholdError),
    Filter(regex::Error),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CheckError::Snmp(ref e) => write!(f, "SNMP error: {}", e.short_display()),
            CheckError::Oid(ref e) => write!(f, "{}", e),
            CheckError::Threshold(ref e) => write!(f, "{}", e),
            CheckError::Filter(ref e) => write!(f, "invalid --arg1 regex: {}", e),
        }
    }
}

/// Run one check, turning any error into an UNKNOWN report
fn run_check<S: SnmpClient + ?Sized>(snmp: &mut S, check: Check, args: &Args) -> Report {
    let warning = args.warning.as_deref();
    let critical = args.critical.as_deref();
    let arg1 = args.arg1.as_deref();
    let result = match check {
        Check::Health => health::check(snmp, warning, critical, &health::HealthFlags::parse(arg1)),
        Check::Http => system::http_requests(snmp, warning, critical),
        Check::EnumVs => stats::enum_virtual_servers(snmp),
        Check::VsStats => stats::vs_stats(snmp, arg1, warning, critical),
        Check::NodeStats => stats::node_stats(snmp, arg1, warning, critical),
        Check::MemTmm => system::tmm_memory(snmp, warning, critical),
        Check::Sessions => system::sessions(snmp, warning, critical),
    };
    match result {
        Ok(report) => report,
        Err(e) => {
            debug!("{:?} failed: {:?}", check, e);
            Report::unknown(e.to_string())
        }
    }
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::from_args();
    logging::init(args.verbose);

    let check = match args.mode {
        Mode::Help => {
            println!("{}", Args::long_help());
            Status::Ok.exit();
        }
        Mode::Check(check) => check,
    };

    info!("polling {}:{} in {:?} mode", args.hostname, args.port, check);
    let timeout = Duration::from_secs(args.timeout);
    let mut session =
        match V2cSession::connect(&args.hostname, args.port, &args.community, timeout) {
            Ok(session) => session,
            Err(e) => Report::unknown(format!(
                "Unable to open SNMP session to {}: {}",
                args.hostname, e
            ))
            .print_and_exit(args.perfdata),
        };
    run_check(&mut session, check, &args).print_and_exit(args.perfdata);
}
