use std::fmt;
use std::str::FromStr;

use structopt::StructOpt;

/// What `--mode` asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Mode {
    /// Print the long help, the appliance isn't contacted
    Help,
    Check(Check),
}

/// What to check on the appliance
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Check {
    Health,
    Http,
    EnumVs,
    VsStats,
    NodeStats,
    MemTmm,
    Sessions,
}

impl Mode {
    pub const NAMES: &'static [&'static str] = &[
        "help",
        "health",
        "http",
        "enumvs",
        "vsstats",
        "nodestats",
        "mem_tmm",
        "sessions",
    ];
}

#[derive(Debug)]
pub(crate) struct InvalidMode(String);

impl fmt::Display for InvalidMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Invalid mode '{}', expected one of: {}",
            self.0,
            Mode::NAMES.join(", ")
        )
    }
}

impl FromStr for Mode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Mode, InvalidMode> {
        let check = match s {
            "help" => return Ok(Mode::Help),
            "health" => Check::Health,
            "http" => Check::Http,
            "enumvs" => Check::EnumVs,
            "vsstats" => Check::VsStats,
            "nodestats" => Check::NodeStats,
            "mem_tmm" => Check::MemTmm,
            "sessions" => Check::Sessions,
            _ => return Err(InvalidMode(s.to_owned())),
        };
        Ok(Mode::Check(check))
    }
}

const MODES_HELP: &str = "Modes:

    health     Global system health: power supplies, chassis temperature
               sensors and fans.

               -w/-c take three values: failed PSUs, degrees celsius, failed
               fans. Defaults: -w 0,40,0 -c 1,50,1

               --arg1 takes comma separated flags that change how missing
               units are treated (they are critical otherwise):

                   ignoremissingpsu  warnmissingpsu
                   ignoremissingfan  warnmissingfan

    http       Global number of HTTP requests.
               Defaults: -w 200000 -c 250000

    enumvs     List the VirtualServers configured on the appliance, to help
               write vsstats checks. Takes no thresholds.

    vsstats    Status and connection counts of VirtualServers. --arg1 is a
               regex, only VirtualServers whose name matches it are checked.

               -w/-c take three values: active, max and total connections.
               Defaults: -w 200000,200000,200000 -c 250000,250000,250000

    nodestats  Status and connection counts of Nodes, the real servers behind
               the load balancer. Same thresholds and --arg1 filter as
               vsstats.

    mem_tmm    Memory used by the TMM processes, in percent of their total.
               Defaults: -w 85 -c 95

    sessions   Client and server side sessions, in percent of their
               respective totals. -w/-c take two values: client, server.
               Defaults: -w 90,90 -c 95,95

    help       Print this help.

Perfdata is only appended to the output when --perfdata is given.";

/// Check an F5 BIG-IP load balancer over SNMP v2c
#[derive(StructOpt, Debug)]
#[structopt(
    name = "check-f5-bigip (part of netprobe-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp,
    after_help = MODES_HELP
)]
pub(crate) struct Args {
    #[structopt(short = "H", long = "hostname", help = "Hostname or IP address")]
    pub hostname: String,
    #[structopt(
        short = "C",
        long = "community",
        env = "F5_SNMP_COMMUNITY",
        hide_env_values = true,
        help = "SNMP v2c community"
    )]
    pub community: String,
    #[structopt(long = "port", default_value = "161", help = "SNMP port")]
    pub port: u16,
    #[structopt(
        long = "timeout",
        default_value = "5",
        help = "Seconds to wait for each SNMP response"
    )]
    pub timeout: u64,
    #[structopt(
        short = "m",
        long = "mode",
        possible_values = Mode::NAMES,
        help = "What to check, see Modes below"
    )]
    pub mode: Mode,
    #[structopt(
        short = "x",
        long = "arg1",
        help = "Mode argument: health flags, or a VirtualServer/Node name regex"
    )]
    pub arg1: Option<String>,
    #[structopt(short = "p", long = "perfdata", help = "Append perfdata to the output")]
    pub perfdata: bool,
    #[structopt(short = "w", long = "warning", help = "Warning threshold(s), comma separated")]
    pub warning: Option<String>,
    #[structopt(
        short = "c",
        long = "critical",
        help = "Critical threshold(s), comma separated"
    )]
    pub critical: Option<String>,
    #[structopt(
        short = "v",
        long = "verbose",
        parse(from_occurrences),
        help = "Log to stderr, repeat for more detail"
    )]
    pub verbose: u8,
}

impl Args {
    /// `--help` with the modes description, as printed by `-m help`
    pub fn long_help() -> String {
        let mut out = Vec::new();
        if let Err(e) = Args::clap().write_long_help(&mut out) {
            return format!("unable to render help: {}", e);
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

#[cfg(test)]
pub(crate) fn build_args(argv: Vec<&str>) -> Args {
    Args::from_iter(argv.into_iter())
}

#[cfg(test)]
mod test {
    use super::{build_args, Args, Check, Mode};

    #[test]
    fn minimal_invocation() {
        let args = build_args(vec![
            "check-f5-bigip",
            "-H",
            "lb1",
            "-C",
            "public",
            "-m",
            "health",
        ]);
        assert_eq!(args.hostname, "lb1");
        assert_eq!(args.community, "public");
        assert_eq!(args.mode, Mode::Check(Check::Health));
        assert_eq!(args.port, 161);
        assert_eq!(args.warning, None);
        assert!(!args.perfdata);
    }

    #[test]
    fn every_mode_name_parses() {
        for name in Mode::NAMES {
            assert!(name.parse::<Mode>().is_ok(), "{} should parse", name);
        }
        assert!("bogus".parse::<Mode>().is_err());
    }

    #[test]
    fn help_mode_describes_every_mode() {
        let args = build_args(vec!["check-f5-bigip", "-H", "lb1", "-C", "public", "-m", "help"]);
        assert_eq!(args.mode, Mode::Help);
        let help = Args::long_help();
        assert!(help.contains("--mode"));
        for name in Mode::NAMES {
            assert!(help.contains(&format!("\n    {} ", name)), "{} is not described", name);
        }
    }

    #[test]
    fn thresholds_and_flags() {
        let args = build_args(vec![
            "check-f5-bigip",
            "-H",
            "lb1",
            "-C",
            "public",
            "-m",
            "vsstats",
            "-x",
            "^/Common/web",
            "-p",
            "-w",
            "10,20,30",
            "-c",
            "40,50,60",
            "-vv",
        ]);
        assert_eq!(args.mode, Mode::Check(Check::VsStats));
        assert_eq!(args.arg1.as_deref(), Some("^/Common/web"));
        assert!(args.perfdata);
        assert_eq!(args.warning.as_deref(), Some("10,20,30"));
        assert_eq!(args.critical.as_deref(), Some("40,50,60"));
        assert_eq!(args.verbose, 2);
    }
}
