use std::fmt;
use std::str::FromStr;

use structopt::StructOpt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CheckType {
    CpuLoad,
    Memory,
}

impl CheckType {
    pub const NAMES: &'static [&'static str] = &["cpu-load", "memory"];

    /// The CLI command whose output we know how to read
    pub fn default_command(self) -> &'static str {
        match self {
            CheckType::CpuLoad => "display cpu-usage",
            CheckType::Memory => "display memory",
        }
    }
}

#[derive(Debug)]
pub(crate) struct InvalidCheckType(String);

impl fmt::Display for InvalidCheckType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Invalid check type '{}', expected one of: {}",
            self.0,
            CheckType::NAMES.join(", ")
        )
    }
}

impl FromStr for CheckType {
    type Err = InvalidCheckType;

    fn from_str(s: &str) -> Result<CheckType, InvalidCheckType> {
        match s {
            "cpu-load" => Ok(CheckType::CpuLoad),
            "memory" => Ok(CheckType::Memory),
            _ => Err(InvalidCheckType(s.to_owned())),
        }
    }
}

/// Check CPU load or memory usage of an H3C ComWare switch through its CLI
#[derive(StructOpt, Debug)]
#[structopt(
    name = "check-comware (part of netprobe-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
pub(crate) struct Args {
    #[structopt(short = "H", long = "hostname", help = "Hostname or IP address")]
    pub hostname: String,
    #[structopt(short = "U", long = "username", help = "SSH user")]
    pub username: String,
    #[structopt(
        short = "P",
        long = "password",
        env = "COMWARE_PASSWORD",
        hide_env_values = true,
        help = "SSH password"
    )]
    pub password: String,
    #[structopt(long = "port", default_value = "22", help = "SSH port")]
    pub port: u16,
    #[structopt(
        long = "timeout",
        default_value = "10",
        help = "Seconds to wait for the switch"
    )]
    pub timeout: u64,
    #[structopt(
        short = "t",
        long = "type",
        possible_values = CheckType::NAMES,
        help = "What to check"
    )]
    pub check_type: CheckType,
    #[structopt(
        long = "command",
        help = "Run this instead of 'display cpu-usage' or 'display memory'"
    )]
    pub command: Option<String>,
    #[structopt(short = "p", long = "perfdata", help = "Append perfdata to the output")]
    pub perfdata: bool,
    #[structopt(
        short = "w",
        long = "warning",
        default_value = "80",
        help = "Warning level, in percent"
    )]
    pub warning: f64,
    #[structopt(
        short = "c",
        long = "critical",
        default_value = "90",
        help = "Critical level, in percent"
    )]
    pub critical: f64,
    #[structopt(
        short = "v",
        long = "verbose",
        parse(from_occurrences),
        help = "Log to stderr, repeat for more detail"
    )]
    pub verbose: u8,
}

impl Args {
    pub fn command(&self) -> &str {
        self.command
            .as_deref()
            .unwrap_or_else(|| self.check_type.default_command())
    }
}

#[cfg(test)]
mod test {
    use structopt::StructOpt;

    use super::{Args, CheckType};

    #[test]
    fn defaults() {
        let args = Args::from_iter(
            [
                "check-comware",
                "-H",
                "sw1",
                "-U",
                "monitor",
                "-P",
                "secret",
                "-t",
                "memory",
            ]
            .iter(),
        );
        assert_eq!(args.check_type, CheckType::Memory);
        assert_eq!(args.port, 22);
        assert_eq!(args.warning, 80.0);
        assert_eq!(args.critical, 90.0);
        assert_eq!(args.command(), "display memory");
    }

    #[test]
    fn command_override() {
        let args = Args::from_iter(
            [
                "check-comware",
                "-H",
                "sw1",
                "-U",
                "monitor",
                "-P",
                "secret",
                "-t",
                "cpu-load",
                "--command",
                "display cpu-usage summary",
                "-w",
                "70",
                "-c",
                "85",
            ]
            .iter(),
        );
        assert_eq!(args.check_type, CheckType::CpuLoad);
        assert_eq!(args.command(), "display cpu-usage summary");
        assert_eq!(args.warning, 70.0);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = Args::from_iter_safe(
            ["check-comware", "-H", "sw1", "-U", "u", "-P", "p", "-t", "disk"].iter(),
        );
        assert!(result.is_err());
    }
}
