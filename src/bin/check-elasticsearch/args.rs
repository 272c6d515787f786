use std::fmt;
use std::str::FromStr;

use structopt::StructOpt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Mode {
    Health,
    Indices,
}

impl Mode {
    pub const NAMES: &'static [&'static str] = &["health", "indices"];
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
        match s {
            "health" => Ok(Mode::Health),
            "indices" => Ok(Mode::Indices),
            _ => Err(InvalidMode(s.to_owned())),
        }
    }
}

const MODES_HELP: &str = "Modes:

    health   Overall cluster status from /_cluster/health: green is OK,
             yellow WARNING and red CRITICAL. -w/-c are not used.

    indices  Health of every open index from /_cat/indices. The number of
             yellow indices is compared to -w, the number of red ones to -c.";

/// Check the health of an Elasticsearch cluster
#[derive(StructOpt, Debug)]
#[structopt(
    name = "check-elasticsearch (part of netprobe-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp,
    after_help = MODES_HELP
)]
pub(crate) struct Args {
    #[structopt(short = "H", long = "hostname", help = "Hostname or IP address")]
    pub hostname: String,
    #[structopt(short = "U", long = "username", help = "User for HTTP basic auth")]
    pub username: Option<String>,
    #[structopt(
        short = "P",
        long = "password",
        env = "ELASTIC_PASSWORD",
        hide_env_values = true,
        help = "Password for HTTP basic auth"
    )]
    pub password: Option<String>,
    #[structopt(long = "port", default_value = "9200", help = "HTTP port")]
    pub port: u16,
    #[structopt(short = "s", long = "ssl", help = "Connect with https")]
    pub ssl: bool,
    #[structopt(
        short = "k",
        long = "insecure",
        help = "Don't verify the server certificate"
    )]
    pub insecure: bool,
    #[structopt(
        long = "timeout",
        default_value = "10",
        help = "Seconds to wait for the cluster"
    )]
    pub timeout: u64,
    #[structopt(
        short = "m",
        long = "mode",
        default_value = "health",
        possible_values = Mode::NAMES,
        help = "What to check, see Modes below"
    )]
    pub mode: Mode,
    #[structopt(short = "d", long = "perfdata", help = "Append perfdata to the output")]
    pub perfdata: bool,
    #[structopt(
        short = "w",
        long = "warning",
        default_value = "0",
        help = "Yellow indices above which to warn"
    )]
    pub warning: f64,
    #[structopt(
        short = "c",
        long = "critical",
        default_value = "0",
        help = "Red indices above which to go critical"
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
    pub fn scheme(&self) -> &'static str {
        if self.ssl {
            "https"
        } else {
            "http"
        }
    }
}

#[cfg(test)]
pub(crate) fn build_args(argv: &[&str]) -> Args {
    Args::from_iter(argv.iter())
}
