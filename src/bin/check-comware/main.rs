//! Check CPU load or memory usage of an H3C ComWare switch
//!
//! Older ComWare releases don't expose these figures over SNMP, so this logs
//! in over SSH, runs a `display` command and reads its output.

mod args;
mod parse;

use std::time::Duration;

use itertools::Itertools;
use log::{debug, info};
use structopt::StructOpt;

use netprobe_plugins::logging;
use netprobe_plugins::ssh::{RemoteShell, SshShell};
use netprobe_plugins::{PerfData, Report, Threshold, Unit};

use args::{Args, CheckType};
use parse::{CpuSample, MemoryFigures};

const MB: f64 = 1024.0 * 1024.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn cpu_label(sample: &CpuSample) -> String {
    if sample.cpu == 0 {
        format!("cpu_slot_{}", sample.slot)
    } else {
        format!("cpu_slot_{}_{}", sample.slot, sample.cpu)
    }
}

fn cpu_report(samples: &[CpuSample], threshold: &Threshold) -> Report {
    if samples.is_empty() {
        return Report::unknown("No CPU slot found");
    }
    let average = samples.iter().map(|s| s.load).sum::<f64>() / samples.len() as f64;
    let mut report = Report::new();
    report.add(
        threshold.classify(average),
        format!("Average CPU load : {}%", round2(average)),
    );
    report.perf(
        PerfData::new("avg_cpu", round2(average))
            .unit(Unit::Percentage)
            .thresholds(threshold),
    );
    for sample in samples {
        report.detail(format!("Slot {} CPU load : {}%", sample.slot, sample.load));
        report.perf(
            PerfData::new(cpu_label(sample), sample.load)
                .unit(Unit::Percentage)
                .thresholds(threshold),
        );
    }
    report
}

fn memory_report(figures: &MemoryFigures, percent: &Threshold) -> Report {
    let (total, used) = match (figures.total, figures.used) {
        (Some(total), Some(used)) if total > 0 => (total as f64, used as f64),
        _ => return Report::unknown("Unable to find memory usage in command output"),
    };
    let limits = percent.of_total(total);
    let mut report = Report::new();
    report.add(
        limits.classify(used),
        format!(
            "Memory usage : {} MB / {} MB ({}%)",
            round2(used / MB),
            round2(total / MB),
            round2(used * 100.0 / total)
        ),
    );
    report.perf(
        PerfData::new("memory", used)
            .unit(Unit::Bytes)
            .thresholds(&limits)
            .range(0.0, total),
    );
    report
}

fn check<R: RemoteShell + ?Sized>(shell: &mut R, args: &Args) -> Report {
    let command = args.command();
    let output = match shell.run(command) {
        Ok(output) => output,
        Err(e) => {
            return Report::unknown(format!("Unable to run '{}': {}", command, e));
        }
    };
    debug!("'{}' printed:\n{}", command, output.lines().join("\n"));
    let threshold = Threshold::new(args.warning, args.critical);
    match args.check_type {
        CheckType::CpuLoad => cpu_report(&parse::cpu_samples(&output), &threshold),
        CheckType::Memory => memory_report(&parse::memory_figures(&output), &threshold),
    }
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::from_args();
    logging::init(args.verbose);

    info!("checking {:?} on {}", args.check_type, args.hostname);
    let mut shell = match SshShell::connect(
        &args.hostname,
        args.port,
        &args.username,
        &args.password,
        Duration::from_secs(args.timeout),
    ) {
        Ok(shell) => shell,
        Err(e) => Report::unknown(format!(
            "SSH connection to {} failed: {}",
            args.hostname, e
        ))
        .print_and_exit(args.perfdata),
    };
    let report = check(&mut shell, &args);
    shell.disconnect();
    report.print_and_exit(args.perfdata);
}

#[cfg(test)]
mod test {
    use netprobe_plugins::ssh::{RemoteShell, SshError};
    use netprobe_plugins::Status;
    use structopt::StructOpt;

    use super::check;
    use crate::args::Args;

    /// Answers every command with the same canned output
    struct CannedShell {
        output: Option<&'static str>,
        ran: Vec<String>,
    }

    impl RemoteShell for CannedShell {
        fn run(&mut self, command: &str) -> Result<String, SshError> {
            self.ran.push(command.to_owned());
            match self.output {
                Some(output) => Ok(output.to_owned()),
                None => Err(SshError::NotAuthenticated("monitor".to_owned())),
            }
        }
    }

    fn shell(output: &'static str) -> CannedShell {
        CannedShell {
            output: Some(output),
            ran: Vec::new(),
        }
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["check-comware", "-H", "sw1", "-U", "monitor", "-P", "pw"];
        argv.extend_from_slice(extra);
        Args::from_iter(argv.iter())
    }

    const CPU: &str = "\
Slot 1 CPU usage:
      12% in last 5 seconds
      10% in last 1 minute
Slot 2 CPU usage:
      95% in last 5 seconds
      85% in last 1 minute
<sw1>";

    #[test]
    fn cpu_load_average() {
        let mut shell = shell(CPU);
        let report = check(&mut shell, &args(&["-t", "cpu-load"]));
        assert_eq!(shell.ran, vec!["display cpu-usage"]);
        assert_eq!(report.status(), Status::Ok);
        assert_eq!(
            report.render(true),
            "OK: Average CPU load : 47.5% \
             | 'avg_cpu'=47.5%;80;90;; 'cpu_slot_1'=10%;80;90;; 'cpu_slot_2'=85%;80;90;;\n\
             Slot 1 CPU load : 10%\n\
             Slot 2 CPU load : 85%"
        );

        let report = check(&mut shell, &args(&["-t", "cpu-load", "-w", "40", "-c", "50"]));
        assert_eq!(report.status(), Status::Warning);
    }

    #[test]
    fn no_cpu_found() {
        let mut shell = shell("% Unrecognized command\n<sw1>");
        let report = check(&mut shell, &args(&["-t", "cpu-load"]));
        assert_eq!(report.render(true), "UNKNOWN: No CPU slot found");
    }

    #[test]
    fn memory_usage() {
        let mut shell = shell(
            "System Total Memory(bytes): 104857600\nTotal Used Memory(bytes): 94371840\n<sw1>",
        );
        let report = check(&mut shell, &args(&["-t", "memory", "-p"]));
        assert_eq!(shell.ran, vec!["display memory"]);
        assert_eq!(report.status(), Status::Warning);
        assert_eq!(
            report.render(true),
            "WARNING: Memory usage : 90 MB / 100 MB (90%) \
             | 'memory'=94371840B;83886080;94371840;0;104857600"
        );
    }

    #[test]
    fn memory_figures_missing() {
        let mut shell = shell("Used Rate: 16%\n");
        let report = check(&mut shell, &args(&["-t", "memory"]));
        assert_eq!(report.status(), Status::Unknown);
    }

    #[test]
    fn command_failure_is_unknown() {
        let mut shell = CannedShell {
            output: None,
            ran: Vec::new(),
        };
        let report = check(&mut shell, &args(&["-t", "memory", "--command", "dis mem"]));
        assert_eq!(shell.ran, vec!["dis mem"]);
        assert_eq!(
            report.render(false),
            "UNKNOWN: Unable to run 'dis mem': authentication failed for user 'monitor'"
        );
    }
}
