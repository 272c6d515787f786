//! Read the output of ComWare `display` commands
//!
//! Only the lines before the next prompt (`<switch-name>`) belong to the
//! command, anything after it is ignored.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PROMPT: Regex = Regex::new(r"^<.*>.*$").unwrap();
    static ref SLOT: Regex = Regex::new(r"^Slot (?P<slot>\d+) CPU.*").unwrap();
    static ref CPU_LOAD: Regex = Regex::new(r"^\s+(?P<cpu>\d+)% in last 1 min.*").unwrap();
    static ref MEMORY_TOTAL: Regex = Regex::new(r"^System Total.*:\s+(?P<total>\d+).*$").unwrap();
    static ref MEMORY_USED: Regex = Regex::new(r"^Total Used.*:\s+(?P<used>\d+).*$").unwrap();
}

fn command_lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().take_while(|line| !PROMPT.is_match(line))
}

/// One minute load of a CPU
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CpuSample {
    pub slot: u32,
    /// Position of this CPU within its slot, starting at 0
    pub cpu: usize,
    pub load: f64,
}

/// Parse `display cpu-usage`
///
/// Samples that come before any `Slot N CPU` header are attributed to slot 0,
/// which is what single-chassis switches print.
pub(crate) fn cpu_samples(output: &str) -> Vec<CpuSample> {
    let mut slot = 0;
    let mut per_slot: BTreeMap<u32, usize> = BTreeMap::new();
    let mut samples = Vec::new();
    for line in command_lines(output) {
        if let Some(caps) = SLOT.captures(line) {
            if let Ok(n) = caps["slot"].parse() {
                slot = n;
            }
        }
        if let Some(caps) = CPU_LOAD.captures(line) {
            if let Ok(load) = caps["cpu"].parse() {
                let cpu = per_slot.entry(slot).or_insert(0);
                samples.push(CpuSample {
                    slot,
                    cpu: *cpu,
                    load,
                });
                *cpu += 1;
            }
        }
    }
    samples
}

/// Memory figures in bytes, as found in `display memory`
#[derive(Debug, Default, PartialEq)]
pub(crate) struct MemoryFigures {
    pub total: Option<u64>,
    pub used: Option<u64>,
}

pub(crate) fn memory_figures(output: &str) -> MemoryFigures {
    let mut figures = MemoryFigures::default();
    for line in command_lines(output) {
        if let Some(caps) = MEMORY_TOTAL.captures(line) {
            figures.total = caps["total"].parse().ok();
        }
        if let Some(caps) = MEMORY_USED.captures(line) {
            figures.used = caps["used"].parse().ok();
        }
    }
    figures
}
