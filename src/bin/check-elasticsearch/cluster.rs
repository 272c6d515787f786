//! `/_cluster/health`

use serde::Deserialize;

use netprobe_plugins::http::{get_json, Fetch};
use netprobe_plugins::{PerfData, Report, Status};

pub(crate) const HEALTH_PATH: &str = "/_cluster/health";

#[derive(Debug, Deserialize)]
pub(crate) struct ClusterHealth {
    pub cluster_name: String,
    pub status: String,
    pub number_of_nodes: u64,
    pub number_of_data_nodes: u64,
    pub active_primary_shards: u64,
    pub active_shards: u64,
    pub relocating_shards: u64,
    pub initializing_shards: u64,
    pub unassigned_shards: u64,
    /// Missing before Elasticsearch 2
    #[serde(default)]
    pub delayed_unassigned_shards: u64,
}

pub(crate) fn color_status(color: &str) -> Status {
    match color {
        "green" => Status::Ok,
        "yellow" => Status::Warning,
        "red" => Status::Critical,
        _ => Status::Unknown,
    }
}

pub(crate) fn report(health: &ClusterHealth) -> Report {
    let mut report = Report::new();
    report.add(
        color_status(&health.status),
        format!(
            "ElasticSearch ({}) is running with '{}' status",
            health.cluster_name, health.status
        ),
    );
    report.detail(format!(
        "{} nodes on cluster, with {} data nodes:",
        health.number_of_nodes, health.number_of_data_nodes
    ));
    let shards = [
        ("active primary shards", "active_primary", health.active_primary_shards),
        ("active shards", "active", health.active_shards),
        ("relocating shards", "relocating", health.relocating_shards),
        ("initializing shards", "init", health.initializing_shards),
        (
            "delayed unassigned shards",
            "delay_unass",
            health.delayed_unassigned_shards,
        ),
        ("unassigned shards", "unass", health.unassigned_shards),
    ];
    for &(what, label, count) in &shards {
        report.detail(format!("  {:<25} : {}", what, count));
        report.perf(PerfData::new(label, count as f64));
    }
    report
}

pub(crate) fn check<F: Fetch + ?Sized>(fetch: &F) -> Report {
    match get_json::<F, ClusterHealth>(fetch, HEALTH_PATH) {
        Ok(health) => report(&health),
        Err(e) => Report::unknown(format!(
            "Unable to request URL {} ({})",
            fetch.url_for(HEALTH_PATH),
            e.short_display()
        )),
    }
}
