//! Check the health of an Elasticsearch cluster over its REST API

mod args;
mod cluster;
mod indices;

use std::time::Duration;

use log::info;
use structopt::StructOpt;

use netprobe_plugins::http::{Fetch, HttpEndpoint};
use netprobe_plugins::logging;
use netprobe_plugins::Report;

use args::{Args, Mode};

fn run_mode<F: Fetch + ?Sized>(fetch: &F, args: &Args) -> Report {
    match args.mode {
        Mode::Health => cluster::check(fetch),
        Mode::Indices => indices::check(fetch, args.warning, args.critical),
    }
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::from_args();
    logging::init(args.verbose);

    let endpoint = match HttpEndpoint::new(
        args.scheme(),
        &args.hostname,
        args.port,
        Duration::from_secs(args.timeout),
        args.insecure,
    ) {
        Ok(endpoint) => endpoint,
        Err(e) => Report::unknown(format!("Unable to set up HTTP client: {}", e))
            .print_and_exit(args.perfdata),
    };
    let endpoint = match args.username {
        Some(ref username) => endpoint.basic_auth(username, args.password.as_deref()),
        None => endpoint,
    };
    info!("checking {:?} of {}", args.mode, endpoint.url_for("/"));
    run_mode(&endpoint, &args).print_and_exit(args.perfdata);
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use netprobe_plugins::http::{Fetch, HttpError};
    use netprobe_plugins::Status;

    use super::run_mode;
    use crate::args::build_args;
    use crate::cluster::HEALTH_PATH;
    use crate::indices::CAT_PATH;

    /// Serves canned bodies, everything else is a bad JSON error
    struct FakeCluster {
        bodies: HashMap<&'static str, &'static str>,
    }

    impl Fetch for FakeCluster {
        fn url_for(&self, path: &str) -> String {
            format!("http://es1:9200{}", path)
        }

        fn get_text(&self, path: &str) -> Result<String, HttpError> {
            match self.bodies.get(path) {
                Some(body) => Ok((*body).to_owned()),
                None => Err(serde_json::from_str::<u8>("").unwrap_err().into()),
            }
        }
    }

    fn cluster(bodies: Vec<(&'static str, &'static str)>) -> FakeCluster {
        FakeCluster {
            bodies: bodies.into_iter().collect(),
        }
    }

    const YELLOW: &str = r#"{"cluster_name": "logs", "status": "yellow",
        "number_of_nodes": 1, "number_of_data_nodes": 1,
        "active_primary_shards": 5, "active_shards": 5, "relocating_shards": 0,
        "initializing_shards": 0, "unassigned_shards": 5,
        "delayed_unassigned_shards": 0}"#;

    #[test]
    fn health_mode() {
        let fake = cluster(vec![(HEALTH_PATH, YELLOW)]);
        let report = run_mode(&fake, &build_args(&["check-elasticsearch", "-H", "es1"]));
        assert_eq!(report.status(), Status::Warning);
        assert!(report
            .render(false)
            .starts_with("WARNING: ElasticSearch (logs) is running with 'yellow' status\n"));
    }

    #[test]
    fn unreachable_cluster_is_unknown() {
        let fake = cluster(vec![]);
        let report = run_mode(&fake, &build_args(&["check-elasticsearch", "-H", "es1"]));
        assert_eq!(
            report.render(true),
            "UNKNOWN: Unable to request URL http://es1:9200/_cluster/health \
             (invalid JSON in response)"
        );
    }

    #[test]
    fn unparsable_health_is_unknown() {
        let fake = cluster(vec![(HEALTH_PATH, "<html>proxy error</html>")]);
        let report = run_mode(&fake, &build_args(&["check-elasticsearch", "-H", "es1"]));
        assert_eq!(report.status(), Status::Unknown);
    }

    #[test]
    fn indices_mode() {
        let fake = cluster(vec![(CAT_PATH, "green open a\nyellow open b\n")]);
        let args = build_args(&["check-elasticsearch", "-H", "es1", "-m", "indices", "-w", "1"]);
        let report = run_mode(&fake, &args);
        assert_eq!(report.status(), Status::Ok);
        assert_eq!(
            report.render(false),
            "OK: 2 indices: 1 green, 1 yellow, 0 red\nindex b is yellow"
        );
    }
}
