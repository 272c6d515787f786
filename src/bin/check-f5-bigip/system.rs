//! Global counters from sysGlobalStat

use netprobe_plugins::snmp::{Oid, SnmpClient};
use netprobe_plugins::threshold::{self, Threshold};
use netprobe_plugins::{PerfData, Report, Status, Unit};

use crate::CheckError;

const HTTP_REQUESTS: &str = ".1.3.6.1.4.1.3375.2.1.1.2.1.56.0";
const TMM_MEMORY_TOTAL: &str = ".1.3.6.1.4.1.3375.2.1.1.2.1.44.0";
const TMM_MEMORY_USED: &str = ".1.3.6.1.4.1.3375.2.1.1.2.1.45.0";

const CLIENT_CUR_CONNS: &str = ".1.3.6.1.4.1.3375.2.1.1.2.1.8.0";
const CLIENT_MAX_CONNS: &str = ".1.3.6.1.4.1.3375.2.1.1.2.1.6.0";
const CLIENT_TOT_CONNS: &str = ".1.3.6.1.4.1.3375.2.1.1.2.1.7.0";
const SERVER_CUR_CONNS: &str = ".1.3.6.1.4.1.3375.2.1.1.2.1.15.0";
const SERVER_MAX_CONNS: &str = ".1.3.6.1.4.1.3375.2.1.1.2.1.13.0";
const SERVER_TOT_CONNS: &str = ".1.3.6.1.4.1.3375.2.1.1.2.1.14.0";

const MB: f64 = 1024.0 * 1024.0;

fn get_f64<S: SnmpClient + ?Sized>(snmp: &mut S, oid: &str) -> Result<Option<f64>, CheckError> {
    let value = snmp.get(&oid.parse::<Oid>()?)?;
    Ok(value.and_then(|v| v.as_f64()))
}

pub(crate) fn http_requests<S: SnmpClient + ?Sized>(
    snmp: &mut S,
    warning: Option<&str>,
    critical: Option<&str>,
) -> Result<Report, CheckError> {
    let thresholds = threshold::pairs(warning, critical, &[200_000.0], &[250_000.0])?;
    let requests = match get_f64(snmp, HTTP_REQUESTS)? {
        Some(requests) => requests,
        None => return Ok(Report::unknown("Failed to retrieve HTTP session data")),
    };
    let mut report = Report::new();
    report.add(
        thresholds[0].classify(requests),
        format!("global HTTP requests: {}", requests),
    );
    report.perf(PerfData::new("http_req", requests).thresholds(&thresholds[0]));
    Ok(report)
}

pub(crate) fn tmm_memory<S: SnmpClient + ?Sized>(
    snmp: &mut S,
    warning: Option<&str>,
    critical: Option<&str>,
) -> Result<Report, CheckError> {
    let percent = threshold::pairs(warning, critical, &[85.0], &[95.0])?;
    let total = get_f64(snmp, TMM_MEMORY_TOTAL)?;
    let used = get_f64(snmp, TMM_MEMORY_USED)?;
    let (total, used) = match (total, used) {
        (Some(total), Some(used)) if total > 0.0 => (total, used),
        _ => return Ok(Report::unknown("Failed to retrieve TMM memory data")),
    };

    let limits = percent[0].of_total(total);
    let mut report = Report::new();
    report.add(
        limits.classify(used),
        format!(
            "TMM memory: {:.0} MB / {:.0} MB ({:.1}%)",
            used / MB,
            total / MB,
            used * 100.0 / total
        ),
    );
    report.perf(
        PerfData::new("mem_tmm", used)
            .unit(Unit::Bytes)
            .thresholds(&limits)
            .range(0.0, total),
    );
    Ok(report)
}

struct Sessions {
    current: f64,
    max: f64,
    total: f64,
}

fn read_sessions<S: SnmpClient + ?Sized>(
    snmp: &mut S,
    oids: [&str; 3],
) -> Result<Option<Sessions>, CheckError> {
    let current = get_f64(snmp, oids[0])?;
    let max = get_f64(snmp, oids[1])?;
    let total = get_f64(snmp, oids[2])?;
    Ok(match (current, max, total) {
        (Some(current), Some(max), Some(total)) if total > 0.0 => Some(Sessions {
            current,
            max,
            total,
        }),
        _ => None,
    })
}

fn sessions_section(
    report: &mut Report,
    side: &str,
    label: &str,
    sessions: Option<Sessions>,
    percent: &Threshold,
) {
    let sessions = match sessions {
        Some(sessions) => sessions,
        None => {
            report.add(
                Status::Unknown,
                format!("Failed to retrieve {} session data", side),
            );
            return;
        }
    };
    let limits = percent.of_total(sessions.total);
    report.add(
        limits.classify(sessions.current),
        format!(
            "{} sessions: {} (max: {}) / {}",
            side, sessions.current, sessions.max, sessions.total
        ),
    );
    report.perf(
        PerfData::new(label, sessions.current)
            .thresholds(&limits)
            .range(0.0, sessions.total),
    );
}

pub(crate) fn sessions<S: SnmpClient + ?Sized>(
    snmp: &mut S,
    warning: Option<&str>,
    critical: Option<&str>,
) -> Result<Report, CheckError> {
    let percent = threshold::pairs(warning, critical, &[90.0, 90.0], &[95.0, 95.0])?;
    let client = read_sessions(snmp, [CLIENT_CUR_CONNS, CLIENT_MAX_CONNS, CLIENT_TOT_CONNS])?;
    let server = read_sessions(snmp, [SERVER_CUR_CONNS, SERVER_MAX_CONNS, SERVER_TOT_CONNS])?;

    let mut report = Report::new();
    sessions_section(&mut report, "client", "cli_sess", client, &percent[0]);
    sessions_section(&mut report, "server", "srv_sess", server, &percent[1]);
    Ok(report)
}

#[cfg(test)]
mod test {
    use netprobe_plugins::snmp::StaticAgent;

    use super::*;

    #[test]
    fn http_request_counter() {
        let mut agent = StaticAgent::new();
        agent.insert(HTTP_REQUESTS, 1234u64);
        let report = http_requests(&mut agent, None, None).unwrap();
        assert_eq!(
            report.render(true),
            "OK: global HTTP requests: 1234 | 'http_req'=1234;200000;250000;;"
        );

        let report = http_requests(&mut agent, Some("1000"), Some("2000")).unwrap();
        assert_eq!(report.status(), Status::Warning);
        let report = http_requests(&mut agent, Some("100"), Some("1000")).unwrap();
        assert_eq!(report.status(), Status::Critical);
    }

    #[test]
    fn missing_http_counter() {
        let report = http_requests(&mut StaticAgent::new(), None, None).unwrap();
        assert_eq!(
            report.render(true),
            "UNKNOWN: Failed to retrieve HTTP session data"
        );
    }

    #[test]
    fn tmm_memory_usage() {
        let mut agent = StaticAgent::new();
        agent
            .insert(TMM_MEMORY_TOTAL, 1_048_576_000u64)
            .insert(TMM_MEMORY_USED, 524_288_000u64);
        let report = tmm_memory(&mut agent, None, None).unwrap();
        assert_eq!(report.status(), Status::Ok);
        assert_eq!(
            report.render(true),
            "OK: TMM memory: 500 MB / 1000 MB (50.0%) \
             | 'mem_tmm'=524288000B;891289600;996147200;0;1048576000"
        );

        let report = tmm_memory(&mut agent, Some("40"), Some("60")).unwrap();
        assert_eq!(report.status(), Status::Warning);
    }

    #[test]
    fn zero_tmm_total_is_unknown() {
        let mut agent = StaticAgent::new();
        agent
            .insert(TMM_MEMORY_TOTAL, 0u64)
            .insert(TMM_MEMORY_USED, 10u64);
        let report = tmm_memory(&mut agent, None, None).unwrap();
        assert_eq!(report.status(), Status::Unknown);
    }

    fn session_agent(client_current: u64, server_current: u64) -> StaticAgent {
        let mut agent = StaticAgent::new();
        agent
            .insert(CLIENT_CUR_CONNS, client_current)
            .insert(CLIENT_MAX_CONNS, 80u64)
            .insert(CLIENT_TOT_CONNS, 100u64)
            .insert(SERVER_CUR_CONNS, server_current)
            .insert(SERVER_MAX_CONNS, 70u64)
            .insert(SERVER_TOT_CONNS, 200u64);
        agent
    }

    #[test]
    fn client_and_server_sessions() {
        let mut agent = session_agent(50, 20);
        let report = sessions(&mut agent, None, None).unwrap();
        assert_eq!(
            report.render(true),
            "OK: client sessions: 50 (max: 80) / 100 - server sessions: 20 (max: 70) / 200 \
             | 'cli_sess'=50;90;95;0;100 'srv_sess'=20;180;190;0;200"
        );
    }

    #[test]
    fn sides_are_classified_separately() {
        // 185 server sessions would be fine against the client total
        let mut agent = session_agent(10, 185);
        let report = sessions(&mut agent, None, None).unwrap();
        assert_eq!(report.status(), Status::Warning);

        let mut agent = session_agent(96, 10);
        let report = sessions(&mut agent, None, None).unwrap();
        assert_eq!(report.status(), Status::Critical);
    }

    #[test]
    fn missing_session_data() {
        let mut agent = StaticAgent::new();
        agent
            .insert(CLIENT_CUR_CONNS, 1u64)
            .insert(CLIENT_MAX_CONNS, 1u64)
            .insert(CLIENT_TOT_CONNS, 10u64);
        let report = sessions(&mut agent, None, None).unwrap();
        assert_eq!(report.status(), Status::Unknown);
        assert_eq!(
            report.render(false),
            "UNKNOWN: client sessions: 1 (max: 1) / 10 - Failed to retrieve server session data"
        );
    }
}
