//! Read values from an SNMP agent
//!
//! The protocol itself is handled by the `snmp` crate, this module only adds
//! owned types for OIDs and values (the crate's types borrow its receive
//! buffer), a `walk` built on GETNEXT, and a way to join several table
//! columns into rows on their index.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::num;
use std::str::FromStr;
use std::time::Duration;

use derive_more::From;
use log::{debug, trace, warn};

/// A dotted object identifier, e.g. `.1.3.6.1.2.1.1.5.0`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(Vec<u32>);

impl Oid {
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The table index: everything after `prefix`
    pub fn index_after(&self, prefix: &Oid) -> Option<&[u32]> {
        if self.starts_with(prefix) {
            Some(&self.0[prefix.0.len()..])
        } else {
            None
        }
    }
}

impl<'a> From<&'a [u32]> for Oid {
    fn from(parts: &'a [u32]) -> Oid {
        Oid(parts.to_vec())
    }
}

#[derive(Debug, PartialEq)]
pub struct InvalidOid {
    pub oid: String,
    pub reason: String,
}

impl fmt::Display for InvalidOid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid OID '{}': {}", self.oid, self.reason)
    }
}

impl FromStr for Oid {
    type Err = InvalidOid;

    fn from_str(s: &str) -> Result<Oid, InvalidOid> {
        let trimmed = s.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(InvalidOid {
                oid: s.to_owned(),
                reason: "no sub-identifiers".to_owned(),
            });
        }
        trimmed
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, num::ParseIntError>>()
            .map(Oid)
            .map_err(|e| InvalidOid {
                oid: s.to_owned(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for part in &self.0 {
            write!(f, ".{}", part)?;
        }
        Ok(())
    }
}

/// An owned copy of a value returned by the agent
#[derive(Debug, Clone, PartialEq)]
pub enum SnmpValue {
    Boolean(bool),
    Integer(i64),
    Counter32(u32),
    Counter64(u64),
    Unsigned32(u32),
    Timeticks(u32),
    OctetString(Vec<u8>),
    ObjectIdentifier(Oid),
    IpAddress([u8; 4]),
    Null,
}

impl SnmpValue {
    /// Any of the integer types, or a string that holds a number
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            SnmpValue::Integer(i) => Some(i),
            SnmpValue::Counter32(c) | SnmpValue::Unsigned32(c) | SnmpValue::Timeticks(c) => {
                Some(i64::from(c))
            }
            SnmpValue::Counter64(c) if c <= i64::max_value() as u64 => Some(c as i64),
            SnmpValue::OctetString(ref bytes) => String::from_utf8_lossy(bytes).trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            SnmpValue::Counter64(c) => Some(c as f64),
            _ => self.as_i64().map(|i| i as f64),
        }
    }

    /// Human readable text, octet strings are decoded lossily as UTF-8
    pub fn text(&self) -> String {
        match *self {
            SnmpValue::OctetString(ref bytes) => String::from_utf8_lossy(bytes).into_owned(),
            _ => self.to_string(),
        }
    }

    /// Convert from the borrowed wire type
    ///
    /// The `snmp` crate can't decode the noSuchObject, noSuchInstance and
    /// endOfMibView exceptions. It drops those varbinds from the response, so
    /// they never get here and show up as an empty response instead.
    fn from_wire(value: ::snmp::Value) -> SnmpValue {
        use ::snmp::Value;
        match value {
            Value::Boolean(b) => SnmpValue::Boolean(b),
            Value::Null => SnmpValue::Null,
            Value::Integer(i) => SnmpValue::Integer(i),
            Value::OctetString(bytes) | Value::Opaque(bytes) => {
                SnmpValue::OctetString(bytes.to_vec())
            }
            Value::ObjectIdentifier(id) => {
                let mut buf = [0u32; 128];
                match id.read_name(&mut buf) {
                    Ok(name) => SnmpValue::ObjectIdentifier(Oid::from(name)),
                    Err(e) => {
                        warn!("undecodable OID value: {:?}", e);
                        SnmpValue::Null
                    }
                }
            }
            Value::IpAddress(ip) => SnmpValue::IpAddress(ip),
            Value::Counter32(c) => SnmpValue::Counter32(c),
            Value::Unsigned32(u) => SnmpValue::Unsigned32(u),
            Value::Timeticks(t) => SnmpValue::Timeticks(t),
            Value::Counter64(c) => SnmpValue::Counter64(c),
            other => {
                warn!("unexpected value type from agent: {:?}", other);
                SnmpValue::Null
            }
        }
    }
}

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SnmpValue::Boolean(b) => write!(f, "{}", b),
            SnmpValue::Integer(i) => write!(f, "{}", i),
            SnmpValue::Counter32(c) | SnmpValue::Unsigned32(c) | SnmpValue::Timeticks(c) => {
                write!(f, "{}", c)
            }
            SnmpValue::Counter64(c) => write!(f, "{}", c),
            SnmpValue::OctetString(ref bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            SnmpValue::ObjectIdentifier(ref oid) => write!(f, "{}", oid),
            SnmpValue::IpAddress(ip) => write!(f, "{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]),
            SnmpValue::Null => f.write_str("null"),
        }
    }
}

impl<'a> From<&'a str> for SnmpValue {
    fn from(s: &'a str) -> SnmpValue {
        SnmpValue::OctetString(s.as_bytes().to_vec())
    }
}

/// A single OID and the value the agent returned for it
#[derive(Debug, Clone, PartialEq)]
pub struct Varbind {
    pub oid: Oid,
    pub value: SnmpValue,
}

#[derive(Debug, From)]
pub enum SnmpError {
    /// Socket errors, including timeouts
    Io(io::Error),
    /// An OID constant that doesn't parse
    InvalidOid(InvalidOid),
    /// The request failed inside the SNMP library: send/receive errors
    /// (timeouts included) or an undecodable response
    Protocol(String),
    /// The agent answered with a non-zero error-status
    #[from(ignore)]
    Agent { status: u32, oid: Oid },
}

impl SnmpError {
    fn protocol(e: ::snmp::SnmpError) -> SnmpError {
        SnmpError::Protocol(format!("{:?}", e))
    }

    pub fn short_display(&self) -> String {
        match *self {
            SnmpError::Io(ref e) if e.kind() == io::ErrorKind::WouldBlock
                || e.kind() == io::ErrorKind::TimedOut =>
            {
                "timed out waiting for the agent".to_owned()
            }
            SnmpError::Io(_) => "network error".to_owned(),
            SnmpError::InvalidOid(_) => "invalid OID".to_owned(),
            SnmpError::Protocol(_) => "no valid response from agent".to_owned(),
            SnmpError::Agent { .. } => "agent error".to_owned(),
        }
    }
}

impl fmt::Display for SnmpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SnmpError::Io(ref e) => write!(f, "{}", e),
            SnmpError::InvalidOid(ref e) => write!(f, "{}", e),
            SnmpError::Protocol(ref e) => write!(f, "SNMP request failed: {}", e),
            SnmpError::Agent { status, ref oid } => {
                write!(f, "agent returned error-status {} for {}", status, oid)
            }
        }
    }
}

impl std::error::Error for SnmpError {}

/// Anything that can answer GET and GETNEXT requests
pub trait SnmpClient {
    /// The value at exactly `oid`, if the agent has one
    fn get(&mut self, oid: &Oid) -> Result<Option<SnmpValue>, SnmpError>;

    /// The first varbind after `oid` in the agent's MIB, `None` at its end
    fn get_next(&mut self, oid: &Oid) -> Result<Option<Varbind>, SnmpError>;

    /// Every varbind under `root`, in the agent's order
    fn walk(&mut self, root: &Oid) -> Result<Vec<Varbind>, SnmpError> {
        let mut found = Vec::new();
        let mut current = root.clone();
        while let Some(varbind) = self.get_next(&current)? {
            if !varbind.oid.starts_with(root) {
                break;
            }
            if varbind.oid <= current {
                warn!("agent is not advancing past {}, stopping walk", current);
                break;
            }
            trace!("{} = {:?}", varbind.oid, varbind.value);
            current = varbind.oid.clone();
            found.push(varbind);
        }
        debug!("walked {} values under {}", found.len(), root);
        Ok(found)
    }
}

/// One row of a table, a cell per column
///
/// A cell is `None` when the agent has no value for that column at the row's
/// index.
pub type Row = Vec<Option<SnmpValue>>;

/// Walk several columns of a table and join them into rows on the table index
///
/// The first column decides which rows exist and their order: indices that
/// only appear in the other columns are ignored.
pub fn walk_table<C: SnmpClient + ?Sized>(
    client: &mut C,
    columns: &[Oid],
) -> Result<Vec<Row>, SnmpError> {
    let (first, rest) = match columns.split_first() {
        Some(split) => split,
        None => return Ok(Vec::new()),
    };
    let keys = by_index(first, client.walk(first)?);
    let mut cells = Vec::with_capacity(rest.len());
    for column in rest {
        cells.push(
            by_index(column, client.walk(column)?)
                .into_iter()
                .collect::<BTreeMap<_, _>>(),
        );
    }

    Ok(keys
        .into_iter()
        .map(|(index, value)| {
            let mut row = Vec::with_capacity(columns.len());
            row.push(Some(value));
            for (column, cells) in rest.iter().zip(&cells) {
                let cell = cells.get(&index).cloned();
                if cell.is_none() {
                    debug!("no value for {} at index {:?}", column, index);
                }
                row.push(cell);
            }
            row
        })
        .collect())
}

fn by_index(column: &Oid, varbinds: Vec<Varbind>) -> Vec<(Vec<u32>, SnmpValue)> {
    varbinds
        .into_iter()
        .filter_map(|vb| {
            let index = vb.oid.index_after(column)?.to_vec();
            Some((index, vb.value))
        })
        .collect()
}

/// noSuchName, the v1 way of saying there is nothing after an OID
const NO_SUCH_NAME: u32 = 2;

/// Whether a GETNEXT response's error-status means the end of the MIB
///
/// Any other non-zero status is an error for `oid`.
fn end_of_mib(error_status: u32, oid: &Oid) -> Result<bool, SnmpError> {
    match error_status {
        0 => Ok(false),
        NO_SUCH_NAME => Ok(true),
        status => Err(SnmpError::Agent {
            status,
            oid: oid.clone(),
        }),
    }
}

/// An SNMP v2c session over UDP
pub struct V2cSession {
    session: ::snmp::SyncSession,
}

impl V2cSession {
    pub fn connect(
        host: &str,
        port: u16,
        community: &str,
        timeout: Duration,
    ) -> Result<V2cSession, SnmpError> {
        debug!("opening SNMP v2c session to {}:{}", host, port);
        let session =
            ::snmp::SyncSession::new((host, port), community.as_bytes(), Some(timeout), 0)?;
        Ok(V2cSession { session })
    }
}

impl SnmpClient for V2cSession {
    fn get(&mut self, oid: &Oid) -> Result<Option<SnmpValue>, SnmpError> {
        let pdu = self
            .session
            .get(oid.as_slice())
            .map_err(SnmpError::protocol)?;
        if pdu.error_status != 0 {
            return Err(SnmpError::Agent {
                status: pdu.error_status,
                oid: oid.clone(),
            });
        }
        let mut varbinds = pdu.varbinds;
        Ok(varbinds.next().map(|(_, value)| SnmpValue::from_wire(value)))
    }

    fn get_next(&mut self, oid: &Oid) -> Result<Option<Varbind>, SnmpError> {
        let pdu = self
            .session
            .getnext(oid.as_slice())
            .map_err(SnmpError::protocol)?;
        if end_of_mib(pdu.error_status, oid)? {
            return Ok(None);
        }
        let mut varbinds = pdu.varbinds;
        match varbinds.next() {
            Some((name, value)) => {
                let mut buf = [0u32; 128];
                let name = name.read_name(&mut buf).map_err(SnmpError::protocol)?;
                Ok(Some(Varbind {
                    oid: Oid::from(name),
                    value: SnmpValue::from_wire(value),
                }))
            }
            None => Ok(None),
        }
    }
}

/// An agent that answers from a fixed table of values
///
/// Useful to exercise checks without a device on the other end.
#[derive(Debug, Default)]
pub struct StaticAgent {
    values: BTreeMap<Oid, SnmpValue>,
}

impl StaticAgent {
    pub fn new() -> StaticAgent {
        StaticAgent::default()
    }

    pub fn insert<V: Into<SnmpValue>>(&mut self, oid: &str, value: V) -> &mut StaticAgent {
        match oid.parse() {
            Ok(oid) => {
                self.values.insert(oid, value.into());
            }
            Err(e) => warn!("ignoring value for {}", e),
        }
        self
    }

    /// Fill a table column: `values[i]` goes to `column.(i + 1)`
    pub fn column<V: Into<SnmpValue>>(&mut self, column: &str, values: Vec<V>) -> &mut StaticAgent {
        for (i, value) in values.into_iter().enumerate() {
            self.insert(&format!("{}.{}", column, i + 1), value);
        }
        self
    }
}

impl SnmpClient for StaticAgent {
    fn get(&mut self, oid: &Oid) -> Result<Option<SnmpValue>, SnmpError> {
        Ok(self.values.get(oid).cloned())
    }

    fn get_next(&mut self, oid: &Oid) -> Result<Option<Varbind>, SnmpError> {
        Ok(self
            .values
            .range(oid.clone()..)
            .find(|&(found, _)| found != oid)
            .map(|(found, value)| Varbind {
                oid: found.clone(),
                value: value.clone(),
            }))
    }
}

impl From<i64> for SnmpValue {
    fn from(i: i64) -> SnmpValue {
        SnmpValue::Integer(i)
    }
}

impl From<u64> for SnmpValue {
    fn from(c: u64) -> SnmpValue {
        SnmpValue::Counter64(c)
    }
}
