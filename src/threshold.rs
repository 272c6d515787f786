//! Warning/critical threshold pairs
//!
//! Every metric a check reads is compared against a `Threshold`. Checks that
//! check several metrics at once take comma-separated lists on the command
//! line, e.g. `-w 0,40,0 -c 1,50,1`, which are split up with `pairs`.

use std::fmt;
use std::num;

use derive_more::From;

use crate::Status;

/// A warning and critical level for a single metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub warn: f64,
    pub crit: f64,
}

impl Threshold {
    pub fn new(warn: f64, crit: f64) -> Threshold {
        Threshold { warn, crit }
    }

    /// Compare a measured value against this pair
    ///
    /// Critical is checked first, so a pair with `warn > crit` still goes
    /// critical above `crit`.
    pub fn classify(&self, value: f64) -> Status {
        if value > self.crit {
            Status::Critical
        } else if value > self.warn {
            Status::Warning
        } else {
            Status::Ok
        }
    }

    /// Treat `warn` and `crit` as percentages of `total`
    pub fn of_total(&self, total: f64) -> Threshold {
        Threshold {
            warn: self.warn * total / 100.0,
            crit: self.crit * total / 100.0,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "warn > {}, crit > {}", self.warn, self.crit)
    }
}

#[derive(Debug, From)]
pub enum ThresholdError {
    /// One of the comma separated fields was not a number
    InvalidNumber(num::ParseFloatError),
    /// The list didn't have as many fields as the check needs
    #[from(ignore)]
    WrongArity {
        which: &'static str,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ThresholdError::InvalidNumber(ref e) => write!(f, "invalid threshold: {}", e),
            ThresholdError::WrongArity {
                which,
                expected,
                found,
            } => write!(
                f,
                "{} threshold needs {} comma-separated values, got {}",
                which, expected, found
            ),
        }
    }
}

impl std::error::Error for ThresholdError {}

/// Parse a comma separated list of numbers, e.g. `"1,40,1"`
pub fn parse_list(raw: &str) -> Result<Vec<f64>, ThresholdError> {
    raw.split(',')
        .map(|field| field.trim().parse::<f64>().map_err(ThresholdError::from))
        .collect()
}

fn list_or_default(
    which: &'static str,
    raw: Option<&str>,
    default: &[f64],
) -> Result<Vec<f64>, ThresholdError> {
    let values = match raw {
        Some(raw) => parse_list(raw)?,
        None => return Ok(default.to_vec()),
    };
    if values.len() != default.len() {
        return Err(ThresholdError::WrongArity {
            which,
            expected: default.len(),
            found: values.len(),
        });
    }
    Ok(values)
}

/// Build one `Threshold` per metric from the raw `-w`/`-c` arguments
///
/// Missing arguments fall back to the defaults, which also fix how many
/// values each list must have.
pub fn pairs(
    warn: Option<&str>,
    crit: Option<&str>,
    default_warn: &[f64],
    default_crit: &[f64],
) -> Result<Vec<Threshold>, ThresholdError> {
    let warn = list_or_default("warning", warn, default_warn)?;
    let crit = list_or_default("critical", crit, default_crit)?;
    Ok(warn
        .into_iter()
        .zip(crit)
        .map(|(w, c)| Threshold::new(w, c))
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classification_is_ordered() {
        let t = Threshold::new(80.0, 90.0);
        assert_eq!(t.classify(10.0), Status::Ok);
        assert_eq!(t.classify(80.0), Status::Ok);
        assert_eq!(t.classify(80.5), Status::Warning);
        assert_eq!(t.classify(90.0), Status::Warning);
        assert_eq!(t.classify(90.1), Status::Critical);
    }

    #[test]
    fn critical_is_checked_before_warning() {
        // the warning level is above the critical one
        let t = Threshold::new(5.0, 1.0);
        assert_eq!(t.classify(3.0), Status::Critical);
        assert_eq!(t.classify(1.0), Status::Ok);
    }

    #[test]
    fn percentages_scale_with_total() {
        let t = Threshold::new(85.0, 95.0).of_total(200.0);
        assert_eq!(t, Threshold::new(170.0, 190.0));
    }

    #[test]
    fn pairs_fall_back_to_defaults() {
        let ts = pairs(None, Some("2,60,3"), &[0.0, 40.0, 0.0], &[1.0, 50.0, 1.0]).unwrap();
        assert_eq!(
            ts,
            vec![
                Threshold::new(0.0, 2.0),
                Threshold::new(40.0, 60.0),
                Threshold::new(0.0, 3.0),
            ]
        );
    }

    #[test]
    fn pairs_reject_wrong_arity() {
        match pairs(Some("1,2"), None, &[0.0, 40.0, 0.0], &[1.0, 50.0, 1.0]) {
            Err(ThresholdError::WrongArity {
                which,
                expected,
                found,
            }) => {
                assert_eq!(which, "warning");
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected an arity error, got {:?}", other),
        }
    }

    #[test]
    fn pairs_reject_garbage() {
        let err = pairs(Some("1,x,3"), None, &[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0]).unwrap_err();
        assert!(err.to_string().starts_with("invalid threshold"));
    }
}
