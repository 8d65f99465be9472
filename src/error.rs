// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{DataField, Format};
use std::{io, result};
use thiserror::Error;


/// trackfile's result type, `Err` is always a `TrackError`.
pub type Result<T> = result::Result<T, TrackError>;


/// Everything that can go wrong while reading or writing an activity.
///
/// Readers return `FormatMismatch` when the input is simply not in their
/// format; a dispatcher should try the next reader in that case. All other
/// variants are genuine failures of the respective read or write.
///
/// It is recommended to build the string carrying variants through the
/// `malformed!` and `ensure!` macros, which accept the same parameters as
/// the `format!` macro.
#[derive(Debug, Error)]
pub enum TrackError {
  #[error("input is not a {0} file")]
  FormatMismatch(Format),
  #[error("malformed input: {0}")]
  MalformedInput(String),
  #[error("unable to parse {field} from {text:?}")]
  FieldUnparseable { field: DataField, text: String },
  #[error("resource exhausted: {0}")]
  ResourceExhausted(String),
  #[error("precondition violated: {0}")]
  PreconditionViolated(String),
  #[error(transparent)]
  Io(#[from] io::Error),
  #[error("xml error: {0}")]
  Xml(#[from] quick_xml::Error),
}

impl TrackError {
  /// True if the reader did not recognize its format at all, i.e. the
  /// caller should try a different reader.
  pub fn is_format_mismatch(&self) -> bool {
    matches!(self, TrackError::FormatMismatch(_))
  }
}


/// The `malformed!` macro returns an `Err(TrackError::MalformedInput)` from
/// `format!` style arguments:
///
/// ```ignore
/// match depth {
///   0 => Ok(()),
///   _ => malformed!("input ended inside <{}>", name),
/// }
/// ```
#[macro_export]
macro_rules! malformed {
  ($($arg:tt)*) => {
    Err($crate::TrackError::MalformedInput(format!($($arg)*)))
  }
}


/// The `ensure!` macro makes sure a condition holds and otherwise returns
/// early with `Err(TrackError::PreconditionViolated)`:
///
/// ```ignore
/// fn set_laps(&mut self, laps: Vec<usize>) -> Result<()> {
///   ensure!(laps.first() == Some(&0), "laps must start at 0");
/// }
/// ```
#[macro_export]
macro_rules! ensure {
  ($cond:expr, $($arg:tt)*) => {
    if !($cond) {
      return Err($crate::TrackError::PreconditionViolated(
        format!($($arg)*)
      ));
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;


  #[test]
  fn malformed_test() {
    let res: Result<()> = malformed!("input ended inside <{}>", "trkpt");
    match res {
      Err(TrackError::MalformedInput(msg)) => {
        assert_eq!("input ended inside <trkpt>", msg)
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn ensure_test() {
    fn wrapper(cond: bool, msg: &str) -> Result<()> {
      ensure!(cond, "{}", msg);
      Ok(())
    }

    assert!(wrapper(true, "warblgarbl").is_ok());
    let err = wrapper(false, "warblgarbl").unwrap_err();
    assert_eq!("precondition violated: warblgarbl", err.to_string());
    assert!(!err.is_format_mismatch());
  }

  #[test]
  fn format_mismatch_test() {
    let err = TrackError::FormatMismatch(Format::Gpx);
    assert!(err.is_format_mismatch());
    assert_eq!("input is not a GPX file", err.to_string());

    let err = TrackError::FieldUnparseable { field: DataField::HeartRate,
                                             text:  "abc".to_string() };
    assert_eq!("unable to parse heart_rate from \"abc\"", err.to_string());
  }
}
