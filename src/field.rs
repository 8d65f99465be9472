// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{util, Result, TrackError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;


/// Number of fields every `DataPoint` holds.
pub const FIELD_COUNT: usize = 12;


/// The closed set of values a track point can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataField {
  Timestamp,
  Latitude,
  Longitude,
  Altitude,
  Distance,
  Speed,
  Power,
  Grade,
  HeartRate,
  Cadence,
  #[serde(rename = "lr_balance")]
  LRBalance,
  Temperature,
}

impl DataField {
  pub const ALL: [DataField; FIELD_COUNT] = [DataField::Timestamp,
                                             DataField::Latitude,
                                             DataField::Longitude,
                                             DataField::Altitude,
                                             DataField::Distance,
                                             DataField::Speed,
                                             DataField::Power,
                                             DataField::Grade,
                                             DataField::HeartRate,
                                             DataField::Cadence,
                                             DataField::LRBalance,
                                             DataField::Temperature];

  pub fn index(self) -> usize {
    self as usize
  }

  /// Canonical (tabular) name of the field.
  pub fn name(self) -> &'static str {
    match self {
      DataField::Timestamp => "timestamp",
      DataField::Latitude => "latitude",
      DataField::Longitude => "longitude",
      DataField::Altitude => "altitude",
      DataField::Distance => "distance",
      DataField::Speed => "speed",
      DataField::Power => "power",
      DataField::Grade => "grade",
      DataField::HeartRate => "heart_rate",
      DataField::Cadence => "cadence",
      DataField::LRBalance => "lr_balance",
      DataField::Temperature => "temperature",
    }
  }

  /// Number of decimal places used whenever a value of this field is
  /// written, regardless of the output format.
  pub fn precision(self) -> usize {
    match self {
      DataField::Latitude | DataField::Longitude => 7,
      DataField::Altitude
      | DataField::Distance
      | DataField::Speed
      | DataField::Grade => 2,
      _ => 0,
    }
  }

  /// Formats `value` with the fixed precision of this field.
  pub fn format(self, value: f64) -> String {
    format!("{:.*}", self.precision(), value)
  }
}

impl fmt::Display for DataField {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}


/// One sample of an activity. Every field is either set or unset; zero is a
/// perfectly legal recorded value and must not be confused with unset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DataPoint {
  values: [Option<f64>; FIELD_COUNT],
}

impl DataPoint {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, field: DataField) -> Option<f64> {
    self.values[field.index()]
  }

  pub fn set(&mut self, field: DataField, value: f64) {
    self.values[field.index()] = Some(value);
  }

  pub fn unset(&mut self, field: DataField) {
    self.values[field.index()] = None;
  }

  pub fn is_set(&self, field: DataField) -> bool {
    self.get(field).is_some()
  }

  /// Unsets all fields.
  pub fn clear(&mut self) {
    self.values = [None; FIELD_COUNT];
  }

  /// Iterates all set fields in `DataField::ALL` order.
  pub fn iter(&self) -> impl Iterator<Item = (DataField, f64)> + '_ {
    DataField::ALL.iter()
                  .filter_map(move |&field| self.get(field).map(|v| (field, v)))
  }
}


/// Parses `text` into `field` of `point`. On malformed input the field is
/// left unset and the error is only logged, a single bad value never aborts
/// a read.
///
/// Numbers are read as far as a valid numeric prefix extends and trailing
/// garbage is ignored (`"142 bpm"` reads as `142`). Tabular files written by
/// other tools rely on that.
pub fn parse_field(field: DataField, point: &mut DataPoint, text: &str) {
  if let Err(err) = try_parse_field(field, point, text) {
    debug!("{}", err);
  }
}

/// Same as `parse_field`, but hands the `FieldUnparseable` back to the
/// caller.
pub fn try_parse_field(field: DataField,
                       point: &mut DataPoint,
                       text: &str)
                       -> Result<()> {
  let value = match field {
    DataField::Timestamp => parse_timestamp_value(text),
    _ => util::numeric_prefix(text),
  };

  match value {
    Some(value) => {
      point.set(field, value);
      Ok(())
    }
    None => {
      point.unset(field);
      Err(TrackError::FieldUnparseable { field,
                                         text: text.to_string() })
    }
  }
}

/// Timestamps are date-time text in track files and plain epoch seconds in
/// tabular files. Text that looks like a date but doesn't parse as one is
/// rejected instead of being read as its leading year.
fn parse_timestamp_value(text: &str) -> Option<f64> {
  if let Some(secs) = util::parse_timestamp(text) {
    return Some(secs as f64);
  }
  let trimmed = text.trim();
  let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
  if unsigned.contains(|c: char| c == '-' || c == ':' || c == 'T') {
    return None;
  }
  util::numeric_prefix(trimmed).map(f64::trunc)
}
