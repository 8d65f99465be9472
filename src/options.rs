// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use serde::{Deserialize, Serialize};


/// Controls how an activity is written as GPX.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpxOptions {
  /// Write one waypoint per lap start, named "Lap N".
  pub add_laps:       bool,
  /// Start a new track segment at every lap start.
  pub lap_segments:   bool,
  /// Start a new track segment at every break. Without this (and without
  /// `lap_segments`) all points share a single segment.
  pub break_segments: bool,
}

impl Default for GpxOptions {
  fn default() -> Self {
    Self { add_laps:       true,
           lap_segments:   false,
           break_segments: true, }
  }
}


/// Controls how an activity is written as CSV.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
  /// Leave out columns of fields no point ever had a value for.
  pub remove_unset: bool,
  /// Cell content for a field the point has no value for.
  pub unset_value:  String,
}

impl Default for CsvOptions {
  fn default() -> Self {
    Self { remove_unset: true,
           unset_value:  String::new(), }
  }
}


/// Options for all writers, the dispatcher picks what it needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
  pub gpx: GpxOptions,
  pub csv: CsvOptions,
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;


  #[test]
  fn defaults_test() {
    let options = WriteOptions::default();
    assert!(options.gpx.add_laps);
    assert!(!options.gpx.lap_segments);
    assert!(options.gpx.break_segments);
    assert!(options.csv.remove_unset);
    assert_eq!("", options.csv.unset_value);
  }

  #[test]
  fn deserialize_test() {
    let options: WriteOptions =
      serde_json::from_str(r#"{"gpx": {"lap_segments": true},
                               "csv": {"unset_value": "NA"}}"#).unwrap();
    assert_eq!(GpxOptions { add_laps:       true,
                            lap_segments:   true,
                            break_segments: true, },
               options.gpx);
    assert_eq!(CsvOptions { remove_unset: true,
                            unset_value:  "NA".to_string(), },
               options.csv);

    let options: WriteOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(WriteOptions::default(), options);
  }
}
