// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{util, DataField, DataPoint, Format, Lap, Result, TrackError,
            FIELD_COUNT};
use getset::{CopyGetters, Getters};
use serde::Serialize;


/// Format agnostic representation of one recorded activity. Every reader
/// builds one, every writer consumes one.
///
/// Points are only ever appended. Break indices mark the first point of a
/// new recording segment and lie in `[1, number_of_points)`, lap starts lie
/// in `[0, number_of_points)` and begin with 0. Both are strictly increasing.
#[derive(Clone, Debug, PartialEq, CopyGetters, Getters)]
pub struct Activity {
  #[getset(get = "pub")]
  data_points: Vec<DataPoint>,
  #[getset(get = "pub")]
  breaks:      Vec<usize>,
  #[getset(get = "pub")]
  lap_starts:  Vec<usize>,
  #[getset(get_copy = "pub")]
  start_time:  Option<i64>,
  #[getset(get_copy = "pub")]
  format:      Format,
  ever_set:    [bool; FIELD_COUNT],
}

impl Activity {
  pub fn new(format: Format) -> Self {
    Self { data_points: Vec::new(),
           breaks: Vec::new(),
           lap_starts: Vec::new(),
           start_time: None,
           format,
           ever_set: [false; FIELD_COUNT] }
  }

  // POINT LEVEL FUNCTIONS ------------------------------------------------- //
  /// Appends a finished point. Fails only if memory for the point can't be
  /// allocated.
  pub fn add_point(&mut self, point: DataPoint) -> Result<()> {
    self.data_points
        .try_reserve(1)
        .map_err(|err| TrackError::ResourceExhausted(err.to_string()))?;

    for (field, _) in point.iter() {
      self.ever_set[field.index()] = true;
    }
    if self.start_time.is_none() {
      self.start_time = point.get(DataField::Timestamp).map(|ts| ts as i64);
    }
    self.data_points.push(point);
    Ok(())
  }

  pub fn number_of_points(&self) -> usize {
    self.data_points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data_points.is_empty()
  }

  pub fn point(&self, idx: usize) -> Option<&DataPoint> {
    self.data_points.get(idx)
  }

  /// True if `field` held a value in at least one point.
  pub fn has_field(&self, field: DataField) -> bool {
    self.ever_set[field.index()]
  }

  /// All fields which were set in at least one point.
  pub fn fields(&self) -> Vec<DataField> {
    DataField::ALL.iter()
                  .copied()
                  .filter(|&field| self.has_field(field))
                  .collect()
  }

  pub fn has_position(&self) -> bool {
    self.has_field(DataField::Latitude) || self.has_field(DataField::Longitude)
  }

  // ACTIVITY LEVEL FUNCTIONS ---------------------------------------------- //
  /// Overrides the start time taken from the first timestamped point.
  pub fn set_start_time(&mut self, start_time: Option<i64>) {
    self.start_time = start_time;
  }

  /// Marks point `idx` as the first point of a new recording segment.
  pub fn add_break(&mut self, idx: usize) -> Result<()> {
    ensure!(idx >= 1 && idx < self.number_of_points(),
            "break index {} out of range",
            idx);
    ensure!(self.breaks.last().map_or(true, |&last| last < idx),
            "break index {} not after previous break",
            idx);
    self.breaks.push(idx);
    Ok(())
  }

  /// Replaces the lap start indices, which must start at 0, be strictly
  /// increasing and point at existing points.
  pub fn set_lap_starts(&mut self, lap_starts: Vec<usize>) -> Result<()> {
    if !lap_starts.is_empty() {
      ensure!(lap_starts[0] == 0, "first lap must start at index 0");
      ensure!(lap_starts.windows(2).all(|pair| pair[0] < pair[1]),
              "lap starts not strictly increasing");
      ensure!(lap_starts.last().map_or(true, |&last| {
                                 last < self.number_of_points()
                               }),
              "lap start out of range");
    }
    self.lap_starts = lap_starts;
    Ok(())
  }

  // LAP FUNCTIONS --------------------------------------------------------- //
  pub fn number_of_laps(&self) -> usize {
    self.lap_starts.len()
  }

  /// For lap with index `lap_idx`, request a `Lap` view. Returns an error if
  /// the activity does not contain a lap with that index.
  pub fn lap(&self, lap_idx: usize) -> Result<Lap> {
    ensure!(lap_idx < self.number_of_laps(), "lap_idx out of range");

    let start = self.lap_starts[lap_idx];
    let end = self.lap_starts
                  .get(lap_idx + 1)
                  .copied()
                  .unwrap_or_else(|| self.number_of_points());
    let timestamp = |idx: usize| {
      self.data_points[idx].get(DataField::Timestamp)
                           .map(|ts| ts as i64)
    };
    Ok(Lap::new(lap_idx, start, end, timestamp(start), timestamp(end - 1)))
  }

  /// Request `Lap` views for all laps of this activity.
  pub fn all_laps(&self) -> Result<Vec<Lap>> {
    (0..self.number_of_laps()).map(|lap_idx| self.lap(lap_idx))
                              .collect()
  }

  /// Short description of the activity, e.g. for printing.
  pub fn summary(&self) -> Result<Summary> {
    Ok(Summary { format:     self.format,
                 start_time: self.start_time.and_then(util::format_timestamp),
                 points:     self.number_of_points(),
                 fields:     self.fields(),
                 breaks:     self.breaks.clone(),
                 laps:       self.all_laps()?, })
  }
}


/// Serializable overview over an `Activity`.
#[derive(Debug, PartialEq, Serialize)]
pub struct Summary {
  pub format:     Format,
  pub start_time: Option<String>,
  pub points:     usize,
  pub fields:     Vec<DataField>,
  pub breaks:     Vec<usize>,
  pub laps:       Vec<Lap>,
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::{assert_eq, assert_ne};


  fn point(ts: f64, hr: Option<f64>) -> DataPoint {
    let mut point = DataPoint::new();
    point.set(DataField::Timestamp, ts);
    point.set(DataField::Latitude, 51.5);
    point.set(DataField::Longitude, -0.1);
    if let Some(hr) = hr {
      point.set(DataField::HeartRate, hr);
    }
    point
  }

  fn activity(count: usize) -> Activity {
    let mut activity = Activity::new(Format::Gpx);
    for idx in 0..count {
      activity.add_point(point(100.0 * (idx + 1) as f64, None))
              .unwrap();
    }
    activity
  }

  #[test]
  fn activity_test() {
    let mut activity = Activity::new(Format::Csv);
    assert!(activity.is_empty());
    assert_eq!(None, activity.start_time());
    assert!(!activity.has_position());

    activity.add_point(point(100.0, None)).unwrap();
    activity.add_point(point(200.0, Some(142.0))).unwrap();
    assert_eq!(2, activity.number_of_points());
    assert_eq!(Some(100), activity.start_time());
    assert_eq!(Format::Csv, activity.format());
    assert!(activity.has_position());
    assert!(activity.has_field(DataField::HeartRate));
    assert!(!activity.has_field(DataField::Cadence));
    assert_eq!(vec![DataField::Timestamp,
                    DataField::Latitude,
                    DataField::Longitude,
                    DataField::HeartRate],
               activity.fields());
    assert_eq!(None, activity.point(0).unwrap().get(DataField::HeartRate));

    activity.set_start_time(Some(42));
    assert_eq!(Some(42), activity.start_time());
    assert_ne!(activity, Activity::new(Format::Csv));
  }

  #[test]
  fn add_break_test() {
    let mut activity = activity(5);
    assert!(activity.add_break(0).is_err());
    assert!(activity.add_break(5).is_err());
    activity.add_break(2).unwrap();
    assert!(activity.add_break(2).is_err());
    assert!(activity.add_break(1).is_err());
    activity.add_break(4).unwrap();
    assert_eq!(&vec![2, 4], activity.breaks());
  }

  #[test]
  fn set_lap_starts_test() {
    let mut activity = activity(5);
    assert!(activity.set_lap_starts(vec![1, 3]).is_err());
    assert!(activity.set_lap_starts(vec![0, 3, 3]).is_err());
    assert!(activity.set_lap_starts(vec![0, 5]).is_err());
    assert!(activity.lap_starts().is_empty());

    activity.set_lap_starts(vec![0, 3]).unwrap();
    assert_eq!(&vec![0, 3], activity.lap_starts());
    activity.set_lap_starts(Vec::new()).unwrap();
    assert_eq!(0, activity.number_of_laps());
  }

  #[test]
  fn lap_test() {
    let mut activity = activity(5);
    activity.set_lap_starts(vec![0, 3]).unwrap();
    assert_eq!(2, activity.number_of_laps());

    let lap = activity.lap(1).unwrap();
    assert_eq!(1, lap.number());
    assert_eq!(3, lap.start());
    assert_eq!(5, lap.end());
    assert_eq!(2, lap.len());
    assert_eq!(Some(400), lap.start_time());
    assert_eq!(Some(100), lap.duration());
    assert!(activity.lap(2).is_err());

    let laps = activity.all_laps().unwrap();
    assert_eq!(2, laps.len());
    assert_eq!(Some(200), laps[0].duration());
    assert_ne!(laps[0], laps[1]);
  }

  #[test]
  fn summary_test() {
    let mut activity = activity(3);
    activity.add_break(2).unwrap();
    activity.set_lap_starts(vec![0, 1]).unwrap();

    let summary = activity.summary().unwrap();
    assert_eq!(Format::Gpx, summary.format);
    assert_eq!(Some("1970-01-01T00:01:40Z".to_string()), summary.start_time);
    assert_eq!(3, summary.points);
    assert_eq!(vec![2], summary.breaks);
    assert_eq!(2, summary.laps.len());
  }
}
