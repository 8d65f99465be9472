// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{field::parse_field, lap, util, Activity, DataField, DataPoint,
            Format, Result, TrackError, TreeEvent, TreeEvents};
use lazy_static::lazy_static;
use std::{collections::HashMap, io::BufRead, mem};
use tracing::{debug, warn};


const ROOT: &str = "gpx";


lazy_static! {
  /// Leaf elements of a track point and the field they carry. Vendor
  /// extensions spell the same field differently, so several tags may map
  /// to one field.
  static ref POINT_FIELDS: HashMap<&'static str, DataField> = {
    let mut fields = HashMap::new();
    fields.insert("time", DataField::Timestamp);
    fields.insert("ele", DataField::Altitude);
    fields.insert("gpxtpx:hr", DataField::HeartRate);
    fields.insert("gpxdata:hr", DataField::HeartRate);
    fields.insert("gpxtpx:cad", DataField::Cadence);
    fields.insert("gpxdata:cadence", DataField::Cadence);
    fields.insert("gpxtpx:atemp", DataField::Temperature);
    fields.insert("gpxdata:temp", DataField::Temperature);
    fields.insert("gpxdata:bikepower", DataField::Power);
    fields
  };
}


/// Everything a GPX read needs to remember between two events. One context
/// belongs to exactly one read; `finish` hands over the activity.
#[derive(Debug)]
pub struct ReadContext {
  activity:       Activity,
  root:           bool,
  metadata:       bool,
  waypoint:       bool,
  segment:        bool,
  in_point:       bool,
  point:          DataPoint,
  lap_times:      Vec<i64>,
  lap_cursor:     usize,
  lap_candidates: Vec<usize>,
}

impl Default for ReadContext {
  fn default() -> Self {
    Self::new()
  }
}

impl ReadContext {
  pub fn new() -> Self {
    Self { activity:       Activity::new(Format::Gpx),
           root:           false,
           metadata:       false,
           waypoint:       false,
           segment:        false,
           in_point:       false,
           point:          DataPoint::new(),
           lap_times:      Vec::new(),
           lap_cursor:     0,
           lap_candidates: Vec::new(), }
  }

  /// True once the GPX root element has been seen.
  pub fn root_recognized(&self) -> bool {
    self.root
  }

  /// Feeds one event into the read. Fails with `FormatMismatch` if the very
  /// first element isn't the GPX root.
  pub fn handle(&mut self, event: &TreeEvent) -> Result<()> {
    match event {
      TreeEvent::Open { name, attributes } => self.open(name, attributes),
      TreeEvent::Close { name, text } => self.close(name, text.as_deref()),
    }
  }

  fn open(&mut self, name: &str, attributes: &[(String, String)]) -> Result<()> {
    if !self.root {
      if name != ROOT {
        debug!("root element <{}> is not <{}>", name, ROOT);
        return Err(TrackError::FormatMismatch(Format::Gpx));
      }
      self.root = true;
      return Ok(());
    }
    if self.metadata {
      return Ok(());
    }

    match name {
      "metadata" => self.metadata = true,
      "wpt" => self.waypoint = true,
      "trkseg" => self.segment = true,
      "trkpt" => {
        self.in_point = true;
        self.point.clear();
        for (key, value) in attributes {
          match key.as_str() {
            "lat" => parse_field(DataField::Latitude, &mut self.point, value),
            "lon" => parse_field(DataField::Longitude, &mut self.point, value),
            _ => {}
          }
        }
      }
      _ => {}
    }
    Ok(())
  }

  fn close(&mut self, name: &str, text: Option<&str>) -> Result<()> {
    if name == "metadata" {
      self.metadata = false;
      return Ok(());
    }
    if self.metadata {
      if name == "time" {
        let start_time = text.and_then(util::parse_timestamp);
        if start_time.is_some() {
          self.activity.set_start_time(start_time);
        }
      }
      return Ok(());
    }

    match name {
      "wpt" => self.waypoint = false,
      "time" if self.waypoint => {
        match text.and_then(util::parse_timestamp) {
          Some(lap_time) => self.lap_times.push(lap_time),
          None => debug!("ignoring lap marker without valid time {:?}", text),
        }
      }
      "trkpt" if self.in_point => self.finish_point()?,
      _ if self.in_point => {
        if let (Some(&field), Some(text)) = (POINT_FIELDS.get(name), text) {
          parse_field(field, &mut self.point, text);
        }
      }
      _ => {}
    }
    Ok(())
  }

  fn finish_point(&mut self) -> Result<()> {
    self.in_point = false;
    let point = mem::take(&mut self.point);
    let timestamp = point.get(DataField::Timestamp);
    self.activity.add_point(point)?;
    let idx = self.activity.number_of_points() - 1;

    if let Some(timestamp) = timestamp {
      while let Some(&lap_time) = self.lap_times.get(self.lap_cursor) {
        let lap_time = lap_time as f64;
        if lap_time < timestamp {
          // markers come in chronological order, this one can't match
          // anymore
          self.lap_cursor += 1;
          continue;
        }
        if lap_time == timestamp {
          self.lap_candidates.push(idx);
          self.lap_cursor += 1;
        }
        break;
      }
    }

    if self.segment {
      self.segment = false;
      if idx > 0 {
        self.activity.add_break(idx)?;
      }
    }
    Ok(())
  }

  /// Ends the read and hands over the activity, with lap markers turned into
  /// lap starts.
  pub fn finish(mut self) -> Result<Activity> {
    if !self.root {
      return Err(TrackError::FormatMismatch(Format::Gpx));
    }
    if self.in_point {
      return malformed!("input ended inside <trkpt>");
    }
    if self.activity.is_empty() {
      return malformed!("no track points");
    }

    let unmatched = self.lap_times.len() - self.lap_candidates.len();
    if unmatched > 0 {
      warn!("{} lap markers match no track point", unmatched);
    }
    if !self.lap_candidates.is_empty() {
      let laps = lap::reconcile(&self.lap_candidates,
                                self.activity.breaks(),
                                self.activity.number_of_points());
      self.activity.set_lap_starts(laps)?;
    }
    Ok(self.activity)
  }
}


/// Reads a GPX document in a single pass.
pub fn read<R: BufRead>(input: R) -> Result<Activity> {
  read_events(TreeEvents::new(input))
}

/// Reads a GPX document from any source of tree events. Errors of the event
/// source before the root element was recognized mean the input isn't GPX
/// at all and are reported as `FormatMismatch`.
pub fn read_events<I>(events: I) -> Result<Activity>
  where I: IntoIterator<Item = Result<TreeEvent>>
{
  let mut context = ReadContext::new();
  for event in events {
    let event = match event {
      Ok(event) => event,
      Err(err) if !context.root_recognized() => {
        debug!("not reading as GPX: {}", err);
        return Err(TrackError::FormatMismatch(Format::Gpx));
      }
      Err(err) => return Err(err),
    };
    context.handle(&event)?;
  }
  context.finish()
}
