// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{util, Activity, DataField, DataPoint, GpxOptions, Result};
use quick_xml::{events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
                Writer};
use std::{collections::BTreeSet, io::Write};
use tracing::debug;


const TRACK_NAME: &str = "Untitled";

/// Attributes of the `gpx` root element, in output order.
const ROOT_ATTRIBUTES: [(&str, &str); 7] =
  [("creator", "trackfile"),
   ("version", "1.1"),
   ("xmlns", "http://www.topografix.com/GPX/1/1"),
   ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
   ("xmlns:gpxtpx",
    "http://www.garmin.com/xmlschemas/TrackPointExtension/v1"),
   ("xmlns:gpxx", "http://www.garmin.com/xmlschemas/GpxExtensions/v3"),
   ("xsi:schemaLocation",
    "http://www.topografix.com/GPX/1/1 \
     http://www.topografix.com/GPX/1/1/gpx.xsd \
     http://www.garmin.com/xmlschemas/GpxExtensions/v3 \
     http://www.garmin.com/xmlschemas/GpxExtensionsv3.xsd \
     http://www.garmin.com/xmlschemas/TrackPointExtension/v1 \
     http://www.garmin.com/xmlschemas/TrackPointExtensionv1.xsd")];

/// Fields written into the track point extension block, in output order.
const EXTENSION_FIELDS: [(DataField, &str); 3] =
  [(DataField::HeartRate, "gpxtpx:hr"),
   (DataField::Cadence, "gpxtpx:cad"),
   (DataField::Temperature, "gpxtpx:atemp")];


/// Writes `activity` as a GPX document. The document is rendered completely
/// before anything reaches `out`, so on error `out` is left untouched.
///
/// Fails with `PreconditionViolated` if no point of the activity has a
/// position.
pub fn write<W: Write>(activity: &Activity,
                       options: &GpxOptions,
                       out: &mut W)
                       -> Result<()> {
  ensure!(activity.has_position(),
          "activity without latitude and longitude can't be written as GPX");

  let rendered = render(activity, options)?;
  out.write_all(&rendered)?;
  Ok(())
}

fn render(activity: &Activity, options: &GpxOptions) -> Result<Vec<u8>> {
  let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
  writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

  let mut root = BytesStart::new("gpx");
  for &attribute in &ROOT_ATTRIBUTES {
    root.push_attribute(attribute);
  }
  writer.write_event(Event::Start(root))?;

  if let Some(time) = start_time(activity).and_then(util::format_timestamp) {
    open(&mut writer, "metadata")?;
    text_element(&mut writer, "time", &time)?;
    close(&mut writer, "metadata")?;
  }

  if options.add_laps {
    for (lap_idx, &idx) in activity.lap_starts().iter().enumerate() {
      if let Some(point) = activity.point(idx) {
        write_lap(&mut writer, lap_idx + 1, point)?;
      }
    }
  }

  open(&mut writer, "trk")?;
  text_element(&mut writer, "name", TRACK_NAME)?;

  let boundaries = segment_boundaries(activity, options);
  debug!("writing {} points in {} segments",
         activity.number_of_points(),
         boundaries.len() + 1);

  open(&mut writer, "trkseg")?;
  for (idx, point) in activity.data_points().iter().enumerate() {
    if boundaries.contains(&idx) {
      close(&mut writer, "trkseg")?;
      open(&mut writer, "trkseg")?;
    }
    write_point(&mut writer, point)?;
  }
  close(&mut writer, "trkseg")?;
  close(&mut writer, "trk")?;
  close(&mut writer, "gpx")?;

  let mut rendered = writer.into_inner();
  rendered.push(b'\n');
  Ok(rendered)
}

/// Start time of the activity, or the first timestamp of any point.
fn start_time(activity: &Activity) -> Option<i64> {
  activity.start_time().or_else(|| {
                         activity.data_points()
                                 .iter()
                                 .find_map(|point| point.get(DataField::Timestamp))
                                 .map(|ts| ts as i64)
                       })
}

/// Indices at which a new track segment begins, besides 0.
fn segment_boundaries(activity: &Activity,
                      options: &GpxOptions)
                      -> BTreeSet<usize> {
  let mut boundaries = BTreeSet::new();
  if options.break_segments {
    boundaries.extend(activity.breaks().iter().copied());
  }
  if options.lap_segments {
    boundaries.extend(activity.lap_starts().iter().copied());
  }
  boundaries.remove(&0);
  boundaries
}

fn write_lap<W: Write>(writer: &mut Writer<W>,
                       number: usize,
                       point: &DataPoint)
                       -> Result<()> {
  writer.write_event(Event::Start(position("wpt", point)))?;
  if let Some(time) = timestamp(point) {
    text_element(writer, "time", &time)?;
  }
  text_element(writer, "name", &format!("Lap {}", number))?;
  close(writer, "wpt")
}

fn write_point<W: Write>(writer: &mut Writer<W>,
                         point: &DataPoint)
                         -> Result<()> {
  writer.write_event(Event::Start(position("trkpt", point)))?;

  if let Some(ele) = point.get(DataField::Altitude) {
    text_element(writer, "ele", &DataField::Altitude.format(ele))?;
  }
  if let Some(time) = timestamp(point) {
    text_element(writer, "time", &time)?;
  }

  let extensions = EXTENSION_FIELDS.iter()
                                   .filter_map(|&(field, tag)| {
                                     point.get(field)
                                          .map(|value| (tag, field.format(value)))
                                   })
                                   .collect::<Vec<_>>();
  if !extensions.is_empty() {
    open(writer, "extensions")?;
    open(writer, "gpxtpx:TrackPointExtension")?;
    for (tag, value) in extensions {
      text_element(writer, tag, &value)?;
    }
    close(writer, "gpxtpx:TrackPointExtension")?;
    close(writer, "extensions")?;
  }

  close(writer, "trkpt")
}

/// Start tag carrying the position of `point` as far as it's set.
fn position<'a>(name: &'a str, point: &DataPoint) -> BytesStart<'a> {
  let mut start = BytesStart::new(name);
  for &(field, key) in &[(DataField::Latitude, "lat"),
                         (DataField::Longitude, "lon")]
  {
    if let Some(value) = point.get(field) {
      start.push_attribute((key, field.format(value).as_str()));
    }
  }
  start
}

fn timestamp(point: &DataPoint) -> Option<String> {
  point.get(DataField::Timestamp)
       .and_then(|ts| util::format_timestamp(ts as i64))
}

fn open<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
  writer.write_event(Event::Start(BytesStart::new(name)))?;
  Ok(())
}

fn close<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
  writer.write_event(Event::End(BytesEnd::new(name)))?;
  Ok(())
}

fn text_element<W: Write>(writer: &mut Writer<W>,
                          name: &str,
                          text: &str)
                          -> Result<()> {
  open(writer, name)?;
  writer.write_event(Event::Text(BytesText::new(text)))?;
  close(writer, name)
}
