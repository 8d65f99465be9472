// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{field::parse_field, Activity, CsvOptions, DataField, DataPoint,
            Format, Result, TrackError};
use lazy_static::lazy_static;
use std::{collections::HashMap,
          io::{self, BufRead, Write}};
use tracing::debug;


const SEPARATOR: char = ',';


lazy_static! {
  /// Column names accepted for each field, lower case.
  static ref COLUMN_ALIASES: HashMap<&'static str, DataField> = {
    let aliases: &[(DataField, &[&'static str])] = &[
      (DataField::Timestamp, &["timestamp", "time"]),
      (DataField::Latitude, &["latitude", "lat"]),
      (DataField::Longitude, &["longitude", "lon", "long"]),
      (DataField::Altitude, &["altitude", "elevation", "alt", "ele"]),
      (DataField::Distance, &["distance", "dist"]),
      (DataField::Speed, &["speed", "spd"]),
      (DataField::Power, &["power", "pow", "watts"]),
      (DataField::Grade, &["slope", "grade", "gradient"]),
      (DataField::HeartRate, &["heart_rate", "hr"]),
      (DataField::Cadence, &["cadence", "cad"]),
      (DataField::LRBalance, &["balance", "bal", "lr_balance"]),
      (DataField::Temperature, &["temperature", "atemp", "temp"]),
    ];

    let mut columns = HashMap::new();
    for (field, names) in aliases {
      for &name in names.iter() {
        columns.insert(name, *field);
      }
    }
    columns
  };
}


/// Maps a header cell to the field it names.
fn column_field(name: &str) -> Option<DataField> {
  COLUMN_ALIASES.get(name.trim().to_ascii_lowercase().as_str())
                .copied()
}

/// Resolves the header line into `(column index, field)` pairs. If two
/// columns name the same field, the later one is used.
fn parse_header(header: &str) -> Vec<(usize, DataField)> {
  let mut columns: Vec<(usize, DataField)> = Vec::new();
  for (col, name) in header.split(SEPARATOR).enumerate() {
    let field = match column_field(name) {
      Some(field) => field,
      None => {
        debug!("ignoring column {:?}", name.trim());
        continue;
      }
    };
    match columns.iter_mut().find(|(_, known)| *known == field) {
      Some(column) => column.0 = col,
      None => columns.push((col, field)),
    }
  }
  columns
}


/// Reads a CSV activity. The first line names the columns, every further
/// non-blank line is one point.
///
/// Fails with `FormatMismatch` if the header names no known field and with
/// `MalformedInput` if there are no rows.
pub fn read<R: BufRead>(mut input: R) -> Result<Activity> {
  let mut header = String::new();
  match input.read_line(&mut header) {
    Ok(_) => {}
    Err(err) if err.kind() == io::ErrorKind::InvalidData => {
      debug!("not reading as CSV: {}", err);
      return Err(TrackError::FormatMismatch(Format::Csv));
    }
    Err(err) => return Err(err.into()),
  }

  let columns = parse_header(&header);
  if columns.is_empty() {
    debug!("no known column in header {:?}", header.trim());
    return Err(TrackError::FormatMismatch(Format::Csv));
  }

  let mut activity = Activity::new(Format::Csv);
  for line in input.lines() {
    let line = match line {
      Ok(line) => line,
      Err(err) if err.kind() == io::ErrorKind::InvalidData => {
        return malformed!("row {} is not valid UTF-8",
                          activity.number_of_points() + 1)
      }
      Err(err) => return Err(err.into()),
    };
    if line.trim().is_empty() {
      continue;
    }

    let cells = line.split(SEPARATOR).map(str::trim).collect::<Vec<_>>();
    let mut point = DataPoint::new();
    for &(col, field) in &columns {
      match cells.get(col) {
        Some(cell) if !cell.is_empty() => parse_field(field, &mut point, cell),
        _ => {}
      }
    }
    activity.add_point(point)?;
  }

  if activity.is_empty() {
    return malformed!("no rows");
  }
  Ok(activity)
}


/// Writes `activity` as CSV with the canonical field names as header. The
/// table is rendered completely before anything reaches `out`.
pub fn write<W: Write>(activity: &Activity,
                       options: &CsvOptions,
                       out: &mut W)
                       -> Result<()> {
  let fields = if options.remove_unset {
    activity.fields()
  } else {
    DataField::ALL.to_vec()
  };

  let mut rendered = String::new();
  let header = fields.iter().map(|field| field.name()).collect::<Vec<_>>();
  rendered.push_str(&header.join(","));
  rendered.push('\n');

  for point in activity.data_points() {
    let row = fields.iter()
                    .map(|&field| match point.get(field) {
                      Some(value) => field.format(value),
                      None => options.unset_value.clone(),
                    })
                    .collect::<Vec<_>>();
    rendered.push_str(&row.join(","));
    rendered.push('\n');
  }

  out.write_all(rendered.as_bytes())?;
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use std::{fs::File, io::BufReader};


  const CSV_PATH: &str = "./testdata/ride.csv";
  const GPX_PATH: &str = "./testdata/simple.gpx";

  fn read_path(path: &str) -> Result<Activity> {
    read(BufReader::new(File::open(path).unwrap()))
  }

  fn write_str(activity: &Activity, options: &CsvOptions) -> String {
    let mut out = Vec::new();
    write(activity, options, &mut out).unwrap();
    String::from_utf8(out).unwrap()
  }

  #[test]
  fn header_test() {
    assert_eq!(Some(DataField::Timestamp), column_field(" Time "));
    assert_eq!(Some(DataField::Longitude), column_field("LONG"));
    assert_eq!(Some(DataField::Grade), column_field("slope"));
    assert_eq!(Some(DataField::LRBalance), column_field("bal"));
    assert_eq!(None, column_field("comment"));

    assert_eq!(vec![(0, DataField::HeartRate), (2, DataField::Power)],
               parse_header("heart_rate,name,watts"));
    // last column wins
    assert_eq!(vec![(3, DataField::Altitude), (1, DataField::Latitude)],
               parse_header("ele,lat,x,altitude"));
  }

  #[test]
  fn read_test() {
    let activity = read_path(CSV_PATH).unwrap();

    assert_eq!(Format::Csv, activity.format());
    assert_eq!(4, activity.number_of_points());
    assert!(activity.breaks().is_empty());
    assert!(activity.lap_starts().is_empty());
    assert_eq!(Some(1401616800), activity.start_time());
    assert_eq!(vec![DataField::Timestamp,
                    DataField::Latitude,
                    DataField::Longitude,
                    DataField::Altitude,
                    DataField::Power,
                    DataField::Grade,
                    DataField::HeartRate],
               activity.fields());

    let first = activity.point(0).unwrap();
    assert_eq!(Some(1401616800.0), first.get(DataField::Timestamp));
    assert_eq!(Some(46.0), first.get(DataField::Latitude));
    assert_eq!(Some(1000.0), first.get(DataField::Altitude));
    assert_eq!(Some(200.0), first.get(DataField::Power));
    assert_eq!(Some(1.5), first.get(DataField::Grade));

    // empty cell
    assert_eq!(None, activity.point(1).unwrap().get(DataField::Power));
    // "n/a"
    assert_eq!(None, activity.point(2).unwrap().get(DataField::HeartRate));
    // "215w", the blank line before is skipped
    let last = activity.point(3).unwrap();
    assert_eq!(Some(215.0), last.get(DataField::Power));
    assert_eq!(Some(1401616803.0), last.get(DataField::Timestamp));
  }

  #[test]
  fn short_rows_test() {
    let activity = read("lat,lon,hr\n1.5,2.5\n\n3.5\n".as_bytes()).unwrap();
    assert_eq!(2, activity.number_of_points());
    assert_eq!(Some(2.5), activity.point(0).unwrap().get(DataField::Longitude));
    assert_eq!(None, activity.point(0).unwrap().get(DataField::HeartRate));
    assert_eq!(None, activity.point(1).unwrap().get(DataField::Longitude));
    assert!(!activity.has_field(DataField::HeartRate));
  }

  #[test]
  fn format_mismatch_test() {
    assert!(read_path(GPX_PATH).unwrap_err().is_format_mismatch());
    assert!(read("name,comment\nx,y\n".as_bytes()).unwrap_err()
                                               .is_format_mismatch());
    assert!(read("".as_bytes()).unwrap_err().is_format_mismatch());
    assert!(read(&[0xffu8, 0xfe, b',', b'\n'][..]).unwrap_err()
                                                .is_format_mismatch());
  }

  #[test]
  fn no_rows_test() {
    match read("timestamp,hr\n\n  \n".as_bytes()) {
      Err(TrackError::MalformedInput(msg)) => assert_eq!("no rows", msg),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn write_test() {
    let activity = read_path(CSV_PATH).unwrap();
    let expected = "timestamp,latitude,longitude,altitude,power,grade,heart_rate
1401616800,46.0000000,7.0000000,1000.00,200,1.50,120
1401616801,46.0001000,7.0001000,1000.50,,1.75,121
1401616802,46.0002000,7.0002000,1001.25,210,2.00,
1401616803,46.0003000,7.0003000,1002.00,215,2.25,123
";
    let written = write_str(&activity, &CsvOptions::default());
    assert_eq!(expected, written);

    let reread = read(written.as_bytes()).unwrap();
    assert_eq!(activity.data_points(), reread.data_points());
    assert_eq!(written, write_str(&reread, &CsvOptions::default()));
  }

  #[test]
  fn keep_unset_test() {
    let mut activity = Activity::new(Format::Csv);
    let mut point = DataPoint::new();
    point.set(DataField::HeartRate, 0.0);
    activity.add_point(point).unwrap();

    let options = CsvOptions { remove_unset: false,
                               unset_value:  "NA".to_string(), };
    let written = write_str(&activity, &options);
    let mut lines = written.lines();
    assert_eq!(Some("timestamp,latitude,longitude,altitude,distance,speed,\
                     power,grade,heart_rate,cadence,lr_balance,temperature"),
               lines.next());
    assert_eq!(Some("NA,NA,NA,NA,NA,NA,NA,NA,0,NA,NA,NA"), lines.next());
    assert_eq!(None, lines.next());

    // zero is a value, not unset
    let written = write_str(&activity, &CsvOptions::default());
    assert_eq!("heart_rate\n0\n", written);
  }
}
