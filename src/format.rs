// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{csv, gpx_reader, gpx_writer, Activity, Result, TrackError,
            WriteOptions};
use serde::{Deserialize, Serialize};
use std::{fmt,
          fs,
          io::{BufRead, Write},
          path::Path,
          str::FromStr};
use tracing::debug;


/// The file formats an `Activity` can be read from and written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
  Gpx,
  Csv,
}

impl Format {
  /// All formats, in the order readers are tried without a hint.
  pub const ALL: [Format; 2] = [Format::Gpx, Format::Csv];

  pub fn extension(self) -> &'static str {
    match self {
      Format::Gpx => "gpx",
      Format::Csv => "csv",
    }
  }

  /// Guesses the format from the file extension, ignoring case.
  pub fn from_path(path: &Path) -> Option<Self> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    Self::ALL.iter()
             .copied()
             .find(|format| format.extension() == extension)
  }

  /// Reads an activity in this format.
  pub fn read<R: BufRead>(self, input: R) -> Result<Activity> {
    match self {
      Format::Gpx => gpx_reader::read(input),
      Format::Csv => csv::read(input),
    }
  }

  /// Writes `activity` in this format. Nothing is written to `out` unless
  /// the whole activity could be rendered.
  pub fn write<W: Write>(self,
                         activity: &Activity,
                         options: &WriteOptions,
                         out: &mut W)
                         -> Result<()> {
    match self {
      Format::Gpx => gpx_writer::write(activity, &options.gpx, out),
      Format::Csv => csv::write(activity, &options.csv, out),
    }
  }
}

impl fmt::Display for Format {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.extension().to_ascii_uppercase())
  }
}

impl FromStr for Format {
  type Err = String;

  fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
    let name = name.trim().to_ascii_lowercase();
    Self::ALL.iter()
             .copied()
             .find(|format| format.extension() == name)
             .ok_or_else(|| format!("unknown format '{}'", name))
  }
}


/// Reads an activity from `input`. With a `hint` only that format's reader
/// runs, otherwise every reader is tried in turn until one recognizes the
/// input. Only `FormatMismatch` falls through to the next reader.
pub fn read(input: &[u8], hint: Option<Format>) -> Result<Activity> {
  match hint {
    Some(format) => format.read(input),
    None => read_any(input, &Format::ALL),
  }
}

/// Reads an activity from the file at `path`. Without a `hint`, the format
/// matching the file extension is tried first.
pub fn read_file(path: &Path, hint: Option<Format>) -> Result<Activity> {
  let input = fs::read(path)?;
  if hint.is_some() {
    return read(&input, hint);
  }

  let preferred = Format::from_path(path);
  let order = preferred.into_iter()
                       .chain(Format::ALL.iter()
                                         .copied()
                                         .filter(|&format| {
                                           Some(format) != preferred
                                         }))
                       .collect::<Vec<_>>();
  read_any(&input, &order)
}

fn read_any(input: &[u8], order: &[Format]) -> Result<Activity> {
  let mut last = None;
  for &format in order {
    debug!("trying {} reader", format);
    match format.read(input) {
      Err(err) if err.is_format_mismatch() => last = Some(err),
      res => return res,
    }
  }
  Err(last.unwrap_or(TrackError::FormatMismatch(Format::Gpx)))
}

/// Writes `activity` in `format` to `out`.
pub fn write<W: Write>(activity: &Activity,
                       format: Format,
                       options: &WriteOptions,
                       out: &mut W)
                       -> Result<()> {
  debug!("writing {} points as {}", activity.number_of_points(), format);
  format.write(activity, options, out)
}

/// Writes `activity` to the file at `path`. Without an explicit `format` it
/// is derived from the file extension. The file is only created once the
/// activity was rendered successfully.
pub fn write_file(activity: &Activity,
                  path: &Path,
                  format: Option<Format>,
                  options: &WriteOptions)
                  -> Result<()> {
  let format = match format.or_else(|| Format::from_path(path)) {
    Some(format) => format,
    None => {
      return Err(TrackError::PreconditionViolated(format!(
        "unable to tell output format of {}",
        path.display()
      )))
    }
  };

  let mut rendered = Vec::new();
  write(activity, format, options, &mut rendered)?;
  fs::write(path, rendered)?;
  Ok(())
}
