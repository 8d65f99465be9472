// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

//! Reading and writing of recorded activity tracks.
//!
//! Every reader builds an [`Activity`], every writer consumes one. GPX is
//! read in a single pass over a stream of [`TreeEvent`]s; lap markers found
//! in the file are reconciled into lap starts afterwards (see
//! [`reconcile`]). CSV files are read by matching their header against
//! known column names.
//!
//! ```no_run
//! use std::path::Path;
//! use trackfile::{read_file, write_file, Format, WriteOptions};
//!
//! let activity = read_file(Path::new("ride.gpx"), None)?;
//! write_file(&activity,
//!            Path::new("ride.csv"),
//!            Some(Format::Csv),
//!            &WriteOptions::default())?;
//! # Ok::<(), trackfile::TrackError>(())
//! ```

#[macro_use]
mod error;

mod activity;
mod csv;
mod events;
mod field;
mod format;
mod gpx_reader;
mod gpx_writer;
mod lap;
mod options;
mod util;

pub use activity::{Activity, Summary};
pub use error::{Result, TrackError};
pub use events::{TreeEvent, TreeEvents};
pub use field::{parse_field, try_parse_field, DataField, DataPoint,
                FIELD_COUNT};
pub use format::{read, read_file, write, write_file, Format};
pub use gpx_reader::ReadContext;
pub use lap::{reconcile, Lap};
pub use options::{CsvOptions, GpxOptions, WriteOptions};
pub use util::{format_timestamp, parse_timestamp};

/// GPX reader and writer.
pub mod gpx {
  pub use super::{gpx_reader::{read, read_events},
                  gpx_writer::write};
}

/// CSV reader and writer.
pub mod tabular {
  pub use super::csv::{read, write};
}
