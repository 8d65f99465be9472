// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use clap::{ArgAction, Parser, Subcommand};
use eyre::{Result, WrapErr};
use std::{io, path::PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use trackfile::{read_file, write_file, CsvOptions, Format, GpxOptions,
                WriteOptions};


#[derive(Parser)]
#[command(name = "trackconv",
          version,
          about = "Convert activity tracks between GPX and CSV")]
struct Cli {
  /// More log output, repeat for even more. RUST_LOG takes precedence.
  #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Read an activity and write it in another (or the same) format
  Convert {
    input:          PathBuf,
    output:         PathBuf,
    /// Input format, guessed from content and extension if omitted
    #[arg(long)]
    from:           Option<Format>,
    /// Output format, taken from the output extension if omitted
    #[arg(long)]
    to:             Option<Format>,
    /// Don't write lap waypoints (GPX)
    #[arg(long)]
    no_laps:        bool,
    /// Start a new track segment at every lap (GPX)
    #[arg(long)]
    lap_segments:   bool,
    /// Don't start new track segments at breaks (GPX)
    #[arg(long)]
    single_segment: bool,
    /// Write columns of fields without any value (CSV)
    #[arg(long)]
    keep_unset:     bool,
    /// Cell content for missing values (CSV)
    #[arg(long, default_value = "")]
    unset_value:    String,
  },
  /// Print a JSON summary of an activity
  Info {
    input: PathBuf,
    /// Input format, guessed from content and extension if omitted
    #[arg(long)]
    from:  Option<Format>,
  },
}


fn main() -> Result<()> {
  color_eyre::install()?;
  let cli = Cli::parse();
  init_logging(cli.verbose);

  match cli.command {
    Command::Convert { input,
                       output,
                       from,
                       to,
                       no_laps,
                       lap_segments,
                       single_segment,
                       keep_unset,
                       unset_value, } => {
      let activity = read_file(&input, from).wrap_err_with(|| {
                                              format!("reading {}",
                                                      input.display())
                                            })?;
      let options =
        WriteOptions { gpx: GpxOptions { add_laps: !no_laps,
                                         lap_segments,
                                         break_segments: !single_segment },
                       csv: CsvOptions { remove_unset: !keep_unset,
                                         unset_value } };
      write_file(&activity, &output, to, &options).wrap_err_with(|| {
                                                    format!("writing {}",
                                                            output.display())
                                                  })?;
      info!("wrote {} points in {} laps to {}",
            activity.number_of_points(),
            activity.number_of_laps(),
            output.display());
    }
    Command::Info { input, from } => {
      let activity = read_file(&input, from).wrap_err_with(|| {
                                              format!("reading {}",
                                                      input.display())
                                            })?;
      let summary = activity.summary()?;
      println!("{}", serde_json::to_string_pretty(&summary)?);
    }
  }
  Ok(())
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  tracing_subscriber::fmt().with_env_filter(filter)
                           .with_writer(io::stderr)
                           .init();
}
