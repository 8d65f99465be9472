// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Jonas Reitemeyer <jonas@bmc-labs.com>
//   Florian Eich <florian@bmc-labs.com>

use getset::CopyGetters;
use serde::Serialize;
use tracing::info;


/// View on one lap of an activity: point index range plus timing.
#[derive(Clone, Copy, Debug, PartialEq, CopyGetters, Serialize)]
#[getset(get_copy = "pub")]
pub struct Lap {
  number:     usize,
  start:      usize,
  end:        usize,
  start_time: Option<i64>,
  duration:   Option<i64>,
}

impl Lap {
  /// Creates a lap covering points `start..end`. `first` and `last` are the
  /// timestamps of the first and the last point of the lap, if present.
  pub fn new(number: usize,
             start: usize,
             end: usize,
             first: Option<i64>,
             last: Option<i64>)
             -> Self {
    let duration = match (first, last) {
      (Some(first), Some(last)) => Some(last - first),
      _ => None,
    };
    Self { number,
           start,
           end,
           start_time: first,
           duration }
  }

  pub fn len(&self) -> usize {
    self.end - self.start
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}


/// Turns the lap candidate indices recorded while reading into lap start
/// indices.
///
/// Some devices record the instant a lap *ended* rather than the instant it
/// started. Those devices also close the track segment at every lap, so an
/// end marker always sits right before a break. If every candidate but the
/// first lines up with a break that way, the candidates are end markers and
/// each is shifted to the point after it. Otherwise they are taken as start
/// markers.
///
/// This is a heuristic: start markers which happen to sit right before
/// breaks are shifted as well.
///
/// `candidates` and `breaks` must be strictly increasing. The result always
/// starts with 0 and is strictly increasing.
pub fn reconcile(candidates: &[usize],
                 breaks: &[usize],
                 number_of_points: usize)
                 -> Vec<usize> {
  if candidates.len() > 1 && is_end_marked(candidates, breaks) {
    info!("lap markers denote lap ends, shifting {} laps",
          candidates.len() - 1);
    let shifted = candidates[1..].iter()
                                 .map(|&idx| idx + 1)
                                 .filter(|&idx| idx < number_of_points);
    return with_leading_zero(shifted);
  }
  with_leading_zero(candidates.iter().copied())
}

fn is_end_marked(candidates: &[usize], breaks: &[usize]) -> bool {
  // there can't be more lap ends than breaks
  if candidates.len() > breaks.len() {
    return false;
  }

  let (mut i, mut j) = (1, 1);
  while i < candidates.len() && j < breaks.len() {
    let before_break = breaks[j] - 1;
    if candidates[i] == before_break {
      i += 1;
      j += 1;
    } else if candidates[i] > before_break {
      j += 1;
    } else {
      return false;
    }
  }
  i == candidates.len()
}

fn with_leading_zero<I: Iterator<Item = usize>>(indices: I) -> Vec<usize> {
  let mut laps = vec![0];
  laps.extend(indices.filter(|&idx| idx > 0));
  laps
}
