// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};


/// Text form used whenever a timestamp is written.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Zone-less forms accepted on read, interpreted as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];


/// Returns the value of the longest numeric prefix of `text` after leading
/// whitespace, like `strtod` does. Anything following the prefix is ignored,
/// so `"12.5bpm"` yields `12.5`. Returns `None` if there is no digit at all.
pub fn numeric_prefix(text: &str) -> Option<f64> {
  let text = text.trim_start();
  let bytes = text.as_bytes();
  let digits_from = |mut idx: usize| {
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
      idx += 1;
    }
    idx
  };

  let mut end = 0;
  if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
    end += 1;
  }
  let int_end = digits_from(end);
  let mut mantissa_digits = int_end - end;
  end = int_end;

  if end < bytes.len() && bytes[end] == b'.' {
    let frac_end = digits_from(end + 1);
    mantissa_digits += frac_end - (end + 1);
    // a lone '.' without any digits around it is not a number
    if mantissa_digits > 0 {
      end = frac_end;
    }
  }
  if mantissa_digits == 0 {
    return None;
  }

  // exponent only counts if at least one digit follows
  if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
    let mut exp = end + 1;
    if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
      exp += 1;
    }
    let exp_end = digits_from(exp);
    if exp_end > exp {
      end = exp_end;
    }
  }

  text[..end].parse::<f64>()
             .ok()
             .filter(|value| value.is_finite())
}

/// Parses a date-time text into epoch seconds. Fractional seconds are
/// truncated, zone offsets are honored and zone-less text is taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<i64> {
  let text = text.trim();
  if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
    return Some(datetime.timestamp());
  }
  NAIVE_FORMATS.iter()
               .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
               .map(|naive| Utc.from_utc_datetime(&naive).timestamp())
}

/// Formats epoch seconds as `YYYY-MM-DDTHH:MM:SSZ`. This is the exact
/// inverse of `parse_timestamp` for text in that form.
pub fn format_timestamp(secs: i64) -> Option<String> {
  Utc.timestamp_opt(secs, 0)
     .single()
     .map(|datetime| datetime.format(TIMESTAMP_FORMAT).to_string())
}


#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;


  #[test]
  fn numeric_prefix_test() {
    assert_eq!(Some(12.5), numeric_prefix("12.5"));
    assert_eq!(Some(12.5), numeric_prefix("  12.5bpm"));
    assert_eq!(Some(-0.25), numeric_prefix("-.25"));
    assert_eq!(Some(3.0), numeric_prefix("3."));
    assert_eq!(Some(1500.0), numeric_prefix("1.5e3xyz"));
    assert_eq!(Some(1.5), numeric_prefix("1.5e"));
    assert_eq!(Some(1.5), numeric_prefix("1.5e+"));
    assert_eq!(Some(0.0), numeric_prefix("0"));
    assert_eq!(Some(7.0), numeric_prefix("+7"));

    assert_eq!(None, numeric_prefix(""));
    assert_eq!(None, numeric_prefix("   "));
    assert_eq!(None, numeric_prefix("abc"));
    assert_eq!(None, numeric_prefix("."));
    assert_eq!(None, numeric_prefix("-"));
    assert_eq!(None, numeric_prefix("nan"));
  }

  #[test]
  fn parse_timestamp_test() {
    assert_eq!(Some(100), parse_timestamp("1970-01-01T00:01:40Z"));
    assert_eq!(Some(100), parse_timestamp(" 1970-01-01T00:01:40Z\n"));
    assert_eq!(Some(1401616800), parse_timestamp("2014-06-01T10:00:00Z"));
    assert_eq!(Some(1401616800), parse_timestamp("2014-06-01T10:00:00.750Z"));
    assert_eq!(Some(1401616800), parse_timestamp("2014-06-01T12:00:00+02:00"));
    assert_eq!(Some(1401616800), parse_timestamp("2014-06-01T10:00:00"));
    assert_eq!(Some(1401616800), parse_timestamp("2014-06-01 10:00:00"));

    assert_eq!(None, parse_timestamp(""));
    assert_eq!(None, parse_timestamp("yesterday"));
    assert_eq!(None, parse_timestamp("2014-13-01T10:00:00Z"));
  }

  #[test]
  fn format_timestamp_test() {
    assert_eq!(Some("1970-01-01T00:01:40Z".to_string()), format_timestamp(100));
    assert_eq!(Some("2014-06-01T10:00:00Z".to_string()),
               format_timestamp(1401616800));

    for text in &["2014-06-01T10:00:00Z",
                  "1999-12-31T23:59:59Z",
                  "2024-02-29T00:00:01Z"]
    {
      let secs = parse_timestamp(text).unwrap();
      assert_eq!(Some(text.to_string()), format_timestamp(secs));
    }
  }
}
