// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::Result;
use quick_xml::{events::Event, Reader};
use std::{io::BufRead, str};


/// The two things a tree reader gets told about: an element was opened
/// (attributes are only available here) or an element was closed (together
/// with its own text, if it had any).
///
/// Empty elements such as `<trkseg/>` produce an `Open` directly followed by
/// a `Close` without text.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeEvent {
  Open {
    name:       String,
    attributes: Vec<(String, String)>,
  },
  Close {
    name: String,
    text: Option<String>,
  },
}

impl TreeEvent {
  pub fn open(name: &str, attributes: &[(&str, &str)]) -> Self {
    TreeEvent::Open { name:       name.to_string(),
                      attributes: attributes.iter()
                                            .map(|(k, v)| {
                                              (k.to_string(), v.to_string())
                                            })
                                            .collect(), }
  }

  pub fn close(name: &str, text: Option<&str>) -> Self {
    TreeEvent::Close { name: name.to_string(),
                       text: text.map(str::to_string) }
  }
}


/// Pull tokenizer turning an XML byte stream into `TreeEvent`s.
///
/// Text is retained for the innermost open element only and handed out with
/// its `Close` event; text of elements which have children is dropped.
/// Element names keep their namespace prefix (`gpxtpx:hr`).
pub struct TreeEvents<R: BufRead> {
  reader: Reader<R>,
  buf:    Vec<u8>,
  open:   Vec<String>,
  text:   Option<String>,
  done:   bool,
}

impl<R: BufRead> TreeEvents<R> {
  pub fn new(input: R) -> Self {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);
    reader.expand_empty_elements(true);

    Self { reader,
           buf: Vec::new(),
           open: Vec::new(),
           text: None,
           done: false }
  }

  /// Produces the next event, `None` at the end of a well formed document.
  pub fn next_event(&mut self) -> Result<Option<TreeEvent>> {
    if self.done {
      return Ok(None);
    }

    loop {
      self.buf.clear();
      let position = self.reader.buffer_position();
      let event = match self.reader.read_event_into(&mut self.buf) {
        Ok(event) => event,
        Err(err) => {
          self.done = true;
          return malformed!("{} (at byte {})", err, position);
        }
      };

      match event {
        Event::Start(start) => {
          let name = decode(start.name().as_ref(), position)?;
          let mut attributes = Vec::new();
          for attribute in start.attributes() {
            let attribute = match attribute {
              Ok(attribute) => attribute,
              Err(err) => {
                return malformed!("{} in <{}> (at byte {})",
                                  err,
                                  name,
                                  position)
              }
            };
            let key = decode(attribute.key.as_ref(), position)?;
            let value = match attribute.unescape_value() {
              Ok(value) => value.into_owned(),
              Err(err) => return malformed!("{} (at byte {})", err, position),
            };
            attributes.push((key, value));
          }

          self.open.push(name.clone());
          self.text = None;
          return Ok(Some(TreeEvent::Open { name, attributes }));
        }
        Event::End(end) => {
          let name = decode(end.name().as_ref(), position)?;
          self.open.pop();
          let text = self.text
                         .take()
                         .map(|text| text.trim().to_string())
                         .filter(|text| !text.is_empty());
          return Ok(Some(TreeEvent::Close { name, text }));
        }
        Event::Text(text) => {
          let text = match text.unescape() {
            Ok(text) => text.into_owned(),
            Err(err) => return malformed!("{} (at byte {})", err, position),
          };
          self.text.get_or_insert_with(String::new).push_str(&text);
        }
        Event::CData(data) => {
          let data = decode(&data, position)?;
          self.text.get_or_insert_with(String::new).push_str(&data);
        }
        Event::Eof => {
          self.done = true;
          if let Some(name) = self.open.last() {
            return malformed!("input ended inside <{}>", name);
          }
          return Ok(None);
        }
        // declarations, comments, processing instructions, doctypes
        _ => {}
      }
    }
  }
}

impl<R: BufRead> Iterator for TreeEvents<R> {
  type Item = Result<TreeEvent>;

  fn next(&mut self) -> Option<Self::Item> {
    self.next_event().transpose()
  }
}

fn decode(bytes: &[u8], position: usize) -> Result<String> {
  match str::from_utf8(bytes) {
    Ok(text) => Ok(text.to_string()),
    Err(err) => malformed!("{} (at byte {})", err, position),
  }
}
