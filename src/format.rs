//! XML reindenting for display.
//!
//! Part content is stored without layout; before handing it to a text
//! pane the host reformats it so nesting is visible. The transform is
//! stateless and purely textual: attribute and text values pass through
//! unchanged, only inter-element whitespace is rewritten.

use crate::error::{PackageError, Result};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

/// Reserialize an XML document with two-space indentation, each child
/// element one level deeper than its parent.
///
/// Fails with `MalformedXml` when the input does not parse; callers
/// treat that as "display raw, cannot reformat" rather than fatal.
pub fn reindent(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => writer.write_event(event)?,
            Err(err) => return Err(PackageError::MalformedXml(err.to_string())),
        }
    }

    let out = writer.into_inner();
    Ok(std::str::from_utf8(&out)?.to_owned())
}
