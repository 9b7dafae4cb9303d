mod builder;

use super::ParsedDocument;
use crate::error::{Error, MULTIPLE_ROOTS, UNEXPECTED_EOF};
use builder::DocumentBuilder;
use quick_xml::{
    Reader,
    escape::{resolve_predefined_entity, unescape},
    events::{BytesStart, Event},
};
use std::collections::BTreeMap;

// Text is not trimmed by the reader: entity references split it into several events and the
// spaces next to them belong to the value. The builder trims collected values instead.
pub(super) fn read_document(mut reader: Reader<&[u8]>) -> Result<ParsedDocument, Error> {
    let mut builder = DocumentBuilder::default();
    loop {
        match reader.read_event()? {
            Event::Start(bytes_start) => {
                builder.start(bytes_start.local_name().as_ref(), attributes(&bytes_start)?);
            }
            Event::Empty(bytes_start) => {
                builder.start(bytes_start.local_name().as_ref(), attributes(&bytes_start)?);
                builder.end();
            }
            Event::End(_) => builder.end(),
            Event::Text(bytes_text) => builder.text(std::str::from_utf8(&bytes_text)?),
            Event::CData(bytes_cdata) => builder.text(std::str::from_utf8(&bytes_cdata)?),
            Event::GeneralRef(bytes_ref) => {
                if let Some(ch) = bytes_ref.resolve_char_ref()? {
                    builder.text(ch.encode_utf8(&mut [0; 4]));
                } else {
                    let name = std::str::from_utf8(&bytes_ref)?;
                    let value = resolve_predefined_entity(name).ok_or_else(|| {
                        Error::DocumentFormat(format!("unknown entity &{name};"))
                    })?;
                    builder.text(value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !builder.is_complete() {
        return Err(Error::DocumentFormat(UNEXPECTED_EOF.into()));
    }
    if !builder.has_single_root() {
        return Err(Error::DocumentFormat(MULTIPLE_ROOTS.into()));
    }
    Ok(builder.into())
}

// Attributes by local name. Namespace declarations are skipped.
fn attributes(bytes_start: &BytesStart) -> Result<BTreeMap<String, String>, Error> {
    let mut map = BTreeMap::new();
    for attribute in bytes_start.attributes() {
        let attribute = attribute?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = std::str::from_utf8(attribute.key.local_name().into_inner())?;
        let value = unescape(std::str::from_utf8(&attribute.value)?)?;
        map.insert(key.to_string(), value.into_owned());
    }
    Ok(map)
}
