//! Repairs benign schema omissions before validation.
//!
//! An `ioSpecification` must hold at least one `inputSet` and one `outputSet`, but editors
//! commonly write only one of them. The missing counterpart is inserted as an empty element
//! with the namespace prefix of its `ioSpecification`. Existing content is never touched:
//! the insertions are spliced into the original text at byte offsets reported by the reader.

use crate::error::{Error, UNEXPECTED_EOF};
use log::{debug, info};
use quick_xml::{Reader, events::Event};

const IO_SPECIFICATION: &[u8] = b"ioSpecification";
const INPUT_SET: &[u8] = b"inputSet";
const OUTPUT_SET: &[u8] = b"outputSet";

/// `true` when [`normalize`] would change the document.
pub fn needs_normalization(text: &str) -> bool {
    match insertions(text) {
        Ok(insertions) => !insertions.is_empty(),
        Err(error) => {
            debug!("NORMALIZE SKIPPED {error}");
            false
        }
    }
}

/// Insert the missing parts. A document that cannot be read is returned unchanged.
pub fn normalize(text: &str) -> String {
    let insertions = match insertions(text) {
        Ok(insertions) => insertions,
        Err(error) => {
            debug!("NORMALIZE SKIPPED {error}");
            return text.to_string();
        }
    };

    let mut output = String::with_capacity(text.len() + insertions.len() * 24);
    let mut position = 0;
    for insertion in &insertions {
        output.push_str(&text[position..insertion.offset]);
        output.push_str(&insertion.element);
        position = insertion.offset;
    }
    output.push_str(&text[position..]);

    if !insertions.is_empty() {
        info!("Normalized document, inserted {} element(s)", insertions.len());
    }
    output
}

#[derive(Debug)]
struct Insertion {
    offset: usize,
    element: String,
}

// Open ioSpecification
#[derive(Debug)]
struct IoSpecification {
    depth: usize,
    prefix: Option<String>,
    // Offset just before the first outputSet
    first_output_set: Option<usize>,
    // Offset just after the last inputSet
    last_input_set: Option<usize>,
}

impl IoSpecification {
    fn tag(&self, name: &[u8]) -> String {
        let name = String::from_utf8_lossy(name);
        match &self.prefix {
            Some(prefix) => format!("<{prefix}:{name}/>"),
            None => format!("<{name}/>"),
        }
    }

    fn missing(&self) -> Option<Insertion> {
        match (self.last_input_set, self.first_output_set) {
            (Some(offset), None) => Some(Insertion {
                offset,
                element: self.tag(OUTPUT_SET),
            }),
            (None, Some(offset)) => Some(Insertion {
                offset,
                element: self.tag(INPUT_SET),
            }),
            _ => None,
        }
    }
}

// Offsets are in ascending order
fn insertions(text: &str) -> Result<Vec<Insertion>, Error> {
    let mut reader = Reader::from_str(text);
    let mut open: Vec<IoSpecification> = Vec::new();
    let mut insertions = Vec::new();
    let mut depth = 0;

    loop {
        let event = reader.read_event()?;
        let after = reader.buffer_position() as usize;
        match event {
            Event::Start(bytes_start) => {
                depth += 1;
                let local_name = bytes_start.local_name();
                match local_name.as_ref() {
                    IO_SPECIFICATION => open.push(IoSpecification {
                        depth,
                        prefix: bytes_start
                            .name()
                            .prefix()
                            .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned()),
                        first_output_set: None,
                        last_input_set: None,
                    }),
                    OUTPUT_SET => child_output_set(&mut open, depth, tag_start(text, after)),
                    _ => {}
                }
            }
            Event::Empty(bytes_start) => match bytes_start.local_name().as_ref() {
                INPUT_SET => child_input_set(&mut open, depth + 1, after),
                OUTPUT_SET => child_output_set(&mut open, depth + 1, tag_start(text, after)),
                // Empty ioSpecification has neither set, nothing to pair
                _ => {}
            },
            Event::End(bytes_end) => {
                match bytes_end.local_name().as_ref() {
                    INPUT_SET => child_input_set(&mut open, depth, after),
                    IO_SPECIFICATION => {
                        if let Some(io_specification) = open.pop_if(|io| io.depth == depth)
                            && let Some(insertion) = io_specification.missing()
                        {
                            insertions.push(insertion);
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(Error::DocumentFormat(UNEXPECTED_EOF.into()));
    }
    insertions.sort_by_key(|insertion| insertion.offset);
    Ok(insertions)
}

// Offset of the '<' opening the tag that ends at `end`. Attribute values cannot hold '<'.
fn tag_start(text: &str, end: usize) -> usize {
    text[..end].rfind('<').unwrap_or(end)
}

fn child_input_set(open: &mut [IoSpecification], depth: usize, after: usize) {
    if let Some(io_specification) = open.last_mut()
        && io_specification.depth + 1 == depth
    {
        io_specification.last_input_set = Some(after);
    }
}

fn child_output_set(open: &mut [IoSpecification], depth: usize, before: usize) {
    if let Some(io_specification) = open.last_mut()
        && io_specification.depth + 1 == depth
    {
        io_specification.first_output_set.get_or_insert(before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ORDER: &str = include_str!("../tests/files/order.bpmn");

    const MISSING_OUTPUT_SET: &str = r#"<bpmn2:definitions xmlns:bpmn2="http://www.omg.org/spec/BPMN/20100524/MODEL">
  <bpmn2:process id="p" isExecutable="true">
    <bpmn2:userTask id="t">
      <bpmn2:ioSpecification id="t_IO">
        <bpmn2:dataInput id="t_in" name="GroupId"/>
        <bpmn2:inputSet id="t_set_1"><bpmn2:dataInputRefs>t_in</bpmn2:dataInputRefs></bpmn2:inputSet>
        <bpmn2:inputSet id="t_set_2"/>
      </bpmn2:ioSpecification>
    </bpmn2:userTask>
  </bpmn2:process>
</bpmn2:definitions>"#;

    #[test]
    fn insert_output_set() {
        assert!(needs_normalization(MISSING_OUTPUT_SET));
        let normalized = normalize(MISSING_OUTPUT_SET);
        assert!(normalized.contains(r#"<bpmn2:inputSet id="t_set_2"/><bpmn2:outputSet/>"#));
        assert_eq!(normalized.len(), MISSING_OUTPUT_SET.len() + "<bpmn2:outputSet/>".len());
        assert!(!needs_normalization(&normalized));
    }

    #[test]
    fn insert_input_set_without_prefix() {
        let text = r#"<definitions><process id="p"><userTask id="t">
            <ioSpecification><outputSet id="o1"/><outputSet id="o2"/></ioSpecification>
            </userTask></process></definitions>"#;
        let normalized = normalize(text);
        assert!(normalized.contains(r#"<ioSpecification><inputSet/><outputSet id="o1"/>"#));
    }

    #[test]
    fn idempotent() {
        for text in [MISSING_OUTPUT_SET, ORDER, "<definitions/>", "not <xml"] {
            let once = normalize(text);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn complete_or_unreadable_documents_are_unchanged() {
        assert!(!needs_normalization(ORDER));
        assert_eq!(normalize(ORDER), ORDER);

        let broken = "<definitions><ioSpecification><inputSet/>";
        assert!(!needs_normalization(broken));
        assert_eq!(normalize(broken), broken);
    }
}
