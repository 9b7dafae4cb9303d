use crate::{
    bpmn::{self, ActivityType, NodeKind},
    document::{EventDefinition, Flow, Node, ParsedDocument, ProcessInfo},
};
use log::debug;
use std::collections::BTreeMap;

//
// Open elements are tracked on a frame stack. A frame tells what the element contributes to:
//
//   Definitions
//   └── Process(0)
//       ├── Node(0)                    startEvent
//       ├── Node(1)                    scriptTask
//       │   └── Script(1)              text goes to node 1
//       ├── Node(2)                    intermediateCatchEvent
//       │   └── Definition(2, 0)       timerEventDefinition
//       │       └── Expression(2, 0)   timeDuration text
//       └── Flow(0)
//           └── Condition(0)           text goes to flow 0
//
// Everything else is Within(owner) where owner is the closest node, if any.
//

#[derive(Debug, Clone, Copy)]
enum Frame {
    Definitions,
    Process(usize),
    Node(usize),
    Flow(usize),
    Condition(usize),
    Script(usize),
    Definition(usize, usize),
    Expression(usize, usize),
    Within(Option<usize>),
}

#[derive(Default)]
pub(super) struct DocumentBuilder {
    document: ParsedDocument,
    stack: Vec<Frame>,
    root_closed: bool,
    // Top level elements after the root
    extra_roots: usize,
}

impl DocumentBuilder {
    pub(super) fn start(&mut self, name: &[u8], attributes: BTreeMap<String, String>) {
        let frame = match self.stack.last().copied() {
            None => self.root(name),
            Some(Frame::Definitions) if name == bpmn::PROCESS => {
                Frame::Process(self.document.add_process(ProcessInfo::new(&attributes)))
            }
            Some(Frame::Definitions) => Frame::Within(None),
            Some(Frame::Process(process)) => self.scope_child(name, attributes, process, None),
            Some(Frame::Node(index)) => self.node_child(name, attributes, index),
            Some(Frame::Flow(index)) if name == bpmn::CONDITION_EXPRESSION => {
                Frame::Condition(index)
            }
            Some(Frame::Definition(node, definition))
                if bpmn::is_time_expression(name) || name == bpmn::CONDITION =>
            {
                Frame::Expression(node, definition)
            }
            Some(Frame::Definition(node, _) | Frame::Script(node)) => Frame::Within(Some(node)),
            Some(Frame::Within(Some(node))) => {
                self.inspect_assignment(node, name, &attributes);
                Frame::Within(Some(node))
            }
            Some(
                Frame::Flow(_) | Frame::Condition(_) | Frame::Expression(..) | Frame::Within(None),
            ) => Frame::Within(None),
        };
        self.stack.push(frame);
    }

    pub(super) fn end(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Condition(index) => {
                if let Some(flow) = self.document.flow_mut(index) {
                    trim(&mut flow.condition);
                }
            }
            Frame::Script(index) => {
                if let Some(node) = self.document.node_mut(index) {
                    trim(&mut node.script);
                }
            }
            Frame::Expression(node, definition) => {
                if let Some(definition) = self
                    .document
                    .node_mut(node)
                    .and_then(|node| node.definitions.get_mut(definition))
                {
                    trim(&mut definition.expression);
                }
            }
            _ => {}
        }
        if self.stack.is_empty() {
            self.root_closed = true;
        }
    }

    pub(super) fn text(&mut self, value: &str) {
        match self.stack.last().copied() {
            Some(Frame::Condition(index)) => {
                if let Some(flow) = self.document.flow_mut(index) {
                    flow.condition.get_or_insert_default().push_str(value);
                }
            }
            Some(Frame::Script(index)) => {
                if let Some(node) = self.document.node_mut(index) {
                    node.script.get_or_insert_default().push_str(value);
                }
            }
            Some(Frame::Expression(node, definition)) => {
                if let Some(definition) = self
                    .document
                    .node_mut(node)
                    .and_then(|node| node.definitions.get_mut(definition))
                {
                    definition.expression.get_or_insert_default().push_str(value);
                }
            }
            _ => {}
        }
    }

    pub(super) fn is_complete(&self) -> bool {
        self.root_closed && self.stack.is_empty()
    }

    pub(super) fn has_single_root(&self) -> bool {
        self.extra_roots == 0
    }

    fn root(&mut self, name: &[u8]) -> Frame {
        if self.root_closed {
            self.extra_roots += 1;
            debug!("EXTRA ROOT {}", String::from_utf8_lossy(name));
            return Frame::Within(None);
        }
        self.document.root = Some(String::from_utf8_lossy(name).into_owned());
        if name == bpmn::DEFINITIONS {
            Frame::Definitions
        } else {
            Frame::Within(None)
        }
    }

    // Child of a process or sub process
    fn scope_child(
        &mut self,
        name: &[u8],
        attributes: BTreeMap<String, String>,
        process: usize,
        parent: Option<usize>,
    ) -> Frame {
        if name == bpmn::SEQUENCE_FLOW {
            return Frame::Flow(self.document.add_flow(Flow::new(&attributes, process)));
        }
        if bpmn::is_scope_child(name) {
            return Frame::Within(parent);
        }

        let kind = NodeKind::try_from(name).unwrap_or_else(|_| {
            NodeKind::Unsupported(String::from_utf8_lossy(name).into_owned())
        });
        let assigned = kind == NodeKind::Activity(ActivityType::UserTask)
            && bpmn::ASSIGNMENT_ATTRIBUTES.iter().any(|key| {
                attributes
                    .get(*key)
                    .is_some_and(|value| !value.trim().is_empty())
            });

        let mut node = Node::new(kind, attributes, process);
        node.parent = parent;
        node.assigned = assigned;
        debug!("NODE {node}");
        Frame::Node(self.document.add_node(node))
    }

    // Child of a flow node
    fn node_child(
        &mut self,
        name: &[u8],
        attributes: BTreeMap<String, String>,
        index: usize,
    ) -> Frame {
        let Some(node) = self.document.node_mut(index) else {
            return Frame::Within(None);
        };
        match node.kind {
            NodeKind::Activity(ActivityType::SubProcess) => {
                let process = node.process;
                self.scope_child(name, attributes, process, Some(index))
            }
            NodeKind::Activity(ActivityType::ScriptTask) if name == bpmn::SCRIPT => {
                Frame::Script(index)
            }
            NodeKind::Event(_) if name.ends_with(b"EventDefinition") => {
                node.definitions.push(EventDefinition::new(name, &attributes));
                Frame::Definition(index, node.definitions.len() - 1)
            }
            _ => {
                self.inspect_assignment(index, name, &attributes);
                Frame::Within(Some(index))
            }
        }
    }

    // Any element below a user task that names who performs it.
    fn inspect_assignment(
        &mut self,
        index: usize,
        name: &[u8],
        attributes: &BTreeMap<String, String>,
    ) {
        let Some(node) = self.document.node_mut(index) else {
            return;
        };
        if node.kind != NodeKind::Activity(ActivityType::UserTask) {
            return;
        }
        // jBPM data inputs and drools:metaData entries
        let named = matches!(name, bpmn::DATA_INPUT | bpmn::META_DATA)
            && attributes
                .get("name")
                .is_some_and(|value| bpmn::ASSIGNMENT_INPUTS.contains(&value.as_str()));
        if bpmn::is_assignment(name) || named {
            node.assigned = true;
        }
    }
}

fn trim(value: &mut Option<String>) {
    if let Some(text) = value {
        let trimmed = text.trim();
        if trimmed.len() != text.len() {
            *text = trimmed.to_string();
        }
    }
}

impl From<DocumentBuilder> for ParsedDocument {
    fn from(builder: DocumentBuilder) -> Self {
        let mut document = builder.document;
        document.finalize();
        document
    }
}
