pub(crate) mod reader;

use crate::{
    bpmn::{ActivityType, EventType, GatewayType, NodeKind, Symbol},
    error::Error,
};
use reader::read_document;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    path::Path,
    str::FromStr,
};

/// Typed tree of a BPMN document. Nodes and flows live in arenas indexed by their BPMN id.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    root: Option<String>,
    processes: Vec<ProcessInfo>,
    nodes: Vec<Node>,
    flows: Vec<Flow>,
    node_index: HashMap<String, usize>,
    flow_index: HashMap<String, usize>,
    duplicates: Vec<String>,
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
}

impl ParsedDocument {
    /// Parse a document from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        text.parse()
    }

    /// Local name of the document root element.
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn processes(&self) -> &[ProcessInfo] {
        &self.processes
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).and_then(|index| self.nodes.get(*index))
    }

    pub fn flow(&self, id: &str) -> Option<&Flow> {
        self.flow_index.get(id).and_then(|index| self.flows.get(*index))
    }

    /// Ids used by more than one element.
    pub fn duplicate_ids(&self) -> &[String] {
        &self.duplicates
    }

    /// Flows entering the node at `index`.
    pub fn incoming(&self, index: usize) -> impl Iterator<Item = &Flow> {
        self.incoming
            .get(index)
            .into_iter()
            .flatten()
            .filter_map(|flow| self.flows.get(*flow))
    }

    /// Flows leaving the node at `index`.
    pub fn outgoing(&self, index: usize) -> impl Iterator<Item = &Flow> {
        self.outgoing
            .get(index)
            .into_iter()
            .flatten()
            .filter_map(|flow| self.flows.get(*flow))
    }

    /// Nodes placed directly in the process at `process` (not inside a sub process).
    pub fn process_nodes(&self, process: usize) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(move |node| node.process == process && node.parent.is_none())
    }

    pub(crate) fn node_index(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    fn add_process(&mut self, process: ProcessInfo) -> usize {
        self.processes.push(process);
        self.processes.len() - 1
    }

    fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn add_flow(&mut self, flow: Flow) -> usize {
        self.flows.push(flow);
        self.flows.len() - 1
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    fn flow_mut(&mut self, index: usize) -> Option<&mut Flow> {
        self.flows.get_mut(index)
    }

    // Everything has been collected. Build the id indexes and the adjacency of nodes.
    fn finalize(&mut self) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let ids = self
            .processes
            .iter()
            .filter_map(|process| process.id.as_deref())
            .chain(self.nodes.iter().filter_map(|node| node.id.as_deref()))
            .chain(self.flows.iter().filter_map(|flow| flow.id.as_deref()));
        for id in ids {
            *seen.entry(id).or_default() += 1;
        }
        let mut duplicates: Vec<String> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id.to_string())
            .collect();
        duplicates.sort();
        self.duplicates = duplicates;

        // First occurrence wins for duplicated ids
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(id) = &node.id {
                self.node_index.entry(id.clone()).or_insert(index);
            }
        }
        for (index, flow) in self.flows.iter().enumerate() {
            if let Some(id) = &flow.id {
                self.flow_index.entry(id.clone()).or_insert(index);
            }
        }

        self.incoming = vec![Vec::new(); self.nodes.len()];
        self.outgoing = vec![Vec::new(); self.nodes.len()];
        for (index, flow) in self.flows.iter().enumerate() {
            if let Some(source) = flow.source.as_deref().and_then(|id| self.node_index.get(id)) {
                self.outgoing[*source].push(index);
            }
            if let Some(target) = flow.target.as_deref().and_then(|id| self.node_index.get(id)) {
                self.incoming[*target].push(index);
            }
        }

        // A flow is default when a node names it in its default attribute
        let defaults: Vec<usize> = self
            .nodes
            .iter()
            .filter_map(|node| node.default_flow())
            .filter_map(|id| self.flow_index.get(id).copied())
            .collect();
        for index in defaults {
            self.flows[index].default = true;
        }
    }
}

impl FromStr for ParsedDocument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        read_document(quick_xml::Reader::from_str(s))
    }
}

/// A `process` element.
#[derive(Debug, Default, Clone)]
pub struct ProcessInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub executable: bool,
}

impl ProcessInfo {
    fn new(attributes: &BTreeMap<String, String>) -> Self {
        Self {
            id: attributes.get("id").cloned(),
            name: attributes.get("name").cloned(),
            executable: attributes
                .get("isExecutable")
                .is_some_and(|value| value.trim() == "true"),
        }
    }
}

impl Display for ProcessInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name.as_deref().or(self.id.as_deref()).unwrap_or("<process>"))
    }
}

/// Flow node: event, activity, gateway or an unsupported flow element.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: Option<String>,
    pub kind: NodeKind,
    pub name: Option<String>,
    /// Attributes by local name
    pub attributes: BTreeMap<String, String>,
    /// Index of the owning process
    pub process: usize,
    /// Index of the enclosing sub process, if any
    pub parent: Option<usize>,
    /// Event definitions of an event
    pub definitions: Vec<EventDefinition>,
    /// Body of a script task
    pub script: Option<String>,
    /// User task has a potential owner, performer or assignment extension
    pub assigned: bool,
}

impl Node {
    fn new(kind: NodeKind, attributes: BTreeMap<String, String>, process: usize) -> Self {
        Self {
            id: attributes.get("id").cloned(),
            name: attributes.get("name").cloned(),
            kind,
            attributes,
            process,
            parent: None,
            definitions: Default::default(),
            script: None,
            assigned: false,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn default_flow(&self) -> Option<&str> {
        self.attribute("default")
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn is_start(&self) -> bool {
        self.kind == NodeKind::Event(EventType::Start)
    }

    pub fn is_end(&self) -> bool {
        self.kind == NodeKind::Event(EventType::End)
    }

    pub fn activity_type(&self) -> Option<ActivityType> {
        match self.kind {
            NodeKind::Activity(activity_type) => Some(activity_type),
            _ => None,
        }
    }

    pub fn gateway_type(&self) -> Option<GatewayType> {
        match self.kind {
            NodeKind::Gateway(gateway_type) => Some(gateway_type),
            _ => None,
        }
    }

    pub fn has_symbol(&self, symbol: &Symbol) -> bool {
        self.definitions
            .iter()
            .any(|definition| definition.symbol.as_ref() == Some(symbol))
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.name, &self.id) {
            (Some(name), Some(id)) => write!(f, "{} '{name}' ({id})", self.kind),
            (None, Some(id)) => write!(f, "{} ({id})", self.kind),
            (Some(name), None) => write!(f, "{} '{name}'", self.kind),
            (None, None) => write!(f, "{} without id", self.kind),
        }
    }
}

/// Event definition inside an event, such as `timerEventDefinition`.
#[derive(Debug, Clone)]
pub struct EventDefinition {
    /// `None` for definitions that are not part of BPMN 2.0
    pub symbol: Option<Symbol>,
    pub element: String,
    /// messageRef, signalRef, errorRef or escalationRef
    pub reference: Option<String>,
    /// Timer or condition expression
    pub expression: Option<String>,
}

impl EventDefinition {
    fn new(element: &[u8], attributes: &BTreeMap<String, String>) -> Self {
        let symbol = Symbol::try_from(element).ok();
        let reference = match symbol {
            Some(Symbol::Message) => attributes.get("messageRef"),
            Some(Symbol::Signal) => attributes.get("signalRef"),
            Some(Symbol::Error) => attributes.get("errorRef"),
            Some(Symbol::Escalation) => attributes.get("escalationRef"),
            _ => None,
        }
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
        Self {
            symbol,
            element: String::from_utf8_lossy(element).into_owned(),
            reference,
            expression: None,
        }
    }
}

/// A `sequenceFlow` element.
#[derive(Debug, Clone)]
pub struct Flow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    /// Guard expression text
    pub condition: Option<String>,
    /// Named by the default attribute of its source
    pub default: bool,
    pub process: usize,
}

impl Flow {
    fn new(attributes: &BTreeMap<String, String>, process: usize) -> Self {
        Self {
            id: attributes.get("id").cloned(),
            name: attributes.get("name").cloned(),
            source: attributes.get("sourceRef").cloned(),
            target: attributes.get("targetRef").cloned(),
            condition: None,
            default: false,
            process,
        }
    }

    pub fn has_guard(&self) -> bool {
        self.condition
            .as_deref()
            .is_some_and(|condition| !condition.trim().is_empty())
    }
}

impl Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SequenceFlow {} ({} -> {})",
            self.id.as_deref().unwrap_or("without id"),
            self.source.as_deref().unwrap_or("?"),
            self.target.as_deref().unwrap_or("?"),
        )
    }
}
