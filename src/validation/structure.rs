use super::Report;
use crate::{
    bpmn::{self, EventType, NodeKind, Symbol},
    document::{Node, ParsedDocument},
    error::{MISSING_ROOT, NO_EXECUTABLE_PROCESS},
};
use std::collections::VecDeque;

pub(super) fn check(document: &ParsedDocument, report: &mut Report) {
    check_root(document, report);
    check_identifiers(document, report);
    check_flows(document, report);
    check_reachability(document, report);
}

fn check_root(document: &ParsedDocument, report: &mut Report) {
    if document.root().map(str::as_bytes) != Some(bpmn::DEFINITIONS) {
        report.error(format!(
            "{MISSING_ROOT}, found {}",
            document.root().unwrap_or("nothing")
        ));
        return;
    }

    if !document.processes().iter().any(|process| process.executable) {
        report.error(NO_EXECUTABLE_PROCESS);
    }

    for (index, process) in document.processes().iter().enumerate() {
        if !process.executable {
            report.info(format!("Process {process} is not executable"));
            continue;
        }
        let (starts, ends, nodes) =
            document
                .process_nodes(index)
                .fold((0, 0, 0), |(starts, ends, nodes), node| {
                    (
                        starts + usize::from(node.is_start()),
                        ends + usize::from(node.is_end()),
                        nodes + 1,
                    )
                });
        if starts == 0 {
            report.error(format!("Process {process} has no start event"));
        }
        if ends == 0 {
            report.warning(format!("Process {process} has no end event"));
        }
        let flows = document
            .flows()
            .iter()
            .filter(|flow| flow.process == index)
            .count();
        report.info(format!(
            "Process {process} has {nodes} top level node(s) and {flows} sequence flow(s)"
        ));
    }
}

fn check_identifiers(document: &ParsedDocument, report: &mut Report) {
    let processes = document
        .processes()
        .iter()
        .map(|process| (process.id.as_deref(), process.to_string()));
    let nodes = document
        .nodes()
        .iter()
        .map(|node| (node.id.as_deref(), node.to_string()));
    let flows = document
        .flows()
        .iter()
        .map(|flow| (flow.id.as_deref(), flow.to_string()));

    for (id, element) in processes.chain(nodes).chain(flows) {
        match id {
            None | Some("") => report.error(format!("{element} has no id")),
            Some(id) if !is_valid_id(id) => report.warning(format!(
                "Id '{id}' of {element} contains characters other than letters, digits and '_'"
            )),
            _ => {}
        }
    }

    for id in document.duplicate_ids() {
        report.error(format!("Id '{id}' is used by more than one element"));
    }
}

fn is_valid_id(id: &str) -> bool {
    id.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn check_flows(document: &ParsedDocument, report: &mut Report) {
    for flow in document.flows() {
        for (role, reference) in [("source", &flow.source), ("target", &flow.target)] {
            match reference.as_deref() {
                None | Some("") => report.error(format!("{flow} has no {role}")),
                Some(id) if document.node(id).is_none() => {
                    report.error(format!("{flow} references unknown {role} '{id}'"))
                }
                _ => {}
            }
        }
    }
}

// Nodes that can receive a token without an incoming sequence flow.
fn is_entry(node: &Node) -> bool {
    let flag = |name| node.attribute(name).is_some_and(|value| value.trim() == "true");
    (node.is_start() && node.parent.is_none())
        || (node.kind == NodeKind::Event(EventType::IntermediateCatch)
            && node.has_symbol(&Symbol::Link))
        || flag("isForCompensation")
        || flag("triggeredByEvent")
}

fn check_reachability(document: &ParsedDocument, report: &mut Report) {
    let nodes = document.nodes();

    // Boundary events and sub process start events by the activity that holds them
    let mut held: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (index, node) in nodes.iter().enumerate() {
        let host = match node.kind {
            NodeKind::Event(EventType::Boundary) => node
                .attribute("attachedToRef")
                .and_then(|id| document.node_index(id)),
            NodeKind::Event(EventType::Start) => node.parent,
            _ => None,
        };
        if let Some(host) = host {
            held[host].push(index);
        }
    }

    let mut reached = vec![false; nodes.len()];
    let mut queue: VecDeque<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| is_entry(node))
        .map(|(index, _)| index)
        .collect();

    while let Some(index) = queue.pop_front() {
        if std::mem::replace(&mut reached[index], true) {
            continue;
        }
        queue.extend(
            document
                .outgoing(index)
                .filter_map(|flow| flow.target.as_deref())
                .filter_map(|id| document.node_index(id)),
        );
        queue.extend(held[index].iter().copied());
    }

    for (node, reached) in nodes.iter().zip(reached) {
        if !reached {
            report.warning(format!("{node} is not reachable from any start event"));
        }
    }
}
