use super::Report;
use crate::{
    bpmn::{ActivityType, EventType, GatewayType, NodeKind, Symbol},
    document::{Flow, Node, ParsedDocument},
    error::TASK_WITHOUT_TYPE,
};

// Script languages the runtime can evaluate, matched against the scriptFormat attribute.
const SCRIPT_FORMATS: &[&str] = &["java", "javascript", "mvel", "drools"];

pub(super) fn check(document: &ParsedDocument, report: &mut Report) {
    for (index, node) in document.nodes().iter().enumerate() {
        match &node.kind {
            NodeKind::Activity(activity_type) => check_activity(node, *activity_type, report),
            NodeKind::Gateway(gateway_type) => {
                check_gateway(document, index, node, *gateway_type, report)
            }
            NodeKind::Event(_) => check_event(node, report),
            NodeKind::Unsupported(element) => report.warning(format!(
                "Element '{element}' ({}) is not supported and may not execute correctly",
                node.id.as_deref().unwrap_or("without id")
            )),
        }
    }
}

fn check_activity(node: &Node, activity_type: ActivityType, report: &mut Report) {
    match activity_type {
        ActivityType::Task => report.error(format!("{TASK_WITHOUT_TYPE}: {node}")),
        ActivityType::UserTask if !node.assigned => report.error(format!(
            "{node} has no potential owner, performer or group/user assignment"
        )),
        ActivityType::ScriptTask => {
            let format = node.attribute("scriptFormat").unwrap_or_default();
            if !is_known_script_format(format) {
                report.error(format!("{node} has unknown script format '{format}'"));
            }
            if node
                .script
                .as_deref()
                .is_none_or(|script| script.trim().is_empty())
            {
                report.error(format!("{node} has an empty script"));
            }
        }
        _ => {}
    }
}

// Short names ("mvel") or URIs ending with the language ("http://www.java.com/java").
fn is_known_script_format(format: &str) -> bool {
    let format = format.trim().to_ascii_lowercase();
    format
        .rsplit(['/', ':', '.'])
        .filter(|part| !part.is_empty())
        .any(|part| SCRIPT_FORMATS.contains(&part))
}

fn check_gateway(
    document: &ParsedDocument,
    index: usize,
    node: &Node,
    gateway_type: GatewayType,
    report: &mut Report,
) {
    let incoming = document.incoming(index).count();
    let outgoing: Vec<&Flow> = document.outgoing(index).collect();
    let defaults = outgoing.iter().filter(|flow| flow.default).count();
    let guarded = outgoing.iter().filter(|flow| flow.has_guard()).count();

    if let Some(default) = node.default_flow()
        && !outgoing.iter().any(|flow| flow.id.as_deref() == Some(default))
    {
        report.error(format!(
            "{node} names default flow '{default}' which does not leave the gateway"
        ));
    }

    match gateway_type {
        GatewayType::Exclusive => {
            if outgoing.is_empty() {
                report.error(format!("{node} has no outgoing sequence flow"));
                return;
            }
            if defaults > 1 {
                report.error(format!("{node} has more than one default flow"));
            }
            for flow in outgoing.iter().filter(|flow| !flow.default && !flow.has_guard()) {
                report.error(format!(
                    "{flow} leaves {node} without a condition and is not the default flow"
                ));
            }
            if guarded > 0 && defaults != 1 {
                report.warning(format!(
                    "{node} has conditional flows but no default flow, risk of deadlock when no condition holds"
                ));
            }
        }
        GatewayType::Parallel => {
            if incoming == 0 {
                report.error(format!("{node} has no incoming sequence flow"));
            }
            if outgoing.len() < 2 {
                report.error(format!(
                    "{node} must have at least two outgoing sequence flows, found {}",
                    outgoing.len()
                ));
            }
            for flow in outgoing.iter().filter(|flow| flow.has_guard()) {
                report.error(format!(
                    "{flow} leaves {node} with a condition, parallel gateways do not evaluate conditions"
                ));
            }
        }
        GatewayType::Inclusive => {
            if guarded == 0 {
                report.error(format!("{node} has no conditional outgoing sequence flow"));
            }
            if defaults > 1 {
                report.error(format!("{node} has more than one default flow"));
            }
        }
        GatewayType::EventBased => {
            for flow in &outgoing {
                let target = flow.target.as_deref().and_then(|id| document.node(id));
                if let Some(target) = target
                    && target.kind != NodeKind::Event(EventType::IntermediateCatch)
                {
                    report.error(format!(
                        "{flow} leaves {node} towards {target}, event based gateways can only target intermediate catch events"
                    ));
                }
            }
        }
        GatewayType::Complex => report.error(format!("{node} is not supported")),
    }
}

fn check_event(node: &Node, report: &mut Report) {
    for definition in &node.definitions {
        match &definition.symbol {
            Some(Symbol::Message) if definition.reference.is_none() => {
                report.error(format!("{node} has a message definition without messageRef"))
            }
            Some(Symbol::Signal) if definition.reference.is_none() => {
                report.error(format!("{node} has a signal definition without signalRef"))
            }
            Some(Symbol::Timer)
                if definition
                    .expression
                    .as_deref()
                    .is_none_or(|expression| expression.trim().is_empty()) =>
            {
                report.error(format!("{node} has a timer definition without time expression"))
            }
            Some(symbol) if !symbol.is_supported() => report.warning(format!(
                "{node} uses event definition {symbol} which is not supported"
            )),
            None => report.warning(format!(
                "{node} uses unknown event definition '{}'",
                definition.element
            )),
            _ => {}
        }
    }
}
