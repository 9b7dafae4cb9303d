use crate::{
    api::ChangeType,
    bpmn::{GatewayType, NodeKind},
    document::{Flow, Node, ParsedDocument},
    error::Error,
};
use log::debug;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

// Substrings of node ids treated as structurally critical when the node is modified.
// This is a naming convention, not a structural property of the node.
const CRITICAL_ID_PARTS: &[&str] = &["start", "end", "process", "gateway"];

/// Old and new value of one tracked attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub attribute: &'static str,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl Display for AttributeChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.attribute,
            self.old.as_deref().unwrap_or("none"),
            self.new.as_deref().unwrap_or("none")
        )
    }
}

/// Differences between two documents, by element id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonResult {
    added_nodes: BTreeSet<String>,
    removed_nodes: BTreeSet<String>,
    modified_nodes: BTreeMap<String, Vec<AttributeChange>>,
    added_flows: BTreeSet<String>,
    removed_flows: BTreeSet<String>,
    modified_flows: BTreeMap<String, Vec<AttributeChange>>,
}

impl ComparisonResult {
    pub fn added_nodes(&self) -> &BTreeSet<String> {
        &self.added_nodes
    }

    pub fn removed_nodes(&self) -> &BTreeSet<String> {
        &self.removed_nodes
    }

    pub fn modified_nodes(&self) -> &BTreeMap<String, Vec<AttributeChange>> {
        &self.modified_nodes
    }

    pub fn added_flows(&self) -> &BTreeSet<String> {
        &self.added_flows
    }

    pub fn removed_flows(&self) -> &BTreeSet<String> {
        &self.removed_flows
    }

    pub fn modified_flows(&self) -> &BTreeMap<String, Vec<AttributeChange>> {
        &self.modified_flows
    }

    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.modified_nodes.is_empty()
            && self.added_flows.is_empty()
            && self.removed_flows.is_empty()
            && self.modified_flows.is_empty()
    }

    /// Human readable description of the differences.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No changes detected".into();
        }
        let sets = [
            ("Added elements", &self.added_nodes),
            ("Removed elements", &self.removed_nodes),
            ("Added flows", &self.added_flows),
            ("Removed flows", &self.removed_flows),
        ];
        let maps = [
            ("Modified elements", &self.modified_nodes),
            ("Modified flows", &self.modified_flows),
        ];

        let mut parts: Vec<String> = sets
            .into_iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(label, ids)| {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                format!("{label}: {}", ids.join(", "))
            })
            .collect();
        parts.extend(
            maps.into_iter()
                .filter(|(_, changes)| !changes.is_empty())
                .map(|(label, changes)| {
                    let changes: Vec<String> = changes
                        .iter()
                        .map(|(id, attributes)| {
                            let attributes: Vec<String> =
                                attributes.iter().map(ToString::to_string).collect();
                            format!("{id} ({})", attributes.join("; "))
                        })
                        .collect();
                    format!("{label}: {}", changes.join(", "))
                }),
        );
        parts.join(". ")
    }
}

/// Result of comparing two document texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionComparison {
    pub added_elements: Vec<String>,
    pub removed_elements: Vec<String>,
    pub modified_elements: Vec<String>,
    pub added_flows: Vec<String>,
    pub removed_flows: Vec<String>,
    pub modified_flows: Vec<String>,
    pub classification: ChangeType,
    pub summary: String,
}

impl From<ComparisonResult> for VersionComparison {
    fn from(result: ComparisonResult) -> Self {
        let classification = classify(&result);
        let summary = result.summary();
        Self {
            added_elements: result.added_nodes.into_iter().collect(),
            removed_elements: result.removed_nodes.into_iter().collect(),
            modified_elements: result.modified_nodes.into_keys().collect(),
            added_flows: result.added_flows.into_iter().collect(),
            removed_flows: result.removed_flows.into_iter().collect(),
            modified_flows: result.modified_flows.into_keys().collect(),
            classification,
            summary,
        }
    }
}

// Nodes only compare with nodes of the same category. Moving an id to another category is a
// removal plus an addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Category {
    Task,
    Event,
    Gateway(GatewayType),
    Other,
}

impl From<&NodeKind> for Category {
    fn from(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Activity(_) => Category::Task,
            NodeKind::Event(_) => Category::Event,
            NodeKind::Gateway(gateway_type) => Category::Gateway(*gateway_type),
            NodeKind::Unsupported(_) => Category::Other,
        }
    }
}

fn nodes_by_category(document: &ParsedDocument) -> BTreeMap<(Category, &str), &Node> {
    document
        .nodes()
        .iter()
        .filter_map(|node| {
            node.id
                .as_deref()
                .map(|id| ((Category::from(&node.kind), id), node))
        })
        .collect()
}

fn flows_by_id(document: &ParsedDocument) -> BTreeMap<&str, &Flow> {
    document
        .flows()
        .iter()
        .filter_map(|flow| flow.id.as_deref().map(|id| (id, flow)))
        .collect()
}

fn change(
    changes: &mut Vec<AttributeChange>,
    attribute: &'static str,
    old: Option<&str>,
    new: Option<&str>,
) {
    if old != new {
        changes.push(AttributeChange {
            attribute,
            old: old.map(Into::into),
            new: new.map(Into::into),
        });
    }
}

fn node_changes(old: &Node, new: &Node) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    change(&mut changes, "name", old.name.as_deref(), new.name.as_deref());
    change(
        &mut changes,
        "type",
        Some(old.kind.element()),
        Some(new.kind.element()),
    );
    changes
}

fn condition(flow: &Flow) -> Option<&str> {
    flow.condition.as_deref().map(str::trim)
}

fn flow_changes(old: &Flow, new: &Flow) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    change(&mut changes, "name", old.name.as_deref(), new.name.as_deref());
    change(&mut changes, "sourceRef", old.source.as_deref(), new.source.as_deref());
    change(&mut changes, "targetRef", old.target.as_deref(), new.target.as_deref());
    change(&mut changes, "condition", condition(old), condition(new));
    changes
}

/// Compare two parsed documents.
pub fn compare_documents(old: &ParsedDocument, new: &ParsedDocument) -> ComparisonResult {
    let mut result = ComparisonResult::default();

    let old_nodes = nodes_by_category(old);
    let new_nodes = nodes_by_category(new);
    for ((_, id), old_node) in &old_nodes {
        match new_nodes.get(&(Category::from(&old_node.kind), *id)) {
            Some(new_node) => {
                let changes = node_changes(old_node, new_node);
                if !changes.is_empty() {
                    result.modified_nodes.insert(id.to_string(), changes);
                }
            }
            None => {
                result.removed_nodes.insert(id.to_string());
            }
        }
    }
    result.added_nodes = new_nodes
        .keys()
        .filter(|key| !old_nodes.contains_key(*key))
        .map(|(_, id)| id.to_string())
        .collect();

    let old_flows = flows_by_id(old);
    let new_flows = flows_by_id(new);
    for (id, old_flow) in &old_flows {
        match new_flows.get(id) {
            Some(new_flow) => {
                let changes = flow_changes(old_flow, new_flow);
                if !changes.is_empty() {
                    result.modified_flows.insert(id.to_string(), changes);
                }
            }
            None => {
                result.removed_flows.insert(id.to_string());
            }
        }
    }
    result.added_flows = new_flows
        .keys()
        .filter(|id| !old_flows.contains_key(*id))
        .map(|id| id.to_string())
        .collect();

    debug!("COMPARED {}", result.summary());
    result
}

/// Compare two document texts. Fails if either cannot be parsed.
pub fn compare(old: &str, new: &str) -> Result<ComparisonResult, Error> {
    Ok(compare_documents(&old.parse()?, &new.parse()?))
}

/// Compare two document texts and classify the change.
pub fn compare_versions(old: &str, new: &str) -> Result<VersionComparison, Error> {
    compare(old, new).map(VersionComparison::from)
}

fn is_critical(id: &str) -> bool {
    let id = id.to_lowercase();
    CRITICAL_ID_PARTS.iter().any(|part| id.contains(part))
}

/// Classify a comparison. Depends only on the comparison, never on document content.
pub fn classify(result: &ComparisonResult) -> ChangeType {
    if !result.removed_nodes.is_empty()
        || !result.removed_flows.is_empty()
        || !result.modified_flows.is_empty()
        || result.modified_nodes.keys().any(|id| is_critical(id))
    {
        ChangeType::Major
    } else if !result.added_nodes.is_empty() || !result.added_flows.is_empty() {
        ChangeType::Minor
    } else {
        ChangeType::Patch
    }
}

/// Quick check on the start, end, task and gateway ids only.
pub fn has_significant_changes(old: &str, new: &str) -> Result<bool, Error> {
    let ids = |document: &ParsedDocument| -> BTreeSet<(u8, String)> {
        document
            .nodes()
            .iter()
            .filter_map(|node| {
                let group = match &node.kind {
                    _ if node.is_start() => 0,
                    _ if node.is_end() => 1,
                    NodeKind::Activity(_) => 2,
                    NodeKind::Gateway(_) => 3,
                    _ => return None,
                };
                node.id.clone().map(|id| (group, id))
            })
            .collect()
    };
    let old: ParsedDocument = old.parse()?;
    let new: ParsedDocument = new.parse()?;
    Ok(ids(&old) != ids(&new))
}

#[cfg(test)]
mod tests {
    use super::*;

    static ORDER: &str = include_str!("../tests/files/order.bpmn");
    static ORDER_ARCHIVE: &str = include_str!("../tests/files/order_archive.bpmn");

    fn ids(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn identical_documents() -> Result<(), Box<dyn std::error::Error>> {
        let result = compare(ORDER, ORDER)?;
        assert!(result.is_empty());
        assert_eq!(classify(&result), ChangeType::Patch);
        assert_eq!(result.summary(), "No changes detected");
        assert!(!has_significant_changes(ORDER, ORDER)?);
        Ok(())
    }

    #[test]
    fn added_task_is_minor() -> Result<(), Box<dyn std::error::Error>> {
        let result = compare(ORDER, ORDER_ARCHIVE)?;
        assert_eq!(result.added_nodes(), &ids(&["Archive"]));
        assert_eq!(result.added_flows(), &ids(&["Flow_Archive", "Flow_Archive_End"]));
        assert!(result.removed_nodes().is_empty());
        assert!(result.modified_flows().is_empty());
        assert_eq!(classify(&result), ChangeType::Minor);
        assert!(has_significant_changes(ORDER, ORDER_ARCHIVE)?);
        Ok(())
    }

    #[test]
    fn removed_task_is_major() -> Result<(), Box<dyn std::error::Error>> {
        let comparison = compare_versions(ORDER_ARCHIVE, ORDER)?;
        assert_eq!(comparison.removed_elements, vec!["Archive".to_string()]);
        assert_eq!(comparison.classification, ChangeType::Major);
        assert!(comparison.summary.contains("Removed elements: Archive"));
        Ok(())
    }

    #[test]
    fn renamed_task_is_patch() -> Result<(), Box<dyn std::error::Error>> {
        let renamed = ORDER.replace(r#"name="Review order""#, r#"name="Review the order""#);
        let result = compare(ORDER, &renamed)?;
        let changes = result.modified_nodes().get("Review").ok_or("Review not modified")?;
        assert_eq!(
            changes,
            &vec![AttributeChange {
                attribute: "name",
                old: Some("Review order".into()),
                new: Some("Review the order".into()),
            }]
        );
        assert_eq!(classify(&result), ChangeType::Patch);
        assert!(!has_significant_changes(ORDER, &renamed)?);
        Ok(())
    }

    #[test]
    fn renamed_critical_node_is_major() -> Result<(), Box<dyn std::error::Error>> {
        let renamed = ORDER.replace(r#"name="Approved?""#, r#"name="Accepted?""#);
        let result = compare(ORDER, &renamed)?;
        assert!(result.modified_nodes().contains_key("Gateway_Decision"));
        assert_eq!(classify(&result), ChangeType::Major);
        Ok(())
    }

    #[test]
    fn modified_flow_is_major() -> Result<(), Box<dyn std::error::Error>> {
        let changed = ORDER.replace("return approved &amp;&amp; total &gt; 0;", "return approved;");
        let result = compare(ORDER, &changed)?;
        assert!(result.modified_flows().contains_key("Flow_Approved"));
        assert_eq!(classify(&result), ChangeType::Major);
        Ok(())
    }

    #[test]
    fn changed_task_type_is_modification() -> Result<(), Box<dyn std::error::Error>> {
        let old = r#"<definitions><process id="p"><manualTask id="work" name="Work"/></process></definitions>"#;
        let new = r#"<definitions><process id="p"><sendTask id="work" name="Work"/></process></definitions>"#;
        let result = compare(old, new)?;
        assert!(result.modified_nodes().contains_key("work"));
        assert_eq!(classify(&result), ChangeType::Patch);

        let gateway = r#"<definitions><process id="p"><exclusiveGateway id="work"/></process></definitions>"#;
        let result = compare(old, gateway)?;
        assert_eq!(result.removed_nodes(), &ids(&["work"]));
        assert_eq!(result.added_nodes(), &ids(&["work"]));
        assert_eq!(classify(&result), ChangeType::Major);
        Ok(())
    }

    #[test]
    fn classification_rules() {
        let mut result = ComparisonResult::default();
        result.added_flows.insert("f".into());
        assert_eq!(classify(&result), ChangeType::Minor);

        result.modified_nodes.insert(
            "Task_1".into(),
            vec![AttributeChange {
                attribute: "name",
                old: None,
                new: Some("x".into()),
            }],
        );
        assert_eq!(classify(&result), ChangeType::Minor);

        result.modified_nodes.insert("EndEvent_2".into(), Vec::new());
        assert_eq!(classify(&result), ChangeType::Major);
    }

    #[test]
    fn unparseable_input() {
        assert!(compare("<definitions>", ORDER).is_err());
        assert!(has_significant_changes(ORDER, "nope <").is_err());
    }
}
