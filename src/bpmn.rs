use std::fmt::Display;

// Element local names
pub(crate) const DEFINITIONS: &[u8] = b"definitions";
pub(crate) const PROCESS: &[u8] = b"process";
pub(crate) const SEQUENCE_FLOW: &[u8] = b"sequenceFlow";
pub(crate) const CONDITION_EXPRESSION: &[u8] = b"conditionExpression";
pub(crate) const SCRIPT: &[u8] = b"script";
pub(crate) const DATA_INPUT: &[u8] = b"dataInput";
pub(crate) const META_DATA: &[u8] = b"metaData";
pub(crate) const TIME_DATE: &[u8] = b"timeDate";
pub(crate) const TIME_DURATION: &[u8] = b"timeDuration";
pub(crate) const TIME_CYCLE: &[u8] = b"timeCycle";
pub(crate) const CONDITION: &[u8] = b"condition";

// Children of a process or sub process that are not flow nodes but are expected there.
const SCOPE_CHILDREN: &[&[u8]] = &[
    b"documentation",
    b"extensionElements",
    b"auditing",
    b"monitoring",
    b"property",
    b"laneSet",
    b"ioSpecification",
    b"ioBinding",
    b"dataObject",
    b"dataObjectReference",
    b"dataStoreReference",
    b"textAnnotation",
    b"association",
    b"group",
    b"supports",
    b"correlationSubscription",
    // Own children of a sub process
    b"incoming",
    b"outgoing",
    b"dataInputAssociation",
    b"dataOutputAssociation",
    b"multiInstanceLoopCharacteristics",
    b"standardLoopCharacteristics",
];

// Elements that assign a user task to someone.
const ASSIGNMENTS: &[&[u8]] = &[
    b"potentialOwner",
    b"humanPerformer",
    b"performer",
    b"resourceAssignmentExpression",
];

// Attributes (any namespace) that assign a user task to someone.
pub(crate) const ASSIGNMENT_ATTRIBUTES: &[&str] = &[
    "assignee",
    "candidateUsers",
    "candidateGroups",
    "actorId",
    "groupId",
];

// Data input names that carry a user task assignment.
pub(crate) const ASSIGNMENT_INPUTS: &[&str] = &["ActorId", "GroupId", "users", "groups"];

pub(crate) fn is_scope_child(name: &[u8]) -> bool {
    SCOPE_CHILDREN.contains(&name)
}

pub(crate) fn is_assignment(name: &[u8]) -> bool {
    ASSIGNMENTS.contains(&name)
}

pub(crate) fn is_time_expression(name: &[u8]) -> bool {
    matches!(name, TIME_DATE | TIME_DURATION | TIME_CYCLE)
}

/// Kind of a flow node in a process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Event(EventType),
    Activity(ActivityType),
    Gateway(GatewayType),
    /// Flow element outside the supported set, with its element name.
    Unsupported(String),
}

impl NodeKind {
    pub fn is_task(&self) -> bool {
        matches!(self, NodeKind::Activity(_))
    }

    pub fn is_event(&self) -> bool {
        matches!(self, NodeKind::Event(_))
    }

    pub fn is_gateway(&self) -> bool {
        matches!(self, NodeKind::Gateway(_))
    }

    /// Element name as written in the document.
    pub fn element(&self) -> &str {
        match self {
            NodeKind::Event(event_type) => event_type.element(),
            NodeKind::Activity(activity_type) => activity_type.element(),
            NodeKind::Gateway(gateway_type) => gateway_type.element(),
            NodeKind::Unsupported(name) => name,
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Event(event_type) => write!(f, "{event_type}"),
            NodeKind::Activity(activity_type) => write!(f, "{activity_type}"),
            NodeKind::Gateway(gateway_type) => write!(f, "{gateway_type}"),
            NodeKind::Unsupported(name) => write!(f, "Unsupported({name})"),
        }
    }
}

impl TryFrom<&[u8]> for NodeKind {
    type Error = ();

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Ok(match value {
            b"startEvent" => NodeKind::Event(EventType::Start),
            b"endEvent" => NodeKind::Event(EventType::End),
            b"intermediateCatchEvent" => NodeKind::Event(EventType::IntermediateCatch),
            b"intermediateThrowEvent" => NodeKind::Event(EventType::IntermediateThrow),
            b"boundaryEvent" => NodeKind::Event(EventType::Boundary),
            b"task" => NodeKind::Activity(ActivityType::Task),
            b"userTask" => NodeKind::Activity(ActivityType::UserTask),
            b"scriptTask" => NodeKind::Activity(ActivityType::ScriptTask),
            b"serviceTask" => NodeKind::Activity(ActivityType::ServiceTask),
            b"businessRuleTask" => NodeKind::Activity(ActivityType::BusinessRuleTask),
            b"sendTask" => NodeKind::Activity(ActivityType::SendTask),
            b"receiveTask" => NodeKind::Activity(ActivityType::ReceiveTask),
            b"manualTask" => NodeKind::Activity(ActivityType::ManualTask),
            b"callActivity" => NodeKind::Activity(ActivityType::CallActivity),
            b"subProcess" => NodeKind::Activity(ActivityType::SubProcess),
            b"exclusiveGateway" => NodeKind::Gateway(GatewayType::Exclusive),
            b"parallelGateway" => NodeKind::Gateway(GatewayType::Parallel),
            b"inclusiveGateway" => NodeKind::Gateway(GatewayType::Inclusive),
            b"eventBasedGateway" => NodeKind::Gateway(GatewayType::EventBased),
            b"complexGateway" => NodeKind::Gateway(GatewayType::Complex),
            _ => return Err(()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Start,
    End,
    IntermediateCatch,
    IntermediateThrow,
    Boundary,
}

impl EventType {
    fn element(&self) -> &'static str {
        match self {
            EventType::Start => "startEvent",
            EventType::End => "endEvent",
            EventType::IntermediateCatch => "intermediateCatchEvent",
            EventType::IntermediateThrow => "intermediateThrowEvent",
            EventType::Boundary => "boundaryEvent",
        }
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityType {
    Task,
    UserTask,
    ScriptTask,
    ServiceTask,
    BusinessRuleTask,
    SendTask,
    ReceiveTask,
    ManualTask,
    CallActivity,
    SubProcess,
}

impl ActivityType {
    fn element(&self) -> &'static str {
        match self {
            ActivityType::Task => "task",
            ActivityType::UserTask => "userTask",
            ActivityType::ScriptTask => "scriptTask",
            ActivityType::ServiceTask => "serviceTask",
            ActivityType::BusinessRuleTask => "businessRuleTask",
            ActivityType::SendTask => "sendTask",
            ActivityType::ReceiveTask => "receiveTask",
            ActivityType::ManualTask => "manualTask",
            ActivityType::CallActivity => "callActivity",
            ActivityType::SubProcess => "subProcess",
        }
    }
}

impl Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GatewayType {
    Exclusive,
    Parallel,
    Inclusive,
    EventBased,
    Complex,
}

impl GatewayType {
    fn element(&self) -> &'static str {
        match self {
            GatewayType::Exclusive => "exclusiveGateway",
            GatewayType::Parallel => "parallelGateway",
            GatewayType::Inclusive => "inclusiveGateway",
            GatewayType::EventBased => "eventBasedGateway",
            GatewayType::Complex => "complexGateway",
        }
    }
}

impl Display for GatewayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self, f)
    }
}

/// Event definition kinds. `Cancel` is recognized but not supported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Cancel,
    Compensation,
    Conditional,
    Error,
    Escalation,
    Link,
    Message,
    Signal,
    Terminate,
    Timer,
}

impl Symbol {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Symbol::Cancel)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self, f)
    }
}

impl TryFrom<&[u8]> for Symbol {
    type Error = ();

    // `Self::Error` would name the `Error` variant
    fn try_from(value: &[u8]) -> Result<Self, ()> {
        Ok(match value {
            b"cancelEventDefinition" => Symbol::Cancel,
            b"compensateEventDefinition" => Symbol::Compensation,
            b"conditionalEventDefinition" => Symbol::Conditional,
            b"errorEventDefinition" => Symbol::Error,
            b"escalationEventDefinition" => Symbol::Escalation,
            b"linkEventDefinition" => Symbol::Link,
            b"messageEventDefinition" => Symbol::Message,
            b"signalEventDefinition" => Symbol::Signal,
            b"terminateEventDefinition" => Symbol::Terminate,
            b"timerEventDefinition" => Symbol::Timer,
            _ => return Err(()),
        })
    }
}
