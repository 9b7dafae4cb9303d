mod semantic;
mod structure;

use crate::document::ParsedDocument;
use log::debug;
use std::fmt::Display;

/// Report of a validation pass. `is_valid` holds exactly when there are no errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    errors: Vec<String>,
    warnings: Vec<String>,
    infos: Vec<String>,
}

impl ValidationOutcome {
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn infos(&self) -> &[String] {
        &self.infos
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn fatal(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            ..Default::default()
        }
    }
}

impl Display for ValidationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "valid: {}, errors: {}, warnings: {}, infos: {}",
            self.is_valid(),
            self.errors.len(),
            self.warnings.len(),
            self.infos.len()
        )
    }
}

// Collects findings while the rules run. Never aborts.
#[derive(Default)]
pub(crate) struct Report {
    outcome: ValidationOutcome,
}

impl Report {
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.outcome.errors.push(message.into());
    }

    pub(crate) fn warning(&mut self, message: impl Into<String>) {
        self.outcome.warnings.push(message.into());
    }

    pub(crate) fn info(&mut self, message: impl Into<String>) {
        self.outcome.infos.push(message.into());
    }
}

impl From<Report> for ValidationOutcome {
    fn from(report: Report) -> Self {
        report.outcome
    }
}

/// Validate document text. A document that cannot be parsed yields a single error.
///
/// ```
/// let outcome = bpmn_revisions::validate("<definitions/>");
/// assert!(!outcome.is_valid());
/// ```
pub fn validate(text: &str) -> ValidationOutcome {
    match text.parse::<ParsedDocument>() {
        Ok(document) => validate_document(&document),
        Err(error) => {
            debug!("PARSE FAILED {error}");
            ValidationOutcome::fatal(format!("Document could not be parsed: {error}"))
        }
    }
}

/// Run the structural and semantic rules over a parsed document.
pub fn validate_document(document: &ParsedDocument) -> ValidationOutcome {
    let mut report = Report::default();
    structure::check(document, &mut report);
    semantic::check(document, &mut report);
    let outcome = ValidationOutcome::from(report);
    debug!("VALIDATED {outcome}");
    outcome
}

/// Validate several documents. Runs on the rayon thread pool with the `parallel` feature.
pub fn validate_all(texts: &[&str]) -> Vec<ValidationOutcome> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        texts.par_iter().map(|text| validate(text)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    texts.iter().map(|text| validate(text)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    static ORDER: &str = include_str!("../tests/files/order.bpmn");
    static ORDER_ARCHIVE: &str = include_str!("../tests/files/order_archive.bpmn");

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL" id="Definitions_1">
  <process id="p1" isExecutable="true">{body}</process>
</definitions>"#
        )
    }

    fn has(messages: &[String], fragment: &str) -> bool {
        messages.iter().any(|message| message.contains(fragment))
    }

    #[test]
    fn fixtures_are_valid() {
        for text in [ORDER, ORDER_ARCHIVE] {
            let outcome = validate(text);
            assert!(outcome.is_valid(), "{:?}", outcome.errors());
            assert!(outcome.warnings().is_empty(), "{:?}", outcome.warnings());
            assert!(!outcome.infos().is_empty());
        }
    }

    #[test]
    fn parse_failure_is_single_error() {
        let outcome = validate("<definitions><process></definitions>");
        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors().len(), 1);
        assert!(outcome.warnings().is_empty());
        assert!(outcome.infos().is_empty());
    }

    #[test]
    fn several_roots_are_rejected() {
        let document = wrap(r#"<startEvent id="s"/><endEvent id="e"/>"#);
        let body = document.trim_start_matches(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let outcome = validate(&format!("<junk/>{body}"));
        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors().len(), 1);
        assert!(has(outcome.errors(), "more than one root"));
    }

    #[test]
    fn missing_start_event_is_invalid() {
        let outcome = validate(&wrap(
            r#"<task id="t"/><endEvent id="end"/><sequenceFlow id="f" sourceRef="t" targetRef="end"/>"#,
        ));
        assert!(!outcome.is_valid());
        assert!(has(outcome.errors(), "no start event"));
    }

    #[test]
    fn missing_end_event_is_warning() {
        let outcome = validate(&wrap(
            r#"<startEvent id="start"/><manualTask id="work"/>
               <sequenceFlow id="f" sourceRef="start" targetRef="work"/>"#,
        ));
        assert!(outcome.is_valid(), "{:?}", outcome.errors());
        assert!(has(outcome.warnings(), "no end event"));
    }

    #[test]
    fn no_executable_process() {
        let text = r#"<definitions><process id="p" isExecutable="false">
            <startEvent id="s"/><endEvent id="e"/>
            <sequenceFlow id="f" sourceRef="s" targetRef="e"/></process></definitions>"#;
        let outcome = validate(text);
        assert!(!outcome.is_valid());
        assert!(has(outcome.errors(), "no executable process"));
    }

    #[test]
    fn wrong_root() {
        let outcome = validate(r#"<process id="p" isExecutable="true"/>"#);
        assert!(!outcome.is_valid());
        assert!(has(outcome.errors(), "definitions"));
    }

    #[test]
    fn identifiers() {
        let outcome = validate(&wrap(
            r#"<startEvent id="start-1"/><endEvent/><endEvent id="end"/>
               <sequenceFlow id="f1" sourceRef="start-1" targetRef="end"/>"#,
        ));
        assert!(!outcome.is_valid());
        assert!(has(outcome.warnings(), "start-1"));
        assert!(has(outcome.errors(), "has no id"));
    }

    #[test]
    fn generic_task_and_dangling_flow() {
        let outcome = validate(&wrap(
            r#"<startEvent id="start"/><task id="work"/><endEvent id="end"/>
               <sequenceFlow id="f1" sourceRef="start" targetRef="work"/>
               <sequenceFlow id="f2" sourceRef="work" targetRef="missing"/>"#,
        ));
        assert!(has(outcome.errors(), "Task has no task type"));
        assert!(has(outcome.errors(), "missing"));
        assert!(has(outcome.warnings(), "not reachable"));
    }

    #[test]
    fn user_task_needs_assignment() {
        let unassigned = validate(&wrap(
            r#"<startEvent id="start"/><userTask id="approve"/><endEvent id="end"/>
               <sequenceFlow id="f1" sourceRef="start" targetRef="approve"/>
               <sequenceFlow id="f2" sourceRef="approve" targetRef="end"/>"#,
        ));
        assert!(has(unassigned.errors(), "approve"));

        let assigned = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="end"/>
               <userTask id="approve"><ioSpecification>
                 <dataInput id="approve_GroupId" name="GroupId"/>
                 <inputSet/><outputSet/></ioSpecification></userTask>
               <sequenceFlow id="f1" sourceRef="start" targetRef="approve"/>
               <sequenceFlow id="f2" sourceRef="approve" targetRef="end"/>"#,
        ));
        assert!(assigned.is_valid(), "{:?}", assigned.errors());
    }

    #[test]
    fn script_task_needs_format_and_body() {
        let outcome = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="end"/>
               <scriptTask id="s1" scriptFormat="http://www.python.org/python"><script>x = 1</script></scriptTask>
               <scriptTask id="s2" scriptFormat="http://www.javascript.com/javascript"><script>  </script></scriptTask>
               <scriptTask id="s3" scriptFormat="mvel"><script>x = 1</script></scriptTask>
               <sequenceFlow id="f1" sourceRef="start" targetRef="s1"/>
               <sequenceFlow id="f2" sourceRef="s1" targetRef="s2"/>
               <sequenceFlow id="f3" sourceRef="s2" targetRef="s3"/>
               <sequenceFlow id="f4" sourceRef="s3" targetRef="end"/>"#,
        ));
        assert_eq!(outcome.errors().len(), 2, "{:?}", outcome.errors());
        assert!(has(outcome.errors(), "s1"));
        assert!(has(outcome.errors(), "s2"));
    }

    #[test]
    fn exclusive_gateway_rules() {
        let outcome = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="a"/><endEvent id="b"/>
               <exclusiveGateway id="split"/>
               <sequenceFlow id="f0" sourceRef="start" targetRef="split"/>
               <sequenceFlow id="f1" sourceRef="split" targetRef="a">
                 <conditionExpression>return x;</conditionExpression>
               </sequenceFlow>
               <sequenceFlow id="f2" sourceRef="split" targetRef="b"/>"#,
        ));
        assert!(has(outcome.errors(), "f2"));
        assert!(has(outcome.warnings(), "deadlock"));

        let dead_end = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="end"/><exclusiveGateway id="split"/>
               <sequenceFlow id="f0" sourceRef="start" targetRef="split"/>"#,
        ));
        assert!(has(dead_end.errors(), "split"));

        let single = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="end"/><exclusiveGateway id="pass"/>
               <sequenceFlow id="f0" sourceRef="start" targetRef="pass"/>
               <sequenceFlow id="f1" sourceRef="pass" targetRef="end"/>"#,
        ));
        assert!(!single.is_valid());
        assert!(has(single.errors(), "f1"));
    }

    #[test]
    fn parallel_gateway_rules() {
        let outcome = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="a"/><endEvent id="b"/>
               <parallelGateway id="fork"/>
               <sequenceFlow id="f0" sourceRef="start" targetRef="fork"/>
               <sequenceFlow id="f1" sourceRef="fork" targetRef="a">
                 <conditionExpression>return x;</conditionExpression>
               </sequenceFlow>
               <sequenceFlow id="f2" sourceRef="fork" targetRef="b"/>"#,
        ));
        assert!(!outcome.is_valid());
        assert!(has(outcome.errors(), "f1"));

        let single = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="end"/><parallelGateway id="fork"/>
               <sequenceFlow id="f0" sourceRef="start" targetRef="fork"/>
               <sequenceFlow id="f1" sourceRef="fork" targetRef="end"/>"#,
        ));
        assert!(has(single.errors(), "fork"));

        let join = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="end"/>
               <parallelGateway id="fork"/><parallelGateway id="join"/>
               <manualTask id="a"/><manualTask id="b"/>
               <sequenceFlow id="f0" sourceRef="start" targetRef="fork"/>
               <sequenceFlow id="f1" sourceRef="fork" targetRef="a"/>
               <sequenceFlow id="f2" sourceRef="fork" targetRef="b"/>
               <sequenceFlow id="f3" sourceRef="a" targetRef="join"/>
               <sequenceFlow id="f4" sourceRef="b" targetRef="join"/>
               <sequenceFlow id="f5" sourceRef="join" targetRef="end"/>"#,
        ));
        assert!(!join.is_valid());
        assert!(has(join.errors(), "join"));
        assert_eq!(join.errors().len(), 1, "{:?}", join.errors());
    }

    #[test]
    fn inclusive_event_based_and_complex_gateways() {
        let outcome = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="a"/><endEvent id="b"/>
               <inclusiveGateway id="or"/>
               <sequenceFlow id="f0" sourceRef="start" targetRef="or"/>
               <sequenceFlow id="f1" sourceRef="or" targetRef="a"/>
               <sequenceFlow id="f2" sourceRef="or" targetRef="b"/>"#,
        ));
        assert!(has(outcome.errors(), "or"));

        let single = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="end"/><inclusiveGateway id="or"/>
               <sequenceFlow id="f0" sourceRef="start" targetRef="or"/>
               <sequenceFlow id="f1" sourceRef="or" targetRef="end"/>"#,
        ));
        assert!(!single.is_valid());
        assert!(has(single.errors(), "no conditional outgoing"));

        let event_based = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="end"/>
               <eventBasedGateway id="wait"/>
               <intermediateCatchEvent id="timer">
                 <timerEventDefinition><timeDuration>PT1H</timeDuration></timerEventDefinition>
               </intermediateCatchEvent>
               <manualTask id="call"/>
               <sequenceFlow id="f0" sourceRef="start" targetRef="wait"/>
               <sequenceFlow id="f1" sourceRef="wait" targetRef="timer"/>
               <sequenceFlow id="f2" sourceRef="wait" targetRef="call"/>
               <sequenceFlow id="f3" sourceRef="timer" targetRef="end"/>
               <sequenceFlow id="f4" sourceRef="call" targetRef="end"/>"#,
        ));
        assert_eq!(event_based.errors().len(), 1, "{:?}", event_based.errors());
        assert!(has(event_based.errors(), "call"));

        let complex = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="end"/><complexGateway id="cx"/>
               <sequenceFlow id="f0" sourceRef="start" targetRef="cx"/>
               <sequenceFlow id="f1" sourceRef="cx" targetRef="end"/>"#,
        ));
        assert!(has(complex.errors(), "not supported"));
    }

    #[test]
    fn event_definitions() {
        let outcome = validate(&wrap(
            r#"<startEvent id="start"><messageEventDefinition/></startEvent>
               <intermediateCatchEvent id="wait"><timerEventDefinition/></intermediateCatchEvent>
               <intermediateThrowEvent id="shout"><signalEventDefinition signalRef="go"/></intermediateThrowEvent>
               <endEvent id="end"><cancelEventDefinition/></endEvent>
               <sequenceFlow id="f1" sourceRef="start" targetRef="wait"/>
               <sequenceFlow id="f2" sourceRef="wait" targetRef="shout"/>
               <sequenceFlow id="f3" sourceRef="shout" targetRef="end"/>"#,
        ));
        assert_eq!(outcome.errors().len(), 2, "{:?}", outcome.errors());
        assert!(has(outcome.errors(), "start"));
        assert!(has(outcome.errors(), "wait"));
        assert!(has(outcome.warnings(), "Cancel"));
    }

    #[test]
    fn unsupported_elements_are_warnings() {
        let outcome = validate(&wrap(
            r#"<startEvent id="start"/><endEvent id="end"/>
               <transaction id="tx"/>
               <sequenceFlow id="f1" sourceRef="start" targetRef="tx"/>
               <sequenceFlow id="f2" sourceRef="tx" targetRef="end"/>"#,
        ));
        assert!(outcome.is_valid(), "{:?}", outcome.errors());
        assert!(has(outcome.warnings(), "transaction"));
    }

    #[test]
    fn validate_many() {
        let outcomes = validate_all(&[ORDER, "not xml <", ORDER_ARCHIVE]);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_valid());
        assert!(!outcomes[1].is_valid());
        assert!(outcomes[2].is_valid());
    }
}
