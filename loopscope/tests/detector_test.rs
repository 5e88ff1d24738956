//! Integration tests for the loop pattern detector.

#![allow(clippy::unwrap_used)]

use loopscope::{analyze, Detector, Finding, SyntaxTree};

#[test]
fn test_threshold_is_strict() {
    let at_limit = analyze("for i in range(1000):\n    pass\n").unwrap();
    assert_eq!(at_limit.high_iterations().count(), 0);

    let above = analyze("for i in range(1001):\n    pass\n").unwrap();
    assert_eq!(
        above.all(),
        &[Finding::HighIterationLoop {
            line: 1,
            bound: "1001".to_owned()
        }]
    );
}

#[test]
fn test_variable_bound_never_high() {
    let findings = analyze("n = 10**9\nfor i in range(n):\n    pass\n").unwrap();
    assert_eq!(findings.high_iterations().count(), 0);
    assert_eq!(
        findings.variable_bounds().collect::<Vec<_>>(),
        vec![&Finding::VariableBound {
            line: 2,
            expression: "n".to_owned()
        }]
    );
}

#[test]
fn test_range_keyword_or_two_args_not_classified() {
    let findings = analyze("for i in range(1, 5000):\n    pass\n").unwrap();
    assert!(findings.is_empty());
}

#[test]
fn test_nesting_depth_counts_loop_ancestors() {
    let source = "\
for a in x:
    for b in y:
        for c in z:
            pass
";
    let findings = analyze(source).unwrap();
    assert_eq!(findings.nested_loops().collect::<Vec<_>>(), vec![(2, 1), (3, 2)]);
}

#[test]
fn test_depth_skips_non_loop_blocks() {
    let source = "\
for a in x:
    if a:
        with open(a) as f:
            for line in f:
                pass
";
    let findings = analyze(source).unwrap();
    assert_eq!(findings.nested_loops().collect::<Vec<_>>(), vec![(4, 1)]);
}

#[test]
fn test_while_is_not_a_loop_ancestor() {
    let findings = analyze("while True:\n    for i in x:\n        break\n").unwrap();
    assert_eq!(findings.nested_loops().count(), 0);
}

#[test]
fn test_repeated_computation_scoped_to_innermost_loop() {
    let source = "\
total = a + b
for i in xs:
    y = i * 2
    for j in ys:
        z = i + j
";
    let findings = analyze(source).unwrap();
    let repeated: Vec<_> = findings.repeated_computations().collect();
    assert_eq!(
        repeated,
        vec![
            &Finding::RepeatedComputation {
                line: 3,
                loop_line: 2,
                expression: "BinOp(left=Name(id='i'), op=Mult(), right=Constant(value=2))"
                    .to_owned(),
                source: "i * 2".to_owned(),
            },
            &Finding::RepeatedComputation {
                line: 5,
                loop_line: 4,
                expression: "BinOp(left=Name(id='i'), op=Add(), right=Name(id='j'))".to_owned(),
                source: "i + j".to_owned(),
            },
        ]
    );
}

#[test]
fn test_subtraction_is_not_repeated_computation() {
    let findings = analyze("for i in xs:\n    y = i - 1\n").unwrap();
    assert_eq!(findings.repeated_computations().count(), 0);
}

#[test]
fn test_detection_is_deterministic() {
    let source = "\
for i in range(5000):
    for j in range(k):
        x = i * j + 1
";
    let first = analyze(source).unwrap();
    let second = analyze(source).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_findings_in_document_order() {
    let source = "\
for i in range(5000):
    for j in range(k):
        x = i * j
";
    let lines: Vec<usize> = analyze(source).unwrap().all().iter().map(Finding::line).collect();
    assert_eq!(lines, vec![1, 2, 2, 3]);
}

#[test]
fn test_detector_threshold_is_configurable() {
    let tree = SyntaxTree::parse("for i in range(20):\n    pass\n").unwrap();
    assert_eq!(Detector::with_threshold(19).detect(&tree).len(), 1);
    assert!(Detector::with_threshold(20).detect(&tree).is_empty());
}

#[test]
fn test_syntax_error_reports_position() {
    let err = analyze("x = 1\nfor i in :\n    pass\n").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(!err.message.is_empty());
}

#[test]
fn test_json_shape() {
    let findings = analyze("for i in range(2000):\n    for j in y:\n        pass\n").unwrap();
    let json = serde_json::to_value(&findings).unwrap();
    assert_eq!(json["nestedLoops"][0]["line"], 2);
    assert_eq!(json["nestedLoops"][0]["level"], 1);
    assert_eq!(json["highIterations"][0]["kind"], "highIterationLoop");
    assert_eq!(json["highIterations"][0]["bound"], "2000");
    assert_eq!(json["vectorizationCandidates"], serde_json::json!([]));
}

#[test]
fn test_suggestions_quote_source_text() {
    let findings = analyze("for i in xs:\n    y = i * 2\n").unwrap();
    assert_eq!(
        findings.suggestions(),
        vec!["Line 2: Consider caching repeated computation 'i * 2'.".to_owned()]
    );
}
