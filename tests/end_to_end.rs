//! Modules compiled from ASTs and run against the in-memory host

mod common;

use arden_mlm::ast::{
    BinaryOperator, ClockValue, ConditionalBranch, DurationUnit, ExpressionNode as E, IfData,
    MappingKind, MlmSource, SortOrder, SourcePosition, Statement, UnaryOperator,
};
use arden_mlm::testing::{ast, fixed_time, InterfaceCall, TestContext, WrittenMessage};
use arden_mlm::testing::{DESTINATION_MAPPING, INTERFACE_MAPPING, READ_MAPPING};
use arden_mlm::{ArdenError, ArdenEvent, ArdenValue, CompileError, MlmEngine};
use common::{init_logging, returning, run};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn num(value: f64) -> E {
    E::number(value)
}

fn id(name: &str) -> E {
    E::identifier(name)
}

fn binary(op: BinaryOperator, left: E, right: E) -> E {
    E::binary_op(op, left, right)
}

#[test]
fn test_duration_added_to_now() {
    init_logging();
    let source = returning(
        "relative_time",
        vec![
            Statement::let_("x", E::duration(num(2.0), DurationUnit::Days)),
            Statement::let_("y", binary(BinaryOperator::Add, id("x"), E::now())),
        ],
        vec![id("y")],
    );

    let results = run(&source, &TestContext::new()).unwrap();
    assert_eq!(results, vec![ArdenValue::time(fixed_time(2024, 1, 3))]);
}

#[test]
fn test_now_can_be_moved() {
    let source = returning(
        "moved_now",
        vec![
            ast::set_now(E::time("2030-06-01")),
            Statement::let_(
                "later",
                binary(BinaryOperator::Add, E::now(), E::duration(num(1.0), DurationUnit::Days)),
            ),
        ],
        vec![id("later"), E::Clock(ClockValue::CurrentTime)],
    );

    let results = run(&source, &TestContext::new()).unwrap();
    assert_eq!(
        results,
        vec![
            ArdenValue::time(fixed_time(2030, 6, 2)),
            ArdenValue::time(fixed_time(2024, 1, 1)),
        ]
    );
}

#[test]
fn test_read_is_rejected_at_compile_time() {
    let source = MlmSource::new("reader").with_data(vec![ast::read("a", READ_MAPPING, 3)]);

    let err = MlmEngine::new().compile(&source).unwrap_err();
    assert_eq!(
        err.as_compile_error(),
        Some(&CompileError::unsupported("READ", SourcePosition::new(3, 1)))
    );
    assert_eq!(err.to_string(), "READ is not yet implemented (line 3, column 1)");
}

#[test]
fn test_interface_call_reaches_the_host() {
    init_logging();
    let source = MlmSource::new("caller")
        .with_data(vec![Statement::declare("i", MappingKind::Interface, INTERFACE_MAPPING)])
        .with_logic(vec![Statement::conclude(E::boolean(true))])
        .with_action(vec![Statement::call("i", [num(3.0), num(4.0)], None)]);
    let context = TestContext::new();

    let results = run(&source, &context).unwrap();
    assert!(results.is_empty());
    assert_eq!(
        context.interface_calls(),
        vec![InterfaceCall {
            mapping: INTERFACE_MAPPING.to_string(),
            arguments: vec![ArdenValue::number(3.0), ArdenValue::number(4.0)],
            results: vec![ArdenValue::number(7.0), ArdenValue::number(12.0)],
        }]
    );
}

#[test]
fn test_failing_interface_surfaces_its_error() {
    let source = MlmSource::new("caller")
        .with_data(vec![Statement::declare("i", MappingKind::Interface, INTERFACE_MAPPING)])
        .with_logic(vec![Statement::conclude(E::boolean(true))])
        .with_action(vec![Statement::call("i", [num(3.0)], None)]);

    let err = run(&source, &TestContext::new()).unwrap_err();
    assert!(matches!(
        err.as_runtime_error(),
        Some(ArdenError::InvocationTarget { target, .. }) if target == INTERFACE_MAPPING
    ));
}

#[test]
fn test_unknown_interface() {
    let source = MlmSource::new("caller")
        .with_data(vec![Statement::declare("i", MappingKind::Interface, "nowhere")])
        .with_logic(vec![Statement::conclude(E::boolean(true))])
        .with_action(vec![Statement::call("i", Vec::<E>::new(), None)]);

    let err = run(&source, &TestContext::new()).unwrap_err();
    assert_eq!(err.as_runtime_error(), Some(&ArdenError::interface_not_found("nowhere")));
}

#[test]
fn test_nested_where_keeps_outer_candidate() {
    // ((it, 100) WHERE it > 50) = (1, 2, 3) is null, so the outer `it > 2` decides
    let inner = E::where_(
        E::list([E::it(), num(100.0)]),
        binary(BinaryOperator::Greater, E::it(), num(50.0)),
    );
    let predicate = binary(
        BinaryOperator::Or,
        binary(BinaryOperator::Equal, inner, E::list([num(1.0), num(2.0), num(3.0)])),
        binary(BinaryOperator::Greater, E::it(), num(2.0)),
    );
    let source = returning(
        "filter",
        vec![Statement::let_(
            "kept",
            E::where_(E::list([num(1.0), num(5.0), num(7.0)]), predicate),
        )],
        vec![id("kept")],
    );

    let results = run(&source, &TestContext::new()).unwrap();
    assert_eq!(results, vec![ArdenValue::list(vec![5.into(), 7.into()])]);
}

#[test]
fn test_where_with_list_predicates_filters_pairwise() {
    let source = returning(
        "pairwise",
        vec![Statement::let_("x", E::list([num(1.0), num(5.0), num(7.0)]))],
        vec![
            E::where_(
                E::list([num(1.0), num(5.0), num(7.0)]),
                E::list([E::boolean(false), E::boolean(true), E::boolean(true)]),
            ),
            E::where_(id("x"), binary(BinaryOperator::Greater, id("x"), num(2.0))),
        ],
    );

    let results = run(&source, &TestContext::new()).unwrap();
    let kept = ArdenValue::list(vec![5.into(), 7.into()]);
    assert_eq!(results, vec![kept.clone(), kept]);
}

#[test]
fn test_where_over_filtered_candidates() {
    let candidates = E::where_(
        E::list([num(1.0), num(5.0), num(7.0), num(10.0)]),
        binary(BinaryOperator::Greater, E::it(), num(2.0)),
    );
    let source = returning(
        "filter",
        vec![],
        vec![E::where_(candidates, binary(BinaryOperator::Less, E::it(), num(8.0)))],
    );

    let results = run(&source, &TestContext::new()).unwrap();
    assert_eq!(results, vec![ArdenValue::list(vec![5.into(), 7.into()])]);
}

#[test]
fn test_control_flow() {
    init_logging();
    let source = returning(
        "control_flow",
        vec![
            Statement::let_("total", num(0.0)),
            ast::for_in(
                "x",
                E::list([num(1.0), num(2.0), num(3.0), num(4.0)]),
                vec![Statement::let_("total", binary(BinaryOperator::Add, id("total"), id("x")))],
            ),
            Statement::let_("n", num(0.0)),
            ast::while_do(
                binary(BinaryOperator::Less, id("n"), num(3.0)),
                vec![Statement::let_("n", binary(BinaryOperator::Add, id("n"), num(1.0)))],
            ),
            Statement::If(Box::new(IfData {
                branches: vec![
                    ConditionalBranch {
                        condition: E::null(),
                        body: vec![Statement::let_("kind", E::string("a"))],
                        position: SourcePosition::default(),
                    },
                    ConditionalBranch {
                        condition: binary(BinaryOperator::Greater, id("total"), num(5.0)),
                        body: vec![Statement::let_("kind", E::string("b"))],
                        position: SourcePosition::default(),
                    },
                ],
                otherwise: Some(vec![Statement::let_("kind", E::string("c"))]),
                position: SourcePosition::default(),
            })),
            Statement::let_("single", num(0.0)),
            ast::for_in("x", num(5.0), vec![Statement::let_("single", id("x"))]),
        ],
        vec![id("total"), id("n"), id("kind"), id("single")],
    );

    let results = run(&source, &TestContext::new()).unwrap();
    let expected: Vec<ArdenValue> = vec![10.into(), 3.into(), "b".into(), 5.into()];
    assert_eq!(results, expected);
}

#[rstest]
#[case::true_branch(E::boolean(true), "then")]
#[case::false_branch(E::boolean(false), "else")]
#[case::null_branch(E::null(), "else")]
#[case::non_boolean(num(1.0), "else")]
fn test_if_takes_only_true(#[case] condition: E, #[case] expected: &str) {
    let source = returning(
        "branch",
        vec![ast::if_then(
            condition,
            vec![Statement::let_("r", E::string("then"))],
            Some(vec![Statement::let_("r", E::string("else"))]),
        )],
        vec![id("r")],
    );

    let results = run(&source, &TestContext::new()).unwrap();
    assert_eq!(results, vec![ArdenValue::string(expected)]);
}

#[test]
fn test_time_of_and_merge() {
    let source = returning(
        "timed",
        vec![
            Statement::let_("a", num(1.0)),
            ast::set_time_of("a", E::time("2024-03-01")),
            Statement::let_("b", num(2.0)),
            ast::set_time_of("b", E::time("2024-02-01")),
        ],
        vec![
            E::merge(id("a"), id("b")),
            E::time_of(id("a")),
            E::sort(SortOrder::Data, E::list([id("a"), id("b"), num(-1.0)])),
        ],
    );

    let results = run(&source, &TestContext::new()).unwrap();
    let a = ArdenValue::number(1.0).with_primary_time(Some(fixed_time(2024, 3, 1)));
    let b = ArdenValue::number(2.0).with_primary_time(Some(fixed_time(2024, 2, 1)));
    assert_eq!(
        results,
        vec![
            ArdenValue::list(vec![b.clone(), a.clone()]),
            ArdenValue::time(fixed_time(2024, 3, 1)),
            ArdenValue::list(vec![ArdenValue::number(-1.0), a, b]),
        ]
    );
}

#[test]
fn test_unary_operators() {
    let source = returning(
        "unary",
        vec![],
        vec![
            E::unary_op(UnaryOperator::Minus, num(4.0)),
            E::unary_op(UnaryOperator::Not, E::null()),
            E::unary_op(UnaryOperator::Not, E::boolean(false)),
        ],
    );

    let results = run(&source, &TestContext::new()).unwrap();
    assert_eq!(
        results,
        vec![ArdenValue::number(-4.0), ArdenValue::null(), ArdenValue::boolean(true)]
    );
}

#[test]
fn test_event_variables_and_clocks() {
    let admitted = fixed_time(2024, 5, 6);
    let mut context = TestContext::new();
    context
        .add_event(ArdenEvent::triggered_at("admission", admitted))
        .set_event_time(admitted)
        .set_trigger_time(fixed_time(2024, 5, 7));
    let source = returning(
        "events",
        vec![
            Statement::declare("adm", MappingKind::Event, "admission"),
            Statement::declare("dis", MappingKind::Event, "discharge"),
        ],
        vec![
            id("adm"),
            id("dis"),
            E::Clock(ClockValue::EventTime),
            E::Clock(ClockValue::TriggerTime),
        ],
    );

    let results = run(&source, &context).unwrap();
    assert_eq!(
        results,
        vec![
            ArdenValue::boolean(true).with_primary_time(Some(admitted)),
            ArdenValue::boolean(false),
            ArdenValue::time(admitted),
            ArdenValue::time(fixed_time(2024, 5, 7)),
        ]
    );
}

#[test]
fn test_writes_reach_their_destinations() {
    let source = MlmSource::new("writer")
        .with_data(vec![
            Statement::declare("pager", MappingKind::Destination, DESTINATION_MAPPING),
            Statement::declare("msg", MappingKind::Message, "patient alert"),
        ])
        .with_logic(vec![Statement::conclude(E::boolean(true))])
        .with_action(vec![
            ast::write(E::string("hello"), None),
            ast::write(id("msg"), Some("pager")),
        ]);
    let context = TestContext::new();

    run(&source, &context).unwrap();
    assert_eq!(context.messages(), vec!["hello", "patient alert"]);
    assert_eq!(
        context.written(),
        vec![
            WrittenMessage {
                message: ArdenValue::string("hello"),
                destination: String::new(),
            },
            WrittenMessage {
                message: ArdenValue::string("patient alert"),
                destination: DESTINATION_MAPPING.to_string(),
            },
        ]
    );
}

#[rstest]
#[case::null(E::null())]
#[case::false_value(E::boolean(false))]
#[case::number(num(1.0))]
fn test_action_skipped_unless_concluded_true(#[case] conclusion: E) {
    let source = MlmSource::new("quiet")
        .with_logic(vec![Statement::conclude(conclusion)])
        .with_action(vec![
            ast::write(E::string("should not happen"), None),
            Statement::return_(vec![num(1.0)]),
        ]);
    let context = TestContext::new();

    assert!(run(&source, &context).unwrap().is_empty());
    assert!(context.messages().is_empty());
}

#[test]
fn test_logic_without_conclude_skips_action() {
    let source = MlmSource::new("undecided")
        .with_logic(vec![Statement::let_("x", num(1.0))])
        .with_action(vec![Statement::return_(vec![id("x")])]);

    assert!(run(&source, &TestContext::new()).unwrap().is_empty());
}

#[test]
fn test_compile_errors_surface_through_the_engine() {
    let outside_where = MlmSource::new("bad").with_data(vec![Statement::let_("x", E::it())]);
    let err = MlmEngine::new().compile(&outside_where).unwrap_err();
    assert!(matches!(
        err.as_compile_error(),
        Some(CompileError::ScopeViolation { construct, .. }) if construct == "it"
    ));

    let misplaced = MlmSource::new("bad").with_action(vec![Statement::conclude(E::boolean(true))]);
    let err = MlmEngine::new().compile(&misplaced).unwrap_err();
    assert!(matches!(
        err.as_compile_error(),
        Some(CompileError::MisplacedStatement { statement, block, .. })
            if statement == "CONCLUDE" && block == "ACTION"
    ));

    let undefined = returning("bad", vec![], vec![id("missing")]);
    let err = MlmEngine::new().compile(&undefined).unwrap_err();
    assert!(matches!(
        err.as_compile_error(),
        Some(CompileError::UndefinedVariable { name, .. }) if name == "missing"
    ));
}

#[test]
fn test_declaration_cannot_rebind_a_data_variable() {
    let source = MlmSource::new("bad").with_data(vec![
        Statement::let_("feed", num(1.0)),
        Statement::declare("feed", MappingKind::Interface, INTERFACE_MAPPING),
    ]);
    let err = MlmEngine::new().compile(&source).unwrap_err();
    assert!(matches!(
        err.as_compile_error(),
        Some(CompileError::InvalidVariableUse { name, usage, .. })
            if name == "feed" && usage == "as INTERFACE declaration target"
    ));
}

#[test]
fn test_negative_zero_literal_keeps_its_sign() {
    let source = returning("zeros", vec![], vec![num(0.0), num(-0.0)]);
    let results = run(&source, &TestContext::new()).unwrap();
    let signs: Vec<bool> = results
        .iter()
        .map(|value| value.as_number().unwrap().is_sign_negative())
        .collect();
    assert_eq!(signs, vec![false, true]);
}
