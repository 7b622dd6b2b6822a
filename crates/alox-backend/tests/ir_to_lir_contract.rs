use alox_backend::BackendConfig;
use alox_core::ast::{
    AstDeclaration, BinaryOp, ElseBranch, Expression, IfStatement, Statement, StructKind, TypeName,
};
use alox_core::diagnostics::Severity;
use alox_core::lir::{LirConstant, LirInstructionKind, LirTerminator, LirType, LirValue};
use alox_core::pretty::{pretty, PrettyOptions};
use alox_core::Path;
use pretty_assertions::assert_eq;

mod support;

use support::{
    ast_module, defined, function, generic_structure, kinds, lower, lower_with, point, reference,
    ty,
};

fn int32(value: i64) -> LirValue {
    LirValue::Constant(LirConstant::Int(value, LirType::Int(32)))
}

fn int(value: i64, bits: u32) -> LirValue {
    LirValue::Constant(LirConstant::Int(value, LirType::Int(bits)))
}

fn failure_labels(declarations: Vec<AstDeclaration>) -> Vec<String> {
    lower_with(
        vec![ast_module("test", "main", declarations)],
        "test::main",
        BackendConfig::default(),
    )
    .into_result()
    .expect_err("lowering fails")
    .iter()
    .map(|diagnostic| diagnostic.labels[0].message.clone())
    .collect()
}

#[test]
fn by_value_fields_are_extracted() {
    let program = lower(vec![
        point(),
        AstDeclaration::Function(function(
            "getX",
            &[("p", ty("Point"))],
            ty("Int32"),
            vec![Statement::Return(Expression::field(Expression::var("p"), "x"))],
        )),
    ]);

    let get_x = defined(&program, "getX");
    assert_eq!(
        kinds(get_x),
        vec![LirInstructionKind::ExtractValue {
            aggregate: LirValue::Local(0),
            indices: vec![1],
        }]
    );
    assert_eq!(
        get_x.basic_blocks[0].terminator,
        LirTerminator::Return(Some(LirValue::Register(0)))
    );
}

#[test]
fn fields_behind_a_reference_are_loaded_through_a_pointer() {
    let program = lower(vec![
        point(),
        AstDeclaration::Function(function(
            "getX",
            &[("p", reference("Point"))],
            ty("Int32"),
            vec![Statement::Return(Expression::field(Expression::var("p"), "x"))],
        )),
    ]);

    let get_x = defined(&program, "getX");
    assert_eq!(
        kinds(get_x),
        vec![
            LirInstructionKind::GetElementPtr {
                ptr: LirValue::Local(0),
                indices: vec![int32(0), int32(1)],
                inbounds: true,
            },
            LirInstructionKind::Load {
                address: LirValue::Register(0),
            },
        ]
    );
}

#[test]
fn assignments_through_a_reference_store_into_the_field() {
    let program = lower(vec![
        point(),
        AstDeclaration::Function(function(
            "setA",
            &[("p", reference("Point"))],
            ty("Void"),
            vec![Statement::Assignment {
                target: Expression::field(Expression::var("p"), "a"),
                value: Expression::IntegerLiteral(2),
            }],
        )),
    ]);

    let set_a = kinds(defined(&program, "setA"));
    assert_eq!(set_a.len(), 4);
    assert_eq!(
        set_a[2],
        LirInstructionKind::GetElementPtr {
            ptr: LirValue::Local(0),
            indices: vec![int32(0), int32(0)],
            inbounds: true,
        }
    );
    assert_eq!(
        set_a[3],
        LirInstructionKind::Store {
            value: int32(2),
            address: LirValue::Register(2),
        }
    );
}

#[test]
fn method_calls_pass_the_receiver_pointer_first() {
    let pong = support::behavior(
        "pong",
        &[("n", ty("Int32")), ("from", reference("A"))],
        Vec::new(),
    );
    let ping = support::behavior(
        "ping",
        &[("b", reference("B")), ("n", ty("Int32"))],
        vec![Statement::MethodCall {
            receiver: Expression::var("b"),
            method: "pong".to_string(),
            arguments: vec![Expression::var("n"), Expression::This],
        }],
    );
    let program = lower(vec![
        support::structure("A", StructKind::Actor, &[], vec![ping]),
        support::structure("B", StructKind::Actor, &[], vec![pong]),
    ]);

    let ping = defined(&program, "Aping");
    assert_eq!(
        kinds(ping),
        vec![LirInstructionKind::Call {
            function: LirValue::Function("Bpong".to_string()),
            args: vec![LirValue::Local(1), LirValue::Local(2), LirValue::Local(0)],
        }]
    );
    assert_eq!(ping.basic_blocks[0].terminator, LirTerminator::Return(None));

    let pong = defined(&program, "Bpong");
    assert_eq!(pong.signature.params.len(), 3);
    assert_eq!(pong.signature.params[1], LirType::Int(32));
    assert_eq!(pong.signature.return_type, LirType::Void);
}

#[test]
fn arbitrary_integer_widths_survive_lowering() {
    let program = lower(vec![AstDeclaration::Function(function(
        "wide",
        &[("v", ty("Int17"))],
        ty("Int17"),
        vec![Statement::Return(Expression::var("v"))],
    ))]);

    let wide = defined(&program, "wide");
    assert_eq!(wide.signature.params, vec![LirType::Int(17)]);
    assert_eq!(wide.signature.return_type, LirType::Int(17));
    assert_eq!(
        pretty(&program, PrettyOptions::default()).to_string(),
        "lir::Program {\n  functions:\n    fn wide(arg0: i17) -> i17 {\n      bb0:\n        ret %arg0\n    }\n}\n"
    );
}

#[test]
fn blocks_without_a_terminator_get_a_default_one() {
    let program = lower(vec![
        AstDeclaration::Function(function("nothing", &[], ty("Void"), Vec::new())),
        AstDeclaration::Function(function(
            "stuck",
            &[],
            ty("Int32"),
            vec![Statement::VariableDeclaration {
                name: "x".to_string(),
                type_name: ty("Int32"),
            }],
        )),
    ]);

    let nothing = defined(&program, "nothing");
    assert_eq!(nothing.basic_blocks[0].terminator, LirTerminator::Return(None));

    let stuck = defined(&program, "stuck");
    assert_eq!(
        kinds(stuck),
        vec![LirInstructionKind::Alloca {
            ty: LirType::Int(32),
            alignment: 4,
        }]
    );
    assert_eq!(stuck.basic_blocks[0].terminator, LirTerminator::Unreachable);
}

#[test]
fn branches_map_onto_blocks_with_the_same_index() {
    let program = lower(vec![AstDeclaration::Function(function(
        "pick",
        &[("c", ty("Bool"))],
        ty("Int32"),
        vec![Statement::If(IfStatement {
            condition: Expression::var("c"),
            block: vec![Statement::Return(Expression::IntegerLiteral(1))],
            else_branch: Some(ElseBranch::Block(vec![Statement::Return(
                Expression::IntegerLiteral(2),
            )])),
        })],
    ))]);

    let pick = defined(&program, "pick");
    assert_eq!(pick.basic_blocks.len(), 3);
    assert_eq!(
        pick.basic_blocks[0].terminator,
        LirTerminator::CondBr {
            condition: LirValue::Local(0),
            if_true: 1,
            if_false: 2,
        }
    );
    assert_eq!(pick.basic_blocks[1].terminator, LirTerminator::Return(Some(int32(1))));
    assert_eq!(pick.basic_blocks[2].terminator, LirTerminator::Return(Some(int32(2))));
}

#[test]
fn self_referential_structs_refer_to_themselves_by_name() {
    let program = lower(vec![support::structure(
        "Node",
        StructKind::Struct,
        &[("value", ty("Int32")), ("next", reference("Node"))],
        Vec::new(),
    )]);

    let node = program.type_definition("Node").expect("Node lowered");
    assert_eq!(
        node.ty,
        LirType::Struct {
            name: Some("Node".to_string()),
            fields: vec![LirType::Int(32), LirType::ptr(LirType::Named("Node".to_string()))],
            packed: false,
        }
    );
}

#[test]
fn new_allocates_through_malloc() {
    let program = lower(vec![
        point(),
        AstDeclaration::Function(function(
            "make",
            &[],
            reference("Point"),
            vec![Statement::Return(Expression::New(ty("Point")))],
        )),
    ]);

    let make = defined(&program, "make");
    assert_eq!(
        kinds(make),
        vec![LirInstructionKind::Call {
            function: LirValue::Function("malloc".to_string()),
            args: vec![LirValue::Constant(LirConstant::Int(8, LirType::Int(64)))],
        }]
    );
    let malloc = program.function("malloc").expect("malloc declared");
    assert!(malloc.is_declaration());
    assert_eq!(malloc.signature.params, vec![LirType::Int(64)]);
}

#[test]
fn functions_of_other_modules_are_only_declared() {
    let util = ast_module(
        "other",
        "util",
        vec![AstDeclaration::Function(function(
            "helper",
            &[],
            ty("Int32"),
            vec![Statement::Return(Expression::IntegerLiteral(7))],
        ))],
    );
    let main = ast_module(
        "test",
        "main",
        vec![AstDeclaration::Function(function(
            "run",
            &[],
            ty("Int32"),
            vec![Statement::Return(Expression::call(
                Expression::qualified(Path::parse("other::util"), "helper"),
                Vec::new(),
            ))],
        ))],
    );

    let (program, diagnostics) =
        lower_with(vec![util, main], "test::main", BackendConfig::default())
            .into_result()
            .expect("lowering succeeds");
    assert!(diagnostics.is_empty());

    let helper = program.function("helper").expect("helper declared");
    assert!(helper.is_declaration());
    assert_eq!(
        kinds(defined(&program, "run")),
        vec![LirInstructionKind::Call {
            function: LirValue::Function("helper".to_string()),
            args: Vec::new(),
        }]
    );
}

fn float8_module() -> Vec<alox_core::ast::AstModule> {
    vec![ast_module(
        "test",
        "main",
        vec![
            AstDeclaration::Function(function(
                "tiny",
                &[("v", ty("Float8"))],
                ty("Void"),
                Vec::new(),
            )),
            AstDeclaration::Function(function("fine", &[], ty("Void"), Vec::new())),
        ],
    )]
}

#[test]
fn unsupported_float_widths_fail_the_module() {
    let report = lower_with(float8_module(), "test::main", BackendConfig::default());
    assert!(report.has_errors());

    let diagnostics = report.into_result().expect_err("lowering fails");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "cannot lower function `tiny`");
    assert_eq!(diagnostics[0].labels[0].message, "unsupported float width: 8 bits");
    assert_eq!(diagnostics[0].labels[0].source, "test::main");
}

#[test]
fn tolerant_lowering_keeps_the_rest_of_the_module() {
    let config = BackendConfig::default().with_tolerate_errors(true);
    let (program, diagnostics) = lower_with(float8_module(), "test::main", config)
        .into_result()
        .expect("tolerated");

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert!(program.function("tiny").is_none());
    defined(&program, "fine");
}

#[test]
fn this_outside_a_method_is_reported() {
    let report = lower_with(
        vec![ast_module(
            "test",
            "main",
            vec![AstDeclaration::Function(function(
                "lost",
                &[],
                ty("Void"),
                vec![Statement::FunctionCall {
                    function: Expression::var("lost"),
                    arguments: vec![Expression::This],
                }],
            ))],
        )],
        "test::main",
        BackendConfig::default(),
    );

    let diagnostics = report.into_result().expect_err("lowering fails");
    assert_eq!(diagnostics[0].labels[0].message, "`this` used outside of a method");
}

#[test]
fn assignments_to_a_local_struct_field_store_into_its_slot() {
    let program = lower(vec![
        point(),
        AstDeclaration::Function(function(
            "setX",
            &[],
            ty("Int32"),
            vec![
                Statement::VariableDeclaration {
                    name: "p".to_string(),
                    type_name: ty("Point"),
                },
                Statement::Assignment {
                    target: Expression::field(Expression::var("p"), "x"),
                    value: Expression::IntegerLiteral(5),
                },
                Statement::Return(Expression::field(Expression::var("p"), "x")),
            ],
        )),
    ]);

    let set_x = defined(&program, "setX");
    let body = kinds(set_x);
    assert_eq!(body.len(), 7);
    assert_eq!(
        body[3],
        LirInstructionKind::GetElementPtr {
            ptr: LirValue::Register(0),
            indices: vec![int32(0), int32(1)],
            inbounds: true,
        }
    );
    assert_eq!(
        body[4],
        LirInstructionKind::Store {
            value: int32(5),
            address: LirValue::Register(3),
        }
    );
    assert_eq!(
        body[5],
        LirInstructionKind::Load {
            address: LirValue::Register(0),
        }
    );
    assert_eq!(
        set_x.basic_blocks[0].terminator,
        LirTerminator::Return(Some(LirValue::Register(6)))
    );
}

#[test]
fn nested_fields_of_a_local_are_addressed_through_the_slot() {
    let program = lower(vec![
        point(),
        support::structure(
            "Line",
            StructKind::Struct,
            &[("from", ty("Point")), ("to", ty("Point"))],
            Vec::new(),
        ),
        AstDeclaration::Function(function(
            "stretch",
            &[],
            ty("Void"),
            vec![
                Statement::VariableDeclaration {
                    name: "l".to_string(),
                    type_name: ty("Line"),
                },
                Statement::Assignment {
                    target: Expression::field(Expression::field(Expression::var("l"), "to"), "x"),
                    value: Expression::IntegerLiteral(9),
                },
            ],
        )),
    ]);

    let body = kinds(defined(&program, "stretch"));
    let geps: Vec<_> = body
        .iter()
        .filter_map(|kind| match kind {
            LirInstructionKind::GetElementPtr { ptr, indices, .. } => Some((ptr, indices)),
            _ => None,
        })
        .collect();
    assert_eq!(
        geps,
        vec![
            (&LirValue::Register(0), &vec![int32(0), int32(1)]),
            (&LirValue::Register(4), &vec![int32(0), int32(1)]),
        ]
    );
    assert_eq!(
        body.last(),
        Some(&LirInstructionKind::Store {
            value: int32(9),
            address: LirValue::Register(5),
        })
    );
}

#[test]
fn by_value_receivers_are_passed_by_their_storage() {
    let program = lower(vec![
        support::structure(
            "Counter",
            StructKind::Struct,
            &[("count", ty("Int32"))],
            vec![function("bump", &[("by", ty("Int32"))], ty("Void"), Vec::new())],
        ),
        AstDeclaration::Function(function(
            "run",
            &[],
            ty("Void"),
            vec![
                Statement::VariableDeclaration {
                    name: "c".to_string(),
                    type_name: ty("Counter"),
                },
                Statement::MethodCall {
                    receiver: Expression::var("c"),
                    method: "bump".to_string(),
                    arguments: vec![Expression::IntegerLiteral(1)],
                },
            ],
        )),
    ]);

    let body = kinds(defined(&program, "run"));
    assert_eq!(
        body.last(),
        Some(&LirInstructionKind::Call {
            function: LirValue::Function("Counterbump".to_string()),
            args: vec![LirValue::Register(0), int32(1)],
        })
    );
    assert!(!body
        .iter()
        .skip(1)
        .any(|kind| matches!(kind, LirInstructionKind::Alloca { .. })));
}

#[test]
fn assigning_to_a_parameter_is_reported() {
    let labels = failure_labels(vec![AstDeclaration::Function(function(
        "reset",
        &[("n", ty("Int32"))],
        ty("Void"),
        vec![Statement::Assignment {
            target: Expression::var("n"),
            value: Expression::IntegerLiteral(0),
        }],
    ))]);
    assert_eq!(labels, vec!["cannot assign to parameter `n`".to_string()]);
}

#[test]
fn generic_structs_of_other_modules_take_local_type_arguments() {
    let lib = ast_module(
        "a",
        "lib",
        vec![generic_structure("Box", &["T"], &[("value", ty("T"))])],
    );
    let boxed_foo = TypeName::new(Path::parse("a::lib"), "Box", vec![ty("Foo")]);
    let main = ast_module(
        "b",
        "main",
        vec![
            support::structure("Foo", StructKind::Struct, &[("n", ty("Int32"))], Vec::new()),
            AstDeclaration::Function(function(
                "get",
                &[("b", boxed_foo)],
                ty("Int32"),
                vec![Statement::Return(Expression::field(
                    Expression::field(Expression::var("b"), "value"),
                    "n",
                ))],
            )),
        ],
    );

    let (program, diagnostics) = lower_with(vec![lib, main], "b::main", BackendConfig::default())
        .into_result()
        .expect("lowering succeeds");
    assert!(diagnostics.is_empty());

    let foo = LirType::Struct {
        name: Some("Foo".to_string()),
        fields: vec![LirType::Int(32)],
        packed: false,
    };
    let boxed = program
        .type_definition("Box[b::main::Foo]")
        .expect("Box instance lowered");
    assert_eq!(
        boxed.ty,
        LirType::Struct {
            name: Some("Box[b::main::Foo]".to_string()),
            fields: vec![foo],
            packed: false,
        }
    );
    assert_eq!(
        kinds(defined(&program, "get")),
        vec![
            LirInstructionKind::ExtractValue {
                aggregate: LirValue::Local(0),
                indices: vec![0],
            },
            LirInstructionKind::ExtractValue {
                aggregate: LirValue::Register(0),
                indices: vec![0],
            },
        ]
    );
}

#[test]
fn integer_literals_take_the_width_of_their_destination() {
    let program = lower(vec![
        AstDeclaration::Function(function(
            "wide",
            &[],
            ty("Int64"),
            vec![Statement::Return(Expression::IntegerLiteral(1))],
        )),
        AstDeclaration::Function(function(
            "stash",
            &[],
            ty("Void"),
            vec![Statement::VariableDefinition {
                name: "x".to_string(),
                type_name: ty("Int64"),
                value: Expression::IntegerLiteral(1),
            }],
        )),
        AstDeclaration::Function(function("take", &[("v", ty("Int8"))], ty("Void"), Vec::new())),
        AstDeclaration::Function(function(
            "give",
            &[],
            ty("Void"),
            vec![Statement::FunctionCall {
                function: Expression::var("take"),
                arguments: vec![Expression::IntegerLiteral(7)],
            }],
        )),
        AstDeclaration::Function(function(
            "inc",
            &[("v", ty("Int64"))],
            ty("Int64"),
            vec![Statement::Return(Expression::binary(
                BinaryOp::Add,
                Expression::IntegerLiteral(1),
                Expression::var("v"),
            ))],
        )),
    ]);

    assert_eq!(
        defined(&program, "wide").basic_blocks[0].terminator,
        LirTerminator::Return(Some(int(1, 64)))
    );
    assert_eq!(
        kinds(defined(&program, "stash"))[1],
        LirInstructionKind::Store {
            value: int(1, 64),
            address: LirValue::Register(0),
        }
    );
    assert_eq!(
        kinds(defined(&program, "give")),
        vec![LirInstructionKind::Call {
            function: LirValue::Function("take".to_string()),
            args: vec![int(7, 8)],
        }]
    );
    assert_eq!(
        kinds(defined(&program, "inc")),
        vec![LirInstructionKind::Add(int(1, 64), LirValue::Local(0))]
    );
}

#[test]
fn literals_that_do_not_fit_their_destination_are_reported() {
    let labels = failure_labels(vec![
        AstDeclaration::Function(function("take", &[("v", ty("Int8"))], ty("Void"), Vec::new())),
        AstDeclaration::Function(function(
            "give",
            &[],
            ty("Void"),
            vec![Statement::FunctionCall {
                function: Expression::var("take"),
                arguments: vec![Expression::IntegerLiteral(300)],
            }],
        )),
    ]);
    assert_eq!(labels, vec!["integer literal 300 does not fit in Int8".to_string()]);
}
