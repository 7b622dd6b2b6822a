use alox_core::diagnostics::Severity;
use alox_core::ir::{Body, FunctionKind, StructKind};
use alox_core::passes::{BehaviorPlacement, Pass, PassManager};
use pretty_assertions::assert_eq;

mod support;
use support::{at, function, module, simple, structure};

fn ping(kind: FunctionKind) -> alox_core::ir::Declaration {
    function("ping", kind, &[("n", simple("Int32"))], simple("Void"), Body::new(), at(3, 24, 4))
}

#[test]
fn behavior_inside_actor_is_accepted() {
    let module = module(
        "test",
        "main",
        vec![structure(
            "A",
            StructKind::Actor,
            &[],
            &[],
            vec![ping(FunctionKind::Behavior)],
        )],
    );
    assert!(PassManager::semantic().run(&module).is_empty());
}

#[test]
fn behavior_inside_struct_is_rejected_at_its_location() {
    let module = module(
        "test",
        "main",
        vec![structure(
            "A",
            StructKind::Struct,
            &[],
            &[],
            vec![ping(FunctionKind::Behavior)],
        )],
    );

    let diagnostics = PassManager::semantic().run(&module);
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.message, "Behavior functions must be within actors");
    assert_eq!(diagnostic.labels.len(), 1);
    assert_eq!(diagnostic.labels[0].location, at(3, 24, 4));
    assert_eq!(diagnostic.labels[0].source, "test::main");
}

#[test]
fn top_level_behavior_is_rejected() {
    let module = module("test", "main", vec![ping(FunctionKind::Behavior)]);
    assert_eq!(PassManager::semantic().run(&module).len(), 1);
}

#[test]
fn functions_and_kernels_are_unconstrained() {
    let module = module(
        "test",
        "main",
        vec![
            ping(FunctionKind::Function),
            ping(FunctionKind::Kernel),
            structure(
                "S",
                StructKind::Struct,
                &[],
                &[],
                vec![ping(FunctionKind::Function), ping(FunctionKind::Kernel)],
            ),
        ],
    );
    assert!(PassManager::semantic().run(&module).is_empty());
}

#[test]
fn every_violation_is_reported() {
    let module = module(
        "test",
        "main",
        vec![
            ping(FunctionKind::Behavior),
            structure(
                "Outer",
                StructKind::Actor,
                &[],
                &[],
                vec![structure(
                    "Inner",
                    StructKind::Struct,
                    &[],
                    &[],
                    vec![ping(FunctionKind::Behavior), ping(FunctionKind::Behavior)],
                )],
            ),
        ],
    );
    assert_eq!(PassManager::semantic().run(&module).len(), 3);
}

#[test]
fn manager_concatenates_pass_output() {
    let module = module("test", "main", vec![ping(FunctionKind::Behavior)]);
    let manager = PassManager::semantic().with_pass(|| Box::new(BehaviorPlacement::default()));
    assert_eq!(manager.len(), 2);
    assert_eq!(manager.run(&module).len(), 2);

    let mut pass = BehaviorPlacement::default();
    pass.accept(&module);
    assert_eq!(pass.take_diagnostics().len(), 1);
    assert!(pass.take_diagnostics().is_empty());
}
