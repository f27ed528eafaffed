//! Backward slicing over small programs: def-use chains across calls,
//! returns and parameters, plus the iteration bounds.

mod fixtures;

use cortado_analysis::{BackwardSlicer, Project, SliceSeed};
use cortado_ir::Statement;
use fixtures::{STRING, assign, block, class, method, string_local, table};
use indexmap::IndexSet;

fn dosomething_seed() -> SliceSeed {
    SliceSeed::MethodVar {
        class_name: "BackwardSlicerExample1".to_string(),
        method_name: "dosomething".to_string(),
        method_params: vec![STRING.to_string()],
        var_name: "r1".to_string(),
    }
}

#[test_log::test]
fn test_def_use_chain_across_calls() {
    let project = Project::from_classes(fixtures::backward_example());
    let mut slicer = project.backwardslicer();
    slicer.slice(&dosomething_seed());

    let affected_methods = slicer
        .affected_blocks()
        .iter()
        .map(|&block| project.method(project.block_method(block)).key().to_string())
        .collect::<IndexSet<_>>();

    for expected in [
        "BackwardSlicerExample1.dosomething(java.lang.String)",
        "BackwardSlicerExample1.func(java.lang.String)",
        "MyClass.append(java.lang.String, java.lang.String)",
        "BackwardSlicerExample1.main(java.lang.String[])",
    ] {
        assert!(
            affected_methods.contains(expected),
            "missing {expected} in {affected_methods:?}"
        );
    }
}

#[test_log::test]
fn test_seed_statements_located() {
    let project = Project::from_classes(fixtures::backward_example());
    let mut slicer = project.backwardslicer();
    slicer.slice(&dosomething_seed());

    let input_blocks = slicer.input_blocks();
    assert_eq!(1, input_blocks.len());
    let seed_method = project.method(project.block_method(input_blocks[0]));
    assert_eq!("dosomething", seed_method.name);
}

#[test_log::test]
fn test_taint_propagates_to_callee_return() {
    let project = Project::from_classes(fixtures::backward_example());
    let mut slicer = project.backwardslicer();
    slicer.slice(&dosomething_seed());

    let append = project
        .method_id(&cortado_ir::MethodKey::new(
            "MyClass",
            "append",
            &[STRING, STRING],
        ))
        .expect("MyClass.append");
    let tainted = slicer.tainted_in_method(append);
    let names = tainted
        .iter()
        .filter_map(|taint| taint.var_name())
        .collect::<Vec<_>>();
    assert!(names.contains(&"x"), "returned local not tainted: {names:?}");
    assert!(names.contains(&"a0"), "operand not tainted: {names:?}");
}

#[test_log::test]
fn test_missing_seed_method_yields_empty_slice() {
    let project = Project::from_classes(fixtures::backward_example());
    let mut slicer = project.backwardslicer();
    slicer.slice(&SliceSeed::MethodVar {
        class_name: "NoSuchClass".to_string(),
        method_name: "nope".to_string(),
        method_params: vec![],
        var_name: "r0".to_string(),
    });
    assert!(slicer.affected_blocks().is_empty());
    assert!(slicer.input_blocks().is_empty());
}

#[test_log::test]
fn test_self_loop_hits_block_budget_then_terminates() {
    let looping = method(
        "Loop",
        "spin",
        &[],
        vec![block(
            0,
            vec![
                assign(string_local("x"), string_local("y")),
                assign(string_local("y"), string_local("x")),
                Statement::Goto { target: 0 },
            ],
        )],
    );
    let project = Project::from_classes(table(vec![class(
        "Loop",
        "java.lang.Object",
        vec![looping],
    )]));

    let mut slicer = project.backwardslicer();
    slicer.slice(&SliceSeed::MethodVar {
        class_name: "Loop".to_string(),
        method_name: "spin".to_string(),
        method_params: vec![],
        var_name: "x".to_string(),
    });

    let spin = project
        .method_id(&cortado_ir::MethodKey::new("Loop", "spin", &[]))
        .expect("Loop.spin");
    let entry = project.entry_block_id(spin).expect("entry");
    assert_eq!(BackwardSlicer::MAX_ITERS_BLOCK, slicer.iterations_of(entry));
    assert!(slicer.affected_blocks().contains(&entry));
}

#[test_log::test]
fn test_affected_blocks_produced_new_taints() {
    let project = Project::from_classes(fixtures::backward_example());
    let mut slicer = project.backwardslicer();
    slicer.slice(&dosomething_seed());

    for &affected in slicer.affected_blocks() {
        assert!(
            !slicer.tainted_in_block(affected).is_empty(),
            "affected block without taints: {affected}"
        );
    }
}
