//! Control-flow graph construction: fall-through rules, call edges and
//! return edges.

mod fixtures;

use cortado_analysis::{CfgMethod, Project};
use cortado_ir::{MethodKey, Statement};
use fixtures::{
    STRING, assign, block, class, constant, method, static_call, string_local, table,
};

/// A method whose blocks exercise every fall-through rule: a goto block, a
/// `System.exit` block, a plain invoke block and a return block.
fn fall_through_example() -> Project {
    let callee = method(
        "Example",
        "callee",
        &[],
        vec![block(10, vec![Statement::ReturnVoid])],
    );
    let run = method(
        "Example",
        "run",
        &[],
        vec![
            block(0, vec![Statement::Goto { target: 2 }]),
            block(
                1,
                vec![Statement::Invoke(static_call(
                    "java.lang.System",
                    "exit",
                    &["int"],
                    vec![constant("1", "int")],
                ))],
            ),
            block(
                2,
                vec![Statement::Invoke(static_call("Example", "callee", &[], vec![]))],
            ),
            block(3, vec![Statement::ReturnVoid]),
        ],
    );
    Project::from_classes(table(vec![class(
        "Example",
        "java.lang.Object",
        vec![run, callee],
    )]))
}

fn run_method(project: &Project) -> cortado_analysis::MethodId {
    project
        .method_id(&MethodKey::new("Example", "run", &[]))
        .expect("Example.run")
}

#[test]
fn test_goto_suppresses_fall_through() {
    let project = fall_through_example();
    let run = run_method(&project);
    let cfg = CfgMethod::new(&project, run);

    let goto_block = project.block_id_at(run, 0);
    let target_block = project.block_id_at(run, 2);
    assert_eq!(vec![target_block], cfg.next_blocks(goto_block));
}

#[test]
fn test_system_exit_suppresses_fall_through() {
    let project = fall_through_example();
    let run = run_method(&project);
    let cfg = CfgMethod::new(&project, run);

    let exit_block = project.block_id_at(run, 1);
    assert!(cfg.next_blocks(exit_block).is_empty());
}

#[test]
fn test_plain_invoke_falls_through() {
    let project = fall_through_example();
    let run = run_method(&project);
    let cfg = CfgMethod::new(&project, run);

    let invoke_block = project.block_id_at(run, 2);
    let next_block = project.block_id_at(run, 3);
    assert_eq!(vec![next_block], cfg.next_blocks(invoke_block));
}

#[test]
fn test_full_cfg_adds_call_edges() {
    let project = fall_through_example();
    let run = run_method(&project);
    let callee = project
        .method_id(&MethodKey::new("Example", "callee", &[]))
        .expect("Example.callee");
    let cfg = project.cfgfull();

    let invoke_block = project.block_id_at(run, 2);
    let callee_entry = project.entry_block_id(callee).expect("entry");
    assert!(cfg.graph().has_edge(invoke_block, callee_entry));
    // fall-through after the call still applies
    assert!(cfg.graph().has_edge(invoke_block, project.block_id_at(run, 3)));
    // no return edges without the flag
    assert!(!cfg.graph().has_edge(callee_entry, invoke_block));
}

#[test]
fn test_return_edge_round_trip() {
    let caller = method(
        "Example",
        "caller",
        &[],
        vec![
            block(
                0,
                vec![assign(
                    string_local("r"),
                    cortado_ir::Value::InvokeExpr(static_call("Example", "m", &[], vec![])),
                )],
            ),
            block(1, vec![Statement::ReturnVoid]),
        ],
    );
    let m = method(
        "Example",
        "m",
        &[],
        vec![block(
            0,
            vec![
                assign(string_local("x"), constant("\"v\"", STRING)),
                Statement::Return {
                    value: string_local("x"),
                },
            ],
        )],
    );
    let project = Project::from_classes(table(vec![class(
        "Example",
        "java.lang.Object",
        vec![caller, m],
    )]));

    let caller_id = project
        .method_id(&MethodKey::new("Example", "caller", &[]))
        .expect("caller");
    let m_id = project
        .method_id(&MethodKey::new("Example", "m", &[]))
        .expect("m");
    let caller_block = project.block_id_at(caller_id, 0);
    let ret_block = project.entry_block_id(m_id).expect("entry");

    let cfg = project.cfgfull_retedges();
    assert!(cfg.has_ret_edges());
    assert!(cfg.graph().has_edge(caller_block, ret_block));
    assert!(cfg.graph().has_edge(ret_block, caller_block));
}

#[test]
fn test_block_method_indices_agree() {
    let project = fall_through_example();
    for block_id in project.block_ids() {
        let method_id = project.block_method(block_id);
        assert!(
            project
                .method_block_ids(method_id)
                .any(|owned| owned == block_id),
            "reverse index disagrees for {block_id}"
        );
    }
}

#[test]
fn test_external_call_contributes_no_edges() {
    let project = fall_through_example();
    let run = run_method(&project);
    let cfg = project.cfgfull();

    // System.exit resolves to no project class; the block keeps only its
    // intra-method edges (none, since exit cuts fall-through)
    let exit_block = project.block_id_at(run, 1);
    assert!(cfg.next_blocks(exit_block).is_empty());
}
