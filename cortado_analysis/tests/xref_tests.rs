//! Cross-reference queries: invocations, field reads and writes.

mod fixtures;

use cortado_analysis::{Access, Project, XRefQuery};
use cortado_ir::{FieldSignature, Statement, Value};
use fixtures::{
    STRING, assign, block, class, class_with_fields, constant, local, method, static_call, table,
};

/// Field `F.x` read in `foo` (`y = f.x`) and written in `bar` (`f.x = 1`).
fn field_example() -> Project {
    let field_ref = || Value::InstanceFieldRef {
        base: Box::new(local("f", "F")),
        field: FieldSignature::new("x", "F"),
    };
    let foo = method(
        "F",
        "foo",
        &[],
        vec![block(
            0,
            vec![
                assign(local("y", "int"), field_ref()),
                Statement::ReturnVoid,
            ],
        )],
    );
    let bar = method(
        "F",
        "bar",
        &[],
        vec![block(
            0,
            vec![
                assign(field_ref(), constant("1", "int")),
                Statement::ReturnVoid,
            ],
        )],
    );
    Project::from_classes(table(vec![class_with_fields(
        "F",
        "java.lang.Object",
        &[("x", "int")],
        vec![foo, bar],
    )]))
}

#[test]
fn test_field_read_and_write_classification() {
    let project = field_example();
    let x_refs = project.x_ref(&XRefQuery::ClassVar {
        class_name: "F".to_string(),
        var_name: "x".to_string(),
    });

    assert_eq!(2, x_refs.len());
    let by_method = x_refs
        .iter()
        .map(|x_ref| {
            (
                project.method(x_ref.method).name.clone(),
                x_ref.access,
            )
        })
        .collect::<Vec<_>>();
    assert!(by_method.contains(&("foo".to_string(), Access::Read)));
    assert!(by_method.contains(&("bar".to_string(), Access::Write)));
}

#[test]
fn test_method_invocation_xref() {
    let helper = method(
        "Util",
        "helper",
        &[STRING],
        vec![block(0, vec![Statement::ReturnVoid])],
    );
    let go = method(
        "Main",
        "go",
        &[],
        vec![block(
            0,
            vec![
                Statement::Invoke(static_call(
                    "Util",
                    "helper",
                    &[STRING],
                    vec![constant("\"a\"", STRING)],
                )),
                Statement::ReturnVoid,
            ],
        )],
    );
    let project = Project::from_classes(table(vec![
        class("Util", "java.lang.Object", vec![helper]),
        class("Main", "java.lang.Object", vec![go]),
    ]));

    let x_refs = project.x_ref(&XRefQuery::Method {
        class_name: "Util".to_string(),
        method_name: "helper".to_string(),
        params: vec![STRING.to_string()],
    });
    assert_eq!(1, x_refs.len());
    assert_eq!(Access::Read, x_refs[0].access);
    assert_eq!("go", project.method(x_refs[0].method).name);

    let misses = project.x_ref(&XRefQuery::Method {
        class_name: "Util".to_string(),
        method_name: "helper".to_string(),
        params: vec![],
    });
    assert!(misses.is_empty());
}

#[test]
fn test_method_var_scoped_to_method() {
    let use_a = method(
        "Main",
        "a",
        &[],
        vec![block(
            0,
            vec![
                assign(local("v", "Main"), local("w", "Main")),
                Statement::ReturnVoid,
            ],
        )],
    );
    let use_b = method(
        "Main",
        "b",
        &[],
        vec![block(
            0,
            vec![
                assign(local("u", "Main"), local("v", "Main")),
                Statement::ReturnVoid,
            ],
        )],
    );
    let project = Project::from_classes(table(vec![class(
        "Main",
        "java.lang.Object",
        vec![use_a, use_b],
    )]));

    let x_refs = project.x_ref(&XRefQuery::MethodVar {
        class_name: "Main".to_string(),
        method_name: "a".to_string(),
        method_params: vec![],
        var_name: "v".to_string(),
    });
    assert_eq!(1, x_refs.len());
    assert_eq!("a", project.method(x_refs[0].method).name);
    assert_eq!(Access::Write, x_refs[0].access);
}

#[test]
fn test_missing_method_var_query() {
    let project = field_example();
    let x_refs = project.x_ref(&XRefQuery::MethodVar {
        class_name: "F".to_string(),
        method_name: "nope".to_string(),
        method_params: vec![],
        var_name: "x".to_string(),
    });
    assert!(x_refs.is_empty());
}
