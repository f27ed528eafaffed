//! Builders assembling small IR programs for the integration tests.

use cortado_ir::{
    Block, Class, ClassAccessFlags, ClassTable, Field, InvokeExpr, InvokeKind, Label, Method,
    MethodAccessFlags, Statement, Value,
};
use indexmap::IndexMap;

pub const STRING: &str = "java.lang.String";

pub fn local(name: &str, type_name: &str) -> Value {
    Value::local(name, type_name)
}

pub fn string_local(name: &str) -> Value {
    Value::local(name, STRING)
}

pub fn constant(value: &str, type_name: &str) -> Value {
    Value::constant(value, type_name)
}

pub fn param(index: usize, type_name: &str) -> Value {
    Value::ParamRef {
        index,
        type_name: type_name.to_string(),
    }
}

pub fn this_ref(type_name: &str) -> Value {
    Value::ThisRef {
        type_name: type_name.to_string(),
    }
}

pub fn assign(left: Value, right: Value) -> Statement {
    Statement::Assign { left, right }
}

pub fn identity(left: Value, right: Value) -> Statement {
    Statement::Identity { left, right }
}

pub fn invoke_expr(
    kind: InvokeKind,
    class_name: &str,
    method_name: &str,
    params: &[&str],
    base: Option<Value>,
    args: Vec<Value>,
) -> InvokeExpr {
    InvokeExpr {
        kind,
        class_name: class_name.to_string(),
        method_name: method_name.to_string(),
        method_params: params.iter().map(|p| (*p).to_string()).collect(),
        base: base.map(Box::new),
        args,
    }
}

pub fn static_call(
    class_name: &str,
    method_name: &str,
    params: &[&str],
    args: Vec<Value>,
) -> InvokeExpr {
    invoke_expr(InvokeKind::Static, class_name, method_name, params, None, args)
}

pub fn virtual_call(
    class_name: &str,
    method_name: &str,
    params: &[&str],
    base: Value,
    args: Vec<Value>,
) -> InvokeExpr {
    invoke_expr(
        InvokeKind::Virtual,
        class_name,
        method_name,
        params,
        Some(base),
        args,
    )
}

pub fn block(label: Label, statements: Vec<Statement>) -> Block {
    Block::new(label, statements)
}

pub fn method(class_name: &str, name: &str, params: &[&str], blocks: Vec<Block>) -> Method {
    let block_labels = blocks
        .iter()
        .enumerate()
        .map(|(index, block)| (block.label, index))
        .collect::<IndexMap<_, _>>();
    Method {
        class_name: class_name.to_string(),
        name: name.to_string(),
        params: params.iter().map(|p| (*p).to_string()).collect(),
        access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        blocks,
        block_labels,
        exceptional_preds: IndexMap::new(),
    }
}

pub fn class(name: &str, super_class: &str, methods: Vec<Method>) -> Class {
    Class {
        name: name.to_string(),
        super_class: super_class.to_string(),
        methods,
        access_flags: ClassAccessFlags::PUBLIC,
        ..Class::default()
    }
}

pub fn class_with_fields(
    name: &str,
    super_class: &str,
    fields: &[(&str, &str)],
    methods: Vec<Method>,
) -> Class {
    let mut class = class(name, super_class, methods);
    class.fields = fields
        .iter()
        .map(|(field_name, type_name)| {
            (
                (*field_name).to_string(),
                Field::new(*type_name, name),
            )
        })
        .collect();
    class
}

pub fn table(classes: Vec<Class>) -> ClassTable {
    classes
        .into_iter()
        .map(|class| (class.name.clone(), class))
        .collect()
}

/// The program from the first backward-slicing example: `main` feeds a
/// string through `func`, which appends through `MyClass.append` and hands
/// the result to `dosomething`.
pub fn backward_example() -> ClassTable {
    let main = method(
        "BackwardSlicerExample1",
        "main",
        &["java.lang.String[]"],
        vec![block(
            0,
            vec![
                identity(local("args", "java.lang.String[]"), param(0, "java.lang.String[]")),
                assign(
                    string_local("r_main"),
                    Value::ArrayRef {
                        base: Box::new(local("args", "java.lang.String[]")),
                        index: Box::new(constant("0", "int")),
                    },
                ),
                Statement::Invoke(static_call(
                    "BackwardSlicerExample1",
                    "func",
                    &[STRING],
                    vec![string_local("r_main")],
                )),
                Statement::ReturnVoid,
            ],
        )],
    );
    let func = method(
        "BackwardSlicerExample1",
        "func",
        &[STRING],
        vec![block(
            0,
            vec![
                identity(string_local("p0"), param(0, STRING)),
                assign(string_local("c"), constant("\"!\"", STRING)),
                assign(
                    string_local("r"),
                    Value::InvokeExpr(static_call(
                        "MyClass",
                        "append",
                        &[STRING, STRING],
                        vec![string_local("p0"), string_local("c")],
                    )),
                ),
                Statement::Invoke(static_call(
                    "BackwardSlicerExample1",
                    "dosomething",
                    &[STRING],
                    vec![string_local("r")],
                )),
                Statement::ReturnVoid,
            ],
        )],
    );
    let dosomething = method(
        "BackwardSlicerExample1",
        "dosomething",
        &[STRING],
        vec![block(
            0,
            vec![
                identity(string_local("q0"), param(0, STRING)),
                assign(string_local("r1"), string_local("q0")),
                Statement::ReturnVoid,
            ],
        )],
    );
    let append = method(
        "MyClass",
        "append",
        &[STRING, STRING],
        vec![block(
            0,
            vec![
                identity(string_local("a0"), param(0, STRING)),
                identity(string_local("b0"), param(1, STRING)),
                assign(
                    string_local("x"),
                    Value::BinOp {
                        op: "+".to_string(),
                        value1: Box::new(string_local("a0")),
                        value2: Box::new(string_local("b0")),
                    },
                ),
                Statement::Return {
                    value: string_local("x"),
                },
            ],
        )],
    );

    table(vec![
        class(
            "BackwardSlicerExample1",
            "java.lang.Object",
            vec![main, func, dosomething],
        ),
        class("MyClass", "java.lang.Object", vec![append]),
    ])
}
