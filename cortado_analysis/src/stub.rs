//! Stub evaluation for library methods the project cannot analyze.
//!
//! Some applications populate reflective state through helpers whose bodies
//! are outside the class table (or too dynamic to slice). The reflection
//! heuristic evaluates those calls against the class table instead.

use cortado_ir::{ClassTable, Value};
use indexmap::IndexSet;
use tracing::debug;

/// Evaluate a stubbed method call against the class table; returns the
/// class names the call would produce, or `None` when no stub matches.
#[must_use]
pub fn call_stub(method_name: &str, classes: &ClassTable, args: &[Value]) -> Option<IndexSet<String>> {
    if "getClassesForPackage".contains(method_name) {
        let Some(Value::Const { value, .. }) = args.first() else {
            debug!("Stub {method_name} called without a constant package argument");
            return None;
        };
        return Some(get_classes_for_package(classes, value));
    }
    None
}

/// The classes whose fully-qualified name contains the package constant,
/// with the constant's surrounding quotes stripped.
fn get_classes_for_package(classes: &ClassTable, package_name: &str) -> IndexSet<String> {
    let package = package_name
        .get(1..package_name.len().saturating_sub(1))
        .unwrap_or(package_name);
    classes
        .keys()
        .filter(|name| name.contains(package))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cortado_ir::Class;

    fn classes() -> ClassTable {
        let mut classes = ClassTable::new();
        for name in ["com.example.plugins.A", "com.example.plugins.B", "com.other.C"] {
            classes.insert(
                name.to_string(),
                Class {
                    name: name.to_string(),
                    ..Class::default()
                },
            );
        }
        classes
    }

    #[test]
    fn test_get_classes_for_package() {
        let classes = classes();
        let args = vec![Value::constant("\"com.example.plugins\"", "java.lang.String")];
        let result = call_stub("getClassesForPackage", &classes, &args).expect("stub");
        assert_eq!(2, result.len());
        assert!(result.contains("com.example.plugins.A"));
        assert!(result.contains("com.example.plugins.B"));
    }

    #[test]
    fn test_unknown_stub() {
        assert_eq!(None, call_stub("somethingElse", &classes(), &[]));
    }

    #[test]
    fn test_non_constant_argument() {
        let args = vec![Value::local("r0", "java.lang.String")];
        assert_eq!(None, call_stub("getClassesForPackage", &classes(), &args));
    }
}
