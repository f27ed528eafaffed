use crate::error::{Error, Result};
use crate::ids::{ClassId, MethodId};
use crate::project::Project;
use cortado_ir::{InvokeExpr, InvokeKind};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

/// Class-subclass index over a project's class table, plus virtual dispatch
/// resolution.
///
/// Built once from the project and cached; see [`Project::hierarchy`].
#[derive(Debug)]
pub struct Hierarchy {
    /// Direct subclasses of each class.
    subclasses: IndexMap<ClassId, IndexSet<ClassId>>,
    /// Transitive subclasses of each class.
    all_subclasses: IndexMap<ClassId, IndexSet<ClassId>>,
    /// Classes (including their transitive subclasses) implementing each
    /// interface.
    implementers: IndexMap<ClassId, IndexSet<ClassId>>,
}

impl Hierarchy {
    /// Build the hierarchy for the given project.
    #[must_use]
    pub fn new(project: &Project) -> Self {
        let mut subclasses: IndexMap<ClassId, IndexSet<ClassId>> = IndexMap::new();
        for id in project.class_ids() {
            let class = project.class(id);
            if let Some(super_id) = project.class_id(&class.super_class) {
                subclasses.entry(super_id).or_default().insert(id);
            }
        }

        let mut all_subclasses: IndexMap<ClassId, IndexSet<ClassId>> = IndexMap::new();
        for id in project.class_ids() {
            let mut closure = IndexSet::new();
            let mut stack = subclasses
                .get(&id)
                .map(|subs| subs.iter().copied().collect::<Vec<_>>())
                .unwrap_or_default();
            while let Some(sub) = stack.pop() {
                if closure.insert(sub)
                    && let Some(subs) = subclasses.get(&sub)
                {
                    stack.extend(subs.iter().copied());
                }
            }
            all_subclasses.insert(id, closure);
        }

        let mut implementers: IndexMap<ClassId, IndexSet<ClassId>> = IndexMap::new();
        for id in project.class_ids() {
            let class = project.class(id);
            for interface in &class.interfaces {
                let Some(interface_id) = project.class_id(interface) else {
                    continue;
                };
                let entry = implementers.entry(interface_id).or_default();
                entry.insert(id);
                if let Some(subs) = all_subclasses.get(&id) {
                    entry.extend(subs.iter().copied());
                }
            }
        }

        Self {
            subclasses,
            all_subclasses,
            implementers,
        }
    }

    /// Direct subclasses of `class`.
    pub fn subclasses(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.subclasses
            .get(&class)
            .into_iter()
            .flat_map(|subs| subs.iter().copied())
    }

    /// Transitive subclasses of `class`.
    pub fn all_subclasses(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.all_subclasses
            .get(&class)
            .into_iter()
            .flat_map(|subs| subs.iter().copied())
    }

    /// Classes implementing `interface`, including transitive subclasses of
    /// the direct implementers.
    pub fn implementers(&self, interface: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.implementers
            .get(&interface)
            .into_iter()
            .flat_map(|classes| classes.iter().copied())
    }

    /// True when `child` is a (transitive) subclass of `parent`.
    #[must_use]
    pub fn is_subclass(&self, child: ClassId, parent: ClassId) -> bool {
        self.all_subclasses
            .get(&parent)
            .is_some_and(|subs| subs.contains(&child))
    }

    /// Resolve the targets of an invoke statement, degrading external
    /// classes, unknown methods and unresolvable dispatch to an empty set
    /// with a warning.
    #[must_use]
    pub fn resolve_stmt_targets(
        &self,
        project: &Project,
        stmt: &cortado_ir::Statement,
        container_method: MethodId,
    ) -> Vec<MethodId> {
        let Some(expr) = stmt.invoke_expr() else {
            return Vec::new();
        };
        if project.class_id(&expr.class_name).is_none() {
            // external classes are not supported
            return Vec::new();
        }
        let key = cortado_ir::MethodKey {
            class_name: expr.class_name.clone(),
            name: expr.method_name.clone(),
            params: expr.method_params.clone(),
        };
        let Some(static_method) = project.method_id(&key) else {
            warn!("Cannot handle call to external method {key}");
            return Vec::new();
        };
        match self.resolve_invoke(project, expr, static_method, container_method) {
            Ok(targets) => targets,
            Err(error) => {
                warn!("Could not resolve concrete dispatch: {error}");
                Vec::new()
            }
        }
    }

    /// Resolve a static invocation expression to the set of concrete method
    /// bodies it may reach at runtime.
    ///
    /// Special (constructor, private, super) and static calls dispatch to
    /// the statically named method. Virtual and interface calls enumerate
    /// the non-abstract `(name, params)` matches in the static class and
    /// every transitive subclass/implementer.
    ///
    /// # Errors
    /// [`Error::NoConcreteDispatch`] when a virtual or interface call has no
    /// concrete target; callers treat the site as external.
    pub fn resolve_invoke(
        &self,
        project: &Project,
        invoke_expr: &InvokeExpr,
        static_method: MethodId,
        container_method: MethodId,
    ) -> Result<Vec<MethodId>> {
        debug!(
            "Resolving {invoke_expr} from {}",
            project.method(container_method).key()
        );
        match invoke_expr.kind {
            InvokeKind::Special | InvokeKind::Static => Ok(vec![static_method]),
            InvokeKind::Virtual | InvokeKind::Interface => {
                let method = project.method(static_method);
                let class_id = project
                    .class_id(&method.class_name)
                    .ok_or_else(|| Error::ClassNotFound(method.class_name.clone()))?;

                let mut candidates = IndexSet::new();
                candidates.insert(class_id);
                candidates.extend(self.all_subclasses(class_id));
                if project.class(class_id).is_interface() {
                    candidates.extend(self.implementers(class_id));
                }

                let mut targets = Vec::new();
                for candidate in candidates {
                    let class = project.class(candidate);
                    let Some(body) = class.method(&method.name, &method.params) else {
                        continue;
                    };
                    if body.is_abstract() {
                        continue;
                    }
                    if let Some(target) = project.method_id(&body.key()) {
                        targets.push(target);
                    }
                }

                if targets.is_empty() {
                    Err(Error::NoConcreteDispatch(invoke_expr.to_string()))
                } else {
                    Ok(targets)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cortado_ir::{Class, ClassAccessFlags, ClassTable, Method, MethodAccessFlags};

    fn class(name: &str, super_class: &str, access_flags: ClassAccessFlags) -> Class {
        Class {
            name: name.to_string(),
            super_class: super_class.to_string(),
            methods: vec![Method {
                class_name: name.to_string(),
                name: "m".to_string(),
                params: vec![],
                access_flags: MethodAccessFlags::PUBLIC,
                ..Method::default()
            }],
            access_flags,
            ..Class::default()
        }
    }

    fn project() -> Project {
        let mut classes = ClassTable::new();
        classes.insert(
            "A".to_string(),
            class("A", "java.lang.Object", ClassAccessFlags::PUBLIC),
        );
        classes.insert(
            "B".to_string(),
            class("B", "A", ClassAccessFlags::PUBLIC),
        );
        classes.insert(
            "C".to_string(),
            class("C", "B", ClassAccessFlags::PUBLIC),
        );
        Project::from_classes(classes)
    }

    fn invoke(kind: InvokeKind) -> InvokeExpr {
        InvokeExpr {
            kind,
            class_name: "A".to_string(),
            method_name: "m".to_string(),
            method_params: vec![],
            base: None,
            args: vec![],
        }
    }

    #[test]
    fn test_transitive_subclasses() {
        let project = project();
        let hierarchy = Hierarchy::new(&project);
        let a = project.class_id("A").expect("A");
        let b = project.class_id("B").expect("B");
        let c = project.class_id("C").expect("C");
        assert_eq!(vec![b], hierarchy.subclasses(a).collect::<Vec<_>>());
        let mut all = hierarchy.all_subclasses(a).collect::<Vec<_>>();
        all.sort();
        assert_eq!(vec![b, c], all);
        assert!(hierarchy.is_subclass(c, a));
        assert!(!hierarchy.is_subclass(a, c));
    }

    #[test]
    fn test_resolve_virtual_invoke() -> Result<()> {
        let project = project();
        let hierarchy = Hierarchy::new(&project);
        let static_method = project
            .method_id(&cortado_ir::MethodKey::new("A", "m", &[]))
            .expect("A.m");
        let targets =
            hierarchy.resolve_invoke(&project, &invoke(InvokeKind::Virtual), static_method, static_method)?;
        assert_eq!(3, targets.len());
        Ok(())
    }

    #[test]
    fn test_resolve_special_invoke_is_exact() -> Result<()> {
        let project = project();
        let hierarchy = Hierarchy::new(&project);
        let static_method = project
            .method_id(&cortado_ir::MethodKey::new("A", "m", &[]))
            .expect("A.m");
        let targets =
            hierarchy.resolve_invoke(&project, &invoke(InvokeKind::Special), static_method, static_method)?;
        assert_eq!(vec![static_method], targets);
        Ok(())
    }

    #[test]
    fn test_no_concrete_dispatch() {
        let mut classes = ClassTable::new();
        let mut abstract_class = class(
            "A",
            "java.lang.Object",
            ClassAccessFlags::PUBLIC | ClassAccessFlags::ABSTRACT,
        );
        abstract_class.methods[0].access_flags |= MethodAccessFlags::ABSTRACT;
        classes.insert("A".to_string(), abstract_class);
        let project = Project::from_classes(classes);
        let hierarchy = Hierarchy::new(&project);
        let static_method = project
            .method_id(&cortado_ir::MethodKey::new("A", "m", &[]))
            .expect("A.m");
        let result = hierarchy.resolve_invoke(
            &project,
            &invoke(InvokeKind::Virtual),
            static_method,
            static_method,
        );
        assert_eq!(
            Err(Error::NoConcreteDispatch("A.m()".to_string())),
            result
        );
    }
}
