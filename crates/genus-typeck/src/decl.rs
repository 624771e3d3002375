//! Declaration-level checks: annotation use, variable-arity formals and inheritance cycles.

use std::collections::HashSet;

use genus_core::{Diagnostic, Span};
use genus_types::{
    all_supertypes, class_formals, erasure, format_type, variable_arity_param, AnnotationUse,
    ClassId, ElementKind, Substitution, Type, TypeEnv, TypeError, TypeVarId,
};

use crate::CheckError;

/// A declaration an annotation can be attached to. Members are addressed by their index in the
/// declaring [`genus_types::ClassDef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Declaration {
    Class(ClassId),
    Field { class: ClassId, index: usize },
    Method { class: ClassId, index: usize },
    Constructor { class: ClassId, index: usize },
    Parameter,
    LocalVariable,
    Package,
}

/// The `@Target` element kinds that describe `decl`. Annotation types are also types.
pub fn element_kinds(env: &dyn TypeEnv, decl: Declaration) -> Vec<ElementKind> {
    match decl {
        Declaration::Class(id) => {
            let is_annotation = env
                .class(id)
                .is_some_and(|def| def.kind == genus_types::ClassKind::Annotation);
            if is_annotation {
                vec![ElementKind::Type, ElementKind::AnnotationType]
            } else {
                vec![ElementKind::Type]
            }
        }
        Declaration::Field { .. } => vec![ElementKind::Field],
        Declaration::Method { .. } => vec![ElementKind::Method],
        Declaration::Constructor { .. } => vec![ElementKind::Constructor],
        Declaration::Parameter => vec![ElementKind::Parameter],
        Declaration::LocalVariable => vec![ElementKind::LocalVariable],
        Declaration::Package => vec![ElementKind::Package],
    }
}

fn annotation_name(env: &dyn TypeEnv, annotation: ClassId) -> String {
    env.class(annotation)
        .map(|def| def.simple_name().to_string())
        .unwrap_or_default()
}

/// Reject a second use of the same annotation type on one declaration.
pub fn check_duplicate_annotations(
    env: &dyn TypeEnv,
    annotations: &[AnnotationUse],
) -> Result<(), CheckError> {
    let mut seen = HashSet::with_capacity(annotations.len());
    for use_ in annotations {
        if !seen.insert(use_.annotation) {
            return Err(CheckError::DuplicateAnnotation {
                name: annotation_name(env, use_.annotation),
                span: use_.span,
            });
        }
    }
    Ok(())
}

/// Check the formals of a method or constructor for a variable-arity parameter whose element type
/// is not reifiable. Such a declaration is legal but unchecked, so the result is a warning.
pub fn check_variable_arity(
    env: &dyn TypeEnv,
    params: &[Type],
    is_varargs: bool,
    span: Span,
) -> Result<Option<Diagnostic>, CheckError> {
    let Some(varargs) = variable_arity_param(env, params, is_varargs, span)? else {
        return Ok(None);
    };
    if varargs.reifiable {
        return Ok(None);
    }
    Ok(Some(Diagnostic::warning(
        "unchecked-varargs",
        format!(
            "possible heap pollution from variable-arity parameter of type `{}`",
            format_type(env, &varargs.element)
        ),
        Some(span),
    )))
}

/// Check that `annotation` may be applied to `decl`.
///
/// `@Override` is only legal on a method that overrides or implements a supertype method. Any
/// annotation type carrying `@Target` must list one of the declaration's element kinds.
pub fn check_annotation_applicability(
    env: &dyn TypeEnv,
    annotation: &AnnotationUse,
    decl: Declaration,
) -> Result<(), CheckError> {
    let not_applicable = || CheckError::AnnotationNotApplicable {
        name: annotation_name(env, annotation.annotation),
        span: annotation.span,
    };

    let is_override = annotation.annotation == env.well_known().override_;
    if is_override && !matches!(decl, Declaration::Method { .. }) {
        return Err(not_applicable());
    }

    let targets = env
        .class(annotation.annotation)
        .and_then(|def| def.annotation_targets.as_ref());
    if let Some(targets) = targets {
        let kinds = element_kinds(env, decl);
        if !kinds.iter().any(|kind| targets.contains(kind)) {
            return Err(not_applicable());
        }
    }

    if let (true, Declaration::Method { class, index }) = (is_override, decl) {
        check_override(env, class, index, annotation.span)?;
    }
    Ok(())
}

fn check_override(
    env: &dyn TypeEnv,
    class: ClassId,
    index: usize,
    span: Span,
) -> Result<(), CheckError> {
    let Some(method) = env.class(class).and_then(|def| def.methods.get(index)) else {
        return Err(TypeError::internal(format!("no method #{index} in {class:?}")).into());
    };
    let params: Vec<Type> = method.params.iter().map(|p| erasure(env, p)).collect();
    let this = Type::class(
        class,
        class_formals(env, class)
            .into_iter()
            .map(Type::TypeVar)
            .collect(),
    );

    let overrides = !method.is_static
        && all_supertypes(env, &this).iter().skip(1).any(|sup| {
            let (def, subst) = match sup {
                Type::Class(ct) => (ct.def, Substitution::for_class_type(env, ct)),
                Type::Raw(def) => (*def, Substitution::empty()),
                _ => return false,
            };
            env.class(def).is_some_and(|sup_def| {
                sup_def.methods.iter().any(|candidate| {
                    candidate.name == method.name
                        && !candidate.is_static
                        && candidate.params.len() == params.len()
                        && candidate
                            .params
                            .iter()
                            .zip(&params)
                            .all(|(p, own)| erasure(env, &subst.apply(p)) == *own)
                })
            })
        });

    if overrides {
        return Ok(());
    }
    let rendered: Vec<String> = method.params.iter().map(|p| format_type(env, p)).collect();
    Err(CheckError::NothingToOverride {
        method: format!("{}({})", method.name, rendered.join(", ")),
        span,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Node {
    Class(ClassId),
    Var(TypeVarId),
}

fn node_of(ty: &Type) -> Option<Node> {
    match ty {
        Type::Class(ct) => Some(Node::Class(ct.def)),
        Type::Raw(def) => Some(Node::Class(*def)),
        Type::TypeVar(id) => Some(Node::Var(*id)),
        _ => None,
    }
}

fn successors(env: &dyn TypeEnv, node: Node) -> Vec<Node> {
    match node {
        Node::Class(id) => env
            .class(id)
            .map(|def| {
                def.super_class
                    .iter()
                    .chain(&def.interfaces)
                    .filter_map(node_of)
                    .collect()
            })
            .unwrap_or_default(),
        Node::Var(id) => env
            .type_param(id)
            .map(|tp| tp.upper_bounds.iter().filter_map(node_of).collect())
            .unwrap_or_default(),
    }
}

/// Reject `ty` when it inherits from itself, directly or through type variable bounds.
pub fn check_cycles(env: &dyn TypeEnv, ty: &Type, span: Span) -> Result<(), CheckError> {
    let Some(root) = node_of(ty) else {
        return Ok(());
    };
    let mut seen = HashSet::new();
    let mut stack = successors(env, root);
    while let Some(node) = stack.pop() {
        if node == root {
            let name = match root {
                Node::Class(id) => env.class(id).map(|def| def.name.clone()).unwrap_or_default(),
                Node::Var(_) => format_type(env, ty),
            };
            tracing::debug!(target: "genus.typeck", %name, "inheritance cycle");
            return Err(CheckError::CyclicInheritance { name, span });
        }
        if seen.insert(node) {
            stack.extend(successors(env, node));
        }
    }
    Ok(())
}
