use std::fmt::Write;

use crate::{ClassType, Type, TypeEnv, WildcardBound};

/// Render `ty` the way Java source would spell it, using simple class names.
///
/// The output is stable and is used both for diagnostics and as a deterministic sort key.
pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    let mut out = String::new();
    write_type(env, ty, &mut out);
    out
}

fn write_type(env: &dyn TypeEnv, ty: &Type, out: &mut String) {
    match ty {
        Type::Void => out.push_str("void"),
        Type::Primitive(p) => out.push_str(p.keyword()),
        Type::Null => out.push_str("null"),
        Type::Class(ClassType { def, args }) => {
            let Some(class_def) = env.class(*def) else {
                let _ = write!(out, "<class {}>", def.to_raw());
                return;
            };
            let own = class_def.type_params.len().min(args.len());
            let (outer_args, own_args) = args.split_at(args.len() - own);
            match class_def.outer {
                Some(outer) if !outer_args.is_empty() => {
                    write_type(env, &Type::class(outer, outer_args.to_vec()), out);
                    out.push('.');
                }
                _ => {}
            }
            out.push_str(class_def.simple_name());
            write_args(env, own_args, out);
        }
        Type::Raw(def) => match env.class(*def) {
            Some(class_def) => out.push_str(class_def.simple_name()),
            None => {
                let _ = write!(out, "<class {}>", def.to_raw());
            }
        },
        Type::Array(elem) => {
            write_type(env, elem, out);
            out.push_str("[]");
        }
        Type::TypeVar(id) => match env.type_param(*id) {
            Some(tp) => out.push_str(&tp.name),
            None => {
                let _ = write!(out, "<tv {}>", id.to_raw());
            }
        },
        Type::Wildcard(WildcardBound::Unbounded) => out.push('?'),
        Type::Wildcard(WildcardBound::Extends(upper)) => {
            out.push_str("? extends ");
            write_type(env, upper, out);
        }
        Type::Wildcard(WildcardBound::Super(lower)) => {
            out.push_str("? super ");
            write_type(env, lower, out);
        }
        Type::Intersection(parts) => {
            for (idx, part) in parts.iter().enumerate() {
                if idx > 0 {
                    out.push_str(" & ");
                }
                write_type(env, part, out);
            }
        }
        Type::Unknown => out.push_str("<unknown>"),
        Type::Error => out.push_str("<error>"),
    }
}

fn write_args(env: &dyn TypeEnv, args: &[Type], out: &mut String) {
    if args.is_empty() {
        return;
    }
    out.push('<');
    for (idx, arg) in args.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        write_type(env, arg, out);
    }
    out.push('>');
}
