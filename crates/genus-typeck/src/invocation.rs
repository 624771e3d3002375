//! Matching call arguments against the formals of a method or constructor.

use genus_core::Span;
use genus_types::{format_type, is_assignable, variable_arity_param, Type, TypeEnv};

use crate::{CheckError, Operand};

/// How a call's arguments matched the formals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArgumentMatch {
    /// The trailing arguments were collected into the variable-arity array.
    pub variable_arity: bool,
    /// That array has a non-reifiable element type, so the call is unchecked.
    pub unchecked_array: bool,
}

fn converts(env: &dyn TypeEnv, arg: &Operand, param: &Type) -> bool {
    arg.ty.is_errorish()
        || param.is_errorish()
        || arg.ty == *param
        || is_assignable(env, &arg.ty, param)
}

fn mismatch(env: &dyn TypeEnv, arg: &Operand, param: &Type) -> CheckError {
    CheckError::Incompatible {
        from: format_type(env, &arg.ty),
        to: format_type(env, param),
        span: arg.span,
    }
}

/// Check `args` against `params` by method invocation conversion (JLS 5.3, 15.12.2).
///
/// Fixed-arity matching is tried first, so an array passed in the variable-arity position is
/// taken as the array itself. A variable-arity declaration then also accepts any number of
/// trailing arguments convertible to the element type. Constant narrowing does not apply to
/// arguments.
pub fn check_arguments(
    env: &dyn TypeEnv,
    params: &[Type],
    is_varargs: bool,
    args: &[Operand],
    span: Span,
) -> Result<ArgumentMatch, CheckError> {
    let varargs = variable_arity_param(env, params, is_varargs, span)?;

    let fixed_mismatch = if args.len() == params.len() {
        match args.iter().zip(params).find(|(arg, param)| !converts(env, arg, param)) {
            None => return Ok(ArgumentMatch::default()),
            Some((arg, param)) => Some(mismatch(env, arg, param)),
        }
    } else {
        None
    };

    let Some(varargs) = varargs else {
        return Err(fixed_mismatch.unwrap_or(CheckError::ArgumentCount {
            expected: params.len(),
            found: args.len(),
            span,
        }));
    };

    let leading = params.len() - 1;
    if args.len() < leading {
        return Err(CheckError::ArgumentCount {
            expected: leading,
            found: args.len(),
            span,
        });
    }
    let (fixed_args, trailing) = args.split_at(leading);
    for (arg, param) in fixed_args.iter().zip(params) {
        if !converts(env, arg, param) {
            return Err(mismatch(env, arg, param));
        }
    }
    for arg in trailing {
        if !converts(env, arg, &varargs.element) {
            return Err(mismatch(env, arg, &varargs.element));
        }
    }
    if !varargs.reifiable {
        tracing::debug!(
            target: "genus.typeck",
            element = %format_type(env, &varargs.element),
            "unchecked generic array creation for variable-arity call"
        );
    }
    Ok(ArgumentMatch {
        variable_arity: true,
        unchecked_array: !varargs.reifiable,
    })
}
