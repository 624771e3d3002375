//! Variable-arity formals: `T... xs` is seen as `T[] xs` by the method body.

use genus_core::Span;

use crate::{format_type, is_reifiable, ConstructorDef, MethodDef, Type, TypeEnv, TypeError};

/// The trailing formal of a variable-arity method or constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarargsParam {
    /// `T[]`, the parameter's type inside the body.
    pub array: Type,
    /// `T`, what each trailing argument of a call must convert to.
    pub element: Type,
    /// Calls with a non-reifiable `T` allocate a generic array, so the declaration and every
    /// variable-arity call are unchecked.
    pub reifiable: bool,
}

/// The variable-arity formal of a declaration with parameters `params`, `None` when the
/// declaration has fixed arity.
///
/// Declarations store the formal in its array form; a varargs flag on anything else is a
/// [`TypeError::VarargsNotArray`].
pub fn variable_arity_param(
    env: &dyn TypeEnv,
    params: &[Type],
    is_varargs: bool,
    span: Span,
) -> Result<Option<VarargsParam>, TypeError> {
    if !is_varargs {
        return Ok(None);
    }
    match params.last() {
        Some(array @ Type::Array(element)) => Ok(Some(VarargsParam {
            array: array.clone(),
            element: (**element).clone(),
            reifiable: is_reifiable(env, element),
        })),
        Some(other) => Err(TypeError::VarargsNotArray {
            ty: format_type(env, other),
            span,
        }),
        None => Err(TypeError::VarargsNotArray {
            ty: "void".into(),
            span,
        }),
    }
}

impl MethodDef {
    pub fn variable_arity(&self, env: &dyn TypeEnv, span: Span) -> Result<Option<VarargsParam>, TypeError> {
        variable_arity_param(env, &self.params, self.is_varargs, span)
    }
}

impl ConstructorDef {
    pub fn variable_arity(&self, env: &dyn TypeEnv, span: Span) -> Result<Option<VarargsParam>, TypeError> {
        variable_arity_param(env, &self.params, self.is_varargs, span)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::TypeStore;

    #[test]
    fn trailing_array_is_the_variable_arity_formal() {
        let store = TypeStore::with_minimal_jdk();
        let list = store.class_id("java.util.List").expect("List");
        let string = Type::class(store.well_known().string, vec![]);
        let strings = Type::class(list, vec![string.clone()]);
        let span = Span::new(0, 4);

        let plain = variable_arity_param(
            &store,
            &[Type::int(), Type::array(string.clone())],
            true,
            span,
        )
        .expect("well formed");
        assert_eq!(
            plain,
            Some(VarargsParam {
                array: Type::array(string.clone()),
                element: string.clone(),
                reifiable: true,
            })
        );

        let generic = variable_arity_param(&store, &[Type::array(strings.clone())], true, span)
            .expect("well formed")
            .expect("variable arity");
        assert_eq!(generic.element, strings);
        assert!(!generic.reifiable);

        assert_eq!(
            variable_arity_param(&store, &[Type::array(string)], false, span),
            Ok(None)
        );
    }

    #[test]
    fn varargs_flag_needs_a_trailing_array() {
        let store = TypeStore::with_minimal_jdk();
        let span = Span::new(3, 9);
        assert_eq!(
            variable_arity_param(&store, &[Type::int()], true, span),
            Err(TypeError::VarargsNotArray {
                ty: "int".into(),
                span,
            })
        );
        let err = variable_arity_param(&store, &[], true, span).expect_err("no parameters");
        assert_eq!(err.code(), "varargs-not-array");

        let ctor = ConstructorDef {
            type_params: vec![],
            params: vec![Type::int()],
            is_varargs: true,
        };
        assert!(ctor.variable_arity(&store, span).is_err());
    }
}
