//! Checking a unit of variable declarations with deferred re-runs.

use std::collections::BTreeMap;

use genus_core::{Diagnostic, DiagnosticSink, Span};
use genus_types::{TyContext, Type};

use crate::{
    type_assign, AssignOp, CheckError, ConstValue, Constness, Expr, Operand, PassCx,
    PassRegistry, Place, Scope, Symbol,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Rounds of re-running checks that reported `NotReady` before giving up on them.
    pub max_rounds: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self { max_rounds: 8 }
    }
}

/// `[final] T name = init;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub ty: Type,
    pub is_final: bool,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitReport {
    /// Rounds it took until every binding was checked or the scheduler gave up.
    pub rounds: usize,
    /// Static type of each checked initializer.
    pub types: BTreeMap<String, Type>,
    pub constants: BTreeMap<String, ConstValue>,
    /// Bindings whose checks never became ready.
    pub deferred: Vec<String>,
}

pub struct Driver<'r> {
    registry: PassRegistry<'r>,
    options: SchedulerOptions,
}

impl Driver<'static> {
    pub fn new(options: SchedulerOptions) -> Self {
        Self::with_registry(PassRegistry::standard(), options)
    }
}

impl<'r> Driver<'r> {
    pub fn with_registry(registry: PassRegistry<'r>, options: SchedulerOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &PassRegistry<'r> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PassRegistry<'r> {
        &mut self.registry
    }

    /// Check a single expression. Fails only with `NotReady`.
    pub fn check_expr(
        &self,
        ctx: &mut TyContext<'_>,
        scope: &Scope,
        expr: &Expr,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Operand, CheckError> {
        let mut cx = PassCx {
            ty: ctx,
            scope,
            sink,
        };
        self.registry.run(&mut cx, expr)
    }

    /// Check the initializers of `bindings`, which may refer to each other in any order.
    ///
    /// Every binding is declared in `scope` first; `final` ones with an initializer start out
    /// with a pending constant value. Checks that need a pending value are retried in later
    /// rounds. Diagnostics of an attempt are only kept when the attempt completes.
    pub fn check_unit(
        &self,
        ctx: &mut TyContext<'_>,
        scope: &mut Scope,
        bindings: &[Binding],
        sink: &mut dyn DiagnosticSink,
    ) -> UnitReport {
        for binding in bindings {
            let constant = if binding.is_final && binding.init.is_some() {
                Constness::Pending
            } else {
                Constness::NotConstant
            };
            scope.insert(
                binding.name.clone(),
                Symbol {
                    ty: binding.ty.clone(),
                    is_final: binding.is_final,
                    constant,
                },
            );
        }

        let mut report = UnitReport::default();
        let mut pending: Vec<&Binding> = bindings.iter().filter(|b| b.init.is_some()).collect();

        while !pending.is_empty() && report.rounds < self.options.max_rounds {
            report.rounds += 1;
            let before = pending.len();
            let mut still_pending = Vec::new();

            for binding in pending {
                let mut buffered: Vec<Diagnostic> = Vec::new();
                match self.check_binding(ctx, scope, binding, &mut buffered) {
                    Some((ty, constant)) => {
                        for diagnostic in buffered {
                            sink.report(diagnostic);
                        }
                        if let Some(value) = constant.value() {
                            report.constants.insert(binding.name.clone(), value.clone());
                        }
                        scope.set_constant(&binding.name, constant);
                        report.types.insert(binding.name.clone(), ty);
                    }
                    None => still_pending.push(binding),
                }
            }

            pending = still_pending;
            tracing::debug!(
                target: "genus.typeck",
                round = report.rounds,
                remaining = pending.len(),
                "scheduler round"
            );
            if pending.len() == before {
                // Nothing became ready; further rounds cannot change that.
                break;
            }
        }

        for binding in pending {
            tracing::warn!(target: "genus.typeck", name = %binding.name, "check never became ready");
            sink.report(Diagnostic::warning(
                "not-ready",
                format!(
                    "`{}` was not checked: it depends on constant values that are never computed",
                    binding.name
                ),
                Some(binding.span),
            ));
            scope.set_constant(&binding.name, Constness::NotConstant);
            report.deferred.push(binding.name.clone());
        }
        report
    }

    /// One attempt at a binding: `None` when it has to wait for another constant.
    fn check_binding(
        &self,
        ctx: &mut TyContext<'_>,
        scope: &Scope,
        binding: &Binding,
        sink: &mut Vec<Diagnostic>,
    ) -> Option<(Type, Constness)> {
        let init = binding.init.as_ref()?;
        let value = match self.check_expr(ctx, scope, init, sink) {
            Ok(value) => value,
            Err(err) => {
                tracing::trace!(target: "genus.typeck", name = %binding.name, error = %err, "deferred");
                return None;
            }
        };
        if binding.is_final && value.constant == Constness::Pending {
            return None;
        }

        let place = if binding.is_final {
            Place::Initializer
        } else {
            Place::Variable
        };
        let target = Operand::value(binding.ty.clone(), binding.span).with_place(place);
        let constant = match type_assign(&*ctx, AssignOp::Assign, &target, &value, binding.span) {
            Ok(assigned) => match assigned.constant {
                Constness::Known(_) if binding.is_final => assigned.constant,
                _ => Constness::NotConstant,
            },
            Err(err) if err.is_not_ready() => return None,
            Err(err) => {
                if let Some(diagnostic) = err.to_diagnostic() {
                    sink.push(diagnostic);
                }
                Constness::NotConstant
            }
        };
        Some((value.ty, constant))
    }
}
