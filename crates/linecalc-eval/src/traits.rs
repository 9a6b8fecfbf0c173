use crate::format::FormatOptions;
use crate::scope::Scope;
use linecalc_common::{CalcError, Value};
use linecalc_parse::AstNode;

/// A parsed expression that can be evaluated repeatedly against different scopes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    source: String,
    ast: AstNode,
}

impl CompiledExpr {
    pub fn new(source: impl Into<String>, ast: AstNode) -> Self {
        CompiledExpr {
            source: source.into(),
            ast,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &AstNode {
        &self.ast
    }

    pub fn evaluate<E: Evaluator + ?Sized>(
        &self,
        evaluator: &E,
        scope: &mut Scope,
    ) -> Result<Value, CalcError> {
        evaluator.evaluate_compiled(self, scope)
    }
}

/// The numeric/unit evaluation capability the line engine is built on.
pub trait Evaluator {
    /// Parse and evaluate `expr` in one step. Assignments write into `scope`.
    fn evaluate(&self, expr: &str, scope: &mut Scope) -> Result<Value, CalcError> {
        let compiled = self.compile(expr)?;
        self.evaluate_compiled(&compiled, scope)
    }

    fn compile(&self, expr: &str) -> Result<CompiledExpr, CalcError>;

    fn evaluate_compiled(
        &self,
        compiled: &CompiledExpr,
        scope: &mut Scope,
    ) -> Result<Value, CalcError>;

    fn format(&self, value: &Value, options: &FormatOptions) -> String {
        crate::format::format_value(value, options)
    }
}
