use crate::error::EngineError;
use weave_context::Context;
use weave_value::Expression;

/// Evaluates `source` (an `if` attribute's expression) against `ctx`.
/// A node with no `if` attribute always passes; this is only called
/// once a caller has already confirmed an attribute is present.
pub fn evaluate(source: &str, ctx: &Context) -> Result<bool, EngineError> {
    let expr = Expression::parse(source)?;
    let lookup = |name: &str| ctx.get(name).ok().map(|sv| sv.value);
    let value = expr.eval(&lookup)?;
    let as_bool = value.as_bool().map_err(weave_value::ExpressionError::from)?;
    Ok(as_bool)
}
