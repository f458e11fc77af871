//! Filter compilation for forecast queries.

use tracing::{debug, warn};

use super::{Expression, ForecastFilterSpec, Leaf};

/// Compile a forecast filter.
///
/// - no dimensions: no filter
/// - one dimension: a bare dimension leaf
/// - two or more: an `And` over dimensions `2..n` only
///
/// The last rule drops the first dimension from the result, and with exactly
/// two dimensions it yields an `And` holding a single child. Both follow the
/// behaviour existing forecast reports were produced with and are kept until
/// the intended semantics are confirmed.
#[must_use]
pub fn compile_forecast(spec: &ForecastFilterSpec) -> Option<Expression> {
    match spec.dimensions.as_slice() {
        [] => None,
        [only] => Some(Leaf::dimension(only.key.clone(), only.values.clone()).into()),
        [first, rest @ ..] => {
            warn!(
                dropped = %first.key,
                kept = rest.len(),
                "Forecast filter drops the first dimension when several are given"
            );
            let children: Vec<Expression> = rest
                .iter()
                .map(|d| Leaf::dimension(d.key.clone(), d.values.clone()).into())
                .collect();
            debug!(children = children.len(), "Compiled forecast filter");
            Some(Expression::And(children))
        }
    }
}
