//! Compiles a [`FilterSpec`] into a provider filter expression.

use tracing::debug;

use super::{Expression, FilterSpec, Leaf};

/// Dimension carrying the billing record type.
pub const RECORD_TYPE: &str = "RECORD_TYPE";

/// Record types removed by `exclude_discounts`.
pub const DISCOUNT_RECORD_TYPES: [&str; 6] = [
    "Refund",
    "Credit",
    "DiscountedUsage",
    "BundledDiscount",
    "SavingsPlanCoveredUsage",
    "SavingsPlanNegation",
];

/// Compile a filter spec.
///
/// Leaves are collected in this order: the discount exclusion, the tag filter
/// (skipped when its key is empty), then one leaf per dimension pair in the
/// map's iteration order. That last order is not stable between runs, so only
/// the set of `And` children is meaningful, not their positions.
///
/// Never fails: odd specs such as an empty dimension key are passed through.
#[must_use]
pub fn compile(spec: &FilterSpec) -> Option<Expression> {
    let mut leaves = Vec::new();

    if spec.exclude_discounts {
        leaves.push(Expression::not(
            Leaf::dimension(
                RECORD_TYPE,
                DISCOUNT_RECORD_TYPES.iter().map(ToString::to_string).collect(),
            )
            .into(),
        ));
    }

    if let Some(tag) = spec.tag_filter.as_ref().filter(|t| !t.key.is_empty()) {
        leaves.push(Leaf::tag(tag.key.clone(), vec![tag.value.clone()]).into());
    }

    for (key, value) in &spec.dimension_filter {
        leaves.push(Leaf::dimension(key.clone(), vec![value.clone()]).into());
    }

    debug!(leaves = leaves.len(), "Compiled cost filter");
    Expression::all(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::LeafKind;

    fn discount_exclusion() -> Expression {
        Expression::Not(Box::new(Expression::Leaf(Leaf {
            kind: LeafKind::Dimension,
            key: "RECORD_TYPE".to_string(),
            values: vec![
                "Refund".to_string(),
                "Credit".to_string(),
                "DiscountedUsage".to_string(),
                "BundledDiscount".to_string(),
                "SavingsPlanCoveredUsage".to_string(),
                "SavingsPlanNegation".to_string(),
            ],
        })))
    }

    #[test]
    fn test_empty_spec_compiles_to_none() {
        assert_eq!(compile(&FilterSpec::new()), None);
    }

    #[test]
    fn test_exclude_discounts_alone_is_bare_not() {
        let expr = compile(&FilterSpec::new().with_exclude_discounts(true));
        assert_eq!(expr, Some(discount_exclusion()));
    }

    #[test]
    fn test_single_tag_is_bare_leaf() {
        let expr = compile(&FilterSpec::new().with_tag("team", "platform"));
        assert_eq!(
            expr,
            Some(Expression::Leaf(Leaf::tag("team", vec!["platform".into()])))
        );
    }

    #[test]
    fn test_single_dimension_is_bare_leaf() {
        let expr = compile(&FilterSpec::new().with_dimension("SERVICE", "Amazon EC2"));
        assert_eq!(
            expr,
            Some(Expression::Leaf(Leaf::dimension(
                "SERVICE",
                vec!["Amazon EC2".into()]
            )))
        );
    }

    #[test]
    fn test_empty_tag_key_counts_as_no_tag() {
        let spec = FilterSpec::new().with_tag("", "ignored");
        assert_eq!(compile(&spec), None);

        let spec = FilterSpec::new()
            .with_tag("", "ignored")
            .with_dimension("REGION", "us-east-1");
        assert_eq!(
            compile(&spec),
            Some(Expression::Leaf(Leaf::dimension(
                "REGION",
                vec!["us-east-1".into()]
            )))
        );
    }

    #[test]
    fn test_discount_then_tag_order() {
        let spec = FilterSpec::new()
            .with_exclude_discounts(true)
            .with_tag("env", "prod");
        assert_eq!(
            compile(&spec),
            Some(Expression::And(vec![
                discount_exclusion(),
                Expression::Leaf(Leaf::tag("env", vec!["prod".into()])),
            ]))
        );
    }

    #[test]
    fn test_all_sources_wrapped_in_single_and() {
        let spec = FilterSpec::new()
            .with_exclude_discounts(true)
            .with_tag("env", "prod")
            .with_dimension("SERVICE", "Amazon S3")
            .with_dimension("REGION", "eu-west-1");

        let Some(Expression::And(children)) = compile(&spec) else {
            panic!("expected an And expression");
        };
        assert_eq!(children.len(), 4);
        assert_eq!(children[0], discount_exclusion());
        assert_eq!(
            children[1],
            Expression::Leaf(Leaf::tag("env", vec!["prod".into()]))
        );
        // Dimension leaves follow in map order, so compare as a set.
        let mut dims: Vec<(String, Vec<String>)> = children[2..]
            .iter()
            .map(|c| match c {
                Expression::Leaf(l) => {
                    assert_eq!(l.kind, LeafKind::Dimension);
                    (l.key.clone(), l.values.clone())
                }
                other => panic!("unexpected child {other:?}"),
            })
            .collect();
        dims.sort();
        assert_eq!(
            dims,
            vec![
                ("REGION".to_string(), vec!["eu-west-1".to_string()]),
                ("SERVICE".to_string(), vec!["Amazon S3".to_string()]),
            ]
        );
    }

    #[test]
    fn test_empty_dimension_key_is_accepted() {
        let expr = compile(&FilterSpec::new().with_dimension("", "value"));
        assert_eq!(
            expr,
            Some(Expression::Leaf(Leaf::dimension("", vec!["value".into()])))
        );
    }
}
