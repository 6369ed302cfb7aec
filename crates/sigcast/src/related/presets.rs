//! Common related validators.
//!
//! `Empty` always counts as "not provided"; with `allow_none` an explicit
//! `None` does too.

use indexmap::IndexMap;
use sigcast_value::Value;

use super::Related;
use crate::error::ValidatorFailed;

/// Whether `value` counts as provided.
pub fn is_provided(value: &Value, allow_none: bool) -> bool {
    !(value.is_empty_marker() || (allow_none && value.is_none()))
}

fn quoted<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    names
        .into_iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn provided_count(args: &IndexMap<String, Value>, allow_none: bool) -> usize {
    args.values().filter(|value| is_provided(value, allow_none)).count()
}

/// At most one of `params` may be provided.
pub fn mutually_exclusive<I, S>(params: I, allow_none: bool) -> Related
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Related::new("mutually_exclusive", move |args| {
        if provided_count(args, allow_none) > 1 {
            return Err(ValidatorFailed::new(format!(
                "Params {} are mutually exclusive",
                quoted(args.keys())
            )));
        }
        Ok(())
    })
    .params(params)
}

/// Exactly `x` of `params` must be provided.
pub fn exactly<I, S>(params: I, x: usize, allow_none: bool) -> Related
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Related::new("exactly", move |args| {
        if provided_count(args, allow_none) != x {
            let count = if x == 1 { "one".to_owned() } else { x.to_string() };
            return Err(ValidatorFailed::new(format!(
                "Provide exactly {count} of {}",
                quoted(args.keys())
            )));
        }
        Ok(())
    })
    .params(params)
}

/// All of `params` or none of them.
pub fn complementary<I, S>(params: I, allow_none: bool) -> Related
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Related::new("complementary", move |args| {
        let provided = provided_count(args, allow_none);
        if provided != 0 && provided != args.len() {
            return Err(ValidatorFailed::new(
                "Parameters are complementary, provide all or none",
            ));
        }
        Ok(())
    })
    .params(params)
}

/// If `owner` is provided, every one of `dependents` must be too.
pub fn hierarchical<I, S>(owner: impl Into<String>, dependents: I, allow_none: bool) -> Related
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let owner = owner.into();
    let dependents: Vec<String> = dependents.into_iter().map(Into::into).collect();
    let check_owner = owner.clone();
    let check_dependents = dependents.clone();

    Related::new("hierarchical", move |args| {
        let owner_provided = args
            .get(&check_owner)
            .is_some_and(|value| is_provided(value, allow_none));
        let all_dependents = check_dependents
            .iter()
            .all(|name| args.get(name).is_some_and(|value| is_provided(value, allow_none)));
        if owner_provided && !all_dependents {
            return Err(ValidatorFailed::new(format!(
                "If '{check_owner}' is provided, {} should also be provided",
                quoted(&check_dependents)
            )));
        }
        Ok(())
    })
    .params(dependents)
    .param(owner)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::related::RelatedError;

    fn args(values: &[(&str, Value)]) -> IndexMap<String, Value> {
        values.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
    }

    fn failure(related: &Related, values: &[(&str, Value)]) -> Option<String> {
        match related.run(&args(values)) {
            Ok(()) => None,
            Err(RelatedError::Failed(err)) => Some(err.reason),
            Err(other) => panic!("unexpected {other:?}"),
        }
    }

    #[rstest]
    #[case(Value::Empty, Value::Empty, None)]
    #[case(Value::Int(1), Value::Empty, None)]
    #[case(Value::Int(1), Value::None, None)]
    #[case(Value::Int(1), Value::Int(2), Some("Params 'a', 'b' are mutually exclusive"))]
    fn test_mutually_exclusive(#[case] a: Value, #[case] b: Value, #[case] expected: Option<&str>) {
        let related = mutually_exclusive(["a", "b"], true);
        assert_eq!(failure(&related, &[("a", a), ("b", b)]).as_deref(), expected);
    }

    #[test]
    fn test_mutually_exclusive_counts_none_when_disallowed() {
        let related = mutually_exclusive(["a", "b"], false);
        assert!(failure(&related, &[("a", Value::Int(1)), ("b", Value::None)]).is_some());
    }

    #[test]
    fn test_exactly() {
        let one = exactly(["a", "b", "c"], 1, true);
        assert_eq!(
            failure(&one, &[("a", Value::Empty), ("b", Value::Empty), ("c", Value::Empty)]).as_deref(),
            Some("Provide exactly one of 'a', 'b', 'c'")
        );
        assert_eq!(failure(&one, &[("a", Value::Int(1)), ("b", Value::Empty), ("c", Value::None)]), None);

        let two = exactly(["a", "b"], 2, true);
        assert_eq!(
            failure(&two, &[("a", Value::Int(1)), ("b", Value::Empty)]).as_deref(),
            Some("Provide exactly 2 of 'a', 'b'")
        );
    }

    #[test]
    fn test_complementary() {
        let related = complementary(["a", "b"], true);
        assert_eq!(failure(&related, &[("a", Value::Empty), ("b", Value::None)]), None);
        assert_eq!(failure(&related, &[("a", Value::Int(1)), ("b", Value::Int(2))]), None);
        assert_eq!(
            failure(&related, &[("a", Value::Int(1)), ("b", Value::Empty)]).as_deref(),
            Some("Parameters are complementary, provide all or none")
        );
    }

    #[test]
    fn test_hierarchical() {
        let related = hierarchical("owner", ["b", "c"], true);
        assert_eq!(related.covered(), vec!["b", "c", "owner"]);
        assert_eq!(
            failure(&related, &[("owner", Value::Int(1)), ("b", Value::Int(1)), ("c", Value::Empty)]).as_deref(),
            Some("If 'owner' is provided, 'b', 'c' should also be provided")
        );
        assert_eq!(failure(&related, &[("owner", Value::None), ("b", Value::Empty), ("c", Value::Empty)]), None);
        assert_eq!(failure(&related, &[("owner", Value::Int(1)), ("b", Value::Int(1)), ("c", Value::Int(1))]), None);
    }
}
