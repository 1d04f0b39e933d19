//! Boolean normalization of filter trees.
//!
//! The simplified filter is equivalent to the input for every feature. It is
//! used to detect `INCLUDE` and `EXCLUDE` so readers and aggregates can skip
//! evaluation or the store entirely.

use crate::filter::Filter;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Junction {
    And,
    Or,
}

impl Junction {
    /// The constant that leaves the junction unchanged.
    fn identity(self) -> Filter {
        match self {
            Self::And => Filter::Include,
            Self::Or => Filter::Exclude,
        }
    }

    /// The constant that decides the junction on its own.
    fn absorbing(self) -> Filter {
        match self {
            Self::And => Filter::Exclude,
            Self::Or => Filter::Include,
        }
    }

    fn children(self, filter: &Filter) -> Option<&[Filter]> {
        match (self, filter) {
            (Self::And, Filter::And(c)) | (Self::Or, Filter::Or(c)) => Some(c),
            _ => None,
        }
    }

    fn build(self, children: Vec<Filter>) -> Filter {
        match self {
            Self::And => Filter::And(children),
            Self::Or => Filter::Or(children),
        }
    }
}

/// Reduce a filter to a canonical equivalent.
///
/// Folds constants, flattens nested junctions of the same kind, removes
/// duplicate terms, collapses complementary pairs (`x AND NOT x` is
/// `EXCLUDE`, `x OR NOT x` is `INCLUDE`), removes double negation, and
/// turns an empty bounding box or empty id set into `EXCLUDE`.
pub fn simplify(filter: &Filter) -> Filter {
    match filter {
        Filter::Bbox { envelope: None, .. } => Filter::Exclude,
        Filter::Id(ids) if ids.is_empty() => Filter::Exclude,
        Filter::Not(inner) => match simplify(inner) {
            Filter::Include => Filter::Exclude,
            Filter::Exclude => Filter::Include,
            Filter::Not(x) => *x,
            other => Filter::not(other),
        },
        Filter::And(children) => simplify_junction(Junction::And, children),
        Filter::Or(children) => simplify_junction(Junction::Or, children),
        other => other.clone(),
    }
}

fn simplify_junction(kind: Junction, children: &[Filter]) -> Filter {
    let absorbing = kind.absorbing();
    let identity = kind.identity();

    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        let simplified = simplify(child);
        match kind.children(&simplified) {
            Some(nested) => flat.extend(nested.iter().cloned()),
            None => flat.push(simplified),
        }
    }

    let mut terms: Vec<Filter> = Vec::with_capacity(flat.len());
    for term in flat {
        if term == absorbing {
            return absorbing;
        }
        if term == identity || terms.contains(&term) {
            continue;
        }
        terms.push(term);
    }

    let complementary = terms.iter().any(|term| match term {
        Filter::Not(inner) => terms.contains(inner),
        _ => false,
    });
    if complementary {
        return absorbing;
    }

    match terms.len() {
        0 => identity,
        1 => terms.pop().unwrap_or(identity),
        _ => kind.build(terms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::CompareOp;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use vsq_types::{ChangeType, Envelope, Feature, Value};

    fn a() -> Filter {
        Filter::eq("name", "a")
    }

    fn b() -> Filter {
        Filter::compare("lanes", CompareOp::Gt, 1)
    }

    #[test]
    fn constants_fold() {
        assert_eq!(simplify(&Filter::and(vec![a(), Filter::Exclude])), Filter::Exclude);
        assert_eq!(simplify(&Filter::or(vec![a(), Filter::Include])), Filter::Include);
        assert_eq!(simplify(&Filter::and(vec![a(), Filter::Include])), a());
        assert_eq!(simplify(&Filter::or(vec![Filter::Exclude, a()])), a());
        assert_eq!(simplify(&Filter::and(vec![])), Filter::Include);
        assert_eq!(simplify(&Filter::or(vec![])), Filter::Exclude);
        assert_eq!(simplify(&Filter::not(Filter::Include)), Filter::Exclude);
    }

    #[test]
    fn nested_junctions_flatten_and_dedup() {
        let nested = Filter::and(vec![a(), Filter::and(vec![b(), a()])]);
        assert_eq!(simplify(&nested), Filter::and(vec![a(), b()]));

        let mixed = Filter::or(vec![Filter::and(vec![a(), b()]), a()]);
        assert_eq!(
            simplify(&mixed),
            Filter::or(vec![Filter::and(vec![a(), b()]), a()])
        );
    }

    #[test]
    fn complementary_pairs_collapse() {
        assert_eq!(
            simplify(&Filter::and(vec![a(), b(), Filter::not(a())])),
            Filter::Exclude
        );
        assert_eq!(
            simplify(&Filter::or(vec![Filter::not(b()), b()])),
            Filter::Include
        );
    }

    #[test]
    fn double_negation() {
        assert_eq!(simplify(&Filter::not(Filter::not(a()))), a());
        assert_eq!(
            simplify(&Filter::not(Filter::not(Filter::not(a())))),
            Filter::not(a())
        );
    }

    #[test]
    fn empty_sets_exclude() {
        assert_eq!(simplify(&Filter::Id(BTreeSet::new())), Filter::Exclude);
        let empty_box = Filter::Bbox {
            property: None,
            envelope: None,
        };
        assert_eq!(simplify(&Filter::or(vec![empty_box, a()])), a());
        assert_eq!(simplify(&Filter::not(Filter::ids(Vec::<String>::new()))), Filter::Include);
    }

    #[test]
    fn leaves_untouched() {
        let bbox = Filter::bbox(Envelope::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(simplify(&bbox), bbox);
        assert_eq!(simplify(&a()), a());
    }

    fn leaf() -> impl Strategy<Value = Filter> {
        prop_oneof![
            Just(Filter::Include),
            Just(Filter::Exclude),
            prop::sample::select(vec!["a", "b", "c"]).prop_map(|n| Filter::eq("name", n)),
            (0i64..4).prop_map(|n| Filter::compare("lanes", CompareOp::Ge, n)),
            Just(Filter::is_null("lanes")),
            prop::collection::btree_set(prop::sample::select(vec!["f1", "f2"]), 0..3)
                .prop_map(Filter::ids),
        ]
    }

    fn tree() -> impl Strategy<Value = Filter> {
        leaf().prop_recursive(4, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Filter::And),
                prop::collection::vec(inner.clone(), 0..4).prop_map(Filter::Or),
                inner.prop_map(Filter::not),
            ]
        })
    }

    fn feature() -> impl Strategy<Value = Feature> {
        (
            prop::sample::select(vec!["f1", "f2", "f3"]),
            prop::sample::select(vec!["a", "b", "c"]),
            prop::option::of(0i64..4),
        )
            .prop_map(|(id, name, lanes)| {
                let mut f = Feature::new(id, ChangeType::Added);
                f.push("name", Value::from(name));
                f.push("lanes", lanes.map_or(Value::Null, Value::Int));
                f
            })
    }

    proptest! {
        #[test]
        fn simplification_preserves_meaning(filter in tree(), f in feature()) {
            prop_assert_eq!(simplify(&filter).evaluate(&f), filter.evaluate(&f));
        }

        #[test]
        fn simplification_is_idempotent(filter in tree()) {
            let once = simplify(&filter);
            prop_assert_eq!(simplify(&once), once);
        }
    }
}
