//! Property-based tests for entity reference identity

use proptest::prelude::*;
use scriptorium::types::{EntityReference, TextRange};
use std::collections::HashSet;

fn ranges() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-z]{1,3}", "[a-z]{1,3}"), 0..5)
}

/// Range order, duplicate ranges and display names never affect identity
#[test]
fn test_reference_identity_ignores_order_and_name() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("[A-Z][0-9]{1,4}", ranges(), "[a-z ]{0,12}"),
            |(id, raw, name)| {
                let forward: Vec<TextRange> =
                    raw.iter().map(|(a, b)| TextRange::new(a.clone(), b.clone())).collect();
                let mut backward = forward.clone();
                backward.reverse();
                backward.extend(forward.iter().cloned());

                let a = EntityReference::new(id.clone(), "text").with_ranges(forward);
                let b = EntityReference::new(id.clone(), "text")
                    .with_name(name)
                    .with_ranges(backward);
                prop_assert_eq!(&a, &b);

                let mut set = HashSet::new();
                set.insert(a);
                prop_assert!(!set.insert(b), "equal references must hash alike");
                Ok(())
            },
        )
        .unwrap();
}

/// The type tag is part of identity
#[test]
fn test_reference_type_tag_distinguishes() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[A-Z][0-9]{1,4}", |id| {
            prop_assert_ne!(
                EntityReference::new(id.clone(), "lemma"),
                EntityReference::new(id, "ths")
            );
            Ok(())
        })
        .unwrap();
}
