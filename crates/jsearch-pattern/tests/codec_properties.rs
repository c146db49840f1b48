//! Property tests for the member key codec.
//!
//! Member keys are `name/argCount`; decoding reads the count back digit by digit from
//! the end of the key, so multi-digit counts are the interesting cases.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use jsearch_pattern::{
    LimitTo, MatchMode, MatchRule, PatternBuilder,
    category::CONSTRUCTOR_DECL,
    codec::{self, DecodedKey, decode, decode_member_key, member_key},
};
use proptest::prelude::*;

/// Non-empty names without the key separator.
fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^/]{1,24}").expect("valid regex")
}

proptest! {
    #[test]
    fn member_keys_round_trip(
        name in name_strategy(),
        count in prop::sample::select(vec![0usize, 1, 9, 10, 23]),
    ) {
        let key = member_key(&name, count);
        prop_assert_eq!(decode_member_key(&key), (name.as_str(), count));
    }

    #[test]
    fn arbitrary_counts_round_trip(name in name_strategy(), count in any::<usize>()) {
        let key = member_key(&name, count);
        prop_assert_eq!(decode_member_key(&key), (name.as_str(), count));
    }
}

#[test]
fn multi_digit_count_through_pattern() {
    let params = ["int"; 12];
    let pattern = PatternBuilder::new(LimitTo::Declarations)
        .constructor("Foo", Vec::new(), Some(&params[..]), false)
        .unwrap();

    let query = codec::encode(&pattern);
    assert_eq!(query.key.as_deref(), Some("Foo/12"));
    assert_eq!(query.mode, MatchMode::Exact);

    let decoded = decode(CONSTRUCTOR_DECL, "Foo/12");
    assert_eq!(
        decoded,
        DecodedKey::Member {
            name: "Foo".into(),
            arg_count: 12,
        }
    );
    assert!(codec::matches_decoded_key(&pattern, &decoded));
}

#[test]
fn case_insensitive_rematch() {
    let pattern = PatternBuilder::new(LimitTo::Declarations)
        .rule(MatchRule::new(MatchMode::Exact, false))
        .constructor("foo", Vec::new(), Some(&[]), false)
        .unwrap();
    let query = codec::encode(&pattern);
    assert!(!query.case_sensitive);
    assert!(codec::matches_decoded_key(
        &pattern,
        &decode(CONSTRUCTOR_DECL, "FOO/0")
    ));
}
