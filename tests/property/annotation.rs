use fieldcheck::parse_annotation;
use proptest::prelude::*;

/// Strategy for rule names: no grammar characters, never empty.
fn arb_name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,11}"
}

/// Strategy for parameter values: no grammar characters, never empty.
fn arb_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9^$*+?.()\\[\\]{}=<>!@#-]{1,8}"
}

/// One well-formed segment: a name, positional values, then uniquely keyed
/// named values.
fn arb_segment() -> impl Strategy<Value = (String, Vec<String>, Vec<(String, String)>)> {
    (
        arb_name(),
        prop::collection::vec(arb_value(), 0..4),
        prop::collection::btree_map("[a-zA-Z]{1,6}", arb_value(), 0..4),
    )
        .prop_map(|(name, positional, named)| (name, positional, named.into_iter().collect()))
}

fn render(segment: &(String, Vec<String>, Vec<(String, String)>)) -> String {
    let (name, positional, named) = segment;
    let mut parts: Vec<String> = positional.clone();
    parts.extend(named.iter().map(|(k, v)| format!("{}:{}", k, v)));
    if parts.is_empty() {
        name.clone()
    } else {
        format!("{}:{}", name, parts.join(","))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn n_segments_yield_n_invocations_in_order(
        segments in prop::collection::vec(arb_segment(), 1..6)
    ) {
        let annotation = segments.iter().map(render).collect::<Vec<_>>().join("|");
        let parsed = parse_annotation(&annotation).unwrap();

        prop_assert_eq!(parsed.len(), segments.len());
        for (invocation, (name, positional, named)) in parsed.iter().zip(&segments) {
            prop_assert_eq!(&invocation.rule, name);
            prop_assert_eq!(invocation.params.positional(), positional.as_slice());
            prop_assert_eq!(invocation.params.named_params().len(), named.len());
            for (key, value) in named {
                prop_assert_eq!(invocation.params.named(key), Some(value.as_str()));
            }
        }
    }

    #[test]
    fn a_part_with_two_colons_is_always_rejected(
        name in arb_name(),
        a in arb_value(),
        b in arb_value(),
        c in arb_value(),
    ) {
        let annotation = format!("{}:{}:{}:{}", name, a, b, c);
        prop_assert!(parse_annotation(&annotation).is_err());
    }

    #[test]
    fn parsing_never_panics(input in "\\PC{0,40}") {
        let _ = parse_annotation(&input);
    }
}
