use meshcore::domain::{
    Duration, DurationUnit, HeaderMatchMethod, HttpPathMatch, MatchMethod, MatchRange,
    NamespacedReference, PortMapping, PortProtocol, QueryMatchMethod, RegexCache,
    SubjectAlternativeNames, VirtualNodeReference,
};
use meshcore::errors::ErrorKind;
use proptest::prelude::*;

fn operand() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-z0-9./-]{1,32}")
}

fn protocol() -> impl Strategy<Value = PortProtocol> {
    prop::sample::select(PortProtocol::ALL.to_vec())
}

fn range() -> impl Strategy<Value = MatchRange> {
    (-1000i64..1000, 1i64..1000).prop_map(|(start, width)| MatchRange::new(start, start + width))
}

/// Header methods with exactly one strategy set
fn header_method() -> impl Strategy<Value = HeaderMatchMethod> {
    let text = "[a-z0-9./-]{1,16}";
    prop_oneof![
        text.prop_map(|v| HeaderMatchMethod { exact: Some(v), ..Default::default() }),
        text.prop_map(|v| HeaderMatchMethod { prefix: Some(v), ..Default::default() }),
        text.prop_map(|v| HeaderMatchMethod { suffix: Some(v), ..Default::default() }),
        text.prop_map(|v| HeaderMatchMethod { regex: Some(v), ..Default::default() }),
        range().prop_map(|r| HeaderMatchMethod { range: Some(r), ..Default::default() }),
    ]
}

/// Path methods with exactly one strategy set
fn path_method() -> impl Strategy<Value = HttpPathMatch> {
    let text = "/[a-z0-9./-]{0,16}";
    prop_oneof![
        text.prop_map(|v| HttpPathMatch { exact: Some(v), regex: None }),
        text.prop_map(|v| HttpPathMatch { exact: None, regex: Some(v) }),
    ]
}

/// Values worth evaluating: short strings, paths and integers
fn values() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9./-]{0,16}|/[a-z0-9./-]{0,16}|-?[0-9]{1,4}", 0..8)
}

proptest! {
    #[test]
    fn header_method_compiles_iff_exactly_one_strategy(
        exact in operand(),
        prefix in operand(),
        suffix in operand(),
        range in prop::option::of(range()),
        regex in operand(),
    ) {
        let method = HeaderMatchMethod { exact, prefix, suffix, range, regex };
        let set = method.strategies().len();
        let result = method.compile(&RegexCache::default());

        if set == 1 {
            prop_assert!(result.is_ok());
        } else {
            let errors = result.unwrap_err();
            prop_assert!(errors.has_kind(ErrorKind::InvariantViolation));
        }
    }

    #[test]
    fn path_match_compiles_iff_exactly_one_strategy(exact in operand(), regex in operand()) {
        let set = usize::from(exact.is_some()) + usize::from(regex.is_some());
        let result = HttpPathMatch { exact, regex }.compile(&RegexCache::default());

        if set == 1 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result.unwrap_err().kinds(), vec![ErrorKind::InvariantViolation]);
        }
    }

    #[test]
    fn query_method_compiles_iff_exact_set(exact in operand()) {
        let set = exact.is_some();
        let result = QueryMatchMethod { exact }.compile(&RegexCache::default());

        prop_assert_eq!(result.is_ok(), set);
        if !set {
            prop_assert_eq!(result.unwrap_err().kinds(), vec![ErrorKind::InvariantViolation]);
        }
    }

    #[test]
    fn header_method_survives_the_wire(method in header_method(), inputs in values()) {
        let cache = RegexCache::default();
        let json = serde_json::to_string(&method).unwrap();
        let reparsed: HeaderMatchMethod = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&reparsed, &method);

        let original = method.compile(&cache).unwrap();
        let decoded = reparsed.compile(&cache).unwrap();
        prop_assert_eq!(&decoded, &original);
        prop_assert_eq!(HeaderMatchMethod::from_predicate(&decoded), Some(method));
        for value in &inputs {
            prop_assert_eq!(decoded.evaluate(value), original.evaluate(value));
        }
    }

    #[test]
    fn path_match_survives_the_wire(method in path_method(), inputs in values()) {
        let cache = RegexCache::default();
        let json = serde_json::to_string(&method).unwrap();
        let reparsed: HttpPathMatch = serde_json::from_str(&json).unwrap();

        let original = method.compile(&cache).unwrap();
        let decoded = reparsed.compile(&cache).unwrap();
        prop_assert_eq!(&decoded, &original);
        prop_assert_eq!(HttpPathMatch::from_predicate(&decoded), Some(method));
        for value in &inputs {
            prop_assert_eq!(decoded.evaluate(value), original.evaluate(value));
        }
    }

    #[test]
    fn prefix_predicate_matches_its_extensions(prefix in "[a-z]{1,16}", rest in "[a-z0-9]{0,16}") {
        let method = HeaderMatchMethod { prefix: Some(prefix.clone()), ..Default::default() };
        let predicate = method.compile(&RegexCache::default()).unwrap();
        let value = format!("{}{}", prefix, rest);
        prop_assert!(predicate.evaluate(&value));
    }

    #[test]
    fn range_membership_is_half_open(
        start in -10_000i64..10_000,
        width in 1i64..10_000,
        value in -20_000i64..20_000,
    ) {
        let range = MatchRange::new(start, start + width);
        prop_assert!(range.validate().is_ok());
        prop_assert_eq!(range.contains(value), start <= value && value < start + width);
        prop_assert!(!range.contains(start + width));
    }

    #[test]
    fn inverted_ranges_are_range_errors(start in -10_000i64..10_000, back in 0i64..10_000) {
        let errors = MatchRange::new(start, start - back).validate().unwrap_err();
        prop_assert_eq!(errors.kinds(), vec![ErrorKind::RangeError]);
    }

    #[test]
    fn canonical_duration_scales_by_unit(value in 0i64..=9_223_372_036_854_775) {
        prop_assert_eq!(Duration::millis(value).to_canonical().unwrap(), value);
        prop_assert_eq!(Duration::seconds(value).to_canonical().unwrap(), value * 1000);
    }

    #[test]
    fn canonical_duration_overflow_is_range_error(value in 9_223_372_036_854_776i64..=i64::MAX) {
        let err = Duration { unit: DurationUnit::Seconds, value }.to_canonical().unwrap_err();
        prop_assert_eq!(err.kind(), Some(ErrorKind::RangeError));
    }

    #[test]
    fn port_bounds(port in -100_000i64..100_000, protocol in protocol()) {
        let valid = PortMapping::new(port, protocol).validate().is_ok();
        prop_assert_eq!(valid, (1..=65535).contains(&port));
    }

    #[test]
    fn reference_namespace_defaults(
        name in "[a-z][a-z0-9-]{0,20}",
        ns in "[a-z]{1,10}",
        own in prop::option::of("[a-z]{1,10}"),
    ) {
        let mut reference = VirtualNodeReference::new(name.clone());
        if let Some(own) = &own {
            reference = reference.in_namespace(own.clone());
        }
        let identity = reference.resolve(&ns).unwrap();
        prop_assert_eq!(identity.name, name);
        prop_assert_eq!(identity.namespace, own.unwrap_or(ns));
    }

    #[test]
    fn san_matcher_accepts_iff_intersection(
        configured in prop::collection::vec("[a-z]{1,6}\\.com", 1..5),
        presented in prop::collection::vec("[a-z]{1,6}\\.com", 0..5),
    ) {
        let matcher = SubjectAlternativeNames::exact(configured.clone()).compile().unwrap();
        let expected = presented.iter().any(|san| configured.contains(san));
        prop_assert_eq!(matcher.evaluate(&presented), expected);
    }
}
