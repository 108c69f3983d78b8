use fieldcheck::{ErrorSet, LogicError, Validator, record};

fn run<T: fieldcheck::Inspect>(data: &T) -> Result<ErrorSet, LogicError> {
    Validator::new().validate(data)
}

/// Messages recorded for `path`, in discovery order.
fn messages(errors: &ErrorSet, path: &str) -> Vec<String> {
    errors
        .get(path)
        .map(|errs| errs.iter().map(|e| e.message.clone()).collect())
        .unwrap_or_default()
}

// ─── length ─────────────────────────────────────────────────────────────────

record! {
    pub struct AtLeastFour {
        #[tags(validation = "length:op:>=,val:4")]
        pub field: String,
    }
}

#[test]
fn length_at_bound_passes() {
    let errors = run(&AtLeastFour {
        field: "fool".to_string(),
    })
    .unwrap();
    assert!(errors.is_empty(), "unexpected errors: {errors}");
}

#[test]
fn length_below_bound_names_field_operator_bound_and_length() {
    let errors = run(&AtLeastFour {
        field: "foo".to_string(),
    })
    .unwrap();
    assert_eq!(
        messages(&errors, "field"),
        ["The field field should have a length greater than, or equal to 4. Actual length: 3"]
    );
}

#[test]
fn length_counts_characters_not_bytes() {
    // Four characters, twelve bytes.
    let errors = run(&AtLeastFour {
        field: "日本語字".to_string(),
    })
    .unwrap();
    assert!(errors.is_empty());
}

record! {
    pub struct BadOperator {
        #[tags(validation = "length:op:ar,val:4")]
        pub field: String,
    }
}

#[test]
fn unknown_operator_is_a_logic_error() {
    let v = Validator::new();
    let mut session = v.session();
    let err = session
        .validate(&BadOperator {
            field: String::new(),
        })
        .unwrap_err();
    assert!(err.to_string().contains("Invalid operator"), "got: {err}");
    assert!(session.errors().is_none());
}

record! {
    pub struct Lengths {
        #[tags(validation = "length:=,3")]
        pub eq: String,
        #[tags(validation = "length:>,3")]
        pub gt: String,
        #[tags(validation = "length:<,3")]
        pub lt: String,
        #[tags(validation = "length:<=,3")]
        pub le: String,
    }
}

#[test]
fn positional_form_and_every_operator() {
    let errors = run(&Lengths {
        eq: "abc".to_string(),
        gt: "abc".to_string(),
        lt: "abc".to_string(),
        le: "abc".to_string(),
    })
    .unwrap();
    assert_eq!(errors.paths().collect::<Vec<_>>(), ["gt", "lt"]);
    assert_eq!(
        messages(&errors, "gt"),
        ["The field gt should have a length greater than 3. Actual length: 3"]
    );
    assert_eq!(
        messages(&errors, "lt"),
        ["The field lt should have a length lower than 3. Actual length: 3"]
    );
}

record! {
    pub struct Numbers {
        #[tags(validation = "length:op:=,val:4")]
        pub signed: i64,
        #[tags(validation = "length:op:<=,val:2")]
        pub unsigned: u16,
        #[tags(validation = "length:op:>,val:0")]
        pub optional: Option<i32>,
    }
}

#[test]
fn integers_are_measured_by_their_decimal_text() {
    let errors = run(&Numbers {
        signed: -123,
        unsigned: 100,
        optional: Some(7),
    })
    .unwrap();
    assert_eq!(errors.paths().collect::<Vec<_>>(), ["unsigned"]);

    let errors = run(&Numbers {
        signed: 1000,
        unsigned: 99,
        optional: None,
    })
    .unwrap();
    assert_eq!(errors.paths().collect::<Vec<_>>(), ["optional"]);
}

record! {
    pub struct Flagged {
        #[tags(validation = "length:op:>,val:1")]
        pub flag: bool,
    }
}

#[test]
fn unsupported_field_type_is_a_logic_error() {
    let err = run(&Flagged { flag: true }).unwrap_err();
    assert!(matches!(
        err,
        LogicError::UnsupportedType { ref rule, ref field, kind: "bool" }
            if rule == "length" && field == "flag"
    ));
}

record! {
    pub struct BadBound {
        #[tags(validation = "length:op:>,val:four")]
        pub field: String,
    }
}

#[test]
fn non_numeric_bound_is_a_logic_error() {
    let err = run(&BadBound {
        field: String::new(),
    })
    .unwrap_err();
    assert!(matches!(err, LogicError::InvalidParam { ref param, .. } if param == "val"));
}

record! {
    pub struct NoBound {
        #[tags(validation = "length:op:>")]
        pub field: String,
    }
}

#[test]
fn missing_bound_is_a_logic_error() {
    let err = run(&NoBound {
        field: String::new(),
    })
    .unwrap_err();
    assert!(matches!(err, LogicError::MissingParam { ref param, .. } if param == "val"));
}

// ─── min_length / max_length ────────────────────────────────────────────────

record! {
    pub struct MinMax {
        #[tags(validation = "min_length:4")]
        pub short: String,
        #[tags(validation = "max_length:2")]
        pub long: String,
        #[tags(validation = "min_length:4")]
        pub number: i32,
    }
}

#[test]
fn min_and_max_length_messages() {
    let errors = run(&MinMax {
        short: "foo".to_string(),
        long: "foo".to_string(),
        number: 1456,
    })
    .unwrap();
    assert_eq!(
        messages(&errors, "short"),
        ["The field short should have a minimum length of 4 characters"]
    );
    assert_eq!(
        messages(&errors, "long"),
        ["The field long should have a maximum length of 2 characters"]
    );
    assert!(errors.get("number").is_none());
}

// ─── regexp ─────────────────────────────────────────────────────────────────

record! {
    pub struct Mail {
        #[tags(validation = r"regexp:val:^[0-9a-z]+@[0-9a-z]+(\.[0-9a-z]+)+$,allowEmpty:1")]
        pub field: String,
    }
}

#[test]
fn regexp_mismatch_is_an_input_error() {
    let errors = run(&Mail {
        field: "foo".to_string(),
    })
    .unwrap();
    assert_eq!(
        messages(&errors, "field"),
        ["The field field does not match regexp"]
    );
}

#[test]
fn regexp_match_passes() {
    let errors = run(&Mail {
        field: "foo@mail.com".to_string(),
    })
    .unwrap();
    assert!(errors.is_empty());
}

#[test]
fn regexp_allow_empty_skips_empty_values() {
    let errors = run(&Mail {
        field: String::new(),
    })
    .unwrap();
    assert!(errors.is_empty());
}

record! {
    pub struct MailStrict {
        #[tags(validation = r"regexp:val:^[0-9a-z]+@[0-9a-z]+(\.[0-9a-z]+)+$,allowEmpty:0")]
        pub field: String,
    }
}

#[test]
fn regexp_without_allow_empty_matches_empty_values() {
    let errors = run(&MailStrict {
        field: String::new(),
    })
    .unwrap();
    assert_eq!(errors.len(), 1);
}

record! {
    pub struct EmptyMatches {
        #[tags(validation = "regexp:a*")]
        pub field: String,
    }
}

#[test]
fn empty_value_can_satisfy_the_pattern() {
    let errors = run(&EmptyMatches {
        field: String::new(),
    })
    .unwrap();
    assert!(errors.is_empty());
}

record! {
    pub struct Broken {
        #[tags(validation = "regexp:val:((,allowEmpty:1")]
        pub field: String,
    }
}

#[test]
fn invalid_pattern_is_a_logic_error_without_input_errors() {
    let v = Validator::new();
    let mut session = v.session();
    let err = session
        .validate(&Broken {
            field: "foo".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, LogicError::InvalidPattern { .. }));
    assert_eq!(
        err.to_string(),
        "The field field does not contain a valid regexp"
    );
    assert!(session.errors().is_none());
}

#[test]
fn invalid_pattern_is_not_compiled_for_allowed_empty_values() {
    let errors = run(&Broken {
        field: String::new(),
    })
    .unwrap();
    assert!(errors.is_empty());
}

record! {
    pub struct Partial {
        #[tags(validation = "regexp:[0-9]+")]
        pub field: String,
    }
}

#[test]
fn pattern_must_match_the_whole_value() {
    let errors = run(&Partial {
        field: "abc123".to_string(),
    })
    .unwrap();
    assert_eq!(errors.len(), 1);
    assert!(
        run(&Partial {
            field: "123".to_string(),
        })
        .unwrap()
        .is_empty()
    );
}

record! {
    pub struct Unbalanced {
        #[tags(validation = "regexp:a)(b")]
        pub field: String,
    }
}

#[test]
fn unbalanced_pattern_is_a_logic_error() {
    let err = run(&Unbalanced {
        field: "ab".to_string(),
    })
    .unwrap_err();
    assert!(matches!(err, LogicError::InvalidPattern { ref field, .. } if field == "field"));
}

record! {
    pub struct Verbose {
        #[tags(validation = "regexp:(?x) [a-z]+ # lowercase letters only")]
        pub field: String,
    }
}

#[test]
fn verbose_pattern_with_trailing_comment_is_honored() {
    assert!(
        run(&Verbose {
            field: "abc".to_string(),
        })
        .unwrap()
        .is_empty()
    );
    let errors = run(&Verbose {
        field: "abc1".to_string(),
    })
    .unwrap();
    assert_eq!(
        messages(&errors, "field"),
        ["The field field does not match regexp"]
    );
}

record! {
    pub struct SharedPattern {
        #[tags(validation = "regexp:[a-z]+")]
        pub first: String,
        #[tags(validation = "regexp:[a-z]+")]
        pub second: String,
    }
}

#[test]
fn one_pattern_serves_many_fields_and_calls() {
    let v = Validator::new();
    for _ in 0..3 {
        let errors = v
            .validate(&SharedPattern {
                first: "ok".to_string(),
                second: "NOT".to_string(),
            })
            .unwrap();
        assert_eq!(errors.paths().collect::<Vec<_>>(), ["second"]);
    }
}

record! {
    pub struct BadFlag {
        #[tags(validation = "regexp:val:a,allowEmpty:maybe")]
        pub field: String,
    }
}

#[test]
fn unparsable_allow_empty_is_a_logic_error() {
    let err = run(&BadFlag {
        field: String::new(),
    })
    .unwrap_err();
    assert!(matches!(err, LogicError::InvalidParam { ref param, .. } if param == "allowEmpty"));
}

record! {
    pub struct TwoPatterns {
        #[tags(validation = "regexp:a,b")]
        pub field: String,
    }
}

#[test]
fn more_than_one_pattern_is_a_logic_error() {
    let err = run(&TwoPatterns {
        field: String::new(),
    })
    .unwrap_err();
    assert!(matches!(err, LogicError::InvalidParam { .. }));
}

// ─── email ──────────────────────────────────────────────────────────────────

record! {
    pub struct Contact {
        #[tags(validation = "email")]
        pub email: String,
    }
}

#[test]
fn email_accepts_full_addresses() {
    let errors = run(&Contact {
        email: "john.williams@lso.co.uk".to_string(),
    })
    .unwrap();
    assert!(errors.is_empty());
}

#[test]
fn email_rejects_missing_tld() {
    let errors = run(&Contact {
        email: "john.williams@lso".to_string(),
    })
    .unwrap();
    assert_eq!(
        messages(&errors, "email"),
        ["The field email should be a valid email address"]
    );
}

record! {
    pub struct OpaqueEmail {
        #[tags(validation = "email")]
        pub email: Vec<String>,
    }
}

#[test]
fn email_on_a_sequence_is_unsupported() {
    let err = run(&OpaqueEmail { email: Vec::new() }).unwrap_err();
    assert!(matches!(err, LogicError::UnsupportedType { kind: "sequence", .. }));
}
