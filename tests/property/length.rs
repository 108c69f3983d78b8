use fieldcheck::{Validator, record};
use proptest::prelude::*;

record! {
    pub struct Text {
        #[tags(validation = "length:op:>=,val:4|length:op:<=,val:8")]
        pub value: String,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn length_rule_agrees_with_char_count(value in "\\PC{0,12}") {
        let count = value.chars().count();
        let errors = Validator::new().validate(&Text { value: value.clone() }).unwrap();
        let expected = usize::from(count < 4) + usize::from(count > 8);
        prop_assert_eq!(errors.error_count(), expected);
    }

    #[test]
    fn validation_is_idempotent(value in "\\PC{0,12}") {
        let v = Validator::new();
        let data = Text { value };
        prop_assert_eq!(v.validate(&data).unwrap(), v.validate(&data).unwrap());
    }
}
