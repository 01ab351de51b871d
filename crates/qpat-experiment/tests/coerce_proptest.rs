//! Property tests for step parameter coercion.

use proptest::prelude::*;

use qpat_experiment::{ParamValue, Params, coerce_numeric_strings};

proptest! {
    #[test]
    fn numeric_strings_become_numbers(v in -1e12_f64..1e12_f64) {
        let mut params = Params::new();
        params.insert("x".into(), ParamValue::Text(format!("{v:e}")));
        let clean = coerce_numeric_strings(&params);
        prop_assert_eq!(clean["x"].clone(), ParamValue::Number(v));
    }

    #[test]
    fn non_numeric_strings_pass_through(s in "[a-zA-Z_+-]{1,12}") {
        prop_assume!(s.parse::<f64>().is_err());
        let mut params = Params::new();
        params.insert("label".into(), ParamValue::Text(s.clone()));
        let clean = coerce_numeric_strings(&params);
        prop_assert_eq!(clean["label"].clone(), ParamValue::Text(s));
    }

    #[test]
    fn keys_are_preserved(n in 0_usize..16) {
        let params: Params = (0..n)
            .map(|i| (format!("k{i}"), ParamValue::Number(i as f64)))
            .collect();
        let clean = coerce_numeric_strings(&params);
        prop_assert_eq!(clean, params);
    }
}
