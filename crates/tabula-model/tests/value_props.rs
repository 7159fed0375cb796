use proptest::prelude::*;
use tabula_model::{approx_eq, Algebra, Ordered, UnitTable, Value};

proptest! {
    #[test]
    fn int_division_truncates_toward_zero(a in -1_000_000i64..1_000_000, b in -1_000i64..1_000) {
        prop_assume!(b != 0);
        let quotient = Value::int(a).div(&Value::int(b)).unwrap();
        prop_assert_eq!(quotient.as_int().unwrap(), a / b);
    }

    #[test]
    fn int_add_sub_round_trip(a in -1_000_000_000i64..1_000_000_000, b in -1_000_000_000i64..1_000_000_000) {
        let back = Value::int(a).add(&Value::int(b)).unwrap().sub(&Value::int(b)).unwrap();
        prop_assert_eq!(back.as_int().unwrap(), a);
    }

    #[test]
    fn float_add_commutes(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let ab = Value::Float(a).add(&Value::Float(b)).unwrap();
        let ba = Value::Float(b).add(&Value::Float(a)).unwrap();
        prop_assert!(ab.eq_value(&ba).unwrap());
    }

    #[test]
    fn quantity_identity_round_trip(x in -1e9f64..1e9, unit_index in 0usize..3) {
        let table = UnitTable::new([("km", 1000.0, "m"), ("cm", 0.01, "m")]);
        let unit = ["km", "m", "cm"][unit_index];
        let quantity = table.value(x, unit).unwrap();
        prop_assert_eq!(quantity.get(unit).unwrap(), x);
    }

    #[test]
    fn quantity_conversion_is_transitive(x in 1e-3f64..1e3) {
        let table = UnitTable::new([
            ("cm", 100.0, "mm"),
            ("m", 100.0, "cm"),
            ("km", 1000.0, "m"),
        ]);
        let chained = table.convert(table.convert(x, "km", "cm").unwrap(), "cm", "mm").unwrap();
        let direct = table.convert(x, "km", "mm").unwrap();
        prop_assert!((chained - direct).abs() <= 1e-9 * direct.abs().max(1.0));
    }

    #[test]
    fn float_sqr_is_non_negative(a in -1e3f64..1e3) {
        let squared = Value::Float(a).sqr().unwrap();
        prop_assert!(squared.as_float().unwrap() >= 0.0 || approx_eq(squared.as_float().unwrap(), 0.0));
    }
}
