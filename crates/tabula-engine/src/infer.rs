//! Column type inference over raw string tokens.
//!
//! Classification is a two-pass heuristic: one pass credits ordered
//! whole-token pattern rules into counters while tracking distinct tokens in
//! first-seen order, then a decision ladder picks the type. Patterns and the
//! categorical thresholds live in an [`InferenceConfig`] rather than
//! module-level state, so classification is deterministic and independently
//! testable.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use tabula_model::{CategorySet, Kind, Value, ValueType};

use crate::series::{Series, SeriesError};

/// Counter credited by a matching token rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLabel {
    Year,
    Int,
    Float,
    Day,
    ZeroLeading,
    Na,
    Nominal,
}

/// Anchored whole-token patterns, tried in a fixed order: the specific
/// patterns first, then the null forms; anything left is nominal.
#[derive(Debug, Clone)]
pub struct TokenPatterns {
    /// Informal four-digit year, 1000-2999.
    pub informal_year: Regex,
    /// Plain integer without leading zeros.
    pub int: Regex,
    /// Decimal float without leading zeros.
    pub float: Regex,
    /// ISO calendar date, `YYYY-MM-DD`.
    pub iso_day: Regex,
    /// Zero-leading numeric string (ZIP codes and the like): nominal.
    pub zero_leading: Regex,
    /// Null/blank/placeholder forms.
    pub na: Regex,
}

impl Default for TokenPatterns {
    fn default() -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("valid pattern");
        Self {
            informal_year: compile(r"^\s*[1-2]\d{3}\s*$"),
            int: compile(r"^\s*-?(?:[1-9][0-9]*|0)\s*$"),
            float: compile(r"^\s*-?(?:[1-9][0-9]*|0)\.[0-9]*\s*$"),
            iso_day: compile(r"^\s*\d{4}-[0-1]\d-[0-3]\d\s*$"),
            zero_leading: compile(r"^\s*0[0-9]+\.?[0-9]*\s*$"),
            na: compile(
                r"(?i)^(?:[^a-zA-Z]*null[^a-zA-Z]*|[^a-zA-Z]*nil[^a-zA-Z]*|[^a-zA-Z]*n[^a-zA-Z]*a[^a-zA-Z]*|[^a-zA-Z]*none[^a-zA-Z]*|\s*(?:-+|_+)\s*|\s*)$",
            ),
        }
    }
}

impl TokenPatterns {
    /// Rule chain in match order. More specific patterns come before the null
    /// forms; the caller treats an unmatched token as nominal.
    fn rules(&self) -> [(&Regex, &'static [TokenLabel]); 6] {
        [
            (&self.informal_year, &[TokenLabel::Year, TokenLabel::Int]),
            (&self.int, &[TokenLabel::Int]),
            (&self.float, &[TokenLabel::Float]),
            (&self.iso_day, &[TokenLabel::Day]),
            (
                &self.zero_leading,
                &[TokenLabel::Nominal, TokenLabel::ZeroLeading],
            ),
            (&self.na, &[TokenLabel::Na]),
        ]
    }
}

/// Patterns plus the three categorical thresholds, all of which must hold for
/// a nominal column to be treated as categorical.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub patterns: TokenPatterns,
    /// Distinct-token ratio below which the column may be categorical.
    pub categorical_max_distinct_ratio: f64,
    /// Duplicate count (total − distinct) that must be exceeded.
    pub categorical_min_duplicates: usize,
    /// Largest distinct label set a categorical column may have.
    pub categorical_max_distinct: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            patterns: TokenPatterns::default(),
            categorical_max_distinct_ratio: 0.025,
            categorical_min_duplicates: 10,
            categorical_max_distinct: 80,
        }
    }
}

fn default_config() -> &'static InferenceConfig {
    static CONFIG: OnceLock<InferenceConfig> = OnceLock::new();
    CONFIG.get_or_init(InferenceConfig::default)
}

#[derive(Debug, Default, Clone, Copy)]
struct LabelCounts {
    years: usize,
    ints: usize,
    floats: usize,
    days: usize,
    zero_leading: usize,
    na: usize,
    nominals: usize,
}

impl LabelCounts {
    fn credit(&mut self, label: TokenLabel) {
        match label {
            TokenLabel::Year => self.years += 1,
            TokenLabel::Int => self.ints += 1,
            TokenLabel::Float => self.floats += 1,
            TokenLabel::Day => self.days += 1,
            TokenLabel::ZeroLeading => self.zero_leading += 1,
            TokenLabel::Na => self.na += 1,
            TokenLabel::Nominal => self.nominals += 1,
        }
    }
}

/// Case- and whitespace-insensitive column-name match.
fn norm_eq(name: &str, options: &[&str]) -> bool {
    options
        .iter()
        .any(|option| name.trim().eq_ignore_ascii_case(option))
}

/// An ordered sequence of raw string tokens plus an optional column name,
/// awaiting classification.
#[derive(Debug, Clone)]
pub struct UntypedSeries {
    tokens: Vec<String>,
    name: Option<String>,
}

impl UntypedSeries {
    pub fn new(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            name: None,
        }
    }

    pub fn with_name(
        tokens: impl IntoIterator<Item = impl Into<String>>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            name: Some(name.into()),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Picks the single best value type for the column. Never fails: the
    /// nominal fallback matches anything.
    pub fn infer_type(&self) -> ValueType {
        self.infer_type_with(default_config())
    }

    pub fn infer_type_with(&self, config: &InferenceConfig) -> ValueType {
        let mut counts = LabelCounts::default();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut distinct: Vec<&str> = Vec::new();

        for token in &self.tokens {
            if seen.insert(token) {
                distinct.push(token);
            }
            let mut matched = false;
            for (pattern, labels) in config.patterns.rules() {
                if pattern.is_match(token) {
                    for &label in labels {
                        counts.credit(label);
                    }
                    matched = true;
                    break;
                }
            }
            if !matched {
                counts.credit(TokenLabel::Nominal);
            }
        }

        let total = self.tokens.len();
        let distinct_ratio = if total == 0 {
            1.0
        } else {
            distinct.len() as f64 / total as f64
        };
        let duplicates = total - distinct.len();
        let categorical = distinct_ratio < config.categorical_max_distinct_ratio
            && duplicates > config.categorical_min_duplicates
            && distinct.len() <= config.categorical_max_distinct;
        let nominal_type = || {
            if categorical {
                ValueType::Categorical(Arc::new(CategorySet::new(
                    distinct.iter().map(|label| label.to_string()).collect(),
                )))
            } else {
                ValueType::Nominal
            }
        };

        if counts.zero_leading > 0 {
            return nominal_type();
        }
        if counts.nominals > 0 {
            return nominal_type();
        }
        if counts.days > 0 {
            return ValueType::Day;
        }
        if counts.floats > 0 {
            if let Some(name) = self.name.as_deref() {
                if norm_eq(name, &["lat", "latitude"]) {
                    return ValueType::Latitude;
                }
                if norm_eq(name, &["lon", "longitude"]) {
                    return ValueType::Longitude;
                }
                if norm_eq(name, &["count"]) {
                    return ValueType::Count;
                }
            }
            return ValueType::Float;
        }
        if counts.years > 0 && self.name.as_deref().is_some_and(|name| norm_eq(name, &["year"])) {
            return ValueType::Year;
        }
        if counts.ints > 0 {
            return ValueType::Int;
        }
        ValueType::Nominal
    }

    /// Materializes the column as a series of `value_type`. Numeric and
    /// temporal targets map null-form tokens to `Null` and parse the rest; a
    /// token that fails the target's validity predicate aborts the column.
    /// Label-like targets take every raw token through unchanged.
    pub fn apply(&self, value_type: ValueType) -> Result<Series, SeriesError> {
        self.apply_with(default_config(), value_type)
    }

    pub fn apply_with(
        &self,
        config: &InferenceConfig,
        value_type: ValueType,
    ) -> Result<Series, SeriesError> {
        let parse_nulls = matches!(value_type.kind(), Kind::Quantitative | Kind::Temporal);
        let mut values = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            let value = if parse_nulls && config.patterns.na.is_match(token) {
                Value::Null
            } else {
                value_type.parse_token(token)?
            };
            values.push(value);
        }
        Series::with_source(values, value_type, self.clone())
    }

    /// Infer, then materialize.
    pub fn auto(&self) -> Result<Series, SeriesError> {
        self.apply(self.infer_type())
    }

    pub fn auto_with(&self, config: &InferenceConfig) -> Result<Series, SeriesError> {
        self.apply_with(config, self.infer_type_with(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_model::{approx_eq, Resolution, ValueError};

    fn patterns() -> TokenPatterns {
        TokenPatterns::default()
    }

    #[test]
    fn int_pattern() {
        let p = patterns();
        for token in ["1", "12", "-34", "0"] {
            assert!(p.int.is_match(token), "{token}");
        }
        for token in ["01", "00", "-1.2", "a", ""] {
            assert!(!p.int.is_match(token), "{token}");
        }
    }

    #[test]
    fn float_pattern() {
        let p = patterns();
        for token in ["1.", "1.2", "-34.2", "0."] {
            assert!(p.float.is_match(token), "{token}");
        }
        for token in ["01.", "00.", "1", "a", ""] {
            assert!(!p.float.is_match(token), "{token}");
        }
    }

    #[test]
    fn zero_leading_pattern() {
        let p = patterns();
        for token in ["00", "01", "00001", "012345", "01.4", "035"] {
            assert!(p.zero_leading.is_match(token), "{token}");
        }
        for token in ["0.1", "-0.1", "-00001", "12", "-23.4"] {
            assert!(!p.zero_leading.is_match(token), "{token}");
        }
    }

    #[test]
    fn na_pattern() {
        let p = patterns();
        for token in [
            "null", "NULL", ".nil", "  NoNe  ", "N/A", "n.a.", "na", "", " ", "  ", "_", " - ",
            "---", " __ ",
        ] {
            assert!(p.na.is_match(token), "{token:?}");
        }
        for token in [
            " -_ ",
            "0.1",
            "-0.1",
            "-00001",
            "12",
            "-23.4",
            "a",
            "none at all",
            "nonexistent",
            "/",
        ] {
            assert!(!p.na.is_match(token), "{token:?}");
        }
    }

    #[test]
    fn iso_day_pattern() {
        let p = patterns();
        for token in [
            "2015-10-21",
            "1999-01-11",
            "2010-12-31",
            "1000-02-01",
            " 2222-01-01 ",
            "  2010-12-31",
        ] {
            assert!(p.iso_day.is_match(token), "{token:?}");
        }
        for token in ["", "asdf", "2010", "Jan 1 2005", "2010-22-01", "2001-01-42"] {
            assert!(!p.iso_day.is_match(token), "{token:?}");
        }
    }

    #[test]
    fn infers_float() {
        let untyped = UntypedSeries::new(["2.0", "3.5", "4.7"]);
        assert!(matches!(untyped.infer_type(), ValueType::Float));
    }

    #[test]
    fn infers_int() {
        let untyped = UntypedSeries::new(["2", "3", "4"]);
        assert!(matches!(untyped.infer_type(), ValueType::Int));
    }

    #[test]
    fn infers_nominal() {
        let untyped = UntypedSeries::new(["dog", "cat", "babboon"]);
        assert!(matches!(untyped.infer_type(), ValueType::Nominal));
    }

    #[test]
    fn zip_codes_stay_nominal() {
        let untyped = UntypedSeries::new(["93924", "93940", "02138"]);
        assert!(matches!(untyped.infer_type(), ValueType::Nominal));
    }

    #[test]
    fn null_tokens_do_not_block_float_inference() {
        let untyped = UntypedSeries::new(["1", "", "2", "2.3"]);
        assert!(matches!(untyped.infer_type(), ValueType::Float));
    }

    #[test]
    fn stray_strings_force_nominal() {
        let untyped = UntypedSeries::new(["1", "", "2", "dog"]);
        assert!(matches!(untyped.infer_type(), ValueType::Nominal));
    }

    #[test]
    fn infers_iso_days() {
        let untyped = UntypedSeries::new(["2010-01-21", "1999-12-01", "1500-05-09"]);
        assert!(matches!(untyped.infer_type(), ValueType::Day));
    }

    #[test]
    fn column_name_overrides_for_floats() {
        let tokens = ["42.1", "42.2", "41.9"];
        assert!(matches!(
            UntypedSeries::with_name(tokens, " Latitude ").infer_type(),
            ValueType::Latitude
        ));
        assert!(matches!(
            UntypedSeries::with_name(tokens, "lon").infer_type(),
            ValueType::Longitude
        ));
        assert!(matches!(
            UntypedSeries::with_name(tokens, "COUNT").infer_type(),
            ValueType::Count
        ));
        assert!(matches!(
            UntypedSeries::with_name(tokens, "width").infer_type(),
            ValueType::Float
        ));
    }

    #[test]
    fn year_needs_both_tokens_and_name() {
        let tokens = ["1999", "2005", "2010"];
        assert!(matches!(
            UntypedSeries::with_name(tokens, "year").infer_type(),
            ValueType::Year
        ));
        assert!(matches!(
            UntypedSeries::with_name(tokens, "id").infer_type(),
            ValueType::Int
        ));
        assert!(matches!(UntypedSeries::new(tokens).infer_type(), ValueType::Int));
    }

    #[test]
    fn categorical_detection_needs_all_three_thresholds() {
        let mut tokens = Vec::new();
        for i in 0..600 {
            tokens.push(if i % 2 == 0 { "red" } else { "blue" });
        }
        let inferred = UntypedSeries::new(tokens).infer_type();
        match inferred {
            ValueType::Categorical(categories) => {
                assert_eq!(categories.labels(), ["red".to_string(), "blue".to_string()]);
            }
            other => panic!("expected a categorical column, got {other:?}"),
        }

        // Three distinct labels over three tokens: ratio too high.
        assert!(matches!(
            UntypedSeries::new(["red", "blue", "green"]).infer_type(),
            ValueType::Nominal
        ));
    }

    #[test]
    fn apply_maps_null_forms_for_numeric_targets() {
        let untyped = UntypedSeries::new(["1", "", "2", "2.3"]);
        let series = untyped.auto().unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.non_null_len(), 3);
        assert!(series.values()[1].is_null());
        let average = series.average().unwrap();
        assert!(approx_eq(average.as_float().unwrap(), 5.3 / 3.0));
    }

    #[test]
    fn apply_passes_raw_tokens_to_nominal_targets() {
        let untyped = UntypedSeries::new(["dog", "", "n/a"]);
        let series = untyped.auto().unwrap();
        assert_eq!(series.non_null_len(), 3);
    }

    #[test]
    fn apply_aborts_on_an_unparseable_token() {
        let untyped = UntypedSeries::new(["1", "dog"]);
        let result = untyped.apply(ValueType::Int);
        assert!(matches!(
            result,
            Err(SeriesError::Value(ValueError::Invalid { .. }))
        ));
    }

    #[test]
    fn auto_materializes_days_at_day_resolution() {
        let untyped = UntypedSeries::new(["2010-01-21", "1999-12-01", "1500-05-09"]);
        let series = untyped.auto().unwrap();
        let Some(Value::Time(t)) = series.get(0) else {
            panic!("expected a time value");
        };
        assert_eq!(t.resolution(), Resolution::Day);
        assert!(t.hour().is_err());
        assert_eq!(t.year().unwrap(), 2010);
    }

    #[test]
    fn thresholds_are_configurable() {
        let config = InferenceConfig {
            categorical_max_distinct_ratio: 0.9,
            categorical_min_duplicates: 0,
            categorical_max_distinct: 10,
            ..InferenceConfig::default()
        };
        let untyped = UntypedSeries::new(["red", "blue", "red", "red"]);
        assert!(matches!(
            untyped.infer_type_with(&config),
            ValueType::Categorical(_)
        ));
        assert!(matches!(untyped.infer_type(), ValueType::Nominal));
    }
}
