//! Value formatters: convert between wire values and typed native values.
//!
//! The registry tries formatters in registration order; the first one whose
//! guard accepts both the field kind and the value wins. Values no formatter
//! claims pass through unchanged.

use std::fmt::{self, Write};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value as JsonValue;
use spine_core::{Field, FieldKind, Value};
use tracing::warn;
use url::Url;

use crate::error::{Result, SerializerError};

/// A bidirectional converter for one kind of attribute.
pub trait ValueFormatter: fmt::Debug + Send + Sync {
    /// Wire → native. Returns `None` when this formatter does not apply.
    fn unformat(&self, value: &JsonValue, field: &Field) -> Option<Value>;

    /// Native → wire. Returns `None` when this formatter does not apply.
    fn format(&self, value: &Value, field: &Field) -> Option<JsonValue>;
}

/// Ordered list of value formatters.
#[derive(Debug)]
pub struct ValueFormatterRegistry {
    formatters: Vec<Box<dyn ValueFormatter>>,
}

impl ValueFormatterRegistry {
    /// An empty registry: every value passes through unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self {
            formatters: Vec::new(),
        }
    }

    /// Registry with the built-in URL, date and boolean formatters.
    #[must_use]
    pub fn default_registry() -> Self {
        let mut registry = Self::new();
        registry.register(UrlFormatter);
        registry.register(DateFormatter);
        registry.register(BooleanFormatter);
        registry
    }

    /// Append a formatter. Earlier registrations take precedence.
    pub fn register(&mut self, formatter: impl ValueFormatter + 'static) {
        self.formatters.push(Box::new(formatter));
    }

    /// Convert a wire value into the native value for `field`.
    #[must_use]
    pub fn unformat(&self, value: &JsonValue, field: &Field) -> Value {
        self.formatters
            .iter()
            .find_map(|f| f.unformat(value, field))
            .unwrap_or_else(|| Value::Json(value.clone()))
    }

    /// Convert a native value into its wire representation for `field`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializerError::UnencodableValue`] for relationship values,
    /// which never belong in `attributes`.
    pub fn format(&self, value: &Value, field: &Field) -> Result<JsonValue> {
        if let Some(formatted) = self.formatters.iter().find_map(|f| f.format(value, field)) {
            return Ok(formatted);
        }

        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Bool(b) => Ok(JsonValue::Bool(*b)),
            Value::Date(d) => Ok(JsonValue::String(
                d.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )),
            Value::Url(u) => Ok(JsonValue::String(u.to_string())),
            Value::ToOne(_) | Value::ToMany(_) => Err(SerializerError::UnencodableValue {
                field: field.name.clone(),
            }),
        }
    }
}

impl Default for ValueFormatterRegistry {
    fn default() -> Self {
        Self::default_registry()
    }
}

/// URL ↔ string. Relative strings resolve against the field's base URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlFormatter;

impl ValueFormatter for UrlFormatter {
    fn unformat(&self, value: &JsonValue, field: &Field) -> Option<Value> {
        let FieldKind::Url { base_url } = &field.kind else {
            return None;
        };
        let raw = value.as_str()?;

        let parsed = match base_url {
            Some(base) => base.join(raw),
            None => Url::parse(raw),
        };
        match parsed {
            Ok(url) => Some(Value::Url(url)),
            Err(e) => {
                warn!(field = %field.name, value = raw, error = %e, "unparseable URL, keeping raw value");
                Some(Value::Json(value.clone()))
            }
        }
    }

    fn format(&self, value: &Value, field: &Field) -> Option<JsonValue> {
        match (&field.kind, value) {
            (FieldKind::Url { .. }, Value::Url(url)) => Some(JsonValue::String(url.to_string())),
            _ => None,
        }
    }
}

/// Date ↔ string, using the field's format or RFC 3339.
///
/// Unparseable dates deserialize to the Unix epoch with a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFormatter;

impl DateFormatter {
    fn parse(raw: &str, format: Option<&str>) -> Option<DateTime<Utc>> {
        let Some(format) = format else {
            return DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|d| d.with_timezone(&Utc));
        };

        if let Ok(d) = DateTime::parse_from_str(raw, format) {
            return Some(d.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
        NaiveDate::parse_from_str(raw, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    fn render(date: &DateTime<Utc>, format: Option<&str>, field: &Field) -> String {
        let rfc3339 = || date.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        let Some(format) = format else {
            return rfc3339();
        };

        let mut out = String::new();
        if write!(out, "{}", date.format(format)).is_err() {
            warn!(field = %field.name, format, "invalid date format, falling back to RFC 3339");
            return rfc3339();
        }
        out
    }
}

impl ValueFormatter for DateFormatter {
    fn unformat(&self, value: &JsonValue, field: &Field) -> Option<Value> {
        let FieldKind::Date { format } = &field.kind else {
            return None;
        };
        let raw = value.as_str()?;

        match Self::parse(raw, format.as_deref()) {
            Some(date) => Some(Value::Date(date)),
            None => {
                warn!(field = %field.name, value = raw, "unparseable date, using the Unix epoch");
                Some(Value::Date(DateTime::<Utc>::default()))
            }
        }
    }

    fn format(&self, value: &Value, field: &Field) -> Option<JsonValue> {
        match (&field.kind, value) {
            (FieldKind::Date { format }, Value::Date(date)) => Some(JsonValue::String(
                Self::render(date, format.as_deref(), field),
            )),
            _ => None,
        }
    }
}

/// Boolean ↔ JSON boolean. Also accepts `0`/`1` and `"true"`/`"false"` on input.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanFormatter;

impl ValueFormatter for BooleanFormatter {
    fn unformat(&self, value: &JsonValue, field: &Field) -> Option<Value> {
        if field.kind != FieldKind::Boolean {
            return None;
        }
        match value {
            JsonValue::Bool(b) => Some(Value::Bool(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            JsonValue::String(s) => match s.as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }

    fn format(&self, value: &Value, field: &Field) -> Option<JsonValue> {
        match (&field.kind, value) {
            (FieldKind::Boolean, Value::Bool(b)) => Some(JsonValue::Bool(*b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spine_core::LinkedResource;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn plain_attributes_pass_through() {
        let registry = ValueFormatterRegistry::default_registry();
        let field = Field::attribute("count");
        assert_eq!(registry.unformat(&json!(42), &field), Value::Json(json!(42)));
        assert_eq!(
            registry.format(&Value::Json(json!("x")), &field).unwrap(),
            json!("x")
        );
    }

    #[test]
    fn date_defaults_to_rfc3339() {
        let registry = ValueFormatterRegistry::default_registry();
        let field = Field::date("publishedAt");
        let native = registry.unformat(&json!("2015-03-01T12:00:00Z"), &field);
        assert_eq!(
            native.as_date(),
            Some(Utc.with_ymd_and_hms(2015, 3, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            registry.format(&native, &field).unwrap(),
            json!("2015-03-01T12:00:00Z")
        );
    }

    #[test]
    fn date_uses_custom_format() {
        let registry = ValueFormatterRegistry::default_registry();
        let field = Field::date("born").with_date_format("%Y-%m-%d");
        let native = registry.unformat(&json!("1815-12-10"), &field);
        assert_eq!(native.as_date(), Some(utc(1815, 12, 10)));
        assert_eq!(registry.format(&native, &field).unwrap(), json!("1815-12-10"));
    }

    #[test]
    fn unparseable_date_falls_back_to_epoch() {
        let registry = ValueFormatterRegistry::default_registry();
        let field = Field::date("publishedAt");
        let native = registry.unformat(&json!("not a date"), &field);
        assert_eq!(native.as_date(), Some(utc(1970, 1, 1)));
    }

    #[test]
    fn url_resolves_against_base() {
        let registry = ValueFormatterRegistry::default_registry();
        let base = Url::parse("https://example.com/api/").unwrap();
        let field = Field::url("avatar").with_base_url(base);
        let native = registry.unformat(&json!("images/1.png"), &field);
        assert_eq!(
            native.as_url().map(Url::as_str),
            Some("https://example.com/api/images/1.png")
        );
        assert_eq!(
            registry.format(&native, &field).unwrap(),
            json!("https://example.com/api/images/1.png")
        );
    }

    #[test]
    fn invalid_url_keeps_raw_value() {
        let registry = ValueFormatterRegistry::default_registry();
        let field = Field::url("avatar");
        let native = registry.unformat(&json!("not a url"), &field);
        assert_eq!(native, Value::Json(json!("not a url")));
    }

    #[test]
    fn boolean_accepts_numeric_and_string_forms() {
        let registry = ValueFormatterRegistry::default_registry();
        let field = Field::boolean("published");
        assert_eq!(registry.unformat(&json!(true), &field), Value::Bool(true));
        assert_eq!(registry.unformat(&json!(0), &field), Value::Bool(false));
        assert_eq!(registry.unformat(&json!("true"), &field), Value::Bool(true));
        assert_eq!(registry.unformat(&json!("yes"), &field), Value::Json(json!("yes")));
        assert_eq!(registry.format(&Value::Bool(false), &field).unwrap(), json!(false));
    }

    #[test]
    fn guards_check_field_kind() {
        let registry = ValueFormatterRegistry::default_registry();
        let field = Field::attribute("when");
        // a date-looking string on a plain attribute stays a string
        assert_eq!(
            registry.unformat(&json!("2015-03-01T12:00:00Z"), &field),
            Value::Json(json!("2015-03-01T12:00:00Z"))
        );
    }

    #[test]
    fn relationship_values_are_unencodable() {
        let registry = ValueFormatterRegistry::default_registry();
        let field = Field::attribute("title");
        let err = registry
            .format(&Value::ToOne(LinkedResource::default()), &field)
            .unwrap_err();
        assert!(matches!(err, SerializerError::UnencodableValue { .. }));
    }

    #[derive(Debug)]
    struct UppercaseFormatter;

    impl ValueFormatter for UppercaseFormatter {
        fn unformat(&self, value: &JsonValue, field: &Field) -> Option<Value> {
            if field.name != "code" {
                return None;
            }
            value.as_str().map(|s| Value::from(s.to_uppercase()))
        }

        fn format(&self, _value: &Value, _field: &Field) -> Option<JsonValue> {
            None
        }
    }

    #[test]
    fn custom_formatters_run_in_registration_order() {
        let mut registry = ValueFormatterRegistry::new();
        registry.register(UppercaseFormatter);
        registry.register(BooleanFormatter);
        assert_eq!(
            registry.unformat(&json!("abc"), &Field::attribute("code")),
            Value::from("ABC")
        );
        assert_eq!(
            registry.unformat(&json!("abc"), &Field::attribute("other")),
            Value::from("abc")
        );
    }
}
