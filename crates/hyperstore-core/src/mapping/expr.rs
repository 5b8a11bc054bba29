//! Compiled mapping expressions
//!
//! A leaf is either a quoted literal (`"text"`) or a column reference, both
//! with an optional `::cast` suffix. Templates nest leaves inside objects
//! and arrays; any non-string JSON value inside a template is copied as is.

use crate::error::{Error, Result};
use crate::reader::Header;
use serde_json::{Map, Number, Value};

/// Where a row comes from, for error reporting
#[derive(Debug, Clone, Copy)]
pub(crate) struct Site<'a> {
    pub file: &'a str,
    pub line: usize,
}

/// Typecast applied to a leaf value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl Cast {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }

    /// Convert a raw cell. `None` when the text does not parse.
    pub fn apply(&self, raw: &str) -> Option<Value> {
        match self {
            Self::String => Some(Value::String(raw.to_string())),
            Self::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            Self::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
            Self::Boolean => Some(Value::Bool(matches!(raw, "T" | "true" | "1" | "True"))),
            Self::Null => Some(Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Source {
    Literal(String),
    Column(usize),
}

/// A single literal or column reference
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    source: Source,
    cast: Option<Cast>,
}

impl Leaf {
    /// Parse and check a leaf against the file header
    pub(crate) fn compile(text: &str, header: &Header, file: &str, context: &str) -> Result<Self> {
        let (source, cast) = if let Some(quoted) = text.strip_prefix('"') {
            let (literal, rest) = match quoted.rfind('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            };
            let cast = rest.strip_prefix("::");
            (Source::Literal(literal.to_string()), cast)
        } else {
            let (name, cast) = match text.split_once("::") {
                Some((name, cast)) => (name, Some(cast)),
                None => (text, None),
            };
            let index = header.position(name).ok_or_else(|| {
                let err = Error::MissingColumn {
                    column: name.to_string(),
                    context: context.to_string(),
                    file: file.to_string(),
                };
                tracing::error!("{}", err);
                err
            })?;
            (Source::Column(index), cast)
        };

        let cast = match cast {
            None => None,
            Some(name) => Some(Cast::parse(name).ok_or_else(|| Error::UnknownCast {
                column: text.to_string(),
                cast: name.to_string(),
                file: file.to_string(),
            })?),
        };

        Ok(Self { source, cast })
    }

    pub(crate) fn eval(&self, row: &[String], site: Site<'_>) -> Result<Value> {
        let raw = match &self.source {
            Source::Literal(text) => text.as_str(),
            Source::Column(index) => row.get(*index).map(String::as_str).unwrap_or(""),
        };
        match self.cast {
            None => Ok(Value::String(raw.to_string())),
            Some(cast) => cast.apply(raw).ok_or_else(|| Error::BadCast {
                file: site.file.to_string(),
                line: site.line,
                value: raw.to_string(),
                cast: cast.as_str().to_string(),
            }),
        }
    }
}

/// Leaves whose rendered values are concatenated into one string
#[derive(Debug, Clone, PartialEq)]
pub struct KeyExpr(Vec<Leaf>);

impl KeyExpr {
    pub(crate) fn compile(expr: &Value, header: &Header, file: &str, context: &str) -> Result<Self> {
        let leaves = match expr {
            Value::String(text) => vec![Leaf::compile(text, header, file, context)?],
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| match item {
                    Value::String(text) => Leaf::compile(text, header, file, context),
                    other => Err(Error::Config(format!(
                        "Expression {} {} in file {} must be a string",
                        other, context, file
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(Error::Config(format!(
                    "Expression {} {} in file {} must be a string or a list of strings",
                    other, context, file
                )))
            }
        };
        Ok(Self(leaves))
    }

    pub(crate) fn eval(&self, row: &[String], site: Site<'_>) -> Result<String> {
        let mut out = String::new();
        for leaf in &self.0 {
            out.push_str(&render(&leaf.eval(row, site)?));
        }
        Ok(out)
    }
}

/// Nested payload template
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    Object(Vec<(Leaf, Template)>),
    Array(Vec<Template>),
    Leaf(Leaf),
    Value(Value),
}

impl Template {
    pub(crate) fn compile(def: &Value, header: &Header, file: &str, context: &str) -> Result<Self> {
        Ok(match def {
            Value::Object(fields) => Self::Object(
                fields
                    .iter()
                    .map(|(key, value)| {
                        Ok((
                            Leaf::compile(key, header, file, context)?,
                            Self::compile(value, header, file, context)?,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Array(items) => Self::Array(
                items
                    .iter()
                    .map(|item| Self::compile(item, header, file, context))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::String(text) => Self::Leaf(Leaf::compile(text, header, file, context)?),
            other => Self::Value(other.clone()),
        })
    }

    /// Evaluate against a row without a skeleton
    pub(crate) fn eval(&self, row: &[String], site: Site<'_>) -> Result<Value> {
        self.fill(row, Value::Null, site)
    }

    /// Evaluate against a row, merging into `skeleton`. Objects merge key by
    /// key, arrays append, leaves and plain values replace.
    pub(crate) fn fill(&self, row: &[String], skeleton: Value, site: Site<'_>) -> Result<Value> {
        match self {
            Self::Object(fields) => {
                let mut target = match skeleton {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                for (key, value) in fields {
                    let key = render(&key.eval(row, site)?);
                    let previous = target
                        .get_mut(&key)
                        .map(Value::take)
                        .unwrap_or_else(|| Value::Object(Map::new()));
                    let filled = value.fill(row, previous, site)?;
                    target.insert(key, filled);
                }
                Ok(Value::Object(target))
            }
            Self::Array(items) => {
                let mut target = match skeleton {
                    Value::Array(items) => items,
                    _ => Vec::new(),
                };
                for item in items {
                    target.push(item.eval(row, site)?);
                }
                Ok(Value::Array(target))
            }
            Self::Leaf(leaf) => leaf.eval(row, site),
            Self::Value(value) => Ok(value.clone()),
        }
    }
}

/// All pairs must evaluate equal for the condition to hold
#[derive(Debug, Clone, PartialEq)]
pub struct Condition(Vec<(Leaf, Template)>);

impl Condition {
    pub(crate) fn compile(
        def: &Map<String, Value>,
        header: &Header,
        file: &str,
        context: &str,
    ) -> Result<Self> {
        def.iter()
            .map(|(key, value)| {
                Ok((
                    Leaf::compile(key, header, file, context)?,
                    Template::compile(value, header, file, context)?,
                ))
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub(crate) fn holds(&self, row: &[String], site: Site<'_>) -> Result<bool> {
        for (left, right) in &self.0 {
            if !loosely_equal(&left.eval(row, site)?, &right.eval(row, site)?) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// True when any of the conditions holds
pub(crate) fn any_holds(conditions: &[Condition], row: &[String], site: Site<'_>) -> Result<bool> {
    for condition in conditions {
        if condition.holds(row, site)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Cell text compared with a non-string scalar uses the scalar's rendering,
/// so `col: 3` in a manifest matches a cell holding `3`
pub(crate) fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(s), other @ (Value::Number(_) | Value::Bool(_)))
        | (other @ (Value::Number(_) | Value::Bool(_)), Value::String(s)) => {
            *s == other.to_string()
        }
        _ => left == right,
    }
}

/// String form of an evaluated value, used for keys and separators
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header() -> Header {
        Header::new(vec!["id".into(), "symbol".into(), "score".into(), "flag".into()])
    }

    fn row() -> Vec<String> {
        vec!["7".into(), "BRCA1".into(), "0.5".into(), "T".into()]
    }

    const SITE: Site<'static> = Site {
        file: "genes.tsv",
        line: 2,
    };

    #[test]
    fn test_leaf_literal_and_column() {
        let h = header();
        let lit = Leaf::compile("\"gene\"", &h, "genes.tsv", "ctx").unwrap();
        assert_eq!(lit.source, Source::Literal("gene".into()));
        assert_eq!(lit.eval(&row(), SITE).unwrap(), json!("gene"));

        let col = Leaf::compile("symbol", &h, "genes.tsv", "ctx").unwrap();
        assert_eq!(col.source, Source::Column(1));
        assert_eq!(col.eval(&row(), SITE).unwrap(), json!("BRCA1"));
    }

    #[test]
    fn test_leaf_casts() {
        let h = header();
        let eval = |text: &str| {
            Leaf::compile(text, &h, "genes.tsv", "ctx")
                .unwrap()
                .eval(&row(), SITE)
                .unwrap()
        };
        assert_eq!(eval("id::integer"), json!(7));
        assert_eq!(eval("score::number"), json!(0.5));
        assert_eq!(eval("flag::boolean"), json!(true));
        assert_eq!(eval("symbol::boolean"), json!(false));
        assert_eq!(eval("symbol::null"), Value::Null);
        assert_eq!(eval("\"3\"::integer"), json!(3));
    }

    #[test]
    fn test_bad_cast_is_a_data_error() {
        let h = header();
        let leaf = Leaf::compile("symbol::number", &h, "genes.tsv", "ctx").unwrap();
        let err = leaf.eval(&row(), SITE).unwrap_err();
        assert!(matches!(err, Error::BadCast { line: 2, .. }));
    }

    #[test]
    fn test_unknown_column_and_cast() {
        let h = header();
        let err = Leaf::compile("missing", &h, "genes.tsv", "to be used as key").unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
        assert!(err.to_string().contains("to be used as key"));

        let err = Leaf::compile("id::float", &h, "genes.tsv", "ctx").unwrap_err();
        assert!(matches!(err, Error::UnknownCast { .. }));
    }

    #[test]
    fn test_key_expr_concatenates() {
        let h = header();
        let key = KeyExpr::compile(&json!(["\"gene:\"", "symbol", "\"-\"", "id"]), &h, "f", "ctx")
            .unwrap();
        assert_eq!(key.eval(&row(), SITE).unwrap(), "gene:BRCA1-7");
    }

    #[test]
    fn test_template_merges_into_skeleton() {
        let h = header();
        let template = Template::compile(
            &json!({
                "\"name\"": "symbol",
                "\"stats\"": {"\"score\"": "score::number"},
                "\"tags\"": ["\"curated\"", "symbol"],
                "\"version\"": 2
            }),
            &h,
            "genes.tsv",
            "ctx",
        )
        .unwrap();

        let skeleton = json!({"_id": "7", "stats": {"rank": 1}, "tags": ["seed"]});
        let out = template.fill(&row(), skeleton, SITE).unwrap();
        assert_eq!(
            out,
            json!({
                "_id": "7",
                "name": "BRCA1",
                "stats": {"rank": 1, "score": 0.5},
                "tags": ["seed", "curated", "BRCA1"],
                "version": 2
            })
        );
    }

    #[test]
    fn test_column_as_object_key() {
        let h = header();
        let template = Template::compile(&json!({"symbol": "id"}), &h, "f", "ctx").unwrap();
        assert_eq!(template.eval(&row(), SITE).unwrap(), json!({"BRCA1": "7"}));
    }

    #[test]
    fn test_condition() {
        let h = header();
        let mut def = Map::new();
        def.insert("symbol".into(), json!("\"BRCA1\""));
        def.insert("id".into(), json!(7));
        let condition = Condition::compile(&def, &h, "f", "ctx").unwrap();
        assert!(condition.holds(&row(), SITE).unwrap());

        let mut other = row();
        other[0] = "8".into();
        assert!(!condition.holds(&other, SITE).unwrap());
    }
}
