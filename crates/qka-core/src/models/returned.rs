//! Collaborator return values
//!
//! Operations hand back a [`Returned`] tree, which can hold shapes that have
//! no direct JSON counterpart (tables, series, objects with hidden or callable
//! members, opaque displayable values). The normalizer turns it into JSON.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

/// A value returned from an operation
#[derive(Clone)]
pub enum Returned {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered sequence (list or tuple)
    Seq(Vec<Returned>),
    /// Mapping; keys need not be strings
    Map(Vec<(Returned, Returned)>),
    /// Rows by named columns
    Table(Table),
    /// A single named column
    Series(Series),
    /// Object with named attributes
    Object(Object),
    /// Already JSON-safe data
    Json(Value),
    /// Anything else; normalized through its `Display` form
    Opaque(Arc<dyn fmt::Display + Send + Sync>),
}

impl Returned {
    /// Wrap any displayable value as opaque
    pub fn opaque<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Returned::Opaque(Arc::new(value))
    }

    /// Convert any serializable value.
    ///
    /// Values serde cannot represent as JSON degrade to their error text.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Returned::Json(v),
            Err(e) => Returned::Str(e.to_string()),
        }
    }

    /// Build a mapping from string keys
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Returned>,
        I: IntoIterator<Item = (K, V)>,
    {
        Returned::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Returned::Str(k.into()), v.into()))
                .collect(),
        )
    }
}

impl fmt::Debug for Returned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Returned::Null => f.write_str("Null"),
            Returned::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Returned::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Returned::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Returned::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Returned::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Returned::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Returned::Table(t) => f.debug_tuple("Table").field(t).finish(),
            Returned::Series(s) => f.debug_tuple("Series").field(s).finish(),
            Returned::Object(o) => f.debug_tuple("Object").field(o).finish(),
            Returned::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Returned::Opaque(d) => f.debug_tuple("Opaque").field(&d.to_string()).finish(),
        }
    }
}

/// Rows by named columns
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Returned>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing trailing cells read as null, extra cells are dropped.
    pub fn push_row<I, V>(&mut self, cells: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Returned>,
    {
        let mut row: Vec<Returned> = cells
            .into_iter()
            .take(self.columns.len())
            .map(Into::into)
            .collect();
        row.resize(self.columns.len(), Returned::Null);
        self.rows.push(row);
    }

    pub fn with_row<I, V>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Returned>,
    {
        self.push_row(cells);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Returned>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Extract one column as a series
    pub fn column(&self, name: &str) -> Option<Series> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(Series {
            name: Some(name.to_string()),
            values: self.rows.iter().map(|r| r[idx].clone()).collect(),
        })
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Returned>>) {
        (self.columns, self.rows)
    }
}

/// A single named column of values
#[derive(Debug, Clone, Default)]
pub struct Series {
    pub name: Option<String>,
    pub values: Vec<Returned>,
}

impl Series {
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Returned>,
    {
        Self {
            name: Some(name.into()),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// An attribute of an [`Object`]
#[derive(Debug, Clone)]
pub enum Attribute {
    Value(Returned),
    /// A callable member; never serialized
    Method,
}

/// An object exposing named attributes.
///
/// Attributes whose name starts with `_` are private and, like methods, are
/// dropped during normalization.
#[derive(Debug, Clone)]
pub struct Object {
    type_name: String,
    attributes: Vec<(String, Attribute)>,
}

impl Object {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Returned>) -> Self {
        self.attributes
            .push((name.into(), Attribute::Value(value.into())));
        self
    }

    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.attributes.push((name.into(), Attribute::Method));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn attributes(&self) -> &[(String, Attribute)] {
        &self.attributes
    }

    pub(crate) fn into_attributes(self) -> Vec<(String, Attribute)> {
        self.attributes
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} object>", self.type_name)
    }
}

impl From<()> for Returned {
    fn from(_: ()) -> Self {
        Returned::Null
    }
}

impl From<bool> for Returned {
    fn from(v: bool) -> Self {
        Returned::Bool(v)
    }
}

macro_rules! int_into_returned {
    ($($t:ty),*) => {
        $(impl From<$t> for Returned {
            fn from(v: $t) -> Self {
                Returned::Int(v as i64)
            }
        })*
    };
}

int_into_returned!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Returned {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Returned::Int(i),
            Err(_) => Returned::Json(Value::from(v)),
        }
    }
}

impl From<usize> for Returned {
    fn from(v: usize) -> Self {
        Returned::from(v as u64)
    }
}

impl From<f32> for Returned {
    fn from(v: f32) -> Self {
        Returned::Float(v as f64)
    }
}

impl From<f64> for Returned {
    fn from(v: f64) -> Self {
        Returned::Float(v)
    }
}

impl From<String> for Returned {
    fn from(v: String) -> Self {
        Returned::Str(v)
    }
}

impl From<&str> for Returned {
    fn from(v: &str) -> Self {
        Returned::Str(v.to_string())
    }
}

impl<T: Into<Returned>> From<Option<T>> for Returned {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Returned::Null)
    }
}

impl<T: Into<Returned>> From<Vec<T>> for Returned {
    fn from(v: Vec<T>) -> Self {
        Returned::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Returned>> From<BTreeMap<String, T>> for Returned {
    fn from(v: BTreeMap<String, T>) -> Self {
        Returned::map(v)
    }
}

impl<T: Into<Returned>> From<HashMap<String, T>> for Returned {
    fn from(v: HashMap<String, T>) -> Self {
        Returned::map(v)
    }
}

impl From<Table> for Returned {
    fn from(v: Table) -> Self {
        Returned::Table(v)
    }
}

impl From<Series> for Returned {
    fn from(v: Series) -> Self {
        Returned::Series(v)
    }
}

impl From<Object> for Returned {
    fn from(v: Object) -> Self {
        Returned::Object(v)
    }
}

impl From<Value> for Returned {
    fn from(v: Value) -> Self {
        Returned::Json(v)
    }
}
