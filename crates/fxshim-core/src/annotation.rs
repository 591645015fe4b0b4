//! Metadata attached to parameters, techniques and passes in effect source.

/// Value of a single annotation. Integer and boolean annotations may be vectors (`int2`,
/// `bool3`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    String(String),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Bool(Vec<bool>),
}

impl AnnotationValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AnnotationValue::String(_) => "string",
            AnnotationValue::Int(_) => "int",
            AnnotationValue::Float(_) => "float",
            AnnotationValue::Bool(_) => "bool",
        }
    }
}

/// Annotations in declaration order; lookups are by exact name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations(Vec<(String, AnnotationValue)>);

impl Annotations {
    pub const EMPTY: Annotations = Annotations(Vec::new());

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: AnnotationValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: AnnotationValue) {
        match self.0.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name.to_owned(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AnnotationValue> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// `Ok(None)` when absent, `Err(kind)` when present with another type.
    pub fn string(&self, name: &str) -> Result<Option<&str>, &'static str> {
        match self.get(name) {
            None => Ok(None),
            Some(AnnotationValue::String(value)) => Ok(Some(value)),
            Some(other) => Err(other.kind()),
        }
    }

    /// First component of a boolean annotation; absent or mistyped reads as `false`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(AnnotationValue::Bool(values)) if values.first() == Some(&true))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnnotationValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
