//! Property parameters.

use super::data_type::VCardDataType;

/// A single parameter: a name with one or more values.
///
/// Names are normalized to uppercase; values are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name (normalized to uppercase).
    pub name: String,
    /// Parameter values, in order of appearance.
    pub values: Vec<String>,
}

impl Parameter {
    /// Creates a parameter with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values: vec![value.into()],
        }
    }

    /// Creates a parameter with multiple values.
    #[must_use]
    pub fn multi(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    /// Returns the first value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Returns whether the parameter holds the value (case-insensitive).
    #[must_use]
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.eq_ignore_ascii_case(value))
    }
}

/// An ordered multimap of parameters.
///
/// Keys compare case-insensitively; insertion order is preserved both
/// across keys and within the value list of each key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<Parameter>,
}

impl Parameters {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether no parameters are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of distinct parameter entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates the parameter entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    /// Appends a value to the named parameter, creating it if absent.
    pub fn put(&mut self, name: &str, value: impl Into<String>) {
        let upper = name.to_ascii_uppercase();
        if let Some(entry) = self.entries.iter_mut().find(|p| p.name == upper) {
            entry.values.push(value.into());
        } else {
            self.entries.push(Parameter {
                name: upper,
                values: vec![value.into()],
            });
        }
    }

    /// Appends a whole parameter entry, merging into an existing key.
    pub fn push(&mut self, param: Parameter) {
        if let Some(entry) = self.entries.iter_mut().find(|p| p.name == param.name) {
            entry.values.extend(param.values);
        } else {
            self.entries.push(param);
        }
    }

    /// Replaces all values of the named parameter with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.remove(name);
        self.put(name, value);
    }

    /// Removes the named parameter, returning its values if present.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let pos = self
            .entries
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(pos).values)
    }

    /// Returns the named parameter entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.entries
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the first value of the named parameter.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Parameter::value)
    }

    /// Returns all values of the named parameter.
    pub fn values(&self, name: &str) -> impl Iterator<Item = &str> {
        self.get(name)
            .into_iter()
            .flat_map(|p| p.values.iter().map(String::as_str))
    }

    // --- Typed convenience reads ---

    /// The VALUE parameter as a data type, if declared.
    #[must_use]
    pub fn value_type(&self) -> Option<VCardDataType> {
        self.first("VALUE").map(VCardDataType::get)
    }

    /// The ENCODING parameter (2.1/3.0), if declared.
    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        self.first("ENCODING")
    }

    /// Returns whether ENCODING=QUOTED-PRINTABLE is declared.
    #[must_use]
    pub fn is_quoted_printable(&self) -> bool {
        self.encoding()
            .is_some_and(|e| e.eq_ignore_ascii_case("QUOTED-PRINTABLE"))
    }

    /// The TYPE parameter values.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.values("TYPE")
    }

    /// The LABEL parameter (4.0 formatted address text), if declared.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.first("LABEL")
    }

    /// The LANGUAGE parameter, if declared.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.first("LANGUAGE")
    }

    /// The PREF parameter (1-100, lower is preferred), if parseable.
    #[must_use]
    pub fn pref(&self) -> Option<u8> {
        self.first("PREF").and_then(|v| v.parse().ok())
    }
}

impl FromIterator<Parameter> for Parameters {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        let mut params = Self::new();
        for param in iter {
            params.push(param);
        }
        params
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
