//! Non-fatal parse warnings.

use std::fmt;

/// Where in the input a warning originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningLocator {
    /// Logical line number of the textual input (1-based).
    Line(usize),
    /// Element name within an xCard document.
    Element(String),
    /// No usable location.
    Unknown,
}

/// A recoverable issue encountered while reading.
///
/// Warnings never suppress a card; they describe properties that were
/// dropped, demoted to raw, or otherwise adjusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// Where the issue occurred.
    pub locator: WarningLocator,
    /// Stable numeric code for the warning class.
    pub code: WarningCode,
    /// Human-readable description.
    pub message: String,
}

impl ParseWarning {
    /// Creates a warning at a textual line.
    #[must_use]
    pub fn at_line(line: usize, code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            locator: WarningLocator::Line(line),
            code,
            message: message.into(),
        }
    }

    /// Creates a warning at an xCard element.
    #[must_use]
    pub fn at_element(element: impl Into<String>, code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            locator: WarningLocator::Element(element.into()),
            code,
            message: message.into(),
        }
    }

    /// Creates a warning with no location.
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            locator: WarningLocator::Unknown,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locator {
            WarningLocator::Line(line) => {
                write!(f, "line {line}: ({}) {}", self.code as u16, self.message)
            }
            WarningLocator::Element(name) => {
                write!(f, "<{name}>: ({}) {}", self.code as u16, self.message)
            }
            WarningLocator::Unknown => write!(f, "({}) {}", self.code as u16, self.message),
        }
    }
}

/// Warning classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum WarningCode {
    /// A record carried no VERSION property; 2.1 was assumed.
    MissingVersion = 1,
    /// A VERSION property held an unrecognized value.
    UnrecognizedVersion = 2,
    /// A scribe asked for the property to be dropped.
    PropertySkipped = 3,
    /// A scribe could not interpret the value; demoted to raw.
    PropertyDemoted = 4,
    /// A content line could not be parsed and was dropped.
    MalformedLine = 5,
    /// A property appeared outside any record and was ignored.
    PropertyOutsideCard = 6,
    /// An END line did not match an open record.
    UnmatchedEnd = 7,
    /// Quoted-printable data could not be decoded cleanly.
    QuotedPrintableError = 8,
    /// An embedded AGENT record was captured as a raw property.
    EmbeddedCard = 9,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_locator_and_code() {
        let warning = ParseWarning::at_line(12, WarningCode::PropertyDemoted, "bad GEO");
        assert_eq!(warning.to_string(), "line 12: (4) bad GEO");

        let warning = ParseWarning::at_element("tel", WarningCode::PropertySkipped, "skipped");
        assert_eq!(warning.to_string(), "<tel>: (3) skipped");
    }
}
