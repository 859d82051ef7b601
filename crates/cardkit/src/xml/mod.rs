//! The xCard XML syntax (RFC 6351).

mod element;
mod reader;
mod writer;

pub use element::{XmlElement, XmlName, XmlNode};
pub use reader::{XCardReader, parse_fragment};
pub use writer::{XCardWriter, write_fragment};
