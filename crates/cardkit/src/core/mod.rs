//! Core data model: versions, data types, parameters, properties,
//! structured values, cards, and warnings.

pub mod card;
pub mod data_type;
pub mod datetime;
pub mod parameter;
pub mod property;
pub mod structured;
pub mod version;
pub mod warning;

pub use card::VCard;
pub use data_type::VCardDataType;
pub use datetime::{DateAndOrTime, UtcOffset};
pub use parameter::{Parameter, Parameters};
pub use property::{Key, PropertyKind, PropertyValue, RawValue, Telephone, TimeZone, VCardProperty};
pub use structured::{Address, Gender, GeoUri, Organization, Sex, StructuredName, TelUri};
pub use version::{VCardVersion, XCARD_NAMESPACE};
pub use warning::{ParseWarning, WarningCode, WarningLocator};
