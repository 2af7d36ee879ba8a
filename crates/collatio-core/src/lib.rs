//! Collatio core model
//!
//! Turns a TEI apparatus of textual variants into a normalized model that
//! downstream writers consume:
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────────┐     ┌──────────────────────┐
//! │  TEI XML     │────►│ Witness / Reading /      │────►│ Collation            │
//! │  (listWit,   │     │ VariationUnit records    │     │  support vectors     │
//! │   app, ...)  │     └──────────────────────────┘     │  substantive readings│
//! └──────────────┘                 ▲                    │  root frequencies    │
//!                                  │                    └──────────┬───────────┘
//!                         ┌────────┴────────┐                      │
//!                         │ CollationConfig │                      ▼
//!                         │ (suffixes, type │               collatio-export
//!                         │  policies, ...) │
//!                         └─────────────────┘
//! ```
//!
//! ## Key Concepts
//!
//! - **Support vector**: a witness's distribution over a unit's substantive
//!   readings; all-zero means no data.
//! - **Base witness**: a siglum with its configured suffixes stripped.
//! - **Intrinsic tree**: a unit's prior ordering between readings, validated
//!   as a single-rooted tree and propagated into root frequencies.

pub mod collation;
pub mod config;
pub mod dates;
pub mod error;
pub mod reading;
pub mod relations;
pub mod support;
pub mod variation_unit;
pub mod witness;
pub mod xml;

pub use collation::Collation;
pub use config::{CollationConfig, ConfigError};
pub use dates::DateRange;
pub use error::{CollationError, IntrinsicRelationsError};
pub use reading::{Reading, ReadingClass};
pub use relations::IntrinsicTree;
pub use support::{resolve_base_witness, SupportVector};
pub use variation_unit::VariationUnit;
pub use witness::Witness;
pub use xml::{XmlElement, XmlError};
