//! # Marketlens Extractor
//!
//! Turns irregular financial HTML (screener company pages, market-movers listings, news
//! pages) into labeled sections and typed records.
//!
//! ## Architecture
//!
//! ```text
//! RawDocument
//!     │
//!     ├──> Extractor (SectionSpec list → CSS selectors)
//!     │    ├─> tables: header row, unit folding, S.No. removal, row acceptance
//!     │    ├─> movers: last table + layout detected from the source URL
//!     │    └─> text blocks, bullet lists, ratio lists, headlines
//!     │
//!     └──> RecordBuilder
//!          ├─> normalize (currency, encoding, percent, titlecase)
//!          └─> Record[] + ParseIssue[]
//! ```
//!
//! A section that is absent is not an error: it is listed in [`DocumentExtract::missing`].
//! A value that could not be parsed is defaulted and reported as a
//! [`ParseIssue`](marketlens_protocol::ParseIssue).
//!
//! ## Example
//!
//! ```rust
//! use marketlens_extractor::{Extractor, RawDocument, RecordBuilder, SectionSpec};
//!
//! let extractor = Extractor::new(SectionSpec::market_movers()).unwrap();
//! let doc = RawDocument::new(
//!     "https://example.test/nse-gainers",
//!     "<table><tr><td>Acme</td><td>11</td><td>10</td><td>10.8</td><td>10</td><td>0.8</td><td>8.0%</td></tr></table>",
//! );
//! let set = RecordBuilder::build(&extractor.extract(&doc));
//! assert_eq!(set.records[0].sort_key, Some(8.0));
//! ```

mod error;
mod extract;
mod layout;
pub mod normalize;
mod records;
mod spec;
mod types;

pub use error::{ExtractError, Result};
pub use extract::{last_table, Extractor};
pub use layout::MoverLayout;
pub use records::{RecordBuilder, RecordSet};
pub use spec::{SectionKind, SectionSpec};
pub use types::{
    DocumentExtract, ExtractedTable, Link, RawDocument, Section, SectionContent, TableRow,
    PLACEHOLDER_CELL,
};
