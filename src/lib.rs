//! Restable – resolves symbolically named, typed configuration resources.
//!
//! Resources (strings, colours, dimensions, layouts, styles, plurals, files
//! and so on) are declared per package in directories named
//! `type(-qualifier)*`. Each declaration becomes one qualifier-tagged variant
//! of a [`construct::ResName`] (`package:type/name`). A query names a
//! resource, or its numeric [`construct::ResourceId`], together with a target
//! qualifier string such as `en-rUS-land-v21`, and gets back the variant that
//! fits that configuration best.
//!
//! ## Modules
//! * [`construct`] – names, ids and the id generator.
//! * [`qualifier`] – qualifier strings parsed into comparable [`qualifier::Qualifiers`],
//!   and resource directory names. Grammar details live in `qualifier.pest`.
//! * [`matcher`] – best-match selection among variants.
//! * [`datatype`] – resource kinds, variants and typed value extraction.
//! * [`store`] – per-package variant lists ([`store::ResBundle`]).
//! * [`index`] – the bidirectional id ↔ name map.
//! * [`table`] – the [`table::ResourceTable`] query trait and the package table.
//! * [`overlay`] – merges library tables into one application table.
//! * [`routing`] – dispatches queries across namespaces.
//! * [`style`], [`plural`] – attribute bags, themes and quantity strings.
//! * [`resolver`] – reference chasing and the public query surface.
//! * [`loader`], [`fs`] – load passes over resource directories.
//! * [`cache`] – advisory binary snapshot of a table.
//! * [`config`] – settings from file and environment.
//!
//! ## Lifecycle
//! Tables are filled by one load pass, sealed, and only read afterwards.
//! Overlay tables are derived by copying sealed library tables under the
//! application's package name.
//!
//! ## Quick Start
//! ```
//! use restable::construct::ResName;
//! use restable::datatype::{ResourceKind, SourceLocation, TypedResource};
//! use restable::table::{PackageResourceTable, ResourceTable};
//!
//! let mut table = PackageResourceTable::new("com.example");
//! let source = SourceLocation::new("com.example", "values/strings.json");
//! table.add_value("string", "hello", TypedResource::text(ResourceKind::CharSequence, "Hello", "", source.clone())).unwrap();
//! table.add_value("string", "hello", TypedResource::text(ResourceKind::CharSequence, "Hallo", "de", source)).unwrap();
//! table.seal();
//!
//! let name = ResName::new("com.example", "string", "hello");
//! assert_eq!(table.get_value(&name, "de-rDE").unwrap().as_text(), Some("Hallo"));
//! assert_eq!(table.get_value(&name, "fr").unwrap().as_text(), Some("Hello"));
//! ```

pub mod cache;
pub mod config;
pub mod construct;
pub mod datatype;
pub mod error;
pub mod fs;
pub mod index;
pub mod loader;
pub mod matcher;
pub mod overlay;
pub mod plural;
pub mod qualifier;
pub mod resolver;
pub mod routing;
pub mod store;
pub mod style;
pub mod table;
