#![deny(unsafe_code)]
#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

//! Owned HTML element trees for stache.
//!
//! This crate provides:
//! - **Parsing**: WHATWG-compliant tokenization via html5gum, built into an
//!   owned [`Element`] tree. Comments survive parsing, which is what lets
//!   guard-encoded template tags pass through untouched.
//! - **Documents**: [`Document`] normalizes input into `head` and `body`.
//! - **Serialization**: minified markup with HTML5 escaping rules.
//! - **Selection**: [`Selector`] finds outlet elements by tag or `#id`.
//!
//! ```rust
//! use stache_html::{Document, Node};
//!
//! let doc = Document::parse("<p>Hello <!--stache:name--></p>").unwrap();
//! let p = doc.body.find("p").unwrap();
//! assert_eq!(p.children[1], Node::Comment("stache:name".to_string()));
//! assert_eq!(p.outer_html(), "<p>Hello <!--stache:name--></p>");
//! ```

mod node;
mod parser;
mod select;
mod serializer;
mod tracing_macros;

pub use node::{Element, Node};
pub use parser::{Document, HtmlError, parse_bytes, parse_fragment};
pub use select::Selector;
