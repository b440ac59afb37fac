#![deny(unsafe_code)]
#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

//! HTML component templates with mustache tags.
//!
//! A component is an HTML file holding a `<template>` and an optional
//! `<script>`. A layout is a whole HTML document with router outlets.
//! This crate turns both into:
//!
//! - **Pages**: layouts with every custom element expanded into its
//!   component markup and each route's component placed in its outlet.
//!   See [`Pages::render_route`].
//! - **Client templates**: every component compiled into a JavaScript
//!   tagged template literal. See [`Pages::client_bundle`].
//! - **Server renders**: assembled pages evaluated against JSON data.
//!   See [`Pages::render_page`].
//!
//! Mustache tags are not markup, so sources pass through the [`guard`]
//! codec before they reach the HTML parser.
//!
//! ```rust
//! use serde_json::json;
//! use stache::{Pages, RenderOptions, Route};
//!
//! let mut pages = Pages::new(RenderOptions::default());
//! pages
//!     .add_layout("index", "<body><router-outlet></router-outlet></body>")
//!     .unwrap();
//! pages
//!     .add_component("hello-page", "<template><h1>Hi {{name}}</h1></template>")
//!     .unwrap();
//!
//! let routes = [Route::new(0, "hello-page")];
//! let html = pages.render_page(&routes, &json!({"name": "Ann"})).unwrap();
//! assert!(html.contains("<hello-page><h1>Hi Ann</h1></hello-page>"));
//! ```

mod assemble;
pub mod compiler;
mod component;
pub mod guard;
mod options;
mod pages;
mod render;
mod tracing_macros;

pub use assemble::{AssembleError, Components, assemble, assemble_component};
pub use compiler::{CompileError, Grammar, compile};
pub use component::{Component, Layout};
pub use options::RenderOptions;
pub use pages::{CLIENT_RUNTIME, EntryKind, Pages, PagesError, Route};
pub use render::render;
