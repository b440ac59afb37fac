//! Rendering whole pages from a layout, components and routes.

use indoc::indoc;
use serde_json::json;
use stache::{CLIENT_RUNTIME, Pages, PagesError, RenderOptions, Route};
use test_log::test;

const LAYOUT: &str = indoc! {r#"
    <!DOCTYPE html>
    <html lang="en"><head><title>{{title}}</title></head><body><app-nav></app-nav><main><router-outlet></router-outlet></main></body></html>
"#};

const NAV: &str = r#"<template><nav>{{#links}}<a href="{{href}}">{{label}}</a>{{/links}}</nav></template>"#;

const HOME: &str = indoc! {r#"
    <template><h1>{{heading}}</h1></template>
    <script>module.exports = class extends HTMLElement {};</script>
"#};

fn pages() -> Pages {
    let mut pages = Pages::new(RenderOptions::default());
    pages.add_layout("index", LAYOUT).unwrap();
    pages.add_component("app-nav", NAV).unwrap();
    pages.add_component("home", HOME).unwrap();
    pages
        .add_component(
            "shell",
            r#"<template><section><div id="detail"></div></section></template>"#,
        )
        .unwrap();
    pages.add_component("detail", "<p>d</p>").unwrap();
    pages
}

#[test]
fn component_lands_in_default_outlet() {
    let html = pages().render_route(&[Route::new(1, "home")]).unwrap();
    assert_eq!(
        html,
        concat!(
            "<!DOCTYPE html><html lang=\"en\"><head><title>&lt;!--stache:title--&gt;</title></head>",
            "<body><app-nav><nav><!--stache:#links--><a href=\"&lt;!--stache:href--&gt;\">",
            "<!--stache:label--></a><!--stache:/links--></nav></app-nav>",
            "<main><router-outlet><home><h1><!--stache:heading--></h1></home></router-outlet></main>",
            "</body></html>"
        )
    );
}

#[test]
fn page_source_is_plain_mustache() {
    let source = pages().page_source(&[Route::new(1, "home")]).unwrap();
    assert_eq!(
        source,
        concat!(
            "<!DOCTYPE html><html lang=\"en\"><head><title>{{title}}</title></head>",
            "<body><app-nav><nav>{{#links}}<a href=\"{{href}}\">{{label}}</a>{{/links}}</nav></app-nav>",
            "<main><router-outlet><home><h1>{{heading}}</h1></home></router-outlet></main>",
            "</body></html>"
        )
    );
}

#[test]
fn render_page_with_data() {
    let data = json!({
        "title": "Home",
        "heading": "Welcome & hi",
        "links": [
            {"href": "/", "label": "Home"},
            {"href": "/about", "label": "About"}
        ]
    });
    let html = pages().render_page(&[Route::new(1, "home")], &data).unwrap();
    assert!(html.contains("<title>Home</title>"));
    assert!(html.contains(
        "<nav><a href=\"/\">Home</a><a href=\"/about\">About</a></nav>"
    ));
    assert!(html.contains("<h1>Welcome &amp; hi</h1>"));
}

#[test]
fn child_route_fills_parent_outlet() {
    let routes = [
        Route::new(1, "shell"),
        Route::new(2, "detail").with_outlet("#detail"),
    ];
    let html = pages().render_route(&routes).unwrap();
    assert!(html.contains(
        "<router-outlet><shell><section><div id=\"detail\"><detail><p>d</p></detail></div></section></shell></router-outlet>"
    ));
}

#[test]
fn repeated_route_ids_render_once() {
    let routes = [Route::new(1, "home"), Route::new(1, "detail")];
    let html = pages().render_route(&routes).unwrap();
    assert!(html.contains("<router-outlet><home>"));
    assert!(!html.contains("<detail>"));
}

#[test]
fn undefined_component() {
    let err = pages().render_route(&[Route::new(1, "ghost")]).unwrap_err();
    assert_eq!(
        err,
        PagesError::UndefinedComponent {
            name: "ghost".into()
        }
    );
    assert_eq!(err.to_string(), "trying to access undefined component ghost");
}

#[test]
fn missing_outlet() {
    let routes = [Route::new(1, "home").with_outlet("#nowhere")];
    assert_eq!(
        pages().render_route(&routes),
        Err(PagesError::MissingOutlet {
            outlet: "#nowhere".into(),
            component: "home".into()
        })
    );
}

#[test]
fn renders_do_not_touch_the_store() {
    let pages = pages();
    let body = pages.layout("index").unwrap().document().body.clone();
    let first = pages.render_route(&[Route::new(1, "home")]).unwrap();
    let second = pages.render_route(&[Route::new(1, "home")]).unwrap();
    assert_eq!(first, second);
    assert_eq!(pages.layout("index").unwrap().document().body, body);
    assert!(!pages.render_route(&[Route::new(1, "detail")]).unwrap().contains("<home>"));
}

#[test]
fn concurrent_renders_agree() {
    let pages = pages();
    let expected = pages.render_route(&[Route::new(1, "home")]).unwrap();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| pages.render_route(&[Route::new(1, "home")]).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn client_bundle_lists_components_by_name() {
    let bundle = pages().client_bundle().unwrap();
    assert!(bundle.starts_with(CLIENT_RUNTIME));
    assert!(bundle.ends_with("})();"));

    let nav = bundle.find("setTemplate('app-nav'").unwrap();
    let home = bundle.find("setTemplate('home'").unwrap();
    let shell = bundle.find("setTemplate('shell'").unwrap();
    assert!(nav < home && home < shell);
    assert!(bundle.contains(
        "customComponents.setTemplate('home',function($){var $$=$;return html`<h1>${$$.heading}</h1>`});"
    ));
    assert!(bundle.contains("customComponents.define('home',(function(){var module={};"));
}

#[test]
fn client_bundle_reports_bad_templates() {
    let mut pages = pages();
    pages
        .add_component("x-broken", "<template>{{#a}}</template>")
        .unwrap();
    assert!(matches!(
        pages.client_bundle(),
        Err(PagesError::Compile(_))
    ));
}
