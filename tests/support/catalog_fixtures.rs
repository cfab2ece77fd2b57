//! Builders for a mocked chart catalog: folder pages, leaf pages and print views.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chartfetch_core::{PipelineConfig, Preset, SectionSelection};
use image::{ImageFormat, Rgb, RgbImage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Index page route served by [`pipeline_config`].
pub const INDEX_ROUTE: &str = "/chapter/index.html";

/// Folder link as rendered on index and section pages.
pub fn folder_link(href: &str, name: &str) -> String {
    format!(
        r#"<li><a class="folder-link" href="{href}"><span class="folder-name" lang="de">Ordner</span><span class="folder-name" lang="en">{name}</span></a></li>"#
    )
}

/// Document item as rendered on leaf pages, linking `../pages/<id>.html`.
pub fn document_item(id: &str, name: &str) -> String {
    format!(
        r#"<li class="document-item"><a href="../pages/{id}.html"><span lang="de">Dokument</span><span lang="en">{name}</span></a></li>"#
    )
}

/// Wraps list items into a page.
pub fn page(items: &[String]) -> String {
    format!("<html><body><ul>{}</ul></body></html>", items.concat())
}

/// A solid-colour PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("encode fixture png");
    png
}

/// Print view embedding `png` as an inline data URI.
pub fn print_page(png: &[u8]) -> String {
    format!(
        r#"<html><body><div class="d-print-block"><img src="data:image/png;base64,{}"></div></body></html>"#,
        STANDARD.encode(png)
    )
}

pub async fn serve_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn serve_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serves the print view of document `id` under `/print/AD/`.
pub async fn serve_chart(server: &MockServer, id: &str, width: u32, height: u32) {
    serve_chart_delayed(server, id, width, height, Duration::ZERO).await;
}

pub async fn serve_chart_delayed(
    server: &MockServer,
    id: &str,
    width: u32,
    height: u32,
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path(format!("/print/AD/{id}.html")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(print_page(&png_bytes(width, height)))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Preset settings re-pointed at the mock server, with retries off.
pub fn pipeline_config(server: &MockServer, output_dir: &Path, preset: Preset) -> PipelineConfig {
    let mut config = PipelineConfig::from_preset(preset);
    config.base_url = format!("{}/chapter", server.uri());
    config.index_page_id = "index.html".to_string();
    config.print_url_base = format!("{}/print/AD", server.uri());
    config.section_selection = SectionSelection::SkipPrefix(0);
    config.output_dir = output_dir.to_path_buf();
    config.max_attempts = 1;
    config
}

/// Occurrences of `needle` in `haystack`, by byte offset.
pub fn find_all(haystack: &[u8], needle: &str) -> Vec<usize> {
    let needle = needle.as_bytes();
    haystack
        .windows(needle.len())
        .enumerate()
        .filter_map(|(offset, window)| (window == needle).then_some(offset))
        .collect()
}
