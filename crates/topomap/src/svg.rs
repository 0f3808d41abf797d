//! SVG document serializer
//!
//! Turns a [`RenderedMap`] into a standalone SVG document: one `<path>` per shape,
//! one `<text>` per label. Pure function, no I/O.

use std::fmt::Write;
use topomap_lib::RenderedMap;

/// Escape the XML special characters for element text and attribute values
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Serialize a rendered map into an SVG document string
pub fn to_svg(map: &RenderedMap) -> String {
    let mut out = String::new();

    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="datamap" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = map.width,
        h = map.height,
    );

    let _ = writeln!(
        out,
        r#"  <g class="datamaps-subunits" stroke="{}" stroke-width="{}">"#,
        xml_escape(&map.border_color),
        map.border_width,
    );
    for shape in &map.shapes {
        let _ = writeln!(
            out,
            r#"    <path class="{}" d="{}" fill="{}"/>"#,
            xml_escape(&shape.class_name),
            shape.path,
            xml_escape(&shape.fill),
        );
    }
    let _ = writeln!(out, "  </g>");

    if !map.labels.is_empty() {
        let _ = writeln!(
            out,
            r#"  <g class="labels" font-family="Verdana" font-size="10" text-anchor="middle">"#
        );
        for label in &map.labels {
            let _ = writeln!(
                out,
                r#"    <text x="{:.2}" y="{:.2}">{}</text>"#,
                label.position.x,
                label.position.y,
                xml_escape(&label.text),
            );
        }
        let _ = writeln!(out, "  </g>");
    }

    let _ = writeln!(out, "</svg>");
    out
}
