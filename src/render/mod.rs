// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTML page rendering.
//!
//! Produces a self-contained Leaflet page from a [`RenderableMap`]. Markers
//! and lines are embedded as JSON and drawn client-side; panels and the
//! sidebar are rendered here so the page is readable before the map loads.

mod template;

use std::fmt::Write;

use mesh_core::{LegendEntry, LegendSymbol, Panel, RenderableMap, UnresolvedRow};

use template::MAP_PAGE_TEMPLATE;

const PAGE_TITLE: &str = "Mesh Network Map";

/// Render `map` into a complete HTML document.
pub fn render_page(map: &RenderableMap, zoom: u8) -> Result<String, serde_json::Error> {
    // "</" would let snapshot text close the script element.
    let data = serde_json::to_string(map)?.replace("</", "<\\/");

    let mut panels = String::new();
    let mut sidebar = String::new();
    for panel in &map.panels {
        match panel {
            Panel::Legend { entries } => panels.push_str(&legend_html(entries)),
            Panel::LastUpdated { timestamp } => {
                let _ = writeln!(
                    panels,
                    r#"  <div class="panel last-updated">Last updated: {}</div>"#,
                    escape_html(timestamp)
                );
            }
            Panel::StatusReport { time, lines } => panels.push_str(&sitrep_html(time, lines)),
            Panel::Unresolved { rows } => sidebar.push_str(&sidebar_html(rows)),
        }
    }

    Ok(fill_template(
        MAP_PAGE_TEMPLATE,
        &[
            ("TITLE", PAGE_TITLE),
            ("ZOOM", &zoom.to_string()),
            ("PANELS", &panels),
            ("SIDEBAR", &sidebar),
            ("MAP_DATA", &data),
        ],
    ))
}

/// Substitute `{{NAME}}` placeholders in a single pass, so substituted text
/// is never scanned for further placeholders.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after.find("}}").and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });

        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn legend_html(entries: &[LegendEntry]) -> String {
    let mut html = String::from("  <div class=\"panel legend\">\n    <h4>Legend</h4>\n");
    for entry in entries {
        let color = escape_html(&entry.color);
        let glyph = match entry.symbol {
            LegendSymbol::Dot => format!(r#"<span class="swatch" style="background: {color}"></span>"#),
            LegendSymbol::Star => format!(r#"<span class="glyph" style="color: {color}">&#9733;</span>"#),
            LegendSymbol::Warning => format!(r#"<span class="glyph" style="color: {color}">&#9888;</span>"#),
            LegendSymbol::Line => format!(r#"<span class="line-swatch" style="background: {color}"></span>"#),
        };
        let _ = writeln!(html, "    <div>{glyph}{}</div>", escape_html(&entry.label));
    }
    html.push_str("  </div>\n");
    html
}

fn sitrep_html(time: &str, lines: &[String]) -> String {
    let body = lines
        .iter()
        .map(|line| escape_html(line))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "  <div class=\"panel sitrep\">\n    <h4>Status report ({})</h4>\n    <pre>{}</pre>\n  </div>\n",
        escape_html(time),
        body
    )
}

fn sidebar_html(rows: &[UnresolvedRow]) -> String {
    let mut html = format!(
        "  <aside id=\"sidebar\">\n    <h3>Nodes without position ({})</h3>\n",
        rows.len()
    );
    if rows.is_empty() {
        html.push_str("    <p>Every node has a position fix.</p>\n");
    } else {
        html.push_str(
            "    <table>\n      <tr><th></th><th>Node</th><th>Last heard</th><th>Hops</th><th>Connections</th></tr>\n",
        );
        for row in rows {
            let _ = writeln!(
                html,
                r#"      <tr><td><span class="swatch" style="background: {}"></span></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                escape_html(&row.color),
                escape_html(&row.id),
                escape_html(&row.last_heard),
                escape_html(&row.hops_away),
                escape_html(&row.connections)
            );
        }
        html.push_str("    </table>\n");
    }
    html.push_str("  </aside>\n");
    html
}

/// Escape text for use in HTML element content and quoted attributes.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
