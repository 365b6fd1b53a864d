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

//! Embedded page template.
//!
//! Placeholders are `{{NAME}}` tokens substituted by the renderer.

pub const MAP_PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">

<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" crossorigin="" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js" crossorigin=""></script>
  <style>
    html, body { height: 100%; margin: 0; font-family: system-ui, sans-serif; }
    body { display: flex; }
    #map { flex: 1; height: 100%; }
    #sidebar { width: 340px; height: 100%; overflow-y: auto; background: #f8fafc; border-left: 1px solid #cbd5e1; padding: 0 12px; box-sizing: border-box; }
    #sidebar table { width: 100%; border-collapse: collapse; font-size: 13px; }
    #sidebar th, #sidebar td { text-align: left; padding: 4px; border-bottom: 1px solid #e2e8f0; vertical-align: top; }
    .panel { position: absolute; z-index: 1000; background: rgba(255, 255, 255, 0.92); border-radius: 6px; padding: 8px 12px; box-shadow: 0 1px 6px rgba(0, 0, 0, 0.3); font-size: 13px; }
    .panel h4 { margin: 0 0 6px 0; }
    .legend { bottom: 30px; left: 10px; }
    .last-updated { top: 10px; left: 60px; }
    .sitrep { top: 10px; right: 350px; max-width: 420px; max-height: 40%; overflow-y: auto; }
    .sitrep pre { margin: 0; white-space: pre-wrap; font-size: 12px; }
    .swatch { display: inline-block; width: 12px; height: 12px; border-radius: 50%; margin-right: 6px; vertical-align: middle; border: 1px solid #334155; }
    .star-marker { font-size: 28px; line-height: 28px; text-align: center; text-shadow: 0 0 3px #000; }
    .warning-marker { font-size: 22px; line-height: 22px; text-align: center; text-shadow: 0 0 2px #000; }
    .glyph { display: inline-block; width: 14px; margin-right: 4px; text-align: center; }
    .line-swatch { display: inline-block; width: 14px; height: 3px; margin-right: 4px; vertical-align: middle; }
  </style>
</head>

<body>
  <div id="map"></div>
{{PANELS}}
{{SIDEBAR}}
  <script>
    const mesh = {{MAP_DATA}};

    function escapeHtml(text) {
      return String(text)
        .replace(/&/g, "&amp;")
        .replace(/</g, "&lt;")
        .replace(/>/g, "&gt;")
        .replace(/"/g, "&quot;")
        .replace(/'/g, "&#39;");
    }

    const map = L.map("map").setView([mesh.center_lat, mesh.center_lon], {{ZOOM}});
    L.tileLayer("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png", {
      maxZoom: 19,
      attribution: "&copy; OpenStreetMap contributors",
    }).addTo(map);

    for (const marker of mesh.markers) {
      const popup = marker.popup.map(escapeHtml).join("<br>");
      let layer;
      if (marker.icon === "star") {
        layer = L.marker([marker.lat, marker.lon], {
          icon: L.divIcon({
            className: "star-marker",
            html: `<span style="color: ${escapeHtml(marker.color)}">&#9733;</span>`,
            iconSize: [28, 28],
            iconAnchor: [14, 14],
          }),
          zIndexOffset: 1000,
        });
      } else if (marker.icon === "warning") {
        layer = L.marker([marker.lat, marker.lon], {
          icon: L.divIcon({
            className: "warning-marker",
            html: `<span style="color: ${escapeHtml(marker.color)}">&#9888;</span>`,
            iconSize: [22, 22],
            iconAnchor: [11, 11],
          }),
        });
      } else {
        layer = L.circleMarker([marker.lat, marker.lon], {
          radius: 8,
          color: marker.color,
          fillColor: marker.color,
          fillOpacity: 0.85,
        });
      }
      layer.bindPopup(popup).addTo(map);
    }

    for (const line of mesh.lines) {
      L.polyline([line.from, line.to], { color: line.color, weight: 2, opacity: 0.8 }).addTo(map);
    }
  </script>
</body>

</html>
"#;
