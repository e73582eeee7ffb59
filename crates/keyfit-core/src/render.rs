use crate::config::GeometryConfig;
use crate::heatmap::Heatmap;

const STROKE: &str = "#aaa";
const LABEL_FILL: &str = "#222";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the heatmap as a standalone SVG document.
///
/// Labels sit on the key's horizontal centre, `key_height / 2 + 6` below its
/// top edge, so tall keys keep their label in the first row they occupy.
pub fn render_svg(heatmap: &Heatmap, cfg: &GeometryConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\">\n",
        heatmap.width, heatmap.height
    ));
    out.push_str("  <title>Key Heatmap</title>\n");

    for hk in &heatmap.keys {
        let r = hk.key.rect;
        out.push_str(&format!(
            "  <g data-code=\"{}\" data-count=\"{}\">\n",
            escape(&hk.key.code),
            hk.count
        ));
        out.push_str(&format!(
            "    <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"{}\" stroke=\"{}\"/>\n",
            r.x, r.y, r.width, r.height, cfg.corner_radius, hk.color, STROKE
        ));
        out.push_str(&format!(
            "    <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"{}\" fill=\"{}\">{}</text>\n",
            r.x + r.width / 2.0,
            r.y + cfg.key_height / 2.0 + 6.0,
            cfg.label_font_size,
            LABEL_FILL,
            escape(&hk.key.label)
        ));
        out.push_str("  </g>\n");
    }

    out.push_str("</svg>\n");
    out
}
