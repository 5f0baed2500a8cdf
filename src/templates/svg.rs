use super::helpers::escape_xml;
use crate::models::LogoAlignment;

/// Text anchoring for `<text>` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSpec<'a> {
    pub x: f64,
    pub y: f64,
    pub content: &'a str,
    pub font_family: &'a str,
    pub font_size: f64,
    pub color: &'a str,
    pub bold: bool,
    pub italic: bool,
    pub anchor: TextAnchor,
}

/// Incremental builder for the SVG visual tree of one certificate.
pub struct SvgBuilder {
    width: u32,
    height: u32,
    sections: Vec<String>,
}

impl SvgBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        SvgBuilder {
            width,
            height,
            sections: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn add_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, stroke: Option<(&str, f64)>) -> &mut Self {
        let stroke = stroke
            .map(|(color, width)| format!(r#" stroke="{}" stroke-width="{}""#, escape_xml(color), width))
            .unwrap_or_default();
        self.sections.push(format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"{}/>"#,
            x,
            y,
            w,
            h,
            escape_xml(fill),
            stroke
        ));
        self
    }

    pub fn add_text(&mut self, spec: &TextSpec<'_>) -> &mut Self {
        self.sections.push(text_element(spec));
        self
    }

    /// Draws an image scaled into the box; `preserve` is an SVG `preserveAspectRatio` value.
    pub fn add_image(&mut self, href: &str, x: f64, y: f64, w: f64, h: f64, preserve: &str, opacity: f64) -> &mut Self {
        self.sections.push(image_element(href, x, y, w, h, preserve, opacity));
        self
    }

    pub fn add_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64, dashed: bool) -> &mut Self {
        self.sections.push(line_element(x1, y1, x2, y2, stroke, width, dashed));
        self
    }

    /// Wraps already-built markup in a group carrying the given attributes.
    pub fn add_group(&mut self, attributes: &[(&str, String)], children: Vec<String>) -> &mut Self {
        let attrs: String = attributes
            .iter()
            .map(|(name, value)| format!(r#" {}="{}""#, name, escape_xml(value)))
            .collect();
        self.sections.push(format!("<g{}>{}</g>", attrs, children.join("")));
        self
    }

    pub fn add_raw(&mut self, markup: &str) -> &mut Self {
        self.sections.push(markup.to_string());
        self
    }

    pub fn build(&self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" id="certificate-root">{body}</svg>"#,
            w = self.width,
            h = self.height,
            body = self.sections.join("")
        )
    }
}

pub fn text_element(spec: &TextSpec<'_>) -> String {
    format!(
        r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" fill="{}" text-anchor="{}" dominant-baseline="middle"{}{}>{}</text>"#,
        spec.x,
        spec.y,
        escape_xml(spec.font_family),
        spec.font_size,
        escape_xml(spec.color),
        spec.anchor.as_str(),
        if spec.bold { r#" font-weight="bold""# } else { "" },
        if spec.italic { r#" font-style="italic""# } else { "" },
        escape_xml(spec.content)
    )
}

pub fn line_element(x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64, dashed: bool) -> String {
    let dash = if dashed { r#" stroke-dasharray="6 4""# } else { "" };
    format!(
        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{}"{}/>"#,
        x1,
        y1,
        x2,
        y2,
        escape_xml(stroke),
        width,
        dash
    )
}

pub fn image_element(href: &str, x: f64, y: f64, w: f64, h: f64, preserve: &str, opacity: f64) -> String {
    let opacity = if opacity < 1.0 {
        format!(r#" opacity="{:.3}""#, opacity)
    } else {
        String::new()
    };
    format!(
        r#"<image x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" preserveAspectRatio="{}" href="{}" xlink:href="{}"{}/>"#,
        x,
        y,
        w,
        h,
        preserve,
        escape_xml(href),
        escape_xml(href),
        opacity
    )
}

/// Places a row of logo boxes; the anchor is the row's left edge, centre
/// or right edge depending on the alignment. Returns (href, x, y, w, h).
pub fn logo_row_at(
    sources: &[&str],
    alignment: LogoAlignment,
    anchor_x: f64,
    top_y: f64,
    height: f64,
) -> Vec<(String, f64, f64, f64, f64)> {
    if sources.is_empty() {
        return Vec::new();
    }

    let width = height * 1.4;
    let gap = height * 0.25;
    let count = sources.len() as f64;
    let total = count * width + (count - 1.0) * gap;
    let start = match alignment {
        LogoAlignment::Left => anchor_x,
        LogoAlignment::Center => anchor_x - total / 2.0,
        LogoAlignment::Right => anchor_x - total,
    };

    sources
        .iter()
        .enumerate()
        .map(|(i, src)| {
            let x = start + i as f64 * (width + gap);
            (src.to_string(), x, top_y, width, height)
        })
        .collect()
}

/// Logo row across the full canvas width, kept `margin` away from the edges.
pub fn logo_row(
    sources: &[&str],
    alignment: LogoAlignment,
    canvas_width: f64,
    top_y: f64,
    height: f64,
    margin: f64,
) -> Vec<(String, f64, f64, f64, f64)> {
    let anchor = match alignment {
        LogoAlignment::Left => margin,
        LogoAlignment::Center => canvas_width / 2.0,
        LogoAlignment::Right => canvas_width - margin,
    };
    logo_row_at(sources, alignment, anchor, top_y, height)
}
