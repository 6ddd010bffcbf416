//! Text helpers for node and connection labels
//!
//! Attribute rows are returned as styled spans so the renderer can draw the
//! primary key, the type and the constraints differently. Widths are measured
//! in display columns, so wide characters count double.

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use super::Attribute;

/// Approximate pixel width of one display column at label font sizes
pub const CHAR_WIDTH_PX: f64 = 7.0;

/// Minimum width of the cardinality label box
pub const CARDINALITY_MIN_WIDTH: f64 = 40.0;

/// Minimum width of a free-text connection label box
pub const LABEL_MIN_WIDTH: f64 = 80.0;

/// Rendering style of one span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanStyle {
    Normal,
    Pk,
    Type,
    Constraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSpan {
    pub text: String,
    pub style: SpanStyle,
}

impl TextSpan {
    fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Styled spans for one attribute row
///
/// `[UQ]` precedes unique non-key attributes, key names are styled `pk`,
/// the type follows in parentheses and `[NOT NULL]` marks non-nullable
/// non-key attributes.
pub fn format_attribute(attr: &Attribute) -> Vec<TextSpan> {
    let mut spans = Vec::with_capacity(4);
    if attr.is_pk {
        spans.push(TextSpan::new(attr.name.as_str(), SpanStyle::Pk));
    } else {
        if attr.is_uq {
            spans.push(TextSpan::new("[UQ]", SpanStyle::Normal));
        }
        spans.push(TextSpan::new(attr.name.as_str(), SpanStyle::Normal));
    }
    spans.push(TextSpan::new(format!(" ({})", attr.sql_type), SpanStyle::Type));
    if !attr.is_null && !attr.is_pk {
        spans.push(TextSpan::new(" [NOT NULL]", SpanStyle::Constraint));
    }
    spans
}

/// Pixel width of a label box for `text`, never below `min`
pub fn label_width(text: &str, char_px: f64, min: f64) -> f64 {
    (UnicodeWidthStr::width(text) as f64 * char_px).max(min)
}

/// Wrap text to fit within a maximum width, breaking on word boundaries.
///
/// Returns one line per row, each fitting within `max_width` display columns
/// unless a single word is wider. A `max_width` of 0 disables wrapping.
pub fn wrap_label(label: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 || UnicodeWidthStr::width(label) <= max_width {
        return vec![label.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut width = 0;

    for word in label.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        if width == 0 {
            current = word.to_string();
            width = word_width;
        } else if width + 1 + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            width += 1 + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
            width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
