//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success/Resolved: green   (resolved issues, completed actions)
//!   - Warning:          yellow  (links not loaded yet)
//!   - Error/Overdue:    red     (overdue issues, failures)
//!   - Info/Reference:   cyan    (issue IDs, root tree node)
//!   - Muted:            dimmed  (field labels, connectors, relation names)
//!   - Emphasis:         bold    (section headers)
//!
//! State and type values use the colors of their field legend when one is
//! known.

use crate::domain::FieldInfoField;
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Colorize an issue ID (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    info(id, config)
}

/// Apply dimmed style to text (for labels/field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Parse `#rrggbb` or `#rgb` into RGB components.
pub(crate) fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').filter(|d| d.is_ascii())?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        6 => Some((
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        3 => {
            let short = |i: usize| channel(&digits[i..=i]).map(|v| v * 17);
            Some((short(0)?, short(1)?, short(2)?))
        }
        _ => None,
    }
}

/// Render a state or type value with the colors of its legend entry.
///
/// Values without a legend entry, or with unparsable colors, stay plain.
pub(crate) fn colorize_field_value(
    value: &str,
    legend: Option<&FieldInfoField>,
    config: &OutputConfig,
) -> String {
    if !config.use_colors {
        return value.to_string();
    }
    let Some(entry) = legend.and_then(|field| field.lookup(value)) else {
        return value.to_string();
    };
    match (
        parse_hex_color(&entry.foreground),
        parse_hex_color(&entry.background),
    ) {
        (Some((fr, fg, fb)), Some((br, bg, bb))) => value
            .truecolor(fr, fg, fb)
            .on_truecolor(br, bg, bb)
            .to_string(),
        _ => value.to_string(),
    }
}

/// Resolution icon, with ASCII fallback support.
pub(crate) fn resolved_icon(resolved: bool, config: &OutputConfig) -> String {
    let icon = match (resolved, config.use_ascii) {
        (true, true) => "+",
        (false, true) => "o",
        (true, false) => "✓",
        (false, false) => "○",
    };
    if resolved {
        success(icon, config)
    } else {
        icon.to_string()
    }
}
