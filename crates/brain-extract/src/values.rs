//! CSS value helpers: color and length recognition, `var()` resolution.

use brain_parsers::Stylesheet;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Matches `#rgb`, `#rgba`, `#rrggbb` and `#rrggbbaa`
static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap()
});

/// Matches color functions
static COLOR_FN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:rgba?|hsla?|oklch)\(.*\)$").unwrap());

/// Matches a single length token like `16px` or `1.5rem`
static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(-?(?:\d+\.?\d*|\.\d+))(px|rem|em|pt|%|vh|vw|vmin|vmax|ch|ex)$").unwrap()
});

/// Matches `var(--name)` and `var(--name, fallback)`
static VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var\(\s*(--[A-Za-z0-9_-]+)\s*(?:,\s*([^()]*(?:\([^()]*\))?[^()]*))?\)").unwrap()
});

/// Matches width conditions in media queries
static MEDIA_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:min|max)-width\s*:\s*(\d+(?:\.\d+)?)(px|em|rem)").unwrap()
});

/// Hex literals and color functions anywhere inside a value
static COLOR_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)#[0-9a-f]{3,8}\b|(?:rgba?|hsla?|oklch)\([^)]*\)").unwrap()
});

const NAMED_COLORS: &[&str] = &[
    "black", "white", "red", "green", "blue", "yellow", "orange", "purple", "pink", "gray",
    "grey", "silver", "maroon", "olive", "lime", "aqua", "teal", "navy", "fuchsia", "cyan",
    "magenta", "brown", "gold", "indigo", "violet", "coral", "salmon", "crimson", "tomato",
    "khaki", "beige", "ivory", "lavender", "turquoise", "tan", "chocolate", "darkgray",
    "lightgray", "whitesmoke", "transparent",
];

/// Length of the root font size used for `rem`/`em` conversion
pub const ROOT_FONT_PX: f64 = 16.0;

const MAX_VAR_DEPTH: usize = 8;

pub fn is_color(value: &str) -> bool {
    let value = value.trim();
    HEX_COLOR_RE.is_match(value)
        || COLOR_FN_RE.is_match(value)
        || NAMED_COLORS.contains(&value.to_ascii_lowercase().as_str())
}

pub fn is_length(value: &str) -> bool {
    LENGTH_RE.is_match(value.trim())
}

pub fn has_var_ref(value: &str) -> bool {
    VAR_RE.is_match(value)
}

/// Custom property names referenced by `value`, in order
pub fn var_refs(value: &str) -> Vec<String> {
    VAR_RE
        .captures_iter(value)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Pixel equivalent of a single length; `rem`/`em` use a 16px root, `pt` is 4/3 px
pub fn to_px(value: &str) -> Option<f64> {
    let value = value.trim();
    if value == "0" {
        return Some(0.0);
    }
    let caps = LENGTH_RE.captures(value)?;
    let number: f64 = caps[1].parse().ok()?;
    match caps[2].to_ascii_lowercase().as_str() {
        "px" => Some(number),
        "rem" | "em" => Some(number * ROOT_FONT_PX),
        "pt" => Some(number * 4.0 / 3.0),
        _ => None,
    }
}

/// Non-zero length tokens of a (possibly shorthand) value
pub fn length_tokens(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .filter(|token| is_length(token))
        .filter(|token| to_px(token).map_or(true, |px| px != 0.0))
        .map(|token| token.to_ascii_lowercase())
        .collect()
}

pub fn is_spacing_property(property: &str) -> bool {
    property.starts_with("margin")
        || property.starts_with("padding")
        || property == "gap"
        || property.ends_with("-gap")
}

/// Literal colors written into a (possibly shorthand) value, ignoring `var()` references
pub fn color_literals(value: &str) -> Vec<String> {
    let without_vars = VAR_RE.replace_all(value, " ");
    let mut found: Vec<String> = COLOR_LITERAL_RE
        .find_iter(&without_vars)
        .map(|m| m.as_str().to_string())
        .filter(|m| is_color(m))
        .collect();
    let stripped = COLOR_LITERAL_RE.replace_all(&without_vars, " ");
    found.extend(
        stripped
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.eq_ignore_ascii_case("transparent"))
            .filter(|word| NAMED_COLORS.contains(&word.to_ascii_lowercase().as_str()))
            .map(str::to_string),
    );
    found
}

/// Width breakpoints in px mentioned by a media condition
pub fn media_widths(condition: &str) -> Vec<(String, f64)> {
    MEDIA_WIDTH_RE
        .captures_iter(condition)
        .filter_map(|caps| {
            let number: f64 = caps[1].parse().ok()?;
            let px = match caps[2].to_ascii_lowercase().as_str() {
                "px" => number,
                _ => number * ROOT_FONT_PX,
            };
            Some((format!("{}{}", &caps[1], &caps[2]), px))
        })
        .collect()
}

/// Lowercase identifier fragment derived from a literal (`#0066FF` -> `0066ff`)
pub fn slug(value: &str) -> String {
    let mut out = String::new();
    for c in value.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Custom-property table for one run
#[derive(Debug, Clone, Default)]
pub struct CustomProperties {
    values: BTreeMap<String, String>,
}

impl CustomProperties {
    /// Collect custom properties; root-scope declarations win over scoped ones
    pub fn collect(stylesheet: &Stylesheet) -> Self {
        let mut values = BTreeMap::new();
        for root_pass in [true, false] {
            for rule in &stylesheet.rules {
                if rule.is_root_scope() != root_pass {
                    continue;
                }
                for decl in rule.declarations.iter().filter(|d| d.is_custom_property()) {
                    values
                        .entry(decl.property.clone())
                        .or_insert_with(|| decl.value.clone());
                }
            }
        }
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Substitute every `var()` in `value`; `None` when a reference is
    /// undefined without fallback or the chain is too deep
    pub fn resolve(&self, value: &str) -> Option<String> {
        self.resolve_depth(value, 0)
    }

    fn resolve_depth(&self, value: &str, depth: usize) -> Option<String> {
        if !has_var_ref(value) {
            return Some(value.trim().to_string());
        }
        if depth >= MAX_VAR_DEPTH {
            return None;
        }

        let mut out = String::new();
        let mut last = 0;
        for caps in VAR_RE.captures_iter(value) {
            let whole = caps.get(0)?;
            out.push_str(&value[last..whole.start()]);

            let replacement = match self.values.get(&caps[1]) {
                Some(defined) => self.resolve_depth(defined, depth + 1)?,
                None => match caps.get(2) {
                    Some(fallback) => self.resolve_depth(fallback.as_str(), depth + 1)?,
                    None => return None,
                },
            };
            out.push_str(&replacement);
            last = whole.end();
        }
        out.push_str(&value[last..]);
        Some(out.trim().to_string())
    }
}
