//! General helper utilities.

/// ANSI colour codes for the text report.
pub mod colors {
    pub const HEADER: &str = "\x1b[95m";
    pub const OKGREEN: &str = "\x1b[92m";
    pub const WARNING: &str = "\x1b[93m";
    pub const FAIL: &str = "\x1b[91m";
    pub const ENDC: &str = "\x1b[0m";
    pub const GRAY: &str = "\x1b[38;5;8m";

    /// Wrap `text` in ANSI colour escape codes (no-op when `add_color` is false).
    pub fn colorize(text: &str, color: &str, add_color: bool) -> String {
        if add_color && !text.is_empty() {
            format!("{color}{text}{ENDC}")
        } else {
            text.to_string()
        }
    }
}

/// Format a number the way JavaScript's `Number.prototype.toString` does for
/// the values that show up as literals: integers print without a fraction,
/// and very large or very small magnitudes use `e+N` / `e-N` notation.
pub fn js_number_to_string(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }

    let abs = v.abs();
    if abs >= 1e21 || abs < 1e-6 {
        let s = format!("{v:e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        };
    }
    if v.fract() == 0.0 {
        return format!("{}", v as i128);
    }
    format!("{v}")
}

/// Strip the sign markers an extracted expression may carry in front of a
/// variable name (`"-qX"` → `"qX"`, `"+ a"` → `"a"`).
pub fn strip_sign_markers(name: &str) -> &str {
    name.trim_start_matches(|c: char| c == '+' || c == '-' || c.is_whitespace())
        .trim_end()
}

/// Format a 32-bit word as `0x` + 8 hex digits (two's complement).
pub fn word_hex(word: i32) -> String {
    format!("0x{:08x}", word as u32)
}

/// Shorten long source excerpts for log and report lines.
pub fn abbreviate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    }
}
