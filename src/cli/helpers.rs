//! Shared helper functions for CLI commands

use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::{Config, Project};

/// Project from `--project` or the working directory, if any
pub fn find_project(global: &GlobalOpts) -> Option<Project> {
    match global.project {
        Some(ref path) => Project::discover_from(path).ok(),
        None => Project::discover().ok(),
    }
}

/// Catalog path: explicit flag, else the project's configured catalog
pub fn catalog_path(
    explicit: Option<PathBuf>,
    config: &Config,
    project: Option<&Project>,
) -> miette::Result<PathBuf> {
    explicit
        .or_else(|| config.catalog_path(project))
        .ok_or_else(|| {
            miette::miette!(
                help = "Pass --catalog <FILE>, or set `catalog` in .cotizador/config.yaml",
                "no catalog given"
            )
        })
}

/// Parse a `name=value` pair for `--var`
pub fn parse_key_val(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing variable name in '{}'", s));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((key.to_string(), value))
}

/// Format a number with fixed decimals
pub fn format_number(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Format money with thousands separators: `12,345.60`
pub fn format_money(value: f64, decimals: usize) -> String {
    let fixed = format_number(value.abs(), decimals);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a cell for a markdown table
pub fn escape_md(s: &str) -> String {
    s.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(parse_key_val("espesor=6").unwrap(), ("espesor".to_string(), 6.0));
        assert_eq!(parse_key_val(" refuerzos = 2.5 ").unwrap().1, 2.5);
        assert!(parse_key_val("espesor").is_err());
        assert!(parse_key_val("=3").is_err());
        assert!(parse_key_val("x=abc").is_err());
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0, 2), "0.00");
        assert_eq!(format_money(999.5, 2), "999.50");
        assert_eq!(format_money(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_money(-1500.0, 0), "-1,500");
        assert_eq!(format_money(-0.001, 2), "0.00");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("area", 10), "area");
        assert_eq!(truncate_str("si(malla = 1, area, 0)", 10), "si(mall...");
        assert_eq!(truncate_str("añadido", 7), "añadido");
    }

    #[test]
    fn test_escape_md() {
        assert_eq!(escape_md("a|b"), "a\\|b");
    }
}
