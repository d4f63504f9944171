//! Cell Value Module
//! A single spreadsheet value and the coercions the pipeline relies on.

use calamine::Data;
use std::fmt;

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Build a text cell, collapsing blank strings to `Empty`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    /// Build a numeric cell, collapsing non-finite values to `Empty`.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Cell::Number(value)
        } else {
            Cell::Empty
        }
    }

    /// Trimmed textual form, `None` when there is nothing to show.
    pub fn normalized(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) if n.is_nan() => None,
            _ => {
                let s = self.to_string();
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        self.normalized().is_none()
    }

    /// Numeric coercion: unparseable values become `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

/// Integral numbers render without a fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => f.write_str(&format_number(*n)),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(b) => f.write_str(if *b { "True" } else { "False" }),
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::number(*f),
            Data::String(s) => Cell::text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::Error(_) => Cell::Empty,
            other => Cell::text(other.to_string()),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::text(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::text(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::number).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(Cell::Number(12.0).to_string(), "12");
        assert_eq!(Cell::Number(-3.0).to_string(), "-3");
        assert_eq!(Cell::Number(1.25).to_string(), "1.25");
    }

    #[test]
    fn normalized_trims_and_drops_blanks() {
        assert_eq!(Cell::Text("  ab ".into()).normalized().as_deref(), Some("ab"));
        assert_eq!(Cell::Text("   ".into()).normalized(), None);
        assert_eq!(Cell::Empty.normalized(), None);
        assert_eq!(Cell::Number(f64::NAN).normalized(), None);
        assert!(Cell::text("").is_blank());
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Cell::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(Cell::Text(" 124.9 ".into()).as_f64(), Some(124.9));
        assert_eq!(Cell::Text("P1".into()).as_f64(), None);
        assert_eq!(Cell::Bool(true).as_f64(), None);
        assert_eq!(Cell::Empty.as_f64(), None);
    }

    #[test]
    fn converts_calamine_values() {
        assert_eq!(Cell::from(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(Cell::from(&Data::String(" ".into())), Cell::Empty);
        assert_eq!(Cell::from(&Data::Bool(false)), Cell::Bool(false));
    }
}
