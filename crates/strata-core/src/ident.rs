//! Sample identifier normalisation.
//!
//! Imported spreadsheets sometimes stored codes with a space between every
//! character (`"长 7 - 2"` for `"长7-2"`). Lookups that must tolerate this
//! compare against several forms of the requested code.

/// The variant forms a sample code may take in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierForms {
  /// The code exactly as requested.
  pub exact:    String,
  /// Whitespace removed, then one space between every character.
  pub spaced:   String,
  /// Whitespace removed. Compare against [`despaced_column`], never against
  /// the raw column.
  pub despaced: String,
}

/// Derive every lookup form of `raw`. Case and non-whitespace characters are
/// preserved.
pub fn normalize(raw: &str) -> IdentifierForms {
  let despaced: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

  let mut spaced = String::with_capacity(despaced.len() * 2);
  for (i, c) in despaced.chars().enumerate() {
    if i > 0 {
      spaced.push(' ');
    }
    spaced.push(c);
  }

  IdentifierForms { exact: raw.to_owned(), spaced, despaced }
}

/// Code points stripped by [`despaced_column`]: space, tab, LF, CR and the
/// ideographic space.
const STRIPPED: [u32; 5] = [0x20, 0x09, 0x0A, 0x0D, 0x3000];

/// A SQL expression yielding `column` with whitespace removed.
///
/// Emits SQLite syntax: `char(n)` builds a one-character string from a code
/// point. Other engines spell this `chr(n)` (PostgreSQL) or `NCHAR(n)` (SQL
/// Server). `column` must be a trusted, already-quoted identifier.
pub fn despaced_column(column: &str) -> String {
  STRIPPED.iter().fold(column.to_owned(), |expr, cp| {
    format!("REPLACE({expr}, char({cp}), '')")
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn spaced_form_interleaves_single_spaces() {
    let forms = normalize("abc");
    assert_eq!(forms.exact, "abc");
    assert_eq!(forms.spaced, "a b c");
    assert_eq!(forms.despaced, "abc");
  }

  #[test]
  fn despaced_form_strips_all_whitespace() {
    let forms = normalize("a b  c");
    assert_eq!(forms.exact, "a b  c");
    assert_eq!(forms.despaced, "abc");
    assert_eq!(forms.spaced, "a b c");
  }

  #[test]
  fn handles_cjk_codes() {
    let forms = normalize("长7-2");
    assert_eq!(forms.spaced, "长 7 - 2");
    assert_eq!(normalize("长 7 - 2").despaced, "长7-2");
    assert_eq!(normalize("长\u{3000}7-2").despaced, "长7-2");
  }

  #[test]
  fn empty_input_yields_empty_forms() {
    let forms = normalize("");
    assert_eq!(forms.exact, "");
    assert_eq!(forms.spaced, "");
    assert_eq!(forms.despaced, "");
  }

  #[test]
  fn preserves_case() {
    let forms = normalize("Ch7 x");
    assert_eq!(forms.spaced, "C h 7 x");
    assert_eq!(forms.despaced, "Ch7x");
  }

  #[test]
  fn despacing_the_spaced_form_recovers_the_despaced_input() {
    for raw in ["abc", "长 7 - 2", " x\ty ", "", "Z"] {
      let forms = normalize(raw);
      assert_eq!(normalize(&forms.spaced).despaced, forms.despaced, "{raw:?}");
    }
  }

  #[test]
  fn despaced_column_nests_replacements() {
    let expr = despaced_column("\"code\"");
    assert!(expr.starts_with("REPLACE(REPLACE("));
    assert!(expr.contains("\"code\", char(32), '')"));
    assert!(expr.ends_with("char(12288), '')"));
    assert!(!expr.contains('?'));
  }
}
