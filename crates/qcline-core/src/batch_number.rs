//! Generated batch numbers.
//!
//! Format: `{material:3}{day:02}{month letter}{yy}{supplier:3}`, where the
//! month letter runs `A` (January) to `L` (December). A chicken-breast batch
//! received from supplier `SYR` on 27 June 2025 is `CHB27F25SYR`.
//!
//! Only generated numbers follow this format. Numbers typed in by an operator
//! are accepted as-is.

use chrono::{Datelike, NaiveDate};

use crate::{Error, Result};

/// Supplier code used when none is configured.
pub const DEFAULT_SUPPLIER_CODE: &str = "SYR";

/// Derive a three-letter material code from a raw material name.
///
/// Multi-word names take two letters of the first word and one of the second
/// (`"Chicken Breast"` → `CHB`); single words take their first three letters.
/// Non-letters are ignored and short names are padded with `X`.
pub fn material_code(raw_material: &str) -> String {
  let words: Vec<Vec<char>> = raw_material
    .split_whitespace()
    .map(|w| w.chars().filter(char::is_ascii_alphabetic).collect::<Vec<_>>())
    .filter(|w| !w.is_empty())
    .collect();

  let mut code: Vec<char> = match words.as_slice() {
    [first, second, ..] => first
      .iter()
      .take(2)
      .chain(second.iter().take(1))
      .copied()
      .collect(),
    [only] => only.iter().take(3).copied().collect(),
    [] => Vec::new(),
  };
  // A one-letter first word leaves room for more of the second.
  if code.len() < 3
    && let [_, second, ..] = words.as_slice()
  {
    code.extend(second.iter().skip(1).take(3 - code.len()));
  }
  code.resize(3, 'X');
  code.iter().map(char::to_ascii_uppercase).collect()
}

/// The month letter for `date`: `A` for January through `L` for December.
pub fn month_code(date: NaiveDate) -> char {
  // month0() is 0..=11
  (b'A' + date.month0() as u8) as char
}

/// Build a batch number from its parts.
///
/// Both codes must be exactly three ASCII letters; they are upper-cased.
pub fn generate(material_code: &str, date: NaiveDate, supplier_code: &str) -> Result<String> {
  let material = three_letters("material code", material_code)?;
  let supplier = three_letters("supplier code", supplier_code)?;
  Ok(format!(
    "{material}{day:02}{month}{year:02}{supplier}",
    day = date.day(),
    month = month_code(date),
    year = date.year().rem_euclid(100),
  ))
}

/// Generate a number for `raw_material` using [`material_code`].
pub fn generate_for(raw_material: &str, date: NaiveDate, supplier_code: &str) -> Result<String> {
  generate(&material_code(raw_material), date, supplier_code)
}

fn three_letters(what: &str, code: &str) -> Result<String> {
  if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
    Ok(code.to_ascii_uppercase())
  } else {
    Err(Error::InvalidBatchNumber(format!(
      "{what} must be three letters, got {code:?}"
    )))
  }
}
