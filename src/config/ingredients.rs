//! Ingredient reference data loading from CSV.
//!
//! The file has no header; every row is `name,measurement_unit`, e.g.
//! `абрикосовое варенье,г`. Surrounding whitespace is trimmed.

use crate::errors::Result;
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

/// One row of the ingredients file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngredientRecord {
    /// Ingredient name
    pub name: String,
    /// Measurement unit
    pub measurement_unit: String,
}

/// Parses ingredient rows from any reader.
pub fn read_ingredients<R: Read>(reader: R) -> Result<Vec<IngredientRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize()
        .collect::<std::result::Result<Vec<IngredientRecord>, _>>()
        .map_err(Into::into)
}

/// Opens and parses the ingredients file at `path`.
pub fn load_ingredients<P: AsRef<Path>>(path: P) -> Result<Vec<IngredientRecord>> {
    read_ingredients(File::open(path)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_read_ingredients() {
        let data = "salt,g\n sugar , g \n\"milk, whole\",ml\n";
        let records = read_ingredients(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].name, "sugar");
        assert_eq!(records[1].measurement_unit, "g");
        assert_eq!(records[2].name, "milk, whole");
    }

    #[test]
    fn test_read_ingredients_rejects_short_rows() {
        let result = read_ingredients("salt\n".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_ingredients("no/such/ingredients.csv").is_err());
    }
}
