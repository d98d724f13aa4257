use anyhow::{Context, Result};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub struct CsvStorage;

impl CsvStorage {
    /// Writes serializable rows to a CSV file, header taken from the field names.
    ///
    /// Rows are written in the order given.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_rows<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        Self::write_to(file, rows)
            .with_context(|| format!("Failed to write CSV file: {}", path.display()))
    }

    /// Same as [`CsvStorage::write_rows`] for any writer.
    ///
    /// # Errors
    /// Returns error if serialization or writing fails
    pub fn write_to<W: Write, T: Serialize>(out: W, rows: &[T]) -> Result<()> {
        let mut writer = Writer::from_writer(out);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        bank: Decimal,
        pct: u32,
    }

    #[test]
    fn writes_header_and_rows_in_order() {
        let rows = [
            Row { name: "b", bank: dec!(1200), pct: 67 },
            Row { name: "a", bank: dec!(0), pct: 0 },
        ];
        let mut buf = Vec::new();
        CsvStorage::write_to(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "name,bank,pct\nb,1200,67\na,0,0\n");
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        CsvStorage::write_rows(&path, &[Row { name: "x", bank: dec!(5), pct: 1 }]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("name,bank,pct\n"));
    }

    #[test]
    fn empty_rows_write_empty_file() {
        let mut buf = Vec::new();
        CsvStorage::write_to::<_, Row>(&mut buf, &[]).unwrap();
        assert!(buf.is_empty());
    }
}
