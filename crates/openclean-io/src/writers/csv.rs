//! Streaming CSV writer.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use openclean_core::schema::Schema;
use openclean_core::types::Scalar;

use crate::error::Result;
use crate::writers::RowWriter;

pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvWriter<File> {
    pub fn to_path<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f, delimiter))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn to_writer(writer: W, delimiter: u8) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(writer),
        }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()).into())
    }
}

impl<W: Write> RowWriter for CsvWriter<W> {
    fn write_header(&mut self, schema: &Schema) -> Result<()> {
        self.writer.write_record(schema.names())?;
        Ok(())
    }

    fn write_row(&mut self, row: &[Scalar]) -> Result<()> {
        self.writer
            .write_record(row.iter().map(|v| v.to_string()))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
