//! Streaming NDJSON writer.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::writers::RowWriter;
use openclean_core::schema::Schema;
use openclean_core::types::Scalar;

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
    // object keys in schema order, made unique
    keys: Vec<String>,
}

impl JsonlWriter<File> {
    pub fn to_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            keys: Vec::new(),
        }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

impl<W: Write> RowWriter for JsonlWriter<W> {
    /// JSON lines carry no header record; the schema only names the keys.
    fn write_header(&mut self, schema: &Schema) -> Result<()> {
        self.keys = unique_keys(schema);
        Ok(())
    }

    /// Write a row as one JSON object per line, keys in schema order.
    fn write_row(&mut self, row: &[Scalar]) -> Result<()> {
        self.writer.write_all(b"{")?;
        for (i, (key, val)) in self.keys.iter().zip(row).enumerate() {
            if i > 0 {
                self.writer.write_all(b",")?;
            }
            serde_json::to_writer(&mut self.writer, key)?;
            self.writer.write_all(b":")?;
            serde_json::to_writer(&mut self.writer, &scalar_to_json(val))?;
        }
        self.writer.write_all(b"}\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Column names as object keys. A repeated name gets a `.1`, `.2`, ...
/// suffix so no value is lost.
fn unique_keys(schema: &Schema) -> Vec<String> {
    let mut taken = HashSet::with_capacity(schema.len());
    let mut keys = Vec::with_capacity(schema.len());
    for col in &schema.columns {
        let mut key = col.name.clone();
        let mut n = 0;
        while taken.contains(&key) {
            n += 1;
            key = format!("{}.{n}", col.name);
        }
        taken.insert(key.clone());
        keys.push(key);
    }
    keys
}

fn scalar_to_json(v: &Scalar) -> serde_json::Value {
    use Scalar::*;
    match v {
        Null => serde_json::Value::Null,
        Bool(b) => serde_json::Value::Bool(*b),
        I32(i) => serde_json::Value::from(*i),
        I64(i) => serde_json::Value::from(*i),
        F32(f) => serde_json::Value::from(*f as f64),
        F64(f) => serde_json::Value::from(*f),
        Str(s) => serde_json::Value::String(s.clone()),
        Bin(b) => serde_json::Value::String(format!("[binary {} bytes]", b.len())), // base64 not available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_object_per_row() {
        let mut w = JsonlWriter::to_writer(Vec::new());
        w.write_header(&Schema::from_names(["name", "age"])).unwrap();
        w.write_row(&[Scalar::from("Alice"), Scalar::I64(30)]).unwrap();
        w.write_row(&[Scalar::from("Bob"), Scalar::Null]).unwrap();
        w.finish().unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"name":"Alice","age":30}"#);
        assert_eq!(lines[1], r#"{"name":"Bob","age":null}"#);
    }

    #[test]
    fn keys_follow_schema_order_and_stay_unique() {
        let mut w = JsonlWriter::to_writer(Vec::new());
        w.write_header(&Schema::from_names(["borough", "city", "city"]))
            .unwrap();
        w.write_row(&[Scalar::from("BK"), Scalar::from("NY"), Scalar::from("NY")])
            .unwrap();
        w.finish().unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(out, "{\"borough\":\"BK\",\"city\":\"NY\",\"city.1\":\"NY\"}\n");
    }
}
