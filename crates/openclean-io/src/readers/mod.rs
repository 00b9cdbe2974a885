//! Streaming readers that produce `(row_id, row)` pairs.

pub mod csv;
