use crate::split::types::Record;
use anyhow::{Context, Result};
use std::io::Write;

/// Writes derived records as JSON Lines, one record per line
pub struct RecordWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        RecordWriter { writer, written: 0 }
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).context("Failed to serialize record")?;
        writeln!(self.writer).context("Failed to write record")?;
        self.written += 1;
        Ok(())
    }

    /// Write records in the order given
    pub fn write_records(&mut self, records: Vec<Record>) -> Result<()> {
        for record in &records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
