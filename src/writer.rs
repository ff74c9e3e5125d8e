use std::fmt;
use std::io::Write;

use crate::summary::{EventSummary, Value, COLUMNS};
use crate::Result;

/// Sink for event summaries
pub trait ColumnWriter {
    /// Store the summary of one event
    fn write_row(&mut self, row: &EventSummary) -> Result<()>;

    /// Flush all stored rows
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ColumnWriter for Vec<EventSummary> {
    fn write_row(&mut self, row: &EventSummary) -> Result<()> {
        self.push(*row);
        Ok(())
    }
}

/// Field separator of a text table
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Delimiter {
    #[default]
    Tab,
    Comma,
}

impl Delimiter {
    fn as_str(self) -> &'static str {
        match self {
            Delimiter::Tab => "\t",
            Delimiter::Comma => ",",
        }
    }
}

/// Writer for event summaries as delimited text
///
/// The first line holds the column names. Floating-point numbers are
/// written in their shortest representation that reads back exactly.
#[derive(Debug)]
pub struct TableWriter<Stream: Write> {
    stream: Stream,
    delimiter: Delimiter,
    rows: u64,
}

impl<Stream: Write> TableWriter<Stream> {
    pub fn new(stream: Stream, delimiter: Delimiter) -> Result<TableWriter<Stream>> {
        let mut writer = TableWriter {
            stream,
            delimiter,
            rows: 0,
        };
        for (i, (name, _)) in COLUMNS.iter().enumerate() {
            if i > 0 {
                writer.write(writer.delimiter.as_str())?;
            }
            writer.write(name)?;
        }
        writer.write("\n")?;
        Ok(writer)
    }

    /// Number of rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Get back the underlying stream
    pub fn into_inner(self) -> Stream {
        self.stream
    }

    fn write<T: fmt::Display + ?Sized>(&mut self, expr: &T) -> Result<()> {
        write!(self.stream, "{expr}")?;
        Ok(())
    }

    fn write_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::UInt(u) => self.write(&u),
            Value::Int(i) => self.write(&i),
            Value::Float(x) => {
                let mut buf = ryu::Buffer::new();
                self.stream.write_all(buf.format(x).as_bytes())?;
                Ok(())
            }
        }
    }
}

impl<Stream: Write> ColumnWriter for TableWriter<Stream> {
    fn write_row(&mut self, row: &EventSummary) -> Result<()> {
        for (i, value) in row.values().into_iter().enumerate() {
            if i > 0 {
                self.write(self.delimiter.as_str())?;
            }
            self.write_value(value)?;
        }
        self.write("\n")?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }
}
