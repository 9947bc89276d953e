//! Streaming CSV row writer.
//!
//! Wraps a [`csv::Writer`] configured for the export dialect: every field
//! quoted, `,` between fields, `\n` after every row including the last. Rows
//! go straight to the underlying sink through the encoder's fixed-size
//! buffer, so memory use does not grow with the export.

use crate::export::cell::{render_number, render_optional};
use crate::export::schema::ExportSchema;
use crate::models::{Feature, Observation};
use crate::{Error, Result};
use std::io::Write;

/// CSV writer bound to one export's header.
pub struct CsvRowWriter<W: Write> {
    writer: csv::Writer<W>,
    width: usize,
    rows_written: usize,
}

impl<W: Write> CsvRowWriter<W> {
    /// Opens the stream and writes the header row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamWrite`] if the header cannot be written.
    pub fn new(sink: W, headers: &[String]) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(b',')
            .quote(b'"')
            .double_quote(true)
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(sink);

        writer.write_record(headers).map_err(stream_error)?;

        Ok(Self {
            writer,
            width: headers.len(),
            rows_written: 0,
        })
    }

    /// Writes one data row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the row width differs from the
    /// header, or [`Error::StreamWrite`] if the sink rejects the write.
    pub fn write_row<I, T>(&mut self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let record: csv::ByteRecord = cells.into_iter().collect();
        if record.len() != self.width {
            return Err(Error::InvalidInput(format!(
                "row has {} cells, header has {}",
                record.len(),
                self.width
            )));
        }
        self.writer.write_byte_record(&record).map_err(stream_error)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Writes the row for one (feature, observation) pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamWrite`] if the sink rejects the write.
    pub fn write_observation(
        &mut self,
        schema: &ExportSchema,
        feature: &Feature,
        observation: &Observation,
    ) -> Result<()> {
        let location = feature.location.as_ref();
        let fixed = [
            feature.id.clone(),
            feature.caption.clone().unwrap_or_default(),
            location
                .and_then(|l| l.latitude)
                .map(render_number)
                .unwrap_or_default(),
            location
                .and_then(|l| l.longitude)
                .map(render_number)
                .unwrap_or_default(),
        ];
        let answers = schema
            .elements()
            .iter()
            .map(|column| render_optional(observation.response(&column.id)));

        self.write_row(fixed.into_iter().chain(answers))
    }

    /// Data rows written so far.
    #[must_use]
    pub const fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flushes buffered rows and releases the sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamWrite`] if the final flush fails.
    pub fn finish(self) -> Result<W> {
        let mut sink = self
            .writer
            .into_inner()
            .map_err(|e| Error::StreamWrite(e.error().to_string()))?;
        sink.flush()
            .map_err(|e| Error::StreamWrite(e.to_string()))?;
        Ok(sink)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn stream_error(e: csv::Error) -> Error {
    Error::StreamWrite(e.to_string())
}
