//! Batch report output as JSON or JSON Lines.
//!
//! JSON buffers every record and writes one document when the batch ends.
//! JSONL streams each record as it completes and ends with a summary line,
//! so a consumer can follow a long batch.

use serde::Serialize;
use std::io::{self, Write};

use crate::types::{BatchRecord, BatchSummary};

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One document: `{"records": [...], "summary": {...}}`
    #[default]
    Json,
    /// One record per line, then `{"summary": {...}}`
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    records: &'a [BatchRecord],
    summary: &'a BatchSummary,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    summary: &'a BatchSummary,
}

/// Writes batch records in the chosen format.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<BatchRecord>,
    records_written: usize,
}

impl<W: Write> ReportWriter<W> {
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            records_written: 0,
        }
    }

    /// Add one finished record.
    pub fn record(&mut self, record: &BatchRecord) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.pending.push(record.clone()),
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
                writeln!(self.writer)?;
                self.writer.flush()?;
            }
        }
        self.records_written += 1;
        Ok(())
    }

    /// Write the summary (and, for JSON, the buffered records) and flush.
    pub fn finish(mut self, summary: &BatchSummary) -> io::Result<W> {
        match self.format {
            OutputFormat::Json => {
                let report = Report {
                    records: &self.pending,
                    summary,
                };
                let written = if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, &report)
                } else {
                    serde_json::to_writer(&mut self.writer, &report)
                };
                written.map_err(io::Error::other)?;
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, &SummaryLine { summary })
                    .map_err(io::Error::other)?;
            }
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Records accepted so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }
}
