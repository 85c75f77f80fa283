//! CSV rate log.
//!
//! Layout: header `date,rate`, then one `YYYY-MM-DD,<rate with 6 decimals>`
//! row per saved day, ascending. The file is the output and the resume
//! checkpoint at once.
//!
//! - Appends are flushed and synced before `commit` returns
//! - Rows that don't parse as a date/number pair are skipped on read
//! - A missing or zero-length file gets a fresh header
//! - An unterminated last row is closed before the first append

use super::{check_order, cursor_after, Checkpoint, StoreError};
use crate::domain::RateRecord;
use chrono::NaiveDate;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const HEADER: [&str; 2] = ["date", "rate"];

pub struct CsvRateLog {
    path: PathBuf,
    last_date: Option<NaiveDate>,
}

impl CsvRateLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_date: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// CSV reader over the log, or `None` when the file doesn't exist.
    fn reader(&self) -> Result<Option<csv::Reader<File>>, StoreError> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(
                csv::ReaderBuilder::new()
                    .has_headers(true)
                    .flexible(true)
                    .from_reader(file),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn writer(file: File) -> csv::Writer<File> {
        csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file)
    }

    /// Visit every data row, skipping rows the CSV layer can't decode.
    fn for_each_row(&self, mut f: impl FnMut(&csv::StringRecord)) -> Result<(), StoreError> {
        let Some(mut rdr) = self.reader()? else {
            return Ok(());
        };
        for row in rdr.records() {
            match row {
                Ok(rec) => f(&rec),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => tracing::debug!(path = %self.path.display(), "skipping undecodable row: {e}"),
            }
        }
        Ok(())
    }

    /// Terminate a last row left without `\n` (hand edit or torn write),
    /// so the next append starts on its own line.
    fn close_last_row(&self) -> Result<(), StoreError> {
        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.write_all(b"\n")?;
            file.sync_data()?;
            tracing::warn!(path = %self.path.display(), "terminated unfinished last row");
        }
        Ok(())
    }

    fn last_record_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        let mut last = None;
        self.for_each_row(|rec| {
            if let Some(date) = rec.get(0).and_then(parse_date) {
                last = Some(date);
            }
        })?;
        Ok(last)
    }
}

impl Checkpoint for CsvRateLog {
    fn ensure_initialized(&mut self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        if needs_header {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?;
            let mut wtr = Self::writer(file);
            wtr.write_record(HEADER)?;
            wtr.flush()?;
            let file = wtr.into_inner().map_err(|e| StoreError::Io(e.into_error()))?;
            file.sync_all()?;
            tracing::info!(path = %self.path.display(), "created rate log");
        } else {
            self.close_last_row()?;
        }

        self.last_date = self.last_record_date()?;
        Ok(())
    }

    fn read(&self) -> Result<Option<NaiveDate>, StoreError> {
        Ok(cursor_after(self.last_record_date()?))
    }

    fn commit(&mut self, record: &RateRecord) -> Result<(), StoreError> {
        check_order(self.last_date, record)?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut wtr = Self::writer(file);
        wtr.write_record([record.formatted_date(), record.formatted_rate()])?;
        wtr.flush()?;
        let file = wtr.into_inner().map_err(|e| StoreError::Io(e.into_error()))?;
        file.sync_data()?;

        self.last_date = Some(record.date);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<RateRecord>, StoreError> {
        let mut records = Vec::new();
        let mut dropped = 0usize;
        self.for_each_row(|rec| match parse_row(rec) {
            Some(r) => records.push(r),
            None => dropped += 1,
        })?;
        if dropped > 0 {
            tracing::debug!(path = %self.path.display(), dropped, "dropped malformed rows");
        }
        Ok(records)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_rate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_row(rec: &csv::StringRecord) -> Option<RateRecord> {
    let date = parse_date(rec.get(0)?)?;
    let rate = parse_rate(rec.get(1)?)?;
    Some(RateRecord::new(date, rate))
}
