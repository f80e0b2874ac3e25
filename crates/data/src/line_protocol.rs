//! InfluxDB line protocol output.

use amm_hedge_domain::metrics::MetricPoint;
use amm_hedge_domain::ports::{MetricsSink, SinkError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn escape(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Formats a point as one line, without the trailing newline.
///
/// Tags and fields come out in key order; timestamps are nanoseconds.
pub fn format_point(point: &MetricPoint) -> Result<String, SinkError> {
    if point.fields.is_empty() {
        return Err(SinkError::Write(format!(
            "point `{}` has no fields",
            point.measurement
        )));
    }
    let nanos = point.timestamp.timestamp_nanos_opt().ok_or_else(|| {
        SinkError::Write(format!("timestamp {} out of range", point.timestamp))
    })?;

    let mut line = escape(&point.measurement, &[',', ' ']);
    for (key, value) in &point.tags {
        line.push(',');
        line.push_str(&escape(key, &[',', '=', ' ']));
        line.push('=');
        line.push_str(&escape(value, &[',', '=', ' ']));
    }

    let fields: Vec<String> = point
        .fields
        .iter()
        .map(|(key, value)| format!("{}={value}", escape(key, &[',', '=', ' '])))
        .collect();
    line.push(' ');
    line.push_str(&fields.join(","));
    line.push(' ');
    line.push_str(&nanos.to_string());
    Ok(line)
}

/// Writes metric points as line protocol to any writer.
pub struct LineProtocolSink<W: Write> {
    writer: W,
    lines: u64,
}

impl LineProtocolSink<BufWriter<File>> {
    /// Creates (or truncates) a line protocol file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| SinkError::Write(format!("could not create {}: {e}", path.display())))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> LineProtocolSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// Lines written so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsSink for LineProtocolSink<W> {
    fn write(&mut self, point: &MetricPoint) -> Result<(), SinkError> {
        let line = format_point(point)?;
        writeln!(self.writer, "{line}").map_err(|e| SinkError::Write(e.to_string()))?;
        self.lines += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer
            .flush()
            .map_err(|e| SinkError::Write(e.to_string()))
    }
}
