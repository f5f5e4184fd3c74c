use super::OutputFormat;
use crate::error::Result;
use crate::sql::QueryResult;
use serde_json::Value;
use std::io::Write;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Writes query results in the selected format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn write_result(&mut self, result: &QueryResult) -> Result<()> {
        match self.format {
            OutputFormat::Table => self.write_table(result),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&result.to_json_array())?;
                writeln!(self.writer, "{json}")?;
                Ok(())
            }
            OutputFormat::Jsonl => {
                for row in result.to_json_array() {
                    writeln!(self.writer, "{}", serde_json::to_string(&row)?)?;
                }
                Ok(())
            }
            OutputFormat::Csv => self.write_csv(result),
        }
    }

    fn write_table(&mut self, result: &QueryResult) -> Result<()> {
        if result.is_empty() {
            writeln!(self.writer, "No results")?;
            return Ok(());
        }

        let mut builder = Builder::default();
        builder.push_record(result.columns.iter().map(String::as_str));
        for row in &result.rows {
            builder.push_record(row.iter().map(|v| truncate_string(&cell(v), 60)));
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        writeln!(self.writer, "{table}")?;
        Ok(())
    }

    fn write_csv(&mut self, result: &QueryResult) -> Result<()> {
        let mut csv = csv::Writer::from_writer(&mut self.writer);
        csv.write_record(&result.columns)?;
        for row in &result.rows {
            csv.write_record(row.iter().map(cell))?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn writeln(&mut self, text: &str) -> Result<()> {
        writeln!(self.writer, "{text}")?;
        Ok(())
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn truncate_string(s: &str, max_len: usize) -> String {
    let single_line = s.replace('\n', " ");
    if single_line.chars().count() > max_len {
        format!(
            "{}...",
            single_line.chars().take(max_len.saturating_sub(3)).collect::<String>()
        )
    } else {
        single_line
    }
}
