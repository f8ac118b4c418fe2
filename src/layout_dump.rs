use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes `value` as JSON to `path`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T, pretty: bool) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            write_to(&mut writer, value, pretty)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_to(&mut writer, value, pretty)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn write_to<W: Write, T: Serialize>(writer: &mut W, value: &T, pretty: bool) -> anyhow::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, value)?;
    } else {
        serde_json::to_writer(writer, value)?;
    }
    Ok(())
}
