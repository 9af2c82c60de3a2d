use crate::core::offset::OffsetMatrix;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OffsetCsvError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{labels} row labels given for a {rows}-row matrix")]
    LabelCount { labels: usize, rows: usize },
}

/// Writes `matrix` row by row. With `labels`, a header row and a leading label column are added.
pub fn write_offset_csv<W: Write>(
    matrix: &OffsetMatrix,
    labels: Option<&[i64]>,
    writer: W,
) -> Result<(), OffsetCsvError> {
    if let Some(labels) = labels {
        if labels.len() != matrix.nrows() || labels.len() != matrix.ncols() {
            return Err(OffsetCsvError::LabelCount {
                labels: labels.len(),
                rows: matrix.nrows(),
            });
        }
    }

    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    if let Some(labels) = labels {
        let header = std::iter::once(String::new()).chain(labels.iter().map(i64::to_string));
        csv_writer.write_record(header)?;
    }

    for (i, row) in matrix.row_iter().enumerate() {
        let label = labels.map(|l| l[i].to_string());
        let cells = label.into_iter().chain(row.iter().map(i64::to_string));
        csv_writer.write_record(cells)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_offset_csv_to_path(
    matrix: &OffsetMatrix,
    labels: Option<&[i64]>,
    path: &Path,
) -> Result<(), OffsetCsvError> {
    let file = std::fs::File::create(path)?;
    write_offset_csv(matrix, labels, std::io::BufWriter::new(file))
}
