use crate::cli::OffsetArgs;
use crate::error::{CliError, Result};
use cyclobind::core::io::offset_csv::{OffsetCsvError, write_offset_csv, write_offset_csv_to_path};
use cyclobind::core::offset::{
    ChainLayout, OffsetMatrix, SignConvention, apply_cyclic_offset, binder_block, linear_offset,
};
use cyclobind::engine::error::EngineError;
use tracing::info;

pub fn run(args: OffsetArgs) -> Result<()> {
    let (matrix, labels) = build_offset(&args)?;
    info!(
        rows = matrix.nrows(),
        legacy = args.legacy,
        "Cyclic offset built."
    );

    match &args.output {
        Some(path) => {
            write_offset_csv_to_path(&matrix, Some(&labels), path)
                .map_err(|e| csv_error(e, "write offset CSV"))?;
            println!("Offset matrix written to: {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_offset_csv(&matrix, Some(&labels), stdout.lock())
                .map_err(|e| csv_error(e, "write offset CSV to stdout"))?;
        }
    }
    Ok(())
}

/// Builds the complex offset with its cyclic binder block, plus the residue index of every
/// row for labelling.
fn build_offset(args: &OffsetArgs) -> Result<(OffsetMatrix, Vec<i64>)> {
    let layout = ChainLayout::new(args.target_len, args.binder_len);
    let convention = if args.legacy {
        SignConvention::Legacy
    } else {
        SignConvention::BugFixed
    };

    let residue_index = layout.residue_index();
    let mut matrix = linear_offset(&residue_index);
    apply_cyclic_offset(&mut matrix, layout, args.binder_len, convention)
        .map_err(EngineError::from)?;

    if args.binder_only {
        let labels = residue_index[layout.binder_start()..].to_vec();
        Ok((binder_block(&matrix, layout), labels))
    } else {
        Ok((matrix, residue_index))
    }
}

fn csv_error(err: OffsetCsvError, action: &str) -> CliError {
    match err {
        OffsetCsvError::Io(io) => CliError::Io(io),
        other => CliError::Other(anyhow::Error::new(other).context(format!("Failed to {}", action))),
    }
}
