use std::path::{Path, PathBuf};

use chrono::Utc;
use rifa_core::export::{render_sales_export, suggested_export_file_name};

use crate::cli::ExportFormat;
use crate::commands::common::{open_service, open_store};
use crate::config::AppContext;
use crate::error::CliError;

pub async fn run_export(
    ctx: &AppContext,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let service = open_service(ctx, open_store(ctx)?)?;
    let sales = service.sales().await;
    let rendered = render_sales_export(&sales, format.into())?;

    if let Some(path) = output_path {
        let path = resolve_export_path(path, format, Utc::now().timestamp_millis());
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{}", rendered.trim_end());
    }

    Ok(())
}

/// A directory target gets a generated `rifa-export-{ms}.{ext}` file name
pub fn resolve_export_path(path: &Path, format: ExportFormat, timestamp_ms: i64) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(format.into(), timestamp_ms))
    } else {
        path.to_path_buf()
    }
}
