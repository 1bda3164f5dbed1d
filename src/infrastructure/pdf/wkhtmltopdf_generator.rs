use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::domain::bill::{BillError, PdfGenerator};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Renders HTML to PDF by piping it through the `wkhtmltopdf` binary.
pub struct WkHtmlToPdfGenerator {
  wkhtmltopdf_path: String,
  page_size: String,
}

impl WkHtmlToPdfGenerator {
  pub fn new(wkhtmltopdf_path: Option<String>, page_size: Option<String>) -> Self {
    Self {
      wkhtmltopdf_path: wkhtmltopdf_path.unwrap_or_else(|| "wkhtmltopdf".to_string()),
      page_size: page_size.unwrap_or_else(|| "A4".to_string()),
    }
  }

  fn args(&self) -> Vec<&str> {
    vec![
      "--page-size",
      &self.page_size,
      "--margin-top",
      "10mm",
      "--margin-bottom",
      "10mm",
      "--margin-left",
      "10mm",
      "--margin-right",
      "10mm",
      "--encoding",
      "utf-8",
      "--quiet",
      // read HTML from stdin, write PDF to stdout
      "-",
      "-",
    ]
  }
}

#[async_trait]
impl PdfGenerator for WkHtmlToPdfGenerator {
  async fn generate_pdf(&self, html: &str) -> Result<Vec<u8>, BillError> {
    let mut child = Command::new(&self.wkhtmltopdf_path)
      .args(self.args())
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .map_err(|e| {
        BillError::PdfGenerationFailed(format!(
          "wkhtmltopdf not found at '{}': {}. Please install wkhtmltopdf.",
          self.wkhtmltopdf_path, e
        ))
      })?;

    let mut stdin = child
      .stdin
      .take()
      .ok_or_else(|| BillError::PdfGenerationFailed("wkhtmltopdf stdin unavailable".to_string()))?;
    let input = html.as_bytes().to_vec();
    // Fed from a separate task so a full stdout pipe cannot block the write
    let writer = tokio::spawn(async move {
      stdin.write_all(&input).await?;
      stdin.shutdown().await
    });

    let output = child.wait_with_output().await.map_err(|e| {
      BillError::PdfGenerationFailed(format!("wkhtmltopdf execution failed: {}", e))
    })?;

    writer
      .await
      .map_err(|e| BillError::PdfGenerationFailed(format!("HTML writer task failed: {}", e)))?
      .map_err(|e| BillError::PdfGenerationFailed(format!("Failed to write HTML: {}", e)))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(BillError::PdfGenerationFailed(format!(
        "wkhtmltopdf failed: {}",
        stderr
      )));
    }

    if !output.stdout.starts_with(PDF_MAGIC) {
      return Err(BillError::PdfGenerationFailed(
        "wkhtmltopdf did not produce a PDF document".to_string(),
      ));
    }

    tracing::debug!(bytes = output.stdout.len(), "wkhtmltopdf finished");
    Ok(output.stdout)
  }
}
