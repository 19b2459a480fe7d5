use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use crate::domain::entities::record::{column_labels, project_rows, Column, Record};
use crate::domain::entities::scope::FALLBACK_CENTRE_NAME;
use crate::infra::export::csv::write_delimited;
use crate::infra::export::pdf::{layout_document, render_pdf, DocumentSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Delimited,
    Document,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Delimited => "csv",
            ExportFormat::Document => "pdf",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Delimited => "text/csv;charset=utf-8",
            ExportFormat::Document => "application/pdf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// `<ContextLabel>_<ScopeName>_<YYYY-MM-DD>.<ext>`. Every whitespace run in the
/// scope name, leading and trailing ones included, becomes one underscore. A
/// blank scope name is replaced by the fallback centre name.
pub fn export_filename(context_label: &str, scope_name: &str, date: NaiveDate, ext: &str) -> String {
    let scope_name = if scope_name.trim().is_empty() {
        FALLBACK_CENTRE_NAME
    } else {
        scope_name
    };
    let mut scope = String::with_capacity(scope_name.len());
    let mut in_space = false;
    for ch in scope_name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                scope.push('_');
            }
            in_space = true;
        } else {
            scope.push(ch);
            in_space = false;
        }
    }
    format!("{context_label}_{scope}_{}.{ext}", date.format("%Y-%m-%d"))
}

pub fn export_delimited<R: Record>(
    records: &[R],
    columns: &[Column],
    filename: &str,
) -> Result<ExportArtifact> {
    let bytes = write_delimited(&column_labels(columns), &project_rows(records, columns))?;
    Ok(ExportArtifact {
        filename: filename.to_string(),
        mime: ExportFormat::Delimited.mime(),
        bytes,
    })
}

pub fn export_document<R: Record>(
    records: &[R],
    columns: &[Column],
    title: &str,
    filename: &str,
) -> Result<ExportArtifact> {
    export_document_with_header(records, columns, title, &[], filename)
}

/// Document export with extra lines printed under the title.
pub fn export_document_with_header<R: Record>(
    records: &[R],
    columns: &[Column],
    title: &str,
    subtitle_lines: &[String],
    filename: &str,
) -> Result<ExportArtifact> {
    let headers = column_labels(columns);
    let rows = project_rows(records, columns);
    let layout = layout_document(&DocumentSpec {
        title,
        subtitle_lines,
        headers: &headers,
        rows: &rows,
    });
    let bytes = render_pdf(&layout)?;
    Ok(ExportArtifact {
        filename: filename.to_string(),
        mime: ExportFormat::Document.mime(),
        bytes,
    })
}

/// Everything needed to export the current view of a table.
#[derive(Debug, Clone)]
pub struct ExportJob<'a, R: Record> {
    pub records: &'a [R],
    pub columns: &'a [Column],
    pub format: ExportFormat,
    pub context_label: String,
    pub scope_name: String,
    pub title: String,
    pub subtitle_lines: Vec<String>,
    pub generated_at: NaiveDate,
    /// Replaces the generated `<label>_<scope>_<date>` filename.
    pub filename_override: Option<String>,
}

impl<'a, R: Record> ExportJob<'a, R> {
    pub fn new(
        records: &'a [R],
        columns: &'a [Column],
        format: ExportFormat,
        context_label: impl Into<String>,
        scope_name: impl Into<String>,
        generated_at: NaiveDate,
    ) -> Self {
        let context_label = context_label.into();
        let scope_name = scope_name.into();
        let title = format!("{} - {}", context_label.replace('_', " "), scope_name);
        Self {
            records,
            columns,
            format,
            context_label,
            scope_name,
            title,
            subtitle_lines: Vec::new(),
            generated_at,
            filename_override: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_subtitle_lines(mut self, lines: Vec<String>) -> Self {
        self.subtitle_lines = lines;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename_override = Some(filename.into());
        self
    }

    pub fn filename(&self) -> String {
        match &self.filename_override {
            Some(filename) => filename.clone(),
            None => export_filename(
                &self.context_label,
                &self.scope_name,
                self.generated_at,
                self.format.extension(),
            ),
        }
    }

    pub fn render(&self) -> Result<ExportArtifact> {
        let filename = self.filename();
        let artifact = match self.format {
            ExportFormat::Delimited => export_delimited(self.records, self.columns, &filename)?,
            ExportFormat::Document => export_document_with_header(
                self.records,
                self.columns,
                &self.title,
                &self.subtitle_lines,
                &filename,
            )?,
        };
        info!(
            filename = %artifact.filename,
            rows = self.records.len(),
            bytes = artifact.bytes.len(),
            "export rendered"
        );
        Ok(artifact)
    }
}
