use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run};

use super::{ExportError, ExportFormat};

/// A document holding exactly one paragraph.
///
/// Fragments are separated by line breaks inside that paragraph, so the
/// paragraph text reads as the fragments joined by newlines.
pub fn render(fragments: &[String]) -> Result<Vec<u8>, ExportError> {
    let mut run = Run::new();
    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(fragment);
    }

    let mut buffer = Cursor::new(Vec::new());
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(run))
        .build()
        .pack(&mut buffer)
        .map_err(|e| ExportError::Build {
            format: ExportFormat::WordDocument,
            message: e.to_string(),
        })?;

    Ok(buffer.into_inner())
}
