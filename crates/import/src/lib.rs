pub mod csv;
pub mod ofx;

pub use csv::{ImportError, IssueKind, RowError, RowIssue, StatementBuilder};
pub use ofx::{Markup, write_sgml, write_xml};

pub mod import {
    use crate::*;
    use ofxify_core::{Settings, Statement};

    /// Builds a statement from comma-separated input in one pass.
    pub fn import_csv<R: std::io::Read>(
        data: R,
        settings: &Settings,
    ) -> Result<(Statement, Vec<RowIssue>), ImportError> {
        let mut builder = StatementBuilder::new(settings);
        builder.ingest_csv(data)?;
        Ok(builder.finish())
    }

    /// Renders a statement fully in memory, so callers never write a partial document.
    pub fn render(statement: &Statement, markup: Markup) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        crate::ofx::write(&mut out, statement, markup)?;
        Ok(out)
    }
}
