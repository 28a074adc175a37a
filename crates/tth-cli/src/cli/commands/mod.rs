//! CLI command handlers.

use anyhow::Result;
use tth_core::core::turn::MarkupSink;

pub mod ask;
pub mod config;
pub mod render;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>tth</title>
<style>
body { font-family: "Courier New", monospace; font-size: 11pt; }
.code-block { margin: 4px 0; padding: 8px; background: #f0f0f0; border-radius: 2px; font-family: monospace; }
</style>
</head>
<body>
"#;

const PAGE_TAIL: &str = "\n</body>\n</html>";

/// Writes the document prologue when `--page` is set.
fn begin_output(sink: &mut dyn MarkupSink, page: bool) -> Result<()> {
    if page {
        sink.append(PAGE_HEAD)?;
    }
    Ok(())
}

/// Writes the document epilogue (when `--page` is set) and a final newline.
fn end_output(sink: &mut dyn MarkupSink, page: bool) -> Result<()> {
    if page {
        sink.append(PAGE_TAIL)?;
    }
    sink.append("\n")
}
