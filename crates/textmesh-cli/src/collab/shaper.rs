//! Subprocess client for the shaping/layout tool
//!
//! One tool invocation per page. The request goes to the tool's stdin
//! as a small line protocol; face names go last on their lines because
//! they may contain spaces:
//!
//! ```text
//! page <width> <height>
//! run <start> <end> <pointSize> <lineHeight> <face>     (one per style run)
//! text <byteLen>
//! <raw page text>
//! ```
//!
//! The tool answers one line per glyph it placed, again face-last:
//!
//! ```text
//! glyph <sourceOffset> <glyphIndex> <x0> <y0> <x1> <y1> <face>
//! ```
//!
//! A non-zero exit or any unparseable line fails the compile.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::debug;

use textmesh_core::error::{CollabError, Result};
use textmesh_core::traits::{PageInput, ShapingService};
use textmesh_core::types::{Quad, ShapedGlyph};

pub struct ShapeTool {
    tool: PathBuf,
}

impl ShapeTool {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }
}

impl ShapingService for ShapeTool {
    fn name(&self) -> &'static str {
        "shape-tool"
    }

    fn shape_page(&self, page: &PageInput<'_>) -> Result<Vec<ShapedGlyph>> {
        debug!("shaping {} byte(s) in {} run(s)", page.text.len(), page.runs.len());

        let mut child = Command::new(&self.tool)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|err| CollabError::Shaping(format!("{}: {err}", self.tool.display())))?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| CollabError::Shaping("tool stdin unavailable".into()))?;
            let mut request = String::new();
            request.push_str(&format!("page {} {}\n", page.width, page.height));
            for run in &page.runs {
                request.push_str(&format!(
                    "run {} {} {} {} {}\n",
                    run.start, run.end, run.style.point_size, run.style.line_height, run.style.face
                ));
            }
            request.push_str(&format!("text {}\n", page.text.len()));
            request.push_str(page.text);
            stdin
                .write_all(request.as_bytes())
                .map_err(|err| CollabError::Shaping(format!("writing request: {err}")))?;
            // Dropping stdin closes the pipe; the tool sees EOF.
        }

        let output = child
            .wait_with_output()
            .map_err(|err| CollabError::Shaping(format!("waiting for tool: {err}")))?;
        if !output.status.success() {
            return Err(
                CollabError::Shaping(format!("tool exited with {}", output.status)).into(),
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut glyphs = Vec::new();
        for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
            glyphs.push(parse_glyph_line(line)?);
        }
        Ok(glyphs)
    }
}

fn parse_glyph_line(line: &str) -> Result<ShapedGlyph> {
    let malformed = || CollabError::Shaping(format!("unparseable glyph line: '{line}'"));

    let rest = line.strip_prefix("glyph ").ok_or_else(malformed)?;
    let mut parts = rest.splitn(7, ' ');
    let mut next = || parts.next().ok_or_else(malformed);

    let source_offset = next()?.parse().map_err(|_| malformed())?;
    let glyph = next()?.parse().map_err(|_| malformed())?;
    let x0 = next()?.parse().map_err(|_| malformed())?;
    let y0 = next()?.parse().map_err(|_| malformed())?;
    let x1 = next()?.parse().map_err(|_| malformed())?;
    let y1 = next()?.parse().map_err(|_| malformed())?;
    let face = next()?.trim();
    if face.is_empty() {
        return Err(malformed().into());
    }

    Ok(ShapedGlyph {
        source_offset,
        face: face.to_string(),
        glyph,
        quad: Quad { x0, y0, x1, y1 },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_glyph_line() {
        let glyph = parse_glyph_line("glyph 4 72 10.5 0 18.25 12 Some Face").unwrap();
        assert_eq!(glyph.source_offset, 4);
        assert_eq!(glyph.glyph, 72);
        assert_eq!(glyph.face, "Some Face");
        assert_eq!(glyph.quad, Quad { x0: 10.5, y0: 0.0, x1: 18.25, y1: 12.0 });
    }

    #[test]
    fn rejects_wrong_prefixes_and_short_lines() {
        assert!(parse_glyph_line("vertex 1 2 3").is_err());
        assert!(parse_glyph_line("glyph 4 72 10.5 0 18.25 12").is_err());
        assert!(parse_glyph_line("glyph four 72 0 0 1 1 F").is_err());
    }
}
