//! The Osmosis `.poly` boundary format.
//!
//! Plain text: a label line, then each ring introduced by its zero-based
//! index on its own line, one vertex per line as two whitespace-padded
//! float columns, `END` after each ring and a final `END` closing the
//! file. Both osmconvert and osmosis accept this layout.

use std::io::Write;

use anyhow::{bail, Context, Result};
use geo::LineString;

/// Write one boundary artifact: `label`, then every ring in order.
///
/// Rings are written with all their coordinates, including the closing
/// duplicate of the first vertex.
pub fn write_poly<'a, W, I>(out: &mut W, label: &str, rings: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a LineString<f64>>,
{
    writeln!(out, "{}", label)?;
    for (index, ring) in rings.into_iter().enumerate() {
        writeln!(out, "{}", index)?;
        for coord in ring.coords() {
            writeln!(out, "    {}     {}", coord.x, coord.y)?;
        }
        writeln!(out, "END")?;
    }
    writeln!(out, "END")?;
    Ok(())
}

/// A parsed boundary artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyFile {
    pub label: String,
    pub rings: Vec<Vec<(f64, f64)>>,
}

/// Parse a `.poly` artifact back into its ordered rings.
///
/// Used by tests and by tooling that audits emitted boundaries; the
/// clipping backends parse the files themselves.
pub fn parse_poly(input: &str) -> Result<PolyFile> {
    let mut lines = input.lines();

    let label = match lines.next() {
        Some(l) if !l.trim().is_empty() => l.trim().to_string(),
        _ => bail!("poly file is missing its label line"),
    };

    let mut rings = Vec::new();
    loop {
        let header = match lines.next() {
            Some(l) => l.trim(),
            None => bail!("poly file ended before the final END"),
        };
        if header == "END" {
            break;
        }
        let _index: usize = header
            .parse()
            .with_context(|| format!("expected ring index or END, got {:?}", header))?;

        let mut ring = Vec::new();
        loop {
            let line = match lines.next() {
                Some(l) => l.trim(),
                None => bail!("ring {} ended before END", rings.len()),
            };
            if line == "END" {
                break;
            }
            let mut cols = line.split_whitespace();
            let (lon, lat) = match (cols.next(), cols.next()) {
                (Some(lon), Some(lat)) => (lon, lat),
                _ => bail!("malformed vertex line {:?}", line),
            };
            ring.push((
                lon.parse::<f64>()
                    .with_context(|| format!("bad longitude {:?}", lon))?,
                lat.parse::<f64>()
                    .with_context(|| format!("bad latitude {:?}", lat))?,
            ));
        }
        rings.push(ring);
    }

    Ok(PolyFile { label, rings })
}
