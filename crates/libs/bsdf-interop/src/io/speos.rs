//! Reader and writer for the Speos anisotropic BSDF text grammar.
//!
//! The reader understands the v8 grammar (`.anisotropicbsdf` / `.brdf`);
//! older files must be re-saved with a compatible viewer. The writer emits
//! the fixed v7.0 header the conversion pipeline has always produced; the
//! two grammars are intentionally asymmetric.

use super::{parse_floats, LineReader};
use crate::{
    data::{BsdfBlock, BsdfDataset, TisTable},
    error::Error,
    ScatterType, Symmetry,
};
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

const DESCRIPTION: &str = "Measurement description";

/// Reads a Speos BSDF file into one canonical dataset per scatter type.
///
/// A file with both the reflection and the transmission flag set carries two
/// stacked sections; they come back as two typed datasets rather than one
/// doubled index range. `is_brdf` tells the reader the file follows the
/// `.brdf` extension convention; both conventions store asymmetrical data.
pub fn read<P: AsRef<Path>>(path: P, is_brdf: bool) -> Result<Vec<BsdfDataset>, Error> {
    read_from(BufReader::new(File::open(path.as_ref())?), is_brdf)
}

/// Reads the Speos v8 grammar from a buffered stream.
pub fn read_from<R: BufRead>(reader: R, is_brdf: bool) -> Result<Vec<BsdfDataset>, Error> {
    let mut lines = LineReader::new(reader);
    log::debug!(
        "reading Speos BSDF, {} extension convention",
        if is_brdf { ".brdf" } else { ".anisotropicbsdf" }
    );
    let symmetry = Symmetry::Asymmetrical;

    // Line 1: descriptive header ending in the version token.
    let header = lines.next_line()?;
    let version = header
        .split_whitespace()
        .last()
        .and_then(|token| token.strip_prefix('v'))
        .and_then(|token| token.parse::<f64>().ok())
        .ok_or_else(|| {
            Error::MalformedHeader(format!("missing version token in '{header}'"))
        })?;
    if version < 8.0 {
        return Err(Error::UnsupportedVersion { found: version });
    }

    // Line 2: text/binary flag.
    let flag_line = lines.next_line()?;
    let encoding: i64 = flag_line
        .split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| Error::MalformedHeader("missing text/binary flag".to_string()))?;
    if encoding == 0 {
        return Err(Error::BinaryData);
    }

    let _comment = lines.next_line()?;
    let _description_length = lines.next_line()?;
    let _description = lines.next_line()?;

    // Line 6: reflection / transmission boolean pair.
    let flags = lines.next_line()?;
    let mut flag_tokens = flags.split_whitespace();
    let has_reflection = flag_tokens.next() == Some("1");
    let has_transmission = flag_tokens.next() == Some("1");
    let mut sections = Vec::new();
    if has_reflection {
        sections.push(ScatterType::Brdf);
    }
    if has_transmission {
        sections.push(ScatterType::Btdf);
    }
    if sections.is_empty() {
        return Err(Error::MalformedHeader(
            "neither the reflection nor the transmission flag is set".to_string(),
        ));
    }

    // Line 7: value type flag (bsdf vs intensity), not needed for conversion.
    let _value_type = lines.next_line()?;

    // Line 8: incidence and wavelength counts, lines 9-10: the axes.
    let counts_line = lines.next_line()?;
    let counts = parse_floats(&counts_line, lines.line_no())?;
    if counts.len() < 2 {
        return Err(Error::MalformedHeader(format!(
            "expected incidence and wavelength counts, got '{counts_line}'"
        )));
    }
    let (declared_incidences, declared_wavelengths) = (counts[0] as usize, counts[1] as usize);
    let line = lines.next_content()?;
    let incidences = parse_floats(&line, lines.line_no())?;
    let line = lines.next_content()?;
    let wavelengths = parse_floats(&line, lines.line_no())?;
    if incidences.len() != declared_incidences {
        log::warn!(
            "wrong data for incidence angles: declared {declared_incidences}, parsed {}",
            incidences.len()
        );
    }
    if wavelengths.len() != declared_wavelengths {
        log::warn!(
            "wrong data for wavelengths: declared {declared_wavelengths}, parsed {}",
            wavelengths.len()
        );
    }
    if incidences.is_empty() {
        return Err(Error::EmptyAxis("incidence"));
    }
    if wavelengths.is_empty() {
        return Err(Error::EmptyAxis("wavelength"));
    }

    // Data section: per (section * incidence, wavelength) one TIS scalar,
    // a shape line, the azimuth axis row and radial-major rows that get
    // transposed into the azimuth-major canonical layout.
    let n_blocks = sections.len() * incidences.len() * wavelengths.len();
    let mut raw: Vec<Option<(f64, BsdfBlock)>> = Vec::with_capacity(n_blocks);
    for _ in 0..sections.len() * incidences.len() {
        for _ in 0..wavelengths.len() {
            raw.push(Some(read_block(&mut lines)?));
        }
    }

    // Re-order each section to the canonical wavelength-major block order.
    let n_inc = incidences.len();
    let n_wav = wavelengths.len();
    let datasets = sections
        .iter()
        .enumerate()
        .map(|(s, &scatter_type)| {
            let mut tis = TisTable::new(n_wav, n_inc);
            let mut blocks = Vec::with_capacity(n_wav * n_inc);
            for w in 0..n_wav {
                for j in 0..n_inc {
                    let (tis_value, block) = raw[(s * n_inc + j) * n_wav + w]
                        .take()
                        .unwrap_or((0.0, BsdfBlock::new(Vec::new(), Vec::new())));
                    tis.set(w, j, tis_value);
                    blocks.push(block);
                }
            }
            BsdfDataset {
                scatter_type,
                symmetry,
                rotations: wavelengths.clone(),
                incidences: incidences.clone(),
                blocks,
                tis,
            }
        })
        .collect();
    Ok(datasets)
}

fn read_block<R: BufRead>(lines: &mut LineReader<R>) -> Result<(f64, BsdfBlock), Error> {
    let tis_line = lines.next_content()?;
    let tis: f64 = tis_line.trim().parse().map_err(|_| {
        Error::MalformedData(format!(
            "invalid TIS value '{}' on line {}",
            tis_line.trim(),
            lines.line_no()
        ))
    })?;

    let shape_line = lines.next_content()?;
    let shape = parse_floats(&shape_line, lines.line_no())?;
    if shape.len() < 2 {
        return Err(Error::MalformedData(format!(
            "expected 'radialCount azimuthCount' on line {}, got '{shape_line}'",
            lines.line_no()
        )));
    }
    let (n_radial, declared_azimuths) = (shape[0] as usize, shape[1] as usize);
    if n_radial == 0 {
        return Err(Error::MalformedData(format!(
            "block on line {} declares zero radial samples",
            lines.line_no()
        )));
    }

    let line = lines.next_content()?;
    let azimuth = parse_floats(&line, lines.line_no())?;
    if azimuth.len() != declared_azimuths {
        log::warn!(
            "wrong data for scatter azimuth: declared {declared_azimuths}, parsed {}",
            azimuth.len()
        );
    }
    if azimuth.is_empty() {
        return Err(Error::MalformedData(format!(
            "block on line {} has an empty azimuth row",
            lines.line_no()
        )));
    }

    let mut radial = Vec::with_capacity(n_radial);
    let mut rows = Vec::with_capacity(n_radial);
    for _ in 0..n_radial {
        let line = lines.next_content()?;
        let mut row = parse_floats(&line, lines.line_no())?;
        if row.len() != azimuth.len() + 1 {
            return Err(Error::MalformedData(format!(
                "data row on line {} has {} values, expected a radial angle plus {} samples",
                lines.line_no(),
                row.len(),
                azimuth.len()
            )));
        }
        radial.push(row.remove(0));
        rows.push(row);
    }

    let mut block = BsdfBlock::new(radial, azimuth);
    for (r, row) in rows.into_iter().enumerate() {
        for (a, value) in row.into_iter().enumerate() {
            block.set(a, r, value);
        }
    }
    Ok((tis, block))
}

/// Writes a resampled dataset as a Speos anisotropic BSDF file.
pub fn write<P: AsRef<Path>>(path: P, dataset: &BsdfDataset) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_to(&mut writer, dataset)
}

/// Writes the fixed v7.0 Speos grammar to a stream.
///
/// The value-type flag is 1 for BRDF and 0 for BTDF and transmission values
/// are cosine pre-multiplied; both asymmetries are format quirks the
/// consuming tools expect. The 2-point wavelength spectrum is synthesized
/// from the first TIS entry.
pub fn write_to<W: Write>(w: &mut W, dataset: &BsdfDataset) -> Result<(), Error> {
    if dataset.incidences.is_empty() {
        return Err(Error::EmptyAxis("incidence"));
    }
    if dataset.blocks.is_empty() {
        return Err(Error::EmptyAxis("scatter radial"));
    }

    writeln!(w, "OPTIS - Anisotropic BSDF surface file v7.0")?;
    // Binary mode flag: text only.
    writeln!(w, "0")?;
    writeln!(w, "Comment")?;
    writeln!(w, "{}", DESCRIPTION.len())?;
    writeln!(w, "{DESCRIPTION}")?;
    // Anisotropy vector.
    writeln!(w, "0\t1\t0")?;
    match dataset.scatter_type {
        ScatterType::Brdf => {
            writeln!(w, "1\t0")?;
            writeln!(w, "1")?;
        },
        ScatterType::Btdf => {
            writeln!(w, "0\t1")?;
            writeln!(w, "0")?;
        },
    }
    writeln!(w, "{}", dataset.rotations.len())?;
    for rotation in &dataset.rotations {
        write!(w, "{rotation}\t")?;
    }
    if !dataset.rotations.is_empty() {
        writeln!(w)?;
    }
    for _ in 0..dataset.rotations.len() {
        writeln!(w, "{}", dataset.incidences.len())?;
        for incidence in &dataset.incidences {
            write!(w, "{incidence}\t")?;
        }
        writeln!(w)?;
    }
    // Theta and phi of the measurement.
    writeln!(w, "{}\t0", dataset.incidences[0])?;
    // Synthetic spectrum from the first TIS entry.
    writeln!(w)?;
    writeln!(w, "2")?;
    let percent = 100.0 * dataset.tis.get(0, 0);
    writeln!(w, "350\t{percent}")?;
    writeln!(w, "850\t{percent}")?;

    for i in 0..dataset.n_rotations() {
        for j in 0..dataset.n_incidences() {
            let block = dataset.block(i, j);
            writeln!(w, "{} {}", block.n_radial(), block.n_azimuth())?;
            for phi in &block.azimuth {
                write!(w, "\t{phi}")?;
            }
            writeln!(w)?;
            for (r, theta) in block.radial.iter().enumerate() {
                write!(w, "{theta}")?;
                let weight = if dataset.scatter_type.is_transmission() {
                    ((180.0 - theta) * std::f64::consts::PI / 180.0).cos()
                } else {
                    1.0
                };
                for a in 0..block.n_azimuth() {
                    write!(w, "\t{}", weight * block.value(a, r))?;
                }
                writeln!(w)?;
            }
        }
    }
    writeln!(w, "End of file")?;
    Ok(())
}
