//! Reader and writer for the Zemax BSDF text grammar.
//!
//! The grammar is a fixed sequence of labeled header lines, each possibly
//! preceded by `#` comment lines, followed by a data section between the
//! `DataBegin` and `DataEnd` sentinels. Header labels are matched by token
//! rather than by byte offset; the format revisions disagree on the offsets,
//! structural tokenization sidesteps the question.

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
    str::FromStr,
};

/// Reads a Zemax BSDF file into a canonical dataset.
pub fn read<P: AsRef<Path>>(path: P) -> Result<BsdfDataset, Error> {
    read_from(BufReader::new(File::open(path.as_ref())?))
}

/// Reads the Zemax grammar from a buffered stream.
pub fn read_from<R: BufRead>(reader: R) -> Result<BsdfDataset, Error> {
    let mut lines = LineReader::new(reader);

    let source = labeled_value(&lines.next_content()?, "Source")?;
    log::debug!("source: {source}");
    let symmetry = match Symmetry::from_str(&labeled_value(&lines.next_content()?, "Symmetry")?) {
        Ok(symmetry) => symmetry,
        Err(err) => {
            // Unknown symmetry behaves like unfolded azimuth downstream.
            log::warn!("{err}; continuing as Asymmetrical");
            Symmetry::Asymmetrical
        },
    };
    let spectral_content = labeled_value(&lines.next_content()?, "SpectralContent")?;
    log::debug!("spectral content: {spectral_content}");
    let scatter_type =
        ScatterType::from_str(&labeled_value(&lines.next_content()?, "ScatterType")?)?;

    let rotations = counted_axis(&mut lines, "SampleRotation")?;
    let incidences = counted_axis(&mut lines, "AngleOfIncidence")?;
    let azimuth = counted_axis(&mut lines, "ScatterAzimuth")?;
    let radial = counted_axis(&mut lines, "ScatterRadial")?;
    log::debug!(
        "Zemax header: {} {} rotations, {} incidences, {} azimuth x {} radial samples",
        scatter_type,
        rotations.len(),
        incidences.len(),
        azimuth.len(),
        radial.len(),
    );

    // Skip ahead to the data sentinel.
    loop {
        if lines.next_line()?.trim_start().starts_with("DataBegin") {
            break;
        }
    }

    let mut tis = TisTable::new(rotations.len(), incidences.len());
    let mut blocks = Vec::with_capacity(rotations.len() * incidences.len());
    for i in 0..rotations.len() {
        for j in 0..incidences.len() {
            tis.set(i, j, tis_value(&mut lines)?);
            // One row of radial samples per azimuth sample.
            let mut rows = Vec::with_capacity(azimuth.len());
            for _ in 0..azimuth.len() {
                let line = lines.next_content()?;
                let row = parse_floats(&line, lines.line_no())?;
                if row.len() != radial.len() {
                    return Err(Error::MalformedData(format!(
                        "data row on line {} has {} values, expected {}",
                        lines.line_no(),
                        row.len(),
                        radial.len()
                    )));
                }
                rows.push(row);
            }
            blocks.push(BsdfBlock::from_rows(radial.clone(), azimuth.clone(), rows));
        }
    }

    Ok(BsdfDataset {
        scatter_type,
        symmetry,
        rotations,
        incidences,
        blocks,
        tis,
    })
}

/// Verifies the label token of a header line and returns the remainder.
fn labeled_value(line: &str, label: &str) -> Result<String, Error> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some(label) {
        return Err(Error::MalformedHeader(format!(
            "expected '{label}' header line, got '{line}'"
        )));
    }
    Ok(tokens.collect::<Vec<_>>().join(" "))
}

/// Reads a `<Label> <count>` line and its values line.
///
/// A count that does not match the parsed token count is a non-fatal
/// warning; the parsed values are used downstream, which keeps every index
/// in range.
fn counted_axis<R: BufRead>(lines: &mut LineReader<R>, label: &str) -> Result<Vec<f64>, Error> {
    let declared: usize = labeled_value(&lines.next_content()?, label)?
        .trim()
        .parse()
        .map_err(|_| Error::MalformedHeader(format!("invalid {label} count")))?;
    let line = lines.next_content()?;
    let values = parse_floats(&line, lines.line_no())?;
    if values.len() != declared {
        log::warn!(
            "wrong data for {label}: declared {declared} values, parsed {}",
            values.len()
        );
    }
    Ok(values)
}

fn tis_value<R: BufRead>(lines: &mut LineReader<R>) -> Result<f64, Error> {
    let line = lines.next_content()?;
    let line_no = lines.line_no();
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("TIS") {
        return Err(Error::MalformedData(format!(
            "expected TIS line at line {line_no}, got '{line}'"
        )));
    }
    tokens
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| Error::MalformedData(format!("invalid TIS value on line {line_no}")))
}

/// Writes a single-wavelength dataset as a Zemax BSDF file.
///
/// The dataset is expected in the shape the Speos-to-Zemax pipeline
/// produces: one synthetic rotation, uniform resampled axes shared by every
/// block and TIS values already on the `[0, 1]` scale.
pub fn write<P: AsRef<Path>>(
    path: P,
    dataset: &BsdfDataset,
    wavelength: f64,
) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_to(&mut writer, dataset, wavelength)
}

/// Writes the Zemax grammar to a stream.
pub fn write_to<W: Write>(w: &mut W, dataset: &BsdfDataset, wavelength: f64) -> Result<(), Error> {
    let first = dataset
        .blocks
        .first()
        .ok_or(Error::EmptyAxis("scatter radial"))?;

    writeln!(w, "#Data converted from Speos data")?;
    writeln!(w, "#Wavelength (nm) = {wavelength}")?;
    writeln!(w, "Source  Measured")?;
    writeln!(w, "Symmetry  {}", dataset.symmetry)?;
    writeln!(w, "SpectralContent  Monochrome")?;
    writeln!(w, "ScatterType  {}", dataset.scatter_type)?;
    writeln!(w, "SampleRotation  {}", dataset.rotations.len())?;
    axis_row(w, &dataset.rotations)?;
    writeln!(w, "AngleOfIncidence  {}", dataset.incidences.len())?;
    axis_row(w, &dataset.incidences)?;
    writeln!(w, "ScatterAzimuth {}", first.n_azimuth())?;
    axis_row(w, &first.azimuth)?;
    writeln!(w, "ScatterRadial {}", first.n_radial())?;
    axis_row(w, &first.radial)?;
    writeln!(w)?;
    writeln!(w, "Monochrome")?;
    writeln!(w, "DataBegin")?;

    for i in 0..dataset.n_rotations() {
        for j in 0..dataset.n_incidences() {
            writeln!(w, "TIS {}", round3(dataset.tis.get(i, j)))?;
            let block = dataset.block(i, j);
            for a in 0..block.n_azimuth() {
                for r in 0..block.n_radial() {
                    let sep = if r + 1 == block.n_radial() { "\n" } else { "\t" };
                    write!(w, "{}{sep}", sci3(block.value(a, r)))?;
                }
            }
        }
    }
    writeln!(w, "DataEnd")?;
    Ok(())
}

fn axis_row<W: Write>(w: &mut W, values: &[f64]) -> Result<(), Error> {
    for value in values {
        write!(w, "{value}\t")?;
    }
    writeln!(w)?;
    Ok(())
}

fn round3(value: f64) -> f64 { (value * 1000.0).round() / 1000.0 }

/// Formats a value in scientific notation with three fractional digits and
/// a signed two-digit exponent, e.g. `1.250e-02`.
fn sci3(value: f64) -> String {
    let formatted = format!("{value:.3e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        },
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
#Example scattering data
Source  Measured
Symmetry  PlaneSymmetrical
SpectralContent  Monochrome
ScatterType  BRDF
SampleRotation  2
0\t90
#A comment before the incidence block
AngleOfIncidence  2
0\t30
ScatterAzimuth  3
0\t90\t180
ScatterRadial  4
0\t30\t60\t90
Monochrome
DataBegin
TIS 0.5
1\t2\t3\t4
5\t6\t7\t8
9\t10\t11\t12
TIS 0.4
0\t0\t0\t0
0\t0\t0\t0
0\t0\t0\t0
TIS 0.3
1\t1\t1\t1
1\t1\t1\t1
1\t1\t1\t1
TIS 0.2
2\t2\t2\t2
2\t2\t2\t2
2\t2\t2\t2
DataEnd
";

    #[test]
    fn reads_header_and_blocks() {
        let dataset = read_from(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(dataset.scatter_type, ScatterType::Brdf);
        assert_eq!(dataset.symmetry, Symmetry::PlaneSymmetrical);
        assert_eq!(dataset.rotations, vec![0.0, 90.0]);
        assert_eq!(dataset.incidences, vec![0.0, 30.0]);
        assert_eq!(dataset.blocks.len(), 4);
        assert_eq!(dataset.tis.get(0, 0), 0.5);
        assert_eq!(dataset.tis.get(1, 1), 0.2);
        // Rows are azimuth-major: row 1 is the second azimuth sample.
        assert_eq!(dataset.block(0, 0).value(1, 2), 7.0);
        assert_eq!(dataset.block(1, 1).value(2, 3), 2.0);
    }

    #[test]
    fn count_mismatch_keeps_parsed_values() {
        // Declared 3 rotations but only 2 present: warn and continue with
        // the parsed axis, block count follows the parsed length.
        let text = SAMPLE.replace("SampleRotation  2", "SampleRotation  3");
        let dataset = read_from(Cursor::new(text)).unwrap();
        assert_eq!(dataset.rotations.len(), 2);
        assert_eq!(dataset.blocks.len(), 4);
    }

    #[test]
    fn unknown_scatter_type_is_fatal() {
        let text = SAMPLE.replace("ScatterType  BRDF", "ScatterType  BSSRDF");
        assert!(matches!(
            read_from(Cursor::new(text)),
            Err(Error::UnknownScatterType(_))
        ));
    }

    #[test]
    fn short_data_row_is_fatal() {
        let text = SAMPLE.replace("5\t6\t7\t8", "5\t6\t7");
        assert!(matches!(
            read_from(Cursor::new(text)),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn scientific_notation_matches_interchange_layout() {
        assert_eq!(sci3(1.0), "1.000e+00");
        assert_eq!(sci3(0.0125), "1.250e-02");
        assert_eq!(sci3(-250.0), "-2.500e+02");
        assert_eq!(sci3(0.0), "0.000e+00");
    }

    #[test]
    fn writes_round_trippable_grammar() {
        let block = BsdfBlock::from_rows(
            vec![0.0, 45.0, 90.0],
            vec![0.0, 180.0, 360.0],
            vec![
                vec![1.0, 2.0, 3.0],
                vec![4.0, 5.0, 6.0],
                vec![7.0, 8.0, 9.0],
            ],
        );
        let mut tis = TisTable::new(1, 1);
        tis.set(0, 0, 0.5);
        let dataset = BsdfDataset {
            scatter_type: ScatterType::Brdf,
            symmetry: Symmetry::Asymmetrical,
            rotations: vec![0.0],
            incidences: vec![30.0],
            blocks: vec![block],
            tis,
        };
        let mut out = Vec::new();
        write_to(&mut out, &dataset, 550.0).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("#Wavelength (nm) = 550"));
        assert!(text.contains("ScatterRadial 3"));
        assert!(text.contains("TIS 0.5"));
        assert!(text.ends_with("DataEnd\n"));

        let parsed = read_from(Cursor::new(text)).unwrap();
        assert_eq!(parsed.scatter_type, ScatterType::Brdf);
        assert_eq!(parsed.block(0, 0).value(2, 1), 8.0);
        assert_eq!(parsed.tis.get(0, 0), 0.5);
    }
}
