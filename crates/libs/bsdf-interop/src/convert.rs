//! Conversion entry points wiring reader, resampler, normalizer and writer.
//!
//! Conversions are sequential: each job owns its dataset exclusively from
//! read to write, and a fatal error aborts that job only; continuing with
//! the next file is the caller's decision.

use crate::{
    data::{BsdfDataset, TisTable},
    error::Error,
    frame::FrameDirection,
    io,
    normalize::normalize_dataset,
    resample::{recommended_resolution, remap_to_transmission, resample_dataset, GridResolution},
};
use std::path::{Path, PathBuf};

/// Converts a Zemax BSDF file into a Speos anisotropic BSDF file.
///
/// The output file is written next to the input, named after the input stem
/// with the resolved angular precisions appended, and its path is returned.
pub fn zemax_to_speos<P: AsRef<Path>>(input: P) -> Result<PathBuf, Error> {
    let input = input.as_ref();
    log::info!("converting Zemax BSDF {} to Speos format", input.display());

    let dataset = io::zemax::read(input)?;
    let first = dataset.blocks.first().ok_or(Error::EmptyAxis("radial"))?;
    let resolution = recommended_resolution(&first.radial, &first.azimuth, dataset.symmetry);
    log::info!(
        "recommended precision: theta {} deg, phi {} deg",
        resolution.theta_step,
        resolution.phi_step
    );

    let mut resampled =
        resample_dataset(&dataset, FrameDirection::NormalToSpecular, resolution);
    if dataset.scatter_type.is_transmission() {
        // The Speos grammar stores transmission over theta in [90, 180].
        for block in &mut resampled.blocks {
            *block = remap_to_transmission(block, resolution);
        }
    }
    normalize_dataset(&mut resampled);

    let output = output_path(input, &precision_suffix(resolution, ".anisotropicbsdf"));
    io::speos::write(&output, &resampled)?;
    log::info!("wrote {}", output.display());
    Ok(output)
}

/// Converts a Speos BSDF file into one Zemax BSDF file per wavelength and
/// scatter type.
///
/// `is_brdf` selects the `.brdf` extension convention of the input. A file
/// carrying both reflection and transmission fans out into files tagged
/// `BRDF` and `BTDF`, each with independent TIS and data blocks. The output
/// paths are returned in writing order.
pub fn speos_to_zemax<P: AsRef<Path>>(input: P, is_brdf: bool) -> Result<Vec<PathBuf>, Error> {
    let input = input.as_ref();
    log::info!("converting Speos BSDF {} to Zemax format", input.display());

    let datasets = io::speos::read(input, is_brdf)?;
    let first = datasets
        .first()
        .and_then(|dataset| dataset.blocks.first())
        .ok_or(Error::EmptyAxis("radial"))?;
    let resolution =
        recommended_resolution(&first.radial, &first.azimuth, datasets[0].symmetry);
    log::info!(
        "recommended precision: theta {} deg, phi {} deg",
        resolution.theta_step,
        resolution.phi_step
    );

    let mut outputs = Vec::new();
    for dataset in &datasets {
        let resampled = resample_dataset(dataset, FrameDirection::SpecularToNormal, resolution);
        for (w, &wavelength) in dataset.rotations.iter().enumerate() {
            let single = single_wavelength(&resampled, w);
            let suffix = format!(
                "_{}_{}{}",
                wavelength,
                dataset.scatter_type,
                precision_suffix(resolution, ".bsdf")
            );
            let output = output_path(input, &suffix);
            io::zemax::write(&output, &single, wavelength)?;
            log::info!("wrote {}", output.display());
            outputs.push(output);
        }
    }
    Ok(outputs)
}

/// Extracts one wavelength slice as a standalone dataset with a single
/// synthetic rotation axis and TIS rescaled from percent to `[0, 1]`.
fn single_wavelength(dataset: &BsdfDataset, w: usize) -> BsdfDataset {
    let n_inc = dataset.n_incidences();
    let mut tis = TisTable::new(1, n_inc);
    let mut blocks = Vec::with_capacity(n_inc);
    for j in 0..n_inc {
        let percent = dataset.tis.get(w, j);
        tis.set(0, j, (percent / 100.0 * 1000.0).round() / 1000.0);
        blocks.push(dataset.block(w, j).clone());
    }
    BsdfDataset {
        scatter_type: dataset.scatter_type,
        symmetry: dataset.symmetry,
        rotations: vec![0.0],
        incidences: dataset.incidences.clone(),
        blocks,
        tis,
    }
}

fn precision_suffix(resolution: GridResolution, extension: &str) -> String {
    format!(
        "_{}_{}{}",
        resolution.theta_step, resolution.phi_step, extension
    )
}

/// Places the output next to the input, lowercasing the stem and appending
/// the suffix.
fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("converted")
        .to_lowercase();
    input.with_file_name(format!("{stem}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_naming_appends_resolved_precisions() {
        let resolution = GridResolution {
            theta_step: 0.5,
            phi_step: 15.0,
        };
        let path = output_path(
            Path::new("/data/Sample.bsdf"),
            &precision_suffix(resolution, ".anisotropicbsdf"),
        );
        assert_eq!(
            path,
            PathBuf::from("/data/sample_0.5_15.anisotropicbsdf")
        );
    }
}
