//! End-to-end conversion scenarios over real files on disk.

use bsdf_interop::{
    data::BsdfBlock, io::zemax, normalize::hemispherical_integral, speos_to_zemax, zemax_to_speos,
    ScatterType,
};
use std::{fs, path::PathBuf};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bsdf-interop-{tag}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

const ZEMAX_UNIFORM_BRDF: &str = "\
#Uniform test sample
Source  Measured
Symmetry  Asymmetrical
SpectralContent  Monochrome
ScatterType  BRDF
SampleRotation  1
0
AngleOfIncidence  1
30
ScatterAzimuth  3
0\t180\t360
ScatterRadial  2
0\t90
DataBegin
TIS 0.5
1.0\t1.0
1.0\t1.0
1.0\t1.0
DataEnd
";

const SPEOS_STACKED: &str = "\
OPTIS - Anisotropic BSDF surface file v8.0
1
Comment
23
Measurement description
1\t1
1
2 1
0\t30
550
80
2 3
\t0\t180\t360
0\t1\t2\t3
90\t4\t5\t6
70
2 3
\t0\t180\t360
0\t10\t20\t30
90\t40\t50\t60
30
2 3
\t0\t180\t360
0\t7\t8\t9
90\t10\t11\t12
20
2 3
\t0\t180\t360
0\t70\t80\t90
90\t100\t110\t120
End of file
";

#[test]
fn zemax_to_speos_uniform_brdf_scenario() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = scratch_dir("z2s");
    let input = dir.join("Uniform.bsdf");
    fs::write(&input, ZEMAX_UNIFORM_BRDF).unwrap();

    let output = zemax_to_speos(&input).unwrap();
    // 2 radial and 3 azimuth samples resolve to 90 and 180 degree steps.
    assert!(output
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .ends_with("uniform_90_180.anisotropicbsdf"));

    let text = fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "OPTIS - Anisotropic BSDF surface file v7.0"
    );
    // One incidence angle of 30 degrees.
    assert!(text.contains("\n1\n30\t\n"), "incidence axis");
    assert!(text.contains("350\t50\n850\t50\n"), "synthetic spectrum");

    // Re-integrate the written block: the normalization must have scaled it
    // so the hemispherical integral reproduces the measured TIS.
    let block = parse_speos_block(&text);
    let reintegrated = hemispherical_integral(&block);
    assert!(
        (reintegrated - 0.5).abs() < 0.1,
        "re-integrated TIS {reintegrated}, expected 0.5"
    );
}

/// Pulls the single data block out of a written v7.0 Speos file. The block
/// section starts right after the synthetic spectrum's 850 nm line.
fn parse_speos_block(text: &str) -> BsdfBlock {
    let mut lines = text.lines();
    loop {
        let line = lines.next().expect("missing spectrum");
        if line.starts_with("850\t") {
            break;
        }
    }
    let shape_line = lines.next().unwrap();
    let shape: Vec<usize> = shape_line
        .split_whitespace()
        .map(|t| t.parse().unwrap())
        .collect();
    let shape = (shape[0], shape[1]);
    let azimuth: Vec<f64> = lines
        .next()
        .unwrap()
        .split_whitespace()
        .map(|t| t.parse().unwrap())
        .collect();
    assert_eq!(azimuth.len(), shape.1);
    let mut radial = Vec::new();
    let mut rows = Vec::new();
    for _ in 0..shape.0 {
        let row: Vec<f64> = lines
            .next()
            .unwrap()
            .split_whitespace()
            .map(|t| t.parse().unwrap())
            .collect();
        radial.push(row[0]);
        rows.push(row[1..].to_vec());
    }
    // Transpose the radial-major rows into the canonical layout.
    let mut block = BsdfBlock::new(radial, azimuth);
    for (r, row) in rows.into_iter().enumerate() {
        for (a, value) in row.into_iter().enumerate() {
            block.set(a, r, value);
        }
    }
    block
}

#[test]
fn speos_to_zemax_splits_reflection_and_transmission() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = scratch_dir("s2z");
    let input = dir.join("Stacked.anisotropicbsdf");
    fs::write(&input, SPEOS_STACKED).unwrap();

    let outputs = speos_to_zemax(&input, false).unwrap();
    assert_eq!(outputs.len(), 2);
    let names: Vec<&str> = outputs
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap())
        .collect();
    assert_eq!(names[0], "stacked_550_BRDF_90_180.bsdf");
    assert_eq!(names[1], "stacked_550_BTDF_90_180.bsdf");

    let brdf = zemax::read(&outputs[0]).unwrap();
    let btdf = zemax::read(&outputs[1]).unwrap();
    assert_eq!(brdf.scatter_type, ScatterType::Brdf);
    assert_eq!(btdf.scatter_type, ScatterType::Btdf);
    // One synthetic rotation, the original incidence axis.
    assert_eq!(brdf.rotations, vec![0.0]);
    assert_eq!(brdf.incidences, vec![0.0, 30.0]);
    // TIS values are independent per section, rescaled from percent.
    assert_eq!(brdf.tis.get(0, 0), 0.8);
    assert_eq!(brdf.tis.get(0, 1), 0.7);
    assert_eq!(btdf.tis.get(0, 0), 0.3);
    assert_eq!(btdf.tis.get(0, 1), 0.2);
    // Both carry data, and not the same data.
    assert!(brdf.block(0, 0).as_slice().iter().any(|v| *v != 0.0));
    assert_ne!(
        brdf.block(0, 0).as_slice(),
        btdf.block(0, 0).as_slice()
    );
}
