//! # bsdf-interop
//!
//! Bidirectional converter between two optical scattering-data file formats:
//! the Zemax BSDF text format and the Speos anisotropic BSDF text format.
//!
//! A conversion job parses one grammar into a canonical angular dataset,
//! re-expresses the outgoing directions in the other format's reference
//! frame, resamples the irregular source grid onto a uniform target grid,
//! re-normalizes the result against the measured total integrated scatter
//! and serializes it into the target grammar. Entry points are
//! [`convert::zemax_to_speos`] and [`convert::speos_to_zemax`].

#![warn(missing_docs)]

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

pub mod convert;
pub mod data;
pub mod error;
pub mod frame;
pub mod io;
pub mod normalize;
pub mod quadrature;
pub mod resample;

pub use convert::{speos_to_zemax, zemax_to_speos};
pub use error::Error;

/// Kind of scattering data stored in a file: reflection or transmission.
///
/// The scatter type decides the hemisphere convention of the polar angle
/// (`[0, 90]` degrees for reflection, `[90, 180]` for transmission) and
/// whether a cosine pre-multiplication is applied when writing Speos data.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScatterType {
    /// Reflection data (bidirectional reflectance distribution function).
    Brdf,
    /// Transmission data (bidirectional transmittance distribution function).
    Btdf,
}

impl ScatterType {
    /// Returns the name used by both file grammars.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Brdf => "BRDF",
            Self::Btdf => "BTDF",
        }
    }

    /// Returns whether this is transmission data.
    pub const fn is_transmission(&self) -> bool { matches!(self, Self::Btdf) }
}

impl Display for ScatterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ScatterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BRDF" => Ok(Self::Brdf),
            "BTDF" => Ok(Self::Btdf),
            other => Err(Error::UnknownScatterType(other.to_string())),
        }
    }
}

/// Azimuthal symmetry declared by the measurement.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Symmetry {
    /// No symmetry, the azimuth covers the full `[0, 360]` degree range.
    Asymmetrical,
    /// No symmetry, four-dimensional variant of the Zemax grammar.
    Asymmetrical4D,
    /// Mirror symmetry about the plane of incidence; azimuth angles above
    /// 180 degrees fold back to `360 - phi`.
    PlaneSymmetrical,
}

impl Symmetry {
    /// Returns the name used by the Zemax grammar.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asymmetrical => "Asymmetrical",
            Self::Asymmetrical4D => "Asymmetrical4D",
            Self::PlaneSymmetrical => "PlaneSymmetrical",
        }
    }

    /// Returns whether azimuth angles fold at 180 degrees.
    pub const fn folds_azimuth(&self) -> bool { matches!(self, Self::PlaneSymmetrical) }
}

impl Display for Symmetry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Symmetry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Asymmetrical" => Ok(Self::Asymmetrical),
            "Asymmetrical4D" => Ok(Self::Asymmetrical4D),
            "PlaneSymmetrical" => Ok(Self::PlaneSymmetrical),
            other => Err(Error::UnknownSymmetry(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scatter_type_names_round_trip() {
        assert_eq!(ScatterType::from_str("BRDF").unwrap(), ScatterType::Brdf);
        assert_eq!(ScatterType::from_str(" BTDF ").unwrap(), ScatterType::Btdf);
        assert_eq!(ScatterType::Brdf.to_string(), "BRDF");
        assert!(ScatterType::from_str("BSSRDF").is_err());
    }

    #[test]
    fn symmetry_names_round_trip() {
        for sym in [
            Symmetry::Asymmetrical,
            Symmetry::Asymmetrical4D,
            Symmetry::PlaneSymmetrical,
        ] {
            assert_eq!(Symmetry::from_str(sym.as_str()).unwrap(), sym);
        }
        assert!(Symmetry::from_str("Radial").is_err());
    }
}
