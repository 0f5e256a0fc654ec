extern crate alloc;
use alloc::vec::Vec;

use imgref::{ImgRef, ImgVec};

use crate::error::LevelError;
use crate::histogram::Histogram;
use crate::mapping::Mapping;
use crate::{LevelConfig, compute_mapping_with};

/// Level reduction result: the mapping and the remapped image.
#[derive(Debug)]
pub struct LevelResult {
    mapping: Mapping,
    image: ImgVec<u16>,
}

impl LevelResult {
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn image(&self) -> ImgRef<'_, u16> {
        self.image.as_ref()
    }

    /// Squared error summed over all pixels.
    pub fn error(&self) -> u128 {
        // set by the solver for every computed mapping
        self.mapping.cost().unwrap_or_default()
    }

    pub fn into_image(self) -> ImgVec<u16> {
        self.image
    }
}

/// Replace every pixel of `image` by its level under `mapping`.
///
/// `max_value` is the largest value the image may hold; a pixel above it is an error.
pub fn apply_mapping(
    mapping: &Mapping,
    image: ImgRef<'_, u16>,
    max_value: u16,
) -> Result<ImgVec<u16>, LevelError> {
    let table = mapping.to_lookup_table(max_value);
    let mut out = Vec::with_capacity(image.width() * image.height());
    for row in image.rows() {
        for &p in row {
            let level = table
                .get(p as usize)
                .copied()
                .ok_or(LevelError::ValueOutOfRange {
                    value: p,
                    max_value,
                })?;
            out.push(level);
        }
    }
    Ok(ImgVec::new(out, image.width(), image.height()))
}

/// Squared difference summed over corresponding pixels of two equally sized images.
pub fn pixel_error(
    original: ImgRef<'_, u16>,
    remapped: ImgRef<'_, u16>,
) -> Result<u128, LevelError> {
    let expected = (original.width(), original.height());
    let found = (remapped.width(), remapped.height());
    if expected != found {
        return Err(LevelError::DimensionMismatch { expected, found });
    }
    Ok(original
        .rows()
        .zip(remapped.rows())
        .flat_map(|(a, b)| a.iter().zip(b.iter()))
        .map(|(&a, &b)| {
            let d = a.abs_diff(b) as u128;
            d * d
        })
        .sum())
}

/// Histogram, mapping and remap in one call.
pub fn quantize_levels(
    image: ImgRef<'_, u16>,
    max_value: u16,
    config: &LevelConfig,
) -> Result<LevelResult, LevelError> {
    let histogram = Histogram::from_rows(image.rows(), max_value)?;
    let mapping = compute_mapping_with(&histogram, config)?;
    let image = apply_mapping(&mapping, image, max_value)?;
    Ok(LevelResult { mapping, image })
}
