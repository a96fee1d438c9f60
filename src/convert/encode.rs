use std::path::Path;

use image::{
    DynamicImage, ImageError, ImageFormat, RgbaImage,
    error::{ParameterError, ParameterErrorKind},
};

use super::ConvertError;

/// Writes tightly packed RGBA8 rows to `path` as PNG, and an RGB copy to
/// `no_alpha_path` when given.
pub fn write_png(
    path: &Path,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    no_alpha_path: Option<&Path>,
) -> Result<(), ConvertError> {
    profiling::scope!("write_png");

    let encode_error = |path: &Path, source: ImageError| ConvertError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let image = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        encode_error(
            path,
            ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::DimensionMismatch,
            )),
        )
    })?;

    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| encode_error(path, e))?;

    if let Some(no_alpha_path) = no_alpha_path {
        DynamicImage::ImageRgba8(image)
            .to_rgb8()
            .save_with_format(no_alpha_path, ImageFormat::Png)
            .map_err(|e| encode_error(no_alpha_path, e))?;
    }

    Ok(())
}
