use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat};
use tracing::debug;

use crate::config::{ArgName, ArgValue, RawArguments};
use crate::errors::{Domain, InputRole, OdisfError, Result};
use crate::traits::InputImages;

/// Everything the job needs from storage, loaded and checked.
#[derive(Debug)]
pub struct ResolvedInputs {
    pub images: InputImages,
    pub output_path: PathBuf,
}

/// Loads the images named on the command line and validates the output path.
///
/// Both required options and the output format are checked before anything
/// is read from storage. Optional images must match the domain of the primary
/// image exactly.
pub fn resolve_inputs(args: &RawArguments) -> Result<ResolvedInputs> {
    let image_path = required_value(args, ArgName::Img, "no image path was given")?;
    let output_path = required_value(args, ArgName::Out, "no output label path was given")?;
    let output_path = PathBuf::from(output_path);
    check_output_path(&output_path)?;

    let image = load_image(Path::new(image_path))?;
    let domain = Domain::from(image.dimensions());
    debug!(path = image_path, %domain, "loaded input image");

    let mask = optional_map(args, ArgName::Mask, InputRole::Mask, domain)?;
    let objsm = optional_map(args, ArgName::Objsm, InputRole::SaliencyMap, domain)?;

    Ok(ResolvedInputs {
        images: InputImages { image, mask, objsm },
        output_path,
    })
}

fn required_value<'a>(
    args: &'a RawArguments,
    name: ArgName,
    what: &'static str,
) -> Result<&'a str> {
    match args.value(name) {
        ArgValue::Given(value) => Ok(value),
        ArgValue::Empty => Err(OdisfError::InvalidValue {
            option: name,
            reason: what.to_string(),
        }),
        ArgValue::Absent => Err(OdisfError::MissingInput { option: name, what }),
    }
}

fn optional_map(
    args: &RawArguments,
    name: ArgName,
    role: InputRole,
    expected: Domain,
) -> Result<Option<GrayImage>> {
    let path = match args.value(name) {
        ArgValue::Absent => return Ok(None),
        ArgValue::Empty => {
            return Err(OdisfError::InvalidValue {
                option: name,
                reason: format!("no {} path was given", role),
            })
        }
        ArgValue::Given(path) => path,
    };

    let map = load_image(Path::new(path))?.into_luma8();
    verify_domain(role, expected, Domain::from(map.dimensions()))?;
    debug!(path, %role, "loaded optional input");
    Ok(Some(map))
}

pub fn verify_domain(role: InputRole, expected: Domain, actual: Domain) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(OdisfError::DomainMismatch {
            role,
            expected,
            actual,
        })
    }
}

/// Sample width of a written label image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelDepth {
    Eight,
    Sixteen,
}

impl LabelDepth {
    /// Grayscale depth `format` can encode, if any.
    pub const fn for_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png | ImageFormat::Tiff | ImageFormat::Pnm => Some(Self::Sixteen),
            ImageFormat::Jpeg
            | ImageFormat::Bmp
            | ImageFormat::WebP
            | ImageFormat::Tga
            | ImageFormat::Avif => Some(Self::Eight),
            _ => None,
        }
    }
}

/// Output formats are inferred from the extension. They must be writable
/// with the enabled features and able to hold grayscale samples.
pub fn check_output_path(path: &Path) -> Result<(ImageFormat, LabelDepth)> {
    ImageFormat::from_path(path)
        .ok()
        .filter(|format| format.writing_enabled())
        .and_then(|format| LabelDepth::for_format(format).map(|depth| (format, depth)))
        .ok_or_else(|| OdisfError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
}

fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| OdisfError::ImageIo {
        path: path.to_path_buf(),
        operation: "image load",
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use image::{Luma, Rgb, RgbImage};
    use tempfile::TempDir;

    fn parse(tokens: &[String]) -> RawArguments {
        RawArguments::try_parse_from(
            std::iter::once("run-odisf".to_string()).chain(tokens.iter().cloned()),
        )
        .unwrap()
    }

    fn write_rgb(dir: &TempDir, name: &str, width: u32, height: u32) -> String {
        let path = dir.path().join(name);
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();
        path.display().to_string()
    }

    fn write_gray(dir: &TempDir, name: &str, width: u32, height: u32) -> String {
        let path = dir.path().join(name);
        GrayImage::from_pixel(width, height, Luma([255]))
            .save(&path)
            .unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_missing_image() {
        let args = parse(&["--out=b.png".to_string()]);
        let err = resolve_inputs(&args).unwrap_err();
        assert!(matches!(
            err,
            OdisfError::MissingInput {
                option: ArgName::Img,
                ..
            }
        ));
    }

    #[test]
    fn test_image_without_value() {
        let args = parse(&["--img".to_string(), "--out=b.png".to_string()]);
        let err = resolve_inputs(&args).unwrap_err();
        assert!(matches!(
            err,
            OdisfError::InvalidValue {
                option: ArgName::Img,
                ..
            }
        ));
    }

    #[test]
    fn test_output_checks() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let img = write_rgb(&dir, "a.png", 4, 4);

        let args = parse(&[format!("--img={}", img)]);
        assert!(matches!(
            resolve_inputs(&args).unwrap_err(),
            OdisfError::MissingInput {
                option: ArgName::Out,
                ..
            }
        ));

        let args = parse(&[format!("--img={}", img), "--out".to_string()]);
        assert!(matches!(
            resolve_inputs(&args).unwrap_err(),
            OdisfError::InvalidValue {
                option: ArgName::Out,
                ..
            }
        ));

        let args = parse(&[format!("--img={}", img), "--out=labels.txt".to_string()]);
        assert!(matches!(
            resolve_inputs(&args).unwrap_err(),
            OdisfError::UnsupportedFormat { .. }
        ));
        Ok(())
    }

    #[test]
    fn test_optional_inputs_absent() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let img = write_rgb(&dir, "a.png", 4, 3);

        let args = parse(&[format!("--img={}", img), "--out=b.png".to_string()]);
        let resolved = resolve_inputs(&args)?;

        assert_eq!(resolved.images.image.dimensions(), (4, 3));
        assert!(resolved.images.mask.is_none());
        assert!(resolved.images.objsm.is_none());
        assert_eq!(resolved.output_path, PathBuf::from("b.png"));
        Ok(())
    }

    #[test]
    fn test_optional_inputs_loaded() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let img = write_rgb(&dir, "a.png", 4, 3);
        let mask = write_gray(&dir, "m.png", 4, 3);
        let objsm = write_gray(&dir, "s.png", 4, 3);

        let args = parse(&[
            format!("--img={}", img),
            format!("--mask={}", mask),
            format!("--objsm={}", objsm),
            "--out=b.png".to_string(),
        ]);
        let resolved = resolve_inputs(&args)?;

        assert_eq!(resolved.images.mask.map(|m| m.dimensions()), Some((4, 3)));
        assert_eq!(resolved.images.objsm.map(|m| m.dimensions()), Some((4, 3)));
        Ok(())
    }

    #[test]
    fn test_optional_input_without_value() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let img = write_rgb(&dir, "a.png", 4, 4);

        let args = parse(&[
            format!("--img={}", img),
            "--objsm".to_string(),
            "--out=b.png".to_string(),
        ]);
        assert!(matches!(
            resolve_inputs(&args).unwrap_err(),
            OdisfError::InvalidValue {
                option: ArgName::Objsm,
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn test_domain_mismatch_names_the_input() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let img = write_rgb(&dir, "a.png", 4, 4);
        let mask = write_gray(&dir, "m.png", 5, 4);
        let objsm = write_gray(&dir, "s.png", 4, 2);

        let args = parse(&[
            format!("--img={}", img),
            format!("--mask={}", mask),
            "--out=b.png".to_string(),
        ]);
        match resolve_inputs(&args).unwrap_err() {
            OdisfError::DomainMismatch {
                role,
                expected,
                actual,
            } => {
                assert_eq!(role, InputRole::Mask);
                assert_eq!(expected, Domain::from((4, 4)));
                assert_eq!(actual, Domain::from((5, 4)));
            }
            other => panic!("unexpected error: {}", other),
        }

        let args = parse(&[
            format!("--img={}", img),
            format!("--objsm={}", objsm),
            "--out=b.png".to_string(),
        ]);
        assert!(matches!(
            resolve_inputs(&args).unwrap_err(),
            OdisfError::DomainMismatch {
                role: InputRole::SaliencyMap,
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn test_required_options_checked_before_loading() {
        let args = parse(&["--img=/nonexistent/a.png".to_string()]);
        assert!(matches!(
            resolve_inputs(&args).unwrap_err(),
            OdisfError::MissingInput {
                option: ArgName::Out,
                ..
            }
        ));

        let args = parse(&[
            "--img=/nonexistent/a.png".to_string(),
            "--out=labels.xyz".to_string(),
        ]);
        assert!(matches!(
            resolve_inputs(&args).unwrap_err(),
            OdisfError::UnsupportedFormat { .. }
        ));
    }

    #[test]
    fn test_output_formats_without_grayscale_are_rejected() {
        for name in ["labels.gif", "labels.qoi", "labels.hdr", "labels.exr", "labels.ff"] {
            assert!(
                matches!(
                    check_output_path(Path::new(name)),
                    Err(OdisfError::UnsupportedFormat { .. })
                ),
                "{}",
                name
            );
        }
        assert!(matches!(
            check_output_path(Path::new("labels.png")),
            Ok((ImageFormat::Png, LabelDepth::Sixteen))
        ));
        assert!(matches!(
            check_output_path(Path::new("labels.jpg")),
            Ok((ImageFormat::Jpeg, LabelDepth::Eight))
        ));
    }

    #[test]
    fn test_unreadable_image() {
        let args = parse(&[
            "--img=/nonexistent/a.png".to_string(),
            "--out=b.png".to_string(),
        ]);
        assert!(matches!(
            resolve_inputs(&args).unwrap_err(),
            OdisfError::ImageIo { .. }
        ));
    }
}
