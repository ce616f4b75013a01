use std::path::Path;

/// Helper type used to define the source of a content image
#[derive(Clone)]
pub enum ImageSource<'a> {
    /// A raw buffer of image data, see `image::load_from_memory` for details
    /// on what is supported
    Memory(&'a [u8]),
    /// The path to an image to load from disk. The image format is inferred
    /// from the file extension, see `image::open` for details
    Path(&'a Path),
    /// An already loaded image that is passed directly to the session
    Image(image::DynamicImage),
}

impl<'a> ImageSource<'a> {
    pub fn from_path(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<image::DynamicImage> for ImageSource<'a> {
    fn from(img: image::DynamicImage) -> Self {
        Self::Image(img)
    }
}

impl<'a, S> From<&'a S> for ImageSource<'a>
where
    S: AsRef<Path> + 'a,
{
    fn from(path: &'a S) -> Self {
        Self::Path(path.as_ref())
    }
}

pub fn load_dynamic_image(src: ImageSource<'_>) -> Result<image::DynamicImage, image::ImageError> {
    match src {
        ImageSource::Memory(data) => image::load_from_memory(data),
        ImageSource::Path(path) => image::open(path),
        ImageSource::Image(img) => Ok(img),
    }
}

/// Checks that `path` ends in an extension we can encode to, a path without
/// an extension is accepted and will fail when saving
pub fn check_output_extension(path: &Path) -> Result<(), crate::Error> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("png") | Some("jpg") | Some("jpeg") | Some("bmp") | None => Ok(()),
        Some(other) => Err(crate::Error::UnsupportedOutputFormat(other.to_owned())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn loads_from_memory() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(3, 2));
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageOutputFormat::Png).unwrap();

        let loaded = load_dynamic_image(ImageSource::Memory(png.get_ref())).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (3, 2));
    }

    #[test]
    fn output_extensions() {
        assert!(check_output_extension(Path::new("out.png")).is_ok());
        assert!(check_output_extension(Path::new("out/dir")).is_ok());
        assert!(matches!(
            check_output_extension(Path::new("out.tiff")),
            Err(crate::Error::UnsupportedOutputFormat(ext)) if ext == "tiff"
        ));
    }
}
