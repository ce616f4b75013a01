//! Conversions between images and the NHWC tensors the style models use.

use crate::{model::Normalization, model::OutputKind, Dims, Error};
use tract_onnx::prelude::tract_ndarray::{ArrayView4, Ix4};

pub use tract_onnx::prelude::tract_ndarray::{Array4, ArrayD};

/// The `[N, H, W, C]` shape of a model output of the given kind
pub fn expected_output_shape(kind: OutputKind, size: u32) -> [usize; 4] {
    [1, size as usize, size as usize, kind.channels()]
}

/// Resizes `img` to a `size` x `size` square and packs it into a
/// `[1, size, size, 3]` tensor.
pub fn image_to_tensor(img: &image::RgbImage, size: u32, norm: Normalization) -> Array4<f32> {
    let resized;
    let img = if img.dimensions() != (size, size) {
        resized = image::imageops::resize(img, size, size, image::imageops::CatmullRom);
        &resized
    } else {
        img
    };

    Array4::from_shape_fn((1, size as usize, size as usize, 3), |(_, y, x, c)| {
        norm.to_model(img.get_pixel(x as u32, y as u32)[c])
    })
}

fn view_as<'t>(
    tensor: &'t ArrayD<f32>,
    kind: OutputKind,
    size: u32,
) -> Result<ArrayView4<'t, f32>, Error> {
    let expected = expected_output_shape(kind, size);
    if tensor.shape() != expected {
        return Err(Error::output_shape(&expected, tensor.shape()));
    }

    tensor
        .view()
        .into_dimensionality::<Ix4>()
        .map_err(|_shape_err| Error::output_shape(&expected, tensor.shape()))
}

/// Turns a `[1, size, size, 3]` model output into a color image
pub fn tensor_to_rgb(
    tensor: &ArrayD<f32>,
    size: u32,
    norm: Normalization,
) -> Result<image::RgbImage, Error> {
    let view = view_as(tensor, OutputKind::Rgb, size)?;

    Ok(image::RgbImage::from_fn(size, size, |x, y| {
        let (x, y) = (x as usize, y as usize);
        image::Rgb([
            norm.to_pixel(view[[0, y, x, 0]]),
            norm.to_pixel(view[[0, y, x, 1]]),
            norm.to_pixel(view[[0, y, x, 2]]),
        ])
    }))
}

/// Turns a `[1, size, size, 1]` model output into a grayscale image
pub fn tensor_to_grayscale(
    tensor: &ArrayD<f32>,
    size: u32,
    norm: Normalization,
) -> Result<image::GrayImage, Error> {
    let view = view_as(tensor, OutputKind::Grayscale, size)?;

    Ok(image::GrayImage::from_fn(size, size, |x, y| {
        image::Luma([norm.to_pixel(view[[0, y as usize, x as usize, 0]])])
    }))
}

/// An all black image, used as a stand-in when a run produced nothing
pub fn empty_image(dims: Dims) -> image::DynamicImage {
    image::DynamicImage::ImageRgb8(image::RgbImage::new(dims.width, dims.height))
}
