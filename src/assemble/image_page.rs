//! Pages built from raster images.
//!
//! An image becomes one page whose MediaBox is the image's pixel size (one
//! point per pixel), with the image drawn over the whole page.

use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use std::path::Path;

use crate::error::{Result, ToolkitError};

/// Name the image XObject is registered under in the page resources.
const IMAGE_NAME: &[u8] = b"Im0";

/// Decode `path` and add it to `doc` as a page under `parent`.
///
/// # Errors
///
/// Returns [`ToolkitError::FailedToLoadImage`] if the file cannot be decoded.
pub fn append_image_page(doc: &mut Document, parent: ObjectId, path: &Path) -> Result<ObjectId> {
    let image = image::open(path)
        .map_err(|e| ToolkitError::failed_to_load_image(path.to_path_buf(), e.to_string()))?;
    add_image_page(doc, parent, &image)
}

/// Add `image` to `doc` as a page under `parent`. Returns the page id.
///
/// The page's `Parent` is set, but the parent's `Kids` are left to the caller.
pub fn add_image_page(doc: &mut Document, parent: ObjectId, image: &DynamicImage) -> Result<ObjectId> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let (width, height) = (i64::from(width), i64::from(height));

    let mut xobject = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width,
        "Height" => height,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|pixel| pixel[3]).collect();
        let mask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ));
        xobject.set("SMask", mask_id);
    }

    let image_id = doc.add_object(Stream::new(xobject, rgb.into_raw()));
    let content_id = doc.add_object(Stream::new(dictionary! {}, draw_full_page(width, height)?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width),
            Object::Integer(height),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                IMAGE_NAME => image_id,
            },
        },
        "Contents" => content_id,
    });

    Ok(page_id)
}

/// `q w 0 0 h 0 0 cm /Im0 Do Q`
fn draw_full_page(width: i64, height: i64) -> Result<Vec<u8>> {
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };

    Ok(content.encode()?)
}
