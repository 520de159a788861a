use simmatch::{
    ColorMode, GridShape, ImageView, NormalizedImage, SimMatchError, Threshold,
};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        SimMatchError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        SimMatchError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        SimMatchError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, SimMatchError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn image_view_strided_rows() {
    let data: Vec<u8> = (0u8..12).collect();
    let view = ImageView::new(&data, 3, 3, 4).unwrap();
    assert_eq!(view.row(1).unwrap(), &[4u8, 5, 6]);
    assert_eq!(view.get(2, 2).copied(), Some(10));
    assert!(view.get(3, 0).is_none());
    assert!(view.row(3).is_none());
}

#[test]
fn normalized_image_checks_buffer_length() {
    let err = NormalizedImage::from_planar(vec![0u8; 11], 2, 2, ColorMode::Rgb)
        .err()
        .unwrap();
    assert_eq!(err, SimMatchError::BufferTooSmall { needed: 12, got: 11 });

    let err = NormalizedImage::from_planar(vec![0u8; 13], 2, 2, ColorMode::Rgb)
        .err()
        .unwrap();
    assert_eq!(
        err,
        SimMatchError::InvalidDimensions {
            width: 2,
            height: 2,
        }
    );
}

#[test]
fn normalized_image_shape_and_planes() {
    let data: Vec<u8> = (0u8..24).collect();
    let img = NormalizedImage::from_planar(data, 4, 2, ColorMode::Rgb).unwrap();
    assert_eq!(
        img.shape(),
        GridShape {
            width: 4,
            height: 2,
            channels: 3,
        }
    );
    let green = img.plane(1).unwrap();
    assert_eq!(green.row(0).unwrap(), &[8u8, 9, 10, 11]);
    assert_eq!(img.get(3, 1, 2), Some(23));
    assert_eq!(img.to_interleaved()[..3], [0u8, 8, 16]);
}

#[test]
fn shape_mismatch_message_names_both_shapes() {
    let err = SimMatchError::ShapeMismatch {
        left: GridShape {
            width: 100,
            height: 100,
            channels: 3,
        },
        right: GridShape {
            width: 100,
            height: 100,
            channels: 1,
        },
    };
    assert_eq!(err.to_string(), "shape mismatch: 100x100x3 vs 100x100x1");
}

#[test]
fn threshold_validation_fails_fast() {
    assert!(Threshold::new(0.0).is_ok());
    assert_eq!(
        Threshold::new(1.5).err().unwrap(),
        SimMatchError::InvalidThreshold { value: 1.5 }
    );
    assert!(Threshold::new(f64::NEG_INFINITY).is_err());
}
