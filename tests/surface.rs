use fragment_exchange::Core::{Region, SliceLayout, Surface};
use fragment_exchange::FragmentError;

fn striped(width: usize, height: usize) -> Surface {
    let mut pixels = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[x as u8, y as u8, 7]);
        }
    }
    Surface::from_pixels(width, height, 3, pixels).unwrap()
}

#[test]
fn new_surface_is_zeroed() {
    let surface = Surface::new(10, 4, 3).unwrap();
    assert_eq!(surface.data().len(), 10 * 4 * 3);
    assert!(surface.data().iter().all(|&b| b == 0));
    assert!(surface.is_band_blank(0, 10));
}

#[test]
fn overflowing_dimensions_are_invalid_config() {
    let err = Surface::new(usize::MAX, 2, 3).unwrap_err();
    assert!(matches!(err, FragmentError::InvalidConfig(_)));

    let err = striped(4, 2).resize_width(usize::MAX / 2).unwrap_err();
    assert!(matches!(err, FragmentError::InvalidConfig(_)));
}

#[test]
fn from_pixels_rejects_wrong_length() {
    let err = Surface::from_pixels(4, 4, 3, vec![0u8; 10]).unwrap_err();
    assert!(matches!(err, FragmentError::InvalidConfig(_)));
}

#[test]
fn slice_then_place_copies_band() {
    let source = striped(40, 5);
    let band = source.slice(10, 10);
    assert_eq!(band.width(), 10);
    assert_eq!(band.height(), 5);

    let mut dest = source.blank_like();
    dest.place(10, &band).unwrap();

    for y in 0..5 {
        for x in 0..40 {
            if (10..20).contains(&x) {
                assert_eq!(dest.pixel(x, y), source.pixel(x, y));
            } else {
                assert_eq!(dest.pixel(x, y), Some(&[0u8, 0, 0][..]));
            }
        }
    }
}

#[test]
fn slice_past_edge_is_empty() {
    let source = striped(8, 2);
    assert!(source.slice(8, 4).is_empty());
    assert_eq!(source.slice(6, 4).width(), 2);
}

#[test]
fn out_of_bounds_placement_is_rejected_and_surface_untouched() {
    let mut dest = Surface::new(100, 10, 3).unwrap();
    let region = Region::new(30, 10, 3, vec![9u8; 30 * 10 * 3]).unwrap();

    let err = dest.place(80, &region).unwrap_err();
    assert_eq!(
        err,
        FragmentError::OutOfBoundsPlacement {
            offset: 80,
            width: 30,
            height: 10,
            surface_width: 100,
            surface_height: 10,
        }
    );
    assert!(dest.is_band_blank(0, 100));

    let tall = Region::new(10, 11, 3, vec![9u8; 10 * 11 * 3]).unwrap();
    assert!(dest.place(0, &tall).is_err());
    assert!(dest.is_band_blank(0, 100));

    // offset + width overflowing usize is also just out of bounds
    assert!(dest.place(usize::MAX, &region).is_err());
}

#[test]
fn channel_mismatch_is_a_decode_failure() {
    let mut dest = Surface::new(10, 2, 3).unwrap();
    let gray = Region::new(5, 2, 1, vec![1u8; 10]).unwrap();
    assert!(matches!(
        dest.place(0, &gray),
        Err(FragmentError::DecodeFailure { .. })
    ));
}

#[test]
fn resize_width_keeps_height_and_samples_columns() {
    let source = striped(10, 3);
    let resized = source.resize_width(5).unwrap();
    assert_eq!(resized.width(), 5);
    assert_eq!(resized.height(), 3);
    // nearest neighbour: column x maps to source column 2x
    for x in 0..5 {
        assert_eq!(resized.pixel(x, 1), source.pixel(2 * x, 1));
    }
}

#[test]
fn layout_four_slices_of_four_hundred() {
    let layout = SliceLayout::new(400, 50, 4).unwrap();
    assert_eq!(layout.fragment_width, 100);
    assert!(!layout.needs_resize());
    let offsets: Vec<usize> = layout.offsets().map(|(_, o)| o).collect();
    assert_eq!(offsets, vec![0, 100, 200, 300]);
}

#[test]
fn layout_flags_uneven_width() {
    let layout = SliceLayout::new(401, 50, 4).unwrap();
    assert_eq!(layout.fragment_width, 100);
    assert_eq!(layout.sliced_width(), 400);
    assert!(layout.needs_resize());
}

#[test]
fn layout_rejects_zero_fragments() {
    assert!(matches!(
        SliceLayout::new(400, 50, 0),
        Err(FragmentError::InvalidConfig(_))
    ));
}

#[test]
fn fragment_regions_are_disjoint() {
    for _ in 0..200 {
        let count = fastrand::usize(1..64);
        let width = fastrand::usize(count..2048);
        let layout = SliceLayout::new(width, 1, count).unwrap();
        for i in 0..count {
            for j in (i + 1)..count {
                assert!(layout.offset(i) + layout.fragment_width <= layout.offset(j));
            }
        }
        assert!(layout.sliced_width() <= width);
    }
}
