use image::Rgb;

/// Box colour for a COCO class id.
pub fn get_class_colour(class: usize) -> Rgb<u8> {
    match class {
        0 => Rgb([128, 0, 128]),     // purple (people)
        1..=8 => Rgb([0, 255, 0]),   // green (vehicles)
        14..=23 => Rgb([255, 0, 0]), // red (animals)
        _ => Rgb([0, 0, 255])        // blue (everything else)
    }
}

pub const OVERLAY_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
pub const LABEL_TEXT_COLOUR: Rgb<u8> = Rgb([255, 255, 255]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_groups() {
        assert_eq!(get_class_colour(0), Rgb([128, 0, 128]));
        assert_eq!(get_class_colour(2), Rgb([0, 255, 0]));
        assert_eq!(get_class_colour(16), Rgb([255, 0, 0]));
        assert_eq!(get_class_colour(9), Rgb([0, 0, 255]));
        assert_eq!(get_class_colour(79), Rgb([0, 0, 255]));
    }
}
