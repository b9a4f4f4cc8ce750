//! FFmpeg video filter definitions for extraction-time crops.

use reelcut_models::CropTransform;

/// Center vertical 9:16 slice scaled to portrait.
/// Clamped to avoid negative offsets on sources narrower than 9:16.
pub const FILTER_VERTICAL_9_16: &str = concat!(
    "crop=ih*9/16:ih:max((iw-ih*9/16)/2\\,0):0,",
    "scale=1080:1920:force_original_aspect_ratio=decrease,",
    "pad=1080:1920:(ow-iw)/2:(oh-ih)/2"
);

/// Center square slice.
pub const FILTER_CENTER_SQUARE: &str = concat!(
    "crop=min(iw\\,ih):min(iw\\,ih),",
    "scale=1080:1080"
);

/// Build the video filter for a crop transform.
pub fn crop_filter(crop: CropTransform) -> &'static str {
    match crop {
        CropTransform::Vertical916 => FILTER_VERTICAL_9_16,
        CropTransform::CenterSquare => FILTER_CENTER_SQUARE,
    }
}
