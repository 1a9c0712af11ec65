//! Theme-adaptive color normalization and export flattening

use crate::document::{Color, StyledText};

/// Remove every explicit gray foreground so the range follows the theme.
///
/// Runs after each decode and each foreign-format import, so no stored
/// document can freeze into a light-mode-only color.
pub fn strip_adaptive_colors(text: &StyledText) -> StyledText {
    text.map_attributes(|attrs| {
        let mut attrs = attrs.clone();
        if attrs.foreground.is_some_and(|color| color.is_theme_adaptive()) {
            attrs.foreground = None;
        }
        attrs
    })
}

/// Print/PDF export: adaptive and near-white text becomes explicit black,
/// since the target page is white.
pub fn prepare_for_export(text: &StyledText) -> StyledText {
    text.map_attributes(|attrs| {
        let mut attrs = attrs.clone();
        match attrs.foreground {
            None => attrs.foreground = Some(Color::BLACK),
            Some(color) if color.is_theme_adaptive() || color.is_light() => {
                attrs.foreground = Some(Color::BLACK);
            }
            Some(_) => {}
        }
        attrs
    })
}

/// HTML export: adaptive and near-white colors are removed without a
/// substitute, leaving the destination stylesheet in charge.
pub fn prepare_for_html_export(text: &StyledText) -> StyledText {
    text.map_attributes(|attrs| {
        let mut attrs = attrs.clone();
        if attrs
            .foreground
            .is_some_and(|color| color.is_theme_adaptive() || color.is_light())
        {
            attrs.foreground = None;
        }
        attrs
    })
}
