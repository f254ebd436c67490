//! Image-generation prompt validation and composition.
//!
//! A request carries a free-text prompt plus an optional style, aspect
//! ratio, and resolution. [`compose_image_prompt`] folds them into the single
//! instruction string sent to the image model.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits and allowed values
// ---------------------------------------------------------------------------

/// Maximum length of a user prompt, in characters.
pub const MAX_PROMPT_LEN: usize = 4000;

/// Maximum length of a style name, in characters.
pub const MAX_STYLE_NAME_LEN: usize = 100;

/// Aspect ratios offered in the generator.
pub const VALID_RATIOS: &[&str] = &["1:1", "4:5", "3:4", "16:9", "9:16"];

/// Output resolutions offered in the generator.
pub const VALID_RESOLUTIONS: &[&str] = &["1K", "2K", "4K"];

pub const DEFAULT_RATIO: &str = "1:1";
pub const DEFAULT_RESOLUTION: &str = "1K";

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a prompt: non-blank and within [`MAX_PROMPT_LEN`].
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation("Prompt must not be empty".into()));
    }
    let len = prompt.chars().count();
    if len > MAX_PROMPT_LEN {
        return Err(CoreError::Validation(format!(
            "Prompt too long: {len} chars (max {MAX_PROMPT_LEN})"
        )));
    }
    Ok(())
}

pub fn validate_ratio(ratio: &str) -> Result<(), CoreError> {
    if VALID_RATIOS.contains(&ratio) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid ratio '{ratio}'. Must be one of: {}",
            VALID_RATIOS.join(", ")
        )))
    }
}

pub fn validate_resolution(resolution: &str) -> Result<(), CoreError> {
    if VALID_RESOLUTIONS.contains(&resolution) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid resolution '{resolution}'. Must be one of: {}",
            VALID_RESOLUTIONS.join(", ")
        )))
    }
}

pub fn validate_style_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Style name must not be empty".into()));
    }
    if name.chars().count() > MAX_STYLE_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Style name too long (max {MAX_STYLE_NAME_LEN})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// Long-edge pixel count for a resolution label.
fn long_edge(resolution: &str) -> u32 {
    match resolution {
        "4K" => 4096,
        "2K" => 2048,
        _ => 1024,
    }
}

/// Target `(width, height)` in pixels for a validated ratio and resolution.
pub fn target_dimensions(ratio: &str, resolution: &str) -> Result<(u32, u32), CoreError> {
    validate_ratio(ratio)?;
    validate_resolution(resolution)?;

    let (w, h) = ratio
        .split_once(':')
        .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
        .ok_or_else(|| CoreError::Internal(format!("Malformed ratio constant '{ratio}'")))?;

    let edge = long_edge(resolution);
    if w >= h {
        Ok((edge, edge * h / w))
    } else {
        Ok((edge * w / h, edge))
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Build the instruction sent to the image model.
///
/// The style modifier, when present and non-blank, is appended as its own
/// sentence; ratio and resolution are always stated explicitly.
pub fn compose_image_prompt(
    prompt: &str,
    style_modifier: Option<&str>,
    ratio: &str,
    resolution: &str,
) -> Result<String, CoreError> {
    validate_prompt(prompt)?;
    let (width, height) = target_dimensions(ratio, resolution)?;

    let mut composed = prompt.trim().to_string();
    if let Some(modifier) = style_modifier.map(str::trim).filter(|m| !m.is_empty()) {
        composed.push_str(". Style: ");
        composed.push_str(modifier);
    }
    composed.push_str(&format!(
        ". Aspect ratio {ratio}, approximately {width}x{height} pixels."
    ));
    Ok(composed)
}

/// Instruction for turning an uploaded menu photo into marketing imagery.
pub fn compose_menu_prompt(extra: Option<&str>) -> String {
    let base = "Enhance this restaurant menu photo into a professional, appetizing \
                food marketing image. Keep the dish recognisable, improve lighting, \
                plating and background";
    match extra.map(str::trim).filter(|e| !e.is_empty()) {
        Some(extra) => format!("{base}. {extra}"),
        None => format!("{base}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_prompt_rejects_blank_and_long() {
        assert!(validate_prompt("  ").is_err());
        assert!(validate_prompt(&"a".repeat(MAX_PROMPT_LEN + 1)).is_err());
        assert!(validate_prompt("Burger on a wooden board").is_ok());
    }

    #[test]
    fn validate_ratio_lists_allowed_values() {
        let err = validate_ratio("2:1").unwrap_err();
        assert!(err.to_string().contains("16:9"));
    }

    #[test]
    fn dimensions_follow_ratio() {
        assert_eq!(target_dimensions("1:1", "1K").unwrap(), (1024, 1024));
        assert_eq!(target_dimensions("16:9", "2K").unwrap(), (2048, 1152));
        assert_eq!(target_dimensions("9:16", "1K").unwrap(), (576, 1024));
        assert_eq!(target_dimensions("4:5", "4K").unwrap(), (3276, 4096));
    }

    #[test]
    fn compose_includes_style_and_ratio() {
        let prompt =
            compose_image_prompt("Margherita pizza", Some("warm rustic light"), "4:5", "1K")
                .unwrap();
        assert!(prompt.starts_with("Margherita pizza. Style: warm rustic light."));
        assert!(prompt.contains("Aspect ratio 4:5"));
    }

    #[test]
    fn compose_skips_blank_style() {
        let prompt = compose_image_prompt("Sushi platter", Some("   "), "1:1", "1K").unwrap();
        assert!(!prompt.contains("Style:"));
    }

    #[test]
    fn menu_prompt_appends_extra_instructions() {
        assert!(compose_menu_prompt(Some("Use a marble table")).ends_with("Use a marble table"));
        assert!(compose_menu_prompt(None).ends_with("background."));
    }
}
