//! Names derived from the user's display name

/// Used when a display name has no PostScript-safe characters at all
pub const DEFAULT_SAFE_NAME: &str = "HangeulCodingFont";

/// Style of every merged font
pub const REGULAR_STYLE: &str = "Regular";

/// Extension of every output file
pub const FONT_EXTENSION: &str = "ttf";

/// Keep only `[A-Za-z0-9-]`, falling back to [`DEFAULT_SAFE_NAME`]
pub fn safe_font_name(display_name: &str) -> String {
    let safe: String = display_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if safe.is_empty() {
        DEFAULT_SAFE_NAME.to_string()
    } else {
        safe
    }
}

/// PostScript name of a face, e.g. `MyFont2024-Regular`
pub fn postscript_name(display_name: &str, style_name: &str) -> String {
    let style: String = style_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let style = if style.is_empty() {
        REGULAR_STYLE.to_string()
    } else {
        style
    };
    format!("{}-{}", safe_font_name(display_name), style)
}

/// File name offered for download, e.g. `MyFont2024.ttf`
pub fn output_file_name(display_name: &str) -> String {
    format!("{}.{}", safe_font_name(display_name), FONT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_spaces_and_punctuation() {
        assert_eq!(safe_font_name("My Font!! 2024"), "MyFont2024");
        assert_eq!(output_file_name("My Font!! 2024"), "MyFont2024.ttf");
        assert_eq!(
            postscript_name("My Font!! 2024", REGULAR_STYLE),
            "MyFont2024-Regular"
        );
    }

    #[test]
    fn keeps_hyphens() {
        assert_eq!(safe_font_name("D2-Coding Nerd"), "D2-CodingNerd");
    }

    #[test]
    fn non_latin_names_fall_back() {
        assert_eq!(safe_font_name("한글 코딩"), DEFAULT_SAFE_NAME);
        assert_eq!(safe_font_name(""), DEFAULT_SAFE_NAME);
        assert_eq!(output_file_name("!!!"), "HangeulCodingFont.ttf");
        assert_eq!(
            postscript_name("", REGULAR_STYLE),
            "HangeulCodingFont-Regular"
        );
    }

    #[test]
    fn style_is_sanitized() {
        assert_eq!(postscript_name("Mono", "Bold Italic"), "Mono-BoldItalic");
        assert_eq!(postscript_name("Mono", ""), "Mono-Regular");
    }
}
