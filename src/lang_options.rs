use clap::ValueEnum;
use encoding::label::encoding_from_windows_code_page;
use encoding::{DecoderTrap, Encoding};
use std::borrow::Cow;

/// supported language version modes
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LanguageVersion {
    #[value(name = "iso-1")]
    Iso1,
    #[value(name = "iso-2")]
    Iso2,
    #[default]
    Default,
    /// Default plus the query extensions; pulls `System.Core` into the implicit references
    #[value(name = "linq")]
    Linq,
}

impl LanguageVersion {
    /// Parse a `-langversion` value, case-insensitive
    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

/// Text encoding used to decode source files (`-codepage`)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Default,
    Utf8,
    CodePage(usize),
}

impl TextEncoding {
    /// Resolve a numeric code page. `None` when the code page is unknown.
    pub fn from_code_page(id: usize) -> Option<Self> {
        encoding_from_windows_code_page(id).map(|_| TextEncoding::CodePage(id))
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, Cow<'static, str>> {
        match self {
            TextEncoding::Default | TextEncoding::Utf8 => encoding::all::UTF_8.decode(bytes, DecoderTrap::Replace),
            TextEncoding::CodePage(id) => match encoding_from_windows_code_page(*id) {
                Some(enc) => enc.decode(bytes, DecoderTrap::Replace),
                None => Err(Cow::Owned(format!("code page {} is not installed", id))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_version_is_case_insensitive() {
        assert_eq!(LanguageVersion::parse("ISO-1"), Some(LanguageVersion::Iso1));
        assert_eq!(LanguageVersion::parse("iso-2"), Some(LanguageVersion::Iso2));
        assert_eq!(LanguageVersion::parse("Default"), Some(LanguageVersion::Default));
        assert_eq!(LanguageVersion::parse("c11"), None);
    }

    #[test]
    fn test_code_page_lookup() {
        assert_eq!(TextEncoding::from_code_page(1252), Some(TextEncoding::CodePage(1252)));
        assert_eq!(TextEncoding::from_code_page(999_999), None);
    }

    #[test]
    fn test_decode_windows_1252() {
        let text = TextEncoding::CodePage(1252).decode(&[0x63, 0x61, 0x66, 0xE9]).unwrap();
        assert_eq!(text, "café");
    }
}
