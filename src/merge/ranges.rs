//! Unicode range catalog
//!
//! Every user-selectable category and the code-point ranges it pulls from
//! its source font. The tables are fixed so glyph counts stay predictable.

use crate::font_source::FontOrigin;
use serde::{Deserialize, Serialize};

/// An inclusive span of code points
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnicodeRange {
    pub start: u32,
    pub end: u32,
    pub label: &'static str,
}

impl UnicodeRange {
    pub const fn new(start: u32, end: u32, label: &'static str) -> Self {
        Self { start, end, label }
    }

    pub fn contains(&self, codepoint: u32) -> bool {
        (self.start..=self.end).contains(&codepoint)
    }

    /// Number of code points covered; zero when `end` precedes `start`
    pub fn len(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Whether the range lies in the Basic Multilingual Plane Private Use Area
    pub fn is_private_use(&self) -> bool {
        self.start >= 0xE000 && self.end <= 0xF8FF
    }

    pub fn codepoints(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

const HANGUL_SYLLABLES: &[UnicodeRange] = &[UnicodeRange::new(0xAC00, 0xD7AF, "Korean Hangul")];

const HANGUL_JAMO: &[UnicodeRange] = &[
    UnicodeRange::new(0x1100, 0x11FF, "Korean Jamo"),
    UnicodeRange::new(0x3130, 0x318F, "Korean Compatibility Jamo"),
];

const HANGUL_EXTENDED_JAMO: &[UnicodeRange] = &[
    UnicodeRange::new(0xA960, 0xA97F, "Korean Jamo Extended-A"),
    UnicodeRange::new(0xD7B0, 0xD7FF, "Korean Jamo Extended-B"),
];

const LATIN_LETTERS: &[UnicodeRange] = &[
    UnicodeRange::new(0x0041, 0x005A, "English Uppercase"),
    UnicodeRange::new(0x0061, 0x007A, "English Lowercase"),
];

const DIGITS: &[UnicodeRange] = &[UnicodeRange::new(0x0030, 0x0039, "English Numbers")];

const ASCII_SYMBOLS: &[UnicodeRange] = &[
    UnicodeRange::new(0x0020, 0x002F, "English Symbols 1"),
    UnicodeRange::new(0x003A, 0x0040, "English Symbols 2"),
    UnicodeRange::new(0x005B, 0x0060, "English Symbols 3"),
    UnicodeRange::new(0x007B, 0x007E, "English Symbols 4"),
];

const EXTENDED_SYMBOLS: &[UnicodeRange] = &[
    UnicodeRange::new(0x00A0, 0x00FF, "English Special 1"),
    UnicodeRange::new(0x2000, 0x206F, "English Special 2"),
];

const LIGATURES: &[UnicodeRange] = &[UnicodeRange::new(0xFB00, 0xFB4F, "Standard Ligatures")];

const ICONS: &[UnicodeRange] = &[
    UnicodeRange::new(0xE5FA, 0xE6AC, "Icons 1"),
    UnicodeRange::new(0xE700, 0xE7C5, "Icons 2"),
    UnicodeRange::new(0xF000, 0xF2E0, "Icons 3"),
];

/// A user-selectable group of characters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    KoreanHangul,
    KoreanJamo,
    KoreanExtendedJamo,
    EnglishLetters,
    EnglishNumbers,
    EnglishSymbols,
    EnglishSpecial,
    EnglishLigatures,
    EnglishIcons,
}

impl Category {
    /// All categories in processing order
    ///
    /// Order matters: when two enabled categories could supply the same code
    /// point, the earlier one claims it.
    pub const ALL: [Category; 9] = [
        Category::KoreanHangul,
        Category::KoreanJamo,
        Category::KoreanExtendedJamo,
        Category::EnglishLetters,
        Category::EnglishNumbers,
        Category::EnglishSymbols,
        Category::EnglishSpecial,
        Category::EnglishLigatures,
        Category::EnglishIcons,
    ];

    pub fn ranges(self) -> &'static [UnicodeRange] {
        match self {
            Category::KoreanHangul => HANGUL_SYLLABLES,
            Category::KoreanJamo => HANGUL_JAMO,
            Category::KoreanExtendedJamo => HANGUL_EXTENDED_JAMO,
            Category::EnglishLetters => LATIN_LETTERS,
            Category::EnglishNumbers => DIGITS,
            Category::EnglishSymbols => ASCII_SYMBOLS,
            Category::EnglishSpecial => EXTENDED_SYMBOLS,
            Category::EnglishLigatures => LIGATURES,
            Category::EnglishIcons => ICONS,
        }
    }

    /// Which source font supplies this category
    pub fn origin(self) -> FontOrigin {
        match self {
            Category::KoreanHangul | Category::KoreanJamo | Category::KoreanExtendedJamo => {
                FontOrigin::Korean
            }
            _ => FontOrigin::English,
        }
    }

    /// Key used in settings files
    pub fn key(self) -> &'static str {
        match self {
            Category::KoreanHangul => "koreanHangul",
            Category::KoreanJamo => "koreanJamo",
            Category::KoreanExtendedJamo => "koreanExtendedJamo",
            Category::EnglishLetters => "englishLetters",
            Category::EnglishNumbers => "englishNumbers",
            Category::EnglishSymbols => "englishSymbols",
            Category::EnglishSpecial => "englishSpecial",
            Category::EnglishLigatures => "englishLigatures",
            Category::EnglishIcons => "englishIcons",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::KoreanHangul => "Hangul syllables (가-힣)",
            Category::KoreanJamo => "Hangul jamo and compatibility jamo",
            Category::KoreanExtendedJamo => "Hangul jamo extended A and B",
            Category::EnglishLetters => "Latin letters (A-Z, a-z)",
            Category::EnglishNumbers => "Digits (0-9)",
            Category::EnglishSymbols => "ASCII punctuation and symbols",
            Category::EnglishSpecial => "Latin-1 supplement and general punctuation",
            Category::EnglishLigatures => "Alphabetic presentation forms (ligatures)",
            Category::EnglishIcons => "Icon font glyphs in the Private Use Area",
        }
    }
}

/// Whether a code point belongs to any Hangul category
///
/// These glyphs get the wide advance when widths are normalized.
pub fn is_hangul(codepoint: u32) -> bool {
    Category::ALL
        .iter()
        .filter(|category| category.origin() == FontOrigin::Korean)
        .flat_map(|category| category.ranges())
        .any(|range| range.contains(codepoint))
}

/// Per-category on/off switches for one merge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionOptions {
    pub korean_hangul: bool,
    pub korean_jamo: bool,
    pub korean_extended_jamo: bool,
    pub english_letters: bool,
    pub english_numbers: bool,
    pub english_symbols: bool,
    pub english_special: bool,
    pub english_ligatures: bool,
    pub english_icons: bool,
}

impl SelectionOptions {
    /// Every category enabled
    pub fn all() -> Self {
        Self::from_categories(Category::ALL)
    }

    /// Every category except the rarely needed extended jamo
    pub fn recommended() -> Self {
        let mut options = Self::all();
        options.korean_extended_jamo = false;
        options
    }

    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut options = Self::default();
        for category in categories {
            options.set(category, true);
        }
        options
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::KoreanHangul => self.korean_hangul,
            Category::KoreanJamo => self.korean_jamo,
            Category::KoreanExtendedJamo => self.korean_extended_jamo,
            Category::EnglishLetters => self.english_letters,
            Category::EnglishNumbers => self.english_numbers,
            Category::EnglishSymbols => self.english_symbols,
            Category::EnglishSpecial => self.english_special,
            Category::EnglishLigatures => self.english_ligatures,
            Category::EnglishIcons => self.english_icons,
        }
    }

    pub fn set(&mut self, category: Category, enabled: bool) {
        let flag = match category {
            Category::KoreanHangul => &mut self.korean_hangul,
            Category::KoreanJamo => &mut self.korean_jamo,
            Category::KoreanExtendedJamo => &mut self.korean_extended_jamo,
            Category::EnglishLetters => &mut self.english_letters,
            Category::EnglishNumbers => &mut self.english_numbers,
            Category::EnglishSymbols => &mut self.english_symbols,
            Category::EnglishSpecial => &mut self.english_special,
            Category::EnglishLigatures => &mut self.english_ligatures,
            Category::EnglishIcons => &mut self.english_icons,
        };
        *flag = enabled;
    }

    /// Enabled categories in processing order
    pub fn enabled(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL
            .into_iter()
            .filter(move |category| self.is_enabled(*category))
    }

    /// Every (category, range) pair a merge will scan, in order
    pub fn plan(&self) -> Vec<(Category, &'static UnicodeRange)> {
        self.enabled()
            .flat_map(|category| category.ranges().iter().map(move |range| (category, range)))
            .collect()
    }

    /// Whether any enabled category can pull in glyphs with layout rules
    pub fn carries_layout(&self) -> bool {
        self.english_ligatures || self.english_icons
    }
}
