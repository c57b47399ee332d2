use anyhow::{bail, Error};
use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// A language section inside a dump hosted in some wiki language.
///
/// `EnKo` means "Korean entries on English Wiktionary"; the first half names
/// the hosting wiki, the second the entry language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Language {
    #[value(name = "en-es")]
    EnEs,
    #[value(name = "en-en")]
    EnEn,
    #[value(name = "en-de")]
    EnDe,
    #[value(name = "en-zh")]
    EnZh,
    #[value(name = "en-ko")]
    EnKo,
    #[value(name = "ja-ko")]
    JaKo,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::EnEs,
        Language::EnEn,
        Language::EnDe,
        Language::EnZh,
        Language::EnKo,
        Language::JaKo,
    ];

    /// Literal second-level headings that open this language's section.
    pub fn headings(self) -> &'static [&'static str] {
        match self {
            Language::EnEs => &["==Spanish=="],
            Language::EnEn => &["==English=="],
            Language::EnDe => &["==German=="],
            Language::EnZh => &["==Chinese=="],
            Language::EnKo => &["==Korean=="],
            Language::JaKo => &[
                "==朝鮮語==",
                "=={{ko}}==",
                "=={{kor}}==",
                "=={{kor-KP}}==",
                "=={{kor-KR}}==",
                "=={{kor-KR}==",
            ],
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::EnEs => "en-es",
            Language::EnEn => "en-en",
            Language::EnDe => "en-de",
            Language::EnZh => "en-zh",
            Language::EnKo => "en-ko",
            Language::JaKo => "ja-ko",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Language::ALL.iter().find(|lang| lang.code() == s) {
            Some(lang) => Ok(*lang),
            None => bail!("Unknown language: {s}"),
        }
    }
}
