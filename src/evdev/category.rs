use std::fmt;
use std::str::FromStr;

/// Class of input events (`EV_*`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Category(pub u16);

impl Category {
    /// Querying codes of this category returns the category bitmask itself,
    /// since `EVIOCGBIT(0)` doubles as the category query.
    pub const SYN: Category = Category(0x00);
    pub const KEY: Category = Category(0x01);
    pub const REL: Category = Category(0x02);
    pub const ABS: Category = Category(0x03);
    pub const MSC: Category = Category(0x04);
    pub const SW: Category = Category(0x05);
    pub const LED: Category = Category(0x11);
    pub const SND: Category = Category(0x12);
    /// Auto-repeat settings. Not an input capability.
    pub const REP: Category = Category(0x14);
    pub const FF: Category = Category(0x15);
    pub const PWR: Category = Category(0x16);
    pub const FF_STATUS: Category = Category(0x17);

    /// Highest category value (`EV_MAX`).
    pub const MAX: u16 = 0x1f;

    const NAMES: [(Category, &'static str); 12] = [
        (Category::SYN, "EV_SYN"),
        (Category::KEY, "EV_KEY"),
        (Category::REL, "EV_REL"),
        (Category::ABS, "EV_ABS"),
        (Category::MSC, "EV_MSC"),
        (Category::SW, "EV_SW"),
        (Category::LED, "EV_LED"),
        (Category::SND, "EV_SND"),
        (Category::REP, "EV_REP"),
        (Category::FF, "EV_FF"),
        (Category::PWR, "EV_PWR"),
        (Category::FF_STATUS, "EV_FF_STATUS"),
    ];

    pub fn code(&self) -> u16 {
        self.0
    }

    /// Highest code the kernel ABI defines for this category, if known.
    pub const fn max_code(&self) -> Option<u16> {
        match *self {
            Category::SYN => Some(0x0f),
            Category::KEY => Some(0x2ff),
            Category::REL => Some(0x0f),
            Category::ABS => Some(0x3f),
            Category::MSC => Some(0x07),
            Category::SW => Some(0x11),
            Category::LED => Some(0x0f),
            Category::SND => Some(0x07),
            Category::REP => Some(0x01),
            Category::FF => Some(0x7f),
            Category::PWR => Some(0x00),
            Category::FF_STATUS => Some(0x01),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        Self::NAMES.iter().find(|(c, _)| c == self).map(|&(_, name)| name)
    }
}

impl From<u16> for Category {
    fn from(code: u16) -> Self {
        Category(code)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "EV_UNKNOWN({})", self.0),
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct ParseCategoryError;

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown event category name or invalid numeric category")
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        let prefixed = match upper.starts_with("EV_") {
            true => upper,
            false => format!("EV_{}", upper),
        };
        match Self::NAMES.iter().find(|(_, name)| *name == prefixed) {
            Some(&(category, _)) => Ok(category),
            None => Ok(Category(s.parse().map_err(|_| ParseCategoryError)?)),
        }
    }
}

/// Event code, only meaningful relative to its [`Category`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Code(pub u16);

impl Code {
    pub fn code(&self) -> u16 {
        self.0
    }
}

impl From<u16> for Code {
    fn from(code: u16) -> Self {
        Code(code)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_table() {
        assert_eq!(Category::KEY.max_code(), Some(0x2ff));
        assert_eq!(Category::ABS.max_code(), Some(0x3f));
        assert_eq!(Category::SW.max_code(), Some(0x11));
        assert_eq!(Category::PWR.max_code(), Some(0));
        assert_eq!(Category(0x06).max_code(), None);
        assert_eq!(Category(Category::MAX).max_code(), None);
    }

    #[test]
    fn every_named_category_has_a_bound() {
        for (category, _) in Category::NAMES {
            assert!(category.max_code().is_some(), "{} has no bound", category);
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(Category::KEY.to_string(), "EV_KEY");
        assert_eq!(Category::FF_STATUS.to_string(), "EV_FF_STATUS");
        assert_eq!(Category(0x1e).to_string(), "EV_UNKNOWN(30)");
    }

    #[test]
    fn parse_names_and_numbers() {
        assert_eq!("EV_ABS".parse::<Category>().unwrap(), Category::ABS);
        assert_eq!("rel".parse::<Category>().unwrap(), Category::REL);
        assert_eq!("17".parse::<Category>().unwrap(), Category::LED);
        assert!("EV_BOGUS".parse::<Category>().is_err());
    }
}
