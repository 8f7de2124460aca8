use crate::ScreenerError;
use std::fmt;
use std::str::FromStr;

/// Table layouts offered by the screener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TableKind {
    #[default]
    Overview,
    Valuation,
    Ownership,
    Performance,
    Custom,
    Financial,
    Technical,
}

impl TableKind {
    /// Every table kind, in wire-code order
    pub const ALL: [TableKind; 7] = [
        TableKind::Overview,
        TableKind::Valuation,
        TableKind::Ownership,
        TableKind::Performance,
        TableKind::Custom,
        TableKind::Financial,
        TableKind::Technical,
    ];

    /// Returns the code the remote source expects in the `v` parameter
    pub fn wire_code(self) -> &'static str {
        match self {
            Self::Overview => "110",
            Self::Valuation => "120",
            Self::Ownership => "130",
            Self::Performance => "140",
            Self::Custom => "150",
            Self::Financial => "160",
            Self::Technical => "170",
        }
    }

    /// Returns the user-facing table name
    pub fn name(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Valuation => "Valuation",
            Self::Ownership => "Ownership",
            Self::Performance => "Performance",
            Self::Custom => "Custom",
            Self::Financial => "Financial",
            Self::Technical => "Technical",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableKind {
    type Err = ScreenerError;

    /// Resolves a table name exactly as the screener spells it
    ///
    /// # Examples
    ///
    /// ```
    /// use screener_harvest::TableKind;
    ///
    /// let table: TableKind = "Performance".parse().unwrap();
    /// assert_eq!(table.wire_code(), "140");
    /// assert!("Bogus".parse::<TableKind>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ScreenerError::InvalidTableType {
                table: s.to_string(),
            })
    }
}
