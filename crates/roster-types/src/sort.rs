use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "added", alias = "addedRecently")]
    AddedRecently,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "company")]
    Company,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::AddedRecently,
        SortKey::Name,
        SortKey::Email,
        SortKey::Company,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::AddedRecently => "added",
            SortKey::Name => "name",
            SortKey::Email => "email",
            SortKey::Company => "company",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::AddedRecently => "Recently added",
            SortKey::Name => "Name (A-Z)",
            SortKey::Email => "Email (A-Z)",
            SortKey::Company => "Company (A-Z)",
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "added" | "addedrecently" | "recent" => Ok(SortKey::AddedRecently),
            "name" => Ok(SortKey::Name),
            "email" => Ok(SortKey::Email),
            "company" => Ok(SortKey::Company),
            other => Err(format!(
                "unknown sort key '{}' (expected one of: added, name, email, company)",
                other
            )),
        }
    }
}
