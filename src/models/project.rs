use serde::{Deserialize, Deserializer, Serialize};

/// Tax-credit category a project may qualify for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectType {
    #[serde(rename = "CIR")]
    Cir,
    #[serde(rename = "CII")]
    Cii,
    Mixte,
    #[default]
    Incertain,
}

impl ProjectType {
    pub fn label(self) -> &'static str {
        match self {
            ProjectType::Cir => "CIR",
            ProjectType::Cii => "CII",
            ProjectType::Mixte => "Mixte",
            ProjectType::Incertain => "Incertain",
        }
    }

    /// Counts toward the research tax credit.
    pub fn is_cir_potential(self) -> bool {
        matches!(self, ProjectType::Cir | ProjectType::Mixte)
    }

    /// Counts toward the innovation tax credit.
    pub fn is_cii_potential(self) -> bool {
        matches!(self, ProjectType::Cii | ProjectType::Mixte)
    }

    pub fn next(self) -> Self {
        match self {
            ProjectType::Cir => ProjectType::Cii,
            ProjectType::Cii => ProjectType::Mixte,
            ProjectType::Mixte => ProjectType::Incertain,
            ProjectType::Incertain => ProjectType::Cir,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            ProjectType::Cir => ProjectType::Incertain,
            ProjectType::Cii => ProjectType::Cir,
            ProjectType::Mixte => ProjectType::Cii,
            ProjectType::Incertain => ProjectType::Mixte,
        }
    }
}

/// How well the project's work is documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    Faible,
    #[default]
    Moyen,
    Excellent,
}

impl Quality {
    pub fn label(self) -> &'static str {
        match self {
            Quality::Faible => "Faible",
            Quality::Moyen => "Moyen",
            Quality::Excellent => "Excellent",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Quality::Faible => Quality::Moyen,
            Quality::Moyen => Quality::Excellent,
            Quality::Excellent => Quality::Faible,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Quality::Faible => Quality::Excellent,
            Quality::Moyen => Quality::Faible,
            Quality::Excellent => Quality::Moyen,
        }
    }
}

/// A tracked R&D subject.
///
/// Free-text fields missing from a remote payload default to empty; the
/// identifier is always required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub lead: String,
    #[serde(rename = "type", default)]
    pub kind: ProjectType,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub notes: String,
}

impl Project {
    /// Empty draft whose identifier is taken from the current time.
    pub fn draft() -> Self {
        Self::with_id(chrono::Utc::now().timestamp_millis().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: String::new(),
            lead: String::new(),
            kind: ProjectType::default(),
            team: String::new(),
            quality: Quality::default(),
            notes: String::new(),
        }
    }

    pub fn has_subject(&self) -> bool {
        !self.subject.trim().is_empty()
    }
}

// Some backends hand out numeric row ids.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(f) => f.to_string(),
    })
}
