use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum RelationType {
    #[default]
    Father,
    Husband,
    Mother,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    #[default]
    M,
    F,
}

/// One voter's structured record as read from a single roll cell.
///
/// Fields the grammar could not resolve keep their defaults: `"Unknown"` for
/// the identity code and name, empty strings for the free-text fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoterRecord {
    pub epic: String,
    pub name: String,
    pub relative_name: String,
    pub relation_type: RelationType,
    pub house_number: String,
    pub age: String,
    pub gender: Gender,
    /// Set when the gender came from a keyword or a husband label rather than
    /// the default.
    #[serde(skip)]
    pub gender_resolved: bool,
    pub original_text: String,
    pub box_index: usize,
    pub page_number: usize,
    pub village: String,
}

impl Default for VoterRecord {
    fn default() -> Self {
        Self {
            epic: UNKNOWN.to_string(),
            name: UNKNOWN.to_string(),
            relative_name: String::new(),
            relation_type: RelationType::Father,
            house_number: String::new(),
            age: String::new(),
            gender: Gender::M,
            gender_resolved: false,
            original_text: String::new(),
            box_index: 0,
            page_number: 0,
            village: String::new(),
        }
    }
}

impl VoterRecord {
    pub fn with_original_text(text: &str) -> Self {
        Self {
            original_text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn has_epic(&self) -> bool {
        self.epic != UNKNOWN
    }

    pub fn has_name(&self) -> bool {
        self.name != UNKNOWN
    }

    /// A record is worth emitting once either identifying field resolved.
    pub fn is_identified(&self) -> bool {
        self.has_epic() || self.has_name()
    }

    pub fn needs_rescue(&self) -> bool {
        !self.has_epic() || !self.has_name()
    }

    /// Copies every field still at its default from `other`, keeping resolved ones.
    ///
    /// The relation type travels with the relative name. The gender is taken
    /// only when `other` resolved it and this record did not.
    pub fn fill_missing_from(&mut self, other: &VoterRecord) {
        if !self.has_epic() {
            self.epic = other.epic.clone();
        }
        if !self.has_name() {
            self.name = other.name.clone();
        }
        if self.relative_name.is_empty() && !other.relative_name.is_empty() {
            self.relative_name = other.relative_name.clone();
            self.relation_type = other.relation_type;
        }
        if !self.gender_resolved && other.gender_resolved {
            self.gender = other.gender;
            self.gender_resolved = true;
        }
        if self.house_number.is_empty() {
            self.house_number = other.house_number.clone();
        }
        if self.age.is_empty() {
            self.age = other.age.clone();
        }
    }

    pub fn stamp(&mut self, box_index: usize, page_number: usize, village: &str) {
        self.box_index = box_index;
        self.page_number = page_number;
        self.village = village.to_string();
    }
}

/// Outcome of parsing one cell's recognized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellParse {
    Record(VoterRecord),
    /// The cell carries a deletion marker and must not produce a record.
    Deleted,
}

impl CellParse {
    pub fn into_record(self) -> Option<VoterRecord> {
        match self {
            CellParse::Record(record) => Some(record),
            CellParse::Deleted => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, CellParse::Deleted)
    }
}

/// Per-page counters written to the diagnostic stream.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub page_number: usize,
    pub village: String,
    pub candidate_boxes: usize,
    pub parsed: usize,
}
