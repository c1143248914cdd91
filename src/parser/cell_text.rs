//! Label-driven grammar for one voter cell.
//!
//! Recognition output for a roll cell is a few lines of mixed Hindi and
//! English. Every field is bounded by printed labels, and each label shows up
//! in several OCR-degraded spellings, so every extractor below carries a list
//! of variants. The variants come from recorded recognition output; keep them
//! even when they look redundant.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::model::{CellParse, Gender, RelationType, VoterRecord, UNKNOWN};
use crate::parser::devanagari::clean_script_text;

static DELETION_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(विलोपित|विलोभित|Deleted|वि लो पित|लोपित)").expect("static regex")
});

// A marker directly after a name label is part of the name field, not a deletion stamp.
static NAME_BEFORE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(नाम|निर्वाचक|Name)\s*[:\-]*\s*(विलोपित|विलोभित|Deleted)").expect("static regex")
});

static EPIC_SHAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z]{2,3}[A-Z0-9/\-.I§\}\{\]\[()#]{3,15}|[A-Z]{2,}/[0-9/]{3,})")
        .expect("static regex")
});

static EPIC_CANONICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z]{1,4}[0-9]{4,10}|[A-Z0-9]{2,}/[0-9/]{4,})").expect("static regex")
});

static EPIC_JUNK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Z0-9/]").expect("static regex"));

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:(?:निर्वाचक|र्चक|चक)\s*(?:का)?\s*नाम|Elector'?s?\s+Name|Name)\s*[:\-\.]*\s*(.+?)\s*(?:पिता|पति|माता|Relative|Father|Husband|Mother|पीटो|Photo|मकान|House|उम्र|Age)",
    )
    .expect("static regex")
});

static NAME_TOKEN_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:नाम|Name)\s*[:\-\.]*").expect("static regex"));

static NEXT_LABEL_SPLIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:पिता|पति|माता|Relative|Father|Husband|Mother|पीटो|मकान|उम्र)")
        .expect("static regex")
});

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(पिता|पति|माता|Father|Husband|Mother)\s*(?:का|की|'s)?\s*(?:नाम|नास|दाम|तान|Name)?\s*[:\-\.]*\s*(.+?)\s*(?:मकान|House|Makan|पीटो|Photo|उम्र|Age|आयु|संख्या)",
    )
    .expect("static regex")
});

static HOUSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:मकान|House|संख्या)\s*(?:संख्या|सं|Number|No)?\s*[:\-\.]*\s*([A-Z0-9\-/$]+)",
    )
    .expect("static regex")
});

static AGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:उम्र|Age|आयु|उप्र)\s*[:\-\.]*\s*(\d+)").expect("static regex"));

const FEMALE_KEYWORDS: &[&str] = &["महिला", "Female", "Fem"];
const MALE_KEYWORDS: &[&str] = &["पुरुष", "Male", "Mal"];

/// Parses one cell's recognized text.
///
/// Returns [`CellParse::Deleted`] when the cell carries a deletion stamp;
/// otherwise a record whose unmatched fields keep their defaults.
pub fn parse_cell_text(text: &str) -> CellParse {
    if is_deleted(text) {
        return CellParse::Deleted;
    }

    let mut record = VoterRecord::with_original_text(text);
    record.epic = extract_epic(text);

    let blob = text.replace('\n', "  ");

    if let Some(name) = extract_name(&blob).filter(|name| !name.is_empty()) {
        record.name = name;
    }

    if let Some((relation, relative_name)) = extract_relative(&blob) {
        record.relation_type = relation;
        if relation == RelationType::Husband {
            record.gender = Gender::F;
            record.gender_resolved = true;
        }
        record.relative_name = relative_name;
    }

    if let Some(house) = HOUSE_RE.captures(&blob).and_then(|caps| caps.get(1)) {
        record.house_number = house.as_str().trim().to_string();
    }

    if let Some(age) = AGE_RE.captures(&blob).and_then(|caps| caps.get(1)) {
        record.age = age.as_str().to_string();
    }

    if let Some(gender) = explicit_gender(&blob) {
        record.gender = gender;
        record.gender_resolved = true;
    }

    CellParse::Record(record)
}

/// True when the text carries a deletion marker that is not part of a name field.
pub fn is_deleted(text: &str) -> bool {
    DELETION_MARKER_RE.is_match(text) && !NAME_BEFORE_MARKER_RE.is_match(text)
}

/// Finds the identity code on the first two lines of a cell.
pub fn extract_epic(text: &str) -> String {
    let header: String = text
        .lines()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect();

    match EPIC_SHAPE_RE.find(&header) {
        Some(found) => normalize_epic(found.as_str()),
        None => UNKNOWN.to_string(),
    }
}

/// Uppercases, drops everything outside `A-Z0-9/` and re-matches a canonical
/// code shape. Falls back to the first 12 characters of a long enough residue.
pub fn normalize_epic(raw: &str) -> String {
    if raw.is_empty() {
        return UNKNOWN.to_string();
    }
    let upper: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let cleaned = EPIC_JUNK_RE.replace_all(&upper, "");

    if let Some(found) = EPIC_CANONICAL_RE.find(&cleaned) {
        return found.as_str().to_string();
    }
    if cleaned.chars().count() >= 6 {
        return cleaned.chars().take(12).collect();
    }
    UNKNOWN.to_string()
}

fn extract_name(blob: &str) -> Option<String> {
    if let Some(caps) = NAME_RE.captures(blob) {
        let name = clean_script_text(caps.get(1)?.as_str());
        return Some(name);
    }

    // Label present but the bounded pattern failed: take what follows the
    // label up to the next known label.
    if !(blob.contains("नाम") || blob.contains("Name")) {
        return None;
    }
    let segment = NAME_TOKEN_SPLIT_RE.split(blob).nth(1)?;
    let value = NEXT_LABEL_SPLIT_RE.split(segment).next().unwrap_or_default();
    Some(clean_script_text(value))
}

fn extract_relative(blob: &str) -> Option<(RelationType, String)> {
    let caps = RELATIVE_RE.captures(blob)?;
    let relation = match caps.get(1)?.as_str() {
        "पति" | "Husband" => RelationType::Husband,
        "माता" | "Mother" => RelationType::Mother,
        _ => RelationType::Father,
    };
    let relative_name = clean_script_text(caps.get(2)?.as_str());
    Some((relation, relative_name))
}

fn explicit_gender(blob: &str) -> Option<Gender> {
    if FEMALE_KEYWORDS.iter().any(|kw| blob.contains(kw)) {
        Some(Gender::F)
    } else if MALE_KEYWORDS.iter().any(|kw| blob.contains(kw)) {
        Some(Gender::M)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(text: &str) -> VoterRecord {
        parse_cell_text(text)
            .into_record()
            .expect("cell should not be a deletion")
    }

    #[test]
    fn parses_hindi_cell() {
        let text = "ABC1234567\nनिर्वाचक का नाम: रामकुमार\nपिता का नाम: श्याम\nमकान संख्या: 45\nउम्र: 34 लिंग: पुरुष";
        let voter = record(text);

        assert_eq!(voter.epic, "ABC1234567");
        assert_eq!(voter.name, "रामकुमार");
        assert_eq!(voter.relative_name, "श्याम");
        assert_eq!(voter.relation_type, RelationType::Father);
        assert_eq!(voter.house_number, "45");
        assert_eq!(voter.age, "34");
        assert_eq!(voter.gender, Gender::M);
        assert!(voter.gender_resolved);
        assert_eq!(voter.original_text, text);
    }

    #[test]
    fn parses_english_labels() {
        let text = "XYZ7654321\nName: RamKumar\nFather's Name: Shyam\nHouse Number: 45\nAge: 34 Gender: Male";
        let voter = record(text);

        assert_eq!(voter.epic, "XYZ7654321");
        assert_eq!(voter.name, "RamKumar");
        assert_eq!(voter.relative_name, "Shyam");
        assert_eq!(voter.relation_type, RelationType::Father);
        assert_eq!(voter.house_number, "45");
        assert_eq!(voter.age, "34");
        assert_eq!(voter.gender, Gender::M);
    }

    #[test]
    fn husband_label_implies_female() {
        let text = "निर्वाचक का नाम: सीता देवी\nपति का नाम: राम\nमकान संख्या: 7\nउम्र: 29";
        let voter = record(text);

        assert_eq!(voter.relation_type, RelationType::Husband);
        assert_eq!(voter.gender, Gender::F);
        assert!(voter.gender_resolved);
        assert_eq!(voter.relative_name, "राम");
    }

    #[test]
    fn mother_label_sets_relation() {
        let voter = record("नाम: मोहन\nमाता का नाम: गीता\nउम्र: 21");
        assert_eq!(voter.relation_type, RelationType::Mother);
        assert_eq!(voter.relative_name, "गीता");
    }

    #[test]
    fn explicit_gender_overrides_relation_default() {
        let voter = record("नाम: कमला\nपिता का नाम: हरि\nउम्र: 40 लिंग: महिला");
        assert_eq!(voter.relation_type, RelationType::Father);
        assert_eq!(voter.gender, Gender::F);
    }

    #[test]
    fn unlabelled_gender_stays_unresolved() {
        let voter = record("नाम: मोहन\nपिता का नाम: सोहन\nउम्र: 30");
        assert_eq!(voter.gender, Gender::M);
        assert!(!voter.gender_resolved);
    }

    #[test]
    fn missing_age_defaults_to_empty() {
        let voter = record("नाम: मोहन\nपिता का नाम: सोहन\nमकान संख्या: 3");
        assert_eq!(voter.age, "");
    }

    #[test]
    fn deletion_marker_alone_voids_cell() {
        assert_eq!(parse_cell_text("विलोपित"), CellParse::Deleted);
        assert_eq!(parse_cell_text("ABC1234567\nDeleted"), CellParse::Deleted);
    }

    #[test]
    fn marker_after_name_label_is_not_a_deletion() {
        let parsed = parse_cell_text("पिता का नाम: विलोपित रामलाल\nउम्र: 50");
        assert!(!parsed.is_deleted());

        let parsed = parse_cell_text("XYZ7654321\nName: Deleted Ramesh\nFather's Name: Suresh\nAge: 44");
        assert!(!parsed.is_deleted());
        assert!(is_deleted("XYZ7654321\nRamesh\nDeleted"));
    }

    #[test]
    fn name_falls_back_to_label_split() {
        let voter = record("नाम : गोविंद  पिता श्याम");
        assert_eq!(voter.name, "गोविंद");
    }

    #[test]
    fn epic_only_read_from_first_two_lines() {
        let voter = record("नाम: मोहन\nपिता का नाम: सोहन मकान 3\nABC1234567");
        assert_eq!(voter.epic, UNKNOWN);
    }

    #[test]
    fn epic_with_spaces_and_noise() {
        assert_eq!(extract_epic("AB C 12345 67\nनाम"), "ABC1234567");
        assert_eq!(extract_epic("UP/12/345/678901"), "UP/12/345/678901");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["abc1234567", "XEO-2809614", "UP/12/345/678", "ABCDEFGH12", "AB]C123{"] {
            let once = normalize_epic(raw);
            assert_eq!(normalize_epic(&once), once, "input {raw}");
        }
    }

    #[test]
    fn short_residue_is_unknown() {
        assert_eq!(normalize_epic("A-1"), UNKNOWN);
        assert_eq!(normalize_epic("ABCDEFGHIJKLMNOP"), "ABCDEFGHIJKL");
    }
}
