//! Typed view of the collaborator's JSON answer. Everything the model sends
//! back passes through [`parse_response`] before it reaches the aggregator.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StructuringError;

pub const NOT_FOUND: &str = "Not found";
pub const NOT_SPECIFIED: &str = "Not specified";

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*(.*?)\s*```$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProgramCategory {
    MaternalHealth,
    MentalHealth,
    SubstanceAbuse,
    Immunization,
    ChronicDisease,
    EmergencyServices,
    PrimaryCare,
    Dental,
    Vision,
    #[default]
    Other,
}

impl ProgramCategory {
    pub const ALL: [ProgramCategory; 10] = [
        ProgramCategory::MaternalHealth,
        ProgramCategory::MentalHealth,
        ProgramCategory::SubstanceAbuse,
        ProgramCategory::Immunization,
        ProgramCategory::ChronicDisease,
        ProgramCategory::EmergencyServices,
        ProgramCategory::PrimaryCare,
        ProgramCategory::Dental,
        ProgramCategory::Vision,
        ProgramCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProgramCategory::MaternalHealth => "Maternal Health",
            ProgramCategory::MentalHealth => "Mental Health",
            ProgramCategory::SubstanceAbuse => "Substance Abuse",
            ProgramCategory::Immunization => "Immunization",
            ProgramCategory::ChronicDisease => "Chronic Disease",
            ProgramCategory::EmergencyServices => "Emergency Services",
            ProgramCategory::PrimaryCare => "Primary Care",
            ProgramCategory::Dental => "Dental",
            ProgramCategory::Vision => "Vision",
            ProgramCategory::Other => "Other",
        }
    }
}

impl FromStr for ProgramCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown program category {:?}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FinancialAssistance {
    Yes,
    No,
    #[default]
    Unknown,
}

impl FinancialAssistance {
    pub fn as_str(self) -> &'static str {
        match self {
            FinancialAssistance::Yes => "Yes",
            FinancialAssistance::No => "No",
            FinancialAssistance::Unknown => "Unknown",
        }
    }
}

impl FromStr for FinancialAssistance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(FinancialAssistance::Yes),
            "no" => Ok(FinancialAssistance::No),
            "unknown" => Ok(FinancialAssistance::Unknown),
            other => Err(format!("unknown financial assistance value {:?}", other)),
        }
    }
}

macro_rules! str_enum_serde {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        /// Missing or `null` gives the default; anything else must name a
        /// variant.
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match Option::<String>::deserialize(deserializer)? {
                    None => Ok(Self::default()),
                    Some(s) => s.parse().map_err(serde::de::Error::custom),
                }
            }
        }
    };
}

str_enum_serde!(ProgramCategory);
str_enum_serde!(FinancialAssistance);

/// One program as returned by the collaborator. Absent text fields carry the
/// "Not found" / "Not specified" sentinels, never invented values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredProgram {
    #[serde(deserialize_with = "required_text")]
    pub program_name: String,
    #[serde(default)]
    pub program_category: ProgramCategory,
    #[serde(default = "not_found", deserialize_with = "text_or_not_found")]
    pub program_description: String,
    #[serde(default = "not_found", deserialize_with = "text_or_not_found")]
    pub target_population: String,
    #[serde(default = "not_specified", deserialize_with = "text_or_not_specified")]
    pub eligibility_requirements: String,
    #[serde(default = "not_specified", deserialize_with = "text_or_not_specified")]
    pub application_process: String,
    #[serde(default = "not_specified", deserialize_with = "text_or_not_specified")]
    pub required_documentation: String,
    #[serde(default)]
    pub financial_assistance_available: FinancialAssistance,
    #[serde(default = "not_found", deserialize_with = "text_or_not_found")]
    pub program_website_url: String,
}

/// The whole answer for one page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default = "not_found", deserialize_with = "text_or_not_found")]
    pub health_department_name: String,
    #[serde(default = "not_found", deserialize_with = "text_or_not_found")]
    pub health_department_contact_email: String,
    #[serde(default = "not_found", deserialize_with = "text_or_not_found")]
    pub health_department_contact_phone: String,
    #[serde(default, deserialize_with = "programs_or_empty")]
    pub programs: Vec<StructuredProgram>,
    #[serde(default, deserialize_with = "notes_text")]
    pub notes: Option<String>,
}

/// Strip optional code fences, then parse and validate.
pub fn parse_response(raw: &str) -> Result<ExtractionResponse, StructuringError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(StructuringError::EmptyResponse);
    }
    let value: serde_json::Value = serde_json::from_str(body).map_err(StructuringError::InvalidJson)?;
    if !value.is_object() {
        return Err(StructuringError::Schema("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| StructuringError::Schema(e.to_string()))
}

pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    match FENCE_RE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

fn not_found() -> String {
    NOT_FOUND.to_string()
}

fn not_specified() -> String {
    NOT_SPECIFIED.to_string()
}

fn text_or<'de, D: Deserializer<'de>>(deserializer: D, sentinel: &str) -> Result<String, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => sentinel.to_string(),
    })
}

fn text_or_not_found<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    text_or(deserializer, NOT_FOUND)
}

fn text_or_not_specified<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    text_or(deserializer, NOT_SPECIFIED)
}

fn required_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(serde::de::Error::custom("program_name must be a non-empty string")),
    }
}

fn programs_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<StructuredProgram>, D::Error> {
    Ok(Option::<Vec<StructuredProgram>>::deserialize(deserializer)?.unwrap_or_default())
}

fn notes_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    };
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "county_name": "Alameda",
        "state": "California",
        "health_department_name": "Alameda County Public Health Department",
        "health_department_contact_email": "wic@county.gov",
        "health_department_contact_phone": "(555) 123-4567",
        "programs": [{
            "program_name": "WIC",
            "program_category": "Maternal Health",
            "program_description": "Nutrition support for families.",
            "target_population": "Pregnant people and children under 5",
            "eligibility_requirements": "Income at or below 185% FPL",
            "application_process": "Call to make an appointment",
            "required_documentation": "Proof of income",
            "financial_assistance_available": "Yes",
            "program_website_url": "https://www.county.gov/wic"
        }],
        "notes": "Clear page."
    }"#;

    #[test]
    fn full_response() {
        let r = parse_response(FULL).unwrap();
        assert_eq!(r.health_department_name, "Alameda County Public Health Department");
        assert_eq!(r.programs.len(), 1);
        let p = &r.programs[0];
        assert_eq!(p.program_category, ProgramCategory::MaternalHealth);
        assert_eq!(p.financial_assistance_available, FinancialAssistance::Yes);
        assert_eq!(r.notes.as_deref(), Some("Clear page."));
    }

    #[test]
    fn fenced_response() {
        let fenced = format!("```json\n{}\n```", FULL);
        assert_eq!(parse_response(&fenced).unwrap(), parse_response(FULL).unwrap());
        let bare = format!("```\n{}\n```", FULL);
        assert!(parse_response(&bare).is_ok());
    }

    #[test]
    fn missing_fields_get_sentinels() {
        let r = parse_response(r#"{"programs": [{"program_name": "Home Visiting", "target_population": null}]}"#).unwrap();
        assert_eq!(r.health_department_name, NOT_FOUND);
        assert_eq!(r.health_department_contact_phone, NOT_FOUND);
        assert_eq!(r.notes, None);
        let p = &r.programs[0];
        assert_eq!(p.program_category, ProgramCategory::Other);
        assert_eq!(p.program_description, NOT_FOUND);
        assert_eq!(p.target_population, NOT_FOUND);
        assert_eq!(p.eligibility_requirements, NOT_SPECIFIED);
        assert_eq!(p.application_process, NOT_SPECIFIED);
        assert_eq!(p.required_documentation, NOT_SPECIFIED);
        assert_eq!(p.financial_assistance_available, FinancialAssistance::Unknown);
        assert_eq!(p.program_website_url, NOT_FOUND);
    }

    #[test]
    fn enums_are_case_insensitive() {
        let r = parse_response(
            r#"{"programs": [{"program_name": "X", "program_category": " primary care ", "financial_assistance_available": "NO"}]}"#,
        )
        .unwrap();
        assert_eq!(r.programs[0].program_category, ProgramCategory::PrimaryCare);
        assert_eq!(r.programs[0].financial_assistance_available, FinancialAssistance::No);
    }

    #[test]
    fn empty_and_garbage_responses() {
        assert!(matches!(parse_response(""), Err(StructuringError::EmptyResponse)));
        assert!(matches!(parse_response("  \n "), Err(StructuringError::EmptyResponse)));
        assert!(matches!(parse_response("```json\n```"), Err(StructuringError::EmptyResponse)));
        assert!(matches!(
            parse_response("Sure! Here is the data you asked for."),
            Err(StructuringError::InvalidJson(_))
        ));
        assert!(matches!(parse_response("[1, 2]"), Err(StructuringError::Schema(_))));
    }

    #[test]
    fn schema_violations() {
        let cases = [
            r#"{"programs": {"program_name": "X"}}"#,
            r#"{"programs": [{"program_category": "Dental"}]}"#,
            r#"{"programs": [{"program_name": "  "}]}"#,
            r#"{"programs": [{"program_name": "X", "program_category": "Maternal Health | Other"}]}"#,
            r#"{"programs": [{"program_name": "X", "financial_assistance_available": "Maybe"}]}"#,
            r#"{"health_department_name": 42}"#,
        ];
        for case in cases {
            assert!(
                matches!(parse_response(case), Err(StructuringError::Schema(_))),
                "{case}"
            );
        }
    }

    #[test]
    fn null_programs_and_odd_notes() {
        let r = parse_response(r#"{"programs": null, "notes": 3}"#).unwrap();
        assert!(r.programs.is_empty());
        assert_eq!(r.notes.as_deref(), Some("3"));
        let r = parse_response(r#"{"notes": "   "}"#).unwrap();
        assert_eq!(r.notes, None);
    }

    #[test]
    fn category_round_trips_through_display() {
        for c in ProgramCategory::ALL {
            assert_eq!(c.to_string().parse::<ProgramCategory>().unwrap(), c);
        }
    }
}
