use crate::extract::text::truncate_text;
use crate::extract::RawPageRecord;
use crate::settings::Settings;

pub const SYSTEM_PROMPT: &str = "You are a precise data extraction assistant. Return valid JSON only.";

const PROMPT_DOC_LINKS: usize = 8;

/// Extraction prompt for one raw page, bounded by `max_prompt_chars` of page
/// text.
pub fn build_prompt(county: &str, county_url: &str, page: &RawPageRecord, settings: &Settings) -> String {
    let state = &settings.state_name;
    let text = truncate_text(&page.text, settings.max_prompt_chars);
    let contacts = serde_json::to_string(&page.contacts).unwrap_or_default();
    let docs: Vec<&String> = page.pdf_links.iter().take(PROMPT_DOC_LINKS).collect();
    let docs = serde_json::to_string(&docs).unwrap_or_default();
    let page_url = &page.page_url;

    format!(
        r#"You are extracting structured healthcare program data from a {state} county website page.

COUNTY: {county} County
COUNTY WEBSITE: {county_url}
PAGE URL: {page_url}
LINK TEXT: {link_text}
NAVIGATION PATH: {nav_path}
CONTACTS FOUND: {contacts}
DOC LINKS: {docs}

PAGE CONTENT:
{text}

---
TASK: Return a JSON object with a single program entry using this schema:
{{
  "county_name": "{county}",
  "state": "{state}",
  "county_website_url": "{county_url}",
  "health_department_name": "Official name or 'Not found'",
  "health_department_contact_email": "Email or 'Not found'",
  "health_department_contact_phone": "Phone or 'Not found'",
  "programs": [
    {{
      "program_name": "Name of healthcare program",
      "program_category": "{categories}",
      "program_description": "Brief description (1-2 sentences)",
      "target_population": "Who the program serves",
      "eligibility_requirements": "Requirements or 'Not specified'",
      "application_process": "How to apply or 'Not specified'",
      "required_documentation": "Documents needed or 'Not specified'",
      "financial_assistance_available": "Yes | No | Unknown",
      "program_website_url": "{page_url}"
    }}
  ],
  "notes": "Any data quality observations"
}}

RULES:
1) Extract only from provided content/metadata; never invent facts.
2) If a field is missing, use 'Not found' or 'Not specified' as appropriate.
3) program_category must be exactly one of the listed categories.
4) Return ONLY the JSON object, no extra text.
"#,
        link_text = page.link_text,
        nav_path = page.nav_path,
        categories = category_choices(),
    )
}

fn category_choices() -> String {
    super::schema::ProgramCategory::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(" | ")
}
