use std::sync::OnceLock;

use regex::Regex;

use idlens_core::IdRecord;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Card numbers are printed as three groups of four digits. ASCII classes
// throughout: recognized digits must stay ASCII for the stored value.
re!(re_id_number, r"\b[0-9]{4}[\s-]?[0-9]{4}[\s-]?[0-9]{4}\b");
re!(re_id_grouped, r"[0-9]{4}[\s-]?[0-9]{4}[\s-]?[0-9]{4}");

re!(re_name_label, r"(?i)(?:Name|Name:|नाम|नाम:)\s*([A-Za-z\s]+)");
re!(re_name_before_number, r"(?m)^([A-Z][a-zA-Z\s]+)\s*[0-9]{4}");

re!(re_dob_label_y4,
    r"(?i)(?:DOB|Date of Birth|जन्म तिथि)[\s:]*([0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{4})");
re!(re_dob_label_y2,
    r"(?i)(?:DOB|Date of Birth|जन्म तिथि)[\s:]*([0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{2})");
re!(re_date_bare_y4, r"\b([0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{4})\b");

re!(re_gender, r"(?i)(?:Gender|Sex|लिंग)[\s:]*?(Male|Female|पुरुष|महिला|M|F)");

re!(re_guardian,
    r"(?i)(?:Father|Father's Name|पिता का नाम|S/O|Son of|D/O|Daughter of)[\s:]*([A-Za-z\s]+)");

re!(re_pin_code, r"(?i)PIN[\s:]*[0-9]{6}");

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Extract structured card fields from the two raw OCR texts.
    ///
    /// Pure function of its inputs: no I/O, never fails. A field no pattern
    /// matched is simply left unset. Each field runs its own priority-ordered
    /// pattern list; the first acceptable match wins and fields never depend
    /// on one another.
    pub fn extract(front_text: &str, back_text: &str) -> IdRecord {
        let combined = format!("{front_text} {back_text}");

        IdRecord {
            name: Self::extract_name(front_text),
            id_number: Self::extract_id_number(&combined),
            date_of_birth: Self::extract_date_of_birth(&combined),
            gender: Self::extract_gender(&combined),
            guardian_name: Self::extract_guardian_name(&combined),
            address: Self::extract_address(back_text),
            front_text: front_text.to_string(),
            back_text: back_text.to_string(),
        }
    }

    // ── ID number ─────────────────────────────────────────────────────────────

    /// First 12-digit grouping anywhere in the combined text, stored with the
    /// separators stripped.
    fn extract_id_number(text: &str) -> Option<String> {
        let m = re_id_number().find(text)?;
        Some(m.as_str().chars().filter(char::is_ascii_digit).collect())
    }

    // ── Name ─────────────────────────────────────────────────────────────────

    /// Front text only. A label match is preferred; the fallback is the
    /// capitalized line that immediately precedes the card number. A match is
    /// accepted only when its trimmed length is strictly between 2 and 50.
    fn extract_name(front_text: &str) -> Option<String> {
        for re in [re_name_label(), re_name_before_number()] {
            if let Some(m) = re.captures(front_text).and_then(|c| c.get(1)) {
                let name = m.as_str().trim();
                if name.len() > 2 && name.len() < 50 {
                    return Some(name.to_string());
                }
            }
        }
        None
    }

    // ── Date of birth ────────────────────────────────────────────────────────

    /// Labeled 4-digit-year date first, then labeled 2-digit-year, then any
    /// bare 4-digit-year date. Stored verbatim; calendar validity is not
    /// checked.
    fn extract_date_of_birth(text: &str) -> Option<String> {
        for re in [re_dob_label_y4(), re_dob_label_y2(), re_date_bare_y4()] {
            if let Some(m) = re.captures(text).and_then(|c| c.get(1)) {
                return Some(m.as_str().to_string());
            }
        }
        None
    }

    // ── Gender ───────────────────────────────────────────────────────────────

    fn extract_gender(text: &str) -> Option<String> {
        let token = re_gender().captures(text)?.get(1)?.as_str().to_lowercase();
        // Single letters and Devanagari tokens map to the canonical English
        // words; a full English word keeps its lower-cased form.
        let gender = match token.as_str() {
            "m" | "पुरुष" => "Male".to_string(),
            "f" | "महिला" => "Female".to_string(),
            _ => token,
        };
        Some(gender)
    }

    // ── Guardian name ────────────────────────────────────────────────────────

    /// Relationship labels (father / son-of / daughter-of variants) followed
    /// by a letter run, within the same length bounds as the name.
    fn extract_guardian_name(text: &str) -> Option<String> {
        let m = re_guardian().captures(text)?.get(1)?;
        let name = m.as_str().trim();
        if name.len() > 2 && name.len() < 50 {
            return Some(name.to_string());
        }
        None
    }

    // ── Address ──────────────────────────────────────────────────────────────

    /// Back text only, line-oriented: keep lines that read like address
    /// content (trimmed length over 10, not the card number, not a PIN
    /// line), then join the first three.
    fn extract_address(back_text: &str) -> Option<String> {
        let lines: Vec<&str> = back_text
            .lines()
            .filter(|line| line.trim().len() > 10)
            .filter(|line| !re_id_grouped().is_match(line))
            .filter(|line| !re_pin_code().is_match(line))
            .take(3)
            .collect();

        if lines.is_empty() {
            return None;
        }
        Some(lines.join(", ").trim().to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
