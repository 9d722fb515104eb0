use crate::models::{MrzData, MrzNameFields};
use crate::utils::PipelineError;

/// Length of one line in an ICAO Doc 9303 TD3 (passport) MRZ.
pub const TD3_LINE_LEN: usize = 44;

/// Decoder for the two-line ICAO Type-P machine-readable zone.
///
/// Decoding is purely positional: fixed character offsets, filler
/// characters ('<') stripped or mapped to spaces. Check digits are not
/// used to gate parsing; `verify_check_digits` reports on them
/// separately. Century inference for YYMMDD dates is deliberately left
/// to the downstream extraction step.
pub struct MrzParser;

impl MrzParser {
    /// Parses a full two-line TD3 MRZ into a structured record.
    ///
    /// Fails when fewer than two non-empty lines are present or the
    /// first line does not start with the 'P' document-type marker.
    pub fn parse(raw: &str) -> Result<MrzData, PipelineError> {
        let lines: Vec<String> = raw
            .split('\n')
            .map(|l| l.trim().to_uppercase())
            .filter(|l| !l.is_empty())
            .collect();

        if lines.len() < 2 {
            return Err(PipelineError::MrzParsingError(format!(
                "expected 2 MRZ lines, got {}",
                lines.len()
            )));
        }

        let line1 = &lines[0];
        let line2 = &lines[1];

        if !line1.starts_with('P') {
            return Err(PipelineError::MrzParsingError(
                "line 1 does not start with document type 'P'".to_string(),
            ));
        }

        let name = Self::parse_name_part(slice(line1, 5, line1.len()));

        Ok(MrzData {
            document_type: "PASSPORT".to_string(),
            passport_number: slice(line2, 0, 9).replace('<', ""),
            nationality: slice(line2, 10, 13).to_string(),
            date_of_birth: slice(line2, 13, 19).to_string(),
            sex: slice(line2, 20, 21).to_string(),
            expiry_date: slice(line2, 21, 27).to_string(),
            surname: name.surname,
            given_names: name.given_names,
            mrz: format!("{}\n{}", line1, line2),
            source: "MRZ_Fallback".to_string(),
            confidence: 0.98,
        })
    }

    /// Parses only line 1 of an MRZ string (as found in the MRZ_CODE
    /// identity field): issuing country at positions 2..5 and the
    /// surname/given-names field from position 5 on.
    ///
    /// Returns None when the string is empty or does not start with 'P'.
    pub fn parse_name_line(mrz_code: &str) -> Option<MrzNameFields> {
        let line1 = mrz_code
            .split('\n')
            .map(|l| l.trim().to_uppercase())
            .find(|l| !l.is_empty())?;

        if !line1.starts_with('P') {
            return None;
        }

        // Short country codes like D<< keep their filler on the card.
        let country_code = slice(&line1, 2, 5).replace('<', "");
        let mut fields = Self::parse_name_part(slice(&line1, 5, line1.len()));
        fields.country_code = country_code;
        Some(fields)
    }

    /// Splits the MRZ name field on the first "<<": surname before,
    /// given names after. Without a "<<" the whole field is surname.
    fn parse_name_part(name_part: &str) -> MrzNameFields {
        let (surname, given_names) = match name_part.split_once("<<") {
            Some((s, g)) => (s, g),
            None => (name_part, ""),
        };
        MrzNameFields {
            country_code: String::new(),
            surname: surname.replace('<', " ").trim().to_string(),
            given_names: given_names.replace('<', " ").trim().to_string(),
        }
    }

    /// The only sanity gate before accepting fallback MRZ output: both
    /// lines must be exactly 44 characters.
    pub fn basic_valid(line1: &str, line2: &str) -> bool {
        line1.chars().count() == TD3_LINE_LEN && line2.chars().count() == TD3_LINE_LEN
    }

    /// Scans OCR line texts for MRZ candidates: 40+ characters after
    /// space removal, containing the "<<" separator. The MRZ sits at
    /// the bottom of the data page, so the last two candidates win.
    pub fn find_mrz_lines(line_texts: &[String]) -> Option<(String, String)> {
        let candidates: Vec<String> = line_texts
            .iter()
            .map(|t| t.replace(' ', ""))
            .filter(|t| t.chars().count() >= 40 && t.contains("<<"))
            .collect();

        if candidates.len() >= 2 {
            let last = candidates.len() - 1;
            Some((candidates[last - 1].clone(), candidates[last].clone()))
        } else {
            None
        }
    }

    /// ICAO 7-3-1 weighted modulo-10 check digit over one MRZ field.
    /// 'A'..'Z' map to 10..35, digits to their value, '<' to 0.
    pub fn check_digit(field: &str) -> u32 {
        const WEIGHTS: [u32; 3] = [7, 3, 1];
        field
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let v = match c {
                    '0'..='9' => c as u32 - '0' as u32,
                    'A'..='Z' => c as u32 - 'A' as u32 + 10,
                    _ => 0,
                };
                v * WEIGHTS[i % 3]
            })
            .sum::<u32>()
            % 10
    }

    /// Optional verification layer over line 2's printed check digits
    /// (document number, birth date, expiry date). Reports mismatches;
    /// never used to reject a parse, since digit-level OCR errors are
    /// common and the downstream step can still recover.
    pub fn verify_check_digits(line2: &str) -> Vec<String> {
        let mut mismatches = Vec::new();
        if line2.chars().count() != TD3_LINE_LEN {
            mismatches.push("line 2 is not 44 characters".to_string());
            return mismatches;
        }

        let checks = [
            (slice(line2, 0, 9), slice(line2, 9, 10), "passport number"),
            (slice(line2, 13, 19), slice(line2, 19, 20), "date of birth"),
            (slice(line2, 21, 27), slice(line2, 27, 28), "expiry date"),
        ];

        for (field, printed, label) in checks {
            if let Some(digit) = printed.chars().next().and_then(|c| c.to_digit(10)) {
                if Self::check_digit(field) != digit {
                    mismatches.push(format!("{} check digit mismatch", label));
                }
            } else {
                mismatches.push(format!("{} check digit unreadable", label));
            }
        }
        mismatches
    }
}

/// Character-offset substring that tolerates short lines. OCR noise can
/// smuggle non-ASCII characters into an otherwise plausible MRZ line,
/// so offsets are resolved to char boundaries rather than bytes.
fn slice(s: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    let mut indices = s.char_indices();
    let byte_start = match indices.nth(start) {
        Some((i, _)) => i,
        None => return "",
    };
    let byte_end = indices
        .nth(end - start - 1)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[byte_start..byte_end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    const LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    #[test]
    fn test_parse_valid_td3() {
        let raw = format!("{}\n{}", LINE1, LINE2);
        let data = MrzParser::parse(&raw).unwrap();
        assert_eq!(data.document_type, "PASSPORT");
        assert_eq!(data.passport_number, "L898902C3");
        assert_eq!(data.nationality, "UTO");
        assert_eq!(data.date_of_birth, "740812");
        assert_eq!(data.sex, "F");
        assert_eq!(data.expiry_date, "120415");
        assert_eq!(data.surname, "ERIKSSON");
        assert_eq!(data.given_names, "ANNA MARIA");
    }

    #[test]
    fn test_parse_rejects_single_line() {
        assert!(MrzParser::parse(LINE1).is_err());
    }

    #[test]
    fn test_parse_rejects_non_passport_marker() {
        let raw = format!("I<UTOD231458907<<<<<<<<<<<<<<<\n{}", LINE2);
        assert!(MrzParser::parse(&raw).is_err());
    }

    #[test]
    fn test_parse_name_line() {
        let fields = MrzParser::parse_name_line(LINE1).unwrap();
        assert_eq!(fields.country_code, "UTO");
        assert_eq!(fields.surname, "ERIKSSON");
        assert_eq!(fields.given_names, "ANNA MARIA");
        assert_eq!(fields.full_name(), "ANNA MARIA ERIKSSON");
    }

    #[test]
    fn test_parse_name_line_without_separator() {
        let fields = MrzParser::parse_name_line("P<UTOERIKSSON<ANNA").unwrap();
        assert_eq!(fields.surname, "ERIKSSON ANNA");
        assert_eq!(fields.given_names, "");
    }

    #[test]
    fn test_parse_tolerates_non_ascii_noise() {
        // A misread accented character keeps the line at 44 chars but
        // shifts byte offsets; fixed-position fields must still come
        // out without panicking.
        let noisy = "L898902CÉ6UTO7408122F1204159ZE184226B<<<<<10";
        assert_eq!(noisy.chars().count(), TD3_LINE_LEN);
        assert!(MrzParser::basic_valid(LINE1, noisy));

        let raw = format!("{}\n{}", LINE1, noisy);
        let data = MrzParser::parse(&raw).unwrap();
        assert_eq!(data.passport_number, "L898902CÉ");
        assert_eq!(data.nationality, "UTO");
        assert_eq!(data.expiry_date, "120415");

        let mismatches = MrzParser::verify_check_digits(noisy);
        assert!(mismatches.iter().any(|m| m.contains("passport number")));
    }

    #[test]
    fn test_basic_valid_requires_44_chars() {
        assert!(MrzParser::basic_valid(LINE1, LINE2));
        assert!(!MrzParser::basic_valid(&LINE1[..43], LINE2));
        assert!(!MrzParser::basic_valid(LINE1, ""));
    }

    #[test]
    fn test_find_mrz_lines_takes_last_two_candidates() {
        let lines = vec![
            "REPUBLIC OF UTOPIA".to_string(),
            "PASSPORT NO L898902C3".to_string(),
            // Spaced out the way OCR often returns the zone.
            format!("{} ", LINE1),
            LINE2.to_string(),
        ];
        let (l1, l2) = MrzParser::find_mrz_lines(&lines).unwrap();
        assert_eq!(l1, LINE1);
        assert_eq!(l2, LINE2);
    }

    #[test]
    fn test_find_mrz_lines_needs_two_candidates() {
        let lines = vec![LINE1.to_string(), "short".to_string()];
        assert!(MrzParser::find_mrz_lines(&lines).is_none());
    }

    #[test]
    fn test_check_digit_known_values() {
        // Reference values from ICAO Doc 9303 worked examples.
        assert_eq!(MrzParser::check_digit("L898902C3"), 6);
        assert_eq!(MrzParser::check_digit("740812"), 2);
        assert_eq!(MrzParser::check_digit("120415"), 9);
    }

    #[test]
    fn test_verify_check_digits_clean_line() {
        assert!(MrzParser::verify_check_digits(LINE2).is_empty());
    }

    #[test]
    fn test_verify_check_digits_reports_mismatch() {
        let mut corrupted = LINE2.to_string();
        corrupted.replace_range(9..10, "7");
        let mismatches = MrzParser::verify_check_digits(&corrupted);
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].contains("passport number"));
    }
}
