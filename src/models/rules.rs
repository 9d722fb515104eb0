use crate::utils::PipelineError;
use std::collections::HashMap;

/// Minimum grade for foundation admission, either a numeric cutoff on
/// the system's scale or a literal grade string for lettered systems.
#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    Numeric(f64),
    Grade(&'static str),
}

#[derive(Debug, Clone)]
pub struct GradingRule {
    pub scale: &'static str,
    pub foundation_min: Threshold,
    pub official_pass: Option<Threshold>,
    pub french_equivalent: &'static str,
}

/// Per-country, per-grading-system foundation admission thresholds.
pub struct FoundationRules {
    rules: HashMap<(&'static str, &'static str), GradingRule>,
}

impl FoundationRules {
    pub fn new() -> Self {
        let mut rules = HashMap::new();

        let mut add = |country: &'static str,
                       grading: &'static str,
                       scale: &'static str,
                       foundation_min: Threshold,
                       official_pass: Option<Threshold>| {
            rules.insert(
                (country, grading),
                GradingRule {
                    scale,
                    foundation_min,
                    official_pass,
                    french_equivalent: "8/20",
                },
            );
        };

        // South Asia
        add("India", "percentage", "0-100", Threshold::Numeric(35.0), Some(Threshold::Numeric(33.0)));
        add("India", "cgpa_10", "0-10", Threshold::Numeric(4.0), Some(Threshold::Numeric(4.0)));
        add("Nepal", "percentage", "0-100", Threshold::Numeric(35.0), Some(Threshold::Numeric(32.0)));
        add("Pakistan", "percentage", "0-100", Threshold::Numeric(35.0), Some(Threshold::Numeric(33.0)));
        add("Bangladesh", "gpa_5", "0-5", Threshold::Numeric(2.0), Some(Threshold::Numeric(1.0)));
        add("Sri Lanka", "percentage", "0-100", Threshold::Numeric(40.0), Some(Threshold::Numeric(35.0)));

        // GCC & MENA
        add("United Arab Emirates", "percentage", "0-100", Threshold::Numeric(50.0), Some(Threshold::Numeric(50.0)));
        add("Saudi Arabia", "percentage", "0-100", Threshold::Numeric(50.0), Some(Threshold::Numeric(50.0)));
        add("Qatar", "percentage", "0-100", Threshold::Numeric(45.0), Some(Threshold::Numeric(40.0)));
        add("Kuwait", "percentage", "0-100", Threshold::Numeric(50.0), Some(Threshold::Numeric(50.0)));
        add("Bahrain", "percentage", "0-100", Threshold::Numeric(50.0), Some(Threshold::Numeric(50.0)));
        add("Oman", "percentage", "0-100", Threshold::Numeric(50.0), Some(Threshold::Numeric(50.0)));
        add("Egypt", "percentage", "0-100", Threshold::Numeric(50.0), Some(Threshold::Numeric(50.0)));

        // Sub-Saharan Africa (lettered systems)
        add("Kenya", "kcse", "A-E", Threshold::Grade("D (35%)"), Some(Threshold::Grade("D- (30%)")));
        add("Nigeria", "waec", "A1-F9", Threshold::Grade("D7 (45%)"), Some(Threshold::Grade("E8 (40%)")));
        add("Ghana", "wassce", "A1-F9", Threshold::Grade("D7 (45%)"), Some(Threshold::Grade("E8 (40%)")));
        add("South Africa", "nsc", "Level 1-7", Threshold::Grade("Level 3 (40%)"), Some(Threshold::Grade("Level 2 (30%)")));

        // Francophone Africa
        for country in ["Morocco", "Algeria", "Tunisia", "Senegal", "Côte d'Ivoire", "Cameroon"] {
            add(country, "french_20", "0-20", Threshold::Numeric(8.0), Some(Threshold::Numeric(10.0)));
        }

        // Asia-Pacific
        add("China", "percentage", "0-100", Threshold::Numeric(60.0), Some(Threshold::Numeric(60.0)));
        add("Vietnam", "gpa_10", "0-10", Threshold::Numeric(4.0), Some(Threshold::Numeric(5.0)));
        add("Philippines", "gpa_5", "1.0-5.0", Threshold::Numeric(3.0), Some(Threshold::Numeric(3.0)));
        add("Indonesia", "gpa_4", "0-4.0", Threshold::Numeric(2.0), Some(Threshold::Numeric(2.0)));
        add("Malaysia", "spm", "A+-G", Threshold::Grade("E (40%)"), Some(Threshold::Grade("E (40%)")));

        // Europe & LatAm
        add("Russia", "grade_5", "1-5", Threshold::Numeric(3.0), Some(Threshold::Numeric(3.0)));
        add("Brazil", "gpa_10", "0-10", Threshold::Numeric(4.0), Some(Threshold::Numeric(5.0)));
        add("Mexico", "gpa_10", "0-10", Threshold::Numeric(5.0), Some(Threshold::Numeric(6.0)));
        add("Turkey", "percentage", "0-100", Threshold::Numeric(45.0), Some(Threshold::Numeric(45.0)));

        // International curricula
        add("International Baccalaureate", "ib_diploma", "0-45", Threshold::Numeric(24.0), None);
        add("Cambridge A Levels", "a_levels", "A*-E", Threshold::Grade("EEE"), None);
        add("Cambridge IGCSE", "igcse", "A*-G", Threshold::Grade("C (5 subjects)"), None);
        add("American Curriculum", "high_school_gpa", "0-4.0", Threshold::Numeric(2.0), None);

        FoundationRules { rules }
    }

    pub fn get_rule(&self, country: &str, grading_type: &str) -> Result<&GradingRule, PipelineError> {
        self.rules
            .iter()
            .find(|((c, g), _)| *c == country && *g == grading_type)
            .map(|(_, rule)| rule)
            .ok_or_else(|| {
                PipelineError::RuleNotFound(format!(
                    "no foundation rule for {} / {}",
                    country, grading_type
                ))
            })
    }

    /// Whether any grading system is configured for the country at all.
    pub fn has_country(&self, country: &str) -> bool {
        self.rules.keys().any(|(c, _)| *c == country)
    }
}

impl Default for FoundationRules {
    fn default() -> Self {
        Self::new()
    }
}
