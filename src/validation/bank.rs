use crate::models::{BankExtraction, BankVerdict, VerdictStatus};
use chrono::NaiveDate;
use std::collections::BTreeMap;

const REQUIRED_CURRENCY: &str = "EUR";

const DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y", "%d%m%Y", "%d-%b-%Y", "%d%b%Y", "%d-%B-%Y", "%Y-%m-%d",
];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim().replace('/', "-").replace(' ', "");
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

/// Collapses the day-wise balance map into month-keyed (YYYY-MM)
/// averages rounded to 2 decimals. Unparseable date keys are skipped.
pub fn monthly_average_balances(daywise: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let mut per_month: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (date_key, amount) in daywise {
        if let Some(date) = parse_date(date_key) {
            per_month
                .entry(date.format("%Y-%m").to_string())
                .or_default()
                .push(*amount);
        }
    }

    per_month
        .into_iter()
        .map(|(month, values)| {
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            (month, (avg * 100.0).round() / 100.0)
        })
        .collect()
}

/// Financial-capacity checks: EUR currency, a closing balance and a
/// detected statement period. Balance-continuity commentary and the
/// monthly averages pass through for the report.
pub fn validate_bank(bank: Option<&BankExtraction>) -> BankVerdict {
    let Some(bank) = bank else {
        return BankVerdict {
            status: VerdictStatus::NotApproved,
            reason: "Bank statement not uploaded".to_string(),
            balance_continuity: None,
            monthly_averages: BTreeMap::new(),
        };
    };

    let monthly_averages = bank
        .daywise_balances
        .as_ref()
        .map(monthly_average_balances)
        .unwrap_or_default();

    let mut reasons: Vec<String> = Vec::new();

    let currency_ok = bank
        .currency
        .as_deref()
        .map_or(false, |c| c.trim().eq_ignore_ascii_case(REQUIRED_CURRENCY));
    if !currency_ok {
        reasons.push("Bank balance is not in EUR".to_string());
    }
    if bank.closing_balance.is_none() {
        reasons.push("Closing balance not found in bank statement".to_string());
    }
    if bank
        .statement_period
        .as_deref()
        .map_or(true, |p| p.trim().is_empty())
    {
        reasons.push("3-month bank statement period not detected".to_string());
    }

    if reasons.is_empty() {
        BankVerdict {
            status: VerdictStatus::Approved,
            reason: "Bank statement validation passed".to_string(),
            balance_continuity: bank.balance_continuity.clone(),
            monthly_averages,
        }
    } else {
        BankVerdict {
            status: VerdictStatus::NotApproved,
            reason: reasons.join("; "),
            balance_continuity: bank.balance_continuity.clone(),
            monthly_averages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> BankExtraction {
        let mut daywise = BTreeMap::new();
        daywise.insert("05-01-2024".to_string(), 8000.0);
        daywise.insert("20-01-2024".to_string(), 9000.0);
        daywise.insert("10-02-2024".to_string(), 9502.505);
        BankExtraction {
            account_holder_name: Some("Aisha Rahman".to_string()),
            account_number: Some("IE29AIBK93115212345678".to_string()),
            currency: Some("EUR".to_string()),
            closing_balance: Some(9502.5),
            statement_period: Some("01-Jan-2024 to 10-Feb-2024".to_string()),
            balance_continuity: Some("Continuous and stable".to_string()),
            daywise_balances: Some(daywise),
        }
    }

    #[test]
    fn test_complete_eur_statement_approved() {
        let verdict = validate_bank(Some(&bank()));
        assert_eq!(verdict.status, VerdictStatus::Approved);
        assert_eq!(
            verdict.balance_continuity.as_deref(),
            Some("Continuous and stable")
        );
    }

    #[test]
    fn test_monthly_averages_grouped_and_rounded() {
        let verdict = validate_bank(Some(&bank()));
        assert_eq!(verdict.monthly_averages.get("2024-01"), Some(&8500.0));
        assert_eq!(verdict.monthly_averages.get("2024-02"), Some(&9502.51));
    }

    #[test]
    fn test_unparseable_date_keys_skipped() {
        let mut daywise = BTreeMap::new();
        daywise.insert("not a date".to_string(), 100.0);
        daywise.insert("15-Mar-2024".to_string(), 300.0);
        let averages = monthly_average_balances(&daywise);
        assert_eq!(averages.len(), 1);
        assert_eq!(averages.get("2024-03"), Some(&300.0));
    }

    #[test]
    fn test_non_eur_currency_rejected() {
        let mut b = bank();
        b.currency = Some("INR".to_string());
        let verdict = validate_bank(Some(&b));
        assert_eq!(verdict.status, VerdictStatus::NotApproved);
        assert!(verdict.reason.contains("not in EUR"));
    }

    #[test]
    fn test_reasons_accumulate() {
        let mut b = bank();
        b.currency = None;
        b.closing_balance = None;
        b.statement_period = None;
        let verdict = validate_bank(Some(&b));
        assert_eq!(verdict.reason.matches("; ").count(), 2);
    }

    #[test]
    fn test_missing_statement() {
        let verdict = validate_bank(None);
        assert_eq!(verdict.status, VerdictStatus::NotApproved);
        assert_eq!(verdict.reason, "Bank statement not uploaded");
    }
}
