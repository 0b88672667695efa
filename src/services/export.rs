//! CSV export of loan lists

use crate::models::loan::LoanDetails;

const HEADER: [&str; 11] = [
    "id",
    "patient",
    "equipment",
    "serial_number",
    "start_date",
    "expected_return_date",
    "actual_return_date",
    "status",
    "condition_before",
    "condition_after",
    "notes",
];

/// Quote a CSV field when it contains a separator, a quote or a line break
pub fn escape(field: &str) -> String {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let row: Vec<String> = fields.into_iter().map(|f| escape(f.as_ref())).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// Render loans as CSV, one row per loan; dates are `YYYY-MM-DD`
pub fn loans_to_csv(loans: &[LoanDetails]) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER);

    for details in loans {
        let loan = &details.loan;
        let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
            d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
        };
        push_row(
            &mut out,
            [
                loan.id.to_string(),
                format!("{} {}", details.patient.first_name, details.patient.last_name),
                details.equipment.name.clone(),
                details.equipment.serial_number.clone(),
                date(Some(loan.start_date)),
                date(loan.expected_return_date),
                date(loan.actual_return_date),
                details.display_status.to_string(),
                loan.condition_before.map(|c| c.to_string()).unwrap_or_default(),
                loan.condition_after.map(|c| c.to_string()).unwrap_or_default(),
                loan.notes.clone().unwrap_or_default(),
            ],
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        equipment::EquipmentCondition,
        loan::{Loan, LoanEquipment, LoanPatient, LoanStatus},
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_escape_quotes_only_when_needed() {
        assert_eq!(escape("Fauteuil"), "Fauteuil");
        assert_eq!(escape("Lit, médicalisé"), "\"Lit, médicalisé\"");
        assert_eq!(escape("dit \"bon\""), "\"dit \"\"bon\"\"\"");
        assert_eq!(escape("ligne\nsuivante"), "\"ligne\nsuivante\"");
    }

    #[test]
    fn test_loans_to_csv() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let details = LoanDetails {
            loan: Loan {
                id: 4,
                equipment_id: 2,
                patient_id: 9,
                start_date: start,
                expected_return_date: Some(Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap()),
                actual_return_date: None,
                status: LoanStatus::Active,
                condition_before: Some(EquipmentCondition::Good),
                condition_after: None,
                notes: Some("avec coussin, housse".to_string()),
                cancel_reason: None,
                created_by: None,
                closed_by: None,
                created_at: start,
                updated_at: start,
            },
            patient: LoanPatient {
                id: 9,
                first_name: "Karim".to_string(),
                last_name: "Haddad".to_string(),
            },
            equipment: LoanEquipment {
                id: 2,
                name: "Déambulateur".to_string(),
                serial_number: "DB-014".to_string(),
                category: None,
            },
            is_overdue: true,
            display_status: LoanStatus::Overdue,
        };

        let csv = loans_to_csv(&[details]);
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(
            lines[1],
            "4,Karim Haddad,Déambulateur,DB-014,2025-03-01,2025-04-01,,overdue,good,,\"avec coussin, housse\""
        );
    }
}
