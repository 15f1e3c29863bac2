// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lead data generators for pipeline and abuse tests.

use lead_guard::validator::LeadForm;

/// A lead that passes every field rule.
pub fn valid_lead(i: usize) -> LeadForm {
    LeadForm {
        name: format!("Visitante {}", ["Ana", "Bruno", "Camila", "Diego"][i % 4]),
        email: format!("visitante{i}@example.cl"),
        phone_number: format!("+56 9 {:04} {:04}", 1000 + i % 9000, 5678),
        consent: true,
        website: String::new(),
    }
}

/// Leads that fail local validation, one rule each.
pub fn invalid_leads() -> Vec<LeadForm> {
    let base = valid_lead(0);
    vec![
        LeadForm {
            name: "A".to_string(),
            ..base.clone()
        },
        LeadForm {
            email: "not-an-email".to_string(),
            ..base.clone()
        },
        LeadForm {
            phone_number: "abc".to_string(),
            ..base.clone()
        },
        LeadForm {
            consent: false,
            ..base.clone()
        },
        LeadForm {
            name: "<script>alert(1)</script>".to_string(),
            ..base
        },
    ]
}

/// Emails that pass the pattern yet carry HTML metacharacters.
pub fn hostile_emails() -> Vec<&'static str> {
    vec![
        "x\"onmouseover='alert(1)'@evil.co",
        "<img>@evil.co",
        "o'brien@example.ie",
    ]
}

/// A bot that fills in the hidden field.
pub fn bot_lead() -> LeadForm {
    LeadForm {
        website: "http://cheap-pills.example".to_string(),
        ..valid_lead(7)
    }
}
