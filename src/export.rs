//! Lead CSV export
//!
//! Text fields are always double-quoted with embedded quotes doubled. The
//! two numeric columns are written bare. Lines are joined with `\n`.

use crate::db::schemas::LeadDoc;

/// Header row, one entry per column
pub const CSV_HEADER: [&str; 10] = [
    "Email",
    "Name",
    "Company",
    "Website",
    "Phone",
    "Lead Score",
    "Assessment Count",
    "Source",
    "CRM ID",
    "Created At",
];

/// Render leads in the order given
pub fn render_leads_csv(leads: &[LeadDoc]) -> String {
    let mut lines = Vec::with_capacity(leads.len() + 1);
    lines.push(
        CSV_HEADER
            .iter()
            .map(|h| quote(h))
            .collect::<Vec<_>>()
            .join(","),
    );

    for lead in leads {
        lines.push(render_row(lead));
    }

    lines.join("\n")
}

fn render_row(lead: &LeadDoc) -> String {
    let created_at = lead
        .metadata
        .created_at_utc()
        .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_default();

    [
        quote(lead.email.as_deref().unwrap_or_default()),
        quote(lead.name.as_deref().unwrap_or_default()),
        quote(lead.company.as_deref().unwrap_or_default()),
        quote(lead.website.as_deref().unwrap_or_default()),
        quote(lead.phone.as_deref().unwrap_or_default()),
        lead.lead_score.to_string(),
        lead.assessment_count.to_string(),
        quote(lead.source.as_str()),
        quote(lead.crm_id.as_deref().unwrap_or_default()),
        quote(&created_at),
    ]
    .join(",")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
