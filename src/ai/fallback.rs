//! Deterministic risk generation for completer outages.
//!
//! Emits a small, row-specific risk set derived from the row's flags so
//! that a dead completion service degrades the analysis rather than the
//! endpoint. Ratings here are fixed per rule; scoring happens later in
//! the synthesizer like for any parsed risk.

use super::parser::ParsedRisk;

/// Generate 2-5 deterministic risks for a row.
pub fn generate(entity: &str, table: &str, row: &serde_json::Value) -> Vec<ParsedRisk> {
    if is_vendor_selection(entity, table) {
        vendor_risks(row)
    } else {
        generic_risks(entity)
    }
}

fn is_vendor_selection(entity: &str, table: &str) -> bool {
    let entity = entity.to_ascii_lowercase();
    let table = table.to_ascii_lowercase();
    entity.contains("vendor") || table.contains("vendor")
}

fn vendor_risks(row: &serde_json::Value) -> Vec<ParsedRisk> {
    let mut risks = Vec::new();

    if flag(row, "has_data_access") {
        risks.push(risk(
            "Data Access Security Risk",
            "The vendor has access to internal data and could expose it through weak controls.",
            3,
            4,
            3,
            "The record flags direct data access, which widens the impact of any vendor-side breach.",
            [
                "Restrict vendor data access to the minimum required scope",
                "Require encryption in transit and at rest for shared data",
                "Review vendor access logs on a fixed cadence",
            ],
        ));
    }

    if flag(row, "has_system_access") {
        risks.push(risk(
            "System Integration Risk",
            "The vendor integrates with internal systems and could propagate failures or compromise.",
            2,
            4,
            3,
            "The record flags system access, so a vendor-side incident can reach internal infrastructure.",
            [
                "Isolate vendor integrations behind dedicated service accounts",
                "Monitor integration points for anomalous activity",
                "Define a kill switch for vendor connectivity",
            ],
        ));
    }

    if flag(row, "is_critical_vendor") {
        risks.push(risk(
            "Critical Vendor Dependency Risk",
            "Operations depend on this vendor; an outage or exit would disrupt service delivery.",
            2,
            5,
            4,
            "The record marks the vendor as critical, concentrating operational dependency.",
            [
                "Maintain a tested exit and transition plan",
                "Identify and qualify an alternate supplier",
                "Negotiate continuity commitments into the contract",
            ],
        ));
    }

    if let Some(sector) = text(row, "industry_sector").filter(|s| !s.trim().is_empty()) {
        risks.push(risk(
            &format!("{} Industry Risk", sector.trim()),
            &format!(
                "Operating in the {} sector exposes the vendor to sector-specific regulation and threats.",
                sector.trim()
            ),
            3,
            3,
            3,
            "Sector-specific obligations and threat patterns follow the vendor into this engagement.",
            [
                "Map sector regulations that apply to the engagement",
                "Confirm the vendor's sector certifications are current",
                "Track sector incident trends affecting the vendor",
            ],
        ));
    }

    risks.push(risk(
        "General Vendor Management Risk",
        "Baseline third-party risk from onboarding, oversight, and offboarding gaps.",
        3,
        3,
        3,
        "Every vendor engagement carries baseline management risk independent of specific flags.",
        [
            "Keep the vendor inventory and ownership current",
            "Run periodic performance and risk reviews",
            "Verify offboarding removes all standing access",
        ],
    ));

    risks
}

fn generic_risks(entity: &str) -> Vec<ParsedRisk> {
    let label = humanize(entity);
    vec![
        risk(
            &format!("{} Operational Risk", label),
            "The record indicates potential gaps in day-to-day operational controls.",
            3,
            3,
            3,
            "Generated without completion service input, from the record's module family.",
            [
                "Assign a named owner for remediation",
                "Review the record against current operating procedures",
                "Schedule a follow-up assessment",
            ],
        ),
        risk(
            "Business Continuity Risk",
            "A disruption affecting this record's process could interrupt dependent operations.",
            2,
            4,
            3,
            "Continuity exposure is assessed by default when no model analysis is available.",
            [
                "Confirm the process is covered by a continuity plan",
                "Validate recovery objectives against business needs",
                "Exercise the recovery path at least annually",
            ],
        ),
    ]
}

fn risk(
    title: &str,
    description: &str,
    likelihood: u8,
    impact: u8,
    exposure: u8,
    explanation: &str,
    mitigations: [&str; 3],
) -> ParsedRisk {
    ParsedRisk {
        title: title.to_string(),
        description: description.to_string(),
        likelihood,
        impact,
        exposure,
        explanation: explanation.to_string(),
        mitigations: mitigations.iter().map(|m| m.to_string()).collect(),
    }
}

fn flag(row: &serde_json::Value, name: &str) -> bool {
    row.get(name).and_then(serde_json::Value::as_bool).unwrap_or(false)
}

fn text<'a>(row: &'a serde_json::Value, name: &str) -> Option<&'a str> {
    row.get(name).and_then(serde_json::Value::as_str)
}

fn humanize(tag: &str) -> String {
    tag.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fully_flagged_vendor_emits_five_risks() {
        let row = json!({
            "has_data_access": true,
            "has_system_access": true,
            "is_critical_vendor": true,
            "industry_sector": "Healthcare"
        });
        let risks = generate("vendor_management", "temp_vendor", &row);
        let titles: Vec<_> = risks.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Data Access Security Risk",
                "System Integration Risk",
                "Critical Vendor Dependency Risk",
                "Healthcare Industry Risk",
                "General Vendor Management Risk",
            ]
        );
    }

    #[test]
    fn test_vendor_ratings_match_rules() {
        let row = json!({
            "has_data_access": true,
            "is_critical_vendor": true,
            "industry_sector": "Healthcare"
        });
        let risks = generate("vendor_management", "temp_vendor", &row);
        let by_title = |t: &str| risks.iter().find(|r| r.title == t).unwrap();

        let data = by_title("Data Access Security Risk");
        assert_eq!((data.likelihood, data.impact, data.exposure), (3, 4, 3));

        let dep = by_title("Critical Vendor Dependency Risk");
        assert_eq!((dep.likelihood, dep.impact, dep.exposure), (2, 5, 4));

        let sector = by_title("Healthcare Industry Risk");
        assert_eq!((sector.likelihood, sector.impact, sector.exposure), (3, 3, 3));

        let general = by_title("General Vendor Management Risk");
        assert_eq!((general.likelihood, general.impact, general.exposure), (3, 3, 3));

        // no system access flag: no integration risk
        assert!(risks.iter().all(|r| r.title != "System Integration Risk"));
        assert_eq!(risks.len(), 4);
    }

    #[test]
    fn test_unflagged_vendor_still_gets_general_risk() {
        let risks = generate("vendor_management", "temp_vendor", &json!({}));
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].title, "General Vendor Management Risk");
    }

    #[test]
    fn test_blank_sector_is_ignored() {
        let row = json!({"industry_sector": "  "});
        let risks = generate("vendor_management", "temp_vendor", &row);
        assert!(risks.iter().all(|r| !r.title.ends_with("Industry Risk")));
    }

    #[test]
    fn test_non_vendor_selection_gets_generic_pair() {
        let risks = generate("business_continuity", "bcp_plan", &json!({}));
        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0].title, "Business Continuity Operational Risk");
        assert_eq!(risks[1].title, "Business Continuity Risk");
    }

    #[test]
    fn test_every_fallback_risk_has_three_mitigations() {
        let row = json!({
            "has_data_access": true,
            "has_system_access": true,
            "is_critical_vendor": true,
            "industry_sector": "Finance"
        });
        for risk in generate("vendor_management", "temp_vendor", &row) {
            assert_eq!(risk.mitigations.len(), 3, "{}", risk.title);
            assert!(!risk.explanation.is_empty());
        }
    }
}
