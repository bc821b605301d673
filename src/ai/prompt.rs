//! Entity-aware prompt construction for the risk synthesizer.
//!
//! The prompt pins down the output format hard enough that the parser
//! can recover structure from it, and selects a heuristic body per
//! (entity, table) family so the model looks at the right attributes.

use chrono::NaiveDate;

/// The rigid output schema appended to every prompt. The parser's
/// field markers must stay in sync with this text.
const OUTPUT_FORMAT: &str = "\
Identify 2 to 5 concrete risks. Respond with one block per risk, in exactly this format:

RISK 1:
TITLE: <short risk title>
DESCRIPTION: <one or two sentences describing the risk>
LIKELIHOOD: <integer 1-5>
IMPACT: <integer 1-5>
EXPOSURE: <integer 1-5>
EXPLANATION: <why this risk applies to this specific record>
MITIGATIONS:
- <first suggested mitigation>
- <second suggested mitigation>
";

const VENDOR_HEURISTICS: &str = "\
Consider in particular:
- data access and the sensitivity of the data the vendor can reach
- system integrations and the blast radius of a vendor-side compromise
- criticality of the vendor to ongoing operations and concentration risk
- the vendor's industry sector and its regulatory exposure
- contract terms, insurance coverage, and audit rights";

const CONTINUITY_HEURISTICS: &str = "\
Consider in particular:
- how long ago the plan was last reviewed or tested
- recovery time and recovery point objectives against stated needs
- single points of failure in staffing, facilities, or suppliers
- whether test results fed back into plan updates";

const AUDIT_HEURISTICS: &str = "\
Consider in particular:
- open findings and how long they have been unresolved
- scope gaps between the audit plan and the control universe
- repeat findings that indicate failed remediation
- independence and qualification of the audit staff";

const COMPLIANCE_HEURISTICS: &str = "\
Consider in particular:
- deadlines against the named framework and their slack
- evidence quality and whether controls are demonstrably operating
- items stuck in review and the age of their last status change
- regulatory change that may have invalidated the current mapping";

const CONTRACT_HEURISTICS: &str = "\
Consider in particular:
- expiry and renewal dates against notice periods
- service levels and the history of breaches against them
- liability caps and indemnities relative to the engagement's risk
- termination and data-return clauses";

const RFP_HEURISTICS: &str = "\
Consider in particular:
- completeness of the requirements against the stated business need
- vendor responses that overcommit relative to their track record
- evaluation criteria that skew toward price over capability";

const GENERIC_HEURISTICS: &str = "\
Consider operational, security, compliance, and continuity angles for
the record as a whole.";

/// Builds completion prompts for risk synthesis.
pub struct RiskPromptBuilder;

impl RiskPromptBuilder {
    /// Build the prompt for one `(entity, table)` selection.
    pub fn build(entity: &str, table: &str, row: &serde_json::Value, today: NaiveDate) -> String {
        let context = serde_json::to_string_pretty(row)
            .unwrap_or_else(|_| "{}".to_string());
        format!(
            "You are a risk analyst for a governance, risk, and compliance platform.\n\
             Today's date is {today}.\n\n\
             Analyze the following {entity} record (table: {table}):\n\n\
             {context}\n\n\
             {heuristics}\n\n\
             {format}",
            today = today.format("%Y-%m-%d"),
            entity = entity,
            table = table,
            context = context,
            heuristics = Self::heuristics_for(entity, table),
            format = OUTPUT_FORMAT,
        )
    }

    /// Pick the heuristic body for an (entity, table) family. Unknown
    /// families get the generic default.
    fn heuristics_for(entity: &str, table: &str) -> &'static str {
        let entity = entity.to_ascii_lowercase();
        let table = table.to_ascii_lowercase();
        let matches_any =
            |needles: &[&str]| needles.iter().any(|n| entity.contains(n) || table.contains(n));

        if matches_any(&["vendor"]) {
            VENDOR_HEURISTICS
        } else if matches_any(&["continuity", "plan", "bcp"]) {
            CONTINUITY_HEURISTICS
        } else if matches_any(&["audit"]) {
            AUDIT_HEURISTICS
        } else if matches_any(&["compliance"]) {
            COMPLIANCE_HEURISTICS
        } else if matches_any(&["contract", "sla"]) {
            CONTRACT_HEURISTICS
        } else if matches_any(&["rfp"]) {
            RFP_HEURISTICS
        } else {
            GENERIC_HEURISTICS
        }
    }
}
