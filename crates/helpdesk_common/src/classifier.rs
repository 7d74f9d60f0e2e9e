//! Keyword triage for incoming questions.
//!
//! Both classifiers lower-case the query and look for plain substrings.
//! There is no tokenization, so "errors" matches "error" and "scrum" matches
//! "crm". Table order is part of the contract: earlier entries win ties.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Urgency tier of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    #[default]
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Business unit the question most likely comes from.
/// Order is pinned to match `DEPARTMENT_KEYWORDS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Finance,
    Hr,
    Marketing,
    It,
    Sales,
    Operations,
    #[default]
    Unknown,
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Finance => "finance",
            Self::Hr => "hr",
            Self::Marketing => "marketing",
            Self::It => "it",
            Self::Sales => "sales",
            Self::Operations => "operations",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Keywords that make a ticket high severity
pub const HIGH_KEYWORDS: &[&str] = &["urgent", "immediately", "asap", "crash", "fatal", "severe"];

/// Keywords that make a ticket medium severity
pub const MEDIUM_KEYWORDS: &[&str] = &[
    "not working",
    "error",
    "problem",
    "issue",
    "won't",
    "cant",
    "can't",
];

/// Department keyword table, scanned top to bottom
pub const DEPARTMENT_KEYWORDS: &[(Department, &[&str])] = &[
    (
        Department::Finance,
        &["invoice", "accounting", "finance", "budget", "expense"],
    ),
    (
        Department::Hr,
        &["payroll", "human resources", "benefits", "timesheet"],
    ),
    (
        Department::Marketing,
        &["campaign", "marketing", "advertising", "social media"],
    ),
    (
        Department::It,
        &["server", "network", "vpn", "database", "email"],
    ),
    (
        Department::Sales,
        &["crm", "salesforce", "leads", "opportunity"],
    ),
    (
        Department::Operations,
        &["logistics", "operation", "inventory"],
    ),
];

fn first_match<'a>(text: &str, keywords: &[&'a str]) -> Option<&'a str> {
    keywords.iter().copied().find(|kw| text.contains(kw))
}

/// Classify severity. High keywords always beat medium keywords, wherever
/// they appear in the text.
pub fn classify_severity(text: &str) -> Severity {
    let normalized = text.to_lowercase();

    if let Some(kw) = first_match(&normalized, HIGH_KEYWORDS) {
        debug!("severity high (matched {:?})", kw);
        return Severity::High;
    }
    if let Some(kw) = first_match(&normalized, MEDIUM_KEYWORDS) {
        debug!("severity medium (matched {:?})", kw);
        return Severity::Medium;
    }
    Severity::Low
}

/// Guess the originating department, or `Unknown` when nothing matches
pub fn classify_department(text: &str) -> Department {
    let normalized = text.to_lowercase();

    for (department, keywords) in DEPARTMENT_KEYWORDS {
        if let Some(kw) = first_match(&normalized, keywords) {
            debug!("department {} (matched {:?})", department, kw);
            return *department;
        }
    }
    Department::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_beats_medium() {
        assert_eq!(
            classify_severity("please help ASAP, error on login"),
            Severity::High
        );
        // Position in the text does not matter
        assert_eq!(
            classify_severity("error error error, it is urgent"),
            Severity::High
        );
    }

    #[test]
    fn test_medium_and_low() {
        assert_eq!(classify_severity("My printer is NOT WORKING"), Severity::Medium);
        assert_eq!(classify_severity("I can't log in"), Severity::Medium);
        assert_eq!(classify_severity("how do I change my wallpaper"), Severity::Low);
        assert_eq!(classify_severity(""), Severity::Low);
    }

    #[test]
    fn test_substring_inside_word_matches() {
        // "crashed" contains "crash"
        assert_eq!(classify_severity("the app crashed"), Severity::High);
        // "issues" contains "issue"
        assert_eq!(classify_severity("some issues today"), Severity::Medium);
    }

    #[test]
    fn test_department_basic() {
        assert_eq!(
            classify_department("Need access to Salesforce CRM"),
            Department::Sales
        );
        assert_eq!(classify_department("random unrelated text"), Department::Unknown);
        assert_eq!(classify_department("VPN drops every hour"), Department::It);
        assert_eq!(classify_department("Payroll export is late"), Department::Hr);
    }

    #[test]
    fn test_department_table_order_breaks_ties() {
        // finance is declared before it
        assert_eq!(
            classify_department("invoice server is down"),
            Department::Finance
        );
        // marketing is declared before sales
        assert_eq!(
            classify_department("campaign leads missing from crm"),
            Department::Marketing
        );
    }

    #[test]
    fn test_department_embedded_keyword() {
        // "operational" contains "operation"
        assert_eq!(
            classify_department("is the line operational"),
            Department::Operations
        );
    }

    #[test]
    fn test_display_matches_serde() {
        for dept in [Department::Hr, Department::It, Department::Unknown] {
            let json = serde_json::to_string(&dept).unwrap();
            assert_eq!(json, format!("\"{}\"", dept));
        }
        let json = serde_json::to_string(&Severity::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
