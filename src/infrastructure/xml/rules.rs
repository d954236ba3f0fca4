//! Semantic rules checked against documents that parsed.
//!
//! Each rule has a stable identifier (reported as `validationRuleId`) and a
//! reason code. Violations are located by the indexed path of the offending
//! element.

use crate::domain::document::XmlElement;
use crate::domain::release::{SchemaRelease, View};
use crate::domain::validation::{ValidationError, ValidationErrorSet, reason_code};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;

pub struct Rule {
    pub id: &'static str,
    pub code: &'static str,
    pub description: &'static str,
    applies_to: fn(&SchemaRelease) -> bool,
    check: fn(&Rule, &XmlElement, &mut ValidationErrorSet),
}

impl Rule {
    pub fn applies_to(&self, release: &SchemaRelease) -> bool {
        (self.applies_to)(release)
    }

    pub fn check(&self, root: &XmlElement, errors: &mut ValidationErrorSet) {
        (self.check)(self, root, errors)
    }

    fn violation(&self, element: &XmlElement) -> ValidationError {
        ValidationError::semantic(self.code, element.path(), self.id)
            .with_description(self.description)
    }
}

fn every_release(_: &SchemaRelease) -> bool {
    true
}

fn confirmation_view(release: &SchemaRelease) -> bool {
    release.view() == View::Confirmation
}

pub static RULES: [Rule; 10] = [
    Rule {
        id: "hdr-1",
        code: reason_code::STRUCTURE,
        description: "The message must contain a header",
        applies_to: every_release,
        check: |rule, root, errors| {
            if root.child("header").is_none() {
                errors.push(rule.violation(root));
            }
        },
    },
    Rule {
        id: "hdr-2",
        code: reason_code::STRUCTURE,
        description: "The message header must contain a messageId",
        applies_to: every_release,
        check: |rule, root, errors| {
            if let Some(header) = root.child("header")
                && header.child("messageId").is_none()
            {
                errors.push(rule.violation(header));
            }
        },
    },
    Rule {
        id: "hdr-3",
        code: reason_code::RULE,
        description: "The messageId must not be blank and must have a messageIdScheme",
        applies_to: every_release,
        check: |rule, root, errors| {
            if let Some(message_id) = root.find(&["header", "messageId"])
                && (message_id.text().is_empty()
                    || message_id.attribute("messageIdScheme").is_none())
            {
                errors.push(rule.violation(message_id));
            }
        },
    },
    Rule {
        id: "hdr-4",
        code: reason_code::STRUCTURE,
        description: "A confirmation message header must identify its sender",
        applies_to: confirmation_view,
        check: |rule, root, errors| {
            if let Some(header) = root.child("header")
                && header.child("sentBy").is_none()
            {
                errors.push(rule.violation(header));
            }
        },
    },
    Rule {
        id: "hdr-5",
        code: reason_code::RULE,
        description: "The creationTimestamp must be an ISO 8601 date-time",
        applies_to: every_release,
        check: |rule, root, errors| {
            if let Some(timestamp) = root.find(&["header", "creationTimestamp"])
                && !is_date_time(timestamp.text())
            {
                errors.push(
                    rule.violation(timestamp)
                        .with_additional_data(timestamp.text()),
                );
            }
        },
    },
    Rule {
        id: "ref-1",
        code: reason_code::RULE,
        description: "An href must refer to an element with a matching id",
        applies_to: every_release,
        check: |rule, root, errors| {
            let ids: HashSet<&str> = root
                .descendants()
                .filter_map(|element| element.attribute("id"))
                .collect();
            for element in root.descendants() {
                if let Some(href) = element.attribute("href")
                    && !ids.contains(href)
                {
                    errors.push(rule.violation(element).with_additional_data(href));
                }
            }
        },
    },
    Rule {
        id: "ref-2",
        code: reason_code::RULE,
        description: "Element ids must be unique within the message",
        applies_to: every_release,
        check: |rule, root, errors| {
            let mut seen = HashSet::new();
            for element in root.descendants() {
                if let Some(id) = element.attribute("id")
                    && !seen.insert(id)
                {
                    errors.push(rule.violation(element).with_additional_data(id));
                }
            }
        },
    },
    Rule {
        id: "dat-1",
        code: reason_code::RULE,
        description: "Date values must have the form YYYY-MM-DD",
        applies_to: every_release,
        check: |rule, root, errors| {
            for element in root.descendants() {
                if element.local_name().ends_with("Date")
                    && element.children().is_empty()
                    && !element.text().is_empty()
                    && !is_date(element.text())
                {
                    errors.push(rule.violation(element).with_additional_data(element.text()));
                }
            }
        },
    },
    Rule {
        id: "amt-1",
        code: reason_code::RULE,
        description: "Amounts must be decimal numbers",
        applies_to: every_release,
        check: |rule, root, errors| {
            for amount in amounts(root) {
                if Decimal::from_str(amount.text()).is_err() {
                    errors.push(rule.violation(amount).with_additional_data(amount.text()));
                }
            }
        },
    },
    Rule {
        id: "amt-2",
        code: reason_code::RULE,
        description: "Amounts must not be negative",
        applies_to: every_release,
        check: |rule, root, errors| {
            for amount in amounts(root) {
                if let Ok(value) = Decimal::from_str(amount.text())
                    && value.is_sign_negative()
                    && !value.is_zero()
                {
                    errors.push(rule.violation(amount).with_additional_data(amount.text()));
                }
            }
        },
    },
];

/// Runs every rule that applies to `release` against the document root.
pub fn validate(root: &XmlElement, release: &SchemaRelease) -> ValidationErrorSet {
    let mut errors = ValidationErrorSet::new();
    for rule in RULES.iter().filter(|rule| rule.applies_to(release)) {
        rule.check(root, &mut errors);
    }
    errors
}

fn amounts(root: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    root.descendants()
        .filter(|element| element.local_name() == "amount" && element.children().is_empty())
}

fn is_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

/// An `xsd:date`: `YYYY-MM-DD` with an optional `Z` or `+HH:MM` suffix.
fn is_date(value: &str) -> bool {
    let (Some(date), Some(zone)) = (value.get(..10), value.get(10..)) else {
        return false;
    };
    let zone_ok = match zone {
        "" | "Z" => true,
        _ => {
            (zone.starts_with('+') || zone.starts_with('-'))
                && zone
                    .get(1..)
                    .is_some_and(|offset| offset.len() == 5 && NaiveTime::parse_from_str(offset, "%H:%M").is_ok())
        }
    };
    zone_ok && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}
