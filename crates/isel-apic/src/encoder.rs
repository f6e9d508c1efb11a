//! XML document for one interface selector under its profile.
//!
//! ```text
//! infraAccPortP name=P dn=uni/infra/accportprof-P
//! └── infraHPortS name=S type=range
//!     ├── infraRsAccBaseGrp fexId=101
//!     └── infraPortBlk name=S fromCard=1 fromPort=.. toCard=1 toPort=..
//! ```
//!
//! The encoder validates what it places into the document: names land in a
//! DN and in a URL path, so they are restricted to the APIC naming charset.

use isel_reconcile::{DesiredRecord, EncodeError, SelectorEncoder, PROFILE_RN_PREFIX};
use xot::Xot;

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCR_LEN: usize = 128;

const CARD: &str = "1";
const FEX_ID: &str = "101";

/// Encodes desired records as `infraAccPortP` XML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSelectorEncoder;

impl XmlSelectorEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl SelectorEncoder for XmlSelectorEncoder {
    fn encode(&self, record: &DesiredRecord) -> Result<String, EncodeError> {
        check_name("interface_profile", &record.profile)?;
        check_name("selector_name", &record.selector_name)?;
        check_port("from_port", &record.from_port)?;
        check_port("to_port", &record.to_port)?;
        check_descr(&record.description)?;

        build(record).map_err(|e| EncodeError::new("document", e.to_string()))
    }
}

fn build(r: &DesiredRecord) -> Result<String, xot::Error> {
    let mut xot = Xot::new();
    let dn = format!("uni/infra/{PROFILE_RN_PREFIX}-{}", r.profile);

    let profile = element(
        &mut xot,
        "infraAccPortP",
        &[
            ("name", &r.profile),
            ("dn", &dn),
            ("descr", &r.description),
            ("annotation", ""),
            ("ownerKey", ""),
            ("ownerTag", ""),
        ],
    );
    let selector = element(
        &mut xot,
        "infraHPortS",
        &[
            ("name", &r.selector_name),
            ("type", "range"),
            ("annotation", ""),
            ("descr", &r.description),
        ],
    );
    let base_grp = element(
        &mut xot,
        "infraRsAccBaseGrp",
        &[("fexId", FEX_ID), ("tDn", "")],
    );
    let block = element(
        &mut xot,
        "infraPortBlk",
        &[
            ("name", &r.selector_name),
            ("descr", &r.description),
            ("fromCard", CARD),
            ("fromPort", &r.from_port),
            ("toCard", CARD),
            ("toPort", &r.to_port),
        ],
    );

    xot.append(selector, base_grp)?;
    xot.append(selector, block)?;
    xot.append(profile, selector)?;
    let doc = xot.new_document_with_element(profile)?;
    xot.to_string(doc)
}

fn element(xot: &mut Xot, name: &str, attrs: &[(&str, &str)]) -> xot::Node {
    let name_id = xot.add_name(name);
    let node = xot.new_element(name_id);
    for (k, v) in attrs {
        let key = xot.add_name(k);
        xot.attributes_mut(node).insert(key, (*v).to_string());
    }
    node
}

fn check_name(field: &'static str, value: &str) -> Result<(), EncodeError> {
    if value.is_empty() {
        return Err(EncodeError::new(field, "empty"));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(EncodeError::new(
            field,
            format!("longer than {MAX_NAME_LEN} characters"),
        ));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-')))
    {
        return Err(EncodeError::new(
            field,
            format!("character {bad:?} not allowed in '{value}'"),
        ));
    }
    Ok(())
}

fn check_port(field: &'static str, value: &str) -> Result<(), EncodeError> {
    if value.is_empty() {
        return Err(EncodeError::new(field, "empty"));
    }
    if value.chars().any(char::is_control) {
        return Err(EncodeError::new(field, "contains control characters"));
    }
    Ok(())
}

fn check_descr(value: &str) -> Result<(), EncodeError> {
    if value.chars().count() > MAX_DESCR_LEN {
        return Err(EncodeError::new(
            "description",
            format!("longer than {MAX_DESCR_LEN} characters"),
        ));
    }
    if value.chars().any(char::is_control) {
        return Err(EncodeError::new("description", "contains control characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(p: &str, s: &str, from: &str, to: &str, d: &str) -> DesiredRecord {
        DesiredRecord::new(p, s, from, to, d)
    }

    #[test]
    fn document_nests_selector_under_profile() {
        let xml = XmlSelectorEncoder
            .encode(&rec("LF1101_IPR", "Eth1-05", "5", "6", "server rack 3"))
            .unwrap();

        assert!(xml.starts_with("<infraAccPortP"));
        assert!(xml.contains(r#"dn="uni/infra/accportprof-LF1101_IPR""#));
        assert!(xml.contains(r#"name="Eth1-05""#));
        assert!(xml.contains(r#"type="range""#));
        assert!(xml.contains(r#"fexId="101""#));
        assert!(xml.contains(r#"fromPort="5""#));
        assert!(xml.contains(r#"toPort="6""#));
        assert!(xml.contains(r#"fromCard="1""#));

        let p = xml.find("<infraAccPortP").unwrap();
        let s = xml.find("<infraHPortS").unwrap();
        let b = xml.find("<infraPortBlk").unwrap();
        assert!(p < s && s < b);
        assert!(xml.trim_end().ends_with("</infraAccPortP>"));
    }

    #[test]
    fn description_is_escaped() {
        let xml = XmlSelectorEncoder
            .encode(&rec("P", "S", "1", "1", "A&B"))
            .unwrap();
        assert!(xml.contains("A&amp;B"));
        assert!(!xml.contains("A&B"));
    }

    #[test]
    fn empty_description_allowed() {
        assert!(XmlSelectorEncoder.encode(&rec("P", "S", "1", "1", "")).is_ok());
    }

    #[test]
    fn name_charset_enforced() {
        let err = XmlSelectorEncoder
            .encode(&rec("P/../x", "S", "1", "1", ""))
            .unwrap_err();
        assert_eq!(err.field, "interface_profile");

        let err = XmlSelectorEncoder
            .encode(&rec("P", "S 1", "1", "1", ""))
            .unwrap_err();
        assert_eq!(err.field, "selector_name");
    }

    #[test]
    fn length_limits() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            XmlSelectorEncoder
                .encode(&rec(&long, "S", "1", "1", ""))
                .unwrap_err()
                .field,
            "interface_profile"
        );
        let ok = "x".repeat(MAX_NAME_LEN);
        assert!(XmlSelectorEncoder.encode(&rec(&ok, "S", "1", "1", "")).is_ok());

        let descr = "d".repeat(MAX_DESCR_LEN + 1);
        assert_eq!(
            XmlSelectorEncoder
                .encode(&rec("P", "S", "1", "1", &descr))
                .unwrap_err()
                .field,
            "description"
        );
    }

    #[test]
    fn control_chars_rejected() {
        assert_eq!(
            XmlSelectorEncoder
                .encode(&rec("P", "S", "1\u{0}", "1", ""))
                .unwrap_err()
                .field,
            "from_port"
        );
        assert_eq!(
            XmlSelectorEncoder
                .encode(&rec("P", "S", "1", "1", "a\nb"))
                .unwrap_err()
                .field,
            "description"
        );
    }
}
