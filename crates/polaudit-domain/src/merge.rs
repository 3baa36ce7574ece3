//! Merge module - monotone folding of partial extractions
//!
//! Every rule here is pure: `a.merge(&b)` never mutates its operands and
//! returns the combined value. The field-class rules are:
//!
//! | field class | rule |
//! |---|---|
//! | tri-state boolean | `true` dominates, then `false`, then unset |
//! | plain scalar | first non-empty value wins |
//! | ranked enum | maximum rank |
//! | string list | union in order of first appearance |
//! | nested object | field-wise |
//!
//! Facts can only become more affirmed; nothing a chunk stated is retracted
//! by a later chunk. The scalar rule is the one exception to order
//! independence: when two chunks state different non-empty values, the one
//! processed first is kept.

use crate::details::{
    CookieDetails, CookieDuration, DataProtectionDetails, LegalNoticeDetails, Ownership,
    PrivacyDetails, Rights,
};

/// Binary merge of two values of the same shape
pub trait Merge {
    /// Combine `self` (the accumulator) with `other` (a later observation)
    fn merge(&self, other: &Self) -> Self;
}

/// Tri-state boolean: `true` if either is true, else `false` if either is false
pub fn merge_flag(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), _) | (_, Some(false)) => Some(false),
        (None, None) => None,
    }
}

/// Plain scalar: keep `a` unless it is blank
pub fn merge_text(a: &str, b: &str) -> String {
    if a.trim().is_empty() {
        b.to_string()
    } else {
        a.to_string()
    }
}

/// Optional scalar: first non-empty value wins, unset stays unset
pub fn merge_opt_text(a: &Option<String>, b: &Option<String>) -> Option<String> {
    match (a.as_deref(), b.as_deref()) {
        (Some(x), _) if !x.trim().is_empty() => a.clone(),
        (_, Some(y)) if !y.trim().is_empty() => b.clone(),
        _ => a.clone().or_else(|| b.clone()),
    }
}

/// String list: union of both lists, de-duplicated, first appearance first
pub fn merge_list(a: &[String], b: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(a.len() + b.len());
    for item in a.iter().chain(b) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

/// Ranked enum: the higher rank wins, unset ranks below every value
pub fn merge_rank<T: Ord + Copy>(a: Option<T>, b: Option<T>) -> Option<T> {
    a.max(b)
}

/// Cookie ownership
///
/// `MIXED` is sticky once observed, and a `FIRST` accumulator moves to any
/// other observed value. An unset observation never changes the accumulator.
pub fn merge_ownership(a: Option<Ownership>, b: Option<Ownership>) -> Option<Ownership> {
    match (a, b) {
        (current, None) => current,
        (None, observed) => observed,
        (_, Some(Ownership::Mixed)) => Some(Ownership::Mixed),
        (Some(Ownership::First), observed) => observed,
        (current, _) => current,
    }
}

impl Merge for Rights {
    fn merge(&self, o: &Self) -> Self {
        Self {
            access: merge_flag(self.access, o.access),
            rectification: merge_flag(self.rectification, o.rectification),
            erasure: merge_flag(self.erasure, o.erasure),
            opposition: merge_flag(self.opposition, o.opposition),
            portability: merge_flag(self.portability, o.portability),
            restriction: merge_flag(self.restriction, o.restriction),
            no_individual_decision: merge_flag(
                self.no_individual_decision,
                o.no_individual_decision,
            ),
        }
    }
}

impl Merge for CookieDuration {
    fn merge(&self, o: &Self) -> Self {
        Self {
            session: merge_flag(self.session, o.session),
            persistent: merge_flag(self.persistent, o.persistent),
            max_exp: merge_opt_text(&self.max_exp, &o.max_exp),
        }
    }
}

impl Merge for PrivacyDetails {
    fn merge(&self, o: &Self) -> Self {
        Self {
            controller: merge_text(&self.controller, &o.controller),
            dpo_contact: merge_text(&self.dpo_contact, &o.dpo_contact),
            purposes: merge_list(&self.purposes, &o.purposes),
            legal_bases: merge_list(&self.legal_bases, &o.legal_bases),
            source_of_data: merge_text(&self.source_of_data, &o.source_of_data),
            retention: merge_text(&self.retention, &o.retention),
            recipients: merge_list(&self.recipients, &o.recipients),
            transfer_scope: merge_rank(self.transfer_scope, o.transfer_scope),
            rights: self.rights.merge(&o.rights),
            rights_general_statement: merge_flag(
                self.rights_general_statement,
                o.rights_general_statement,
            ),
            automated_decisions: merge_flag(self.automated_decisions, o.automated_decisions),
        }
    }
}

impl Merge for CookieDetails {
    fn merge(&self, o: &Self) -> Self {
        Self {
            ownership: merge_ownership(self.ownership, o.ownership),
            third_parties: merge_list(&self.third_parties, &o.third_parties),
            types: merge_list(&self.types, &o.types),
            purpose: merge_list(&self.purpose, &o.purpose),
            duration: self.duration.merge(&o.duration),
            consent_mechanism: merge_opt_text(&self.consent_mechanism, &o.consent_mechanism),
            mgmt_instructions: merge_flag(self.mgmt_instructions, o.mgmt_instructions),
        }
    }
}

impl Merge for LegalNoticeDetails {
    fn merge(&self, o: &Self) -> Self {
        Self {
            owner: merge_text(&self.owner, &o.owner),
            contact: merge_text(&self.contact, &o.contact),
            ip_notice: merge_flag(self.ip_notice, o.ip_notice),
            liability_clause: merge_flag(self.liability_clause, o.liability_clause),
            applicable_law: merge_text(&self.applicable_law, &o.applicable_law),
        }
    }
}

impl Merge for DataProtectionDetails {
    fn merge(&self, o: &Self) -> Self {
        Self {
            dpo_contact: merge_text(&self.dpo_contact, &o.dpo_contact),
            rights: self.rights.merge(&o.rights),
            rights_general_statement: merge_flag(
                self.rights_general_statement,
                o.rights_general_statement,
            ),
            source_of_data: merge_text(&self.source_of_data, &o.source_of_data),
            retention: merge_text(&self.retention, &o.retention),
            recipients: merge_list(&self.recipients, &o.recipients),
            transfer_scope: merge_rank(self.transfer_scope, o.transfer_scope),
            automated_decisions: merge_flag(self.automated_decisions, o.automated_decisions),
            complaint_authority: merge_flag(self.complaint_authority, o.complaint_authority),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::TransferScope;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn flag() -> impl Strategy<Value = Option<bool>> {
        prop_oneof![Just(None), Just(Some(false)), Just(Some(true))]
    }

    fn scope() -> impl Strategy<Value = Option<TransferScope>> {
        prop_oneof![
            Just(None),
            Just(Some(TransferScope::NoTransfers)),
            Just(Some(TransferScope::IntraEu)),
            Just(Some(TransferScope::International)),
        ]
    }

    fn ownership() -> impl Strategy<Value = Option<Ownership>> {
        prop_oneof![
            Just(None),
            Just(Some(Ownership::First)),
            Just(Some(Ownership::Third)),
            Just(Some(Ownership::Mixed)),
        ]
    }

    /// De-duplicated list drawn from a small vocabulary so overlaps are common
    fn items() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec("[a-e]", 0..5).prop_map(|v| merge_list(&v, &[]))
    }

    fn text() -> impl Strategy<Value = String> + Clone {
        prop_oneof![Just(String::new()), "[a-z]{1,8}"]
    }

    fn rights() -> impl Strategy<Value = Rights> {
        (flag(), flag(), flag(), flag(), flag(), flag(), flag()).prop_map(
            |(access, rectification, erasure, opposition, portability, restriction, nid)| Rights {
                access,
                rectification,
                erasure,
                opposition,
                portability,
                restriction,
                no_individual_decision: nid,
            },
        )
    }

    fn privacy_with(text: impl Strategy<Value = String> + Clone) -> impl Strategy<Value = PrivacyDetails> {
        (
            (text.clone(), text.clone(), text.clone(), text),
            (items(), items(), items()),
            (scope(), rights(), flag(), flag()),
        )
            .prop_map(
                |(
                    (controller, dpo_contact, source_of_data, retention),
                    (purposes, legal_bases, recipients),
                    (transfer_scope, rights, rights_general_statement, automated_decisions),
                )| PrivacyDetails {
                    controller,
                    dpo_contact,
                    purposes,
                    legal_bases,
                    source_of_data,
                    retention,
                    recipients,
                    transfer_scope,
                    rights,
                    rights_general_statement,
                    automated_decisions,
                },
            )
    }

    fn cookie_with(text: impl Strategy<Value = String> + Clone) -> impl Strategy<Value = CookieDetails> {
        (
            ownership(),
            (items(), items(), items()),
            (flag(), flag(), optional(text.clone())),
            optional(text),
            flag(),
        )
            .prop_map(
                |(ownership, (third_parties, types, purpose), (session, persistent, max_exp), consent_mechanism, mgmt_instructions)| {
                    CookieDetails {
                        ownership,
                        third_parties,
                        types,
                        purpose,
                        duration: CookieDuration {
                            session,
                            persistent,
                            max_exp,
                        },
                        consent_mechanism,
                        mgmt_instructions,
                    }
                },
            )
    }

    fn data_protection_with(
        text: impl Strategy<Value = String> + Clone,
    ) -> impl Strategy<Value = DataProtectionDetails> {
        (
            (text.clone(), text.clone(), text),
            items(),
            (scope(), rights(), flag(), flag(), flag()),
        )
            .prop_map(
                |(
                    (dpo_contact, source_of_data, retention),
                    recipients,
                    (transfer_scope, rights, rights_general_statement, automated_decisions, complaint_authority),
                )| DataProtectionDetails {
                    dpo_contact,
                    rights,
                    rights_general_statement,
                    source_of_data,
                    retention,
                    recipients,
                    transfer_scope,
                    automated_decisions,
                    complaint_authority,
                },
            )
    }

    fn legal_notice_with(
        text: impl Strategy<Value = String> + Clone,
    ) -> impl Strategy<Value = LegalNoticeDetails> {
        (text.clone(), text.clone(), flag(), flag(), text).prop_map(
            |(owner, contact, ip_notice, liability_clause, applicable_law)| LegalNoticeDetails {
                owner,
                contact,
                ip_notice,
                liability_clause,
                applicable_law,
            },
        )
    }

    /// Optional text as the sanitizer produces it: blank means unset
    fn optional(text: impl Strategy<Value = String>) -> impl Strategy<Value = Option<String>> {
        text.prop_map(|s| Some(s).filter(|s| !s.trim().is_empty()))
    }

    fn as_set(v: &[String]) -> BTreeSet<String> {
        v.iter().cloned().collect()
    }

    proptest! {
        /// Property: merging a value with itself changes nothing
        #[test]
        fn test_privacy_merge_idempotent(x in privacy_with(text())) {
            prop_assert_eq!(x.merge(&x), x);
        }

        #[test]
        fn test_cookie_merge_idempotent(x in cookie_with(text())) {
            prop_assert_eq!(x.merge(&x), x);
        }

        #[test]
        fn test_legal_notice_merge_idempotent(x in legal_notice_with(text())) {
            prop_assert_eq!(x.merge(&x), x);
        }

        #[test]
        fn test_data_protection_merge_idempotent(x in data_protection_with(text())) {
            prop_assert_eq!(x.merge(&x), x);
        }

        /// Property: the empty value is a left and right identity
        #[test]
        fn test_privacy_empty_is_identity(x in privacy_with(text())) {
            prop_assert_eq!(PrivacyDetails::default().merge(&x), x.clone());
            prop_assert_eq!(x.merge(&PrivacyDetails::default()), x);
        }

        /// Property: union/max/boolean fields do not depend on chunk order
        ///
        /// Scalar text is held empty here; lists are compared as sets since
        /// their order records first appearance.
        #[test]
        fn test_privacy_order_insensitive(
            a in privacy_with(Just(String::new())),
            b in privacy_with(Just(String::new())),
            c in privacy_with(Just(String::new())),
        ) {
            let abc = a.merge(&b).merge(&c);
            let acb = a.merge(&c).merge(&b);
            prop_assert_eq!(abc.transfer_scope, acb.transfer_scope);
            prop_assert_eq!(&abc.rights, &acb.rights);
            prop_assert_eq!(abc.rights_general_statement, acb.rights_general_statement);
            prop_assert_eq!(abc.automated_decisions, acb.automated_decisions);
            prop_assert_eq!(as_set(&abc.purposes), as_set(&acb.purposes));
            prop_assert_eq!(as_set(&abc.legal_bases), as_set(&acb.legal_bases));
            prop_assert_eq!(as_set(&abc.recipients), as_set(&acb.recipients));
        }

        #[test]
        fn test_cookie_order_insensitive(
            a in cookie_with(Just(String::new())),
            b in cookie_with(Just(String::new())),
            c in cookie_with(Just(String::new())),
        ) {
            let abc = a.merge(&b).merge(&c);
            let acb = a.merge(&c).merge(&b);
            prop_assert_eq!(abc.ownership, acb.ownership);
            prop_assert_eq!(&abc.duration, &acb.duration);
            prop_assert_eq!(abc.mgmt_instructions, acb.mgmt_instructions);
            prop_assert_eq!(as_set(&abc.third_parties), as_set(&acb.third_parties));
            prop_assert_eq!(as_set(&abc.types), as_set(&acb.types));
            prop_assert_eq!(as_set(&abc.purpose), as_set(&acb.purpose));
        }

        #[test]
        fn test_data_protection_order_insensitive(
            a in data_protection_with(Just(String::new())),
            b in data_protection_with(Just(String::new())),
            c in data_protection_with(Just(String::new())),
        ) {
            let abc = a.merge(&b).merge(&c);
            let acb = a.merge(&c).merge(&b);
            prop_assert_eq!(abc.transfer_scope, acb.transfer_scope);
            prop_assert_eq!(&abc.rights, &acb.rights);
            prop_assert_eq!(abc.complaint_authority, acb.complaint_authority);
            prop_assert_eq!(abc.automated_decisions, acb.automated_decisions);
            prop_assert_eq!(as_set(&abc.recipients), as_set(&acb.recipients));
        }

        /// Property: a fact stated by any chunk survives every later merge
        #[test]
        fn test_affirmed_rights_are_never_retracted(a in rights(), b in rights()) {
            let merged = a.merge(&b);
            if a.access == Some(true) || b.access == Some(true) {
                prop_assert_eq!(merged.access, Some(true));
            }
            if a.erasure == Some(true) || b.erasure == Some(true) {
                prop_assert_eq!(merged.erasure, Some(true));
            }
        }
    }
}
