//! Jurisdiction inference from the document host

use crate::prompt::PromptLanguage;
use polaudit_domain::{Jurisdiction, JurisdictionAdvisor};
use url::Url;

/// Code used when no rule matches
pub const GENERIC: &str = "GEN";

/// Public-sector host suffixes and the jurisdiction they imply
const HOST_RULES: &[(&str, &str)] = &[
    ("gov.uk", "UK"),
    ("gov.au", "AU"),
    ("gob.mx", "MX"),
    ("gob.cl", "CL"),
    ("gov.za", "ZA"),
    ("gov.in", "IN"),
    ("nic.in", "IN"),
];

/// Jurisdiction code for `url`, [`GENERIC`] when the host matches no rule
pub fn infer_code(url: &str) -> &'static str {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
    else {
        return GENERIC;
    };

    HOST_RULES
        .iter()
        .find(|(suffix, _)| {
            host == *suffix
                || host
                    .strip_suffix(suffix)
                    .is_some_and(|rest| rest.ends_with('.'))
        })
        .map_or(GENERIC, |(_, code)| *code)
}

/// Prompt hint for a jurisdiction, empty for [`GENERIC`]
pub fn hint(code: &str, language: PromptLanguage) -> &'static str {
    match language {
        PromptLanguage::Spanish => hint_es(code),
        _ => hint_en(code),
    }
}

fn hint_en(code: &str) -> &'static str {
    match code {
        "UK" => "Apply UK GDPR and the Data Protection Act 2018; cookies fall under PECR. Rights include access, rectification, erasure, restriction, portability, objection and limits on automated decisions. The ICO is the regulator.",
        "AU" => "Apply the Privacy Act 1988 (APPs). Expect access (APP 12) and correction (APP 13); cross-border disclosure under APP 8; complaints to the OAIC.",
        "MX" => "Apply the LGPDPPSO (public sector). Look for the Privacy Notice and ARCO rights (access, rectification, cancellation, opposition) with how to exercise them.",
        "CL" => "Apply Law 19.628, with Law 21.719 phasing in. Expect controller, purposes, disclosures, ARCO rights plus portability and blocking.",
        "ZA" => "Apply POPIA. Treat the Information Officer as the DPO contact; cross-border transfers fall under section 72; complaints go to the Information Regulator.",
        "IN" => "Apply the DPDP Act 2023. Look for the Data Fiduciary or Grievance Officer, rights of access, correction and erasure, and complaints to the Data Protection Board.",
        _ => "",
    }
}

fn hint_es(code: &str) -> &'static str {
    match code {
        "UK" => "Marco: UK GDPR y Data Protection Act 2018; cookies bajo PECR. Derechos: acceso, rectificación, supresión, limitación, portabilidad, oposición y límites a decisiones automatizadas. Autoridad: ICO.",
        "AU" => "Marco: Privacy Act 1988 (APPs). Derechos típicos: acceso (APP 12) y corrección (APP 13); transferencias bajo APP 8; reclamaciones ante la OAIC.",
        "MX" => "Marco: LGPDPPSO (sector público). Busca el Aviso de Privacidad y los derechos ARCO (acceso, rectificación, cancelación, oposición) y cómo ejercerlos.",
        "CL" => "Marco: Ley 19.628, con la Ley 21.719 en transición. Fíjate en responsable, finalidades, cesiones, derechos ARCO más portabilidad y bloqueo.",
        "ZA" => "Marco: POPIA. El Information Officer es el contacto de protección de datos; transferencias bajo la sección 72; quejas ante el Information Regulator.",
        "IN" => "Marco: DPDP Act 2023. Busca el Data Fiduciary o Grievance Officer, derechos de acceso, corrección y supresión, y quejas ante el Data Protection Board.",
        _ => "",
    }
}

/// Advisor that infers the jurisdiction from public-sector host suffixes
#[derive(Debug, Clone, Copy, Default)]
pub struct HostJurisdictionAdvisor;

impl JurisdictionAdvisor for HostJurisdictionAdvisor {
    fn advise(&self, url: &str, lang: Option<&str>) -> Jurisdiction {
        let code = infer_code(url);
        Jurisdiction {
            code: code.to_string(),
            hint: hint(code, PromptLanguage::for_lang(lang)).to_string(),
        }
    }
}
