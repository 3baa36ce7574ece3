//! Prompt construction for document audits

use crate::schema::{fields, response_schema};
use crate::types::Prompt;
use polaudit_domain::DocType;

/// Language the prompt is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptLanguage {
    /// Spanish instructions and field definitions
    Spanish,
    /// English instructions and field definitions
    English,
    /// English field definitions under a jurisdiction-neutral persona
    Other,
}

impl PromptLanguage {
    /// Pick the prompt language for a document language code
    pub fn for_lang(lang: Option<&str>) -> Self {
        let lang = lang.map(|l| l.trim().to_lowercase()).unwrap_or_default();
        if lang.starts_with("es") {
            PromptLanguage::Spanish
        } else if lang.is_empty() || lang.starts_with("en") {
            PromptLanguage::English
        } else {
            PromptLanguage::Other
        }
    }

    fn persona(self) -> &'static str {
        match self {
            PromptLanguage::Spanish => "Eres un auditor experto en RGPD.",
            PromptLanguage::English => "You are a senior GDPR auditor.",
            PromptLanguage::Other => "You are a senior privacy-law auditor.",
        }
    }

    fn instructions(self) -> &'static str {
        match self {
            PromptLanguage::Spanish => {
                "Analiza el documento y responde EXCLUSIVAMENTE con un objeto JSON cuya clave \
                 `details` contenga los campos indicados abajo, sin comentarios ni bloques markdown. \
                 Usa EXACTAMENTE esas claves y tipos. No uses null para listas u objetos: si el \
                 documento no dice nada, usa [] o {}. Si el documento indica su fecha de última \
                 actualización, devuélvela como `last_update` junto a `details`."
            }
            _ => {
                "Analyse the document and respond EXCLUSIVELY with a JSON object whose `details` \
                 key holds the fields listed below, without comments or markdown fences. Use \
                 EXACTLY those keys and types. Do not use null for lists or objects: if the \
                 document is silent, use [] or {}. If the document states when it was last \
                 revised, return that date as `last_update` next to `details`."
            }
        }
    }

    fn fields_heading(self) -> &'static str {
        match self {
            PromptLanguage::Spanish => "Campos que debes devolver en JSON → details",
            _ => "Fields to return in JSON → details",
        }
    }

    fn content_label(self) -> &'static str {
        match self {
            PromptLanguage::Spanish => "# CONTENIDO DEL DOCUMENTO ↓",
            _ => "# DOCUMENT CONTENT ↓",
        }
    }
}

/// Builds the extraction prompt for one chunk
pub struct PromptBuilder<'a> {
    doc_type: DocType,
    chunk: &'a str,
    language: PromptLanguage,
    jurisdiction_hint: &'a str,
    max_chars: usize,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(doc_type: DocType, chunk: &'a str) -> Self {
        Self {
            doc_type,
            chunk,
            language: PromptLanguage::English,
            jurisdiction_hint: "",
            max_chars: 10_000,
        }
    }

    /// Write the prompt for a document in `lang`
    pub fn with_language(mut self, lang: Option<&str>) -> Self {
        self.language = PromptLanguage::for_lang(lang);
        self
    }

    /// Add the jurisdiction hint under the persona line
    pub fn with_jurisdiction_hint(mut self, hint: &'a str) -> Self {
        self.jurisdiction_hint = hint;
        self
    }

    /// Cap the chunk text at `max_chars` characters
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> Prompt {
        let language = self.language;
        let mut text = String::new();

        text.push_str(language.persona());
        let hint = self.jurisdiction_hint.trim();
        if !hint.is_empty() {
            text.push('\n');
            text.push_str(hint);
        }
        text.push('\n');
        text.push_str(language.instructions());
        text.push_str("\n\n");

        text.push_str(&field_definitions(self.doc_type, language));
        text.push_str("\n\n");

        text.push_str(language.content_label());
        text.push('\n');
        text.push_str(truncate_chars(self.chunk, self.max_chars));

        Prompt {
            text,
            schema: response_schema(self.doc_type),
            doc_type: self.doc_type,
        }
    }
}

/// At most `max` characters of `s`, cut on a character boundary
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// The `"field": "definition"` block for `doc_type`
fn field_definitions(doc_type: DocType, language: PromptLanguage) -> String {
    let lines: Vec<String> = fields(doc_type)
        .iter()
        .map(|f| format!("  \"{}\": \"{}\"", f.name, describe(f.name, language)))
        .collect();
    format!("{}\n{{\n{}\n}}", language.fields_heading(), lines.join(",\n"))
}

fn describe(field: &str, language: PromptLanguage) -> &'static str {
    match language {
        PromptLanguage::Spanish => describe_es(field),
        _ => describe_en(field),
    }
}

fn describe_en(field: &str) -> &'static str {
    match field {
        "controller" => "Full or legal name of the entity responsible for the processing.",
        "dpo_contact" => "Email, phone or contact form of the Data Protection Officer or privacy contact point. Empty if none is given.",
        "purposes" => "List of the specific purposes the data is processed for (e.g. 'user management', 'newsletters', 'service improvement').",
        "legal_bases" => "List of the legal bases for the processing, worded as in the document (e.g. 'consent', 'contract', 'legal obligation', 'legitimate interest', 'public task').",
        "source_of_data" => "Where the data comes from when it is not collected from the data subject (e.g. 'public directories'). Empty if not mentioned.",
        "retention" => "Retention period or criterion (e.g. '5 years', 'until consent is withdrawn', 'statutory periods').",
        "recipients" => "List of companies, service categories or authorities the data is disclosed or transferred to.",
        "transfer_scope" => "Geographic scope of transfers: 'NONE' (no transfers mentioned), 'INTRA_EU' (within the EU/EEA only), 'INTERNATIONAL' (outside the EEA), or null if unclear.",
        "rights" => "Object with one boolean per data-subject right (access, rectification, erasure, opposition, portability, restriction, no_individual_decision). true when the document names the right and says how to exercise it (form, e-office, post, email, phone or a generic request wording), null otherwise.",
        "rights_general_statement" => "true when the rights are only mentioned as a block without listing them, null otherwise.",
        "automated_decisions" => "Boolean: whether profiling or solely automated decisions with legal or similarly significant effects are mentioned.",
        "ownership" => "Who sets the cookies: 'FIRST' (first-party only), 'THIRD' (third-party only), 'MIXED' (both), or null.",
        "third_parties" => "List of named third-party providers whose cookies are used (e.g. 'Google Analytics', 'Meta Pixel').",
        "types" => "List of cookie categories (e.g. 'technical', 'analytics', 'advertising', 'preferences').",
        "purpose" => "List of the stated purposes of the cookies (e.g. 'audience measurement', 'personalised ads').",
        "duration" => "Predominant cookie lifetime: {\"session\": bool|null, \"persistent\": bool|null, \"max_exp\": text such as '30d' or '1y', null if unknown}.",
        "consent_mechanism" => "How consent is obtained: 'banner', 'cmp' (consent management platform), 'scroll', or 'none'.",
        "mgmt_instructions" => "Boolean: whether instructions to manage or disable cookies are given (browser settings, preferences panel).",
        "owner" => "Name of the company, person or body that owns the website.",
        "contact" => "General contact details of the owner (email, phone).",
        "ip_notice" => "Boolean: whether an intellectual property or copyright notice is included.",
        "liability_clause" => "Boolean: whether a disclaimer or limitation of liability clause is included.",
        "applicable_law" => "Legislation governing the notice and, if stated, the competent courts.",
        "complaint_authority" => "Boolean: whether the right to complain to a supervisory authority is stated explicitly.",
        _ => "",
    }
}

fn describe_es(field: &str) -> &'static str {
    match field {
        "controller" => "Nombre o razón social de la entidad responsable del tratamiento.",
        "dpo_contact" => "Correo, teléfono o formulario del Delegado de Protección de Datos o del punto de contacto de privacidad. Vacío si no existe.",
        "purposes" => "Lista de las finalidades concretas del tratamiento (ej. 'gestión de usuarios', 'envío de boletines', 'mejora del servicio').",
        "legal_bases" => "Lista literal de las bases jurídicas del tratamiento (ej. 'consentimiento', 'ejecución de un contrato', 'obligación legal', 'interés legítimo', 'misión de interés público').",
        "source_of_data" => "Procedencia de los datos cuando no se obtienen del interesado (ej. 'directorios públicos'). Vacío si no se menciona.",
        "retention" => "Plazo o criterio de conservación (ej. '5 años', 'hasta la revocación del consentimiento', 'plazos legales').",
        "recipients" => "Lista de empresas, categorías de servicios o autoridades a las que se ceden o transfieren los datos.",
        "transfer_scope" => "Ámbito geográfico de las transferencias: 'NONE' (no se mencionan), 'INTRA_EU' (solo UE/EEE), 'INTERNATIONAL' (fuera del EEE) o null si no está claro.",
        "rights" => "Objeto con un booleano por derecho (access, rectification, erasure, opposition, portability, restriction, no_individual_decision). true si el documento nombra el derecho e indica cómo ejercerlo (formulario, sede electrónica, correo postal o electrónico, teléfono o una expresión genérica), null en otro caso.",
        "rights_general_statement" => "true si los derechos solo se mencionan en bloque sin enumerarlos, null en otro caso.",
        "automated_decisions" => "Booleano: si se mencionan perfiles o decisiones basadas únicamente en tratamiento automatizado con efectos jurídicos o significativos.",
        "ownership" => "Titular de las cookies: 'FIRST' (solo propias), 'THIRD' (solo de terceros), 'MIXED' (ambas) o null.",
        "third_parties" => "Lista de proveedores terceros cuyas cookies se usan (ej. 'Google Analytics', 'Meta Pixel').",
        "types" => "Lista de categorías de cookies (ej. 'técnica', 'analítica', 'publicitaria', 'personalización').",
        "purpose" => "Lista de las finalidades declaradas de las cookies (ej. 'medición de audiencia', 'publicidad personalizada').",
        "duration" => "Duración predominante: {\"session\": bool|null, \"persistent\": bool|null, \"max_exp\": texto como '30d' o '1y', null si se desconoce}.",
        "consent_mechanism" => "Cómo se obtiene el consentimiento: 'banner', 'cmp' (plataforma de gestión del consentimiento), 'scroll' o 'none'.",
        "mgmt_instructions" => "Booleano: si se dan instrucciones para gestionar o desactivar las cookies (navegador, panel de preferencias).",
        "owner" => "Nombre de la empresa, persona u organismo titular del sitio web.",
        "contact" => "Datos de contacto generales del titular (correo, teléfono).",
        "ip_notice" => "Booleano: si se incluye un aviso de propiedad intelectual o derechos de autor.",
        "liability_clause" => "Booleano: si existe una cláusula de exención o limitación de responsabilidad.",
        "applicable_law" => "Legislación aplicable al aviso y, si se indican, los tribunales competentes.",
        "complaint_authority" => "Booleano: si se menciona expresamente el derecho a reclamar ante una autoridad de control (ej. AEPD).",
        _ => "",
    }
}
