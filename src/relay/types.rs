use crate::relay::error::DispatchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Language tag of a pre-approved template, eg. "en_US" or "pt_BR".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateLanguage {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContent {
    pub name: String,
    pub language: TemplateLanguage,

    /// Opaque component blocks, forwarded upstream verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Value>>,
}

/// The full template payload the upstream messaging API expects.
/// `messaging_product` and `type` are fixed discriminators, so they are
/// filled in whenever the caller leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateEnvelope {
    #[serde(default = "default_messaging_product")]
    pub messaging_product: String,

    pub to: String,

    #[serde(rename = "type", default = "default_message_type")]
    pub kind: String,

    pub template: TemplateContent,
}
impl TemplateEnvelope {
    /// Builds the envelope for callers that only supply a template name and
    /// language code instead of the full payload.
    pub fn from_parts(name: &str, language_code: &str, to: &str) -> Self {
        Self {
            messaging_product: default_messaging_product(),
            to: to.to_string(),
            kind: default_message_type(),
            template: TemplateContent {
                name: name.to_string(),
                language: TemplateLanguage {
                    code: language_code.to_string(),
                },
                components: None,
            },
        }
    }
}

fn default_messaging_product() -> String {
    "whatsapp".to_string()
}
fn default_message_type() -> String {
    "template".to_string()
}

/// Contact record sent to the upstream `createContact` operation. Field
/// names follow the upstream wire format, `cpf` being the tax id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default)]
    pub number: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,

    /// Free-form date string, forwarded as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_key: Option<String>,
}

/// Inbound request body. The template is given either as a complete
/// `templateData` envelope or as a `(templateName, languageCode)` pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTemplateRequest {
    pub number: String,

    #[serde(default)]
    pub is_closed: bool,

    #[serde(default)]
    pub template_data: Option<TemplateEnvelope>,

    #[serde(default)]
    pub template_name: Option<String>,

    #[serde(default)]
    pub language_code: Option<String>,

    #[serde(default)]
    pub contact: Option<Contact>,
}
impl SendTemplateRequest {
    /// Resolves the either/or template input into a single canonical
    /// request, so the dispatch path never has to re-check which shape
    /// the caller used.
    pub fn resolve(self) -> Result<DispatchRequest, DispatchError> {
        let number = self.number.trim().to_string();
        if number.is_empty() {
            return Err(DispatchError::Validation(
                "destination number must not be empty".to_string(),
            ));
        }

        let envelope = match (self.template_data, self.template_name, self.language_code) {
            (Some(envelope), _, _) => envelope,
            (None, Some(name), Some(code)) => TemplateEnvelope::from_parts(&name, &code, &number),
            _ => {
                return Err(DispatchError::Validation(
                    "either templateData or both templateName and languageCode are required"
                        .to_string(),
                ))
            }
        };

        if envelope.template.name.trim().is_empty() {
            return Err(DispatchError::Validation(
                "template name must not be empty".to_string(),
            ));
        }
        if envelope.template.language.code.trim().is_empty() {
            return Err(DispatchError::Validation(
                "template language code must not be empty".to_string(),
            ));
        }

        Ok(DispatchRequest {
            number,
            is_closed: self.is_closed,
            envelope,
            contact: self.contact,
        })
    }
}

/// Canonical request handed to the dispatcher after boundary resolution.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub number: String,
    pub is_closed: bool,
    pub envelope: TemplateEnvelope,
    pub contact: Option<Contact>,
}

/// The three upstream operations, in call order. The serialized name
/// doubles as the upstream URL path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchStep {
    #[serde(rename = "showcontact")]
    ShowContact,

    #[serde(rename = "createContact")]
    CreateContact,

    #[serde(rename = "template")]
    Template,
}
impl DispatchStep {
    pub fn path(self) -> &'static str {
        match self {
            DispatchStep::ShowContact => "showcontact",
            DispatchStep::CreateContact => "createContact",
            DispatchStep::Template => "template",
        }
    }
}

/// One upstream call that actually got a response. Calls that die on the
/// network never produce a record.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: DispatchStep,
    pub status: u16,
    pub response: CapturedBody,
}

/// Ordered audit trail of the upstream calls made for one request.
#[derive(Debug, Serialize)]
pub struct DispatchReport {
    pub steps: Vec<StepRecord>,
}

/// Best-effort capture of an upstream response body: parsed JSON when the
/// body is valid JSON, otherwise the raw text truncated to a sane length.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CapturedBody {
    Json(Value),
    Text { text: String },
}
impl CapturedBody {
    const TEXT_LIMIT: usize = 1000;

    pub fn from_raw(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => CapturedBody::Json(value),
            Err(_) => CapturedBody::Text {
                text: raw.chars().take(Self::TEXT_LIMIT).collect(),
            },
        }
    }
}

pub(crate) mod wire {
    use super::TemplateEnvelope;
    use serde::Serialize;

    /// Body for the upstream `showcontact` lookup.
    #[derive(Serialize)]
    pub struct ContactLookupBody<'a> {
        pub number: &'a str,
    }

    /// Body for the upstream `template` send.
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TemplateSendBody<'a> {
        pub number: &'a str,
        pub is_closed: bool,
        pub template_data: &'a TemplateEnvelope,
    }
}

#[cfg(test)]
mod resolve_tests {
    use super::*;
    use serde_json::json;

    fn base_request() -> SendTemplateRequest {
        SendTemplateRequest {
            number: "5511999998888".to_string(),
            is_closed: false,
            template_data: None,
            template_name: None,
            language_code: None,
            contact: None,
        }
    }

    #[test]
    fn derives_envelope_from_name_and_code() {
        let mut request = base_request();
        request.number = " 5511999998888 ".to_string();
        request.template_name = Some("hello_world".to_string());
        request.language_code = Some("en_US".to_string());

        let resolved = request.resolve().unwrap();
        assert_eq!(resolved.number, "5511999998888");
        assert_eq!(resolved.envelope.to, "5511999998888");
        assert_eq!(resolved.envelope.messaging_product, "whatsapp");
        assert_eq!(resolved.envelope.kind, "template");
        assert_eq!(resolved.envelope.template.name, "hello_world");
        assert_eq!(resolved.envelope.template.language.code, "en_US");
    }

    #[test]
    fn full_envelope_is_passed_through() {
        let mut request = base_request();
        request.template_data = Some(TemplateEnvelope::from_parts(
            "order_update",
            "pt_BR",
            "5511999998888",
        ));

        // The explicit envelope wins over any loose pair.
        request.template_name = Some("ignored".to_string());
        request.language_code = Some("ignored".to_string());

        let resolved = request.resolve().unwrap();
        assert_eq!(resolved.envelope.template.name, "order_update");
        assert_eq!(resolved.envelope.template.language.code, "pt_BR");
    }

    #[test]
    fn rejects_unresolvable_template() {
        assert!(matches!(
            base_request().resolve(),
            Err(DispatchError::Validation(_))
        ));

        let mut partial = base_request();
        partial.template_name = Some("hello_world".to_string());
        assert!(matches!(
            partial.resolve(),
            Err(DispatchError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_number_and_empty_template_fields() {
        let mut request = base_request();
        request.number = "   ".to_string();
        request.template_name = Some("hello_world".to_string());
        request.language_code = Some("en_US".to_string());
        assert!(matches!(
            request.resolve(),
            Err(DispatchError::Validation(_))
        ));

        let mut request = base_request();
        request.template_name = Some("hello_world".to_string());
        request.language_code = Some(" ".to_string());
        assert!(matches!(
            request.resolve(),
            Err(DispatchError::Validation(_))
        ));
    }

    #[test]
    fn deserializes_original_wire_shape() {
        let request: SendTemplateRequest = serde_json::from_value(json!({
            "number": "5511999998888",
            "isClosed": true,
            "templateData": {
                "messaging_product": "whatsapp",
                "to": "5511999998888",
                "type": "template",
                "template": {
                    "name": "hello_world",
                    "language": { "code": "en_US" }
                }
            },
            "contact": {}
        }))
        .unwrap();

        assert!(request.is_closed);
        assert!(request.contact.is_some());

        let resolved = request.resolve().unwrap();
        assert_eq!(resolved.envelope.template.name, "hello_world");
    }

    #[test]
    fn envelope_discriminators_are_defaulted() {
        let envelope: TemplateEnvelope = serde_json::from_value(json!({
            "to": "5511999998888",
            "template": {
                "name": "hello_world",
                "language": { "code": "en_US" }
            }
        }))
        .unwrap();

        assert_eq!(envelope.messaging_product, "whatsapp");
        assert_eq!(envelope.kind, "template");
    }
}
