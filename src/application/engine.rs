use crate::domain::document::XmlDocument;
use crate::domain::message::{Message, MessageId};
use crate::domain::ports::{BuilderFactory, DocumentBuilderBox, DocumentValidatorBox};
use crate::domain::release::SchemaRelease;
use crate::domain::validation::ValidationErrorSet;
use crate::infrastructure::user_context::UserContext;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tracing::debug;

/// A message processing engine.
///
/// Engines are shared between all users and may be called concurrently, so
/// anything they keep must live in the [`UserContext`] they are handed.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Informs the engine that a user has started a session.
    async fn start_session(&self, _context: &UserContext) {}

    /// Informs the engine that a user has ended a session.
    async fn end_session(&self, _context: &UserContext) {}

    /// Processes one inbound message and returns the reply, if any.
    ///
    /// Problems with the message itself are reported inside the reply,
    /// never as a failure of this call.
    async fn process(&self, context: &UserContext, message: &Message) -> Option<Message>;
}

pub type EngineBox = Box<dyn Engine>;

/// Identifiers stamped on every document a [`ValidationEngine`] produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub service_name: String,
    pub sender: String,
    pub message_id_scheme: String,
    pub address_scheme: String,
    pub default_release: SchemaRelease,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            service_name: "FpMLWebServices".to_string(),
            sender: "FpMLWebServiceDemo".to_string(),
            message_id_scheme: "urn:handcoded:message-id".to_string(),
            address_scheme: "urn:handcoded:message-address".to_string(),
            default_release: SchemaRelease::default(),
        }
    }
}

/// Engine that validates submitted FpML documents.
///
/// Every submission gets exactly one reply: a `serviceNotification` with an
/// advisory when the document is valid, or a `messageRejected` listing one
/// `reason` per lexical or semantic error. A session start queues a
/// "service available" notification.
pub struct ValidationEngine {
    settings: EngineSettings,
    validator: DocumentValidatorBox,
    builders: BuilderFactory,
}

impl ValidationEngine {
    /// Creates an engine from its collaborators.
    ///
    /// # Arguments
    ///
    /// * `settings` - Identifiers and the fallback release.
    /// * `validator` - Parses and checks inbound documents.
    /// * `builders` - Creates a builder for each outbound document.
    pub fn new(
        settings: EngineSettings,
        validator: DocumentValidatorBox,
        builders: BuilderFactory,
    ) -> Self {
        Self {
            settings,
            validator,
            builders,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn notification_payload(&self, context: &UserContext) -> String {
        let mut builder = self.begin_message(
            &self.settings.default_release,
            "serviceNotification",
            context,
            None,
        );
        builder.append_element_and_text("serviceName", &self.settings.service_name);
        builder.append_element_and_text("status", "Available");
        builder.serialize()
    }

    fn accepted_payload(
        &self,
        release: &SchemaRelease,
        context: &UserContext,
        document: &XmlDocument,
    ) -> String {
        let mut builder =
            self.begin_message(release, "serviceNotification", context, Some(document));
        builder.append_element_and_text("serviceName", &self.settings.service_name);
        builder.append_element("advisory");
        builder.append_element_and_text("category", "Rules");
        builder.append_element_and_text("description", "Message was accepted");
        builder.close_element();
        builder.serialize()
    }

    fn rejected_payload(
        &self,
        release: &SchemaRelease,
        context: &UserContext,
        document: Option<&XmlDocument>,
        errors: &ValidationErrorSet,
    ) -> String {
        let mut builder = self.begin_message(release, "messageRejected", context, document);
        for error in errors {
            builder.append_element("reason");
            builder.append_element_and_text("reasonCode", &error.code);
            builder.append_element("location");
            builder.set_attribute("locationType", error.location.location_type());
            builder.append_text(&error.location.to_string());
            builder.close_element();
            if let Some(description) = &error.description {
                builder.append_element_and_text("description", description);
            }
            if let Some(rule_id) = &error.rule_id {
                builder.append_element_and_text("validationRuleId", rule_id);
            }
            if let Some(data) = &error.additional_data {
                builder.append_element("additionalData");
                builder.append_element_and_text("string", data);
                builder.close_element();
            }
            builder.close_element();
        }
        builder.serialize()
    }

    /// Starts a reply document and writes its header, copying the inbound
    /// `messageId` into `inReplyTo` when there is one.
    fn begin_message(
        &self,
        release: &SchemaRelease,
        root: &str,
        context: &UserContext,
        document: Option<&XmlDocument>,
    ) -> DocumentBuilderBox {
        let mut builder = (self.builders)(release, root);
        builder.append_element("header");

        builder.append_element("messageId");
        builder.set_attribute("messageIdScheme", &self.settings.message_id_scheme);
        builder.append_text(&MessageId::new().to_string());
        builder.close_element();

        if let Some(message_id) =
            document.and_then(|document| document.root().find(&["header", "messageId"]))
        {
            builder.append_element("inReplyTo");
            if let Some(scheme) = message_id.attribute("messageIdScheme") {
                builder.set_attribute("messageIdScheme", scheme);
            }
            builder.append_text(message_id.text());
            builder.close_element();
        }

        builder.append_element("sentBy");
        builder.set_attribute("messageAddressScheme", &self.settings.address_scheme);
        builder.append_text(&self.settings.sender);
        builder.close_element();

        builder.append_element("sendTo");
        builder.set_attribute("messageAddressScheme", &self.settings.address_scheme);
        builder.append_text(context.username());
        builder.close_element();

        builder.append_element_and_text(
            "creationTimestamp",
            &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        builder.close_element();
        builder
    }
}

#[async_trait]
impl Engine for ValidationEngine {
    async fn start_session(&self, context: &UserContext) {
        let notification = Message::new(self.notification_payload(context));
        context.notifications().enqueue(notification).await;
    }

    async fn process(&self, context: &UserContext, message: &Message) -> Option<Message> {
        let payload = match self.validator.parse(message.payload()) {
            Ok(document) => {
                let release = self
                    .validator
                    .release_for(&document)
                    .unwrap_or_else(|| self.settings.default_release.clone());
                let errors = self.validator.validate(&document, &release);
                if errors.is_empty() {
                    debug!(message_id = %message.id(), %release, "message accepted");
                    self.accepted_payload(&release, context, &document)
                } else {
                    debug!(message_id = %message.id(), %release, errors = errors.len(), "message failed validation");
                    self.rejected_payload(&release, context, Some(&document), &errors)
                }
            }
            Err(errors) => {
                debug!(message_id = %message.id(), errors = errors.len(), "message is not well-formed");
                self.rejected_payload(&self.settings.default_release, context, None, &errors)
            }
        };
        Some(message.reply(payload))
    }
}
