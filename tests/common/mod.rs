#![allow(dead_code)]

use fpml_courier::application::engine::{EngineSettings, ValidationEngine};
use fpml_courier::application::service::MessagingService;
use fpml_courier::infrastructure::user_context::UserRegistry;
use fpml_courier::infrastructure::xml::{XmlBuilder, XmlValidator};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const VALID_CONFIRMATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<requestConfirmation xmlns="http://www.fpml.org/FpML-5/confirmation" fpmlVersion="5-9">
  <header>
    <messageId messageIdScheme="http://www.partya.com/coding-scheme/message-id">MSG-0001</messageId>
    <sentBy>PARTYA</sentBy>
    <sendTo>SERVICE</sendTo>
    <creationTimestamp>2016-03-01T09:15:00Z</creationTimestamp>
  </header>
  <isCorrection>false</isCorrection>
  <trade>
    <tradeHeader>
      <partyTradeIdentifier>
        <partyReference href="party1"/>
        <tradeId tradeIdScheme="http://www.partya.com/coding-scheme/trade-id">TRADE-42</tradeId>
      </partyTradeIdentifier>
      <tradeDate>2016-02-29</tradeDate>
    </tradeHeader>
    <notional>
      <currency>USD</currency>
      <amount>1000000.00</amount>
    </notional>
  </trade>
  <party id="party1">
    <partyId>PARTYA</partyId>
  </party>
</requestConfirmation>
"#;

/// Well-formed, but the trade refers to a party that is not in the message.
pub const DANGLING_REFERENCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<requestConfirmation xmlns="http://www.fpml.org/FpML-5/confirmation" fpmlVersion="5-9">
  <header>
    <messageId messageIdScheme="http://www.partya.com/coding-scheme/message-id">MSG-0002</messageId>
    <sentBy>PARTYA</sentBy>
  </header>
  <trade>
    <tradeHeader>
      <partyTradeIdentifier>
        <partyReference href="party2"/>
      </partyTradeIdentifier>
    </tradeHeader>
  </trade>
  <party id="party1"/>
</requestConfirmation>
"#;

/// The header element is never closed.
pub const UNCLOSED_TAG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<requestConfirmation xmlns="http://www.fpml.org/FpML-5/confirmation" fpmlVersion="5-9">
  <header>
    <messageId messageIdScheme="urn:test">MSG-0003</messageId>
</requestConfirmation>
"#;

pub fn validation_engine() -> ValidationEngine {
    ValidationEngine::new(
        EngineSettings::default(),
        Box::new(XmlValidator::new()),
        XmlBuilder::factory(),
    )
}

pub fn validation_service() -> MessagingService {
    let engine = Arc::new(validation_engine());
    MessagingService::new(engine, Arc::new(UserRegistry::new()))
}

pub fn write_document(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("Failed to write test document");
    path
}
