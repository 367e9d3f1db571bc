use std::sync::Arc;

use reeltitle_core::GatewayError;
use regex::Regex;
use tracing::{info, warn};

use crate::llm::{ChatMessage, CompletionGateway, TITLE_TEMPERATURE};
use crate::prompts::{title_system_prompt, SCOPE_REMINDER_REPLY, TITLES_POSTSCRIPT, TITLES_PREAMBLE};

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub content: String,
    pub is_regeneration: bool,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn titles(content: impl Into<String>, is_regeneration: bool) -> Self {
        Self { content: content.into(), is_regeneration, temperature: TITLE_TEMPERATURE }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(title_system_prompt(self.is_regeneration)),
            ChatMessage::user(self.content.clone()),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TitleOutcome {
    /// Trimmed model output that passed the numbered-list gate.
    Accepted(String),
    Rejected,
}

impl TitleOutcome {
    pub fn into_reply(self) -> String {
        match self {
            Self::Accepted(titles) => format!("{TITLES_PREAMBLE}\n\n{titles}\n\n{TITLES_POSTSCRIPT}"),
            Self::Rejected => SCOPE_REMINDER_REPLY.to_string(),
        }
    }
}

/// At least one line of the output must start with `1.`..`5.`. CRLF mode lets `^` match
/// after a lone `\r` as well as after `\n`.
pub const ACCEPTANCE_PATTERN: &str = r"(?mR)^[1-5]\.";

#[derive(Clone, Debug)]
pub struct AcceptanceGate {
    pattern: Regex,
}

impl AcceptanceGate {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self { pattern: Regex::new(ACCEPTANCE_PATTERN)? })
    }

    pub fn evaluate(&self, raw: &str) -> TitleOutcome {
        let trimmed = raw.trim();
        if self.pattern.is_match(trimmed) {
            TitleOutcome::Accepted(trimmed.to_string())
        } else {
            TitleOutcome::Rejected
        }
    }
}

pub struct TitleGenerationService {
    gateway: Arc<dyn CompletionGateway>,
    gate: AcceptanceGate,
}

impl TitleGenerationService {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Result<Self, regex::Error> {
        Ok(Self { gateway, gate: AcceptanceGate::new()? })
    }

    /// One gateway call; a gateway failure is returned to the caller untouched.
    pub async fn generate(&self, content: &str, is_regeneration: bool) -> Result<String, GatewayError> {
        let request = GenerationRequest::titles(content, is_regeneration);
        let raw = self.gateway.complete(&request.messages(), request.temperature).await?;

        let outcome = self.gate.evaluate(&raw);
        match &outcome {
            TitleOutcome::Accepted(_) => info!(
                event_name = "titles.generated",
                is_regeneration,
                "title candidates accepted"
            ),
            TitleOutcome::Rejected => warn!(
                event_name = "titles.rejected",
                is_regeneration,
                output_chars = raw.chars().count(),
                "model output failed the numbered-list gate; sending scope reminder"
            ),
        }
        Ok(outcome.into_reply())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reeltitle_core::GatewayError;

    use super::{AcceptanceGate, GenerationRequest, TitleGenerationService, TitleOutcome};
    use crate::prompts::{
        REGENERATE_ADDENDUM, SCOPE_REMINDER_REPLY, TITLES_POSTSCRIPT, TITLES_PREAMBLE,
    };
    use crate::testing::ScriptedGateway;

    const FIVE_TITLES: &str = "1. 理財的關鍵不是收入而是紀律\n2. 存不到錢，問題可能不在薪水\n3. 你的預算真的有在幫你嗎？\n4. 月底總是透支的三個原因\n5. 三步驟建立穩定的理財習慣";

    fn gate() -> AcceptanceGate {
        AcceptanceGate::new().expect("acceptance pattern compiles")
    }

    fn service(gateway: Arc<ScriptedGateway>) -> TitleGenerationService {
        TitleGenerationService::new(gateway).expect("acceptance pattern compiles")
    }

    #[test]
    fn request_uses_title_temperature_and_user_content() {
        let request = GenerationRequest::titles("逐字稿內容", false);
        let messages = request.messages();

        assert_eq!(request.temperature, 0.7);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "逐字稿內容");
        assert!(!messages[0].content.contains(REGENERATE_ADDENDUM));
    }

    #[test]
    fn regeneration_request_asks_for_divergence() {
        let messages = GenerationRequest::titles("逐字稿內容", true).messages();
        assert!(messages[0].content.contains(REGENERATE_ADDENDUM));
    }

    #[test]
    fn numbered_output_is_accepted_after_trimming() {
        let outcome = gate().evaluate(&format!("\n\n  {FIVE_TITLES}  \n"));
        assert_eq!(outcome, TitleOutcome::Accepted(FIVE_TITLES.to_string()));
    }

    #[test]
    fn any_numbered_line_passes_the_gate() {
        let outcome = gate().evaluate("以下是標題：\n3. 只有這一行有編號");
        assert!(matches!(outcome, TitleOutcome::Accepted(_)));
    }

    #[test]
    fn unnumbered_or_out_of_range_output_is_rejected() {
        assert_eq!(gate().evaluate("我無法協助這個請求。"), TitleOutcome::Rejected);
        assert_eq!(gate().evaluate("6. 第六個\n0. 第零個"), TitleOutcome::Rejected);
        assert_eq!(gate().evaluate("1) 括號編號"), TitleOutcome::Rejected);
        assert_eq!(gate().evaluate("  - 1. 縮排清單"), TitleOutcome::Rejected);
    }

    #[test]
    fn carriage_return_separated_lines_pass_the_gate() {
        assert!(matches!(gate().evaluate("以下是標題：\r2. 只用 CR 換行"), TitleOutcome::Accepted(_)));
        assert!(matches!(gate().evaluate("以下是標題：\r\n1. CRLF 換行"), TitleOutcome::Accepted(_)));
    }

    #[test]
    fn accepted_reply_wraps_titles_with_preamble_and_postscript() {
        let reply = TitleOutcome::Accepted(FIVE_TITLES.to_string()).into_reply();
        assert!(reply.starts_with(TITLES_PREAMBLE));
        assert!(reply.contains(FIVE_TITLES));
        assert!(reply.ends_with(TITLES_POSTSCRIPT));
    }

    #[tokio::test]
    async fn off_policy_output_is_replaced_by_scope_reminder() {
        let gateway = Arc::new(ScriptedGateway::replying("Sure! Here's a poem about budgets."));
        let reply = service(gateway)
            .generate("budget transcript", false)
            .await
            .expect("gateway succeeded");

        assert_eq!(reply, SCOPE_REMINDER_REPLY);
        assert!(!reply.contains("poem"));
    }

    #[tokio::test]
    async fn generation_calls_gateway_once_at_title_temperature() {
        let gateway = Arc::new(ScriptedGateway::replying(FIVE_TITLES));
        let reply = service(gateway.clone())
            .generate("理財逐字稿", true)
            .await
            .expect("gateway succeeded");

        assert!(reply.contains(FIVE_TITLES));
        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, 0.7);
        assert_eq!(calls[0].user_prompt(), "理財逐字稿");
        assert!(calls[0].system_prompt().contains(REGENERATE_ADDENDUM));
    }

    #[tokio::test]
    async fn gateway_failure_propagates() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let error = service(gateway)
            .generate("content", false)
            .await
            .expect_err("failure should propagate");

        assert!(matches!(error, GatewayError::Request(_)));
    }
}
