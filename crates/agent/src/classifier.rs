//! Intent classification as a strategy chain.
//!
//! Pure [`IntentRule`]s run first in priority order against the lowercased text; the first
//! rule that answers wins. Only when every rule passes does the [`ModelFallback`] spend one
//! zero-temperature completion on a yes/no question. The fallback never fails outward: a
//! gateway error classifies as [`Intent::Unknown`].

use std::fmt;
use std::sync::Arc;

use reeltitle_core::Intent;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, CompletionGateway, CLASSIFY_TEMPERATURE};
use crate::prompts::CLASSIFY_SYSTEM_PROMPT;

// Patterns match requests addressed to the bot, not topic words that can appear inside a
// pasted transcript: these rules outrank the length rule.
pub const TRANSCRIPT_PATTERN: &str = r"逐字稿|怎麼取得|怎麼拿|怎樣拿|怎樣產出|transcript|subtitle";
pub const HELP_PATTERN: &str =
    r"怎麼用|如何使用|使用方式|使用說明|how (do i|to|can i) use|how does (this|it) work";
pub const ABOUT_PATTERN: &str = r"你是誰|誰做的|誰開發|誰寫的|用什麼模型|你怎麼設定|who (are you|made you|built you|created you)|what model";
pub const REGENERATE_PATTERN: &str = r"再給|再來一(批|組|次)|換一批|換一組|重新產|重新生成|不夠好|(不滿意|不喜歡)(這些|這批|這組)|give me another|another (set|batch|round|try)|try again|not good enough|regenerate";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("invalid pattern for rule `{rule}`: {source}")]
    InvalidPattern {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecidedBy {
    Rule(&'static str),
    Model,
    ModelUnavailable,
}

impl fmt::Display for DecidedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(name) => write!(f, "rule:{name}"),
            Self::Model => f.write_str("model"),
            Self::ModelUnavailable => f.write_str("model_unavailable"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub decided_by: DecidedBy,
}

pub trait IntentRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// `normalized` is `raw` lowercased.
    fn evaluate(&self, raw: &str, normalized: &str) -> Option<Intent>;
}

pub struct PatternRule {
    name: &'static str,
    intent: Intent,
    pattern: Regex,
}

impl PatternRule {
    pub fn new(name: &'static str, intent: Intent, pattern: &str) -> Result<Self, ClassifierError> {
        let pattern = Regex::new(pattern)
            .map_err(|source| ClassifierError::InvalidPattern { rule: name, source })?;
        Ok(Self { name, intent, pattern })
    }
}

impl IntentRule for PatternRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn evaluate(&self, _raw: &str, normalized: &str) -> Option<Intent> {
        self.pattern.is_match(normalized).then_some(self.intent)
    }
}

/// Long input is assumed to be transcript content; no model call needed to tell.
pub struct LengthRule {
    threshold: usize,
}

impl LengthRule {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl IntentRule for LengthRule {
    fn name(&self) -> &'static str {
        "long_message"
    }

    fn evaluate(&self, raw: &str, _normalized: &str) -> Option<Intent> {
        (raw.chars().count() > self.threshold).then_some(Intent::GenerateTitle)
    }
}

pub struct ModelFallback {
    gateway: Arc<dyn CompletionGateway>,
}

impl ModelFallback {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { gateway }
    }

    pub async fn classify(&self, raw: &str) -> Classification {
        let messages = [ChatMessage::system(CLASSIFY_SYSTEM_PROMPT), ChatMessage::user(raw)];

        match self.gateway.complete(&messages, CLASSIFY_TEMPERATURE).await {
            Ok(answer) => {
                let intent = if is_affirmative(&answer) {
                    Intent::GenerateTitle
                } else {
                    Intent::Unknown
                };
                debug!(
                    event_name = "classifier.fallback.answered",
                    answer = %answer.trim(),
                    intent = %intent,
                    "model fallback answered"
                );
                Classification { intent, decided_by: DecidedBy::Model }
            }
            Err(error) => {
                warn!(
                    event_name = "classifier.fallback.failed",
                    error = %error,
                    "model fallback failed; classifying as unknown"
                );
                Classification { intent: Intent::Unknown, decided_by: DecidedBy::ModelUnavailable }
            }
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    let answer = answer
        .trim()
        .trim_start_matches(|ch: char| !ch.is_alphanumeric())
        .to_lowercase();
    answer.starts_with("yes") || answer.starts_with('是')
}

pub struct IntentClassifier {
    rules: Vec<Box<dyn IntentRule>>,
    fallback: ModelFallback,
}

impl IntentClassifier {
    pub fn new(rules: Vec<Box<dyn IntentRule>>, fallback: ModelFallback) -> Self {
        Self { rules, fallback }
    }

    pub fn with_default_rules(
        gateway: Arc<dyn CompletionGateway>,
        long_message_threshold: usize,
    ) -> Result<Self, ClassifierError> {
        Ok(Self::new(default_rules(long_message_threshold)?, ModelFallback::new(gateway)))
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Runs only the deterministic rules.
    pub fn classify_by_rules(&self, text: &str) -> Option<Classification> {
        let normalized = text.to_lowercase();
        self.rules.iter().find_map(|rule| {
            rule.evaluate(text, &normalized)
                .map(|intent| Classification { intent, decided_by: DecidedBy::Rule(rule.name()) })
        })
    }

    pub async fn classify(&self, text: &str) -> Classification {
        if let Some(classification) = self.classify_by_rules(text) {
            return classification;
        }
        self.fallback.classify(text).await
    }
}

pub fn default_rules(
    long_message_threshold: usize,
) -> Result<Vec<Box<dyn IntentRule>>, ClassifierError> {
    let rules: Vec<Box<dyn IntentRule>> = vec![
        Box::new(PatternRule::new("transcript", Intent::Transcript, TRANSCRIPT_PATTERN)?),
        Box::new(PatternRule::new("help", Intent::Help, HELP_PATTERN)?),
        Box::new(PatternRule::new("about_bot", Intent::AboutBot, ABOUT_PATTERN)?),
        Box::new(PatternRule::new("regenerate", Intent::Regenerate, REGENERATE_PATTERN)?),
        Box::new(LengthRule::new(long_message_threshold)),
    ];
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reeltitle_core::Intent;

    use super::{
        is_affirmative, ClassifierError, DecidedBy, IntentClassifier, IntentRule, LengthRule,
        ModelFallback, PatternRule,
    };
    use crate::testing::ScriptedGateway;

    fn classifier(gateway: Arc<ScriptedGateway>) -> IntentClassifier {
        IntentClassifier::with_default_rules(gateway, 50).expect("default rules compile")
    }

    #[tokio::test]
    async fn transcript_question_is_classified_without_model_call() {
        let gateway = Arc::new(ScriptedGateway::default());
        let result = classifier(gateway.clone()).classify("怎麼取得逐字稿").await;

        assert_eq!(result.intent, Intent::Transcript);
        assert_eq!(result.decided_by, DecidedBy::Rule("transcript"));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn matching_is_case_normalized() {
        let gateway = Arc::new(ScriptedGateway::default());
        let classifier = classifier(gateway.clone());

        assert_eq!(classifier.classify("HOW DO I USE this?").await.intent, Intent::Help);
        assert_eq!(classifier.classify("Try Again please").await.intent, Intent::Regenerate);
        assert_eq!(classifier.classify("Who MADE you?").await.intent, Intent::AboutBot);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn pattern_rules_outrank_length_heuristic() {
        let gateway = Arc::new(ScriptedGateway::default());
        let long_question = format!("{}逐字稿", "我想要知道要怎樣才能把這支影片的內容整理出來".repeat(4));
        assert!(long_question.chars().count() > 50);

        let result = classifier(gateway.clone()).classify(&long_question).await;

        assert_eq!(result.intent, Intent::Transcript);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn earlier_rules_win_ties() {
        let gateway = Arc::new(ScriptedGateway::default());
        let classifier = classifier(gateway);

        // "逐字稿" (transcript) and "怎麼用" (help) both match; transcript is first.
        assert_eq!(classifier.classify("逐字稿功能怎麼用").await.intent, Intent::Transcript);
        // "怎麼用" (help) and "不夠好" (regenerate) both match; help is first.
        assert_eq!(classifier.classify("不夠好，這要怎麼用").await.intent, Intent::Help);
    }

    #[tokio::test]
    async fn long_unmatched_prose_skips_the_model() {
        let gateway = Arc::new(ScriptedGateway::default());
        let prose = "Today we walk through how small teams can plan quarterly budgets calmly.";
        assert!(prose.chars().count() > 50);

        let result = classifier(gateway.clone()).classify(prose).await;

        assert_eq!(result.intent, Intent::GenerateTitle);
        assert_eq!(result.decided_by, DecidedBy::Rule("long_message"));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn incidental_keywords_in_long_content_still_generate_titles() {
        let gateway = Arc::new(ScriptedGateway::default());
        let classifier = classifier(gateway.clone());
        let transcripts = [
            "In this episode I share three small daily habits that help me save money without feeling deprived.",
            "Today I compare one note-taking app with another one and explain which fits a busy student schedule.",
            "My phone data usage doubled last month, so I tracked every app for a week and one more surprise showed up.",
            "今天這支影片的教學重點是如何用三個簡單步驟規劃每週的家庭預算，讓每一分錢都花在刀口上，也順便養成記帳的好習慣。",
            "這位作者在書裡提到，早起並不是意志力的比賽，而是把前一晚的準備做好，我實際照著做了一個月，分享我的觀察和心得。",
            "字幕組朋友跟我說他們一天只睡四小時，我很好奇這樣的生活怎麼撐下去，所以花了一週跟拍他們的工作流程給大家看。",
        ];

        for text in transcripts {
            assert!(text.chars().count() > 50, "fixture too short: {text}");
            let result = classifier.classify(text).await;
            assert_eq!(result.intent, Intent::GenerateTitle, "misrouted: {text}");
            assert_eq!(result.decided_by, DecidedBy::Rule("long_message"));
        }
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let rule = LengthRule::new(50);
        let forty_cjk = "理".repeat(40);
        assert!(forty_cjk.len() > 50);

        assert_eq!(rule.evaluate(&forty_cjk, &forty_cjk), None);
        assert_eq!(rule.evaluate(&"理".repeat(51), ""), Some(Intent::GenerateTitle));
    }

    #[tokio::test]
    async fn short_ambiguous_text_asks_the_model_once_at_zero_temperature() {
        let gateway = Arc::new(ScriptedGateway::replying("Yes."));
        let result = classifier(gateway.clone()).classify("幫我想標題").await;

        assert_eq!(result.intent, Intent::GenerateTitle);
        assert_eq!(result.decided_by, DecidedBy::Model);

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, 0.0);
        assert_eq!(calls[0].user_prompt(), "幫我想標題");
    }

    #[tokio::test]
    async fn negative_model_answer_is_unknown() {
        let gateway = Arc::new(ScriptedGateway::replying("no"));
        let result = classifier(gateway).classify("你好").await;

        assert_eq!(result.intent, Intent::Unknown);
        assert_eq!(result.decided_by, DecidedBy::Model);
    }

    #[tokio::test]
    async fn gateway_failure_degrades_to_unknown() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let result = classifier(gateway).classify("今天天氣如何").await;

        assert_eq!(result.intent, Intent::Unknown);
        assert_eq!(result.decided_by, DecidedBy::ModelUnavailable);
    }

    #[tokio::test]
    async fn custom_chain_can_reorder_rules() {
        let gateway = Arc::new(ScriptedGateway::default());
        let rules: Vec<Box<dyn IntentRule>> = vec![
            Box::new(PatternRule::new("help_first", Intent::Help, r"教學").expect("valid pattern")),
            Box::new(
                PatternRule::new("transcript", Intent::Transcript, r"字幕").expect("valid pattern"),
            ),
        ];
        let classifier = IntentClassifier::new(rules, ModelFallback::new(gateway));

        assert_eq!(classifier.rule_names(), vec!["help_first", "transcript"]);
        assert_eq!(classifier.classify("字幕教學").await.intent, Intent::Help);
    }

    #[test]
    fn invalid_pattern_names_the_rule() {
        let error = match PatternRule::new("broken", Intent::Help, r"(unclosed") {
            Ok(_) => panic!("pattern should not compile"),
            Err(error) => error,
        };
        assert!(matches!(error, ClassifierError::InvalidPattern { rule: "broken", .. }));
    }

    #[test]
    fn affirmative_answers_are_recognized() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative("  YES, it is"));
        assert!(is_affirmative("\"yes\""));
        assert!(is_affirmative("是"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("maybe yes"));
        assert!(!is_affirmative(""));
    }
}
