use reeltitle_agent::OpenAiGateway;
use reeltitle_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_DOCTOR_FAILED};

/// Channel access tokens issued by the LINE console are long base64 strings.
const MIN_CHANNEL_TOKEN_LEN: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report(AppConfig::load(LoadOptions::default()));
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_DOCTOR_FAILED };

    if json_output {
        return CommandResult::payload(exit_code, &report);
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report<E: std::fmt::Display>(loaded: Result<AppConfig, E>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_line_credential(&config));
            checks.push(check_gateway(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["line_credential", "completion_gateway"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_line_credential(config: &AppConfig) -> DoctorCheck {
    let token = config.line.channel_access_token.expose_secret();
    let problem = if token.chars().any(char::is_whitespace) {
        Some("channel access token contains whitespace; check for a copy/paste error".to_string())
    } else if token.len() < MIN_CHANNEL_TOKEN_LEN {
        Some(format!(
            "channel access token is {} characters; expected at least {MIN_CHANNEL_TOKEN_LEN}",
            token.len()
        ))
    } else {
        None
    };

    match problem {
        Some(details) => DoctorCheck { name: "line_credential", status: CheckStatus::Fail, details },
        None => DoctorCheck {
            name: "line_credential",
            status: CheckStatus::Pass,
            details: format!("token shape ok; replies go to {}", config.line.api_base_url),
        },
    }
}

fn check_gateway(config: &AppConfig) -> DoctorCheck {
    match OpenAiGateway::from_config(&config.llm) {
        Ok(gateway) => DoctorCheck {
            name: "completion_gateway",
            status: CheckStatus::Pass,
            details: format!(
                "{} model `{}` at {}",
                config.llm.provider,
                gateway.model(),
                gateway.endpoint()
            ),
        },
        Err(error) => DoctorCheck {
            name: "completion_gateway",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
