//! Providers Command
//!
//! Show which vendors are usable with the current credentials.

use serde::Serialize;

use crate::ai::provider::ProviderKind;
use crate::ai::service::SharedService;
use crate::cli::ui::Output;
use crate::config::AiConfig;
use crate::cli::util::{CommandContext, OutputFormat, print_json};
use crate::types::Result;

#[derive(Debug, Serialize)]
struct ProviderStatus {
    provider: ProviderKind,
    name: &'static str,
    available: bool,
    default: bool,
    model: String,
    api_key_env: &'static str,
}

fn statuses(service: &SharedService, config: &AiConfig) -> Vec<ProviderStatus> {
    let default = service.default_provider();
    ProviderKind::ALL
        .into_iter()
        .map(|kind| ProviderStatus {
            provider: kind,
            name: kind.display_name(),
            available: service.has_provider(kind),
            default: kind == default,
            model: service.model_for(Some(kind)).unwrap_or_else(|| {
                config
                    .provider(kind)
                    .model
                    .clone()
                    .unwrap_or_else(|| kind.profile().default_model.to_string())
            }),
            api_key_env: kind.api_key_env(),
        })
        .collect()
}

pub fn run(ctx: &CommandContext, format: &str) -> Result<()> {
    let format = OutputFormat::parse(format)?;
    let service = ctx.service();
    let statuses = statuses(&service, &ctx.config.ai);

    if format.is_json() {
        return print_json(&statuses);
    }

    let out = Output::new();
    out.section("Providers");
    for status in &statuses {
        let marker = if status.default { " (default)" } else { "" };
        let line = format!(
            "{}{}: {}",
            status.name, marker, status.model
        );
        if status.available {
            out.success(&line);
        } else {
            out.warning(&format!("{}  [set {}]", line, status.api_key_env));
        }
    }

    if !service.has_provider(service.default_provider()) {
        out.info("The default provider has no API key; pass --provider or configure a key.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::service::{AiService, Credentials};

    #[test]
    fn test_statuses_reflect_credentials() {
        let mut config = AiConfig::default();
        config.default_provider = ProviderKind::Anthropic;
        config.google.model = Some("gemini-custom".to_string());

        let credentials = Credentials::new().with_key(ProviderKind::Anthropic, "sk-ant-test");
        let service = AiService::new(&credentials, &config).into_shared();
        let statuses = statuses(&service, &config);

        assert_eq!(statuses.len(), 3);
        let anthropic = &statuses[1];
        assert!(anthropic.available);
        assert!(anthropic.default);
        assert_eq!(anthropic.model, "claude-2.1");

        let google = &statuses[2];
        assert!(!google.available);
        assert_eq!(google.model, "gemini-custom");
        assert_eq!(google.api_key_env, "GOOGLE_AI_KEY");
    }
}
