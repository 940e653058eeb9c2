//! End-to-end orchestration: compile, invoke, normalize, report.
//!
//! One invocation runs the whole flow with fresh artifacts; no state is
//! shared between runs. Configuration and credential problems abort before
//! any remote call, later failures degrade and leave whatever artifacts
//! were salvageable behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::agent::{self, AgentOptions, BrowsingAgent};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::extract::{self, ParseOutcome};
use crate::llm::{ChatClient, Credentials, Platform};
use crate::report;

/// Fixed filename for the Markdown report artifact.
pub const REPORT_FILE: &str = "report.md";

/// Artifacts produced by one pipeline run.
#[derive(Debug)]
pub struct RunArtifacts {
    pub outcome: ParseOutcome,
    /// Path of the products or raw-text artifact
    pub outcome_path: PathBuf,
    pub report_path: PathBuf,
}

/// Run the full pipeline against the given browsing agent.
pub async fn run(
    settings: &Settings,
    agent: &dyn BrowsingAgent,
    out_dir: &Path,
) -> Result<RunArtifacts> {
    let platform = Platform::parse_or_default(&settings.ai_platform);
    let credentials = Credentials::from_env(platform)?;

    let params = &settings.search_parameters;
    let instruction = agent::compile_task(params);
    debug!(%instruction, "compiled task instruction");

    let options = AgentOptions {
        use_vision: params
            .browser_settings
            .as_ref()
            .is_some_and(|b| b.use_vision),
        generate_gif: false,
    };

    let search_client = ChatClient::resolve(platform, settings.search_model.as_str(), &credentials);
    let raw = agent::invoke(agent, &instruction, &search_client, options).await?;

    let outcome = extract::normalize(&raw, &params.result_schema(), platform);
    let outcome_path = extract::persist_outcome(&outcome, out_dir)?;
    match &outcome {
        ParseOutcome::Structured(records) => {
            info!(products = records.len(), path = %outcome_path.display(),
                "structured products persisted");
        }
        ParseOutcome::Unstructured(_) => {
            warn!(path = %outcome_path.display(),
                "structured parsing failed, raw agent output kept for manual repair");
        }
    }

    let report_client = ChatClient::resolve(platform, settings.report_model.as_str(), &credentials);
    let markdown = report::synthesize(&outcome, &settings.criteria, &report_client).await;

    let report_path = out_dir.join(REPORT_FILE);
    fs::write(&report_path, &markdown).map_err(|source| Error::Artifact {
        path: report_path.clone(),
        source,
    })?;
    info!(path = %report_path.display(), "report written");

    Ok(RunArtifacts {
        outcome,
        outcome_path,
        report_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::RawAgentResult;
    use async_trait::async_trait;

    struct CannedAgent;

    #[async_trait]
    impl BrowsingAgent for CannedAgent {
        async fn run(
            &self,
            _instruction: &str,
            _llm: &ChatClient,
            _options: AgentOptions,
        ) -> Result<RawAgentResult> {
            Ok(RawAgentResult::Text("{\"results\":[]}".to_string()))
        }
    }

    #[tokio::test]
    async fn missing_credential_aborts_before_any_call() {
        std::env::remove_var("DEEPSEEK_API_KEY");
        let settings: Settings = serde_yaml::from_str(
            "search_parameters:\n  websites:\n    - name: A\n      url: https://a.example/\nai_platform: deepseek\n",
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = run(&settings, &CannedAgent, dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential { platform: "deepseek", .. }));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
