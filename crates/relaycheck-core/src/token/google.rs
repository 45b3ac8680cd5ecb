//! Google-backed [`MailApi`].

use std::path::Path;

use relaycheck_oauth::{AuthorizedUser, ClientSecrets, InstalledAppFlow};
use tracing::{info, warn};

use super::{Credential, MailApi};
use crate::error::ProbeError;
use crate::output::OutputSink;
use crate::service::GmailService;

/// Refreshes and obtains tokens from Google and builds Gmail handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct GmailApi;

impl MailApi for GmailApi {
    type Service = GmailService;

    async fn refresh(&self, credential: &Credential) -> Result<Credential, ProbeError> {
        let client = credential.client()?;
        let token = client.refresh_token(&credential.to_token()).await?;
        info!(client_id = %credential.client_id, "access token refreshed");
        Ok(credential.clone().with_token(token))
    }

    async fn interactive_authorize(
        &self,
        credentials_file: &Path,
        scopes: &[String],
        sink: &dyn OutputSink,
    ) -> Result<Credential, ProbeError> {
        let secrets = ClientSecrets::from_file(credentials_file)?;
        let flow = InstalledAppFlow::new(secrets.clone(), scopes.to_vec());

        let token = flow
            .run_local_server(|url| {
                if let Err(e) = opener::open_browser(url.as_str()) {
                    warn!("could not launch a browser: {e}");
                    sink.warning("Could not open a browser automatically");
                }
                sink.plain(&format!("  Authorization URL:\n  {url}\n"));
            })
            .await?;

        if token.refresh_token.is_none() {
            warn!("authorization returned no refresh token; the grant cannot be renewed");
        }
        Ok(AuthorizedUser::from_token(&token, &secrets, scopes))
    }

    fn build_service(
        &self,
        credential: &Credential,
        target: &str,
    ) -> Result<GmailService, ProbeError> {
        let token = credential.access_token().ok_or_else(|| {
            ProbeError::ServiceConstruction("credential has no access token".into())
        })?;
        GmailService::new(token, target)
    }
}
