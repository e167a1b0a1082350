use log::{debug, info, warn};
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::AuthSettings;
use crate::web::models::SignupRequest;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Sign-up is not configured on this server.")]
    NotConfigured,

    #[error("Sign-up rejected: {reason}")]
    Rejected { reason: String },

    #[error("The account was created, but saving the profile failed.")]
    ProfileWrite { uid: String },

    #[error("Identity backend error (status {0}).")]
    Backend(u16),

    #[error("The identity backend returned an unexpected response.")]
    Malformed,

    #[error("Could not reach the identity backend.")]
    Transport(#[source] reqwest::Error),
}

pub struct RegisteredAccount {
    pub uid: String,
}

/// Client for the identity backend: one call to create the account, one
/// call to store the profile document under the new uid.
pub struct AuthClient {
    settings: AuthSettings,
    client: Client,
}

impl AuthClient {
    pub fn new(settings: AuthSettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some() && self.settings.project_id.is_some()
    }

    pub async fn register(&self, form: &SignupRequest) -> Result<RegisteredAccount, AuthError> {
        let (api_key, project_id) = match (&self.settings.api_key, &self.settings.project_id) {
            (Some(key), Some(project)) => (key.as_str(), project.as_str()),
            _ => return Err(AuthError::NotConfigured),
        };

        let account = self.create_account(api_key, form).await?;
        info!("Created account {} for {}", account.uid, form.email);

        self.write_profile(api_key, project_id, &account, form)
            .await?;

        Ok(RegisteredAccount { uid: account.uid })
    }

    async fn create_account(
        &self,
        api_key: &str,
        form: &SignupRequest,
    ) -> Result<CreatedAccount, AuthError> {
        let url = format!("{}/v1/accounts:signUp", self.settings.api_base);
        let payload = json!({
            "email": form.email,
            "password": form.password,
            "returnSecureToken": true,
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            let body: Value = response.json().await.map_err(AuthError::Transport)?;
            let code = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("INVALID_REQUEST");
            debug!("Account creation rejected: {}", code);
            return Err(AuthError::Rejected {
                reason: rejection_reason(code),
            });
        }
        if !status.is_success() {
            return Err(AuthError::Backend(status.as_u16()));
        }

        let body: Value = response.json().await.map_err(AuthError::Transport)?;
        let uid = body
            .get("localId")
            .and_then(|v| v.as_str())
            .ok_or(AuthError::Malformed)?
            .to_string();
        let id_token = body
            .get("idToken")
            .and_then(|v| v.as_str())
            .ok_or(AuthError::Malformed)?
            .to_string();

        Ok(CreatedAccount { uid, id_token })
    }

    async fn write_profile(
        &self,
        api_key: &str,
        project_id: &str,
        account: &CreatedAccount,
        form: &SignupRequest,
    ) -> Result<(), AuthError> {
        let url = format!(
            "{}/v1/projects/{}/databases/(default)/documents/users/{}",
            self.settings.firestore_base, project_id, account.uid
        );
        let payload = json!({ "fields": profile_fields(form) });

        let response = self
            .client
            .patch(&url)
            .query(&[("key", api_key)])
            .bearer_auth(&account.id_token)
            .json(&payload)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        if !response.status().is_success() {
            warn!(
                "Profile write for {} failed with status {}",
                account.uid,
                response.status()
            );
            return Err(AuthError::ProfileWrite {
                uid: account.uid.clone(),
            });
        }
        Ok(())
    }
}

struct CreatedAccount {
    uid: String,
    id_token: String,
}

/// Profile document in the document store's string-value encoding. The
/// credential pair stays out of the profile.
fn profile_fields(form: &SignupRequest) -> Value {
    json!({
        "email": { "stringValue": form.email },
        "firstName": { "stringValue": form.first_name },
        "lastName": { "stringValue": form.last_name },
        "areaCode": { "stringValue": form.area_code },
        "phone": { "stringValue": form.phone },
        "role": { "stringValue": form.role },
        "studentClass": { "stringValue": form.student_class },
        "location": { "stringValue": form.location },
    })
}

/// The backend reports rejections as bare codes, sometimes with a trailing
/// explanation ("WEAK_PASSWORD : ..."). Map the code to a sentence.
fn rejection_reason(code: &str) -> String {
    let bare = code.split([' ', ':']).next().unwrap_or(code);
    match bare {
        "EMAIL_EXISTS" => "that email address is already registered.".to_string(),
        "INVALID_EMAIL" => "that email address is not valid.".to_string(),
        "WEAK_PASSWORD" => "the password is too weak (6 characters minimum).".to_string(),
        "OPERATION_NOT_ALLOWED" => "password sign-up is disabled for this project.".to_string(),
        other => format!("the identity backend refused the request ({}).", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_codes_map_to_sentences() {
        assert_eq!(
            rejection_reason("EMAIL_EXISTS"),
            "that email address is already registered."
        );
        assert_eq!(
            rejection_reason("WEAK_PASSWORD : Password should be at least 6 characters"),
            "the password is too weak (6 characters minimum)."
        );
        assert!(rejection_reason("SOMETHING_ELSE").contains("SOMETHING_ELSE"));
    }

    #[test]
    fn profile_fields_keep_form_names_and_skip_password() {
        let form = SignupRequest {
            email: "a@b.c".into(),
            password: "secret".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            area_code: "+44".into(),
            phone: "12345".into(),
            role: "student".into(),
            student_class: "12".into(),
            location: "London".into(),
        };
        let fields = profile_fields(&form);
        assert_eq!(fields["firstName"]["stringValue"], "Ada");
        assert_eq!(fields["studentClass"]["stringValue"], "12");
        assert!(fields.get("password").is_none());
    }

    #[test]
    fn unconfigured_client_reports_it() {
        let client = AuthClient::new(AuthSettings {
            api_base: "http://localhost:9".into(),
            firestore_base: "http://localhost:9".into(),
            api_key: None,
            project_id: None,
        });
        assert!(!client.is_configured());
    }
}
