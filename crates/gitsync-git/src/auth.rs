//! Credentials offered to remotes during network operations.

use git2::{Cred, CredentialType, FetchOptions, RemoteCallbacks};

/// Username sent alongside an auth token.
///
/// Any non-empty value works; some hosting providers reject an empty one.
pub const AUTH_USERNAME: &str = "gitsync";

/// libgit2 keeps asking for credentials while the remote rejects them.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Builds remote callbacks answering credential requests.
///
/// With a token, basic auth is offered. Without one, SSH remotes fall back to
/// the ssh-agent and other remotes to the default credential helper.
pub(crate) fn remote_callbacks(token: Option<&str>) -> RemoteCallbacks<'static> {
    let token = token.map(str::to_owned);
    let mut attempts = 0;

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication rejected by remote"));
        }

        if let Some(token) = &token
            && allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
        {
            return Cred::userpass_plaintext(AUTH_USERNAME, token);
        }

        let username = username_from_url.unwrap_or("git");
        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(username);
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username);
        }
        if allowed.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        Err(git2::Error::from_str("no usable credentials for remote"))
    });
    callbacks
}

/// Builds fetch options carrying the credential callbacks.
pub(crate) fn fetch_options(token: Option<&str>) -> FetchOptions<'static> {
    let mut options = FetchOptions::new();
    options.remote_callbacks(remote_callbacks(token));
    options
}
