//! Google installed-app OAuth (PKCE, loopback redirect) with the refresh
//! token kept in the OS keyring.
use crate::errors::{AppError, AppResult};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::env;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{info, warn};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SERVICE_NAME: &str = "gmail-export";
const KEYRING_USER: &str = "default";

pub const GMAIL_READONLY: &str = "https://www.googleapis.com/auth/gmail.readonly";

#[derive(Clone, Debug)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl From<&BasicTokenResponse> for TokenBundle {
    fn from(res: &BasicTokenResponse) -> Self {
        Self {
            access_token: res.access_token().secret().to_string(),
            refresh_token: res.refresh_token().map(|r| r.secret().to_string()),
        }
    }
}

/// Obtain an access token: a stored refresh token first, then the browser
/// consent flow.
pub async fn authorize(scopes: &[Scope]) -> AppResult<TokenBundle> {
    let (client_id, client_secret) = load_credentials()?;

    if let Some(refresh) = load_refresh_token() {
        let client = build_client(&client_id, &client_secret, "http://127.0.0.1")?;
        match client
            .exchange_refresh_token(&RefreshToken::new(refresh))
            .request_async(async_http_client)
            .await
        {
            Ok(res) => return Ok(TokenBundle::from(&res)),
            Err(err) => {
                warn!("Stored refresh token rejected ({err}); re-authenticating");
                delete_refresh_token();
            }
        }
    }

    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .map_err(|e| AppError::Unexpected(format!("failed to bind loopback port: {e}")))?;
    let port = listener
        .local_addr()
        .map(|addr| addr.port())
        .map_err(|e| AppError::Unexpected(format!("failed to read local addr: {e}")))?;
    let redirect = format!("http://127.0.0.1:{port}");
    let client = build_client(&client_id, &client_secret, &redirect)?;

    let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, csrf) = client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(scopes.iter().cloned())
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .set_pkce_challenge(challenge)
        .url();

    info!(redirect = %redirect, "Opening browser for Google OAuth consent");
    open_in_browser(auth_url.as_str());

    let callback = listen_for_callback(listener).await?;
    if callback.state != *csrf.secret() {
        return Err(AppError::AuthExpired);
    }

    let res = client
        .exchange_code(AuthorizationCode::new(callback.code))
        .set_pkce_verifier(verifier)
        .request_async(async_http_client)
        .await
        .map_err(|e| AppError::Network(format!("token exchange failed: {e}")))?;

    let bundle = TokenBundle::from(&res);
    if let Some(refresh) = &bundle.refresh_token {
        save_refresh_token(refresh);
    }
    Ok(bundle)
}

fn load_credentials() -> AppResult<(String, String)> {
    let id = env::var("GOOGLE_CLIENT_ID")
        .map_err(|_| AppError::Config("GOOGLE_CLIENT_ID missing".into()))?;
    let secret = env::var("GOOGLE_CLIENT_SECRET")
        .map_err(|_| AppError::Config("GOOGLE_CLIENT_SECRET missing".into()))?;
    Ok((id, secret))
}

fn build_client(client_id: &str, client_secret: &str, redirect: &str) -> AppResult<BasicClient> {
    let auth_url = AuthUrl::new(AUTH_URL.to_string())
        .map_err(|e| AppError::Config(format!("invalid auth url: {e}")))?;
    let token_url = TokenUrl::new(TOKEN_URL.to_string())
        .map_err(|e| AppError::Config(format!("invalid token url: {e}")))?;
    let redirect = RedirectUrl::new(redirect.to_string())
        .map_err(|e| AppError::Config(format!("invalid redirect uri {redirect}: {e}")))?;

    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        Some(ClientSecret::new(client_secret.to_string())),
        auth_url,
        Some(token_url),
    )
    .set_redirect_uri(redirect)
    .set_auth_type(oauth2::AuthType::RequestBody))
}

#[derive(Debug, PartialEq, Eq)]
struct Callback {
    code: String,
    state: String,
}

async fn listen_for_callback(listener: TcpListener) -> AppResult<Callback> {
    let (mut stream, _) = listener
        .accept()
        .await
        .map_err(|e| AppError::Unexpected(format!("redirect accept failed: {e}")))?;

    let mut buf = [0u8; 4096];
    let n = stream
        .read(&mut buf)
        .await
        .map_err(|e| AppError::Unexpected(format!("reading auth callback failed: {e}")))?;
    let callback = parse_callback(&String::from_utf8_lossy(&buf[..n]))?;

    let response =
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nAuthorized. You can close this tab.";
    let _ = stream.write_all(response.as_bytes()).await;
    Ok(callback)
}

/// Pull `code` and `state` out of the redirect's request line.
fn parse_callback(request: &str) -> AppResult<Callback> {
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| AppError::Unexpected("invalid HTTP request".into()))?;
    let parsed = url::Url::parse(&format!("http://localhost{path}"))
        .map_err(|e| AppError::Unexpected(format!("failed to parse callback url: {e}")))?;

    let param = |name: &str| {
        parsed
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };
    if let Some(error) = param("error") {
        return Err(AppError::Unexpected(format!("consent denied: {error}")));
    }
    let code =
        param("code").ok_or_else(|| AppError::Unexpected("callback missing code parameter".into()))?;
    Ok(Callback {
        code,
        state: param("state").unwrap_or_default(),
    })
}

fn open_in_browser(url: &str) {
    let attempt = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(url).status()
    } else if cfg!(target_os = "windows") {
        std::process::Command::new("rundll32.exe")
            .args(["url.dll,FileProtocolHandler", url])
            .status()
    } else {
        std::process::Command::new("xdg-open").arg(url).status()
    };
    if let Err(e) = attempt {
        warn!("Could not auto-open browser: {e}. Open this URL manually:\n{url}");
    } else {
        println!("If your browser did not open, navigate to:\n{url}");
    }
}

fn keyring_entry() -> Option<keyring::Entry> {
    keyring::Entry::new(SERVICE_NAME, KEYRING_USER)
        .map_err(|e| warn!("Keyring unavailable: {e}"))
        .ok()
}

fn load_refresh_token() -> Option<String> {
    match keyring_entry()?.get_password() {
        Ok(token) => Some(token),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!("Keyring read failed: {e}");
            None
        }
    }
}

fn save_refresh_token(token: &str) {
    if let Some(entry) = keyring_entry() {
        if let Err(e) = entry.set_password(token) {
            warn!("Keyring save failed ({e}); consent will be asked again next run");
        }
    }
}

fn delete_refresh_token() {
    if let Some(entry) = keyring_entry() {
        let _ = entry.delete_password();
    }
}
