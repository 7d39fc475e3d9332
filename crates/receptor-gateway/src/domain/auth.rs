//! Outbound authentication header selection.
//!
//! Two schemes exist: a pre-shared key shared with the receptor controller,
//! or the identity header of the caller being forwarded as-is. The choice
//! is made per call and has no side effects.

use std::collections::BTreeMap;

use crate::domain::config::AuthConfig;

/// Header name to value map.
pub type HeaderSet = BTreeMap<String, String>;

/// Pre-shared key header
pub const PSK_HEADER: &str = "x-rh-receptor-controller-psk";
/// Client id header sent with the pre-shared key
pub const PSK_CLIENT_ID_HEADER: &str = "x-rh-receptor-controller-client-id";
/// Account header sent with the pre-shared key
pub const PSK_ACCOUNT_HEADER: &str = "x-rh-receptor-controller-account";

/// Content type sent on every request
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Select the authentication headers for one call.
///
/// The pre-shared key set wins when both the key and the account are
/// non-empty. Otherwise the caller's identity header is forwarded, or
/// nothing at all.
pub fn auth_headers(auth: &AuthConfig, account: &str, identity: Option<&HeaderSet>) -> HeaderSet {
    match auth.pre_shared_key.as_deref() {
        Some(psk) if !psk.is_empty() && !account.is_empty() => {
            let mut headers = HeaderSet::new();
            headers.insert(PSK_HEADER.to_string(), psk.to_string());
            headers.insert(PSK_CLIENT_ID_HEADER.to_string(), auth.client_id.clone());
            headers.insert(PSK_ACCOUNT_HEADER.to_string(), account.to_string());
            headers
        }
        _ => identity.cloned().unwrap_or_default(),
    }
}

/// Default headers merged with the authentication headers.
///
/// Authentication headers replace defaults on key collision.
pub fn request_headers(
    auth: &AuthConfig,
    account: &str,
    identity: Option<&HeaderSet>,
) -> HeaderSet {
    let mut headers = HeaderSet::new();
    headers.insert(CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string());
    headers.extend(auth_headers(auth, account, identity));
    headers
}
