//! Authorization header schemes.

/// Which authorization scheme an API expects.
///
/// The git-hosting API takes `token `-prefixed credentials; the relay and
/// the deployment's own API take `Bearer `.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScheme {
    Token,
    Bearer,
}

impl CredentialScheme {
    /// Format the authorization header value for a credential.
    pub fn header_value(&self, credential: &str) -> String {
        match self {
            CredentialScheme::Token => format!("token {credential}"),
            CredentialScheme::Bearer => format!("Bearer {credential}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemes_format_their_prefixes() {
        assert_eq!(
            CredentialScheme::Token.header_value("abc"),
            "token abc"
        );
        assert_eq!(
            CredentialScheme::Bearer.header_value("abc"),
            "Bearer abc"
        );
    }
}
