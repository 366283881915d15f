use crate::config::HttpAuth;

/// Credentials presented by a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub api_key: Option<String>,
    /// Username and password from HTTP basic auth.
    pub basic: Option<(String, String)>,
}

/// Checks request credentials against the requirement of the matched source.
///
/// No requirement allows everything. Otherwise either a matching API key or
/// matching basic-auth credentials is enough.
pub fn authenticate(requirement: Option<&HttpAuth>, credentials: &Credentials) -> bool {
    let Some(auth) = requirement else {
        return true;
    };

    let api_key = auth.api_key.as_deref().filter(|k| !k.is_empty());
    let basic = auth.basic_auth.as_ref().filter(|b| !b.username.is_empty());
    if api_key.is_none() && basic.is_none() {
        return true;
    }

    if let Some(expected) = api_key
        && credentials.api_key.as_deref() == Some(expected)
    {
        return true;
    }

    if let Some(expected) = basic
        && let Some((user, password)) = &credentials.basic
        && *user == expected.username
        && *password == expected.password
    {
        return true;
    }

    false
}
