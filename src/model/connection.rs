//! Connection profile for the analytical store

use serde::{Deserialize, Serialize};

/// Parameters sent verbatim with every call that talks to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    /// Token or password, sent as `jwt_token`
    #[serde(rename = "jwt_token", default)]
    pub credential: String,
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9000,
            database: "default".to_string(),
            user: "default".to_string(),
            credential: String::new(),
        }
    }
}

/// Editable fields of the connection form, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Host,
    Port,
    Database,
    User,
    Credential,
}

impl ProfileField {
    pub fn all() -> [ProfileField; 5] {
        [
            ProfileField::Host,
            ProfileField::Port,
            ProfileField::Database,
            ProfileField::User,
            ProfileField::Credential,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::Host => "Host",
            ProfileField::Port => "Port",
            ProfileField::Database => "Database",
            ProfileField::User => "User",
            ProfileField::Credential => "JWT Token",
        }
    }

    pub fn next(&self) -> ProfileField {
        match self {
            ProfileField::Host => ProfileField::Port,
            ProfileField::Port => ProfileField::Database,
            ProfileField::Database => ProfileField::User,
            ProfileField::User => ProfileField::Credential,
            ProfileField::Credential => ProfileField::Host,
        }
    }

    pub fn prev(&self) -> ProfileField {
        match self {
            ProfileField::Host => ProfileField::Credential,
            ProfileField::Port => ProfileField::Host,
            ProfileField::Database => ProfileField::Port,
            ProfileField::User => ProfileField::Database,
            ProfileField::Credential => ProfileField::User,
        }
    }
}

impl ConnectionProfile {
    /// Current text value of a field, as shown in the form
    pub fn field_value(&self, field: ProfileField) -> String {
        match field {
            ProfileField::Host => self.host.clone(),
            ProfileField::Port => self.port.to_string(),
            ProfileField::Database => self.database.clone(),
            ProfileField::User => self.user.clone(),
            ProfileField::Credential => self.credential.clone(),
        }
    }

    /// Fields that are still empty; a connect attempt needs this to be empty
    pub fn missing_fields(&self) -> Vec<ProfileField> {
        ProfileField::all()
            .into_iter()
            .filter(|field| match field {
                ProfileField::Host => self.host.trim().is_empty(),
                ProfileField::Port => self.port == 0,
                ProfileField::Database => self.database.trim().is_empty(),
                ProfileField::User => self.user.trim().is_empty(),
                ProfileField::Credential => self.credential.is_empty(),
            })
            .collect()
    }
}

/// Parse a port typed by the user, accepting 1-65535 only
pub fn parse_port(input: &str) -> Option<u16> {
    match input.trim().parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_bounds() {
        assert_eq!(parse_port("9000"), Some(9000));
        assert_eq!(parse_port(" 65535 "), Some(65535));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("65536"), None);
        assert_eq!(parse_port("abc"), None);
        assert_eq!(parse_port(""), None);
    }

    #[test]
    fn test_missing_fields_default_profile() {
        let profile = ConnectionProfile::default();
        assert_eq!(profile.missing_fields(), vec![ProfileField::Credential]);
    }

    #[test]
    fn test_profile_serializes_credential_as_jwt_token() {
        let profile = ConnectionProfile {
            credential: "x".to_string(),
            ..ConnectionProfile::default()
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["jwt_token"], "x");
        assert_eq!(json["port"], 9000);
    }

    #[test]
    fn test_field_cycle_wraps() {
        assert_eq!(ProfileField::Credential.next(), ProfileField::Host);
        assert_eq!(ProfileField::Host.prev(), ProfileField::Credential);
    }
}
