use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Staging,
    Production,
}

impl Profile {
    pub fn from_env() -> Self {
        std::env::var("APP_PROFILE")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "development" | "dev" => Some(Self::Development),
                "staging" | "stage" => Some(Self::Staging),
                "production" | "prod" => Some(Self::Production),
                _ => None,
            })
            .unwrap_or(Self::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfileDefaults {
    pub server_port: u16,
    pub razorpay_url: String,
    pub cors_allowed_origin: Option<String>,
}

impl ProfileDefaults {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Development => Self {
                server_port: 3000,
                razorpay_url: "https://api.razorpay.com".to_string(),
                cors_allowed_origin: None,
            },
            Profile::Staging => Self {
                server_port: 8080,
                razorpay_url: "https://api.razorpay.com".to_string(),
                cors_allowed_origin: Some("https://staging.example.com".to_string()),
            },
            Profile::Production => Self {
                server_port: 8080,
                razorpay_url: "https://api.razorpay.com".to_string(),
                cors_allowed_origin: Some("https://app.example.com".to_string()),
            },
        }
    }
}
