pub mod profiles;

use dotenvy::dotenv;
use profiles::{Profile, ProfileDefaults};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub courses_table: String,
    pub transactions_table: String,
    pub videos_table: String,
    pub users_table: String,
    pub user_tenant_table: String,
    pub razorpay_url: String,
    pub razorpay_key_id: Option<String>,
    pub razorpay_key_secret: Option<String>,
    pub cors_allowed_origin: Option<String>,
    pub default_tenant: String,
}

pub struct ConfigInfo {
    pub config: Config,
    pub profile: Profile,
    pub overrides: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<ConfigInfo> {
        dotenv().ok();

        let profile = Profile::from_env();
        let defaults = ProfileDefaults::for_profile(profile);
        let mut overrides = Vec::new();

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| {
                overrides.push("SERVER_PORT".to_string());
                v.parse().ok()
            })
            .unwrap_or(defaults.server_port);

        let mut string_var = |name: &str, default: &str| {
            env::var(name)
                .ok()
                .map(|v| {
                    overrides.push(name.to_string());
                    v
                })
                .unwrap_or_else(|| default.to_string())
        };

        let courses_table = string_var("COURSES_TABLE", "lms-courses");
        let transactions_table = string_var("TRANSACTIONS_TABLE", "lms-transactions");
        let videos_table = string_var("VIDEOS_TABLE", "lotus-lms-videos");
        let users_table = string_var("USERS_TABLE", "lotus-lms-users");
        let user_tenant_table =
            string_var("USER_TENANT_MAPPING_TABLE", "lms-user-tenant-mapping");
        let default_tenant = string_var("DEFAULT_TENANT", "trainer1");
        let razorpay_url = string_var("RAZORPAY_URL", &defaults.razorpay_url);

        let razorpay_key_id = env::var("RAZORPAY_KEY_ID").ok().map(|v| {
            overrides.push("RAZORPAY_KEY_ID".to_string());
            v
        });
        let razorpay_key_secret = env::var("RAZORPAY_KEY_SECRET").ok().map(|v| {
            overrides.push("RAZORPAY_KEY_SECRET".to_string());
            v
        });

        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN")
            .ok()
            .map(|v| {
                overrides.push("CORS_ALLOWED_ORIGIN".to_string());
                Some(v)
            })
            .unwrap_or(defaults.cors_allowed_origin);

        Ok(ConfigInfo {
            config: Config {
                server_port,
                courses_table,
                transactions_table,
                videos_table,
                users_table,
                user_tenant_table,
                razorpay_url,
                razorpay_key_id,
                razorpay_key_secret,
                cors_allowed_origin,
                default_tenant,
            },
            profile,
            overrides,
        })
    }
}
