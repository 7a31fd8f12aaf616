//! Gateway configuration from environment variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `FIRMS_MAP_KEY` (or `NASA_API_KEY`) | unset → fallback mode |
//! | `FIRMS_BASE_URL` | `https://firms.modaps.eosdis.nasa.gov` |
//! | `FIRMS_SOURCE` | `VIIRS_NOAA20_NRT` |
//! | `FIRMS_DAY_RANGE` | `7` |
//! | `FIRMS_TIMEOUT_SECS` | `30` |
//! | `FIRE_RISK_DEFAULT_RADIUS_KM` | `50` |
//! | `FIRE_RISK_GATEWAY_PORT` (or `PORT`) | `18610` |
//! | `FIRE_RISK_ADMIN_TOKEN` | unset → cache clear disabled |

use anyhow::{bail, Context, Result};
use fire_risk::{FirmsConfig, DEFAULT_RADIUS_KM};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 18610;

#[derive(Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub default_radius_km: f64,
    /// `None` when no map key is configured
    pub firms: Option<FirmsConfig>,
    /// Shared secret for admin routes; `None` disables them
    pub admin_token: Option<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port_var = ["FIRE_RISK_GATEWAY_PORT", "PORT"]
            .into_iter()
            .find_map(|name| get(name).map(|raw| (name, raw)));
        let port = match port_var {
            Some((name, raw)) => parse_var(name, &raw)?,
            None => DEFAULT_PORT,
        };

        let default_radius_km = match get("FIRE_RISK_DEFAULT_RADIUS_KM") {
            Some(raw) => parse_var("FIRE_RISK_DEFAULT_RADIUS_KM", &raw)?,
            None => DEFAULT_RADIUS_KM,
        };
        if !default_radius_km.is_finite() || default_radius_km < 0.0 {
            bail!("FIRE_RISK_DEFAULT_RADIUS_KM must be a non-negative number");
        }

        let firms = match get("FIRMS_MAP_KEY").or_else(|| get("NASA_API_KEY")) {
            Some(key) => {
                let mut firms = FirmsConfig::new(key.trim());
                if let Some(url) = get("FIRMS_BASE_URL") {
                    firms.base_url = url;
                }
                if let Some(source) = get("FIRMS_SOURCE") {
                    firms.source = source;
                }
                if let Some(raw) = get("FIRMS_DAY_RANGE") {
                    firms.day_range = parse_var("FIRMS_DAY_RANGE", &raw)?;
                    if !(1..=10).contains(&firms.day_range) {
                        bail!("FIRMS_DAY_RANGE must be between 1 and 10");
                    }
                }
                if let Some(raw) = get("FIRMS_TIMEOUT_SECS") {
                    firms.timeout_sec = parse_var("FIRMS_TIMEOUT_SECS", &raw)?;
                    if firms.timeout_sec == 0 {
                        bail!("FIRMS_TIMEOUT_SECS must be at least 1");
                    }
                }
                Some(firms)
            }
            None => None,
        };

        let admin_token = get("FIRE_RISK_ADMIN_TOKEN").map(|t| t.trim().to_string());

        Ok(Self {
            port,
            default_radius_km,
            firms,
            admin_token,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("port", &self.port)
            .field("default_radius_km", &self.default_radius_km)
            .field("firms", &self.firms)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value for {}: {:?}", name, raw))
}
