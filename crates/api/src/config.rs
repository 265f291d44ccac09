use lingua_core::advancement::{AdvancementPolicy, ModuleWeights};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Advancement thresholds, XP awards and module weights.
    pub policy: AdvancementPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                             | Default                    |
    /// |-------------------------------------|----------------------------|
    /// | `HOST`                              | `0.0.0.0`                  |
    /// | `PORT`                              | `3000`                     |
    /// | `CORS_ORIGINS`                      | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`              | `30`                       |
    /// | `ADVANCE_SCORE_THRESHOLD`           | `85.0`                     |
    /// | `ADVANCE_MIN_ATTEMPTS`              | `10`                       |
    /// | `ADVANCE_MIN_CONVERSATION_MESSAGES` | `20`                       |
    /// | `ADVANCE_XP_AWARDS`                 | `100,150,200,300,400`      |
    /// | `ADVANCE_MODULE_WEIGHTS`            | `0.25,0.25,0.25,0.25`      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let policy = policy_from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            policy,
        }
    }
}

/// Build the advancement policy, overriding defaults from the environment.
///
/// Panics on malformed values or an inconsistent policy; misconfiguration
/// should stop the server at startup rather than skew advancement.
fn policy_from_env() -> AdvancementPolicy {
    let defaults = AdvancementPolicy::default();

    let score_threshold = std::env::var("ADVANCE_SCORE_THRESHOLD")
        .map(|v| v.parse().expect("ADVANCE_SCORE_THRESHOLD must be a number"))
        .unwrap_or(defaults.score_threshold);

    let min_attempts = std::env::var("ADVANCE_MIN_ATTEMPTS")
        .map(|v| v.parse().expect("ADVANCE_MIN_ATTEMPTS must be an integer"))
        .unwrap_or(defaults.min_attempts);

    let min_conversation_messages = std::env::var("ADVANCE_MIN_CONVERSATION_MESSAGES")
        .map(|v| {
            v.parse()
                .expect("ADVANCE_MIN_CONVERSATION_MESSAGES must be an integer")
        })
        .unwrap_or(defaults.min_conversation_messages);

    let xp_awards = std::env::var("ADVANCE_XP_AWARDS")
        .map(|v| {
            parse_list::<i64, 5>(&v)
                .expect("ADVANCE_XP_AWARDS must be five comma-separated integers")
        })
        .unwrap_or(defaults.xp_awards);

    let weights = std::env::var("ADVANCE_MODULE_WEIGHTS")
        .map(|v| {
            let [vocabulary, grammar, writing, phonetics] = parse_list::<f64, 4>(&v)
                .expect("ADVANCE_MODULE_WEIGHTS must be four comma-separated numbers");
            ModuleWeights {
                vocabulary,
                grammar,
                writing,
                phonetics,
            }
        })
        .unwrap_or(defaults.weights);

    let policy = AdvancementPolicy {
        score_threshold,
        min_attempts,
        min_conversation_messages,
        xp_awards,
        weights,
    };
    if let Err(e) = policy.validate() {
        panic!("Invalid advancement policy: {e}");
    }
    policy
}

/// Parse exactly `N` comma-separated values.
pub fn parse_list<T: std::str::FromStr, const N: usize>(raw: &str) -> Option<[T; N]> {
    let values: Vec<T> = raw
        .split(',')
        .map(|s| s.trim().parse().ok())
        .collect::<Option<_>>()?;
    values.try_into().ok()
}
