use std::net::SocketAddr;

use clap::Parser;
use foodtruck_order_service::status::StatusPolicy;

#[derive(Parser, Debug, Clone)]
#[command(name = "foodtruck-api-gateway", about = "HTTP API for the food-truck ordering backend")]
pub struct Config {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8100")]
    pub listen_addr: SocketAddr,

    /// `permissive` writes any known status; `strict` only follows the lifecycle.
    #[arg(long, env = "ORDER_STATUS_POLICY", default_value_t = StatusPolicy::Permissive)]
    pub order_status_policy: StatusPolicy,

    #[arg(long, env = "RUN_MIGRATIONS", default_value_t = true, action = clap::ArgAction::Set)]
    pub run_migrations: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_database_is_given() {
        let config =
            Config::try_parse_from(["gateway", "--database-url", "postgres://localhost/food"])
                .unwrap();
        assert_eq!(config.listen_addr.port(), 8100);
        assert_eq!(config.order_status_policy, StatusPolicy::Permissive);
        assert!(config.run_migrations);
    }

    #[test]
    fn strict_policy_and_migrations_off() {
        let config = Config::try_parse_from([
            "gateway",
            "--database-url",
            "postgres://localhost/food",
            "--order-status-policy",
            "strict",
            "--run-migrations",
            "false",
        ])
        .unwrap();
        assert_eq!(config.order_status_policy, StatusPolicy::Strict);
        assert!(!config.run_migrations);
    }
}
