use figment::Jail;
use flysync_core::config::{Access, ConfigError, FlysyncConfig, Manifold};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn project_file_overrides_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "flysync.toml",
            r#"
            [crossref]
            mailto = "flysync@example.org"

            [http]
            timeout_secs = 30

            [databases.sage.dev.write]
            path = "/data/sage-dev.db"
            name = "sage"
            host = "localhost"
            user = "sageApp"
            "#,
        )?;

        let config: FlysyncConfig = FlysyncConfig::figment().extract()?;
        assert_eq!(config.crossref.url, "https://api.crossref.org");
        assert_eq!(config.crossref.mailto, "flysync@example.org");
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        let sage = config
            .local_database("sage", Manifold::Dev, Access::Write)
            .expect("sage dev write settings");
        assert_eq!(sage.path, Some(PathBuf::from("/data/sage-dev.db")));
        assert!(config
            .local_database("sage", Manifold::Prod, Access::Write)
            .is_none());
        Ok(())
    });
}

#[test]
fn environment_overrides_project_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "flysync.toml",
            r#"
            [config_service]
            url = "http://config.local/"

            [rest.flycore]
            url = "http://flycore.local/"
            "#,
        )?;
        jail.set_env("FLYSYNC_CONFIG_SERVICE__URL", "http://config.prod/");
        jail.set_env("FLYSYNC_REST__JACS__URL", "http://jacs.prod/");
        jail.set_env("FLYSYNC_LOGGING__DIR", "/var/log/flysync");

        let config: FlysyncConfig = FlysyncConfig::figment().extract()?;
        assert_eq!(config.config_service.url, "http://config.prod/");
        assert_eq!(config.local_endpoint("flycore"), Some("http://flycore.local/"));
        assert_eq!(config.local_endpoint("jacs"), Some("http://jacs.prod/"));
        assert_eq!(config.logging.dir, Some(PathBuf::from("/var/log/flysync")));
        Ok(())
    });
}

#[test]
fn malformed_dotenv_is_reported() {
    Jail::expect_with(|jail| {
        jail.create_file(".env", "this line is not an assignment\n")?;

        let err = FlysyncConfig::load_with_dotenv().expect_err("malformed .env must fail");
        assert!(matches!(err, ConfigError::Dotenv(_)), "unexpected error: {err}");
        Ok(())
    });
}

#[test]
fn missing_dotenv_is_ignored() {
    Jail::expect_with(|_jail| {
        let config = FlysyncConfig::load_with_dotenv().expect("no .env is fine");
        assert_eq!(config.crossref.url, "https://api.crossref.org");
        Ok(())
    });
}
