// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Configuration loading for the recording proxy.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Listen address, e.g. 127.0.0.1:3000
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Base URL requests are forwarded to
    #[serde(default = "default_upstream")]
    pub upstream: String,

    /// Directory HAR files are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_listen() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_upstream() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_output_dir() -> String {
    "har".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            upstream: default_upstream(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Scheme used to make origin-form request URIs absolute
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

fn default_scheme() -> String {
    "http".to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub capture: CaptureConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// [general]
    /// listen = "127.0.0.1:3000"
    /// upstream = "http://127.0.0.1:8080"
    /// output_dir = "har"
    ///
    /// [capture]
    /// scheme = "http"
    pub async fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let s = tokio::fs::read_to_string(path.as_ref()).await?;
        let cfg: Self = toml::from_str(&s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.general.output_dir.trim().is_empty() {
            anyhow::bail!("general.output_dir cannot be empty");
        }
        if !matches!(self.capture.scheme.as_str(), "http" | "https") {
            anyhow::bail!(
                "capture.scheme must be one of 'http' or 'https', got '{}'",
                self.capture.scheme
            );
        }
        self.general
            .upstream
            .parse::<hyper::Uri>()
            .map_err(|e| anyhow::anyhow!("invalid general.upstream '{}': {}", self.general.upstream, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::fs;
    use uuid::Uuid;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.general.listen, "127.0.0.1:3000");
        assert_eq!(cfg.general.upstream, "http://127.0.0.1:8080");
        assert_eq!(cfg.general.output_dir, "har");
        assert_eq!(cfg.capture.scheme, "http");
    }

    #[tokio::test]
    async fn load_toml_file() -> anyhow::Result<()> {
        let tmp_toml = std::env::temp_dir().join(format!("harlog_cfg_test_{}.toml", Uuid::new_v4()));
        let toml = r#"[general]
listen = "0.0.0.0:9000"
upstream = "https://api.example.com"
output_dir = "/var/lib/harlog"

[capture]
scheme = "https"
"#;
        fs::write(&tmp_toml, toml).await?;
        let cfg = Config::load_from_path(&tmp_toml).await?;
        assert_eq!(cfg.general.listen, "0.0.0.0:9000");
        assert_eq!(cfg.general.upstream, "https://api.example.com");
        assert_eq!(cfg.general.output_dir, "/var/lib/harlog");
        assert_eq!(cfg.capture.scheme, "https");
        fs::remove_file(&tmp_toml).await?;
        Ok(())
    }

    #[tokio::test]
    async fn partial_file_fills_defaults() -> anyhow::Result<()> {
        let tmp_toml = std::env::temp_dir().join(format!("harlog_cfg_partial_{}.toml", Uuid::new_v4()));
        fs::write(&tmp_toml, "[general]\noutput_dir = \"captures\"\n").await?;
        let cfg = Config::load_from_path(&tmp_toml).await?;
        assert_eq!(cfg.general.output_dir, "captures");
        assert_eq!(cfg.general.listen, "127.0.0.1:3000");
        assert_eq!(cfg.capture.scheme, "http");
        fs::remove_file(&tmp_toml).await?;
        Ok(())
    }

    #[tokio::test]
    async fn load_missing_file_errors() {
        let p = std::env::temp_dir().join("harlog_cfg_missing_does_not_exist.toml");
        let res = Config::load_from_path(&p).await;
        assert!(res.is_err());
    }

    #[rstest]
    #[case("[general]\noutput_dir = \"\"\n", "output_dir cannot be empty")]
    #[case("[capture]\nscheme = \"ftp\"\n", "must be one of")]
    #[case("[general]\nupstream = \"http://bad host\"\n", "invalid general.upstream")]
    #[case("[general]\nlisten = 3000\n", "invalid type")]
    #[tokio::test]
    async fn load_invalid_config_cases(
        #[case] toml: &str,
        #[case] expected_substring: &str,
    ) -> anyhow::Result<()> {
        let tmp_toml = std::env::temp_dir().join(format!("harlog_cfg_invalid_{}.toml", Uuid::new_v4()));
        fs::write(&tmp_toml, toml).await?;
        let res = Config::load_from_path(&tmp_toml).await;

        let err_msg = res.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err_msg.contains(expected_substring), "{}", err_msg);

        fs::remove_file(&tmp_toml).await?;
        Ok(())
    }
}
