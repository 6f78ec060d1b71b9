// ============================================================================
// Configuration
// ============================================================================
// Objet de configuration passé explicitement aux composants :
// - endpoint de l'API REST et identifiants (mot de passe d'application)
// - libellés traduits du tooltip ("Visitors" / "Pageviews")
// - période du rafraîchissement automatique, hauteur du graphique
//
// Sources, par priorité croissante :
// 1. valeurs par défaut
// 2. fichier JSON (--config, $PAGEVIEWS_CONFIG, ~/.config/pageviews/config.json)
// 3. arguments de la ligne de commande / variables d'environnement (main.rs)
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::RangePreset;

/// Période par défaut du rafraîchissement automatique
pub const DEFAULT_REFRESH_SECS: u64 = 60;

/// Base par défaut du namespace REST du plugin
pub const DEFAULT_API_URL: &str = "http://localhost/wp-json/zero-pageviews/v1";

/// Libellés traduits utilisés tels quels par le tooltip
///
/// Clés JSON reconnues : `Visitors`, `Pageviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    #[serde(rename = "Visitors", default = "default_visitors_label")]
    pub visitors: String,

    #[serde(rename = "Pageviews", default = "default_pageviews_label")]
    pub pageviews: String,
}

fn default_visitors_label() -> String {
    "Visitors".to_string()
}

fn default_pageviews_label() -> String {
    "Pageviews".to_string()
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            visitors: default_visitors_label(),
            pageviews: default_pageviews_label(),
        }
    }
}

/// Configuration complète de l'application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base de l'API, ex: https://example.com/wp-json/zero-pageviews/v1
    pub api_url: String,

    /// Utilisateur WordPress (authentification HTTP basique)
    pub username: Option<String>,

    /// Mot de passe d'application WordPress
    pub app_password: Option<String>,

    /// Période du rafraîchissement automatique, en secondes
    pub refresh_secs: u64,

    /// Hauteur fixe du graphique en lignes (sinon calculée selon le terminal)
    pub chart_height: Option<u16>,

    /// Plage affichée au démarrage
    pub preset: RangePreset,

    pub labels: Labels,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            username: None,
            app_password: None,
            refresh_secs: DEFAULT_REFRESH_SECS,
            chart_height: None,
            preset: RangePreset::default(),
            labels: Labels::default(),
        }
    }
}

impl Config {
    /// Charge la configuration depuis `path`, ou l'emplacement par défaut
    ///
    /// Un fichier absent n'est pas une erreur : on garde les valeurs par défaut.
    /// Un fichier présent mais invalide en est une.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => {
                    debug!("No config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Lecture impossible de {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("Configuration invalide dans {}", path.display()))?;

        info!(path = %path.display(), api_url = %config.api_url, "Loaded config file");
        Ok(config)
    }

    /// Parse une configuration JSON (champs absents = valeurs par défaut)
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw).context("JSON de configuration invalide")?;
        Ok(config)
    }

    /// Période de rafraîchissement (jamais nulle)
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }

    /// Base de l'API sans slash final
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

/// Emplacement par défaut : $PAGEVIEWS_CONFIG ou ~/.config/pageviews/config.json
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("PAGEVIEWS_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("pageviews").join("config.json"))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.refresh_period(), Duration::from_secs(60));
        assert_eq!(config.labels.visitors, "Visitors");
        assert_eq!(config.preset, RangePreset::MonthToDate);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(
            r#"{
                "api_url": "https://example.com/wp-json/zero-pageviews/v1/",
                "labels": { "Visitors": "Visiteurs" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.api_base(), "https://example.com/wp-json/zero-pageviews/v1");
        assert_eq!(config.labels.visitors, "Visiteurs");
        assert_eq!(config.labels.pageviews, "Pageviews");
        assert_eq!(config.refresh_secs, DEFAULT_REFRESH_SECS);
    }

    #[test]
    fn test_preset_in_json() {
        let config = Config::from_json(r#"{ "preset": "last_30_days", "refresh_secs": 0 }"#).unwrap();
        assert_eq!(config.preset, RangePreset::Last30Days);
        assert_eq!(config.refresh_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Config::from_json("{ not json").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/pageviews/config.json"))).unwrap();
        assert_eq!(config, Config::default());
    }
}
