// ============================================================================
// Structures : réponses de l'API statistiques
// ============================================================================
// Le serveur renvoie les compteurs sous forme de chaînes numériques ("10"),
// parfois sous forme d'entiers. On accepte les deux, et tout ce qui n'est pas
// un nombre positif vaut 0 : un échantillon corrompu ne doit pas vider le
// graphique entier.
//
// CONCEPT RUST : #[serde(untagged)]
// - Serde essaie chaque variant dans l'ordre jusqu'à ce qu'un match réussisse
// - Permet de désérialiser "10", 10, 10.0 ou null vers le même type
// ============================================================================

use serde::{Deserialize, Serialize};

/// Compteur tel que reçu dans le JSON (chaîne, entier, flottant ou null)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountField {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl CountField {
    /// Convertit en compteur positif, 0 si non numérique ou négatif
    pub fn value(&self) -> u64 {
        match self {
            CountField::Int(v) => u64::try_from(*v).unwrap_or(0),
            CountField::Float(v) => float_count(*v),
            CountField::Text(s) => parse_count(s),
            CountField::Missing => 0,
        }
    }
}

impl Default for CountField {
    fn default() -> Self {
        CountField::Missing
    }
}

impl From<u64> for CountField {
    fn from(value: u64) -> Self {
        CountField::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for CountField {
    fn from(value: &str) -> Self {
        CountField::Text(value.to_string())
    }
}

/// Parse une chaîne numérique ("10", " 7 ", "3.0"), 0 sinon
pub fn parse_count(raw: &str) -> u64 {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<u64>() {
        return v;
    }
    trimmed.parse::<f64>().map(float_count).unwrap_or(0)
}

fn float_count(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        // Troncature volontaire, comme parseInt("3.7") == 3
        v.trunc() as u64
    } else {
        0
    }
}

/// Échantillon quotidien renvoyé par l'endpoint `stats`
///
/// Les jours sans activité sont absents de la réponse (données creuses).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseSample {
    /// Jour au format `yyyy-MM-dd`
    pub date: String,

    #[serde(default)]
    pub pageviews: CountField,

    #[serde(default)]
    pub visitors: CountField,
}

impl SparseSample {
    pub fn new(date: &str, pageviews: impl Into<CountField>, visitors: impl Into<CountField>) -> Self {
        Self {
            date: date.to_string(),
            pageviews: pageviews.into(),
            visitors: visitors.into(),
        }
    }
}

/// Identifiant d'article : le serveur l'envoie en chaîne ou en entier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Int(u64),
    Text(String),
}

/// Ligne du classement renvoyé par l'endpoint `posts`
///
/// Une ligne par article, triée par pages vues décroissantes côté serveur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostStats {
    pub id: PostId,

    #[serde(default)]
    pub visitors: CountField,

    #[serde(default)]
    pub pageviews: CountField,

    #[serde(default)]
    pub post_title: String,

    #[serde(default)]
    pub post_permalink: String,
}

impl PostStats {
    pub fn visitors(&self) -> u64 {
        self.visitors.value()
    }

    pub fn pageviews(&self) -> u64 {
        self.pageviews.value()
    }

    /// Titre affichable (les articles sans titre restent identifiables)
    pub fn display_title(&self) -> String {
        if self.post_title.trim().is_empty() {
            match &self.id {
                PostId::Int(id) => format!("#{}", id),
                PostId::Text(id) => format!("#{}", id),
            }
        } else {
            self.post_title.clone()
        }
    }
}

/// Trie le classement par pages vues décroissantes
///
/// Le serveur trie déjà, mais sur des chaînes selon le moteur SQL :
/// on retrie sur les valeurs numériques. Tri stable.
pub fn rank_posts(posts: &mut [PostStats]) {
    posts.sort_by(|a, b| b.pageviews().cmp(&a.pageviews()));
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("10"), 10);
        assert_eq!(parse_count(" 7 "), 7);
        assert_eq!(parse_count("3.9"), 3);
        assert_eq!(parse_count("-4"), 0);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count(""), 0);
    }

    #[test]
    fn test_deserialize_string_counts() {
        let json = r#"[{"date":"2024-01-02","pageviews":"10","visitors":"4"}]"#;
        let samples: Vec<SparseSample> = serde_json::from_str(json).unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].date, "2024-01-02");
        assert_eq!(samples[0].pageviews.value(), 10);
        assert_eq!(samples[0].visitors.value(), 4);
    }

    #[test]
    fn test_deserialize_mixed_and_malformed_counts() {
        let json = r#"[
            {"date":"2024-01-02","pageviews":12,"visitors":null},
            {"date":"2024-01-03","pageviews":"n/a","visitors":-3},
            {"date":"2024-01-04"}
        ]"#;
        let samples: Vec<SparseSample> = serde_json::from_str(json).unwrap();

        assert_eq!(samples[0].pageviews.value(), 12);
        assert_eq!(samples[0].visitors.value(), 0);
        assert_eq!(samples[1].pageviews.value(), 0);
        assert_eq!(samples[1].visitors.value(), 0);
        assert_eq!(samples[2].pageviews.value(), 0);
    }

    #[test]
    fn test_deserialize_posts() {
        let json = r#"[
            {"id":"12","visitors":"3","pageviews":"5","post_title":"Hello","post_permalink":"https://example.com/hello"},
            {"id":7,"visitors":"9","pageviews":"20","post_title":"","post_permalink":"https://example.com/?p=7"}
        ]"#;
        let mut posts: Vec<PostStats> = serde_json::from_str(json).unwrap();
        rank_posts(&mut posts);

        assert_eq!(posts[0].pageviews(), 20);
        assert_eq!(posts[0].display_title(), "#7");
        assert_eq!(posts[1].display_title(), "Hello");
        assert_eq!(posts[1].visitors(), 3);
    }
}
