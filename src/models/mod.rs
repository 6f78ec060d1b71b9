// ============================================================================
// Module : models
// ============================================================================
// Structures de données : plage de dates, réponses de l'API, série dense
// ============================================================================

pub mod dataset; // Squelette quotidien + fusion des échantillons
pub mod range;   // Plage de dates et presets
pub mod stats;   // Échantillons `stats` et classement `posts`

// Re-export des structures principales pour simplifier les imports
pub use dataset::{Dataset, DayBucket, MergeReport};
pub use range::{parse_date_param, DateRange, RangePreset, DATE_FORMAT};
pub use stats::{rank_posts, CountField, PostId, PostStats, SparseSample};
