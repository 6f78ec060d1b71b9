// ============================================================================
// Module : api
// ============================================================================
// Client REST des statistiques et protocole d'échange avec le worker :
// - FetchCommand : UI → worker (une requête par plage)
// - FetchOutcome : worker → UI (données ou erreur)
//
// Chaque requête porte un RequestTag (génération + plage). L'UI n'accepte
// une réponse que si son tag est celui de la requête en cours : une réponse
// arrivée après un changement de plage est jetée.
// ============================================================================

pub mod client;
pub mod worker;

pub use client::{build_request_url, StatsClient, StatsSource};
pub use worker::spawn_fetch_worker;

use crate::models::{DateRange, PostStats, SparseSample};

/// Identifie une requête émise par la vue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag {
    /// Compteur monotone incrémenté à chaque émission
    pub generation: u64,
    /// Plage demandée
    pub range: DateRange,
}

/// Commandes envoyées au worker thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCommand {
    /// Échantillons journaliers de la plage
    Stats { tag: RequestTag },
    /// Classement des articles de la plage
    Posts { tag: RequestTag },
}

impl FetchCommand {
    pub fn tag(&self) -> RequestTag {
        match self {
            FetchCommand::Stats { tag } | FetchCommand::Posts { tag } => *tag,
        }
    }
}

/// Résultats renvoyés par le worker thread
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    StatsLoaded {
        tag: RequestTag,
        samples: Vec<SparseSample>,
    },

    StatsFailed {
        tag: RequestTag,
        error: String,
    },

    PostsLoaded {
        tag: RequestTag,
        posts: Vec<PostStats>,
    },

    PostsFailed {
        tag: RequestTag,
        error: String,
    },
}

impl FetchOutcome {
    pub fn tag(&self) -> RequestTag {
        match self {
            FetchOutcome::StatsLoaded { tag, .. }
            | FetchOutcome::StatsFailed { tag, .. }
            | FetchOutcome::PostsLoaded { tag, .. }
            | FetchOutcome::PostsFailed { tag, .. } => *tag,
        }
    }
}
