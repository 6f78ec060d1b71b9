// ============================================================================
// Background Worker Thread
// ============================================================================
// Thread séparé avec son propre runtime tokio :
// - reçoit des FetchCommand via command_rx
// - exécute le fetch async (block_on : bloque le worker, pas l'UI)
// - renvoie un FetchOutcome via result_tx, avec le tag de la commande
//
// La vue compare les tags à l'arrivée des réponses. Le worker, lui, vide
// le channel avant chaque lot : les commandes d'une génération dépassée
// (touche ']' maintenue pendant une requête lente) ne partent jamais au
// serveur. Il s'arrête quand l'UI ferme son côté du channel.
// ============================================================================

use std::sync::mpsc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use super::client::StatsSource;
use super::{FetchCommand, FetchOutcome};

/// Lance le worker thread qui exécute les requêtes en arrière-plan
///
/// Le runtime est créé avant le spawn pour que son échec remonte à
/// l'appelant au lieu de tuer le thread silencieusement.
pub fn spawn_fetch_worker<S>(
    source: S,
    command_rx: mpsc::Receiver<FetchCommand>,
    result_tx: mpsc::Sender<FetchOutcome>,
) -> Result<JoinHandle<()>>
where
    S: StatsSource + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Échec de la création du runtime tokio")?;

    let handle = std::thread::Builder::new()
        .name("fetch-worker".to_string())
        .spawn(move || {
            while let Ok(first) = command_rx.recv() {
                // CONCEPT RUST : try_iter()
                // - itère sur ce qui est déjà dans le channel, sans bloquer
                let mut pending = vec![first];
                pending.extend(command_rx.try_iter());

                let received = pending.len();
                let batch = keep_latest_generation(pending);
                if batch.len() < received {
                    debug!(skipped = received - batch.len(), "Skipping superseded commands");
                }

                for command in batch {
                    info!(?command, "Worker received command");
                    let outcome = run_command(&runtime, &source, command);

                    if result_tx.send(outcome).is_err() {
                        info!("Worker thread exiting (result channel closed)");
                        return;
                    }
                }
            }
            info!("Worker thread exiting (command channel closed)");
        })
        .context("Échec du lancement du worker thread")?;

    Ok(handle)
}

/// Garde les commandes de la génération la plus récente, dans l'ordre
///
/// Les générations sont croissantes côté vue : une réponse d'une
/// génération plus ancienne serait de toute façon jetée à l'arrivée.
pub fn keep_latest_generation(pending: Vec<FetchCommand>) -> Vec<FetchCommand> {
    let Some(latest) = pending.iter().map(|c| c.tag().generation).max() else {
        return pending;
    };
    pending
        .into_iter()
        .filter(|c| c.tag().generation == latest)
        .collect()
}

/// Exécute une commande et la transforme en résultat (tag recopié)
fn run_command<S: StatsSource>(
    runtime: &tokio::runtime::Runtime,
    source: &S,
    command: FetchCommand,
) -> FetchOutcome {
    match command {
        FetchCommand::Stats { tag } => match runtime.block_on(source.fetch_stats(tag.range)) {
            Ok(samples) => FetchOutcome::StatsLoaded { tag, samples },
            Err(e) => {
                error!(range = %tag.range, error = ?e, "Failed to load stats");
                FetchOutcome::StatsFailed {
                    tag,
                    error: format!("{:#}", e),
                }
            }
        },

        FetchCommand::Posts { tag } => match runtime.block_on(source.fetch_posts(tag.range)) {
            Ok(posts) => FetchOutcome::PostsLoaded { tag, posts },
            Err(e) => {
                error!(range = %tag.range, error = ?e, "Failed to load posts");
                FetchOutcome::PostsFailed {
                    tag,
                    error: format!("{:#}", e),
                }
            }
        },
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestTag;
    use crate::models::{DateRange, PostStats, SparseSample};
    use chrono::NaiveDate;
    use std::time::Duration;

    /// Source en mémoire : renvoie toujours les mêmes données, ou une erreur
    struct FakeSource {
        fail: bool,
    }

    impl StatsSource for FakeSource {
        async fn fetch_stats(&self, _range: DateRange) -> Result<Vec<SparseSample>> {
            if self.fail {
                anyhow::bail!("HTTP 500");
            }
            Ok(vec![SparseSample::new("2024-01-02", 7u64, 4u64)])
        }

        async fn fetch_posts(&self, _range: DateRange) -> Result<Vec<PostStats>> {
            if self.fail {
                anyhow::bail!("HTTP 500");
            }
            Ok(Vec::new())
        }
    }

    fn tag(generation: u64) -> RequestTag {
        RequestTag {
            generation,
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            )
            .unwrap(),
        }
    }

    #[test]
    fn test_worker_answers_with_command_tag() {
        let (command_tx, command_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        let handle = spawn_fetch_worker(FakeSource { fail: false }, command_rx, result_tx).unwrap();

        command_tx.send(FetchCommand::Stats { tag: tag(3) }).unwrap();
        command_tx.send(FetchCommand::Posts { tag: tag(3) }).unwrap();

        let first = result_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        match first {
            FetchOutcome::StatsLoaded { tag: t, samples } => {
                assert_eq!(t, tag(3));
                assert_eq!(samples.len(), 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let second = result_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(second, FetchOutcome::PostsLoaded { .. }));

        drop(command_tx);
        handle.join().unwrap();
    }

    #[test]
    fn test_keep_latest_generation_preserves_order() {
        let pending = vec![
            FetchCommand::Stats { tag: tag(1) },
            FetchCommand::Posts { tag: tag(1) },
            FetchCommand::Stats { tag: tag(2) },
            FetchCommand::Posts { tag: tag(2) },
        ];
        let kept = keep_latest_generation(pending);
        assert_eq!(kept.len(), 2);
        assert!(matches!(kept[0], FetchCommand::Stats { tag: t } if t.generation == 2));
        assert!(matches!(kept[1], FetchCommand::Posts { tag: t } if t.generation == 2));

        assert!(keep_latest_generation(Vec::new()).is_empty());
    }

    #[test]
    fn test_worker_skips_superseded_commands() {
        let (command_tx, command_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();

        // Tout est en file avant le démarrage : un seul lot
        for generation in 1..=3 {
            command_tx.send(FetchCommand::Stats { tag: tag(generation) }).unwrap();
            command_tx.send(FetchCommand::Posts { tag: tag(generation) }).unwrap();
        }
        let handle = spawn_fetch_worker(FakeSource { fail: false }, command_rx, result_tx).unwrap();
        drop(command_tx);
        handle.join().unwrap();

        let outcomes: Vec<FetchOutcome> = result_rx.try_iter().collect();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.tag().generation == 3));
        assert!(matches!(outcomes[0], FetchOutcome::StatsLoaded { .. }));
        assert!(matches!(outcomes[1], FetchOutcome::PostsLoaded { .. }));
    }

    #[test]
    fn test_worker_reports_failures() {
        let (command_tx, command_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        let handle = spawn_fetch_worker(FakeSource { fail: true }, command_rx, result_tx).unwrap();

        command_tx.send(FetchCommand::Stats { tag: tag(1) }).unwrap();

        match result_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            FetchOutcome::StatsFailed { tag: t, error } => {
                assert_eq!(t.generation, 1);
                assert!(error.contains("500"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        drop(command_tx);
        handle.join().unwrap();
    }
}
