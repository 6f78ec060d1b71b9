// ============================================================================
// Structure : Dataset (série quotidienne dense)
// ============================================================================
// Deux étapes :
// 1. Densification : un bucket à zéro pour chaque jour de la plage
// 2. Fusion : les échantillons creux du serveur écrasent les buckets
//
// CONCEPT RUST : index explicite
// - `index` associe la clé "yyyy-MM-dd" à la position dans `buckets`
// - Le Dataset possède ses buckets ET son index : rien n'est partagé entre
//   deux fetchs, un Dataset reconstruit remplace l'ancien en entier
// ============================================================================

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::range::{DateRange, DATE_FORMAT};
use crate::models::stats::SparseSample;

/// Compteurs d'une journée
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub pageviews: u64,
    pub visitors: u64,
}

impl DayBucket {
    /// Bucket vide pour un jour donné
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            pageviews: 0,
            visitors: 0,
        }
    }

    /// Clé unique du bucket (`yyyy-MM-dd`)
    pub fn key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Bilan d'une fusion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Échantillons appliqués à un bucket
    pub merged: usize,

    /// Clés de date sans bucket correspondant (échantillons ignorés)
    pub anomalies: Vec<String>,
}

impl MergeReport {
    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

/// Série dense : exactement un bucket par jour de la plage, dans l'ordre
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    range: DateRange,
    buckets: Vec<DayBucket>,
    index: HashMap<String, usize>,
    y_max: u64,
}

impl Dataset {
    /// Construit le squelette : un bucket à zéro par jour calendaire
    ///
    /// Idempotent : deux appels avec la même plage donnent des datasets égaux.
    pub fn skeleton(range: DateRange) -> Self {
        let buckets: Vec<DayBucket> = range.days().map(DayBucket::empty).collect();
        let index = buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| (bucket.key(), i))
            .collect();

        debug!(%range, buckets = buckets.len(), "Built dataset skeleton");

        Self {
            range,
            buckets,
            index,
            y_max: 0,
        }
    }

    /// Fusionne les échantillons du serveur dans les buckets existants
    ///
    /// - Écrasement (pas d'addition) : refusionner la même réponse ne change rien
    /// - Date sans bucket : anomalie journalisée, échantillon ignoré, on continue
    /// - y_max = maximum des pages vues des échantillons fusionnés ce cycle
    pub fn merge(&mut self, samples: &[SparseSample]) -> MergeReport {
        let mut report = MergeReport::default();
        let mut y_max = 0;

        for sample in samples {
            let Some(&i) = self.index.get(sample.date.trim()) else {
                warn!(
                    date = %sample.date,
                    range = %self.range,
                    "Unexpected date in response data, sample skipped"
                );
                report.anomalies.push(sample.date.clone());
                continue;
            };

            let bucket = &mut self.buckets[i];
            bucket.pageviews = sample.pageviews.value();
            bucket.visitors = sample.visitors.value();
            y_max = y_max.max(bucket.pageviews);
            report.merged += 1;
        }

        self.y_max = y_max;

        debug!(
            merged = report.merged,
            anomalies = report.anomalies.len(),
            y_max,
            "Merged samples into dataset"
        );
        report
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn buckets(&self) -> &[DayBucket] {
        &self.buckets
    }

    pub fn get(&self, index: usize) -> Option<&DayBucket> {
        self.buckets.get(index)
    }

    /// Bucket d'un jour donné (recherche par clé)
    pub fn bucket_for(&self, key: &str) -> Option<&DayBucket> {
        self.index.get(key).and_then(|&i| self.buckets.get(i))
    }

    /// Maximum journalier des pages vues (0 si aucune donnée)
    pub fn y_max(&self) -> u64 {
        self.y_max
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total des pages vues sur la plage
    pub fn total_pageviews(&self) -> u64 {
        self.buckets.iter().map(|b| b.pageviews).sum()
    }

    /// Total des visiteurs sur la plage
    pub fn total_visitors(&self) -> u64 {
        self.buckets.iter().map(|b| b.visitors).sum()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn three_days() -> DateRange {
        DateRange::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap()
    }

    #[test]
    fn test_skeleton_is_dense_ordered_and_zeroed() {
        let range = DateRange::new(date(2023, 12, 25), date(2024, 3, 5)).unwrap();
        let dataset = Dataset::skeleton(range);

        assert_eq!(dataset.len(), range.day_count());
        assert!(dataset.buckets().windows(2).all(|w| w[0].date < w[1].date));
        assert!(dataset.buckets().iter().all(|b| b.pageviews == 0 && b.visitors == 0));
        assert_eq!(dataset.y_max(), 0);
    }

    #[test]
    fn test_skeleton_is_idempotent() {
        assert_eq!(Dataset::skeleton(three_days()), Dataset::skeleton(three_days()));
    }

    #[test]
    fn test_merge_end_to_end_scenario() {
        let mut dataset = Dataset::skeleton(three_days());
        let report = dataset.merge(&[SparseSample::new("2024-01-02", "10", "4")]);

        assert_eq!(report.merged, 1);
        assert!(!report.has_anomalies());
        assert_eq!(
            dataset.buckets(),
            &[
                DayBucket { date: date(2024, 1, 1), pageviews: 0, visitors: 0 },
                DayBucket { date: date(2024, 1, 2), pageviews: 10, visitors: 4 },
                DayBucket { date: date(2024, 1, 3), pageviews: 0, visitors: 0 },
            ]
        );
        assert_eq!(dataset.y_max(), 10);
    }

    #[test]
    fn test_merge_skips_out_of_range_sample() {
        let mut dataset = Dataset::skeleton(three_days());
        let report = dataset.merge(&[
            SparseSample::new("2023-12-31", "99", "50"),
            SparseSample::new("2024-01-03", "5", "2"),
        ]);

        assert_eq!(report.merged, 1);
        assert_eq!(report.anomalies, vec!["2023-12-31".to_string()]);
        assert_eq!(dataset.bucket_for("2024-01-01").unwrap().pageviews, 0);
        assert_eq!(dataset.bucket_for("2024-01-03").unwrap().pageviews, 5);
        assert_eq!(dataset.y_max(), 5);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let samples = vec![
            SparseSample::new("2024-01-01", "3", "1"),
            SparseSample::new("2024-01-03", "8", "6"),
        ];

        let mut first = Dataset::skeleton(three_days());
        first.merge(&samples);
        first.merge(&samples);

        let mut second = Dataset::skeleton(three_days());
        second.merge(&samples);

        assert_eq!(first, second);
        assert_eq!(first.total_pageviews(), 11);
        assert_eq!(first.total_visitors(), 7);
    }

    #[test]
    fn test_visitors_never_drive_y_max() {
        let mut dataset = Dataset::skeleton(three_days());
        dataset.merge(&[SparseSample::new("2024-01-01", "2", "40")]);
        assert_eq!(dataset.y_max(), 2);
    }

    #[test]
    fn test_malformed_counts_become_zero() {
        let mut dataset = Dataset::skeleton(three_days());
        dataset.merge(&[SparseSample::new("2024-01-02", "lots", "-1")]);

        let bucket = dataset.bucket_for("2024-01-02").unwrap();
        assert_eq!(bucket.pageviews, 0);
        assert_eq!(bucket.visitors, 0);
    }
}
