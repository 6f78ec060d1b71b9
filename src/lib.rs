// ============================================================================
// Pageviews - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;     // Client REST et protocole du worker
pub mod app;     // État de l'application
pub mod chart;   // Histogramme : données, géométrie, interaction
pub mod config;  // Configuration
pub mod models;  // Structures de données
pub mod numbers; // Formatage des nombres
pub mod ui;      // Interface utilisateur
