// ============================================================================
// SignalBoard - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests d'intégration
// ============================================================================

pub mod api;         // Client HTTP du serveur de signaux
pub mod app;         // État de l'application
pub mod config;      // Configuration (env / .env)
pub mod controller;  // Dispatcher clavier + application des résultats
pub mod coordinator; // Machine à états des votes
pub mod error;       // Erreurs typées
pub mod ledger;      // Votes locaux persistés
pub mod models;      // Structures de données
pub mod poller;      // Rafraîchissements périodiques
pub mod render;      // Snapshots -> modèles de vue
pub mod store;       // Derniers snapshots serveur
pub mod ui;          // Interface utilisateur
pub mod worker;      // Thread d'arrière-plan (runtime tokio)

#[cfg(test)]
mod test_helpers;
