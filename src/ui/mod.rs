// ============================================================================
// Module : ui
// ============================================================================
// Interface terminal : lecture clavier et dessin ratatui
// ============================================================================

pub mod dashboard; // Rendu de l'interface principale
pub mod events;    // Gestion des événements clavier

pub use dashboard::render;
pub use events::{Event, EventHandler};
