//! Fehlertypen fuer Funklink
//!
//! Zentraler Fehler-Enum der alle moeglichen Fehlerzustaende abdeckt.
//! Untermodule koennen eigene Fehler definieren und via `#[from]` konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer Funklink
pub type Result<T> = std::result::Result<T, FunklinkError>;

/// Alle moeglichen Fehler im Funklink-System
#[derive(Debug, Error)]
pub enum FunklinkError {
    // --- Netzwerk (transient) ---
    #[error("Netzwerkfehler: {0}")]
    Netzwerk(#[from] std::io::Error),

    #[error("Bind fehlgeschlagen auf {adresse}: {grund}")]
    Bind { adresse: String, grund: String },

    #[error("Zeitlimit ueberschritten: {0}")]
    Zeitlimit(String),

    // --- Eingabedaten ---
    #[error("Ungueltiges Paket: {0}")]
    UngueltigesPaket(String),

    #[error("Ungueltige Preset-Datei '{datei}': {grund}")]
    UngueltigesPreset { datei: String, grund: String },

    // --- Ressourcen ---
    #[error("Client nicht gefunden: {0}")]
    ClientNichtGefunden(String),

    // --- Audio/Pipeline ---
    #[error("Pipeline-Fehler: {0}")]
    Pipeline(String),

    #[error("Codec-Fehler: {0}")]
    Codec(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl FunklinkError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler transient ist und ein Retry
    /// sinnvoll sein koennte (Netzwerk-Klasse der Fehlertaxonomie)
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(
            self,
            Self::Netzwerk(_) | Self::Bind { .. } | Self::Zeitlimit(_)
        )
    }
}
