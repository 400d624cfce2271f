//! Fehlertypen der Medien-Kollaborateure

use thiserror::Error;

/// Alle moeglichen Fehler der Aufnahme-Seite
#[derive(Debug, Error)]
pub enum MedienFehler {
    #[error("Aufnahmegeraet nicht verfuegbar: {0}")]
    GeraetNichtVerfuegbar(String),

    #[error("Kein kompatibles Chunk-Format verfuegbar")]
    FormatNichtUnterstuetzt,

    #[error("Encoder-Fehler: {0}")]
    Encoder(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type MedienResult<T> = Result<T, MedienFehler>;
